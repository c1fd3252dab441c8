//! Comment storage with nested replies via parent references.

use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct CommentStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone)]
pub struct Comment {
    pub id: i64,
    pub uuid: String,
    pub post_id: i64,
    pub member_id: i64,
    pub author: String,
    pub parent_uuid: Option<String>,
    pub content: String,
    pub created_at: String,
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i64,
    uuid: String,
    post_id: i64,
    member_id: i64,
    author: String,
    parent_uuid: Option<String>,
    content: String,
    created_at: String,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            uuid: row.uuid,
            post_id: row.post_id,
            member_id: row.member_id,
            author: row.author,
            parent_uuid: row.parent_uuid,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

const COMMENT_SELECT: &str = "SELECT c.id, c.uuid, c.post_id, c.member_id,
        m.nickname AS author, p.uuid AS parent_uuid, c.content, c.created_at
     FROM comments c
     JOIN members m ON m.id = c.member_id
     LEFT JOIN comments p ON p.id = c.parent_id";

impl CommentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a comment, optionally as a reply to another comment on the
    /// same post. Returns the comment UUID.
    pub async fn create(
        &self,
        post_id: i64,
        member_id: i64,
        parent_id: Option<i64>,
        content: &str,
    ) -> Result<String, sqlx::Error> {
        let uuid = uuid::Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO comments (uuid, post_id, member_id, parent_id, content) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&uuid)
        .bind(post_id)
        .bind(member_id)
        .bind(parent_id)
        .bind(content)
        .execute(&self.pool)
        .await?;

        Ok(uuid)
    }

    /// Get a comment by UUID.
    pub async fn get_by_uuid(&self, uuid: &str) -> Result<Option<Comment>, sqlx::Error> {
        let row: Option<CommentRow> =
            sqlx::query_as(&format!("{} WHERE c.uuid = ?", COMMENT_SELECT))
                .bind(uuid)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Comment::from))
    }

    /// List all comments on a post, oldest first. Replies are interleaved in
    /// insertion order; the caller nests them via parent_uuid.
    pub async fn list_by_post(&self, post_id: i64) -> Result<Vec<Comment>, sqlx::Error> {
        let rows: Vec<CommentRow> = sqlx::query_as(&format!(
            "{} WHERE c.post_id = ? ORDER BY c.id",
            COMMENT_SELECT
        ))
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }

    /// Delete a comment by UUID. Replies cascade.
    pub async fn delete(&self, uuid: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE uuid = ?")
            .bind(uuid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;

    #[tokio::test]
    async fn test_nested_replies() {
        let db = Database::open(":memory:").await.unwrap();
        let member_id = db
            .members()
            .create("uuid-1", "yoon1234", "hash", "Yoon")
            .await
            .unwrap();
        let post_uuid = db.posts().create(member_id, "t", "c").await.unwrap();
        let post = db.posts().get_by_uuid(&post_uuid).await.unwrap().unwrap();

        let top = db
            .comments()
            .create(post.id, member_id, None, "top level")
            .await
            .unwrap();
        let top_comment = db.comments().get_by_uuid(&top).await.unwrap().unwrap();

        let reply = db
            .comments()
            .create(post.id, member_id, Some(top_comment.id), "a reply")
            .await
            .unwrap();

        let all = db.comments().list_by_post(post.id).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].parent_uuid, None);
        assert_eq!(all[1].parent_uuid, Some(top.clone()));
        assert_eq!(all[1].uuid, reply);
        assert_eq!(all[1].author, "Yoon");
    }

    #[tokio::test]
    async fn test_delete_cascades_to_replies() {
        let db = Database::open(":memory:").await.unwrap();
        let member_id = db
            .members()
            .create("uuid-1", "yoon1234", "hash", "Yoon")
            .await
            .unwrap();
        let post_uuid = db.posts().create(member_id, "t", "c").await.unwrap();
        let post = db.posts().get_by_uuid(&post_uuid).await.unwrap().unwrap();

        let top = db
            .comments()
            .create(post.id, member_id, None, "top")
            .await
            .unwrap();
        let top_comment = db.comments().get_by_uuid(&top).await.unwrap().unwrap();
        db.comments()
            .create(post.id, member_id, Some(top_comment.id), "reply")
            .await
            .unwrap();

        assert!(db.comments().delete(&top).await.unwrap());
        let remaining = db.comments().list_by_post(post.id).await.unwrap();
        assert!(remaining.iter().all(|c| c.uuid != top));
    }
}
