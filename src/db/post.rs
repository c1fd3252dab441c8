//! Post storage with offset pagination and title search.

use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct PostStore {
    pool: SqlitePool,
}

/// A full post with content and author info.
#[derive(Debug, Clone)]
pub struct Post {
    pub id: i64,
    pub uuid: String,
    pub member_id: i64,
    pub author: String,
    pub title: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A post summary for listing (without content).
#[derive(Debug, Clone)]
pub struct PostSummary {
    pub uuid: String,
    pub author: String,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
}

/// One page of post summaries.
#[derive(Debug, Clone)]
pub struct PostPage {
    pub posts: Vec<PostSummary>,
    pub total: i64,
    pub page: i64,
    pub size: i64,
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    uuid: String,
    member_id: i64,
    author: String,
    title: String,
    content: String,
    created_at: String,
    updated_at: String,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            uuid: row.uuid,
            member_id: row.member_id,
            author: row.author,
            title: row.title,
            content: row.content,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PostSummaryRow {
    uuid: String,
    author: String,
    title: String,
    created_at: String,
    updated_at: String,
}

impl From<PostSummaryRow> for PostSummary {
    fn from(row: PostSummaryRow) -> Self {
        Self {
            uuid: row.uuid,
            author: row.author,
            title: row.title,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl PostStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new post. Returns the post UUID.
    pub async fn create(
        &self,
        member_id: i64,
        title: &str,
        content: &str,
    ) -> Result<String, sqlx::Error> {
        let uuid = uuid::Uuid::new_v4().to_string();

        sqlx::query("INSERT INTO posts (uuid, member_id, title, content) VALUES (?, ?, ?, ?)")
            .bind(&uuid)
            .bind(member_id)
            .bind(title)
            .bind(content)
            .execute(&self.pool)
            .await?;

        Ok(uuid)
    }

    /// Get a post by UUID.
    pub async fn get_by_uuid(&self, uuid: &str) -> Result<Option<Post>, sqlx::Error> {
        let row: Option<PostRow> = sqlx::query_as(
            "SELECT p.id, p.uuid, p.member_id, m.nickname AS author, p.title, p.content,
                    p.created_at, p.updated_at
             FROM posts p JOIN members m ON m.id = p.member_id
             WHERE p.uuid = ?",
        )
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Post::from))
    }

    /// List one page of posts, newest first, optionally filtered by a title
    /// substring.
    pub async fn list(
        &self,
        page: i64,
        size: i64,
        query: Option<&str>,
    ) -> Result<PostPage, sqlx::Error> {
        let pattern = query.map(|q| format!("%{}%", like_escape(q)));
        // page comes straight from the query string; a huge value must give
        // an empty page, not an overflow.
        let offset = page.saturating_mul(size);

        let total: (i64,) = match &pattern {
            Some(p) => {
                sqlx::query_as(
                    "SELECT COUNT(*) FROM posts WHERE title LIKE ? ESCAPE '\\'",
                )
                .bind(p)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as("SELECT COUNT(*) FROM posts")
                    .fetch_one(&self.pool)
                    .await?
            }
        };

        let rows: Vec<PostSummaryRow> = match &pattern {
            Some(p) => {
                sqlx::query_as(
                    "SELECT p.uuid, m.nickname AS author, p.title, p.created_at, p.updated_at
                     FROM posts p JOIN members m ON m.id = p.member_id
                     WHERE p.title LIKE ? ESCAPE '\\'
                     ORDER BY p.id DESC LIMIT ? OFFSET ?",
                )
                .bind(p)
                .bind(size)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    "SELECT p.uuid, m.nickname AS author, p.title, p.created_at, p.updated_at
                     FROM posts p JOIN members m ON m.id = p.member_id
                     ORDER BY p.id DESC LIMIT ? OFFSET ?",
                )
                .bind(size)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(PostPage {
            posts: rows.into_iter().map(PostSummary::from).collect(),
            total: total.0,
            page,
            size,
        })
    }

    /// Update a post's title and content.
    pub async fn update(
        &self,
        uuid: &str,
        title: &str,
        content: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE posts SET title = ?, content = ?, updated_at = datetime('now') WHERE uuid = ?",
        )
        .bind(title)
        .bind(content)
        .bind(uuid)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a post by UUID.
    pub async fn delete(&self, uuid: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM posts WHERE uuid = ?")
            .bind(uuid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Escape LIKE wildcards in user-supplied search terms.
fn like_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}
