use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct MemberStore {
    pool: SqlitePool,
}

/// Member authority. Exactly one role per member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Role {
    #[serde(rename = "ROLE_MEMBER")]
    Member,
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "ROLE_MEMBER",
            Role::Admin => "ROLE_ADMIN",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "ROLE_ADMIN" => Role::Admin,
            _ => Role::Member,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Member {
    pub id: i64,
    pub uuid: String,
    pub username: String,
    pub password_hash: String,
    pub nickname: String,
    pub role: Role,
    pub created_at: String,
}

#[derive(sqlx::FromRow)]
struct MemberRow {
    id: i64,
    uuid: String,
    username: String,
    password_hash: String,
    nickname: String,
    role: String,
    created_at: String,
}

impl From<MemberRow> for Member {
    fn from(row: MemberRow) -> Self {
        Self {
            id: row.id,
            uuid: row.uuid,
            username: row.username,
            password_hash: row.password_hash,
            nickname: row.nickname,
            role: Role::from_str(&row.role),
            created_at: row.created_at,
        }
    }
}

const MEMBER_COLUMNS: &str = "id, uuid, username, password_hash, nickname, role, created_at";

impl MemberStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new member. Returns the member ID.
    pub async fn create(
        &self,
        uuid: &str,
        username: &str,
        password_hash: &str,
        nickname: &str,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO members (uuid, username, password_hash, nickname) VALUES (?, ?, ?, ?)",
        )
        .bind(uuid)
        .bind(username)
        .bind(password_hash)
        .bind(nickname)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Create a new admin member. Returns the member ID.
    pub async fn create_admin(
        &self,
        uuid: &str,
        username: &str,
        password_hash: &str,
        nickname: &str,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO members (uuid, username, password_hash, nickname, role) VALUES (?, ?, ?, ?, 'ROLE_ADMIN')",
        )
        .bind(uuid)
        .bind(username)
        .bind(password_hash)
        .bind(nickname)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Get a member by username.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<Member>, sqlx::Error> {
        let row: Option<MemberRow> = sqlx::query_as(&format!(
            "SELECT {} FROM members WHERE username = ?",
            MEMBER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Member::from))
    }

    /// Get a member by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Member>, sqlx::Error> {
        let row: Option<MemberRow> =
            sqlx::query_as(&format!("SELECT {} FROM members WHERE id = ?", MEMBER_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Member::from))
    }

    /// Get a member by UUID.
    pub async fn get_by_uuid(&self, uuid: &str) -> Result<Option<Member>, sqlx::Error> {
        let row: Option<MemberRow> =
            sqlx::query_as(&format!("SELECT {} FROM members WHERE uuid = ?", MEMBER_COLUMNS))
                .bind(uuid)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Member::from))
    }

    /// Check if a username is available.
    pub async fn is_username_available(&self, username: &str) -> Result<bool, sqlx::Error> {
        let count: (i32,) = sqlx::query_as("SELECT COUNT(*) FROM members WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 == 0)
    }

    /// Delete a member by ID.
    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM members WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
