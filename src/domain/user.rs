use time::OffsetDateTime;
use uuid::Uuid;

/// A platform account. Owned by the user-management side of the system;
/// the auth core only reads it, except for the last-login timestamp.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub role: String,
    pub status: String,
    pub created_at: OffsetDateTime,
    pub last_login_at: Option<OffsetDateTime>,
}
