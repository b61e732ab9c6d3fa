use time::OffsetDateTime;
use uuid::Uuid;

/// One row per issued refresh token. The `id` doubles as the token's `jti`
/// claim; `token_hash` is a SHA-256 of the signed token, never the raw value.
///
/// Rows are never deleted by the auth flows. Revoked and expired sessions
/// stay behind as an audit trail, so `revoked_at` only ever moves from
/// `None` to `Some`.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RefreshSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: OffsetDateTime,
    pub revoked_at: Option<OffsetDateTime>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: OffsetDateTime,
}

impl RefreshSession {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= OffsetDateTime::now_utc()
    }

    pub fn is_active(&self) -> bool {
        self.revoked_at.is_none() && !self.is_expired()
    }
}
