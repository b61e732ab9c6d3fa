use super::DbPool;
use crate::domain::session::RefreshSession;
use crate::error::{AppError, Result};
use crate::services::auth_service::SessionStore;
use async_trait::async_trait;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct RefreshSessionRepository {
    pool: DbPool,
}

impl RefreshSessionRepository {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for RefreshSessionRepository {
    #[tracing::instrument(level = "debug", skip(self, session), fields(session.id = %session.id), err)]
    async fn create(&self, session: &RefreshSession) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO refresh_sessions
                (id, user_id, token_hash, expires_at, revoked_at, ip_address, user_agent, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(&session.token_hash)
        .bind(session.expires_at)
        .bind(session.revoked_at)
        .bind(&session.ip_address)
        .bind(&session.user_agent)
        .bind(session.created_at)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn find_active(&self, session_id: Uuid, user_id: Uuid) -> Result<Option<RefreshSession>> {
        let session = sqlx::query_as::<_, RefreshSession>(
            r"
            SELECT id, user_id, token_hash, expires_at, revoked_at, ip_address, user_agent, created_at
            FROM refresh_sessions
            WHERE id = $1 AND user_id = $2 AND revoked_at IS NULL
            ",
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(session)
    }

    /// Compare-and-set on `revoked_at`: the row transitions at most once,
    /// and only the caller whose UPDATE touched it sees `true`. Rows are
    /// kept after revocation.
    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn revoke(&self, session_id: Uuid) -> Result<bool> {
        let result =
            sqlx::query("UPDATE refresh_sessions SET revoked_at = NOW() WHERE id = $1 AND revoked_at IS NULL")
                .bind(session_id)
                .execute(&self.pool)
                .await
                .map_err(AppError::Database)?;

        Ok(result.rows_affected() == 1)
    }
}
