use crate::domain::password;
use crate::domain::session::RefreshSession;
use crate::domain::token::{AccessClaims, TokenCodec, hash_token};
use crate::domain::user::User;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use opentelemetry::{global, metrics::Counter};
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use uuid::Uuid;

/// Read access to platform accounts, plus the single write the auth core
/// performs (the last-login timestamp).
#[async_trait]
pub trait UserStore: Send + Sync + std::fmt::Debug {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn record_login(&self, id: Uuid, at: OffsetDateTime) -> Result<()>;
}

/// Persistence for refresh sessions. Implementations must never hand back a
/// revoked row from `find_active`, and `revoke` must be a compare-and-set:
/// only one caller can ever observe the transition.
#[async_trait]
pub trait SessionStore: Send + Sync + std::fmt::Debug {
    async fn create(&self, session: &RefreshSession) -> Result<()>;
    async fn find_active(&self, session_id: Uuid, user_id: Uuid) -> Result<Option<RefreshSession>>;
    /// Returns true only when this call moved the row from active to revoked.
    async fn revoke(&self, session_id: Uuid) -> Result<bool>;
}

/// The pair handed out by login and refresh, along with the user they
/// belong to.
#[derive(Debug, Clone)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

#[derive(Clone, Debug)]
struct Metrics {
    login_total: Counter<u64>,
    refresh_total: Counter<u64>,
    logout_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("lectern-server");
        Self {
            login_total: meter
                .u64_counter("auth_login_total")
                .with_description("Total number of successful login attempts")
                .build(),
            refresh_total: meter
                .u64_counter("auth_refresh_total")
                .with_description("Total number of successful token rotations")
                .build(),
            logout_total: meter
                .u64_counter("auth_logout_total")
                .with_description("Total number of logout calls that revoked a session")
                .build(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuthService {
    codec: TokenCodec,
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    metrics: Metrics,
}

impl AuthService {
    pub fn new(codec: TokenCodec, users: Arc<dyn UserStore>, sessions: Arc<dyn SessionStore>) -> Self {
        Self { codec, users, sessions, metrics: Metrics::new() }
    }

    #[must_use]
    pub const fn refresh_ttl(&self) -> Duration {
        self.codec.refresh_ttl()
    }

    /// Checks an email/password pair against the stored representation.
    /// Unknown email and wrong password are indistinguishable to the caller.
    ///
    /// # Errors
    /// `AppError::InvalidCredentials` on any mismatch.
    #[tracing::instrument(skip_all, fields(user.id = tracing::field::Empty))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User> {
        let Some(user) = self.users.find_by_email(email).await? else {
            tracing::debug!("login rejected: unknown email");
            return Err(AppError::InvalidCredentials);
        };

        tracing::Span::current().record("user.id", tracing::field::display(user.id));

        let stored = user.password_hash.clone();
        let presented = password.to_string();
        let matched =
            tokio::task::spawn_blocking(move || password::matches_stored(stored.as_deref(), &presented))
                .await
                .map_err(|_| AppError::Internal)??;

        if !matched {
            tracing::debug!("login rejected: password mismatch");
            return Err(AppError::InvalidCredentials);
        }

        Ok(user)
    }

    /// # Errors
    /// `AppError::InvalidCredentials` on a bad pair; storage errors if the
    /// last-login write or session insert fails (the login then fails as a
    /// whole).
    #[tracing::instrument(
        skip(self, email, password),
        fields(user.id = tracing::field::Empty),
        err(level = "warn")
    )]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<AuthTokens> {
        let mut user = self.authenticate(email, password).await?;
        tracing::Span::current().record("user.id", tracing::field::display(user.id));

        let now = OffsetDateTime::now_utc();
        self.users.record_login(user.id, now).await?;
        user.last_login_at = Some(now);

        let session_id = Uuid::new_v4();
        let refresh_token = self.codec.sign_refresh(user.id, session_id)?;
        let session = self.new_session(session_id, user.id, &refresh_token, ip_address, user_agent);
        self.sessions.create(&session).await?;

        let access_token = self.codec.sign_access(&user)?;

        tracing::info!("login succeeded");
        self.metrics.login_total.add(1, &[]);
        Ok(AuthTokens { access_token, refresh_token, user })
    }

    /// Rotates a refresh token: the presented session is revoked before any
    /// replacement is issued, so a concurrent refresh of the same token
    /// loses the compare-and-set and fails.
    ///
    /// # Errors
    /// `InvalidToken`, `InvalidSession`, `SessionExpired` or `UserNotFound`
    /// per the step that rejects the attempt.
    #[tracing::instrument(
        skip(self, refresh_token),
        fields(user.id = tracing::field::Empty, session.id = tracing::field::Empty),
        err(level = "warn")
    )]
    pub async fn refresh(
        &self,
        refresh_token: &str,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<AuthTokens> {
        let claims = self.codec.verify_refresh(refresh_token)?;
        tracing::Span::current().record("user.id", tracing::field::display(claims.sub));
        tracing::Span::current().record("session.id", tracing::field::display(claims.jti));

        let session =
            self.sessions.find_active(claims.jti, claims.sub).await?.ok_or(AppError::InvalidSession)?;

        // A valid id whose token string was swapped is treated the same as an
        // unknown session.
        if session.token_hash != hash_token(refresh_token) {
            tracing::warn!("refresh rejected: token hash mismatch");
            return Err(AppError::InvalidSession);
        }

        if session.is_expired() {
            self.sessions.revoke(session.id).await?;
            return Err(AppError::SessionExpired);
        }

        // One-time use: the old session must be revoked before a replacement
        // exists anywhere. Losing this compare-and-set means another call
        // already consumed the token.
        if !self.sessions.revoke(session.id).await? {
            return Err(AppError::InvalidSession);
        }

        let user = self.users.find_by_id(claims.sub).await?.ok_or(AppError::UserNotFound)?;

        let session_id = Uuid::new_v4();
        let new_refresh_token = self.codec.sign_refresh(user.id, session_id)?;
        let session = self.new_session(session_id, user.id, &new_refresh_token, ip_address, user_agent);
        self.sessions.create(&session).await?;

        let access_token = self.codec.sign_access(&user)?;

        tracing::info!("refresh token rotated");
        self.metrics.refresh_total.add(1, &[]);
        Ok(AuthTokens { access_token, refresh_token: new_refresh_token, user })
    }

    /// Best-effort revocation. Never fails: a malformed token, an unknown
    /// session or a repeat call all land here silently.
    #[tracing::instrument(skip_all)]
    pub async fn logout(&self, refresh_token: &str) {
        match self.try_logout(refresh_token).await {
            Ok(true) => {
                tracing::info!("session revoked on logout");
                self.metrics.logout_total.add(1, &[]);
            }
            Ok(false) => tracing::debug!("logout found no active session"),
            Err(e) => tracing::debug!(error = ?e, "logout ignored an invalid token"),
        }
    }

    async fn try_logout(&self, refresh_token: &str) -> Result<bool> {
        let claims = self.codec.verify_refresh(refresh_token)?;
        let Some(session) = self.sessions.find_active(claims.jti, claims.sub).await? else {
            return Ok(false);
        };
        self.sessions.revoke(session.id).await
    }

    /// Resolves the account behind an access token's subject claim.
    ///
    /// # Errors
    /// `AppError::UserNotFound` when the subject no longer exists.
    pub async fn get_user_by_id(&self, id: Uuid) -> Result<User> {
        self.users.find_by_id(id).await?.ok_or(AppError::UserNotFound)
    }

    /// # Errors
    /// `AppError::InvalidToken` on any verification failure.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims> {
        self.codec.verify_access(token)
    }

    fn new_session(
        &self,
        id: Uuid,
        user_id: Uuid,
        refresh_token: &str,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> RefreshSession {
        let now = OffsetDateTime::now_utc();
        RefreshSession {
            id,
            user_id,
            token_hash: hash_token(refresh_token),
            expires_at: now + self.codec.refresh_ttl(),
            revoked_at: None,
            ip_address,
            user_agent,
            created_at: now,
        }
    }
}
