use crate::config::AuthConfig;
use crate::domain::user::User;
use crate::error::{AppError, Result};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

const MIN_SECRET_BYTES: usize = 32;

/// Startup-only failures. None of these are recoverable; the process must
/// refuse to serve traffic when construction fails.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} secret must be at least {MIN_SECRET_BYTES} bytes")]
    SecretTooShort { name: &'static str },
    #[error("unparseable ttl {raw:?}")]
    InvalidTtl { raw: String },
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessClaims {
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies access and refresh tokens with two independent HS256
/// keys. Secrets are validated once here; the codec is immutable afterwards
/// and cheap to clone into every service that needs it.
#[derive(Clone)]
pub struct TokenCodec {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Builds the codec from validated configuration.
    ///
    /// # Errors
    /// Returns `ConfigError` if either secret is shorter than 256 bits or
    /// either TTL string does not parse.
    pub fn new(config: &AuthConfig) -> std::result::Result<Self, ConfigError> {
        if config.access_secret.len() < MIN_SECRET_BYTES {
            return Err(ConfigError::SecretTooShort { name: "access token" });
        }
        if config.refresh_secret.len() < MIN_SECRET_BYTES {
            return Err(ConfigError::SecretTooShort { name: "refresh token" });
        }

        Ok(Self {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            access_ttl: parse_ttl(&config.access_ttl)?,
            refresh_ttl: parse_ttl(&config.refresh_ttl)?,
        })
    }

    #[must_use]
    pub const fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    #[must_use]
    pub const fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Signs a short-lived access token carrying the user's identity claims.
    ///
    /// # Errors
    /// Returns `AppError::Internal` if encoding fails.
    pub fn sign_access(&self, user: &User) -> Result<String> {
        let iat = OffsetDateTime::now_utc().unix_timestamp();
        let claims = AccessClaims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role.clone(),
            iat,
            exp: iat + ttl_secs(self.access_ttl),
        };
        encode(&Header::default(), &claims, &self.access_encoding).map_err(|_| AppError::Internal)
    }

    /// Signs a refresh token bound to a persisted session via its `jti`.
    ///
    /// # Errors
    /// Returns `AppError::Internal` if encoding fails.
    pub fn sign_refresh(&self, user_id: Uuid, session_id: Uuid) -> Result<String> {
        let iat = OffsetDateTime::now_utc().unix_timestamp();
        let claims = RefreshClaims {
            sub: user_id,
            jti: session_id,
            iat,
            exp: iat + ttl_secs(self.refresh_ttl),
        };
        encode(&Header::default(), &claims, &self.refresh_encoding).map_err(|_| AppError::Internal)
    }

    /// # Errors
    /// Returns `AppError::InvalidToken` on a bad signature, malformed
    /// structure, missing claim or expiry.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims> {
        decode::<AccessClaims>(token, &self.access_decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| AppError::InvalidToken)
    }

    /// # Errors
    /// Returns `AppError::InvalidToken` on a bad signature, malformed
    /// structure, missing claim or expiry.
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims> {
        decode::<RefreshClaims>(token, &self.refresh_decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| AppError::InvalidToken)
    }
}

/// Hashes a signed token with SHA-256 for storage. The raw token string
/// never reaches the database.
#[must_use]
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[allow(clippy::cast_possible_wrap)]
const fn ttl_secs(ttl: Duration) -> i64 {
    ttl.as_secs() as i64
}

/// Parses a TTL string: an integer with an `ms`, `s`, `m`, `h` or `d`
/// suffix. A bare integer is seconds.
fn parse_ttl(raw: &str) -> std::result::Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidTtl { raw: raw.to_string() };
    let value = raw.trim().to_lowercase();

    let (digits, multiplier_ms) = if let Some(rest) = value.strip_suffix("ms") {
        (rest, 1)
    } else if let Some(rest) = value.strip_suffix('s') {
        (rest, 1_000)
    } else if let Some(rest) = value.strip_suffix('m') {
        (rest, 60 * 1_000)
    } else if let Some(rest) = value.strip_suffix('h') {
        (rest, 60 * 60 * 1_000)
    } else if let Some(rest) = value.strip_suffix('d') {
        (rest, 24 * 60 * 60 * 1_000)
    } else {
        (value.as_str(), 1_000)
    };

    let count: u64 = digits.parse().map_err(|_| invalid())?;
    count.checked_mul(multiplier_ms).map(Duration::from_millis).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_config(access_ttl: &str, refresh_ttl: &str) -> AuthConfig {
        AuthConfig {
            access_secret: "an-access-secret-of-thirty-two-bytes!".to_string(),
            refresh_secret: "a-refresh-secret-of-thirty-two-bytes".to_string(),
            access_ttl: access_ttl.to_string(),
            refresh_ttl: refresh_ttl.to_string(),
        }
    }

    fn codec() -> TokenCodec {
        TokenCodec::new(&auth_config("15m", "7d")).unwrap()
    }

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@example.edu".to_string(),
            password_hash: None,
            role: "student".to_string(),
            status: "active".to_string(),
            created_at: OffsetDateTime::now_utc(),
            last_login_at: None,
        }
    }

    #[test]
    fn access_token_roundtrip() {
        let codec = codec();
        let user = sample_user();

        let token = codec.sign_access(&user).unwrap();
        let claims = codec.verify_access(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.role, user.role);
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn refresh_token_roundtrip() {
        let codec = codec();
        let user_id = Uuid::new_v4();
        let session_id = Uuid::new_v4();

        let token = codec.sign_refresh(user_id, session_id).unwrap();
        let claims = codec.verify_refresh(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.jti, session_id);
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn tokens_do_not_verify_across_key_boundaries() {
        let codec = codec();
        let user = sample_user();

        let access = codec.sign_access(&user).unwrap();
        let refresh = codec.sign_refresh(user.id, Uuid::new_v4()).unwrap();

        assert!(matches!(codec.verify_refresh(&access), Err(AppError::InvalidToken)));
        assert!(matches!(codec.verify_access(&refresh), Err(AppError::InvalidToken)));
    }

    #[test]
    fn tampered_token_fails() {
        let codec = codec();
        let token = codec.sign_access(&sample_user()).unwrap();

        let mut bytes = token.into_bytes();
        let last = bytes.len() - 1;
        bytes[last] = if bytes[last] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();

        assert!(matches!(codec.verify_access(&tampered), Err(AppError::InvalidToken)));
    }

    #[test]
    fn expired_token_fails() {
        let codec = codec();
        let user = sample_user();

        // Expired well beyond the default verification leeway.
        let iat = OffsetDateTime::now_utc().unix_timestamp() - 1_000;
        let claims = AccessClaims {
            sub: user.id,
            email: user.email,
            role: user.role,
            iat,
            exp: iat + 120,
        };
        let expired = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(auth_config("15m", "7d").access_secret.as_bytes()),
        )
        .unwrap();

        assert!(matches!(codec.verify_access(&expired), Err(AppError::InvalidToken)));
    }

    #[test]
    fn short_secret_is_rejected() {
        let mut config = auth_config("15m", "7d");
        config.refresh_secret = "too-short".to_string();

        assert_eq!(
            TokenCodec::new(&config).unwrap_err(),
            ConfigError::SecretTooShort { name: "refresh token" }
        );
    }

    #[test]
    fn ttl_suffixes_parse() {
        assert_eq!(parse_ttl("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_ttl("45s").unwrap(), Duration::from_secs(45));
        assert_eq!(parse_ttl("15m").unwrap(), Duration::from_secs(15 * 60));
        assert_eq!(parse_ttl("2h").unwrap(), Duration::from_secs(2 * 60 * 60));
        assert_eq!(parse_ttl("7d").unwrap(), Duration::from_secs(7 * 24 * 60 * 60));
    }

    #[test]
    fn bare_ttl_is_seconds() {
        assert_eq!(parse_ttl("900").unwrap(), Duration::from_secs(900));
    }

    #[test]
    fn garbage_ttl_is_rejected() {
        for raw in ["", "soon", "15 m", "m15", "-5s", "1.5h"] {
            assert!(matches!(parse_ttl(raw), Err(ConfigError::InvalidTtl { .. })), "{raw:?}");
        }
    }

    #[test]
    fn token_hash_is_stable_and_one_way() {
        let token = "header.payload.signature";
        assert_eq!(hash_token(token), hash_token(token));
        assert_ne!(hash_token(token), token);
        assert_eq!(hash_token(token).len(), 64);
    }
}
