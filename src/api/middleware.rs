use crate::api::AppState;
use crate::error::AppError;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use uuid::Uuid;

/// Extractor for routes that require a valid access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts.headers.get(header::AUTHORIZATION).ok_or(AppError::InvalidToken)?;

        let auth_str = auth_header.to_str().map_err(|_| AppError::InvalidToken)?;
        let token = auth_str.strip_prefix("Bearer ").ok_or(AppError::InvalidToken)?;

        let claims = state.auth_service.verify_access(token)?;

        Ok(Self { user_id: claims.sub })
    }
}
