use crate::api::AppState;
use crate::api::cookies;
use crate::api::middleware::AuthUser;
use crate::api::schemas::auth::{AuthResponse, Login, UserProfile};
use crate::error::{AppError, Result};
use crate::services::auth_service::AuthTokens;
use axum::{
    Json,
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use axum_extra::extract::CookieJar;
use std::net::SocketAddr;

pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(payload): Json<Login>,
) -> Result<impl IntoResponse> {
    let tokens = state
        .auth_service
        .login(&payload.email, &payload.password, Some(addr.ip().to_string()), user_agent(&headers))
        .await?;

    Ok(issue(jar, &state, tokens))
}

/// Reads the refresh token from its cookie; there is no request body.
pub async fn refresh(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<impl IntoResponse> {
    let refresh_token = cookies::refresh_token(&jar).ok_or(AppError::InvalidToken)?;

    let tokens = state
        .auth_service
        .refresh(&refresh_token, Some(addr.ip().to_string()), user_agent(&headers))
        .await?;

    Ok(issue(jar, &state, tokens))
}

/// Best-effort revocation; the cookie is cleared no matter what.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if let Some(refresh_token) = cookies::refresh_token(&jar) {
        state.auth_service.logout(&refresh_token).await;
    }

    (jar.add(cookies::clear_refresh_cookie(&state.config.cookies)), StatusCode::NO_CONTENT)
}

pub async fn me(auth_user: AuthUser, State(state): State<AppState>) -> Result<Json<UserProfile>> {
    let user = state.auth_service.get_user_by_id(auth_user.user_id).await?;

    Ok(Json(UserProfile {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
        status: user.status,
        created_at: user.created_at,
        last_login_at: user.last_login_at,
    }))
}

fn issue(jar: CookieJar, state: &AppState, tokens: AuthTokens) -> (CookieJar, Json<AuthResponse>) {
    let cookie =
        cookies::refresh_cookie(&state.config.cookies, tokens.refresh_token, state.auth_service.refresh_ttl());

    let user = tokens.user;
    let body = AuthResponse {
        access_token: tokens.access_token,
        token_type: "Bearer",
        user_id: user.id,
        email: user.email,
        name: user.name,
        role: user.role,
    };

    (jar.add(cookie), Json(body))
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers.get(header::USER_AGENT).and_then(|value| value.to_str().ok()).map(str::to_string)
}
