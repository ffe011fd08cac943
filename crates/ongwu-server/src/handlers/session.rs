//! Session endpoints: login, register, logout, verify.

use axum::{Json, extract::State};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use tracing::instrument;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::TOKEN_VALIDITY;
use crate::auth::{CurrentUser, SESSION_COOKIE};
use crate::error::AppError;
use crate::handlers::response::{MessageResponse, SessionResponse, UserSummary, VerifyResponse};
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(TOKEN_VALIDITY)
        .build()
}

fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::from(SESSION_COOKIE);
    cookie.set_path("/");
    cookie
}

/// POST /api/auth/login
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<CredentialsRequest>,
) -> Result<(CookieJar, Json<SessionResponse>), AppError> {
    if body.username.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }

    // Mismo mensaje para usuario inexistente y contrasena incorrecta
    let user = state
        .store()
        .user_by_username(body.username.trim())
        .await?
        .filter(|u| verify_password(&body.password, &u.password_hash))
        .ok_or_else(|| AppError::Unauthorized("Invalid username or password".to_string()))?;

    let token = state
        .issuer()
        .issue(user.id, &user.username)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok((
        jar.add(session_cookie(token.clone())),
        Json(SessionResponse {
            success: true,
            user: UserSummary::from(&user),
            token,
        }),
    ))
}

/// POST /api/auth/register
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<CredentialsRequest>,
) -> Result<(CookieJar, Json<SessionResponse>), AppError> {
    let username = body.username.trim();
    if username.is_empty() || body.password.is_empty() {
        return Err(AppError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }
    if body.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if state.store().user_by_username(username).await?.is_some() {
        return Err(AppError::BadRequest("Username already taken".to_string()));
    }

    let password_hash =
        hash_password(&body.password).map_err(|e| AppError::Internal(e.to_string()))?;
    let user = state.store().create_user(username, &password_hash).await?;

    let token = state
        .issuer()
        .issue(user.id, &user.username)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::info!(user_id = user.id, "User registered");

    Ok((
        jar.add(session_cookie(token.clone())),
        Json(SessionResponse {
            success: true,
            user: UserSummary::from(&user),
            token,
        }),
    ))
}

/// POST /api/auth/logout
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    // La verificacion cacheada del token muere con la sesion
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.cache().invalidate_token(cookie.value()).await;
    }

    (
        jar.remove(removal_cookie()),
        Json(MessageResponse::ok("Logged out")),
    )
}

/// GET /api/auth/verify
#[instrument(skip_all)]
pub async fn verify(CurrentUser(identity): CurrentUser) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        success: true,
        user: UserSummary::from(identity),
    })
}
