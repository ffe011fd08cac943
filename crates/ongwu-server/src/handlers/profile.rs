//! User profile endpoints.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use crate::auth::CurrentUser;
use crate::auth::password::{hash_password, verify_password};
use crate::error::AppError;
use crate::handlers::response::{MessageResponse, ProfileResponse};
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    pub username: String,
    pub old_password: String,
    #[serde(default)]
    pub new_password: Option<String>,
}

/// GET /api/user/profile
#[instrument(skip_all, fields(user_id = user.user_id))]
pub async fn get_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ProfileResponse>, AppError> {
    let record = state
        .store()
        .user_by_id(user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(ProfileResponse {
        success: true,
        user: record,
    }))
}

/// PUT /api/user/profile
///
/// Cambia username y/o contrasena. Siempre exige la contrasena actual.
#[instrument(skip_all, fields(user_id = user.user_id))]
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<ProfileUpdateRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let username = body.username.trim();
    if username.is_empty() || body.old_password.is_empty() {
        return Err(AppError::BadRequest(
            "Username and current password are required".to_string(),
        ));
    }

    let record = state
        .store()
        .user_by_id(user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !verify_password(&body.old_password, &record.password_hash) {
        return Err(AppError::BadRequest(
            "Current password is incorrect".to_string(),
        ));
    }

    if username != record.username
        && state.store().user_by_username(username).await?.is_some()
    {
        return Err(AppError::BadRequest("Username already taken".to_string()));
    }

    let password_hash = match body.new_password.as_deref() {
        Some(new_password) => {
            if new_password.len() < MIN_PASSWORD_LEN {
                return Err(AppError::BadRequest(format!(
                    "Password must be at least {} characters",
                    MIN_PASSWORD_LEN
                )));
            }
            hash_password(new_password).map_err(|e| AppError::Internal(e.to_string()))?
        }
        None => record.password_hash.clone(),
    };

    state
        .store()
        .update_user_credentials(user.user_id, username, &password_hash)
        .await?;

    state.cache().invalidate_user(user.user_id).await;

    tracing::info!(user_id = user.user_id, "Profile updated");

    Ok(Json(MessageResponse::ok("Profile updated")))
}
