//! Category endpoints.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tracing::instrument;

use crate::auth::CurrentUser;
use crate::cache::{CacheKey, ResourceKind};
use crate::error::AppError;
use crate::handlers::response::{CategoriesResponse, CategoryResponse, MessageResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPayload {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Orden manual opcional; solo lo toca el PUT.
    #[serde(default)]
    pub sort_order: Option<i32>,
}

/// GET /api/categories
#[instrument(skip_all, fields(user_id = user.user_id))]
pub async fn list_categories(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let key = CacheKey::categories(user.user_id);

    if let Some(entry) = state.cache().get(&key).await {
        return Ok(Json(entry.payload().clone()));
    }

    let categories = state.store().categories_for_user(user.user_id).await?;
    let payload = serde_json::to_value(CategoriesResponse {
        success: true,
        categories,
    })
    .map_err(|e| AppError::Internal(e.to_string()))?;

    state.cache().insert(key, payload.clone()).await;

    Ok(Json(payload))
}

/// POST /api/categories
#[instrument(skip_all, fields(user_id = user.user_id))]
pub async fn create_category(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<CategoryPayload>,
) -> Result<Json<CategoryResponse>, AppError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest(
            "Category name cannot be empty".to_string(),
        ));
    }

    let category = state
        .store()
        .create_category(name, body.description.as_deref(), user.user_id)
        .await?;

    state
        .cache()
        .invalidate_resource(ResourceKind::Categories, user.user_id)
        .await;

    Ok(Json(CategoryResponse {
        success: true,
        category,
    }))
}

/// PUT /api/categories/{id}
#[instrument(skip_all, fields(user_id = user.user_id, category_id = id))]
pub async fn update_category(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(body): Json<CategoryPayload>,
) -> Result<Json<CategoryResponse>, AppError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest(
            "Category name cannot be empty".to_string(),
        ));
    }

    let mut category = state
        .store()
        .update_category(id, name, body.description.as_deref(), user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    if let Some(sort_order) = body.sort_order {
        state
            .store()
            .set_category_sort_order(id, sort_order, user.user_id)
            .await?;
        category.sort_order = sort_order;
    }

    // Las notas cacheadas embeben el nombre de la categoria
    state.cache().invalidate_user(user.user_id).await;

    Ok(Json(CategoryResponse {
        success: true,
        category,
    }))
}

/// DELETE /api/categories/{id}
#[instrument(skip_all, fields(user_id = user.user_id, category_id = id))]
pub async fn delete_category(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.store().delete_category(id, user.user_id).await? {
        return Err(AppError::NotFound("Category not found".to_string()));
    }

    // Invalida ambos namespaces: las notas resuelven el nombre de su
    // categoria en la lectura
    state.cache().invalidate_user(user.user_id).await;

    Ok(Json(MessageResponse::ok("Category deleted")))
}
