//! Markdown import/export endpoints.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use ongwu_core::markdown;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::instrument;

use crate::auth::CurrentUser;
use crate::cache::ResourceKind;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    /// "all" (default) o "category".
    #[serde(default, rename = "type")]
    pub scope: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    pub category_id: i64,
    pub files: Vec<ImportFile>,
}

#[derive(Debug, Deserialize)]
pub struct ImportFile {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportFileResult {
    pub filename: String,
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ImportSummary {
    pub total: usize,
    pub success: usize,
    pub error: usize,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub success: bool,
    pub message: String,
    pub results: Vec<ImportFileResult>,
    pub summary: ImportSummary,
}

/// POST /api/export
///
/// Renderiza las notas del usuario (todas o una categoria) en un unico
/// documento Markdown y lo sirve como attachment.
#[instrument(skip_all, fields(user_id = user.user_id))]
pub async fn export_notes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<ExportRequest>,
) -> Result<Response, AppError> {
    let categories = state.store().categories_for_user(user.user_id).await?;

    let (notes, scope_label) = match (body.scope.as_deref(), body.category_id) {
        (Some("category"), Some(category_id)) => {
            let category = categories
                .iter()
                .find(|c| c.id == category_id)
                .ok_or_else(|| AppError::BadRequest("Category not found".to_string()))?;
            let notes = state
                .store()
                .notes_in_category(category_id, user.user_id)
                .await?;
            (notes, markdown::sanitize_filename(&category.name))
        }
        (Some("category"), None) => {
            return Err(AppError::BadRequest(
                "categoryId is required for category export".to_string(),
            ));
        }
        _ => {
            let notes = state.store().notes_for_user(user.user_id).await?;
            (notes, "all".to_string())
        }
    };

    let now = OffsetDateTime::now_utc();
    let document = markdown::export_document(&notes, &categories, now);

    let date = now
        .format(&format_description!("[year]-[month]-[day]"))
        .unwrap_or_default();
    let filename = markdown::sanitize_filename(&format!("ongwu_notes_{}_{}.md", scope_label, date));

    tracing::info!(notes = notes.len(), "Notes exported");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        document,
    )
        .into_response())
}

/// POST /api/import
///
/// Importa archivos `.md` como notas en la categoria destino. Cada
/// archivo reporta su resultado; un archivo invalido no aborta el lote.
#[instrument(skip_all, fields(user_id = user.user_id))]
pub async fn import_notes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<ImportRequest>,
) -> Result<Json<ImportResponse>, AppError> {
    if body.files.is_empty() {
        return Err(AppError::BadRequest("No files to import".to_string()));
    }

    let categories = state.store().categories_for_user(user.user_id).await?;
    if !categories.iter().any(|c| c.id == body.category_id) {
        return Err(AppError::BadRequest(
            "Target category does not exist".to_string(),
        ));
    }

    let mut results = Vec::with_capacity(body.files.len());
    let mut imported = 0usize;
    let mut failed = 0usize;

    for file in &body.files {
        let Some(title) = markdown::note_title_from_filename(&file.name) else {
            failed += 1;
            results.push(ImportFileResult {
                filename: file.name.clone(),
                success: false,
                message: "Only .md files are supported".to_string(),
                note_id: None,
            });
            continue;
        };

        match state
            .store()
            .create_note(&title, &file.content, Some(body.category_id), user.user_id)
            .await
        {
            Ok(note) => {
                imported += 1;
                results.push(ImportFileResult {
                    filename: file.name.clone(),
                    success: true,
                    message: "Imported".to_string(),
                    note_id: Some(note.id),
                });
            }
            Err(err) => {
                failed += 1;
                tracing::error!(filename = %file.name, error = %err, "Import failed");
                results.push(ImportFileResult {
                    filename: file.name.clone(),
                    success: false,
                    message: "Import failed".to_string(),
                    note_id: None,
                });
            }
        }
    }

    if imported > 0 {
        state
            .cache()
            .invalidate_resource(ResourceKind::Notes, user.user_id)
            .await;
    }

    tracing::info!(imported = imported, failed = failed, "Import finished");

    Ok(Json(ImportResponse {
        success: true,
        message: format!("Import finished: {} succeeded, {} failed", imported, failed),
        results,
        summary: ImportSummary {
            total: body.files.len(),
            success: imported,
            error: failed,
        },
    }))
}
