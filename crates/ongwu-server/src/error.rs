use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ongwu_db::StoreError;
use serde::Serialize;

/// Errores de handlers. Todos se renderizan con el shape uniforme
/// `{success: false, message}`.
#[derive(Debug)]
pub enum AppError {
    /// Recurso inexistente o de otro usuario
    NotFound(String),

    /// Parametros invalidos
    BadRequest(String),

    /// Credenciales de login rechazadas
    Unauthorized(String),

    /// Error interno. El detalle va al log, no al caller.
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "Handler failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
            }
        };

        let body = Json(ErrorBody {
            success: false,
            message,
        });

        (status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => AppError::BadRequest(msg),
            other => AppError::Internal(other.to_string()),
        }
    }
}
