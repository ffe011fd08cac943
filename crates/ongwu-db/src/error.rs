//! Error del sistema de storage.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// El backend rechazo o perdio la operacion.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Violacion de unicidad (username duplicado).
    #[error("conflict: {0}")]
    Conflict(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
