//! Shared wire shapes.
//!
//! Todas las respuestas llevan el flag `success`; los fallos llevan
//! ademas `message`. Ver [`crate::error::AppError`] para el lado de
//! error.

use ongwu_core::{Category, Note, User};
use serde::Serialize;

use crate::auth::VerifiedIdentity;

/// Respuesta generica de exito con mensaje.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Usuario en el wire: id y username, nunca el hash.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

impl From<VerifiedIdentity> for UserSummary {
    fn from(identity: VerifiedIdentity) -> Self {
        Self {
            id: identity.user_id,
            username: identity.username,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub success: bool,
    pub user: UserSummary,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub success: bool,
    pub user: UserSummary,
}

#[derive(Debug, Serialize)]
pub struct NotesResponse {
    pub success: bool,
    pub notes: Vec<Note>,
}

#[derive(Debug, Serialize)]
pub struct NoteResponse {
    pub success: bool,
    pub note: Note,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub success: bool,
    pub categories: Vec<Category>,
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub success: bool,
    pub category: Category,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub user: User,
}
