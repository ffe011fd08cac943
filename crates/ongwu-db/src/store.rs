//! Storage trait.
//!
//! Todas las lecturas filtran filas soft-deleted; los deletes marcan
//! `deleted_at` en lugar de borrar. Cada operacion sobre notas o
//! categorias exige el `user_id` propietario, de forma que un usuario no
//! puede tocar filas ajenas por construccion.

use async_trait::async_trait;
use ongwu_core::{Category, Note, User};

use crate::error::Result;

/// Operaciones de persistencia del servicio.
#[async_trait]
pub trait OngwuStore: Send + Sync {
    // Usuarios

    async fn user_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn user_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Crea un usuario. Falla con `StoreError::Conflict` si el username
    /// ya existe.
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User>;

    /// Actualiza username y hash de contrasena. Retorna false si el
    /// usuario no existe.
    async fn update_user_credentials(
        &self,
        id: i64,
        username: &str,
        password_hash: &str,
    ) -> Result<bool>;

    async fn user_count(&self) -> Result<i64>;

    // Categorias

    /// Categorias vivas del usuario, por orden manual y nombre.
    async fn categories_for_user(&self, user_id: i64) -> Result<Vec<Category>>;

    async fn create_category(
        &self,
        name: &str,
        description: Option<&str>,
        user_id: i64,
    ) -> Result<Category>;

    /// Retorna `None` si la categoria no existe o es de otro usuario.
    async fn update_category(
        &self,
        id: i64,
        name: &str,
        description: Option<&str>,
        user_id: i64,
    ) -> Result<Option<Category>>;

    async fn set_category_sort_order(
        &self,
        id: i64,
        sort_order: i32,
        user_id: i64,
    ) -> Result<bool>;

    /// Borrado blando. Retorna false si no habia fila viva que borrar.
    async fn delete_category(&self, id: i64, user_id: i64) -> Result<bool>;

    // Notas

    /// Notas vivas del usuario, mas recientes primero, con el nombre de
    /// su categoria resuelto.
    async fn notes_for_user(&self, user_id: i64) -> Result<Vec<Note>>;

    async fn notes_in_category(&self, category_id: i64, user_id: i64) -> Result<Vec<Note>>;

    async fn note_by_id(&self, id: i64, user_id: i64) -> Result<Option<Note>>;

    async fn create_note(
        &self,
        title: &str,
        content: &str,
        category_id: Option<i64>,
        user_id: i64,
    ) -> Result<Note>;

    /// Retorna `None` si la nota no existe o es de otro usuario.
    async fn update_note(
        &self,
        id: i64,
        title: &str,
        content: &str,
        category_id: Option<i64>,
        user_id: i64,
    ) -> Result<Option<Note>>;

    /// Borrado blando. Retorna false si no habia fila viva que borrar.
    async fn delete_note(&self, id: i64, user_id: i64) -> Result<bool>;

    /// Busqueda case-insensitive por titulo o contenido.
    async fn search_notes(&self, query: &str, user_id: i64) -> Result<Vec<Note>>;
}
