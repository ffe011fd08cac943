//! In-memory store.
//!
//! Implementa el mismo contrato que [`PostgresStore`] sobre tablas en
//! memoria. Lo usan los tests de integracion y el modo
//! `ONGWU_STORE=memory` para desarrollo local sin base de datos.

use async_trait::async_trait;
use ongwu_core::{Category, Note, User};
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::store::OngwuStore;

#[derive(Debug, Clone)]
struct CategoryRecord {
    category: Category,
    deleted_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone)]
struct NoteRecord {
    note: Note,
    deleted_at: Option<OffsetDateTime>,
}

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    categories: Vec<CategoryRecord>,
    notes: Vec<NoteRecord>,
    next_user_id: i64,
    next_category_id: i64,
    next_note_id: i64,
}

/// Store en memoria, thread-safe.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn live_category_name(tables: &Tables, category_id: Option<i64>) -> Option<String> {
    let id = category_id?;
    tables
        .categories
        .iter()
        .find(|r| r.category.id == id && r.deleted_at.is_none())
        .map(|r| r.category.name.clone())
}

/// Resuelve `category_name` en el momento de la lectura, igual que el
/// LEFT JOIN del backend SQL.
fn with_category_name(tables: &Tables, record: &NoteRecord) -> Note {
    let mut note = record.note.clone();
    note.category_name = live_category_name(tables, note.category_id);
    note
}

#[async_trait]
impl OngwuStore for MemoryStore {
    async fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn user_by_id(&self, id: i64) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.username == username) {
            return Err(StoreError::Conflict(format!(
                "username '{}' already exists",
                username
            )));
        }

        tables.next_user_id += 1;
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: tables.next_user_id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn update_user_credentials(
        &self,
        id: i64,
        username: &str,
        password_hash: &str,
    ) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .iter()
            .any(|u| u.id != id && u.username == username)
        {
            return Err(StoreError::Conflict(format!(
                "username '{}' already exists",
                username
            )));
        }

        match tables.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.username = username.to_string();
                user.password_hash = password_hash.to_string();
                user.updated_at = OffsetDateTime::now_utc();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn user_count(&self) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables.users.len() as i64)
    }

    async fn categories_for_user(&self, user_id: i64) -> Result<Vec<Category>> {
        let tables = self.tables.read().await;
        let mut categories: Vec<Category> = tables
            .categories
            .iter()
            .filter(|r| r.category.user_id == user_id && r.deleted_at.is_none())
            .map(|r| r.category.clone())
            .collect();
        categories.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(categories)
    }

    async fn create_category(
        &self,
        name: &str,
        description: Option<&str>,
        user_id: i64,
    ) -> Result<Category> {
        let mut tables = self.tables.write().await;
        tables.next_category_id += 1;
        let now = OffsetDateTime::now_utc();
        let category = Category {
            id: tables.next_category_id,
            name: name.to_string(),
            description: description.map(String::from),
            user_id,
            sort_order: 0,
            created_at: now,
            updated_at: now,
        };
        tables.categories.push(CategoryRecord {
            category: category.clone(),
            deleted_at: None,
        });
        Ok(category)
    }

    async fn update_category(
        &self,
        id: i64,
        name: &str,
        description: Option<&str>,
        user_id: i64,
    ) -> Result<Option<Category>> {
        let mut tables = self.tables.write().await;
        let record = tables.categories.iter_mut().find(|r| {
            r.category.id == id && r.category.user_id == user_id && r.deleted_at.is_none()
        });

        match record {
            Some(record) => {
                record.category.name = name.to_string();
                record.category.description = description.map(String::from);
                record.category.updated_at = OffsetDateTime::now_utc();
                Ok(Some(record.category.clone()))
            }
            None => Ok(None),
        }
    }

    async fn set_category_sort_order(
        &self,
        id: i64,
        sort_order: i32,
        user_id: i64,
    ) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let record = tables.categories.iter_mut().find(|r| {
            r.category.id == id && r.category.user_id == user_id && r.deleted_at.is_none()
        });

        match record {
            Some(record) => {
                record.category.sort_order = sort_order;
                record.category.updated_at = OffsetDateTime::now_utc();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_category(&self, id: i64, user_id: i64) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let record = tables.categories.iter_mut().find(|r| {
            r.category.id == id && r.category.user_id == user_id && r.deleted_at.is_none()
        });

        match record {
            Some(record) => {
                record.deleted_at = Some(OffsetDateTime::now_utc());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn notes_for_user(&self, user_id: i64) -> Result<Vec<Note>> {
        let tables = self.tables.read().await;
        let mut notes: Vec<Note> = tables
            .notes
            .iter()
            .filter(|r| r.note.user_id == user_id && r.deleted_at.is_none())
            .map(|r| with_category_name(&tables, r))
            .collect();
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(notes)
    }

    async fn notes_in_category(&self, category_id: i64, user_id: i64) -> Result<Vec<Note>> {
        let tables = self.tables.read().await;
        let mut notes: Vec<Note> = tables
            .notes
            .iter()
            .filter(|r| {
                r.note.user_id == user_id
                    && r.note.category_id == Some(category_id)
                    && r.deleted_at.is_none()
            })
            .map(|r| with_category_name(&tables, r))
            .collect();
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(notes)
    }

    async fn note_by_id(&self, id: i64, user_id: i64) -> Result<Option<Note>> {
        let tables = self.tables.read().await;
        Ok(tables
            .notes
            .iter()
            .find(|r| r.note.id == id && r.note.user_id == user_id && r.deleted_at.is_none())
            .map(|r| with_category_name(&tables, r)))
    }

    async fn create_note(
        &self,
        title: &str,
        content: &str,
        category_id: Option<i64>,
        user_id: i64,
    ) -> Result<Note> {
        let mut tables = self.tables.write().await;
        tables.next_note_id += 1;
        let now = OffsetDateTime::now_utc();
        let note = Note {
            id: tables.next_note_id,
            title: title.to_string(),
            content: content.to_string(),
            category_id,
            category_name: live_category_name(&tables, category_id),
            user_id,
            created_at: now,
            updated_at: now,
        };
        tables.notes.push(NoteRecord {
            note: note.clone(),
            deleted_at: None,
        });
        Ok(note)
    }

    async fn update_note(
        &self,
        id: i64,
        title: &str,
        content: &str,
        category_id: Option<i64>,
        user_id: i64,
    ) -> Result<Option<Note>> {
        let mut tables = self.tables.write().await;
        let category_name = live_category_name(&tables, category_id);
        let record = tables
            .notes
            .iter_mut()
            .find(|r| r.note.id == id && r.note.user_id == user_id && r.deleted_at.is_none());

        match record {
            Some(record) => {
                record.note.title = title.to_string();
                record.note.content = content.to_string();
                record.note.category_id = category_id;
                record.note.category_name = category_name;
                record.note.updated_at = OffsetDateTime::now_utc();
                Ok(Some(record.note.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_note(&self, id: i64, user_id: i64) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let record = tables
            .notes
            .iter_mut()
            .find(|r| r.note.id == id && r.note.user_id == user_id && r.deleted_at.is_none());

        match record {
            Some(record) => {
                record.deleted_at = Some(OffsetDateTime::now_utc());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn search_notes(&self, query: &str, user_id: i64) -> Result<Vec<Note>> {
        let needle = query.to_lowercase();
        let tables = self.tables.read().await;
        let mut notes: Vec<Note> = tables
            .notes
            .iter()
            .filter(|r| {
                r.note.user_id == user_id
                    && r.deleted_at.is_none()
                    && (r.note.title.to_lowercase().contains(&needle)
                        || r.note.content.to_lowercase().contains(&needle))
            })
            .map(|r| with_category_name(&tables, r))
            .collect();
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(notes)
    }
}
