//! PostgreSQL store backed by sqlx.

use async_trait::async_trait;
use ongwu_core::{Category, Note, User};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{query, query_as, query_scalar};
use time::OffsetDateTime;

use crate::error::{Result, StoreError};
use crate::store::OngwuStore;

/// Esquema embebido. `migrate()` lo ejecuta en el arranque; todas las
/// sentencias son idempotentes.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS ongwu_users (
    id BIGSERIAL PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS ongwu_categories (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    user_id BIGINT NOT NULL REFERENCES ongwu_users(id) ON DELETE CASCADE,
    sort_order INTEGER NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at TIMESTAMPTZ
);

CREATE TABLE IF NOT EXISTS ongwu_notes (
    id BIGSERIAL PRIMARY KEY,
    title TEXT NOT NULL,
    content TEXT NOT NULL DEFAULT '',
    category_id BIGINT REFERENCES ongwu_categories(id) ON DELETE SET NULL,
    user_id BIGINT NOT NULL REFERENCES ongwu_users(id) ON DELETE CASCADE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at TIMESTAMPTZ
);

CREATE INDEX IF NOT EXISTS idx_ongwu_categories_user
    ON ongwu_categories(user_id) WHERE deleted_at IS NULL;
CREATE INDEX IF NOT EXISTS idx_ongwu_notes_user
    ON ongwu_notes(user_id) WHERE deleted_at IS NULL;
CREATE INDEX IF NOT EXISTS idx_ongwu_notes_category
    ON ongwu_notes(category_id);
"#;

const NOTE_COLUMNS: &str = r#"
    n.id, n.title, n.content, n.category_id, c.name AS category_name,
    n.user_id, n.created_at, n.updated_at
"#;

/// Store de produccion sobre un pool de conexiones PostgreSQL.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Abre el pool contra `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Construye el store sobre un pool existente.
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Crea tablas e indices si no existen.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        tracing::info!("Database schema ready");
        Ok(())
    }

    async fn joined_note(&self, id: i64, user_id: i64) -> Result<Option<Note>> {
        let row: Option<NoteRow> = query_as(&format!(
            "SELECT {NOTE_COLUMNS}
             FROM ongwu_notes n
             LEFT JOIN ongwu_categories c
                 ON n.category_id = c.id AND c.deleted_at IS NULL
             WHERE n.id = $1 AND n.user_id = $2 AND n.deleted_at IS NULL"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Note::from))
    }
}

#[async_trait]
impl OngwuStore for PostgresStore {
    async fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row: Option<UserRow> =
            query_as("SELECT * FROM ongwu_users WHERE username = $1")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(User::from))
    }

    async fn user_by_id(&self, id: i64) -> Result<Option<User>> {
        let row: Option<UserRow> = query_as("SELECT * FROM ongwu_users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User> {
        let row: UserRow = query_as(
            "INSERT INTO ongwu_users (username, password_hash)
             VALUES ($1, $2)
             RETURNING *",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(format!("username '{}' already exists", username))
            }
            _ => StoreError::Database(e),
        })?;

        Ok(User::from(row))
    }

    async fn update_user_credentials(
        &self,
        id: i64,
        username: &str,
        password_hash: &str,
    ) -> Result<bool> {
        let result = query(
            "UPDATE ongwu_users
             SET username = $1, password_hash = $2, updated_at = now()
             WHERE id = $3",
        )
        .bind(username)
        .bind(password_hash)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(format!("username '{}' already exists", username))
            }
            _ => StoreError::Database(e),
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn user_count(&self) -> Result<i64> {
        let count: i64 = query_scalar("SELECT COUNT(*) FROM ongwu_users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn categories_for_user(&self, user_id: i64) -> Result<Vec<Category>> {
        let rows: Vec<CategoryRow> = query_as(
            "SELECT id, name, description, user_id, sort_order, created_at, updated_at
             FROM ongwu_categories
             WHERE user_id = $1 AND deleted_at IS NULL
             ORDER BY sort_order, name",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn create_category(
        &self,
        name: &str,
        description: Option<&str>,
        user_id: i64,
    ) -> Result<Category> {
        let row: CategoryRow = query_as(
            "INSERT INTO ongwu_categories (name, description, user_id)
             VALUES ($1, $2, $3)
             RETURNING id, name, description, user_id, sort_order, created_at, updated_at",
        )
        .bind(name)
        .bind(description)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Category::from(row))
    }

    async fn update_category(
        &self,
        id: i64,
        name: &str,
        description: Option<&str>,
        user_id: i64,
    ) -> Result<Option<Category>> {
        let row: Option<CategoryRow> = query_as(
            "UPDATE ongwu_categories
             SET name = $1, description = $2, updated_at = now()
             WHERE id = $3 AND user_id = $4 AND deleted_at IS NULL
             RETURNING id, name, description, user_id, sort_order, created_at, updated_at",
        )
        .bind(name)
        .bind(description)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Category::from))
    }

    async fn set_category_sort_order(
        &self,
        id: i64,
        sort_order: i32,
        user_id: i64,
    ) -> Result<bool> {
        let result = query(
            "UPDATE ongwu_categories
             SET sort_order = $1, updated_at = now()
             WHERE id = $2 AND user_id = $3 AND deleted_at IS NULL",
        )
        .bind(sort_order)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_category(&self, id: i64, user_id: i64) -> Result<bool> {
        let result = query(
            "UPDATE ongwu_categories
             SET deleted_at = now()
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn notes_for_user(&self, user_id: i64) -> Result<Vec<Note>> {
        let rows: Vec<NoteRow> = query_as(&format!(
            "SELECT {NOTE_COLUMNS}
             FROM ongwu_notes n
             LEFT JOIN ongwu_categories c
                 ON n.category_id = c.id AND c.deleted_at IS NULL
             WHERE n.user_id = $1 AND n.deleted_at IS NULL
             ORDER BY n.updated_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Note::from).collect())
    }

    async fn notes_in_category(&self, category_id: i64, user_id: i64) -> Result<Vec<Note>> {
        let rows: Vec<NoteRow> = query_as(&format!(
            "SELECT {NOTE_COLUMNS}
             FROM ongwu_notes n
             LEFT JOIN ongwu_categories c
                 ON n.category_id = c.id AND c.deleted_at IS NULL
             WHERE n.category_id = $1 AND n.user_id = $2 AND n.deleted_at IS NULL
             ORDER BY n.updated_at DESC"
        ))
        .bind(category_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Note::from).collect())
    }

    async fn note_by_id(&self, id: i64, user_id: i64) -> Result<Option<Note>> {
        self.joined_note(id, user_id).await
    }

    async fn create_note(
        &self,
        title: &str,
        content: &str,
        category_id: Option<i64>,
        user_id: i64,
    ) -> Result<Note> {
        let id: i64 = query_scalar(
            "INSERT INTO ongwu_notes (title, content, category_id, user_id)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(title)
        .bind(content)
        .bind(category_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        self.joined_note(id, user_id)
            .await?
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))
    }

    async fn update_note(
        &self,
        id: i64,
        title: &str,
        content: &str,
        category_id: Option<i64>,
        user_id: i64,
    ) -> Result<Option<Note>> {
        let updated: Option<i64> = query_scalar(
            "UPDATE ongwu_notes
             SET title = $1, content = $2, category_id = $3, updated_at = now()
             WHERE id = $4 AND user_id = $5 AND deleted_at IS NULL
             RETURNING id",
        )
        .bind(title)
        .bind(content)
        .bind(category_id)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(id) => self.joined_note(id, user_id).await,
            None => Ok(None),
        }
    }

    async fn delete_note(&self, id: i64, user_id: i64) -> Result<bool> {
        let result = query(
            "UPDATE ongwu_notes
             SET deleted_at = now()
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn search_notes(&self, query_text: &str, user_id: i64) -> Result<Vec<Note>> {
        let pattern = format!("%{}%", escape_like(query_text));
        let rows: Vec<NoteRow> = query_as(&format!(
            "SELECT {NOTE_COLUMNS}
             FROM ongwu_notes n
             LEFT JOIN ongwu_categories c
                 ON n.category_id = c.id AND c.deleted_at IS NULL
             WHERE n.user_id = $1 AND n.deleted_at IS NULL
               AND (n.title ILIKE $2 OR n.content ILIKE $2)
             ORDER BY n.updated_at DESC"
        ))
        .bind(user_id)
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Note::from).collect())
    }
}

/// Escapa los metacaracteres de LIKE para que la busqueda sea literal.
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

// Row types

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: i64,
    name: String,
    description: Option<String>,
    user_id: i64,
    sort_order: i32,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            user_id: row.user_id,
            sort_order: row.sort_order,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct NoteRow {
    id: i64,
    title: String,
    content: String,
    category_id: Option<i64>,
    category_name: Option<String>,
    user_id: i64,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<NoteRow> for Note {
    fn from(row: NoteRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            category_id: row.category_id,
            category_name: row.category_name,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_escape_is_literal() {
        assert_eq!(escape_like("50%_done"), "50\\%\\_done");
        assert_eq!(escape_like("plain"), "plain");
    }
}
