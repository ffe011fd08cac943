//! Cache key types.
//!
//! Las keys son valores estructurados, no strings formateados: la
//! invalidacion compara campos, asi que el id de un usuario nunca puede
//! colisionar con un fragmento de la key de otro.

use std::fmt;

/// Namespaces de recursos cacheados por usuario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Notes,
    Categories,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Notes => "notes",
            ResourceKind::Categories => "categories",
        }
    }
}

/// Key unica para entries del response cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Respuesta de listado cacheada para un recurso de un usuario.
    Resource { kind: ResourceKind, user_id: i64 },
    /// Verificacion de token exitosa.
    Verify { token: String },
}

impl CacheKey {
    pub fn resource(kind: ResourceKind, user_id: i64) -> Self {
        CacheKey::Resource { kind, user_id }
    }

    pub fn notes(user_id: i64) -> Self {
        Self::resource(ResourceKind::Notes, user_id)
    }

    pub fn categories(user_id: i64) -> Self {
        Self::resource(ResourceKind::Categories, user_id)
    }

    pub fn verify(token: impl Into<String>) -> Self {
        CacheKey::Verify {
            token: token.into(),
        }
    }

    /// Usuario dueno de la entry, si es una entry de recurso.
    pub fn user_id(&self) -> Option<i64> {
        match self {
            CacheKey::Resource { user_id, .. } => Some(*user_id),
            CacheKey::Verify { .. } => None,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Resource { kind, user_id } => {
                write!(f, "{}:{}", kind.as_str(), user_id)
            }
            // Los tokens son credenciales: nunca se renderizan completos.
            CacheKey::Verify { token } => {
                let prefix: String = token.chars().take(8).collect();
                write!(f, "verify:{}…", prefix)
            }
        }
    }
}
