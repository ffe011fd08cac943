//! Token signing and verification.

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

/// Validez de los tokens emitidos.
pub const TOKEN_VALIDITY: time::Duration = time::Duration::days(7);

/// Claims embebidos en el token de sesion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub username: String,
    /// Issued-at, epoch seconds.
    pub iat: i64,
    /// Expiry, epoch seconds.
    pub exp: i64,
}

/// Error del verificador de tokens.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// Firma invalida, token malformado o expirado.
    #[error("invalid or expired token")]
    Invalid,

    /// Fallo inesperado del verificador.
    #[error("verifier failure: {0}")]
    Internal(String),
}

/// Verificador de credenciales.
///
/// Es un trait object para poder inyectar un doble en los tests del
/// gate; la implementacion de produccion es [`JwtVerifier`].
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<TokenClaims, VerifyError>;
}

/// Verificacion JWT HS256 contra el secreto compartido.
pub struct JwtVerifier {
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

#[async_trait]
impl TokenVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<TokenClaims, VerifyError> {
        decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| VerifyError::Invalid)
    }
}

/// Emisor de tokens de sesion (login y registro).
pub struct TokenIssuer {
    encoding: EncodingKey,
    validity: time::Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            validity: TOKEN_VALIDITY,
        }
    }

    /// Firma un token para el usuario dado.
    pub fn issue(&self, user_id: i64, username: &str) -> Result<String, VerifyError> {
        let iat = OffsetDateTime::now_utc().unix_timestamp();
        let claims = TokenClaims {
            user_id,
            username: username.to_string(),
            iat,
            exp: iat + self.validity.whole_seconds(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| VerifyError::Internal(e.to_string()))
    }
}
