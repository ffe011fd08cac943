//! Two-tier authentication gate.
//!
//! Resuelve la credencial de un request a una identidad verificada:
//! primero el response cache, despues la verificacion criptografica.
//! Solo los exitos se escriben al cache; un rechazo cacheado podria
//! enmascarar un token que vuelve a ser valido mas tarde.

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::token::{TokenVerifier, VerifyError};
use crate::cache::{CacheKey, ResponseCache};

/// TTL de las verificaciones cacheadas. Deliberadamente corto frente a
/// la validez del token: acota la ventana en la que un token revocado
/// sigue siendo aceptado.
pub const DEFAULT_VERIFY_TTL: Duration = Duration::from_secs(30);

/// Identidad producida por una verificacion exitosa.
///
/// Solo es confiable si salio de la verificacion criptografica, directa
/// o via una entry de cache que se poblo tras una verificacion exitosa.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedIdentity {
    pub user_id: i64,
    pub username: String,
}

/// Fallo tipado del gate. Cada variante fija su status HTTP y su
/// mensaje; los handlers no inspeccionan subtipos.
#[derive(Debug, Error)]
pub enum AuthError {
    /// El request no trae token.
    #[error("Not logged in")]
    NoCredential,

    /// Token con firma invalida o expirado.
    #[error("Invalid token")]
    Rejected,

    /// Fallo inesperado del verificador. El detalle queda en el log,
    /// nunca en la respuesta.
    #[error("Authentication failed")]
    Internal,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::NoCredential | AuthError::Rejected => StatusCode::UNAUTHORIZED,
            AuthError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "success": false,
            "message": self.to_string(),
        }));
        (self.status(), body).into_response()
    }
}

/// Gate de autenticacion compartido por todos los handlers protegidos.
pub struct AuthGate {
    verifier: Arc<dyn TokenVerifier>,
    cache: ResponseCache,
    verify_ttl: Duration,
}

impl AuthGate {
    pub fn new(verifier: Arc<dyn TokenVerifier>, cache: ResponseCache) -> Self {
        Self {
            verifier,
            cache,
            verify_ttl: DEFAULT_VERIFY_TTL,
        }
    }

    /// Ajusta el TTL de las verificaciones cacheadas.
    #[must_use]
    pub fn with_verify_ttl(mut self, ttl: Duration) -> Self {
        self.verify_ttl = ttl;
        self
    }

    /// Autentica la credencial de un request.
    ///
    /// Cadena de guardas: sin token termina en `NoCredential`; un hit de
    /// cache termina en exito sin tocar el verificador; un miss pasa por
    /// la verificacion criptografica y, solo si es exitosa, escribe la
    /// entry de cache antes de retornar.
    pub async fn authenticate(&self, token: Option<&str>) -> Result<VerifiedIdentity, AuthError> {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return Err(AuthError::NoCredential);
        };

        let key = CacheKey::verify(token);
        if let Some(entry) = self.cache.get(&key).await {
            match serde_json::from_value::<VerifiedIdentity>(entry.payload().clone()) {
                Ok(identity) => return Ok(identity),
                Err(err) => {
                    // Una entry malformada cuenta como miss y se repone abajo
                    tracing::warn!(error = %err, "Discarding malformed verify cache entry");
                    self.cache.invalidate(&key).await;
                }
            }
        }

        let claims = match self.verifier.verify(token).await {
            Ok(claims) => claims,
            Err(VerifyError::Invalid) => return Err(AuthError::Rejected),
            Err(VerifyError::Internal(detail)) => {
                tracing::error!(error = %detail, "Token verifier failure");
                return Err(AuthError::Internal);
            }
        };

        let identity = VerifiedIdentity {
            user_id: claims.user_id,
            username: claims.username,
        };

        // La escritura precede al retorno exitoso: el siguiente request
        // con el mismo token ya encuentra la entry.
        match serde_json::to_value(&identity) {
            Ok(payload) => {
                self.cache
                    .insert_with_ttl(key, payload, self.verify_ttl)
                    .await;
            }
            Err(err) => {
                // Equivalente a un miss en el proximo request; el exito
                // de la verificacion no depende del cache.
                tracing::error!(error = %err, "Failed to cache verification result");
            }
        }

        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::TokenClaims;
    use crate::cache::CacheSettings;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Doble que cuenta invocaciones y responde segun el token.
    struct CountingVerifier {
        calls: AtomicU32,
        outcome: Outcome,
    }

    enum Outcome {
        Accept { user_id: i64, username: &'static str },
        Reject,
        Fail,
    }

    impl CountingVerifier {
        fn accepting(user_id: i64, username: &'static str) -> Self {
            Self {
                calls: AtomicU32::new(0),
                outcome: Outcome::Accept { user_id, username },
            }
        }

        fn rejecting() -> Self {
            Self {
                calls: AtomicU32::new(0),
                outcome: Outcome::Reject,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicU32::new(0),
                outcome: Outcome::Fail,
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenVerifier for CountingVerifier {
        async fn verify(&self, _token: &str) -> Result<TokenClaims, VerifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.outcome {
                Outcome::Accept { user_id, username } => Ok(TokenClaims {
                    user_id,
                    username: username.to_string(),
                    iat: 0,
                    exp: i64::MAX,
                }),
                Outcome::Reject => Err(VerifyError::Invalid),
                Outcome::Fail => Err(VerifyError::Internal("boom".to_string())),
            }
        }
    }

    fn gate_with(verifier: Arc<CountingVerifier>) -> AuthGate {
        AuthGate::new(verifier, ResponseCache::new(CacheSettings::default()))
    }

    #[tokio::test]
    async fn missing_token_is_no_credential() {
        let verifier = Arc::new(CountingVerifier::accepting(1, "alice"));
        let gate = gate_with(Arc::clone(&verifier));

        let err = gate.authenticate(None).await.unwrap_err();

        assert!(matches!(err, AuthError::NoCredential));
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(verifier.calls(), 0, "verifier must not run without a token");
    }

    #[tokio::test]
    async fn empty_token_is_no_credential() {
        let verifier = Arc::new(CountingVerifier::accepting(1, "alice"));
        let gate = gate_with(Arc::clone(&verifier));

        let err = gate.authenticate(Some("")).await.unwrap_err();
        assert!(matches!(err, AuthError::NoCredential));
    }

    #[tokio::test]
    async fn cache_hit_short_circuits_the_verifier() {
        let verifier = Arc::new(CountingVerifier::accepting(7, "alice"));
        let gate = gate_with(Arc::clone(&verifier));

        let first = gate.authenticate(Some("tok")).await.unwrap();
        let second = gate.authenticate(Some("tok")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.user_id, 7);
        assert_eq!(verifier.calls(), 1, "second call must be served from cache");
    }

    #[tokio::test]
    async fn distinct_tokens_verify_independently() {
        let verifier = Arc::new(CountingVerifier::accepting(7, "alice"));
        let gate = gate_with(Arc::clone(&verifier));

        gate.authenticate(Some("tok-a")).await.unwrap();
        gate.authenticate(Some("tok-b")).await.unwrap();

        assert_eq!(verifier.calls(), 2);
    }

    #[tokio::test]
    async fn rejections_are_never_cached() {
        let verifier = Arc::new(CountingVerifier::rejecting());
        let gate = gate_with(Arc::clone(&verifier));

        for _ in 0..3 {
            let err = gate.authenticate(Some("bad")).await.unwrap_err();
            assert!(matches!(err, AuthError::Rejected));
        }

        assert_eq!(verifier.calls(), 3, "every attempt must re-verify");
    }

    #[tokio::test]
    async fn expired_cache_entry_triggers_one_reverification() {
        let verifier = Arc::new(CountingVerifier::accepting(7, "alice"));
        let gate = gate_with(Arc::clone(&verifier))
            .with_verify_ttl(Duration::from_millis(50));

        gate.authenticate(Some("tok")).await.unwrap();
        assert_eq!(verifier.calls(), 1);

        tokio::time::sleep(Duration::from_millis(100)).await;

        gate.authenticate(Some("tok")).await.unwrap();
        assert_eq!(verifier.calls(), 2, "expiry forces exactly one re-verify");

        // Repoblado: la siguiente llamada vuelve a ser un hit
        gate.authenticate(Some("tok")).await.unwrap();
        assert_eq!(verifier.calls(), 2);
    }

    #[tokio::test]
    async fn verifier_failures_become_internal() {
        let verifier = Arc::new(CountingVerifier::failing());
        let gate = gate_with(Arc::clone(&verifier));

        let err = gate.authenticate(Some("tok")).await.unwrap_err();

        assert!(matches!(err, AuthError::Internal));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        // El mensaje al caller es generico, el detalle queda en el log
        assert_eq!(err.to_string(), "Authentication failed");
    }
}
