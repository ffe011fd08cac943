//! Request-side of the gate: axum extractor.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;

use crate::auth::gate::{AuthError, VerifiedIdentity};
use crate::state::AppState;

/// Nombre de la cookie de sesion.
pub const SESSION_COOKIE: &str = "ongwu_token";

/// Identidad del usuario autenticado.
///
/// El rechazo es [`AuthError`], que ya sabe renderizarse con el shape
/// uniforme `{success, message}`; un handler protegido solo declara el
/// argumento `CurrentUser(user)`.
pub struct CurrentUser(pub VerifiedIdentity);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = AppState::from_ref(state);

        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());

        app.gate()
            .authenticate(token.as_deref())
            .await
            .map(CurrentUser)
    }
}
