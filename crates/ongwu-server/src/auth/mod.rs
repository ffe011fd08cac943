//! Authentication for the Ongwu Note server.
//!
//! Two pieces compose this module: token signing/verification over a
//! shared HS256 secret, and the [`AuthGate`] that resolves a request
//! credential to a verified identity using the response cache as a
//! write-through accelerator in front of the cryptographic check.

pub mod extract;
pub mod gate;
pub mod password;
pub mod token;

// Re-exports
pub use extract::{CurrentUser, SESSION_COOKIE};
pub use gate::{AuthError, AuthGate, VerifiedIdentity};
pub use token::{JwtVerifier, TokenClaims, TokenIssuer, TokenVerifier, VerifyError};
