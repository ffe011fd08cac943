//! Ongwu Note - HTTP server
//!
//! Axum server for the Ongwu note-taking service: session auth over an
//! HttpOnly cookie, per-user response caching with explicit
//! invalidation, and Markdown import/export.

pub mod auth;
pub mod cache;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod server;
pub mod state;

// Re-exports
pub use error::AppError;
pub use handlers::health::HealthResponse;
pub use server::{create_router, create_router_with_metrics, run_server};
pub use state::AppState;
