//! Middleware stack para el servidor HTTP.
//!
//! - `RequestIdLayer`: genera/propaga X-Request-Id
//! - `log_requests`: logging estructurado por request

mod logging;
mod request_id;

pub use logging::log_requests;
pub use request_id::{REQUEST_ID_HEADER, RequestIdLayer, RequestIdMiddleware};
