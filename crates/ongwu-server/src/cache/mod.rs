//! Cache module for the Ongwu Note server.
//!
//! This module provides the process-wide response cache used by the
//! protected endpoints, with per-entry TTL expiration, structured keys,
//! bulk invalidation, and metrics.

pub mod invalidation;
pub mod keys;
pub mod response_cache;

// Re-exports
pub use invalidation::InvalidationResult;
pub use keys::{CacheKey, ResourceKind};
pub use response_cache::{CacheEntry, CacheSettings, CacheStats, ResponseCache};
