// src/infrastructure/mod.rs
//
// Infrastructure Layer
//
// Contains implementation details that support the domain
// but are not part of the domain itself.
//
// RULES:
// - Infrastructure serves the domain
// - Infrastructure never dictates domain behavior
// - Infrastructure is replaceable

pub mod clock;
pub mod rate_limiter;
pub mod ttl_cache;

pub use clock::{Clock, ManualClock, SystemClock};
pub use rate_limiter::{RateLimitExceeded, TokenBucket};
pub use ttl_cache::TtlCache;
