// crates/taskvault-lib/src/middleware/mod.rs

//! Middleware stages composed around the request handlers.

pub mod rate_limit;
pub mod security_headers;

pub use rate_limit::{RateClass, RateLimiter};
pub use security_headers::security_headers;
