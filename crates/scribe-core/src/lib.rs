//! # Scribe Core
//!
//! Post lifecycle and scheduled publication for the Scribe blogging platform.
//! Domain types and decisions, the ports infrastructure implements, and the
//! services that orchestrate them. No infrastructure dependencies beyond tokio timers.

pub mod cache_keys;
pub mod domain;
pub mod error;
pub mod ports;
pub mod retry;
pub mod services;

pub use cache_keys::{CacheInvalidator, CacheKey};
pub use error::{PostError, RepoError};
pub use retry::RetryPolicy;
