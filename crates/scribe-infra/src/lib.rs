//! # Scribe Infrastructure
//!
//! Concrete implementations of the ports defined in `scribe-core`:
//! persistence, cache, job queue, deploy provider, content generator,
//! image storage and markdown export.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services, in-memory only
//! - `postgres` - PostgreSQL persistence via SeaORM
//! - `auth` - JWT bearer tokens
//! - `redis` - Redis cache and job queue

pub mod cache;
pub mod content;
pub mod database;
pub mod deploy;
pub mod export;
pub mod jobs;
pub mod storage;

#[cfg(feature = "auth")]
pub mod auth;

// Re-exports - In-Memory
pub use cache::InMemoryCache;
pub use content::{OpenAiConfig, OpenAiContentGenerator};
pub use database::{DatabaseConfig, InMemoryStore};
pub use deploy::{NetlifyConfig, NetlifyDeployProvider};
pub use export::FileSystemExporter;
pub use jobs::InMemoryJobQueue;
pub use storage::InMemoryImageStorage;

#[cfg(feature = "auth")]
pub use auth::{JwtConfig, JwtTokenService};

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use cache::{RedisCache, RedisConfig};
#[cfg(feature = "redis")]
pub use jobs::{RedisJobQueue, RedisJobQueueConfig};
