//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use scribe_core::retry::RetryPolicy;
use scribe_core::services::{DEFAULT_PUBLIC_CACHE_TTL, DeployPolicy, PublishMode, SeedPolicy};
use scribe_infra::DatabaseConfig;

use crate::background::SchedulerConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Local development: no site deploys, published posts are written as markdown.
    pub dev_mode: bool,
    pub content_dir: PathBuf,
    pub database: Option<DatabaseConfig>,
    pub redis_url: Option<String>,
    pub deploy: DeployPolicy,
    pub seed: SeedPolicy,
    /// Lifetime of cached public reads.
    pub public_cache_ttl: Duration,
    pub scheduler: SchedulerConfig,
}

fn parsed<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn flag(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| v != "false" && v != "0")
        .unwrap_or(default)
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let deploy_defaults = DeployPolicy::default();
        let seed_defaults = SeedPolicy::default();

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parsed("PORT", 8080),
            dev_mode: flag("DEV_MODE", false),
            content_dir: env::var("CONTENT_DIR")
                .unwrap_or_else(|_| "./content".to_string())
                .into(),
            database: DatabaseConfig::from_env(),
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
            deploy: DeployPolicy {
                retry: RetryPolicy::new(
                    parsed("DEPLOY_MAX_ATTEMPTS", deploy_defaults.retry.max_attempts),
                    Duration::from_secs(parsed(
                        "DEPLOY_BACKOFF_SECS",
                        deploy_defaults.retry.backoff.as_secs(),
                    )),
                ),
                poll_interval: Duration::from_secs(parsed(
                    "DEPLOY_POLL_INTERVAL_SECS",
                    deploy_defaults.poll_interval.as_secs(),
                )),
                max_polls: parsed("DEPLOY_MAX_POLLS", deploy_defaults.max_polls),
            },
            seed: SeedPolicy {
                stale_after_days: parsed("SEED_STALE_AFTER_DAYS", seed_defaults.stale_after_days),
                ..seed_defaults
            },
            public_cache_ttl: Duration::from_secs(parsed(
                "PUBLIC_CACHE_TTL_SECS",
                DEFAULT_PUBLIC_CACHE_TTL.as_secs(),
            )),
            scheduler: SchedulerConfig::from_env(),
        }
    }

    pub fn publish_mode(&self) -> PublishMode {
        PublishMode::from_dev_flag(self.dev_mode)
    }
}
