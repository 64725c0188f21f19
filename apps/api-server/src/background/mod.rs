//! Periodic jobs: the publication sweep and daily draft seeding.

#[cfg(feature = "scheduler")]
mod scheduler;

#[cfg(feature = "scheduler")]
pub use scheduler::Scheduler;

use scribe_core::services::{DraftSeeder, PublicationSweeper};

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Enable scheduler.
    pub enabled: bool,
    /// Six-field cron expression (seconds first) for the publication sweep.
    pub publish_cron: String,
    /// Six-field cron expression for draft seeding.
    pub seed_cron: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            publish_cron: "0 * * * * *".to_string(),
            seed_cron: "0 0 8 * * *".to_string(),
        }
    }
}

impl SchedulerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: std::env::var("SCHEDULER_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            publish_cron: std::env::var("PUBLISH_CRON").unwrap_or(defaults.publish_cron),
            seed_cron: std::env::var("SEED_CRON").unwrap_or(defaults.seed_cron),
        }
    }
}

/// One publication sweep with its outcome logged.
pub async fn run_sweep(sweeper: &PublicationSweeper) {
    match sweeper.run_once().await {
        Ok(report) if report.skipped => {}
        Ok(report) if report.published.is_empty() => {
            tracing::debug!("No scheduled posts due");
        }
        Ok(report) => tracing::info!(
            published = report.published.len(),
            blogs = report.blogs.len(),
            deploys_succeeded = report.deploys_succeeded,
            deploys_failed = report.deploys_failed,
            exported = report.exported,
            "Publication sweep finished"
        ),
        Err(e) => tracing::error!(error = %e, "Publication sweep failed"),
    }
}

/// One seeding run with its outcome logged.
pub async fn run_seed(seeder: &DraftSeeder) {
    match seeder.run_once().await {
        Ok(report) => tracing::info!(
            seeded = report.blogs_seeded,
            skipped = report.blogs_skipped,
            failed = report.blogs_failed,
            jobs = report.jobs_enqueued,
            "Draft seeding finished"
        ),
        Err(e) => tracing::error!(error = %e, "Draft seeding failed"),
    }
}
