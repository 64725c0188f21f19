//! Cron-style job scheduler using tokio-cron-scheduler.

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use super::{SchedulerConfig, run_seed, run_sweep};
use crate::state::AppState;

/// Cron job scheduler wrapper.
pub struct Scheduler {
    inner: JobScheduler,
    config: SchedulerConfig,
}

impl Scheduler {
    /// Create a new scheduler.
    pub async fn new(config: SchedulerConfig) -> Result<Self, JobSchedulerError> {
        let inner = JobScheduler::new().await?;
        Ok(Self { inner, config })
    }

    /// Add a cron job.
    pub async fn add_cron<F, Fut>(
        &self,
        schedule: &str,
        task: F,
    ) -> Result<uuid::Uuid, JobSchedulerError>
    where
        F: Fn() -> Fut + Send + Sync + Clone + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let job = Job::new_async(schedule, move |_uuid, _lock| {
            let task = task.clone();
            Box::pin(async move {
                task().await;
            })
        })?;

        let id = self.inner.add(job).await?;
        tracing::info!(schedule = %schedule, job_id = %id, "Cron job registered");
        Ok(id)
    }

    /// Register the publication sweep, and draft seeding when a generator is configured.
    pub async fn register_jobs(&self, state: &AppState) -> Result<(), JobSchedulerError> {
        let sweeper = state.sweeper.clone();
        self.add_cron(&self.config.publish_cron, move || {
            let sweeper = sweeper.clone();
            async move { run_sweep(&sweeper).await }
        })
        .await?;

        match state.seeder.clone() {
            Some(seeder) => {
                self.add_cron(&self.config.seed_cron, move || {
                    let seeder = seeder.clone();
                    async move { run_seed(&seeder).await }
                })
                .await?;
            }
            None => tracing::info!("Draft seeding not scheduled, no content generator"),
        }
        Ok(())
    }

    /// Start the scheduler.
    pub async fn start(&self) -> Result<(), JobSchedulerError> {
        if !self.config.enabled {
            tracing::info!("Scheduler disabled");
            return Ok(());
        }

        self.inner.start().await?;
        tracing::info!("Scheduler started");
        Ok(())
    }

    /// Stop the scheduler.
    pub async fn shutdown(&mut self) -> Result<(), JobSchedulerError> {
        self.inner.shutdown().await?;
        tracing::info!("Scheduler stopped");
        Ok(())
    }
}
