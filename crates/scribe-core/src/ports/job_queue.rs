//! Job queue port - abstraction over job queue backends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use uuid::Uuid;

/// Job type for AI post generation requested by the draft seeder.
pub const PROCESS_POST_CREATION: &str = "process-post-creation";

/// A job that can be queued and processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique job identifier.
    pub id: String,
    /// Job type/name for routing to handlers.
    pub job_type: String,
    /// Serialized payload.
    pub payload: serde_json::Value,
    /// Number of retry attempts.
    pub attempts: u32,
    /// Maximum retry attempts.
    pub max_attempts: u32,
    /// When the job was created.
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// When to execute the job (for delayed jobs).
    pub scheduled_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Job {
    pub fn new(job_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            job_type: job_type.into(),
            payload,
            attempts: 0,
            max_attempts: 3,
            created_at: chrono::Utc::now(),
            scheduled_at: None,
        }
    }

    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }

    pub fn delayed(mut self, delay: chrono::Duration) -> Self {
        self.scheduled_at = Some(chrono::Utc::now() + delay);
        self
    }
}

/// Payload of a [`PROCESS_POST_CREATION`] job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCreationPayload {
    pub user_id: Uuid,
    pub blog_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub slug: String,
}

impl PostCreationPayload {
    pub fn into_job(self, max_attempts: u32) -> Result<Job, JobQueueError> {
        let payload = serde_json::to_value(&self)
            .map_err(|e| JobQueueError::EnqueueError(e.to_string()))?;
        Ok(Job::new(PROCESS_POST_CREATION, payload).with_max_attempts(max_attempts))
    }

    pub fn from_job(job: &Job) -> Result<Self, serde_json::Error> {
        serde_json::from_value(job.payload.clone())
    }
}

/// Result of job processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobResult {
    /// Job completed successfully.
    Success,
    /// Job failed, should be retried.
    Retry(String),
    /// Job failed permanently, should not be retried.
    Failed(String),
}

/// Job handler function type.
pub type JobHandler =
    Box<dyn Fn(Job) -> Pin<Box<dyn Future<Output = JobResult> + Send>> + Send + Sync>;

/// Job queue trait - abstraction over job queue backends.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue a job for processing.
    async fn enqueue(&self, job: Job) -> Result<(), JobQueueError>;

    /// Start processing jobs with the given handler.
    async fn start_worker(&self, handler: JobHandler) -> Result<(), JobQueueError>;

    /// Get queue statistics.
    async fn stats(&self) -> Result<QueueStats, JobQueueError>;
}

/// Queue statistics.
#[derive(Debug, Clone, Default)]
pub struct QueueStats {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Job queue errors.
#[derive(Debug, thiserror::Error)]
pub enum JobQueueError {
    #[error("Failed to enqueue job: {0}")]
    EnqueueError(String),

    #[error("Queue is full")]
    QueueFull,

    #[error("Backend error: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_creation_payload_uses_camel_case() {
        let payload = PostCreationPayload {
            user_id: Uuid::nil(),
            blog_id: Uuid::nil(),
            category_id: Uuid::nil(),
            title: "Async traits".into(),
            slug: "async-traits".into(),
        };
        let job = payload.clone().into_job(3).unwrap();

        assert_eq!(job.job_type, PROCESS_POST_CREATION);
        assert_eq!(job.max_attempts, 3);
        assert!(job.payload.get("categoryId").is_some());
        assert_eq!(PostCreationPayload::from_job(&job).unwrap(), payload);
    }
}
