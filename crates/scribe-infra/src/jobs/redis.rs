//! Redis job queue for `posts-creation`.
//!
//! Ready jobs wait in a LIST, retries and scheduled jobs sit in a ZSET scored
//! by their due time in milliseconds. A completed job leaves no trace. A job
//! that runs out of attempts is moved to a capped failed LIST for inspection.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use serde::Serialize;

use scribe_core::ports::{Job, JobHandler, JobQueue, JobQueueError, JobResult, QueueStats};

use crate::cache::RedisConfig;

const MAX_RETRY_DELAY: Duration = Duration::from_secs(300);
const PROMOTE_BATCH: isize = 50;

#[derive(Debug, Clone)]
pub struct RedisJobQueueConfig {
    pub redis: RedisConfig,
    /// Namespace shared by every key of the queue.
    pub prefix: String,
    pub queue_name: String,
    pub workers: usize,
    /// Seconds a worker blocks on the wait list before checking due retries.
    pub pop_timeout: u64,
    /// First retry delay; doubles with each further attempt.
    pub retry_backoff: Duration,
    /// Exhausted jobs kept in the failed list. Older ones are trimmed.
    pub failed_retention: usize,
}

impl Default for RedisJobQueueConfig {
    fn default() -> Self {
        Self {
            redis: RedisConfig::default(),
            prefix: "scribe".to_string(),
            queue_name: "posts-creation".to_string(),
            workers: 2,
            pop_timeout: 1,
            retry_backoff: Duration::from_secs(2),
            failed_retention: 500,
        }
    }
}

impl RedisJobQueueConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis: RedisConfig::from_env(),
            prefix: std::env::var("JOB_QUEUE_PREFIX").unwrap_or(defaults.prefix),
            queue_name: std::env::var("JOB_QUEUE_NAME").unwrap_or(defaults.queue_name),
            workers: parsed_env("JOB_QUEUE_WORKERS").unwrap_or(defaults.workers),
            pop_timeout: parsed_env("JOB_QUEUE_POP_TIMEOUT").unwrap_or(defaults.pop_timeout),
            retry_backoff: parsed_env("JOB_RETRY_BACKOFF_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_backoff),
            failed_retention: parsed_env("JOB_FAILED_RETENTION")
                .unwrap_or(defaults.failed_retention),
        }
    }
}

fn parsed_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct QueueKeys {
    wait: String,
    delayed: String,
    failed: String,
}

impl QueueKeys {
    fn new(prefix: &str, queue_name: &str) -> Self {
        let base = format!("{prefix}:{queue_name}");
        Self {
            wait: format!("{base}:wait"),
            delayed: format!("{base}:delayed"),
            failed: format!("{base}:failed"),
        }
    }
}

/// What happens to a job once its handler returns.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Settlement {
    Remove,
    RetryAfter { delay: Duration, reason: String },
    Fail(String),
}

/// `job.attempts` already counts the run that produced `result`.
fn settle(job: &Job, result: JobResult, backoff: Duration) -> Settlement {
    match result {
        JobResult::Success => Settlement::Remove,
        JobResult::Retry(reason) if job.attempts < job.max_attempts => Settlement::RetryAfter {
            delay: retry_delay(backoff, job.attempts),
            reason,
        },
        JobResult::Retry(reason) => {
            Settlement::Fail(format!("gave up after {} attempts: {reason}", job.attempts))
        }
        JobResult::Failed(reason) => Settlement::Fail(reason),
    }
}

fn retry_delay(backoff: Duration, attempts: u32) -> Duration {
    let doublings = attempts.saturating_sub(1).min(16);
    backoff
        .saturating_mul(1u32 << doublings)
        .min(MAX_RETRY_DELAY)
}

fn due_at_ms(delay: Duration) -> i64 {
    let delay = i64::try_from(delay.as_millis()).unwrap_or(i64::MAX);
    Utc::now().timestamp_millis().saturating_add(delay)
}

#[derive(Debug, Serialize)]
struct FailedEntry<'a> {
    job: &'a Job,
    reason: &'a str,
    failed_at: chrono::DateTime<Utc>,
}

#[derive(Debug, Default)]
struct WorkerCounters {
    processing: AtomicUsize,
    completed: AtomicUsize,
}

pub struct RedisJobQueue {
    conn: ConnectionManager,
    config: RedisJobQueueConfig,
    keys: QueueKeys,
    counters: Arc<WorkerCounters>,
    running: Arc<AtomicBool>,
}

impl RedisJobQueue {
    pub async fn new(config: RedisJobQueueConfig) -> Result<Self, JobQueueError> {
        let client = Client::open(config.redis.url.as_str())
            .map_err(|e| JobQueueError::Backend(e.to_string()))?;

        let conn = tokio::time::timeout(config.redis.connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| JobQueueError::Backend("Connection timed out".to_string()))?
            .map_err(|e| JobQueueError::Backend(e.to_string()))?;

        let keys = QueueKeys::new(&config.prefix, &config.queue_name);
        tracing::info!(
            url = %config.redis.url,
            queue = %config.queue_name,
            wait_key = %keys.wait,
            workers = config.workers,
            "Connected to Redis job queue"
        );

        Ok(Self {
            conn,
            config,
            keys,
            counters: Arc::new(WorkerCounters::default()),
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    pub async fn from_env() -> Result<Self, JobQueueError> {
        Self::new(RedisJobQueueConfig::from_env()).await
    }

    /// Workers exit after their current blocking pop.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn enqueue(&self, job: Job) -> Result<(), JobQueueError> {
        let mut conn = self.conn.clone();
        let raw =
            serde_json::to_string(&job).map_err(|e| JobQueueError::EnqueueError(e.to_string()))?;

        let pushed = match job.scheduled_at.filter(|at| *at > Utc::now()) {
            Some(at) => {
                conn.zadd::<_, _, _, ()>(&self.keys.delayed, &raw, at.timestamp_millis())
                    .await
            }
            None => conn.rpush::<_, _, ()>(&self.keys.wait, &raw).await,
        };
        pushed.map_err(|e| JobQueueError::Backend(e.to_string()))?;

        tracing::debug!(
            job_id = %job.id,
            job_type = %job.job_type,
            max_attempts = job.max_attempts,
            delayed = job.scheduled_at.is_some(),
            "Job enqueued"
        );
        Ok(())
    }

    async fn start_worker(&self, handler: JobHandler) -> Result<(), JobQueueError> {
        self.running.store(true, Ordering::SeqCst);
        let handler: Arc<JobHandler> = Arc::new(handler);

        for worker_id in 0..self.config.workers {
            let worker = QueueWorker {
                id: worker_id,
                conn: self.conn.clone(),
                keys: self.keys.clone(),
                pop_timeout: self.config.pop_timeout.max(1),
                retry_backoff: self.config.retry_backoff,
                failed_retention: self.config.failed_retention,
                counters: self.counters.clone(),
                running: self.running.clone(),
                handler: handler.clone(),
            };
            tokio::spawn(worker.run());
        }

        Ok(())
    }

    async fn stats(&self) -> Result<QueueStats, JobQueueError> {
        let mut conn = self.conn.clone();
        let backend = |e: redis::RedisError| JobQueueError::Backend(e.to_string());
        let waiting: usize = conn.llen(&self.keys.wait).await.map_err(backend)?;
        let delayed: usize = conn.zcard(&self.keys.delayed).await.map_err(backend)?;
        let failed: usize = conn.llen(&self.keys.failed).await.map_err(backend)?;

        Ok(QueueStats {
            pending: waiting + delayed,
            processing: self.counters.processing.load(Ordering::Relaxed),
            completed: self.counters.completed.load(Ordering::Relaxed),
            failed,
        })
    }
}

struct QueueWorker {
    id: usize,
    conn: ConnectionManager,
    keys: QueueKeys,
    pop_timeout: u64,
    retry_backoff: Duration,
    failed_retention: usize,
    counters: Arc<WorkerCounters>,
    running: Arc<AtomicBool>,
    handler: Arc<JobHandler>,
}

impl QueueWorker {
    async fn run(mut self) {
        tracing::info!(worker_id = self.id, wait_key = %self.keys.wait, "Job queue worker started");

        while self.running.load(Ordering::SeqCst) {
            if let Err(e) = self.promote_due().await {
                tracing::error!(worker_id = self.id, error = %e, "Failed to promote due jobs");
            }

            let popped: Result<Option<(String, String)>, _> =
                self.conn.blpop(&self.keys.wait, self.pop_timeout as f64).await;
            let raw = match popped {
                Ok(Some((_, raw))) => raw,
                Ok(None) => continue,
                Err(e) => {
                    tracing::error!(worker_id = self.id, error = %e, "Redis BLPOP error");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            };

            let mut job: Job = match serde_json::from_str(&raw) {
                Ok(job) => job,
                Err(e) => {
                    tracing::error!(error = %e, "Dropping undecodable job");
                    continue;
                }
            };
            job.attempts += 1;

            tracing::debug!(
                worker_id = self.id,
                job_id = %job.id,
                attempt = job.attempts,
                max_attempts = job.max_attempts,
                "Processing job"
            );
            self.counters.processing.fetch_add(1, Ordering::Relaxed);
            let result = (self.handler)(job.clone()).await;
            self.counters.processing.fetch_sub(1, Ordering::Relaxed);

            let settlement = settle(&job, result, self.retry_backoff);
            if let Err(e) = self.apply(&job, settlement).await {
                tracing::error!(job_id = %job.id, error = %e, "Failed to settle job; it is lost");
            }
        }

        tracing::info!(worker_id = self.id, "Job queue worker stopped");
    }

    /// Moves delayed jobs whose time has come onto the wait list. The ZREM
    /// result decides which worker owns a job when several promote at once.
    async fn promote_due(&mut self) -> redis::RedisResult<()> {
        let now = Utc::now().timestamp_millis();
        let due: Vec<String> = self
            .conn
            .zrangebyscore_limit(&self.keys.delayed, "-inf", now, 0, PROMOTE_BATCH)
            .await?;

        for raw in due {
            let removed: i64 = self.conn.zrem(&self.keys.delayed, &raw).await?;
            if removed == 1 {
                self.conn.rpush::<_, _, ()>(&self.keys.wait, &raw).await?;
            }
        }
        Ok(())
    }

    async fn apply(&mut self, job: &Job, settlement: Settlement) -> Result<(), String> {
        match settlement {
            Settlement::Remove => {
                self.counters.completed.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(job_id = %job.id, "Job completed and removed");
                Ok(())
            }
            Settlement::RetryAfter { delay, reason } => {
                let raw = serde_json::to_string(job).map_err(|e| e.to_string())?;
                self.conn
                    .zadd::<_, _, _, ()>(&self.keys.delayed, &raw, due_at_ms(delay))
                    .await
                    .map_err(|e| e.to_string())?;
                tracing::warn!(
                    job_id = %job.id,
                    attempt = job.attempts,
                    max_attempts = job.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    reason = %reason,
                    "Job scheduled for retry"
                );
                Ok(())
            }
            Settlement::Fail(reason) => {
                tracing::error!(job_id = %job.id, attempts = job.attempts, reason = %reason, "Job failed");
                let entry = FailedEntry {
                    job,
                    reason: &reason,
                    failed_at: Utc::now(),
                };
                let raw = serde_json::to_string(&entry).map_err(|e| e.to_string())?;
                self.conn
                    .lpush::<_, _, ()>(&self.keys.failed, &raw)
                    .await
                    .map_err(|e| e.to_string())?;
                let keep = isize::try_from(self.failed_retention).unwrap_or(isize::MAX);
                self.conn
                    .ltrim::<_, ()>(&self.keys.failed, 0, keep.saturating_sub(1))
                    .await
                    .map_err(|e| e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::pin::Pin;
    use tokio::sync::mpsc;

    use scribe_core::ports::PROCESS_POST_CREATION;

    type BoxedJobFuture = Pin<Box<dyn Future<Output = JobResult> + Send>>;

    fn job_on_attempt(attempts: u32, max_attempts: u32) -> Job {
        let mut job = Job::new(PROCESS_POST_CREATION, serde_json::json!({}))
            .with_max_attempts(max_attempts);
        job.attempts = attempts;
        job
    }

    #[test]
    fn test_keys_are_namespaced_by_queue() {
        let keys = QueueKeys::new("scribe", "posts-creation");
        assert_eq!(keys.wait, "scribe:posts-creation:wait");
        assert_eq!(keys.delayed, "scribe:posts-creation:delayed");
        assert_eq!(keys.failed, "scribe:posts-creation:failed");
    }

    #[test]
    fn test_completed_jobs_are_removed() {
        let job = job_on_attempt(1, 3);
        assert_eq!(
            settle(&job, JobResult::Success, Duration::from_secs(2)),
            Settlement::Remove
        );
    }

    #[test]
    fn test_retries_back_off_until_attempts_run_out() {
        let backoff = Duration::from_secs(2);

        let first = settle(&job_on_attempt(1, 3), JobResult::Retry("timeout".into()), backoff);
        assert_eq!(
            first,
            Settlement::RetryAfter {
                delay: Duration::from_secs(2),
                reason: "timeout".into(),
            }
        );
        let second = settle(&job_on_attempt(2, 3), JobResult::Retry("timeout".into()), backoff);
        assert!(matches!(
            second,
            Settlement::RetryAfter { delay, .. } if delay == Duration::from_secs(4)
        ));

        let last = settle(&job_on_attempt(3, 3), JobResult::Retry("timeout".into()), backoff);
        assert_eq!(
            last,
            Settlement::Fail("gave up after 3 attempts: timeout".into())
        );
    }

    #[test]
    fn test_permanent_failure_skips_retries() {
        let job = job_on_attempt(1, 3);
        assert_eq!(
            settle(&job, JobResult::Failed("bad payload".into()), Duration::from_secs(2)),
            Settlement::Fail("bad payload".into())
        );
    }

    #[test]
    fn test_retry_delay_is_capped() {
        assert_eq!(retry_delay(Duration::from_secs(2), 30), MAX_RETRY_DELAY);
        assert_eq!(retry_delay(Duration::ZERO, 2), Duration::ZERO);
    }

    async fn live_queue(queue_name: &str) -> Option<RedisJobQueue> {
        let config = RedisJobQueueConfig {
            redis: RedisConfig {
                url: std::env::var("REDIS_URL")
                    .unwrap_or_else(|_| "redis://localhost:6389".to_string()),
                connect_timeout: Duration::from_secs(1),
                fallback_to_memory: false,
            },
            prefix: format!("scribe-test-{}", uuid::Uuid::new_v4()),
            queue_name: queue_name.to_string(),
            workers: 1,
            pop_timeout: 1,
            retry_backoff: Duration::from_millis(10),
            failed_retention: 10,
        };

        RedisJobQueue::new(config).await.ok()
    }

    #[tokio::test]
    async fn test_redis_worker_retries_then_completes() {
        let Some(queue) = live_queue("posts-creation").await else {
            return;
        };

        let (tx, mut rx) = mpsc::channel(4);
        queue
            .start_worker(Box::new(move |job: Job| -> BoxedJobFuture {
                let tx = tx.clone();
                Box::pin(async move {
                    let _ = tx.send(job.attempts).await;
                    if job.attempts < 2 {
                        JobResult::Retry("generator busy".into())
                    } else {
                        JobResult::Success
                    }
                })
            }))
            .await
            .unwrap();
        queue
            .enqueue(Job::new(PROCESS_POST_CREATION, serde_json::json!({})))
            .await
            .unwrap();

        for expected in 1..=2 {
            let attempt = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .unwrap();
            assert_eq!(attempt, Some(expected));
        }
        tokio::time::sleep(Duration::from_millis(100)).await;

        let stats = queue.stats().await.unwrap();
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.pending, 0);
        assert_eq!(stats.failed, 0);

        queue.stop();
    }
}
