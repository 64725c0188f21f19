//! Daily AI draft seeding for blogs that have gone quiet.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::seq::IndexedRandom;

use super::load_blog_context;
use crate::domain::Blog;
use crate::error::PostError;
use crate::ports::{
    Clock, ContentGenerator, JobQueue, PostCreationPayload, Repositories, TitleSuggestion,
};
use crate::retry::RetryPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedPolicy {
    /// Whole days since the newest post before a blog gets new drafts.
    pub stale_after_days: i64,
    pub title_retry: RetryPolicy,
    /// `max_attempts` stamped on every enqueued job.
    pub job_max_attempts: u32,
}

impl Default for SeedPolicy {
    fn default() -> Self {
        Self {
            stale_after_days: 5,
            title_retry: RetryPolicy::new(3, Duration::from_secs(5)),
            job_max_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub blogs_seeded: usize,
    pub blogs_skipped: usize,
    pub blogs_failed: usize,
    pub jobs_enqueued: usize,
}

pub struct DraftSeeder {
    repos: Repositories,
    generator: Arc<dyn ContentGenerator>,
    queue: Arc<dyn JobQueue>,
    clock: Arc<dyn Clock>,
    policy: SeedPolicy,
}

impl DraftSeeder {
    pub fn new(
        repos: Repositories,
        generator: Arc<dyn ContentGenerator>,
        queue: Arc<dyn JobQueue>,
        clock: Arc<dyn Clock>,
        policy: SeedPolicy,
    ) -> Self {
        Self {
            repos,
            generator,
            queue,
            clock,
            policy,
        }
    }

    /// Seed every stale blog. A failing blog is logged and does not stop the run.
    pub async fn run_once(&self) -> Result<SeedReport, PostError> {
        let now = self.clock.now();
        let blogs = self.repos.blogs.find_all().await?;
        let mut report = SeedReport::default();

        for blog in &blogs {
            match self.seed_blog(blog, now).await {
                Ok(Some(enqueued)) => {
                    report.blogs_seeded += 1;
                    report.jobs_enqueued += enqueued;
                }
                Ok(None) => report.blogs_skipped += 1,
                Err(err) => {
                    tracing::warn!(blog_id = %blog.id, error = %err, "Draft seeding failed for blog");
                    report.blogs_failed += 1;
                }
            }
        }

        tracing::info!(
            seeded = report.blogs_seeded,
            skipped = report.blogs_skipped,
            failed = report.blogs_failed,
            jobs = report.jobs_enqueued,
            "Draft seeding finished"
        );
        Ok(report)
    }

    /// `Ok(None)` when the blog had a recent enough post.
    async fn seed_blog(&self, blog: &Blog, now: DateTime<Utc>) -> Result<Option<usize>, PostError> {
        if !self.is_stale(blog, now).await? {
            return Ok(None);
        }

        let context = load_blog_context(&self.repos, blog).await?;
        let groups = self
            .policy
            .title_retry
            .run("generate_titles", |_| self.generator.generate_titles(&context))
            .await?;

        let mut enqueued = 0;
        for group in groups {
            if !context.categories.iter().any(|c| c.id == group.category_id) {
                tracing::warn!(blog_id = %blog.id, category_id = %group.category_id, "Generated titles for unknown category");
                continue;
            }
            let Some(pick) = pick_title(&group.titles) else {
                continue;
            };

            let job = PostCreationPayload {
                user_id: blog.owner_id,
                blog_id: blog.id,
                category_id: group.category_id,
                title: pick.title.clone(),
                slug: pick.slug.clone(),
            }
            .into_job(self.policy.job_max_attempts)?;
            self.queue.enqueue(job).await?;
            enqueued += 1;
        }

        tracing::info!(blog_id = %blog.id, jobs = enqueued, "Draft generation enqueued");
        Ok(Some(enqueued))
    }

    async fn is_stale(&self, blog: &Blog, now: DateTime<Utc>) -> Result<bool, PostError> {
        let stale = match self.repos.posts.latest_created_at(blog.id).await? {
            None => true,
            Some(latest) => (now - latest).num_days() >= self.policy.stale_after_days,
        };
        Ok(stale)
    }
}

fn pick_title(titles: &[TitleSuggestion]) -> Option<&TitleSuggestion> {
    titles.choose(&mut rand::rng())
}
