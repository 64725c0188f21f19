//! Promotes due SCHEDULED posts to PUBLISHED.

use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use super::{PostService, PublishMode, Publishing};
use crate::domain::DeployTarget;
use crate::error::PostError;
use crate::ports::{Clock, Repositories};

/// Outcome of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// A previous sweep was still running; nothing was done.
    pub skipped: bool,
    /// Posts flipped to PUBLISHED by this sweep.
    pub published: Vec<Uuid>,
    /// Blogs whose public cache was invalidated.
    pub blogs: Vec<Uuid>,
    pub deploys_succeeded: usize,
    pub deploys_failed: usize,
    pub exported: usize,
    pub export_failures: usize,
}

pub struct PublicationSweeper {
    repos: Repositories,
    posts: Arc<PostService>,
    publishing: Publishing,
    clock: Arc<dyn Clock>,
    running: Mutex<()>,
}

impl PublicationSweeper {
    pub fn new(
        repos: Repositories,
        posts: Arc<PostService>,
        publishing: Publishing,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repos,
            posts,
            publishing,
            clock,
            running: Mutex::new(()),
        }
    }

    /// Run one sweep. Returns a skipped report if another sweep holds the lock.
    pub async fn run_once(&self) -> Result<SweepReport, PostError> {
        let Ok(_guard) = self.running.try_lock() else {
            tracing::warn!("Previous publication sweep still running, skipping tick");
            return Ok(SweepReport {
                skipped: true,
                ..Default::default()
            });
        };

        let now = self.clock.now();
        let due = self.repos.posts.find_due_scheduled(now).await?;
        if due.is_empty() {
            tracing::debug!("No scheduled posts due");
            return Ok(SweepReport::default());
        }

        let ids: Vec<Uuid> = due.iter().map(|post| post.id).collect();
        let published = self.repos.posts.publish_scheduled(&ids, now).await?;
        tracing::info!(due = ids.len(), published = published.len(), "Scheduled posts published");

        let mut blogs = Vec::new();
        for post in due.iter().filter(|post| published.contains(&post.id)) {
            if !blogs.contains(&post.blog_id) {
                blogs.push(post.blog_id);
            }
        }
        let mut report = SweepReport {
            published,
            blogs,
            ..Default::default()
        };

        for blog_id in &report.blogs {
            self.publishing.invalidator.blog_content_changed(*blog_id).await;
        }

        match self.publishing.mode {
            PublishMode::Deploy => self.deploy_touched_blogs(&mut report).await,
            PublishMode::Local => self.export_published(&mut report).await,
        }

        Ok(report)
    }

    /// Publication is already committed here, so failures are counted and logged only.
    async fn deploy_touched_blogs(&self, report: &mut SweepReport) {
        let mut targets: Vec<(Uuid, DeployTarget)> = Vec::new();
        for blog_id in &report.blogs {
            let blog = match self.repos.blogs.find_by_id(*blog_id).await {
                Ok(Some(blog)) => blog,
                Ok(None) => continue,
                Err(err) => {
                    tracing::error!(%blog_id, error = %err, "Could not load blog to deploy after scheduled publish");
                    report.deploys_failed += 1;
                    continue;
                }
            };
            if let Some(target) = blog.deploy_target() {
                if !targets.iter().any(|(_, t)| t.site_id == target.site_id) {
                    targets.push((blog.id, target.clone()));
                }
            }
        }

        for (blog_id, target) in targets {
            match self.publishing.deployer.deploy(&target).await {
                Ok(deploy_id) => {
                    tracing::info!(%blog_id, site_id = %target.site_id, deploy_id = %deploy_id, "Site deployed after scheduled publish");
                    report.deploys_succeeded += 1;
                }
                Err(err) => {
                    tracing::error!(%blog_id, site_id = %target.site_id, error = %err, "Site deploy failed after scheduled publish");
                    report.deploys_failed += 1;
                }
            }
        }
    }

    async fn export_published(&self, report: &mut SweepReport) {
        for post_id in report.published.clone() {
            match self.posts.export_published(post_id).await {
                Ok(Some(_)) => report.exported += 1,
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(%post_id, error = %err, "Markdown export failed");
                    report.export_failures += 1;
                }
            }
        }
    }
}
