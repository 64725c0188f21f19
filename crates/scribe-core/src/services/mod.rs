//! Application services orchestrating the domain over the ports.

mod deployer;
mod post_lifecycle;
mod published;
mod seeding;
mod sweeper;
mod worker;

use std::sync::Arc;

use crate::cache_keys::CacheInvalidator;
use crate::domain::Blog;
use crate::error::RepoError;
use crate::ports::{BlogContext, DeployError, PostExporter, Repositories};

pub use deployer::{DeployPolicy, Deployer};
pub use post_lifecycle::{PostService, RenderedPost};
pub use published::{DEFAULT_PUBLIC_CACHE_TTL, PublishedPosts};
pub use seeding::{DraftSeeder, SeedPolicy, SeedReport};
pub use sweeper::{PublicationSweeper, SweepReport};
pub use worker::PostCreationWorker;

/// What happens to a blog's site after posts go live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishMode {
    /// Trigger a rebuild on the blog's deploy provider.
    Deploy,
    /// Local development: no deploys, published posts are exported as markdown.
    Local,
}

impl PublishMode {
    pub fn from_dev_flag(dev_mode: bool) -> Self {
        if dev_mode {
            PublishMode::Local
        } else {
            PublishMode::Deploy
        }
    }
}

/// Post-publication side effects shared by the lifecycle service and the sweeper.
#[derive(Clone)]
pub struct Publishing {
    pub deployer: Arc<Deployer>,
    pub exporter: Arc<dyn PostExporter>,
    pub invalidator: CacheInvalidator,
    pub mode: PublishMode,
}

impl Publishing {
    /// Rebuild the blog's site if deploys are enabled and the blog has a target.
    ///
    /// Returns `Ok(false)` when nothing was deployed.
    pub async fn deploy_blog(&self, blog: &Blog) -> Result<bool, DeployError> {
        if self.mode == PublishMode::Local {
            tracing::debug!(blog_id = %blog.id, "Local mode, skipping site deploy");
            return Ok(false);
        }
        let Some(target) = blog.deploy_target() else {
            tracing::debug!(blog_id = %blog.id, "Blog has no deploy target");
            return Ok(false);
        };
        self.deployer.deploy(target).await?;
        Ok(true)
    }
}

/// Gather what the content generator needs to know about a blog.
pub(crate) async fn load_blog_context(
    repos: &Repositories,
    blog: &Blog,
) -> Result<BlogContext, RepoError> {
    let categories = repos.categories.list_for_blog(blog.id).await?;
    let tags = repos.tags.list_for_blog(blog.id).await?;
    let posts = repos.posts.find_by_blog(blog.id).await?;

    let (existing_titles, existing_slugs) = posts
        .into_iter()
        .map(|post| (post.title, post.slug))
        .unzip();

    Ok(BlogContext {
        blog_id: blog.id,
        blog_title: blog.title.clone(),
        categories,
        tag_names: tags.into_iter().map(|tag| tag.name).collect(),
        existing_titles,
        existing_slugs,
    })
}
