//! Turns seeded title ideas into AI-written drafts.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use super::{PostService, load_blog_context};
use crate::domain::{NewPost, Post, PostStatus};
use crate::error::PostError;
use crate::ports::{
    ContentGenerator, Job, JobHandler, JobResult, PROCESS_POST_CREATION, PostCreationPayload,
    Repositories,
};
use crate::retry::RetryPolicy;

pub struct PostCreationWorker {
    repos: Repositories,
    posts: Arc<PostService>,
    generator: Arc<dyn ContentGenerator>,
    generation_retry: RetryPolicy,
    save_retry: RetryPolicy,
}

impl PostCreationWorker {
    pub fn new(
        repos: Repositories,
        posts: Arc<PostService>,
        generator: Arc<dyn ContentGenerator>,
    ) -> Self {
        let retry = RetryPolicy::new(3, Duration::from_secs(5));
        Self {
            repos,
            posts,
            generator,
            generation_retry: retry,
            save_retry: retry,
        }
    }

    pub fn with_retry(mut self, generation: RetryPolicy, save: RetryPolicy) -> Self {
        self.generation_retry = generation;
        self.save_retry = save;
        self
    }

    /// Adapt the worker to the queue's handler signature.
    pub fn into_handler(self: Arc<Self>) -> JobHandler {
        Box::new(move |job: Job| -> Pin<Box<dyn Future<Output = JobResult> + Send>> {
            let worker = Arc::clone(&self);
            Box::pin(async move { worker.handle(job).await })
        })
    }

    pub async fn handle(&self, job: Job) -> JobResult {
        if job.job_type != PROCESS_POST_CREATION {
            return JobResult::Failed(format!("Unknown job type: {}", job.job_type));
        }
        let payload = match PostCreationPayload::from_job(&job) {
            Ok(payload) => payload,
            Err(err) => return JobResult::Failed(format!("Invalid payload: {err}")),
        };

        match self.process(payload).await {
            Ok(post) => {
                tracing::info!(job_id = %job.id, post_id = %post.id, blog_id = %post.blog_id, "Generated draft saved");
                JobResult::Success
            }
            Err(err) => {
                tracing::warn!(job_id = %job.id, code = err.code(), error = %err, "Draft generation failed");
                if is_permanent(&err) {
                    JobResult::Failed(err.to_string())
                } else {
                    JobResult::Retry(err.to_string())
                }
            }
        }
    }

    async fn process(&self, payload: PostCreationPayload) -> Result<Post, PostError> {
        let blog = self
            .repos
            .blogs
            .find_by_id(payload.blog_id)
            .await?
            .ok_or(PostError::BlogNotFound)?;
        let category = self
            .repos
            .categories
            .find_in_blog(blog.id, payload.category_id)
            .await?
            .ok_or(PostError::CategoryNotFound)?;
        let author = self
            .repos
            .authors
            .list_for_blog(blog.id)
            .await?
            .into_iter()
            .next()
            .ok_or(PostError::AuthorNotFound)?;

        let context = load_blog_context(&self.repos, &blog).await?;
        let generated = self
            .generation_retry
            .run("generate_post_body", |_| {
                self.generator
                    .generate_post_body(&context, &category, &payload.title)
            })
            .await?;

        let tag_ids = self.map_tag_names(blog.id, &generated.tag_names).await;

        let image_prompt = self
            .generation_retry
            .run("generate_image_prompt", |_| {
                self.generator.generate_image_prompt(&generated.content)
            })
            .await
            .ok();

        let slug = if generated.slug.trim().is_empty() {
            payload.slug.clone()
        } else {
            generated.slug.clone()
        };
        let input = NewPost {
            title: payload.title.clone(),
            description: generated.description.clone(),
            slug,
            content: generated.content.clone(),
            image_url: None,
            category_id: category.id,
            author_id: author.id,
            tag_ids,
            status: PostStatus::Draft,
            published_at: None,
            ai_image_prompt: image_prompt,
        };

        self.save_retry
            .run("save_generated_post", |_| {
                self.posts.create(payload.user_id, blog.id, input.clone(), None)
            })
            .await
    }

    /// Existing tag ids for the generated names, in the generator's order. Unknown names are skipped.
    async fn map_tag_names(&self, blog_id: Uuid, names: &[String]) -> Vec<Uuid> {
        if names.is_empty() {
            return Vec::new();
        }
        match self.repos.tags.find_by_names_in_blog(blog_id, names).await {
            Ok(tags) => names
                .iter()
                .filter_map(|name| tags.iter().find(|tag| &tag.name == name).map(|tag| tag.id))
                .fold(Vec::new(), |mut ids, id| {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                    ids
                }),
            Err(err) => {
                tracing::warn!(%blog_id, error = %err, "Failed mapping generated tags");
                Vec::new()
            }
        }
    }
}

/// Errors no amount of retrying will fix.
fn is_permanent(err: &PostError) -> bool {
    matches!(
        err,
        PostError::BlogNotFound
            | PostError::CategoryNotFound
            | PostError::AuthorNotFound
            | PostError::InvalidTags
            | PostError::Transition(_)
    )
}
