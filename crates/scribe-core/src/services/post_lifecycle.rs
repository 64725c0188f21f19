//! Create, update, delete and export posts.
//!
//! Every entry point follows the same order: load and authorize, validate
//! references, run the status machine, persist, invalidate the public cache,
//! then deploy when a post has just gone live.

use std::path::PathBuf;
use std::sync::Arc;

use uuid::Uuid;

use super::Publishing;
use crate::domain::{
    Blog, BlogAccess, ImageUpload, MarkdownDocument, NewPost, Post, PostChanges, PostPage,
    PostQuery, PostState, PostStatus, StorageTarget, resolve_transition,
};
use crate::error::PostError;
use crate::ports::{Clock, ImageStorage, Repositories};

const IMAGE_KEY_PREFIX: &str = "blog/images";

/// A published post rendered as markdown, with its location relative to the content root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPost {
    pub folder: String,
    pub file_stem: String,
    pub contents: String,
}

pub struct PostService {
    repos: Repositories,
    storage: Arc<dyn ImageStorage>,
    publishing: Publishing,
    clock: Arc<dyn Clock>,
}

impl PostService {
    pub fn new(
        repos: Repositories,
        storage: Arc<dyn ImageStorage>,
        publishing: Publishing,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repos,
            storage,
            publishing,
            clock,
        }
    }

    pub async fn create(
        &self,
        actor_id: Uuid,
        blog_id: Uuid,
        input: NewPost,
        image: Option<ImageUpload>,
    ) -> Result<Post, PostError> {
        let blog = self.load_blog(blog_id).await?;
        let access = self.resolve_access(&blog, actor_id).await?;

        self.check_category(blog.id, input.category_id).await?;
        self.check_author(blog.id, input.author_id).await?;
        let tag_ids = self.check_tags(blog.id, &input.tag_ids).await?;
        let storage = match image {
            Some(_) => Some(storage_target(&blog)?),
            None => None,
        };

        let mut changes = input.as_changes(image.is_some());
        changes.tag_ids = Some(tag_ids);

        let now = self.clock.now();
        let transition = resolve_transition(&PostState::blank(), &changes, now)?;
        let newly_published = transition.newly_published();
        if newly_published && !access.can_transition_to_published().is_allowed() {
            return Err(PostError::PublishForbidden);
        }

        let mut next = transition.next;
        let mut uploaded = None;
        if let (Some(image), Some(storage)) = (image, storage) {
            let url = self.upload_image(storage, image).await?;
            next.image_url = Some(url.clone());
            uploaded = Some(url);
        }

        let mut post = Post::new(
            blog.id,
            input.category_id,
            input.author_id,
            input.title,
            input.slug,
            now,
        );
        post.apply(next, now);
        post.ai_image_prompt = input.ai_image_prompt;

        let post = self
            .save_or_discard_upload(&blog, post, uploaded.as_deref())
            .await?;
        tracing::info!(post_id = %post.id, blog_id = %blog.id, status = %post.status, "Post created");

        self.publishing.invalidator.blog_content_changed(blog.id).await;

        if newly_published {
            self.deploy_after_publish(&blog).await?;
        }

        Ok(post)
    }

    pub async fn update(
        &self,
        actor_id: Uuid,
        post_id: Uuid,
        mut changes: PostChanges,
        image: Option<ImageUpload>,
    ) -> Result<Post, PostError> {
        let mut post = self
            .repos
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or(PostError::PostNotFound)?;
        let blog = self.load_blog(post.blog_id).await?;
        let access = self.resolve_access(&blog, actor_id).await?;

        if let Some(category_id) = changes.category_id {
            self.check_category(blog.id, category_id).await?;
        }
        if let Some(author_id) = changes.author_id {
            self.check_author(blog.id, author_id).await?;
        }
        if let Some(tag_ids) = changes.tag_ids.take() {
            changes.tag_ids = Some(self.check_tags(blog.id, &tag_ids).await?);
        }
        let storage = match image {
            Some(_) => Some(storage_target(&blog)?),
            None => None,
        };
        changes.incoming_image = image.is_some();

        let now = self.clock.now();
        let transition = resolve_transition(&post.state(), &changes, now)?;
        let newly_published = transition.newly_published();
        if newly_published && !access.can_transition_to_published().is_allowed() {
            return Err(PostError::PublishForbidden);
        }

        let previous_status = transition.previous_status;
        let previous_image = post.image_url.clone();
        let mut next = transition.next;
        let mut uploaded = None;
        if let (Some(image), Some(storage)) = (image, storage) {
            let url = self.upload_image(storage, image).await?;
            next.image_url = Some(url.clone());
            uploaded = Some(url);
        }

        post.apply(next, now);
        if let Some(prompt) = changes.ai_image_prompt {
            post.ai_image_prompt = Some(prompt);
        }
        if let Some(notes) = changes.ai_review_notes {
            post.ai_review_notes = Some(notes);
        }

        let post = self
            .save_or_discard_upload(&blog, post, uploaded.as_deref())
            .await?;
        tracing::info!(
            post_id = %post.id,
            blog_id = %blog.id,
            from = %previous_status,
            to = %post.status,
            "Post updated"
        );

        if uploaded.is_some() && previous_image != post.image_url {
            if let Some(old) = previous_image.as_deref() {
                self.delete_image(&blog, old).await;
            }
        }

        self.publishing.invalidator.blog_content_changed(blog.id).await;

        if newly_published {
            self.deploy_after_publish(&blog).await?;
        }

        Ok(post)
    }

    /// Delete a DRAFT post. Posts in any other status are reported as not found.
    pub async fn delete(&self, actor_id: Uuid, post_id: Uuid) -> Result<(), PostError> {
        let post = self
            .repos
            .posts
            .find_by_id(post_id)
            .await?
            .filter(|post| post.status == PostStatus::Draft)
            .ok_or(PostError::PostNotFound)?;
        let blog = self.load_blog(post.blog_id).await?;
        let access = self.resolve_access(&blog, actor_id).await?;
        if !access.can_delete().is_allowed() {
            return Err(PostError::BlogNotFound);
        }

        self.repos.posts.delete(post.id).await?;
        tracing::info!(post_id = %post.id, blog_id = %blog.id, "Post deleted");

        if let Some(image_url) = post.image_url.as_deref() {
            self.delete_image(&blog, image_url).await;
        }

        self.publishing.invalidator.blog_content_changed(blog.id).await;
        Ok(())
    }

    /// A post of a blog the actor owns or edits.
    pub async fn get_post(&self, actor_id: Uuid, post_id: Uuid) -> Result<Post, PostError> {
        let post = self
            .repos
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or(PostError::PostNotFound)?;
        let blog = self.load_blog(post.blog_id).await?;
        self.resolve_access(&blog, actor_id).await?;
        Ok(post)
    }

    /// A page of the blog's posts in any status, for owners and editors.
    pub async fn list_posts(
        &self,
        actor_id: Uuid,
        blog_id: Uuid,
        query: PostQuery,
    ) -> Result<PostPage, PostError> {
        if !query.is_valid() {
            return Err(PostError::InvalidPagination);
        }
        let blog = self.load_blog(blog_id).await?;
        self.resolve_access(&blog, actor_id).await?;
        Ok(self.repos.posts.find_page(blog.id, &query).await?)
    }

    /// Render a published post as a markdown document without writing it.
    ///
    /// `Ok(None)` for posts that are not PUBLISHED.
    pub async fn to_markdown(
        &self,
        actor_id: Uuid,
        post_id: Uuid,
    ) -> Result<Option<RenderedPost>, PostError> {
        let post = self.get_post(actor_id, post_id).await?;
        self.render(post).await
    }

    /// Render a published post and write it through the exporter.
    pub async fn export_markdown(
        &self,
        actor_id: Uuid,
        post_id: Uuid,
    ) -> Result<Option<PathBuf>, PostError> {
        let post = self.get_post(actor_id, post_id).await?;
        self.write_markdown(post).await
    }

    /// Export on behalf of the scheduler, which acts for every blog.
    pub(crate) async fn export_published(
        &self,
        post_id: Uuid,
    ) -> Result<Option<PathBuf>, PostError> {
        let post = self
            .repos
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or(PostError::PostNotFound)?;
        self.write_markdown(post).await
    }

    async fn write_markdown(&self, post: Post) -> Result<Option<PathBuf>, PostError> {
        let post_id = post.id;
        let Some(rendered) = self.render(post).await? else {
            return Ok(None);
        };
        let path = self
            .publishing
            .exporter
            .write(&rendered.folder, &rendered.file_stem, &rendered.contents)
            .await?;
        tracing::info!(%post_id, path = %path.display(), "Post exported to markdown");
        Ok(Some(path))
    }

    async fn render(&self, post: Post) -> Result<Option<RenderedPost>, PostError> {
        if post.status != PostStatus::Published {
            tracing::warn!(post_id = %post.id, status = %post.status, "Only published posts can be exported");
            return Ok(None);
        }

        let blog = self.load_blog(post.blog_id).await?;
        let category = self
            .repos
            .categories
            .find_in_blog(blog.id, post.category_id)
            .await?
            .ok_or(PostError::CategoryNotFound)?;
        let author = self
            .repos
            .authors
            .find_in_blog(blog.id, post.author_id)
            .await?
            .ok_or(PostError::AuthorNotFound)?;
        let tags = self.repos.tags.find_many_in_blog(blog.id, &post.tag_ids).await?;

        let document = MarkdownDocument {
            blog: &blog,
            post: &post,
            category: &category,
            author: &author,
            tags: &tags,
        };
        Ok(Some(RenderedPost {
            folder: document.folder(),
            file_stem: document.file_stem().to_string(),
            contents: document.render(),
        }))
    }

    async fn load_blog(&self, blog_id: Uuid) -> Result<Blog, PostError> {
        self.repos
            .blogs
            .find_by_id(blog_id)
            .await?
            .ok_or(PostError::BlogNotFound)
    }

    async fn resolve_access(&self, blog: &Blog, actor_id: Uuid) -> Result<BlogAccess, PostError> {
        let membership = if blog.owner_id == actor_id {
            None
        } else {
            self.repos.members.find_membership(blog.id, actor_id).await?
        };
        BlogAccess::resolve(blog, actor_id, membership.as_ref()).ok_or(PostError::BlogNotFound)
    }

    async fn check_category(&self, blog_id: Uuid, category_id: Uuid) -> Result<(), PostError> {
        self.repos
            .categories
            .find_in_blog(blog_id, category_id)
            .await?
            .map(|_| ())
            .ok_or(PostError::CategoryNotFound)
    }

    async fn check_author(&self, blog_id: Uuid, author_id: Uuid) -> Result<(), PostError> {
        self.repos
            .authors
            .find_in_blog(blog_id, author_id)
            .await?
            .map(|_| ())
            .ok_or(PostError::AuthorNotFound)
    }

    /// All-or-nothing tag check. Duplicates collapse, order of first appearance is kept.
    async fn check_tags(&self, blog_id: Uuid, tag_ids: &[Uuid]) -> Result<Vec<Uuid>, PostError> {
        let mut unique = Vec::with_capacity(tag_ids.len());
        for id in tag_ids {
            if !unique.contains(id) {
                unique.push(*id);
            }
        }
        if unique.is_empty() {
            return Ok(unique);
        }

        let found = self.repos.tags.find_many_in_blog(blog_id, &unique).await?;
        if found.len() != unique.len() {
            return Err(PostError::InvalidTags);
        }
        Ok(unique)
    }

    async fn upload_image(
        &self,
        storage: StorageTarget,
        image: ImageUpload,
    ) -> Result<String, PostError> {
        let prefix = format!("{IMAGE_KEY_PREFIX}/{}", image.name);
        let key = self.storage.upload(&storage, image.bytes, &prefix).await?;
        Ok(storage.public_url(&key))
    }

    /// Persist the post. A freshly uploaded image is removed again if the write fails.
    async fn save_or_discard_upload(
        &self,
        blog: &Blog,
        post: Post,
        uploaded: Option<&str>,
    ) -> Result<Post, PostError> {
        match self.repos.posts.save(post).await {
            Ok(post) => Ok(post),
            Err(err) => {
                if let Some(url) = uploaded {
                    self.delete_image(blog, url).await;
                }
                Err(err.into())
            }
        }
    }

    async fn delete_image(&self, blog: &Blog, image_url: &str) {
        let Some(storage) = blog.storage.as_ref() else {
            tracing::warn!(blog_id = %blog.id, image_url, "No storage configured, image left in place");
            return;
        };
        let key = storage.key_from_url(image_url).unwrap_or(image_url);
        if let Err(err) = self.storage.delete(storage, key).await {
            tracing::warn!(blog_id = %blog.id, key, error = %err, "Failed to delete stored image");
        }
    }

    async fn deploy_after_publish(&self, blog: &Blog) -> Result<(), PostError> {
        self.publishing
            .deploy_blog(blog)
            .await
            .map(|_| ())
            .map_err(|err| {
                tracing::error!(blog_id = %blog.id, error = %err, "Site deploy failed after publishing");
                PostError::DeployFailed(err)
            })
    }
}

fn storage_target(blog: &Blog) -> Result<StorageTarget, PostError> {
    blog.storage.clone().ok_or(PostError::StorageNotConfigured)
}
