//! Read-through cache over a blog's published posts.
//!
//! Entries are written under [`CacheKey`] so the lifecycle's invalidation
//! patterns cover exactly what these reads store.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::cache_keys::CacheKey;
use crate::domain::{Post, PostPage, PostQuery, PostStatus};
use crate::error::PostError;
use crate::ports::{Cache, Repositories};

pub const DEFAULT_PUBLIC_CACHE_TTL: Duration = Duration::from_secs(300);

pub struct PublishedPosts {
    repos: Repositories,
    cache: Arc<dyn Cache>,
    ttl: Option<Duration>,
}

impl PublishedPosts {
    pub fn new(repos: Repositories, cache: Arc<dyn Cache>, ttl: Option<Duration>) -> Self {
        Self { repos, cache, ttl }
    }

    /// A page of PUBLISHED posts. The query's status filter is ignored.
    pub async fn list(&self, blog_id: Uuid, query: PostQuery) -> Result<PostPage, PostError> {
        if !query.is_valid() {
            return Err(PostError::InvalidPagination);
        }
        let query = PostQuery {
            status: Some(PostStatus::Published),
            ..query
        };
        let key = CacheKey::PostList {
            blog_id,
            category_id: query.category_id,
            tag_id: query.tag_id,
            page: query.page,
            page_size: query.page_size,
        }
        .render();

        if let Some(page) = self.cached::<PostPage>(&key).await {
            return Ok(page);
        }

        self.ensure_blog(blog_id).await?;
        let page = self.repos.posts.find_page(blog_id, &query).await?;
        self.store(&key, &page).await;
        Ok(page)
    }

    /// A PUBLISHED post by slug.
    pub async fn by_slug(&self, blog_id: Uuid, slug: &str) -> Result<Post, PostError> {
        let key = CacheKey::PostDetail { blog_id, slug }.render();
        if let Some(post) = self.cached::<Post>(&key).await {
            return Ok(post);
        }

        self.ensure_blog(blog_id).await?;
        let post = self
            .repos
            .posts
            .find_by_slug(blog_id, slug)
            .await?
            .filter(|post| post.status == PostStatus::Published)
            .ok_or(PostError::PostNotFound)?;
        self.store(&key, &post).await;
        Ok(post)
    }

    async fn ensure_blog(&self, blog_id: Uuid) -> Result<(), PostError> {
        self.repos
            .blogs
            .find_by_id(blog_id)
            .await?
            .map(|_| ())
            .ok_or(PostError::BlogNotFound)
    }

    async fn cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.cache.get(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => {
                tracing::debug!(key, "Public cache hit");
                Some(value)
            }
            Err(err) => {
                tracing::warn!(key, error = %err, "Discarding unreadable cache entry");
                None
            }
        }
    }

    async fn store<T: Serialize>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(key, error = %err, "Failed to encode cache entry");
                return;
            }
        };
        if let Err(err) = self.cache.set(key, &raw, self.ttl).await {
            tracing::warn!(key, error = %err, "Failed to fill public cache");
        }
    }
}
