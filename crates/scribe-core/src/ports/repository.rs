use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Author, Blog, BlogMember, Category, Post, PostPage, PostQuery, Tag};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update).
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

#[async_trait]
pub trait BlogRepository: BaseRepository<Blog, Uuid> {
    async fn find_all(&self) -> Result<Vec<Blog>, RepoError>;
}

#[async_trait]
pub trait MemberRepository: Send + Sync {
    async fn find_membership(
        &self,
        blog_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<BlogMember>, RepoError>;

    async fn add(&self, member: BlogMember) -> Result<BlogMember, RepoError>;
}

#[async_trait]
pub trait CategoryRepository: BaseRepository<Category, Uuid> {
    /// Find a category only if it belongs to `blog_id`.
    async fn find_in_blog(&self, blog_id: Uuid, id: Uuid) -> Result<Option<Category>, RepoError>;

    async fn list_for_blog(&self, blog_id: Uuid) -> Result<Vec<Category>, RepoError>;
}

#[async_trait]
pub trait AuthorRepository: BaseRepository<Author, Uuid> {
    /// Find an author only if it belongs to `blog_id`.
    async fn find_in_blog(&self, blog_id: Uuid, id: Uuid) -> Result<Option<Author>, RepoError>;

    async fn list_for_blog(&self, blog_id: Uuid) -> Result<Vec<Author>, RepoError>;
}

#[async_trait]
pub trait TagRepository: BaseRepository<Tag, Uuid> {
    /// Tags among `ids` that belong to `blog_id`. Unknown or foreign ids are omitted.
    async fn find_many_in_blog(&self, blog_id: Uuid, ids: &[Uuid]) -> Result<Vec<Tag>, RepoError>;

    /// Tags of `blog_id` whose name is one of `names`.
    async fn find_by_names_in_blog(
        &self,
        blog_id: Uuid,
        names: &[String],
    ) -> Result<Vec<Tag>, RepoError>;

    async fn list_for_blog(&self, blog_id: Uuid) -> Result<Vec<Tag>, RepoError>;
}

/// Post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    async fn find_by_blog(&self, blog_id: Uuid) -> Result<Vec<Post>, RepoError>;

    /// One page of the blog's posts matching `query`, newest first.
    async fn find_page(&self, blog_id: Uuid, query: &PostQuery) -> Result<PostPage, RepoError>;

    async fn find_by_slug(&self, blog_id: Uuid, slug: &str) -> Result<Option<Post>, RepoError>;

    /// SCHEDULED posts whose `published_at` is at or before `now`.
    async fn find_due_scheduled(&self, now: DateTime<Utc>) -> Result<Vec<Post>, RepoError>;

    /// Flip the given posts to PUBLISHED in one statement, touching only rows
    /// that are still SCHEDULED and due at `now`. Returns the ids actually flipped.
    async fn publish_scheduled(&self, ids: &[Uuid], now: DateTime<Utc>)
    -> Result<Vec<Uuid>, RepoError>;

    /// Creation time of the newest post in the blog.
    async fn latest_created_at(&self, blog_id: Uuid) -> Result<Option<DateTime<Utc>>, RepoError>;
}

/// Every repository the services need, behind trait objects.
#[derive(Clone)]
pub struct Repositories {
    pub blogs: Arc<dyn BlogRepository>,
    pub members: Arc<dyn MemberRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub authors: Arc<dyn AuthorRepository>,
    pub tags: Arc<dyn TagRepository>,
    pub posts: Arc<dyn PostRepository>,
}
