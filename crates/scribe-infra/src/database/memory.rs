//! In-memory repositories - used when no database is configured and in tests.
//!
//! Note: Data is lost on process restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use scribe_core::domain::{
    Author, Blog, BlogMember, Category, Post, PostPage, PostQuery, PostStatus, Tag,
};
use scribe_core::error::RepoError;
use scribe_core::ports::{
    AuthorRepository, BaseRepository, BlogRepository, CategoryRepository, MemberRepository,
    PostRepository, Repositories, TagRepository,
};

/// Every table of the schema behind async locks.
#[derive(Default)]
pub struct InMemoryStore {
    blogs: RwLock<HashMap<Uuid, Blog>>,
    members: RwLock<HashMap<(Uuid, Uuid), BlogMember>>,
    categories: RwLock<HashMap<Uuid, Category>>,
    authors: RwLock<HashMap<Uuid, Author>>,
    tags: RwLock<HashMap<Uuid, Tag>>,
    posts: RwLock<HashMap<Uuid, Post>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bundle this store as every repository port.
    pub fn repositories(self: &Arc<Self>) -> Repositories {
        Repositories {
            blogs: self.clone(),
            members: self.clone(),
            categories: self.clone(),
            authors: self.clone(),
            tags: self.clone(),
            posts: self.clone(),
        }
    }
}

macro_rules! keyed_base_repository {
    ($entity:ty, $field:ident) => {
        #[async_trait]
        impl BaseRepository<$entity, Uuid> for InMemoryStore {
            async fn find_by_id(&self, id: Uuid) -> Result<Option<$entity>, RepoError> {
                Ok(self.$field.read().await.get(&id).cloned())
            }

            async fn save(&self, entity: $entity) -> Result<$entity, RepoError> {
                self.$field.write().await.insert(entity.id, entity.clone());
                Ok(entity)
            }

            async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
                self.$field
                    .write()
                    .await
                    .remove(&id)
                    .map(|_| ())
                    .ok_or(RepoError::NotFound)
            }
        }
    };
}

keyed_base_repository!(Blog, blogs);
keyed_base_repository!(Category, categories);
keyed_base_repository!(Author, authors);
keyed_base_repository!(Tag, tags);

#[async_trait]
impl BlogRepository for InMemoryStore {
    async fn find_all(&self) -> Result<Vec<Blog>, RepoError> {
        let mut blogs: Vec<Blog> = self.blogs.read().await.values().cloned().collect();
        blogs.sort_by_key(|blog| blog.created_at);
        Ok(blogs)
    }
}

#[async_trait]
impl MemberRepository for InMemoryStore {
    async fn find_membership(
        &self,
        blog_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<BlogMember>, RepoError> {
        Ok(self.members.read().await.get(&(blog_id, user_id)).cloned())
    }

    async fn add(&self, member: BlogMember) -> Result<BlogMember, RepoError> {
        self.members
            .write()
            .await
            .insert((member.blog_id, member.user_id), member.clone());
        Ok(member)
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn find_in_blog(&self, blog_id: Uuid, id: Uuid) -> Result<Option<Category>, RepoError> {
        Ok(self
            .categories
            .read()
            .await
            .get(&id)
            .filter(|category| category.blog_id == blog_id)
            .cloned())
    }

    async fn list_for_blog(&self, blog_id: Uuid) -> Result<Vec<Category>, RepoError> {
        let mut categories: Vec<Category> = self
            .categories
            .read()
            .await
            .values()
            .filter(|category| category.blog_id == blog_id)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }
}

#[async_trait]
impl AuthorRepository for InMemoryStore {
    async fn find_in_blog(&self, blog_id: Uuid, id: Uuid) -> Result<Option<Author>, RepoError> {
        Ok(self
            .authors
            .read()
            .await
            .get(&id)
            .filter(|author| author.blog_id == blog_id)
            .cloned())
    }

    async fn list_for_blog(&self, blog_id: Uuid) -> Result<Vec<Author>, RepoError> {
        let mut authors: Vec<Author> = self
            .authors
            .read()
            .await
            .values()
            .filter(|author| author.blog_id == blog_id)
            .cloned()
            .collect();
        authors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(authors)
    }
}

#[async_trait]
impl TagRepository for InMemoryStore {
    async fn find_many_in_blog(&self, blog_id: Uuid, ids: &[Uuid]) -> Result<Vec<Tag>, RepoError> {
        let tags = self.tags.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tags.get(id))
            .filter(|tag| tag.blog_id == blog_id)
            .cloned()
            .collect())
    }

    async fn find_by_names_in_blog(
        &self,
        blog_id: Uuid,
        names: &[String],
    ) -> Result<Vec<Tag>, RepoError> {
        Ok(self
            .tags
            .read()
            .await
            .values()
            .filter(|tag| tag.blog_id == blog_id && names.contains(&tag.name))
            .cloned()
            .collect())
    }

    async fn list_for_blog(&self, blog_id: Uuid) -> Result<Vec<Tag>, RepoError> {
        let mut tags: Vec<Tag> = self
            .tags
            .read()
            .await
            .values()
            .filter(|tag| tag.blog_id == blog_id)
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.posts.read().await.get(&id).cloned())
    }

    async fn save(&self, entity: Post) -> Result<Post, RepoError> {
        let mut posts = self.posts.write().await;
        let slug_taken = posts.values().any(|post| {
            post.id != entity.id && post.blog_id == entity.blog_id && post.slug == entity.slug
        });
        if slug_taken {
            return Err(RepoError::Constraint(format!(
                "duplicate slug '{}' in blog",
                entity.slug
            )));
        }
        posts.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.posts
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn find_by_blog(&self, blog_id: Uuid) -> Result<Vec<Post>, RepoError> {
        let mut posts: Vec<Post> = self
            .posts
            .read()
            .await
            .values()
            .filter(|post| post.blog_id == blog_id)
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn find_page(&self, blog_id: Uuid, query: &PostQuery) -> Result<PostPage, RepoError> {
        let mut matching: Vec<Post> = self
            .posts
            .read()
            .await
            .values()
            .filter(|post| post.blog_id == blog_id && query.matches(post))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.page_size as usize)
            .collect();
        Ok(PostPage::new(items, total, query))
    }

    async fn find_by_slug(&self, blog_id: Uuid, slug: &str) -> Result<Option<Post>, RepoError> {
        Ok(self
            .posts
            .read()
            .await
            .values()
            .find(|post| post.blog_id == blog_id && post.slug == slug)
            .cloned())
    }

    async fn find_due_scheduled(&self, now: DateTime<Utc>) -> Result<Vec<Post>, RepoError> {
        let mut due: Vec<Post> = self
            .posts
            .read()
            .await
            .values()
            .filter(|post| {
                post.status == PostStatus::Scheduled
                    && post.published_at.is_some_and(|at| at <= now)
            })
            .cloned()
            .collect();
        due.sort_by_key(|post| post.published_at);
        Ok(due)
    }

    async fn publish_scheduled(
        &self,
        ids: &[Uuid],
        now: DateTime<Utc>,
    ) -> Result<Vec<Uuid>, RepoError> {
        let mut posts = self.posts.write().await;
        let mut flipped = Vec::new();
        for id in ids {
            if let Some(post) = posts.get_mut(id) {
                let due = post.status == PostStatus::Scheduled
                    && post.published_at.is_some_and(|at| at <= now);
                if due {
                    post.status = PostStatus::Published;
                    post.updated_at = now;
                    flipped.push(*id);
                }
            }
        }
        Ok(flipped)
    }

    async fn latest_created_at(&self, blog_id: Uuid) -> Result<Option<DateTime<Utc>>, RepoError> {
        Ok(self
            .posts
            .read()
            .await
            .values()
            .filter(|post| post.blog_id == blog_id)
            .map(|post| post.created_at)
            .max())
    }
}
