//! PostgreSQL repository implementations.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ColumnTrait, DbConn, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use uuid::Uuid;

use scribe_core::domain::{
    Author, Blog, BlogMember, Category, Post, PostPage, PostQuery, PostStatus, Tag,
};
use scribe_core::error::RepoError;
use scribe_core::ports::{
    AuthorRepository, BaseRepository, BlogRepository, CategoryRepository, MemberRepository,
    PostRepository, TagRepository,
};

use super::entity::{author, blog, blog_member, category, post, post_tag, tag};
use super::postgres_base::{PostgresBaseRepository, query_error, upsert, write_error};

pub type PostgresBlogRepository = PostgresBaseRepository<blog::Entity>;
pub type PostgresCategoryRepository = PostgresBaseRepository<category::Entity>;
pub type PostgresAuthorRepository = PostgresBaseRepository<author::Entity>;
pub type PostgresTagRepository = PostgresBaseRepository<tag::Entity>;

#[async_trait]
impl BlogRepository for PostgresBlogRepository {
    async fn find_all(&self) -> Result<Vec<Blog>, RepoError> {
        let result = blog::Entity::find()
            .order_by_asc(blog::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(query_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn find_in_blog(&self, blog_id: Uuid, id: Uuid) -> Result<Option<Category>, RepoError> {
        let result = category::Entity::find_by_id(id)
            .filter(category::Column::BlogId.eq(blog_id))
            .one(self.db.as_ref())
            .await
            .map_err(query_error)?;

        Ok(result.map(Into::into))
    }

    async fn list_for_blog(&self, blog_id: Uuid) -> Result<Vec<Category>, RepoError> {
        let result = category::Entity::find()
            .filter(category::Column::BlogId.eq(blog_id))
            .order_by_asc(category::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(query_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl AuthorRepository for PostgresAuthorRepository {
    async fn find_in_blog(&self, blog_id: Uuid, id: Uuid) -> Result<Option<Author>, RepoError> {
        let result = author::Entity::find_by_id(id)
            .filter(author::Column::BlogId.eq(blog_id))
            .one(self.db.as_ref())
            .await
            .map_err(query_error)?;

        Ok(result.map(Into::into))
    }

    async fn list_for_blog(&self, blog_id: Uuid) -> Result<Vec<Author>, RepoError> {
        let result = author::Entity::find()
            .filter(author::Column::BlogId.eq(blog_id))
            .order_by_asc(author::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(query_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl TagRepository for PostgresTagRepository {
    async fn find_many_in_blog(&self, blog_id: Uuid, ids: &[Uuid]) -> Result<Vec<Tag>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let result = tag::Entity::find()
            .filter(tag::Column::BlogId.eq(blog_id))
            .filter(tag::Column::Id.is_in(ids.iter().copied()))
            .all(self.db.as_ref())
            .await
            .map_err(query_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn find_by_names_in_blog(
        &self,
        blog_id: Uuid,
        names: &[String],
    ) -> Result<Vec<Tag>, RepoError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let result = tag::Entity::find()
            .filter(tag::Column::BlogId.eq(blog_id))
            .filter(tag::Column::Name.is_in(names.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(query_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn list_for_blog(&self, blog_id: Uuid) -> Result<Vec<Tag>, RepoError> {
        let result = tag::Entity::find()
            .filter(tag::Column::BlogId.eq(blog_id))
            .order_by_asc(tag::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(query_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

/// PostgreSQL blog membership repository.
pub struct PostgresMemberRepository {
    db: Arc<DbConn>,
}

impl PostgresMemberRepository {
    pub fn new(db: Arc<DbConn>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MemberRepository for PostgresMemberRepository {
    async fn find_membership(
        &self,
        blog_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<BlogMember>, RepoError> {
        let result = blog_member::Entity::find_by_id((blog_id, user_id))
            .one(self.db.as_ref())
            .await
            .map_err(query_error)?;

        Ok(result.and_then(blog_member::Model::into_domain))
    }

    async fn add(&self, member: BlogMember) -> Result<BlogMember, RepoError> {
        let active = blog_member::ActiveModel::from(member);
        let model = upsert(active, self.db.as_ref()).await?;
        model
            .into_domain()
            .ok_or_else(|| RepoError::Query("Unknown member role".to_string()))
    }
}

/// PostgreSQL post repository. Tag links are kept in `post_tags`.
pub struct PostgresPostRepository {
    db: Arc<DbConn>,
}

impl PostgresPostRepository {
    pub fn new(db: Arc<DbConn>) -> Self {
        Self { db }
    }

    /// Tag ids per post, in stored order.
    async fn tag_ids_for(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Uuid>>, RepoError> {
        let mut by_post: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        if post_ids.is_empty() {
            return Ok(by_post);
        }

        let links = post_tag::Entity::find()
            .filter(post_tag::Column::PostId.is_in(post_ids.iter().copied()))
            .order_by_asc(post_tag::Column::Position)
            .all(self.db.as_ref())
            .await
            .map_err(query_error)?;

        for link in links {
            by_post.entry(link.post_id).or_default().push(link.tag_id);
        }
        Ok(by_post)
    }

    async fn hydrate(&self, models: Vec<post::Model>) -> Result<Vec<Post>, RepoError> {
        let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
        let mut tags = self.tag_ids_for(&ids).await?;

        models
            .into_iter()
            .map(|model| {
                let tag_ids = tags.remove(&model.id).unwrap_or_default();
                model.into_domain(tag_ids)
            })
            .collect()
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for PostgresPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let Some(model) = post::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(query_error)?
        else {
            return Ok(None);
        };

        Ok(self.hydrate(vec![model]).await?.pop())
    }

    async fn save(&self, entity: Post) -> Result<Post, RepoError> {
        let txn = self.db.begin().await.map_err(query_error)?;

        let model = upsert(post::ActiveModel::from(&entity), &txn).await?;

        post_tag::Entity::delete_many()
            .filter(post_tag::Column::PostId.eq(entity.id))
            .exec(&txn)
            .await
            .map_err(query_error)?;

        if !entity.tag_ids.is_empty() {
            let links = entity
                .tag_ids
                .iter()
                .enumerate()
                .map(|(position, tag_id)| post_tag::ActiveModel {
                    post_id: Set(entity.id),
                    tag_id: Set(*tag_id),
                    position: Set(position as i32),
                });
            post_tag::Entity::insert_many(links)
                .exec(&txn)
                .await
                .map_err(write_error)?;
        }

        txn.commit().await.map_err(query_error)?;

        model.into_domain(entity.tag_ids)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let result = post::Entity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(query_error)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_by_blog(&self, blog_id: Uuid) -> Result<Vec<Post>, RepoError> {
        let models = post::Entity::find()
            .filter(post::Column::BlogId.eq(blog_id))
            .order_by_desc(post::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(query_error)?;

        self.hydrate(models).await
    }

    async fn find_page(&self, blog_id: Uuid, query: &PostQuery) -> Result<PostPage, RepoError> {
        let mut select = post::Entity::find().filter(post::Column::BlogId.eq(blog_id));
        if let Some(category_id) = query.category_id {
            select = select.filter(post::Column::CategoryId.eq(category_id));
        }
        if let Some(status) = query.status {
            select = select.filter(post::Column::Status.eq(status.as_str()));
        }
        if let Some(tag_id) = query.tag_id {
            select = select.filter(
                post::Column::Id.in_subquery(
                    Query::select()
                        .column(post_tag::Column::PostId)
                        .from(post_tag::Entity)
                        .and_where(post_tag::Column::TagId.eq(tag_id))
                        .to_owned(),
                ),
            );
        }

        let total = select
            .clone()
            .count(self.db.as_ref())
            .await
            .map_err(query_error)?;
        let models = select
            .order_by_desc(post::Column::CreatedAt)
            .offset(query.offset())
            .limit(u64::from(query.page_size))
            .all(self.db.as_ref())
            .await
            .map_err(query_error)?;

        let items = self.hydrate(models).await?;
        Ok(PostPage::new(items, total, query))
    }

    async fn find_by_slug(&self, blog_id: Uuid, slug: &str) -> Result<Option<Post>, RepoError> {
        let Some(model) = post::Entity::find()
            .filter(post::Column::BlogId.eq(blog_id))
            .filter(post::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
            .map_err(query_error)?
        else {
            return Ok(None);
        };

        Ok(self.hydrate(vec![model]).await?.pop())
    }

    async fn find_due_scheduled(&self, now: DateTime<Utc>) -> Result<Vec<Post>, RepoError> {
        let models = post::Entity::find()
            .filter(post::Column::Status.eq(PostStatus::Scheduled.as_str()))
            .filter(post::Column::PublishedAt.lte(DateTimeWithTimeZone::from(now)))
            .order_by_asc(post::Column::PublishedAt)
            .all(self.db.as_ref())
            .await
            .map_err(query_error)?;

        self.hydrate(models).await
    }

    async fn publish_scheduled(
        &self,
        ids: &[Uuid],
        now: DateTime<Utc>,
    ) -> Result<Vec<Uuid>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        // The due filter is repeated so rows edited since the scan are left alone.
        let updated = post::Entity::update_many()
            .col_expr(
                post::Column::Status,
                Expr::value(PostStatus::Published.as_str()),
            )
            .col_expr(
                post::Column::UpdatedAt,
                Expr::value(DateTimeWithTimeZone::from(now)),
            )
            .filter(post::Column::Id.is_in(ids.iter().copied()))
            .filter(post::Column::Status.eq(PostStatus::Scheduled.as_str()))
            .filter(post::Column::PublishedAt.lte(DateTimeWithTimeZone::from(now)))
            .exec_with_returning(self.db.as_ref())
            .await
            .map_err(query_error)?;

        Ok(updated.into_iter().map(|model| model.id).collect())
    }

    async fn latest_created_at(&self, blog_id: Uuid) -> Result<Option<DateTime<Utc>>, RepoError> {
        let latest = post::Entity::find()
            .filter(post::Column::BlogId.eq(blog_id))
            .order_by_desc(post::Column::CreatedAt)
            .one(self.db.as_ref())
            .await
            .map_err(query_error)?;

        Ok(latest.map(|model| model.created_at.into()))
    }
}
