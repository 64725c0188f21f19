//! Post entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use scribe_core::domain::{Post, PostStatus};
use scribe_core::error::RepoError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub blog_id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub slug: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub image_url: Option<String>,
    pub category_id: Uuid,
    pub author_id: Uuid,
    pub status: String,
    pub published_at: Option<DateTimeWithTimeZone>,
    #[sea_orm(column_type = "Text", nullable)]
    pub ai_image_prompt: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub ai_review_notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::blog::Entity",
        from = "Column::BlogId",
        to = "super::blog::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Blog,
    #[sea_orm(has_many = "super::post_tag::Entity")]
    PostTag,
}

impl Related<super::blog::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Blog.def()
    }
}

impl Related<super::post_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PostTag.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Rebuild the domain post; tag links live in `post_tags`.
    pub fn into_domain(self, tag_ids: Vec<Uuid>) -> Result<Post, RepoError> {
        let status: PostStatus = self
            .status
            .parse()
            .map_err(|_| RepoError::Query(format!("Unknown post status '{}'", self.status)))?;

        Ok(Post {
            id: self.id,
            blog_id: self.blog_id,
            title: self.title,
            description: self.description,
            slug: self.slug,
            content: self.content,
            image_url: self.image_url,
            category_id: self.category_id,
            author_id: self.author_id,
            tag_ids,
            status,
            published_at: self.published_at.map(Into::into),
            ai_image_prompt: self.ai_image_prompt,
            ai_review_notes: self.ai_review_notes,
            created_at: self.created_at.into(),
            updated_at: self.updated_at.into(),
        })
    }
}

/// Conversion from Domain Post to SeaORM ActiveModel. Tags are written separately.
impl From<&Post> for ActiveModel {
    fn from(post: &Post) -> Self {
        Self {
            id: Set(post.id),
            blog_id: Set(post.blog_id),
            title: Set(post.title.clone()),
            description: Set(post.description.clone()),
            slug: Set(post.slug.clone()),
            content: Set(post.content.clone()),
            image_url: Set(post.image_url.clone()),
            category_id: Set(post.category_id),
            author_id: Set(post.author_id),
            status: Set(post.status.as_str().to_string()),
            published_at: Set(post.published_at.map(Into::into)),
            ai_image_prompt: Set(post.ai_image_prompt.clone()),
            ai_review_notes: Set(post.ai_review_notes.clone()),
            created_at: Set(post.created_at.into()),
            updated_at: Set(post.updated_at.into()),
        }
    }
}
