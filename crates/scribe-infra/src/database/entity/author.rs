//! Author entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use scribe_core::domain::Author;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "authors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub blog_id: Uuid,
    pub name: String,
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
}

impl Related<super::blog::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Blog.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Author {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            blog_id: model.blog_id,
            name: model.name,
        }
    }
}

impl From<Author> for ActiveModel {
    fn from(value: Author) -> Self {
        Self {
            id: Set(value.id),
            blog_id: Set(value.blog_id),
            name: Set(value.name),
        }
    }
}
