//! Blog membership entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use scribe_core::domain::{BlogMember, MemberRole};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "blog_members")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub blog_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    pub role: String,
    pub created_at: DateTimeWithTimeZone,
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

impl Model {
    /// `None` for roles this service does not recognize.
    pub fn into_domain(self) -> Option<BlogMember> {
        let role = match self.role.as_str() {
            "EDITOR" => MemberRole::Editor,
            _ => return None,
        };
        Some(BlogMember {
            blog_id: self.blog_id,
            user_id: self.user_id,
            role,
            created_at: self.created_at.into(),
        })
    }
}

impl From<BlogMember> for ActiveModel {
    fn from(member: BlogMember) -> Self {
        Self {
            blog_id: Set(member.blog_id),
            user_id: Set(member.user_id),
            role: Set(member.role.as_str().to_string()),
            created_at: Set(member.created_at.into()),
        }
    }
}
