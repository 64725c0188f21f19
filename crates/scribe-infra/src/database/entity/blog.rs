//! Blog entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use scribe_core::domain::{Blog, DeployTarget, StorageTarget};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "blogs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub deploy_site_id: Option<String>,
    pub deploy_token: Option<String>,
    pub storage_bucket: Option<String>,
    pub storage_public_domain: Option<String>,
    pub storage_account_id: Option<String>,
    pub storage_access_key_id: Option<String>,
    pub storage_secret_access_key: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post::Entity")]
    Post,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Blog {
    fn from(model: Model) -> Self {
        let deploy = match (model.deploy_site_id, model.deploy_token) {
            (Some(site_id), Some(token)) => Some(DeployTarget { site_id, token }),
            _ => None,
        };
        let storage = match (model.storage_bucket, model.storage_public_domain) {
            (Some(bucket), Some(public_domain)) => Some(StorageTarget {
                bucket,
                public_domain,
                account_id: model.storage_account_id.unwrap_or_default(),
                access_key_id: model.storage_access_key_id.unwrap_or_default(),
                secret_access_key: model.storage_secret_access_key.unwrap_or_default(),
            }),
            _ => None,
        };

        Self {
            id: model.id,
            owner_id: model.owner_id,
            title: model.title,
            deploy,
            storage,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<Blog> for ActiveModel {
    fn from(blog: Blog) -> Self {
        let (deploy_site_id, deploy_token) = match blog.deploy {
            Some(target) => (Some(target.site_id), Some(target.token)),
            None => (None, None),
        };
        let storage = blog.storage;

        Self {
            id: Set(blog.id),
            owner_id: Set(blog.owner_id),
            title: Set(blog.title),
            deploy_site_id: Set(deploy_site_id),
            deploy_token: Set(deploy_token),
            storage_bucket: Set(storage.as_ref().map(|s| s.bucket.clone())),
            storage_public_domain: Set(storage.as_ref().map(|s| s.public_domain.clone())),
            storage_account_id: Set(storage.as_ref().map(|s| s.account_id.clone())),
            storage_access_key_id: Set(storage.as_ref().map(|s| s.access_key_id.clone())),
            storage_secret_access_key: Set(storage.map(|s| s.secret_access_key)),
            created_at: Set(blog.created_at.into()),
            updated_at: Set(blog.updated_at.into()),
        }
    }
}
