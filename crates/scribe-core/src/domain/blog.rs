use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Static-site deploy credentials for a blog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployTarget {
    pub site_id: String,
    pub token: String,
}

/// Object-storage bucket used for a blog's images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageTarget {
    pub bucket: String,
    /// Public base URL objects are served from, without trailing slash.
    pub public_domain: String,
    pub account_id: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl StorageTarget {
    /// Public URL of a stored object.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_domain.trim_end_matches('/'), key)
    }

    /// Storage key of a public URL, if it was served from this bucket.
    pub fn key_from_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(self.public_domain.trim_end_matches('/'))
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|key| !key.is_empty())
    }
}

/// Blog entity - tenant container owning posts and taxonomy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blog {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub deploy: Option<DeployTarget>,
    pub storage: Option<StorageTarget>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Blog {
    pub fn new(owner_id: Uuid, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            title: title.into(),
            deploy: None,
            storage: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_deploy(mut self, target: DeployTarget) -> Self {
        self.deploy = Some(target);
        self
    }

    pub fn with_storage(mut self, target: StorageTarget) -> Self {
        self.storage = Some(target);
        self
    }

    pub fn deploy_target(&self) -> Option<&DeployTarget> {
        self.deploy
            .as_ref()
            .filter(|target| !target.site_id.trim().is_empty())
    }

    /// Directory name used for markdown exports.
    pub fn folder_name(&self) -> String {
        self.title.split_whitespace().collect()
    }
}

/// Role of a non-owner member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberRole {
    Editor,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Editor => "EDITOR",
        }
    }
}

/// Membership of a user in someone else's blog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogMember {
    pub blog_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
    pub created_at: DateTime<Utc>,
}

impl BlogMember {
    pub fn editor(blog_id: Uuid, user_id: Uuid) -> Self {
        Self {
            blog_id,
            user_id,
            role: MemberRole::Editor,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> StorageTarget {
        StorageTarget {
            bucket: "images".into(),
            public_domain: "https://cdn.example.com/".into(),
            account_id: "acct".into(),
            access_key_id: "key".into(),
            secret_access_key: "secret".into(),
        }
    }

    #[test]
    fn test_public_url_and_back() {
        let target = storage();
        let url = target.public_url("blog/images/cover.webp");
        assert_eq!(url, "https://cdn.example.com/blog/images/cover.webp");
        assert_eq!(target.key_from_url(&url), Some("blog/images/cover.webp"));
        assert_eq!(target.key_from_url("https://elsewhere.com/x.webp"), None);
    }

    #[test]
    fn test_blank_site_id_is_not_a_deploy_target() {
        let blog = Blog::new(Uuid::new_v4(), "My Blog").with_deploy(DeployTarget {
            site_id: "  ".into(),
            token: "t".into(),
        });
        assert!(blog.deploy_target().is_none());
    }

    #[test]
    fn test_folder_name_strips_whitespace() {
        let blog = Blog::new(Uuid::new_v4(), "Rust  Weekly\tNotes");
        assert_eq!(blog.folder_name(), "RustWeeklyNotes");
    }
}
