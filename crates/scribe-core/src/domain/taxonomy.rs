//! Blog-scoped classification entities referenced by posts.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub blog_id: Uuid,
    pub name: String,
    pub description: String,
}

impl Category {
    pub fn new(blog_id: Uuid, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            blog_id,
            name: name.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: Uuid,
    pub blog_id: Uuid,
    pub name: String,
}

impl Author {
    pub fn new(blog_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            blog_id,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub blog_id: Uuid,
    pub name: String,
}

impl Tag {
    pub fn new(blog_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            blog_id,
            name: name.into(),
        }
    }
}
