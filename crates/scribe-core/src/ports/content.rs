//! AI content generation port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Category;

/// What the generator knows about a blog.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BlogContext {
    pub blog_id: Uuid,
    pub blog_title: String,
    pub categories: Vec<Category>,
    pub tag_names: Vec<String>,
    /// Existing post titles, so suggestions do not repeat them.
    pub existing_titles: Vec<String>,
    pub existing_slugs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleSuggestion {
    pub title: String,
    pub slug: String,
}

/// Title ideas for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleGroup {
    pub category_id: Uuid,
    pub titles: Vec<TitleSuggestion>,
}

/// A generated article body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPost {
    pub content: String,
    pub description: String,
    #[serde(default)]
    pub tag_names: Vec<String>,
    pub slug: String,
}

#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate_titles(&self, context: &BlogContext) -> Result<Vec<TitleGroup>, ContentError>;

    async fn generate_post_body(
        &self,
        context: &BlogContext,
        category: &Category,
        title: &str,
    ) -> Result<GeneratedPost, ContentError>;

    /// A prompt for an image generator describing a cover for `content`.
    async fn generate_image_prompt(&self, content: &str) -> Result<String, ContentError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("Generator request failed: {0}")]
    Request(String),

    #[error("Generator returned an unusable response: {0}")]
    InvalidResponse(String),
}
