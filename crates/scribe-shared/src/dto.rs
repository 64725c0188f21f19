//! Data Transfer Objects - request/response types for the post API.
//!
//! Field names are camelCase on the wire; statuses are `DRAFT`, `SCHEDULED`
//! or `PUBLISHED`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to create a post in a blog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub slug: String,
    #[serde(default)]
    pub content: String,
    pub image_url: Option<String>,
    pub category_id: Uuid,
    pub author_id: Uuid,
    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
    pub status: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub ai_image_prompt: Option<String>,
}

/// Partial update; omitted fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub tag_ids: Option<Vec<Uuid>>,
    pub status: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub ai_image_prompt: Option<String>,
    pub ai_review_notes: Option<String>,
}

/// Query string of the image upload route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUploadQuery {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: Uuid,
    pub blog_id: Uuid,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub content: String,
    pub image_url: Option<String>,
    pub category_id: Uuid,
    pub author_id: Uuid,
    pub tag_ids: Vec<Uuid>,
    pub status: String,
    pub published_at: Option<DateTime<Utc>>,
    pub ai_image_prompt: Option<String>,
    pub ai_review_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing filters and paging, from the query string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPostsQuery {
    pub category_id: Option<Uuid>,
    pub tag_id: Option<Uuid>,
    pub status: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPageResponse {
    pub items: Vec<PostResponse>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkdownResponse {
    pub folder: String,
    pub file_name: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResponse {
    pub path: String,
}
