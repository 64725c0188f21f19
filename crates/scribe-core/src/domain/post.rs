use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Publication status of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostStatus {
    Draft,
    Scheduled,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "DRAFT",
            PostStatus::Scheduled => "SCHEDULED",
            PostStatus::Published => "PUBLISHED",
        }
    }

    /// Whether this status requires the full set of gated fields.
    pub fn is_gated(&self) -> bool {
        matches!(self, PostStatus::Scheduled | PostStatus::Published)
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DRAFT" => Ok(PostStatus::Draft),
            "SCHEDULED" => Ok(PostStatus::Scheduled),
            "PUBLISHED" => Ok(PostStatus::Published),
            other => Err(format!("unknown post status: {other}")),
        }
    }
}

/// Post entity - a blog article owned by exactly one blog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
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
    pub status: PostStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub ai_image_prompt: Option<String>,
    pub ai_review_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new draft post.
    pub fn new(
        blog_id: Uuid,
        category_id: Uuid,
        author_id: Uuid,
        title: String,
        slug: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            blog_id,
            title,
            description: String::new(),
            slug,
            content: String::new(),
            image_url: None,
            category_id,
            author_id,
            tag_ids: Vec::new(),
            status: PostStatus::Draft,
            published_at: None,
            ai_image_prompt: None,
            ai_review_notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Snapshot of the fields the status machine reasons about.
    pub fn state(&self) -> PostState {
        PostState {
            title: self.title.clone(),
            description: self.description.clone(),
            slug: self.slug.clone(),
            content: self.content.clone(),
            image_url: self.image_url.clone(),
            category_id: Some(self.category_id),
            author_id: Some(self.author_id),
            tag_ids: self.tag_ids.clone(),
            status: self.status,
            published_at: self.published_at,
        }
    }

    /// Write a resolved state back onto the entity.
    ///
    /// Category and author are only replaced when the state carries them.
    pub fn apply(&mut self, state: PostState, now: DateTime<Utc>) {
        self.title = state.title;
        self.description = state.description;
        self.slug = state.slug;
        self.content = state.content;
        self.image_url = state.image_url;
        if let Some(category_id) = state.category_id {
            self.category_id = category_id;
        }
        if let Some(author_id) = state.author_id {
            self.author_id = author_id;
        }
        self.tag_ids = state.tag_ids;
        self.status = state.status;
        self.published_at = state.published_at;
        self.updated_at = now;
    }
}

/// The lifecycle-relevant view of a post.
#[derive(Debug, Clone, PartialEq)]
pub struct PostState {
    pub title: String,
    pub description: String,
    pub slug: String,
    pub content: String,
    pub image_url: Option<String>,
    pub category_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub tag_ids: Vec<Uuid>,
    pub status: PostStatus,
    pub published_at: Option<DateTime<Utc>>,
}

impl PostState {
    /// An empty draft, the starting point for newly created posts.
    pub fn blank() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            slug: String::new(),
            content: String::new(),
            image_url: None,
            category_id: None,
            author_id: None,
            tag_ids: Vec::new(),
            status: PostStatus::Draft,
            published_at: None,
        }
    }
}

/// A partial update to a post. `None` means "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    /// An image upload accompanies this change; gating treats the image as present.
    pub incoming_image: bool,
    pub category_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub tag_ids: Option<Vec<Uuid>>,
    pub status: Option<PostStatus>,
    pub published_at: Option<DateTime<Utc>>,
    pub ai_image_prompt: Option<String>,
    pub ai_review_notes: Option<String>,
}

/// Fields supplied when creating a post.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub title: String,
    pub description: String,
    pub slug: String,
    pub content: String,
    pub image_url: Option<String>,
    pub category_id: Uuid,
    pub author_id: Uuid,
    pub tag_ids: Vec<Uuid>,
    pub status: PostStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub ai_image_prompt: Option<String>,
}

impl NewPost {
    /// A draft with only the required references filled in.
    pub fn draft(
        title: impl Into<String>,
        slug: impl Into<String>,
        category_id: Uuid,
        author_id: Uuid,
    ) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            slug: slug.into(),
            content: String::new(),
            image_url: None,
            category_id,
            author_id,
            tag_ids: Vec::new(),
            status: PostStatus::Draft,
            published_at: None,
            ai_image_prompt: None,
        }
    }

    /// Express creation as a change set applied to a blank draft.
    pub fn as_changes(&self, incoming_image: bool) -> PostChanges {
        PostChanges {
            title: Some(self.title.clone()),
            description: Some(self.description.clone()),
            slug: Some(self.slug.clone()),
            content: Some(self.content.clone()),
            image_url: self.image_url.clone(),
            incoming_image,
            category_id: Some(self.category_id),
            author_id: Some(self.author_id),
            tag_ids: Some(self.tag_ids.clone()),
            status: Some(self.status),
            published_at: self.published_at,
            ai_image_prompt: self.ai_image_prompt.clone(),
            ai_review_notes: None,
        }
    }
}

/// Raw image bytes handed to the storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// Base name used to build the storage key.
    pub name: String,
    pub bytes: Vec<u8>,
}
