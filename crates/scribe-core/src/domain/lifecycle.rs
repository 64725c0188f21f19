//! Post status state machine.
//!
//! Pure decision logic: given the current state of a post and a proposed
//! change set, either resolves the next state or rejects the transition with
//! a specific reason. No I/O happens here.
//!
//! ```text
//! DRAFT ──► SCHEDULED ──► PUBLISHED
//!   ▲           │              │
//!   └───────────┘              └──► (no way back)
//! ```

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::post::{PostChanges, PostState, PostStatus};

/// A field that must be filled in before a post may leave DRAFT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatedField {
    Title,
    Description,
    Slug,
    Content,
    CategoryId,
    AuthorId,
    ImageUrl,
    Tags,
}

impl GatedField {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatedField::Title => "title",
            GatedField::Description => "description",
            GatedField::Slug => "slug",
            GatedField::Content => "content",
            GatedField::CategoryId => "categoryId",
            GatedField::AuthorId => "authorId",
            GatedField::ImageUrl => "imageUrl",
            GatedField::Tags => "tags",
        }
    }
}

impl std::fmt::Display for GatedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasons a status transition is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Cannot change a published post back to draft or scheduled")]
    InvalidStatusTransition,

    #[error("Cannot {} post; missing fields: {}", action(.target), join_fields(.missing))]
    MissingFieldsForPublish {
        target: PostStatus,
        missing: Vec<GatedField>,
    },

    #[error("publishedAt is required when scheduling a post")]
    PublishedAtRequired,

    #[error("publishedAt must be in the future for scheduled posts")]
    PublishedAtInPast,
}

impl TransitionError {
    pub fn code(&self) -> &'static str {
        match self {
            TransitionError::InvalidStatusTransition => "INVALID_STATUS_TRANSITION",
            TransitionError::MissingFieldsForPublish { .. } => "MISSING_FIELDS_FOR_PUBLISH",
            TransitionError::PublishedAtRequired => "PUBLISHED_AT_REQUIRED",
            TransitionError::PublishedAtInPast => "PUBLISHED_AT_IN_PAST",
        }
    }
}

fn action(target: &PostStatus) -> &'static str {
    match target {
        PostStatus::Scheduled => "schedule",
        PostStatus::Published => "publish",
        PostStatus::Draft => "save",
    }
}

fn join_fields(fields: &[GatedField]) -> String {
    fields
        .iter()
        .map(GatedField::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// An accepted transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: PostState,
    pub previous_status: PostStatus,
}

impl Transition {
    /// True when this transition moves a post into PUBLISHED for the first time.
    pub fn newly_published(&self) -> bool {
        self.next.status == PostStatus::Published && self.previous_status != PostStatus::Published
    }
}

/// Decide the next state of a post.
pub fn resolve_transition(
    current: &PostState,
    changes: &PostChanges,
    now: DateTime<Utc>,
) -> Result<Transition, TransitionError> {
    let next_status = changes.status.unwrap_or(current.status);

    if current.status == PostStatus::Published && next_status != PostStatus::Published {
        return Err(TransitionError::InvalidStatusTransition);
    }

    let mut next = PostState {
        title: pick(&changes.title, &current.title),
        description: pick(&changes.description, &current.description),
        slug: pick(&changes.slug, &current.slug),
        content: pick(&changes.content, &current.content),
        image_url: changes.image_url.clone().or_else(|| current.image_url.clone()),
        category_id: changes.category_id.or(current.category_id),
        author_id: changes.author_id.or(current.author_id),
        tag_ids: changes
            .tag_ids
            .clone()
            .unwrap_or_else(|| current.tag_ids.clone()),
        status: next_status,
        published_at: changes.published_at.or(current.published_at),
    };

    if next_status.is_gated() {
        let missing = missing_fields(&next, changes.incoming_image);
        if !missing.is_empty() {
            return Err(TransitionError::MissingFieldsForPublish {
                target: next_status,
                missing,
            });
        }
    }

    if next_status == PostStatus::Scheduled {
        match next.published_at {
            None => return Err(TransitionError::PublishedAtRequired),
            Some(at) if at <= now => return Err(TransitionError::PublishedAtInPast),
            Some(_) => {}
        }
    }

    next.published_at = match next_status {
        PostStatus::Draft => None,
        PostStatus::Published
            if current.status != PostStatus::Published && changes.published_at.is_none() =>
        {
            Some(now)
        }
        _ => next.published_at,
    };

    Ok(Transition {
        next,
        previous_status: current.status,
    })
}

fn pick(change: &Option<String>, current: &str) -> String {
    change.clone().unwrap_or_else(|| current.to_string())
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Every gated field absent from `state`, in a stable order.
pub fn missing_fields(state: &PostState, incoming_image: bool) -> Vec<GatedField> {
    let mut missing = Vec::new();
    if is_blank(&state.title) {
        missing.push(GatedField::Title);
    }
    if is_blank(&state.description) {
        missing.push(GatedField::Description);
    }
    if is_blank(&state.slug) {
        missing.push(GatedField::Slug);
    }
    if is_blank(&state.content) {
        missing.push(GatedField::Content);
    }
    if state.category_id.is_none() {
        missing.push(GatedField::CategoryId);
    }
    if state.author_id.is_none() {
        missing.push(GatedField::AuthorId);
    }
    if !incoming_image && state.image_url.as_deref().is_none_or(is_blank) {
        missing.push(GatedField::ImageUrl);
    }
    if state.tag_ids.is_empty() {
        missing.push(GatedField::Tags);
    }
    missing
}
