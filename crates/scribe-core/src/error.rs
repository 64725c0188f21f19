//! Domain-level error types.

use thiserror::Error;

use crate::domain::TransitionError;
use crate::ports::{
    CacheError, ContentError, DeployError, ExportError, JobQueueError, StorageError,
};

/// Post lifecycle failures, each carrying a stable reason code.
#[derive(Debug, Error)]
pub enum PostError {
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("Category not found")]
    CategoryNotFound,

    #[error("Author not found")]
    AuthorNotFound,

    #[error("One or more tags are invalid for this blog")]
    InvalidTags,

    #[error("Blog not found")]
    BlogNotFound,

    #[error("Post not found")]
    PostNotFound,

    #[error("Page must be at least 1 and page size between 1 and 100")]
    InvalidPagination,

    #[error("Only the blog owner can publish posts")]
    PublishForbidden,

    #[error("Blog has no image storage configured")]
    StorageNotConfigured,

    #[error("Failed to trigger site deploy after publishing the post")]
    DeployFailed(#[source] DeployError),

    #[error("Image storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Markdown export failed: {0}")]
    Export(#[from] ExportError),

    #[error("Content generation failed: {0}")]
    Content(#[from] ContentError),

    #[error("Cache operation failed: {0}")]
    Cache(#[from] CacheError),

    #[error("Job queue failure: {0}")]
    Queue(#[from] JobQueueError),

    #[error("Repository failure: {0}")]
    Repo(#[from] RepoError),
}

impl PostError {
    /// Stable reason code for the routing layer.
    pub fn code(&self) -> &'static str {
        match self {
            PostError::Transition(err) => err.code(),
            PostError::CategoryNotFound => "CATEGORY_NOT_FOUND",
            PostError::AuthorNotFound => "AUTHOR_NOT_FOUND",
            PostError::InvalidTags => "INVALID_TAGS",
            PostError::BlogNotFound => "BLOG_NOT_FOUND",
            PostError::PostNotFound => "POST_NOT_FOUND",
            PostError::InvalidPagination => "INVALID_PAGINATION",
            PostError::PublishForbidden => "PUBLISH_FORBIDDEN",
            PostError::StorageNotConfigured => "STORAGE_NOT_CONFIGURED",
            PostError::DeployFailed(_) => "DEPLOY_FAILED",
            PostError::Storage(_) => "STORAGE_ERROR",
            PostError::Export(_) => "EXPORT_FAILED",
            PostError::Content(_) => "CONTENT_GENERATION_FAILED",
            PostError::Cache(_) | PostError::Queue(_) | PostError::Repo(_) => "INTERNAL_ERROR",
        }
    }
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GatedField, PostStatus};

    #[test]
    fn test_transition_codes_pass_through() {
        let err = PostError::from(TransitionError::MissingFieldsForPublish {
            target: PostStatus::Scheduled,
            missing: vec![GatedField::ImageUrl, GatedField::Tags],
        });
        assert_eq!(err.code(), "MISSING_FIELDS_FOR_PUBLISH");
        assert_eq!(
            err.to_string(),
            "Cannot schedule post; missing fields: imageUrl, tags"
        );
    }

    #[test]
    fn test_deploy_failure_code() {
        let err = PostError::DeployFailed(DeployError::BuildFailed("boom".into()));
        assert_eq!(err.code(), "DEPLOY_FAILED");
    }
}
