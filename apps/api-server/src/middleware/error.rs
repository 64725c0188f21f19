//! Error handling middleware - RFC 7807 compliant responses.

use std::fmt;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use scribe_core::error::{PostError, RepoError};
use scribe_shared::ErrorResponse;

/// Application-level error type that converts to RFC 7807 responses.
///
/// Every variant except `Internal` carries the stable reason code clients match on.
#[derive(Debug)]
pub enum AppError {
    NotFound { code: &'static str, detail: String },
    BadRequest { code: &'static str, detail: String },
    Forbidden { code: &'static str, detail: String },
    Conflict(String),
    BadGateway { code: &'static str, detail: String },
    Internal(String),
}

impl AppError {
    pub fn bad_request(code: &'static str, detail: impl Into<String>) -> Self {
        AppError::BadRequest {
            code,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound { detail, .. } => write!(f, "Not found: {}", detail),
            AppError::BadRequest { detail, .. } => write!(f, "Bad request: {}", detail),
            AppError::Forbidden { detail, .. } => write!(f, "Forbidden: {}", detail),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::BadGateway { detail, .. } => write!(f, "Bad gateway: {}", detail),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::NotFound { code, detail } => {
                ErrorResponse::not_found(detail).with_code(*code)
            }
            AppError::BadRequest { code, detail } => {
                ErrorResponse::bad_request(detail).with_code(*code)
            }
            AppError::Forbidden { code, detail } => {
                ErrorResponse::forbidden(detail).with_code(*code)
            }
            AppError::Conflict(detail) => ErrorResponse::new(409, "Conflict")
                .with_detail(detail)
                .with_code("CONFLICT"),
            AppError::BadGateway { code, detail } => ErrorResponse::new(502, "Bad Gateway")
                .with_detail(detail)
                .with_code(*code),
            AppError::Internal(detail) => {
                // Log internal errors
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error().with_code("INTERNAL_ERROR")
            }
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

// Conversion from domain errors
impl From<PostError> for AppError {
    fn from(err: PostError) -> Self {
        let code = err.code();
        let detail = err.to_string();
        match err {
            PostError::BlogNotFound
            | PostError::PostNotFound
            | PostError::CategoryNotFound
            | PostError::AuthorNotFound => AppError::NotFound { code, detail },
            PostError::Transition(_)
            | PostError::InvalidTags
            | PostError::InvalidPagination
            | PostError::StorageNotConfigured => AppError::BadRequest { code, detail },
            PostError::PublishForbidden => AppError::Forbidden { code, detail },
            PostError::DeployFailed(source) => {
                tracing::error!(error = %source, "Site deploy failed after publish");
                AppError::BadGateway { code, detail }
            }
            PostError::Repo(repo) => AppError::from(repo),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound {
                code: "NOT_FOUND",
                detail: "Resource not found".to_string(),
            },
            RepoError::Constraint(msg) => AppError::Conflict(msg),
            RepoError::Connection(msg) => {
                tracing::error!("Database connection error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
            RepoError::Query(msg) => {
                tracing::error!("Database query error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_core::domain::TransitionError;
    use scribe_core::ports::DeployError;

    #[test]
    fn test_post_errors_map_to_status_codes() {
        let cases = [
            (PostError::BlogNotFound, StatusCode::NOT_FOUND),
            (PostError::PostNotFound, StatusCode::NOT_FOUND),
            (PostError::InvalidTags, StatusCode::BAD_REQUEST),
            (PostError::InvalidPagination, StatusCode::BAD_REQUEST),
            (PostError::StorageNotConfigured, StatusCode::BAD_REQUEST),
            (PostError::PublishForbidden, StatusCode::FORBIDDEN),
            (
                PostError::DeployFailed(DeployError::BuildFailed("error".into())),
                StatusCode::BAD_GATEWAY,
            ),
            (
                PostError::Repo(RepoError::Constraint("duplicate slug".into())),
                StatusCode::CONFLICT,
            ),
            (
                PostError::Repo(RepoError::Query("boom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status_code(), expected);
        }
    }

    #[test]
    fn test_transition_error_is_bad_request() {
        let err = PostError::from(TransitionError::InvalidStatusTransition);
        assert_eq!(AppError::from(err).status_code(), StatusCode::BAD_REQUEST);

        let err = PostError::from(TransitionError::PublishedAtRequired);
        match AppError::from(err) {
            AppError::BadRequest { code, .. } => assert_eq!(code, "PUBLISHED_AT_REQUIRED"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
