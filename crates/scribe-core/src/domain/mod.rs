//! Domain entities and pure decision logic.

mod access;
mod blog;
mod lifecycle;
mod listing;
mod markdown;
mod post;
mod taxonomy;

pub use access::{AccessDecision, BlogAccess, Role};
pub use blog::{Blog, BlogMember, DeployTarget, MemberRole, StorageTarget};
pub use lifecycle::{GatedField, Transition, TransitionError, missing_fields, resolve_transition};
pub use listing::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PostPage, PostQuery};
pub use markdown::MarkdownDocument;
pub use post::{ImageUpload, NewPost, Post, PostChanges, PostState, PostStatus};
pub use taxonomy::{Author, Category, Tag};
