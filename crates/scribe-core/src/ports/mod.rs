//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod cache;
mod clock;
mod content;
mod deploy;
mod export;
mod job_queue;
mod repository;
mod storage;

pub use auth::{AuthError, TokenClaims, TokenService};
pub use cache::{Cache, CacheError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use content::{
    BlogContext, ContentError, ContentGenerator, GeneratedPost, TitleGroup, TitleSuggestion,
};
pub use deploy::{DeployError, DeployProvider, DeployState};
pub use export::{ExportError, PostExporter};
pub use job_queue::{
    Job, JobHandler, JobQueue, JobQueueError, JobResult, PROCESS_POST_CREATION,
    PostCreationPayload, QueueStats,
};
pub use repository::{
    AuthorRepository, BaseRepository, BlogRepository, CategoryRepository, MemberRepository,
    PostRepository, Repositories, TagRepository,
};
pub use storage::{ImageStorage, StorageError};
