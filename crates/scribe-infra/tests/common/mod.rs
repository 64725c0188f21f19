//! Shared fixtures: every service wired to in-memory adapters and a manual clock.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;
use tokio::sync::{Mutex, Notify};
use uuid::Uuid;

use scribe_core::CacheInvalidator;
use scribe_core::domain::{
    Author, Blog, BlogMember, Category, DeployTarget, ImageUpload, NewPost, Post, PostStatus,
    StorageTarget, Tag,
};
use scribe_core::ports::{
    BaseRepository, BlogContext, Cache, ContentError, ContentGenerator, DeployError,
    DeployProvider, DeployState, GeneratedPost, Job, JobHandler, JobQueue, JobQueueError,
    ManualClock, MemberRepository, QueueStats, Repositories, TitleGroup, TitleSuggestion,
};
use scribe_core::retry::RetryPolicy;
use scribe_core::services::{
    DeployPolicy, Deployer, PostService, PublicationSweeper, PublishMode, Publishing,
};
use scribe_infra::{FileSystemExporter, InMemoryCache, InMemoryImageStorage, InMemoryStore};

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap()
}

/// Lets a test pause builds at the trigger call.
#[derive(Default)]
pub struct BuildGate {
    pub entered: Notify,
    pub release: Notify,
}

/// Records every build trigger; every triggered build is immediately ready.
#[derive(Default)]
pub struct RecordingDeployProvider {
    triggers: Mutex<Vec<String>>,
    failing: AtomicBool,
    gate: Mutex<Option<Arc<BuildGate>>>,
}

impl RecordingDeployProvider {
    /// Every later trigger signals `entered` and waits for `release`.
    pub async fn hold_builds(&self) -> Arc<BuildGate> {
        let gate = Arc::new(BuildGate::default());
        *self.gate.lock().await = Some(gate.clone());
        gate
    }

    pub async fn triggered_sites(&self) -> Vec<String> {
        self.triggers.lock().await.clone()
    }

    pub fn fail_builds(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl DeployProvider for RecordingDeployProvider {
    async fn trigger_build(&self, target: &DeployTarget) -> Result<String, DeployError> {
        let gate = self.gate.lock().await.clone();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        self.triggers.lock().await.push(target.site_id.clone());
        if self.failing.load(Ordering::SeqCst) {
            return Err(DeployError::Rejected("site locked".to_string()));
        }
        Ok(format!("deploy-{}", Uuid::new_v4()))
    }

    async fn deploy_status(
        &self,
        _target: &DeployTarget,
        _deploy_id: &str,
    ) -> Result<DeployState, DeployError> {
        Ok(DeployState::Ready)
    }
}

/// Canned generator: one title per category, a fixed body, optional leading failures.
#[derive(Default)]
pub struct FakeGenerator {
    pub body_failures: AtomicU32,
    pub title_calls: AtomicU32,
    pub tag_names: Vec<String>,
}

impl FakeGenerator {
    pub fn with_tags(tag_names: &[&str]) -> Self {
        Self {
            tag_names: tag_names.iter().map(|name| name.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn failing_bodies(self, times: u32) -> Self {
        self.body_failures.store(times, Ordering::SeqCst);
        self
    }
}

#[async_trait]
impl ContentGenerator for FakeGenerator {
    async fn generate_titles(&self, context: &BlogContext) -> Result<Vec<TitleGroup>, ContentError> {
        self.title_calls.fetch_add(1, Ordering::SeqCst);
        Ok(context
            .categories
            .iter()
            .map(|category| TitleGroup {
                category_id: category.id,
                titles: vec![TitleSuggestion {
                    title: format!("Fresh ideas in {}", category.name),
                    slug: format!("fresh-ideas-{}", category.name.to_lowercase()),
                }],
            })
            .collect())
    }

    async fn generate_post_body(
        &self,
        _context: &BlogContext,
        category: &scribe_core::domain::Category,
        title: &str,
    ) -> Result<GeneratedPost, ContentError> {
        let remaining = self.body_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.body_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(ContentError::Request("rate limited".to_string()));
        }
        Ok(GeneratedPost {
            content: format!("# {title}\n\nAll about {}.", category.name),
            description: format!("A post about {}", category.name),
            tag_names: self.tag_names.clone(),
            slug: String::new(),
        })
    }

    async fn generate_image_prompt(&self, content: &str) -> Result<String, ContentError> {
        Ok(format!("An illustration for: {}", content.lines().next().unwrap_or("")))
    }
}

/// Keeps enqueued jobs for inspection; never runs them.
#[derive(Default)]
pub struct RecordingQueue {
    jobs: Mutex<Vec<Job>>,
}

impl RecordingQueue {
    pub async fn jobs(&self) -> Vec<Job> {
        self.jobs.lock().await.clone()
    }
}

#[async_trait]
impl JobQueue for RecordingQueue {
    async fn enqueue(&self, job: Job) -> Result<(), JobQueueError> {
        self.jobs.lock().await.push(job);
        Ok(())
    }

    async fn start_worker(&self, _handler: JobHandler) -> Result<(), JobQueueError> {
        Ok(())
    }

    async fn stats(&self) -> Result<QueueStats, JobQueueError> {
        Ok(QueueStats {
            pending: self.jobs.lock().await.len(),
            ..Default::default()
        })
    }
}

/// A blog with its taxonomy, owner and one editor.
pub struct BlogFixture {
    pub blog: Blog,
    pub editor_id: Uuid,
    pub category: Category,
    pub author: Author,
    pub tags: Vec<Tag>,
}

impl BlogFixture {
    pub fn owner_id(&self) -> Uuid {
        self.blog.owner_id
    }

    /// A post that satisfies every publish gate except the image, which comes as an upload.
    pub fn complete_post(&self, slug: &str) -> NewPost {
        NewPost {
            title: "Understanding lifetimes".to_string(),
            description: "Borrowing without tears".to_string(),
            slug: slug.to_string(),
            content: "Lifetimes name the scope of a borrow.".to_string(),
            image_url: Some(format!("https://cdn.example.com/blog/images/{slug}.webp")),
            category_id: self.category.id,
            author_id: self.author.id,
            tag_ids: vec![self.tags[0].id],
            status: PostStatus::Draft,
            published_at: None,
            ai_image_prompt: None,
        }
    }

    pub fn bare_draft(&self, slug: &str) -> NewPost {
        NewPost::draft("Untitled", slug, self.category.id, self.author.id)
    }
}

pub fn storage_target() -> StorageTarget {
    StorageTarget {
        bucket: "scribe-images".to_string(),
        public_domain: "https://cdn.example.com".to_string(),
        account_id: "account".to_string(),
        access_key_id: "key".to_string(),
        secret_access_key: "secret".to_string(),
    }
}

pub fn image(name: &str) -> ImageUpload {
    ImageUpload {
        name: name.to_string(),
        bytes: vec![0x52, 0x49, 0x46, 0x46],
    }
}

pub struct TestApp {
    pub store: Arc<InMemoryStore>,
    pub repos: Repositories,
    pub cache: Arc<InMemoryCache>,
    pub storage: Arc<InMemoryImageStorage>,
    pub deploys: Arc<RecordingDeployProvider>,
    pub clock: Arc<ManualClock>,
    pub publishing: Publishing,
    pub posts: Arc<PostService>,
    pub sweeper: PublicationSweeper,
    pub content_dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_mode(PublishMode::Deploy)
    }

    pub fn with_mode(mode: PublishMode) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let repos = store.repositories();
        let cache = Arc::new(InMemoryCache::new());
        let storage = Arc::new(InMemoryImageStorage::new());
        let deploys = Arc::new(RecordingDeployProvider::default());
        let clock = Arc::new(ManualClock::new(start_time()));
        let content_dir = tempfile::tempdir().unwrap();

        let deployer = Deployer::new(
            deploys.clone(),
            DeployPolicy {
                retry: RetryPolicy::new(2, Duration::ZERO),
                poll_interval: Duration::ZERO,
                max_polls: 3,
            },
        );
        let publishing = Publishing {
            deployer: Arc::new(deployer),
            exporter: Arc::new(FileSystemExporter::new(content_dir.path())),
            invalidator: CacheInvalidator::new(cache.clone()),
            mode,
        };
        let posts = Arc::new(PostService::new(
            repos.clone(),
            storage.clone(),
            publishing.clone(),
            clock.clone(),
        ));
        let sweeper = PublicationSweeper::new(
            repos.clone(),
            posts.clone(),
            publishing.clone(),
            clock.clone(),
        );

        Self {
            store,
            repos,
            cache,
            storage,
            deploys,
            clock,
            publishing,
            posts,
            sweeper,
            content_dir,
        }
    }

    /// Seed a blog with storage, a deploy target, taxonomy and an editor.
    pub async fn blog(&self, title: &str, site_id: &str) -> BlogFixture {
        let mut blog = Blog::new(Uuid::new_v4(), title)
            .with_storage(storage_target())
            .with_deploy(DeployTarget {
                site_id: site_id.to_string(),
                token: "netlify-token".to_string(),
            });
        blog.created_at = self.clock_now();
        let blog = BaseRepository::<Blog, Uuid>::save(self.store.as_ref(), blog)
            .await
            .unwrap();

        let editor_id = Uuid::new_v4();
        self.store
            .add(BlogMember::editor(blog.id, editor_id))
            .await
            .unwrap();

        let category = BaseRepository::<Category, Uuid>::save(
            self.store.as_ref(),
            Category::new(blog.id, "Rust", "Systems programming"),
        )
        .await
        .unwrap();
        let author = BaseRepository::<Author, Uuid>::save(
            self.store.as_ref(),
            Author::new(blog.id, "Sam Rivera"),
        )
        .await
        .unwrap();
        let mut tags = Vec::new();
        for name in ["async", "ownership"] {
            tags.push(
                BaseRepository::<Tag, Uuid>::save(self.store.as_ref(), Tag::new(blog.id, name))
                    .await
                    .unwrap(),
            );
        }

        BlogFixture {
            blog,
            editor_id,
            category,
            author,
            tags,
        }
    }

    pub fn clock_now(&self) -> DateTime<Utc> {
        use scribe_core::ports::Clock;
        self.clock.now()
    }

    /// Put a few keys in the public cache for a blog.
    pub async fn warm_cache(&self, blog_id: Uuid) -> Vec<String> {
        let keys = vec![
            format!("public:posts:{blog_id}:all:all:1:10"),
            format!("public:posts:{blog_id}:all:all:2:10"),
            format!("public:post:{blog_id}:understanding-lifetimes"),
        ];
        for key in &keys {
            self.cache.set(key, "[]", None).await.unwrap();
        }
        keys
    }

    pub async fn stored_post(&self, id: Uuid) -> Option<Post> {
        BaseRepository::<Post, Uuid>::find_by_id(self.store.as_ref(), id)
            .await
            .unwrap()
    }
}
