//! Application state - shared across all handlers.

use std::sync::Arc;
use std::time::Duration;

use scribe_core::CacheInvalidator;
use scribe_core::ports::{
    Cache, Clock, ContentGenerator, DeployProvider, ImageStorage, JobQueue, PostExporter,
    Repositories, SystemClock, TokenService,
};
use scribe_core::services::{
    DeployPolicy, Deployer, DraftSeeder, PostCreationWorker, PostService, PublicationSweeper,
    PublishMode, PublishedPosts, Publishing, SeedPolicy,
};
use scribe_infra::{
    FileSystemExporter, InMemoryCache, InMemoryImageStorage, InMemoryJobQueue, InMemoryStore,
    JwtTokenService, NetlifyConfig, NetlifyDeployProvider, OpenAiConfig, OpenAiContentGenerator,
};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<PostService>,
    pub tokens: Arc<dyn TokenService>,
    pub queue: Arc<dyn JobQueue>,
    pub published: Arc<PublishedPosts>,
    pub sweeper: Arc<PublicationSweeper>,
    /// Present only when a content generator is configured.
    pub seeder: Option<Arc<DraftSeeder>>,
    pub worker: Option<Arc<PostCreationWorker>>,
}

/// The adapters behind every port, before services are wired over them.
pub struct Components {
    pub repos: Repositories,
    pub cache: Arc<dyn Cache>,
    pub queue: Arc<dyn JobQueue>,
    pub storage: Arc<dyn ImageStorage>,
    pub deploys: Arc<dyn DeployProvider>,
    pub exporter: Arc<dyn PostExporter>,
    pub generator: Option<Arc<dyn ContentGenerator>>,
    pub tokens: Arc<dyn TokenService>,
    pub clock: Arc<dyn Clock>,
    pub public_cache_ttl: Option<Duration>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        let components = Components {
            repos: repositories(config).await,
            cache: cache(config).await,
            queue: job_queue(config).await,
            storage: Arc::new(InMemoryImageStorage::new()),
            deploys: Arc::new(NetlifyDeployProvider::new(NetlifyConfig::from_env())),
            exporter: Arc::new(FileSystemExporter::new(config.content_dir.clone())),
            generator: OpenAiConfig::from_env().map(|openai| {
                Arc::new(OpenAiContentGenerator::new(openai)) as Arc<dyn ContentGenerator>
            }),
            tokens: Arc::new(JwtTokenService::from_env()),
            clock: Arc::new(SystemClock),
            public_cache_ttl: Some(config.public_cache_ttl),
        };

        if components.generator.is_none() {
            tracing::warn!("OPENAI_API_KEY not set. Draft seeding is disabled.");
        }

        let state = Self::from_components(
            components,
            config.publish_mode(),
            config.deploy,
            config.seed,
        );
        tracing::info!(mode = ?config.publish_mode(), "Application state initialized");
        state
    }

    /// Wire the services over already-built adapters.
    pub fn from_components(
        components: Components,
        mode: PublishMode,
        deploy: DeployPolicy,
        seed: SeedPolicy,
    ) -> Self {
        let Components {
            repos,
            cache,
            queue,
            storage,
            deploys,
            exporter,
            generator,
            tokens,
            clock,
            public_cache_ttl,
        } = components;

        let published = Arc::new(PublishedPosts::new(
            repos.clone(),
            cache.clone(),
            public_cache_ttl,
        ));
        let publishing = Publishing {
            deployer: Arc::new(Deployer::new(deploys, deploy)),
            exporter,
            invalidator: CacheInvalidator::new(cache),
            mode,
        };
        let posts = Arc::new(PostService::new(
            repos.clone(),
            storage,
            publishing.clone(),
            clock.clone(),
        ));
        let sweeper = Arc::new(PublicationSweeper::new(
            repos.clone(),
            posts.clone(),
            publishing,
            clock.clone(),
        ));

        let (seeder, worker) = match generator {
            Some(generator) => (
                Some(Arc::new(DraftSeeder::new(
                    repos.clone(),
                    generator.clone(),
                    queue.clone(),
                    clock,
                    seed,
                ))),
                Some(Arc::new(PostCreationWorker::new(repos, posts.clone(), generator))),
            ),
            None => (None, None),
        };

        Self {
            posts,
            published,
            tokens,
            queue,
            sweeper,
            seeder,
            worker,
        }
    }
}

async fn repositories(config: &AppConfig) -> Repositories {
    #[cfg(feature = "postgres")]
    if let Some(db_config) = config.database.as_ref() {
        match scribe_infra::database::connect(db_config).await {
            Ok(db) => return scribe_infra::database::postgres_repositories(db),
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
            }
        }
    }

    if config.database.is_none() {
        tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
    }
    Arc::new(InMemoryStore::new()).repositories()
}

async fn cache(config: &AppConfig) -> Arc<dyn Cache> {
    #[cfg(feature = "redis")]
    if config.redis_url.is_some() {
        match scribe_infra::RedisCache::from_env().await {
            Ok(cache) => return Arc::new(cache),
            Err(e) => tracing::error!("Redis cache unavailable: {}. Using in-memory cache.", e),
        }
    }

    #[cfg(not(feature = "redis"))]
    let _ = config;
    Arc::new(InMemoryCache::new())
}

async fn job_queue(config: &AppConfig) -> Arc<dyn JobQueue> {
    #[cfg(feature = "redis")]
    if config.redis_url.is_some() {
        match scribe_infra::RedisJobQueue::from_env().await {
            Ok(queue) => return Arc::new(queue),
            Err(e) => tracing::error!("Redis job queue unavailable: {}. Using in-memory queue.", e),
        }
    }

    #[cfg(not(feature = "redis"))]
    let _ = config;
    Arc::new(InMemoryJobQueue::from_env())
}
