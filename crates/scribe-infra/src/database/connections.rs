use std::time::Duration;

#[cfg(feature = "postgres")]
use sea_orm::{ConnectOptions, Database, DbConn, DbErr};

/// Configuration for the main database.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
}

impl DatabaseConfig {
    /// `None` when `DATABASE_URL` is unset; the in-memory store is used instead.
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("DATABASE_URL").ok().filter(|url| !url.is_empty())?;
        Some(Self {
            url,
            max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(20),
            min_connections: std::env::var("DATABASE_MIN_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            connect_timeout: Duration::from_secs(
                std::env::var("DATABASE_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
        })
    }
}

/// Open the connection pool.
#[cfg(feature = "postgres")]
pub async fn connect(config: &DatabaseConfig) -> Result<DbConn, DbErr> {
    tracing::info!("Initializing database connection...");

    let opts = ConnectOptions::new(&config.url)
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout)
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(false)
        .to_owned();

    let conn = Database::connect(opts).await?;
    tracing::info!(pool = config.max_connections, "Database connected");
    Ok(conn)
}

/// Every repository port over one connection pool.
#[cfg(feature = "postgres")]
pub fn postgres_repositories(db: DbConn) -> scribe_core::ports::Repositories {
    use std::sync::Arc;

    use super::postgres_repo::{
        PostgresAuthorRepository, PostgresBlogRepository, PostgresCategoryRepository,
        PostgresMemberRepository, PostgresPostRepository, PostgresTagRepository,
    };

    let db = Arc::new(db);
    scribe_core::ports::Repositories {
        blogs: Arc::new(PostgresBlogRepository::new(db.clone())),
        members: Arc::new(PostgresMemberRepository::new(db.clone())),
        categories: Arc::new(PostgresCategoryRepository::new(db.clone())),
        authors: Arc::new(PostgresAuthorRepository::new(db.clone())),
        tags: Arc::new(PostgresTagRepository::new(db.clone())),
        posts: Arc::new(PostgresPostRepository::new(db)),
    }
}
