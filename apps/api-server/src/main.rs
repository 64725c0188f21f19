//! # Scribe API Server
//!
//! HTTP surface for the post lifecycle, plus the background publication
//! sweep, draft seeding and the post-creation job worker.

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

mod background;
mod config;
mod handlers;
mod middleware;
mod state;
mod telemetry;


use config::AppConfig;
use state::AppState;
use telemetry::TelemetryConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    telemetry::init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();

    tracing::info!(
        "Starting Scribe API Server on {}:{}",
        config.host,
        config.port
    );

    let state = AppState::new(&config).await;

    match state.worker.clone() {
        Some(worker) => state.queue.start_worker(worker.into_handler()).await?,
        None => tracing::info!("Post creation worker not started, no content generator"),
    }

    #[cfg(feature = "scheduler")]
    let mut scheduler = {
        let scheduler = background::Scheduler::new(config.scheduler.clone()).await?;
        scheduler.register_jobs(&state).await?;
        scheduler.start().await?;
        scheduler
    };

    #[cfg(not(feature = "scheduler"))]
    spawn_sweep_loop(&state);

    let server_state = state.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(server_state.clone()))
            .configure(handlers::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    #[cfg(feature = "scheduler")]
    scheduler.shutdown().await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Without the cron scheduler the sweep still runs once a minute. Seeding is not scheduled.
#[cfg(not(feature = "scheduler"))]
fn spawn_sweep_loop(state: &AppState) {
    let sweeper = state.sweeper.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            ticker.tick().await;
            background::run_sweep(&sweeper).await;
        }
    });
    tracing::info!("Scheduler feature disabled, sweeping every 60s");
}
