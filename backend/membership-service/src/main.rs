use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use membership_service::config::Config;
use membership_service::handlers;
use membership_service::logging::init_tracing;
use membership_service::repository::{PgChatSpaceRepository, PgStreamRepository};
use membership_service::state::AppState;

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate =
            signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = terminate.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    }
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    info!("🔧 Starting membership-service");

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        "✅ Configuration loaded: env={}, http_port={}, max_bulk_ids={}",
        config.app.env, config.app.http_port, config.membership.max_bulk_ids
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    info!("✅ Database pool created");

    sqlx::migrate!("./migrations")
        .run(&pg_pool)
        .await
        .context("Failed to run database migrations")?;
    info!("✅ Database migrations completed");

    let state = AppState::new(
        Arc::new(PgStreamRepository::new(pg_pool.clone())),
        Arc::new(PgChatSpaceRepository::new(pg_pool.clone())),
        config.membership.max_bulk_ids,
    );
    let state = web::Data::new(state);

    let http_addr = format!("{}:{}", config.app.host, config.app.http_port);
    info!("🚀 Starting HTTP server on http://{}", http_addr);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(handlers::configure)
    })
    .bind(&http_addr)
    .with_context(|| format!("Failed to bind {}", http_addr))?
    .disable_signals()
    .run();

    let handle = server.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received, stopping HTTP server");
        handle.stop(true).await;
    });

    server.await.context("HTTP server error")?;

    pg_pool.close().await;
    info!("membership-service stopped");
    Ok(())
}
