use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::{anyhow, Context};
use post_service::config::StorageDriver;
use post_service::db::{self, PgPostRepository, PostRepository};
use post_service::handlers::HealthState;
use post_service::routes;
use post_service::services::PostService;
use post_service::storage::{build_blob_store, BlobStore};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Probe the local HTTP health endpoint (container healthchecks)
async fn healthcheck() -> anyhow::Result<()> {
    let port = std::env::var("POST_SERVICE_PORT").unwrap_or_else(|_| "8080".to_string());
    let url = format!("http://127.0.0.1:{}/api/health", port);

    let resp = reqwest::Client::new()
        .get(&url)
        .send()
        .await
        .with_context(|| format!("healthcheck request to {} failed", url))?;

    if resp.status().is_success() {
        Ok(())
    } else {
        Err(anyhow!("healthcheck HTTP status: {}", resp.status()))
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Post Service
///
/// Serves the blog post resource over HTTP.
///
/// # Routes
///
/// - `/api/posts` - List (GET) and create (POST) posts
/// - `/api/posts/{id}` - Show, update (PUT/PATCH/POST) and delete a post
/// - `/storage/posts/{name}` - Stored post images
/// - `/api/health*`, `/metrics`, `/api/openapi.json` - Operations
///
/// # Storage
///
/// Records live in PostgreSQL; images live in the blob store selected by
/// `STORAGE_DRIVER` (`local`, `s3` or `memory`).
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().nth(1).as_deref() == Some("healthcheck") {
        return healthcheck().await;
    }

    dotenvy::dotenv().ok();
    init_tracing();

    let config = post_service::Config::from_env()
        .map_err(|e| anyhow!(e))
        .context("Failed to load configuration")?;

    tracing::info!("Starting post-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let pool = db::create_pool(&config.database)
        .await
        .context("Failed to create database pool")?;

    if config.database.run_migrations {
        db::run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;
    }

    if config.storage.driver == StorageDriver::Memory {
        tracing::warn!("Using in-memory blob store; images are lost on restart");
    }
    let blobs: Arc<dyn BlobStore> = build_blob_store(&config.storage)
        .await
        .context("Failed to initialize blob store")?;
    let posts: Arc<dyn PostRepository> = Arc::new(PgPostRepository::new(pool));

    let service = web::Data::new(PostService::new(posts.clone(), blobs.clone()));
    let health_state = web::Data::new(HealthState::new(posts, blobs));
    let upload_config = web::Data::new(config.uploads.clone());

    let bind_address = config.bind_address();
    tracing::info!("Starting HTTP server at {}", bind_address);

    let cors_origins = config.cors.allowed_origins.clone();
    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in cors_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(service.clone())
            .app_data(health_state.clone())
            .app_data(upload_config.clone())
            .wrap(cors)
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(routes::configure)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .workers(config.app.workers.max(1))
    .disable_signals()
    .run();

    let server_handle = server.handle();
    let mut server_task = actix_web::rt::spawn(server);

    tokio::select! {
        result = &mut server_task => {
            result
                .context("HTTP server task panicked")?
                .context("HTTP server failed")?;
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
            server_handle.stop(true).await;
            if let Err(e) = server_task.await {
                tracing::error!("HTTP server task join error: {}", e);
            }
        }
    }

    tracing::info!("post-service shutting down");
    Ok(())
}
