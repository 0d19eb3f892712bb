//! lms-rs server entry point.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{Router, routing::get};
use lms_api::{AppState, app as api_app};
use lms_common::{Config, LocalStorage};
use lms_core::mailer_from_config;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Plain text output by default, JSON lines with `LMS_LOG_FORMAT=json`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,lms_api=debug,lms_core=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LMS_LOG_FORMAT").is_ok_and(|format| format == "json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn health() -> &'static str {
    "OK"
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting lms-rs server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = lms_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    lms_db::migrate(&db).await?;
    info!("Migrations completed");

    let mailer = mailer_from_config(&config.mail)?;
    if !config.mail.enabled {
        info!("Mail delivery disabled, notifications will only be logged");
    }

    tokio::fs::create_dir_all(&config.media.root).await?;
    let storage = Arc::new(LocalStorage::new(
        config.media.root.clone(),
        config.media.base_url.clone(),
    ));

    let state = AppState::new(Arc::new(db), &config, mailer, storage);

    if let Some(admin) = &config.admin {
        state.user_service.ensure_admin(admin).await?;
    }
    state.token_service.prune_expired().await?;

    let mut router = Router::new().route("/health", get(health));

    // Media is only served here when it lives under this host
    let media_path = config.media.base_url.trim_end_matches('/');
    if media_path.starts_with('/') {
        router = router.nest_service(media_path, ServeDir::new(&config.media.root));
    }

    let app = router
        .merge(api_app(state))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
