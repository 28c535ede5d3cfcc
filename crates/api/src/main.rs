use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use atelier_db::{DocumentStore, LocalObjectStore, MemoryStore, ObjectStore, PgDocumentStore};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use atelier_api::auth::identity::{IdentityProvider, LocalIdentityProvider};
use atelier_api::config::{LogFormat, ServerConfig, StoreBackend};
use atelier_api::{background, bootstrap, router, state, ws};

use state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env();

    // --- Tracing ---
    let subscriber = tracing_subscriber::registry().with(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "atelier_api=debug,tower_http=debug".into()),
    );
    match config.log_format {
        LogFormat::Json => subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => subscriber.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!(
        host = %config.host,
        port = %config.port,
        store = ?config.store_backend,
        log_format = ?config.log_format,
        "Loaded server configuration"
    );

    // --- Document store ---
    let store: Arc<dyn DocumentStore> = match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory document store; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .expect("DATABASE_URL must be set");
            let pool = atelier_db::create_pool(database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connection pool created");

            atelier_db::health_check(&pool)
                .await
                .expect("Database health check failed");
            atelier_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Database migrations applied");

            Arc::new(PgDocumentStore::new(pool))
        }
    };

    // --- Object store ---
    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .expect("Failed to create upload directory");
    let objects: Arc<dyn ObjectStore> = Arc::new(LocalObjectStore::new(
        config.upload_dir.clone(),
        config.upload_public_url.clone(),
    ));

    // --- Identity provider ---
    let identity: Arc<dyn IdentityProvider> = Arc::new(LocalIdentityProvider::new(
        Arc::clone(&store),
        config.jwt.clone(),
    ));

    // --- App state ---
    let state = AppState::new(store, objects, identity, config.clone());

    if let Some(admin) = &config.bootstrap_admin {
        bootstrap::ensure_super_admin(state.identity.as_ref(), &state.facade, admin)
            .await
            .expect("Failed to provision the bootstrap super admin");
    }

    // --- Background tasks ---
    let cancel = CancellationToken::new();

    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&state.ws_manager));

    let sync_handle = Arc::clone(&state.sessions).start_sync(
        state.identity.on_session_changed(),
        Arc::clone(&state.ws_manager),
        cancel.clone(),
    );

    let dashboard_handle = tokio::spawn(background::dashboard_refresh::run(
        state.facade.clone(),
        Arc::clone(&state.dashboard),
        Duration::from_secs(config.dashboard_refresh_secs),
        cancel.clone(),
    ));

    let sweep_handle = tokio::spawn(background::session_sweep::run(
        Arc::clone(&state.identity),
        Arc::clone(&state.sessions),
        Duration::from_secs(config.session_sweep_secs),
        cancel.clone(),
    ));

    let ws_manager = Arc::clone(&state.ws_manager);

    // --- Router ---
    let app = router::build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), dashboard_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), sweep_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), sync_handle).await;
    tracing::info!("Background tasks stopped");

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    heartbeat_handle.abort();
    tracing::info!("Heartbeat task stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
