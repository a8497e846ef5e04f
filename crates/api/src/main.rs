use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sceneforge_api::config::ServerConfig;
use sceneforge_api::router::build_app_router;
use sceneforge_api::state::AppState;
use sceneforge_engine::{Orchestrator, OrchestratorConfig};
use sceneforge_events::{BackgroundDispatcher, EventBus};
use sceneforge_genai::GenAiClient;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sceneforge_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = sceneforge_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    sceneforge_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    sceneforge_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Generation backend ---
    let backend = Arc::new(
        GenAiClient::new(
            config.genai_base_url.clone(),
            config.genai_api_key.clone(),
            config.genai_model.clone(),
        )
        .expect("Failed to build generation backend client"),
    );
    tracing::info!(model = %backend.model(), "Generation backend client ready");

    // --- Event bus + background dispatcher ---
    let event_bus = Arc::new(EventBus::default());
    let dispatcher_cancel = tokio_util::sync::CancellationToken::new();
    let dispatcher_handle = tokio::spawn(BackgroundDispatcher::run(
        pool.clone(),
        event_bus.subscribe(),
        dispatcher_cancel.clone(),
    ));
    tracing::info!("Background dispatcher started");

    // --- Orchestrator ---
    let orchestrator = Arc::new(Orchestrator::new(
        pool.clone(),
        backend,
        Arc::clone(&event_bus),
        OrchestratorConfig {
            message_limit: config.message_limit,
            target_strategy: config.target_strategy,
            confidence_floor: config.confidence_floor,
        },
    ));

    // --- App state + router ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        orchestrator,
        event_bus: Arc::clone(&event_bus),
    };
    let app = build_app_router(state, &config);

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

    dispatcher_cancel.cancel();
    drop(event_bus);
    let _ = tokio::time::timeout(Duration::from_secs(5), dispatcher_handle).await;
    tracing::info!("Background dispatcher stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
