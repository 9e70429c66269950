use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recap_core::{
    create_authenticator, load_config, validate_config, Authenticator, ChannelBroker,
    MemoryStatusCache, PipelineOrchestrator, ProjectStore, SqliteProjectStore, SqliteTaskStore,
    StatusCache, TaskStore, WorkBroker,
};

use recap_server::api::create_router;
use recap_server::metrics;
use recap_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Work queues the broker serves. One per pipeline stage; summary edits
/// share the summarize queue.
const WORK_QUEUES: [&str; 3] = ["transcribe", "frames_extract", "summarize"];

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    metrics::init();

    // Determine config path
    let config_path = std::env::var("RECAP_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Auth method: {:?}", config.auth.method);
    info!("Database path: {:?}", config.database.path);

    // Log a short config hash so deployed instances can be told apart
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        "recapd {} starting (config {})",
        VERSION,
        &config_hash[..16]
    );

    // Create authenticator
    let authenticator: Arc<dyn Authenticator> = Arc::from(
        create_authenticator(&config.auth).context("Failed to create authenticator")?,
    );
    info!("Using authenticator: {}", authenticator.method_name());

    // Create SQLite stores
    let projects: Arc<dyn ProjectStore> = Arc::new(
        SqliteProjectStore::new(&config.database.path)
            .context("Failed to create project store")?,
    );
    info!("Project store initialized");

    let tasks: Arc<dyn TaskStore> = Arc::new(
        SqliteTaskStore::new(&config.database.path).context("Failed to create task store")?,
    );
    info!("Task store initialized");

    // Create status cache
    let cache: Arc<dyn StatusCache> = Arc::new(MemoryStatusCache::new());
    info!("Status cache initialized");

    // Create the work broker and open the consumer side of every queue.
    // Workers attach to these receivers; until one does, orders are
    // drained and logged so the queues never fill.
    let broker = Arc::new(ChannelBroker::new());
    let mut queue_handles = Vec::with_capacity(WORK_QUEUES.len());
    for queue in WORK_QUEUES {
        let mut rx = broker.subscribe(queue);
        queue_handles.push(tokio::spawn(async move {
            while let Some(order) = rx.recv().await {
                debug!(queue, task_id = %order.task_id, "work order queued");
            }
        }));
    }
    info!("Work broker initialized ({} queues)", WORK_QUEUES.len());

    // Create orchestrator
    let orchestrator = Arc::new(PipelineOrchestrator::new(
        config.orchestrator.clone(),
        Arc::clone(&tasks),
        Arc::clone(&cache),
        Arc::clone(&broker) as Arc<dyn WorkBroker>,
    ));

    // Start the worker event ingest loop
    let event_rx = broker
        .take_event_receiver()
        .context("Broker event receiver already taken")?;
    let ingest_handle = orchestrator.spawn_ingest(event_rx);
    info!("Pipeline orchestrator started");

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        authenticator,
        projects,
        tasks,
        cache,
        orchestrator,
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    ingest_handle.abort();
    for handle in queue_handles {
        handle.abort();
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
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
