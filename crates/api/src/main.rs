use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use frontdesk_api::config::ServerConfig;
use frontdesk_api::router::build_app_router;
use frontdesk_api::{background, relay, state, ws};
use frontdesk_core::pricing::FlatRatePricing;

use state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "frontdesk_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = frontdesk_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    frontdesk_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    frontdesk_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- WebSocket manager ---
    let ws_manager = Arc::new(ws::WsManager::new());

    // --- Heartbeat ---
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager));

    // --- Event bus ---
    let event_bus = Arc::new(frontdesk_events::EventBus::default());

    // Spawn the relay (bus -> lane-scoped WebSocket delivery).
    let event_relay = relay::EventRelay::new(Arc::clone(&ws_manager));
    let relay_handle = tokio::spawn(event_relay.run(event_bus.subscribe()));

    let config = Arc::new(config);

    // Spawn the upgrade-hold scheduler (5s tick).
    let sweep_cancel = tokio_util::sync::CancellationToken::new();
    let holds_handle = tokio::spawn(background::upgrade_holds::run(
        pool.clone(),
        Arc::clone(&event_bus),
        Arc::clone(&config),
        sweep_cancel.clone(),
    ));

    // Spawn the stale-demand backstop sweep (60s tick).
    let expiry_handle = tokio::spawn(background::waitlist_expiry::run(
        pool.clone(),
        Arc::clone(&event_bus),
        config.waitlist_sweep_secs,
        sweep_cancel.clone(),
    ));

    tracing::info!("Background sweeps started (upgrade holds, waitlist expiry)");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::clone(&config),
        ws_manager: Arc::clone(&ws_manager),
        event_bus: Arc::clone(&event_bus),
        quoter: Arc::new(FlatRatePricing),
    };

    // --- Router ---
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

    // Stop the sweeps first so no new offers or expiries land mid-shutdown.
    sweep_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), holds_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), expiry_handle).await;
    tracing::info!("Background sweeps stopped");

    // Drop the event bus sender to close the broadcast channel.
    // This signals the relay to shut down.
    drop(event_bus);
    let _ = tokio::time::timeout(Duration::from_secs(5), relay_handle).await;
    tracing::info!("Event relay shut down");

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    heartbeat_handle.abort();
    tracing::info!("Heartbeat task stopped");

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
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
