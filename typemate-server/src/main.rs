use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use typemate_persistence::connection::connect_and_migrate;
use typemate_server::ServerState;
use typemate_server::config::Config;
use typemate_server::word_source::GeminiWordSource;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    info!("Starting TypeMate server...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let host = match config.host.parse::<std::net::IpAddr>() {
        Ok(host) => host,
        Err(e) => {
            error!("Invalid HOST '{}': {}", config.host, e);
            std::process::exit(1);
        }
    };

    let db = match connect_and_migrate(&config.database_url).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to connect to database and run migrations: {}", e);
            std::process::exit(1);
        }
    };

    let word_source = Arc::new(GeminiWordSource::new(
        config.text_api_key.clone(),
        config.text_model.clone(),
    ));
    info!("Generating passages with model {}", config.text_model);

    let state = ServerState::new(db, word_source, config.room_ttl());
    let routes = state.clone().routes();

    // Idle connections and expired rooms
    let cleanup_state = state.clone();
    let cleanup_config = config.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_config.cleanup_interval());
        loop {
            interval.tick().await;

            cleanup_state
                .connection_manager
                .cleanup_inactive_connections(cleanup_config.connection_timeout())
                .await;

            if let Err(e) = cleanup_state.room_manager.purge_expired().await {
                error!("Failed to purge expired rooms: {}", e);
            }
        }
    });

    info!("Server starting on {}:{}", config.host, config.port);

    let (addr, server) = warp::serve(routes).bind_with_graceful_shutdown((host, config.port), async {
        shutdown_signal().await;
    });

    info!(
        "Server started successfully on {}. Press Ctrl+C to stop.",
        addr
    );
    server.await;
    info!("Server shutdown complete.");
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal as unix_signal};

        match (
            unix_signal(SignalKind::interrupt()),
            unix_signal(SignalKind::terminate()),
        ) {
            (Ok(mut sigint), Ok(mut sigterm)) => {
                tokio::select! {
                    _ = sigint.recv() => info!("Received SIGINT, shutting down gracefully..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully..."),
                }
                return;
            }
            _ => error!("Failed to install signal handlers, falling back to Ctrl+C"),
        }
    }

    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down gracefully...");
}
