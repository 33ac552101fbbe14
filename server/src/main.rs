use std::sync::Arc;

use pong_server::api;
use pong_server::config::ServerConfig;
use pong_server::registry::SessionRegistry;
use pong_server::result::LogResultSink;
use pong_server::ws::AppState;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins, then `LOG_LEVEL`, then info.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .ok()
        .or_else(|| {
            std::env::var("LOG_LEVEL")
                .ok()
                .and_then(|level| EnvFilter::try_new(level).ok())
        })
        .unwrap_or_else(|| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let config = ServerConfig::from_env();

    // Validate configuration before starting
    if let Err(e) = config.validate() {
        eprintln!("Invalid server configuration: {}", e);
        std::process::exit(1);
    }

    let listen_addr = config.listen_addr.clone();
    let app_state = AppState {
        outbound_capacity: config.outbound_capacity,
        registry: Arc::new(SessionRegistry::new(config, Arc::new(LogResultSink))),
    };
    let registry = Arc::clone(&app_state.registry);
    let app = api::router(app_state).layer(CorsLayer::permissive());

    tracing::info!("Starting pong server on {}", listen_addr);

    let listener = match tokio::net::TcpListener::bind(&listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", listen_addr, e);
            std::process::exit(1);
        }
    };

    let shutdown = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
        }
        tracing::info!("Shutdown requested");
        registry.shutdown().await;
    };

    if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(shutdown).await {
        tracing::error!("Server error: {}", e);
    }
}
