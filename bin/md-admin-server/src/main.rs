//! Mediadesk Admin Server
//!
//! Serves the admin UI REST facades under `/admin-ng` backed by the
//! in-memory collaborator services.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `MD_CONFIG` | `config/mediadesk.toml` | Configuration file |
//! | `MD_HOST` | `0.0.0.0` | Bind address |
//! | `MD_PORT` | `8080` | HTTP API port |
//! | `MD_ORGANIZATION` | `default_org` | Organization used when no `X-Organization` header is sent |
//! | `MD_DEFAULT_USER` | `admin` | User used when no `X-User` header is sent |
//! | `MD_SEED_DEMO_DATA` | `false` | Load sample records on startup |
//! | `MD_LOG_FORMAT` | `text` | `text` or `json` |
//! | `RUST_LOG` | `info` | Log level |

use std::sync::Arc;
use anyhow::Result;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tokio::{net::TcpListener, signal};

use md_admin::api::create_router;
use md_admin::memory::{seed_demo_data, MemoryStore};
use md_config::AdminConfig;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn init_logging() {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    if env_or("MD_LOG_FORMAT", "text").eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    info!("Starting Mediadesk Admin Server");

    let config = AdminConfig::load()?;
    info!(
        organization = %config.organization.id,
        default_user = %config.organization.default_user,
        "Configuration loaded"
    );

    let store = Arc::new(MemoryStore::new());
    if config.seed_demo_data {
        seed_demo_data(&store, &config.organization);
    }

    let app = create_router(store.services(), &config.organization)
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));

    let addr = config.server.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    info!("API server listening on http://{}", addr);
    info!("Press Ctrl+C to shutdown");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Mediadesk Admin Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received...");
}
