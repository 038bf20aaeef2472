//! Schema Insight API
//!
//! Structural heuristics and diagrams derived from database metadata.
//!
//! Two ways in:
//! - Snapshot analyses: post a schema snapshot, get orphans, FK index
//!   coverage, join table candidates or a diagram back. No database needed.
//! - Live tools: post a connection URL; the schema is introspected with a
//!   request-scoped pool and the same analyses run over it.

mod capabilities;
mod config;
mod connection;
mod error;
mod graph;
mod insights;
mod introspection;
mod models;
mod routes;
mod snapshot;
mod state;

use crate::config::Settings;
use crate::routes::create_router;
use crate::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber for structured logging
    init_tracing();

    info!("🚀 Starting Schema Insight API...");

    // Load configuration
    let settings = Settings::load()?;
    info!("📋 Configuration loaded successfully");

    let addr = SocketAddr::from((settings.server.host, settings.server.port));
    let state = Arc::new(AppState::new(settings.clone()));

    // Build the router
    let app = create_router(state.clone(), &settings);

    info!("🌐 Server listening on http://{}", addr);
    info!("");
    info!("📚 API Endpoints:");
    info!("   ─── Snapshot Analyses ───");
    info!("   POST /api/snapshot/orphans        - Tables with no FK in or out");
    info!("   POST /api/snapshot/fk-indexes     - FKs without a leading index");
    info!("   POST /api/snapshot/many-to-many   - Join table candidates");
    info!("   POST /api/snapshot/insights       - All heuristics at once");
    info!("   POST /api/snapshot/graph/dot      - DOT graph");
    info!("   POST /api/snapshot/graph/mermaid  - Mermaid ER diagram");
    info!("");
    info!("   ─── Live Database Tools ───");
    for tool in &state.capabilities.tools {
        info!("   {:<4} {:<26} - {}", tool.method, tool.path, tool.description);
    }
    info!("");

    // Create TCP listener and serve
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,schema_insight_api=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("📴 Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("📴 Received terminate signal, initiating graceful shutdown...");
        },
    }
}
