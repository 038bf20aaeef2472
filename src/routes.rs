//! Route definitions and router setup
//!
//! Configures all API routes and middleware.

mod info;
mod schema;
mod snapshot;

use crate::config::Settings;
use crate::state::SharedState;
use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::MakeRequestUuid,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
    ServiceBuilderExt,
};
use tracing::Level;

/// Create the application router with all routes and middleware
pub fn create_router(state: SharedState, settings: &Settings) -> Router {
    // Build CORS layer
    let cors = build_cors_layer(settings);

    // Build tracing/logging layer
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    // Build middleware stack
    let middleware = ServiceBuilder::new()
        .set_x_request_id(MakeRequestUuid)
        .layer(trace_layer)
        .layer(CompressionLayer::new())
        .layer(cors)
        .propagate_x_request_id();

    Router::new()
        .route("/health", get(health_check))

        // Snapshot analyses
        .route("/api/snapshot/orphans", post(snapshot::orphans))
        .route("/api/snapshot/fk-indexes", post(snapshot::fk_indexes))
        .route("/api/snapshot/many-to-many", post(snapshot::many_to_many))
        .route("/api/snapshot/insights", post(snapshot::insights))
        .route("/api/snapshot/graph/dot", post(snapshot::graph_dot))
        .route("/api/snapshot/graph/mermaid", post(snapshot::graph_mermaid))

        // Live database tools
        .route("/api/info", get(info::server_info))
        .route("/api/schemas", post(schema::list_schemas))
        .route("/api/schema/inspect", post(schema::inspect))
        .route("/api/schema/insights", post(schema::insights))
        .route("/api/schema/graph/dot", post(schema::graph_dot))
        .route("/api/schema/graph/mermaid", post(schema::graph_mermaid))

        // Prompts & resources
        .route("/api/prompts", get(info::list_prompts))
        .route("/api/prompts/{name}", post(info::get_prompt))
        .route("/api/resources", get(info::list_resources))
        .route("/api/resources/usage", get(info::usage))
        .route("/api/resources/examples/{tool}", get(info::tool_example))

        // Apply middleware and state
        .layer(middleware)
        .with_state(state)
}

/// Build CORS layer from settings
fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<_> = settings
        .cors
        .allowed_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    let layer = if origins.is_empty() {
        CorsLayer::new().allow_origin(Any)
    } else {
        CorsLayer::new().allow_origin(origins)
    };

    layer
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600))
}

/// Health check endpoint
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "success": true,
        "message": "Server is running fine.",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}
