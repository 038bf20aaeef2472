//! Live database route handlers
//!
//! Each request names its own target database. A short-lived pool is opened,
//! the schema is collected, and the pool is released before responding.

use crate::error::{ApiResult, AppError};
use crate::graph::{DotRenderer, MermaidRenderer};
use crate::insights::InsightEngine;
use crate::introspection::{InspectOptions, PostgresIntrospector};
use crate::models::{
    validated, ConnectionRequest, DotGraphResponse, GraphMetadata, InspectRequest, InsightsResponse,
    InspectResponse, MermaidGraphResponse, SchemaListResponse, SchemaRequest,
};
use crate::state::SharedState;
use axum::{extract::State, Json};
use tracing::info;

/// List schemas of the target database
pub async fn list_schemas(
    State(state): State<SharedState>,
    Json(payload): Json<ConnectionRequest>,
) -> ApiResult<Json<SchemaListResponse>> {
    let payload = validated(payload)?;

    let (schemas, dialect) =
        PostgresIntrospector::list_schemas_from_url(&payload.connection_url, &state.settings.introspection).await?;

    info!("Listed {} schema(s)", schemas.len());

    Ok(Json(SchemaListResponse {
        schemas,
        dialect: dialect.to_string(),
    }))
}

/// Full snapshot, optionally with insights
pub async fn inspect(
    State(state): State<SharedState>,
    Json(payload): Json<InspectRequest>,
) -> ApiResult<Json<InspectResponse>> {
    let payload = validated(payload)?;

    let collected = PostgresIntrospector::collect_from_url(
        &payload.connection_url,
        &payload.options,
        &state.settings.introspection,
    )
    .await?;

    let insights = payload
        .include_insights
        .then(|| InsightEngine::build(&collected.snapshot));

    Ok(Json(InspectResponse::new(collected, insights)))
}

pub async fn insights(
    State(state): State<SharedState>,
    Json(payload): Json<InspectRequest>,
) -> ApiResult<Json<InsightsResponse>> {
    let payload = validated(payload)?;

    // Row counts play no part in the heuristics
    let options = InspectOptions {
        include_stats: false,
        ..payload.options
    };

    let collected =
        PostgresIntrospector::collect_from_url(&payload.connection_url, &options, &state.settings.introspection)
            .await?;

    Ok(Json(InsightsResponse {
        insights: InsightEngine::build(&collected.snapshot),
        schema: collected.schema,
        dialect: collected.dialect,
    }))
}

pub async fn graph_dot(
    State(state): State<SharedState>,
    Json(payload): Json<SchemaRequest>,
) -> ApiResult<Json<DotGraphResponse>> {
    let payload = validated(payload)?;

    let collected = PostgresIntrospector::collect_from_url(
        &payload.connection_url,
        &payload.options(),
        &state.settings.introspection,
    )
    .await?;

    Ok(Json(DotGraphResponse {
        dot: DotRenderer::render(&collected.snapshot),
        metadata: GraphMetadata::of(&collected),
        schema: collected.schema,
    }))
}

pub async fn graph_mermaid(
    State(state): State<SharedState>,
    Json(payload): Json<SchemaRequest>,
) -> ApiResult<Json<MermaidGraphResponse>> {
    let payload = validated(payload)?;

    let collected = PostgresIntrospector::collect_from_url(
        &payload.connection_url,
        &payload.options(),
        &state.settings.introspection,
    )
    .await?;

    let mermaid = MermaidRenderer::render(&collected.snapshot)
        .into_result()
        .map_err(AppError::Render)?;

    Ok(Json(MermaidGraphResponse {
        mermaid,
        metadata: GraphMetadata::of(&collected),
        schema: collected.schema,
    }))
}
