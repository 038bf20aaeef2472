//! Snapshot analysis route handlers
//!
//! Each handler takes a schema snapshot as the request body and runs one
//! analysis or renderer over it. No database is touched.

use crate::graph::{DotRenderer, ErDiagram, MermaidRenderer};
use crate::insights::{
    FkIndexAnalyzer, FkIndexReport, InsightEngine, ManyToManyCandidate, ManyToManyDetector, OrphanDetector,
    SchemaInsights,
};
use crate::snapshot::SchemaSnapshot;
use axum::{http::StatusCode, Json};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Serialize)]
pub struct DotResponse {
    pub dot: String,
}

fn log_snapshot(operation: &str, snapshot: &SchemaSnapshot) {
    debug!(
        "{}: {} tables, {} FKs ({} dangling)",
        operation,
        snapshot.tables.len(),
        snapshot.foreign_keys.len(),
        snapshot.dangling_foreign_keys().len()
    );
}

/// Tables with no foreign key in or out
pub async fn orphans(Json(snapshot): Json<SchemaSnapshot>) -> Json<Vec<String>> {
    log_snapshot("orphans", &snapshot);
    Json(OrphanDetector::detect(&snapshot))
}

/// Foreign keys lacking a usable index
pub async fn fk_indexes(Json(snapshot): Json<SchemaSnapshot>) -> Json<FkIndexReport> {
    log_snapshot("fk-indexes", &snapshot);
    Json(FkIndexAnalyzer::analyze(&snapshot))
}

/// Join table candidates
pub async fn many_to_many(Json(snapshot): Json<SchemaSnapshot>) -> Json<Vec<ManyToManyCandidate>> {
    log_snapshot("many-to-many", &snapshot);
    Json(ManyToManyDetector::detect(&snapshot))
}

pub async fn insights(Json(snapshot): Json<SchemaSnapshot>) -> Json<SchemaInsights> {
    log_snapshot("insights", &snapshot);
    Json(InsightEngine::build(&snapshot))
}

pub async fn graph_dot(Json(snapshot): Json<SchemaSnapshot>) -> Json<DotResponse> {
    log_snapshot("graph/dot", &snapshot);
    Json(DotResponse {
        dot: DotRenderer::render(&snapshot),
    })
}

/// ER diagram; a failed render is reported as 422 with the error tag
pub async fn graph_mermaid(Json(snapshot): Json<SchemaSnapshot>) -> (StatusCode, Json<ErDiagram>) {
    log_snapshot("graph/mermaid", &snapshot);
    diagram_response(MermaidRenderer::render(&snapshot))
}

fn diagram_response(diagram: ErDiagram) -> (StatusCode, Json<ErDiagram>) {
    let status = match diagram {
        ErDiagram::Rendered(_) => StatusCode::OK,
        ErDiagram::Failed(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };

    (status, Json(diagram))
}
