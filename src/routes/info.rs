//! Server info, prompt and resource route handlers
//!
//! Served straight from the capability table in `AppState`.

use crate::capabilities::{PromptInfo, PromptMessage, ResourceInfo, SERVER_NAME};
use crate::error::{not_found_error, ApiResult};
use crate::models::{validated, PromptRequest};
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub name: &'static str,
    pub status: &'static str,
    pub tools: Vec<&'static str>,
    pub notes: &'static str,
}

pub async fn server_info(State(state): State<SharedState>) -> Json<ServerInfo> {
    Json(ServerInfo {
        name: SERVER_NAME,
        status: "ok",
        tools: state.capabilities.tool_names(),
        notes: "Schema insight service is running.",
    })
}

pub async fn list_prompts(State(state): State<SharedState>) -> Json<Vec<PromptInfo>> {
    Json(state.capabilities.prompts.clone())
}

pub async fn get_prompt(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Json(payload): Json<PromptRequest>,
) -> ApiResult<Json<Vec<PromptMessage>>> {
    let payload = validated(payload)?;

    state
        .capabilities
        .render_prompt(&name, &payload.connection_url, payload.schema.as_deref())
        .map(Json)
        .ok_or_else(|| not_found_error(format!("Prompt '{}' not found", name)))
}

pub async fn list_resources(State(state): State<SharedState>) -> Json<Vec<ResourceInfo>> {
    Json(state.capabilities.resources.clone())
}

/// Plain-text usage guide
pub async fn usage(State(state): State<SharedState>) -> &'static str {
    state.capabilities.usage_guide()
}

pub async fn tool_example(State(state): State<SharedState>, Path(tool): Path<String>) -> Json<Value> {
    Json(state.capabilities.tool_example(&tool))
}
