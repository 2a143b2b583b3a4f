//! Capture Agents Admin API

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use md_common::{cmp_ignore_case, resolve_sort, sort_by_criteria, ListResponse};
use std::sync::Arc;
use tracing::info;

use crate::api::common::ListParams;
use crate::api::middleware::RequestContext;
use crate::domain::CaptureAgent;
use crate::error::AdminError;
use crate::service::CaptureAgentService;

const AGENT_FILTERS: &[&str] = &["name", "status", "textFilter"];

/// Capture agent service state
#[derive(Clone)]
pub struct AgentsState {
    pub agents: Arc<dyn CaptureAgentService>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AgentSortField {
    Name,
    Status,
    Updated,
}

impl AgentSortField {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "name" => Some(Self::Name),
            "status" => Some(Self::Status),
            "updated" => Some(Self::Updated),
            _ => None,
        }
    }
}

/// List capture agents
pub async fn list_agents(
    State(state): State<AgentsState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse<CaptureAgent>>, AdminError> {
    let filters = params.filters();
    filters.warn_unknown(AGENT_FILTERS);
    let sort = resolve_sort(&params.sort_criteria(), AgentSortField::parse)?;
    let window = params.window();

    let mut agents: Vec<CaptureAgent> = state
        .agents
        .agents()
        .await?
        .into_iter()
        .filter(|a| filters.get_trimmed("name").map_or(true, |n| a.name.eq_ignore_ascii_case(n)))
        .filter(|a| {
            filters
                .get_trimmed("status")
                .map_or(true, |s| a.state.as_str().eq_ignore_ascii_case(s))
        })
        .filter(|a| {
            filters.get_trimmed("textFilter").map_or(true, |t| {
                let t = t.to_lowercase();
                a.name.to_lowercase().contains(&t) || a.state.as_str().contains(&t)
            })
        })
        .collect();

    sort_by_criteria(&mut agents, &sort, |a, b, field| match field {
        AgentSortField::Name => cmp_ignore_case(&a.name, &b.name),
        AgentSortField::Status => a.state.as_str().cmp(b.state.as_str()),
        AgentSortField::Updated => a.last_heard_from.cmp(&b.last_heard_from),
    });
    let total = agents.len() as u64;

    Ok(Json(ListResponse::new(
        window.apply(agents),
        window.offset,
        window.limit,
        total,
    )))
}

/// Get capture agent by name
pub async fn get_agent(
    State(state): State<AgentsState>,
    Path(name): Path<String>,
) -> Result<Json<CaptureAgent>, AdminError> {
    let agent = state
        .agents
        .agent(&name)
        .await?
        .ok_or_else(|| AdminError::not_found("CaptureAgent", &name))?;
    Ok(Json(agent))
}

/// Remove a capture agent from the registry
pub async fn delete_agent(
    State(state): State<AgentsState>,
    ctx: RequestContext,
    Path(name): Path<String>,
) -> Result<StatusCode, AdminError> {
    if state.agents.agent(&name).await?.is_none() {
        return Err(AdminError::not_found("CaptureAgent", &name));
    }

    state.agents.remove_agent(&name).await?;
    info!(agent = %name, removed_by = %ctx.username, "Capture agent removed");
    Ok(StatusCode::OK)
}

/// Build capture agents router
pub fn agents_router(state: AgentsState) -> Router {
    Router::new()
        .route("/agents.json", get(list_agents))
        .route("/:name", get(get_agent).delete(delete_agent))
        .with_state(state)
}
