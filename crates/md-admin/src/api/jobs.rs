//! Jobs and Tasks Admin API
//!
//! `jobs.json` lists the active jobs of the service registry; `tasks.json`
//! queries workflow instances.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use md_common::{
    cmp_ignore_case, parse_sort, resolve_sort, sort_by_criteria, ListResponse, PageWindow,
    SortOrder,
};
use serde::Deserialize;
use std::cmp::Ordering;
use std::sync::Arc;

use crate::api::common::{non_blank, ListParams};
use crate::api::middleware::RequestContext;
use crate::domain::{Job, WorkflowInstance, WorkflowState};
use crate::error::AdminError;
use crate::service::{ServiceRegistry, WorkflowQuery, WorkflowService};

const JOB_FILTERS: &[&str] = &["hostname", "nodeName", "status", "freeText"];

/// Jobs service state
#[derive(Clone)]
pub struct JobsState {
    pub registry: Arc<dyn ServiceRegistry>,
    pub workflows: Arc<dyn WorkflowService>,
}

/// `status` may repeat; a leading `-` excludes the state instead
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskParams {
    #[serde(default)]
    pub status: Vec<String>,
    pub q: Option<String>,
    pub series_id: Option<String>,
    pub mp: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobSortField {
    Creator,
    Operation,
    ProcessingHost,
    ProcessingNode,
    Status,
    Started,
    Submitted,
    Type,
    Id,
}

impl JobSortField {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "creator" => Some(Self::Creator),
            "operation" => Some(Self::Operation),
            "processingHost" => Some(Self::ProcessingHost),
            "processingNode" => Some(Self::ProcessingNode),
            "status" => Some(Self::Status),
            "started" => Some(Self::Started),
            "submitted" => Some(Self::Submitted),
            "type" => Some(Self::Type),
            "id" => Some(Self::Id),
            _ => None,
        }
    }

    fn compare(&self, a: &Job, b: &Job) -> Ordering {
        match self {
            Self::Creator => cmp_ignore_case(&a.creator, &b.creator),
            Self::Operation => cmp_ignore_case(&a.operation, &b.operation),
            Self::ProcessingHost => a.processing_host.cmp(&b.processing_host),
            Self::ProcessingNode => a.processing_node.cmp(&b.processing_node),
            Self::Status => a.status.as_str().cmp(b.status.as_str()),
            Self::Started => a.started.cmp(&b.started),
            Self::Submitted => a.submitted.cmp(&b.submitted),
            Self::Type => cmp_ignore_case(&a.job_type, &b.job_type),
            Self::Id => a.id.cmp(&b.id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskSortField {
    Date,
    Title,
    SeriesTitle,
    Creator,
    MediaPackage,
    Status,
}

impl TaskSortField {
    fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "date" => Some(Self::Date),
            "title" => Some(Self::Title),
            "series_title" => Some(Self::SeriesTitle),
            "creator" => Some(Self::Creator),
            "mp" => Some(Self::MediaPackage),
            "status" => Some(Self::Status),
            _ => None,
        }
    }

    fn compare(&self, a: &WorkflowInstance, b: &WorkflowInstance) -> Ordering {
        match self {
            Self::Date => a.submitted.cmp(&b.submitted),
            Self::Title => cmp_ignore_case(&a.title, &b.title),
            Self::SeriesTitle => cmp_ignore_case(
                a.series_title.as_deref().unwrap_or_default(),
                b.series_title.as_deref().unwrap_or_default(),
            ),
            Self::Creator => cmp_ignore_case(&a.creator, &b.creator),
            Self::MediaPackage => a.event_id.cmp(&b.event_id),
            Self::Status => a.state.as_str().cmp(b.state.as_str()),
        }
    }
}

fn job_matches_text(job: &Job, text: &str) -> bool {
    let text = text.to_lowercase();
    [
        Some(job.id.to_string()),
        Some(job.job_type.clone()),
        Some(job.operation.clone()),
        Some(job.creator.clone()),
        Some(job.status.as_str().to_string()),
        job.processing_host.clone(),
        job.processing_node.clone(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(&text))
}

fn eq_ignore_case(value: Option<&str>, expected: &str) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case(expected))
}

/// List active jobs, hiding the jobs that merely start a workflow
pub async fn list_jobs(
    State(state): State<JobsState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse<Job>>, AdminError> {
    let filters = params.filters();
    filters.warn_unknown(JOB_FILTERS);
    let mut sort = resolve_sort(&params.sort_criteria(), JobSortField::parse)?;
    if sort.is_empty() {
        sort.push((JobSortField::Submitted, SortOrder::Ascending));
    }
    let window = params.window();

    let mut jobs: Vec<Job> = state
        .registry
        .active_jobs()
        .await?
        .into_iter()
        .filter(|j| !j.is_workflow_start())
        .filter(|j| {
            filters
                .get_trimmed("hostname")
                .map_or(true, |h| eq_ignore_case(j.processing_host.as_deref(), h))
        })
        .filter(|j| {
            filters
                .get_trimmed("nodeName")
                .map_or(true, |n| eq_ignore_case(j.processing_node.as_deref(), n))
        })
        .filter(|j| {
            filters
                .get_trimmed("status")
                .map_or(true, |s| j.status.as_str().eq_ignore_ascii_case(s))
        })
        .filter(|j| filters.get_trimmed("freeText").map_or(true, |t| job_matches_text(j, t)))
        .collect();

    sort_by_criteria(&mut jobs, &sort, |a, b, field| field.compare(a, b));
    let total = jobs.len() as u64;

    Ok(Json(ListResponse::new(
        window.apply(jobs),
        window.offset,
        window.limit,
        total,
    )))
}

fn build_workflow_query(ctx: &RequestContext, params: &TaskParams) -> Result<WorkflowQuery, AdminError> {
    let mut query = WorkflowQuery {
        organization: ctx.organization.clone(),
        text: non_blank(params.q.clone()),
        series_id: non_blank(params.series_id.clone()),
        event_id: non_blank(params.mp.clone()),
        ..Default::default()
    };

    for raw in &params.status {
        let (negated, name) = match raw.trim().strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw.trim()),
        };
        let state = WorkflowState::parse(name)
            .ok_or_else(|| AdminError::validation(format!("Unknown workflow state '{}'", raw)))?;
        if negated {
            query.excluded_states.push(state);
        } else {
            query.states.push(state);
        }
    }

    Ok(query)
}

/// Query workflow instances
pub async fn list_tasks(
    State(state): State<JobsState>,
    ctx: RequestContext,
    axum_extra::extract::Query(params): axum_extra::extract::Query<TaskParams>,
) -> Result<Json<ListResponse<WorkflowInstance>>, AdminError> {
    let query = build_workflow_query(&ctx, &params)?;
    let sort = resolve_sort(&parse_sort(params.sort.as_deref()), TaskSortField::parse)?;
    let window = PageWindow::new(params.limit.unwrap_or(0), params.offset.unwrap_or(0));

    let mut instances = state.workflows.instances(&query).await?;
    sort_by_criteria(&mut instances, &sort, |a, b, field| field.compare(a, b));
    let total = instances.len() as u64;

    Ok(Json(ListResponse::new(
        window.apply(instances),
        window.offset,
        window.limit,
        total,
    )))
}

/// Build jobs router
pub fn jobs_router(state: JobsState) -> Router {
    Router::new()
        .route("/jobs.json", get(list_jobs))
        .route("/tasks.json", get(list_tasks))
        .with_state(state)
}
