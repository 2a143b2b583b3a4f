//! Events Admin API
//!
//! Event listing and removal, comments, scheduling, opt-out, workflow
//! instances and access control of single events.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Form, Json, Router,
};
use chrono::{DateTime, Utc};
use md_common::{parse_date_range, resolve_sort, BulkOperationResult, ListResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::api::common::{
    non_blank, parse_bool, parse_bool_or, parse_id_array, parse_numeric_id, parse_timestamp,
    record_outcome, require, ListParams,
};
use crate::api::middleware::RequestContext;
use crate::domain::{
    AccessControlList, AclTransition, Comment, Event, EventStatus, Incident, ReviewStatus,
    SchedulingChange, TechnicalMetadata, WorkflowAction, WorkflowInstance, WorkflowOperation,
};
use crate::error::AdminError;
use crate::service::{
    AclService, CommentDraft, CommentService, CommentsFilter, EventQuery, EventSortField,
    IndexService, SchedulerService, SearchIndex, TransitionDraft, WorkflowService,
};

const EVENT_FILTERS: &[&str] = &[
    "presenters",
    "technicalPresenters",
    "contributors",
    "location",
    "agent",
    "textFilter",
    "series",
    "status",
    "optedOut",
    "reviewStatus",
    "comments",
    "startDate",
];

/// Events service state
#[derive(Clone)]
pub struct EventsState {
    pub index: Arc<dyn SearchIndex>,
    pub index_service: Arc<dyn IndexService>,
    pub comments: Arc<dyn CommentService>,
    pub scheduler: Arc<dyn SchedulerService>,
    pub workflows: Arc<dyn WorkflowService>,
    pub acls: Arc<dyn AclService>,
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    pub text: Option<String>,
    pub reason: Option<String>,
    pub resolved: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReplyForm {
    pub text: Option<String>,
    pub resolved: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SchedulingForm {
    pub scheduling: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MetadataForm {
    pub metadata: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptOutsForm {
    pub event_ids: Option<String>,
    pub optout: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AccessForm {
    pub acl: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransitionForm {
    pub transition: Option<String>,
}

/// Wire shape of an ACL transition
#[derive(Debug, Deserialize)]
struct TransitionPayload {
    acl_id: Option<i64>,
    workflow_id: Option<String>,
    application_date: Option<String>,
}

/// Requested slot of a new event, as sent by the scheduling wizard
#[derive(Debug, Deserialize)]
struct ConflictCheck {
    device: Option<String>,
    start: Option<String>,
    end: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConflictResponse {
    pub time: DateTime<Utc>,
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct ManagedAclSummary {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessResponse {
    pub acl: AccessControlList,
    pub current_managed_acl: Option<String>,
    pub managed_acls: Vec<ManagedAclSummary>,
    pub transitions: Vec<AclTransition>,
    /// Set while a workflow runs; the ACL cannot change then
    pub locked: bool,
}

fn invalid(field: &str, value: &str) -> AdminError {
    AdminError::validation(format!("Invalid value '{}' for filter '{}'", value, field))
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(str::to_string)
}

async fn require_event(state: &EventsState, ctx: &RequestContext, id: &str) -> Result<Event, AdminError> {
    state
        .index
        .get_event(&ctx.organization, id)
        .await?
        .ok_or_else(|| AdminError::not_found("Event", id))
}

/// Event plus one of its workflow instances; 400 if the instance belongs to
/// another event.
async fn event_workflow(
    state: &EventsState,
    ctx: &RequestContext,
    id: &str,
    workflow_id: i64,
) -> Result<(Event, WorkflowInstance), AdminError> {
    let event = require_event(state, ctx, id).await?;
    let instance = state
        .workflows
        .instance(workflow_id)
        .await?
        .ok_or_else(|| AdminError::not_found("Workflow", workflow_id))?;

    if instance.event_id != event.id {
        return Err(AdminError::validation(format!(
            "Workflow {} is not associated to event {}",
            workflow_id, id
        )));
    }
    Ok((event, instance))
}

fn build_event_query(ctx: &RequestContext, params: &ListParams) -> Result<EventQuery, AdminError> {
    let filters = params.filters();
    filters.warn_unknown(EVENT_FILTERS);

    let mut query = EventQuery::for_organization(&ctx.organization);
    query.presenters = owned(filters.get_trimmed("presenters"));
    query.technical_presenters = owned(filters.get_trimmed("technicalPresenters"));
    query.contributors = owned(filters.get_trimmed("contributors"));
    query.location = owned(filters.get_trimmed("location"));
    query.agent_id = owned(filters.get_trimmed("agent"));
    query.text = owned(filters.get_trimmed("textFilter"));
    query.series_id = owned(filters.get_trimmed("series"));

    if let Some(v) = filters.get_trimmed("status") {
        query.status = Some(EventStatus::parse(v).ok_or_else(|| invalid("status", v))?);
    }
    if let Some(v) = filters.get_trimmed("optedOut") {
        query.opted_out = Some(parse_bool(v, "optedOut")?);
    }
    if let Some(v) = filters.get_trimmed("reviewStatus") {
        query.review_status = Some(ReviewStatus::parse(v).ok_or_else(|| invalid("reviewStatus", v))?);
    }
    if let Some(v) = filters.get_trimmed("comments") {
        query.comments = Some(CommentsFilter::parse(v).ok_or_else(|| invalid("comments", v))?);
    }
    if let Some(v) = filters.get_trimmed("startDate") {
        query.start_range = Some(parse_date_range(v)?);
    }

    query.sort = resolve_sort(&params.sort_criteria(), EventSortField::parse)?;
    query.window = params.window();
    Ok(query)
}

/// List events
pub async fn list_events(
    State(state): State<EventsState>,
    ctx: RequestContext,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse<Event>>, AdminError> {
    let query = build_event_query(&ctx, &params)?;
    let result = state.index.search_events(&query).await?;

    Ok(Json(ListResponse::new(
        result.items,
        query.window.offset,
        query.window.limit,
        result.total,
    )))
}

/// Get event by ID
pub async fn get_event(
    State(state): State<EventsState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<Event>, AdminError> {
    Ok(Json(require_event(&state, &ctx, &id).await?))
}

/// Delete a single event
pub async fn delete_event(
    State(state): State<EventsState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<StatusCode, AdminError> {
    state.index_service.remove_event(&ctx.organization, &id).await?;
    info!(event_id = %id, user = %ctx.username, "Event deleted");
    Ok(StatusCode::OK)
}

/// Delete a JSON list of events
pub async fn delete_events(
    State(state): State<EventsState>,
    ctx: RequestContext,
    body: String,
) -> Result<Json<BulkOperationResult>, AdminError> {
    let ids = parse_id_array(&body)?;

    let mut result = BulkOperationResult::new();
    for id in ids {
        let outcome = state.index_service.remove_event(&ctx.organization, &id).await;
        record_outcome(&mut result, &id, outcome);
    }

    info!(ok = result.ok.len(), not_found = result.not_found.len(), "Bulk event delete");
    Ok(Json(result))
}

/// List the comments of an event
pub async fn list_comments(
    State(state): State<EventsState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<Vec<Comment>>, AdminError> {
    require_event(&state, &ctx, &id).await?;
    Ok(Json(state.comments.comments(&id).await?))
}

/// Add a comment
pub async fn create_comment(
    State(state): State<EventsState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Form(form): Form<CommentForm>,
) -> Result<(StatusCode, Json<Comment>), AdminError> {
    let text = require(form.text, "text")?;
    let resolved = parse_bool_or(form.resolved.as_deref(), "resolved", false)?;
    require_event(&state, &ctx, &id).await?;

    let draft = CommentDraft {
        text,
        reason: non_blank(form.reason),
        resolved,
        author: ctx.username.clone(),
    };
    let comment = state.comments.add_comment(&id, draft).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn get_comment(
    State(state): State<EventsState>,
    ctx: RequestContext,
    Path((id, comment_id)): Path<(String, i64)>,
) -> Result<Json<Comment>, AdminError> {
    require_event(&state, &ctx, &id).await?;
    let comment = state
        .comments
        .comment(&id, comment_id)
        .await?
        .ok_or_else(|| AdminError::not_found("Comment", comment_id))?;
    Ok(Json(comment))
}

pub async fn update_comment(
    State(state): State<EventsState>,
    ctx: RequestContext,
    Path((id, comment_id)): Path<(String, i64)>,
    Form(form): Form<CommentForm>,
) -> Result<Json<Comment>, AdminError> {
    let text = require(form.text, "text")?;
    let reason = non_blank(form.reason);
    require_event(&state, &ctx, &id).await?;
    let comment = state
        .comments
        .update_comment(&id, comment_id, &text, reason.as_deref())
        .await?;
    Ok(Json(comment))
}

/// Mark a comment as resolved
pub async fn resolve_comment(
    State(state): State<EventsState>,
    ctx: RequestContext,
    Path((id, comment_id)): Path<(String, i64)>,
) -> Result<Json<Comment>, AdminError> {
    require_event(&state, &ctx, &id).await?;
    Ok(Json(state.comments.resolve_comment(&id, comment_id).await?))
}

pub async fn delete_comment(
    State(state): State<EventsState>,
    ctx: RequestContext,
    Path((id, comment_id)): Path<(String, i64)>,
) -> Result<StatusCode, AdminError> {
    require_event(&state, &ctx, &id).await?;
    state.comments.delete_comment(&id, comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Reply to a comment, optionally resolving it. Returns the whole comment.
pub async fn create_reply(
    State(state): State<EventsState>,
    ctx: RequestContext,
    Path((id, comment_id)): Path<(String, i64)>,
    Form(form): Form<ReplyForm>,
) -> Result<Json<Comment>, AdminError> {
    let text = require(form.text, "text")?;
    let resolve = parse_bool_or(form.resolved.as_deref(), "resolved", false)?;
    require_event(&state, &ctx, &id).await?;

    let comment = state
        .comments
        .add_reply(&id, comment_id, &text, &ctx.username, resolve)
        .await?;
    Ok(Json(comment))
}

pub async fn update_reply(
    State(state): State<EventsState>,
    ctx: RequestContext,
    Path((id, comment_id, reply_id)): Path<(String, i64, i64)>,
    Form(form): Form<ReplyForm>,
) -> Result<Json<Comment>, AdminError> {
    let text = require(form.text, "text")?;
    require_event(&state, &ctx, &id).await?;
    Ok(Json(
        state
            .comments
            .update_reply(&id, comment_id, reply_id, &text)
            .await?,
    ))
}

pub async fn delete_reply(
    State(state): State<EventsState>,
    ctx: RequestContext,
    Path((id, comment_id, reply_id)): Path<(String, i64, i64)>,
) -> Result<Json<Comment>, AdminError> {
    require_event(&state, &ctx, &id).await?;
    Ok(Json(state.comments.delete_reply(&id, comment_id, reply_id).await?))
}

/// Technical metadata of a scheduled event
pub async fn get_scheduling(
    State(state): State<EventsState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<TechnicalMetadata>, AdminError> {
    require_event(&state, &ctx, &id).await?;
    Ok(Json(state.scheduler.technical_metadata(&id).await?))
}

pub async fn update_scheduling(
    State(state): State<EventsState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Form(form): Form<SchedulingForm>,
) -> Result<StatusCode, AdminError> {
    let raw = require(form.scheduling, "scheduling")?;
    let change: SchedulingChange = serde_json::from_str(&raw)
        .map_err(|e| AdminError::validation(format!("Unable to parse scheduling: {}", e)))?;

    if let (Some(start), Some(end)) = (change.start, change.end) {
        if start > end {
            return Err(AdminError::validation("The end date is before the start date"));
        }
    }
    require_event(&state, &ctx, &id).await?;
    if change.is_empty() {
        return Ok(StatusCode::NO_CONTENT);
    }

    state.scheduler.update_scheduling(&id, &change).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Check a requested slot against the agent's schedule.
///
/// 409 with the conflicting events, 204 when the slot is free.
pub async fn check_conflicts(
    State(state): State<EventsState>,
    Form(form): Form<MetadataForm>,
) -> Result<Response, AdminError> {
    let raw = require(form.metadata, "metadata")?;
    let check: ConflictCheck = serde_json::from_str(&raw)
        .map_err(|e| AdminError::validation(format!("Unable to parse metadata: {}", e)))?;

    let device = require(check.device, "device")?;
    let start = parse_timestamp(&require(check.start, "start")?, "start")?;
    let end = parse_timestamp(&require(check.end, "end")?, "end")?;
    if start > end {
        return Err(AdminError::validation("The end date is before the start date"));
    }

    let conflicts = state.scheduler.find_conflicts(&device, start, end).await?;
    if conflicts.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let body: Vec<ConflictResponse> = conflicts
        .into_iter()
        .map(|e| ConflictResponse {
            time: e.start,
            title: e.title,
        })
        .collect();
    Ok((StatusCode::CONFLICT, Json(body)).into_response())
}

async fn change_opt_out(
    state: &EventsState,
    ctx: &RequestContext,
    id: &str,
    optout: bool,
) -> Result<(), AdminError> {
    require_event(state, ctx, id).await?;
    state.scheduler.set_opt_out(id, optout).await
}

pub async fn update_opt_out(
    State(state): State<EventsState>,
    ctx: RequestContext,
    Path((id, optout)): Path<(String, String)>,
) -> Result<StatusCode, AdminError> {
    let optout = parse_bool(&optout, "optout")?;
    change_opt_out(&state, &ctx, &id, optout).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Change the opt-out status of many events
pub async fn change_opt_outs(
    State(state): State<EventsState>,
    ctx: RequestContext,
    Form(form): Form<OptOutsForm>,
) -> Result<Json<BulkOperationResult>, AdminError> {
    let optout = parse_bool_or(form.optout.as_deref(), "optout", false)?;
    let ids = parse_id_array(form.event_ids.as_deref().unwrap_or_default())?;

    let mut result = BulkOperationResult::new();
    for id in ids {
        let outcome = change_opt_out(&state, &ctx, &id, optout).await;
        record_outcome(&mut result, &id, outcome);
    }
    Ok(Json(result))
}

pub async fn list_workflows(
    State(state): State<EventsState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<ListResponse<WorkflowInstance>>, AdminError> {
    require_event(&state, &ctx, &id).await?;
    let instances = state.workflows.instances_for_event(&id).await?;
    let total = instances.len() as u64;
    Ok(Json(ListResponse::new(instances, 0, 0, total)))
}

pub async fn get_workflow(
    State(state): State<EventsState>,
    ctx: RequestContext,
    Path((id, workflow_id)): Path<(String, i64)>,
) -> Result<Json<WorkflowInstance>, AdminError> {
    let (_, instance) = event_workflow(&state, &ctx, &id, workflow_id).await?;
    Ok(Json(instance))
}

pub async fn get_workflow_operations(
    State(state): State<EventsState>,
    ctx: RequestContext,
    Path((id, workflow_id)): Path<(String, i64)>,
) -> Result<Json<Vec<WorkflowOperation>>, AdminError> {
    event_workflow(&state, &ctx, &id, workflow_id).await?;
    Ok(Json(state.workflows.operations(workflow_id).await?))
}

/// `operations/3` and `operations/3.json` both address the operation at
/// position 3.
pub async fn get_workflow_operation(
    State(state): State<EventsState>,
    ctx: RequestContext,
    Path((id, workflow_id, position)): Path<(String, i64, String)>,
) -> Result<Json<WorkflowOperation>, AdminError> {
    let position = parse_numeric_id(position.trim_end_matches(".json"), "operationId")?;
    event_workflow(&state, &ctx, &id, workflow_id).await?;

    let operation = state
        .workflows
        .operations(workflow_id)
        .await?
        .into_iter()
        .find(|op| i64::from(op.position) == position)
        .ok_or_else(|| AdminError::not_found("WorkflowOperation", position))?;
    Ok(Json(operation))
}

pub async fn get_workflow_errors(
    State(state): State<EventsState>,
    ctx: RequestContext,
    Path((id, workflow_id)): Path<(String, i64)>,
) -> Result<Json<Vec<Incident>>, AdminError> {
    event_workflow(&state, &ctx, &id, workflow_id).await?;
    Ok(Json(state.workflows.incidents(workflow_id).await?))
}

pub async fn get_workflow_error(
    State(state): State<EventsState>,
    ctx: RequestContext,
    Path((id, workflow_id, error_id)): Path<(String, i64, String)>,
) -> Result<Json<Incident>, AdminError> {
    let error_id = parse_numeric_id(error_id.trim_end_matches(".json"), "errorId")?;
    event_workflow(&state, &ctx, &id, workflow_id).await?;

    let incident = state
        .workflows
        .incidents(workflow_id)
        .await?
        .into_iter()
        .find(|i| i.id == error_id)
        .ok_or_else(|| AdminError::not_found("Incident", error_id))?;
    Ok(Json(incident))
}

/// Stop, retry or skip past the failed operation of a workflow
pub async fn workflow_action(
    State(state): State<EventsState>,
    ctx: RequestContext,
    Path((id, workflow_id, action)): Path<(String, i64, String)>,
) -> Result<StatusCode, AdminError> {
    let action = WorkflowAction::parse(&action)
        .ok_or_else(|| AdminError::validation(format!("Action not supported: {}", action)))?;
    event_workflow(&state, &ctx, &id, workflow_id).await?;

    state.workflows.apply_action(workflow_id, action).await?;
    info!(event_id = %id, workflow_id, action = ?action, "Workflow action applied");
    Ok(StatusCode::OK)
}

/// Delete an old workflow instance; the current one cannot be deleted
pub async fn delete_workflow(
    State(state): State<EventsState>,
    ctx: RequestContext,
    Path((id, workflow_id)): Path<(String, i64)>,
) -> Result<StatusCode, AdminError> {
    let (event, _) = event_workflow(&state, &ctx, &id, workflow_id).await?;
    if event.workflow_id == Some(workflow_id) {
        return Err(AdminError::validation(format!(
            "Cannot delete current workflow {} from event {}",
            workflow_id, id
        )));
    }

    state.workflows.remove(workflow_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_access(
    State(state): State<EventsState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<AccessResponse>, AdminError> {
    let event = require_event(&state, &ctx, &id).await?;
    let acl = state.acls.event_acl(&ctx.organization, &id).await?;
    let managed_acls = state
        .acls
        .managed_acls(&ctx.organization)
        .await?
        .into_iter()
        .map(|m| ManagedAclSummary { id: m.id, name: m.name })
        .collect();
    let transitions = state.acls.transitions(&id).await?;
    let locked = state.workflows.has_active_workflow(&id).await?;

    Ok(Json(AccessResponse {
        acl,
        current_managed_acl: event.managed_acl,
        managed_acls,
        transitions,
        locked,
    }))
}

/// Replace the ACL of an event. Refused while a workflow is running.
pub async fn update_access(
    State(state): State<EventsState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Form(form): Form<AccessForm>,
) -> Result<StatusCode, AdminError> {
    let raw = require(form.acl, "acl")?;
    let acl = AccessControlList::parse_json(&raw).map_err(AdminError::validation)?;
    require_event(&state, &ctx, &id).await?;

    if state.workflows.has_active_workflow(&id).await? {
        return Err(AdminError::conflict(format!(
            "Event {} has an active workflow, its access rules cannot be changed",
            id
        )));
    }

    state.acls.apply_to_event(&ctx.organization, &id, acl).await?;
    info!(event_id = %id, user = %ctx.username, "Event access updated");
    Ok(StatusCode::NO_CONTENT)
}

/// Validate a posted transition. The referenced managed ACL must exist.
async fn parse_transition(
    state: &EventsState,
    ctx: &RequestContext,
    id: &str,
    raw: Option<String>,
) -> Result<TransitionDraft, AdminError> {
    let raw = require(raw, "transition")?;
    let payload: TransitionPayload = serde_json::from_str(&raw)
        .map_err(|e| AdminError::validation(format!("The transition object is not valid: {}", e)))?;
    let date = require(payload.application_date, "application_date")?;
    let application_date = parse_timestamp(&date, "application_date")?;

    require_event(state, ctx, id).await?;
    if let Some(acl_id) = payload.acl_id {
        if state.acls.managed_acl(&ctx.organization, acl_id).await?.is_none() {
            return Err(AdminError::validation(format!("Unknown managed ACL {}", acl_id)));
        }
    }

    Ok(TransitionDraft {
        acl_id: payload.acl_id,
        workflow_id: non_blank(payload.workflow_id),
        application_date,
    })
}

pub async fn list_transitions(
    State(state): State<EventsState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<Vec<AclTransition>>, AdminError> {
    require_event(&state, &ctx, &id).await?;
    Ok(Json(state.acls.transitions(&id).await?))
}

/// Schedule a switch of the event to another managed ACL or workflow
pub async fn add_transition(
    State(state): State<EventsState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Form(form): Form<TransitionForm>,
) -> Result<StatusCode, AdminError> {
    let draft = parse_transition(&state, &ctx, &id, form.transition).await?;
    let transition = state.acls.add_transition(&id, draft).await?;
    info!(event_id = %id, transition_id = transition.id, "ACL transition added");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_transition(
    State(state): State<EventsState>,
    ctx: RequestContext,
    Path((id, transition_id)): Path<(String, i64)>,
    Form(form): Form<TransitionForm>,
) -> Result<StatusCode, AdminError> {
    let draft = parse_transition(&state, &ctx, &id, form.transition).await?;
    state.acls.update_transition(&id, transition_id, draft).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_transition(
    State(state): State<EventsState>,
    ctx: RequestContext,
    Path((id, transition_id)): Path<(String, i64)>,
) -> Result<StatusCode, AdminError> {
    require_event(&state, &ctx, &id).await?;
    state.acls.delete_transition(&id, transition_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Build events router
pub fn events_router(state: EventsState) -> Router {
    Router::new()
        .route("/events.json", get(list_events))
        .route("/deleteEvents", post(delete_events))
        .route("/optouts", post(change_opt_outs))
        .route("/new/conflicts", post(check_conflicts))
        .route("/:id", get(get_event).delete(delete_event))
        .route("/:id/comments", get(list_comments))
        .route("/:id/comment", post(create_comment))
        .route(
            "/:id/comment/:comment_id",
            get(get_comment)
                .put(update_comment)
                .post(resolve_comment)
                .delete(delete_comment),
        )
        .route("/:id/comment/:comment_id/reply", post(create_reply))
        .route(
            "/:id/comment/:comment_id/:reply_id",
            put(update_reply).delete(delete_reply),
        )
        .route("/:id/scheduling.json", get(get_scheduling))
        .route("/:id/scheduling", put(update_scheduling))
        .route("/:id/optout/:optout", get(update_opt_out))
        .route("/:id/workflows.json", get(list_workflows))
        .route("/:id/workflows/:workflow_id", get(get_workflow).delete(delete_workflow))
        .route("/:id/workflows/:workflow_id/operations.json", get(get_workflow_operations))
        .route(
            "/:id/workflows/:workflow_id/operations/:operation_id",
            get(get_workflow_operation),
        )
        .route("/:id/workflows/:workflow_id/errors.json", get(get_workflow_errors))
        .route("/:id/workflows/:workflow_id/errors/:error_id", get(get_workflow_error))
        .route("/:id/workflows/:workflow_id/action/:action", put(workflow_action))
        .route("/:id/access.json", get(get_access))
        .route("/:id/access", post(update_access))
        .route("/:id/transitions", get(list_transitions).post(add_transition))
        .route(
            "/:id/transitions/:transition_id",
            put(update_transition).delete(delete_transition),
        )
        .with_state(state)
}
