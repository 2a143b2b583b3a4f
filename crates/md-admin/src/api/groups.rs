//! Groups Admin API

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Form, Json, Router,
};
use md_common::{cmp_ignore_case, resolve_sort, sort_by_criteria, ListResponse};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::api::common::{non_blank, require, split_comma, ListParams};
use crate::api::middleware::RequestContext;
use crate::domain::Group;
use crate::error::AdminError;
use crate::service::GroupProvider;

const GROUP_FILTERS: &[&str] = &["name", "textFilter"];

/// Groups service state
#[derive(Clone)]
pub struct GroupsState {
    pub groups: Arc<dyn GroupProvider>,
}

/// Create/update form; `roles` and `members` are comma separated
#[derive(Debug, Deserialize)]
pub struct GroupForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub roles: Option<String>,
    pub members: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MemberForm {
    pub member: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupSortField {
    Name,
    Description,
    Role,
}

impl GroupSortField {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "name" => Some(Self::Name),
            "description" => Some(Self::Description),
            "role" => Some(Self::Role),
            _ => None,
        }
    }
}

fn matches_text(group: &Group, text: &str) -> bool {
    let text = text.to_lowercase();
    group.name.to_lowercase().contains(&text)
        || group.role.to_lowercase().contains(&text)
        || group
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(&text))
}

async fn require_group(state: &GroupsState, ctx: &RequestContext, id: &str) -> Result<Group, AdminError> {
    state
        .groups
        .group(&ctx.organization, id)
        .await?
        .ok_or_else(|| AdminError::not_found("Group", id))
}

/// List groups
pub async fn list_groups(
    State(state): State<GroupsState>,
    ctx: RequestContext,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse<Group>>, AdminError> {
    let filters = params.filters();
    filters.warn_unknown(GROUP_FILTERS);
    let sort = resolve_sort(&params.sort_criteria(), GroupSortField::parse)?;
    let window = params.window();

    let mut groups: Vec<Group> = state
        .groups
        .groups(&ctx.organization)
        .await?
        .into_iter()
        .filter(|g| {
            filters
                .get_trimmed("name")
                .map_or(true, |name| g.name.to_lowercase().contains(&name.to_lowercase()))
        })
        .filter(|g| filters.get_trimmed("textFilter").map_or(true, |t| matches_text(g, t)))
        .collect();

    sort_by_criteria(&mut groups, &sort, |a, b, field| match field {
        GroupSortField::Name => cmp_ignore_case(&a.name, &b.name),
        GroupSortField::Description => cmp_ignore_case(
            a.description.as_deref().unwrap_or_default(),
            b.description.as_deref().unwrap_or_default(),
        ),
        GroupSortField::Role => cmp_ignore_case(&a.role, &b.role),
    });
    let total = groups.len() as u64;

    Ok(Json(ListResponse::new(
        window.apply(groups),
        window.offset,
        window.limit,
        total,
    )))
}

/// Create group
pub async fn create_group(
    State(state): State<GroupsState>,
    ctx: RequestContext,
    Form(form): Form<GroupForm>,
) -> Result<(StatusCode, Json<Group>), AdminError> {
    let name = require(form.name, "name")?;

    let mut group = Group::new(&name, &ctx.organization);
    group.description = non_blank(form.description);
    group.roles = split_comma(form.roles.as_deref()).into_iter().collect();
    group.members = split_comma(form.members.as_deref()).into_iter().collect();

    let created = state.groups.create_group(group).await?;
    info!(group_id = %created.id, created_by = %ctx.username, "Group created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// Get group by ID
pub async fn get_group(
    State(state): State<GroupsState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<Group>, AdminError> {
    Ok(Json(require_group(&state, &ctx, &id).await?))
}

/// Update group; the id and group role stay fixed when the name changes
pub async fn update_group(
    State(state): State<GroupsState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Form(form): Form<GroupForm>,
) -> Result<Json<Group>, AdminError> {
    let mut group = require_group(&state, &ctx, &id).await?;

    if let Some(name) = non_blank(form.name) {
        group.name = name;
    }
    if let Some(description) = form.description {
        group.description = non_blank(Some(description));
    }
    if form.roles.is_some() {
        group.roles = split_comma(form.roles.as_deref()).into_iter().collect();
    }
    if form.members.is_some() {
        group.members = split_comma(form.members.as_deref()).into_iter().collect();
    }

    Ok(Json(state.groups.update_group(group).await?))
}

/// Delete group
pub async fn delete_group(
    State(state): State<GroupsState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<StatusCode, AdminError> {
    require_group(&state, &ctx, &id).await?;
    state.groups.delete_group(&ctx.organization, &id).await?;
    info!(group_id = %id, deleted_by = %ctx.username, "Group deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_member(
    State(state): State<GroupsState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Form(form): Form<MemberForm>,
) -> Result<Json<Group>, AdminError> {
    let member = require(form.member, "member")?;
    let mut group = require_group(&state, &ctx, &id).await?;

    group.members.insert(member);
    Ok(Json(state.groups.update_group(group).await?))
}

pub async fn remove_member(
    State(state): State<GroupsState>,
    ctx: RequestContext,
    Path((id, member)): Path<(String, String)>,
) -> Result<Json<Group>, AdminError> {
    let mut group = require_group(&state, &ctx, &id).await?;

    if !group.members.remove(&member) {
        return Err(AdminError::not_found("Group member", &member));
    }
    Ok(Json(state.groups.update_group(group).await?))
}

/// Build groups router
pub fn groups_router(state: GroupsState) -> Router {
    Router::new()
        .route("/", post(create_group))
        .route("/groups.json", get(list_groups))
        .route("/:id", get(get_group).put(update_group).delete(delete_group))
        .route("/:id/members", post(add_member))
        .route("/:id/members/:member", delete(remove_member))
        .with_state(state)
}
