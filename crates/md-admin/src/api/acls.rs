//! Managed ACL Admin API
//!
//! Named, reusable access control lists of an organization.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Form, Json, Router,
};
use md_common::{cmp_ignore_case, resolve_sort, sort_by_criteria, ListResponse};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::common::{parse_numeric_id, require, ListParams};
use crate::api::middleware::RequestContext;
use crate::domain::{AccessControlList, ManagedAcl};
use crate::error::AdminError;
use crate::service::AclService;

const ACL_FILTERS: &[&str] = &["name", "textFilter"];

/// ACL service state
#[derive(Clone)]
pub struct AclsState {
    pub acls: Arc<dyn AclService>,
}

#[derive(Debug, Deserialize)]
pub struct AclForm {
    pub name: Option<String>,
    pub acl: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AclSortField {
    Name,
}

impl AclSortField {
    fn parse(name: &str) -> Option<Self> {
        (name == "name").then_some(Self::Name)
    }
}

fn parse_form(form: AclForm) -> Result<(String, AccessControlList), AdminError> {
    let name = require(form.name, "name")?;
    let raw = require(form.acl, "acl")?;
    let acl = AccessControlList::parse_json(&raw).map_err(AdminError::validation)?;
    Ok((name, acl))
}

/// List managed ACLs
pub async fn list_acls(
    State(state): State<AclsState>,
    ctx: RequestContext,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse<ManagedAcl>>, AdminError> {
    let filters = params.filters();
    filters.warn_unknown(ACL_FILTERS);
    let sort = resolve_sort(&params.sort_criteria(), AclSortField::parse)?;
    let window = params.window();

    // Both filters match on the name
    let needles: Vec<String> = ["name", "textFilter"]
        .iter()
        .filter_map(|key| filters.get_trimmed(key))
        .map(str::to_lowercase)
        .collect();

    let mut acls: Vec<ManagedAcl> = state
        .acls
        .managed_acls(&ctx.organization)
        .await?
        .into_iter()
        .filter(|a| {
            let name = a.name.to_lowercase();
            needles.iter().all(|n| name.contains(n.as_str()))
        })
        .collect();

    sort_by_criteria(&mut acls, &sort, |a, b, field| match field {
        AclSortField::Name => cmp_ignore_case(&a.name, &b.name),
    });
    let total = acls.len() as u64;

    Ok(Json(ListResponse::new(
        window.apply(acls),
        window.offset,
        window.limit,
        total,
    )))
}

/// Create a managed ACL. Names are unique per organization.
pub async fn create_acl(
    State(state): State<AclsState>,
    ctx: RequestContext,
    Form(form): Form<AclForm>,
) -> Result<Json<ManagedAcl>, AdminError> {
    let (name, acl) = parse_form(form)?;

    let Some(created) = state.acls.create_acl(&ctx.organization, &name, acl).await? else {
        warn!(name = %name, "Managed ACL name already taken");
        return Err(AdminError::duplicate("ManagedAcl", "name", name));
    };

    info!(acl_id = created.id, name = %created.name, "Managed ACL created");
    Ok(Json(created))
}

/// Get managed ACL by ID
pub async fn get_acl(
    State(state): State<AclsState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<ManagedAcl>, AdminError> {
    let id = parse_numeric_id(&id, "id")?;
    let acl = state
        .acls
        .managed_acl(&ctx.organization, id)
        .await?
        .ok_or_else(|| AdminError::not_found("ManagedAcl", id))?;
    Ok(Json(acl))
}

pub async fn update_acl(
    State(state): State<AclsState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Form(form): Form<AclForm>,
) -> Result<Json<ManagedAcl>, AdminError> {
    let id = parse_numeric_id(&id, "id")?;
    let (name, acl) = parse_form(form)?;

    if !state.acls.update_acl(&ctx.organization, id, &name, acl.clone()).await? {
        return Err(AdminError::not_found("ManagedAcl", id));
    }

    Ok(Json(ManagedAcl {
        id,
        name,
        organization: ctx.organization,
        acl,
    }))
}

/// Delete a managed ACL that no event or series references anymore
pub async fn delete_acl(
    State(state): State<AclsState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<StatusCode, AdminError> {
    let id = parse_numeric_id(&id, "id")?;
    if state.acls.managed_acl(&ctx.organization, id).await?.is_none() {
        return Err(AdminError::not_found("ManagedAcl", id));
    }

    if !state.acls.delete_acl(&ctx.organization, id).await? {
        return Err(AdminError::conflict(format!(
            "Managed ACL {} is still in use",
            id
        )));
    }

    info!(acl_id = id, deleted_by = %ctx.username, "Managed ACL deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Build managed ACL router
pub fn acls_router(state: AclsState) -> Router {
    Router::new()
        .route("/", post(create_acl))
        .route("/acls.json", get(list_acls))
        .route("/:id", get(get_acl).put(update_acl).delete(delete_acl))
        .with_state(state)
}
