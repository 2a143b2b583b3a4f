//! Series Admin API
//!
//! Series listing and removal, opt-out, access control, properties and the
//! theme assigned to a series.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Form, Json, Router,
};
use md_common::{parse_date_range, resolve_sort, BulkOperationResult, ListResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::api::common::{parse_bool, parse_bool_or, parse_id_array, record_outcome, require, ListParams};
use crate::api::events::{AccessResponse, ManagedAclSummary};
use crate::api::middleware::RequestContext;
use crate::domain::{AccessControlList, Series, Theme};
use crate::error::AdminError;
use crate::service::{
    AclService, EventQuery, IndexService, SearchIndex, SeriesQuery, SeriesService, SeriesSortField,
    ThemesDatabase, THEME_PROPERTY,
};

/// Page size used when a client asks for `limit=0`
pub const DEFAULT_SERIES_LIMIT: i64 = 100;

const SERIES_FILTERS: &[&str] = &[
    "managedAcl",
    "contributors",
    "creationDate",
    "creator",
    "textFilter",
    "language",
    "license",
    "organizers",
    "subject",
    "title",
];

/// Series service state
#[derive(Clone)]
pub struct SeriesState {
    pub index: Arc<dyn SearchIndex>,
    pub index_service: Arc<dyn IndexService>,
    pub series: Arc<dyn SeriesService>,
    pub acls: Arc<dyn AclService>,
    pub themes: Arc<dyn ThemesDatabase>,
}

#[derive(Debug, Deserialize)]
pub struct SeriesAccessForm {
    pub acl: Option<String>,
    #[serde(rename = "override")]
    pub override_episodes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PropertyForm {
    pub name: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeForm {
    pub theme_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SeriesThemeResponse {
    pub id: i64,
    pub name: String,
}

impl From<Theme> for SeriesThemeResponse {
    fn from(t: Theme) -> Self {
        Self { id: t.id, name: t.name }
    }
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(str::to_string)
}

async fn require_series(state: &SeriesState, ctx: &RequestContext, id: &str) -> Result<Series, AdminError> {
    state
        .index
        .get_series(&ctx.organization, id)
        .await?
        .ok_or_else(|| AdminError::not_found("Series", id))
}

fn build_series_query(ctx: &RequestContext, params: &ListParams) -> Result<SeriesQuery, AdminError> {
    let filters = params.filters();
    filters.warn_unknown(SERIES_FILTERS);

    let mut query = SeriesQuery::for_organization(&ctx.organization);
    query.managed_acl = owned(filters.get_trimmed("managedAcl"));
    query.contributors = owned(filters.get_trimmed("contributors"));
    query.creator = owned(filters.get_trimmed("creator"));
    query.text = owned(filters.get_trimmed("textFilter"));
    query.language = owned(filters.get_trimmed("language"));
    query.license = owned(filters.get_trimmed("license"));
    query.organizers = owned(filters.get_trimmed("organizers"));
    query.subject = owned(filters.get_trimmed("subject"));
    query.title = owned(filters.get_trimmed("title"));
    if let Some(v) = filters.get_trimmed("creationDate") {
        query.created_range = Some(parse_date_range(v)?);
    }

    query.sort = resolve_sort(&params.sort_criteria(), SeriesSortField::parse)?;
    query.window = params.window().with_default_limit(DEFAULT_SERIES_LIMIT);
    Ok(query)
}

/// List series
pub async fn list_series(
    State(state): State<SeriesState>,
    ctx: RequestContext,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse<Series>>, AdminError> {
    let query = build_series_query(&ctx, &params)?;
    let result = state.index.search_series(&query).await?;

    Ok(Json(ListResponse::new(
        result.items,
        query.window.offset,
        query.window.limit,
        result.total,
    )))
}

pub async fn get_series(
    State(state): State<SeriesState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<Series>, AdminError> {
    Ok(Json(require_series(&state, &ctx, &id).await?))
}

pub async fn delete_series(
    State(state): State<SeriesState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<StatusCode, AdminError> {
    state.index_service.remove_series(&ctx.organization, &id).await?;
    info!(series_id = %id, user = %ctx.username, "Series deleted");
    Ok(StatusCode::OK)
}

/// Delete a JSON list of series
pub async fn delete_many_series(
    State(state): State<SeriesState>,
    ctx: RequestContext,
    body: String,
) -> Result<Json<BulkOperationResult>, AdminError> {
    let ids = parse_id_array(&body)?;

    let mut result = BulkOperationResult::new();
    for id in ids {
        let outcome = state.index_service.remove_series(&ctx.organization, &id).await;
        record_outcome(&mut result, &id, outcome);
    }
    Ok(Json(result))
}

/// Opt a JSON list of series in or out of recording
pub async fn opt_out_series(
    State(state): State<SeriesState>,
    ctx: RequestContext,
    Path(optout): Path<String>,
    body: String,
) -> Result<Json<BulkOperationResult>, AdminError> {
    let optout = parse_bool(&optout, "optout")?;
    let ids = parse_id_array(&body)?;

    let mut result = BulkOperationResult::new();
    for id in ids {
        let outcome = state
            .index_service
            .set_series_opt_out(&ctx.organization, &id, optout)
            .await;
        record_outcome(&mut result, &id, outcome);
    }
    Ok(Json(result))
}

pub async fn get_access(
    State(state): State<SeriesState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<AccessResponse>, AdminError> {
    let series = require_series(&state, &ctx, &id).await?;
    let acl = state.acls.series_acl(&ctx.organization, &id).await?;
    let managed_acls = state
        .acls
        .managed_acls(&ctx.organization)
        .await?
        .into_iter()
        .map(|m| ManagedAclSummary { id: m.id, name: m.name })
        .collect();

    Ok(Json(AccessResponse {
        acl,
        current_managed_acl: series.managed_acl,
        managed_acls,
    }))
}

/// Apply an ACL to a series, optionally pushing it down to its events.
///
/// Refused with 409 while any event of the series is still being processed.
pub async fn apply_access(
    State(state): State<SeriesState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Form(form): Form<SeriesAccessForm>,
) -> Result<StatusCode, AdminError> {
    let raw = require(form.acl, "acl")?;
    let acl = AccessControlList::parse_json(&raw).map_err(AdminError::validation)?;
    let override_episodes = parse_bool_or(form.override_episodes.as_deref(), "override", false)?;
    require_series(&state, &ctx, &id).await?;

    let events = state
        .index
        .search_events(&EventQuery::for_organization(&ctx.organization).with_series(&id))
        .await?;
    let processing: Vec<String> = events
        .items
        .into_iter()
        .filter(|e| e.status.is_active())
        .map(|e| e.id)
        .collect();
    if !processing.is_empty() {
        return Err(AdminError::conflict_with(
            format!("Series {} has events that are still being processed", id),
            json!({ "events": processing }),
        ));
    }

    state
        .acls
        .apply_to_series(&ctx.organization, &id, acl, override_episodes)
        .await?;
    info!(series_id = %id, override_episodes, "Series access updated");
    Ok(StatusCode::OK)
}

pub async fn get_properties(
    State(state): State<SeriesState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<BTreeMap<String, String>>, AdminError> {
    require_series(&state, &ctx, &id).await?;
    Ok(Json(state.series.properties(&id).await?))
}

pub async fn get_property(
    State(state): State<SeriesState>,
    ctx: RequestContext,
    Path((id, name)): Path<(String, String)>,
) -> Result<Json<String>, AdminError> {
    require_series(&state, &ctx, &id).await?;
    let value = state
        .series
        .property(&id, &name)
        .await?
        .ok_or_else(|| AdminError::not_found("Series property", &name))?;
    Ok(Json(value))
}

pub async fn update_property(
    State(state): State<SeriesState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Form(form): Form<PropertyForm>,
) -> Result<StatusCode, AdminError> {
    let name = require(form.name, "name")?;
    let value = form.value.unwrap_or_default();
    require_series(&state, &ctx, &id).await?;

    state.series.update_property(&id, &name, &value).await?;
    Ok(StatusCode::OK)
}

pub async fn delete_property(
    State(state): State<SeriesState>,
    ctx: RequestContext,
    Path((id, name)): Path<(String, String)>,
) -> Result<StatusCode, AdminError> {
    require_series(&state, &ctx, &id).await?;
    state.series.delete_property(&id, &name).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Theme of a series, `{}` when none is set
pub async fn get_theme(
    State(state): State<SeriesState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AdminError> {
    require_series(&state, &ctx, &id).await?;

    let Some(theme_id) = state.series.property(&id, THEME_PROPERTY).await? else {
        return Ok(Json(json!({})));
    };
    // A stale or malformed theme reference reads as "no theme"
    let Ok(theme_id) = theme_id.parse::<i64>() else {
        return Ok(Json(json!({})));
    };

    match state.themes.theme(&ctx.organization, theme_id).await? {
        Some(theme) => Ok(Json(serde_json::to_value(SeriesThemeResponse::from(theme))?)),
        None => Ok(Json(json!({}))),
    }
}

pub async fn update_theme(
    State(state): State<SeriesState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Form(form): Form<ThemeForm>,
) -> Result<Json<SeriesThemeResponse>, AdminError> {
    let raw = require(form.theme_id, "themeId")?;
    let theme_id: i64 = raw
        .parse()
        .map_err(|_| AdminError::validation(format!("Invalid theme id '{}'", raw)))?;
    require_series(&state, &ctx, &id).await?;

    let theme = state
        .themes
        .theme(&ctx.organization, theme_id)
        .await?
        .ok_or_else(|| AdminError::not_found("Theme", theme_id))?;

    state
        .series
        .update_property(&id, THEME_PROPERTY, &theme_id.to_string())
        .await?;
    Ok(Json(theme.into()))
}

pub async fn delete_theme(
    State(state): State<SeriesState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<StatusCode, AdminError> {
    require_series(&state, &ctx, &id).await?;

    match state.series.delete_property(&id, THEME_PROPERTY).await {
        Err(e) if !e.is_not_found() => Err(e),
        _ => Ok(StatusCode::NO_CONTENT),
    }
}

/// Build series router
pub fn series_router(state: SeriesState) -> Router {
    Router::new()
        .route("/series.json", get(list_series))
        .route("/deleteSeries", post(delete_many_series))
        .route("/optOutSeries/:optout", post(opt_out_series))
        .route("/:id", get(get_series).delete(delete_series))
        .route("/:id/access.json", get(get_access))
        .route("/:id/access", post(apply_access))
        .route("/:id/properties", get(get_properties))
        .route("/:id/property", post(update_property))
        .route("/:id/property/:name", get(get_property).delete(delete_property))
        .route("/:id/theme.json", get(get_theme))
        .route("/:id/theme", put(update_theme).delete(delete_theme))
        .with_state(state)
}
