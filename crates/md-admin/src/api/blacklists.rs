//! Blacklists Admin API
//!
//! Periods during which a person or a room is unavailable for recordings.
//! Every period is addressed by its own id; the blacklist owning it is an
//! implementation detail of participation management.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Form, Json, Router,
};
use chrono::{DateTime, Utc};
use md_common::{
    cmp_ignore_case, parse_sort, resolve_sort, sort_by_criteria, BulkOperationResult, PageWindow,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::info;

use crate::api::common::{
    non_blank, parse_id_array, parse_numeric_id, parse_timestamp, record_outcome, require,
};
use crate::api::middleware::RequestContext;
use crate::domain::{Blacklist, BlacklistType, Blacklisted, Period, Recording};
use crate::error::AdminError;
use crate::service::ParticipationDatabase;

/// Blacklist service state
#[derive(Clone)]
pub struct BlacklistsState {
    pub participation: Arc<dyn ParticipationDatabase>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BlacklistListParams {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
    pub purpose: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlacklistForm {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub blacklisted_id: Option<String>,
    pub blacklisted_ids: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub purpose: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountParams {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub blacklisted_id: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountsParams {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// JSON array of person or room ids
    pub blacklisted_ids: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

/// One blacklist period together with what it blacklists
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlacklistEntry {
    pub id: i64,
    pub blacklist_id: i64,
    pub resource_id: i64,
    pub resource_name: String,
    #[serde(rename = "type")]
    pub kind: BlacklistType,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub purpose: Option<String>,
    pub comment: Option<String>,
}

impl BlacklistEntry {
    fn new(blacklist: &Blacklist, period: &Period) -> Self {
        Self {
            id: period.id,
            blacklist_id: blacklist.id,
            resource_id: blacklist.blacklisted.id,
            resource_name: blacklist.blacklisted.name.clone(),
            kind: blacklist.blacklisted.kind,
            start: period.start,
            end: period.end,
            purpose: period.purpose.clone(),
            comment: period.comment.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountResponse {
    pub events: Vec<Recording>,
    pub events_count: usize,
}

/// Impact of blacklisting several resources over the same interval.
/// `eventsTotal` counts each recording once.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountsResponse {
    pub events_total: usize,
    pub results: BTreeMap<String, CountResponse>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlacklistSortField {
    Period,
    Purpose,
}

impl BlacklistSortField {
    fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "period" => Some(Self::Period),
            "purpose" => Some(Self::Purpose),
            _ => None,
        }
    }
}

fn parse_kind(value: Option<String>) -> Result<BlacklistType, AdminError> {
    let raw = require(value, "type")?;
    BlacklistType::parse(&raw).ok_or_else(|| {
        AdminError::validation(format!("Blacklist type must be 'person' or 'room', got '{}'", raw))
    })
}

/// Validated `[start, end]` of a period
fn parse_interval(
    start: Option<String>,
    end: Option<String>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), AdminError> {
    let start = parse_timestamp(&require(start, "start")?, "start")?;
    let end = parse_timestamp(&require(end, "end")?, "end")?;
    if start > end {
        return Err(AdminError::validation("The start date must not be after the end date"));
    }
    Ok((start, end))
}

async fn resolve_blacklisted(
    state: &BlacklistsState,
    kind: BlacklistType,
    id: i64,
) -> Result<Blacklisted, AdminError> {
    let name = match kind {
        BlacklistType::Person => state
            .participation
            .person(id)
            .await?
            .map(|p| p.name)
            .ok_or_else(|| AdminError::not_found("Person", id))?,
        BlacklistType::Room => state
            .participation
            .room(id)
            .await?
            .map(|r| r.name)
            .ok_or_else(|| AdminError::not_found("Room", id))?,
    };
    Ok(Blacklisted { id, name, kind })
}

/// Append a period to the blacklist of `(kind, id)`, creating the blacklist
/// on first use.
async fn add_period(
    state: &BlacklistsState,
    kind: BlacklistType,
    id: i64,
    period: Period,
) -> Result<BlacklistEntry, AdminError> {
    let blacklisted = resolve_blacklisted(state, kind, id).await?;
    let mut blacklist = state
        .participation
        .blacklist_for(kind, id)
        .await?
        .unwrap_or(Blacklist {
            id: 0,
            blacklisted,
            periods: Vec::new(),
        });

    let existing: HashSet<i64> = blacklist.periods.iter().map(|p| p.id).collect();
    blacklist.periods.push(period);
    let saved = state.participation.save_blacklist(blacklist).await?;

    let added = saved
        .periods
        .iter()
        .find(|p| !existing.contains(&p.id))
        .ok_or_else(|| AdminError::internal("Saved blacklist lost the new period"))?;
    Ok(BlacklistEntry::new(&saved, added))
}

async fn require_period(state: &BlacklistsState, raw_id: &str) -> Result<(Blacklist, i64), AdminError> {
    let period_id = parse_numeric_id(raw_id, "id")?;
    let blacklist = state
        .participation
        .blacklist_by_period(period_id)
        .await?
        .ok_or_else(|| AdminError::not_found("Blacklist period", period_id))?;
    Ok((blacklist, period_id))
}

fn new_period(form: &mut BlacklistForm) -> Result<Period, AdminError> {
    let (start, end) = parse_interval(form.start.take(), form.end.take())?;
    Ok(Period {
        id: 0,
        start,
        end,
        purpose: non_blank(form.purpose.take()),
        comment: non_blank(form.comment.take()),
    })
}

/// List the periods of all blacklists of one type
pub async fn list_blacklists(
    State(state): State<BlacklistsState>,
    Query(params): Query<BlacklistListParams>,
) -> Result<Json<Vec<BlacklistEntry>>, AdminError> {
    let kind = parse_kind(params.kind)?;
    let sort = resolve_sort(&parse_sort(params.sort.as_deref()), BlacklistSortField::parse)?;
    let window = PageWindow::new(params.limit.unwrap_or(0), params.offset.unwrap_or(0));

    let blacklists = state
        .participation
        .blacklists(kind, params.name.as_deref(), params.purpose.as_deref())
        .await?;
    let mut entries: Vec<BlacklistEntry> = blacklists
        .iter()
        .flat_map(|b| b.periods.iter().map(move |p| BlacklistEntry::new(b, p)))
        .collect();

    sort_by_criteria(&mut entries, &sort, |a, b, field| match field {
        BlacklistSortField::Period => a.start.cmp(&b.start).then(a.end.cmp(&b.end)),
        BlacklistSortField::Purpose => cmp_ignore_case(
            a.purpose.as_deref().unwrap_or_default(),
            b.purpose.as_deref().unwrap_or_default(),
        ),
    });

    Ok(Json(window.apply(entries)))
}

pub async fn get_period(
    State(state): State<BlacklistsState>,
    Path(id): Path<String>,
) -> Result<Json<BlacklistEntry>, AdminError> {
    let (blacklist, period_id) = require_period(&state, &id).await?;
    let period = blacklist
        .periods
        .iter()
        .find(|p| p.id == period_id)
        .ok_or_else(|| AdminError::not_found("Blacklist period", period_id))?;
    Ok(Json(BlacklistEntry::new(&blacklist, period)))
}

pub async fn update_period(
    State(state): State<BlacklistsState>,
    Path(id): Path<String>,
    Form(mut form): Form<BlacklistForm>,
) -> Result<Json<BlacklistEntry>, AdminError> {
    let (start, end) = parse_interval(form.start.take(), form.end.take())?;
    let (mut blacklist, period_id) = require_period(&state, &id).await?;

    let period = blacklist
        .periods
        .iter_mut()
        .find(|p| p.id == period_id)
        .ok_or_else(|| AdminError::not_found("Blacklist period", period_id))?;
    period.start = start;
    period.end = end;
    period.purpose = non_blank(form.purpose);
    period.comment = non_blank(form.comment);

    let saved = state.participation.save_blacklist(blacklist).await?;
    let period = saved
        .periods
        .iter()
        .find(|p| p.id == period_id)
        .ok_or_else(|| AdminError::internal("Saved blacklist lost the updated period"))?;
    Ok(Json(BlacklistEntry::new(&saved, period)))
}

/// Blacklist one person or room for a period
pub async fn create_period(
    State(state): State<BlacklistsState>,
    ctx: RequestContext,
    Form(mut form): Form<BlacklistForm>,
) -> Result<(StatusCode, Json<BlacklistEntry>), AdminError> {
    let kind = parse_kind(form.kind.take())?;
    let id = parse_numeric_id(&require(form.blacklisted_id.take(), "blacklistedId")?, "blacklistedId")?;
    let period = new_period(&mut form)?;

    let entry = add_period(&state, kind, id, period).await?;
    info!(
        period_id = entry.id,
        kind = kind.as_str(),
        resource_id = id,
        created_by = %ctx.username,
        "Blacklist period created"
    );
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Blacklist several people or rooms for the same period
pub async fn create_periods(
    State(state): State<BlacklistsState>,
    Form(mut form): Form<BlacklistForm>,
) -> Result<Json<BulkOperationResult>, AdminError> {
    let kind = parse_kind(form.kind.take())?;
    let ids = parse_id_array(&require(form.blacklisted_ids.take(), "blacklistedIds")?)?;
    let period = new_period(&mut form)?;

    let mut result = BulkOperationResult::new();
    for raw in ids {
        let outcome = match raw.trim().parse::<i64>() {
            Ok(id) => add_period(&state, kind, id, period.clone()).await.map(|_| ()),
            Err(_) => Err(AdminError::internal(format!("Invalid blacklisted id '{}'", raw))),
        };
        record_outcome(&mut result, &raw, outcome);
    }
    Ok(Json(result))
}

/// Recordings a prospective period would affect
pub async fn count_impacted(
    State(state): State<BlacklistsState>,
    Query(params): Query<CountParams>,
) -> Result<Json<CountResponse>, AdminError> {
    let kind = parse_kind(params.kind)?;
    let id = parse_numeric_id(&require(params.blacklisted_id, "blacklistedId")?, "blacklistedId")?;
    let (start, end) = parse_interval(params.start, params.end)?;

    let events = state
        .participation
        .impacted_recordings(kind, id, start, end)
        .await?;
    Ok(Json(CountResponse {
        events_count: events.len(),
        events,
    }))
}

/// Impacted recordings per blacklisted id; ids that are not numeric fail
/// the whole request, unknown ones report no impact.
pub async fn count_impacted_many(
    State(state): State<BlacklistsState>,
    Query(params): Query<CountsParams>,
) -> Result<Json<CountsResponse>, AdminError> {
    let ids = parse_id_array(params.blacklisted_ids.as_deref().unwrap_or_default())?;
    let (start, end) = parse_interval(params.start, params.end)?;
    let kind = parse_kind(params.kind)?;
    let numeric = ids
        .iter()
        .map(|id| parse_numeric_id(id, "blacklistedIds"))
        .collect::<Result<Vec<_>, _>>()?;

    let mut unique = HashSet::new();
    let mut results = BTreeMap::new();
    for (raw, id) in ids.into_iter().zip(numeric) {
        let events = match state.participation.impacted_recordings(kind, id, start, end).await {
            Ok(events) => events,
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => return Err(e),
        };
        unique.extend(events.iter().map(|r| r.id.clone()));
        results.insert(
            raw,
            CountResponse {
                events_count: events.len(),
                events,
            },
        );
    }

    Ok(Json(CountsResponse {
        events_total: unique.len(),
        results,
    }))
}

pub async fn delete_period(
    State(state): State<BlacklistsState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<StatusCode, AdminError> {
    let (_, period_id) = require_period(&state, &id).await?;
    state.participation.delete_period(period_id).await?;
    info!(period_id, deleted_by = %ctx.username, "Blacklist period deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Build blacklist router
pub fn blacklists_router(state: BlacklistsState) -> Router {
    Router::new()
        .route("/", post(create_period))
        .route("/blacklists.json", get(list_blacklists))
        .route("/blacklists", post(create_periods))
        .route("/blacklistCount", get(count_impacted))
        .route("/blacklistCounts", get(count_impacted_many))
        .route("/:id", get(get_period).put(update_period).delete(delete_period))
        .with_state(state)
}
