//! Users Admin API
//!
//! Accounts of the organization's user directory. Listing, filtering and
//! paging happen in memory on the directory's full user list.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Form, Json, Router,
};
use md_common::{
    cmp_ignore_case, contains_ignore_case, resolve_sort, sort_by_criteria, ListResponse,
};
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;

use crate::api::common::{non_blank, require, ListParams};
use crate::api::middleware::RequestContext;
use crate::domain::User;
use crate::error::AdminError;
use crate::service::UserDirectory;

/// Page size used when a client sends no positive limit
pub const DEFAULT_USER_LIMIT: i64 = 100;

/// Provider recorded for accounts created through this API
pub const LOCAL_PROVIDER: &str = "mediadesk";

const USER_FILTERS: &[&str] = &["name", "role", "provider", "textFilter"];

/// Users service state
#[derive(Clone)]
pub struct UsersState {
    pub users: Arc<dyn UserDirectory>,
}

#[derive(Debug, Deserialize)]
pub struct UserForm {
    pub username: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub roles: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UserSortField {
    Name,
    Username,
    Email,
    Roles,
    Provider,
}

impl UserSortField {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "name" => Some(Self::Name),
            "username" => Some(Self::Username),
            "email" => Some(Self::Email),
            "roles" => Some(Self::Roles),
            "provider" => Some(Self::Provider),
            _ => None,
        }
    }

    fn compare(&self, a: &User, b: &User) -> Ordering {
        match self {
            Self::Name => cmp_ignore_case(
                a.name.as_deref().unwrap_or_default(),
                b.name.as_deref().unwrap_or_default(),
            ),
            Self::Username => cmp_ignore_case(&a.username, &b.username),
            Self::Email => cmp_ignore_case(
                a.email.as_deref().unwrap_or_default(),
                b.email.as_deref().unwrap_or_default(),
            ),
            Self::Roles => cmp_ignore_case(&joined_roles(a), &joined_roles(b)),
            Self::Provider => cmp_ignore_case(&a.provider, &b.provider),
        }
    }
}

fn joined_roles(user: &User) -> String {
    user.roles.iter().cloned().collect::<Vec<_>>().join(",")
}

/// Roles arrive as a JSON array of role names or of `{"id": ...}` objects.
fn parse_roles(raw: &str) -> Result<BTreeSet<String>, AdminError> {
    let values: Vec<serde_json::Value> = serde_json::from_str(raw)
        .map_err(|e| AdminError::validation(format!("Unable to parse roles: {}", e)))?;

    values
        .into_iter()
        .map(|v| {
            let role = match &v {
                serde_json::Value::String(s) => Some(s.as_str()),
                serde_json::Value::Object(o) => o.get("id").and_then(|id| id.as_str()),
                _ => None,
            };
            role.map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string)
                .ok_or_else(|| AdminError::validation(format!("Invalid role entry {}", v)))
        })
        .collect()
}

/// List users
pub async fn list_users(
    State(state): State<UsersState>,
    ctx: RequestContext,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse<User>>, AdminError> {
    let filters = params.filters();
    filters.warn_unknown(USER_FILTERS);
    let sort = resolve_sort(&params.sort_criteria(), UserSortField::parse)?;
    let window = params.window().with_default_limit(DEFAULT_USER_LIMIT);

    let mut users: Vec<User> = state
        .users
        .users(&ctx.organization)
        .await?
        .into_iter()
        .filter(|u| {
            filters.get_trimmed("name").map_or(true, |name| {
                u.name.as_deref().is_some_and(|n| contains_ignore_case(n, name))
                    || contains_ignore_case(&u.username, name)
            })
        })
        .filter(|u| filters.get_trimmed("role").map_or(true, |role| u.has_role(role)))
        .filter(|u| {
            filters
                .get_trimmed("provider")
                .map_or(true, |p| u.provider.eq_ignore_ascii_case(p))
        })
        .filter(|u| {
            filters.get_trimmed("textFilter").map_or(true, |text| {
                contains_ignore_case(&u.username, text)
                    || u.name.as_deref().is_some_and(|n| contains_ignore_case(n, text))
                    || u.email.as_deref().is_some_and(|e| contains_ignore_case(e, text))
                    || u.roles.iter().any(|r| contains_ignore_case(r, text))
            })
        })
        .collect();

    sort_by_criteria(&mut users, &sort, |a, b, field| field.compare(a, b));
    let total = users.len() as u64;

    Ok(Json(ListResponse::new(
        window.apply(users),
        window.offset,
        window.limit,
        total,
    )))
}

/// Create a local user
pub async fn create_user(
    State(state): State<UsersState>,
    ctx: RequestContext,
    Form(form): Form<UserForm>,
) -> Result<(StatusCode, Json<User>), AdminError> {
    let username = require(form.username, "username")?;
    let password = require(form.password, "password")?;
    let roles = match non_blank(form.roles) {
        Some(raw) => parse_roles(&raw)?,
        None => BTreeSet::new(),
    };

    let mut user = User::new(&username, LOCAL_PROVIDER);
    user.name = non_blank(form.name);
    user.email = non_blank(form.email);
    user.roles = roles;
    user.password = Some(password);

    let created = state.users.create_user(&ctx.organization, user).await?;
    info!(username = %created.username, created_by = %ctx.username, "User created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// Get user by username
pub async fn get_user(
    State(state): State<UsersState>,
    ctx: RequestContext,
    Path(username): Path<String>,
) -> Result<Json<User>, AdminError> {
    let user = state
        .users
        .user(&ctx.organization, &username)
        .await?
        .ok_or_else(|| AdminError::not_found("User", &username))?;
    Ok(Json(user))
}

/// Update user
pub async fn update_user(
    State(state): State<UsersState>,
    ctx: RequestContext,
    Path(username): Path<String>,
    Form(form): Form<UserForm>,
) -> Result<Json<User>, AdminError> {
    let mut user = state
        .users
        .user(&ctx.organization, &username)
        .await?
        .ok_or_else(|| AdminError::not_found("User", &username))?;

    if let Some(name) = non_blank(form.name) {
        user.name = Some(name);
    }
    if let Some(email) = non_blank(form.email) {
        user.email = Some(email);
    }
    if let Some(password) = non_blank(form.password) {
        user.password = Some(password);
    }
    if let Some(raw) = non_blank(form.roles) {
        user.roles = parse_roles(&raw)?;
    }

    let updated = state.users.update_user(&ctx.organization, user).await?;
    info!(username = %updated.username, updated_by = %ctx.username, "User updated");
    Ok(Json(updated))
}

/// Delete user
pub async fn delete_user(
    State(state): State<UsersState>,
    ctx: RequestContext,
    Path(username): Path<String>,
) -> Result<StatusCode, AdminError> {
    if state.users.user(&ctx.organization, &username).await?.is_none() {
        return Err(AdminError::not_found("User", &username));
    }

    state.users.delete_user(&ctx.organization, &username).await?;
    info!(username = %username, deleted_by = %ctx.username, "User deleted");
    Ok(StatusCode::OK)
}

/// Build users router
pub fn users_router(state: UsersState) -> Router {
    Router::new()
        .route("/", post(create_user))
        .route("/users.json", get(list_users))
        .route("/:username", get(get_user).put(update_user).delete(delete_user))
        .with_state(state)
}
