//! API Middleware
//!
//! Resolves the organization and user a request acts for. Authentication
//! happens in the gateway in front of this service, which forwards the
//! principal in `X-Organization` / `X-User`.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::api::common::ApiError;

pub const ORGANIZATION_HEADER: &str = "x-organization";
pub const USER_HEADER: &str = "x-user";

/// Fallback principal, installed as a request extension by the admin router
#[derive(Debug, Clone)]
pub struct RequestDefaults {
    pub organization: String,
    pub username: String,
}

/// Organization and user of the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub organization: String,
    pub username: String,
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let defaults = parts.extensions.get::<RequestDefaults>().ok_or_else(|| {
            let error = ApiError {
                error: "INTERNAL_ERROR".to_string(),
                message: "Request defaults not configured".to_string(),
                details: None,
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
        })?;

        Ok(Self {
            organization: header_value(&parts.headers, ORGANIZATION_HEADER)
                .unwrap_or_else(|| defaults.organization.clone()),
            username: header_value(&parts.headers, USER_HEADER)
                .unwrap_or_else(|| defaults.username.clone()),
        })
    }
}
