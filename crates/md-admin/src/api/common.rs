//! Common API types and utilities

use chrono::{DateTime, Utc};
use md_common::{parse_sort, BulkOperationResult, Filters, PageWindow, SortCriterion};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::{AdminError, Result};

/// Standard API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// `filter`, `sort`, `limit` and `offset` as accepted by every list endpoint
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub filter: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListParams {
    pub fn filters(&self) -> Filters {
        Filters::parse(self.filter.as_deref())
    }

    pub fn sort_criteria(&self) -> Vec<SortCriterion> {
        parse_sort(self.sort.as_deref())
    }

    pub fn window(&self) -> PageWindow {
        PageWindow::new(self.limit.unwrap_or(0), self.offset.unwrap_or(0))
    }
}

/// Parse a raw JSON array body such as `["a","b"]` or `[8, 9]` into string ids.
pub fn parse_id_array(body: &str) -> Result<Vec<String>> {
    if body.trim().is_empty() {
        return Err(AdminError::validation("Expected a JSON array of ids, got an empty body"));
    }

    let values: Vec<serde_json::Value> = serde_json::from_str(body)
        .map_err(|e| AdminError::validation(format!("Unable to parse id list: {}", e)))?;

    Ok(values
        .into_iter()
        .map(|v| match v {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
        .collect())
}

/// File the outcome of one bulk item into its bucket.
pub fn record_outcome(result: &mut BulkOperationResult, id: &str, outcome: Result<()>) {
    match outcome {
        Ok(()) => result.add_ok(id),
        Err(e) if e.is_not_found() => {
            warn!(id = %id, "Bulk item not found");
            result.add_not_found(id);
        }
        Err(e) if e.is_access_denied() => {
            warn!(id = %id, error = %e, "Bulk item refused");
            result.add_unauthorized(id);
        }
        Err(e) => {
            error!(id = %id, error = %e, "Bulk item failed");
            result.add_server_error(id);
        }
    }
}

/// A present, non-blank form field.
pub fn require(value: Option<String>, field: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AdminError::validation(format!("Missing required field '{}'", field)))
}

/// `None` for absent or blank values.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn parse_bool(value: &str, field: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(AdminError::validation(format!(
            "Invalid boolean '{}' for '{}'",
            value, field
        ))),
    }
}

/// Absent or blank means `default`.
pub fn parse_bool_or(value: Option<&str>, field: &str, default: bool) -> Result<bool> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => parse_bool(v, field),
        None => Ok(default),
    }
}

/// Numeric id from a path segment or form field.
pub fn parse_numeric_id(value: &str, field: &str) -> Result<i64> {
    value
        .trim()
        .parse()
        .map_err(|_| AdminError::validation(format!("Invalid id '{}' for '{}'", value, field)))
}

pub fn parse_timestamp(value: &str, field: &str) -> Result<DateTime<Utc>> {
    md_common::parse_utc(value)
        .map_err(|_| AdminError::validation(format!("Invalid date '{}' for '{}'", value, field)))
}

/// Split `a, b,,c` into `["a", "b", "c"]`.
pub fn split_comma(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
