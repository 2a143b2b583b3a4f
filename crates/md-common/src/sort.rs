//! Sort string parsing
//!
//! Accepts `field1:ASC,field2:DESC` as well as the single-token form
//! `field_DESC`. Field names are not validated here; every endpoint owns its
//! set of sortable fields and resolves them with [`resolve_sort`].

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    /// Case-insensitive `ASC` / `DESC`. Anything else is ascending.
    pub fn from_token(token: &str) -> Self {
        if token.trim().eq_ignore_ascii_case("desc") {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        }
    }

    pub fn is_descending(self) -> bool {
        self == SortOrder::Descending
    }

    /// Orient an ascending comparison result.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }
}

/// One `(field, direction)` pair of a sort request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortCriterion {
    pub field: String,
    pub order: SortOrder,
}

impl SortCriterion {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }
}

/// Raised by [`resolve_sort`] for the first field an endpoint does not know.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown sort field: {0}")]
pub struct UnknownSortField(pub String);

/// Parse a `sort` query parameter, preserving input order. Never fails.
pub fn parse_sort(input: Option<&str>) -> Vec<SortCriterion> {
    let Some(input) = input else {
        return Vec::new();
    };

    input
        .split(',')
        .filter_map(|token| parse_token(token.trim()))
        .collect()
}

fn parse_token(token: &str) -> Option<SortCriterion> {
    if token.is_empty() {
        return None;
    }

    let (field, order) = match token.split_once(':') {
        Some((field, order)) => (field.trim(), SortOrder::from_token(order)),
        None => split_legacy_suffix(token),
    };

    if field.is_empty() {
        return None;
    }
    Some(SortCriterion::new(field, order))
}

// `title_DESC` / `title_ASC`
fn split_legacy_suffix(token: &str) -> (&str, SortOrder) {
    let upper = token.to_ascii_uppercase();
    if upper.ends_with("_DESC") {
        (&token[..token.len() - 5], SortOrder::Descending)
    } else if upper.ends_with("_ASC") {
        (&token[..token.len() - 4], SortOrder::Ascending)
    } else {
        (token, SortOrder::Ascending)
    }
}

/// Map parsed criteria onto an endpoint's own field type.
pub fn resolve_sort<F>(
    criteria: &[SortCriterion],
    lookup: impl Fn(&str) -> Option<F>,
) -> Result<Vec<(F, SortOrder)>, UnknownSortField> {
    criteria
        .iter()
        .map(|c| {
            lookup(&c.field)
                .map(|f| (f, c.order))
                .ok_or_else(|| UnknownSortField(c.field.clone()))
        })
        .collect()
}

/// Stable multi-key sort. Earlier criteria take precedence; `compare` returns
/// the ascending ordering of two items for one field.
pub fn sort_by_criteria<T, F>(
    items: &mut [T],
    criteria: &[(F, SortOrder)],
    compare: impl Fn(&T, &T, &F) -> Ordering,
) {
    if criteria.is_empty() {
        return;
    }

    items.sort_by(|a, b| {
        criteria
            .iter()
            .map(|(field, order)| order.apply(compare(a, b, field)))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}

pub fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}
