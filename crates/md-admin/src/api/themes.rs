//! Themes Admin API
//!
//! Themes are listed through the search index and stored in the themes
//! database. Series reference a theme through their `theme` property.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Form, Json, Router,
};
use md_common::{resolve_sort, ListResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::common::{non_blank, parse_bool, parse_numeric_id, require, ListParams};
use crate::api::middleware::RequestContext;
use crate::domain::Theme;
use crate::error::AdminError;
use crate::service::{
    SearchIndex, SeriesQuery, SeriesService, StaticFileService, ThemeQuery, ThemeSortField,
    ThemesDatabase, THEME_PROPERTY,
};

const THEME_FILTERS: &[&str] = &["creator", "textFilter"];

/// Themes service state
#[derive(Clone)]
pub struct ThemesState {
    pub index: Arc<dyn SearchIndex>,
    pub themes: Arc<dyn ThemesDatabase>,
    pub series: Arc<dyn SeriesService>,
    pub files: Arc<dyn StaticFileService>,
}

/// Absent fields are left unchanged on update
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub default: Option<String>,
    pub bumper_active: Option<String>,
    pub bumper_file: Option<String>,
    pub trailer_active: Option<String>,
    pub trailer_file: Option<String>,
    pub title_slide_active: Option<String>,
    pub title_slide_background: Option<String>,
    pub title_slide_metadata: Option<String>,
    pub license_slide_active: Option<String>,
    pub license_slide_background: Option<String>,
    pub license_slide_description: Option<String>,
    pub watermark_active: Option<String>,
    pub watermark_file: Option<String>,
    pub watermark_position: Option<String>,
}

impl ThemeForm {
    fn apply_to(self, theme: &mut Theme) -> Result<(), AdminError> {
        fn flag(value: Option<String>, field: &str, target: &mut bool) -> Result<(), AdminError> {
            if let Some(v) = non_blank(value) {
                *target = parse_bool(&v, field)?;
            }
            Ok(())
        }
        fn text(value: Option<String>, target: &mut Option<String>) {
            if let Some(v) = value {
                *target = non_blank(Some(v));
            }
        }

        if let Some(name) = non_blank(self.name) {
            theme.name = name;
        }
        text(self.description, &mut theme.description);
        flag(self.default, "default", &mut theme.is_default)?;
        flag(self.bumper_active, "bumperActive", &mut theme.bumper_active)?;
        text(self.bumper_file, &mut theme.bumper_file);
        flag(self.trailer_active, "trailerActive", &mut theme.trailer_active)?;
        text(self.trailer_file, &mut theme.trailer_file);
        flag(self.title_slide_active, "titleSlideActive", &mut theme.title_slide_active)?;
        text(self.title_slide_background, &mut theme.title_slide_background);
        text(self.title_slide_metadata, &mut theme.title_slide_metadata);
        flag(self.license_slide_active, "licenseSlideActive", &mut theme.license_slide_active)?;
        text(self.license_slide_background, &mut theme.license_slide_background);
        text(self.license_slide_description, &mut theme.license_slide_description);
        flag(self.watermark_active, "watermarkActive", &mut theme.watermark_active)?;
        text(self.watermark_file, &mut theme.watermark_file);
        text(self.watermark_position, &mut theme.watermark_position);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct SeriesUsage {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct ThemeUsageResponse {
    pub series: Vec<SeriesUsage>,
}

async fn require_theme(state: &ThemesState, ctx: &RequestContext, id: &str) -> Result<Theme, AdminError> {
    let id = parse_numeric_id(id, "id")?;
    state
        .themes
        .theme(&ctx.organization, id)
        .await?
        .ok_or_else(|| AdminError::not_found("Theme", id))
}

/// List themes
pub async fn list_themes(
    State(state): State<ThemesState>,
    ctx: RequestContext,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse<Theme>>, AdminError> {
    let filters = params.filters();
    filters.warn_unknown(THEME_FILTERS);

    let query = ThemeQuery {
        organization: ctx.organization.clone(),
        creator: filters.get_trimmed("creator").map(str::to_string),
        text: filters.get_trimmed("textFilter").map(str::to_string),
        sort: resolve_sort(&params.sort_criteria(), ThemeSortField::parse)?,
        window: params.window(),
    };
    let result = state.index.search_themes(&query).await?;

    Ok(Json(ListResponse::new(
        result.items,
        query.window.offset,
        query.window.limit,
        result.total,
    )))
}

/// Get theme by ID
pub async fn get_theme(
    State(state): State<ThemesState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<Theme>, AdminError> {
    Ok(Json(require_theme(&state, &ctx, &id).await?))
}

/// Series that currently use the theme
pub async fn get_usage(
    State(state): State<ThemesState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<ThemeUsageResponse>, AdminError> {
    let theme = require_theme(&state, &ctx, &id).await?;
    let series = state
        .index
        .search_series(&SeriesQuery::for_organization(&ctx.organization).with_theme(theme.id))
        .await?;

    Ok(Json(ThemeUsageResponse {
        series: series
            .items
            .into_iter()
            .map(|s| SeriesUsage { id: s.id, title: s.title })
            .collect(),
    }))
}

pub async fn create_theme(
    State(state): State<ThemesState>,
    ctx: RequestContext,
    Form(mut form): Form<ThemeForm>,
) -> Result<Json<Theme>, AdminError> {
    let name = require(form.name.take(), "name")?;

    let mut theme = Theme::new(name, &ctx.organization, &ctx.username);
    form.apply_to(&mut theme)?;

    let created = state.themes.save_theme(theme).await?;
    info!(theme_id = created.id, name = %created.name, "Theme created");
    Ok(Json(created))
}

pub async fn update_theme(
    State(state): State<ThemesState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Form(form): Form<ThemeForm>,
) -> Result<Json<Theme>, AdminError> {
    let mut theme = require_theme(&state, &ctx, &id).await?;
    form.apply_to(&mut theme)?;

    Ok(Json(state.themes.save_theme(theme).await?))
}

/// Delete a theme together with its static files and every series reference
pub async fn delete_theme(
    State(state): State<ThemesState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<StatusCode, AdminError> {
    let theme = require_theme(&state, &ctx, &id).await?;

    for file in theme.referenced_files() {
        match state.files.delete_file(&file).await {
            Err(e) if e.is_not_found() => warn!(file_id = %file, "Theme file already gone"),
            other => other?,
        }
    }

    state.themes.delete_theme(&ctx.organization, theme.id).await?;

    let referencing = state
        .index
        .search_series(&SeriesQuery::for_organization(&ctx.organization).with_theme(theme.id))
        .await?;
    for series in referencing.items {
        match state.series.delete_property(&series.id, THEME_PROPERTY).await {
            Err(e) if !e.is_not_found() => return Err(e),
            _ => {}
        }
    }

    info!(theme_id = theme.id, deleted_by = %ctx.username, "Theme deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Build themes router
pub fn themes_router(state: ThemesState) -> Router {
    Router::new()
        .route("/", post(create_theme))
        .route("/themes.json", get(list_themes))
        .route("/:id", get(get_theme).put(update_theme).delete(delete_theme))
        .route("/:id/usage.json", get(get_usage))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_only_touches_sent_fields() {
        let mut theme = Theme::new("Campus", "org", "admin");
        theme.bumper_file = Some("bumper-1".to_string());

        let form = ThemeForm {
            description: Some("Lecture branding".to_string()),
            watermark_active: Some("true".to_string()),
            trailer_file: Some(String::new()),
            ..Default::default()
        };
        form.apply_to(&mut theme).unwrap();

        assert_eq!(theme.name, "Campus");
        assert_eq!(theme.description.as_deref(), Some("Lecture branding"));
        assert!(theme.watermark_active);
        assert_eq!(theme.bumper_file.as_deref(), Some("bumper-1"));
        assert_eq!(theme.trailer_file, None);
    }

    #[test]
    fn test_form_rejects_bad_flag() {
        let mut theme = Theme::new("Campus", "org", "admin");
        let form = ThemeForm {
            bumper_active: Some("sometimes".to_string()),
            ..Default::default()
        };
        assert!(form.apply_to(&mut theme).is_err());
    }
}
