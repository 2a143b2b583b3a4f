//! Index queries over the in-memory collections.

use async_trait::async_trait;
use md_common::{cmp_ignore_case, contains_ignore_case, sort_by_criteria};
use std::cmp::Ordering;
use tracing::debug;

use super::{any_eq_ignore_case, MemoryStore};
use crate::domain::{Event, Series, Theme};
use crate::error::{AdminError, Result};
use crate::service::{
    CommentsFilter, EventQuery, EventSortField, IndexService, SearchIndex, SearchResult,
    SeriesQuery, SeriesSortField, ThemeQuery, ThemeSortField,
};

fn eq_opt(value: Option<&str>, expected: &str) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case(expected))
}

fn text_opt(value: Option<&str>) -> &str {
    value.unwrap_or_default()
}

fn event_matches(event: &Event, q: &EventQuery) -> bool {
    if event.organization != q.organization {
        return false;
    }
    if let Some(p) = &q.presenters {
        if !any_eq_ignore_case(&event.presenters, p) {
            return false;
        }
    }
    if let Some(p) = &q.technical_presenters {
        if !any_eq_ignore_case(&event.technical_presenters, p) {
            return false;
        }
    }
    if let Some(c) = &q.contributors {
        if !any_eq_ignore_case(&event.contributors, c) {
            return false;
        }
    }
    if let Some(l) = &q.location {
        if !eq_opt(event.location.as_deref(), l) {
            return false;
        }
    }
    if let Some(a) = &q.agent_id {
        if event.agent_id.as_deref() != Some(a.as_str()) {
            return false;
        }
    }
    if let Some(s) = &q.series_id {
        if event.series_id.as_deref() != Some(s.as_str()) {
            return false;
        }
    }
    if q.status.is_some_and(|s| s != event.status) {
        return false;
    }
    if q.opted_out.is_some_and(|o| o != event.opted_out) {
        return false;
    }
    if q.review_status.is_some_and(|r| r != event.review_status) {
        return false;
    }
    match q.comments {
        Some(CommentsFilter::None) if event.has_comments => return false,
        Some(CommentsFilter::Open) if !event.has_open_comments => return false,
        Some(CommentsFilter::Resolved) if !event.has_comments || event.has_open_comments => {
            return false
        }
        _ => {}
    }
    if let Some(range) = &q.start_range {
        if !event.start_date.is_some_and(|d| range.contains(&d)) {
            return false;
        }
    }
    if let Some(text) = &q.text {
        let hit = contains_ignore_case(&event.title, text)
            || contains_ignore_case(text_opt(event.description.as_deref()), text)
            || contains_ignore_case(text_opt(event.series_name.as_deref()), text)
            || contains_ignore_case(text_opt(event.location.as_deref()), text)
            || event.presenters.iter().any(|p| contains_ignore_case(p, text));
        if !hit {
            return false;
        }
    }
    true
}

fn compare_events(a: &Event, b: &Event, field: &EventSortField) -> Ordering {
    match field {
        EventSortField::Title => cmp_ignore_case(&a.title, &b.title),
        EventSortField::Presenter => cmp_ignore_case(&a.presenters.join(", "), &b.presenters.join(", ")),
        EventSortField::TechnicalStart => a.technical_start.cmp(&b.technical_start),
        EventSortField::TechnicalEnd => a.technical_end.cmp(&b.technical_end),
        EventSortField::Publication => {
            let channels = |e: &Event| {
                e.publications
                    .iter()
                    .map(|p| p.channel.as_str())
                    .collect::<Vec<_>>()
                    .join(",")
            };
            cmp_ignore_case(&channels(a), &channels(b))
        }
        EventSortField::StartDate => a.start_date.cmp(&b.start_date),
        EventSortField::EndDate => a.end_date.cmp(&b.end_date),
        EventSortField::SeriesName => cmp_ignore_case(
            text_opt(a.series_name.as_deref()),
            text_opt(b.series_name.as_deref()),
        ),
        EventSortField::Location => cmp_ignore_case(
            text_opt(a.location.as_deref()),
            text_opt(b.location.as_deref()),
        ),
        EventSortField::EventStatus => a.status.as_str().cmp(b.status.as_str()),
    }
}

fn series_matches(series: &Series, q: &SeriesQuery) -> bool {
    if series.organization != q.organization {
        return false;
    }
    if let Some(acl) = &q.managed_acl {
        if series.managed_acl.as_deref() != Some(acl.as_str()) {
            return false;
        }
    }
    if let Some(c) = &q.contributors {
        if !any_eq_ignore_case(&series.contributors, c) {
            return false;
        }
    }
    if let Some(o) = &q.organizers {
        if !any_eq_ignore_case(&series.organizers, o) {
            return false;
        }
    }
    if let Some(c) = &q.creator {
        if !series.creator.eq_ignore_ascii_case(c) {
            return false;
        }
    }
    if let Some(t) = &q.title {
        if !series.title.eq_ignore_ascii_case(t) {
            return false;
        }
    }
    for (wanted, actual) in [
        (&q.language, &series.language),
        (&q.license, &series.license),
        (&q.subject, &series.subject),
    ] {
        if let Some(wanted) = wanted {
            if !eq_opt(actual.as_deref(), wanted) {
                return false;
            }
        }
    }
    if let Some(range) = &q.created_range {
        if !range.contains(&series.created_at) {
            return false;
        }
    }
    if q.theme_id.is_some() && q.theme_id != series.theme_id {
        return false;
    }
    if let Some(text) = &q.text {
        let hit = contains_ignore_case(&series.title, text)
            || contains_ignore_case(&series.creator, text)
            || contains_ignore_case(text_opt(series.description.as_deref()), text)
            || contains_ignore_case(text_opt(series.subject.as_deref()), text)
            || series
                .contributors
                .iter()
                .chain(series.organizers.iter())
                .any(|p| contains_ignore_case(p, text));
        if !hit {
            return false;
        }
    }
    true
}

fn compare_series(a: &Series, b: &Series, field: &SeriesSortField) -> Ordering {
    match field {
        SeriesSortField::Title => cmp_ignore_case(&a.title, &b.title),
        SeriesSortField::Contributors => {
            cmp_ignore_case(&a.contributors.join(", "), &b.contributors.join(", "))
        }
        SeriesSortField::Creator => cmp_ignore_case(&a.creator, &b.creator),
        SeriesSortField::CreatedDateTime => a.created_at.cmp(&b.created_at),
        SeriesSortField::ManagedAcl => cmp_ignore_case(
            text_opt(a.managed_acl.as_deref()),
            text_opt(b.managed_acl.as_deref()),
        ),
    }
}

fn compare_themes(a: &Theme, b: &Theme, field: &ThemeSortField) -> Ordering {
    match field {
        ThemeSortField::Name => cmp_ignore_case(&a.name, &b.name),
        ThemeSortField::Description => cmp_ignore_case(
            text_opt(a.description.as_deref()),
            text_opt(b.description.as_deref()),
        ),
        ThemeSortField::Creator => cmp_ignore_case(&a.creator, &b.creator),
        ThemeSortField::Default => a.is_default.cmp(&b.is_default),
        ThemeSortField::CreationDate => a.created_at.cmp(&b.created_at),
    }
}

/// Base order when no sort is requested.
fn by_id<T>(items: &mut [T], id: impl Fn(&T) -> &str) {
    items.sort_by(|a, b| id(a).cmp(id(b)));
}

#[async_trait]
impl SearchIndex for MemoryStore {
    async fn search_events(&self, query: &EventQuery) -> Result<SearchResult<Event>> {
        let mut hits: Vec<Event> = self
            .events
            .read()
            .values()
            .filter(|e| event_matches(e, query))
            .cloned()
            .collect();

        by_id(&mut hits, |e| e.id.as_str());
        sort_by_criteria(&mut hits, &query.sort, compare_events);
        let total = hits.len() as u64;
        debug!(total, "Event search");
        Ok(SearchResult::new(query.window.apply(hits), total))
    }

    async fn get_event(&self, organization: &str, id: &str) -> Result<Option<Event>> {
        Ok(self
            .events
            .read()
            .get(id)
            .filter(|e| e.organization == organization)
            .cloned())
    }

    async fn search_series(&self, query: &SeriesQuery) -> Result<SearchResult<Series>> {
        let mut hits: Vec<Series> = self
            .series
            .read()
            .values()
            .filter(|s| series_matches(s, query))
            .cloned()
            .collect();

        by_id(&mut hits, |s| s.id.as_str());
        sort_by_criteria(&mut hits, &query.sort, compare_series);
        let total = hits.len() as u64;
        Ok(SearchResult::new(query.window.apply(hits), total))
    }

    async fn get_series(&self, organization: &str, id: &str) -> Result<Option<Series>> {
        Ok(self
            .series
            .read()
            .get(id)
            .filter(|s| s.organization == organization)
            .cloned())
    }

    async fn search_themes(&self, query: &ThemeQuery) -> Result<SearchResult<Theme>> {
        let mut hits: Vec<Theme> = self
            .themes
            .read()
            .values()
            .filter(|t| t.organization == query.organization)
            .filter(|t| query.creator.as_ref().map_or(true, |c| t.creator.eq_ignore_ascii_case(c)))
            .filter(|t| {
                query.text.as_ref().map_or(true, |text| {
                    contains_ignore_case(&t.name, text)
                        || contains_ignore_case(&t.creator, text)
                        || contains_ignore_case(text_opt(t.description.as_deref()), text)
                })
            })
            .cloned()
            .collect();

        sort_by_criteria(&mut hits, &query.sort, compare_themes);
        let total = hits.len() as u64;
        Ok(SearchResult::new(query.window.apply(hits), total))
    }
}

#[async_trait]
impl IndexService for MemoryStore {
    async fn remove_event(&self, organization: &str, id: &str) -> Result<()> {
        {
            let mut events = self.events.write();
            match events.get(id) {
                Some(e) if e.organization == organization => {
                    events.remove(id);
                }
                _ => return Err(AdminError::not_found("Event", id)),
            }
        }

        self.comments.write().remove(id);
        self.technical.write().remove(id);
        self.event_acls.write().remove(id);

        let removed: Vec<i64> = {
            let mut workflows = self.workflows.write();
            let ids: Vec<i64> = workflows
                .values()
                .filter(|w| w.event_id == id)
                .map(|w| w.id)
                .collect();
            for wid in &ids {
                workflows.remove(wid);
            }
            ids
        };
        let mut operations = self.operations.write();
        let mut incidents = self.incidents.write();
        for wid in removed {
            operations.remove(&wid);
            incidents.remove(&wid);
        }
        Ok(())
    }

    async fn remove_series(&self, organization: &str, id: &str) -> Result<()> {
        {
            let mut series = self.series.write();
            match series.get(id) {
                Some(s) if s.organization == organization => {
                    series.remove(id);
                }
                _ => return Err(AdminError::not_found("Series", id)),
            }
        }

        self.series_properties.write().remove(id);
        self.series_acls.write().remove(id);
        Ok(())
    }

    async fn set_series_opt_out(&self, organization: &str, id: &str, opted_out: bool) -> Result<()> {
        let mut series = self.series.write();
        let entry = series
            .get_mut(id)
            .filter(|s| s.organization == organization)
            .ok_or_else(|| AdminError::not_found("Series", id))?;
        entry.opted_out = opted_out;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use md_common::{PageWindow, SortOrder};

    use crate::domain::EventStatus;

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        let day = |d| Utc.with_ymd_and_hms(2024, 3, d, 9, 0, 0).unwrap();
        store.insert_event(
            Event::new("e1", "org", "Beta lecture")
                .with_presenters(vec!["Ada".to_string()])
                .with_schedule(day(2), day(2)),
        );
        store.insert_event(
            Event::new("e2", "org", "alpha lecture")
                .with_status(EventStatus::Processing)
                .with_schedule(day(1), day(1)),
        );
        store.insert_event(Event::new("e3", "org", "Gamma talk").with_series("s1", "Physics"));
        store.insert_event(Event::new("x1", "other", "Foreign"));
        store
    }

    #[tokio::test]
    async fn test_search_filters_sorts_and_pages() {
        let store = store();
        let mut query = EventQuery::for_organization("org");
        query.text = Some("lecture".to_string());
        query.sort = vec![(EventSortField::Title, SortOrder::Ascending)];

        let result = store.search_events(&query).await.unwrap();
        assert_eq!(result.total, 2);
        let ids: Vec<_> = result.items.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e2", "e1"]);

        query.window = PageWindow::new(1, 1);
        let page = store.search_events(&query).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, "e1");
    }

    #[tokio::test]
    async fn test_search_by_status_and_series() {
        let store = store();
        let mut query = EventQuery::for_organization("org");
        query.status = Some(EventStatus::Processing);
        assert_eq!(store.search_events(&query).await.unwrap().total, 1);

        let by_series = store
            .search_events(&EventQuery::for_organization("org").with_series("s1"))
            .await
            .unwrap();
        assert_eq!(by_series.items[0].id, "e3");
    }

    #[tokio::test]
    async fn test_remove_event_checks_organization() {
        let store = store();
        assert!(store.remove_event("org", "x1").await.unwrap_err().is_not_found());
        store.remove_event("org", "e1").await.unwrap();
        assert!(store.get_event("org", "e1").await.unwrap().is_none());
        assert!(store.remove_event("org", "e1").await.unwrap_err().is_not_found());
    }
}
