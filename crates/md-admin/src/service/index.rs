//! Search index
//!
//! Read side for events, series and themes. The index filters, sorts and
//! pages natively, so list endpoints hand it the whole query.

use async_trait::async_trait;
use md_common::{DateRange, PageWindow, SortOrder};

use crate::domain::{Event, EventStatus, ReviewStatus, Series, Theme};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSortField {
    Title,
    Presenter,
    TechnicalStart,
    TechnicalEnd,
    Publication,
    StartDate,
    EndDate,
    SeriesName,
    Location,
    EventStatus,
}

impl EventSortField {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "title" => Some(Self::Title),
            "presenter" => Some(Self::Presenter),
            "technical_start" | "technical_date" => Some(Self::TechnicalStart),
            "technical_end" => Some(Self::TechnicalEnd),
            "publication" => Some(Self::Publication),
            "start_date" | "date" => Some(Self::StartDate),
            "end_date" => Some(Self::EndDate),
            "series_name" => Some(Self::SeriesName),
            "location" => Some(Self::Location),
            "event_status" => Some(Self::EventStatus),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentsFilter {
    None,
    Open,
    Resolved,
}

impl CommentsFilter {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "NONE" => Some(Self::None),
            "OPEN" => Some(Self::Open),
            "RESOLVED" => Some(Self::Resolved),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub organization: String,
    pub presenters: Option<String>,
    pub technical_presenters: Option<String>,
    pub contributors: Option<String>,
    pub location: Option<String>,
    pub agent_id: Option<String>,
    pub text: Option<String>,
    pub series_id: Option<String>,
    pub status: Option<EventStatus>,
    pub opted_out: Option<bool>,
    pub review_status: Option<ReviewStatus>,
    pub comments: Option<CommentsFilter>,
    pub start_range: Option<DateRange>,
    pub sort: Vec<(EventSortField, SortOrder)>,
    pub window: PageWindow,
}

impl EventQuery {
    pub fn for_organization(organization: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            ..Default::default()
        }
    }

    pub fn with_series(mut self, series_id: impl Into<String>) -> Self {
        self.series_id = Some(series_id.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesSortField {
    Title,
    Contributors,
    Creator,
    CreatedDateTime,
    ManagedAcl,
}

impl SeriesSortField {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "title" => Some(Self::Title),
            "contributors" => Some(Self::Contributors),
            "creator" => Some(Self::Creator),
            "createdDateTime" => Some(Self::CreatedDateTime),
            "managedAcl" => Some(Self::ManagedAcl),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SeriesQuery {
    pub organization: String,
    pub managed_acl: Option<String>,
    pub contributors: Option<String>,
    pub created_range: Option<DateRange>,
    pub creator: Option<String>,
    pub text: Option<String>,
    pub language: Option<String>,
    pub license: Option<String>,
    pub organizers: Option<String>,
    pub subject: Option<String>,
    pub title: Option<String>,
    pub theme_id: Option<i64>,
    pub sort: Vec<(SeriesSortField, SortOrder)>,
    pub window: PageWindow,
}

impl SeriesQuery {
    pub fn for_organization(organization: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            ..Default::default()
        }
    }

    pub fn with_theme(mut self, theme_id: i64) -> Self {
        self.theme_id = Some(theme_id);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeSortField {
    Name,
    Description,
    Creator,
    Default,
    CreationDate,
}

impl ThemeSortField {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "name" => Some(Self::Name),
            "description" => Some(Self::Description),
            "creator" => Some(Self::Creator),
            "default" => Some(Self::Default),
            "creation_date" => Some(Self::CreationDate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ThemeQuery {
    pub organization: String,
    pub creator: Option<String>,
    pub text: Option<String>,
    pub sort: Vec<(ThemeSortField, SortOrder)>,
    pub window: PageWindow,
}

/// One page of hits plus the number of hits before paging.
#[derive(Debug, Clone)]
pub struct SearchResult<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> SearchResult<T> {
    pub fn new(items: Vec<T>, total: u64) -> Self {
        Self { items, total }
    }
}

#[async_trait]
pub trait SearchIndex: Send + Sync {
    async fn search_events(&self, query: &EventQuery) -> Result<SearchResult<Event>>;

    async fn get_event(&self, organization: &str, id: &str) -> Result<Option<Event>>;

    async fn search_series(&self, query: &SeriesQuery) -> Result<SearchResult<Series>>;

    async fn get_series(&self, organization: &str, id: &str) -> Result<Option<Series>>;

    async fn search_themes(&self, query: &ThemeQuery) -> Result<SearchResult<Theme>>;
}

/// Write side for indexed entities.
#[async_trait]
pub trait IndexService: Send + Sync {
    /// Fails with `NotFound` when no trace of the event exists.
    async fn remove_event(&self, organization: &str, id: &str) -> Result<()>;

    async fn remove_series(&self, organization: &str, id: &str) -> Result<()>;

    async fn set_series_opt_out(&self, organization: &str, id: &str, opted_out: bool) -> Result<()>;
}
