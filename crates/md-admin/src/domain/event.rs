//! Recording Events
//!
//! Index view of an event, its comments and its scheduling data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle status as reported by the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    Scheduled,
    Recording,
    Ingesting,
    Processing,
    Processed,
    ProcessingFailure,
    ProcessingCanceled,
}

impl EventStatus {
    pub const ALL: [EventStatus; 7] = [
        EventStatus::Scheduled,
        EventStatus::Recording,
        EventStatus::Ingesting,
        EventStatus::Processing,
        EventStatus::Processed,
        EventStatus::ProcessingFailure,
        EventStatus::ProcessingCanceled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "SCHEDULED",
            Self::Recording => "RECORDING",
            Self::Ingesting => "INGESTING",
            Self::Processing => "PROCESSING",
            Self::Processed => "PROCESSED",
            Self::ProcessingFailure => "PROCESSING_FAILURE",
            Self::ProcessingCanceled => "PROCESSING_CANCELED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|st| st.as_str().eq_ignore_ascii_case(s.trim()))
    }

    /// Still moving through capture or the processing pipeline.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Recording | Self::Ingesting | Self::Processing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewStatus {
    #[default]
    Unsent,
    Unconfirmed,
    Confirmed,
}

impl ReviewStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "UNSENT" => Some(Self::Unsent),
            "UNCONFIRMED" => Some(Self::Unconfirmed),
            "CONFIRMED" => Some(Self::Confirmed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Publication {
    pub id: String,
    pub channel: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub organization: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub presenters: Vec<String>,
    #[serde(default)]
    pub technical_presenters: Vec<String>,
    #[serde(default)]
    pub contributors: Vec<String>,
    pub series_id: Option<String>,
    pub series_name: Option<String>,
    pub location: Option<String>,
    pub agent_id: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub technical_start: Option<DateTime<Utc>>,
    pub technical_end: Option<DateTime<Utc>>,
    pub status: EventStatus,
    #[serde(default)]
    pub review_status: ReviewStatus,
    #[serde(default)]
    pub opted_out: bool,
    #[serde(default)]
    pub has_comments: bool,
    #[serde(default)]
    pub has_open_comments: bool,
    #[serde(default)]
    pub publications: Vec<Publication>,
    /// Current workflow instance, if processing has started
    pub workflow_id: Option<i64>,
    pub managed_acl: Option<String>,
}

impl Event {
    pub fn new(id: impl Into<String>, organization: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            organization: organization.into(),
            title: title.into(),
            description: None,
            presenters: Vec::new(),
            technical_presenters: Vec::new(),
            contributors: Vec::new(),
            series_id: None,
            series_name: None,
            location: None,
            agent_id: None,
            start_date: None,
            end_date: None,
            technical_start: None,
            technical_end: None,
            status: EventStatus::Scheduled,
            review_status: ReviewStatus::default(),
            opted_out: false,
            has_comments: false,
            has_open_comments: false,
            publications: Vec::new(),
            workflow_id: None,
            managed_acl: None,
        }
    }

    pub fn with_presenters(mut self, presenters: Vec<String>) -> Self {
        self.technical_presenters = presenters.clone();
        self.presenters = presenters;
        self
    }

    pub fn with_series(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.series_id = Some(id.into());
        self.series_name = Some(name.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    /// Sets both the announced and the technical schedule.
    pub fn with_schedule(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self.technical_start = Some(start);
        self.technical_end = Some(end);
        self
    }

    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_workflow(mut self, workflow_id: i64) -> Self {
        self.workflow_id = Some(workflow_id);
        self
    }

    pub fn with_publication(mut self, publication: Publication) -> Self {
        self.publications.push(publication);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub event_id: String,
    pub text: String,
    pub reason: Option<String>,
    pub author: String,
    pub resolved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub replies: Vec<CommentReply>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentReply {
    pub id: i64,
    pub text: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(
        id: i64,
        event_id: impl Into<String>,
        text: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            event_id: event_id.into(),
            text: text.into(),
            reason: None,
            author: author.into(),
            resolved: false,
            created_at: now,
            updated_at: now,
            replies: Vec::new(),
        }
    }
}

/// Scheduling data held by the scheduler for one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalMetadata {
    pub event_id: String,
    pub agent_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub presenters: Vec<String>,
    #[serde(default)]
    pub capture_configuration: BTreeMap<String, String>,
    #[serde(default)]
    pub workflow_properties: BTreeMap<String, String>,
}

/// Partial update of [`TechnicalMetadata`]; absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingChange {
    pub agent_id: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub presenters: Option<Vec<String>>,
}

impl SchedulingChange {
    pub fn is_empty(&self) -> bool {
        self.agent_id.is_none() && self.start.is_none() && self.end.is_none() && self.presenters.is_none()
    }
}

/// An already scheduled event overlapping a requested slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledEvent {
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}
