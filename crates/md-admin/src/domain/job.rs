//! Jobs and Workflow Instances

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Operation name of the job that launches a workflow instance.
pub const START_WORKFLOW_OPERATION: &str = "START_WORKFLOW";
pub const WORKFLOW_JOB_TYPE: &str = "org.mediadesk.workflow";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Queued,
    Dispatching,
    Running,
    Paused,
    Finished,
    Failed,
    Canceled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Dispatching => "DISPATCHING",
            Self::Running => "RUNNING",
            Self::Paused => "PAUSED",
            Self::Finished => "FINISHED",
            Self::Failed => "FAILED",
            Self::Canceled => "CANCELED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i64,
    #[serde(rename = "type")]
    pub job_type: String,
    pub operation: String,
    pub status: JobStatus,
    pub creator: String,
    pub processing_host: Option<String>,
    pub processing_node: Option<String>,
    pub submitted: DateTime<Utc>,
    pub started: Option<DateTime<Utc>>,
}

impl Job {
    pub fn is_workflow_start(&self) -> bool {
        self.job_type == WORKFLOW_JOB_TYPE && self.operation == START_WORKFLOW_OPERATION
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowState {
    Instantiated,
    Running,
    Paused,
    Stopped,
    Succeeded,
    Failing,
    Failed,
}

impl WorkflowState {
    pub const ALL: [WorkflowState; 7] = [
        WorkflowState::Instantiated,
        WorkflowState::Running,
        WorkflowState::Paused,
        WorkflowState::Stopped,
        WorkflowState::Succeeded,
        WorkflowState::Failing,
        WorkflowState::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Instantiated => "INSTANTIATED",
            Self::Running => "RUNNING",
            Self::Paused => "PAUSED",
            Self::Stopped => "STOPPED",
            Self::Succeeded => "SUCCEEDED",
            Self::Failing => "FAILING",
            Self::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|st| st.as_str().eq_ignore_ascii_case(s.trim()))
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Instantiated | Self::Running | Self::Paused | Self::Failing)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowInstance {
    pub id: i64,
    pub event_id: String,
    pub organization: String,
    pub title: String,
    pub series_id: Option<String>,
    pub series_title: Option<String>,
    pub creator: String,
    /// Workflow definition the instance was started from
    pub template: String,
    pub state: WorkflowState,
    pub submitted: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationState {
    Instantiated,
    Running,
    Paused,
    Succeeded,
    Failed,
    Skipped,
    Retry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowOperation {
    pub position: u32,
    pub template: String,
    pub description: Option<String>,
    pub state: OperationState,
    pub started: Option<DateTime<Utc>>,
    pub completed: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentSeverity {
    Info,
    Warning,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: i64,
    pub job_id: i64,
    pub severity: IncidentSeverity,
    pub code: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

/// Action an operator can take on a running or failed workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowAction {
    Stop,
    Retry,
    /// Abort processing of the failed operation and continue
    None,
}

impl WorkflowAction {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "STOP" => Some(Self::Stop),
            "RETRY" => Some(Self::Retry),
            "NONE" => Some(Self::None),
            _ => None,
        }
    }
}
