//! Event collaborators: comments, scheduler and workflow engine.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Comment, Incident, ReviewStatus, ScheduledEvent, SchedulingChange, TechnicalMetadata, WorkflowAction,
    WorkflowInstance, WorkflowOperation, WorkflowState,
};
use crate::error::Result;

/// Input for a new comment.
#[derive(Debug, Clone)]
pub struct CommentDraft {
    pub text: String,
    pub reason: Option<String>,
    pub resolved: bool,
    pub author: String,
}

#[async_trait]
pub trait CommentService: Send + Sync {
    async fn comments(&self, event_id: &str) -> Result<Vec<Comment>>;

    async fn comment(&self, event_id: &str, comment_id: i64) -> Result<Option<Comment>>;

    async fn add_comment(&self, event_id: &str, draft: CommentDraft) -> Result<Comment>;

    async fn update_comment(
        &self,
        event_id: &str,
        comment_id: i64,
        text: &str,
        reason: Option<&str>,
    ) -> Result<Comment>;

    async fn resolve_comment(&self, event_id: &str, comment_id: i64) -> Result<Comment>;

    async fn delete_comment(&self, event_id: &str, comment_id: i64) -> Result<()>;

    /// Append a reply, resolving the comment first when `resolve` is set.
    async fn add_reply(
        &self,
        event_id: &str,
        comment_id: i64,
        text: &str,
        author: &str,
        resolve: bool,
    ) -> Result<Comment>;

    async fn update_reply(
        &self,
        event_id: &str,
        comment_id: i64,
        reply_id: i64,
        text: &str,
    ) -> Result<Comment>;

    async fn delete_reply(&self, event_id: &str, comment_id: i64, reply_id: i64)
        -> Result<Comment>;
}

#[async_trait]
pub trait SchedulerService: Send + Sync {
    async fn technical_metadata(&self, event_id: &str) -> Result<TechnicalMetadata>;

    async fn update_scheduling(&self, event_id: &str, change: &SchedulingChange) -> Result<()>;

    /// Scheduled events on `agent_id` overlapping `[start, end]`.
    async fn find_conflicts(
        &self,
        agent_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ScheduledEvent>>;

    async fn set_opt_out(&self, event_id: &str, opted_out: bool) -> Result<()>;

    async fn set_review_status(&self, event_id: &str, status: ReviewStatus) -> Result<()>;
}

/// Instance filter for the task list.
#[derive(Debug, Clone, Default)]
pub struct WorkflowQuery {
    pub organization: String,
    pub states: Vec<WorkflowState>,
    pub excluded_states: Vec<WorkflowState>,
    pub text: Option<String>,
    pub series_id: Option<String>,
    pub event_id: Option<String>,
}

#[async_trait]
pub trait WorkflowService: Send + Sync {
    async fn instances(&self, query: &WorkflowQuery) -> Result<Vec<WorkflowInstance>>;

    async fn instances_for_event(&self, event_id: &str) -> Result<Vec<WorkflowInstance>>;

    async fn instance(&self, id: i64) -> Result<Option<WorkflowInstance>>;

    async fn operations(&self, id: i64) -> Result<Vec<WorkflowOperation>>;

    async fn incidents(&self, id: i64) -> Result<Vec<Incident>>;

    async fn has_active_workflow(&self, event_id: &str) -> Result<bool>;

    /// `Validation` when the instance's state does not allow the action.
    async fn apply_action(&self, id: i64, action: WorkflowAction) -> Result<()>;

    async fn remove(&self, id: i64) -> Result<()>;
}
