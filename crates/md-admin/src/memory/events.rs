//! Comments, scheduling and workflow instances of events.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use md_common::contains_ignore_case;
use tracing::debug;

use super::MemoryStore;
use crate::domain::{
    Comment, CommentReply, EventStatus, Incident, ReviewStatus, ScheduledEvent, SchedulingChange, TechnicalMetadata,
    WorkflowAction, WorkflowInstance, WorkflowOperation, WorkflowState,
};
use crate::error::{AdminError, Result};
use crate::service::{
    CommentDraft, CommentService, SchedulerService, WorkflowQuery, WorkflowService,
};

impl MemoryStore {
    /// Recompute the comment flags the index keeps on the event.
    fn refresh_comment_flags(&self, event_id: &str) {
        let (has_comments, has_open) = {
            let comments = self.comments.read();
            let list = comments.get(event_id).map(Vec::as_slice).unwrap_or_default();
            (!list.is_empty(), list.iter().any(|c| !c.resolved))
        };
        if let Some(event) = self.events.write().get_mut(event_id) {
            event.has_comments = has_comments;
            event.has_open_comments = has_open;
        }
    }

    fn modify_comment(
        &self,
        event_id: &str,
        comment_id: i64,
        change: impl FnOnce(&mut Comment) -> Result<()>,
    ) -> Result<Comment> {
        let updated = {
            let mut comments = self.comments.write();
            let comment = comments
                .get_mut(event_id)
                .and_then(|list| list.iter_mut().find(|c| c.id == comment_id))
                .ok_or_else(|| AdminError::not_found("Comment", comment_id))?;
            change(comment)?;
            comment.updated_at = Utc::now();
            comment.clone()
        };
        self.refresh_comment_flags(event_id);
        Ok(updated)
    }

    fn scheduling_of(&self, event_id: &str) -> Result<TechnicalMetadata> {
        if let Some(metadata) = self.technical.read().get(event_id) {
            return Ok(metadata.clone());
        }

        let events = self.events.read();
        let event = events
            .get(event_id)
            .ok_or_else(|| AdminError::not_found("Event", event_id))?;
        let start = event.technical_start.or(event.start_date);
        let end = event.technical_end.or(event.end_date);
        match (&event.agent_id, start, end) {
            (Some(agent_id), Some(start), Some(end)) => Ok(TechnicalMetadata {
                event_id: event.id.clone(),
                agent_id: agent_id.clone(),
                start,
                end,
                presenters: event.technical_presenters.clone(),
                capture_configuration: Default::default(),
                workflow_properties: Default::default(),
            }),
            _ => Err(AdminError::not_found("TechnicalMetadata", event_id)),
        }
    }

    fn set_event_status(&self, event_id: &str, workflow_id: i64, status: EventStatus) {
        if let Some(event) = self.events.write().get_mut(event_id) {
            if event.workflow_id == Some(workflow_id) {
                event.status = status;
            }
        }
    }
}

#[async_trait]
impl CommentService for MemoryStore {
    async fn comments(&self, event_id: &str) -> Result<Vec<Comment>> {
        Ok(self.comments.read().get(event_id).cloned().unwrap_or_default())
    }

    async fn comment(&self, event_id: &str, comment_id: i64) -> Result<Option<Comment>> {
        Ok(self
            .comments
            .read()
            .get(event_id)
            .and_then(|list| list.iter().find(|c| c.id == comment_id))
            .cloned())
    }

    async fn add_comment(&self, event_id: &str, draft: CommentDraft) -> Result<Comment> {
        let mut comment = Comment::new(self.next_id(), event_id, draft.text, draft.author);
        comment.reason = draft.reason;
        comment.resolved = draft.resolved;

        self.comments
            .write()
            .entry(event_id.to_string())
            .or_default()
            .push(comment.clone());
        self.refresh_comment_flags(event_id);
        Ok(comment)
    }

    async fn update_comment(
        &self,
        event_id: &str,
        comment_id: i64,
        text: &str,
        reason: Option<&str>,
    ) -> Result<Comment> {
        self.modify_comment(event_id, comment_id, |c| {
            c.text = text.to_string();
            c.reason = reason.map(str::to_string);
            Ok(())
        })
    }

    async fn resolve_comment(&self, event_id: &str, comment_id: i64) -> Result<Comment> {
        self.modify_comment(event_id, comment_id, |c| {
            c.resolved = true;
            Ok(())
        })
    }

    async fn delete_comment(&self, event_id: &str, comment_id: i64) -> Result<()> {
        {
            let mut comments = self.comments.write();
            let list = comments
                .get_mut(event_id)
                .ok_or_else(|| AdminError::not_found("Comment", comment_id))?;
            let before = list.len();
            list.retain(|c| c.id != comment_id);
            if list.len() == before {
                return Err(AdminError::not_found("Comment", comment_id));
            }
        }
        self.refresh_comment_flags(event_id);
        Ok(())
    }

    async fn add_reply(
        &self,
        event_id: &str,
        comment_id: i64,
        text: &str,
        author: &str,
        resolve: bool,
    ) -> Result<Comment> {
        let id = self.next_id();
        self.modify_comment(event_id, comment_id, |c| {
            let now = Utc::now();
            c.resolved |= resolve;
            c.replies.push(CommentReply {
                id,
                text: text.to_string(),
                author: author.to_string(),
                created_at: now,
                updated_at: now,
            });
            Ok(())
        })
    }

    async fn update_reply(
        &self,
        event_id: &str,
        comment_id: i64,
        reply_id: i64,
        text: &str,
    ) -> Result<Comment> {
        self.modify_comment(event_id, comment_id, |c| {
            let reply = c
                .replies
                .iter_mut()
                .find(|r| r.id == reply_id)
                .ok_or_else(|| AdminError::not_found("CommentReply", reply_id))?;
            reply.text = text.to_string();
            reply.updated_at = Utc::now();
            Ok(())
        })
    }

    async fn delete_reply(
        &self,
        event_id: &str,
        comment_id: i64,
        reply_id: i64,
    ) -> Result<Comment> {
        self.modify_comment(event_id, comment_id, |c| {
            let before = c.replies.len();
            c.replies.retain(|r| r.id != reply_id);
            if c.replies.len() == before {
                return Err(AdminError::not_found("CommentReply", reply_id));
            }
            Ok(())
        })
    }
}

#[async_trait]
impl SchedulerService for MemoryStore {
    async fn technical_metadata(&self, event_id: &str) -> Result<TechnicalMetadata> {
        self.scheduling_of(event_id)
    }

    async fn update_scheduling(&self, event_id: &str, change: &SchedulingChange) -> Result<()> {
        let mut metadata = self.scheduling_of(event_id)?;
        if let Some(agent_id) = &change.agent_id {
            metadata.agent_id = agent_id.clone();
        }
        if let Some(start) = change.start {
            metadata.start = start;
        }
        if let Some(end) = change.end {
            metadata.end = end;
        }
        if let Some(presenters) = &change.presenters {
            metadata.presenters = presenters.clone();
        }
        if metadata.start > metadata.end {
            return Err(AdminError::validation("The end date is before the start date"));
        }

        if let Some(event) = self.events.write().get_mut(event_id) {
            event.agent_id = Some(metadata.agent_id.clone());
            event.technical_start = Some(metadata.start);
            event.technical_end = Some(metadata.end);
            event.technical_presenters = metadata.presenters.clone();
        }
        debug!(event_id, agent_id = %metadata.agent_id, "Scheduling updated");
        self.technical.write().insert(event_id.to_string(), metadata);
        Ok(())
    }

    async fn find_conflicts(
        &self,
        agent_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ScheduledEvent>> {
        let mut conflicts: Vec<ScheduledEvent> = self
            .events
            .read()
            .values()
            .filter(|e| e.agent_id.as_deref() == Some(agent_id))
            .filter_map(|e| {
                let s = e.technical_start.or(e.start_date)?;
                let f = e.technical_end.or(e.end_date)?;
                (s <= end && start <= f).then(|| ScheduledEvent {
                    id: e.id.clone(),
                    title: e.title.clone(),
                    start: s,
                    end: f,
                })
            })
            .collect();
        conflicts.sort_by_key(|c| c.start);
        Ok(conflicts)
    }

    async fn set_opt_out(&self, event_id: &str, opted_out: bool) -> Result<()> {
        let mut events = self.events.write();
        let event = events
            .get_mut(event_id)
            .ok_or_else(|| AdminError::not_found("Event", event_id))?;
        event.opted_out = opted_out;
        Ok(())
    }

    async fn set_review_status(&self, event_id: &str, status: ReviewStatus) -> Result<()> {
        let mut events = self.events.write();
        let event = events
            .get_mut(event_id)
            .ok_or_else(|| AdminError::not_found("Event", event_id))?;
        event.review_status = status;
        Ok(())
    }
}

fn instance_matches(instance: &WorkflowInstance, query: &WorkflowQuery) -> bool {
    if instance.organization != query.organization {
        return false;
    }
    if !query.states.is_empty() && !query.states.contains(&instance.state) {
        return false;
    }
    if query.excluded_states.contains(&instance.state) {
        return false;
    }
    if let Some(series_id) = &query.series_id {
        if instance.series_id.as_deref() != Some(series_id.as_str()) {
            return false;
        }
    }
    if let Some(event_id) = &query.event_id {
        if &instance.event_id != event_id {
            return false;
        }
    }
    query.text.as_ref().map_or(true, |text| {
        contains_ignore_case(&instance.title, text)
            || contains_ignore_case(&instance.creator, text)
            || contains_ignore_case(&instance.template, text)
            || instance
                .series_title
                .as_deref()
                .is_some_and(|t| contains_ignore_case(t, text))
    })
}

#[async_trait]
impl WorkflowService for MemoryStore {
    async fn instances(&self, query: &WorkflowQuery) -> Result<Vec<WorkflowInstance>> {
        Ok(self
            .workflows
            .read()
            .values()
            .filter(|w| instance_matches(w, query))
            .cloned()
            .collect())
    }

    async fn instances_for_event(&self, event_id: &str) -> Result<Vec<WorkflowInstance>> {
        Ok(self
            .workflows
            .read()
            .values()
            .filter(|w| w.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn instance(&self, id: i64) -> Result<Option<WorkflowInstance>> {
        Ok(self.workflows.read().get(&id).cloned())
    }

    async fn operations(&self, id: i64) -> Result<Vec<WorkflowOperation>> {
        if !self.workflows.read().contains_key(&id) {
            return Err(AdminError::not_found("WorkflowInstance", id));
        }
        Ok(self.operations.read().get(&id).cloned().unwrap_or_default())
    }

    async fn incidents(&self, id: i64) -> Result<Vec<Incident>> {
        if !self.workflows.read().contains_key(&id) {
            return Err(AdminError::not_found("WorkflowInstance", id));
        }
        Ok(self.incidents.read().get(&id).cloned().unwrap_or_default())
    }

    async fn has_active_workflow(&self, event_id: &str) -> Result<bool> {
        Ok(self
            .workflows
            .read()
            .values()
            .any(|w| w.event_id == event_id && w.state.is_active()))
    }

    async fn apply_action(&self, id: i64, action: WorkflowAction) -> Result<()> {
        let (event_id, status) = {
            let mut workflows = self.workflows.write();
            let instance = workflows
                .get_mut(&id)
                .ok_or_else(|| AdminError::not_found("WorkflowInstance", id))?;

            let (next, status) = match action {
                WorkflowAction::Stop if instance.state.is_active() => {
                    (WorkflowState::Stopped, EventStatus::ProcessingCanceled)
                }
                WorkflowAction::Retry | WorkflowAction::None
                    if matches!(instance.state, WorkflowState::Paused | WorkflowState::Failing) =>
                {
                    (WorkflowState::Running, EventStatus::Processing)
                }
                _ => {
                    return Err(AdminError::validation(format!(
                        "Action {:?} not allowed on workflow {} in state {}",
                        action,
                        id,
                        instance.state.as_str()
                    )))
                }
            };
            instance.state = next;
            (instance.event_id.clone(), status)
        };

        self.set_event_status(&event_id, id, status);
        Ok(())
    }

    async fn remove(&self, id: i64) -> Result<()> {
        if self.workflows.write().remove(&id).is_none() {
            return Err(AdminError::not_found("WorkflowInstance", id));
        }
        self.operations.write().remove(&id);
        self.incidents.write().remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    use crate::domain::Event;
    use crate::service::SearchIndex;

    fn instance(event_id: &str, state: WorkflowState) -> WorkflowInstance {
        WorkflowInstance {
            id: 0,
            event_id: event_id.to_string(),
            organization: "org".to_string(),
            title: "Lecture".to_string(),
            series_id: None,
            series_title: None,
            creator: "admin".to_string(),
            template: "schedule-and-upload".to_string(),
            state,
            submitted: Utc::now(),
        }
    }

    fn draft(text: &str, resolved: bool) -> CommentDraft {
        CommentDraft {
            text: text.to_string(),
            reason: None,
            resolved,
            author: "admin".to_string(),
        }
    }

    #[tokio::test]
    async fn test_comment_flags_follow_comments() {
        let store = MemoryStore::new();
        store.insert_event(Event::new("e1", "org", "Lecture"));

        let comment = store.add_comment("e1", draft("Audio missing", false)).await.unwrap();
        let event = store.get_event("org", "e1").await.unwrap().unwrap();
        assert!(event.has_comments && event.has_open_comments);

        store.resolve_comment("e1", comment.id).await.unwrap();
        let event = store.get_event("org", "e1").await.unwrap().unwrap();
        assert!(event.has_comments && !event.has_open_comments);

        store.delete_comment("e1", comment.id).await.unwrap();
        let event = store.get_event("org", "e1").await.unwrap().unwrap();
        assert!(!event.has_comments);
        assert!(store.delete_comment("e1", comment.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_reply_resolves_and_is_editable() {
        let store = MemoryStore::new();
        store.insert_event(Event::new("e1", "org", "Lecture"));
        let comment = store.add_comment("e1", draft("Audio missing", false)).await.unwrap();

        let updated = store
            .add_reply("e1", comment.id, "Fixed the mic", "tech", true)
            .await
            .unwrap();
        assert!(updated.resolved);
        assert_eq!(updated.replies.len(), 1);
        let event = store.get_event("org", "e1").await.unwrap().unwrap();
        assert!(!event.has_open_comments);

        let reply_id = updated.replies[0].id;
        let edited = store
            .update_reply("e1", comment.id, reply_id, "Replaced the mic")
            .await
            .unwrap();
        assert_eq!(edited.replies[0].text, "Replaced the mic");
        assert_eq!(edited.replies[0].author, "tech");

        let emptied = store.delete_reply("e1", comment.id, reply_id).await.unwrap();
        assert!(emptied.replies.is_empty());
        let err = store.delete_reply("e1", comment.id, reply_id).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_conflicts_on_same_agent() {
        let store = MemoryStore::new();
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        store.insert_event(
            Event::new("e1", "org", "Morning")
                .with_agent("room-1")
                .with_schedule(start, start + Duration::hours(1)),
        );
        store.insert_event(
            Event::new("e2", "org", "Other room")
                .with_agent("room-2")
                .with_schedule(start, start + Duration::hours(1)),
        );

        let hits = store
            .find_conflicts("room-1", start + Duration::minutes(30), start + Duration::hours(2))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "e1");

        let free = store
            .find_conflicts("room-1", start + Duration::hours(2), start + Duration::hours(3))
            .await
            .unwrap();
        assert!(free.is_empty());
    }

    #[tokio::test]
    async fn test_scheduling_requires_agent() {
        let store = MemoryStore::new();
        store.insert_event(Event::new("e1", "org", "Upload"));
        assert!(store.technical_metadata("e1").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_stop_and_retry_actions() {
        let store = MemoryStore::new();
        let running = store.insert_workflow(instance("e1", WorkflowState::Running));
        store.insert_event(
            Event::new("e1", "org", "Lecture")
                .with_status(EventStatus::Processing)
                .with_workflow(running.id),
        );

        assert!(store.has_active_workflow("e1").await.unwrap());
        assert!(store.apply_action(running.id, WorkflowAction::Retry).await.is_err());

        store.apply_action(running.id, WorkflowAction::Stop).await.unwrap();
        let event = store.get_event("org", "e1").await.unwrap().unwrap();
        assert_eq!(event.status, EventStatus::ProcessingCanceled);
        assert!(!store.has_active_workflow("e1").await.unwrap());

        let failing = store.insert_workflow(instance("e1", WorkflowState::Failing));
        store.apply_action(failing.id, WorkflowAction::Retry).await.unwrap();
        let state = store.instance(failing.id).await.unwrap().unwrap().state;
        assert_eq!(state, WorkflowState::Running);
    }
}
