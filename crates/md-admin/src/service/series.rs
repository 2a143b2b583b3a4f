//! Series properties and access control.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::domain::{AccessControlList, AclTransition, ManagedAcl};
use crate::error::Result;

/// Property name under which a series stores its theme id.
pub const THEME_PROPERTY: &str = "theme";

#[async_trait]
pub trait SeriesService: Send + Sync {
    async fn properties(&self, series_id: &str) -> Result<BTreeMap<String, String>>;

    async fn property(&self, series_id: &str, name: &str) -> Result<Option<String>>;

    async fn update_property(&self, series_id: &str, name: &str, value: &str) -> Result<()>;

    async fn delete_property(&self, series_id: &str, name: &str) -> Result<()>;
}

/// Input for a new or replaced ACL transition.
#[derive(Debug, Clone)]
pub struct TransitionDraft {
    pub acl_id: Option<i64>,
    pub workflow_id: Option<String>,
    pub application_date: DateTime<Utc>,
}

#[async_trait]
pub trait AclService: Send + Sync {
    async fn managed_acls(&self, organization: &str) -> Result<Vec<ManagedAcl>>;

    async fn managed_acl(&self, organization: &str, id: i64) -> Result<Option<ManagedAcl>>;

    /// `None` when an ACL with this name already exists.
    async fn create_acl(
        &self,
        organization: &str,
        name: &str,
        acl: AccessControlList,
    ) -> Result<Option<ManagedAcl>>;

    /// `false` when the ACL does not exist, `Duplicate` when another ACL
    /// already carries the new name.
    async fn update_acl(
        &self,
        organization: &str,
        id: i64,
        name: &str,
        acl: AccessControlList,
    ) -> Result<bool>;

    /// `false` when the ACL is still referenced by events or series.
    async fn delete_acl(&self, organization: &str, id: i64) -> Result<bool>;

    async fn event_acl(&self, organization: &str, event_id: &str) -> Result<AccessControlList>;

    async fn apply_to_event(
        &self,
        organization: &str,
        event_id: &str,
        acl: AccessControlList,
    ) -> Result<()>;

    async fn series_acl(&self, organization: &str, series_id: &str) -> Result<AccessControlList>;

    /// With `override_episodes` the ACL is pushed down to every event of the series.
    async fn apply_to_series(
        &self,
        organization: &str,
        series_id: &str,
        acl: AccessControlList,
        override_episodes: bool,
    ) -> Result<()>;

    async fn transitions(&self, event_id: &str) -> Result<Vec<AclTransition>>;

    async fn add_transition(&self, event_id: &str, draft: TransitionDraft)
        -> Result<AclTransition>;

    /// `NotFound` unless the transition belongs to `event_id`.
    async fn update_transition(
        &self,
        event_id: &str,
        transition_id: i64,
        draft: TransitionDraft,
    ) -> Result<AclTransition>;

    async fn delete_transition(&self, event_id: &str, transition_id: i64) -> Result<()>;
}
