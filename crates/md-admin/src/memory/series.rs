//! Series properties and access control lists.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::MemoryStore;
use crate::domain::{AccessControlEntry, AccessControlList, AclTransition, ManagedAcl};
use crate::error::{AdminError, Result};
use crate::service::{AclService, SeriesService, TransitionDraft, THEME_PROPERTY};

/// ACLs compare equal regardless of entry order.
fn same_entries(a: &AccessControlList, b: &AccessControlList) -> bool {
    let a: BTreeSet<(&str, &str, bool)> = a.entries.iter().map(entry_key).collect();
    let b: BTreeSet<(&str, &str, bool)> = b.entries.iter().map(entry_key).collect();
    a == b
}

fn entry_key(e: &AccessControlEntry) -> (&str, &str, bool) {
    (e.role.as_str(), e.action.as_str(), e.allow)
}

impl MemoryStore {
    fn require_series(&self, organization: Option<&str>, series_id: &str) -> Result<()> {
        let series = self.series.read();
        match series.get(series_id) {
            Some(s) if organization.map_or(true, |o| s.organization == o) => Ok(()),
            _ => Err(AdminError::not_found("Series", series_id)),
        }
    }

    /// Name of the managed ACL whose entries equal `acl`, if any.
    fn managed_name_for(&self, organization: &str, acl: &AccessControlList) -> Option<String> {
        self.managed_acls
            .read()
            .values()
            .find(|m| m.organization == organization && same_entries(&m.acl, acl))
            .map(|m| m.name.clone())
    }

    fn sync_theme_id(&self, series_id: &str, value: Option<&str>) {
        if let Some(series) = self.series.write().get_mut(series_id) {
            series.theme_id = value.and_then(|v| v.trim().parse().ok());
        }
    }
}

#[async_trait]
impl SeriesService for MemoryStore {
    async fn properties(&self, series_id: &str) -> Result<BTreeMap<String, String>> {
        self.require_series(None, series_id)?;
        Ok(self
            .series_properties
            .read()
            .get(series_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn property(&self, series_id: &str, name: &str) -> Result<Option<String>> {
        self.require_series(None, series_id)?;
        Ok(self
            .series_properties
            .read()
            .get(series_id)
            .and_then(|props| props.get(name))
            .cloned())
    }

    async fn update_property(&self, series_id: &str, name: &str, value: &str) -> Result<()> {
        self.require_series(None, series_id)?;
        self.series_properties
            .write()
            .entry(series_id.to_string())
            .or_default()
            .insert(name.to_string(), value.to_string());

        if name == THEME_PROPERTY {
            self.sync_theme_id(series_id, Some(value));
        }
        Ok(())
    }

    async fn delete_property(&self, series_id: &str, name: &str) -> Result<()> {
        self.require_series(None, series_id)?;
        let removed = self
            .series_properties
            .write()
            .get_mut(series_id)
            .and_then(|props| props.remove(name));
        if removed.is_none() {
            return Err(AdminError::not_found("SeriesProperty", name));
        }

        if name == THEME_PROPERTY {
            self.sync_theme_id(series_id, None);
        }
        Ok(())
    }
}

#[async_trait]
impl AclService for MemoryStore {
    async fn managed_acls(&self, organization: &str) -> Result<Vec<ManagedAcl>> {
        Ok(self
            .managed_acls
            .read()
            .values()
            .filter(|m| m.organization == organization)
            .cloned()
            .collect())
    }

    async fn managed_acl(&self, organization: &str, id: i64) -> Result<Option<ManagedAcl>> {
        Ok(self
            .managed_acls
            .read()
            .get(&id)
            .filter(|m| m.organization == organization)
            .cloned())
    }

    async fn create_acl(
        &self,
        organization: &str,
        name: &str,
        acl: AccessControlList,
    ) -> Result<Option<ManagedAcl>> {
        let mut acls = self.managed_acls.write();
        if acls
            .values()
            .any(|m| m.organization == organization && m.name == name)
        {
            return Ok(None);
        }

        let created = ManagedAcl {
            id: self.next_id(),
            name: name.to_string(),
            organization: organization.to_string(),
            acl,
        };
        acls.insert(created.id, created.clone());
        Ok(Some(created))
    }

    async fn update_acl(
        &self,
        organization: &str,
        id: i64,
        name: &str,
        acl: AccessControlList,
    ) -> Result<bool> {
        let previous_name = {
            let mut acls = self.managed_acls.write();
            if acls
                .values()
                .any(|m| m.organization == organization && m.name == name && m.id != id)
            {
                return Err(AdminError::duplicate("ManagedAcl", "name", name));
            }
            let Some(existing) = acls.get_mut(&id).filter(|m| m.organization == organization)
            else {
                return Ok(false);
            };
            existing.acl = acl;
            std::mem::replace(&mut existing.name, name.to_string())
        };

        if previous_name != name {
            let renamed = Some(name.to_string());
            for event in self.events.write().values_mut() {
                if event.organization == organization
                    && event.managed_acl.as_deref() == Some(previous_name.as_str())
                {
                    event.managed_acl = renamed.clone();
                }
            }
            for series in self.series.write().values_mut() {
                if series.organization == organization
                    && series.managed_acl.as_deref() == Some(previous_name.as_str())
                {
                    series.managed_acl = renamed.clone();
                }
            }
        }
        Ok(true)
    }

    async fn delete_acl(&self, organization: &str, id: i64) -> Result<bool> {
        let name = self
            .managed_acls
            .read()
            .get(&id)
            .filter(|m| m.organization == organization)
            .map(|m| m.name.clone())
            .ok_or_else(|| AdminError::not_found("ManagedAcl", id))?;

        let referenced = |managed: Option<&str>| managed == Some(name.as_str());
        let in_use = self
            .events
            .read()
            .values()
            .any(|e| e.organization == organization && referenced(e.managed_acl.as_deref()))
            || self
                .series
                .read()
                .values()
                .any(|s| s.organization == organization && referenced(s.managed_acl.as_deref()));
        if in_use {
            debug!(acl = %name, "Managed ACL still referenced");
            return Ok(false);
        }

        self.managed_acls.write().remove(&id);
        Ok(true)
    }

    async fn event_acl(&self, organization: &str, event_id: &str) -> Result<AccessControlList> {
        let series_id = {
            let events = self.events.read();
            let event = events
                .get(event_id)
                .filter(|e| e.organization == organization)
                .ok_or_else(|| AdminError::not_found("Event", event_id))?;
            event.series_id.clone()
        };

        if let Some(acl) = self.event_acls.read().get(event_id) {
            return Ok(acl.clone());
        }
        // Episodes without their own rules inherit the series ACL
        Ok(series_id
            .and_then(|s| self.series_acls.read().get(&s).cloned())
            .unwrap_or_default())
    }

    async fn apply_to_event(
        &self,
        organization: &str,
        event_id: &str,
        acl: AccessControlList,
    ) -> Result<()> {
        let managed = self.managed_name_for(organization, &acl);
        {
            let mut events = self.events.write();
            let event = events
                .get_mut(event_id)
                .filter(|e| e.organization == organization)
                .ok_or_else(|| AdminError::not_found("Event", event_id))?;
            event.managed_acl = managed;
        }
        self.event_acls.write().insert(event_id.to_string(), acl);
        Ok(())
    }

    async fn series_acl(&self, organization: &str, series_id: &str) -> Result<AccessControlList> {
        self.require_series(Some(organization), series_id)?;
        Ok(self
            .series_acls
            .read()
            .get(series_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn apply_to_series(
        &self,
        organization: &str,
        series_id: &str,
        acl: AccessControlList,
        override_episodes: bool,
    ) -> Result<()> {
        self.require_series(Some(organization), series_id)?;
        let managed = self.managed_name_for(organization, &acl);

        if let Some(series) = self.series.write().get_mut(series_id) {
            series.managed_acl = managed.clone();
        }
        self.series_acls
            .write()
            .insert(series_id.to_string(), acl.clone());

        if override_episodes {
            let episodes: Vec<String> = {
                let mut events = self.events.write();
                events
                    .values_mut()
                    .filter(|e| e.series_id.as_deref() == Some(series_id))
                    .map(|e| {
                        e.managed_acl = managed.clone();
                        e.id.clone()
                    })
                    .collect()
            };
            let mut event_acls = self.event_acls.write();
            for id in &episodes {
                event_acls.insert(id.clone(), acl.clone());
            }
            debug!(series_id, episodes = episodes.len(), "Series ACL pushed to episodes");
        }
        Ok(())
    }

    async fn transitions(&self, event_id: &str) -> Result<Vec<AclTransition>> {
        let mut transitions: Vec<AclTransition> = self
            .transitions
            .read()
            .values()
            .filter(|t| t.event_id == event_id)
            .cloned()
            .collect();
        transitions.sort_by_key(|t| t.application_date);
        Ok(transitions)
    }

    async fn add_transition(
        &self,
        event_id: &str,
        draft: TransitionDraft,
    ) -> Result<AclTransition> {
        let transition = AclTransition {
            id: self.next_id(),
            event_id: event_id.to_string(),
            acl_id: draft.acl_id,
            workflow_id: draft.workflow_id,
            application_date: draft.application_date,
        };
        self.transitions
            .write()
            .insert(transition.id, transition.clone());
        Ok(transition)
    }

    async fn update_transition(
        &self,
        event_id: &str,
        transition_id: i64,
        draft: TransitionDraft,
    ) -> Result<AclTransition> {
        let mut transitions = self.transitions.write();
        let transition = transitions
            .get_mut(&transition_id)
            .filter(|t| t.event_id == event_id)
            .ok_or_else(|| AdminError::not_found("AclTransition", transition_id))?;
        transition.acl_id = draft.acl_id;
        transition.workflow_id = draft.workflow_id;
        transition.application_date = draft.application_date;
        Ok(transition.clone())
    }

    async fn delete_transition(&self, event_id: &str, transition_id: i64) -> Result<()> {
        let mut transitions = self.transitions.write();
        if !transitions
            .get(&transition_id)
            .is_some_and(|t| t.event_id == event_id)
        {
            return Err(AdminError::not_found("AclTransition", transition_id));
        }
        transitions.remove(&transition_id);
        Ok(())
    }
}
