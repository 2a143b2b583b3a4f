//! In-memory backends
//!
//! A single [`MemoryStore`] implements every collaborator trait. It backs the
//! stand-alone server and the tests. State lives behind `parking_lot` locks
//! and no lock is held across an `.await`.

mod directory;
mod events;
mod index;
mod mail;
mod registry;
mod seed;
mod series;
mod themes;

use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::api::AdminServices;
use crate::domain::{
    AccessControlList, AclTransition, Blacklist, CaptureAgent, Comment, EmailConfiguration, Event,
    Group, Incident, Job, Mail, ManagedAcl, MessageSignature, MessageTemplate, Person, Recording,
    Room, Series, TechnicalMetadata, Theme, User, WorkflowInstance, WorkflowOperation,
};

pub use seed::seed_demo_data;

/// In-process implementation of all collaborator services
#[derive(Default)]
pub struct MemoryStore {
    /// Events by id
    pub(crate) events: RwLock<HashMap<String, Event>>,
    /// Series by id
    pub(crate) series: RwLock<HashMap<String, Series>>,
    pub(crate) series_properties: RwLock<HashMap<String, BTreeMap<String, String>>>,
    pub(crate) event_acls: RwLock<HashMap<String, AccessControlList>>,
    pub(crate) series_acls: RwLock<HashMap<String, AccessControlList>>,
    pub(crate) managed_acls: RwLock<BTreeMap<i64, ManagedAcl>>,
    pub(crate) transitions: RwLock<BTreeMap<i64, AclTransition>>,

    /// Comments by event id
    pub(crate) comments: RwLock<HashMap<String, Vec<Comment>>>,
    /// Scheduler data that differs from what the event itself carries
    pub(crate) technical: RwLock<HashMap<String, TechnicalMetadata>>,

    pub(crate) workflows: RwLock<BTreeMap<i64, WorkflowInstance>>,
    pub(crate) operations: RwLock<HashMap<i64, Vec<WorkflowOperation>>>,
    pub(crate) incidents: RwLock<HashMap<i64, Vec<Incident>>>,

    /// Users keyed by `(organization, username)`
    pub(crate) users: RwLock<BTreeMap<(String, String), User>>,
    /// Groups keyed by `(organization, id)`
    pub(crate) groups: RwLock<BTreeMap<(String, String), Group>>,

    pub(crate) themes: RwLock<BTreeMap<i64, Theme>>,
    pub(crate) static_files: RwLock<BTreeSet<String>>,

    pub(crate) templates: RwLock<BTreeMap<i64, MessageTemplate>>,
    pub(crate) signatures: RwLock<BTreeMap<i64, MessageSignature>>,
    /// Every mail handed to the transport, oldest first
    pub(crate) outbox: RwLock<Vec<Mail>>,
    pub(crate) mail_config: RwLock<EmailConfiguration>,
    pub(crate) persons: RwLock<BTreeMap<i64, Person>>,
    pub(crate) rooms: RwLock<BTreeMap<i64, Room>>,
    pub(crate) recordings: RwLock<Vec<Recording>>,
    pub(crate) blacklists: RwLock<BTreeMap<i64, Blacklist>>,

    pub(crate) jobs: RwLock<Vec<Job>>,
    pub(crate) agents: RwLock<BTreeMap<String, CaptureAgent>>,

    /// Id sequence shared by every numeric entity
    sequence: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> i64 {
        self.sequence.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Wire the store in as every collaborator of the admin API.
    pub fn services(self: &Arc<Self>) -> AdminServices {
        AdminServices {
            index: self.clone(),
            index_service: self.clone(),
            comments: self.clone(),
            scheduler: self.clone(),
            workflows: self.clone(),
            series: self.clone(),
            acls: self.clone(),
            users: self.clone(),
            groups: self.clone(),
            themes: self.clone(),
            files: self.clone(),
            mail: self.clone(),
            participation: self.clone(),
            registry: self.clone(),
            agents: self.clone(),
        }
    }

    pub fn insert_event(&self, event: Event) {
        self.events.write().insert(event.id.clone(), event);
    }

    pub fn insert_series(&self, series: Series) {
        if let Some(theme_id) = series.theme_id {
            self.series_properties
                .write()
                .entry(series.id.clone())
                .or_default()
                .insert(crate::service::THEME_PROPERTY.to_string(), theme_id.to_string());
        }
        self.series.write().insert(series.id.clone(), series);
    }

    /// Store a workflow instance; an id of zero is replaced by a fresh one.
    pub fn insert_workflow(&self, mut instance: WorkflowInstance) -> WorkflowInstance {
        if instance.id == 0 {
            instance.id = self.next_id();
        }
        self.workflows.write().insert(instance.id, instance.clone());
        instance
    }

    pub fn insert_operations(&self, workflow_id: i64, operations: Vec<WorkflowOperation>) {
        self.operations.write().insert(workflow_id, operations);
    }

    pub fn insert_incident(&self, workflow_id: i64, incident: Incident) {
        self.incidents.write().entry(workflow_id).or_default().push(incident);
    }

    pub fn insert_user(&self, organization: &str, user: User) {
        self.users
            .write()
            .insert((organization.to_string(), user.username.clone()), user);
    }

    pub fn insert_person(&self, person: Person) {
        self.persons.write().insert(person.id, person);
    }

    pub fn insert_room(&self, room: Room) {
        self.rooms.write().insert(room.id, room);
    }

    pub fn insert_recording(&self, recording: Recording) {
        self.recordings.write().push(recording);
    }

    pub fn insert_job(&self, job: Job) {
        self.jobs.write().push(job);
    }

    pub fn insert_agent(&self, agent: CaptureAgent) {
        self.agents.write().insert(agent.name.clone(), agent);
    }

    /// Store a message template; an id of zero is replaced by a fresh one.
    pub fn insert_template(&self, mut template: MessageTemplate) -> MessageTemplate {
        if template.id == 0 {
            template.id = self.next_id();
        }
        self.templates.write().insert(template.id, template.clone());
        template
    }

    pub fn insert_static_file(&self, file_id: impl Into<String>) {
        self.static_files.write().insert(file_id.into());
    }

    pub fn has_static_file(&self, file_id: &str) -> bool {
        self.static_files.read().contains(file_id)
    }

    /// Mail handed to the transport so far.
    pub fn sent_mail(&self) -> Vec<Mail> {
        self.outbox.read().clone()
    }
}

pub(crate) fn any_eq_ignore_case(values: &[String], expected: &str) -> bool {
    values.iter().any(|v| v.eq_ignore_ascii_case(expected))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let store = MemoryStore::new();
        let a = store.next_id();
        let b = store.next_id();
        assert!(b > a);
    }

    #[test]
    fn test_insert_series_records_theme_property() {
        let store = MemoryStore::new();
        store.insert_series(Series::new("s1", "org", "Physics", "admin").with_theme(7));
        let props = store.series_properties.read();
        assert_eq!(props["s1"].get("theme").map(String::as_str), Some("7"));
    }
}
