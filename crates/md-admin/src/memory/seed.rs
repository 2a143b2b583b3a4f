//! Demo records for running the admin API stand-alone.

use chrono::{Duration, Utc};
use md_config::OrganizationConfig;
use tracing::info;
use uuid::Uuid;

use super::MemoryStore;
use crate::domain::{
    AccessControlEntry, AccessControlList, AgentState, Blacklist, BlacklistType, Blacklisted,
    CaptureAgent, EmailAddress, Event, EventStatus, Group, Incident, IncidentSeverity, Job,
    JobStatus, ManagedAcl, MessageSignature, MessageTemplate, OperationState, Period, Person,
    Publication, Recording, Room, Series, TemplateType, Theme, User, WorkflowInstance,
    WorkflowOperation, WorkflowState, START_WORKFLOW_OPERATION, WORKFLOW_JOB_TYPE,
};

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn operation(position: u32, template: &str, state: OperationState) -> WorkflowOperation {
    WorkflowOperation {
        position,
        template: template.to_string(),
        description: None,
        state,
        started: None,
        completed: None,
    }
}

/// Fill `store` with a small, consistent data set for `organization`.
pub fn seed_demo_data(store: &MemoryStore, organization: &OrganizationConfig) {
    let org = organization.id.as_str();
    let admin = organization.default_user.as_str();
    let now = Utc::now();
    let tomorrow = now + Duration::days(1);

    // Access control
    let public = AccessControlList::new(vec![
        AccessControlEntry::allow("ROLE_ANONYMOUS", "read"),
        AccessControlEntry::allow(organization.admin_role.as_str(), "write"),
    ]);
    let staff_only = AccessControlList::new(vec![
        AccessControlEntry::allow("ROLE_GROUP_LECTURE_STAFF", "read"),
        AccessControlEntry::allow(organization.admin_role.as_str(), "write"),
    ]);
    for (name, acl) in [("Public", &public), ("Staff only", &staff_only)] {
        let id = store.next_id();
        store.managed_acls.write().insert(
            id,
            ManagedAcl {
                id,
                name: name.to_string(),
                organization: org.to_string(),
                acl: acl.clone(),
            },
        );
    }

    // Themes and their static files
    let mut theme = Theme::new("Campus", org, admin);
    theme.id = store.next_id();
    theme.is_default = true;
    theme.description = Some("Default branding".to_string());
    theme.bumper_active = true;
    theme.bumper_file = Some("campus-bumper".to_string());
    theme.watermark_active = true;
    theme.watermark_file = Some("campus-logo".to_string());
    theme.watermark_position = Some("topRight".to_string());
    store.insert_static_file("campus-bumper");
    store.insert_static_file("campus-logo");
    let theme_id = theme.id;
    store.themes.write().insert(theme.id, theme);

    // Series
    let physics_id = new_id();
    let mut physics = Series::new(&physics_id, org, "Physics 101", admin)
        .with_contributors(vec!["Ada Lovelace".to_string()])
        .with_organizers(vec!["Physics Department".to_string()])
        .with_language("en")
        .with_theme(theme_id);
    physics.managed_acl = Some("Public".to_string());
    store.insert_series(physics);
    store.series_acls.write().insert(physics_id.clone(), public.clone());

    let history_id = new_id();
    store.insert_series(
        Series::new(&history_id, org, "Medieval History", admin)
            .with_contributors(vec!["Grace Hopper".to_string()])
            .with_created_at(now - Duration::days(30)),
    );

    // Capture agents
    for (name, state) in [("room-101", AgentState::Idle), ("room-202", AgentState::Capturing)] {
        store.insert_agent(CaptureAgent {
            name: name.to_string(),
            state,
            url: Some(format!("http://{}.capture.local", name)),
            last_heard_from: now,
            inputs: vec!["presenter".to_string(), "presentation".to_string()],
        });
    }

    // Events and their workflows
    let scheduled_id = new_id();
    store.insert_event(
        Event::new(&scheduled_id, org, "Lecture 3: Thermodynamics")
            .with_series(&physics_id, "Physics 101")
            .with_presenters(vec!["Ada Lovelace".to_string()])
            .with_location("room-101")
            .with_agent("room-101")
            .with_schedule(tomorrow, tomorrow + Duration::minutes(90)),
    );

    let processing_id = new_id();
    let running = store.insert_workflow(WorkflowInstance {
        id: 0,
        event_id: processing_id.clone(),
        organization: org.to_string(),
        title: "Lecture 2: Mechanics".to_string(),
        series_id: Some(physics_id.clone()),
        series_title: Some("Physics 101".to_string()),
        creator: admin.to_string(),
        template: "schedule-and-upload".to_string(),
        state: WorkflowState::Running,
        submitted: now - Duration::hours(1),
    });
    store.insert_operations(
        running.id,
        vec![
            operation(0, "ingest", OperationState::Succeeded),
            operation(1, "encode", OperationState::Running),
            operation(2, "publish", OperationState::Instantiated),
        ],
    );
    store.insert_event(
        Event::new(&processing_id, org, "Lecture 2: Mechanics")
            .with_series(&physics_id, "Physics 101")
            .with_presenters(vec!["Ada Lovelace".to_string()])
            .with_location("room-202")
            .with_agent("room-202")
            .with_schedule(now - Duration::hours(3), now - Duration::hours(2))
            .with_status(EventStatus::Processing)
            .with_workflow(running.id),
    );

    let failed_id = new_id();
    let failing = store.insert_workflow(WorkflowInstance {
        id: 0,
        event_id: failed_id.clone(),
        organization: org.to_string(),
        title: "The Crusades".to_string(),
        series_id: Some(history_id.clone()),
        series_title: Some("Medieval History".to_string()),
        creator: admin.to_string(),
        template: "fast".to_string(),
        state: WorkflowState::Failing,
        submitted: now - Duration::days(1),
    });
    store.insert_operations(
        failing.id,
        vec![
            operation(0, "ingest", OperationState::Succeeded),
            operation(1, "encode", OperationState::Failed),
        ],
    );
    store.insert_incident(
        failing.id,
        Incident {
            id: store.next_id(),
            job_id: 1,
            severity: IncidentSeverity::Failure,
            code: "composer.encode.failed".to_string(),
            description: "Encoding the presenter track failed".to_string(),
            timestamp: now - Duration::hours(20),
        },
    );
    store.insert_event(
        Event::new(&failed_id, org, "The Crusades")
            .with_series(&history_id, "Medieval History")
            .with_presenters(vec!["Grace Hopper".to_string()])
            .with_schedule(now - Duration::days(1), now - Duration::days(1) + Duration::hours(1))
            .with_status(EventStatus::ProcessingFailure)
            .with_workflow(failing.id),
    );

    let published_id = new_id();
    store.insert_event(
        Event::new(&published_id, org, "Lecture 1: Introduction")
            .with_series(&physics_id, "Physics 101")
            .with_presenters(vec!["Ada Lovelace".to_string()])
            .with_schedule(now - Duration::days(7), now - Duration::days(7) + Duration::hours(1))
            .with_status(EventStatus::Processed)
            .with_publication(Publication {
                id: new_id(),
                channel: "engage-player".to_string(),
                url: format!("https://media.example.org/play/{}", published_id),
            }),
    );

    // Users and groups
    store.insert_user(
        org,
        User::new(admin, "mediadesk")
            .with_name("Administrator")
            .with_email("admin@example.org")
            .with_roles([organization.admin_role.as_str()]),
    );
    store.insert_user(
        org,
        User::new("ada", "mediadesk")
            .with_name("Ada Lovelace")
            .with_email("ada@example.org")
            .with_roles(["ROLE_USER", "ROLE_GROUP_LECTURE_STAFF"]),
    );
    let mut ldap = User::new("grace", "ldap")
        .with_name("Grace Hopper")
        .with_email("grace@example.org")
        .with_roles(["ROLE_USER"]);
    ldap.manageable = false;
    store.insert_user(org, ldap);

    let mut staff = Group::new("Lecture Staff", org);
    staff.description = Some("Everyone teaching recorded courses".to_string());
    staff.roles.insert("ROLE_USER".to_string());
    staff.members.insert("ada".to_string());
    store
        .groups
        .write()
        .insert((org.to_string(), staff.id.clone()), staff);

    // Participation management
    let people = [
        (store.next_id(), "Administrator", "admin@example.org"),
        (store.next_id(), "Ada Lovelace", "ada@example.org"),
        (store.next_id(), "Grace Hopper", "grace@example.org"),
    ];
    for (id, name, email) in &people {
        store.insert_person(Person {
            id: *id,
            name: name.to_string(),
            email: email.to_string(),
        });
    }
    let ada = people[1].0;
    let grace = people[2].0;

    let room = Room {
        id: store.next_id(),
        name: "Room 101".to_string(),
    };
    store.insert_room(room.clone());

    store.insert_recording(Recording {
        id: scheduled_id,
        title: "Physics 101".to_string(),
        start: tomorrow,
        end: tomorrow + Duration::minutes(90),
        room_id: Some(room.id),
        staff: vec![ada],
    });
    store.insert_recording(Recording {
        id: processing_id,
        title: "Physics 101".to_string(),
        start: now - Duration::hours(3),
        end: now - Duration::hours(2),
        room_id: None,
        staff: vec![ada, grace],
    });

    let blacklist_id = store.next_id();
    store.blacklists.write().insert(
        blacklist_id,
        Blacklist {
            id: blacklist_id,
            blacklisted: Blacklisted {
                id: grace,
                name: "Grace Hopper".to_string(),
                kind: BlacklistType::Person,
            },
            periods: vec![Period {
                id: store.next_id(),
                start: now + Duration::days(14),
                end: now + Duration::days(21),
                purpose: Some("Sabbatical".to_string()),
                comment: None,
            }],
        },
    );

    // Email
    store.insert_template(MessageTemplate::new(
        "Recording invitation",
        admin,
        "Your lectures will be recorded",
        "Dear ${staff},\n\nthe following recordings are planned for ${modules}:\n${recordings}\n\nTo opt out follow ${optOutLink}",
        TemplateType::Invitation,
    ));

    let signature = MessageSignature {
        id: store.next_id(),
        name: "Media services".to_string(),
        creator: admin.to_string(),
        sender: EmailAddress::new("media@example.org", Some("Media Services".to_string())),
        reply_to: None,
        signature: "Kind regards,\nMedia Services".to_string(),
        created_at: now,
    };
    store.signatures.write().insert(signature.id, signature);

    // Service registry
    let jobs = [
        (WORKFLOW_JOB_TYPE, START_WORKFLOW_OPERATION, JobStatus::Running),
        ("org.mediadesk.composer", "Encode", JobStatus::Running),
        ("org.mediadesk.inspection", "Inspect", JobStatus::Queued),
        ("org.mediadesk.composer", "Image", JobStatus::Finished),
    ];
    for (job_type, op, status) in jobs {
        store.insert_job(Job {
            id: store.next_id(),
            job_type: job_type.to_string(),
            operation: op.to_string(),
            status,
            creator: admin.to_string(),
            processing_host: Some("http://worker-1.example.org".to_string()),
            processing_node: Some("worker-1".to_string()),
            submitted: now - Duration::minutes(30),
            started: (status == JobStatus::Running).then(|| now - Duration::minutes(20)),
        });
    }

    info!(organization = org, "Demo data seeded");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{
        AclService, EventQuery, GroupProvider, SearchIndex, SeriesQuery, ServiceRegistry,
        UserDirectory,
    };

    #[tokio::test]
    async fn test_seeded_store_is_consistent() {
        let store = MemoryStore::new();
        let config = OrganizationConfig::default();
        seed_demo_data(&store, &config);

        let events = store
            .search_events(&EventQuery::for_organization(&config.id))
            .await
            .unwrap();
        assert_eq!(events.total, 4);

        let theme_id = *store.themes.read().keys().next().unwrap();
        let themed = store
            .search_series(&SeriesQuery::for_organization(&config.id).with_theme(theme_id))
            .await
            .unwrap();
        assert_eq!(themed.total, 1);

        assert!(store.user(&config.id, &config.default_user).await.unwrap().is_some());
        assert_eq!(store.groups(&config.id).await.unwrap().len(), 1);
        assert_eq!(store.managed_acls(&config.id).await.unwrap().len(), 2);
        assert_eq!(store.active_jobs().await.unwrap().len(), 3);
    }
}
