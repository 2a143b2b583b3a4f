//! Admin API Endpoint Tests
//!
//! Tests for:
//! - Health endpoint
//! - Bulk operations and their outcome buckets
//! - Error translation (404, 409, 400, generic 500 body)
//! - List parameters: unknown sort fields and filter keys
//! - Scheduling conflicts, comments, workflows and ACL transitions of events
//! - Series access and themes, users, groups and capture agents
//! - Blacklists, email previews and delivery
//! - Organization scoping through request headers

use std::sync::Arc;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, TimeZone, Utc};
use http_body_util::BodyExt;
use tower::ServiceExt;

use md_admin::api::{create_router, AdminServices, ORGANIZATION_HEADER, USER_HEADER};
use md_admin::domain::{
    AgentState, CaptureAgent, Event, EventStatus, Incident, IncidentSeverity, MessageTemplate,
    OperationState, Person, Recording, Series, TemplateType, User, WorkflowInstance,
    WorkflowOperation, WorkflowState,
};
use md_admin::memory::MemoryStore;
use md_admin::service::IndexService;
use md_admin::{AdminError, Result};
use md_config::OrganizationConfig;

const ORG: &str = "default_org";

/// Index service that fails for one event id and records every call
struct FlakyIndexService {
    failing_id: String,
    calls: parking_lot::Mutex<Vec<String>>,
}

impl FlakyIndexService {
    fn new(failing_id: &str) -> Self {
        Self {
            failing_id: failing_id.to_string(),
            calls: parking_lot::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl IndexService for FlakyIndexService {
    async fn remove_event(&self, _organization: &str, id: &str) -> Result<()> {
        self.calls.lock().push(id.to_string());
        if id == self.failing_id {
            return Err(AdminError::internal("index node unreachable: 10.0.0.12:9200"));
        }
        Ok(())
    }

    async fn remove_series(&self, _organization: &str, _id: &str) -> Result<()> {
        Ok(())
    }

    async fn set_series_opt_out(&self, _organization: &str, _id: &str, _opted_out: bool) -> Result<()> {
        Ok(())
    }
}

fn create_test_app() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let app = create_router(store.services(), &OrganizationConfig::default());
    (app, store)
}

fn app_with(services: AdminServices) -> Router {
    create_router(services, &OrganizationConfig::default())
}

fn form_request(method: Method, uri: &str, fields: &[(&str, &str)]) -> Request<Body> {
    let body = serde_urlencoded::to_string(fields).unwrap();
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_with_query(path: &str, params: &[(&str, &str)]) -> Request<Body> {
    get(&format!("{}?{}", path, serde_urlencoded::to_string(params).unwrap()))
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn with_header(mut request: Request<Body>, name: &'static str, value: &str) -> Request<Body> {
    request.headers_mut().insert(name, value.parse().unwrap());
    request
}

fn as_user(request: Request<Body>, username: &str) -> Request<Body> {
    with_header(request, USER_HEADER, username)
}

fn workflow(event_id: &str, state: WorkflowState) -> WorkflowInstance {
    WorkflowInstance {
        id: 0,
        event_id: event_id.to_string(),
        organization: ORG.to_string(),
        title: "Lecture".to_string(),
        series_id: None,
        series_title: None,
        creator: "admin".to_string(),
        template: "schedule-and-upload".to_string(),
        state,
        submitted: Utc::now(),
    }
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = create_test_app();
    let (status, json) = send(app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "UP");
    assert!(json["version"].is_string());
}

// ============================================================================
// Events
// ============================================================================

#[tokio::test]
async fn test_bulk_delete_sorts_outcomes() {
    let (app, store) = create_test_app();
    store.insert_event(Event::new("A", ORG, "First"));
    store.insert_event(Event::new("C", ORG, "Third"));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/admin-ng/event/deleteEvents")
        .body(Body::from(r#"["A","B","C"]"#))
        .unwrap();
    let (status, json) = send(app.clone(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], serde_json::json!(["A", "C"]));
    assert_eq!(json["notFound"], serde_json::json!(["B"]));
    assert_eq!(json["serverError"], serde_json::json!([]));

    let (status, _) = send(app, get("/admin-ng/event/A")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bulk_delete_rejects_malformed_body() {
    let (app, _) = create_test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/admin-ng/event/deleteEvents")
        .body(Body::from("A,B"))
        .unwrap();
    let (status, json) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_unknown_event_is_not_found() {
    let (app, _) = create_test_app();
    let (status, json) = send(app, get("/admin-ng/event/missing")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_events_are_scoped_to_organization() {
    let (app, store) = create_test_app();
    store.insert_event(Event::new("e1", "other_org", "Foreign lecture"));

    let (status, _) = send(app.clone(), get("/admin-ng/event/e1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let request = Request::builder()
        .uri("/admin-ng/event/e1")
        .header(ORGANIZATION_HEADER, "other_org")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "Foreign lecture");
}

#[tokio::test]
async fn test_list_events_sorts_and_pages() {
    let (app, store) = create_test_app();
    for (id, title) in [("e1", "Gamma"), ("e2", "alpha"), ("e3", "Beta")] {
        store.insert_event(Event::new(id, ORG, title));
    }

    let (status, json) = send(app, get("/admin-ng/event/events.json?sort=title:DESC&limit=2")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 3);
    assert_eq!(json["count"], 2);
    assert_eq!(json["results"][0]["title"], "Gamma");
    assert_eq!(json["results"][1]["title"], "Beta");
}

#[tokio::test]
async fn test_unknown_sort_field_is_bad_request() {
    let (app, _) = create_test_app();
    let (status, json) = send(app, get("/admin-ng/event/events.json?sort=shoe_size:ASC")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_unknown_filter_key_is_ignored() {
    let (app, store) = create_test_app();
    store.insert_event(Event::new("e1", ORG, "Lecture"));

    let (status, json) = send(app, get("/admin-ng/event/events.json?filter=colour:blue")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 1);
}

#[tokio::test]
async fn test_scheduling_conflicts() {
    let (app, store) = create_test_app();
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
    store.insert_event(
        Event::new("e1", ORG, "Morning lecture")
            .with_agent("room-1")
            .with_schedule(start, start + Duration::hours(1)),
    );

    let overlapping = r#"{"device":"room-1","start":"2024-05-01T10:30:00Z","end":"2024-05-01T11:30:00Z"}"#;
    let (status, json) = send(
        app.clone(),
        form_request(Method::POST, "/admin-ng/event/new/conflicts", &[("metadata", overlapping)]),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json[0]["title"], "Morning lecture");

    let free = r#"{"device":"room-1","start":"2024-05-01T12:00:00Z","end":"2024-05-01T13:00:00Z"}"#;
    let (status, _) = send(
        app,
        form_request(Method::POST, "/admin-ng/event/new/conflicts", &[("metadata", free)]),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_empty_scheduling_change_of_unknown_event_is_not_found() {
    let (app, _) = create_test_app();
    let (status, _) = send(
        app,
        form_request(Method::PUT, "/admin-ng/event/missing/scheduling", &[("scheduling", "{}")]),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_comments_are_scoped_to_organization() {
    let (app, store) = create_test_app();
    store.insert_event(Event::new("e1", "other_org", "Foreign lecture"));

    let request = with_header(
        form_request(Method::POST, "/admin-ng/event/e1/comment", &[("text", "Audio missing")]),
        ORGANIZATION_HEADER,
        "other_org",
    );
    let (status, json) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/admin-ng/event/e1/comment/{}", json["id"]);

    let (status, _) = send(app.clone(), get(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(app.clone(), form_request(Method::PUT, &uri, &[("text", "Hijacked")])).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(app.clone(), delete(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = send(app, with_header(get(&uri), ORGANIZATION_HEADER, "other_org")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["text"], "Audio missing");
}

#[tokio::test]
async fn test_comment_replies() {
    let (app, store) = create_test_app();
    store.insert_event(Event::new("e1", ORG, "Lecture"));

    let (_, comment) = send(
        app.clone(),
        form_request(Method::POST, "/admin-ng/event/e1/comment", &[("text", "Audio missing")]),
    )
    .await;
    let comment_uri = format!("/admin-ng/event/e1/comment/{}", comment["id"]);

    let (status, _) = send(
        app.clone(),
        form_request(Method::POST, &format!("{}/reply", comment_uri), &[("text", " ")]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = send(
        app.clone(),
        as_user(
            form_request(
                Method::POST,
                &format!("{}/reply", comment_uri),
                &[("text", "Mic replaced"), ("resolved", "true")],
            ),
            "tech",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["resolved"], true);
    assert_eq!(json["replies"][0]["text"], "Mic replaced");
    assert_eq!(json["replies"][0]["author"], "tech");
    let reply_uri = format!("{}/{}", comment_uri, json["replies"][0]["id"]);

    let (status, json) = send(
        app.clone(),
        form_request(Method::PUT, &reply_uri, &[("text", "Mic and cable replaced")]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["replies"][0]["text"], "Mic and cable replaced");

    let (status, json) = send(app.clone(), delete(&reply_uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["replies"], serde_json::json!([]));

    let (status, _) = send(app, delete(&reply_uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_workflow_of_another_event_is_bad_request() {
    let (app, store) = create_test_app();
    let current = store.insert_workflow(workflow("e1", WorkflowState::Running));
    let foreign = store.insert_workflow(workflow("e2", WorkflowState::Failed));
    store.insert_event(Event::new("e1", ORG, "Lecture").with_workflow(current.id));
    store.insert_event(Event::new("e2", ORG, "Seminar").with_workflow(foreign.id));

    let (status, _) = send(
        app.clone(),
        form_request(
            Method::PUT,
            &format!("/admin-ng/event/e1/workflows/{}/action/STOP", foreign.id),
            &[],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        app.clone(),
        delete(&format!("/admin-ng/event/e1/workflows/{}", foreign.id)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The current workflow of an event stays
    let (status, json) = send(
        app.clone(),
        delete(&format!("/admin-ng/event/e1/workflows/{}", current.id)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "VALIDATION_ERROR");

    let (status, _) = send(app, get(&format!("/admin-ng/event/e1/workflows/{}", current.id))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_single_workflow_operation_and_error() {
    let (app, store) = create_test_app();
    let instance = store.insert_workflow(workflow("e1", WorkflowState::Failed));
    store.insert_event(Event::new("e1", ORG, "Lecture").with_workflow(instance.id));
    let operation = |position, template: &str, state| WorkflowOperation {
        position,
        template: template.to_string(),
        description: None,
        state,
        started: None,
        completed: None,
    };
    store.insert_operations(
        instance.id,
        vec![
            operation(1, "ingest", OperationState::Succeeded),
            operation(2, "encode", OperationState::Failed),
        ],
    );
    store.insert_incident(
        instance.id,
        Incident {
            id: 500,
            job_id: 12,
            severity: IncidentSeverity::Failure,
            code: "encoder.failed".to_string(),
            description: "Encoder exited with status 1".to_string(),
            timestamp: Utc::now(),
        },
    );
    let base = format!("/admin-ng/event/e1/workflows/{}", instance.id);

    let (status, json) = send(app.clone(), get(&format!("{}/operations/2", base))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["template"], "encode");
    let (_, json) = send(app.clone(), get(&format!("{}/operations/1.json", base))).await;
    assert_eq!(json["template"], "ingest");
    let (status, _) = send(app.clone(), get(&format!("{}/operations/7", base))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(app.clone(), get(&format!("{}/operations/last", base))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = send(app.clone(), get(&format!("{}/errors/500.json", base))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["code"], "encoder.failed");
    let (status, _) = send(app, get(&format!("{}/errors/501", base))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_event_acl_transitions() {
    let (app, store) = create_test_app();
    store.insert_event(Event::new("e1", ORG, "Lecture"));
    store.insert_event(Event::new("e2", ORG, "Seminar"));
    let acl = r#"{"ace":[{"role":"ROLE_ANONYMOUS","action":"read","allow":true}]}"#;
    let (_, managed) = send(
        app.clone(),
        form_request(Method::POST, "/admin-ng/acl/", &[("name", "Public"), ("acl", acl)]),
    )
    .await;

    let transition = format!(
        r#"{{"acl_id":{},"application_date":"2030-01-01T00:00:00Z"}}"#,
        managed["id"]
    );
    let (status, _) = send(
        app.clone(),
        form_request(Method::POST, "/admin-ng/event/e1/transitions", &[("transition", &transition)]),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, json) = send(app.clone(), get("/admin-ng/event/e1/access.json")).await;
    assert_eq!(json["transitions"][0]["acl_id"], managed["id"]);
    assert_eq!(json["locked"], false);
    let transition_id = json["transitions"][0]["id"].clone();

    let moved = r#"{"workflow_id":"republish","application_date":"2031-01-01T00:00:00Z"}"#;
    let (status, _) = send(
        app.clone(),
        form_request(
            Method::PUT,
            &format!("/admin-ng/event/e1/transitions/{}", transition_id),
            &[("transition", moved)],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, json) = send(app.clone(), get("/admin-ng/event/e1/access.json")).await;
    assert_eq!(json["transitions"][0]["workflow_id"], "republish");
    assert!(json["transitions"][0]["acl_id"].is_null());

    let (_, json) = send(app.clone(), get("/admin-ng/event/e1/transitions")).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    let (_, json) = send(app.clone(), get("/admin-ng/event/e2/transitions")).await;
    assert_eq!(json, serde_json::json!([]));

    let (status, _) = send(
        app.clone(),
        delete(&format!("/admin-ng/event/e2/transitions/{}", transition_id)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(
        app.clone(),
        delete(&format!("/admin-ng/event/e1/transitions/{}", transition_id)),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        app.clone(),
        form_request(Method::POST, "/admin-ng/event/missing/transitions", &[("transition", moved)]),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(
        app.clone(),
        form_request(Method::POST, "/admin-ng/event/e1/transitions", &[("transition", "{}")]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let unknown_acl = r#"{"acl_id":9999,"application_date":"2030-01-01T00:00:00Z"}"#;
    let (status, _) = send(
        app,
        form_request(Method::POST, "/admin-ng/event/e1/transitions", &[("transition", unknown_acl)]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Workflows and jobs
// ============================================================================

#[tokio::test]
async fn test_tasks_status_filter() {
    let (app, store) = create_test_app();
    for state in [WorkflowState::Running, WorkflowState::Failed, WorkflowState::Succeeded] {
        store.insert_workflow(workflow("e1", state));
    }

    let (status, json) = send(
        app.clone(),
        get("/admin-ng/job/tasks.json?status=RUNNING&status=FAILED"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 2);

    let (_, json) = send(app.clone(), get("/admin-ng/job/tasks.json?status=-FAILED")).await;
    assert_eq!(json["total"], 2);
    let states: Vec<&str> = json["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["state"].as_str().unwrap())
        .collect();
    assert!(!states.contains(&"FAILED"));

    let (status, _) = send(app, get("/admin-ng/job/tasks.json?status=SLEEPING")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Failing collaborators
// ============================================================================

#[tokio::test]
async fn test_failing_collaborator_lands_in_server_error() {
    let store = Arc::new(MemoryStore::new());
    let flaky = Arc::new(FlakyIndexService::new("B"));
    let mut services = store.services();
    services.index_service = flaky.clone();
    let app = app_with(services);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/admin-ng/event/deleteEvents")
        .body(Body::from(r#"["A","B","C"]"#))
        .unwrap();
    let (status, json) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], serde_json::json!(["A", "C"]));
    assert_eq!(json["serverError"], serde_json::json!(["B"]));
    assert_eq!(flaky.calls.lock().len(), 3);
}

#[tokio::test]
async fn test_internal_error_body_is_generic() {
    let store = Arc::new(MemoryStore::new());
    let mut services = store.services();
    services.index_service = Arc::new(FlakyIndexService::new("B"));
    let app = app_with(services);

    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/admin-ng/event/B")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(app, request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "INTERNAL_ERROR");
    assert_eq!(json["message"], "An internal error occurred");
    assert!(!json.to_string().contains("10.0.0.12"));
}

// ============================================================================
// Managed ACLs
// ============================================================================

#[tokio::test]
async fn test_duplicate_acl_name_conflicts() {
    let (app, _) = create_test_app();
    let acl = r#"{"ace":[{"role":"ROLE_ANONYMOUS","action":"read","allow":true}]}"#;

    let (status, json) = send(
        app.clone(),
        form_request(Method::POST, "/admin-ng/acl/", &[("name", "Public"), ("acl", acl)]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Public");

    let (status, json) = send(
        app.clone(),
        form_request(Method::POST, "/admin-ng/acl/", &[("name", "Public"), ("acl", acl)]),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "DUPLICATE");

    let (_, json) = send(app, get("/admin-ng/acl/acls.json")).await;
    assert_eq!(json["total"], 1);
}

#[tokio::test]
async fn test_rename_acl_onto_existing_name_conflicts() {
    let (app, _) = create_test_app();
    let acl = r#"{"ace":[{"role":"ROLE_ANONYMOUS","action":"read","allow":true}]}"#;
    send(
        app.clone(),
        form_request(Method::POST, "/admin-ng/acl/", &[("name", "Public"), ("acl", acl)]),
    )
    .await;
    let (_, private) = send(
        app.clone(),
        form_request(Method::POST, "/admin-ng/acl/", &[("name", "Private"), ("acl", acl)]),
    )
    .await;

    let (status, json) = send(
        app.clone(),
        form_request(
            Method::PUT,
            &format!("/admin-ng/acl/{}", private["id"]),
            &[("name", "Public"), ("acl", acl)],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "DUPLICATE");

    let (_, json) = send(app, get("/admin-ng/acl/acls.json")).await;
    let mut names: Vec<&str> = json["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["name"].as_str().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, vec!["Private", "Public"]);
}

#[tokio::test]
async fn test_non_numeric_acl_id_is_bad_request() {
    let (app, _) = create_test_app();
    let (status, _) = send(app, get("/admin-ng/acl/abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Series
// ============================================================================

#[tokio::test]
async fn test_series_access_refused_while_processing() {
    let (app, store) = create_test_app();
    store.insert_series(Series::new("s1", ORG, "Physics", "admin"));
    store.insert_event(
        Event::new("e1", ORG, "Lecture")
            .with_series("s1", "Physics")
            .with_status(EventStatus::Processing),
    );
    let acl = r#"{"ace":[{"role":"ROLE_STUDENT","action":"read","allow":true}]}"#;

    let (status, json) = send(
        app.clone(),
        form_request(Method::POST, "/admin-ng/series/s1/access", &[("acl", acl), ("override", "true")]),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["details"]["events"], serde_json::json!(["e1"]));

    store.insert_event(
        Event::new("e1", ORG, "Lecture")
            .with_series("s1", "Physics")
            .with_status(EventStatus::Processed),
    );
    let (status, _) = send(
        app,
        form_request(Method::POST, "/admin-ng/series/s1/access", &[("acl", acl), ("override", "true")]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_series_theme_assignment() {
    let (app, store) = create_test_app();
    store.insert_series(Series::new("s1", ORG, "Physics", "admin"));
    let (_, theme) = send(
        app.clone(),
        form_request(Method::POST, "/admin-ng/themes", &[("name", "Campus")]),
    )
    .await;
    let theme_id = theme["id"].to_string();

    let (_, json) = send(app.clone(), get("/admin-ng/series/s1/theme.json")).await;
    assert_eq!(json, serde_json::json!({}));

    let (status, json) = send(
        app.clone(),
        form_request(Method::PUT, "/admin-ng/series/s1/theme", &[("themeId", &theme_id)]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Campus");

    let (_, json) = send(app.clone(), get("/admin-ng/series/s1/theme.json")).await;
    assert_eq!(json["id"], theme["id"]);

    let (status, _) = send(
        app.clone(),
        form_request(Method::PUT, "/admin-ng/series/s1/theme", &[("themeId", "9999")]),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(app.clone(), delete("/admin-ng/series/s1/theme")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, json) = send(app, get("/admin-ng/series/s1/theme.json")).await;
    assert_eq!(json, serde_json::json!({}));
}

// ============================================================================
// Themes
// ============================================================================

#[tokio::test]
async fn test_delete_theme_removes_files_and_series_references() {
    let (app, store) = create_test_app();
    store.insert_static_file("bumper-intro");
    let (status, theme) = send(
        app.clone(),
        form_request(
            Method::POST,
            "/admin-ng/themes/",
            &[("name", "Campus"), ("bumperActive", "true"), ("bumperFile", "bumper-intro")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let theme_id = theme["id"].as_i64().unwrap();
    store.insert_series(Series::new("s1", ORG, "Physics", "admin").with_theme(theme_id));

    let (_, usage) = send(app.clone(), get(&format!("/admin-ng/themes/{}/usage.json", theme_id))).await;
    assert_eq!(usage["series"][0]["id"], "s1");

    let (status, _) = send(app.clone(), delete(&format!("/admin-ng/themes/{}", theme_id))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert!(!store.has_static_file("bumper-intro"));
    let (_, properties) = send(app.clone(), get("/admin-ng/series/s1/properties")).await;
    assert!(properties.get("theme").is_none());
    let (status, _) = send(app, get(&format!("/admin-ng/themes/{}", theme_id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Users
// ============================================================================

#[tokio::test]
async fn test_create_user_then_duplicate() {
    let (app, _) = create_test_app();
    let fields = [
        ("username", "ada"),
        ("password", "secret"),
        ("name", "Ada Lovelace"),
        ("roles", r#"["ROLE_USER"]"#),
    ];

    let (status, json) = send(app.clone(), form_request(Method::POST, "/admin-ng/users/", &fields)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["username"], "ada");
    assert!(json.get("password").is_none());

    let (status, _) = send(app, form_request(Method::POST, "/admin-ng/users/", &fields)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

// ============================================================================
// Groups
// ============================================================================

#[tokio::test]
async fn test_group_lifecycle() {
    let (app, _) = create_test_app();

    let (status, json) = send(
        app.clone(),
        form_request(
            Method::POST,
            "/admin-ng/groups/",
            &[("name", "Lecture Staff"), ("roles", "ROLE_STUDIO"), ("members", "ada")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["id"], "lecture_staff");
    assert_eq!(json["role"], "ROLE_GROUP_LECTURE_STAFF");

    let (status, _) = send(
        app.clone(),
        form_request(Method::POST, "/admin-ng/groups", &[("name", "Lecture Staff")]),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, json) = send(
        app.clone(),
        form_request(Method::POST, "/admin-ng/groups", &[("name", "Editors")]),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["id"], "editors");

    let (_, json) = send(
        app.clone(),
        form_request(Method::POST, "/admin-ng/groups/lecture_staff/members", &[("member", "grace")]),
    )
    .await;
    assert_eq!(json["members"], serde_json::json!(["ada", "grace"]));

    let (status, json) = send(app.clone(), delete("/admin-ng/groups/lecture_staff/members/ada")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["members"], serde_json::json!(["grace"]));
    let (status, _) = send(app.clone(), delete("/admin-ng/groups/lecture_staff/members/ada")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = send(
        app.clone(),
        form_request(Method::PUT, "/admin-ng/groups/lecture_staff", &[("description", "Studio crew")]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["description"], "Studio crew");

    let (_, json) = send(app.clone(), get_with_query("/admin-ng/groups/groups.json", &[("filter", "textFilter:studio")])).await;
    assert_eq!(json["total"], 1);

    let (status, _) = send(app.clone(), delete("/admin-ng/groups/lecture_staff")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(app, get("/admin-ng/groups/lecture_staff")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Capture agents
// ============================================================================

#[tokio::test]
async fn test_capture_agents() {
    let (app, store) = create_test_app();
    for (name, state) in [("studio-a", AgentState::Idle), ("studio-b", AgentState::Capturing)] {
        store.insert_agent(CaptureAgent {
            name: name.to_string(),
            state,
            url: None,
            last_heard_from: Utc::now(),
            inputs: vec!["presenter".to_string()],
        });
    }

    let (status, json) = send(app.clone(), get("/admin-ng/capture-agents/agents.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 2);

    let (_, json) = send(
        app.clone(),
        get_with_query("/admin-ng/capture-agents/agents.json", &[("filter", "status:capturing")]),
    )
    .await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["results"][0]["name"], "studio-b");

    let (status, json) = send(app.clone(), get("/admin-ng/capture-agents/studio-a")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["state"], "idle");

    let (status, _) = send(app.clone(), delete("/admin-ng/capture-agents/studio-a")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(app.clone(), get("/admin-ng/capture-agents/studio-a")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(app, delete("/admin-ng/capture-agents/studio-a")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Blacklists
// ============================================================================

#[tokio::test]
async fn test_blacklist_type_must_be_person_or_room() {
    let (app, _) = create_test_app();
    let fields = [
        ("type", "desk"),
        ("blacklistedId", "1"),
        ("start", "2024-05-01T00:00:00Z"),
        ("end", "2024-05-02T00:00:00Z"),
    ];

    let (status, json) = send(app, form_request(Method::POST, "/admin-ng/blacklist/", &fields)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "VALIDATION_ERROR");
}

fn staff_fixture(store: &MemoryStore) {
    store.insert_person(Person {
        id: 40,
        name: "Ada Lovelace".to_string(),
        email: "ada@example.org".to_string(),
    });
    store.insert_person(Person {
        id: 41,
        name: "Grace Hopper".to_string(),
        email: "grace@example.org".to_string(),
    });
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
    for (id, staff) in [("e1", vec![40]), ("e2", vec![40, 41])] {
        store.insert_recording(Recording {
            id: id.to_string(),
            title: "Physics".to_string(),
            start,
            end: start + Duration::hours(2),
            room_id: None,
            staff,
        });
    }
}

#[tokio::test]
async fn test_bulk_blacklist_sorts_outcomes() {
    let (app, store) = create_test_app();
    staff_fixture(&store);
    let fields = [
        ("type", "person"),
        ("blacklistedIds", r#"["40","x",99]"#),
        ("start", "2024-05-01T00:00:00Z"),
        ("end", "2024-05-02T00:00:00Z"),
    ];

    let (status, json) = send(app.clone(), form_request(Method::POST, "/admin-ng/blacklist/blacklists", &fields)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], serde_json::json!(["40"]));
    assert_eq!(json["serverError"], serde_json::json!(["x"]));
    assert_eq!(json["notFound"], serde_json::json!(["99"]));

    let (_, json) = send(app, get_with_query("/admin-ng/blacklist/blacklists.json", &[("type", "person")])).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["resourceName"], "Ada Lovelace");
}

#[tokio::test]
async fn test_blacklist_counts_per_resource() {
    let (app, store) = create_test_app();
    staff_fixture(&store);
    let params = |ids: &'static str| {
        [
            ("type", "person"),
            ("blacklistedIds", ids),
            ("start", "2024-05-01T00:00:00Z"),
            ("end", "2024-05-02T00:00:00Z"),
        ]
    };

    let (status, json) = send(
        app.clone(),
        get_with_query("/admin-ng/blacklist/blacklistCounts", &params("[40,41,99]")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["eventsTotal"], 2);
    assert_eq!(json["results"]["40"]["eventsCount"], 2);
    assert_eq!(json["results"]["41"]["eventsCount"], 1);
    assert_eq!(json["results"]["99"]["eventsCount"], 0);

    let (status, _) = send(
        app,
        get_with_query("/admin-ng/blacklist/blacklistCounts", &params(r#"[40,"x"]"#)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Email
// ============================================================================

#[tokio::test]
async fn test_preview_requires_registered_person() {
    let (app, store) = create_test_app();
    store.insert_user(ORG, User::new("clerk", "mediadesk").with_email("clerk@example.org"));
    store.insert_person(Person {
        id: 40,
        name: "Ada Lovelace".to_string(),
        email: "ada@example.org".to_string(),
    });
    let template = store
        .insert_template(MessageTemplate::new(
            "Invite",
            "admin",
            "Hi",
            "Dear ${staff}",
            TemplateType::Invitation,
        ))
        .id;

    let request = form_request(
        Method::POST,
        &format!("/admin-ng/email/preview/{}", template),
        &[("eventIds", "e1"), ("personIds", "40")],
    );
    let (status, json) = send(app, as_user(request, "clerk")).await;

    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    assert_eq!(json["error"], "PRECONDITION_FAILED");
}

/// Clerk registered as person 41, Ada as staff of e1; returns the template id.
fn mail_fixture(store: &MemoryStore) -> i64 {
    store.insert_user(ORG, User::new("clerk", "mediadesk").with_email("grace@example.org"));
    staff_fixture(store);
    store.insert_event(Event::new("e1", ORG, "Physics"));
    store
        .insert_template(MessageTemplate::new(
            "Invite",
            "admin",
            "Recording notice",
            "Dear ${staff}",
            TemplateType::Invitation,
        ))
        .id
}

async fn create_clerk_signature(app: &Router) {
    let fields = [
        ("name", "Studio"),
        ("from_name", "Media Desk"),
        ("from_address", "desk@example.org"),
        ("reply_address", "grace@example.org"),
        ("text", "Kind regards, the media desk"),
    ];
    let (status, json) = send(
        app.clone(),
        as_user(form_request(Method::POST, "/admin-ng/email/signature", &fields), "clerk"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["creator"], "clerk");
}

#[tokio::test]
async fn test_preview_appends_signature_on_request() {
    let (app, store) = create_test_app();
    let template = mail_fixture(&store);
    let uri = format!("/admin-ng/email/preview/{}", template);
    let fields = |signature: &'static str| {
        [("eventIds", "e1"), ("personIds", "40"), ("signature", signature)]
    };

    let (status, json) = send(app.clone(), as_user(form_request(Method::POST, &uri, &fields("true")), "clerk")).await;
    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    assert_eq!(json["error"], "PRECONDITION_FAILED");

    create_clerk_signature(&app).await;

    let (status, json) = send(app.clone(), as_user(form_request(Method::POST, &uri, &fields("true")), "clerk")).await;
    assert_eq!(status, StatusCode::OK);
    let body = json[0]["body"].as_str().unwrap();
    assert!(body.starts_with("Dear Ada Lovelace"));
    assert!(body.contains("Kind regards, the media desk"));

    let (_, json) = send(app.clone(), as_user(form_request(Method::POST, &uri, &fields("false")), "clerk")).await;
    assert!(!json[0]["body"].as_str().unwrap().contains("Kind regards"));

    let (status, _) = send(app, as_user(form_request(Method::POST, &uri, &fields("maybe")), "clerk")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_send_mails_recipients_and_marks_events_unconfirmed() {
    let (app, store) = create_test_app();
    let template = mail_fixture(&store);
    let uri = format!("/admin-ng/email/send/{}", template);
    let fields = [("eventIds", "e1"), ("personIds", "40"), ("signature", "true")];

    let (status, _) = send(
        app.clone(),
        as_user(form_request(Method::POST, &uri, &[("eventIds", "e1"), ("personIds", "40")]), "clerk"),
    )
    .await;
    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    assert!(store.sent_mail().is_empty());

    create_clerk_signature(&app).await;
    let (status, _) = send(app.clone(), as_user(form_request(Method::POST, &uri, &fields), "clerk")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let sent = store.sent_mail();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipients[0].address, "ada@example.org");
    assert_eq!(sent[0].sender.address, "desk@example.org");
    assert_eq!(sent[0].subject, "Recording notice");
    assert!(sent[0].body.contains("Kind regards, the media desk"));

    let (_, event) = send(app, get("/admin-ng/event/e1")).await;
    assert_eq!(event["reviewStatus"], "UNCONFIRMED");
}

#[tokio::test]
async fn test_delete_templates_sorts_outcomes() {
    let (app, store) = create_test_app();
    let template = mail_fixture(&store);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/admin-ng/email/deleteTemplates")
        .body(Body::from(format!(r#"[{}, "draft", 9999]"#, template)))
        .unwrap();
    let (status, json) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], serde_json::json!([template.to_string()]));
    assert_eq!(json["serverError"], serde_json::json!(["draft"]));
    assert_eq!(json["notFound"], serde_json::json!(["9999"]));
}

#[tokio::test]
async fn test_mail_server_configuration() {
    let (app, _) = create_test_app();
    let fields = |port: &'static str| {
        [
            ("transport", "smtp"),
            ("server", "mail.example.org"),
            ("port", port),
            ("username", "desk"),
            ("password", "hunter2"),
            ("ssl", "true"),
        ]
    };

    let (status, json) = send(app.clone(), get("/admin-ng/email/configuration")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["server"], "localhost");

    let (status, _) = send(
        app.clone(),
        form_request(Method::PUT, "/admin-ng/email/configuration", &fields("smtp")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        app.clone(),
        form_request(Method::PUT, "/admin-ng/email/configuration", &fields("587")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = send(app, get("/admin-ng/email/configuration")).await;
    assert_eq!(json["server"], "mail.example.org");
    assert_eq!(json["port"], 587);
    assert_eq!(json["ssl"], true);
    assert!(json.get("password").is_none());
}

#[tokio::test]
async fn test_send_test_mail() {
    let (app, store) = create_test_app();
    store.insert_user(ORG, User::new("clerk", "mediadesk").with_email("grace@example.org"));
    store.insert_user(ORG, User::new("intern", "mediadesk"));

    let fields = [("to", "a@example.org; b@example.org"), ("subject", "Test"), ("body", "Hello")];
    let (status, _) = send(
        app.clone(),
        as_user(form_request(Method::POST, "/admin-ng/email/sendtestmail", &fields), "clerk"),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let sent = store.sent_mail();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipients.len(), 2);
    assert_eq!(sent[0].sender.address, "grace@example.org");

    let (status, _) = send(
        app.clone(),
        as_user(form_request(Method::POST, "/admin-ng/email/sendtestmail", &[("to", " ; ")]), "clerk"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        app,
        as_user(form_request(Method::POST, "/admin-ng/email/sendtestmail", &fields), "intern"),
    )
    .await;
    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
}
