//! API Layer
//!
//! REST facades of the admin UI, all nested under `/admin-ng`.

pub mod common;
pub mod middleware;

pub mod acls;
pub mod agents;
pub mod blacklists;
pub mod email;
pub mod events;
pub mod groups;
pub mod jobs;
pub mod series;
pub mod themes;
pub mod users;

use axum::{
    routing::{get, post},
    Extension, Json, Router,
};
use md_config::OrganizationConfig;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use common::*;
pub use middleware::{RequestContext, RequestDefaults, ORGANIZATION_HEADER, USER_HEADER};

pub use acls::{acls_router, AclsState};
pub use agents::{agents_router, AgentsState};
pub use blacklists::{blacklists_router, BlacklistsState};
pub use email::{email_router, EmailState};
pub use events::{events_router, EventsState};
pub use groups::{groups_router, GroupsState};
pub use jobs::{jobs_router, JobsState};
pub use series::{series_router, SeriesState};
pub use themes::{themes_router, ThemesState};
pub use users::{users_router, UsersState};

use crate::service::{
    AclService, CaptureAgentService, CommentService, GroupProvider, IndexService, MailService,
    ParticipationDatabase, SchedulerService, SearchIndex, SeriesService, ServiceRegistry,
    StaticFileService, ThemesDatabase, UserDirectory, WorkflowService,
};

/// Every collaborator the facades need
#[derive(Clone)]
pub struct AdminServices {
    pub index: Arc<dyn SearchIndex>,
    pub index_service: Arc<dyn IndexService>,
    pub comments: Arc<dyn CommentService>,
    pub scheduler: Arc<dyn SchedulerService>,
    pub workflows: Arc<dyn WorkflowService>,
    pub series: Arc<dyn SeriesService>,
    pub acls: Arc<dyn AclService>,
    pub users: Arc<dyn UserDirectory>,
    pub groups: Arc<dyn GroupProvider>,
    pub themes: Arc<dyn ThemesDatabase>,
    pub files: Arc<dyn StaticFileService>,
    pub mail: Arc<dyn MailService>,
    pub participation: Arc<dyn ParticipationDatabase>,
    pub registry: Arc<dyn ServiceRegistry>,
    pub agents: Arc<dyn CaptureAgentService>,
}

impl From<&OrganizationConfig> for RequestDefaults {
    fn from(config: &OrganizationConfig) -> Self {
        Self {
            organization: config.id.clone(),
            username: config.default_user.clone(),
        }
    }
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "UP",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Build the admin router with every facade mounted.
pub fn create_router(services: AdminServices, organization: &OrganizationConfig) -> Router {
    let s = services;

    let events_state = EventsState {
        index: s.index.clone(),
        index_service: s.index_service.clone(),
        comments: s.comments,
        scheduler: s.scheduler.clone(),
        workflows: s.workflows.clone(),
        acls: s.acls.clone(),
    };
    let series_state = SeriesState {
        index: s.index.clone(),
        index_service: s.index_service,
        series: s.series.clone(),
        acls: s.acls.clone(),
        themes: s.themes.clone(),
    };
    let themes_state = ThemesState {
        index: s.index,
        themes: s.themes,
        series: s.series,
        files: s.files,
    };
    let email_state = EmailState {
        mail: s.mail,
        participation: s.participation.clone(),
        users: s.users.clone(),
        scheduler: s.scheduler,
    };

    let users_state = UsersState { users: s.users };
    let groups_state = GroupsState { groups: s.groups };
    let acls_state = AclsState { acls: s.acls };
    let blacklists_state = BlacklistsState {
        participation: s.participation,
    };

    Router::new()
        .nest("/admin-ng/event", events_router(events_state))
        .nest("/admin-ng/series", series_router(series_state))
        .nest("/admin-ng/users", users_router(users_state.clone()))
        .nest("/admin-ng/groups", groups_router(groups_state.clone()))
        .nest("/admin-ng/acl", acls_router(acls_state.clone()))
        .nest("/admin-ng/themes", themes_router(themes_state.clone()))
        .nest("/admin-ng/email", email_router(email_state))
        .nest(
            "/admin-ng/job",
            jobs_router(JobsState {
                registry: s.registry,
                workflows: s.workflows,
            }),
        )
        .nest("/admin-ng/capture-agents", agents_router(AgentsState { agents: s.agents }))
        .nest("/admin-ng/blacklist", blacklists_router(blacklists_state.clone()))
        // Collection roots also accept creates with a trailing slash
        .route("/admin-ng/users/", post(users::create_user).with_state(users_state))
        .route("/admin-ng/groups/", post(groups::create_group).with_state(groups_state))
        .route("/admin-ng/acl/", post(acls::create_acl).with_state(acls_state))
        .route("/admin-ng/themes/", post(themes::create_theme).with_state(themes_state))
        .route(
            "/admin-ng/blacklist/",
            post(blacklists::create_period).with_state(blacklists_state),
        )
        .route("/health", get(health_handler))
        .layer(Extension(RequestDefaults::from(organization)))
        .layer(TraceLayer::new_for_http())
}
