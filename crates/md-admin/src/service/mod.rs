//! Collaborator Services
//!
//! Contracts of the backend services the facades call. The facades treat
//! them as the source of truth; implementations live outside this crate
//! apart from the in-memory ones in [`crate::memory`].

pub mod directory;
pub mod events;
pub mod index;
pub mod mail;
pub mod registry;
pub mod series;
pub mod themes;

pub use directory::{GroupProvider, UserDirectory};
pub use events::{CommentDraft, CommentService, SchedulerService, WorkflowQuery, WorkflowService};
pub use index::{
    CommentsFilter, EventQuery, EventSortField, IndexService, SearchIndex, SearchResult,
    SeriesQuery, SeriesSortField, ThemeQuery, ThemeSortField,
};
pub use mail::{MailService, ParticipationDatabase};
pub use registry::{CaptureAgentService, ServiceRegistry};
pub use series::{AclService, SeriesService, TransitionDraft, THEME_PROPERTY};
pub use themes::{StaticFileService, ThemesDatabase};
