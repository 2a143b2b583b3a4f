//! Domain Models
//!
//! Entities exchanged with the collaborator services.

pub mod acl;
pub mod agent;
pub mod email;
pub mod event;
pub mod job;
pub mod participation;
pub mod series;
pub mod theme;
pub mod user;

pub use acl::*;
pub use agent::*;
pub use email::*;
pub use event::*;
pub use job::*;
pub use participation::*;
pub use series::*;
pub use theme::*;
pub use user::*;
