//! Mediadesk Admin
//!
//! REST facades behind the media admin UI:
//! - Events, comments, scheduling and event workflows
//! - Series, series properties, themes and access control
//! - Users, groups and managed ACLs
//! - Email templates and signatures, blacklists
//! - Job and task status, capture agents
//!
//! Every facade delegates to collaborator traits in [`service`]; the
//! [`memory`] module provides in-process implementations of them.

pub mod api;
pub mod domain;
pub mod error;
pub mod memory;
pub mod service;

pub use error::{AdminError, Result};
