//! User and group directory providers.

use async_trait::async_trait;

use crate::domain::{Group, User};
use crate::error::Result;

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn users(&self, organization: &str) -> Result<Vec<User>>;

    async fn user(&self, organization: &str, username: &str) -> Result<Option<User>>;

    /// `Duplicate` when the username is taken.
    async fn create_user(&self, organization: &str, user: User) -> Result<User>;

    async fn update_user(&self, organization: &str, user: User) -> Result<User>;

    async fn delete_user(&self, organization: &str, username: &str) -> Result<()>;
}

#[async_trait]
pub trait GroupProvider: Send + Sync {
    async fn groups(&self, organization: &str) -> Result<Vec<Group>>;

    async fn group(&self, organization: &str, id: &str) -> Result<Option<Group>>;

    /// `Duplicate` when a group with the same id exists.
    async fn create_group(&self, group: Group) -> Result<Group>;

    async fn update_group(&self, group: Group) -> Result<Group>;

    async fn delete_group(&self, organization: &str, id: &str) -> Result<()>;
}
