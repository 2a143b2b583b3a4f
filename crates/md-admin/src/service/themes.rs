//! Theme persistence and the static files themes point at.

use async_trait::async_trait;

use crate::domain::Theme;
use crate::error::Result;

#[async_trait]
pub trait ThemesDatabase: Send + Sync {
    async fn theme(&self, organization: &str, id: i64) -> Result<Option<Theme>>;

    /// Inserts when `theme.id` is zero, otherwise replaces.
    async fn save_theme(&self, theme: Theme) -> Result<Theme>;

    async fn delete_theme(&self, organization: &str, id: i64) -> Result<()>;
}

#[async_trait]
pub trait StaticFileService: Send + Sync {
    async fn delete_file(&self, file_id: &str) -> Result<()>;
}
