use async_trait::async_trait;
use tracing::debug;

use super::MemoryStore;
use crate::domain::Theme;
use crate::error::{AdminError, Result};
use crate::service::{StaticFileService, ThemesDatabase};

#[async_trait]
impl ThemesDatabase for MemoryStore {
    async fn theme(&self, organization: &str, id: i64) -> Result<Option<Theme>> {
        Ok(self
            .themes
            .read()
            .get(&id)
            .filter(|t| t.organization == organization)
            .cloned())
    }

    async fn save_theme(&self, mut theme: Theme) -> Result<Theme> {
        let mut themes = self.themes.write();
        if theme.id == 0 {
            theme.id = self.next_id();
        } else if !themes
            .get(&theme.id)
            .is_some_and(|t| t.organization == theme.organization)
        {
            return Err(AdminError::not_found("Theme", theme.id));
        }

        // At most one default theme per organization
        if theme.is_default {
            for other in themes.values_mut() {
                if other.organization == theme.organization && other.id != theme.id {
                    other.is_default = false;
                }
            }
        }
        themes.insert(theme.id, theme.clone());
        Ok(theme)
    }

    async fn delete_theme(&self, organization: &str, id: i64) -> Result<()> {
        let mut themes = self.themes.write();
        if !themes.get(&id).is_some_and(|t| t.organization == organization) {
            return Err(AdminError::not_found("Theme", id));
        }
        themes.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl StaticFileService for MemoryStore {
    async fn delete_file(&self, file_id: &str) -> Result<()> {
        if !self.static_files.write().remove(file_id) {
            return Err(AdminError::not_found("StaticFile", file_id));
        }
        debug!(file_id, "Static file deleted");
        Ok(())
    }
}
