//! Theme Entity
//!
//! Branding applied to processed recordings: bumper and trailer clips, title
//! and license slides, watermark.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub id: i64,
    pub organization: String,
    pub name: String,
    pub description: Option<String>,
    pub creator: String,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "default")]
    pub is_default: bool,
    pub bumper_active: bool,
    pub bumper_file: Option<String>,
    pub trailer_active: bool,
    pub trailer_file: Option<String>,
    pub title_slide_active: bool,
    pub title_slide_background: Option<String>,
    pub title_slide_metadata: Option<String>,
    pub license_slide_active: bool,
    pub license_slide_background: Option<String>,
    pub license_slide_description: Option<String>,
    pub watermark_active: bool,
    pub watermark_file: Option<String>,
    pub watermark_position: Option<String>,
}

impl Theme {
    pub fn new(name: impl Into<String>, organization: impl Into<String>, creator: impl Into<String>) -> Self {
        Self {
            id: 0,
            organization: organization.into(),
            name: name.into(),
            description: None,
            creator: creator.into(),
            created_at: Utc::now(),
            is_default: false,
            bumper_active: false,
            bumper_file: None,
            trailer_active: false,
            trailer_file: None,
            title_slide_active: false,
            title_slide_background: None,
            title_slide_metadata: None,
            license_slide_active: false,
            license_slide_background: None,
            license_slide_description: None,
            watermark_active: false,
            watermark_file: None,
            watermark_position: None,
        }
    }

    /// Static file ids this theme points at.
    pub fn referenced_files(&self) -> Vec<String> {
        [
            &self.bumper_file,
            &self.trailer_file,
            &self.title_slide_background,
            &self.license_slide_background,
            &self.watermark_file,
        ]
        .into_iter()
        .flatten()
        .filter(|f| !f.trim().is_empty())
        .cloned()
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_referenced_files_skips_blanks() {
        let mut theme = Theme::new("Campus", "org", "admin");
        theme.bumper_file = Some("bumper-1".to_string());
        theme.watermark_file = Some(" ".to_string());
        theme.license_slide_background = Some("bg-2".to_string());
        assert_eq!(theme.referenced_files(), vec!["bumper-1".to_string(), "bg-2".to_string()]);
    }
}
