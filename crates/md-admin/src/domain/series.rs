//! Series Entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub id: String,
    pub organization: String,
    pub title: String,
    pub description: Option<String>,
    pub subject: Option<String>,
    pub language: Option<String>,
    pub license: Option<String>,
    pub creator: String,
    #[serde(default)]
    pub contributors: Vec<String>,
    #[serde(default)]
    pub organizers: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub managed_acl: Option<String>,
    pub theme_id: Option<i64>,
    #[serde(default)]
    pub opted_out: bool,
}

impl Series {
    pub fn new(
        id: impl Into<String>,
        organization: impl Into<String>,
        title: impl Into<String>,
        creator: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            organization: organization.into(),
            title: title.into(),
            description: None,
            subject: None,
            language: None,
            license: None,
            creator: creator.into(),
            contributors: Vec::new(),
            organizers: Vec::new(),
            created_at: Utc::now(),
            managed_acl: None,
            theme_id: None,
            opted_out: false,
        }
    }

    pub fn with_contributors(mut self, contributors: Vec<String>) -> Self {
        self.contributors = contributors;
        self
    }

    pub fn with_organizers(mut self, organizers: Vec<String>) -> Self {
        self.organizers = organizers;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_theme(mut self, theme_id: i64) -> Self {
        self.theme_id = Some(theme_id);
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}
