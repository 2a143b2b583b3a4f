//! Users and Groups

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub name: Option<String>,
    pub email: Option<String>,
    /// User provider the account comes from, e.g. `mediadesk` or `ldap`
    pub provider: String,
    #[serde(default)]
    pub roles: BTreeSet<String>,
    /// Whether the account can be edited through the admin UI
    #[serde(default)]
    pub manageable: bool,
    #[serde(skip)]
    pub password: Option<String>,
}

impl User {
    pub fn new(username: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            name: None,
            email: None,
            provider: provider.into(),
            roles: BTreeSet::new(),
            manageable: true,
            password: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub organization: String,
    /// Role granted to every member of the group
    pub role: String,
    #[serde(default)]
    pub roles: BTreeSet<String>,
    #[serde(default)]
    pub members: BTreeSet<String>,
}

impl Group {
    /// Builds the id and group role from the name: `Lecture Staff` becomes
    /// `lecture_staff` and `ROLE_GROUP_LECTURE_STAFF`.
    pub fn new(name: impl Into<String>, organization: impl Into<String>) -> Self {
        let name = name.into();
        let id = Self::id_for_name(&name);
        Self {
            role: format!("ROLE_GROUP_{}", id.to_uppercase()),
            id,
            name,
            description: None,
            organization: organization.into(),
            roles: BTreeSet::new(),
            members: BTreeSet::new(),
        }
    }

    pub fn id_for_name(name: &str) -> String {
        name.trim()
            .chars()
            .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect()
    }
}
