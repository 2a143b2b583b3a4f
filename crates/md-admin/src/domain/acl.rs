//! Access Control Lists
//!
//! An ACL is a list of `(role, action, allow)` entries. Managed ACLs are
//! named, reusable ACLs that can be applied to events and series.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessControlEntry {
    pub role: String,
    pub action: String,
    pub allow: bool,
}

impl AccessControlEntry {
    pub fn allow(role: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            action: action.into(),
            allow: true,
        }
    }
}

/// Wire shape: `{"ace":[{"role":"ROLE_ADMIN","action":"read","allow":true}]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlList {
    #[serde(rename = "ace", default)]
    pub entries: Vec<AccessControlEntry>,
}

impl AccessControlList {
    pub fn new(entries: Vec<AccessControlEntry>) -> Self {
        Self { entries }
    }

    /// Parse the JSON wire shape. Entries with a blank role or action are
    /// rejected.
    pub fn parse_json(input: &str) -> Result<Self, String> {
        let acl: AccessControlList =
            serde_json::from_str(input).map_err(|e| format!("Unable to parse ACL: {}", e))?;
        if let Some(bad) = acl
            .entries
            .iter()
            .find(|e| e.role.trim().is_empty() || e.action.trim().is_empty())
        {
            return Err(format!("ACL entry with blank role or action: {:?}", bad));
        }
        Ok(acl)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedAcl {
    pub id: i64,
    pub name: String,
    pub organization: String,
    pub acl: AccessControlList,
}

/// Scheduled switch of an event to another managed ACL or workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclTransition {
    pub id: i64,
    pub event_id: String,
    pub acl_id: Option<i64>,
    pub workflow_id: Option<String>,
    pub application_date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wire_shape() {
        let acl = AccessControlList::parse_json(
            r#"{"ace":[{"role":"ROLE_ADMIN","action":"write","allow":true}]}"#,
        )
        .unwrap();
        assert_eq!(acl.entries, vec![AccessControlEntry::allow("ROLE_ADMIN", "write")]);
    }

    #[test]
    fn test_parse_rejects_blank_role() {
        assert!(AccessControlList::parse_json(r#"{"ace":[{"role":" ","action":"read","allow":true}]}"#).is_err());
        assert!(AccessControlList::parse_json("not json").is_err());
    }
}
