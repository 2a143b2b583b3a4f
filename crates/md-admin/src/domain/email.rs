//! Email Templates and Signatures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemplateType {
    Invitation,
    Acceptance,
    Reminder,
}

impl TemplateType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "INVITATION" => Some(Self::Invitation),
            "ACCEPTANCE" => Some(Self::Acceptance),
            "REMINDER" => Some(Self::Reminder),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageTemplate {
    pub id: i64,
    pub name: String,
    pub creator: String,
    pub subject: String,
    pub body: String,
    #[serde(rename = "type")]
    pub template_type: TemplateType,
    pub created_at: DateTime<Utc>,
}

impl MessageTemplate {
    pub fn new(
        name: impl Into<String>,
        creator: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
        template_type: TemplateType,
    ) -> Self {
        Self {
            id: 0,
            name: name.into(),
            creator: creator.into(),
            subject: subject.into(),
            body: body.into(),
            template_type,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddress {
    pub address: String,
    pub name: Option<String>,
}

impl EmailAddress {
    pub fn new(address: impl Into<String>, name: Option<String>) -> Self {
        Self {
            address: address.into(),
            name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSignature {
    pub id: i64,
    pub name: String,
    pub creator: String,
    pub sender: EmailAddress,
    pub reply_to: Option<EmailAddress>,
    pub signature: String,
    pub created_at: DateTime<Utc>,
}

/// Message handed to the mail transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mail {
    pub sender: EmailAddress,
    pub reply_to: Option<EmailAddress>,
    pub recipients: Vec<EmailAddress>,
    pub subject: String,
    pub body: String,
}

/// Outgoing mail server settings. The password is never echoed back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailConfiguration {
    pub transport: String,
    pub server: String,
    pub port: u16,
    pub username: Option<String>,
    #[serde(skip_serializing, default)]
    pub password: Option<String>,
    pub ssl: bool,
}

impl Default for EmailConfiguration {
    fn default() -> Self {
        Self {
            transport: "smtp".to_string(),
            server: "localhost".to_string(),
            port: 25,
            username: None,
            password: None,
            ssl: false,
        }
    }
}

/// Placeholder a template body may contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateVariable {
    pub name: &'static str,
    pub variable: &'static str,
    pub description: &'static str,
}

pub const TEMPLATE_VARIABLES: &[TemplateVariable] = &[
    TemplateVariable {
        name: "optOutLink",
        variable: "${optOutLink}",
        description: "Inserts a link for instructors to opt out of having their lectures recorded.",
    },
    TemplateVariable {
        name: "staff",
        variable: "${staff}",
        description: "Inserts the staff member's name.",
    },
    TemplateVariable {
        name: "modules",
        variable: "${modules}",
        description: "Inserts the list of module names the staff member is involved in.",
    },
    TemplateVariable {
        name: "recordings",
        variable: "${recordings}",
        description: "Inserts the list of recordings the message is about.",
    },
];
