//! Mail service and participation database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Blacklist, BlacklistType, EmailConfiguration, Mail, MessageSignature, MessageTemplate, Person,
    Recording, Room,
};
use crate::error::Result;

#[async_trait]
pub trait MailService: Send + Sync {
    /// All templates, or only those of `creator`.
    async fn templates(&self, creator: Option<&str>) -> Result<Vec<MessageTemplate>>;

    async fn template(&self, id: i64) -> Result<Option<MessageTemplate>>;

    /// Inserts when `template.id` is zero, otherwise replaces.
    async fn save_template(&self, template: MessageTemplate) -> Result<MessageTemplate>;

    async fn delete_template(&self, id: i64) -> Result<()>;

    async fn signatures(&self) -> Result<Vec<MessageSignature>>;

    async fn signature(&self, id: i64) -> Result<Option<MessageSignature>>;

    async fn signature_of(&self, creator: &str) -> Result<Option<MessageSignature>>;

    async fn save_signature(&self, signature: MessageSignature) -> Result<MessageSignature>;

    async fn delete_signature(&self, id: i64) -> Result<()>;

    /// Render the message body one recipient would receive.
    async fn render(
        &self,
        template: &MessageTemplate,
        signature: Option<&MessageSignature>,
        recordings: &[Recording],
        recipient: &Person,
    ) -> Result<String>;

    async fn send(&self, mail: Mail) -> Result<()>;

    async fn configuration(&self) -> Result<EmailConfiguration>;

    async fn update_configuration(&self, config: EmailConfiguration) -> Result<()>;
}

#[async_trait]
pub trait ParticipationDatabase: Send + Sync {
    async fn person(&self, id: i64) -> Result<Option<Person>>;

    async fn person_by_email(&self, email: &str) -> Result<Option<Person>>;

    async fn room(&self, id: i64) -> Result<Option<Room>>;

    async fn recordings_by_event(&self, event_ids: &[String]) -> Result<Vec<Recording>>;

    async fn blacklists(
        &self,
        kind: BlacklistType,
        name: Option<&str>,
        purpose: Option<&str>,
    ) -> Result<Vec<Blacklist>>;

    async fn blacklist_for(&self, kind: BlacklistType, blacklisted_id: i64) -> Result<Option<Blacklist>>;

    /// Blacklist owning the period.
    async fn blacklist_by_period(&self, period_id: i64) -> Result<Option<Blacklist>>;

    /// Periods with id zero receive fresh ids.
    async fn save_blacklist(&self, blacklist: Blacklist) -> Result<Blacklist>;

    async fn delete_period(&self, period_id: i64) -> Result<()>;

    async fn impacted_recordings(
        &self,
        kind: BlacklistType,
        blacklisted_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Recording>>;
}
