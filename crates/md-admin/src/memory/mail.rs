//! Message templates, signatures and the participation database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use md_common::contains_ignore_case;
use std::collections::BTreeSet;
use tracing::info;

use super::MemoryStore;
use crate::domain::{
    Blacklist, BlacklistType, EmailConfiguration, Mail, MessageSignature, MessageTemplate, Person,
    Recording, Room,
};
use crate::error::{AdminError, Result};
use crate::service::{MailService, ParticipationDatabase};

/// Base of the link a staff member follows to opt out of recording.
const OPT_OUT_LINK: &str = "/admin-ng/participation/optout";

fn recording_line(recording: &Recording) -> String {
    format!(
        "- {} ({} - {})",
        recording.title,
        recording.start.format("%Y-%m-%d %H:%M"),
        recording.end.format("%H:%M")
    )
}

/// Substitute the template variables for one recipient.
fn render_body(
    body: &str,
    signature: Option<&MessageSignature>,
    recordings: &[Recording],
    recipient: &Person,
) -> String {
    let modules: BTreeSet<&str> = recordings.iter().map(|r| r.title.as_str()).collect();
    let listing: Vec<String> = recordings.iter().map(recording_line).collect();

    let mut rendered = body
        .replace("${staff}", &recipient.name)
        .replace("${optOutLink}", &format!("{}/{}", OPT_OUT_LINK, recipient.id))
        .replace("${modules}", &modules.into_iter().collect::<Vec<_>>().join(", "))
        .replace("${recordings}", &listing.join("\n"));

    if let Some(signature) = signature {
        rendered.push_str("\n\n");
        rendered.push_str(&signature.signature);
    }
    rendered
}

#[async_trait]
impl MailService for MemoryStore {
    async fn templates(&self, creator: Option<&str>) -> Result<Vec<MessageTemplate>> {
        Ok(self
            .templates
            .read()
            .values()
            .filter(|t| creator.map_or(true, |c| t.creator == c))
            .cloned()
            .collect())
    }

    async fn template(&self, id: i64) -> Result<Option<MessageTemplate>> {
        Ok(self.templates.read().get(&id).cloned())
    }

    async fn save_template(&self, mut template: MessageTemplate) -> Result<MessageTemplate> {
        let mut templates = self.templates.write();
        if template.id == 0 {
            template.id = self.next_id();
        } else if !templates.contains_key(&template.id) {
            return Err(AdminError::not_found("MessageTemplate", template.id));
        }
        templates.insert(template.id, template.clone());
        Ok(template)
    }

    async fn delete_template(&self, id: i64) -> Result<()> {
        self.templates
            .write()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AdminError::not_found("MessageTemplate", id))
    }

    async fn signatures(&self) -> Result<Vec<MessageSignature>> {
        Ok(self.signatures.read().values().cloned().collect())
    }

    async fn signature(&self, id: i64) -> Result<Option<MessageSignature>> {
        Ok(self.signatures.read().get(&id).cloned())
    }

    async fn signature_of(&self, creator: &str) -> Result<Option<MessageSignature>> {
        Ok(self
            .signatures
            .read()
            .values()
            .find(|s| s.creator == creator)
            .cloned())
    }

    async fn save_signature(&self, mut signature: MessageSignature) -> Result<MessageSignature> {
        let mut signatures = self.signatures.write();
        if signature.id == 0 {
            signature.id = self.next_id();
        } else if !signatures.contains_key(&signature.id) {
            return Err(AdminError::not_found("MessageSignature", signature.id));
        }
        signatures.insert(signature.id, signature.clone());
        Ok(signature)
    }

    async fn delete_signature(&self, id: i64) -> Result<()> {
        self.signatures
            .write()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AdminError::not_found("MessageSignature", id))
    }

    async fn render(
        &self,
        template: &MessageTemplate,
        signature: Option<&MessageSignature>,
        recordings: &[Recording],
        recipient: &Person,
    ) -> Result<String> {
        Ok(render_body(&template.body, signature, recordings, recipient))
    }

    async fn send(&self, mail: Mail) -> Result<()> {
        if mail.recipients.is_empty() {
            return Err(AdminError::validation("A mail needs at least one recipient"));
        }
        info!(
            sender = %mail.sender.address,
            recipients = mail.recipients.len(),
            subject = %mail.subject,
            "Mail queued"
        );
        self.outbox.write().push(mail);
        Ok(())
    }

    async fn configuration(&self) -> Result<EmailConfiguration> {
        Ok(self.mail_config.read().clone())
    }

    async fn update_configuration(&self, config: EmailConfiguration) -> Result<()> {
        *self.mail_config.write() = config;
        Ok(())
    }
}

#[async_trait]
impl ParticipationDatabase for MemoryStore {
    async fn person(&self, id: i64) -> Result<Option<Person>> {
        Ok(self.persons.read().get(&id).cloned())
    }

    async fn person_by_email(&self, email: &str) -> Result<Option<Person>> {
        Ok(self
            .persons
            .read()
            .values()
            .find(|p| p.email.eq_ignore_ascii_case(email.trim()))
            .cloned())
    }

    async fn room(&self, id: i64) -> Result<Option<Room>> {
        Ok(self.rooms.read().get(&id).cloned())
    }

    async fn recordings_by_event(&self, event_ids: &[String]) -> Result<Vec<Recording>> {
        Ok(self
            .recordings
            .read()
            .iter()
            .filter(|r| event_ids.contains(&r.id))
            .cloned()
            .collect())
    }

    async fn blacklists(
        &self,
        kind: BlacklistType,
        name: Option<&str>,
        purpose: Option<&str>,
    ) -> Result<Vec<Blacklist>> {
        Ok(self
            .blacklists
            .read()
            .values()
            .filter(|b| b.blacklisted.kind == kind)
            .filter(|b| name.map_or(true, |n| contains_ignore_case(&b.blacklisted.name, n)))
            .filter_map(|b| {
                let Some(purpose) = purpose else {
                    return Some(b.clone());
                };
                let periods: Vec<_> = b
                    .periods
                    .iter()
                    .filter(|p| {
                        p.purpose
                            .as_deref()
                            .is_some_and(|actual| contains_ignore_case(actual, purpose))
                    })
                    .cloned()
                    .collect();
                (!periods.is_empty()).then(|| Blacklist {
                    periods,
                    ..b.clone()
                })
            })
            .collect())
    }

    async fn blacklist_for(&self, kind: BlacklistType, blacklisted_id: i64) -> Result<Option<Blacklist>> {
        Ok(self
            .blacklists
            .read()
            .values()
            .find(|b| b.blacklisted.kind == kind && b.blacklisted.id == blacklisted_id)
            .cloned())
    }

    async fn blacklist_by_period(&self, period_id: i64) -> Result<Option<Blacklist>> {
        Ok(self
            .blacklists
            .read()
            .values()
            .find(|b| b.periods.iter().any(|p| p.id == period_id))
            .cloned())
    }

    async fn save_blacklist(&self, mut blacklist: Blacklist) -> Result<Blacklist> {
        let mut blacklists = self.blacklists.write();
        if blacklist.id == 0 {
            blacklist.id = self.next_id();
        } else if !blacklists.contains_key(&blacklist.id) {
            return Err(AdminError::not_found("Blacklist", blacklist.id));
        }
        for period in blacklist.periods.iter_mut().filter(|p| p.id == 0) {
            period.id = self.next_id();
        }
        blacklists.insert(blacklist.id, blacklist.clone());
        Ok(blacklist)
    }

    async fn delete_period(&self, period_id: i64) -> Result<()> {
        let mut blacklists = self.blacklists.write();
        let owner = blacklists
            .values_mut()
            .find(|b| b.periods.iter().any(|p| p.id == period_id))
            .ok_or_else(|| AdminError::not_found("Period", period_id))?;
        owner.periods.retain(|p| p.id != period_id);

        if owner.periods.is_empty() {
            let id = owner.id;
            blacklists.remove(&id);
        }
        Ok(())
    }

    async fn impacted_recordings(
        &self,
        kind: BlacklistType,
        blacklisted_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Recording>> {
        Ok(self
            .recordings
            .read()
            .iter()
            .filter(|r| r.start <= end && r.end >= start)
            .filter(|r| match kind {
                BlacklistType::Person => r.staff.contains(&blacklisted_id),
                BlacklistType::Room => r.room_id == Some(blacklisted_id),
            })
            .cloned()
            .collect())
    }
}
