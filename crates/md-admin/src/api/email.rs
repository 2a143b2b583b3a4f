//! Email Admin API
//!
//! Message templates and signatures used to contact staff about upcoming
//! recordings, the preview and delivery of the rendered messages, and the
//! outgoing mail server settings.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Form, Json, Router,
};
use chrono::Utc;
use md_common::{BulkOperationResult, ListResponse, PageWindow};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::common::{
    non_blank, parse_bool_or, parse_id_array, parse_numeric_id, record_outcome, require, split_comma,
};
use crate::api::middleware::RequestContext;
use crate::domain::{
    EmailAddress, EmailConfiguration, Mail, MessageSignature, MessageTemplate, Person, Recording,
    ReviewStatus, TemplateType, TemplateVariable, User, TEMPLATE_VARIABLES,
};
use crate::error::AdminError;
use crate::service::{MailService, ParticipationDatabase, SchedulerService, UserDirectory};

/// Email service state
#[derive(Clone)]
pub struct EmailState {
    pub mail: Arc<dyn MailService>,
    pub participation: Arc<dyn ParticipationDatabase>,
    pub users: Arc<dyn UserDirectory>,
    pub scheduler: Arc<dyn SchedulerService>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TemplateListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub onlymine: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TemplateForm {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub template_type: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SignatureForm {
    pub name: Option<String>,
    pub from_name: Option<String>,
    pub from_address: Option<String>,
    pub reply_name: Option<String>,
    pub reply_address: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageForm {
    pub event_ids: Option<String>,
    pub person_ids: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    /// Append the requesting user's signature
    pub signature: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConfigurationForm {
    pub transport: Option<String>,
    pub server: Option<String>,
    pub port: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ssl: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TestMailForm {
    /// `;` separated addresses
    pub to: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
}

/// One rendered message
#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub recipient: Person,
    pub body: String,
}

fn parse_template_type(value: &str) -> Result<TemplateType, AdminError> {
    TemplateType::parse(value)
        .ok_or_else(|| AdminError::validation(format!("Unknown template type '{}'", value)))
}

async fn require_template(state: &EmailState, id: &str) -> Result<MessageTemplate, AdminError> {
    let id = parse_numeric_id(id, "id")?;
    state
        .mail
        .template(id)
        .await?
        .ok_or_else(|| AdminError::not_found("MessageTemplate", id))
}

async fn require_signature(state: &EmailState, id: &str) -> Result<MessageSignature, AdminError> {
    let id = parse_numeric_id(id, "id")?;
    state
        .mail
        .signature(id)
        .await?
        .ok_or_else(|| AdminError::not_found("MessageSignature", id))
}

pub async fn get_variables() -> Json<&'static [TemplateVariable]> {
    Json(TEMPLATE_VARIABLES)
}

/// List templates, optionally only those of the requesting user
pub async fn list_templates(
    State(state): State<EmailState>,
    ctx: RequestContext,
    Query(params): Query<TemplateListParams>,
) -> Result<Json<ListResponse<MessageTemplate>>, AdminError> {
    let only_mine = parse_bool_or(params.onlymine.as_deref(), "onlymine", false)?;
    let window = PageWindow::new(params.limit.unwrap_or(0), params.offset.unwrap_or(0));

    let creator = only_mine.then_some(ctx.username.as_str());
    let mut templates = state.mail.templates(creator).await?;
    templates.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    let total = templates.len() as u64;

    Ok(Json(ListResponse::new(
        window.apply(templates),
        window.offset,
        window.limit,
        total,
    )))
}

pub async fn get_template(
    State(state): State<EmailState>,
    Path(id): Path<String>,
) -> Result<Json<MessageTemplate>, AdminError> {
    Ok(Json(require_template(&state, &id).await?))
}

pub async fn create_template(
    State(state): State<EmailState>,
    ctx: RequestContext,
    Form(form): Form<TemplateForm>,
) -> Result<Json<MessageTemplate>, AdminError> {
    let name = require(form.name, "name")?;
    let template_type = parse_template_type(&require(form.template_type, "type")?)?;

    let template = MessageTemplate::new(
        name,
        &ctx.username,
        form.subject.unwrap_or_default(),
        form.body.unwrap_or_default(),
        template_type,
    );

    let created = state.mail.save_template(template).await?;
    info!(template_id = created.id, creator = %created.creator, "Message template created");
    Ok(Json(created))
}

pub async fn update_template(
    State(state): State<EmailState>,
    Path(id): Path<String>,
    Form(form): Form<TemplateForm>,
) -> Result<Json<MessageTemplate>, AdminError> {
    // A bad type is 400 even for unknown ids
    let template_type = non_blank(form.template_type)
        .map(|t| parse_template_type(&t))
        .transpose()?;
    let mut template = require_template(&state, &id).await?;

    if let Some(name) = non_blank(form.name) {
        template.name = name;
    }
    if let Some(template_type) = template_type {
        template.template_type = template_type;
    }
    if let Some(subject) = form.subject {
        template.subject = subject;
    }
    if let Some(body) = form.body {
        template.body = body;
    }

    Ok(Json(state.mail.save_template(template).await?))
}

pub async fn delete_template(
    State(state): State<EmailState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AdminError> {
    let template = require_template(&state, &id).await?;
    state.mail.delete_template(template.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a JSON list of template ids
pub async fn delete_templates(
    State(state): State<EmailState>,
    body: String,
) -> Result<Json<BulkOperationResult>, AdminError> {
    let ids = parse_id_array(&body)?;

    let mut result = BulkOperationResult::new();
    for id in ids {
        let outcome = match parse_numeric_id(&id, "id") {
            Ok(numeric) => state.mail.delete_template(numeric).await,
            Err(e) => Err(AdminError::internal(e.to_string())),
        };
        record_outcome(&mut result, &id, outcome);
    }
    Ok(Json(result))
}

pub async fn list_signatures(
    State(state): State<EmailState>,
) -> Result<Json<Vec<MessageSignature>>, AdminError> {
    Ok(Json(state.mail.signatures().await?))
}

pub async fn get_signature(
    State(state): State<EmailState>,
    Path(id): Path<String>,
) -> Result<Json<MessageSignature>, AdminError> {
    Ok(Json(require_signature(&state, &id).await?))
}

fn reply_address(name: Option<String>, address: Option<String>) -> Option<EmailAddress> {
    non_blank(address).map(|a| EmailAddress::new(a, non_blank(name)))
}

pub async fn create_signature(
    State(state): State<EmailState>,
    ctx: RequestContext,
    Form(form): Form<SignatureForm>,
) -> Result<Json<MessageSignature>, AdminError> {
    let name = require(form.name, "name")?;
    let from_address = require(form.from_address, "from_address")?;

    let signature = MessageSignature {
        id: 0,
        name,
        creator: ctx.username.clone(),
        sender: EmailAddress::new(from_address, non_blank(form.from_name)),
        reply_to: reply_address(form.reply_name, form.reply_address),
        signature: form.text.unwrap_or_default(),
        created_at: Utc::now(),
    };

    let created = state.mail.save_signature(signature).await?;
    info!(signature_id = created.id, creator = %created.creator, "Message signature created");
    Ok(Json(created))
}

pub async fn update_signature(
    State(state): State<EmailState>,
    Path(id): Path<String>,
    Form(form): Form<SignatureForm>,
) -> Result<Json<MessageSignature>, AdminError> {
    let mut signature = require_signature(&state, &id).await?;

    if let Some(name) = non_blank(form.name) {
        signature.name = name;
    }
    if let Some(address) = non_blank(form.from_address) {
        signature.sender = EmailAddress::new(address, non_blank(form.from_name));
    }
    if form.reply_address.is_some() {
        signature.reply_to = reply_address(form.reply_name, form.reply_address);
    }
    if let Some(text) = form.text {
        signature.signature = text;
    }

    Ok(Json(state.mail.save_signature(signature).await?))
}

pub async fn delete_signature(
    State(state): State<EmailState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AdminError> {
    let signature = require_signature(&state, &id).await?;
    state.mail.delete_signature(signature.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// A template ready to go out to a list of recipients
struct Composition {
    event_ids: Vec<String>,
    template: MessageTemplate,
    signature: Option<MessageSignature>,
    include_signature: bool,
    recipients: Vec<(Person, Vec<Recording>)>,
}

impl Composition {
    fn appended_signature(&self) -> Option<&MessageSignature> {
        self.signature.as_ref().filter(|_| self.include_signature)
    }
}

async fn requesting_user(state: &EmailState, ctx: &RequestContext) -> Result<Option<User>, AdminError> {
    state.users.user(&ctx.organization, &ctx.username).await
}

/// Validate a preview or send request and load everything it refers to.
///
/// The requesting user must be known to participation management as a
/// person (412 otherwise), and so must every recipient (404).
async fn compose(
    state: &EmailState,
    ctx: &RequestContext,
    id: &str,
    form: MessageForm,
) -> Result<Composition, AdminError> {
    let event_ids = split_comma(form.event_ids.as_deref());
    let person_ids = split_comma(form.person_ids.as_deref())
        .iter()
        .map(|p| parse_numeric_id(p, "personIds"))
        .collect::<Result<Vec<_>, _>>()?;
    if event_ids.is_empty() || person_ids.is_empty() {
        return Err(AdminError::validation("eventIds and personIds must not be empty"));
    }
    let include_signature = parse_bool_or(form.signature.as_deref(), "signature", false)?;

    let mut template = require_template(state, id).await?;
    if let Some(subject) = non_blank(form.subject) {
        template.subject = subject;
    }
    if let Some(body) = non_blank(form.body) {
        template.body = body;
    }

    let email = requesting_user(state, ctx).await?.and_then(|u| u.email);
    let sender = match email {
        Some(email) => state.participation.person_by_email(&email).await?,
        None => None,
    };
    if sender.is_none() {
        return Err(AdminError::precondition_failed(format!(
            "User {} is not registered as a person",
            ctx.username
        )));
    }

    let signature = state.mail.signature_of(&ctx.username).await?;
    if include_signature && signature.is_none() {
        return Err(AdminError::precondition_failed(format!(
            "User {} has no message signature",
            ctx.username
        )));
    }

    let recordings = state.participation.recordings_by_event(&event_ids).await?;
    let mut recipients = Vec::with_capacity(person_ids.len());
    for person_id in person_ids {
        let person = state
            .participation
            .person(person_id)
            .await?
            .ok_or_else(|| AdminError::not_found("Person", person_id))?;
        let theirs: Vec<_> = recordings
            .iter()
            .filter(|r| r.staff.contains(&person.id))
            .cloned()
            .collect();
        recipients.push((person, theirs));
    }

    Ok(Composition {
        event_ids,
        template,
        signature,
        include_signature,
        recipients,
    })
}

/// Render a template for each requested person.
pub async fn preview(
    State(state): State<EmailState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Form(form): Form<MessageForm>,
) -> Result<Json<Vec<PreviewResponse>>, AdminError> {
    let composition = compose(&state, &ctx, &id, form).await?;

    let mut previews = Vec::with_capacity(composition.recipients.len());
    for (person, recordings) in &composition.recipients {
        let body = state
            .mail
            .render(
                &composition.template,
                composition.appended_signature(),
                recordings,
                person,
            )
            .await?;
        previews.push(PreviewResponse {
            recipient: person.clone(),
            body,
        });
    }

    Ok(Json(previews))
}

/// Mail the rendered template to each requested person and mark the events
/// as waiting for confirmation.
///
/// The requesting user's signature provides the sender address, so sending
/// needs one even when it is not appended to the body.
pub async fn send(
    State(state): State<EmailState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    Form(form): Form<MessageForm>,
) -> Result<StatusCode, AdminError> {
    let composition = compose(&state, &ctx, &id, form).await?;
    let Some(signature) = composition.signature.as_ref() else {
        return Err(AdminError::precondition_failed(format!(
            "User {} has no message signature",
            ctx.username
        )));
    };

    for (person, recordings) in &composition.recipients {
        let body = state
            .mail
            .render(
                &composition.template,
                composition.appended_signature(),
                recordings,
                person,
            )
            .await?;
        state
            .mail
            .send(Mail {
                sender: signature.sender.clone(),
                reply_to: signature.reply_to.clone(),
                recipients: vec![EmailAddress::new(&person.email, Some(person.name.clone()))],
                subject: composition.template.subject.clone(),
                body,
            })
            .await?;
    }

    for event_id in &composition.event_ids {
        if let Err(e) = state
            .scheduler
            .set_review_status(event_id, ReviewStatus::Unconfirmed)
            .await
        {
            warn!(event_id = %event_id, error = %e, "Unable to update review status");
        }
    }

    info!(
        template_id = composition.template.id,
        recipients = composition.recipients.len(),
        sender = %ctx.username,
        "Messages sent"
    );
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_configuration(
    State(state): State<EmailState>,
) -> Result<Json<EmailConfiguration>, AdminError> {
    Ok(Json(state.mail.configuration().await?))
}

pub async fn update_configuration(
    State(state): State<EmailState>,
    Form(form): Form<ConfigurationForm>,
) -> Result<Json<EmailConfiguration>, AdminError> {
    let port = require(form.port, "port")?;
    let config = EmailConfiguration {
        transport: require(form.transport, "transport")?,
        server: require(form.server, "server")?,
        port: port
            .parse()
            .map_err(|_| AdminError::validation(format!("Invalid port '{}'", port)))?,
        username: non_blank(form.username),
        password: non_blank(form.password),
        ssl: parse_bool_or(form.ssl.as_deref(), "ssl", false)?,
    };

    state.mail.update_configuration(config.clone()).await?;
    info!(server = %config.server, port = config.port, "Mail configuration updated");
    Ok(Json(config))
}

/// Send a plain message to check the mail server settings
pub async fn send_test_mail(
    State(state): State<EmailState>,
    ctx: RequestContext,
    Form(form): Form<TestMailForm>,
) -> Result<StatusCode, AdminError> {
    let recipients: Vec<EmailAddress> = form
        .to
        .as_deref()
        .unwrap_or_default()
        .split(';')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(|a| EmailAddress::new(a, None))
        .collect();
    if recipients.is_empty() {
        return Err(AdminError::validation("Missing required field 'to'"));
    }

    let user = requesting_user(&state, &ctx).await?;
    let Some(address) = user.as_ref().and_then(|u| u.email.clone()) else {
        return Err(AdminError::precondition_failed(format!(
            "User {} has no email address",
            ctx.username
        )));
    };
    let sender = EmailAddress::new(address, user.and_then(|u| u.name));

    state
        .mail
        .send(Mail {
            sender,
            reply_to: None,
            recipients,
            subject: form.subject.unwrap_or_default(),
            body: form.body.unwrap_or_default(),
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Build email router
pub fn email_router(state: EmailState) -> Router {
    Router::new()
        .route("/variables.json", get(get_variables))
        .route("/templates.json", get(list_templates))
        .route("/template", post(create_template))
        .route(
            "/template/:id",
            get(get_template).put(update_template).delete(delete_template),
        )
        .route("/deleteTemplates", post(delete_templates))
        .route("/signatures.json", get(list_signatures))
        .route("/signature", post(create_signature))
        .route(
            "/signature/:id",
            get(get_signature).put(update_signature).delete(delete_signature),
        )
        .route("/preview/:id", post(preview))
        .route("/send/:id", post(send))
        .route("/sendtestmail", post(send_test_mail))
        .route(
            "/configuration",
            get(get_configuration).put(update_configuration),
        )
        .with_state(state)
}
