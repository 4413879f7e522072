//! Quote, job application and capability-sheet form endpoints.
//!
//! Each submission is validated, rendered to HTML and handed to the mailer.
//! The primary message decides the response; the follow-up message is best
//! effort and only logged when it fails.

use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::header,
    Json,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::email::{self, Fields, Rendered};
use crate::error::ApiError;
use crate::guard::FormKind;
use crate::mailer::{Attachment, Mailer, OutboundEmail};
use crate::routes::AppState;

const MAX_ATTACHMENTS: usize = 10;

/// Normalised form data: trimmed non-empty fields plus uploaded files.
#[derive(Debug, Default)]
pub struct Submission {
    pub fields: Fields,
    pub attachments: Vec<Attachment>,
}

impl Submission {
    fn insert(&mut self, key: String, value: Value) {
        match value {
            Value::Null => {}
            Value::String(s) => {
                let trimmed = s.trim();
                if !trimmed.is_empty() {
                    self.fields.insert(key, Value::String(trimmed.to_string()));
                }
            }
            other => {
                self.fields.insert(key, other);
            }
        }
    }

    fn email(&self) -> Option<String> {
        email::field(&self.fields, "email")
    }
}

#[derive(Deserialize)]
struct JsonAttachment {
    filename: String,
    #[serde(default)]
    content_type: Option<String>,
    content: String,
}

impl<S> FromRequest<S> for Submission
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let submission = if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            from_multipart(multipart).await?
        } else if content_type.starts_with("application/json") {
            let Json(body) = Json::<Value>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            from_json(body)?
        } else {
            return Err(ApiError::BadRequest(
                "Expected a multipart/form-data or application/json body".into(),
            ));
        };

        if submission.attachments.len() > MAX_ATTACHMENTS {
            return Err(ApiError::BadRequest(format!(
                "At most {MAX_ATTACHMENTS} files may be attached"
            )));
        }
        Ok(submission)
    }
}

async fn from_multipart(mut multipart: Multipart) -> Result<Submission, ApiError> {
    let mut submission = Submission::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        match filename {
            // Browsers send an empty part for untouched file inputs.
            Some(filename) if !filename.is_empty() && !bytes.is_empty() => {
                submission.attachments.push(Attachment {
                    filename,
                    content_type,
                    content: bytes.to_vec(),
                });
            }
            Some(_) => {}
            None => {
                let text = String::from_utf8_lossy(&bytes).into_owned();
                submission.insert(name, Value::String(text));
            }
        }
    }
    Ok(submission)
}

fn from_json(body: Value) -> Result<Submission, ApiError> {
    let Value::Object(map) = body else {
        return Err(ApiError::BadRequest("Expected a JSON object".into()));
    };
    let mut submission = Submission::default();
    for (key, value) in map {
        if key == "attachments" {
            let files: Vec<JsonAttachment> = serde_json::from_value(value)
                .map_err(|e| ApiError::BadRequest(format!("Invalid attachments: {e}")))?;
            for file in files {
                let content = STANDARD.decode(file.content.as_bytes()).map_err(|_| {
                    ApiError::BadRequest(format!("Attachment '{}' is not valid base64", file.filename))
                })?;
                submission.attachments.push(Attachment {
                    filename: file.filename,
                    content_type: file.content_type,
                    content,
                });
            }
        } else {
            submission.insert(key, value);
        }
    }
    Ok(submission)
}

fn outbound(state: &AppState, to: String, reply_to: Option<String>, rendered: Rendered) -> OutboundEmail {
    OutboundEmail {
        from: state.config.mail_from.clone(),
        to: vec![to],
        reply_to,
        subject: rendered.subject,
        html: rendered.html,
        attachments: Vec::new(),
    }
}

async fn deliver(
    mailer: &Arc<dyn Mailer>,
    kind: FormKind,
    primary: OutboundEmail,
    follow_up: Option<OutboundEmail>,
) -> Result<Json<Value>, ApiError> {
    mailer
        .send(&primary)
        .await
        .map_err(|e| ApiError::Delivery(e.to_string()))?;
    tracing::info!(?kind, subject = %primary.subject, "form submission delivered");

    if let Some(follow_up) = follow_up {
        if let Err(e) = mailer.send(&follow_up).await {
            tracing::warn!(?kind, error = %e, "follow-up email failed");
        }
    }
    Ok(Json(json!({ "success": true })))
}

fn accept(state: &AppState, kind: FormKind, submission: &Submission) -> Result<Arc<dyn Mailer>, ApiError> {
    let mailer = state.mailer()?;
    state
        .guard
        .check(kind, &Value::Object(submission.fields.clone()))
        .map_err(ApiError::BadRequest)?;
    Ok(mailer)
}

pub async fn submit_quote(
    State(state): State<AppState>,
    submission: Submission,
) -> Result<Json<Value>, ApiError> {
    let mailer = accept(&state, FormKind::Quote, &submission)?;
    let now = Utc::now();
    let reply_to = submission.email();

    let mut primary = outbound(
        &state,
        state.config.sales_inbox.clone(),
        reply_to.clone(),
        email::quote_request(&submission.fields, submission.attachments.len(), now),
    );
    primary.attachments = submission.attachments;
    let confirmation = reply_to
        .map(|to| outbound(&state, to, None, email::quote_confirmation(&submission.fields, now)));

    deliver(&mailer, FormKind::Quote, primary, confirmation).await
}

pub async fn submit_application(
    State(state): State<AppState>,
    submission: Submission,
) -> Result<Json<Value>, ApiError> {
    let mailer = accept(&state, FormKind::JobApplication, &submission)?;
    let now = Utc::now();
    let reply_to = submission.email();

    let mut primary = outbound(
        &state,
        state.config.careers_inbox.clone(),
        reply_to.clone(),
        email::job_application(&submission.fields, submission.attachments.len(), now),
    );
    primary.attachments = submission.attachments;
    let confirmation = reply_to
        .map(|to| outbound(&state, to, None, email::application_confirmation(&submission.fields, now)));

    deliver(&mailer, FormKind::JobApplication, primary, confirmation).await
}

pub async fn request_capability_sheet(
    State(state): State<AppState>,
    submission: Submission,
) -> Result<Json<Value>, ApiError> {
    let mailer = accept(&state, FormKind::CapabilitySheet, &submission)?;
    let now = Utc::now();
    let requester = submission
        .email()
        .ok_or_else(|| ApiError::BadRequest("\"email\" is a required property".into()))?;

    let primary = outbound(
        &state,
        requester.clone(),
        None,
        email::capability_sheet(&submission.fields, &state.config.capability_sheet_url, now),
    );
    let notice = outbound(
        &state,
        state.config.sales_inbox.clone(),
        Some(requester),
        email::capability_notice(&submission.fields, now),
    );

    deliver(&mailer, FormKind::CapabilitySheet, primary, Some(notice)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_fields_are_trimmed_and_blanks_dropped() {
        let submission = from_json(json!({
            "name": "  Pat  ",
            "company": "   ",
            "phone": null,
            "quantity": 12,
        }))
        .unwrap();
        assert_eq!(submission.fields["name"], "Pat");
        assert_eq!(submission.fields["quantity"], 12);
        assert!(!submission.fields.contains_key("company"));
        assert!(!submission.fields.contains_key("phone"));
    }

    #[test]
    fn json_attachments_are_decoded() {
        let submission = from_json(json!({
            "name": "Pat",
            "attachments": [{ "filename": "a.txt", "content": "aGk=" }],
        }))
        .unwrap();
        assert_eq!(submission.attachments[0].content, b"hi");
        assert!(!submission.fields.contains_key("attachments"));
    }

    #[test]
    fn rejects_invalid_base64_and_non_objects() {
        let bad = json!({ "attachments": [{ "filename": "a.txt", "content": "!!" }] });
        assert!(matches!(from_json(bad), Err(ApiError::BadRequest(_))));
        assert!(matches!(from_json(json!(["x"])), Err(ApiError::BadRequest(_))));
    }
}
