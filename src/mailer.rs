use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::future::BoxFuture;
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Provider rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: Option<String>,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutboundEmail {
    pub from: String,
    pub to: Vec<String>,
    pub reply_to: Option<String>,
    pub subject: String,
    pub html: String,
    pub attachments: Vec<Attachment>,
}

/// Outbound transport for rendered emails.
pub trait Mailer: Send + Sync {
    fn send<'a>(&'a self, email: &'a OutboundEmail) -> BoxFuture<'a, Result<(), MailError>>;
}

/// Sends through a transactional email HTTP API (Resend-compatible JSON).
pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl HttpMailer {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn payload(email: &OutboundEmail) -> Value {
        let attachments: Vec<Value> = email
            .attachments
            .iter()
            .map(|a| {
                let mut attachment = json!({
                    "filename": a.filename,
                    "content": STANDARD.encode(&a.content),
                });
                if let Some(content_type) = &a.content_type {
                    attachment["content_type"] = json!(content_type);
                }
                attachment
            })
            .collect();

        let mut body = json!({
            "from": email.from,
            "to": email.to,
            "subject": email.subject,
            "html": email.html,
        });
        if let Some(reply_to) = &email.reply_to {
            body["reply_to"] = json!(reply_to);
        }
        if !attachments.is_empty() {
            body["attachments"] = Value::Array(attachments);
        }
        body
    }
}

impl Mailer for HttpMailer {
    fn send<'a>(&'a self, email: &'a OutboundEmail) -> BoxFuture<'a, Result<(), MailError>> {
        Box::pin(async move {
            let response = self
                .client
                .post(&self.api_url)
                .bearer_auth(&self.api_key)
                .json(&Self::payload(email))
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(MailError::Rejected { status: status.as_u16(), body });
            }
            tracing::debug!(subject = %email.subject, to = ?email.to, "email accepted by provider");
            Ok(())
        })
    }
}
