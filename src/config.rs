use std::env;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "127.0.0.1:3000")
    pub bind_address: String,

    /// Directory holding the marketing pages and assets
    pub static_dir: String,

    /// Transactional email API key. Without it every form endpoint refuses to send.
    pub email_api_key: Option<String>,

    /// Transactional email API endpoint
    pub email_api_url: String,

    /// Sender shown on outgoing mail
    pub mail_from: String,

    /// Inbox receiving quote requests and capability-sheet notices
    pub sales_inbox: String,

    /// Inbox receiving job applications
    pub careers_inbox: String,

    /// Public link to the capability sheet PDF
    pub capability_sheet_url: String,

    /// Request body limit, attachments included
    pub max_upload_bytes: usize,

    /// Optional catalog file replacing the bundled one
    pub catalog_path: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid("MAX_UPLOAD_BYTES", raw))?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };
        Ok(Self {
            bind_address: var("BIND_ADDRESS", "127.0.0.1:3000"),
            static_dir: var("STATIC_DIR", "public"),
            email_api_key: lookup("EMAIL_API_KEY").filter(|k| !k.trim().is_empty()),
            email_api_url: var("EMAIL_API_URL", "https://api.resend.com/emails"),
            mail_from: var("MAIL_FROM", "Website <noreply@example.com>"),
            sales_inbox: var("SALES_INBOX", "sales@example.com"),
            careers_inbox: var("CAREERS_INBOX", "careers@example.com"),
            capability_sheet_url: var("CAPABILITY_SHEET_URL", "/downloads/capability-sheet.pdf"),
            max_upload_bytes,
            catalog_path: lookup("CATALOG_PATH"),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    Invalid(&'static str, String),
}
