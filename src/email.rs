//! HTML bodies for the form notification emails.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

pub type Fields = Map<String, Value>;

pub struct Rendered {
    pub subject: String,
    pub html: String,
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Field value as display text; numbers and flags are stringified.
pub fn field(fields: &Fields, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn paragraph(text: &str) -> String {
    escape_html(text).replace('\n', "<br>")
}

fn table(fields: &Fields, rows: &[(&str, &str)]) -> String {
    let mut html = String::from(r#"<table cellpadding="6" style="border-collapse:collapse">"#);
    for (key, label) in rows {
        if let Some(value) = field(fields, key) {
            html.push_str(&format!(
                r#"<tr><td style="font-weight:bold;vertical-align:top">{}</td><td>{}</td></tr>"#,
                label,
                paragraph(&value)
            ));
        }
    }
    html.push_str("</table>");
    html
}

fn layout(title: &str, body: &str, submitted_at: DateTime<Utc>) -> String {
    format!(
        r#"<!DOCTYPE html><html><body style="font-family:Arial,sans-serif;color:#222">
<h2 style="color:#b34700">{}</h2>
{}
<p style="color:#888;font-size:12px">Submitted {}</p>
</body></html>"#,
        escape_html(title),
        body,
        submitted_at.format("%Y-%m-%d %H:%M UTC")
    )
}

fn attachments_note(count: usize) -> String {
    match count {
        0 => String::new(),
        1 => "<p>1 file attached.</p>".to_string(),
        n => format!("<p>{n} files attached.</p>"),
    }
}

fn name(fields: &Fields) -> String {
    field(fields, "name").unwrap_or_else(|| "there".to_string())
}

pub fn quote_request(fields: &Fields, attachments: usize, at: DateTime<Utc>) -> Rendered {
    let mut body = table(
        fields,
        &[
            ("name", "Name"),
            ("email", "Email"),
            ("phone", "Phone"),
            ("company", "Company"),
            ("project_type", "Project type"),
            ("material", "Material"),
            ("quantity", "Quantity"),
            ("timeline", "Timeline"),
            ("message", "Details"),
        ],
    );
    if let Some(configuration) = field(fields, "configuration") {
        body.push_str(&format!(
            "<h3>Configured part</h3><pre style=\"background:#f4f4f4;padding:8px\">{}</pre>",
            escape_html(&configuration)
        ));
    }
    body.push_str(&attachments_note(attachments));
    let who = field(fields, "company").unwrap_or_else(|| name(fields));
    Rendered {
        subject: format!("New quote request from {who}"),
        html: layout("New Quote Request", &body, at),
    }
}

pub fn quote_confirmation(fields: &Fields, at: DateTime<Utc>) -> Rendered {
    let body = format!(
        "<p>Hi {},</p><p>Thanks for your quote request. Our estimating team will review \
         your project and get back to you within one business day.</p>",
        escape_html(&name(fields))
    );
    Rendered {
        subject: "We received your quote request".to_string(),
        html: layout("Quote Request Received", &body, at),
    }
}

pub fn job_application(fields: &Fields, attachments: usize, at: DateTime<Utc>) -> Rendered {
    let mut body = table(
        fields,
        &[
            ("name", "Name"),
            ("email", "Email"),
            ("phone", "Phone"),
            ("position", "Position"),
            ("experience", "Experience"),
            ("message", "Message"),
        ],
    );
    body.push_str(&attachments_note(attachments));
    let position = field(fields, "position").unwrap_or_default();
    Rendered {
        subject: format!("Job application: {} for {}", name(fields), position),
        html: layout("New Job Application", &body, at),
    }
}

pub fn application_confirmation(fields: &Fields, at: DateTime<Utc>) -> Rendered {
    let position = field(fields, "position").unwrap_or_else(|| "the open position".to_string());
    let body = format!(
        "<p>Hi {},</p><p>Thanks for applying for {}. We review every application and will \
         reach out if your experience is a match.</p>",
        escape_html(&name(fields)),
        escape_html(&position)
    );
    Rendered {
        subject: "Your application was received".to_string(),
        html: layout("Application Received", &body, at),
    }
}

pub fn capability_sheet(fields: &Fields, sheet_url: &str, at: DateTime<Utc>) -> Rendered {
    let body = format!(
        "<p>Hi {},</p><p>Here is our capability sheet covering cutting, forming, welding \
         and finishing capacity:</p><p><a href=\"{url}\">{url}</a></p>",
        escape_html(&name(fields)),
        url = escape_html(sheet_url)
    );
    Rendered {
        subject: "Your capability sheet".to_string(),
        html: layout("Capability Sheet", &body, at),
    }
}

pub fn capability_notice(fields: &Fields, at: DateTime<Utc>) -> Rendered {
    let body = table(
        fields,
        &[
            ("name", "Name"),
            ("email", "Email"),
            ("phone", "Phone"),
            ("company", "Company"),
            ("industry", "Industry"),
        ],
    );
    Rendered {
        subject: format!("Capability sheet downloaded by {}", name(fields)),
        html: layout("Capability Sheet Request", &body, at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 14, 30, 0).unwrap()
    }

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn quote_lists_supplied_fields_only() {
        let f = fields(json!({
            "name": "Pat <script>",
            "email": "pat@example.com",
            "quantity": 40,
            "message": "line one\nline two",
        }));
        let rendered = quote_request(&f, 2, at());
        assert_eq!(rendered.subject, "New quote request from Pat <script>");
        assert!(rendered.html.contains("Pat &lt;script&gt;"));
        assert!(rendered.html.contains("<td>40</td>"));
        assert!(rendered.html.contains("line one<br>line two"));
        assert!(!rendered.html.contains("Company"));
        assert!(rendered.html.contains("2 files attached."));
        assert!(rendered.html.contains("Submitted 2026-03-02 14:30 UTC"));
    }

    #[test]
    fn quote_embeds_configured_part() {
        let f = fields(json!({ "name": "Pat", "company": "Acme", "configuration": "Total: $0.64" }));
        let rendered = quote_request(&f, 0, at());
        assert_eq!(rendered.subject, "New quote request from Acme");
        assert!(rendered.html.contains("<pre"));
        assert!(rendered.html.contains("Total: $0.64"));
    }

    #[test]
    fn capability_sheet_links_the_pdf() {
        let f = fields(json!({ "name": "Sam" }));
        let rendered = capability_sheet(&f, "https://example.com/cap.pdf", at());
        assert!(rendered.html.contains(r#"<a href="https://example.com/cap.pdf">"#));
        assert!(rendered.html.contains("Hi Sam,"));
    }

    #[test]
    fn application_subject_names_position() {
        let f = fields(json!({ "name": "Lee", "position": "CNC Operator" }));
        assert_eq!(
            job_application(&f, 1, at()).subject,
            "Job application: Lee for CNC Operator"
        );
    }
}
