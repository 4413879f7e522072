use jsonschema::Validator;
use serde_json::{Value, json};

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Quote,
    JobApplication,
    CapabilitySheet,
}

/// Checks submitted form fields against each form's JSON Schema contract
/// before anything is rendered or sent.
pub struct FormGuard {
    quote: Validator,
    job_application: Validator,
    capability_sheet: Validator,
}

fn text(max: u64) -> Value {
    json!({ "type": "string", "minLength": 1, "maxLength": max })
}

fn contract(required: &[&str], extra: &[(&str, Value)]) -> Value {
    let mut properties = serde_json::Map::new();
    properties.insert("name".into(), text(200));
    properties.insert(
        "email".into(),
        json!({ "type": "string", "maxLength": 320, "pattern": EMAIL_PATTERN }),
    );
    properties.insert("phone".into(), text(50));
    for (key, schema) in extra {
        properties.insert(key.to_string(), schema.clone());
    }
    json!({
        "type": "object",
        "required": required,
        "properties": properties,
    })
}

impl FormGuard {
    pub fn new() -> Result<Self, String> {
        let compile = |schema: Value| jsonschema::validator_for(&schema).map_err(|e| e.to_string());
        Ok(Self {
            quote: compile(contract(
                &["name", "email"],
                &[
                    ("company", text(200)),
                    ("project_type", text(200)),
                    ("material", text(200)),
                    ("quantity", json!({ "type": ["string", "integer"] })),
                    ("timeline", text(200)),
                    ("message", text(10_000)),
                    ("configuration", text(20_000)),
                ],
            ))?,
            job_application: compile(contract(
                &["name", "email", "position"],
                &[
                    ("position", text(200)),
                    ("experience", text(200)),
                    ("message", text(10_000)),
                ],
            ))?,
            capability_sheet: compile(contract(
                &["name", "email"],
                &[("company", text(200)), ("industry", text(200))],
            ))?,
        })
    }

    /// Returns the first contract violation as a client-facing message.
    pub fn check(&self, kind: FormKind, fields: &Value) -> Result<(), String> {
        let validator = match kind {
            FormKind::Quote => &self.quote,
            FormKind::JobApplication => &self.job_application,
            FormKind::CapabilitySheet => &self.capability_sheet,
        };
        validator.validate(fields).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_complete_quote() {
        let guard = FormGuard::new().unwrap();
        let fields = json!({ "name": "Pat", "email": "pat@example.com", "quantity": 25 });
        assert!(guard.check(FormKind::Quote, &fields).is_ok());
    }

    #[test]
    fn reports_missing_required_field() {
        let guard = FormGuard::new().unwrap();
        let err = guard
            .check(FormKind::Quote, &json!({ "name": "Pat" }))
            .unwrap_err();
        assert!(err.contains("email"), "{err}");
    }

    #[test]
    fn rejects_malformed_email() {
        let guard = FormGuard::new().unwrap();
        let fields = json!({ "name": "Pat", "email": "pat at example" });
        assert!(guard.check(FormKind::CapabilitySheet, &fields).is_err());
    }

    #[test]
    fn job_application_requires_position() {
        let guard = FormGuard::new().unwrap();
        let fields = json!({ "name": "Pat", "email": "pat@example.com" });
        assert!(guard.check(FormKind::JobApplication, &fields).is_err());
        let fields = json!({ "name": "Pat", "email": "pat@example.com", "position": "Welder" });
        assert!(guard.check(FormKind::JobApplication, &fields).is_ok());
    }
}
