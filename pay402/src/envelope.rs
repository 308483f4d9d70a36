//! Structural validation of inbound payment envelopes.
//!
//! Validation checks shape, required fields and primitive types only. It does
//! not know which networks exist: an unknown network is a well-formed
//! envelope that the dispatch engine later answers negatively.
//!
//! Requirements are checked before the payload, and every problem found in
//! the failing half is reported, not just the first one.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::proto::{PaymentPayload, PaymentRequirements};

/// Top-level key of the payload half in request bodies.
pub const PAYLOAD_FIELD: &str = "paymentPayload";

/// Top-level key of the requirements half in request bodies.
pub const REQUIREMENTS_FIELD: &str = "paymentRequirements";

/// One field-level problem found during validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaIssue {
    /// Path from the request body root to the offending field.
    pub path: Vec<String>,

    /// Machine-readable issue code.
    pub code: IssueCode,

    /// Human-readable description.
    pub message: String,
}

/// Kinds of structural problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    /// A value has the wrong JSON type (including a missing required value).
    InvalidType,
    /// A string is present but empty.
    TooSmall,
    /// A string does not have the required format.
    InvalidString,
}

/// A payment envelope failed structural validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid payment envelope: {}", summary(.issues))]
pub struct SchemaViolation {
    /// Every issue found, in field order.
    pub issues: Vec<SchemaIssue>,
}

impl SchemaViolation {
    /// Returns the issues as a JSON array, as exposed to HTTP clients.
    #[must_use]
    pub fn details(&self) -> Value {
        serde_json::to_value(&self.issues).unwrap_or(Value::Null)
    }
}

fn summary(issues: &[SchemaIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("{}: {}", issue.path.join("."), issue.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validates both halves of an envelope.
///
/// Requirements are validated first; if they are malformed the payload is not
/// looked at.
///
/// # Errors
///
/// Returns [`SchemaViolation`] listing every issue of the first failing half.
pub fn validate(
    payload: &Value,
    requirements: &Value,
) -> Result<(PaymentPayload, PaymentRequirements), SchemaViolation> {
    let requirements = validate_requirements(requirements)?;
    let payload = validate_payload(payload)?;
    Ok((payload, requirements))
}

/// Validates the requirements half of an envelope.
///
/// # Errors
///
/// Returns [`SchemaViolation`] if the value does not have the requirements shape.
pub fn validate_requirements(value: &Value) -> Result<PaymentRequirements, SchemaViolation> {
    let mut check = Checker::new(REQUIREMENTS_FIELD);
    if let Some(object) = check.object(value) {
        check.non_empty_string(object, "scheme");
        check.non_empty_string(object, "network");
        check.integer_string(object, "maxAmountRequired");
        check.string(object, "resource");
        check.string(object, "description");
        check.string(object, "mimeType");
        check.non_empty_string(object, "payTo");
        check.unsigned(object, "maxTimeoutSeconds");
        check.non_empty_string(object, "asset");
        check.optional_object(object, "outputSchema");
        check.optional_object(object, "extra");
    }
    check.finish(value)
}

/// Validates the payload half of an envelope.
///
/// # Errors
///
/// Returns [`SchemaViolation`] if the value does not have the payload shape.
pub fn validate_payload(value: &Value) -> Result<PaymentPayload, SchemaViolation> {
    let mut check = Checker::new(PAYLOAD_FIELD);
    if let Some(object) = check.object(value) {
        check.unsigned(object, "x402Version");
        check.non_empty_string(object, "scheme");
        check.non_empty_string(object, "network");
        check.object_field(object, "payload");
    }
    check.finish(value)
}

/// Collects issues for one envelope half.
struct Checker {
    root: &'static str,
    issues: Vec<SchemaIssue>,
}

impl Checker {
    const fn new(root: &'static str) -> Self {
        Self {
            root,
            issues: Vec::new(),
        }
    }

    fn push(&mut self, field: Option<&str>, code: IssueCode, message: String) {
        let mut path = vec![self.root.to_owned()];
        if let Some(field) = field {
            path.push(field.to_owned());
        }
        self.issues.push(SchemaIssue {
            path,
            code,
            message,
        });
    }

    fn object<'a>(&mut self, value: &'a Value) -> Option<&'a Map<String, Value>> {
        let object = value.as_object();
        if object.is_none() {
            self.push(
                None,
                IssueCode::InvalidType,
                format!("Expected object, received {}", type_name(value)),
            );
        }
        object
    }

    fn expect_type(&mut self, field: &str, expected: &str, value: Option<&Value>) {
        let received = value.map_or("undefined", type_name);
        self.push(
            Some(field),
            IssueCode::InvalidType,
            format!("Expected {expected}, received {received}"),
        );
    }

    fn string<'a>(&mut self, object: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
        let value = object.get(field);
        let string = value.and_then(Value::as_str);
        if string.is_none() {
            self.expect_type(field, "string", value);
        }
        string
    }

    fn non_empty_string(&mut self, object: &Map<String, Value>, field: &str) {
        if self.string(object, field).is_some_and(str::is_empty) {
            self.push(
                Some(field),
                IssueCode::TooSmall,
                "String must contain at least 1 character(s)".to_owned(),
            );
        }
    }

    fn integer_string(&mut self, object: &Map<String, Value>, field: &str) {
        let Some(string) = self.string(object, field) else {
            return;
        };
        if string.is_empty() || !string.bytes().all(|b| b.is_ascii_digit()) {
            self.push(
                Some(field),
                IssueCode::InvalidString,
                "Expected a non-negative integer string".to_owned(),
            );
        }
    }

    fn unsigned(&mut self, object: &Map<String, Value>, field: &str) {
        let value = object.get(field);
        if value.and_then(Value::as_u64).is_none() {
            self.expect_type(field, "non-negative integer", value);
        }
    }

    fn object_field(&mut self, object: &Map<String, Value>, field: &str) {
        let value = object.get(field);
        if !value.is_some_and(Value::is_object) {
            self.expect_type(field, "object", value);
        }
    }

    fn optional_object(&mut self, object: &Map<String, Value>, field: &str) {
        match object.get(field) {
            None | Some(Value::Null | Value::Object(_)) => {}
            other => self.expect_type(field, "object", other),
        }
    }

    fn finish<T: DeserializeOwned>(mut self, value: &Value) -> Result<T, SchemaViolation> {
        if self.issues.is_empty() {
            match T::deserialize(value) {
                Ok(typed) => return Ok(typed),
                Err(e) => self.push(None, IssueCode::InvalidType, e.to_string()),
            }
        }
        Err(SchemaViolation {
            issues: self.issues,
        })
    }
}

const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
