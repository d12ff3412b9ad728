//! Field-level checks for request bodies of the entity endpoints.

use super::resource_uri::is_valid_segment;
use super::schema_compiler::JsonSchemaCompiler;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

static ALPHANUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9]+$").unwrap());
static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+$").unwrap());
static DOTTED_IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.]+$").unwrap());

/// One rejected request field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Naming rules for the different entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameRule {
    /// Projects: letters and digits.
    Project,
    /// Schemas and messages: letters, digits and underscores.
    Identifier,
    /// Servers and apps: identifiers that may also contain dots.
    Dotted,
    /// Resources: anything usable as the name segment of a resource reference.
    Resource,
}

impl NameRule {
    pub fn max_len(self) -> usize {
        match self {
            NameRule::Resource => 100,
            _ => 45,
        }
    }

    fn matches(self, value: &str) -> bool {
        match self {
            NameRule::Project => ALPHANUMERIC.is_match(value),
            NameRule::Identifier => IDENTIFIER.is_match(value),
            NameRule::Dotted => DOTTED_IDENTIFIER.is_match(value),
            NameRule::Resource => is_valid_segment(value),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            NameRule::Project => "letters and digits",
            NameRule::Identifier => "letters, digits and underscores",
            NameRule::Dotted => "letters, digits, underscores and dots",
            NameRule::Resource => "letters, digits, underscores, dots and dashes",
        }
    }

    pub fn check(self, field: &str, value: &str) -> Option<FieldError> {
        let len = value.chars().count();
        if len == 0 {
            return Some(FieldError::new(field, "is required"));
        }
        if len > self.max_len() {
            return Some(FieldError::new(
                field,
                format!("must be at most {} characters", self.max_len()),
            ));
        }
        if !self.matches(value) {
            return Some(FieldError::new(
                field,
                format!("may only contain {}", self.describe()),
            ));
        }
        None
    }
}

/// Schema text supplied directly to the schema endpoints.
pub fn check_schema_text(field: &str, text: &str) -> Option<FieldError> {
    JsonSchemaCompiler::new()
        .compile_declared(text)
        .err()
        .map(|e| FieldError::new(field, e.to_string()))
}

/// Parse an enum-valued field, recording a field error when it is unknown.
pub fn check_token<T>(field: &str, value: &str, errors: &mut Vec<FieldError>) -> Option<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            errors.push(FieldError::new(field, e.to_string()));
            None
        }
    }
}
