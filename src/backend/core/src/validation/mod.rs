//! Input validation for project and comment payloads.
//!
//! Validation is accumulating: all field problems on a payload are gathered
//! into one [`ValidationErrors`] value so the client can fix everything in a
//! single round trip. Conversion into [`CoterieError`] yields a 422 whose
//! details carry the per-field messages.

use std::collections::HashMap;
use std::fmt;

use crate::error::{CoterieError, ErrorCode, ErrorDetails};
use crate::store::ProjectFields;

/// Maximum length of a project name.
pub const MAX_PROJECT_NAME_LEN: usize = 100;

/// Maximum length of a comment body.
pub const MAX_COMMENT_LEN: usize = 500;

/// Accumulated field-level validation failures.
#[derive(Debug, Default, Clone)]
pub struct ValidationErrors {
    fields: HashMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Finish validation: `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), CoterieError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self.into())
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl From<ValidationErrors> for CoterieError {
    fn from(errors: ValidationErrors) -> Self {
        let mut details = ErrorDetails::new();
        for (field, messages) in &errors.fields {
            for message in messages {
                details = details.with_field_error(field.clone(), message.clone());
            }
        }
        CoterieError::new(ErrorCode::ValidationError, "Validation failed").with_details(details)
    }
}

/// Validate the editable fields of a project for create and update.
pub fn validate_project_fields(fields: &ProjectFields) -> Result<(), CoterieError> {
    let mut errors = ValidationErrors::new();

    let name = fields.name.trim();
    if name.is_empty() {
        errors.push("name", "This field is required");
    } else if name.chars().count() > MAX_PROJECT_NAME_LEN {
        errors.push(
            "name",
            format!("Must be at most {} characters", MAX_PROJECT_NAME_LEN),
        );
    }

    if let Some(end) = fields.end_date {
        if end < fields.start_date {
            errors.push("end_date", "End date must not precede the start date");
        }
    }

    errors.into_result()
}

/// Validate a comment body. Returns the trimmed text on success.
pub fn validate_comment_text(text: &str) -> Result<&str, CoterieError> {
    let trimmed = text.trim();
    let mut errors = ValidationErrors::new();

    if trimmed.is_empty() {
        errors.push("text", "This field is required");
    } else if trimmed.chars().count() > MAX_COMMENT_LEN {
        errors.push(
            "text",
            format!("Must be at most {} characters", MAX_COMMENT_LEN),
        );
    }

    errors.into_result()?;
    Ok(trimmed)
}

/// Validate a username used to address the directory. Rejects empties early
/// so handlers never hit the store with a blank lookup.
pub fn validate_username(username: &str) -> Result<&str, CoterieError> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        let mut errors = ValidationErrors::new();
        errors.push("username", "This field is required");
        return Err(errors.into());
    }
    Ok(trimmed)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
