//! Field-level validation shared by the blog and account forms.
//!
//! Each form owns a `clean` method: it trims the submitted values, runs the
//! form's `validator` derive checks plus the few rules those cannot express,
//! and collects every problem into a [`FieldErrors`] before anything is
//! written. A rejected submission never produces a partial save.

use std::collections::BTreeMap;
use std::fmt;

use validator::{ValidationError, ValidationErrors};

/// Key used for errors that belong to the form as a whole.
pub const NON_FIELD: &str = "__all__";

pub const REQUIRED: &str = "This field is required.";

pub const INVALID_EMAIL: &str = "Enter a valid email address.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// First message for a field, used by templates next to the input.
    pub fn first(&self, field: &str) -> Option<&str> {
        self.errors
            .get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    pub fn non_field(&self) -> Option<&str> {
        self.first(NON_FIELD)
    }

    /// `Ok(value)` when nothing was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.errors {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                first = false;
                write!(f, "{}: {}", field, message)?;
            }
        }
        Ok(())
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = FieldErrors::default();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors.iter() {
                fields.add(&field, describe(error));
            }
        }
        fields
    }
}

/// Start a form's error set from its derive checks; rules the derive cannot
/// express are added on top.
pub fn collect(result: Result<(), ValidationErrors>) -> FieldErrors {
    result.err().map(FieldErrors::from).unwrap_or_default()
}

/// Message shown next to the input for one failed check.
fn describe(error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }
    match error.code.as_ref() {
        "length" => {
            let blank = error
                .params
                .get("value")
                .and_then(|value| value.as_str())
                .is_some_and(str::is_empty);
            match error.params.get("max").and_then(|max| max.as_u64()) {
                Some(max) if !blank => {
                    format!("Ensure this value has at most {} characters.", max)
                }
                _ => REQUIRED.to_string(),
            }
        }
        "email" => INVALID_EMAIL.to_string(),
        code => format!("Invalid value ({}).", code),
    }
}
