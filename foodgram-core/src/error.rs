use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

pub const REQUIRED: &str = "This field is required.";

/// Validation messages keyed by the request field they belong to.
///
/// Serializes as `{"field": ["message", ...]}`, which is the body returned
/// to clients on a 400.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Returns `value` when no errors were collected.
    pub fn finish<T>(self, value: T) -> Result<T, ValidationError> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(ValidationError(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid input: {0}")]
pub struct ValidationError(pub FieldErrors);

impl ValidationError {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        Self(FieldErrors::single(field, message))
    }

    pub fn fields(&self) -> &FieldErrors {
        &self.0
    }
}

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Image payload is empty")]
    Empty,

    #[error("Expected a data:image/<format>;base64,<data> string")]
    NotAnImage,

    #[error("Image is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Image too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("Could not detect image format")]
    UnknownFormat,

    #[error("Unsupported image format: {0}. Allowed: JPEG, PNG, GIF, WebP")]
    UnsupportedFormat(String),

    #[error("Failed to decode image: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to build PDF: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Failed to write PDF: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unusable report font: {0}")]
    Font(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaginationError {
    #[error("Invalid page.")]
    InvalidPage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_errors_group_by_field() {
        let mut errors = FieldErrors::new();
        errors.add("name", "too long");
        errors.add("name", "empty");
        errors.add("cooking_time", "out of range");

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "cooking_time": ["out of range"],
                "name": ["too long", "empty"],
            })
        );
    }

    #[test]
    fn test_finish_passes_value_through_when_clean() {
        assert_eq!(FieldErrors::new().finish(7), Ok(7));
        let err = FieldErrors::single("email", REQUIRED).finish(7).unwrap_err();
        assert_eq!(err.fields().get("email"), Some(&[REQUIRED.to_string()][..]));
    }

    #[test]
    fn test_display_lists_every_message() {
        let mut errors = FieldErrors::new();
        errors.add("a", "x");
        errors.add("b", "y");
        assert_eq!(errors.to_string(), "a: x; b: y");
    }

    #[test]
    fn test_report_write_failure() {
        let io = std::io::Error::new(std::io::ErrorKind::WriteZero, "sink closed");
        let err: ReportError = io.into();
        assert!(matches!(err, ReportError::Io(_)));
        assert_eq!(err.to_string(), "Failed to write PDF: sink closed");
    }
}
