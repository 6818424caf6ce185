//! Validation error types
//!
//! All user input is validated when building domain types.
//! Invalid input returns `ValidationError`, not panic.

use thiserror::Error;

/// Validation error for domain models
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Field is missing or blank when it shouldn't be
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Field exceeds maximum length
    #[error("{field} exceeds maximum length of {max} characters")]
    TooLong { field: &'static str, max: usize },

    /// String doesn't match required format
    #[error("{field}: {reason}")]
    InvalidFormat {
        field: &'static str,
        reason: &'static str,
    },

    /// Invalid enum variant
    #[error("invalid {field} value: '{value}'")]
    InvalidVariant { field: &'static str, value: String },

    /// List item contains the storage delimiter
    #[error("{field} entries must not contain '{delimiter}'")]
    ContainsDelimiter { field: &'static str, delimiter: char },

    /// Numeric field below zero
    #[error("{field} must not be negative")]
    Negative { field: &'static str },

    /// Referenced entity does not exist
    #[error("{resource} '{id}' does not exist")]
    UnknownReference { resource: &'static str, id: String },

    /// Request body could not be parsed
    #[error("malformed request body: {0}")]
    Malformed(String),
}

/// Reject blank strings, returning the value untouched otherwise.
pub(crate) fn required(field: &'static str, value: Option<String>) -> Result<String, ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ValidationError::Empty { field }),
    }
}

pub(crate) fn max_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

pub(crate) fn max_len_opt(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<(), ValidationError> {
    value.map_or(Ok(()), |v| max_len(field, v, max))
}
