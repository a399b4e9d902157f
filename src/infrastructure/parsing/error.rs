//! Error types for catalog extraction.
//!
//! Entry- and field-level failures are recoverable: the entry is dropped
//! and the run continues. Document-level failure (no entries by any
//! selector) is recoverable at run level: the batch stays empty and the
//! caller reports no data. Selector compilation failure is a
//! configuration error and is not recoverable.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ExtractionError {
    #[error("required field '{field}' not resolved for entry")]
    RequiredFieldMissing {
        field: String,
        context: Option<String>,
    },

    #[error("invalid CSS selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("no catalog entries found by any selector")]
    NoEntriesFound { tried_selectors: Vec<String> },
}

impl ExtractionError {
    pub fn required_field_missing(field: &str, context: Option<&str>) -> Self {
        Self::RequiredFieldMissing {
            field: field.to_string(),
            context: context.map(|s| s.to_string()),
        }
    }

    pub fn invalid_selector(selector: &str, reason: impl ToString) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether the run can continue after this error.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::RequiredFieldMissing { .. } => true,
            Self::NoEntriesFound { .. } => true,
            Self::InvalidSelector { .. } => false,
        }
    }
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;
