//! # Error Types
//!
//! Domain-specific error types for gameworld-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  gameworld-core errors (this file)                                     │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  gameworld-db errors (separate crate)                                  │
//! │  └── DbError          - Store failures, wraps ValidationError          │
//! │                                                                         │
//! │  gameworld-service errors (app)                                        │
//! │  └── ServiceError     - Mapped onto tonic::Status                      │
//! │                                                                         │
//! │  Flow: ValidationError → DbError → ServiceError → Status → client      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Domain errors that are not plain input validation.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A type name that is not part of the catalogue.
    #[error("Unknown celestial object type: {0}")]
    UnknownObjectType(String),

    /// An update-mask entry that does not name an extended property.
    #[error("Unknown property field: {0}")]
    UnknownPropertyField(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any write reaches the store; always caller-correctable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Coordinate outside the playable volume.
    #[error("{field} is out of bounds (±{bound})")]
    OutOfBounds { field: String, bound: f64 },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Invalid format (e.g. non-numeric property value).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Two fields disagree with each other.
    #[error("{field} is inconsistent: {reason}")]
    Inconsistent { field: String, reason: String },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Shorthand for [`ValidationError::InvalidFormat`].
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
