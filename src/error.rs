//! Error types for infra-config
//!
//! This module defines the error hierarchy used throughout the application.
//! We use `thiserror` for library-style errors that are part of the API;
//! the binary wraps them in `anyhow` at the boundary.

use std::fmt;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Output error: {0}")]
    Output(String),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Configuration file not found: {path}")]
    NotFound { path: String },

    #[error("Config validation error: {0}")]
    Validation(ValidationErrors),

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl ConfigError {
    /// Violations carried by a validation failure, empty for every other kind.
    pub fn violations(&self) -> &[Violation] {
        match self {
            ConfigError::Validation(errors) => errors.violations(),
            _ => &[],
        }
    }
}

/// Why a single field was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// Required field is absent
    Missing,
    /// Field is present with the wrong type
    WrongType {
        expected: &'static str,
        found: &'static str,
    },
    /// String field is present but empty
    Empty,
    /// Numeric field outside its accepted range
    OutOfRange { min: u64, max: u64 },
    /// Field failed a format check
    InvalidFormat(String),
    /// Key is not part of a closed section
    NotAllowed,
    /// Field clashes with another field
    Conflict { with: String },
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::Missing => f.write_str("is required"),
            ViolationKind::WrongType { expected, found } => {
                write!(f, "must be a {expected}, got {found}")
            }
            ViolationKind::Empty => f.write_str("is not allowed to be empty"),
            ViolationKind::OutOfRange { min, max } => {
                write!(f, "must be between {min} and {max}")
            }
            ViolationKind::InvalidFormat(reason) => f.write_str(reason),
            ViolationKind::NotAllowed => f.write_str("is not allowed"),
            ViolationKind::Conflict { with } => write!(f, "conflicts with \"{with}\""),
        }
    }
}

/// A rejected field and the reason it was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Dotted path of the field (e.g. `vpc.id`)
    pub field: String,
    pub kind: ViolationKind,
}

impl Violation {
    pub fn new(field: impl Into<String>, kind: ViolationKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" {}", self.field, self.kind)
    }
}

/// Every violation found in a single validation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<Violation>);

impl ValidationErrors {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self(violations)
    }

    pub fn violations(&self) -> &[Violation] {
        &self.0
    }

    /// Whether any violation names the given field
    pub fn mentions(&self, field: &str) -> bool {
        self.0.iter().any(|v| v.field == field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;
