//! Structured error taxonomy for parsing and dependency resolution.
//!
//! Every variant carries the data a caller needs to highlight the
//! offending span or name the failing keys. User-facing surfaces
//! render these through the explainer rather than raw `Display`.

use rust_decimal::Decimal;
use serde::Serialize;

/// Maximum expression nesting depth before the parser gives up.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Errors raised while parsing a single formula. Offsets are char
/// positions into the formula text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseError {
    #[error("unexpected {found} at offset {offset}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: String,
        offset: u32,
    },

    #[error("unbalanced parentheses at offset {offset}")]
    UnbalancedParentheses { offset: u32 },

    #[error("{function} takes {expected} arguments, got {got}")]
    WrongArgumentCount {
        function: String,
        expected: usize,
        got: usize,
        offset: u32,
    },

    #[error("unknown function '{name}'")]
    UnknownFunction { name: String, offset: u32 },

    #[error("unknown primitive '{name}'")]
    UnknownPrimitive { name: String, offset: u32 },

    #[error("'{token}' is not a direction")]
    InvalidDirection { token: String, offset: u32 },

    #[error("'{token}' is not a base system")]
    InvalidBaseSystem { token: String, offset: u32 },

    #[error("solar depression must be between 0 and 90 degrees, got {value}")]
    DegreesOutOfRange { value: Decimal, offset: u32 },

    #[error("'{text}' is not a valid duration")]
    InvalidDurationFormat { text: String, offset: u32 },

    #[error("formula nesting exceeds {limit} levels")]
    TooDeeplyNested { limit: usize },

    #[error("cannot combine two times with '+' or '-'")]
    CannotCombineTwoTimes { offset: u32 },
}

impl ParseError {
    /// Char offset of the offending token, where one exists.
    pub fn offset(&self) -> Option<u32> {
        match self {
            ParseError::UnexpectedToken { offset, .. }
            | ParseError::UnbalancedParentheses { offset }
            | ParseError::WrongArgumentCount { offset, .. }
            | ParseError::UnknownFunction { offset, .. }
            | ParseError::UnknownPrimitive { offset, .. }
            | ParseError::InvalidDirection { offset, .. }
            | ParseError::InvalidBaseSystem { offset, .. }
            | ParseError::DegreesOutOfRange { offset, .. }
            | ParseError::InvalidDurationFormat { offset, .. }
            | ParseError::CannotCombineTwoTimes { offset } => Some(*offset),
            ParseError::TooDeeplyNested { .. } => None,
        }
    }
}

/// Errors raised while resolving `@key` references across a zman set.
/// Detected before any evaluation -- a broken graph is a hard
/// validation failure, never a runtime one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DependencyError {
    #[error("circular reference: {}", cycle.join(" \u{2192} "))]
    CircularReference { cycle: Vec<String> },

    #[error("'{referenced_by}' references '@{key}', which is not defined")]
    UndefinedReference { key: String, referenced_by: String },
}
