//! Evaluation context and error types.

use rust_decimal::Decimal;
use time::Date;

/// Where and when a zman set is being evaluated. Immutable per
/// evaluation call, supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalContext {
    pub date: Date,
    pub latitude: Decimal,
    pub longitude: Decimal,
    /// IANA timezone name, passed through to the astronomical
    /// collaborator; the evaluator itself never interprets it
    pub timezone: String,
    /// Meters above sea level, for elevation-adjusted primitives
    pub elevation: Option<Decimal>,
}

/// Errors raised while evaluating a single zman.
///
/// `Internal` marks contract violations (an unresolved reference, an
/// AST shape the parser would never produce) -- it is a bug report,
/// not a user error, and the explainer presents it as such.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("solar depression must be between 0 and 90 degrees, got {degrees}")]
    DegreesOutOfRange { degrees: Decimal },

    #[error("the sun does not reach {degrees} degrees below the horizon on this date at this location")]
    SunAngleUnreachable { degrees: Decimal },

    #[error("internal evaluation error: {message}")]
    Internal { message: String },
}

impl EvalError {
    pub(crate) fn internal(message: impl Into<String>) -> EvalError {
        EvalError::Internal {
            message: message.into(),
        }
    }
}
