//! The closed set of error kinds the engine can report (spec §7).
//!
//! Every public entry point returns either a valid result or a single
//! [`UnitError`], carrying a kind and a one-line diagnostic tied to the span
//! of input text that caused it. There is no partial recovery: the first
//! error encountered ends the call.

use crate::sourcepos::Span;
use thiserror::Error;

/// An error from parsing or folding a unit expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitError {
    /// Unbalanced parentheses, a stray character, a missing operand, an
    /// empty function argument, or trailing tokens after a numeric constant.
    #[error("{message}")]
    Parse { span: Span, message: String },

    /// Constant folding would take the log or square root of a non-positive
    /// value, raise a negative base to a non-integer power, or divide by
    /// zero.
    #[error("{message}")]
    Domain { span: Span, message: String },

    /// The right-hand operand of `**`/`^` did not reduce to a constant.
    #[error("{message}")]
    VariableExponent { span: Span, message: String },

    /// A post-condition the engine relies on internally was violated; this
    /// always indicates a bug in the engine rather than bad input.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl UnitError {
    pub fn parse(span: Span, message: impl Into<String>) -> Self {
        UnitError::Parse {
            span,
            message: message.into(),
        }
    }

    pub fn domain(span: Span, message: impl Into<String>) -> Self {
        UnitError::Domain {
            span,
            message: message.into(),
        }
    }

    pub fn variable_exponent(span: Span) -> Self {
        UnitError::VariableExponent {
            span,
            message: "exponent of '**'/'^' must reduce to a constant".to_owned(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        UnitError::Internal {
            message: message.into(),
        }
    }

    /// The span of input text responsible for this error, if any.
    pub fn span(&self) -> Option<Span> {
        match *self {
            UnitError::Parse { span, .. } => Some(span),
            UnitError::Domain { span, .. } => Some(span),
            UnitError::VariableExponent { span, .. } => Some(span),
            UnitError::Internal { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, UnitError>;
