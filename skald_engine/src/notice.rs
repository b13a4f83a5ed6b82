//! Evaluation notices.
//!
//! Conditions and mutations never fail outright. Problems such as comparing an
//! unset value or flipping a number degrade to a safe default and are recorded
//! here instead, for the view to show and the log to keep.

use log::{error, warn};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("no state entry for '{0}'")]
    MissingInput(String),
    #[error("'{input}' is unset and cannot be compared with {operator}")]
    UnsetComparison { input: String, operator: &'static str },
    #[error("'{input}' holds type {found}, not number")]
    NotNumeric { input: String, found: &'static str },
    #[error("'{input}' is compared or stepped with non-numeric value '{literal}'")]
    NonNumericLiteral { input: String, literal: String },
    #[error("cannot flip '{input}': it holds type {found}, not boolean")]
    FlipNonBoolean { input: String, found: &'static str },
    #[error("'{0}' was unset; starting it from 0")]
    InitializedToZero(String),
    #[error("'{0}' is reserved and cannot be changed by a mutation")]
    ReservedInput(String),
    #[error("'{0}' is not an input of this script")]
    UnknownInput(String),
}

impl EvalError {
    pub fn severity(&self) -> Severity {
        match self {
            EvalError::InitializedToZero(_) | EvalError::UnknownInput(_) => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// One recorded evaluation problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub error: EvalError,
}

impl Notice {
    /// Log `error` at its severity and append it to `sink`.
    pub fn record(sink: &mut Vec<Notice>, error: EvalError) {
        let severity = error.severity();
        match severity {
            Severity::Warning => warn!("{error}"),
            Severity::Error => error!("{error}"),
        }
        sink.push(Notice { severity, error });
    }
}
