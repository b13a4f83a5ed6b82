//! Structured parse diagnostics.
//!
//! The parser never stops at the first problem. Every error and warning is
//! collected as a record carrying its 1-based line number and the offending
//! source text, so callers can render them however they like.

use std::fmt;

use thiserror::Error;

/// What went wrong on a line (or across the whole document).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptErrorKind {
    #[error("improperly formatted section tag")]
    ImproperSectionTag,
    #[error("duplicate section tag '{0}'")]
    DuplicateSection(String),
    #[error("no open section")]
    NoOpenSection,
    #[error("all blocks must come before choices in a section")]
    BlockAfterChoice,
    #[error("{0} found outside an open block or choice")]
    DanglingMeta(&'static str),
    #[error("only one transition is allowed per block or choice; keeping the first")]
    ExtraTransition,
    #[error("input names are alphanumeric only: '{0}'")]
    BadInputName(String),
    #[error("condition needs a single part before and after the operator")]
    MalformedCondition,
    #[error("no operator found for mutation")]
    MissingOperator,
    #[error("unknown mutation operator '{0}' (expected =, += or -=)")]
    BadMutationOperator(String),
    #[error("mutation needs a single part before and after the operator")]
    MalformedMutation,
    #[error("missing value after operator")]
    MissingValue,
    #[error("'{0}' needs a numeric value")]
    NonNumericStep(String),
    #[error("transition has no target")]
    EmptyTransition,
    #[error("signal has no name")]
    EmptySignal,
    #[error("improperly formatted testbed tag")]
    ImproperTestbedTag,
    #[error("testbed '{0}' was still open when another testbed started; discarding it")]
    NestedTestbed(String),
    #[error("testbed '{0}' is never closed with @end")]
    UnclosedTestbed(String),
    #[error("duplicate testbed tag '{0}'")]
    DuplicateTestbed(String),
    #[error("testbeds can only contain simple `name = value` lines")]
    TestbedAssignment,
    #[error("testbed keys are alphanumeric only: '{0}'")]
    BadTestbedKey(String),
    #[error("@end without an open testbed")]
    StrayTestbedEnd,
    #[error("tag not found for transition: '{0}'")]
    UnresolvedTransition(String),
    #[error("no endings found")]
    NoEndings,
    #[error("unhandled line")]
    Unhandled,
}

impl ScriptErrorKind {
    /// Errors whose line is simply dropped, leaving the rest of the document sound.
    /// A parse with only these still produces a document.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ScriptErrorKind::ExtraTransition)
    }
}

/// One recorded parse error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptError {
    /// 1-based line number; `None` for document-wide errors.
    pub line: Option<usize>,
    pub kind: ScriptErrorKind,
    /// The trimmed source line the error points at (empty for document-wide errors).
    pub text: String,
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {line}: {}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for ScriptError {}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptWarningKind {
    #[error("section '{0}' has no blocks or choices")]
    EmptySection(String),
    #[error("testbed '{0}' sets nothing")]
    EmptyTestbed(String),
}

/// A non-fatal finding returned alongside a successful parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptWarning {
    pub line: usize,
    pub kind: ScriptWarningKind,
}

impl fmt::Display for ScriptWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.kind)
    }
}

/// Returned by [`crate::parse_script`] when any error was recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub errors: Vec<ScriptError>,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseFailure {}
