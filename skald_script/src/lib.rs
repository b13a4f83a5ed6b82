//! skald_script: line classifier, parser and compiler for Skald scripts.
//!
//! Source text is read line by line. Every line is classified by its leading
//! sigil, then the parser assembles a [`skald_data::Document`] and checks it
//! for dangling references and missing endings:
//!
//! - `#tag` opens a section
//! - `speaker: text` and `*label` open blocks, `>text` opens a choice
//! - `?cond`, `~mutation`, `:signal`, `->target` and `END` attach to the most
//!   recent block or choice
//! - `@testbed tag` ... `@end` declares a starting-state fixture
//!
//! The compiled document is written as JSON or RON by the `skald_script` binary.

mod classify;
mod error;
mod expr;
mod parser;

pub use classify::{LineKind, classify, prepare};
pub use error::{ParseFailure, ScriptError, ScriptErrorKind, ScriptWarning, ScriptWarningKind};
pub use expr::{parse_condition, parse_mutation};
pub use parser::{IMPLICIT_END_LABEL, ParseReport, parse_script, parse_script_with_report};

use skald_data::Document;

/// Output formats for a compiled document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Ron,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Ron => "ron",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("json serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("ron serialization failed: {0}")]
    Ron(#[from] ron::Error),
}

/// Serialize a parsed document in the requested format.
pub fn render_document(doc: &Document, format: OutputFormat) -> Result<String, CompileError> {
    let text = match format {
        OutputFormat::Json => serde_json::to_string_pretty(doc)?,
        OutputFormat::Ron => ron::ser::to_string_pretty(doc, ron::ser::PrettyConfig::default())?,
    };
    Ok(text)
}
