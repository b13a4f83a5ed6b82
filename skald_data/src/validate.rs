use std::collections::HashSet;
use std::fmt;

use crate::*;

/// Structural problem found in an already-built [`Document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    DuplicateTag { kind: &'static str, tag: String },
    MissingSection { target: String, context: String },
    NoEndings,
    NoSections,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::DuplicateTag { kind, tag } => {
                write!(f, "duplicate {kind} tag '{tag}'")
            },
            ValidationError::MissingSection { target, context } => {
                write!(f, "transition to missing section '{target}' ({context})")
            },
            ValidationError::NoEndings => write!(f, "no endings found"),
            ValidationError::NoSections => write!(f, "document has no sections"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate the invariants a compiled document must satisfy before it can be played.
///
/// ```
/// use skald_data::{Block, Document, Meta, Section, validate_document};
///
/// let doc = Document {
///     sections: vec![Section {
///         tag: "start".into(),
///         blocks: vec![Block::Logic {
///             label: "END".into(),
///             meta: Meta { is_end: true, ..Meta::default() },
///         }],
///         choices: Vec::new(),
///     }],
///     ..Document::default()
/// };
/// assert!(validate_document(&doc).is_empty());
/// ```
pub fn validate_document(doc: &Document) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if doc.sections.is_empty() {
        errors.push(ValidationError::NoSections);
    }

    let mut sections = HashSet::new();
    track_tags(
        "section",
        doc.sections.iter().map(|s| s.tag.as_str()),
        &mut sections,
        &mut errors,
    );
    let mut testbeds = HashSet::new();
    track_tags(
        "testbed",
        doc.testbeds.iter().map(|t| t.tag.as_str()),
        &mut testbeds,
        &mut errors,
    );

    // one report per distinct target
    let mut reported = HashSet::new();
    for (owner, meta) in doc.metas() {
        if let Some(target) = &meta.transition
            && !sections.contains(target.as_str())
            && reported.insert(target.as_str())
        {
            errors.push(ValidationError::MissingSection {
                target: target.clone(),
                context: format!("section '{owner}'"),
            });
        }
    }

    if !doc.metas().any(|(_, meta)| meta.is_end) {
        errors.push(ValidationError::NoEndings);
    }

    errors
}

fn track_tags<'a>(
    kind: &'static str,
    tags: impl Iterator<Item = &'a str>,
    seen: &mut HashSet<&'a str>,
    errors: &mut Vec<ValidationError>,
) {
    for tag in tags {
        if !seen.insert(tag) {
            errors.push(ValidationError::DuplicateTag {
                kind,
                tag: tag.to_string(),
            });
        }
    }
}
