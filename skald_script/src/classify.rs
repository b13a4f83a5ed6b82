//! Line classifier.
//!
//! Each source line is prepared (trimmed, comments stripped) and then sorted
//! into exactly one syntactic role by its leading sigil. The classifier keeps
//! no state of its own: the only context it needs, whether a testbed region is
//! open, is passed in by the parser.

use std::sync::LazyLock;

use regex::Regex;
use skald_data::is_tag;

use crate::error::ScriptErrorKind;

static SECTION_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#([A-Za-z0-9-]+)$").expect("section header pattern"));
static BLOCK_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9]+):").expect("block header pattern"));

const TESTBED_OPEN: &str = "@testbed";
const TESTBED_CLOSE: &str = "@end";
const END_MARKER: &str = "END";

/// The role of one prepared source line, borrowing its payload from the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    TestbedOpen(&'a str),
    TestbedClose,
    TestbedSet { key: &'a str, value: &'a str },
    Section(&'a str),
    Attributed { speaker: &'a str, body: &'a str },
    Logic(&'a str),
    Choice(&'a str),
    Condition(&'a str),
    Mutation(&'a str),
    Signal(&'a str),
    Transition(&'a str),
    End,
}

impl LineKind<'_> {
    /// Name used when a meta line shows up with nothing to attach to.
    pub fn meta_name(&self) -> Option<&'static str> {
        match self {
            LineKind::Condition(_) => Some("condition"),
            LineKind::Mutation(_) => Some("mutation"),
            LineKind::Signal(_) => Some("signal"),
            LineKind::Transition(_) => Some("transition"),
            LineKind::End => Some("end marker"),
            _ => None,
        }
    }
}

/// Trim a raw line and strip comments; `None` means the line carries nothing.
///
/// ```
/// use skald_script::prepare;
///
/// assert_eq!(prepare("  >Go north // sneaky  "), Some(">Go north"));
/// assert_eq!(prepare("// whole line"), None);
/// assert_eq!(prepare("   "), None);
/// ```
pub fn prepare(raw: &str) -> Option<&str> {
    let line = raw.trim();
    if line.is_empty() || line.starts_with("//") {
        return None;
    }
    let line = match line.find("//") {
        Some(idx) => line[..idx].trim(),
        None => line,
    };
    (!line.is_empty()).then_some(line)
}

/// Classify a prepared line.
///
/// Inside a testbed region only assignments, `@end` and a new `@testbed` are
/// recognized; everything else is a malformed assignment.
pub fn classify(line: &str, in_testbed: bool) -> Result<LineKind<'_>, ScriptErrorKind> {
    if let Some(rest) = line.strip_prefix(TESTBED_OPEN) {
        return testbed_tag(rest).map(LineKind::TestbedOpen);
    }
    if line == TESTBED_CLOSE {
        return if in_testbed {
            Ok(LineKind::TestbedClose)
        } else {
            Err(ScriptErrorKind::StrayTestbedEnd)
        };
    }
    if in_testbed {
        return testbed_assignment(line);
    }

    if line.starts_with('#') {
        return SECTION_HEADER
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|tag| LineKind::Section(tag.as_str()))
            .ok_or(ScriptErrorKind::ImproperSectionTag);
    }
    if let Some(caps) = BLOCK_HEADER.captures(line)
        && let Some(whole) = caps.get(0)
        && let Some(speaker) = caps.get(1)
    {
        return Ok(LineKind::Attributed {
            speaker: speaker.as_str(),
            body: line[whole.end()..].trim(),
        });
    }

    let kind = if let Some(rest) = line.strip_prefix('*') {
        LineKind::Logic(rest.trim())
    } else if let Some(rest) = line.strip_prefix('>') {
        LineKind::Choice(rest.trim())
    } else if let Some(rest) = line.strip_prefix('?') {
        LineKind::Condition(rest.trim())
    } else if let Some(rest) = line.strip_prefix('~') {
        LineKind::Mutation(rest.trim())
    } else if let Some(rest) = line.strip_prefix(':') {
        LineKind::Signal(rest.trim())
    } else if let Some(rest) = line.strip_prefix("->") {
        LineKind::Transition(rest.trim())
    } else if line == END_MARKER {
        LineKind::End
    } else {
        return Err(ScriptErrorKind::Unhandled);
    };
    Ok(kind)
}

fn testbed_tag(rest: &str) -> Result<&str, ScriptErrorKind> {
    if !rest.starts_with(char::is_whitespace) {
        return Err(ScriptErrorKind::ImproperTestbedTag);
    }
    let tag = rest.trim();
    if is_tag(tag) {
        Ok(tag)
    } else {
        Err(ScriptErrorKind::ImproperTestbedTag)
    }
}

fn testbed_assignment(line: &str) -> Result<LineKind<'_>, ScriptErrorKind> {
    let mut parts = line.split('=');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(key), Some(value), None) => Ok(LineKind::TestbedSet {
            key: key.trim(),
            value: value.trim(),
        }),
        _ => Err(ScriptErrorKind::TestbedAssignment),
    }
}
