//! Script parser.
//!
//! A single forward pass over prepared lines. The parser carries an explicit
//! [`ParseContext`] instead of loose "current block/choice/testbed" slots,
//! collects every error it meets, then runs the document-wide checks
//! (unresolved transitions, missing endings). A document is only handed back
//! when every recorded error is recoverable.

use std::collections::HashSet;

use log::{debug, warn};
use skald_data::{Block, Choice, Document, Meta, Section, Testbed, Value, is_identifier};

use crate::classify::{LineKind, classify, prepare};
use crate::error::{ParseFailure, ScriptError, ScriptErrorKind, ScriptWarning, ScriptWarningKind};
use crate::expr::{parse_condition, parse_mutation};

/// Label given to the logic block created by a bare `END` under a section header.
pub const IMPLICIT_END_LABEL: &str = "END";

/// Everything a parse produced: the document (absent after any unrecoverable error) plus all diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseReport {
    pub document: Option<Document>,
    pub errors: Vec<ScriptError>,
    pub warnings: Vec<ScriptWarning>,
}

impl ParseReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// The document if one was produced. Recoverable errors are logged, not returned.
    pub fn into_result(self) -> Result<Document, ParseFailure> {
        match self.document {
            Some(doc) => {
                for err in &self.errors {
                    warn!("{err}");
                }
                Ok(doc)
            },
            None => Err(ParseFailure { errors: self.errors }),
        }
    }
}

/// Parse a script, returning the document or every error found.
///
/// ```
/// use skald_script::parse_script;
///
/// let doc = parse_script("#start\nnpc: Hi\n>Bye\n->end\n#end\nEND\n").expect("parse ok");
/// assert_eq!(doc.sections.len(), 2);
/// assert_eq!(doc.characters, vec!["npc".to_string()]);
/// ```
pub fn parse_script(source: &str) -> Result<Document, ParseFailure> {
    parse_script_with_report(source).into_result()
}

/// Parse a script and keep warnings as well as errors.
pub fn parse_script_with_report(source: &str) -> ParseReport {
    let mut parser = ScriptParser::default();
    for (idx, raw) in source.lines().enumerate() {
        parser.line_no = idx + 1;
        if let Some(line) = prepare(raw) {
            parser.line(line);
        }
    }
    parser.finish()
}

/// Which block or choice conditions, mutations, signals and transitions attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MetaRef {
    Block(usize),
    Choice(usize),
}

/// Open parse context. Nothing nests: a testbed suspends the section it
/// interrupted and resumes it (with no open block or choice) at `@end`.
#[derive(Debug, Default)]
enum ParseContext {
    #[default]
    TopLevel,
    InTestbed {
        testbed: Testbed,
        opened_at: usize,
        resume: Option<usize>,
    },
    InSection {
        section: usize,
        open: Option<MetaRef>,
    },
}

/// A transition target remembered for the final resolution pass.
#[derive(Debug)]
struct PendingTransition {
    target: String,
    line: usize,
    text: String,
}

#[derive(Debug, Default)]
struct ScriptParser {
    doc: Document,
    context: ParseContext,
    errors: Vec<ScriptError>,
    warnings: Vec<ScriptWarning>,
    section_lines: Vec<usize>,
    transitions: Vec<PendingTransition>,
    endings: usize,
    line_no: usize,
    text: String,
}

impl ScriptParser {
    fn line(&mut self, line: &str) {
        self.text.clear();
        self.text.push_str(line);

        let in_testbed = matches!(self.context, ParseContext::InTestbed { .. });
        let kind = match classify(line, in_testbed) {
            Ok(kind) => kind,
            Err(ScriptErrorKind::Unhandled) if self.current_section().is_none() => {
                return self.error(ScriptErrorKind::NoOpenSection);
            },
            Err(err) => return self.error(err),
        };

        match kind {
            LineKind::TestbedOpen(tag) => self.open_testbed(tag),
            LineKind::TestbedClose => self.close_testbed(),
            LineKind::TestbedSet { key, value } => self.testbed_set(key, value),
            LineKind::Section(tag) => self.open_section(tag),
            _ if self.current_section().is_none() => self.error(ScriptErrorKind::NoOpenSection),
            LineKind::Attributed { speaker, body } => {
                let block = Block::Attributed {
                    tag: speaker.to_string(),
                    body: body.to_string(),
                    meta: Meta::default(),
                };
                if self.push_block(block) {
                    push_unique(&mut self.doc.characters, speaker);
                }
            },
            LineKind::Logic(label) => {
                self.push_block(Block::Logic {
                    label: label.to_string(),
                    meta: Meta::default(),
                });
            },
            LineKind::Choice(body) => self.push_choice(body),
            LineKind::End => self.end_marker(),
            LineKind::Condition(_) | LineKind::Mutation(_) | LineKind::Signal(_) | LineKind::Transition(_) => {
                self.meta_line(kind)
            },
        }
    }

    fn finish(mut self) -> ParseReport {
        if let ParseContext::InTestbed { testbed, opened_at, .. } = std::mem::take(&mut self.context) {
            self.errors.push(ScriptError {
                line: Some(opened_at),
                kind: ScriptErrorKind::UnclosedTestbed(testbed.tag),
                text: String::new(),
            });
        }

        let tags: HashSet<&str> = self.doc.sections.iter().map(|s| s.tag.as_str()).collect();
        for pending in &self.transitions {
            if !tags.contains(pending.target.as_str()) {
                self.errors.push(ScriptError {
                    line: Some(pending.line),
                    kind: ScriptErrorKind::UnresolvedTransition(pending.target.clone()),
                    text: pending.text.clone(),
                });
            }
        }

        if self.endings == 0 {
            self.errors.push(ScriptError {
                line: None,
                kind: ScriptErrorKind::NoEndings,
                text: String::new(),
            });
        }

        for (section, line) in self.doc.sections.iter().zip(&self.section_lines) {
            if section.blocks.is_empty() && section.choices.is_empty() {
                self.warnings.push(ScriptWarning {
                    line: *line,
                    kind: ScriptWarningKind::EmptySection(section.tag.clone()),
                });
            }
        }
        self.warnings.sort_by_key(|w| w.line);

        debug!(
            "parsed {} sections, {} testbeds: {} errors, {} warnings",
            self.doc.sections.len(),
            self.doc.testbeds.len(),
            self.errors.len(),
            self.warnings.len()
        );

        let document = self.errors.iter().all(|e| e.kind.is_recoverable()).then_some(self.doc);
        ParseReport {
            document,
            errors: self.errors,
            warnings: self.warnings,
        }
    }

    fn error(&mut self, kind: ScriptErrorKind) {
        self.errors.push(ScriptError {
            line: Some(self.line_no),
            kind,
            text: self.text.clone(),
        });
    }

    fn current_section(&self) -> Option<usize> {
        match &self.context {
            ParseContext::InSection { section, .. } => Some(*section),
            ParseContext::InTestbed { resume, .. } => *resume,
            ParseContext::TopLevel => None,
        }
    }

    fn open_meta(&mut self) -> Option<&mut Meta> {
        let ParseContext::InSection {
            section,
            open: Some(target),
        } = self.context
        else {
            return None;
        };
        let section = self.doc.sections.get_mut(section)?;
        match target {
            MetaRef::Block(i) => section.blocks.get_mut(i).map(Block::meta_mut),
            MetaRef::Choice(i) => section.choices.get_mut(i).map(|c| &mut c.meta),
        }
    }

    fn open_testbed(&mut self, tag: &str) {
        let resume = match std::mem::take(&mut self.context) {
            ParseContext::InTestbed { testbed, resume, .. } => {
                self.error(ScriptErrorKind::NestedTestbed(testbed.tag));
                resume
            },
            ParseContext::InSection { section, .. } => Some(section),
            ParseContext::TopLevel => None,
        };
        if self.doc.testbeds.iter().any(|t| t.tag == tag) {
            self.error(ScriptErrorKind::DuplicateTestbed(tag.to_string()));
        }
        self.context = ParseContext::InTestbed {
            testbed: Testbed {
                tag: tag.to_string(),
                sets: Default::default(),
            },
            opened_at: self.line_no,
            resume,
        };
    }

    fn close_testbed(&mut self) {
        let ParseContext::InTestbed {
            testbed,
            opened_at,
            resume,
        } = std::mem::take(&mut self.context)
        else {
            return self.error(ScriptErrorKind::StrayTestbedEnd);
        };
        if testbed.sets.is_empty() {
            self.warnings.push(ScriptWarning {
                line: opened_at,
                kind: ScriptWarningKind::EmptyTestbed(testbed.tag.clone()),
            });
        }
        self.doc.testbeds.push(testbed);
        self.context = match resume {
            Some(section) => ParseContext::InSection { section, open: None },
            None => ParseContext::TopLevel,
        };
    }

    fn testbed_set(&mut self, key: &str, value: &str) {
        if !is_identifier(key) {
            return self.error(ScriptErrorKind::BadTestbedKey(key.to_string()));
        }
        if let ParseContext::InTestbed { testbed, .. } = &mut self.context {
            testbed.sets.insert(key.to_string(), Value::interpret(value));
        }
    }

    fn open_section(&mut self, tag: &str) {
        if self.doc.sections.iter().any(|s| s.tag == tag) {
            self.error(ScriptErrorKind::DuplicateSection(tag.to_string()));
        }
        self.doc.sections.push(Section {
            tag: tag.to_string(),
            blocks: Vec::new(),
            choices: Vec::new(),
        });
        self.section_lines.push(self.line_no);
        self.context = ParseContext::InSection {
            section: self.doc.sections.len() - 1,
            open: None,
        };
    }

    /// Returns false when the block was rejected.
    fn push_block(&mut self, block: Block) -> bool {
        let ParseContext::InSection { section, open } = &mut self.context else {
            return false;
        };
        let Some(target) = self.doc.sections.get_mut(*section) else {
            return false;
        };
        if !target.choices.is_empty() {
            self.error(ScriptErrorKind::BlockAfterChoice);
            return false;
        }
        target.blocks.push(block);
        *open = Some(MetaRef::Block(target.blocks.len() - 1));
        true
    }

    fn push_choice(&mut self, body: &str) {
        let ParseContext::InSection { section, open } = &mut self.context else {
            return;
        };
        if let Some(target) = self.doc.sections.get_mut(*section) {
            target.choices.push(Choice {
                body: body.to_string(),
                meta: Meta::default(),
            });
            *open = Some(MetaRef::Choice(target.choices.len() - 1));
        }
    }

    fn end_marker(&mut self) {
        if let Some(meta) = self.open_meta() {
            meta.is_end = true;
            self.endings += 1;
            return;
        }
        let has_choices = self
            .current_section()
            .and_then(|i| self.doc.sections.get(i))
            .is_some_and(|s| !s.choices.is_empty());
        if has_choices {
            return self.error(ScriptErrorKind::DanglingMeta("end marker"));
        }
        let block = Block::Logic {
            label: IMPLICIT_END_LABEL.to_string(),
            meta: Meta {
                is_end: true,
                ..Meta::default()
            },
        };
        if self.push_block(block) {
            self.endings += 1;
        }
    }

    fn meta_line(&mut self, kind: LineKind<'_>) {
        if self.open_meta().is_none() {
            let name = kind.meta_name().unwrap_or("line");
            return self.error(ScriptErrorKind::DanglingMeta(name));
        }
        match kind {
            LineKind::Condition(text) => match parse_condition(text) {
                Ok(condition) => {
                    push_unique(&mut self.doc.inputs, &condition.input);
                    if let Some(meta) = self.open_meta() {
                        meta.conditions.push(condition);
                    }
                },
                Err(err) => self.error(err),
            },
            LineKind::Mutation(text) => match parse_mutation(text) {
                Ok(mutation) => {
                    push_unique(&mut self.doc.inputs, &mutation.input);
                    if let Some(meta) = self.open_meta() {
                        meta.mutations.push(mutation);
                    }
                },
                Err(err) => self.error(err),
            },
            LineKind::Signal(name) => {
                if name.is_empty() {
                    return self.error(ScriptErrorKind::EmptySignal);
                }
                push_unique(&mut self.doc.signals, name);
                if let Some(meta) = self.open_meta() {
                    meta.signals.push(name.to_string());
                }
            },
            LineKind::Transition(target) => self.transition(target),
            _ => {},
        }
    }

    fn transition(&mut self, target: &str) {
        if target.is_empty() {
            return self.error(ScriptErrorKind::EmptyTransition);
        }
        let Some(meta) = self.open_meta() else {
            return;
        };
        if meta.transition.is_some() {
            return self.error(ScriptErrorKind::ExtraTransition);
        }
        meta.transition = Some(target.to_string());
        if !self.transitions.iter().any(|t| t.target == target) {
            self.transitions.push(PendingTransition {
                target: target.to_string(),
                line: self.line_no,
                text: self.text.clone(),
            });
        }
    }
}

fn push_unique(list: &mut Vec<String>, name: &str) {
    if !list.iter().any(|n| n == name) {
        list.push(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(report: &ParseReport) -> Vec<(Option<usize>, ScriptErrorKind)> {
        report.errors.iter().map(|e| (e.line, e.kind.clone())).collect()
    }

    #[test]
    fn meta_lines_attach_to_most_recent_element() {
        let src = "#a\nnpc: Hi\n?met\n~met=true\n:wave\n>Go\n?!met\n->a\nEND\n";
        let doc = parse_script(src).expect("parse ok");
        let section = &doc.sections[0];
        assert_eq!(section.blocks[0].meta().conditions.len(), 1);
        assert_eq!(section.blocks[0].meta().mutations.len(), 1);
        assert_eq!(section.blocks[0].meta().signals, vec!["wave".to_string()]);
        let choice = &section.choices[0].meta;
        assert_eq!(choice.conditions[0].value, Value::Bool(false));
        assert_eq!(choice.transition.as_deref(), Some("a"));
        assert!(choice.is_end);
        assert_eq!(doc.inputs, vec!["met".to_string()]);
    }

    #[test]
    fn section_header_closes_open_meta() {
        let report = parse_script_with_report("#a\n*x\n#b\n?flag\nEND\n");
        assert_eq!(kinds(&report), vec![(Some(4), ScriptErrorKind::DanglingMeta("condition"))]);
    }

    #[test]
    fn lines_before_any_section_are_rejected() {
        let report = parse_script_with_report("npc: Hi\nrandom text\n#a\nEND\n");
        assert_eq!(
            kinds(&report),
            vec![
                (Some(1), ScriptErrorKind::NoOpenSection),
                (Some(2), ScriptErrorKind::NoOpenSection)
            ]
        );
        assert!(report.document.is_none());
    }

    #[test]
    fn block_after_choice_is_skipped_and_choice_stays_open() {
        let report = parse_script_with_report("#a\n>Pick\nnpc: late\n~x=1\nEND\n");
        assert_eq!(kinds(&report), vec![(Some(3), ScriptErrorKind::BlockAfterChoice)]);
        assert!(report.document.is_none());
    }

    #[test]
    fn testbed_suspends_and_resumes_section() {
        let src = "#a\n*step\n@testbed rich\ngold = 100\nname = Ada\n@end\n>Go\nEND\n";
        let doc = parse_script(src).expect("parse ok");
        assert_eq!(doc.testbeds.len(), 1);
        assert_eq!(doc.testbeds[0].sets.get("gold"), Some(&Value::Number(100.0)));
        assert_eq!(doc.testbeds[0].sets.get("name"), Some(&Value::Text("Ada".into())));
        assert_eq!(doc.sections[0].choices.len(), 1);
        assert!(doc.sections[0].choices[0].meta.is_end);
        assert!(doc.inputs.is_empty());
    }

    #[test]
    fn testbed_problems_are_reported() {
        let src = "@testbed a\nx = 1\n@testbed a\n1 bad = 2\n#s\nEND\n";
        let report = parse_script_with_report(src);
        assert_eq!(
            kinds(&report),
            vec![
                (Some(3), ScriptErrorKind::NestedTestbed("a".into())),
                (Some(4), ScriptErrorKind::BadTestbedKey("1 bad".into())),
                (Some(5), ScriptErrorKind::TestbedAssignment),
                (Some(6), ScriptErrorKind::TestbedAssignment),
                (Some(3), ScriptErrorKind::UnclosedTestbed("a".into())),
                (None, ScriptErrorKind::NoEndings),
            ]
        );
    }

    #[test]
    fn duplicate_testbeds_and_sections_are_errors() {
        let src = "@testbed t\nx=1\n@end\n@testbed t\nx=2\n@end\n#a\nEND\n#a\n";
        let report = parse_script_with_report(src);
        assert_eq!(
            kinds(&report),
            vec![
                (Some(4), ScriptErrorKind::DuplicateTestbed("t".into())),
                (Some(9), ScriptErrorKind::DuplicateSection("a".into())),
            ]
        );
    }

    #[test]
    fn unresolved_targets_reported_once_at_first_use() {
        let src = "#a\n*x\n->ghost\n>one\n->ghost\n>two\n->b\n#b\nEND\n";
        let report = parse_script_with_report(src);
        assert_eq!(
            kinds(&report),
            vec![(Some(3), ScriptErrorKind::UnresolvedTransition("ghost".into()))]
        );
        assert_eq!(report.errors[0].text, "->ghost");
    }

    #[test]
    fn warnings_do_not_fail_the_parse() {
        let src = "@testbed empty\n@end\n#a\n#b\nEND\n";
        let report = parse_script_with_report(src);
        assert!(report.is_ok());
        assert_eq!(
            report.warnings.iter().map(|w| w.kind.clone()).collect::<Vec<_>>(),
            vec![
                ScriptWarningKind::EmptyTestbed("empty".into()),
                ScriptWarningKind::EmptySection("a".into()),
            ]
        );
    }

    #[test]
    fn end_after_choices_without_open_element_is_dangling() {
        let src = "#a\n>Go\n@testbed t\nx=1\n@end\nEND\n";
        let report = parse_script_with_report(src);
        assert_eq!(
            kinds(&report),
            vec![
                (Some(6), ScriptErrorKind::DanglingMeta("end marker")),
                (None, ScriptErrorKind::NoEndings)
            ]
        );
    }
}
