//! Session runtime.
//!
//! A [`Session`] walks an immutable [`Document`]: it enters sections, runs
//! their blocks, presents choices, resolves transitions, and keeps a stack of
//! checkpoints for `back` and `re`. It never prints. Everything a player should
//! see is queued as [`SessionEvent`]s, and evaluation problems as [`Notice`]s.

use std::collections::VecDeque;

use log::{debug, info, warn};
use skald_data::{Block, Document, Section, Testbed, Value, is_identifier};
use thiserror::Error;

use crate::condition::conditions_hold;
use crate::mutation::apply_all;
use crate::notice::{EvalError, Notice};
use crate::state::{GameState, is_reserved};

/// Chained transitions allowed before the session gives up on a loop.
pub const MAX_CHAINED_TRANSITIONS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// An `END` marker executed.
    Finished,
    /// Ran past the last section without reaching an `END`.
    OutOfSections,
    /// Too many transitions in a row without player input.
    TransitionLoop,
}

impl EndReason {
    pub fn is_normal(self) -> bool {
        self == EndReason::Finished
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// A section without choices has been shown; waiting for "continue".
    Running,
    /// Choices are listed and one must be picked.
    AwaitingSelection,
    Ended(EndReason),
}

/// A choice as presented to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceView {
    /// 1-based selection key.
    pub number: usize,
    pub body: String,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SectionEntered(String),
    BlockShown { speaker: String, body: String },
    LogicRan(String),
    Signal(String),
    ChoiceTaken { number: usize, body: String },
    Transition { from: String, to: String },
    AutoAdvance { from: String, to: String },
    Jumped(String),
    ValueSet { input: String, value: Value },
    ChoicesPresented(Vec<ChoiceView>),
    ContinuePrompt,
    Rewound(usize),
    Restarted(Option<String>),
    Ended(EndReason),
}

/// Player commands the session refused. State is unchanged when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("no section tagged '{0}'")]
    UnknownSection(String),
    #[error("no testbed tagged '{0}'")]
    UnknownTestbed(String),
    #[error("choice {number} is out of range (1-{count})")]
    ChoiceOutOfRange { number: usize, count: usize },
    #[error("choice {0} is not available right now")]
    ChoiceUnavailable(usize),
    #[error("there are no choices to pick from")]
    NoChoices,
    #[error("pick one of the choices first")]
    ChoicesPending,
    #[error("the session has ended")]
    SessionEnded,
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("input names are alphanumeric only: '{0}'")]
    InvalidInputName(String),
    #[error("'{0}' is reserved and cannot be set")]
    ReservedInput(String),
    #[error("missing value")]
    MissingValue,
    #[error("script has no sections")]
    NoSections,
}

/// Everything needed to put the session back where it was before one input.
#[derive(Debug, Clone)]
struct Checkpoint<'doc> {
    state: GameState,
    shown: Vec<&'doc Block>,
    status: SessionStatus,
    /// Pushed by a numbered choice; `back` rewinds through the most recent one.
    turn_boundary: bool,
}

pub struct Session<'doc> {
    doc: &'doc Document,
    testbed: Option<&'doc Testbed>,
    state: GameState,
    shown: Vec<&'doc Block>,
    status: SessionStatus,
    history: Vec<Checkpoint<'doc>>,
    events: VecDeque<SessionEvent>,
    notices: Vec<Notice>,
}

impl<'doc> Session<'doc> {
    /// Start a session at the first section.
    ///
    /// `testbed` picks a fixture by tag; without one the first testbed in the
    /// document (if any) seeds the state.
    pub fn start(doc: &'doc Document, testbed: Option<&str>) -> Result<Self, CommandError> {
        let testbed = match testbed {
            Some(tag) => Some(doc.testbed(tag).ok_or_else(|| CommandError::UnknownTestbed(tag.to_string()))?),
            None => doc.testbeds.first(),
        };
        let first = doc.sections.first().ok_or(CommandError::NoSections)?;

        let mut session = Session {
            doc,
            testbed,
            state: GameState::new(doc, testbed),
            shown: Vec::new(),
            status: SessionStatus::Running,
            history: Vec::new(),
            events: VecDeque::new(),
            notices: Vec::new(),
        };
        info!(
            "starting session at '{}' with testbed {:?}",
            first.tag,
            testbed.map(|t| t.tag.as_str())
        );
        session.run_from(&first.tag);
        Ok(session)
    }

    pub fn document(&self) -> &'doc Document {
        self.doc
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn current_section(&self) -> Option<&str> {
        self.state.current_section()
    }

    /// Blocks shown since the last player input.
    pub fn shown_blocks(&self) -> &[&'doc Block] {
        &self.shown
    }

    /// The current section's choices with their availability right now.
    ///
    /// This is a read-only view: evaluation notices are dropped here and
    /// recorded when the choices are presented.
    pub fn choices(&self) -> Vec<ChoiceView> {
        let mut scratch = Vec::new();
        self.section()
            .map(|section| choice_views(section, &self.state, &mut scratch))
            .unwrap_or_default()
    }

    pub fn testbeds(&self) -> &'doc [Testbed] {
        &self.doc.testbeds
    }

    /// The testbed this session was seeded from.
    pub fn testbed(&self) -> Option<&'doc Testbed> {
        self.testbed
    }

    /// Checkpoints available to `re`.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.events.drain(..).collect()
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Take choice `number` (1-based).
    pub fn select(&mut self, number: usize) -> Result<(), CommandError> {
        match self.status {
            SessionStatus::AwaitingSelection => {},
            SessionStatus::Running => return Err(CommandError::NoChoices),
            SessionStatus::Ended(_) => return Err(CommandError::SessionEnded),
        }
        let doc = self.doc;
        let section = self
            .current_section()
            .and_then(|tag| doc.section(tag))
            .ok_or(CommandError::NoChoices)?;
        let count = section.choices.len();
        let choice = number
            .checked_sub(1)
            .and_then(|i| section.choices.get(i))
            .ok_or(CommandError::ChoiceOutOfRange { number, count })?;
        if !conditions_hold(&choice.meta.conditions, &self.state, &mut self.notices) {
            return Err(CommandError::ChoiceUnavailable(number));
        }

        info!("choice {number} taken in '{}': {}", section.tag, choice.body);
        self.checkpoint(true);
        self.shown.clear();
        self.events.push_back(SessionEvent::ChoiceTaken {
            number,
            body: choice.body.clone(),
        });
        self.state = apply_all(&choice.meta.mutations, &self.state, &mut self.notices);
        self.emit_signals(&choice.meta.signals);
        if choice.meta.is_end {
            self.state = self.state.with_end(true);
            self.finish(EndReason::Finished);
            return Ok(());
        }

        match &choice.meta.transition {
            Some(target) => {
                self.events.push_back(SessionEvent::Transition {
                    from: section.tag.clone(),
                    to: target.clone(),
                });
                self.run_from(target);
            },
            None => self.advance_past(section),
        }
        Ok(())
    }

    /// Move on from a section that had no choices.
    pub fn advance(&mut self) -> Result<(), CommandError> {
        match self.status {
            SessionStatus::Running => {},
            SessionStatus::AwaitingSelection => return Err(CommandError::ChoicesPending),
            SessionStatus::Ended(_) => return Err(CommandError::SessionEnded),
        }
        let Some(section) = self.section() else {
            self.finish(EndReason::OutOfSections);
            return Ok(());
        };
        self.checkpoint(false);
        self.shown.clear();
        self.advance_past(section);
        Ok(())
    }

    /// Undo the last turn: everything since (and including) the last choice taken.
    ///
    /// Returns how many checkpoints were dropped.
    pub fn back(&mut self) -> Result<usize, CommandError> {
        if self.history.is_empty() {
            return Err(CommandError::NothingToUndo);
        }
        let keep = self.history.iter().rposition(|cp| cp.turn_boundary).unwrap_or(0);
        let popped = self.history.len() - keep;
        let mut dropped = self.history.split_off(keep);
        let target = dropped.swap_remove(0);
        info!("back: rewinding {popped} step(s)");
        self.restore(target, popped);
        Ok(popped)
    }

    /// Undo exactly one accepted input and show the frame again.
    pub fn replay(&mut self) -> Result<(), CommandError> {
        let target = self.history.pop().ok_or(CommandError::NothingToUndo)?;
        info!("re: rewinding one step");
        self.restore(target, 1);
        Ok(())
    }

    /// Jump straight to a section and run it. No choice mutations apply.
    pub fn goto(&mut self, tag: &str) -> Result<(), CommandError> {
        let doc = self.doc;
        let section = doc
            .section(tag)
            .ok_or_else(|| CommandError::UnknownSection(tag.to_string()))?;
        info!("goto '{tag}'");
        self.checkpoint(false);
        self.shown.clear();
        self.state = self.state.with_end(false);
        self.events.push_back(SessionEvent::Jumped(section.tag.clone()));
        self.run_from(&section.tag);
        Ok(())
    }

    /// Overwrite one state value, coercing `literal` like the parser does.
    pub fn set(&mut self, input: &str, literal: &str) -> Result<(), CommandError> {
        if !is_identifier(input) {
            return Err(CommandError::InvalidInputName(input.to_string()));
        }
        if is_reserved(input) {
            return Err(CommandError::ReservedInput(input.to_string()));
        }
        let literal = literal.trim();
        if literal.is_empty() {
            return Err(CommandError::MissingValue);
        }
        if !self.doc.inputs.iter().any(|name| name == input) {
            Notice::record(&mut self.notices, EvalError::UnknownInput(input.to_string()));
        }
        let value = Value::interpret(literal);
        info!("set {input} = {value}");
        self.checkpoint(false);
        self.state = self.state.with_value(input, value.clone());
        self.events.push_back(SessionEvent::ValueSet {
            input: input.to_string(),
            value,
        });
        Ok(())
    }

    /// Start over from the first section, seeded from `testbed` or the first testbed.
    ///
    /// An unknown tag still restarts, keeping the current testbed, and reports the tag.
    pub fn restart(&mut self, testbed: Option<&str>) -> Result<(), CommandError> {
        let (chosen, outcome) = match testbed {
            Some(tag) => match self.doc.testbed(tag) {
                Some(found) => (Some(found), Ok(())),
                None => {
                    warn!("restart: unknown testbed '{tag}', keeping the current one");
                    (self.testbed, Err(CommandError::UnknownTestbed(tag.to_string())))
                },
            },
            None => (self.doc.testbeds.first(), Ok(())),
        };
        let doc = self.doc;
        let first = doc.sections.first().ok_or(CommandError::NoSections)?;

        info!("restarting with testbed {:?}", chosen.map(|t| t.tag.as_str()));
        self.testbed = chosen;
        self.state = GameState::new(doc, chosen);
        self.shown.clear();
        self.history.clear();
        self.status = SessionStatus::Running;
        self.events
            .push_back(SessionEvent::Restarted(chosen.map(|t| t.tag.clone())));
        self.run_from(&first.tag);
        outcome
    }

    fn section(&self) -> Option<&'doc Section> {
        let doc = self.doc;
        self.current_section().and_then(|tag| doc.section(tag))
    }

    fn checkpoint(&mut self, turn_boundary: bool) {
        self.history.push(Checkpoint {
            state: self.state.clone(),
            shown: self.shown.clone(),
            status: self.status,
            turn_boundary,
        });
    }

    fn restore(&mut self, checkpoint: Checkpoint<'doc>, steps: usize) {
        self.state = checkpoint.state;
        self.shown = checkpoint.shown;
        self.status = checkpoint.status;
        self.events.push_back(SessionEvent::Rewound(steps));
        self.emit_frame();
    }

    /// Re-queue what the player was looking at, without running anything.
    fn emit_frame(&mut self) {
        if let Some(tag) = self.state.current_section() {
            self.events.push_back(SessionEvent::SectionEntered(tag.to_string()));
        }
        let shown = self.shown.clone();
        for block in shown {
            self.emit_block(block);
        }
        self.emit_prompt();
    }

    fn emit_prompt(&mut self) {
        let event = match self.status {
            SessionStatus::Running => SessionEvent::ContinuePrompt,
            SessionStatus::AwaitingSelection => {
                let views = self
                    .section()
                    .map(|section| choice_views(section, &self.state, &mut self.notices))
                    .unwrap_or_default();
                SessionEvent::ChoicesPresented(views)
            },
            SessionStatus::Ended(reason) => SessionEvent::Ended(reason),
        };
        self.events.push_back(event);
    }

    fn emit_block(&mut self, block: &Block) {
        let event = match block {
            Block::Attributed { tag, body, .. } => SessionEvent::BlockShown {
                speaker: tag.clone(),
                body: body.clone(),
            },
            Block::Logic { label, .. } => SessionEvent::LogicRan(label.clone()),
        };
        self.events.push_back(event);
    }

    fn emit_signals(&mut self, signals: &[String]) {
        for signal in signals {
            debug!("signal: {signal}");
            self.events.push_back(SessionEvent::Signal(signal.clone()));
        }
    }

    fn finish(&mut self, reason: EndReason) {
        if reason.is_normal() {
            info!("session finished");
        } else {
            warn!("session stopped abnormally: {reason:?}");
        }
        self.status = SessionStatus::Ended(reason);
        self.events.push_back(SessionEvent::Ended(reason));
    }

    /// No transition was taken out of `section`: continue with the next one in document order.
    fn advance_past(&mut self, section: &'doc Section) {
        match self.doc.next_section(&section.tag) {
            Some(next) => {
                self.events.push_back(SessionEvent::AutoAdvance {
                    from: section.tag.clone(),
                    to: next.tag.clone(),
                });
                self.run_from(&next.tag);
            },
            None => self.finish(EndReason::OutOfSections),
        }
    }

    /// Enter `tag` and keep following block transitions until the session
    /// needs player input or ends.
    fn run_from(&mut self, tag: &str) {
        let doc = self.doc;
        let mut tag = tag.to_string();
        let mut hops = 0;
        loop {
            let Some(section) = doc.section(&tag) else {
                warn!("transition to unknown section '{tag}'");
                self.finish(EndReason::OutOfSections);
                return;
            };
            debug!("entering '{}'", section.tag);
            self.state = self.state.with_section(&section.tag);
            self.events
                .push_back(SessionEvent::SectionEntered(section.tag.clone()));

            let mut transition = None;
            for block in &section.blocks {
                let meta = block.meta();
                if !conditions_hold(&meta.conditions, &self.state, &mut self.notices) {
                    continue;
                }
                self.state = apply_all(&meta.mutations, &self.state, &mut self.notices);
                self.shown.push(block);
                self.emit_block(block);
                self.emit_signals(&meta.signals);
                if meta.is_end {
                    self.state = self.state.with_end(true);
                }
                if let Some(target) = &meta.transition {
                    transition = Some(target);
                    break;
                }
            }

            if self.state.is_end() {
                self.finish(EndReason::Finished);
                return;
            }

            let Some(target) = transition else {
                if section.choices.is_empty() {
                    self.status = SessionStatus::Running;
                    self.events.push_back(SessionEvent::ContinuePrompt);
                } else {
                    self.status = SessionStatus::AwaitingSelection;
                    let views = choice_views(section, &self.state, &mut self.notices);
                    self.events.push_back(SessionEvent::ChoicesPresented(views));
                }
                return;
            };

            hops += 1;
            if hops > MAX_CHAINED_TRANSITIONS {
                self.finish(EndReason::TransitionLoop);
                return;
            }
            self.events.push_back(SessionEvent::Transition {
                from: section.tag.clone(),
                to: target.clone(),
            });
            tag = target.clone();
        }
    }
}

fn choice_views(section: &Section, state: &GameState, notices: &mut Vec<Notice>) -> Vec<ChoiceView> {
    section
        .choices
        .iter()
        .enumerate()
        .map(|(i, choice)| ChoiceView {
            number: i + 1,
            body: choice.body.clone(),
            available: conditions_hold(&choice.meta.conditions, state, notices),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use skald_script::parse_script;

    fn doc(src: &str) -> Document {
        parse_script(src).expect("parse ok")
    }

    #[test]
    fn redrawn_choices_report_their_notices() {
        let d = doc("#a\nnpc: hi\n>Collapse\n?hp<=0\n->b\n>Walk\n->b\n#b\nEND\n");
        let unset_hp = EvalError::UnsetComparison {
            input: "hp".into(),
            operator: "<=",
        };
        let mut session = Session::start(&d, None).expect("start");
        assert!(session.drain_notices().iter().any(|n| n.error == unset_hp));

        session.choices();
        assert!(session.drain_notices().is_empty());

        session.select(2).expect("walk");
        session.back().expect("back");
        assert!(session.drain_notices().iter().any(|n| n.error == unset_hp));
    }

    #[test]
    fn blocks_after_end_still_run_before_finishing() {
        let d = doc("#a\nnpc: one\nEND\nnpc: two\n~x=1\n");
        let session = Session::start(&d, None).expect("start");
        assert_eq!(session.status(), SessionStatus::Ended(EndReason::Finished));
        assert_eq!(session.shown_blocks().len(), 2);
        assert_eq!(session.state().value("x"), Some(&Value::Number(1.0)));
    }

    #[test]
    fn block_transition_skips_remaining_blocks() {
        let d = doc("#a\nnpc: first\n->b\nnpc: skipped\n#b\nnpc: arrived\nEND\n");
        let mut session = Session::start(&d, None).expect("start");
        let events = session.drain_events();
        assert!(events.contains(&SessionEvent::Transition {
            from: "a".into(),
            to: "b".into()
        }));
        assert!(!events.contains(&SessionEvent::BlockShown {
            speaker: "npc".into(),
            body: "skipped".into()
        }));
        assert_eq!(session.status(), SessionStatus::Ended(EndReason::Finished));
    }

    #[test]
    fn transition_loops_are_cut_off() {
        let d = doc("#a\n*spin\n->b\n#b\n*spin\n->a\n#c\nEND\n");
        let session = Session::start(&d, None).expect("start");
        assert_eq!(session.status(), SessionStatus::Ended(EndReason::TransitionLoop));
    }

    #[test]
    fn running_past_last_section_is_abnormal() {
        let d = doc("#a\nnpc: hi\n?never\nEND\n#b\nnpc: bye\n");
        let mut session = Session::start(&d, None).expect("start");
        assert_eq!(session.status(), SessionStatus::Running);
        session.advance().expect("advance to b");
        assert_eq!(session.current_section(), Some("b"));
        session.advance().expect("advance past b");
        assert_eq!(session.status(), SessionStatus::Ended(EndReason::OutOfSections));
        assert_eq!(session.advance(), Err(CommandError::SessionEnded));
    }

    #[test]
    fn unknown_start_testbed_is_rejected() {
        let d = doc("#a\nEND\n");
        assert_eq!(
            Session::start(&d, Some("nope")).err(),
            Some(CommandError::UnknownTestbed("nope".into()))
        );
    }
}
