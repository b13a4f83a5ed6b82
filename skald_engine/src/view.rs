//! View module.
//!
//! Handlers never print. They push [`ViewItem`]s (mostly translated from the
//! session's [`SessionEvent`]s) and the REPL flushes the view once per input,
//! story output first and engine/system output after it.
use std::fmt::Write;

use colored::Colorize;
use skald_data::{Document, Value};
use textwrap::{fill, termwidth};
use variantly::Variantly;

use crate::notice::{Notice, Severity};
use crate::session::{ChoiceView, EndReason, SessionEvent};
use crate::style::{StoryStyle, indented_block, story_block};

const ICON_ERROR: &str = "⚠︎"; // U+26A0 U+FE0E
const ICON_SIGNAL: &str = "⚡︎"; // U+26A1 U+FE0E
const ICON_ENGINE: &str = "⚙";
const ICON_REWIND: &str = "↶";
const UNAVAILABLE_MARK: &str = "<X>";

/// Player commands listed by `help`.
pub const HELP_COMMANDS: &[(&str, &str)] = &[
    ("1-n", "pick a choice by number"),
    ("<enter> / continue", "move on when there are no choices"),
    ("back", "undo everything since the last choice"),
    ("re", "step back one input and show it again"),
    ("status", "show every state value"),
    ("testbeds", "list the script's testbeds"),
    ("restart [testbed]", "start over, optionally from a testbed"),
    ("set <input> = <value>", "change a state value"),
    ("goto <section>", "jump to a section"),
    ("help", "show this list"),
    ("exit", "leave the player"),
];

/// View aggregates everything to be shown for one input, then renders it.
#[derive(Debug, Clone)]
pub struct View {
    pub width: usize,
    pub show_logic: bool,
    pub show_signals: bool,
    pub items: Vec<ViewItem>,
}

impl Default for View {
    fn default() -> Self {
        Self::new()
    }
}

impl View {
    /// An empty view sized to the terminal, hiding logic blocks and showing signals.
    pub fn new() -> Self {
        Self {
            width: termwidth(),
            show_logic: false,
            show_signals: true,
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, item: ViewItem) {
        self.items.push(item);
    }

    /// Translate a session event into view items. `doc` supplies speaker colors.
    pub fn push_event(&mut self, event: SessionEvent, doc: &Document) {
        let item = match event {
            SessionEvent::SectionEntered(tag) => ViewItem::SectionHeader(tag),
            SessionEvent::BlockShown { speaker, body } => ViewItem::Speech {
                color: doc.character_index(&speaker).unwrap_or(0),
                speaker,
                body,
            },
            SessionEvent::LogicRan(label) => ViewItem::Logic(label),
            SessionEvent::Signal(name) => ViewItem::Signal(name),
            SessionEvent::ChoiceTaken { number, body } => ViewItem::ChoiceTaken { number, body },
            SessionEvent::Transition { from, to } => ViewItem::Transition { from, to },
            SessionEvent::AutoAdvance { from, to } => ViewItem::AutoAdvance { from, to },
            SessionEvent::Jumped(tag) => ViewItem::Jumped(tag),
            SessionEvent::ValueSet { input, value } => ViewItem::ValueSet { input, value },
            SessionEvent::ChoicesPresented(choices) => ViewItem::Choices(choices),
            SessionEvent::ContinuePrompt => ViewItem::ContinuePrompt,
            SessionEvent::Rewound(steps) => ViewItem::Rewound(steps),
            SessionEvent::Restarted(testbed) => ViewItem::Restarted(testbed),
            SessionEvent::Ended(reason) => ViewItem::Ended(reason),
        };
        self.push(item);
    }

    pub fn push_notices(&mut self, notices: Vec<Notice>) {
        self.items.extend(notices.into_iter().map(ViewItem::Notice));
    }

    /// Compose the current frame. Story items come first in the order they
    /// happened, then notices, then engine output under a `game` heading.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let (story, system): (Vec<_>, Vec<_>) = self
            .items
            .iter()
            .partition(|item| item.section() == ViewSection::Story);

        for item in &story {
            self.story_item(&mut out, item);
        }

        let notices: Vec<_> = system.iter().filter(|i| i.is_notice()).collect();
        if !notices.is_empty() {
            let _ = writeln!(out);
            for item in notices {
                self.system_item(&mut out, item);
            }
        }

        let engine: Vec<_> = system.iter().filter(|i| !i.is_notice()).collect();
        if !engine.is_empty() {
            let _ = writeln!(out, "\n{:.>width$}\n", "game".section_style(), width = self.width.min(100));
            for item in engine {
                self.system_item(&mut out, item);
            }
        }
        out
    }

    /// Print the current frame and clear it for the next input.
    pub fn flush(&mut self) {
        // re-check terminal width in case it's been resized
        self.width = termwidth();
        if self.items.is_empty() {
            return;
        }
        println!("{}", self.render());
        self.items.clear();
    }

    fn story_item(&self, out: &mut String, item: &ViewItem) {
        match item {
            ViewItem::SectionHeader(tag) => {
                let _ = writeln!(out, "\n{}", format!("#{tag}").section_style());
            },
            ViewItem::Speech { speaker, body, color } => {
                let line = format!("{}: {}", speaker.speaker_style(*color), body.body_style());
                let _ = writeln!(out, "{}", fill(&line, story_block(self.width)));
            },
            ViewItem::Logic(label) => {
                if self.show_logic {
                    let _ = writeln!(out, "{}", format!("*{label}").logic_style());
                }
            },
            ViewItem::Signal(name) => {
                if self.show_signals {
                    let _ = writeln!(out, "{} {}", ICON_SIGNAL.signal_style(), format!(":{name}").signal_style());
                }
            },
            ViewItem::ChoiceTaken { number, body } => {
                let _ = writeln!(out, "\n{}", format!("> {number}) {body}").choice_style());
            },
            ViewItem::Transition { to, .. } => {
                let _ = writeln!(out, "{}", format!("-> {to}").transition_style());
            },
            ViewItem::AutoAdvance { .. } => {
                let _ = writeln!(out, "{}", "-> auto-transition to next block".transition_style());
            },
            ViewItem::Jumped(tag) => {
                let _ = writeln!(out, "{}", format!("-> jumped to {tag}").transition_style());
            },
            ViewItem::ValueSet { input, value } => {
                let _ = writeln!(out, "{} {input} = {value}", ICON_ENGINE.prompt_style());
            },
            ViewItem::Choices(choices) => {
                let _ = writeln!(out);
                for choice in choices {
                    let line = if choice.available {
                        format!("{}) {}", choice.number, choice.body).choice_style()
                    } else {
                        format!("{}) {UNAVAILABLE_MARK} {}", choice.number, choice.body).disabled_style()
                    };
                    let _ = writeln!(out, "{line}");
                }
            },
            ViewItem::ContinuePrompt => {
                let _ = writeln!(out, "\n{}", "[Continue]".disabled_style());
            },
            ViewItem::Rewound(steps) => {
                let plural = if *steps == 1 { "" } else { "s" };
                let _ = writeln!(
                    out,
                    "{}",
                    format!("{ICON_REWIND} rewound {steps} step{plural}").transition_style()
                );
            },
            ViewItem::Restarted(testbed) => {
                let msg = match testbed {
                    Some(tag) => format!("restarted with testbed '{tag}'"),
                    None => "restarted".to_string(),
                };
                let _ = writeln!(out, "{} {}", ICON_ENGINE.prompt_style(), msg.prompt_style());
            },
            ViewItem::Ended(reason) => {
                let msg = match reason {
                    EndReason::Finished => "THE END".ended_style(),
                    EndReason::OutOfSections => "the story ran out of sections without an ending".error_style(),
                    EndReason::TransitionLoop => "stopped: too many transitions in a row".error_style(),
                };
                let _ = writeln!(out, "\n{msg}");
                let _ = writeln!(out, "{}", "(back, restart or exit)".disabled_style());
            },
            _ => {},
        }
    }

    fn system_item(&self, out: &mut String, item: &ViewItem) {
        match item {
            ViewItem::Notice(notice) => {
                let line = match notice.severity {
                    Severity::Warning => format!("{ICON_ERROR} warning: {}", notice.error).warning_style(),
                    Severity::Error => format!("{ICON_ERROR} error: {}", notice.error).error_style(),
                };
                let _ = writeln!(out, "{line}");
            },
            ViewItem::Status(rows) => {
                let _ = writeln!(out, "{}:", "State".subheading_style());
                let pad = rows.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
                for (name, value) in rows {
                    let _ = writeln!(out, "   {name:<pad$}  {value}");
                }
            },
            ViewItem::Testbeds { tags, active } => {
                let _ = writeln!(out, "{}:", "Testbeds".subheading_style());
                if tags.is_empty() {
                    let _ = writeln!(out, "   {}", "this script has no testbeds".italic().dimmed());
                }
                for tag in tags {
                    let marker = if active.as_deref() == Some(tag.as_str()) { "*" } else { " " };
                    let _ = writeln!(out, " {marker} {tag}");
                }
            },
            ViewItem::Help => {
                let _ = writeln!(out, "{}:\n", "Commands".subheading_style());
                for (command, description) in HELP_COMMANDS {
                    let line = format!("{} - {}", command.bold().green(), description.italic());
                    let _ = writeln!(out, "{}", fill(&line, indented_block(self.width)));
                }
            },
            ViewItem::EngineMessage(msg) => {
                let _ = writeln!(
                    out,
                    "{}",
                    fill(&format!("{} {}", ICON_ENGINE.prompt_style(), msg), story_block(self.width))
                );
            },
            ViewItem::Error(msg) => {
                let _ = writeln!(
                    out,
                    "{}",
                    fill(&format!("{:<4}{}", ICON_ERROR.error_style(), msg), story_block(self.width))
                );
            },
            _ => {},
        }
    }
}

/// Top-level grouping used when composing a frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ViewSection {
    Story,
    System,
}

#[derive(Debug, Clone, PartialEq, Variantly)]
pub enum ViewItem {
    SectionHeader(String),
    /// `color` is the speaker's index in the script's character list.
    Speech {
        speaker: String,
        body: String,
        color: usize,
    },
    Logic(String),
    Signal(String),
    ChoiceTaken {
        number: usize,
        body: String,
    },
    Transition {
        from: String,
        to: String,
    },
    AutoAdvance {
        from: String,
        to: String,
    },
    Jumped(String),
    ValueSet {
        input: String,
        value: Value,
    },
    Choices(Vec<ChoiceView>),
    ContinuePrompt,
    Rewound(usize),
    Restarted(Option<String>),
    Ended(EndReason),
    Notice(Notice),
    Status(Vec<(String, String)>),
    Testbeds {
        tags: Vec<String>,
        active: Option<String>,
    },
    Help,
    EngineMessage(String),
    Error(String),
}

impl ViewItem {
    pub fn section(&self) -> ViewSection {
        match self {
            ViewItem::Notice(_)
            | ViewItem::Status(_)
            | ViewItem::Testbeds { .. }
            | ViewItem::Help
            | ViewItem::EngineMessage(_)
            | ViewItem::Error(_) => ViewSection::System,
            _ => ViewSection::Story,
        }
    }
}
