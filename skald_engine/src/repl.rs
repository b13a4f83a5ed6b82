//! REPL and command handling utilities.
//!
//! A script is played in a read-eval-print loop. This module reads a line,
//! parses it into a [`Command`], hands it to the handlers in [`story`] and
//! [`system`], and flushes the [`View`] once per input.

mod input;
pub mod story;
pub mod system;

pub use story::*;
pub use system::*;

use anyhow::Result;
use colored::Colorize;
use log::info;

use crate::command::{Command, parse_command};
use crate::config::SkaldConfig;
use crate::session::{Session, SessionStatus};
use crate::style::StoryStyle;
use crate::view::{View, ViewItem};

use input::{InputEvent, InputManager};

/// Control flow signal used by handlers to exit the REPL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplControl {
    Continue,
    Quit,
}

/// Run the read-eval-print loop until the player quits or input ends.
///
/// The session has already been started; whatever it queued while starting is
/// shown before the first prompt.
///
/// # Errors
/// - Propagates a failure to read from stdin.
pub fn run_repl(session: &mut Session<'_>, config: &SkaldConfig) -> Result<()> {
    #[allow(clippy::enum_glob_use)]
    use Command::*;

    let mut view = View::new();
    view.show_logic = config.session.show_logic;
    view.show_signals = config.session.show_signals;

    let doc = session.document();
    let mut input_manager = InputManager::new(
        config.input.history,
        doc.sections.iter().map(|s| s.tag.clone()).collect(),
        doc.testbeds.iter().map(|t| t.tag.clone()).collect(),
    );

    collect_session_output(session, &mut view);
    view.flush();

    let mut inputs = 0usize;
    loop {
        let prompt = prompt_for(session).prompt_style().to_string();
        let input_event = if let Ok(event) = input_manager.read_line(&prompt) {
            event
        } else {
            view.push(ViewItem::Error("Failed to read input. Try again.".red().to_string()));
            view.flush();
            continue;
        };

        let line = match input_event {
            InputEvent::Line(line) => line,
            InputEvent::Eof => "quit".to_string(),
            InputEvent::Interrupted => {
                view.push(ViewItem::EngineMessage("Command canceled.".to_string()));
                view.flush();
                continue;
            },
        };
        inputs += 1;
        info!("input {inputs}: {line:?}");

        let command = parse_command(&line);
        let control = match &command {
            Select(number) => {
                select_handler(session, &mut view, *number);
                ReplControl::Continue
            },
            Continue => {
                continue_handler(session, &mut view);
                ReplControl::Continue
            },
            Back => {
                back_handler(session, &mut view);
                ReplControl::Continue
            },
            Replay => {
                replay_handler(session, &mut view);
                ReplControl::Continue
            },
            Goto(tag) => {
                goto_handler(session, &mut view, tag);
                ReplControl::Continue
            },
            Set { input, value } => {
                set_handler(session, &mut view, input, value);
                ReplControl::Continue
            },
            Restart(testbed) => {
                restart_handler(session, &mut view, testbed.as_deref());
                ReplControl::Continue
            },
            Status => {
                status_handler(session, &mut view);
                ReplControl::Continue
            },
            Testbeds => {
                testbeds_handler(session, &mut view);
                ReplControl::Continue
            },
            Help => {
                help_handler(&mut view);
                ReplControl::Continue
            },
            Usage(usage) => {
                view.push(ViewItem::Error(format!("usage: {usage}")));
                ReplControl::Continue
            },
            Unknown(text) => {
                unknown_handler(session, &mut view, text);
                ReplControl::Continue
            },
            Quit => quit_handler(session, &mut view),
        };

        view.flush();
        if control == ReplControl::Quit {
            break;
        }
    }
    Ok(())
}

/// Prompt text showing where the session is waiting.
fn prompt_for(session: &Session<'_>) -> String {
    let section = session.current_section().unwrap_or("-");
    match session.status() {
        SessionStatus::AwaitingSelection => format!("\n[#{section} | choose]>> "),
        SessionStatus::Running => format!("\n[#{section} | enter to continue]>> "),
        SessionStatus::Ended(_) => "\n[ended]>> ".to_string(),
    }
}
