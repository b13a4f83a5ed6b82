//! Terminal input handling for the player REPL.
//!
//! Wraps rustyline configuration and completion for the command keywords and
//! the loaded script's section and testbed tags. Falls back to plain stdin
//! when no terminal is attached.

use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use log::{info, warn};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Context, Helper};

/// Outcome of reading a line from the REPL input.
pub enum InputEvent {
    Line(String),
    Eof,
    Interrupted,
}

const KEYWORDS: &[&str] = &[
    "back", "continue", "exit", "goto", "help", "quit", "re", "restart", "set", "status", "testbeds",
];

lazy_static! {
    static ref COMMAND_TERMS: Vec<String> = {
        let mut terms: Vec<String> = KEYWORDS.iter().map(|k| (*k).to_string()).collect();
        terms.sort_unstable();
        terms
    };
}

type ReplEditor = rustyline::Editor<SkaldHelper, DefaultHistory>;

/// Completion source: command keywords, then tags after `goto` / `restart`.
#[derive(Default)]
struct SkaldHelper {
    sections: Vec<String>,
    testbeds: Vec<String>,
}

impl Helper for SkaldHelper {}

impl Completer for SkaldHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        Ok(self.candidates(line, pos))
    }
}

impl SkaldHelper {
    fn candidates(&self, line: &str, pos: usize) -> (usize, Vec<Pair>) {
        let (start, prefix) = current_prefix(line, pos);
        if let Some((keyword, partial)) = prefix.split_once(char::is_whitespace) {
            let tags = match keyword.to_lowercase().as_str() {
                "goto" => &self.sections,
                "restart" => &self.testbeds,
                _ => return (pos, Vec::new()),
            };
            let partial = partial.trim_start();
            let insert_at = pos - partial.len();
            let pairs = tags
                .iter()
                .filter(|tag| tag.starts_with(partial))
                .map(|tag| Pair {
                    display: tag.clone(),
                    replacement: tag.clone(),
                })
                .collect();
            return (insert_at, pairs);
        }

        if prefix.is_empty() {
            return (start, Vec::new());
        }
        let lower = prefix.to_lowercase();
        let pairs = COMMAND_TERMS
            .iter()
            .filter(|term| term.starts_with(&lower))
            .map(|term| Pair {
                display: term.clone(),
                replacement: term.clone(),
            })
            .collect();
        (start, pairs)
    }
}

impl Hinter for SkaldHelper {
    type Hint = String;
}

impl Highlighter for SkaldHelper {}

impl Validator for SkaldHelper {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        let _ = ctx;
        Ok(ValidationResult::Valid(None))
    }
}

fn current_prefix(line: &str, pos: usize) -> (usize, String) {
    let slice = &line[..pos];
    let trimmed = slice.trim_start_matches(char::is_whitespace);
    let start = pos - trimmed.len();
    (start, trimmed.to_string())
}

/// Line source for the REPL: a rustyline editor on a terminal, plain stdin otherwise.
pub struct InputManager {
    editor: Option<ReplEditor>,
    history_path: Option<PathBuf>,
}

impl InputManager {
    /// `sections` and `testbeds` feed tag completion; `history` turns on the
    /// persistent history file.
    pub fn new(history: bool, sections: Vec<String>, testbeds: Vec<String>) -> Self {
        if !io::stdin().is_terminal() {
            info!("stdin is not a terminal; reading plain lines");
            return Self::plain();
        }
        let mut editor = match ReplEditor::new() {
            Ok(editor) => editor,
            Err(err) => {
                warn!("line editor unavailable ({err}); reading plain lines");
                return Self::plain();
            },
        };
        editor.set_helper(Some(SkaldHelper { sections, testbeds }));

        let history_path = if history { history_file() } else { None };
        if let Some(path) = &history_path {
            load_history(&mut editor, path);
        }
        Self {
            editor: Some(editor),
            history_path,
        }
    }

    fn plain() -> Self {
        Self {
            editor: None,
            history_path: None,
        }
    }

    /// Read one line. A line editor that fails is dropped and the read is
    /// retried on plain stdin.
    pub fn read_line(&mut self, prompt: &str) -> io::Result<InputEvent> {
        let Some(editor) = self.editor.as_mut() else {
            return read_plain_line(prompt);
        };
        match editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty()
                    && let Err(err) = editor.add_history_entry(line.as_str())
                {
                    warn!("could not record history entry: {err}");
                }
                Ok(InputEvent::Line(line))
            },
            Err(ReadlineError::Interrupted) => Ok(InputEvent::Interrupted),
            Err(ReadlineError::Eof) => Ok(InputEvent::Eof),
            Err(err) => {
                warn!("line editor failed ({err}); switching to plain lines");
                self.save_history();
                self.editor = None;
                read_plain_line(prompt)
            },
        }
    }

    fn save_history(&mut self) {
        if let (Some(editor), Some(path)) = (self.editor.as_mut(), &self.history_path)
            && let Err(err) = editor.save_history(path)
        {
            warn!("could not save history to {}: {err}", path.display());
        }
    }
}

impl Drop for InputManager {
    fn drop(&mut self) {
        self.save_history();
    }
}

fn load_history(editor: &mut ReplEditor, path: &Path) {
    if let Some(dir) = path.parent()
        && let Err(err) = fs::create_dir_all(dir)
    {
        warn!("could not create {}: {err}", dir.display());
    }
    match editor.load_history(path) {
        Ok(()) => {},
        Err(ReadlineError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
            info!("starting new history at {}", path.display());
        },
        Err(err) => warn!("could not load history from {}: {err}", path.display()),
    }
}

fn read_plain_line(prompt: &str) -> io::Result<InputEvent> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(InputEvent::Eof);
    }
    Ok(InputEvent::Line(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// `<data dir>/skald/history.txt`, shared by every script.
fn history_file() -> Option<PathBuf> {
    dirs::data_local_dir().map(|base| base.join("skald").join("history.txt"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn helper() -> SkaldHelper {
        SkaldHelper {
            sections: vec!["tavern".into(), "bar".into(), "cellar".into()],
            testbeds: vec!["broke".into(), "rich".into()],
        }
    }

    fn replacements(pairs: &[Pair]) -> Vec<&str> {
        pairs.iter().map(|p| p.replacement.as_str()).collect()
    }

    #[test]
    fn history_lives_under_a_skald_directory() {
        if let Some(path) = history_file() {
            assert!(path.ends_with(Path::new("skald/history.txt")));
        }
    }

    #[test]
    fn plain_manager_has_no_history() {
        let manager = InputManager::plain();
        assert!(manager.editor.is_none());
        assert!(manager.history_path.is_none());
    }

    #[test]
    fn keywords_complete_from_prefix() {
        let (start, pairs) = helper().candidates("re", 2);
        assert_eq!(start, 0);
        assert_eq!(replacements(&pairs), vec!["re", "restart"]);
    }

    #[test]
    fn goto_completes_section_tags() {
        let line = "goto c";
        let (start, pairs) = helper().candidates(line, line.len());
        assert_eq!(start, 5);
        assert_eq!(replacements(&pairs), vec!["cellar"]);
    }

    #[test]
    fn restart_completes_testbed_tags() {
        let line = "restart ";
        let (start, pairs) = helper().candidates(line, line.len());
        assert_eq!(start, line.len());
        assert_eq!(replacements(&pairs), vec!["broke", "rich"]);
    }

    #[test]
    fn other_arguments_do_not_complete() {
        let line = "set go";
        let (_, pairs) = helper().candidates(line, line.len());
        assert!(pairs.is_empty());
    }
}
