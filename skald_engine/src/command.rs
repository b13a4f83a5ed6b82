//! Command module
//!
//! Describes the commands a player can type while a script is running.
use variantly::Variantly;

/// Commands that can be executed by the player.
#[derive(Debug, Clone, PartialEq, Eq, Variantly)]
pub enum Command {
    Back,
    Continue,
    Goto(String),
    Help,
    Quit,
    Replay,
    Restart(Option<String>),
    Select(usize),
    Set { input: String, value: String },
    Status,
    Testbeds,
    /// A known keyword used the wrong way; carries the usage line.
    Usage(&'static str),
    Unknown(String),
}

pub const SET_USAGE: &str = "set <input> = <value>";
pub const GOTO_USAGE: &str = "goto <section>";

/// Parses an input line. Keywords are case-insensitive; arguments keep their case.
pub fn parse_command(input: &str) -> Command {
    let line = input.trim();
    if line.is_empty() {
        return Command::Continue;
    }
    if let Ok(number) = line.parse::<usize>() {
        return Command::Select(number);
    }

    let (keyword, rest) = match line.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (line, ""),
    };
    let keyword = keyword.to_lowercase();
    match (keyword.as_str(), rest) {
        ("continue" | "c", "") => Command::Continue,
        ("help" | "?", "") => Command::Help,
        ("status", "") => Command::Status,
        ("re", "") => Command::Replay,
        ("back", "") => Command::Back,
        ("testbeds", "") => Command::Testbeds,
        ("restart", "") => Command::Restart(None),
        ("restart", tag) => Command::Restart(Some(tag.to_string())),
        ("goto", "") => Command::Usage(GOTO_USAGE),
        ("goto", tag) => Command::Goto(tag.to_string()),
        ("set", assignment) => match assignment.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => Command::Set {
                input: name.trim().to_string(),
                value: value.trim().to_string(),
            },
            _ => Command::Usage(SET_USAGE),
        },
        ("exit" | "quit", "") => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_select_choices() {
        assert_eq!(parse_command("2"), Command::Select(2));
        assert_eq!(parse_command(" 10 \n"), Command::Select(10));
        assert!(parse_command("-1").is_unknown());
    }

    #[test]
    fn blank_line_continues() {
        assert_eq!(parse_command(""), Command::Continue);
        assert_eq!(parse_command("\n"), Command::Continue);
        assert_eq!(parse_command("C"), Command::Continue);
    }

    #[test]
    fn keywords_ignore_case_but_arguments_do_not() {
        assert_eq!(parse_command("GOTO Cellar"), Command::Goto("Cellar".into()));
        assert_eq!(parse_command("Restart rich"), Command::Restart(Some("rich".into())));
        assert_eq!(parse_command("restart"), Command::Restart(None));
        assert_eq!(parse_command("Exit"), Command::Quit);
        assert_eq!(parse_command("re"), Command::Replay);
    }

    #[test]
    fn set_takes_an_assignment() {
        assert_eq!(
            parse_command("set gold = 50"),
            Command::Set {
                input: "gold".into(),
                value: "50".into()
            }
        );
        assert_eq!(
            parse_command("set name=Ada Lovelace"),
            Command::Set {
                input: "name".into(),
                value: "Ada Lovelace".into()
            }
        );
        assert_eq!(parse_command("set gold"), Command::Usage(SET_USAGE));
        assert_eq!(parse_command("goto"), Command::Usage(GOTO_USAGE));
    }

    #[test]
    fn anything_else_is_unknown() {
        assert_eq!(parse_command("dance wildly"), Command::Unknown("dance wildly".into()));
        assert_eq!(parse_command("back please"), Command::Unknown("back please".into()));
    }
}
