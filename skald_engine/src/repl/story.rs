//! `repl::story` module
//!
//! Handlers for commands that move through the story: picking choices,
//! continuing, rewinding, jumping and editing state.

use log::info;

use crate::session::{CommandError, Session, SessionStatus};
use crate::view::{View, ViewItem};

/// Move everything the session queued into the view.
pub fn collect_session_output(session: &mut Session<'_>, view: &mut View) {
    let doc = session.document();
    for event in session.drain_events() {
        view.push_event(event, doc);
    }
    view.push_notices(session.drain_notices());
}

/// Show the outcome of a session call: its output on success, the refusal otherwise.
fn report<T>(session: &mut Session<'_>, view: &mut View, outcome: Result<T, CommandError>) {
    if let Err(err) = outcome {
        info!("command rejected: {err}");
        view.push(ViewItem::Error(err.to_string()));
    }
    collect_session_output(session, view);
}

/// Take a numbered choice.
pub fn select_handler(session: &mut Session<'_>, view: &mut View, number: usize) {
    let outcome = session.select(number);
    report(session, view, outcome);
}

/// Move on from a section with no choices.
pub fn continue_handler(session: &mut Session<'_>, view: &mut View) {
    let outcome = session.advance();
    report(session, view, outcome);
}

/// Undo the last turn.
pub fn back_handler(session: &mut Session<'_>, view: &mut View) {
    let outcome = session.back();
    report(session, view, outcome);
}

/// Step back one input and show it again.
pub fn replay_handler(session: &mut Session<'_>, view: &mut View) {
    let outcome = session.replay();
    report(session, view, outcome);
}

pub fn goto_handler(session: &mut Session<'_>, view: &mut View, tag: &str) {
    let outcome = session.goto(tag);
    report(session, view, outcome);
}

pub fn set_handler(session: &mut Session<'_>, view: &mut View, input: &str, value: &str) {
    let outcome = session.set(input, value);
    report(session, view, outcome);
}

/// Input that is neither a number nor a command.
///
/// With no choices on screen it continues the story; otherwise it is rejected.
pub fn unknown_handler(session: &mut Session<'_>, view: &mut View, text: &str) {
    match session.status() {
        SessionStatus::Running => continue_handler(session, view),
        SessionStatus::AwaitingSelection => {
            view.push(ViewItem::Error(format!(
                "'{text}' is not a choice or a command (type help for a list)"
            )));
        },
        SessionStatus::Ended(_) => {
            view.push(ViewItem::Error(
                "the story has ended: use back, restart or exit".to_string(),
            ));
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skald_data::Value;
    use skald_script::parse_script;

    const SCRIPT: &str = "#a\nnpc: Pick one.\n>Left\n~went=1\n->b\n>Right\n?never\n->b\n#b\nnpc: Done.\nEND\n";

    fn errors(view: &View) -> Vec<&str> {
        view.items
            .iter()
            .filter_map(|item| match item {
                ViewItem::Error(msg) => Some(msg.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn rejected_choice_is_reported_and_state_kept() {
        let doc = parse_script(SCRIPT).expect("parse ok");
        let mut session = Session::start(&doc, None).expect("start");
        let mut view = View::new();
        collect_session_output(&mut session, &mut view);
        view.items.clear();

        select_handler(&mut session, &mut view, 2);
        assert_eq!(errors(&view), vec!["choice 2 is not available right now"]);
        select_handler(&mut session, &mut view, 7);
        assert_eq!(errors(&view).len(), 2);
        assert_eq!(session.current_section(), Some("a"));
        assert_eq!(session.state().value("went"), None);
    }

    #[test]
    fn unknown_text_is_rejected_while_choosing() {
        let doc = parse_script(SCRIPT).expect("parse ok");
        let mut session = Session::start(&doc, None).expect("start");
        let mut view = View::new();
        unknown_handler(&mut session, &mut view, "dance");
        assert_eq!(errors(&view), vec!["'dance' is not a choice or a command (type help for a list)"]);
        assert_eq!(session.status(), SessionStatus::AwaitingSelection);
    }

    #[test]
    fn unknown_text_continues_when_no_choices() {
        let doc = parse_script("#a\nnpc: one\n#b\nnpc: two\nEND\n").expect("parse ok");
        let mut session = Session::start(&doc, None).expect("start");
        let mut view = View::new();
        unknown_handler(&mut session, &mut view, "whatever");
        assert!(errors(&view).is_empty());
        assert_eq!(session.current_section(), Some("b"));
        assert!(view.items.contains(&ViewItem::AutoAdvance {
            from: "a".into(),
            to: "b".into()
        }));
    }

    #[test]
    fn set_and_goto_flow_through_view() {
        let doc = parse_script(SCRIPT).expect("parse ok");
        let mut session = Session::start(&doc, None).expect("start");
        let mut view = View::new();
        set_handler(&mut session, &mut view, "went", "2");
        assert_eq!(session.state().value("went"), Some(&Value::Number(2.0)));
        goto_handler(&mut session, &mut view, "nowhere");
        assert_eq!(errors(&view), vec!["no section tagged 'nowhere'"]);
        goto_handler(&mut session, &mut view, "b");
        assert!(view.items.contains(&ViewItem::Jumped("b".into())));
    }
}
