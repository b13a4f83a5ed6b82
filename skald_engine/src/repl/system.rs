//! `repl::system` module
//!
//! Contains repl loop handlers for commands that inspect or reset the session
//! rather than advance the story.

use log::info;

use crate::repl::ReplControl;
use crate::repl::story::collect_session_output;
use crate::session::{CommandError, Session};
use crate::state::Slot;
use crate::view::{View, ViewItem};

/// Show available commands.
pub fn help_handler(view: &mut View) {
    view.push(ViewItem::Help);
}

/// Dump every state entry, reserved keys included.
pub fn status_handler(session: &Session<'_>, view: &mut View) {
    let rows = session
        .state()
        .iter()
        .map(|(name, slot)| {
            let shown = match slot {
                Slot::Unset => "(unset)".to_string(),
                Slot::Set(value) => format!("{value} ({})", value.type_name()),
            };
            (name.clone(), shown)
        })
        .collect();
    view.push(ViewItem::Status(rows));
}

pub fn testbeds_handler(session: &Session<'_>, view: &mut View) {
    view.push(ViewItem::Testbeds {
        tags: session.testbeds().iter().map(|t| t.tag.clone()).collect(),
        active: session.testbed().map(|t| t.tag.clone()),
    });
}

/// Start over, from the named testbed or the first one.
pub fn restart_handler(session: &mut Session<'_>, view: &mut View, testbed: Option<&str>) {
    if let Err(err) = session.restart(testbed) {
        let msg = match err {
            CommandError::UnknownTestbed(tag) => {
                format!("no testbed tagged '{tag}'; restarted with the current one (see `testbeds`)")
            },
            other => other.to_string(),
        };
        view.push(ViewItem::Error(msg));
    }
    collect_session_output(session, view);
}

/// Leave the player, logging where the session stopped.
pub fn quit_handler(session: &Session<'_>, view: &mut View) -> ReplControl {
    info!(
        "player quit in section {:?} with status {:?}",
        session.current_section(),
        session.status()
    );
    info!("ending state:");
    for (name, slot) in session.state().iter() {
        info!("* {name} = {slot:?}");
    }
    view.push(ViewItem::EngineMessage("Goodbye.".to_string()));
    ReplControl::Quit
}

#[cfg(test)]
mod tests {
    use super::*;
    use skald_script::parse_script;

    const SCRIPT: &str = "@testbed broke\ngold=0\n@end\n@testbed rich\ngold=100\n@end\n#a\nnpc: hi\nEND\n";

    #[test]
    fn status_lists_every_entry_with_type() {
        let doc = parse_script(SCRIPT).expect("parse ok");
        let session = Session::start(&doc, Some("rich")).expect("start");
        let mut view = View::new();
        status_handler(&session, &mut view);
        let Some(ViewItem::Status(rows)) = view.items.first() else {
            panic!("expected status rows, got {:?}", view.items);
        };
        assert!(rows.contains(&("gold".to_string(), "100 (number)".to_string())));
        assert!(rows.contains(&("currentSection".to_string(), "a (string)".to_string())));
        assert!(rows.contains(&("isEnd".to_string(), "true (boolean)".to_string())));
    }

    #[test]
    fn testbeds_marks_the_active_one() {
        let doc = parse_script(SCRIPT).expect("parse ok");
        let session = Session::start(&doc, None).expect("start");
        let mut view = View::new();
        testbeds_handler(&session, &mut view);
        assert_eq!(
            view.items,
            vec![ViewItem::Testbeds {
                tags: vec!["broke".into(), "rich".into()],
                active: Some("broke".into()),
            }]
        );
    }

    #[test]
    fn restart_with_unknown_testbed_reports_and_restarts() {
        let doc = parse_script(SCRIPT).expect("parse ok");
        let mut session = Session::start(&doc, Some("rich")).expect("start");
        let mut view = View::new();
        restart_handler(&mut session, &mut view, Some("poor"));
        assert!(matches!(&view.items[0], ViewItem::Error(msg) if msg.contains("'poor'")));
        assert!(view.items.contains(&ViewItem::Restarted(Some("rich".into()))));
        assert_eq!(session.testbed().map(|t| t.tag.as_str()), Some("rich"));
    }

    #[test]
    fn quit_stops_the_loop() {
        let doc = parse_script(SCRIPT).expect("parse ok");
        let session = Session::start(&doc, None).expect("start");
        let mut view = View::new();
        assert_eq!(quit_handler(&session, &mut view), ReplControl::Quit);
    }
}
