use pretty_assertions::assert_eq;
use serde_json::json;
use skald_data::{Block, ConditionOp, MutationOp, Operand, Value};
use skald_script::{OutputFormat, ScriptErrorKind, parse_script, parse_script_with_report, render_document};

#[test]
fn literal_braces_stay_in_block_body() {
    let doc = parse_script(include_str!("fixtures/scenario_a.ska")).expect("parse ok");
    assert_eq!(doc.sections.len(), 2);

    let start = &doc.sections[0];
    assert_eq!(
        start.blocks,
        vec![Block::Attributed {
            tag: "npc".into(),
            body: "Hello {nonexistent}".into(),
            meta: Default::default(),
        }]
    );
    assert_eq!(start.choices.len(), 1);
    assert_eq!(start.choices[0].body, "Go");
    assert_eq!(start.choices[0].meta.transition.as_deref(), Some("end"));

    let end = &doc.sections[1];
    assert_eq!(end.tag, "end");
    assert_eq!(end.blocks.len(), 1);
    assert!(end.blocks[0].meta().is_end);
    assert!(end.choices.is_empty());
}

#[test]
fn second_transition_is_reported_and_discarded() {
    let report = parse_script_with_report(include_str!("fixtures/double_transition.ska"));
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].line, Some(4));
    assert_eq!(report.errors[0].kind, ScriptErrorKind::ExtraTransition);
    assert_eq!(report.errors[0].text, "->right");
    let doc = report.document.expect("document survives a discarded transition");
    assert_eq!(doc.sections[0].blocks[0].meta().transition.as_deref(), Some("left"));

    let doc = parse_script(include_str!("fixtures/double_transition.ska")).expect("parse ok");
    assert_eq!(doc.sections[0].blocks[0].meta().transition.as_deref(), Some("left"));
}

#[test]
fn script_without_end_fails_with_single_error() {
    let failure = parse_script(include_str!("fixtures/no_endings.ska")).expect_err("must fail");
    assert_eq!(failure.errors.len(), 1);
    assert_eq!(failure.errors[0].kind, ScriptErrorKind::NoEndings);
    assert_eq!(failure.errors[0].line, None);
    assert_eq!(failure.to_string(), "no endings found");
}

#[test]
fn tavern_collects_names_in_first_seen_order() {
    let doc = parse_script(include_str!("fixtures/tavern.ska")).expect("parse ok");
    assert_eq!(doc.characters, vec!["barkeep", "narrator"]);
    assert_eq!(doc.inputs, vec!["gold", "visits", "drunk", "hasKey"]);
    assert_eq!(doc.signals, vec!["door-creak"]);
    assert_eq!(
        doc.sections.iter().map(|s| s.tag.as_str()).collect::<Vec<_>>(),
        vec!["tavern", "bar", "cellar", "outside"]
    );

    let rich = doc.testbed("rich").expect("rich testbed");
    assert_eq!(rich.sets.get("gold"), Some(&Value::Number(100.0)));
    assert_eq!(rich.sets.get("hasKey"), Some(&Value::Bool(true)));

    let tavern = doc.section("tavern").expect("tavern");
    assert_eq!(tavern.blocks.len(), 3);
    assert_eq!(tavern.blocks[1].meta().conditions[0].operator, ConditionOp::Ge);
    let buy = &tavern.choices[0].meta;
    assert_eq!(buy.mutations[0].operator, MutationOp::Subtract);
    assert_eq!(buy.mutations[0].value, Operand::Literal(Value::Number(5.0)));
    assert_eq!(buy.mutations[1].value, Operand::Literal(Value::Bool(true)));
}

#[test]
fn json_output_matches_interchange_shape() {
    let doc = parse_script(include_str!("fixtures/scenario_a.ska")).expect("parse ok");
    let text = render_document(&doc, OutputFormat::Json).expect("render ok");
    let actual: serde_json::Value = serde_json::from_str(&text).expect("valid json");
    let expected = json!({
        "characters": ["npc"],
        "inputs": [],
        "signals": [],
        "testbeds": [],
        "sections": [
            {
                "tag": "start",
                "blocks": [{
                    "type": "attributed",
                    "tag": "npc",
                    "body": "Hello {nonexistent}",
                    "meta": { "conditions": [], "mutations": [], "signals": [], "isEnd": false }
                }],
                "choices": [{
                    "body": "Go",
                    "meta": { "conditions": [], "mutations": [], "signals": [], "transition": "end", "isEnd": false }
                }]
            },
            {
                "tag": "end",
                "blocks": [{
                    "type": "logic",
                    "label": "END",
                    "meta": { "conditions": [], "mutations": [], "signals": [], "isEnd": true }
                }],
                "choices": []
            }
        ]
    });
    assert_eq!(actual, expected);
}

#[test]
fn compiled_documents_round_trip() {
    let doc = parse_script(include_str!("fixtures/tavern.ska")).expect("parse ok");

    let json = render_document(&doc, OutputFormat::Json).expect("json");
    let from_json: skald_data::Document = serde_json::from_str(&json).expect("json back");
    assert_eq!(from_json, doc);

    let ron_text = render_document(&doc, OutputFormat::Ron).expect("ron");
    assert!(ron_text.contains("tag: \"tavern\""));
    assert!(ron_text.contains("isEnd: true"));
    assert!(ron_text.contains("operator: \">=\""));
    let from_ron: skald_data::Document = ron::from_str(&ron_text).expect("ron back");
    assert_eq!(from_ron, doc);
}

#[test]
fn every_error_is_collected_in_one_pass() {
    let src = "\
#start
?orphan
npc: hi
~bad name=1
~x=-5
#start
# broken
what is this
->nowhere
";
    let report = parse_script_with_report(src);
    let kinds: Vec<_> = report.errors.iter().map(|e| (e.line, e.kind.clone())).collect();
    assert_eq!(
        kinds,
        vec![
            (Some(2), ScriptErrorKind::DanglingMeta("condition")),
            (Some(4), ScriptErrorKind::BadInputName("bad name".into())),
            (Some(5), ScriptErrorKind::BadMutationOperator("=-".into())),
            (Some(6), ScriptErrorKind::DuplicateSection("start".into())),
            (Some(7), ScriptErrorKind::ImproperSectionTag),
            (Some(8), ScriptErrorKind::Unhandled),
            (Some(9), ScriptErrorKind::DanglingMeta("transition")),
            (None, ScriptErrorKind::NoEndings),
        ]
    );
}
