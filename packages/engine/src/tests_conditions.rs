/// Condition nodes inside a rendered tree
use crate::context::Context;
use crate::engine::Engine;
use crate::test_support::*;
use crate::value::Value;
use serde_json::json;

fn ctx() -> Context {
    Context::new()
        .with("user", Value::from(json!({"loggedIn": true, "role": "editor"})))
        .with("this", Value::from(json!({"title": "It&#039;s here", "count": "0"})))
}

#[test]
fn test_true_condition_renders_children() {
    let html = render_html(
        &Engine::standalone(),
        vec![condition(
            json!({"leftHand": "5", "operator": ">", "rightHand": "3"}),
            vec![raw("<p>ok</p>")],
        )],
        &ctx(),
    );
    assert_eq!(html, "<p>ok</p>");
}

#[test]
fn test_false_condition_drops_children() {
    let html = render_html(
        &Engine::standalone(),
        vec![
            condition(
                json!({"leftHand": "5", "operator": "<", "rightHand": "3"}),
                vec![raw("<p>ok</p>")],
            ),
            raw("<hr>"),
        ],
        &ctx(),
    );
    assert_eq!(html, "<hr>");
}

#[test]
fn test_missing_condition_is_true() {
    let block = json!({
        "blockName": "etch/condition",
        "attrs": {"metadata": {"etchData": {"type": "condition"}}},
        "innerBlocks": [raw("<p>a</p>"), raw("<p>b</p>")],
        "innerContent": [null, null]
    });
    let html = render_html(&Engine::standalone(), vec![block], &ctx());
    assert_eq!(html, "<p>a</p><p>b</p>");
}

#[test]
fn test_encoded_and_nested_conditions() {
    let cond = json!({
        "leftHand": {"leftHand": "{user.loggedIn}", "operator": "isTruthy"},
        "operator": "%26%26",
        "rightHand": {"leftHand": "{user.role}", "operator": "===", "rightHand": "'editor'"}
    });
    let html = render_html(
        &Engine::standalone(),
        vec![condition(cond, vec![raw("<p>editor</p>")])],
        &ctx(),
    );
    assert_eq!(html, "<p>editor</p>");
}

#[test]
fn test_string_zero_and_entities() {
    let engine = Engine::standalone();
    let zero = condition(
        json!({"leftHand": "{this.count}", "operator": "isTruthy"}),
        vec![raw("zero")],
    );
    assert_eq!(render_html(&engine, vec![zero], &ctx()), "");

    let title = condition(
        json!({"leftHand": "{this.title}", "operator": "==", "rightHand": "\"It's here\""}),
        vec![raw("match")],
    );
    assert_eq!(render_html(&engine, vec![title], &ctx()), "match");
}

#[test]
fn test_pruning_repairs_parent_slots() {
    let tree = element(
        "section",
        json!({}),
        vec![
            raw("<p>1</p>"),
            condition(
                json!({"leftHand": "1", "operator": "==", "rightHand": "2"}),
                vec![raw("<p>2</p>")],
            ),
            raw("<p>3</p>"),
        ],
    );
    let output = render(&Engine::standalone(), vec![tree], &ctx());
    let section = &output.nodes[0];

    assert_eq!(section.children.len(), 2);
    assert_eq!(section.placeholder_count(), 2);
    assert_eq!(section.inner_slots.len(), 4);
    assert_eq!(output.to_html(), "<section><p>1</p><p>3</p></section>");
}
