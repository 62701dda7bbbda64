/// Slot capture and substitution, including slot content passed through nested components
use crate::context::Context;
use crate::engine::Engine;
use crate::test_support::*;
use crate::value::Value;
use etch_blocks::{ComponentDefinition, Primitive, PropertyDefinition};
use etch_common::{EmptyStores, MemoryComponentStore};
use serde_json::{json, Value as Json};

fn definition(
    id: &str,
    properties: Vec<PropertyDefinition>,
    blocks: Vec<Json>,
) -> ComponentDefinition {
    ComponentDefinition {
        id: id.to_string(),
        children: nodes(blocks),
        properties,
    }
}

fn card_store() -> MemoryComponentStore {
    MemoryComponentStore::new()
        .with(definition(
            "card",
            vec![PropertyDefinition::new("title", Primitive::String, json!("Card"))],
            vec![element(
                "article",
                json!({}),
                vec![
                    text("<h3>{props.title}</h3>"),
                    slot_placeholder("content"),
                    slot_placeholder("footer"),
                ],
            )],
        ))
        .with(definition(
            "panel",
            vec![PropertyDefinition::new("title", Primitive::String, json!("Panel"))],
            vec![component(
                "card",
                json!({"title": "{props.title} card"}),
                vec![slot("content", vec![slot_placeholder("body")])],
            )],
        ))
}

#[test]
fn test_slot_content_uses_call_site_context() {
    let components = card_store();
    let engine = Engine::new(&components, &EmptyStores, &EmptyStores);
    let ctx = Context::new().with("item", Value::from(json!({"title": "Test"})));

    let html = render_html(
        &engine,
        vec![component(
            "card",
            json!({}),
            vec![slot("content", vec![text("<p>Hello {item.title}</p>")])],
        )],
        &ctx,
    );
    assert_eq!(html, "<article><h3>Card</h3><p>Hello Test</p></article>");
}

#[test]
fn test_slot_content_does_not_see_component_props() {
    let components = card_store();
    let engine = Engine::new(&components, &EmptyStores, &EmptyStores);
    let ctx = Context::new().with("props", Value::from(json!({"title": "Caller"})));

    let html = render_html(
        &engine,
        vec![component(
            "card",
            json!({"title": "Inner"}),
            vec![slot("content", vec![text("<p>{props.title}</p>")])],
        )],
        &ctx,
    );
    assert_eq!(html, "<article><h3>Inner</h3><p>Caller</p></article>");
}

#[test]
fn test_slot_passed_through_nested_component() {
    let components = card_store();
    let engine = Engine::new(&components, &EmptyStores, &EmptyStores);
    let ctx = Context::new().with("this", Value::from(json!({"author": "Ada"})));

    let html = render_html(
        &engine,
        vec![component(
            "panel",
            json!({"title": "Profile"}),
            vec![slot("body", vec![text("<p>{this.author} / {props.title}</p>")])],
        )],
        &ctx,
    );
    assert_eq!(html, "<article><h3>Profile card</h3><p>Ada / </p></article>");
}

#[test]
fn test_slot_inside_loop_binds_outer_item() {
    let components = card_store();
    let engine = Engine::new(&components, &EmptyStores, &EmptyStores);
    let ctx = Context::new().with("this", Value::from(json!({"posts": [{"n": 1}, {"n": 2}]})));

    let html = render_html(
        &engine,
        vec![looped(
            json!({"itemId": "post", "target": "this.posts"}),
            vec![component(
                "card",
                json!({"title": "#{post.n}"}),
                vec![slot("content", vec![text("<p>{post.n}</p>")])],
            )],
        )],
        &ctx,
    );
    assert_eq!(
        html,
        "<article><h3>#1</h3><p>1</p></article><article><h3>#2</h3><p>2</p></article>"
    );
}

#[test]
fn test_unfilled_placeholders_drop_and_resync() {
    let components = card_store();
    let engine = Engine::new(&components, &EmptyStores, &EmptyStores);

    let output = render(&engine, vec![component("card", json!({}), vec![])], &Context::new());
    let article = &output.nodes[0];

    assert_eq!(article.children.len(), 1);
    assert_eq!(article.inner_slots.len(), 3);
    assert_eq!(output.to_html(), "<article><h3>Card</h3></article>");
}

#[test]
fn test_placeholder_outside_component_drops() {
    let output = render(
        &Engine::standalone(),
        vec![slot_placeholder("content")],
        &Context::new(),
    );
    assert!(output.nodes.is_empty());
}

#[test]
fn test_slot_outside_component_keeps_its_content() {
    let ctx = Context::new().with("this", Value::from(json!({"title": "Kept"})));
    let output = render(
        &Engine::standalone(),
        vec![slot("content", vec![text("<p>{this.title}</p>")]), slot_placeholder("content")],
        &ctx,
    );
    assert_eq!(output.nodes.len(), 1);
    assert_eq!(output.to_html(), "<p>Kept</p>");
}
