/// Component expansion and property resolution inside a rendered tree
use crate::context::Context;
use crate::engine::Engine;
use crate::options::EngineOptions;
use crate::test_support::*;
use crate::value::Value;
use etch_blocks::{ComponentDefinition, Primitive, PropertyDefinition};
use etch_common::{EmptyStores, LoopPreset, MemoryComponentStore, MemoryLoopPresetStore};
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

fn heading_store() -> MemoryComponentStore {
    MemoryComponentStore::new().with(definition(
        "heading",
        vec![
            PropertyDefinition::new("text", Primitive::String, json!("Default Title")),
            PropertyDefinition::new("level", Primitive::Number, json!(2)),
        ],
        vec![text("<h2 data-level=\"{props.level}\">{props.text}</h2>")],
    ))
}

#[test]
fn test_instance_value_overrides_default() {
    let components = heading_store();
    let engine = Engine::new(&components, &EmptyStores, &EmptyStores);

    let custom = render_html(
        &engine,
        vec![component("heading", json!({"text": "Custom"}), vec![])],
        &Context::new(),
    );
    assert_eq!(custom, "<h2 data-level=\"2\">Custom</h2>");

    let default = render_html(
        &engine,
        vec![component("heading", json!({}), vec![])],
        &Context::new(),
    );
    assert_eq!(default, "<h2 data-level=\"2\">Default Title</h2>");
}

#[test]
fn test_attributes_resolve_against_call_site() {
    let components = heading_store();
    let engine = Engine::new(&components, &EmptyStores, &EmptyStores);
    let ctx = Context::new()
        .with("this", Value::from(json!({"title": "Page"})))
        .with("props", Value::from(json!({"text": "outer props"})));

    let html = render_html(
        &engine,
        vec![component(
            "heading",
            json!({"text": "{this.title} / {props.text}", "level": "3"}),
            vec![],
        )],
        &ctx,
    );
    assert_eq!(html, "<h2 data-level=\"3\">Page / outer props</h2>");
}

#[test]
fn test_component_sees_ancestor_keys_but_own_props() {
    let components = MemoryComponentStore::new().with(definition(
        "byline",
        vec![PropertyDefinition::new("prefix", Primitive::String, json!("By"))],
        vec![text("{props.prefix} {user.name}{props.outer}")],
    ));
    let engine = Engine::new(&components, &EmptyStores, &EmptyStores);
    let ctx = Context::new()
        .with("user", Value::from(json!({"name": "Ada"})))
        .with("props", Value::from(json!({"outer": "!"})));

    let html = render_html(&engine, vec![component("byline", json!({}), vec![])], &ctx);
    assert_eq!(html, "By Ada");
}

#[test]
fn test_missing_component_is_dropped() {
    let output = render(
        &Engine::standalone(),
        vec![component("nope", json!({}), vec![]), raw("<p>after</p>")],
        &Context::new(),
    );
    assert_eq!(output.nodes.len(), 1);
    assert_eq!(output.to_html(), "<p>after</p>");
}

#[test]
fn test_array_property_from_preset_feeds_loop() {
    let presets = MemoryLoopPresetStore::new().with(LoopPreset {
        id: "menu".to_string(),
        key: None,
        items: vec![json!({"label": "Home"}), json!({"label": "Blog"})],
    });
    let components = MemoryComponentStore::new().with(definition(
        "nav",
        vec![PropertyDefinition::new("links", Primitive::String, json!("")).specialized("array")],
        vec![looped(
            json!({"itemId": "link", "target": "props.links"}),
            vec![text("<a>{link.label}</a>")],
        )],
    ));
    let engine = Engine::new(&components, &presets, &EmptyStores);

    let html = render_html(
        &engine,
        vec![component("nav", json!({"links": "menu"}), vec![])],
        &Context::new(),
    );
    assert_eq!(html, "<a>Home</a><a>Blog</a>");

    let inline = render_html(
        &engine,
        vec![component("nav", json!({"links": "[{\"label\": \"Docs\"}]"}), vec![])],
        &Context::new(),
    );
    assert_eq!(inline, "<a>Docs</a>");
}

#[test]
fn test_direct_self_inclusion_is_dropped() {
    let components = MemoryComponentStore::new().with(definition(
        "tree",
        vec![],
        vec![
            text("<i>tree</i>"),
            component("tree", json!({}), vec![]),
            component("tree", json!({}), vec![]),
        ],
    ));
    let engine = Engine::new(&components, &EmptyStores, &EmptyStores);

    let output = render(&engine, vec![component("tree", json!({}), vec![])], &Context::new());
    assert_eq!(output.nodes.len(), 1);
    assert_eq!(output.to_html(), "<i>tree</i>");
}

#[test]
fn test_indirect_self_inclusion_is_dropped() {
    let components = MemoryComponentStore::new()
        .with(definition(
            "ping",
            vec![],
            vec![text("ping "), component("pong", json!({}), vec![])],
        ))
        .with(definition(
            "pong",
            vec![],
            vec![text("pong "), component("ping", json!({}), vec![])],
        ));
    let engine = Engine::new(&components, &EmptyStores, &EmptyStores);

    let html = render_html(&engine, vec![component("ping", json!({}), vec![])], &Context::new());
    assert_eq!(html, "ping pong ");
}

#[test]
fn test_recursion_through_loop_is_cut_off_by_depth() {
    let components = MemoryComponentStore::new().with(definition(
        "echo",
        vec![],
        vec![
            text("<i>echo</i>"),
            looped(
                json!({"target": "this.once"}),
                vec![component("echo", json!({}), vec![])],
            ),
        ],
    ));
    let options = EngineOptions {
        max_component_depth: 3,
        ..Default::default()
    };
    let engine = Engine::new(&components, &EmptyStores, &EmptyStores).with_options(options);
    let ctx = Context::new().with("this", Value::from(json!({"once": [1]})));

    let html = render_html(&engine, vec![component("echo", json!({}), vec![])], &ctx);
    assert_eq!(html, "<i>echo</i><i>echo</i><i>echo</i>");
}

#[test]
fn test_fan_out_recursion_stops_at_call_budget() {
    let components = MemoryComponentStore::new().with(definition(
        "tree",
        vec![],
        vec![
            text("<i>tree</i>"),
            looped(
                json!({"target": "this.pair"}),
                vec![component("tree", json!({}), vec![])],
            ),
        ],
    ));
    let options = EngineOptions {
        max_component_calls: 20,
        ..Default::default()
    };
    let engine = Engine::new(&components, &EmptyStores, &EmptyStores).with_options(options);
    let ctx = Context::new().with("this", Value::from(json!({"pair": [1, 2]})));

    let output = render(&engine, vec![component("tree", json!({}), vec![])], &ctx);
    assert_eq!(output.nodes.len(), 20);
}

#[test]
fn test_same_component_in_slot_content_is_not_recursion() {
    let components = MemoryComponentStore::new().with(definition(
        "box",
        vec![PropertyDefinition::new("label", Primitive::String, json!("box"))],
        vec![
            text("[{props.label}"),
            slot_placeholder("default"),
            text("]"),
        ],
    ));
    let engine = Engine::new(&components, &EmptyStores, &EmptyStores);

    let html = render_html(
        &engine,
        vec![component(
            "box",
            json!({"label": "outer"}),
            vec![slot(
                "default",
                vec![component("box", json!({"label": "inner"}), vec![])],
            )],
        )],
        &Context::new(),
    );
    assert_eq!(html, "[outer[inner]]");
}

#[test]
fn test_data_bounded_recursion_renders() {
    let components = MemoryComponentStore::new().with(definition(
        "tree",
        vec![PropertyDefinition::new("node", Primitive::Object, json!({}))],
        vec![
            text("<b>{props.node.label}</b>"),
            looped(
                json!({"itemId": "child", "target": "props.node.children"}),
                vec![component("tree", json!({"node": "{child}"}), vec![])],
            ),
        ],
    ));
    let engine = Engine::new(&components, &EmptyStores, &EmptyStores);
    let ctx = Context::new().with(
        "this",
        Value::from(json!({
            "root": {"label": "1", "children": [
                {"label": "1.1", "children": [{"label": "1.1.1"}]},
                {"label": "1.2"}
            ]}
        })),
    );

    let html = render_html(
        &engine,
        vec![component("tree", json!({"node": "{this.root}"}), vec![])],
        &ctx,
    );
    assert_eq!(html, "<b>1</b><b>1.1</b><b>1.1.1</b><b>1.2</b>");
}
