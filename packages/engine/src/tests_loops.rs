/// Loop expansion inside a rendered tree
use crate::context::Context;
use crate::engine::Engine;
use crate::test_support::*;
use crate::value::Value;
use etch_common::{EmptyStores, LoopPreset, MemoryLoopPresetStore};
use serde_json::json;

fn ctx() -> Context {
    Context::new().with(
        "this",
        Value::from(json!({
            "posts": [{"name": "A"}, {"name": "B"}, {"name": "C"}],
            "meta": {"color": "red", "size": "xl"}
        })),
    )
}

#[test]
fn test_loop_renders_template_per_item() {
    let html = render_html(
        &Engine::standalone(),
        vec![looped(
            json!({"itemId": "item", "target": "this.posts"}),
            vec![text("<p>{item.name}</p>")],
        )],
        &ctx(),
    );
    assert_eq!(html, "<p>A</p><p>B</p><p>C</p>");
}

#[test]
fn test_loop_keeps_sibling_order_within_item() {
    let html = render_html(
        &Engine::standalone(),
        vec![looped(
            json!({"itemId": "post", "indexId": "i", "target": "{this.posts}"}),
            vec![text("<h2>{i}</h2>"), text("<p>{post.name}</p>")],
        )],
        &ctx(),
    );
    assert_eq!(html, "<h2>0</h2><p>A</p><h2>1</h2><p>B</p><h2>2</h2><p>C</p>");
}

#[test]
fn test_object_target_binds_keys() {
    let html = render_html(
        &Engine::standalone(),
        vec![looped(
            json!({"itemId": "value", "indexId": "key", "target": "this.meta"}),
            vec![text("{key}={value};")],
        )],
        &ctx(),
    );
    assert_eq!(html, "color=red;size=xl;");
}

#[test]
fn test_non_iterable_target_drops() {
    let output = render(
        &Engine::standalone(),
        vec![
            looped(
                json!({"target": "this.posts.0.name"}),
                vec![text("<p>{item}</p>")],
            ),
            looped(json!({"target": "this.missing"}), vec![text("x")]),
        ],
        &ctx(),
    );
    assert!(output.nodes.is_empty());
}

#[test]
fn test_nested_loops_shadow_and_restore() {
    let ctx = Context::new().with(
        "this",
        Value::from(json!({
            "groups": [
                {"label": "g1", "items": ["a", "b"]},
                {"label": "g2", "items": ["c"]}
            ]
        })),
    );
    let html = render_html(
        &Engine::standalone(),
        vec![looped(
            json!({"itemId": "item", "target": "this.groups"}),
            vec![
                looped(
                    json!({"itemId": "item", "target": "item.items"}),
                    vec![text("[{item}]")],
                ),
                text("({item.label})"),
            ],
        )],
        &ctx,
    );
    assert_eq!(html, "[a][b](g1)[c](g2)");
}

#[test]
fn test_preset_loop_with_params() {
    let presets = MemoryLoopPresetStore::new().with(LoopPreset {
        id: "k7x2p".to_string(),
        key: Some("latest-posts".to_string()),
        items: vec![
            json!({"title": "One"}),
            json!({"title": "Two"}),
            json!({"title": "Three"}),
        ],
    });
    let engine = Engine::new(&EmptyStores, &presets, &EmptyStores);
    let ctx = Context::new().with("props", Value::from(json!({"perPage": 2})));

    let html = render_html(
        &engine,
        vec![looped(
            json!({
                "itemId": "post",
                "target": "k7x2p",
                "params": {"$limit": "{props.perPage}", "$offset": "1"}
            }),
            vec![text("<li>{post.title}</li>")],
        )],
        &ctx,
    );
    assert_eq!(html, "<li>Two</li><li>Three</li>");
}

#[test]
fn test_loop_inside_element_resyncs_slots() {
    let tree = element(
        "ul",
        json!({}),
        vec![looped(
            json!({"target": "this.posts"}),
            vec![text("<li>{item.name}</li>")],
        )],
    );
    let output = render(&Engine::standalone(), vec![tree], &ctx());
    let list = &output.nodes[0];

    assert_eq!(list.children.len(), 3);
    assert_eq!(list.inner_slots.len(), 5);
    assert_eq!(output.to_html(), "<ul><li>A</li><li>B</li><li>C</li></ul>");
}
