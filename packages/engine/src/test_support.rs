//! Builders for host block JSON used across the engine test modules.

use crate::context::Context;
use crate::engine::{Engine, RenderOutput};
use etch_blocks::{parse_blocks_value, Node};
use serde_json::{json, Value as Json};

fn structural(block_name: &str, etch_data: Json, children: Vec<Json>) -> Json {
    let inner_content: Vec<Json> = children.iter().map(|_| Json::Null).collect();
    json!({
        "blockName": block_name,
        "attrs": {"metadata": {"etchData": etch_data}},
        "innerBlocks": children,
        "innerHTML": "",
        "innerContent": inner_content,
    })
}

/// `etch/element` with the default wrapper markup
pub fn element(tag: &str, attributes: Json, children: Vec<Json>) -> Json {
    element_with(json!({"type": "html", "tag": tag, "attributes": attributes}), children)
}

pub fn element_with(etch_data: Json, children: Vec<Json>) -> Json {
    let open = r#"<div class="wp-block-etch-element">"#;
    let close = "</div>";
    let inner_content: Vec<Json> = if children.is_empty() {
        vec![json!(format!("{}{}", open, close))]
    } else {
        std::iter::once(json!(open))
            .chain(children.iter().map(|_| Json::Null))
            .chain(std::iter::once(json!(close)))
            .collect()
    };
    json!({
        "blockName": "etch/element",
        "attrs": {"metadata": {"etchData": etch_data}},
        "innerBlocks": children,
        "innerHTML": format!("{}{}", open, close),
        "innerContent": inner_content,
    })
}

/// Text block whose markup is resolved in place
pub fn text(markup: &str) -> Json {
    json!({
        "blockName": "etch/text",
        "attrs": {"metadata": {"etchData": {"type": "text"}}},
        "innerBlocks": [],
        "innerHTML": markup,
        "innerContent": [markup],
    })
}

/// Block without engine metadata
pub fn raw(markup: &str) -> Json {
    json!({
        "blockName": "core/html",
        "attrs": {},
        "innerBlocks": [],
        "innerHTML": markup,
        "innerContent": [markup],
    })
}

pub fn condition(condition: Json, children: Vec<Json>) -> Json {
    structural(
        "etch/condition",
        json!({"type": "condition", "condition": condition}),
        children,
    )
}

pub fn looped(spec: Json, children: Vec<Json>) -> Json {
    structural("etch/loop", json!({"type": "loop", "loop": spec}), children)
}

pub fn component(id: &str, attributes: Json, children: Vec<Json>) -> Json {
    structural(
        "etch/component",
        json!({"type": "component", "component": id, "attributes": attributes}),
        children,
    )
}

pub fn slot(name: &str, children: Vec<Json>) -> Json {
    structural("etch/slot-content", json!({"type": "slot", "slot": name}), children)
}

pub fn slot_placeholder(name: &str) -> Json {
    structural(
        "etch/slot-placeholder",
        json!({"type": "slot-placeholder", "slot": name}),
        vec![],
    )
}

pub fn nodes(blocks: Vec<Json>) -> Vec<Node> {
    parse_blocks_value(Json::Array(blocks)).unwrap()
}

pub fn render(engine: &Engine, blocks: Vec<Json>, ctx: &Context) -> RenderOutput {
    engine.render(&nodes(blocks), ctx)
}

pub fn render_html(engine: &Engine, blocks: Vec<Json>, ctx: &Context) -> String {
    render(engine, blocks, ctx).to_html()
}
