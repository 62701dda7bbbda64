/// Element rendering: tags, attributes, literal markup, nested anchors, styles and SVG
use crate::context::Context;
use crate::engine::Engine;
use crate::options::EngineOptions;
use crate::test_support::*;
use crate::value::Value;
use etch_common::{EmptyStores, MemorySvgStore};
use serde_json::json;

fn ctx() -> Context {
    Context::new()
        .with(
            "this",
            Value::from(json!({"title": "Hello", "level": "h3", "url": "/about", "empty": ""})),
        )
        .with("site", Value::from(json!({"accent": "teal"})))
}

#[test]
fn test_static_element_drops_host_wrapper_classes() {
    let html = render_html(
        &Engine::standalone(),
        vec![element("div", json!({}), vec![])],
        &Context::new(),
    );
    assert_eq!(html, "<div></div>");
}

#[test]
fn test_attributes_resolve_and_escape() {
    let html = render_html(
        &Engine::standalone(),
        vec![element(
            "a",
            json!({"href": "{this.url}", "title": "Say \"{this.title}\"", "download": ""}),
            vec![text("{this.title}")],
        )],
        &ctx(),
    );
    assert_eq!(
        html,
        "<a href=\"/about\" title=\"Say &quot;Hello&quot;\" download>Hello</a>"
    );
}

#[test]
fn test_empty_resolved_value_is_boolean_attribute() {
    let html = render_html(
        &Engine::standalone(),
        vec![element(
            "input",
            json!({"disabled": "{this.empty}", "value": "0"}),
            vec![],
        )],
        &ctx(),
    );
    assert_eq!(html, "<input disabled value=\"0\">");
}

#[test]
fn test_dynamic_tag_is_resolved_and_sanitized() {
    let engine = Engine::standalone();
    let dynamic = |tag: &str| {
        element_with(
            json!({"type": "html", "tag": tag, "dynamicTag": true}),
            vec![text("x")],
        )
    };

    assert_eq!(render_html(&engine, vec![dynamic("{this.level}")], &ctx()), "<h3>x</h3>");
    assert_eq!(
        render_html(&engine, vec![dynamic("{this.title} World!")], &ctx()),
        "<hello-world>x</hello-world>"
    );
    assert_eq!(render_html(&engine, vec![dynamic("{this.missing}")], &ctx()), "<div>x</div>");
}

#[test]
fn test_remove_wrapper_inlines_children() {
    let html = render_html(
        &Engine::standalone(),
        vec![element_with(
            json!({"type": "html", "tag": "section", "removeWrapper": true}),
            vec![raw("<p>a</p>"), raw("<p>b</p>")],
        )],
        &ctx(),
    );
    assert_eq!(html, "<p>a</p><p>b</p>");
}

#[test]
fn test_styles_registered_only_for_dynamic_attributes() {
    let engine = Engine::standalone();
    let output = render(
        &engine,
        vec![
            element_with(
                json!({"type": "html", "tag": "div", "attributes": {"class": "card"}, "styles": ["s-static"]}),
                vec![],
            ),
            element_with(
                json!({"type": "html", "tag": "div", "attributes": {"data-color": "{site.accent}"}, "styles": ["s-dyn", "s-shared"]}),
                vec![],
            ),
            element_with(
                json!({"type": "html", "tag": "span", "attributes": {"title": "{this.title}"}, "styles": ["s-shared"]}),
                vec![],
            ),
        ],
        &ctx(),
    );
    assert_eq!(output.styles, vec!["s-dyn".to_string(), "s-shared".to_string()]);
}

#[test]
fn test_style_element_content_left_untouched() {
    let block = json!({
        "blockName": "etch/element",
        "attrs": {"metadata": {"etchData": {"type": "html", "tag": "style"}}},
        "innerBlocks": [],
        "innerHTML": "<style>.x { color: {site.accent}; }</style>",
        "innerContent": ["<style>.x { color: {site.accent}; }</style>"]
    });

    let plain = render_html(&Engine::standalone(), vec![block.clone()], &ctx());
    assert_eq!(plain, "<style>.x { color: {site.accent}; }</style>");

    let options = EngineOptions {
        resolve_inside_style: true,
        ..Default::default()
    };
    let resolved = render_html(&Engine::standalone().with_options(options), vec![block], &ctx());
    assert_eq!(resolved, "<style>.x { color: teal; }</style>");
}

#[test]
fn test_leaf_markup_of_sibling_elements_is_kept_whole() {
    let leaf = |markup: &str| {
        json!({
            "blockName": "etch/element",
            "attrs": {"metadata": {"etchData": {"type": "html", "tag": "section"}}},
            "innerBlocks": [],
            "innerHTML": markup,
            "innerContent": [markup]
        })
    };
    let engine = Engine::standalone();

    assert_eq!(
        render_html(&engine, vec![leaf("<b>a</b> and <b>b</b>")], &ctx()),
        "<section><b>a</b> and <b>b</b></section>"
    );
    assert_eq!(
        render_html(&engine, vec![leaf("<section><section>x</section></section>")], &ctx()),
        "<section><section>x</section></section>"
    );
}

#[test]
fn test_nested_metadata_by_marker_and_tag() {
    let markup = r#"<p>Go <a data-etch-ref="link1">there</a> or <em>here</em></p>"#;
    let block = json!({
        "blockName": "etch/element",
        "attrs": {"metadata": {"etchData": {
            "type": "html",
            "tag": "p",
            "nested": {
                "link1": {"attributes": {"href": "{this.url}"}, "styles": ["s-link"]},
                "em": {"attributes": {"class": "accent-{site.accent}"}}
            }
        }}},
        "innerBlocks": [],
        "innerHTML": markup,
        "innerContent": [markup]
    });

    let output = render(&Engine::standalone(), vec![block], &ctx());
    assert_eq!(
        output.to_html(),
        r#"<p>Go <a href="/about">there</a> or <em class="accent-teal">here</em></p>"#
    );
    assert_eq!(output.styles, vec!["s-link".to_string()]);
}

#[test]
fn test_svg_is_inlined_with_attribute_overlay() {
    let svgs = MemorySvgStore::new().with(
        "https://cdn.example.com/icons/star.svg",
        r#"<?xml version="1.0"?><svg xmlns="http://www.w3.org/2000/svg" id="star" viewBox="0 0 24 24" class="icon"><path d="M12 2"/></svg>"#,
    );
    let engine = Engine::new(&EmptyStores, &EmptyStores, &svgs);

    let html = render_html(
        &engine,
        vec![element_with(
            json!({
                "type": "html",
                "tag": "svg",
                "special": "svg",
                "attributes": {"src": "{this.icon}", "class": "icon icon-lg"}
            }),
            vec![],
        )],
        &ctx().with(
            "this",
            Value::from(json!({"icon": "https://cdn.example.com/icons/star.svg"})),
        ),
    );
    assert_eq!(
        html,
        r#"<svg viewBox="0 0 24 24" class="icon icon-lg"><path d="M12 2"/></svg>"#
    );
}

#[test]
fn test_svg_fetch_failure_renders_empty_element() {
    let html = render_html(
        &Engine::standalone(),
        vec![element_with(
            json!({"type": "html", "tag": "svg", "special": "svg", "attributes": {"src": "missing.svg", "width": "16"}}),
            vec![],
        )],
        &ctx(),
    );
    assert_eq!(html, r#"<svg width="16"></svg>"#);
}
