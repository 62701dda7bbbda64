//! Inline SVG elements: the `src` attribute is fetched through the SVG store and the
//! document is inlined with the element's own attributes laid over the root's.

use crate::context::Context;
use crate::engine::Renderer;
use crate::html::{attribute_markup, AttributeSet};
use crate::resolver::resolve;
use etch_blocks::{Metadata, Node};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

static SVG_ROOT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<svg\b([^>]*?)(/?)>(.*)").unwrap());
static SVG_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</svg\s*>\s*$").unwrap());
static SVG_ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#)
        .unwrap()
});

/// Root attributes and inner markup of an SVG document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SvgParts {
    pub attributes: IndexMap<String, String>,
    pub inner: String,
}

pub fn split_svg(markup: &str) -> Option<SvgParts> {
    let captures = SVG_ROOT.captures(markup)?;
    let raw_attributes = captures.get(1).map(|m| m.as_str()).unwrap_or("");
    let self_closing = captures.get(2).map(|m| !m.as_str().is_empty()).unwrap_or(false);
    let rest = captures.get(3).map(|m| m.as_str()).unwrap_or("");

    let mut attributes = IndexMap::new();
    for attr in SVG_ATTRIBUTE.captures_iter(raw_attributes) {
        let name = attr[1].to_string();
        let value = attr
            .get(2)
            .or_else(|| attr.get(3))
            .or_else(|| attr.get(4))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        attributes.insert(name, value);
    }

    let inner = if self_closing {
        String::new()
    } else {
        SVG_CLOSE.replace(rest, "").into_owned()
    };

    Some(SvgParts { attributes, inner })
}

impl Renderer<'_, '_> {
    pub(crate) fn render_svg(
        &mut self,
        node: &Node,
        meta: &Metadata,
        tag: &str,
        declared: AttributeSet,
        ctx: &Context,
    ) -> Node {
        let src = meta
            .attributes
            .get("src")
            .map(|raw| resolve(raw, ctx).text)
            .unwrap_or_default();

        let parts = if src.trim().is_empty() {
            debug!("SVG element without a source");
            SvgParts::default()
        } else {
            match self.engine.svgs.fetch(src.trim()) {
                Ok(markup) => split_svg(&markup).unwrap_or_else(|| {
                    warn!(url = %src, "Fetched document has no <svg> root");
                    SvgParts::default()
                }),
                Err(err) => {
                    warn!(url = %src, error = %err, "SVG fetch failed, rendering empty element");
                    SvgParts::default()
                }
            }
        };

        let mut merged: IndexMap<String, String> = parts
            .attributes
            .into_iter()
            .filter(|(key, _)| !(key == "id" && self.engine.options.strip_svg_ids))
            .filter(|(key, _)| !(key == "xmlns" && tag == "svg"))
            .collect();
        for (key, value) in declared.values {
            merged.insert(key, value);
        }

        let mut out = node.shallow_clone();
        out.metadata = None;
        out.children = Vec::new();
        out.inner_slots = vec![
            Some(format!("<{}{}>{}", tag, attribute_markup(&merged), parts.inner)),
            Some(format!("</{}>", tag)),
        ];
        out.inner_markup = out.literal_markup();
        out
    }
}
