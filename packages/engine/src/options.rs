use serde::{Deserialize, Serialize};

/// Render options. Every field has a default so a partial JSON object is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineOptions {
    /// Component expansions may nest this deep; deeper calls are dropped.
    pub max_component_depth: usize,

    /// Component calls a single render may expand; later calls are dropped.
    pub max_component_calls: usize,

    /// Tag used when an element has no tag or its dynamic tag sanitizes to nothing.
    pub fallback_tag: String,

    /// Remove the root `id` of inlined SVG documents.
    pub strip_svg_ids: bool,

    /// Substitute placeholders inside `<style>` elements.
    pub resolve_inside_style: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_component_depth: 32,
            max_component_calls: 10_000,
            fallback_tag: "div".to_string(),
            strip_svg_ids: true,
            resolve_inside_style: false,
        }
    }
}
