//! Host block-tree JSON → [`Node`].
//!
//! The host stores documents as a list of blocks shaped like
//! `{ blockName, attrs, innerBlocks, innerHTML, innerContent }`. Engine metadata lives
//! under `attrs.metadata.etchData` (older documents put it directly at `attrs.etchData`).

use crate::ast::{ComponentDefinition, Metadata, Node, PropertyDefinition};
use crate::error::{ParseError, ParseResult};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value as Json};

pub const METADATA_KEY: &str = "metadata";
pub const ENGINE_DATA_KEY: &str = "etchData";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBlock {
    #[serde(default)]
    block_name: Option<String>,
    #[serde(default)]
    attrs: Map<String, Json>,
    #[serde(default)]
    inner_blocks: Vec<RawBlock>,
    #[serde(default, rename = "innerHTML")]
    inner_html: String,
    #[serde(default)]
    inner_content: Vec<Option<String>>,
}

/// Parse a host document (a JSON array of blocks, or a single block).
pub fn parse_blocks(source: &str) -> ParseResult<Vec<Node>> {
    let json: Json = serde_json::from_str(source)?;
    parse_blocks_value(json)
}

pub fn parse_blocks_value(json: Json) -> ParseResult<Vec<Node>> {
    let raw: Vec<RawBlock> = match json {
        Json::Array(_) => serde_json::from_value(json)?,
        Json::Object(_) => vec![serde_json::from_value(json)?],
        other => {
            return Err(ParseError::invalid_shape(
                "$",
                format!("expected a block or a list of blocks, found {}", other),
            ))
        }
    };

    raw.into_iter()
        .enumerate()
        .map(|(i, block)| convert_block(block, &format!("$[{}]", i)))
        .collect()
}

#[derive(Debug, Deserialize)]
struct RawComponent {
    id: String,
    #[serde(default)]
    properties: Vec<PropertyDefinition>,
    #[serde(default)]
    blocks: Json,
}

/// Parse a component definition file: `{ id, properties, blocks }` with `blocks` in the
/// host block format.
pub fn parse_component(source: &str) -> ParseResult<ComponentDefinition> {
    let raw: RawComponent = serde_json::from_str(source)?;
    if raw.id.trim().is_empty() {
        return Err(ParseError::invalid_shape("$.id", "component id is empty"));
    }
    let children = match raw.blocks {
        Json::Null => Vec::new(),
        blocks => parse_blocks_value(blocks)?,
    };
    Ok(ComponentDefinition {
        id: raw.id,
        children,
        properties: raw.properties,
    })
}

fn convert_block(raw: RawBlock, path: &str) -> ParseResult<Node> {
    let mut attrs = raw.attrs;
    let metadata = extract_metadata(&mut attrs, path)?;

    let attributes = attrs
        .into_iter()
        .map(|(key, value)| (key, attribute_text(value)))
        .collect::<IndexMap<_, _>>();

    let children = raw
        .inner_blocks
        .into_iter()
        .enumerate()
        .map(|(i, child)| convert_block(child, &format!("{}.innerBlocks[{}]", path, i)))
        .collect::<ParseResult<Vec<_>>>()?;

    Ok(Node {
        kind: raw.block_name.unwrap_or_default(),
        attributes,
        children,
        inner_markup: raw.inner_html,
        inner_slots: raw.inner_content,
        metadata,
    })
}

fn extract_metadata(attrs: &mut Map<String, Json>, path: &str) -> ParseResult<Option<Metadata>> {
    let (nested, drained) = match attrs.get_mut(METADATA_KEY) {
        Some(Json::Object(meta)) => {
            let data = meta.remove(ENGINE_DATA_KEY);
            (data, meta.is_empty())
        }
        _ => (None, false),
    };
    if drained {
        attrs.remove(METADATA_KEY);
    }

    let data = match nested.or_else(|| attrs.remove(ENGINE_DATA_KEY)) {
        Some(Json::Null) | None => return Ok(None),
        Some(data) => data,
    };

    serde_json::from_value(data)
        .map(Some)
        .map_err(|e| ParseError::invalid_shape(path, format!("invalid {}: {}", ENGINE_DATA_KEY, e)))
}

fn attribute_text(value: Json) -> String {
    match value {
        Json::String(s) => s,
        Json::Null => String::new(),
        other => other.to_string(),
    }
}
