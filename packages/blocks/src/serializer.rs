//! [`Node`] → markup, and [`Node`] → host block JSON.

use crate::ast::Node;
use crate::parser::{ENGINE_DATA_KEY, METADATA_KEY};
use serde_json::{json, Map, Value as Json};

/// Serialize nodes to markup.
pub fn to_html(nodes: &[Node]) -> String {
    let mut serializer = Serializer::new();
    for node in nodes {
        serializer.serialize_node(node);
    }
    serializer.finish()
}

/// Serialize nodes back to the host block format.
pub fn to_blocks(nodes: &[Node]) -> Json {
    Json::Array(nodes.iter().map(block_json).collect())
}

pub struct Serializer {
    output: String,
}

impl Serializer {
    pub fn new() -> Self {
        Self {
            output: String::new(),
        }
    }

    pub fn finish(self) -> String {
        self.output
    }

    /// Emit literal slots in order, substituting the next child at each placeholder.
    pub fn serialize_node(&mut self, node: &Node) {
        if node.inner_slots.is_empty() {
            if node.children.is_empty() {
                self.output.push_str(&node.inner_markup);
            } else {
                for child in &node.children {
                    self.serialize_node(child);
                }
            }
            return;
        }

        let mut children = node.children.iter();
        for slot in &node.inner_slots {
            match slot {
                Some(fragment) => self.output.push_str(fragment),
                None => {
                    if let Some(child) = children.next() {
                        self.serialize_node(child);
                    }
                }
            }
        }

        // Children without a placeholder still render rather than vanish.
        for child in children {
            self.serialize_node(child);
        }
    }
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

fn block_json(node: &Node) -> Json {
    let mut attrs = Map::new();
    for (key, value) in &node.attributes {
        attrs.insert(key.clone(), attribute_json(value));
    }

    if let Some(metadata) = &node.metadata {
        let data = serde_json::to_value(metadata).unwrap_or(Json::Null);
        match attrs.get_mut(METADATA_KEY) {
            Some(Json::Object(meta)) => {
                meta.insert(ENGINE_DATA_KEY.to_string(), data);
            }
            _ => {
                let mut meta = Map::new();
                meta.insert(ENGINE_DATA_KEY.to_string(), data);
                attrs.insert(METADATA_KEY.to_string(), Json::Object(meta));
            }
        }
    }

    let block_name = if node.kind.is_empty() {
        Json::Null
    } else {
        Json::String(node.kind.clone())
    };
    let inner_blocks: Vec<Json> = node.children.iter().map(block_json).collect();

    json!({
        "blockName": block_name,
        "attrs": attrs,
        "innerBlocks": inner_blocks,
        "innerHTML": node.literal_markup(),
        "innerContent": node.inner_slots,
    })
}

/// Attribute values that were JSON structures on the way in go back out as JSON.
fn attribute_json(value: &str) -> Json {
    let trimmed = value.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(parsed) = serde_json::from_str::<Json>(value) {
            return parsed;
        }
    }
    Json::String(value.to_string())
}
