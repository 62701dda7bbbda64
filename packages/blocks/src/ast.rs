//! Block-tree data model.
//!
//! A [`Node`] is the generic shape the host hands over: a kind tag, string attributes,
//! child nodes and the literal markup surrounding those children. [`Metadata`] is the
//! optional dynamic descriptor that decides how the engine treats a node.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Generic tree node as produced and consumed at the host boundary.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub kind: String,

    #[serde(default)]
    pub attributes: IndexMap<String, String>,

    #[serde(default)]
    pub children: Vec<Node>,

    /// Raw serialized markup, used when the node has no slots.
    #[serde(default)]
    pub inner_markup: String,

    /// Literal fragments interleaved with children. `None` marks a child position.
    #[serde(default)]
    pub inner_slots: Vec<Option<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl Node {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_markup(mut self, markup: impl Into<String>) -> Self {
        let markup = markup.into();
        self.inner_slots = vec![Some(markup.clone())];
        self.inner_markup = markup;
        self
    }

    /// Set literal opening/closing fragments around the children.
    pub fn with_wrapper(mut self, open: impl Into<String>, close: impl Into<String>) -> Self {
        let open = open.into();
        let close = close.into();
        self.inner_markup = format!("{}{}", open, close);
        let mut slots = Vec::with_capacity(self.children.len() + 2);
        slots.push(Some(open));
        slots.extend(std::iter::repeat(None).take(self.children.len()));
        slots.push(Some(close));
        self.inner_slots = slots;
        self
    }

    /// Append a child, keeping the slot layout in step.
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self.sync_inner_slots();
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children.extend(children);
        self.sync_inner_slots();
        self
    }

    pub fn variant(&self) -> Option<&MetadataVariant> {
        self.metadata.as_ref().and_then(|m| m.variant.as_ref())
    }

    /// True when the first and last slots are literal opening/closing fragments.
    pub fn has_wrapper(&self) -> bool {
        self.inner_slots.len() >= 2
            && matches!(self.inner_slots.first(), Some(Some(_)))
            && matches!(self.inner_slots.last(), Some(Some(_)))
    }

    /// Number of `None` entries in `inner_slots`.
    pub fn placeholder_count(&self) -> usize {
        self.inner_slots.iter().filter(|s| s.is_none()).count()
    }

    /// Resize the child placeholders in `inner_slots` to match `children`.
    ///
    /// New placeholders go just before the closing fragment of wrapped nodes and at the
    /// end otherwise. Surplus placeholders are removed from the end, literal fragments are
    /// never touched.
    pub fn sync_inner_slots(&mut self) {
        let wanted = self.children.len();
        let present = self.placeholder_count();

        if wanted > present {
            let at = if self.has_wrapper() {
                self.inner_slots.len() - 1
            } else {
                self.inner_slots.len()
            };
            self.inner_slots
                .splice(at..at, std::iter::repeat(None).take(wanted - present));
        } else if wanted < present {
            let mut excess = present - wanted;
            let mut i = self.inner_slots.len();
            while excess > 0 && i > 0 {
                i -= 1;
                if self.inner_slots[i].is_none() {
                    self.inner_slots.remove(i);
                    excess -= 1;
                }
            }
        }
    }

    /// Replace the children and repair the slot layout in one step.
    pub fn replace_children(&mut self, children: Vec<Node>) {
        self.children = children;
        self.sync_inner_slots();
    }

    /// Copy of this node without its children. The slot layout is left as is, so callers
    /// are expected to follow up with [`Node::replace_children`].
    pub fn shallow_clone(&self) -> Node {
        Node {
            kind: self.kind.clone(),
            attributes: self.attributes.clone(),
            children: Vec::new(),
            inner_markup: self.inner_markup.clone(),
            inner_slots: self.inner_slots.clone(),
            metadata: self.metadata.clone(),
        }
    }

    /// Literal markup of this node with the children left out.
    pub fn literal_markup(&self) -> String {
        if self.inner_slots.is_empty() {
            self.inner_markup.clone()
        } else {
            self.inner_slots.iter().flatten().map(String::as_str).collect()
        }
    }
}

/// What a node's metadata says it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetadataVariant {
    Html,
    Text,
    Condition,
    Loop,
    Component,
    Slot,
    SlotPlaceholder,
    #[serde(other)]
    Unknown,
}

/// Elements with dedicated rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Special {
    Svg,
    #[serde(other)]
    Unknown,
}

/// Dynamic behavior descriptor attached to a [`Node`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub variant: Option<MetadataVariant>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// The tag itself is an expression.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub dynamic_tag: bool,

    /// Attribute templates, resolved against the context at render time.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, String>,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub remove_wrapper: bool,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub styles: Vec<String>,

    /// Metadata for elements embedded in this node's literal markup, keyed by anchor.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub nested: IndexMap<String, Metadata>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,

    #[serde(rename = "loop", skip_serializing_if = "Option::is_none")]
    pub loop_spec: Option<LoopSpec>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,

    /// Slot name, for `slot` and `slot-placeholder` nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub special: Option<Special>,
}

impl Metadata {
    pub fn of(variant: MetadataVariant) -> Self {
        Self {
            variant: Some(variant),
            ..Default::default()
        }
    }

    pub fn html(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..Self::of(MetadataVariant::Html)
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Comparison and boolean operators. Unrecognized input is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Eq,
    StrictEq,
    Neq,
    StrictNeq,
    Gt,
    Lt,
    Gte,
    Lte,
    And,
    Or,
    IsTruthy,
    IsFalsy,
    Unknown(String),
}

impl Operator {
    /// Decode an operator that may arrive percent-, entity- or unicode-escaped.
    pub fn decode(raw: &str) -> Self {
        let decoded = decode_operator_text(raw.trim());
        match decoded.as_str() {
            "==" | "eq" => Operator::Eq,
            "===" | "strict_eq" => Operator::StrictEq,
            "!=" | "neq" => Operator::Neq,
            "!==" | "strict_neq" => Operator::StrictNeq,
            ">" | "gt" => Operator::Gt,
            "<" | "lt" => Operator::Lt,
            ">=" | "gte" => Operator::Gte,
            "<=" | "lte" => Operator::Lte,
            "&&" | "and" => Operator::And,
            "||" | "or" => Operator::Or,
            "isTruthy" | "is_truthy" => Operator::IsTruthy,
            "isFalsy" | "is_falsy" => Operator::IsFalsy,
            _ => Operator::Unknown(raw.to_string()),
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Operator::Eq => "==",
            Operator::StrictEq => "===",
            Operator::Neq => "!=",
            Operator::StrictNeq => "!==",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::IsTruthy => "isTruthy",
            Operator::IsFalsy => "isFalsy",
            Operator::Unknown(raw) => raw,
        }
    }

    /// Unary operators ignore the right operand.
    pub fn is_unary(&self) -> bool {
        matches!(self, Operator::IsTruthy | Operator::IsFalsy)
    }
}

impl From<String> for Operator {
    fn from(raw: String) -> Self {
        Operator::decode(&raw)
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.symbol().to_string()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

fn decode_operator_text(raw: &str) -> String {
    const ESCAPES: &[(&str, &str)] = &[
        ("\\u003e", ">"),
        ("\\u003c", "<"),
        ("\\u0026", "&"),
        ("\\u003d", "="),
        ("\\u0021", "!"),
        ("\\u007c", "|"),
        ("u003e", ">"),
        ("u003c", "<"),
        ("u0026", "&"),
        ("u003d", "="),
        ("u0021", "!"),
        ("u007c", "|"),
        ("&gt;", ">"),
        ("&lt;", "<"),
        ("&amp;", "&"),
        ("&#62;", ">"),
        ("&#60;", "<"),
        ("&#38;", "&"),
        ("%3E", ">"),
        ("%3C", "<"),
        ("%26", "&"),
        ("%3D", "="),
        ("%21", "!"),
        ("%7C", "|"),
    ];

    let mut out = raw.to_string();
    for (from, to) in ESCAPES {
        if out.contains(from) {
            out = out.replace(from, to);
        }
        let lower = from.to_ascii_lowercase();
        if lower != *from && out.contains(&lower) {
            out = out.replace(&lower, to);
        }
    }
    out
}

/// One side of a [`Condition`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    Condition(Box<Condition>),
    Expression(String),
    Literal(serde_json::Value),
}

impl From<&str> for Operand {
    fn from(raw: &str) -> Self {
        Operand::Expression(raw.to_string())
    }
}

impl From<Condition> for Operand {
    fn from(condition: Condition) -> Self {
        Operand::Condition(Box::new(condition))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(alias = "leftHand")]
    pub left: Operand,
    pub operator: Operator,
    #[serde(default, alias = "rightHand")]
    pub right: Option<Operand>,
}

impl Condition {
    pub fn new(left: impl Into<Operand>, operator: Operator, right: impl Into<Operand>) -> Self {
        Self {
            left: left.into(),
            operator,
            right: Some(right.into()),
        }
    }

    pub fn unary(left: impl Into<Operand>, operator: Operator) -> Self {
        Self {
            left: left.into(),
            operator,
            right: None,
        }
    }
}

fn default_item_binding() -> String {
    "item".to_string()
}

fn default_loop_version() -> u32 {
    2
}

/// Loop descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopSpec {
    #[serde(default = "default_item_binding", alias = "itemId")]
    pub item_binding: String,

    #[serde(default, alias = "indexId", skip_serializing_if = "Option::is_none")]
    pub index_binding: Option<String>,

    /// Dot-path into the context, optionally led by a global preset id.
    #[serde(alias = "target")]
    pub target_path: String,

    /// Preset parameters; values may contain expressions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub params: IndexMap<String, String>,

    /// Versions below 2 also match presets by key.
    #[serde(default = "default_loop_version")]
    pub version: u32,
}

impl LoopSpec {
    pub fn new(item_binding: impl Into<String>, target_path: impl Into<String>) -> Self {
        Self {
            item_binding: item_binding.into(),
            index_binding: None,
            target_path: target_path.into(),
            params: IndexMap::new(),
            version: default_loop_version(),
        }
    }

    pub fn with_index(mut self, index_binding: impl Into<String>) -> Self {
        self.index_binding = Some(index_binding.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Declared primitive type of a component property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    #[default]
    String,
    Number,
    Boolean,
    Object,
    Array,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyType {
    #[serde(default)]
    pub primitive: Primitive,
    /// Refinement on top of the primitive, e.g. `array` for list-valued string inputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialized: Option<String>,
}

impl PropertyType {
    pub fn is_array(&self) -> bool {
        self.primitive == Primitive::Array || self.specialized.as_deref() == Some("array")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDefinition {
    pub key: String,
    #[serde(default, rename = "type")]
    pub kind: PropertyType,
    #[serde(default)]
    pub default: serde_json::Value,
}

impl PropertyDefinition {
    pub fn new(key: impl Into<String>, primitive: Primitive, default: serde_json::Value) -> Self {
        Self {
            key: key.into(),
            kind: PropertyType {
                primitive,
                specialized: None,
            },
            default,
        }
    }

    pub fn specialized(mut self, specialized: impl Into<String>) -> Self {
        self.kind.specialized = Some(specialized.into());
        self
    }
}

/// A reusable component: its own subtree plus declared properties.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDefinition {
    pub id: String,
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default)]
    pub properties: Vec<PropertyDefinition>,
}
