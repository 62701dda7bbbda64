//! # Etch Blocks
//!
//! The data model the renderer consumes and emits, plus the host boundary:
//! [`parse_blocks`] reads the host's block-tree JSON, [`to_html`] and [`to_blocks`]
//! serialize rendered nodes back out.

pub mod ast;
pub mod error;
pub mod parser;
pub mod serializer;

pub use ast::{
    ComponentDefinition, Condition, LoopSpec, Metadata, MetadataVariant, Node, Operand, Operator,
    Primitive, PropertyDefinition, PropertyType, Special,
};
pub use error::{ParseError, ParseResult};
pub use parser::{parse_blocks, parse_blocks_value, parse_component};
pub use serializer::{to_blocks, to_html, Serializer};
