//! # Etch Engine
//!
//! Renders a block tree under a scoped variable context: placeholders are substituted,
//! conditions prune branches, loops repeat their template per item and components are
//! inlined with their properties and slot content.
//!
//! The entry point is [`Engine`]. It reads components, loop presets and SVG documents
//! through the store traits in `etch_common` and never fails: broken references degrade
//! to empty output.

pub mod component;
pub mod condition;
pub mod context;
pub mod engine;
pub mod error;
pub mod expression;
pub mod html;
pub mod kind;
pub mod loops;
pub mod options;
pub mod resolver;
pub mod slots;
pub mod svg;
pub mod tokenizer;
pub mod value;

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod tests_conditions;

#[cfg(test)]
mod tests_loops;

#[cfg(test)]
mod tests_components;

#[cfg(test)]
mod tests_slots;

#[cfg(test)]
mod tests_html;

pub use condition::evaluate_condition;
pub use context::{AmbientData, Context, ROOT_KEYS};
pub use engine::{Engine, Expansion, RenderOutput};
pub use error::{EngineError, EngineResult, ExpressionError};
pub use expression::{parse_expression, Expr, Key};
pub use kind::{classify, BlockKind};
pub use options::EngineOptions;
pub use resolver::{evaluate, evaluate_template, resolve, Resolved};
pub use value::Value;
