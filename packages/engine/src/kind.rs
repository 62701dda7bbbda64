//! Node classification.

use etch_blocks::{MetadataVariant, Node};

/// How the walker treats a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Element or text with resolvable attributes and markup
    Html,
    Condition,
    Loop,
    Component,
    /// Slot content supplied at a component call site
    Slot,
    /// Insertion point inside a component definition
    SlotPlaceholder,
    /// Unknown to the engine: only the children are processed
    Passthrough,
    /// Structural carrier in an ambiguous shape: returned untouched, children included
    PassthroughOpaque,
}

/// Decide how `node` is processed. This is the single dispatch point for metadata variants.
pub fn classify(node: &Node) -> BlockKind {
    let Some(meta) = node.metadata.as_ref() else {
        return BlockKind::Passthrough;
    };
    let Some(variant) = meta.variant.as_ref() else {
        return BlockKind::Passthrough;
    };

    match variant {
        MetadataVariant::Html | MetadataVariant::Text => BlockKind::Html,
        MetadataVariant::Condition => {
            if meta.loop_spec.is_some() || meta.component.is_some() {
                BlockKind::PassthroughOpaque
            } else {
                BlockKind::Condition
            }
        }
        MetadataVariant::Loop => {
            if meta.loop_spec.is_none() || meta.component.is_some() || meta.condition.is_some() {
                BlockKind::PassthroughOpaque
            } else {
                BlockKind::Loop
            }
        }
        MetadataVariant::Component => {
            let has_id = meta
                .component
                .as_deref()
                .map(|id| !id.trim().is_empty())
                .unwrap_or(false);
            if !has_id || meta.loop_spec.is_some() {
                BlockKind::PassthroughOpaque
            } else {
                BlockKind::Component
            }
        }
        MetadataVariant::Slot => BlockKind::Slot,
        MetadataVariant::SlotPlaceholder => BlockKind::SlotPlaceholder,
        MetadataVariant::Unknown => BlockKind::Passthrough,
    }
}
