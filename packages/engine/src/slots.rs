//! Slot capture and substitution.

use crate::engine::{Expansion, Renderer, Scope};
use crate::kind::{classify, BlockKind};
use etch_blocks::Node;
use indexmap::IndexMap;
use tracing::debug;

pub const DEFAULT_SLOT: &str = "default";

/// Name of a `slot` or `slot-placeholder` node
pub fn slot_name(node: &Node) -> String {
    node.metadata
        .as_ref()
        .and_then(|m| m.slot.as_deref())
        .or_else(|| node.attributes.get("name").map(String::as_str))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_SLOT)
        .to_string()
}

/// Raw children of the direct `slot` children of a component call, by slot name. Slots of
/// components nested in the content are left for those components to capture.
pub fn capture_slots(children: &[Node]) -> IndexMap<String, Vec<Node>> {
    let mut slots: IndexMap<String, Vec<Node>> = IndexMap::new();
    for child in children {
        if classify(child) == BlockKind::Slot {
            slots
                .entry(slot_name(child))
                .or_default()
                .extend(child.children.iter().cloned());
        }
    }
    slots
}

impl Renderer<'_, '_> {
    /// Replace a placeholder with the captured content, rendered in the call site's scope.
    pub(crate) fn fill_slot(&mut self, node: &Node, scope: &Scope) -> Expansion {
        let name = slot_name(node);
        let Some(table) = scope.slots.clone() else {
            debug!(slot = %name, "Slot placeholder outside a component, dropping");
            return Expansion::Drop;
        };

        match table.content.get(&name) {
            Some(content) if !content.is_empty() => {
                // Content is rendered as if it sat at the call site: the components and
                // loops entered since then do not apply to it.
                let inner = self
                    .component_stack
                    .split_off(table.origin_stack.min(self.component_stack.len()));
                let loops = std::mem::replace(&mut self.loop_depth, table.origin_loops);
                let out = self.process_children(content, &table.origin);
                self.loop_depth = loops;
                self.component_stack.extend(inner);
                Expansion::Many(out)
            }
            _ => {
                debug!(slot = %name, "No content for slot, dropping");
                Expansion::Drop
            }
        }
    }
}
