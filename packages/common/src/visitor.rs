use etch_blocks::{Metadata, Node};

/// Visitor pattern for traversing block trees immutably
///
/// Default implementations walk the entire tree. Override specific visit_* methods to
/// act on nodes; call the matching `walk_*` function to keep descending.
pub trait Visitor: Sized {
    fn visit_nodes(&mut self, nodes: &[Node]) {
        walk_nodes(self, nodes);
    }

    fn visit_node(&mut self, node: &Node) {
        walk_node(self, node);
    }

    fn visit_metadata(&mut self, _node: &Node, _metadata: &Metadata) {
        // Leaf, nested metadata is reached through the node's markup, not its children
    }
}

pub fn walk_nodes<V: Visitor>(visitor: &mut V, nodes: &[Node]) {
    for node in nodes {
        visitor.visit_node(node);
    }
}

pub fn walk_node<V: Visitor>(visitor: &mut V, node: &Node) {
    if let Some(metadata) = &node.metadata {
        visitor.visit_metadata(node, metadata);
    }
    for child in &node.children {
        visitor.visit_node(child);
    }
}

/// A node whose child placeholders disagree with its children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotViolation {
    /// Child indices from the root to the offending node
    pub path: Vec<usize>,
    pub kind: String,
    pub children: usize,
    pub placeholders: usize,
}

/// Collects every node whose `inner_slots` placeholders do not match its child count.
/// Nodes without any slots are skipped, they serialize their children directly.
#[derive(Default)]
pub struct InnerSlotChecker {
    path: Vec<usize>,
    pub violations: Vec<SlotViolation>,
}

impl Visitor for InnerSlotChecker {
    fn visit_nodes(&mut self, nodes: &[Node]) {
        for (i, node) in nodes.iter().enumerate() {
            self.path.push(i);
            self.visit_node(node);
            self.path.pop();
        }
    }

    fn visit_node(&mut self, node: &Node) {
        let placeholders = node.placeholder_count();
        if !node.inner_slots.is_empty() && placeholders != node.children.len() {
            self.violations.push(SlotViolation {
                path: self.path.clone(),
                kind: node.kind.clone(),
                children: node.children.len(),
                placeholders,
            });
        }
        self.visit_nodes(&node.children);
    }
}

pub fn check_inner_slots(nodes: &[Node]) -> Vec<SlotViolation> {
    let mut checker = InnerSlotChecker::default();
    checker.visit_nodes(nodes);
    checker.violations
}

/// Collects every style id referenced by node metadata, in first-seen order
#[derive(Default)]
pub struct StyleReferenceCollector {
    pub styles: Vec<String>,
}

impl Visitor for StyleReferenceCollector {
    fn visit_metadata(&mut self, _node: &Node, metadata: &Metadata) {
        let nested = metadata.nested.values().flat_map(|m| m.styles.iter());
        for style in metadata.styles.iter().chain(nested) {
            if !self.styles.contains(style) {
                self.styles.push(style.clone());
            }
        }
    }
}
