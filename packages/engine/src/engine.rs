//! # Tree Walker
//!
//! Renders a block tree by one depth-first walk. Every node expands to zero, one or many
//! output nodes ([`Expansion`]); expansions are spliced into the parent's children and
//! the parent's `inner_slots` layout is repaired before it is returned.
//!
//! ## Scoping
//!
//! Each node is processed under a [`Scope`]: the variable [`Context`] plus the slot table
//! of the component currently being expanded. Loops and components extend the context
//! into a new value; nothing a child binds is visible to its parent or its siblings.
//!
//! Slot content keeps a handle to the scope of the call site that supplied it, so when a
//! slot placeholder is reached deep inside a component definition the content is rendered
//! against the caller's data, however many components it was passed through.
//!
//! ## Failure Model
//!
//! Rendering never fails. Missing components, non-iterable loop targets and unknown slot
//! names drop the node; unknown node kinds pass through unchanged. Only the JSON boundary
//! ([`Engine::render_json`]) returns errors.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use etch_common::{MemoryComponentStore, MemoryLoopPresetStore, MemorySvgStore};
//! use etch_engine::{Context, Engine};
//!
//! let components = MemoryComponentStore::new();
//! let presets = MemoryLoopPresetStore::new();
//! let svgs = MemorySvgStore::new();
//!
//! let engine = Engine::new(&components, &presets, &svgs);
//! let output = engine.render_json(source, &Context::new())?;
//! println!("{}", output.to_html());
//! ```

use crate::condition::evaluate_condition;
use crate::context::Context;
use crate::error::EngineResult;
use crate::kind::{classify, BlockKind};
use crate::options::EngineOptions;
use etch_blocks::{parse_blocks, to_blocks, to_html, Node};
use etch_common::{ComponentStore, EmptyStores, LoopPresetStore, SvgStore};
use indexmap::{IndexMap, IndexSet};
use serde_json::Value as Json;
use std::sync::Arc;
use tracing::{debug, instrument};

static NO_STORES: EmptyStores = EmptyStores;

/// Result of processing one node
#[derive(Debug, Clone, PartialEq)]
pub enum Expansion {
    Drop,
    One(Node),
    Many(Vec<Node>),
}

impl Expansion {
    pub fn into_nodes(self) -> Vec<Node> {
        match self {
            Expansion::Drop => Vec::new(),
            Expansion::One(node) => vec![node],
            Expansion::Many(nodes) => nodes,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Expansion::Drop => 0,
            Expansion::One(_) => 1,
            Expansion::Many(nodes) => nodes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Rendered nodes plus the style ids registered by dynamic elements
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderOutput {
    pub nodes: Vec<Node>,
    pub styles: Vec<String>,
}

impl RenderOutput {
    pub fn to_html(&self) -> String {
        to_html(&self.nodes)
    }

    pub fn to_blocks(&self) -> Json {
        to_blocks(&self.nodes)
    }
}

/// Slot content captured at a component call site
pub(crate) struct SlotTable {
    pub content: IndexMap<String, Vec<Node>>,
    /// Scope of the call site; slot content is always rendered against it
    pub origin: Scope,
    /// Component stack height and loop depth at the call site
    pub origin_stack: usize,
    pub origin_loops: usize,
}

#[derive(Clone, Default)]
pub(crate) struct Scope {
    pub context: Context,
    pub slots: Option<Arc<SlotTable>>,
    /// Inside a `<style>` element
    pub inside_style: bool,
}

impl Scope {
    pub fn new(context: Context) -> Self {
        Self {
            context,
            ..Default::default()
        }
    }

    pub fn with_context(&self, context: Context) -> Self {
        Self {
            context,
            slots: self.slots.clone(),
            inside_style: self.inside_style,
        }
    }
}

/// The block-tree renderer. Holds the external stores and options; every render call
/// gets its own state, so one engine can serve many documents.
pub struct Engine<'a> {
    pub(crate) components: &'a dyn ComponentStore,
    pub(crate) presets: &'a dyn LoopPresetStore,
    pub(crate) svgs: &'a dyn SvgStore,
    pub(crate) options: EngineOptions,
}

impl<'a> Engine<'a> {
    pub fn new(
        components: &'a dyn ComponentStore,
        presets: &'a dyn LoopPresetStore,
        svgs: &'a dyn SvgStore,
    ) -> Self {
        Self {
            components,
            presets,
            svgs,
            options: EngineOptions::default(),
        }
    }

    /// An engine with no components, presets or SVGs
    pub fn standalone() -> Engine<'static> {
        Engine::new(&NO_STORES, &NO_STORES, &NO_STORES)
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Render a sequence of top-level nodes.
    #[instrument(skip(self, nodes, ctx), fields(nodes = nodes.len()))]
    pub fn render(&self, nodes: &[Node], ctx: &Context) -> RenderOutput {
        let mut renderer = Renderer::new(self);
        let nodes = renderer.process_children(nodes, &Scope::new(ctx.clone()));
        debug!(output = nodes.len(), styles = renderer.styles.len(), "Rendered block tree");
        RenderOutput {
            nodes,
            styles: renderer.styles.into_iter().collect(),
        }
    }

    /// Process a single node. Styles registered along the way are discarded.
    pub fn process(&self, node: &Node, ctx: &Context) -> Expansion {
        Renderer::new(self).process(node, &Scope::new(ctx.clone()))
    }

    /// Parse host block JSON and render it.
    pub fn render_json(&self, source: &str, ctx: &Context) -> EngineResult<RenderOutput> {
        let nodes = parse_blocks(source)?;
        Ok(self.render(&nodes, ctx))
    }
}

/// A component being expanded, with the number of loops open when it was entered
#[derive(Debug, Clone)]
pub(crate) struct ComponentFrame {
    pub id: String,
    pub loops: usize,
}

/// Per-render state
pub(crate) struct Renderer<'e, 'a> {
    pub engine: &'e Engine<'a>,
    pub styles: IndexSet<String>,
    /// Components currently being expanded, outermost first
    pub component_stack: Vec<ComponentFrame>,
    /// Loops currently being iterated
    pub loop_depth: usize,
    /// Component calls expanded so far in this render
    pub component_calls: usize,
}

impl<'e, 'a> Renderer<'e, 'a> {
    pub fn new(engine: &'e Engine<'a>) -> Self {
        Self {
            engine,
            styles: IndexSet::new(),
            component_stack: Vec::new(),
            loop_depth: 0,
            component_calls: 0,
        }
    }

    pub fn stack_trace(&self) -> String {
        let ids: Vec<&str> = self.component_stack.iter().map(|f| f.id.as_str()).collect();
        ids.join(" > ")
    }

    pub fn process(&mut self, node: &Node, scope: &Scope) -> Expansion {
        match classify(node) {
            BlockKind::Passthrough => Expansion::One(self.passthrough(node, scope)),
            BlockKind::PassthroughOpaque => Expansion::One(node.clone()),
            BlockKind::Html => self.render_element(node, scope),
            BlockKind::Condition => self.condition(node, scope),
            BlockKind::Loop => self.expand_loop(node, scope),
            BlockKind::Component => self.expand_component(node, scope),
            // Slots under a call are captured by the component; a stray one keeps its content.
            BlockKind::Slot => Expansion::Many(self.process_children(&node.children, scope)),
            BlockKind::SlotPlaceholder => self.fill_slot(node, scope),
        }
    }

    /// Process each node and splice the expansions in order.
    pub fn process_children(&mut self, nodes: &[Node], scope: &Scope) -> Vec<Node> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            match self.process(node, scope) {
                Expansion::Drop => {}
                Expansion::One(node) => out.push(node),
                Expansion::Many(nodes) => out.extend(nodes),
            }
        }
        out
    }

    /// Same node, children processed, slot layout repaired.
    pub fn passthrough(&mut self, node: &Node, scope: &Scope) -> Node {
        let children = self.process_children(&node.children, scope);
        let mut out = node.shallow_clone();
        out.replace_children(children);
        debug_assert_slots(&out);
        out
    }

    fn condition(&mut self, node: &Node, scope: &Scope) -> Expansion {
        let passes = node
            .metadata
            .as_ref()
            .and_then(|meta| meta.condition.as_ref())
            .map(|condition| evaluate_condition(condition, &scope.context))
            .unwrap_or(true);

        if passes {
            Expansion::Many(self.process_children(&node.children, scope))
        } else {
            debug!(kind = %node.kind, "Condition false, dropping branch");
            Expansion::Drop
        }
    }

    pub fn register_styles(&mut self, styles: &[String]) {
        for style in styles {
            self.styles.insert(style.clone());
        }
    }
}

pub(crate) fn debug_assert_slots(node: &Node) {
    debug_assert_eq!(
        node.placeholder_count(),
        node.children.len(),
        "inner_slots out of step with children on {}",
        node.kind
    );
}
