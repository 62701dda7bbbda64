//! Component expansion and property resolution.

use crate::context::Context;
use crate::engine::{ComponentFrame, Expansion, Renderer, Scope, SlotTable};
use crate::expression::parse_expression;
use crate::loops::strip_braces;
use crate::resolver::{evaluate_expr, evaluate_template};
use crate::slots::capture_slots;
use crate::value::Value;
use etch_blocks::{ComponentDefinition, Metadata, Node, Primitive, PropertyDefinition};
use etch_common::LoopPresetStore;
use indexmap::IndexMap;
use serde_json::Value as Json;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

impl Renderer<'_, '_> {
    /// Replace a component call with the definition's rendered children.
    ///
    /// A component may only include itself again from inside a loop it opened, so every
    /// recursion step is bounded by data. Depth and the total number of calls per render
    /// are capped on top of that.
    #[instrument(skip(self, node, scope), fields(depth = self.component_stack.len()))]
    pub(crate) fn expand_component(&mut self, node: &Node, scope: &Scope) -> Expansion {
        let Some(meta) = node.metadata.as_ref() else {
            return Expansion::One(node.clone());
        };
        let Some(id) = meta.component.as_deref() else {
            return Expansion::One(node.clone());
        };

        if self.component_stack.len() >= self.engine.options.max_component_depth {
            warn!(
                component = id,
                stack = %self.stack_trace(),
                "Component nesting limit reached, dropping call"
            );
            return Expansion::Drop;
        }

        let reentered = self
            .component_stack
            .iter()
            .rev()
            .find(|frame| frame.id == id)
            .is_some_and(|frame| frame.loops >= self.loop_depth);
        if reentered {
            warn!(
                component = id,
                stack = %self.stack_trace(),
                "Component includes itself outside a loop, dropping call"
            );
            return Expansion::Drop;
        }

        if self.component_calls >= self.engine.options.max_component_calls {
            warn!(
                component = id,
                calls = self.component_calls,
                "Component call budget exhausted, dropping call"
            );
            return Expansion::Drop;
        }

        let Some(definition) = self.engine.components.load(id) else {
            debug!(component = id, "Component not found, dropping call");
            return Expansion::Drop;
        };
        self.component_calls += 1;

        let props = effective_properties(self.engine.presets, &definition, meta, &scope.context);
        let local = Scope {
            context: scope.context.with("props", Value::Object(props)),
            slots: Some(Arc::new(SlotTable {
                content: capture_slots(&node.children),
                origin: scope.clone(),
                origin_stack: self.component_stack.len(),
                origin_loops: self.loop_depth,
            })),
            inside_style: scope.inside_style,
        };

        self.component_stack.push(ComponentFrame {
            id: id.to_string(),
            loops: self.loop_depth,
        });
        let out = self.process_children(&definition.children, &local);
        self.component_stack.pop();

        Expansion::Many(out)
    }
}

/// Declared defaults overlaid with the caller's attributes, each resolved against the
/// caller's context and cast to the declared type.
pub fn effective_properties(
    presets: &dyn LoopPresetStore,
    definition: &ComponentDefinition,
    meta: &Metadata,
    ctx: &Context,
) -> IndexMap<String, Value> {
    let mut props = IndexMap::with_capacity(definition.properties.len());

    for prop in &definition.properties {
        let value = match &prop.default {
            Json::String(raw) => evaluate_template(raw, ctx),
            other => Value::from(other.clone()),
        };
        props.insert(prop.key.clone(), cast_property(presets, prop, value, ctx));
    }

    for (key, raw) in &meta.attributes {
        let Some(prop) = definition.properties.iter().find(|p| &p.key == key) else {
            continue;
        };
        let value = evaluate_template(raw, ctx);
        props.insert(key.clone(), cast_property(presets, prop, value, ctx));
    }

    props
}

fn cast_property(
    presets: &dyn LoopPresetStore,
    prop: &PropertyDefinition,
    value: Value,
    ctx: &Context,
) -> Value {
    if prop.kind.is_array() {
        return specialize_array(presets, value, ctx);
    }

    match prop.kind.primitive {
        Primitive::String => match value {
            Value::Array(_) | Value::Object(_) => value,
            scalar => Value::String(scalar.to_text()),
        },
        Primitive::Number => value.as_number().map(Value::Number).unwrap_or_default(),
        Primitive::Boolean => Value::Bool(value.is_truthy()),
        Primitive::Object => match value {
            Value::String(ref s) if s.trim_start().starts_with('{') => {
                match serde_json::from_str::<Json>(s) {
                    Ok(json @ Json::Object(_)) => Value::from(json),
                    _ => value,
                }
            }
            other => other,
        },
        Primitive::Array => specialize_array(presets, value, ctx),
    }
}

/// Turn a property value into an array: arrays as-is, then preset ids or keys, then
/// context expressions, then JSON or comma-separated text.
pub fn specialize_array(presets: &dyn LoopPresetStore, value: Value, ctx: &Context) -> Value {
    match value {
        Value::Array(_) => value,
        Value::Null => Value::Array(Vec::new()),
        Value::Object(map) => Value::Array(map.into_values().collect()),
        Value::String(text) => array_from_text(presets, &text, ctx),
        scalar => Value::Array(vec![scalar]),
    }
}

fn array_from_text(presets: &dyn LoopPresetStore, raw: &str, ctx: &Context) -> Value {
    let token = strip_braces(raw);
    if token.is_empty() {
        return Value::Array(Vec::new());
    }

    let preset = if presets.is_valid_id(token) {
        Some(token.to_string())
    } else {
        presets.find_by_key(token)
    };
    if let Some(preset) = preset {
        if let Some(items) = presets.resolve(&preset, &IndexMap::new()) {
            return Value::Array(items.into_iter().map(Value::from).collect());
        }
    }

    if let Ok(expr) = parse_expression(token) {
        if expr.root().map(|root| ctx.is_root(root)).unwrap_or(false) {
            return match evaluate_expr(&expr, ctx) {
                Value::String(text) => split_list(&text),
                other => specialize_array(presets, other, ctx),
            };
        }
    }

    split_list(raw.trim())
}

fn split_list(text: &str) -> Value {
    if text.starts_with('[') {
        if let Ok(json @ Json::Array(_)) = serde_json::from_str::<Json>(text) {
            return Value::from(json);
        }
    }
    Value::Array(
        text.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Value::string)
            .collect(),
    )
}
