//! Loop expansion.

use crate::context::Context;
use crate::engine::{Expansion, Renderer, Scope};
use crate::expression::parse_expression;
use crate::resolver::{evaluate_expr, evaluate_template};
use crate::value::Value;
use etch_blocks::{LoopSpec, Node};
use etch_common::LoopPresetStore;
use indexmap::IndexMap;
use serde_json::Value as Json;
use tracing::debug;

impl Renderer<'_, '_> {
    /// Render the loop's children once per item, in collection order.
    pub(crate) fn expand_loop(&mut self, node: &Node, scope: &Scope) -> Expansion {
        let Some(spec) = node.metadata.as_ref().and_then(|m| m.loop_spec.as_ref()) else {
            return Expansion::One(node.clone());
        };

        let target = resolve_target(self.engine.presets, spec, &scope.context);
        let Some(entries) = iteration_entries(target) else {
            debug!(target = %spec.target_path, "Loop target is not iterable, dropping");
            return Expansion::Drop;
        };

        let mut out = Vec::with_capacity(entries.len() * node.children.len());
        self.loop_depth += 1;
        for (index, item) in entries {
            let mut bindings = vec![(spec.item_binding.clone(), item)];
            if let Some(index_binding) = &spec.index_binding {
                bindings.push((index_binding.clone(), index));
            }
            let iteration = scope.with_context(scope.context.extend(bindings));
            out.extend(self.process_children(&node.children, &iteration));
        }
        self.loop_depth -= 1;
        Expansion::Many(out)
    }
}

/// Evaluate the loop target. A leading preset id (or, before version 2, preset key) is
/// materialized through the store and the rest of the path read through it.
pub fn resolve_target(presets: &dyn LoopPresetStore, spec: &LoopSpec, ctx: &Context) -> Value {
    let target = strip_braces(&spec.target_path);
    if target.is_empty() {
        return Value::Null;
    }

    let (head, rest) = match target.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (target, None),
    };

    let preset = if presets.is_valid_id(head) {
        Some(head.to_string())
    } else if spec.version < 2 {
        presets.find_by_key(head)
    } else {
        None
    };

    if let Some(preset) = preset {
        let params = resolve_params(&spec.params, ctx);
        if let Some(items) = presets.resolve(&preset, &params) {
            debug!(preset = %preset, items = items.len(), "Resolved loop preset");
            let data = Value::Array(items.into_iter().map(Value::from).collect());
            let local = ctx.with(preset.clone(), data);
            let path = match rest {
                Some(rest) => format!("{}.{}", preset, rest),
                None => preset,
            };
            return evaluate_path(&path, &local);
        }
    }

    evaluate_path(target, ctx)
}

fn evaluate_path(path: &str, ctx: &Context) -> Value {
    match parse_expression(path) {
        Ok(expr) => evaluate_expr(&expr, ctx),
        Err(err) => {
            debug!(path, error = %err, "Unreadable loop target");
            Value::Null
        }
    }
}

/// Preset parameters resolved against the caller's context
pub fn resolve_params(params: &IndexMap<String, String>, ctx: &Context) -> IndexMap<String, Json> {
    params
        .iter()
        .map(|(key, raw)| (key.clone(), evaluate_template(raw, ctx).to_json()))
        .collect()
}

/// `(index, item)` pairs: arrays by position, objects by key.
pub fn iteration_entries(collection: Value) -> Option<Vec<(Value, Value)>> {
    match collection {
        Value::Array(items) => Some(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| (Value::Number(i as f64), item))
                .collect(),
        ),
        Value::Object(map) => Some(
            map.into_iter()
                .map(|(key, item)| (Value::String(key), item))
                .collect(),
        ),
        _ => None,
    }
}

pub(crate) fn strip_braces(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .map(str::trim)
        .unwrap_or(trimmed)
}
