//! Expression Resolver.
//!
//! [`resolve`] substitutes `{...}` placeholders inside text. [`evaluate`] reads a condition
//! operand as a typed value. Missing paths yield [`Value::Null`], never an error.

use crate::context::Context;
use crate::expression::{parse_expression, Expr, Key};
use crate::value::{normalize_text, Value};
use tracing::debug;

/// Result of placeholder substitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub text: String,
    /// At least one placeholder was substituted
    pub had_expression: bool,
}

/// Substitute every `{expression}` in `raw`. Braces whose content does not parse as an
/// expression (CSS bodies, JSON) are kept verbatim.
pub fn resolve(raw: &str, ctx: &Context) -> Resolved {
    if !raw.contains('{') {
        return Resolved {
            text: raw.to_string(),
            had_expression: false,
        };
    }

    let mut text = String::with_capacity(raw.len());
    let mut had_expression = false;
    let mut rest = raw;

    while let Some(open) = rest.find('{') {
        text.push_str(&rest[..open]);
        let after = &rest[open..];

        match placeholder_end(after) {
            Some(close) => {
                let inner = after[1..close].trim();
                match parse_expression(inner) {
                    Ok(expr) => {
                        text.push_str(&evaluate_expr(&expr, ctx).to_text());
                        had_expression = true;
                        rest = &after[close + 1..];
                    }
                    Err(_) => {
                        text.push('{');
                        rest = &after[1..];
                    }
                }
            }
            None => {
                text.push('{');
                rest = &after[1..];
            }
        }
    }
    text.push_str(rest);

    Resolved {
        text,
        had_expression,
    }
}

/// Index of the `}` closing the placeholder that opens at `s[0]`, skipping quoted text.
fn placeholder_end(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' if depth > 0 => quote = Some(c),
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// The expression inside `raw` when `raw` is exactly one placeholder
pub fn single_placeholder(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if !trimmed.starts_with('{') {
        return None;
    }
    match placeholder_end(trimmed) {
        Some(close) if close == trimmed.len() - 1 => Some(trimmed[1..close].trim()),
        _ => None,
    }
}

/// Resolve a template to a typed value: a lone placeholder keeps its type (arrays stay
/// arrays), anything else becomes substituted text.
pub fn evaluate_template(raw: &str, ctx: &Context) -> Value {
    if let Some(inner) = single_placeholder(raw) {
        if let Ok(expr) = parse_expression(inner) {
            return evaluate_expr(&expr, ctx);
        }
    }
    Value::String(resolve(raw, ctx).text)
}

/// Evaluate a condition operand, preserving its type.
///
/// Quoted text is a string literal; `{path}` and bare paths rooted at a context key are
/// looked up; numbers and booleans are read as such; anything else is literal text.
pub fn evaluate(raw: &str, ctx: &Context) -> Value {
    let trimmed = raw.trim();

    if let Some(inner) = strip_quotes(trimmed) {
        return Value::String(normalize_text(inner));
    }
    if let Some(inner) = single_placeholder(trimmed) {
        return match parse_expression(inner) {
            Ok(expr) => evaluate_expr(&expr, ctx),
            Err(_) => Value::String(trimmed.to_string()),
        };
    }

    match trimmed {
        "" | "null" | "undefined" => return Value::Null,
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(n) = trimmed.parse::<f64>() {
        if n.is_finite() {
            return Value::Number(n);
        }
    }

    if let Ok(expr) = parse_expression(trimmed) {
        if expr.root().map(|root| ctx.is_root(root)).unwrap_or(false) {
            return evaluate_expr(&expr, ctx);
        }
    }

    if trimmed.contains('{') {
        return Value::String(resolve(trimmed, ctx).text);
    }
    Value::String(trimmed.to_string())
}

const QUOTE_PAIRS: &[(&str, &str)] = &[
    ("\"", "\""),
    ("'", "'"),
    ("&quot;", "&quot;"),
    ("&#039;", "&#039;"),
    ("&#39;", "&#39;"),
    ("\u{201c}", "\u{201d}"),
    ("\u{2018}", "\u{2019}"),
];

fn strip_quotes(s: &str) -> Option<&str> {
    QUOTE_PAIRS.iter().find_map(|(open, close)| {
        if s.len() >= open.len() + close.len() && s.starts_with(open) && s.ends_with(close) {
            Some(&s[open.len()..s.len() - close.len()])
        } else {
            None
        }
    })
}

pub fn evaluate_expr(expr: &Expr, ctx: &Context) -> Value {
    match expr {
        Expr::Literal(value) => value.clone(),
        Expr::Variable(name) => ctx.get(name).cloned().unwrap_or_default(),
        Expr::Member { object, property } => {
            let object = evaluate_expr(object, ctx);
            let key = match property {
                Key::Name(name) => name.clone(),
                Key::Computed(expr) => evaluate_expr(expr, ctx).to_text(),
            };
            member(&object, &key)
        }
        Expr::Call {
            receiver,
            method,
            arguments,
        } => {
            let receiver = evaluate_expr(receiver, ctx);
            let arguments: Vec<Value> = arguments.iter().map(|a| evaluate_expr(a, ctx)).collect();
            apply_modifier(&receiver, method, &arguments)
        }
    }
}

fn member(object: &Value, key: &str) -> Value {
    if let Some(value) = object.get(key) {
        return value.clone();
    }
    if key == "length" {
        if let Some(len) = object.len() {
            return Value::Number(len as f64);
        }
    }
    Value::Null
}

fn apply_modifier(receiver: &Value, method: &str, arguments: &[Value]) -> Value {
    let arg = |i: usize| arguments.get(i).cloned().unwrap_or_default();

    match method {
        "toUpperCase" => Value::String(receiver.to_text().to_uppercase()),
        "toLowerCase" => Value::String(receiver.to_text().to_lowercase()),
        "trim" => Value::String(receiver.to_text().trim().to_string()),
        "toString" => Value::String(receiver.to_text()),
        "toInt" => receiver
            .as_number()
            .map(|n| Value::Number(n.trunc()))
            .unwrap_or_default(),
        "join" => match receiver {
            Value::Array(items) => {
                let separator = match arg(0) {
                    Value::Null => ",".to_string(),
                    other => other.to_text(),
                };
                Value::String(
                    items
                        .iter()
                        .map(Value::to_text)
                        .collect::<Vec<_>>()
                        .join(&separator),
                )
            }
            other => Value::String(other.to_text()),
        },
        "includes" => {
            let needle = arg(0);
            Value::Bool(match receiver {
                Value::Array(items) => items.iter().any(|item| item.loose_eq(&needle)),
                Value::String(s) => s.contains(&needle.to_text()),
                _ => false,
            })
        }
        "at" => {
            let index = arg(0).as_number().unwrap_or(0.0) as i64;
            match receiver {
                Value::Array(items) => at_index(items.len(), index)
                    .and_then(|i| items.get(i).cloned())
                    .unwrap_or_default(),
                Value::String(s) => {
                    let chars: Vec<char> = s.chars().collect();
                    at_index(chars.len(), index)
                        .map(|i| Value::String(chars[i].to_string()))
                        .unwrap_or_default()
                }
                _ => Value::Null,
            }
        }
        unknown => {
            debug!(method = unknown, "Unknown expression modifier");
            Value::Null
        }
    }
}

fn at_index(len: usize, index: i64) -> Option<usize> {
    let resolved = if index < 0 { len as i64 + index } else { index };
    (resolved >= 0 && (resolved as usize) < len).then_some(resolved as usize)
}
