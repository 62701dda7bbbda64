//! Condition evaluation.

use crate::context::Context;
use crate::resolver::evaluate;
use crate::value::Value;
use etch_blocks::{Condition, Operand, Operator};
use std::cmp::Ordering;
use tracing::warn;

/// Evaluate a condition. Total: unknown operators and incomparable operands are false.
pub fn evaluate_condition(condition: &Condition, ctx: &Context) -> bool {
    let left = operand_value(&condition.left, ctx);

    match &condition.operator {
        Operator::IsTruthy => left.is_truthy(),
        Operator::IsFalsy => !left.is_truthy(),
        Operator::And => left.is_truthy() && right_value(condition, ctx).is_truthy(),
        Operator::Or => left.is_truthy() || right_value(condition, ctx).is_truthy(),
        Operator::Unknown(raw) => {
            warn!(operator = %raw, "Unknown condition operator, treating as false");
            false
        }
        op => compare(op, &left, &right_value(condition, ctx)),
    }
}

/// Apply a binary comparison operator to two values
pub fn compare(op: &Operator, left: &Value, right: &Value) -> bool {
    match op {
        Operator::Eq => left.loose_eq(right),
        Operator::Neq => !left.loose_eq(right),
        Operator::StrictEq => left.strict_eq(right),
        Operator::StrictNeq => !left.strict_eq(right),
        Operator::Gt => left.compare(right) == Some(Ordering::Greater),
        Operator::Lt => left.compare(right) == Some(Ordering::Less),
        Operator::Gte => matches!(left.compare(right), Some(Ordering::Greater | Ordering::Equal)),
        Operator::Lte => matches!(left.compare(right), Some(Ordering::Less | Ordering::Equal)),
        Operator::And => left.is_truthy() && right.is_truthy(),
        Operator::Or => left.is_truthy() || right.is_truthy(),
        Operator::IsTruthy => left.is_truthy(),
        Operator::IsFalsy => !left.is_truthy(),
        Operator::Unknown(_) => false,
    }
}

fn right_value(condition: &Condition, ctx: &Context) -> Value {
    condition
        .right
        .as_ref()
        .map(|operand| operand_value(operand, ctx))
        .unwrap_or_default()
}

fn operand_value(operand: &Operand, ctx: &Context) -> Value {
    match operand {
        Operand::Condition(inner) => Value::Bool(evaluate_condition(inner, ctx)),
        Operand::Expression(raw) => evaluate(raw, ctx),
        Operand::Literal(json) => Value::from(json.clone()),
    }
}

/// The operator whose result is the negation of `op` on defined scalars
pub fn complement(op: &Operator) -> Option<Operator> {
    Some(match op {
        Operator::Eq => Operator::Neq,
        Operator::Neq => Operator::Eq,
        Operator::StrictEq => Operator::StrictNeq,
        Operator::StrictNeq => Operator::StrictEq,
        Operator::Gt => Operator::Lte,
        Operator::Lte => Operator::Gt,
        Operator::Lt => Operator::Gte,
        Operator::Gte => Operator::Lt,
        Operator::IsTruthy => Operator::IsFalsy,
        Operator::IsFalsy => Operator::IsTruthy,
        Operator::And | Operator::Or | Operator::Unknown(_) => return None,
    })
}
