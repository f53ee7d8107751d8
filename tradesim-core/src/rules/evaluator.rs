//! Condition evaluation against current and previous snapshots.
//!
//! Evaluation is total: an absent operand or a missing previous snapshot
//! makes the condition false, never an error.

use super::condition::{Comparand, Condition, Operator};
use crate::indicators::IndicatorSnapshot;

/// Tolerance for `==`.
pub const EQUALITY_EPSILON: f64 = 1e-4;

/// True when every condition holds. An empty list never matches.
pub fn matches_all(
    conditions: &[Condition],
    current: &IndicatorSnapshot,
    previous: Option<&IndicatorSnapshot>,
) -> bool {
    !conditions.is_empty() && conditions.iter().all(|c| evaluate(c, current, previous))
}

/// Evaluate a single condition.
pub fn evaluate(
    condition: &Condition,
    current: &IndicatorSnapshot,
    previous: Option<&IndicatorSnapshot>,
) -> bool {
    let Some((left, right)) = operands(condition, current) else {
        return false;
    };

    match condition.operator {
        Operator::GreaterThan => left > right,
        Operator::LessThan => left < right,
        Operator::GreaterOrEqual => left >= right,
        Operator::LessOrEqual => left <= right,
        Operator::Equal => (left - right).abs() <= EQUALITY_EPSILON,
        Operator::CrossAbove | Operator::CrossBelow => {
            let Some((prev_left, prev_right)) = previous.and_then(|p| operands(condition, p))
            else {
                return false;
            };
            if condition.operator == Operator::CrossAbove {
                prev_left <= prev_right && left > right
            } else {
                prev_left >= prev_right && left < right
            }
        }
    }
}

fn operands(condition: &Condition, snapshot: &IndicatorSnapshot) -> Option<(f64, f64)> {
    let left = snapshot.get(condition.indicator).value()?;
    let right = match condition.comparand {
        Comparand::Value(v) => v,
        Comparand::Indicator(key) => snapshot.get(key).value()?,
    };
    Some((left, right))
}
