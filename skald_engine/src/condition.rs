//! Condition evaluator.

use skald_data::{Condition, ConditionOp};

use crate::notice::{EvalError, Notice};
use crate::state::{GameState, Slot};

/// Evaluate one condition against a snapshot.
///
/// Evaluation is pure apart from the notices it records: a missing entry, an
/// ordering comparison on an unset or non-numeric value, or a non-numeric
/// literal all make the condition false.
pub fn evaluate(condition: &Condition, state: &GameState, notices: &mut Vec<Notice>) -> bool {
    let Some(slot) = state.get(&condition.input) else {
        Notice::record(notices, EvalError::MissingInput(condition.input.clone()));
        return false;
    };

    let current = match slot {
        Slot::Set(value) => value,
        Slot::Unset => {
            return match condition.operator {
                ConditionOp::Eq => false,
                ConditionOp::Ne => true,
                op => {
                    Notice::record(
                        notices,
                        EvalError::UnsetComparison {
                            input: condition.input.clone(),
                            operator: op.symbol(),
                        },
                    );
                    false
                },
            };
        },
    };

    match condition.operator {
        ConditionOp::Eq => *current == condition.value,
        ConditionOp::Ne => *current != condition.value,
        op => {
            let Some(lhs) = current.as_number() else {
                Notice::record(
                    notices,
                    EvalError::NotNumeric {
                        input: condition.input.clone(),
                        found: current.type_name(),
                    },
                );
                return false;
            };
            let Some(rhs) = condition.value.as_number() else {
                Notice::record(
                    notices,
                    EvalError::NonNumericLiteral {
                        input: condition.input.clone(),
                        literal: condition.value.to_string(),
                    },
                );
                return false;
            };
            compare(op, lhs, rhs)
        },
    }
}

/// True when every condition holds; an empty list always holds.
pub fn conditions_hold(conditions: &[Condition], state: &GameState, notices: &mut Vec<Notice>) -> bool {
    conditions.iter().all(|c| evaluate(c, state, notices))
}

fn compare(op: ConditionOp, lhs: f64, rhs: f64) -> bool {
    match op {
        ConditionOp::Gt => lhs > rhs,
        ConditionOp::Lt => lhs < rhs,
        ConditionOp::Ge => lhs >= rhs,
        ConditionOp::Le => lhs <= rhs,
        ConditionOp::Eq => lhs == rhs,
        ConditionOp::Ne => lhs != rhs,
    }
}
