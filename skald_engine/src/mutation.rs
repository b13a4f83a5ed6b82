//! Mutation applier.
//!
//! Mutations are functional updates: each returns a new [`GameState`] and
//! leaves the one it was given alone. A mutation that cannot be applied is a
//! no-op with a recorded notice.

use skald_data::{Mutation, MutationOp, Operand, Value};

use crate::notice::{EvalError, Notice};
use crate::state::{GameState, Slot, is_reserved};

/// Apply one mutation to `state`.
pub fn apply(mutation: &Mutation, state: &GameState, notices: &mut Vec<Notice>) -> GameState {
    let input = mutation.input.as_str();
    if is_reserved(input) {
        Notice::record(notices, EvalError::ReservedInput(input.to_string()));
        return state.clone();
    }

    match (mutation.operator, &mutation.value) {
        (MutationOp::Assign, Operand::Flip) => match state.get(input) {
            Some(Slot::Set(Value::Bool(b))) => state.with_value(input, Value::Bool(!b)),
            other => {
                let found = other.map_or("missing", Slot::type_name);
                Notice::record(
                    notices,
                    EvalError::FlipNonBoolean {
                        input: input.to_string(),
                        found,
                    },
                );
                state.clone()
            },
        },
        (MutationOp::Assign, Operand::Literal(value)) => state.with_value(input, value.clone()),
        (op, operand) => {
            let Operand::Literal(Value::Number(step)) = operand else {
                Notice::record(
                    notices,
                    EvalError::NonNumericLiteral {
                        input: input.to_string(),
                        literal: operand.to_string(),
                    },
                );
                return state.clone();
            };
            let base = match state.get(input) {
                Some(Slot::Set(Value::Number(n))) => *n,
                Some(Slot::Set(other)) => {
                    Notice::record(
                        notices,
                        EvalError::NotNumeric {
                            input: input.to_string(),
                            found: other.type_name(),
                        },
                    );
                    return state.clone();
                },
                Some(Slot::Unset) | None => {
                    Notice::record(notices, EvalError::InitializedToZero(input.to_string()));
                    0.0
                },
            };
            let next = if op == MutationOp::Subtract { base - step } else { base + step };
            state.with_value(input, Value::Number(next))
        },
    }
}

/// Apply mutations in order, each one seeing the result of the previous.
pub fn apply_all(mutations: &[Mutation], state: &GameState, notices: &mut Vec<Notice>) -> GameState {
    mutations
        .iter()
        .fold(state.clone(), |acc, mutation| apply(mutation, &acc, notices))
}
