//! Condition and mutation expressions (`?expr` and `~expr` payloads).

use std::sync::LazyLock;

use regex::Regex;
use skald_data::{Condition, ConditionOp, Mutation, MutationOp, Operand, Value, is_identifier};

use crate::error::ScriptErrorKind;

// Leftmost match wins, two-character operators are tried before their prefixes.
static CONDITION_OP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<=|>=|>|<|==|!=").expect("condition operator pattern"));
static MUTATION_OP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[+\-=]+").expect("mutation operator pattern"));

/// Parse the text after `?`.
///
/// `name` is sugar for `name == true` and `!name` for `name == false`.
pub fn parse_condition(text: &str) -> Result<Condition, ScriptErrorKind> {
    let Some(found) = CONDITION_OP.find(text) else {
        let (input, expected) = match text.strip_prefix('!') {
            Some(rest) => (rest.trim(), false),
            None => (text, true),
        };
        check_input(input)?;
        return Ok(Condition {
            input: input.to_string(),
            operator: ConditionOp::Eq,
            value: Value::Bool(expected),
        });
    };

    let symbol = found.as_str();
    let operator = ConditionOp::from_symbol(symbol).ok_or(ScriptErrorKind::MalformedCondition)?;
    let (lhs, rhs) = split_once_exactly(text, symbol).ok_or(ScriptErrorKind::MalformedCondition)?;
    let input = lhs.trim();
    check_input(input)?;
    let rhs = rhs.trim();
    if rhs.is_empty() {
        return Err(ScriptErrorKind::MissingValue);
    }
    Ok(Condition {
        input: input.to_string(),
        operator,
        value: Value::interpret(rhs),
    })
}

/// Parse the text after `~`. The first run of `+`, `-`, `=` is the operator.
pub fn parse_mutation(text: &str) -> Result<Mutation, ScriptErrorKind> {
    let found = MUTATION_OP.find(text).ok_or(ScriptErrorKind::MissingOperator)?;
    let symbol = found.as_str();
    let operator =
        MutationOp::from_symbol(symbol).ok_or_else(|| ScriptErrorKind::BadMutationOperator(symbol.to_string()))?;
    let (lhs, rhs) = split_once_exactly(text, symbol).ok_or(ScriptErrorKind::MalformedMutation)?;
    let input = lhs.trim();
    check_input(input)?;
    let rhs = rhs.trim();
    if rhs.is_empty() {
        return Err(ScriptErrorKind::MissingValue);
    }

    let value = Operand::from(Value::interpret(rhs));
    if operator != MutationOp::Assign && !matches!(value, Operand::Literal(Value::Number(_))) {
        return Err(ScriptErrorKind::NonNumericStep(symbol.to_string()));
    }
    Ok(Mutation {
        input: input.to_string(),
        operator,
        value,
    })
}

/// Split on `sep` only when it occurs exactly once.
fn split_once_exactly<'a>(text: &'a str, sep: &str) -> Option<(&'a str, &'a str)> {
    let (lhs, rhs) = text.split_once(sep)?;
    (!rhs.contains(sep)).then_some((lhs, rhs))
}

fn check_input(input: &str) -> Result<(), ScriptErrorKind> {
    if is_identifier(input) {
        Ok(())
    } else {
        Err(ScriptErrorKind::BadInputName(input.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cond(input: &str, operator: ConditionOp, value: Value) -> Condition {
        Condition {
            input: input.into(),
            operator,
            value,
        }
    }

    #[test]
    fn bare_and_negated_conditions_are_boolean_sugar() {
        assert_eq!(parse_condition("hasKey"), Ok(cond("hasKey", ConditionOp::Eq, Value::Bool(true))));
        assert_eq!(parse_condition("!hasKey"), Ok(cond("hasKey", ConditionOp::Eq, Value::Bool(false))));
    }

    #[test]
    fn operators_prefer_two_character_forms() {
        assert_eq!(parse_condition("hp<=0"), Ok(cond("hp", ConditionOp::Le, Value::Number(0.0))));
        assert_eq!(parse_condition("hp >= 10"), Ok(cond("hp", ConditionOp::Ge, Value::Number(10.0))));
        assert_eq!(
            parse_condition("mood!=angry"),
            Ok(cond("mood", ConditionOp::Ne, Value::Text("angry".into())))
        );
        assert_eq!(parse_condition("door==nil"), Ok(cond("door", ConditionOp::Eq, Value::Null)));
    }

    #[test]
    fn malformed_conditions_are_rejected() {
        assert_eq!(parse_condition("a==b==c"), Err(ScriptErrorKind::MalformedCondition));
        assert_eq!(parse_condition("hp>"), Err(ScriptErrorKind::MissingValue));
        assert_eq!(
            parse_condition("my-var==1"),
            Err(ScriptErrorKind::BadInputName("my-var".into()))
        );
        assert_eq!(parse_condition("!"), Err(ScriptErrorKind::BadInputName(String::new())));
    }

    #[test]
    fn mutation_operators() {
        let m = parse_mutation("gold+=5").expect("mutation");
        assert_eq!(m.operator, MutationOp::Add);
        assert_eq!(m.value, Operand::Literal(Value::Number(5.0)));

        let m = parse_mutation("lamp=!").expect("mutation");
        assert_eq!(m.operator, MutationOp::Assign);
        assert_eq!(m.value, Operand::Flip);

        let m = parse_mutation("name = Ada").expect("mutation");
        assert_eq!(m.value, Operand::Literal(Value::Text("Ada".into())));
    }

    #[test]
    fn malformed_mutations_are_rejected() {
        assert_eq!(parse_mutation("gold"), Err(ScriptErrorKind::MissingOperator));
        assert_eq!(parse_mutation("x=-5"), Err(ScriptErrorKind::BadMutationOperator("=-".into())));
        assert_eq!(parse_mutation("x=a=b"), Err(ScriptErrorKind::MalformedMutation));
        assert_eq!(parse_mutation("x="), Err(ScriptErrorKind::MissingValue));
        assert_eq!(parse_mutation("x+=lots"), Err(ScriptErrorKind::NonNumericStep("+=".into())));
        assert_eq!(parse_mutation("x y=1"), Err(ScriptErrorKind::BadInputName("x y".into())));
    }
}
