//! Literal values shared by conditions, mutations, testbeds and game state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Literal symbol that means "flip the current boolean" on the right side of `~name=!`.
pub const FLIP_SYMBOL: &str = "!";

/// A closed, typed literal read from script text.
///
/// Comparisons and arithmetic match on the variant; nothing converts implicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Number(f64),
    Text(String),
    Null,
}

impl Value {
    /// Coerce an unquoted literal from source text.
    ///
    /// `true`/`false` become booleans, `null`/`nil` become null, anything that
    /// parses as a finite number becomes a number, and the rest stays text.
    ///
    /// ```
    /// use skald_data::Value;
    ///
    /// assert_eq!(Value::interpret("true"), Value::Bool(true));
    /// assert_eq!(Value::interpret("nil"), Value::Null);
    /// assert_eq!(Value::interpret("-2.5"), Value::Number(-2.5));
    /// assert_eq!(Value::interpret("sword"), Value::Text("sword".into()));
    /// ```
    pub fn interpret(text: &str) -> Value {
        match text {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            "null" | "nil" => Value::Null,
            _ => match text.parse::<f64>() {
                Ok(n) if n.is_finite() => Value::Number(n),
                _ => Value::Text(text.to_string()),
            },
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Short name of the variant, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Text(_) => "string",
            Value::Null => "null",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Text(s) => write!(f, "{s}"),
            Value::Null => write!(f, "null"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

/// Render a number the way authors write it: integral values drop the `.0`.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Right-hand side of a mutation.
///
/// On the wire the flip sentinel is the plain string `"!"`, so compiled
/// documents stay readable by anything that only understands literals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum Operand {
    /// Invert the current boolean value.
    Flip,
    Literal(Value),
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        match value {
            Value::Text(ref s) if s == FLIP_SYMBOL => Operand::Flip,
            other => Operand::Literal(other),
        }
    }
}

impl From<Operand> for Value {
    fn from(operand: Operand) -> Self {
        match operand {
            Operand::Flip => Value::Text(FLIP_SYMBOL.to_string()),
            Operand::Literal(value) => value,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Flip => write!(f, "{FLIP_SYMBOL}"),
            Operand::Literal(value) => write!(f, "{value}"),
        }
    }
}

/// True for variable and speaker names: one or more ASCII letters or digits.
pub fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric())
}

/// True for section and testbed tags: ASCII letters, digits and hyphens.
pub fn is_tag(tag: &str) -> bool {
    !tag.is_empty() && tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpret_covers_every_literal_kind() {
        assert_eq!(Value::interpret("false"), Value::Bool(false));
        assert_eq!(Value::interpret("null"), Value::Null);
        assert_eq!(Value::interpret("10"), Value::Number(10.0));
        assert_eq!(Value::interpret("1e3"), Value::Number(1000.0));
        assert_eq!(Value::interpret("True"), Value::Text("True".into()));
    }

    #[test]
    fn non_finite_numbers_stay_text() {
        assert_eq!(Value::interpret("inf"), Value::Text("inf".into()));
        assert_eq!(Value::interpret("NaN"), Value::Text("NaN".into()));
    }

    #[test]
    fn numbers_display_without_trailing_zero() {
        assert_eq!(Value::Number(5.0).to_string(), "5");
        assert_eq!(Value::Number(-0.5).to_string(), "-0.5");
    }

    #[test]
    fn equality_respects_variant() {
        assert_ne!(Value::Number(1.0), Value::Text("1".into()));
        assert_ne!(Value::Bool(false), Value::Null);
    }

    #[test]
    fn flip_operand_uses_bang_on_the_wire() {
        let json = serde_json::to_string(&Operand::Flip).unwrap();
        assert_eq!(json, "\"!\"");
        let back: Operand = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Operand::Flip);
        let lit: Operand = serde_json::from_str("3").unwrap();
        assert_eq!(lit, Operand::Literal(Value::Number(3.0)));
    }

    #[test]
    fn identifier_and_tag_rules() {
        assert!(is_identifier("gold2"));
        assert!(!is_identifier("gold-2"));
        assert!(!is_identifier(""));
        assert!(is_tag("the-end"));
        assert!(!is_tag("the end"));
    }
}
