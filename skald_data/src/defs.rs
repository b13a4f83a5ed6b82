use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::{Operand, Value};

/// Tag naming a section or testbed.
pub type Tag = String;

/// Top-level compiled script, the interchange record produced by the parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Document {
    /// Speaker tags in first-seen order.
    #[serde(default)]
    pub characters: Vec<String>,
    /// State variable names referenced by any condition or mutation, first-seen order.
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Signal names emitted anywhere in the script.
    #[serde(default)]
    pub signals: Vec<String>,
    #[serde(default)]
    pub testbeds: Vec<Testbed>,
    /// Sections in source order; this order is the implicit "next section" sequence.
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Document {
    /// Look up a section by tag.
    pub fn section(&self, tag: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.tag == tag)
    }

    /// Position of a section in document order.
    pub fn section_index(&self, tag: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.tag == tag)
    }

    /// The section following `tag` in document order, if any.
    pub fn next_section(&self, tag: &str) -> Option<&Section> {
        self.section_index(tag).and_then(|i| self.sections.get(i + 1))
    }

    pub fn testbed(&self, tag: &str) -> Option<&Testbed> {
        self.testbeds.iter().find(|t| t.tag == tag)
    }

    /// Index of a speaker in `characters`, used for stable speaker colors.
    pub fn character_index(&self, speaker: &str) -> Option<usize> {
        self.characters.iter().position(|c| c == speaker)
    }

    /// Every meta in the document paired with the tag of the section that owns it.
    pub fn metas(&self) -> impl Iterator<Item = (&str, &Meta)> {
        self.sections.iter().flat_map(|section| {
            section
                .blocks
                .iter()
                .map(Block::meta)
                .chain(section.choices.iter().map(|c| &c.meta))
                .map(move |meta| (section.tag.as_str(), meta))
        })
    }
}

/// A named initial-state fixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Testbed {
    pub tag: Tag,
    #[serde(default)]
    pub sets: BTreeMap<String, Value>,
}

/// A named scene: blocks first, then choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub tag: Tag,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

/// One narrative step within a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Block {
    /// A line spoken by `tag`.
    Attributed { tag: String, body: String, meta: Meta },
    /// A pure state-changing step with no displayed text.
    Logic { label: String, meta: Meta },
}

impl Block {
    pub fn meta(&self) -> &Meta {
        match self {
            Block::Attributed { meta, .. } | Block::Logic { meta, .. } => meta,
        }
    }

    pub fn meta_mut(&mut self) -> &mut Meta {
        match self {
            Block::Attributed { meta, .. } | Block::Logic { meta, .. } => meta,
        }
    }
}

/// A player-selectable option, numbered 1..n within its section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub body: String,
    pub meta: Meta,
}

/// Conditions, mutations, signals, transition and end flag attached to a block or choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub mutations: Vec<Mutation>,
    #[serde(default)]
    pub signals: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<Tag>,
    #[serde(default)]
    pub is_end: bool,
}

/// A test against one state variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub input: String,
    pub operator: ConditionOp,
    pub value: Value,
}

/// Comparison operator. Serialized as its source symbol (`"=="`, `">="`, ...)
/// so it reads the same in JSON and RON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "&'static str", try_from = "String")]
pub enum ConditionOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

impl ConditionOp {
    /// Operators in the order they are tried against condition text.
    pub const ALL: [ConditionOp; 6] = [
        ConditionOp::Le,
        ConditionOp::Ge,
        ConditionOp::Gt,
        ConditionOp::Lt,
        ConditionOp::Eq,
        ConditionOp::Ne,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            ConditionOp::Eq => "==",
            ConditionOp::Ne => "!=",
            ConditionOp::Gt => ">",
            ConditionOp::Lt => "<",
            ConditionOp::Ge => ">=",
            ConditionOp::Le => "<=",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }

    /// True for the ordering operators that require a numeric state value.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ConditionOp::Gt | ConditionOp::Lt | ConditionOp::Ge | ConditionOp::Le
        )
    }
}

impl fmt::Display for ConditionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A state update applied when the owning block or choice executes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mutation {
    pub input: String,
    pub operator: MutationOp,
    pub value: Operand,
}

/// Update operator, serialized as its source symbol like [`ConditionOp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "&'static str", try_from = "String")]
pub enum MutationOp {
    Assign,
    Add,
    Subtract,
}

impl MutationOp {
    pub fn symbol(self) -> &'static str {
        match self {
            MutationOp::Assign => "=",
            MutationOp::Add => "+=",
            MutationOp::Subtract => "-=",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" => Some(MutationOp::Assign),
            "+=" => Some(MutationOp::Add),
            "-=" => Some(MutationOp::Subtract),
            _ => None,
        }
    }
}

impl fmt::Display for MutationOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl From<ConditionOp> for &'static str {
    fn from(op: ConditionOp) -> Self {
        op.symbol()
    }
}

impl TryFrom<String> for ConditionOp {
    type Error = String;

    fn try_from(symbol: String) -> Result<Self, Self::Error> {
        ConditionOp::from_symbol(&symbol).ok_or_else(|| format!("unknown condition operator '{symbol}'"))
    }
}

impl From<MutationOp> for &'static str {
    fn from(op: MutationOp) -> Self {
        op.symbol()
    }
}

impl TryFrom<String> for MutationOp {
    type Error = String;

    fn try_from(symbol: String) -> Result<Self, Self::Error> {
        MutationOp::from_symbol(&symbol).ok_or_else(|| format!("unknown mutation operator '{symbol}'"))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.input, self.operator, self.value)
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.input, self.operator, self.value)
    }
}
