//! Game state snapshots.
//!
//! A [`GameState`] is an immutable, structurally shared map. Every update
//! returns a new snapshot, so the session's history stack is just a list of
//! earlier values.

use im::OrdMap;
use log::warn;
use skald_data::{Document, Testbed, Value};

/// Reserved key holding the tag of the active section.
pub const CURRENT_SECTION: &str = "currentSection";
/// Reserved key set once an `END` has executed.
pub const IS_END: &str = "isEnd";

/// A state entry: declared by the script but not yet given a value, or set.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Unset,
    Set(Value),
}

impl Slot {
    pub fn value(&self) -> Option<&Value> {
        match self {
            Slot::Unset => None,
            Slot::Set(value) => Some(value),
        }
    }

    /// Variant name for diagnostics; `"unset"` for the sentinel.
    pub fn type_name(&self) -> &'static str {
        match self {
            Slot::Unset => "unset",
            Slot::Set(value) => value.type_name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GameState {
    slots: OrdMap<String, Slot>,
}

impl GameState {
    /// Build the opening snapshot: every input unset, then the testbed's values on top.
    pub fn new(doc: &Document, testbed: Option<&Testbed>) -> Self {
        let mut slots: OrdMap<String, Slot> = doc.inputs.iter().map(|name| (name.clone(), Slot::Unset)).collect();
        if let Some(testbed) = testbed {
            for (name, value) in &testbed.sets {
                if is_reserved(name) {
                    warn!("testbed '{}' sets reserved key '{name}'; ignoring it", testbed.tag);
                    continue;
                }
                slots.insert(name.clone(), Slot::Set(value.clone()));
            }
        }
        slots.insert(IS_END.to_string(), Slot::Set(Value::Bool(false)));
        Self { slots }
    }

    pub fn get(&self, name: &str) -> Option<&Slot> {
        self.slots.get(name)
    }

    /// The value held by `name`, if it exists and is set.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(Slot::value)
    }

    /// A new snapshot with `name` replaced.
    #[must_use]
    pub fn with(&self, name: &str, slot: Slot) -> Self {
        Self {
            slots: self.slots.update(name.to_string(), slot),
        }
    }

    #[must_use]
    pub fn with_value(&self, name: &str, value: Value) -> Self {
        self.with(name, Slot::Set(value))
    }

    pub fn current_section(&self) -> Option<&str> {
        match self.value(CURRENT_SECTION) {
            Some(Value::Text(tag)) => Some(tag.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn with_section(&self, tag: &str) -> Self {
        self.with_value(CURRENT_SECTION, Value::Text(tag.to_string()))
    }

    pub fn is_end(&self) -> bool {
        matches!(self.value(IS_END), Some(Value::Bool(true)))
    }

    #[must_use]
    pub fn with_end(&self, is_end: bool) -> Self {
        self.with_value(IS_END, Value::Bool(is_end))
    }

    /// Every entry in key order, reserved keys included.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Slot)> {
        self.slots.iter()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Keys the runtime owns; scripts may read them but not mutate them.
pub fn is_reserved(name: &str) -> bool {
    name == CURRENT_SECTION || name == IS_END
}
