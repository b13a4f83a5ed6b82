//! Shared data model for Skald scripts.

pub mod defs;
pub mod validate;
pub mod value;

pub use defs::*;
pub use validate::{ValidationError, validate_document};
pub use value::{Operand, Value, is_identifier, is_tag};
