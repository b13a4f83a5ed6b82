#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
//! ** Skald **
//! Session runtime and terminal player for Skald narrative scripts.

pub const SKALD_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod command;
pub mod condition;
pub mod config;
pub mod loader;
pub mod mutation;
pub mod notice;
pub mod repl;
pub mod session;
pub mod state;
pub mod style;
pub mod view;

// Re-exports for convenience
pub use config::{SkaldConfig, load_config};
pub use loader::load_document;
pub use notice::{EvalError, Notice, Severity};
pub use repl::run_repl;
pub use session::{ChoiceView, CommandError, EndReason, Session, SessionEvent, SessionStatus};
pub use state::{GameState, Slot};
pub use view::{View, ViewItem};
