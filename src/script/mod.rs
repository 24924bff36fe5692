//! Dialog Script Module
//!
//! Declarative dialog scripts: TOML files describing a speaker and a timed
//! sequence of lines, instantiated into playable sessions. Complex dialogs
//! with callbacks are authored in code; scripts cover the common data-driven
//! case.

pub mod definition;
pub mod registry;

pub use definition::{DialogScript, ScriptStep, StepKind};
pub use registry::ScriptRegistry;
