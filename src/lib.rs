//! Dialog Sequencing Engine
//!
//! Tick-driven playback of scripted NPC/user dialog, one session per user.
//! The host supplies a periodic tick, a user directory and a line renderer;
//! the engine supplies sessions with a fluent authoring API, lifecycle hooks,
//! safe cancellation/replacement semantics and per-session failure isolation.
//!
//! Everything is single-threaded and cooperative: [`DialogEngine::tick`] runs
//! to completion before the next tick, actions execute instantaneously (their
//! duration is a post-execution hold), and a blocking callback stalls the
//! whole stage.
//!
//! ```no_run
//! use std::rc::Rc;
//! use dialog_engine::{DialogEngine, LineRenderer, OutputChannel, Ticks, UserDirectory};
//!
//! struct Console;
//! impl LineRenderer for Console {
//!     fn render(&self, user: &str, _channel: OutputChannel, _hold: Ticks, text: &str) {
//!         println!("-> {user}: {text}");
//!     }
//! }
//! struct Everyone;
//! impl UserDirectory for Everyone {
//!     fn is_online(&self, _user: &str) -> bool {
//!         true
//!     }
//! }
//!
//! let engine = DialogEngine::new(Rc::new(Console), Rc::new(Everyone));
//! engine
//!     .session()
//!     .set_speaker_name("Village Elder")
//!     .npc_line(60, "Welcome, traveler.")
//!     .pause(20)
//!     .user_line(40, "Thank you.")
//!     .pad(20)
//!     .start("player-1");
//!
//! // Host tick loop.
//! while engine.active_sessions() > 0 {
//!     engine.tick();
//! }
//! ```

pub mod action;
pub mod engine;
pub mod error;
pub mod output;
pub mod registry;
pub mod scheduler;
pub mod script;
pub mod session;

#[cfg(test)]
pub(crate) mod testutil;

/// Scheduler time unit: one invocation of the external periodic driver.
pub type Ticks = u32;

pub use action::{Action, ActionKind, DialogAction};
pub use engine::{DialogEngine, UserDirectory};
pub use error::DialogError;
pub use output::{ChatSink, LineRenderer, OutputChannel, OutputSink, OverlaySink};
pub use registry::SessionRegistry;
pub use scheduler::Scheduler;
pub use script::{DialogScript, ScriptRegistry, ScriptStep, StepKind};
pub use session::{DialogSession, SessionSettings, SessionState};
