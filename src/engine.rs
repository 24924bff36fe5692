//! Dialog Engine
//!
//! The process-wide context for dialog playback: owns the session registry,
//! the scheduler's active set and the stock output sinks, and receives the
//! external tick. One engine per process entry point; tests construct
//! isolated instances.
//!
//! The engine is a cheap cloneable handle and is deliberately single-threaded
//! (`Rc`, no locks): all scheduling state is mutated only by the thread that
//! drives `tick()`, and `tick()` runs to completion before the next tick.

use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use tracing::error;

use crate::output::{ChatSink, LineRenderer, OutputSink, OverlaySink};
use crate::registry::SessionRegistry;
use crate::scheduler::Scheduler;
use crate::session::{DialogSession, SessionState};

/// User presence and naming, supplied by the host environment. `is_online`
/// is polled every tick for every running session; it must be cheap and must
/// not call back into the engine.
pub trait UserDirectory {
    fn is_online(&self, user: &str) -> bool;

    /// Display name substituted into user-line formatting. Defaults to the
    /// identity key.
    fn display_name(&self, user: &str) -> String {
        user.to_string()
    }
}

struct EngineInner {
    registry: SessionRegistry,
    scheduler: Scheduler,
    directory: Rc<dyn UserDirectory>,
    overlay_sink: Rc<dyn OutputSink>,
    chat_sink: Rc<dyn OutputSink>,
    tick: u64,
}

/// Handle to the dialog engine. Clones share the same state.
#[derive(Clone)]
pub struct DialogEngine {
    inner: Rc<RefCell<EngineInner>>,
}

impl DialogEngine {
    pub fn new(renderer: Rc<dyn LineRenderer>, directory: Rc<dyn UserDirectory>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(EngineInner {
                registry: SessionRegistry::new(),
                scheduler: Scheduler::new(),
                directory,
                overlay_sink: Rc::new(OverlaySink::new(renderer.clone())),
                chat_sink: Rc::new(ChatSink::new(renderer)),
                tick: 0,
            })),
        }
    }

    /// Create a new, empty session in INIT state, defaulting to the overlay
    /// sink.
    pub fn session(&self) -> DialogSession {
        DialogSession::new(self.clone())
    }

    /// The session currently bound to `user`, if any. Lets callers inspect or
    /// interrupt a user's running dialog.
    pub fn session_for(&self, user: &str) -> Option<DialogSession> {
        self.inner.borrow().registry.get(user)
    }

    /// End the session currently bound to `user`. Returns true if one was
    /// running.
    pub fn end_session_for(&self, user: &str) -> bool {
        match self.session_for(user) {
            Some(session) => {
                session.end();
                true
            }
            None => false,
        }
    }

    /// Advance every active session by one tick. Invoked once per external
    /// tick by the host's driver.
    ///
    /// Iterates a snapshot of the active set taken at entry: sessions started
    /// during this call (e.g. by a callback action) receive their first
    /// advance on the next tick, which bounds same-tick recursion and
    /// guarantees each session advances at most once per tick. A failure in
    /// one session never prevents the others from advancing.
    pub fn tick(&self) {
        let (tick, snapshot) = {
            let mut inner = self.inner.borrow_mut();
            inner.tick += 1;
            (inner.tick, inner.scheduler.snapshot())
        };

        for session in snapshot {
            if session.state() == SessionState::Cancelled {
                continue;
            }
            if panic::catch_unwind(AssertUnwindSafe(|| session.advance())).is_err() {
                error!(session = %session.id(), tick, "session advance panicked");
            }
        }
    }

    /// Number of sessions currently registered for advancement.
    pub fn active_sessions(&self) -> usize {
        self.inner.borrow().scheduler.len()
    }

    /// Ticks processed so far.
    pub fn current_tick(&self) -> u64 {
        self.inner.borrow().tick
    }

    // ------------------------------------------------------------------
    // Session support (crate-internal)
    // ------------------------------------------------------------------

    pub(crate) fn register(&self, user: &str, session: DialogSession) {
        let mut inner = self.inner.borrow_mut();
        inner.registry.set(user, session.clone());
        inner.scheduler.add(session);
    }

    pub(crate) fn unregister(&self, user: &str, session: &DialogSession) {
        let mut inner = self.inner.borrow_mut();
        inner.registry.remove(user, session);
        inner.scheduler.remove(session);
    }

    /// Scheduler-only removal, used when a disposed session is encountered
    /// during advancement.
    pub(crate) fn deactivate(&self, session: &DialogSession) {
        self.inner.borrow_mut().scheduler.remove(session);
    }

    pub(crate) fn is_online(&self, user: &str) -> bool {
        let directory = Rc::clone(&self.inner.borrow().directory);
        directory.is_online(user)
    }

    pub(crate) fn display_name(&self, user: &str) -> String {
        let directory = Rc::clone(&self.inner.borrow().directory);
        directory.display_name(user)
    }

    pub(crate) fn overlay_sink(&self) -> Rc<dyn OutputSink> {
        Rc::clone(&self.inner.borrow().overlay_sink)
    }

    pub(crate) fn chat_sink(&self) -> Rc<dyn OutputSink> {
        Rc::clone(&self.inner.borrow().chat_sink)
    }
}
