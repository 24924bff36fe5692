//! Dialog Sessions
//!
//! A `DialogSession` owns one ordered sequence of actions played back to a
//! single user, one tick at a time. Authoring is fluent (every call returns
//! the session so calls chain); playback is driven by the engine's tick loop.
//!
//! Sessions are cheap cloneable handles around shared state, the same pattern
//! the rest of the engine uses. No borrow of that state is ever held across a
//! call into host code (actions, subscribers, renderers), which is what makes
//! re-entrant calls like "a callback cancels its own session" safe.

use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::Ticks;
use crate::action::{Action, DialogAction, fill_args};
use crate::engine::DialogEngine;
use crate::output::OutputSink;

// ============================================================================
// Session State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Constructed, accepting actions, not yet started.
    Init,
    /// Bound to a user and advanced by the scheduler.
    Running,
    /// Ran out of actions and pad time.
    Complete,
    /// Ended early: explicit cancel, user loss, or replacement.
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Complete | SessionState::Cancelled)
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Per-session presentation settings for talk actions.
///
/// Line formats use `{speaker}` / `{user}` and `{text}` placeholders; the
/// line text itself resolves positional `{0}`, `{1}`, ... placeholders from
/// the action's own argument list first.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub speaker_name: String,
    pub npc_format: String,
    pub user_format: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            speaker_name: "Narrator".to_string(),
            npc_format: "[{speaker}] {text}".to_string(),
            user_format: "[{user}] {text}".to_string(),
        }
    }
}

// ============================================================================
// Session
// ============================================================================

type Subscriber = Rc<dyn Fn()>;

struct SessionInner {
    id: String,
    actions: Vec<Rc<Action>>,
    cursor: usize,
    ticks_remaining: Ticks,
    pad_ticks_remaining: Ticks,
    settings: SessionSettings,
    sink: Rc<dyn OutputSink>,
    user: Option<String>,
    state: SessionState,
    disposed: bool,
    on_start: Vec<Subscriber>,
    on_complete: Vec<Subscriber>,
    on_cancel: Vec<Subscriber>,
}

/// Handle to one user's dialog playback. Created through
/// [`DialogEngine::session`].
#[derive(Clone)]
pub struct DialogSession {
    engine: DialogEngine,
    inner: Rc<RefCell<SessionInner>>,
}

impl std::fmt::Debug for DialogSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogSession")
            .field("id", &self.inner.borrow().id)
            .finish_non_exhaustive()
    }
}

impl DialogSession {
    pub(crate) fn new(engine: DialogEngine) -> Self {
        let sink = engine.overlay_sink();
        Self {
            engine,
            inner: Rc::new(RefCell::new(SessionInner {
                id: Uuid::new_v4().to_string(),
                actions: Vec::new(),
                cursor: 0,
                ticks_remaining: 0,
                pad_ticks_remaining: 0,
                settings: SessionSettings::default(),
                sink,
                user: None,
                state: SessionState::Init,
                disposed: false,
                on_start: Vec::new(),
                on_complete: Vec::new(),
                on_cancel: Vec::new(),
            })),
        }
    }

    // ------------------------------------------------------------------
    // Authoring (fluent)
    // ------------------------------------------------------------------

    /// Switch the rendering channel for subsequently executed talk actions.
    pub fn set_output(&self, sink: Rc<dyn OutputSink>) -> &Self {
        self.inner.borrow_mut().sink = sink;
        self
    }

    /// Render subsequent talk actions into the persistent chat log.
    pub fn set_chat_output(&self) -> &Self {
        self.set_output(self.engine.chat_sink())
    }

    /// Render subsequent talk actions on the transient overlay (the default).
    pub fn set_overlay_output(&self) -> &Self {
        self.set_output(self.engine.overlay_sink())
    }

    /// Display name substituted for `{speaker}` in NPC lines.
    pub fn set_speaker_name(&self, name: impl Into<String>) -> &Self {
        self.inner.borrow_mut().settings.speaker_name = name.into();
        self
    }

    /// Format template for NPC lines (`{speaker}` and `{text}` placeholders).
    pub fn set_npc_format(&self, format: impl Into<String>) -> &Self {
        self.inner.borrow_mut().settings.npc_format = format.into();
        self
    }

    /// Format template for user lines (`{user}` and `{text}` placeholders).
    pub fn set_user_format(&self, format: impl Into<String>) -> &Self {
        self.inner.borrow_mut().settings.user_format = format.into();
        self
    }

    /// Append an NPC line held for `ticks` (the read time).
    pub fn npc_line(&self, ticks: Ticks, text: impl Into<String>) -> &Self {
        self.push(Action::npc_line(ticks, text, Vec::new()))
    }

    /// Append an NPC line with positional `{0}`, `{1}`, ... arguments.
    pub fn npc_line_args(&self, ticks: Ticks, text: impl Into<String>, args: &[&str]) -> &Self {
        self.push(Action::npc_line(ticks, text, to_owned_args(args)))
    }

    /// Append one NPC line per entry, each with the same read time.
    pub fn npc_lines(&self, ticks: Ticks, lines: &[&str]) -> &Self {
        for line in lines {
            self.npc_line(ticks, *line);
        }
        self
    }

    /// Append a line attributed to the bound user.
    pub fn user_line(&self, ticks: Ticks, text: impl Into<String>) -> &Self {
        self.push(Action::user_line(ticks, text, Vec::new()))
    }

    /// Append a user line with positional arguments.
    pub fn user_line_args(&self, ticks: Ticks, text: impl Into<String>, args: &[&str]) -> &Self {
        self.push(Action::user_line(ticks, text, to_owned_args(args)))
    }

    /// Append one user line per entry, each with the same read time.
    pub fn user_lines(&self, ticks: Ticks, lines: &[&str]) -> &Self {
        for line in lines {
            self.user_line(ticks, *line);
        }
        self
    }

    /// Append a silent hold of `ticks`.
    pub fn pause(&self, ticks: Ticks) -> &Self {
        self.push(Action::pause(ticks))
    }

    /// Add trailing pad time immediately. Pad is not queued as an action and
    /// never occupies a cursor slot; it keeps the session alive after its
    /// last action so a final line is not truncated.
    pub fn pad(&self, ticks: Ticks) -> &Self {
        let mut inner = self.inner.borrow_mut();
        assert!(!inner.disposed, "cannot pad a disposed dialog session");
        inner.pad_ticks_remaining += ticks;
        drop(inner);
        self
    }

    /// Append a zero-duration callback action.
    pub fn run(&self, f: impl Fn() + 'static) -> &Self {
        self.push(Action::callback(Rc::new(f)))
    }

    /// Append a caller-supplied custom action.
    pub fn action(&self, action: Rc<dyn DialogAction>) -> &Self {
        self.push(Action::custom(action))
    }

    /// Subscribe to session start. Subscribers fire in registration order.
    pub fn on_start(&self, f: impl Fn() + 'static) -> &Self {
        self.inner.borrow_mut().on_start.push(Rc::new(f));
        self
    }

    /// Subscribe to normal completion.
    pub fn on_complete(&self, f: impl Fn() + 'static) -> &Self {
        self.inner.borrow_mut().on_complete.push(Rc::new(f));
        self
    }

    /// Subscribe to the terminal cleanup. Fires for cancellation and, after
    /// `on_complete`, for normal completion.
    pub fn on_cancel(&self, f: impl Fn() + 'static) -> &Self {
        self.inner.borrow_mut().on_cancel.push(Rc::new(f));
        self
    }

    fn push(&self, action: Action) -> &Self {
        let mut inner = self.inner.borrow_mut();
        assert!(!inner.disposed, "cannot append to a disposed dialog session");
        inner.actions.push(Rc::new(action));
        drop(inner);
        self
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Bind `user` and begin playback on the next engine tick.
    ///
    /// Ends this session's own still-running prior run first (double-start
    /// guard), then ends the user's previous active session (last-writer-wins
    /// replacement policy), then registers with the engine and fires
    /// `on_start`.
    ///
    /// Panics if the session is disposed or `user` is empty.
    pub fn start(&self, user: &str) -> &Self {
        {
            let inner = self.inner.borrow();
            assert!(!inner.disposed, "start() called on a disposed dialog session");
            assert!(!user.is_empty(), "start() requires a user identity");
        }

        if self.state() == SessionState::Running {
            self.end();
        }

        if let Some(previous) = self.engine.session_for(user) {
            if !previous.same_session(self) {
                previous.end();
            }
        }

        let on_start = {
            let mut inner = self.inner.borrow_mut();
            inner.user = Some(user.to_string());
            inner.state = SessionState::Running;
            inner.cursor = 0;
            inner.ticks_remaining = 0;
            inner.on_start.clone()
        };

        self.engine.register(user, self.clone());
        debug!(session = %self.id(), user, "dialog session started");

        for subscriber in &on_start {
            subscriber();
        }
        self
    }

    /// Cancel playback: stops the scheduler from advancing this session,
    /// releases the registry slot, and fires `on_cancel`. Idempotent.
    pub fn end(&self) {
        self.finish(false);
    }

    /// Alias for [`end`](Self::end).
    pub fn cancel(&self) {
        self.end();
    }

    /// Clear actions and subscribers and mark the session unusable. A running
    /// session is silently deregistered; no further events fire. Idempotent.
    pub fn dispose(&self) {
        let was_running = {
            let mut inner = self.inner.borrow_mut();
            if inner.disposed {
                return;
            }
            inner.disposed = true;
            inner.actions.clear();
            inner.on_start.clear();
            inner.on_complete.clear();
            inner.on_cancel.clear();
            inner.state == SessionState::Running
        };
        if was_running {
            self.finish(false);
        }
    }

    /// Shared terminal path for completion and cancellation. Cleanup happens
    /// before subscribers fire so an `on_cancel` handler that immediately
    /// starts a replacement session observes a clean registry.
    fn finish(&self, completed: bool) {
        let (user, on_complete, on_cancel) = {
            let mut inner = self.inner.borrow_mut();
            if inner.state.is_terminal() {
                return;
            }
            inner.state = if completed { SessionState::Complete } else { SessionState::Cancelled };
            inner.ticks_remaining = 0;
            (
                inner.user.clone(),
                if completed { inner.on_complete.clone() } else { Vec::new() },
                inner.on_cancel.clone(),
            )
        };

        debug!(
            session = %self.id(),
            completed,
            "dialog session finished"
        );

        for subscriber in &on_complete {
            subscriber();
        }

        if let Some(user) = &user {
            self.engine.unregister(user, self);
        }

        for subscriber in &on_cancel {
            subscriber();
        }
    }

    // ------------------------------------------------------------------
    // Per-tick advance
    // ------------------------------------------------------------------

    /// Consume one tick. Called by the engine, at most once per external
    /// tick. The step order matters: pad always drains before the countdown
    /// and cursor logic, so pad time and read time are tracked independently
    /// and never double-consumed in one tick.
    pub(crate) fn advance(&self) {
        let (disposed, state, user) = {
            let inner = self.inner.borrow();
            (inner.disposed, inner.state, inner.user.clone())
        };

        if disposed {
            self.engine.deactivate(self);
            return;
        }
        if state != SessionState::Running {
            return;
        }
        let user = match user {
            Some(user) => user,
            // Running without a bound user is unreachable through the public
            // API; treat it as a lost user.
            None => {
                self.end();
                return;
            }
        };

        if !self.engine.is_online(&user) {
            debug!(session = %self.id(), user, "bound user offline, ending session");
            self.end();
            return;
        }

        enum Outcome {
            Hold,
            Finish,
            Execute(Rc<Action>),
        }

        let outcome = {
            let mut inner = self.inner.borrow_mut();

            if inner.pad_ticks_remaining > 0 {
                inner.pad_ticks_remaining -= 1;
            }

            if inner.ticks_remaining > 0 {
                inner.ticks_remaining -= 1;
                Outcome::Hold
            } else if inner.cursor >= inner.actions.len() {
                if inner.pad_ticks_remaining == 0 {
                    Outcome::Finish
                } else {
                    Outcome::Hold
                }
            } else {
                let action = Rc::clone(&inner.actions[inner.cursor]);
                inner.ticks_remaining = action.duration();
                inner.cursor += 1;
                Outcome::Execute(action)
            }
        };

        match outcome {
            Outcome::Hold => {}
            Outcome::Finish => self.finish(true),
            Outcome::Execute(action) => {
                // A broken action must not wedge the session: failures and
                // panics are contained here and playback moves on.
                let result = panic::catch_unwind(AssertUnwindSafe(|| action.execute(&user, self)));
                match result {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        warn!(session = %self.id(), action = ?action, "dialog action failed: {e}");
                    }
                    Err(_) => {
                        warn!(session = %self.id(), action = ?action, "dialog action panicked");
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Rendering helpers (called by executing actions)
    // ------------------------------------------------------------------

    pub(crate) fn say_npc_line(&self, user: &str, hold_ticks: Ticks, text: &str, args: &[String]) {
        let (line, sink) = {
            let inner = self.inner.borrow();
            let body = fill_args(text, args);
            let line = inner
                .settings
                .npc_format
                .replace("{speaker}", &inner.settings.speaker_name)
                .replace("{text}", &body);
            (line, Rc::clone(&inner.sink))
        };
        sink.say(user, hold_ticks, &line);
    }

    pub(crate) fn say_user_line(&self, user: &str, hold_ticks: Ticks, text: &str, args: &[String]) {
        let display_name = self.engine.display_name(user);
        let (line, sink) = {
            let inner = self.inner.borrow();
            let body = fill_args(text, args);
            let line = inner
                .settings
                .user_format
                .replace("{user}", &display_name)
                .replace("{text}", &body);
            (line, Rc::clone(&inner.sink))
        };
        sink.say(user, hold_ticks, &line);
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn id(&self) -> String {
        self.inner.borrow().id.clone()
    }

    pub fn state(&self) -> SessionState {
        self.inner.borrow().state
    }

    pub fn is_running(&self) -> bool {
        self.state() == SessionState::Running
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.borrow().disposed
    }

    /// Identity of the bound user while running (or last bound).
    pub fn user(&self) -> Option<String> {
        self.inner.borrow().user.clone()
    }

    /// Actions not yet executed.
    pub fn remaining_actions(&self) -> usize {
        let inner = self.inner.borrow();
        inner.actions.len().saturating_sub(inner.cursor)
    }

    /// Trailing pad ticks still to drain.
    pub fn pad_ticks_remaining(&self) -> Ticks {
        self.inner.borrow().pad_ticks_remaining
    }

    /// Whether two handles refer to the same session object.
    pub fn same_session(&self, other: &DialogSession) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

fn to_owned_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|a| a.to_string()).collect()
}
