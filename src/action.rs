//! Dialog Actions
//!
//! An `Action` is one immutable scripted step of a dialog sequence: a spoken
//! line, a silent pause, or a callback. Its duration is the number of ticks
//! the session holds after executing it; execution itself is instantaneous.

use std::fmt;
use std::rc::Rc;

use crate::Ticks;
use crate::error::DialogError;
use crate::session::DialogSession;

/// Caller-supplied custom action. Failures are the owning session's problem:
/// an `Err` is logged and the session advances past the action.
pub trait DialogAction {
    /// Hold time in ticks after execution.
    fn duration(&self) -> Ticks {
        0
    }

    /// Perform the action's effect for the bound user.
    fn execute(&self, user: &str, session: &DialogSession) -> Result<(), DialogError>;
}

/// What an action does when it executes.
pub enum ActionKind {
    /// A line spoken by the session's speaker, rendered through the current
    /// output sink with the session's npc format.
    NpcLine { text: String, args: Vec<String> },
    /// A line attributed to the bound user, rendered with the user format.
    UserLine { text: String, args: Vec<String> },
    /// Silence for the action's duration.
    Pause,
    /// An arbitrary zero-argument callback.
    Callback(Rc<dyn Fn()>),
    /// A caller-supplied action object.
    Custom(Rc<dyn DialogAction>),
}

/// One scripted step with a fixed hold duration. Immutable once appended to a
/// session.
pub struct Action {
    duration: Ticks,
    kind: ActionKind,
}

impl Action {
    pub fn npc_line(duration: Ticks, text: impl Into<String>, args: Vec<String>) -> Self {
        Self { duration, kind: ActionKind::NpcLine { text: text.into(), args } }
    }

    pub fn user_line(duration: Ticks, text: impl Into<String>, args: Vec<String>) -> Self {
        Self { duration, kind: ActionKind::UserLine { text: text.into(), args } }
    }

    pub fn pause(duration: Ticks) -> Self {
        Self { duration, kind: ActionKind::Pause }
    }

    pub fn callback(f: Rc<dyn Fn()>) -> Self {
        Self { duration: 0, kind: ActionKind::Callback(f) }
    }

    pub fn custom(action: Rc<dyn DialogAction>) -> Self {
        Self { duration: action.duration(), kind: ActionKind::Custom(action) }
    }

    /// Hold time in ticks after this action executes.
    pub fn duration(&self) -> Ticks {
        self.duration
    }

    /// Execute the action's effect. Called by the session's per-tick advance
    /// with no internal borrows held, so the effect may freely call back into
    /// the session or the engine.
    pub(crate) fn execute(&self, user: &str, session: &DialogSession) -> Result<(), DialogError> {
        match &self.kind {
            ActionKind::NpcLine { text, args } => {
                session.say_npc_line(user, self.duration, text, args);
                Ok(())
            }
            ActionKind::UserLine { text, args } => {
                session.say_user_line(user, self.duration, text, args);
                Ok(())
            }
            ActionKind::Pause => Ok(()),
            ActionKind::Callback(f) => {
                f();
                Ok(())
            }
            ActionKind::Custom(action) => action.execute(user, session),
        }
    }

    fn kind_name(&self) -> &'static str {
        match &self.kind {
            ActionKind::NpcLine { .. } => "npc_line",
            ActionKind::UserLine { .. } => "user_line",
            ActionKind::Pause => "pause",
            ActionKind::Callback(_) => "callback",
            ActionKind::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("kind", &self.kind_name())
            .field("duration", &self.duration)
            .finish()
    }
}

/// Substitute positional `{0}`, `{1}`, ... placeholders in a line template.
/// Placeholders without a matching argument are left as-is.
pub(crate) fn fill_args(template: &str, args: &[String]) -> String {
    let mut out = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        out = out.replace(&format!("{{{i}}}"), arg);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_args() {
        let args = vec!["Aldos".to_string(), "three".to_string()];
        assert_eq!(
            fill_args("Greetings {0}, I have {1} tasks for you.", &args),
            "Greetings Aldos, I have three tasks for you."
        );
    }

    #[test]
    fn test_fill_args_missing_arg_left_intact() {
        assert_eq!(fill_args("Hello {0}", &[]), "Hello {0}");
    }

    #[test]
    fn test_fill_args_repeated_placeholder() {
        let args = vec!["echo".to_string()];
        assert_eq!(fill_args("{0} {0}", &args), "echo echo");
    }

    #[test]
    fn test_action_debug_names_kind() {
        let action = Action::pause(4);
        let dbg = format!("{:?}", action);
        assert!(dbg.contains("pause"));
        assert!(dbg.contains('4'));
    }
}
