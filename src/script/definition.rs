//! Dialog Script Definitions
//!
//! These structures are deserialized from TOML script files and resolved into
//! validated `DialogScript` values.

use serde::Deserialize;

use crate::Ticks;
use crate::engine::DialogEngine;
use crate::error::DialogError;
use crate::output::OutputChannel;
use crate::session::DialogSession;

/// A dialog script file as it appears on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct RawScriptFile {
    pub script: RawScript,
}

/// Raw script data as it appears in TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct RawScript {
    pub id: String,
    /// Speaker display name for NPC lines.
    pub speaker: Option<String>,
    /// Rendering channel: "overlay" (default) or "chat".
    pub output: Option<String>,
    /// Trailing pad ticks applied at start.
    #[serde(default)]
    pub pad: Ticks,
    #[serde(default)]
    pub steps: Vec<RawStep>,
}

/// Raw step as it appears in TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct RawStep {
    #[serde(rename = "type")]
    pub step_type: String,
    /// Read time in ticks (hold after the step executes).
    #[serde(default)]
    pub ticks: Ticks,
    /// Single line of text for talk steps.
    pub text: Option<String>,
    /// Multi-line convenience: one action per entry, same read time each.
    #[serde(default)]
    pub lines: Vec<String>,
    /// Positional arguments substituted into `{0}`, `{1}`, ...
    #[serde(default)]
    pub args: Vec<String>,
}

// ============================================================================
// Resolved Script Structures (after parsing)
// ============================================================================

/// Step kinds supported by declarative scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// A line spoken by the script's speaker.
    Npc,
    /// A line attributed to the user the session is played to.
    User,
    /// Silence for the step's tick count.
    Pause,
}

impl StepKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "npc" | "npc_line" | "say" => Some(StepKind::Npc),
            "user" | "user_line" | "reply" => Some(StepKind::User),
            "pause" | "wait" => Some(StepKind::Pause),
            _ => None,
        }
    }
}

/// A resolved script step. Talk steps carry one or more lines; each line
/// becomes its own action with the same read time.
#[derive(Debug, Clone)]
pub struct ScriptStep {
    pub kind: StepKind,
    pub ticks: Ticks,
    pub lines: Vec<String>,
    pub args: Vec<String>,
}

impl ScriptStep {
    fn from_raw(script_id: &str, index: usize, raw: &RawStep) -> Result<Self, DialogError> {
        let kind = StepKind::from_str(&raw.step_type).ok_or_else(|| DialogError::InvalidScript {
            id: script_id.to_string(),
            reason: format!("unknown step type '{}' at index {}", raw.step_type, index),
        })?;

        let mut lines = Vec::new();
        if let Some(text) = &raw.text {
            lines.push(text.clone());
        }
        lines.extend(raw.lines.iter().cloned());

        if kind != StepKind::Pause && lines.is_empty() {
            return Err(DialogError::InvalidScript {
                id: script_id.to_string(),
                reason: format!("talk step at index {index} has no text"),
            });
        }

        Ok(Self { kind, ticks: raw.ticks, lines, args: raw.args.clone() })
    }
}

/// A fully resolved dialog script.
#[derive(Debug, Clone)]
pub struct DialogScript {
    pub id: String,
    pub speaker: Option<String>,
    pub channel: Option<OutputChannel>,
    pub pad: Ticks,
    pub steps: Vec<ScriptStep>,
}

impl DialogScript {
    /// Create a script from raw TOML data, validating step kinds and text.
    pub fn from_raw(raw: &RawScript) -> Result<Self, DialogError> {
        if raw.id.is_empty() {
            return Err(DialogError::InvalidScript {
                id: "<unnamed>".to_string(),
                reason: "script id is empty".to_string(),
            });
        }

        let channel = match &raw.output {
            None => None,
            Some(name) => Some(OutputChannel::from_str(name).ok_or_else(|| {
                DialogError::InvalidScript {
                    id: raw.id.clone(),
                    reason: format!("unknown output channel '{name}'"),
                }
            })?),
        };

        let steps = raw
            .steps
            .iter()
            .enumerate()
            .map(|(i, s)| ScriptStep::from_raw(&raw.id, i, s))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: raw.id.clone(),
            speaker: raw.speaker.clone(),
            channel,
            pad: raw.pad,
            steps,
        })
    }

    /// Author a fresh session from this script. The caller still decides when
    /// to `start` it and may append further actions or subscribers first.
    pub fn instantiate(&self, engine: &DialogEngine) -> DialogSession {
        let session = engine.session();

        if let Some(speaker) = &self.speaker {
            session.set_speaker_name(speaker.clone());
        }
        match self.channel {
            Some(OutputChannel::Chat) => {
                session.set_chat_output();
            }
            Some(OutputChannel::Overlay) | None => {}
        }

        for step in &self.steps {
            match step.kind {
                StepKind::Pause => {
                    session.pause(step.ticks);
                }
                StepKind::Npc => {
                    let args: Vec<&str> = step.args.iter().map(String::as_str).collect();
                    for line in &step.lines {
                        session.npc_line_args(step.ticks, line.clone(), &args);
                    }
                }
                StepKind::User => {
                    let args: Vec<&str> = step.args.iter().map(String::as_str).collect();
                    for line in &step.lines {
                        session.user_line_args(step.ticks, line.clone(), &args);
                    }
                }
            }
        }

        if self.pad > 0 {
            session.pad(self.pad);
        }

        session
    }

    /// Number of actions `instantiate` will author (lines expand).
    pub fn action_count(&self) -> usize {
        self.steps
            .iter()
            .map(|s| match s.kind {
                StepKind::Pause => 1,
                _ => s.lines.len(),
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> RawScriptFile {
        toml::from_str(toml_str).unwrap()
    }

    const GREETING: &str = r#"
[script]
id = "elder_greeting"
speaker = "Village Elder"
output = "chat"
pad = 10

[[script.steps]]
type = "npc"
ticks = 40
text = "Welcome to {0}."
args = ["Riverton"]

[[script.steps]]
type = "pause"
ticks = 20

[[script.steps]]
type = "npc"
ticks = 30
lines = ["We have been expecting you.", "Make yourself at home."]

[[script.steps]]
type = "user"
ticks = 20
text = "Thank you."
"#;

    #[test]
    fn test_step_kind_parsing() {
        assert_eq!(StepKind::from_str("npc"), Some(StepKind::Npc));
        assert_eq!(StepKind::from_str("user_line"), Some(StepKind::User));
        assert_eq!(StepKind::from_str("WAIT"), Some(StepKind::Pause));
        assert_eq!(StepKind::from_str("emote"), None);
    }

    #[test]
    fn test_resolve_script() {
        let raw = parse(GREETING);
        let script = DialogScript::from_raw(&raw.script).unwrap();

        assert_eq!(script.id, "elder_greeting");
        assert_eq!(script.speaker.as_deref(), Some("Village Elder"));
        assert_eq!(script.channel, Some(OutputChannel::Chat));
        assert_eq!(script.pad, 10);
        assert_eq!(script.steps.len(), 4);
        // One pause plus four talk lines across the other steps.
        assert_eq!(script.action_count(), 5);
        assert_eq!(script.steps[0].args, vec!["Riverton".to_string()]);
    }

    #[test]
    fn test_unknown_step_type_rejected() {
        let raw = parse(
            r#"
[script]
id = "bad"

[[script.steps]]
type = "emote"
text = "waves"
"#,
        );
        let err = DialogScript::from_raw(&raw.script).unwrap_err();
        assert!(matches!(err, DialogError::InvalidScript { .. }));
        assert!(err.to_string().contains("unknown step type"));
    }

    #[test]
    fn test_talk_step_without_text_rejected() {
        let raw = parse(
            r#"
[script]
id = "bad"

[[script.steps]]
type = "npc"
ticks = 10
"#,
        );
        let err = DialogScript::from_raw(&raw.script).unwrap_err();
        assert!(err.to_string().contains("has no text"));
    }

    #[test]
    fn test_instantiate_authors_expanded_actions() {
        use crate::testutil::test_engine;

        let raw = parse(GREETING);
        let script = DialogScript::from_raw(&raw.script).unwrap();

        let engine = test_engine();
        let session = script.instantiate(&engine);

        assert_eq!(session.remaining_actions(), script.action_count());
        assert_eq!(session.pad_ticks_remaining(), 10);
        assert!(!session.is_running());
    }
}
