//! Output Sinks
//!
//! The rendering seam between the engine and its host. The host supplies one
//! `LineRenderer` primitive; sessions speak through an `OutputSink`, of which
//! two stock variants exist: a transient overlay (action-bar style) and a
//! persistent chat log. Sinks are stateless with respect to sessions and can
//! be shared freely.

use std::rc::Rc;

use crate::Ticks;

// ============================================================================
// Channel
// ============================================================================

/// Rendering channel for a line of dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputChannel {
    /// Transient on-screen overlay; the line disappears after its hold time.
    Overlay,
    /// Persistent chat log entry.
    Chat,
}

impl OutputChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputChannel::Overlay => "overlay",
            OutputChannel::Chat => "chat",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "overlay" | "screen" => Some(OutputChannel::Overlay),
            "chat" | "log" => Some(OutputChannel::Chat),
            _ => None,
        }
    }
}

// ============================================================================
// Host primitive
// ============================================================================

/// The single "render text to a user" primitive the engine consumes from its
/// environment. Must not block; the scheduler is cooperative.
pub trait LineRenderer {
    /// Display `text` to `user` on `channel`, held for `hold_ticks` ticks.
    fn render(&self, user: &str, channel: OutputChannel, hold_ticks: Ticks, text: &str);
}

// ============================================================================
// Sinks
// ============================================================================

/// A rendering channel a session speaks through. Sessions default to the
/// overlay sink and may be switched before or during playback; the switch
/// applies to subsequently executed talk actions only.
pub trait OutputSink {
    fn say(&self, user: &str, hold_ticks: Ticks, text: &str);
}

/// Stock sink: transient overlay.
pub struct OverlaySink {
    renderer: Rc<dyn LineRenderer>,
}

impl OverlaySink {
    pub fn new(renderer: Rc<dyn LineRenderer>) -> Self {
        Self { renderer }
    }
}

impl OutputSink for OverlaySink {
    fn say(&self, user: &str, hold_ticks: Ticks, text: &str) {
        self.renderer.render(user, OutputChannel::Overlay, hold_ticks, text);
    }
}

/// Stock sink: persistent chat log.
pub struct ChatSink {
    renderer: Rc<dyn LineRenderer>,
}

impl ChatSink {
    pub fn new(renderer: Rc<dyn LineRenderer>) -> Self {
        Self { renderer }
    }
}

impl OutputSink for ChatSink {
    fn say(&self, user: &str, hold_ticks: Ticks, text: &str) {
        self.renderer.render(user, OutputChannel::Chat, hold_ticks, text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::TestRenderer;

    #[test]
    fn test_channel_parsing() {
        assert_eq!(OutputChannel::from_str("overlay"), Some(OutputChannel::Overlay));
        assert_eq!(OutputChannel::from_str("chat"), Some(OutputChannel::Chat));
        assert_eq!(OutputChannel::from_str("LOG"), Some(OutputChannel::Chat));
        assert_eq!(OutputChannel::from_str("smoke"), None);
    }

    #[test]
    fn test_stock_sinks_pick_their_channel() {
        let renderer = Rc::new(TestRenderer::new());

        let overlay = OverlaySink::new(renderer.clone());
        overlay.say("u1", 3, "hello");

        let chat = ChatSink::new(renderer.clone());
        chat.say("u1", 0, "logged");

        let lines = renderer.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].channel, OutputChannel::Overlay);
        assert_eq!(lines[0].hold_ticks, 3);
        assert_eq!(lines[1].channel, OutputChannel::Chat);
        assert_eq!(lines[1].text, "logged");
    }
}
