//! Demo driver: plays a short scripted exchange to a console renderer from a
//! 20 Hz tick loop, the same cadence a game server would drive the engine at.

use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use tracing::info;

use dialog_engine::{
    DialogEngine, LineRenderer, OutputChannel, ScriptRegistry, Ticks, UserDirectory,
};

const TICK_INTERVAL: Duration = Duration::from_millis(50); // 20 Hz

/// Renders dialog lines to stdout, tagged with their channel.
struct ConsoleRenderer;

impl LineRenderer for ConsoleRenderer {
    fn render(&self, user: &str, channel: OutputChannel, hold_ticks: Ticks, text: &str) {
        println!("[{}] to {user} (hold {hold_ticks}t): {text}", channel.as_str());
    }
}

/// Demo presence: every user is always reachable.
struct AlwaysOnline;

impl UserDirectory for AlwaysOnline {
    fn is_online(&self, _user: &str) -> bool {
        true
    }
}

// The engine is deliberately single-threaded, so the demo runs on a
// current-thread runtime and drives ticks from the main task.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dialog_engine=info".parse().unwrap()),
        )
        .init();

    let engine = DialogEngine::new(Rc::new(ConsoleRenderer), Rc::new(AlwaysOnline));

    // Load declarative scripts if a data directory is present.
    let mut scripts = ScriptRegistry::new(Path::new("data/dialogs"));
    match scripts.load_all() {
        Ok(count) if count > 0 => info!("{} dialog scripts available", count),
        Ok(_) => {}
        Err(e) => tracing::error!("Failed to load dialog scripts: {}", e),
    }

    // A coded scene: the fluent API is what quest and command layers use.
    engine
        .session()
        .set_speaker_name("Village Elder")
        .npc_line(40, "Welcome to Riverton, traveler.")
        .npc_line_args(40, "You are the {0} visitor this season.", &["third"])
        .pause(20)
        .user_line(30, "Glad to be here.")
        .run(|| info!("scene checkpoint reached"))
        .pad(20)
        .on_complete(|| info!("scene complete"))
        .start("demo-user");

    // Chain a scripted session after the first one, if any script loaded.
    if let Ok(follow_up) = scripts.instantiate("elder_greeting", &engine) {
        engine
            .session_for("demo-user")
            .expect("demo session just started")
            .on_complete(move || {
                // Started mid-tick; the scheduler picks it up next tick.
                follow_up.start("demo-user");
            });
    }

    let mut interval = tokio::time::interval(TICK_INTERVAL);
    loop {
        interval.tick().await;
        engine.tick();
        if engine.active_sessions() == 0 {
            break;
        }
    }

    info!("stage quiet after {} ticks", engine.current_tick());
}
