//! Shared test fixtures: a renderer that captures lines and a user directory
//! with togglable presence.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::Ticks;
use crate::engine::{DialogEngine, UserDirectory};
use crate::output::{LineRenderer, OutputChannel};

#[derive(Debug, Clone)]
pub(crate) struct RenderedLine {
    pub user: String,
    pub channel: OutputChannel,
    pub hold_ticks: Ticks,
    pub text: String,
}

/// Captures every rendered line for assertions.
#[derive(Default)]
pub(crate) struct TestRenderer {
    lines: RefCell<Vec<RenderedLine>>,
}

impl TestRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<RenderedLine> {
        self.lines.borrow().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.lines.borrow().iter().map(|l| l.text.clone()).collect()
    }
}

impl LineRenderer for TestRenderer {
    fn render(&self, user: &str, channel: OutputChannel, hold_ticks: Ticks, text: &str) {
        self.lines.borrow_mut().push(RenderedLine {
            user: user.to_string(),
            channel,
            hold_ticks,
            text: text.to_string(),
        });
    }
}

/// Everyone is online unless explicitly marked offline.
#[derive(Default)]
pub(crate) struct TestDirectory {
    offline: RefCell<HashSet<String>>,
    display_names: RefCell<HashMap<String, String>>,
}

impl TestDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, user: &str) {
        self.offline.borrow_mut().insert(user.to_string());
    }

    pub fn set_display_name(&self, user: &str, name: &str) {
        self.display_names.borrow_mut().insert(user.to_string(), name.to_string());
    }
}

impl UserDirectory for TestDirectory {
    fn is_online(&self, user: &str) -> bool {
        !self.offline.borrow().contains(user)
    }

    fn display_name(&self, user: &str) -> String {
        self.display_names
            .borrow()
            .get(user)
            .cloned()
            .unwrap_or_else(|| user.to_string())
    }
}

/// Engine over fresh test fixtures, fixtures returned for inspection.
pub(crate) fn test_engine_parts() -> (DialogEngine, Rc<TestRenderer>, Rc<TestDirectory>) {
    let renderer = Rc::new(TestRenderer::new());
    let directory = Rc::new(TestDirectory::new());
    let engine = DialogEngine::new(renderer.clone(), directory.clone());
    (engine, renderer, directory)
}

/// Engine over fresh test fixtures when the test doesn't inspect them.
pub(crate) fn test_engine() -> DialogEngine {
    test_engine_parts().0
}

/// A counter cell and a subscriber closure that increments it.
pub(crate) fn counter() -> (Rc<Cell<u32>>, impl Fn() + 'static) {
    let count = Rc::new(Cell::new(0u32));
    let handle = count.clone();
    (count, move || handle.set(handle.get() + 1))
}
