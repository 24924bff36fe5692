//! Scheduler
//!
//! Insertion-ordered set of currently running sessions. The engine advances a
//! snapshot copy of this set each tick: sessions added mid-tick (a callback
//! starting another dialog) are registered immediately but not advanced until
//! the next tick, and removals mid-tick cannot corrupt the iteration.

use crate::session::DialogSession;

#[derive(Default)]
pub struct Scheduler {
    active: Vec<DialogSession>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self { active: Vec::new() }
    }

    /// Register a session for per-tick advancement. Idempotent per session
    /// object.
    pub fn add(&mut self, session: DialogSession) {
        if !self.contains(&session) {
            self.active.push(session);
        }
    }

    /// Drop a session from the active set. Idempotent.
    pub fn remove(&mut self, session: &DialogSession) {
        self.active.retain(|s| !s.same_session(session));
    }

    pub fn contains(&self, session: &DialogSession) -> bool {
        self.active.iter().any(|s| s.same_session(session))
    }

    /// Stable copy of the active set, in insertion order. The advance loop
    /// iterates this copy, never the live set.
    pub fn snapshot(&self) -> Vec<DialogSession> {
        self.active.clone()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::test_engine;

    #[test]
    fn test_add_is_idempotent_per_session() {
        let engine = test_engine();
        let mut scheduler = Scheduler::new();

        let session = engine.session();
        scheduler.add(session.clone());
        scheduler.add(session.clone());
        assert_eq!(scheduler.len(), 1);

        scheduler.remove(&session);
        scheduler.remove(&session);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_snapshot_keeps_insertion_order_and_is_detached() {
        let engine = test_engine();
        let mut scheduler = Scheduler::new();

        let a = engine.session();
        let b = engine.session();
        scheduler.add(a.clone());
        scheduler.add(b.clone());

        let snapshot = scheduler.snapshot();
        scheduler.remove(&a);

        // The snapshot is unaffected by mutation of the live set.
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot[0].same_session(&a));
        assert!(snapshot[1].same_session(&b));
        assert_eq!(scheduler.len(), 1);
    }
}
