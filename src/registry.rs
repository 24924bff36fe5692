//! Session Registry
//!
//! Maps a user identity to its single currently-active dialog session. The
//! at-most-one-session-per-user invariant lives here: installing a new
//! session displaces the old one, and removal is compare-and-remove so a
//! stale cleanup never evicts a replacement session.

use std::collections::HashMap;

use crate::session::DialogSession;

#[derive(Default)]
pub struct SessionRegistry {
    sessions: HashMap<String, DialogSession>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self { sessions: HashMap::new() }
    }

    /// The session currently bound to `user`, if any.
    pub fn get(&self, user: &str) -> Option<DialogSession> {
        self.sessions.get(user).cloned()
    }

    /// Install `session` as the active session for `user`, returning the
    /// session it displaced. The caller is responsible for ending the
    /// displaced session first.
    pub fn set(&mut self, user: &str, session: DialogSession) -> Option<DialogSession> {
        self.sessions.insert(user.to_string(), session)
    }

    /// Remove the entry for `user` only if `session` is still the registered
    /// one. Returns true if an entry was removed.
    pub fn remove(&mut self, user: &str, session: &DialogSession) -> bool {
        match self.sessions.get(user) {
            Some(current) if current.same_session(session) => {
                self.sessions.remove(user);
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::test_engine;

    #[test]
    fn test_set_returns_displaced_session() {
        let engine = test_engine();
        let mut registry = SessionRegistry::new();

        let first = engine.session();
        let second = engine.session();

        assert!(registry.set("u1", first.clone()).is_none());
        let displaced = registry.set("u1", second.clone()).unwrap();
        assert!(displaced.same_session(&first));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_compare_and_remove_ignores_stale_session() {
        let engine = test_engine();
        let mut registry = SessionRegistry::new();

        let old = engine.session();
        let replacement = engine.session();

        registry.set("u1", old.clone());
        registry.set("u1", replacement.clone());

        // A late cleanup from the displaced session must not evict the
        // replacement.
        assert!(!registry.remove("u1", &old));
        assert!(registry.get("u1").unwrap().same_session(&replacement));

        assert!(registry.remove("u1", &replacement));
        assert!(registry.is_empty());
    }
}
