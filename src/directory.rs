//! Session directory: the derived session list plus open/active bookkeeping.

use std::collections::HashSet;
use std::path::Path;

use crate::session::{derive_sessions, Project, ScratchTerminal, Session, SessionId};

/// Tracks which sessions exist, which are open, and which one is active.
#[derive(Clone, Debug, Default)]
pub struct SessionDirectory {
    /// Derived sessions, sorted by `order`.
    sessions: Vec<Session>,
    /// Open session ids.
    open: HashSet<SessionId>,
    /// Currently active session.
    active: Option<SessionId>,
    /// Session that was active before the current one.
    previous: Option<SessionId>,
}

impl SessionDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the session list from provider data.
    ///
    /// Open, active and previous ids that no longer name a session are
    /// dropped. If the active session vanished, a replacement is activated
    /// the same way [`close`](Self::close) picks one. Returns the ids that
    /// disappeared.
    pub fn recompute(
        &mut self,
        scratches: &[ScratchTerminal],
        projects: &[Project],
        home_dir: &Path,
    ) -> Vec<SessionId> {
        let sessions = derive_sessions(scratches, projects, home_dir);
        let known: HashSet<&SessionId> = sessions.iter().map(|s| &s.id).collect();

        let removed: Vec<SessionId> = self
            .sessions
            .iter()
            .filter(|s| !known.contains(&s.id))
            .map(|s| s.id.clone())
            .collect();

        self.open.retain(|id| known.contains(id));
        if self.previous.as_ref().is_some_and(|id| !known.contains(id)) {
            self.previous = None;
        }
        let active_vanished = self.active.as_ref().is_some_and(|id| !known.contains(id));

        self.sessions = sessions;

        if active_vanished {
            self.active = None;
            self.activate_replacement();
        }

        removed
    }

    /// All sessions in order.
    #[must_use]
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Look up a session by id.
    #[must_use]
    pub fn get(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.iter().find(|s| &s.id == id)
    }

    /// Check if a session with this id exists.
    #[must_use]
    pub fn contains(&self, id: &SessionId) -> bool {
        self.get(id).is_some()
    }

    /// Check if a session is open.
    #[must_use]
    pub fn is_open(&self, id: &SessionId) -> bool {
        self.open.contains(id)
    }

    /// Currently active session id.
    #[must_use]
    pub fn active(&self) -> Option<&SessionId> {
        self.active.as_ref()
    }

    /// Check if `id` is the active session.
    #[must_use]
    pub fn is_active(&self, id: &SessionId) -> bool {
        self.active.as_ref() == Some(id)
    }

    /// Session that was active before the current one.
    #[must_use]
    pub fn previous_active(&self) -> Option<&SessionId> {
        self.previous.as_ref()
    }

    /// Open sessions in order.
    #[must_use]
    pub fn open_sessions(&self) -> Vec<&Session> {
        self.sessions
            .iter()
            .filter(|s| self.open.contains(&s.id))
            .collect()
    }

    /// Set or clear the active session.
    ///
    /// Activating a session also opens it. Switching from one session to a
    /// different one remembers the old one as previous; re-activating the
    /// current session or clearing leaves previous untouched. Unknown ids
    /// are ignored.
    pub fn set_active(&mut self, id: Option<&SessionId>) {
        let Some(id) = id else {
            self.active = None;
            return;
        };
        if !self.contains(id) {
            return;
        }

        self.open.insert(id.clone());
        if let Some(current) = self.active.take() {
            if &current != id {
                self.previous = Some(current);
            }
        }
        self.active = Some(id.clone());
    }

    /// Mark a session as open.
    pub fn open(&mut self, id: &SessionId) {
        if self.contains(id) {
            self.open.insert(id.clone());
        }
    }

    /// Close a session.
    ///
    /// Closing the active session activates another open one: the previously
    /// active session if it is still open, otherwise the last open session.
    /// Returns the newly activated session, if any.
    pub fn close(&mut self, id: &SessionId) -> Option<SessionId> {
        if !self.open.remove(id) {
            return None;
        }
        if !self.is_active(id) {
            return None;
        }

        self.active = None;
        self.activate_replacement()
    }

    fn activate_replacement(&mut self) -> Option<SessionId> {
        let replacement = self
            .previous
            .clone()
            .filter(|id| self.open.contains(id))
            .or_else(|| self.open_sessions().last().map(|s| s.id.clone()))?;

        self.set_active(Some(&replacement));
        Some(replacement)
    }

    /// Next open session after `current`, wrapping around.
    ///
    /// Without a (known) current session, returns the first open one.
    #[must_use]
    pub fn next(&self, current: Option<&SessionId>) -> Option<&Session> {
        let open = self.open_sessions();
        let Some(current) = current.and_then(|id| self.get(id)) else {
            return open.first().copied();
        };

        open.iter()
            .find(|s| s.order > current.order)
            .or_else(|| open.first())
            .copied()
    }

    /// Previous open session before `current`, wrapping around.
    ///
    /// Without a (known) current session, returns the last open one.
    #[must_use]
    pub fn previous(&self, current: Option<&SessionId>) -> Option<&Session> {
        let open = self.open_sessions();
        let Some(current) = current.and_then(|id| self.get(id)) else {
            return open.last().copied();
        };

        open.iter()
            .rev()
            .find(|s| s.order < current.order)
            .or_else(|| open.last())
            .copied()
    }

    /// 1-based lookup into the open sessions.
    #[must_use]
    pub fn by_index(&self, n: usize) -> Option<&Session> {
        let index = n.checked_sub(1)?;
        self.open_sessions().get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::fixtures::{project, scratch};

    fn id(s: &str) -> SessionId {
        SessionId::new(s)
    }

    fn directory() -> SessionDirectory {
        let mut directory = SessionDirectory::new();
        directory.recompute(
            &[scratch("a", None), scratch("b", None)],
            &[project("p", &["w"])],
            Path::new("/home/me"),
        );
        directory
    }

    fn name(session: Option<&Session>) -> Option<&str> {
        session.map(|s| s.id.as_str())
    }

    #[test]
    fn test_set_active_opens_and_tracks_previous() {
        let mut dir = directory();

        dir.set_active(Some(&id("a")));
        assert!(dir.is_open(&id("a")));
        assert_eq!(dir.previous_active(), None);

        dir.set_active(Some(&id("b")));
        assert_eq!(dir.previous_active(), Some(&id("a")));

        // Re-activating the same id keeps previous.
        dir.set_active(Some(&id("b")));
        assert_eq!(dir.previous_active(), Some(&id("a")));

        // Clearing keeps previous, and the next activation does not record null.
        dir.set_active(None);
        dir.set_active(Some(&id("p")));
        assert_eq!(dir.previous_active(), Some(&id("a")));
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let mut dir = directory();
        dir.set_active(Some(&id("a")));

        dir.set_active(Some(&id("nope")));
        dir.open(&id("nope"));

        assert_eq!(dir.active(), Some(&id("a")));
        assert!(!dir.is_open(&id("nope")));
        assert_eq!(dir.close(&id("nope")), None);
    }

    #[test]
    fn test_close_active_picks_previous() {
        let mut dir = directory();
        dir.open(&id("w"));
        dir.set_active(Some(&id("a")));
        dir.set_active(Some(&id("b")));

        assert_eq!(dir.close(&id("b")), Some(id("a")));
        assert_eq!(dir.active(), Some(&id("a")));
    }

    #[test]
    fn test_close_active_falls_back_to_last_open() {
        let mut dir = directory();
        dir.open(&id("a"));
        dir.open(&id("w"));
        dir.set_active(Some(&id("p")));

        assert_eq!(dir.close(&id("p")), Some(id("w")));
        assert_eq!(dir.active(), Some(&id("w")));
    }

    #[test]
    fn test_close_last_session_clears_active() {
        let mut dir = directory();
        dir.set_active(Some(&id("a")));

        assert_eq!(dir.close(&id("a")), None);
        assert_eq!(dir.active(), None);
        assert!(dir.open_sessions().is_empty());
    }

    #[test]
    fn test_close_inactive_keeps_active() {
        let mut dir = directory();
        dir.open(&id("b"));
        dir.set_active(Some(&id("a")));

        assert_eq!(dir.close(&id("b")), None);
        assert_eq!(dir.active(), Some(&id("a")));
    }

    #[test]
    fn test_next_previous_cycle() {
        let mut dir = directory();
        for s in ["a", "p", "w"] {
            dir.open(&id(s));
        }

        assert_eq!(name(dir.next(None)), Some("a"));
        assert_eq!(name(dir.previous(None)), Some("w"));
        assert_eq!(name(dir.next(Some(&id("a")))), Some("p"));
        assert_eq!(name(dir.next(Some(&id("w")))), Some("a"));
        assert_eq!(name(dir.previous(Some(&id("a")))), Some("w"));

        // "b" is closed: traversal still positions it by order.
        assert_eq!(name(dir.next(Some(&id("b")))), Some("p"));
        assert_eq!(name(dir.previous(Some(&id("b")))), Some("a"));
    }

    #[test]
    fn test_next_and_previous_are_inverse() {
        let mut dir = directory();
        for s in ["a", "b", "w"] {
            dir.open(&id(s));
        }

        for s in ["a", "b", "w"] {
            let next = dir.next(Some(&id(s))).map(|n| n.id.clone());
            assert_eq!(name(dir.previous(next.as_ref())), Some(s));
        }
    }

    #[test]
    fn test_traversal_edge_counts() {
        let mut dir = directory();
        assert!(dir.next(None).is_none());
        assert!(dir.previous(Some(&id("a"))).is_none());

        dir.open(&id("b"));
        assert_eq!(name(dir.next(Some(&id("b")))), Some("b"));
        assert_eq!(name(dir.previous(Some(&id("b")))), Some("b"));
        assert_eq!(name(dir.next(None)), Some("b"));
    }

    #[test]
    fn test_by_index() {
        let mut dir = directory();
        dir.open(&id("w"));
        dir.open(&id("a"));

        assert_eq!(name(dir.by_index(0)), None);
        assert_eq!(name(dir.by_index(1)), Some("a"));
        assert_eq!(name(dir.by_index(2)), Some("w"));
        assert_eq!(name(dir.by_index(3)), None);
    }

    #[test]
    fn test_recompute_keeps_identity_and_prunes() {
        let mut dir = directory();
        dir.open(&id("a"));
        dir.set_active(Some(&id("w")));

        let removed = dir.recompute(&[scratch("a", None)], &[], Path::new("/home/me"));

        assert_eq!(removed, vec![id("b"), id("p"), id("w")]);
        assert!(dir.is_open(&id("a")));
        assert_eq!(dir.active(), Some(&id("a")));
        assert_eq!(dir.open_sessions().len(), 1);
    }
}
