//! Tabs: named units of work inside a session.

use uuid::Uuid;

use crate::pane::PaneKind;
use crate::session::{SessionId, SessionKind};

/// Unique identifier for a tab.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct TabId(pub String);

impl TabId {
    /// Create a tab id from anything string-like.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A tab of a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tab {
    /// Tab ID.
    pub id: TabId,
    /// Owning session.
    pub session_id: SessionId,
    /// Display name.
    pub name: String,
    /// The first tab of a session runs the session's own command.
    pub primary: bool,
}

impl Tab {
    /// Kind of process this tab's first pane runs.
    ///
    /// The primary tab runs the session's command; every other tab gets a
    /// plain shell.
    #[must_use]
    pub fn pane_kind(&self, session_kind: SessionKind) -> PaneKind {
        if self.primary {
            PaneKind::primary_for(session_kind)
        } else {
            PaneKind::Shell
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tab(primary: bool) -> Tab {
        Tab {
            id: TabId::generate(),
            session_id: SessionId::new("s"),
            name: "t".to_string(),
            primary,
        }
    }

    #[test]
    fn test_primary_tab_runs_session_command() {
        assert_eq!(tab(true).pane_kind(SessionKind::Worktree), PaneKind::Main);
        assert_eq!(tab(true).pane_kind(SessionKind::Project), PaneKind::Project);
        assert_eq!(tab(true).pane_kind(SessionKind::Scratch), PaneKind::Scratch);
    }

    #[test]
    fn test_secondary_tab_runs_shell() {
        assert_eq!(tab(false).pane_kind(SessionKind::Worktree), PaneKind::Shell);
    }

    #[test]
    fn test_generated_ids_differ() {
        assert_ne!(TabId::generate(), TabId::generate());
    }
}
