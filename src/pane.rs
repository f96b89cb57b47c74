//! Pane types shared by the layout engine and the PTY bridge.

use std::path::PathBuf;

use serde::Deserialize;

use crate::session::SessionKind;

/// Unique identifier for a pane.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct PaneId(pub u64);

impl std::fmt::Display for PaneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a backing PTY process, as handed out by the spawn service.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct PtyId(pub String);

impl PtyId {
    /// Create a PTY id from anything string-like.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PtyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pane dimensions in rows and columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct PaneSize {
    /// Number of rows.
    pub rows: u16,
    /// Number of columns.
    pub cols: u16,
}

impl PaneSize {
    /// Create a new pane size.
    #[must_use]
    pub fn new(rows: u16, cols: u16) -> Self {
        Self { rows, cols }
    }
}

impl Default for PaneSize {
    fn default() -> Self {
        Self::new(24, 80)
    }
}

/// The kind of process a pane runs.
///
/// Mirrors [`SessionKind`] (a worktree's own process is its `Main` command)
/// plus a plain login shell for secondary tabs and ad-hoc splits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PaneKind {
    /// The configured main command of a worktree.
    Main,
    /// The configured command run at a project root.
    Project,
    /// A scratch terminal.
    Scratch,
    /// A login shell.
    Shell,
}

impl PaneKind {
    /// Kind of the primary pane for a session of the given kind.
    #[must_use]
    pub fn primary_for(kind: SessionKind) -> Self {
        match kind {
            SessionKind::Scratch => Self::Scratch,
            SessionKind::Project => Self::Project,
            SessionKind::Worktree => Self::Main,
        }
    }
}

/// What a new tab's first pane should run and where.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaneConfig {
    /// Process kind.
    pub kind: PaneKind,
    /// Working directory to spawn into.
    pub directory: PathBuf,
}

impl PaneConfig {
    /// Create a pane config.
    #[must_use]
    pub fn new(kind: PaneKind, directory: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            directory: directory.into(),
        }
    }
}

/// A pane inside a tab.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pane {
    /// Pane ID.
    pub id: PaneId,
    /// Process kind this pane runs.
    pub kind: PaneKind,
    /// Working directory.
    pub directory: PathBuf,
    /// Backing process, once its spawn has been confirmed.
    pub pty_id: Option<PtyId>,
}

impl Pane {
    pub(crate) fn new(id: PaneId, config: PaneConfig) -> Self {
        Self {
            id,
            kind: config.kind,
            directory: config.directory,
            pty_id: None,
        }
    }

    /// Returns true once a backing process has been recorded.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.pty_id.is_some()
    }
}
