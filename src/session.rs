//! Sessions and their derivation from provider data.
//!
//! A [`Session`] is never edited in place. The directory rebuilds the whole
//! ordered list from the provider's scratch terminals and projects whenever
//! either changes, see [`derive_sessions`].

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Opaque, stable identifier of a session.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Create a session id from anything string-like.
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

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// What a session is a place of work for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionKind {
    /// Ad-hoc terminal not tied to a repository.
    Scratch,
    /// Checked-out project, rooted at the repository.
    Project,
    /// Git worktree nested under a project.
    Worktree,
}

/// A logical place of work.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    /// Stable identifier.
    pub id: SessionId,
    /// Session kind.
    pub kind: SessionKind,
    /// Display label.
    pub name: String,
    /// Working directory.
    pub path: PathBuf,
    /// Position in the derived list.
    pub order: usize,
    /// Owning project, for worktree sessions.
    pub project_id: Option<SessionId>,
    /// Checked-out branch, for worktree sessions.
    pub branch: Option<String>,
}

/// A scratch terminal as recorded by the provider.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ScratchTerminal {
    /// Identifier.
    pub id: SessionId,
    /// Display label.
    pub name: String,
    /// Last known working directory.
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

/// A git worktree belonging to a project.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Worktree {
    /// Identifier.
    pub id: SessionId,
    /// Display label.
    pub name: String,
    /// Worktree root.
    pub path: PathBuf,
    /// Checked-out branch.
    pub branch: String,
}

/// A project as recorded by the provider.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Project {
    /// Identifier.
    pub id: SessionId,
    /// Display label.
    pub name: String,
    /// Repository root.
    pub path: PathBuf,
    /// Hidden projects produce no sessions at all.
    #[serde(default)]
    pub inactive: bool,
    /// Worktrees nested under this project.
    #[serde(default)]
    pub worktrees: Vec<Worktree>,
}

/// Build the ordered session list.
///
/// Scratch terminals come first, in provider order. Each active project
/// follows, immediately trailed by its worktrees. Inactive projects and their
/// worktrees are left out.
#[must_use]
pub fn derive_sessions(
    scratches: &[ScratchTerminal],
    projects: &[Project],
    home_dir: &Path,
) -> Vec<Session> {
    let mut sessions = Vec::with_capacity(scratches.len() + projects.len());

    for scratch in scratches {
        sessions.push(Session {
            id: scratch.id.clone(),
            kind: SessionKind::Scratch,
            name: scratch.name.clone(),
            path: scratch.cwd.clone().unwrap_or_else(|| home_dir.to_path_buf()),
            order: sessions.len(),
            project_id: None,
            branch: None,
        });
    }

    for project in projects.iter().filter(|p| !p.inactive) {
        sessions.push(Session {
            id: project.id.clone(),
            kind: SessionKind::Project,
            name: project.name.clone(),
            path: project.path.clone(),
            order: sessions.len(),
            project_id: None,
            branch: None,
        });

        for worktree in &project.worktrees {
            sessions.push(Session {
                id: worktree.id.clone(),
                kind: SessionKind::Worktree,
                name: worktree.name.clone(),
                path: worktree.path.clone(),
                order: sessions.len(),
                project_id: Some(project.id.clone()),
                branch: Some(worktree.branch.clone()),
            });
        }
    }

    sessions
}
