//! Workspace: sessions, their tabs and panes, and their indicators in one
//! place.
//!
//! The workspace owns no processes. Operations that tear panes down return
//! the PTY ids that were backing them so the caller can kill the matching
//! bridges.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::CoreConfig;
use crate::directory::SessionDirectory;
use crate::indicator::{ActivityIndicators, Indicator, IndicatorState, NotificationSink};
use crate::manager::PaneManager;
use crate::pane::{PaneConfig, PaneId, PtyId};
use crate::pty::SpawnRequest;
use crate::session::{Project, ScratchTerminal, SessionId};
use crate::tab::{Tab, TabId};

/// Composition root of the session core.
pub struct Workspace {
    config: CoreConfig,
    home_dir: PathBuf,
    directory: SessionDirectory,
    panes: PaneManager,
    /// Tabs of every open session, in creation order.
    tabs: Vec<Tab>,
    indicators: ActivityIndicators,
}

impl Workspace {
    /// Create an empty workspace.
    #[must_use]
    pub fn new(
        config: CoreConfig,
        home_dir: impl Into<PathBuf>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            config,
            home_dir: home_dir.into(),
            directory: SessionDirectory::new(),
            panes: PaneManager::new(),
            tabs: Vec::new(),
            indicators: ActivityIndicators::new(sink),
        }
    }

    /// Rebuild the session list from provider data.
    ///
    /// Tabs and indicator records of sessions that disappeared are dropped.
    /// Returns the PTY ids that were backing the dropped tabs.
    pub fn sync_sessions(
        &mut self,
        scratches: &[ScratchTerminal],
        projects: &[Project],
    ) -> Vec<PtyId> {
        let active_before = self.directory.active().cloned();
        let removed = self
            .directory
            .recompute(scratches, projects, &self.home_dir);

        let mut pty_ids = Vec::new();
        for session_id in &removed {
            pty_ids.extend(self.close_session_tabs(session_id));
        }

        let directory = &self.directory;
        self.indicators.retain(|id| directory.contains(id));
        self.note_activation(active_before.as_ref());

        if !removed.is_empty() {
            tracing::debug!(
                "Dropped {} vanished sessions ({} PTYs to kill)",
                removed.len(),
                pty_ids.len()
            );
        }
        pty_ids
    }

    /// Set or clear the active session.
    pub fn set_active(&mut self, id: Option<&SessionId>) {
        self.directory.set_active(id);
        if let Some(active) = self.directory.active().cloned() {
            self.indicators.on_activated(&active);
        }
    }

    /// Open a session, creating its primary tab if it has none.
    ///
    /// Returns the primary tab, or `None` for an unknown session.
    pub fn open_session(&mut self, id: &SessionId) -> Option<TabId> {
        let session = self.directory.get(id)?;
        let (session_kind, path) = (session.kind, session.path.clone());
        self.directory.open(id);

        if let Some(tab) = self.tabs.iter().find(|t| t.session_id == *id && t.primary) {
            return Some(tab.id.clone());
        }

        let tab = Tab {
            id: TabId::generate(),
            session_id: id.clone(),
            name: self.config.primary_tab_name.clone(),
            primary: true,
        };
        self.panes
            .init_tab(&tab.id, PaneConfig::new(tab.pane_kind(session_kind), path));
        tracing::debug!("Opened session {} with tab {}", id, tab.id);

        let tab_id = tab.id.clone();
        self.tabs.push(tab);
        Some(tab_id)
    }

    /// Add a shell tab to a session.
    ///
    /// Without a name the configured secondary tab name is used. Returns
    /// `None` for an unknown session.
    pub fn add_tab(&mut self, session_id: &SessionId, name: Option<&str>) -> Option<TabId> {
        let session = self.directory.get(session_id)?;
        let (session_kind, path) = (session.kind, session.path.clone());
        self.directory.open(session_id);

        let tab = Tab {
            id: TabId::generate(),
            session_id: session_id.clone(),
            name: name.map_or_else(|| self.config.secondary_tab_name.clone(), str::to_string),
            primary: false,
        };
        self.panes
            .init_tab(&tab.id, PaneConfig::new(tab.pane_kind(session_kind), path));

        let tab_id = tab.id.clone();
        self.tabs.push(tab);
        Some(tab_id)
    }

    /// Close one tab of a session and return the PTY ids it held.
    pub fn close_tab(&mut self, session_id: &SessionId, tab_id: &TabId) -> Vec<PtyId> {
        let Some(index) = self
            .tabs
            .iter()
            .position(|t| t.id == *tab_id && t.session_id == *session_id)
        else {
            return Vec::new();
        };

        self.tabs.remove(index);
        self.teardown_tab(tab_id)
    }

    /// Close a session with all its tabs and return the PTY ids they held.
    ///
    /// If the session was active, the directory's replacement becomes
    /// active and counts as activated.
    pub fn close_session(&mut self, id: &SessionId) -> Vec<PtyId> {
        let pty_ids = self.close_session_tabs(id);
        if let Some(replacement) = self.directory.close(id) {
            self.indicators.on_activated(&replacement);
        }
        pty_ids
    }

    fn close_session_tabs(&mut self, id: &SessionId) -> Vec<PtyId> {
        let (closing, kept): (Vec<Tab>, Vec<Tab>) = std::mem::take(&mut self.tabs)
            .into_iter()
            .partition(|t| t.session_id == *id);
        self.tabs = kept;

        closing
            .iter()
            .flat_map(|tab| self.teardown_tab(&tab.id))
            .collect()
    }

    fn teardown_tab(&mut self, tab_id: &TabId) -> Vec<PtyId> {
        let pty_ids = self.panes.tab_pty_ids(tab_id);
        self.panes.clear_tab(tab_id);
        pty_ids
    }

    /// Forget a process that exited on its own.
    ///
    /// Call this for every exit event on the bus. The pane stays in its tab
    /// without a PTY until a new spawn is recorded. Returns the pane that
    /// was backed by the process.
    pub fn on_pty_exit(&mut self, pty_id: &PtyId) -> Option<(TabId, PaneId)> {
        let released = self.panes.release_pty(pty_id)?;
        tracing::debug!("PTY {} of pane {} exited", pty_id, released.1);
        Some(released)
    }

    /// Close every tab of every session and return all PTY ids they held.
    ///
    /// Sessions stay known to the directory but are no longer open.
    pub fn shutdown(&mut self) -> Vec<PtyId> {
        let tabs = std::mem::take(&mut self.tabs);
        let pty_ids: Vec<PtyId> = tabs
            .iter()
            .flat_map(|tab| self.teardown_tab(&tab.id))
            .collect();

        let open: Vec<SessionId> = self
            .directory
            .open_sessions()
            .iter()
            .map(|s| s.id.clone())
            .collect();
        for id in &open {
            self.directory.close(id);
        }
        self.directory.set_active(None);

        tracing::debug!("Shut down {} tabs ({} PTYs to kill)", tabs.len(), pty_ids.len());
        pty_ids
    }

    /// A recompute may have swapped the active session.
    fn note_activation(&mut self, before: Option<&SessionId>) {
        let Some(active) = self.directory.active().cloned() else {
            return;
        };
        if before != Some(&active) {
            self.indicators.on_activated(&active);
        }
    }

    /// Forward a notification signal for a session.
    pub fn on_notification(&mut self, id: &SessionId, title: &str, body: &str) {
        let is_active = self.directory.is_active(id);
        let name = self
            .directory
            .get(id)
            .map_or_else(|| id.as_str().to_string(), |s| s.name.clone());
        self.indicators
            .on_notification(id, title, body, &name, is_active);
    }

    /// Forward a thinking started/stopped signal for a session.
    pub fn on_thinking_change(&mut self, id: &SessionId, is_thinking: bool) {
        let is_active = self.directory.is_active(id);
        self.indicators
            .on_thinking_change(id, is_thinking, is_active);
    }

    /// Glyph to show for a session.
    #[must_use]
    pub fn indicator(&self, id: &SessionId) -> Indicator {
        self.indicators.display(
            id,
            self.directory.is_active(id),
            self.config.idle_indicator,
        )
    }

    /// Raw indicator flags of a session.
    #[must_use]
    pub fn indicator_state(&self, id: &SessionId) -> IndicatorState {
        self.indicators.get(id)
    }

    /// What a pane's bridge should spawn.
    ///
    /// The target is always the owning session's id; the pane decides the
    /// process kind and directory.
    #[must_use]
    pub fn spawn_request_for(&self, tab_id: &TabId, pane_id: PaneId) -> Option<SpawnRequest> {
        let tab = self.tab(tab_id)?;
        let pane = self.panes.pane(tab_id, pane_id)?;
        Some(SpawnRequest::for_pane(
            pane.kind,
            tab.session_id.as_str(),
            None,
            Some(pane.directory.clone()),
            self.config.default_size,
        ))
    }

    /// The session directory.
    #[must_use]
    pub fn directory(&self) -> &SessionDirectory {
        &self.directory
    }

    /// Pane state of every tab.
    #[must_use]
    pub fn panes(&self) -> &PaneManager {
        &self.panes
    }

    /// Mutable pane state, for splits, focus and PTY bookkeeping.
    pub fn panes_mut(&mut self) -> &mut PaneManager {
        &mut self.panes
    }

    /// Look up a tab.
    #[must_use]
    pub fn tab(&self, tab_id: &TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == *tab_id)
    }

    /// Tabs of a session in creation order.
    #[must_use]
    pub fn tabs(&self, session_id: &SessionId) -> Vec<&Tab> {
        self.tabs
            .iter()
            .filter(|t| t.session_id == *session_id)
            .collect()
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("directory", &self.directory)
            .field("tabs", &self.tabs)
            .finish_non_exhaustive()
    }
}
