//! Pane manager - per-tab split-pane bookkeeping.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use ratatui::layout::Rect;

use crate::layout::{Direction, FocusDirection, Layout, LayoutCalculator};
use crate::pane::{Pane, PaneConfig, PaneId, PtyId};
use crate::tab::TabId;

/// Panes of one tab.
#[derive(Debug)]
struct TabPanes {
    /// Panes in creation order.
    panes: Vec<Pane>,
    /// Split tree.
    layout: Layout,
    /// Focused pane.
    active: PaneId,
}

impl TabPanes {
    fn pane_mut(&mut self, pane_id: PaneId) -> Option<&mut Pane> {
        self.panes.iter_mut().find(|p| p.id == pane_id)
    }

    fn contains(&self, pane_id: PaneId) -> bool {
        self.panes.iter().any(|p| p.id == pane_id)
    }
}

/// Central manager for the panes of every open tab.
///
/// Every tab holds at least one pane and exactly one active pane. Unknown
/// tab or pane ids are ignored everywhere; teardown races hit them routinely.
#[derive(Debug)]
pub struct PaneManager {
    /// Pane state per tab.
    tabs: HashMap<TabId, TabPanes>,
    /// Next pane ID.
    next_id: AtomicU64,
}

impl PaneManager {
    /// Create an empty pane manager.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tabs: HashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    fn allocate_id(&self) -> PaneId {
        PaneId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Give a tab its first pane.
    ///
    /// Calling this again for a tab that already has panes changes nothing.
    /// Returns the tab's active pane.
    pub fn init_tab(&mut self, tab_id: &TabId, config: PaneConfig) -> PaneId {
        if let Some(tab) = self.tabs.get(tab_id) {
            return tab.active;
        }

        let pane_id = self.allocate_id();
        self.tabs.insert(
            tab_id.clone(),
            TabPanes {
                panes: vec![Pane::new(pane_id, config)],
                layout: Layout::single(pane_id),
                active: pane_id,
            },
        );
        tracing::debug!("Initialized tab {} with pane {}", tab_id, pane_id);
        pane_id
    }

    /// Split the active pane of a tab.
    ///
    /// The new pane runs the same kind of process in the same directory as
    /// the active pane. It has no PTY yet and does not take focus.
    pub fn split(&mut self, tab_id: &TabId, direction: Direction) -> Option<PaneId> {
        let pane_id = self.allocate_id();
        let tab = self.tabs.get_mut(tab_id)?;

        let source = tab.panes.iter().find(|p| p.id == tab.active)?;
        let config = PaneConfig::new(source.kind, source.directory.clone());

        tab.layout.split_pane(tab.active, direction, pane_id);
        tab.panes.push(Pane::new(pane_id, config));
        tracing::debug!(
            "Split pane {} of tab {} ({:?}) into {}",
            tab.active,
            tab_id,
            direction,
            pane_id
        );
        Some(pane_id)
    }

    /// Focus a specific pane.
    pub fn focus_pane(&mut self, tab_id: &TabId, pane_id: PaneId) {
        if let Some(tab) = self.tabs.get_mut(tab_id) {
            if tab.contains(pane_id) {
                tab.active = pane_id;
            }
        }
    }

    /// Move focus to the neighboring pane in `direction`.
    ///
    /// Returns `true` if focus changed.
    pub fn focus_direction(&mut self, tab_id: &TabId, direction: FocusDirection) -> bool {
        let Some(tab) = self.tabs.get_mut(tab_id) else {
            return false;
        };
        match LayoutCalculator::neighbor(&tab.layout, tab.active, direction) {
            Some(pane_id) => {
                tab.active = pane_id;
                true
            }
            None => false,
        }
    }

    /// Record the backing process of a pane once its spawn succeeded.
    ///
    /// A PTY id already owned by another pane is not recorded twice. If the
    /// pane was backed by a different process, that id is returned: it no
    /// longer shows up in [`tab_pty_ids`](Self::tab_pty_ids), so the caller
    /// owns killing it.
    pub fn set_pane_ready(
        &mut self,
        tab_id: &TabId,
        pane_id: PaneId,
        pty_id: PtyId,
    ) -> Option<PtyId> {
        if let Some((owner_tab, owner_pane)) = self.find_pty(&pty_id) {
            if owner_tab != tab_id || owner_pane != pane_id {
                tracing::warn!(
                    "PTY {} already backs pane {} of tab {}, not assigning it to pane {}",
                    pty_id,
                    owner_pane,
                    owner_tab,
                    pane_id
                );
            }
            return None;
        }

        let pane = self
            .tabs
            .get_mut(tab_id)
            .and_then(|tab| tab.pane_mut(pane_id))?;
        let displaced = pane.pty_id.replace(pty_id);
        if let Some(old) = &displaced {
            tracing::debug!("Pane {} of tab {} no longer tracks PTY {}", pane_id, tab_id, old);
        }
        displaced
    }

    /// Forget a backing process that has exited, leaving its pane in place.
    ///
    /// Returns the pane that was backed by it.
    pub fn release_pty(&mut self, pty_id: &PtyId) -> Option<(TabId, PaneId)> {
        self.tabs.iter_mut().find_map(|(tab_id, tab)| {
            let pane = tab
                .panes
                .iter_mut()
                .find(|p| p.pty_id.as_ref() == Some(pty_id))?;
            pane.pty_id = None;
            Some((tab_id.clone(), pane.id))
        })
    }

    /// Close a pane.
    ///
    /// The last pane of a tab is never removed. When the active pane closes,
    /// focus moves to the nearest pane created before it, or to the oldest
    /// remaining pane if it was the oldest. Returns the removed pane so the
    /// caller can kill its process.
    pub fn close_pane(&mut self, tab_id: &TabId, pane_id: PaneId) -> Option<Pane> {
        let tab = self.tabs.get_mut(tab_id)?;
        if tab.panes.len() <= 1 {
            return None;
        }
        let index = tab.panes.iter().position(|p| p.id == pane_id)?;

        let removed = tab.panes.remove(index);
        tab.layout.remove(pane_id);

        if tab.active == pane_id {
            tab.active = tab.panes[index.saturating_sub(1)].id;
        }

        tracing::debug!("Closed pane {} of tab {}", pane_id, tab_id);
        Some(removed)
    }

    /// PTY ids of every pane in the tab that has one, in pane creation order.
    #[must_use]
    pub fn tab_pty_ids(&self, tab_id: &TabId) -> Vec<PtyId> {
        self.tabs.get(tab_id).map_or_else(Vec::new, |tab| {
            tab.panes.iter().filter_map(|p| p.pty_id.clone()).collect()
        })
    }

    /// Returns true if the tab has more than one pane.
    #[must_use]
    pub fn has_splits(&self, tab_id: &TabId) -> bool {
        self.tabs.get(tab_id).is_some_and(|tab| tab.panes.len() > 1)
    }

    /// Drop all pane state for a tab.
    ///
    /// Processes are left running; collect [`tab_pty_ids`](Self::tab_pty_ids)
    /// first to kill them.
    pub fn clear_tab(&mut self, tab_id: &TabId) {
        if self.tabs.remove(tab_id).is_some() {
            tracing::debug!("Cleared tab {}", tab_id);
        }
    }

    /// Check if the tab has been initialized.
    #[must_use]
    pub fn has_tab(&self, tab_id: &TabId) -> bool {
        self.tabs.contains_key(tab_id)
    }

    /// Get the focused pane of a tab.
    #[must_use]
    pub fn active_pane(&self, tab_id: &TabId) -> Option<PaneId> {
        self.tabs.get(tab_id).map(|tab| tab.active)
    }

    /// Panes of a tab in creation order.
    #[must_use]
    pub fn panes(&self, tab_id: &TabId) -> &[Pane] {
        self.tabs.get(tab_id).map_or(&[], |tab| tab.panes.as_slice())
    }

    /// Get one pane.
    #[must_use]
    pub fn pane(&self, tab_id: &TabId, pane_id: PaneId) -> Option<&Pane> {
        self.panes(tab_id).iter().find(|p| p.id == pane_id)
    }

    /// Get the number of panes in a tab.
    #[must_use]
    pub fn pane_count(&self, tab_id: &TabId) -> usize {
        self.panes(tab_id).len()
    }

    /// Split tree of a tab.
    #[must_use]
    pub fn layout(&self, tab_id: &TabId) -> Option<&Layout> {
        self.tabs.get(tab_id).map(|tab| &tab.layout)
    }

    /// Calculate the area of every pane of a tab within `area`.
    #[must_use]
    pub fn pane_areas(&self, tab_id: &TabId, area: Rect) -> HashMap<PaneId, Rect> {
        self.layout(tab_id).map_or_else(HashMap::new, |layout| {
            LayoutCalculator::calculate_areas(layout, area)
        })
    }

    /// Find the tab and pane backed by a PTY.
    #[must_use]
    pub fn find_pty(&self, pty_id: &PtyId) -> Option<(&TabId, PaneId)> {
        self.tabs.iter().find_map(|(tab_id, tab)| {
            tab.panes
                .iter()
                .find(|p| p.pty_id.as_ref() == Some(pty_id))
                .map(|p| (tab_id, p.id))
        })
    }
}

impl Default for PaneManager {
    fn default() -> Self {
        Self::new()
    }
}
