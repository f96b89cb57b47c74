//! PTY event bridge: one pane's view of its backing process.
//!
//! The bridge asks the process-spawn service for a process, forwards input,
//! geometry and signals to it, and picks that process's output and exit off
//! the shared [`OutputBus`]. Events that show up before the spawn call has
//! returned the process id are held back and replayed, in arrival order,
//! once the id is known.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::events::{OutputBus, PtyEvent, SubscriptionId};
use crate::pane::{PaneKind, PaneSize, PtyId};

/// The environment's process-spawn service.
///
/// Spawning is asynchronous and its failures must reach the caller. The
/// remaining operations are fire-and-forget from the bridge's point of view:
/// their errors are logged, never returned to the pane.
#[async_trait]
pub trait ProcessService: Send + Sync {
    /// Run the configured main command of a worktree.
    async fn spawn_main(&self, target_id: &str, cols: u16, rows: u16) -> Result<PtyId>;

    /// Run the configured command at a project root.
    async fn spawn_project_shell(&self, project_id: &str, cols: u16, rows: u16) -> Result<PtyId>;

    /// Open a scratch terminal.
    async fn spawn_scratch_terminal(
        &self,
        scratch_id: &str,
        directory: Option<&Path>,
        cols: Option<u16>,
        rows: Option<u16>,
    ) -> Result<PtyId>;

    /// Open a login shell for any session.
    async fn spawn_shell(
        &self,
        entity_id: &str,
        directory: Option<&Path>,
        cols: Option<u16>,
        rows: Option<u16>,
    ) -> Result<PtyId>;

    /// Send input to a process.
    ///
    /// # Errors
    /// Returns an error if the process is gone or its input is closed.
    fn write(&self, pty_id: &PtyId, data: &str) -> Result<()>;

    /// Resize a process's terminal.
    ///
    /// # Errors
    /// Returns an error if the process is gone or the resize fails.
    fn resize(&self, pty_id: &PtyId, size: PaneSize) -> Result<()>;

    /// Interrupt the foreground job of a process.
    ///
    /// # Errors
    /// Returns an error if the signal cannot be delivered.
    fn interrupt(&self, pty_id: &PtyId) -> Result<()>;

    /// Terminate a process.
    ///
    /// # Errors
    /// Returns an error if the signal cannot be delivered.
    fn kill(&self, pty_id: &PtyId) -> Result<()>;
}

/// A request for a new backing process, one variant per pane kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpawnRequest {
    /// Worktree main command.
    Main { target_id: String, size: PaneSize },
    /// Project command.
    Project { project_id: String, size: PaneSize },
    /// Scratch terminal.
    Scratch {
        scratch_id: String,
        directory: Option<PathBuf>,
        size: Option<PaneSize>,
    },
    /// Login shell.
    Shell {
        entity_id: String,
        directory: Option<PathBuf>,
        size: Option<PaneSize>,
    },
}

impl SpawnRequest {
    /// Request a worktree's main command.
    #[must_use]
    pub fn main(target_id: impl Into<String>, size: PaneSize) -> Self {
        Self::Main {
            target_id: target_id.into(),
            size,
        }
    }

    /// Request a project's command.
    #[must_use]
    pub fn project(project_id: impl Into<String>, size: PaneSize) -> Self {
        Self::Project {
            project_id: project_id.into(),
            size,
        }
    }

    /// Request a scratch terminal.
    #[must_use]
    pub fn scratch(
        scratch_id: impl Into<String>,
        directory: Option<PathBuf>,
        size: Option<PaneSize>,
    ) -> Self {
        Self::Scratch {
            scratch_id: scratch_id.into(),
            directory,
            size,
        }
    }

    /// Request a login shell.
    #[must_use]
    pub fn shell(
        entity_id: impl Into<String>,
        directory: Option<PathBuf>,
        size: Option<PaneSize>,
    ) -> Self {
        Self::Shell {
            entity_id: entity_id.into(),
            directory,
            size,
        }
    }

    /// Build the request a pane of `kind` needs.
    ///
    /// Main and project commands always get a size (falling back to
    /// `default_size`) and ignore `directory`: the service resolves their
    /// location from the target id.
    #[must_use]
    pub fn for_pane(
        kind: PaneKind,
        target_id: impl Into<String>,
        size: Option<PaneSize>,
        directory: Option<PathBuf>,
        default_size: PaneSize,
    ) -> Self {
        match kind {
            PaneKind::Main => Self::main(target_id, size.unwrap_or(default_size)),
            PaneKind::Project => Self::project(target_id, size.unwrap_or(default_size)),
            PaneKind::Scratch => Self::scratch(target_id, directory, size),
            PaneKind::Shell => Self::shell(target_id, directory, size),
        }
    }

    /// Pane kind this request spawns.
    #[must_use]
    pub fn kind(&self) -> PaneKind {
        match self {
            Self::Main { .. } => PaneKind::Main,
            Self::Project { .. } => PaneKind::Project,
            Self::Scratch { .. } => PaneKind::Scratch,
            Self::Shell { .. } => PaneKind::Shell,
        }
    }

    /// Hand the request to the matching service call.
    ///
    /// # Errors
    /// Returns whatever error the service reports.
    pub async fn dispatch(&self, service: &dyn ProcessService) -> Result<PtyId> {
        match self {
            Self::Main { target_id, size } => {
                service.spawn_main(target_id, size.cols, size.rows).await
            }
            Self::Project { project_id, size } => {
                service
                    .spawn_project_shell(project_id, size.cols, size.rows)
                    .await
            }
            Self::Scratch {
                scratch_id,
                directory,
                size,
            } => {
                service
                    .spawn_scratch_terminal(
                        scratch_id,
                        directory.as_deref(),
                        size.map(|s| s.cols),
                        size.map(|s| s.rows),
                    )
                    .await
            }
            Self::Shell {
                entity_id,
                directory,
                size,
            } => {
                service
                    .spawn_shell(
                        entity_id,
                        directory.as_deref(),
                        size.map(|s| s.cols),
                        size.map(|s| s.rows),
                    )
                    .await
            }
        }
    }
}

/// Output a process must produce before its pane counts as ready.
const READY_THRESHOLD_BYTES: usize = 50;

/// Bus events held while a spawn is pending. Past this the oldest are
/// dropped.
const MAX_PENDING_EVENTS: usize = 4096;

/// What a bridge delivers to its pane.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaneEvent {
    /// Output of the attached process.
    Output(String),
    /// The attached process produced its first substantial output.
    Ready,
    /// The attached process ended and the bridge let go of it.
    Exited {
        /// Exit status reported by the service.
        exit_code: Option<u32>,
    },
}

/// Lifecycle of a bridge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BridgeState {
    /// Nothing spawned yet.
    Idle,
    /// Waiting for the spawn service; output is being buffered.
    Spawning,
    /// Bound to a live process.
    Attached(PtyId),
    /// The process exited on its own.
    Exited {
        /// Exit status reported by the service.
        exit_code: Option<u32>,
    },
    /// The process was killed.
    Killed,
}

struct BridgeInner {
    state: BridgeState,
    /// Bumped by every spawn and kill; stale handlers and spawns compare
    /// against it.
    generation: u64,
    /// Events received while spawning, in arrival order. Holds every
    /// process's events since the new id is not known yet.
    pending: VecDeque<PtyEvent>,
    /// Set once `pending` hit its bound during the current spawn.
    overflowed: bool,
    /// Output bytes seen from the attached process.
    output_bytes: usize,
    ready: bool,
    subscription: Option<SubscriptionId>,
}

impl BridgeInner {
    fn buffer(&mut self, event: &PtyEvent) {
        if self.pending.len() >= MAX_PENDING_EVENTS {
            self.pending.pop_front();
            if !self.overflowed {
                self.overflowed = true;
                tracing::warn!(
                    "Spawn pending for over {} bus events, dropping the oldest",
                    MAX_PENDING_EVENTS
                );
            }
        }
        self.pending.push_back(event.clone());
    }

    /// Hand an event of the attached process to the pane.
    fn deliver(&mut self, event: &PtyEvent, events_tx: &mpsc::UnboundedSender<PaneEvent>) {
        let BridgeState::Attached(pty_id) = &self.state else {
            return;
        };
        if pty_id != event.pty_id() {
            return;
        }

        match event {
            PtyEvent::Output(output) => {
                let _ = events_tx.send(PaneEvent::Output(output.data.clone()));
                self.output_bytes += output.data.len();
                if !self.ready && self.output_bytes > READY_THRESHOLD_BYTES {
                    self.ready = true;
                    let _ = events_tx.send(PaneEvent::Ready);
                }
            }
            PtyEvent::Exit(exit) => {
                tracing::debug!("PTY {} exited with {:?}", exit.pty_id, exit.exit_code);
                self.state = BridgeState::Exited {
                    exit_code: exit.exit_code,
                };
                let _ = events_tx.send(PaneEvent::Exited {
                    exit_code: exit.exit_code,
                });
            }
        }
    }
}

/// Connects one pane to at most one backing process at a time.
pub struct PtyBridge {
    service: Arc<dyn ProcessService>,
    bus: OutputBus,
    inner: Arc<Mutex<BridgeInner>>,
    events_tx: mpsc::UnboundedSender<PaneEvent>,
    default_size: PaneSize,
}

impl PtyBridge {
    /// Create an idle bridge.
    ///
    /// The returned receiver yields the output, readiness and exit of
    /// whichever process the bridge is attached to.
    #[must_use]
    pub fn new(
        service: Arc<dyn ProcessService>,
        bus: OutputBus,
    ) -> (Self, mpsc::UnboundedReceiver<PaneEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let bridge = Self {
            service,
            bus,
            inner: Arc::new(Mutex::new(BridgeInner {
                state: BridgeState::Idle,
                generation: 0,
                pending: VecDeque::new(),
                overflowed: false,
                output_bytes: 0,
                ready: false,
                subscription: None,
            })),
            events_tx,
            default_size: PaneSize::default(),
        };
        (bridge, events_rx)
    }

    /// Set the size used when `spawn` is called without one.
    #[must_use]
    pub fn with_default_size(mut self, size: PaneSize) -> Self {
        self.default_size = size;
        self
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> BridgeState {
        self.inner.lock().state.clone()
    }

    /// The attached process, if any.
    #[must_use]
    pub fn pty_id(&self) -> Option<PtyId> {
        match &self.inner.lock().state {
            BridgeState::Attached(pty_id) => Some(pty_id.clone()),
            _ => None,
        }
    }

    /// Spawn a new backing process and attach to it.
    ///
    /// Spawning while attached detaches from the old process without killing
    /// it; none of its output reaches this bridge's receiver afterwards.
    ///
    /// # Errors
    /// Returns the service's error if the spawn fails, or
    /// [`Error::SpawnSuperseded`] if another `spawn` on this bridge started
    /// before this one resolved. A superseded process is left running.
    pub async fn spawn(
        &self,
        target_id: &str,
        kind: PaneKind,
        size: Option<PaneSize>,
        directory: Option<PathBuf>,
    ) -> Result<PtyId> {
        let request = SpawnRequest::for_pane(kind, target_id, size, directory, self.default_size);
        self.spawn_request(request).await
    }

    /// Like [`spawn`](Self::spawn), with a prepared request.
    ///
    /// # Errors
    /// Same as [`spawn`](Self::spawn).
    pub async fn spawn_request(&self, request: SpawnRequest) -> Result<PtyId> {
        let generation = self.begin_spawn();
        tracing::debug!("Spawning {:?} process", request.kind());

        let result = request.dispatch(self.service.as_ref()).await;
        self.finish_spawn(generation, result)
    }

    /// Enter the spawning state and swap in a fresh bus subscription.
    ///
    /// The new subscription exists before the service is called, so no
    /// output of the new process can be missed.
    fn begin_spawn(&self) -> u64 {
        let (generation, old_subscription) = {
            let mut inner = self.inner.lock();
            inner.generation += 1;
            inner.state = BridgeState::Spawning;
            inner.pending.clear();
            inner.overflowed = false;
            inner.output_bytes = 0;
            inner.ready = false;
            (inner.generation, inner.subscription.take())
        };

        let subscription = self.bus.subscribe(self.event_handler(generation));
        self.inner.lock().subscription = Some(subscription);
        if let Some(old) = old_subscription {
            self.bus.unsubscribe(old);
        }
        generation
    }

    fn event_handler(&self, generation: u64) -> impl Fn(&PtyEvent) + Send + Sync + 'static {
        let inner = Arc::clone(&self.inner);
        let events_tx = self.events_tx.clone();

        move |event: &PtyEvent| {
            let mut inner = inner.lock();
            if inner.generation != generation {
                return;
            }
            if inner.state == BridgeState::Spawning {
                inner.buffer(event);
            } else {
                inner.deliver(event, &events_tx);
            }
        }
    }

    fn finish_spawn(&self, generation: u64, result: Result<PtyId>) -> Result<PtyId> {
        let mut inner = self.inner.lock();
        let current = inner.generation == generation;

        let pty_id = match result {
            Ok(pty_id) => pty_id,
            Err(e) => {
                if current {
                    inner.state = BridgeState::Idle;
                    inner.pending.clear();
                }
                return Err(e);
            }
        };

        if !current {
            tracing::debug!("Spawn of {} superseded before it resolved", pty_id);
            return Err(Error::SpawnSuperseded(pty_id));
        }

        inner.state = BridgeState::Attached(pty_id.clone());
        let pending = std::mem::take(&mut inner.pending);
        for event in &pending {
            inner.deliver(event, &self.events_tx);
        }

        tracing::debug!(
            "Attached to PTY {} ({} buffered events replayed)",
            pty_id,
            pending.len()
        );
        Ok(pty_id)
    }

    /// Send input to the attached process. Does nothing when detached.
    pub fn write(&self, data: &str) {
        let Some(pty_id) = self.pty_id() else {
            return;
        };
        if let Err(e) = self.service.write(&pty_id, data) {
            tracing::warn!("PTY write error for {}: {}", pty_id, e);
        }
    }

    /// Resize the attached process. Does nothing when detached.
    pub fn resize(&self, size: PaneSize) {
        let Some(pty_id) = self.pty_id() else {
            return;
        };
        if let Err(e) = self.service.resize(&pty_id, size) {
            tracing::warn!("PTY resize error for {}: {}", pty_id, e);
        }
    }

    /// Interrupt the attached process. Does nothing when detached.
    pub fn interrupt(&self) {
        let Some(pty_id) = self.pty_id() else {
            return;
        };
        if let Err(e) = self.service.interrupt(&pty_id) {
            tracing::warn!("PTY interrupt error for {}: {}", pty_id, e);
        }
    }

    /// Kill the attached process and detach from it.
    ///
    /// Output of the killed process still in flight is dropped. Does nothing
    /// when no process is attached.
    pub fn kill(&self) {
        let pty_id = {
            let mut inner = self.inner.lock();
            let BridgeState::Attached(pty_id) = &inner.state else {
                return;
            };
            let pty_id = pty_id.clone();
            inner.state = BridgeState::Killed;
            inner.generation += 1;
            inner.pending.clear();
            pty_id
        };

        tracing::debug!("Killing PTY {}", pty_id);
        if let Err(e) = self.service.kill(&pty_id) {
            tracing::warn!("PTY kill error for {}: {}", pty_id, e);
        }
    }
}

impl Drop for PtyBridge {
    fn drop(&mut self) {
        if let Some(subscription) = self.inner.lock().subscription.take() {
            self.bus.unsubscribe(subscription);
        }
    }
}

impl std::fmt::Debug for PtyBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtyBridge")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
