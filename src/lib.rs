//! # Switchboard
//!
//! Session and terminal multiplexing core for multi-session terminal apps.
//!
//! Switchboard keeps track of which sessions exist and which one is focused,
//! how each tab is split into panes, which PTY process backs which pane, and
//! what activity glyph every session should show. Rendering, process
//! spawning and terminal emulation belong to the host application.
//!
//! ## Features
//!
//! - **Session Directory**: ordered sessions derived from scratch terminals,
//!   projects and worktrees, with open/active/previous tracking
//! - **Split Layouts**: binary split tree per tab with directional focus
//! - **PTY Bridge**: buffers output that races a pending spawn, drops
//!   output of killed or replaced processes, and reports readiness and exit
//! - **Activity Indicators**: notified/thinking/idle state gated by the
//!   active session, with one OS notification per event
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use switchboard::{
//!     CoreConfig, NotificationSink, PaneKind, ScratchTerminal, SessionId, Workspace,
//! };
//!
//! struct Silent;
//!
//! impl NotificationSink for Silent {
//!     fn send(&self, _title: &str, _body: &str) {}
//! }
//!
//! let mut workspace = Workspace::new(CoreConfig::default(), "/home/dev", Arc::new(Silent));
//! let scratch = ScratchTerminal {
//!     id: SessionId::new("t1"),
//!     name: "Terminal 1".to_string(),
//!     cwd: None,
//! };
//! workspace.sync_sessions(&[scratch], &[]);
//!
//! let id = SessionId::new("t1");
//! let tab = workspace.open_session(&id).expect("session exists");
//! workspace.set_active(Some(&id));
//!
//! let pane = workspace.panes().active_pane(&tab).expect("tab has a pane");
//! let request = workspace.spawn_request_for(&tab, pane).expect("pane exists");
//! assert_eq!(request.kind(), PaneKind::Scratch);
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod config;
mod directory;
mod error;
mod events;
mod indicator;
mod layout;
mod manager;
mod pane;
mod pty;
mod session;
mod tab;
mod workspace;

// Re-export public API
pub use config::CoreConfig;
pub use directory::SessionDirectory;
pub use error::{Error, Result};
pub use events::{OutputBus, PtyEvent, PtyExit, PtyOutput, SubscriptionId};
pub use indicator::{ActivityIndicators, Indicator, IndicatorState, NotificationSink};
pub use layout::{Direction, FocusDirection, Layout, LayoutCalculator};
pub use manager::PaneManager;
pub use pane::{Pane, PaneConfig, PaneId, PaneKind, PaneSize, PtyId};
pub use pty::{BridgeState, PaneEvent, ProcessService, PtyBridge, SpawnRequest};
pub use session::{
    derive_sessions, Project, ScratchTerminal, Session, SessionId, SessionKind, Worktree,
};
pub use tab::{Tab, TabId};
pub use workspace::Workspace;
