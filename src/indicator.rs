//! Per-session activity indicators.
//!
//! Tracks which sessions are thinking, went idle, or raised a notification,
//! and decides which single glyph a session should show. The active session
//! never holds `notified` or `idle`: activating a session clears both.

use std::collections::HashMap;
use std::sync::Arc;

use crate::session::SessionId;

/// Fire-and-forget OS notification sink.
pub trait NotificationSink: Send + Sync {
    /// Show a notification.
    fn send(&self, title: &str, body: &str);
}

/// Raw activity flags of one session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IndicatorState {
    /// A notification arrived while the session was not focused.
    pub notified: bool,
    /// A long-running operation is in progress.
    pub thinking: bool,
    /// Thinking finished and nobody has looked yet.
    pub idle: bool,
}

/// The glyph a session shows, highest priority first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Indicator {
    /// Nothing to show.
    None,
    /// Unseen notification.
    Notified,
    /// Operation in progress.
    Thinking,
    /// Finished while unfocused.
    Idle,
}

/// Indicator state for every session that has produced a signal.
pub struct ActivityIndicators {
    states: HashMap<SessionId, IndicatorState>,
    sink: Arc<dyn NotificationSink>,
}

impl ActivityIndicators {
    /// Create an empty set that dispatches notifications to `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            states: HashMap::new(),
            sink,
        }
    }

    /// Record a notification for `id`.
    ///
    /// An inactive session gets exactly one OS notification, titled with
    /// `title` or `session_name` when `title` is empty. The active session
    /// gets none, and its flag is cleared again straight away.
    pub fn on_notification(
        &mut self,
        id: &SessionId,
        title: &str,
        body: &str,
        session_name: &str,
        is_active: bool,
    ) {
        self.states.entry(id.clone()).or_default().notified = true;

        if is_active {
            self.on_activated(id);
            return;
        }

        let title = if title.is_empty() { session_name } else { title };
        tracing::debug!("Notifying for session {}: {}", id, title);
        self.sink.send(title, body);
    }

    /// Record the start or end of a long-running operation.
    ///
    /// Only a true-to-false transition marks the session idle.
    pub fn on_thinking_change(&mut self, id: &SessionId, is_thinking: bool, is_active: bool) {
        let state = self.states.entry(id.clone()).or_default();
        if is_thinking {
            state.thinking = true;
            state.idle = false;
        } else if state.thinking {
            state.thinking = false;
            state.idle = true;
        }

        if is_active {
            self.on_activated(id);
        }
    }

    /// Clear `notified` and `idle` for a session that just became active.
    ///
    /// `thinking` is left alone.
    pub fn on_activated(&mut self, id: &SessionId) {
        if let Some(state) = self.states.get_mut(id) {
            state.notified = false;
            state.idle = false;
        }
    }

    /// Flags for `id`; all false if it never produced a signal.
    #[must_use]
    pub fn get(&self, id: &SessionId) -> IndicatorState {
        self.states.get(id).copied().unwrap_or_default()
    }

    /// Pick the glyph for `id`.
    #[must_use]
    pub fn display(&self, id: &SessionId, is_active: bool, idle_enabled: bool) -> Indicator {
        let state = self.get(id);
        if state.notified && !is_active {
            Indicator::Notified
        } else if state.thinking {
            Indicator::Thinking
        } else if state.idle && !is_active && idle_enabled {
            Indicator::Idle
        } else {
            Indicator::None
        }
    }

    /// Drop the records of sessions for which `keep` returns false.
    pub fn retain(&mut self, mut keep: impl FnMut(&SessionId) -> bool) {
        self.states.retain(|id, _| keep(id));
    }

    /// Number of sessions with a record.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Check if no session has a record.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl std::fmt::Debug for ActivityIndicators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityIndicators")
            .field("states", &self.states)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use parking_lot::Mutex;

    use super::NotificationSink;

    /// Sink that records every notification.
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub(crate) sent: Mutex<Vec<(String, String)>>,
    }

    impl NotificationSink for RecordingSink {
        fn send(&self, title: &str, body: &str) {
            self.sent.lock().push((title.to_string(), body.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::RecordingSink;
    use super::*;

    fn setup() -> (Arc<RecordingSink>, ActivityIndicators) {
        let sink = Arc::new(RecordingSink::default());
        let indicators = ActivityIndicators::new(sink.clone());
        (sink, indicators)
    }

    fn id(s: &str) -> SessionId {
        SessionId::new(s)
    }

    #[test]
    fn test_thinking_then_done_is_idle() {
        let (_, mut indicators) = setup();

        indicators.on_thinking_change(&id("a"), true, false);
        assert_eq!(indicators.display(&id("a"), false, true), Indicator::Thinking);
        indicators.on_thinking_change(&id("a"), false, false);

        assert_eq!(
            indicators.get(&id("a")),
            IndicatorState {
                notified: false,
                thinking: false,
                idle: true
            }
        );
        assert_eq!(indicators.display(&id("a"), false, true), Indicator::Idle);
    }

    #[test]
    fn test_bare_done_is_not_idle() {
        let (_, mut indicators) = setup();

        indicators.on_thinking_change(&id("a"), false, false);

        assert_eq!(indicators.get(&id("a")), IndicatorState::default());
    }

    #[test]
    fn test_thinking_supersedes_idle() {
        let (_, mut indicators) = setup();
        indicators.on_thinking_change(&id("a"), true, false);
        indicators.on_thinking_change(&id("a"), false, false);

        indicators.on_thinking_change(&id("a"), true, false);

        let state = indicators.get(&id("a"));
        assert!(state.thinking);
        assert!(!state.idle);
    }

    #[test]
    fn test_activation_keeps_thinking() {
        let (_, mut indicators) = setup();
        indicators.on_thinking_change(&id("a"), true, false);
        indicators.on_notification(&id("a"), "t", "b", "A", false);

        indicators.on_activated(&id("a"));

        assert_eq!(
            indicators.get(&id("a")),
            IndicatorState {
                notified: false,
                thinking: true,
                idle: false
            }
        );
    }

    #[test]
    fn test_notification_for_inactive_dispatches_once() {
        let (sink, mut indicators) = setup();

        indicators.on_notification(&id("b"), "", "ping", "Terminal b", false);

        assert_eq!(
            *sink.sent.lock(),
            vec![("Terminal b".to_string(), "ping".to_string())]
        );
        assert!(indicators.get(&id("b")).notified);
        assert_eq!(indicators.display(&id("b"), false, true), Indicator::Notified);

        indicators.on_activated(&id("b"));
        assert!(!indicators.get(&id("b")).notified);
        assert_eq!(sink.sent.lock().len(), 1);
    }

    #[test]
    fn test_notification_keeps_explicit_title() {
        let (sink, mut indicators) = setup();

        indicators.on_notification(&id("b"), "Build done", "ok", "Terminal b", false);

        assert_eq!(sink.sent.lock()[0].0, "Build done");
    }

    #[test]
    fn test_notification_for_active_is_silent() {
        let (sink, mut indicators) = setup();

        indicators.on_notification(&id("a"), "t", "b", "A", true);

        assert!(sink.sent.lock().is_empty());
        assert!(!indicators.get(&id("a")).notified);
    }

    #[test]
    fn test_active_session_never_goes_idle() {
        let (_, mut indicators) = setup();
        indicators.on_thinking_change(&id("a"), true, true);
        indicators.on_thinking_change(&id("a"), false, true);

        assert_eq!(indicators.get(&id("a")), IndicatorState::default());
    }

    #[test]
    fn test_display_priority() {
        let (_, mut indicators) = setup();
        indicators.on_thinking_change(&id("a"), true, false);
        indicators.on_notification(&id("a"), "t", "b", "A", false);

        assert_eq!(indicators.display(&id("a"), false, true), Indicator::Notified);
        assert_eq!(indicators.display(&id("a"), true, true), Indicator::Thinking);

        indicators.on_thinking_change(&id("c"), true, false);
        indicators.on_thinking_change(&id("c"), false, false);
        assert_eq!(indicators.display(&id("c"), false, false), Indicator::None);
        assert_eq!(indicators.display(&id("c"), true, true), Indicator::None);
        assert_eq!(indicators.display(&id("unknown"), false, true), Indicator::None);
    }

    #[test]
    fn test_retain_prunes_records() {
        let (_, mut indicators) = setup();
        indicators.on_thinking_change(&id("a"), true, false);
        indicators.on_thinking_change(&id("b"), true, false);

        indicators.retain(|s| s.as_str() == "a");

        assert_eq!(indicators.len(), 1);
        assert!(indicators.get(&id("a")).thinking);
        assert!(!indicators.get(&id("b")).thinking);
    }
}
