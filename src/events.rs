//! Process-output event bus.
//!
//! The process-spawn service emits every output chunk and every exit of
//! every PTY here, tagged with the PTY id. Bridges subscribe and pick out
//! their own process.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::pane::PtyId;

/// One chunk of output from a backing process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PtyOutput {
    /// Process that produced the output.
    pub pty_id: PtyId,
    /// Decoded output text.
    pub data: String,
}

impl PtyOutput {
    /// Create an output event.
    #[must_use]
    pub fn new(pty_id: PtyId, data: impl Into<String>) -> Self {
        Self {
            pty_id,
            data: data.into(),
        }
    }
}

/// A backing process ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PtyExit {
    /// Process that exited.
    pub pty_id: PtyId,
    /// Exit status, if the service could collect one.
    pub exit_code: Option<u32>,
}

/// Everything the process-spawn service reports about running processes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PtyEvent {
    /// Output was read.
    Output(PtyOutput),
    /// The process ended; no output follows.
    Exit(PtyExit),
}

impl PtyEvent {
    /// Create an output event.
    #[must_use]
    pub fn output(pty_id: PtyId, data: impl Into<String>) -> Self {
        Self::Output(PtyOutput::new(pty_id, data))
    }

    /// Create an exit event.
    #[must_use]
    pub fn exit(pty_id: PtyId, exit_code: Option<u32>) -> Self {
        Self::Exit(PtyExit { pty_id, exit_code })
    }

    /// Process the event is about.
    #[must_use]
    pub fn pty_id(&self) -> &PtyId {
        match self {
            Self::Output(output) => &output.pty_id,
            Self::Exit(exit) => &exit.pty_id,
        }
    }
}

/// Handle returned by [`OutputBus::subscribe`].
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct SubscriptionId(u64);

type Handler = Arc<dyn Fn(&PtyEvent) + Send + Sync>;

#[derive(Default)]
struct BusInner {
    subscribers: Vec<(SubscriptionId, Handler)>,
    next_id: u64,
}

/// Fan-out of process events to any number of subscribers.
///
/// Cloning yields another handle to the same bus. Handlers run on the
/// emitting thread, in subscription order, with no bus lock held.
#[derive(Clone, Default)]
pub struct OutputBus {
    inner: Arc<Mutex<BusInner>>,
}

impl OutputBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for every future event.
    pub fn subscribe(
        &self,
        handler: impl Fn(&PtyEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = SubscriptionId(inner.next_id);
        inner.subscribers.push((id, Arc::new(handler)));
        id
    }

    /// Remove a handler. Returns false if it was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|(sub, _)| *sub != id);
        inner.subscribers.len() != before
    }

    /// Deliver an event to every current subscriber.
    pub fn emit(&self, event: &PtyEvent) {
        let handlers: Vec<Handler> = self
            .inner
            .lock()
            .subscribers
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        for handler in handlers {
            handler(event);
        }
    }

    /// Get the number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }
}

impl std::fmt::Debug for OutputBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputBus")
            .field("subscribers", &self.subscriber_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(bus: &OutputBus) -> (SubscriptionId, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let id = bus.subscribe(move |event| match event {
            PtyEvent::Output(output) => sink.lock().push(output.data.clone()),
            PtyEvent::Exit(exit) => sink.lock().push(format!("exit {:?}", exit.exit_code)),
        });
        (id, seen)
    }

    #[test]
    fn test_fan_out_and_unsubscribe() {
        let bus = OutputBus::new();
        let (first, seen_first) = recorder(&bus);
        let (_, seen_second) = recorder(&bus);

        bus.emit(&PtyEvent::output(PtyId::new("p"), "one"));
        assert!(bus.unsubscribe(first));
        assert!(!bus.unsubscribe(first));
        bus.emit(&PtyEvent::output(PtyId::new("p"), "two"));
        bus.emit(&PtyEvent::exit(PtyId::new("p"), Some(0)));

        assert_eq!(*seen_first.lock(), vec!["one"]);
        assert_eq!(*seen_second.lock(), vec!["one", "two", "exit Some(0)"]);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn test_handler_may_unsubscribe_while_emitting() {
        let bus = OutputBus::new();
        let slot: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));

        let handle = bus.clone();
        let own = Arc::clone(&slot);
        let id = bus.subscribe(move |_| {
            if let Some(id) = own.lock().take() {
                handle.unsubscribe(id);
            }
        });
        *slot.lock() = Some(id);

        bus.emit(&PtyEvent::output(PtyId::new("p"), "x"));
        assert_eq!(bus.subscriber_count(), 0);
    }
}
