//! Change notifications with per-batch coalescing.
//!
//! The coordinator raises three logical notifications. Within one command
//! batch every signal is recorded at most once; `flush` drains the pending
//! set to all subscribers. With the `Immediate` policy the editor flushes at
//! the end of each public command (a command is the batch); with `Deferred`
//! the host flushes once per tick from its own scheduler hook, so multiple
//! commands in the same tick coalesce into at most one `ContentUpdated`.

use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorEvent {
    SelectionChanged,
    FormatChanged,
    ContentUpdated,
}

/// When pending notifications reach subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushPolicy {
    #[default]
    Immediate,
    Deferred,
}

#[derive(Debug, Default)]
struct Pending {
    selection: bool,
    format: bool,
    content: bool,
}

#[derive(Debug, Default)]
pub(crate) struct EventBus {
    subscribers: Vec<Sender<EditorEvent>>,
    pending: Pending,
    policy: FlushPolicy,
}

impl EventBus {
    pub(crate) fn new(policy: FlushPolicy) -> Self {
        Self {
            subscribers: Vec::new(),
            pending: Pending::default(),
            policy,
        }
    }

    pub(crate) fn subscribe(&mut self) -> Receiver<EditorEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub(crate) fn note(&mut self, event: EditorEvent) {
        match event {
            EditorEvent::SelectionChanged => self.pending.selection = true,
            EditorEvent::FormatChanged => self.pending.format = true,
            EditorEvent::ContentUpdated => self.pending.content = true,
        }
    }

    /// Flush at a command boundary; a no-op under `Deferred`.
    pub(crate) fn flush_batch(&mut self) {
        if self.policy == FlushPolicy::Immediate {
            self.flush();
        }
    }

    /// Drain pending notifications to every live subscriber.
    pub(crate) fn flush(&mut self) {
        let mut events = Vec::with_capacity(3);
        if self.pending.selection {
            events.push(EditorEvent::SelectionChanged);
        }
        if self.pending.format {
            events.push(EditorEvent::FormatChanged);
        }
        if self.pending.content {
            events.push(EditorEvent::ContentUpdated);
        }
        self.pending = Pending::default();
        if events.is_empty() {
            return;
        }
        trace!(target: "editor.notify", count = events.len(), "flush");
        // Dead receivers drop out silently.
        self.subscribers
            .retain(|tx| events.iter().all(|e| tx.send(*e).is_ok()));
    }
}
