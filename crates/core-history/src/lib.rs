//! core-history: linear undo/redo with action-kind compaction.
//!
//! The stack holds full snapshots. A pointer `p` marks the current entry;
//! `push` discards everything past it, then either appends or compacts into
//! the previous entry when three conditions meet: same action kind, the
//! kind is compactable (`Insert`, `Remove`), and the entries are closer than
//! the compaction timeout. Compaction replaces the state and merges the
//! ranges, so a typing burst costs one entry.
//!
//! Timestamps are supplied by the caller through `push_at` in tests; the
//! plain `push` stamps with `Instant::now()`.

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use core_tokens::{TextRange, Token};

/// Default window within which consecutive same-kind edits compact.
pub const COMPACT_TIMEOUT: Duration = Duration::from_millis(600);

/// Default cap on retained entries; the oldest entries trim first.
pub const MAX_ENTRIES: usize = 100;

/// What a history entry recorded, for compaction decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    Init,
    Insert,
    Remove,
    Replace,
    Format,
    Link,
    Paste,
    Cut,
    SetValue,
}

impl HistoryAction {
    fn compactable(self) -> bool {
        matches!(self, Self::Insert | Self::Remove)
    }
}

#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub state: Vec<Token>,
    pub time: Instant,
    pub action: HistoryAction,
    pub range: TextRange,
    pub caret: Option<TextRange>,
}

#[derive(Debug, Clone, Copy)]
pub struct HistoryConfig {
    pub compact_timeout: Duration,
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            compact_timeout: COMPACT_TIMEOUT,
            max_entries: MAX_ENTRIES,
        }
    }
}

#[derive(Debug)]
pub struct History {
    entries: Vec<HistoryEntry>,
    /// Index of the current entry; entries past it are the redo tail.
    pointer: usize,
    config: HistoryConfig,
}

impl Default for History {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl History {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            entries: Vec::new(),
            pointer: 0,
            config,
        }
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn can_undo(&self) -> bool {
        self.pointer > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.entries.is_empty() && self.pointer + 1 < self.entries.len()
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.pointer)
    }

    /// Record a new state with the current wall clock.
    pub fn push(
        &mut self,
        state: Vec<Token>,
        action: HistoryAction,
        range: TextRange,
        caret: Option<TextRange>,
    ) {
        self.push_at(state, action, range, caret, Instant::now());
    }

    /// Record a new state with a caller-supplied timestamp (testing seam).
    pub fn push_at(
        &mut self,
        state: Vec<Token>,
        action: HistoryAction,
        range: TextRange,
        caret: Option<TextRange>,
        now: Instant,
    ) {
        // Drop the redo tail.
        if self.pointer + 1 < self.entries.len() {
            self.entries.truncate(self.pointer + 1);
            trace!(target: "history.stack", depth = self.entries.len(), "redo_tail_dropped");
        }

        if let Some(prev) = self.entries.last_mut()
            && prev.action == action
            && action.compactable()
            && now.duration_since(prev.time) < self.config.compact_timeout
        {
            prev.state = state;
            prev.range = prev.range.union(&range);
            prev.time = now;
            if caret.is_some() {
                prev.caret = caret;
            }
            trace!(target: "history.stack", ?action, "compacted");
            self.pointer = self.entries.len() - 1;
            return;
        }

        self.entries.push(HistoryEntry {
            state,
            time: now,
            action,
            range,
            caret,
        });
        if self.entries.len() > self.config.max_entries {
            let overflow = self.entries.len() - self.config.max_entries;
            self.entries.drain(..overflow);
            debug!(target: "history.stack", overflow, "trimmed_oldest");
        }
        self.pointer = self.entries.len() - 1;
        trace!(target: "history.stack", depth = self.entries.len(), ?action, "pushed");
    }

    /// Step back; returns the entry to restore.
    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        if self.pointer == 0 {
            return None;
        }
        self.pointer -= 1;
        trace!(target: "history.stack", pointer = self.pointer, "undo");
        self.entries.get(self.pointer)
    }

    /// Step forward; returns the entry to restore.
    pub fn redo(&mut self) -> Option<&HistoryEntry> {
        if self.pointer + 1 >= self.entries.len() {
            return None;
        }
        self.pointer += 1;
        trace!(target: "history.stack", pointer = self.pointer, "redo");
        self.entries.get(self.pointer)
    }
}
