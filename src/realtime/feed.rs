use std::collections::VecDeque;

use crate::realtime::diff::SessionUpdate;

/// Bounded newest-first history of session update events.
///
/// The buffer keeps more entries than it displays so a burst of events does
/// not immediately push recent ones out of reach. Entries only leave through
/// [`UpdateFeed::clear`] or by being displaced past capacity.
#[derive(Debug)]
pub struct UpdateFeed {
    entries: VecDeque<SessionUpdate>,
    capacity: usize,
    visible: usize,
}

impl UpdateFeed {
    /// Create an empty feed holding at most `capacity` entries and exposing
    /// the first `visible` of them for display.
    pub fn new(capacity: usize, visible: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            visible,
        }
    }

    /// Prepend a batch of events, keeping the batch's internal order, then
    /// truncate to capacity.
    pub fn append(&mut self, updates: Vec<SessionUpdate>) {
        for update in updates.into_iter().rev() {
            self.entries.push_front(update);
        }
        self.entries.truncate(self.capacity);
    }

    /// Empty the buffer unconditionally.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Full retained history, newest first.
    pub fn recent(&self) -> impl Iterator<Item = &SessionUpdate> {
        self.entries.iter()
    }

    /// The slice consumers actually display.
    pub fn visible(&self) -> impl Iterator<Item = &SessionUpdate> {
        self.entries.iter().take(self.visible)
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the feed holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
