use std::collections::VecDeque;

pub const DEFAULT_CAPACITY: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no earlier item in history")]
pub struct EmptyHistory;

/// Recently displayed item ids, newest last.
#[derive(Debug, Clone)]
pub struct NavigationHistory {
    entries: VecDeque<i64>,
    capacity: usize,
}

impl Default for NavigationHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl NavigationHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Appends `id` unless it is already the newest entry.
    pub fn record(&mut self, id: i64) {
        if self.entries.back() == Some(&id) {
            return;
        }
        self.entries.push_back(id);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Drops the newest entry and returns the one before it.
    pub fn back(&mut self) -> Result<i64, EmptyHistory> {
        if self.entries.len() < 2 {
            return Err(EmptyHistory);
        }
        self.entries.pop_back();
        self.entries.back().copied().ok_or(EmptyHistory)
    }

    /// Drops every occurrence of `id`, merging neighbours left equal.
    pub fn remove(&mut self, id: i64) {
        let mut kept: Vec<i64> = self.entries.drain(..).filter(|entry| *entry != id).collect();
        kept.dedup();
        self.entries = kept.into();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn last(&self) -> Option<i64> {
        self.entries.back().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn can_go_back(&self) -> bool {
        self.entries.len() > 1
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.entries.iter().copied()
    }
}
