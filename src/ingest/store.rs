use std::collections::VecDeque;

use crate::pose::Landmark;
use crate::protocol::PoseEntry;

/// Upper bound on retained entries.
pub const RETENTION_CAPACITY: usize = 1000;

/// Bounded FIFO history of ingested pose entries.
///
/// Appending beyond capacity evicts the oldest entries, so the store always
/// holds the most recent ones. Ids come from a monotonic counter and are
/// unique for the process lifetime.
pub struct RetentionStore {
    entries: VecDeque<PoseEntry>,
    next_id: u64,
    capacity: usize,
}

impl RetentionStore {
    pub fn new() -> Self {
        Self::with_capacity(RETENTION_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            next_id: 1,
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append one entry and return its assigned id, evicting oldest-first
    /// past capacity. Callers hold the surrounding lock, so append+evict is
    /// atomic per request.
    pub fn append(
        &mut self,
        landmarks: Vec<Landmark>,
        timestamp: String,
        session_id: String,
        received_at: String,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        self.entries.push_back(PoseEntry {
            id,
            landmarks,
            timestamp,
            session_id,
            received_at,
        });

        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }

        id
    }

    /// The most recent `limit` entries, in arrival order.
    pub fn recent(&self, limit: usize) -> Vec<PoseEntry> {
        let skip = self.entries.len().saturating_sub(limit);
        self.entries.iter().skip(skip).cloned().collect()
    }
}

impl Default for RetentionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn append_marked(store: &mut RetentionStore, marker: usize) -> u64 {
        store.append(
            vec![],
            format!("t{marker}"),
            format!("session-{marker}"),
            "now".to_string(),
        )
    }

    #[test]
    fn test_append_assigns_monotonic_ids() {
        let mut store = RetentionStore::new();
        let a = append_marked(&mut store, 1);
        let b = append_marked(&mut store, 2);
        assert!(b > a);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_fifo_eviction_keeps_most_recent() {
        let mut store = RetentionStore::new();
        for i in 1..=1005 {
            append_marked(&mut store, i);
        }

        assert_eq!(store.len(), RETENTION_CAPACITY);

        let all = store.recent(RETENTION_CAPACITY);
        assert_eq!(all.len(), 1000);
        // 先頭5件が追い出され、6..=1005 が到着順で残る
        assert_eq!(all[0].session_id, "session-6");
        assert_eq!(all[999].session_id, "session-1005");
        for pair in all.windows(2) {
            assert!(pair[0].id < pair[1].id);
        }
    }

    #[test]
    fn test_recent_returns_tail_in_arrival_order() {
        let mut store = RetentionStore::new();
        for i in 1..=15 {
            append_marked(&mut store, i);
        }

        let recent = store.recent(3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].session_id, "session-13");
        assert_eq!(recent[2].session_id, "session-15");
    }

    #[test]
    fn test_recent_with_limit_beyond_len() {
        let mut store = RetentionStore::new();
        append_marked(&mut store, 1);
        assert_eq!(store.recent(10).len(), 1);
    }
}
