//! Pending timed completions, fired by polling against a clock.

use std::time::Duration;

#[derive(Debug, Clone)]
struct Pending<K> {
    deadline_ns: u64,
    seq: u64,
    key: K,
}

/// Scheduled completions keyed by `K`. Nothing fires on its own: the owner
/// polls with the current time and acts on whatever is due.
#[derive(Debug, Clone)]
pub struct DelayQueue<K> {
    entries: Vec<Pending<K>>,
    next_seq: u64,
}

impl<K> Default for DelayQueue<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 0,
        }
    }
}

impl<K> DelayQueue<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now_ns: u64, delay: Duration, key: K) {
        let deadline_ns = now_ns.saturating_add(delay.as_nanos() as u64);
        self.entries.push(Pending {
            deadline_ns,
            seq: self.next_seq,
            key,
        });
        self.next_seq += 1;
    }

    /// Earliest deadline still pending.
    pub fn next_deadline(&self) -> Option<u64> {
        self.entries.iter().map(|p| p.deadline_ns).min()
    }

    /// Removes and returns the earliest entry due at `now_ns`. Ties fire in
    /// scheduling order.
    pub fn pop_due(&mut self, now_ns: u64) -> Option<K> {
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, p)| p.deadline_ns <= now_ns)
            .min_by_key(|(_, p)| (p.deadline_ns, p.seq))
            .map(|(i, _)| i)?;
        Some(self.entries.remove(idx).key)
    }

    /// Drops every entry whose key matches. Returns how many were dropped.
    pub fn cancel(&mut self, mut matches: impl FnMut(&K) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|p| !matches(&p.key));
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
