//! Tick-keyed delayed events
//!
//! Anything that would be a wall-clock timeout lives here instead, keyed by
//! simulation tick. Clearing the queue on teardown drops every pending effect.

/// Ordered queue of events due at a future tick
#[derive(Debug, Clone)]
pub struct TickQueue<E> {
    entries: Vec<Scheduled<E>>,
    next_seq: u64,
}

#[derive(Debug, Clone)]
struct Scheduled<E> {
    due: u64,
    seq: u64,
    event: E,
}

impl<E> Default for TickQueue<E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 0,
        }
    }
}

impl<E> TickQueue<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `event` to fire `delay` ticks after `now`
    pub fn schedule(&mut self, now: u64, delay: u64, event: E) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Scheduled {
            due: now.saturating_add(delay),
            seq,
            event,
        });
    }

    /// Remove and return every event due at or before `now`,
    /// ordered by due tick and then by scheduling order
    pub fn drain_due(&mut self, now: u64) -> Vec<E> {
        if !self.entries.iter().any(|s| s.due <= now) {
            return Vec::new();
        }
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.entries.drain(..).partition(|s| s.due <= now);
        self.entries = pending;
        due.sort_by_key(|s| (s.due, s.seq));
        due.into_iter().map(|s| s.event).collect()
    }

    /// Drop everything pending
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any pending event matches
    pub fn contains(&self, mut pred: impl FnMut(&E) -> bool) -> bool {
        self.entries.iter().any(|s| pred(&s.event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_in_due_then_insertion_order() {
        let mut q = TickQueue::new();
        q.schedule(0, 5, "b");
        q.schedule(0, 2, "a");
        q.schedule(1, 4, "c");
        assert!(q.drain_due(1).is_empty());
        assert_eq!(q.drain_due(5), vec!["a", "b", "c"]);
        assert!(q.is_empty());
    }

    #[test]
    fn test_clear_drops_pending() {
        let mut q = TickQueue::new();
        q.schedule(10, 30, 1u8);
        q.schedule(10, 60, 2u8);
        assert_eq!(q.len(), 2);
        q.clear();
        assert!(q.drain_due(1000).is_empty());
    }

    #[test]
    fn test_contains() {
        let mut q = TickQueue::new();
        q.schedule(0, 3, 7u32);
        assert!(q.contains(|e| *e == 7));
        assert!(!q.contains(|e| *e == 8));
    }
}
