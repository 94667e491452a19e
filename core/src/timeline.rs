//! Deferred callbacks scheduled against the simulation clock.
//!
//! Nothing here runs on its own: owners call [`Timeline::drain_due`] once per
//! tick with the current simulation time and act on the payloads that came
//! due, in deadline order and, for equal deadlines, in scheduling order.

use std::{collections::BTreeMap, time::Duration};

/// Handle identifying a scheduled entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId {
    deadline: Duration,
    sequence: u64,
}

impl TimerId {
    /// Simulation time at which the entry comes due.
    #[must_use]
    pub const fn deadline(&self) -> Duration {
        self.deadline
    }
}

/// Ordered collection of payloads waiting for their deadline.
#[derive(Clone, Debug)]
pub struct Timeline<T> {
    entries: BTreeMap<TimerId, T>,
    next_sequence: u64,
}

impl<T> Default for Timeline<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_sequence: 0,
        }
    }
}

impl<T> Timeline<T> {
    /// Creates an empty timeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules the payload to come due at the provided simulation time.
    pub fn schedule(&mut self, deadline: Duration, payload: T) -> TimerId {
        let id = TimerId {
            deadline,
            sequence: self.next_sequence,
        };
        self.next_sequence = self.next_sequence.wrapping_add(1);
        let _ = self.entries.insert(id, payload);
        id
    }

    /// Removes a pending entry, returning its payload if it had not fired.
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        self.entries.remove(&id)
    }

    /// Drops every pending entry whose payload fails the predicate.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.entries.retain(|_, payload| keep(payload));
    }

    /// Moves every payload whose deadline is at or before `now` into `out`.
    pub fn drain_due(&mut self, now: Duration, out: &mut Vec<T>) {
        while let Some(entry) = self.entries.first_entry() {
            if entry.key().deadline > now {
                break;
            }
            out.push(entry.remove());
        }
    }

    /// Deadline of the earliest pending entry.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.entries.keys().next().map(TimerId::deadline)
    }

    /// Number of pending entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every pending entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_deadline_then_schedule_order() {
        let mut timeline = Timeline::new();
        let _ = timeline.schedule(Duration::from_millis(30), "late");
        let _ = timeline.schedule(Duration::from_millis(10), "first");
        let _ = timeline.schedule(Duration::from_millis(10), "second");

        let mut due = Vec::new();
        timeline.drain_due(Duration::from_millis(10), &mut due);
        assert_eq!(due, vec!["first", "second"]);
        assert_eq!(timeline.next_deadline(), Some(Duration::from_millis(30)));

        due.clear();
        timeline.drain_due(Duration::from_millis(29), &mut due);
        assert!(due.is_empty());
    }

    #[test]
    fn cancelled_entries_never_fire() {
        let mut timeline = Timeline::new();
        let id = timeline.schedule(Duration::from_secs(1), 7_u32);
        assert_eq!(timeline.cancel(id), Some(7));
        assert_eq!(timeline.cancel(id), None);

        let mut due = Vec::new();
        timeline.drain_due(Duration::from_secs(5), &mut due);
        assert!(due.is_empty());
    }

    #[test]
    fn retain_filters_pending_payloads() {
        let mut timeline = Timeline::new();
        for value in 0..6_u32 {
            let _ = timeline.schedule(Duration::from_millis(u64::from(value)), value);
        }
        timeline.retain(|value| value % 2 == 0);

        let mut due = Vec::new();
        timeline.drain_due(Duration::from_secs(1), &mut due);
        assert_eq!(due, vec![0, 2, 4]);
        assert!(timeline.is_empty());
    }
}
