//! Tick-indexed deferred events.

use std::collections::BTreeMap;

use codec::{EntityRef, Tick};

/// A deferred side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Start the deletion animation of an entity.
    Delete(EntityRef),
    /// Remove an entity immediately.
    Destroy(EntityRef),
    /// Call [`crate::GameHooks::on_event`] with this id.
    Hook(u32),
}

/// Events keyed by the tick they fire on.
///
/// Events scheduled for the same tick fire in scheduling order. Handlers
/// validate entity references when they run, so scheduling against an
/// entity that dies in the meantime is harmless.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    due: BTreeMap<Tick, Vec<Event>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `event` to fire `delay` ticks after `now`.
    pub fn schedule(&mut self, now: Tick, delay: u32, event: Event) {
        self.due.entry(now.after(delay)).or_default().push(event);
    }

    /// Removes every event due at or before `tick`, oldest first.
    pub fn drain_due(&mut self, tick: Tick) -> Vec<Event> {
        let later = self.due.split_off(&tick.next());
        std::mem::replace(&mut self.due, later)
            .into_values()
            .flatten()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.due.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.due.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_after_delay() {
        let mut queue = EventQueue::new();
        queue.schedule(Tick::new(10), 3, Event::Hook(1));
        assert!(queue.drain_due(Tick::new(12)).is_empty());
        assert_eq!(queue.drain_due(Tick::new(13)), vec![Event::Hook(1)]);
        assert!(queue.is_empty());
    }

    #[test]
    fn overdue_events_fire_in_order() {
        let mut queue = EventQueue::new();
        queue.schedule(Tick::new(0), 2, Event::Hook(2));
        queue.schedule(Tick::new(0), 1, Event::Hook(1));
        queue.schedule(Tick::new(0), 2, Event::Hook(3));
        queue.schedule(Tick::new(0), 9, Event::Hook(9));
        assert_eq!(queue.len(), 4);
        assert_eq!(
            queue.drain_due(Tick::new(5)),
            vec![Event::Hook(1), Event::Hook(2), Event::Hook(3)]
        );
        assert_eq!(queue.len(), 1);
    }
}
