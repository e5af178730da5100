use std::sync::Arc;

use parking_lot::Mutex;

use super::types::Event;

/// Capacity of each event buffer.
pub const MAX_EVENTS: usize = 32;

/// Producer side of the event queue.
///
/// Cheap to clone and `Send`; platform threads and callbacks each hold one.
#[derive(Debug, Clone)]
pub struct EventSender {
    current: Arc<Mutex<Vec<Event>>>,
}

impl EventSender {
    /// Appends `event` to the open buffer.
    ///
    /// Returns `false` and drops the event when the buffer already holds
    /// [`MAX_EVENTS`] entries.
    pub fn send(&self, event: Event) -> bool {
        let mut current = self.current.lock();
        if current.len() >= MAX_EVENTS {
            log::warn!("event queue full ({MAX_EVENTS}), dropping {:?}", event.kind);
            return false;
        }
        current.push(event);
        true
    }
}

/// Consumer side of the event queue.
///
/// Double-buffered: the open buffer lives behind the mutex and is written by
/// [`EventSender`]s; the closed buffer is owned here and read without
/// locking. [`pull`](Self::pull) swaps the two under the lock.
#[derive(Debug)]
pub struct EventQueue {
    current: Arc<Mutex<Vec<Event>>>,
    pulled: Vec<Event>,
}

impl EventQueue {
    pub fn new() -> (EventSender, EventQueue) {
        let current = Arc::new(Mutex::new(Vec::with_capacity(MAX_EVENTS)));
        let sender = EventSender {
            current: Arc::clone(&current),
        };
        let queue = EventQueue {
            current,
            pulled: Vec::with_capacity(MAX_EVENTS),
        };
        (sender, queue)
    }

    /// Another producer handle for this queue.
    pub fn sender(&self) -> EventSender {
        EventSender {
            current: Arc::clone(&self.current),
        }
    }

    /// Closes the open buffer and returns its events in send order.
    ///
    /// Events from the previous pull are discarded.
    pub fn pull(&mut self) -> &[Event] {
        self.pulled.clear();
        {
            let mut current = self.current.lock();
            std::mem::swap(&mut *current, &mut self.pulled);
        }
        &self.pulled
    }

    /// Events returned by the last [`pull`](Self::pull).
    #[inline]
    pub fn pulled(&self) -> &[Event] {
        &self.pulled
    }

    /// Discards events sent since the last pull.
    pub fn flush(&self) {
        self.current.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::input::EventType;

    fn key(id: i32) -> Event {
        Event::new(EventType::KeyPress, id, 0, 0)
    }

    // ── capacity ──────────────────────────────────────────────────────────

    #[test]
    fn overflow_drops_the_newest_event() {
        let (tx, mut rx) = EventQueue::new();
        let producer = thread::spawn(move || {
            (0..33).map(|i| tx.send(key(i))).collect::<Vec<_>>()
        });
        let accepted = producer.join().unwrap();

        assert!(accepted[..32].iter().all(|ok| *ok));
        assert!(!accepted[32]);

        let ids: Vec<i32> = rx.pull().iter().map(|e| e.id).collect();
        assert_eq!(ids, (0..32).collect::<Vec<_>>());
    }

    #[test]
    fn pull_frees_room_for_new_events() {
        let (tx, mut rx) = EventQueue::new();
        for i in 0..MAX_EVENTS as i32 {
            tx.send(key(i));
        }
        assert!(!tx.send(key(99)));
        assert_eq!(rx.pull().len(), MAX_EVENTS);
        assert!(tx.send(key(100)));
    }

    // ── ordering ──────────────────────────────────────────────────────────

    #[test]
    fn swap_separates_frames() {
        let (tx, mut rx) = EventQueue::new();
        tx.send(key(1));
        tx.send(key(2));
        assert_eq!(rx.pull().iter().map(|e| e.id).collect::<Vec<_>>(), [1, 2]);

        tx.send(key(3));
        assert_eq!(rx.pulled().len(), 2);
        assert_eq!(rx.pull().iter().map(|e| e.id).collect::<Vec<_>>(), [3]);
        assert!(rx.pull().is_empty());
    }

    #[test]
    fn flush_discards_pending() {
        let (tx, mut rx) = EventQueue::new();
        let tx2 = rx.sender();
        tx.send(key(1));
        tx2.send(key(2));
        rx.flush();
        assert!(rx.pull().is_empty());
    }
}
