//
// fragcat - queue.rs - the bounded producer/consumer queue
//
// A plain ring buffer behind a Mutex, with two Condvars standing in for the
// "not full" / "not empty" semaphores a C implementation would reach for.
// `std::sync::mpsc::sync_channel` gets you the same backpressure with less
// code, but it hides the head/tail/count bookkeeping; this crate's queue
// exposes that shape directly because the assembler's invariants are stated
// in terms of it.
//

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

struct Inner<T> {
    ring: VecDeque<T>,
    capacity: usize,
    shut_down: bool,
}

/// A bounded FIFO shared between producer and consumer threads.
///
/// `put` blocks while the queue is full; `get` blocks while it's empty.
/// Once [`shutdown`](BoundedQueue::shutdown) is called, every blocked and
/// every future `put` returns immediately without inserting, and `get`
/// drains whatever remains before returning `None` for good.
pub struct BoundedQueue<T> {
    inner: Mutex<Inner<T>>,
    not_full: Condvar,
    not_empty: Condvar,
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: usize) -> BoundedQueue<T> {
        assert!(capacity > 0, "bounded queue capacity must be nonzero");
        BoundedQueue {
            inner: Mutex::new(Inner { ring: VecDeque::with_capacity(capacity), capacity, shut_down: false }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        }
    }

    /// Blocks until there's room, then pushes `item`. Returns `false` without
    /// inserting if the queue has been shut down (by this call or a racing
    /// one), so a producer can tell it should stop offering work.
    pub fn put(&self, item: T) -> bool {
        let mut guard = self.inner.lock().unwrap();
        loop {
            if guard.shut_down {
                return false;
            }
            if guard.ring.len() < guard.capacity {
                guard.ring.push_back(item);
                self.not_empty.notify_one();
                return true;
            }
            guard = self.not_full.wait(guard).unwrap();
        }
    }

    /// Blocks until an item is available or the queue is shut down and
    /// drained, in which case it returns `None`.
    pub fn get(&self) -> Option<T> {
        let mut guard = self.inner.lock().unwrap();
        loop {
            if let Some(item) = guard.ring.pop_front() {
                self.not_full.notify_one();
                return Some(item);
            }
            if guard.shut_down {
                return None;
            }
            guard = self.not_empty.wait(guard).unwrap();
        }
    }

    /// Wakes every blocked `put`/`get` and makes every future `put` a no-op.
    /// Idempotent; safe to call from multiple producer threads as they finish.
    pub fn shutdown(&self) {
        let mut guard = self.inner.lock().unwrap();
        guard.shut_down = true;
        drop(guard);
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
