//! Thread-safe FIFO handing decoded edits to the editor core.
//!
//! The dispatcher thread pushes, the editor's main loop pops. Push never
//! blocks; `pop_blocking` parks on a condition variable until an edit
//! arrives. The queue is unbounded: an optional high-water mark only logs a
//! warning, it never refuses or drops an edit.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::edit::EditOperation;

/// Receiving end of the inbound path, as seen by the dispatcher.
pub trait EditSink: Send + Sync {
    /// Hand an edit to the editor core. Ownership moves with it.
    fn enqueue_for_application(&self, op: EditOperation);
}

struct QueueState {
    items: VecDeque<EditOperation>,
    /// Set once `high_water` was crossed, cleared when back under it.
    above_high_water: bool,
    total_pushed: u64,
}

/// Unbounded multi-producer, multi-consumer edit queue.
pub struct EditQueue {
    state: Mutex<QueueState>,
    available: Condvar,
    high_water: Option<usize>,
}

impl EditQueue {
    pub fn new() -> Self {
        Self::with_high_water(None)
    }

    /// Create a queue that warns once each time its length exceeds `high_water`.
    pub fn with_high_water(high_water: Option<usize>) -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                above_high_water: false,
                total_pushed: 0,
            }),
            available: Condvar::new(),
            high_water,
        }
    }

    // Every critical section leaves `items` consistent, so a panic elsewhere
    // while holding the lock cannot corrupt it.
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an edit. Never blocks beyond the brief internal lock.
    pub fn push(&self, op: EditOperation) {
        let mut state = self.lock();
        state.items.push_back(op);
        state.total_pushed += 1;

        if let Some(limit) = self.high_water {
            let len = state.items.len();
            if len > limit && !state.above_high_water {
                state.above_high_water = true;
                log::warn!("Edit queue above high-water mark: {len} pending (limit {limit})");
            }
        }
        drop(state);
        self.available.notify_one();
    }

    /// Remove the oldest edit, waiting as long as it takes for one to arrive.
    pub fn pop_blocking(&self) -> EditOperation {
        let mut state = self.lock();
        loop {
            if let Some(op) = self.take_front(&mut state) {
                return op;
            }
            state = self
                .available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like [`pop_blocking`](Self::pop_blocking) but gives up after `timeout`.
    /// A timeout too large to represent as a deadline waits indefinitely.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<EditOperation> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return Some(self.pop_blocking());
        };
        let mut state = self.lock();
        loop {
            if let Some(op) = self.take_front(&mut state) {
                return Some(op);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let (guard, _) = self
                .available
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            state = guard;
        }
    }

    /// Remove the oldest edit if one is ready.
    pub fn try_pop(&self) -> Option<EditOperation> {
        let mut state = self.lock();
        self.take_front(&mut state)
    }

    /// Take every pending edit, oldest first.
    pub fn drain(&self) -> Vec<EditOperation> {
        let mut state = self.lock();
        state.above_high_water = false;
        state.items.drain(..).collect()
    }

    fn take_front(&self, state: &mut QueueState) -> Option<EditOperation> {
        let op = state.items.pop_front()?;
        if let Some(limit) = self.high_water {
            if state.above_high_water && state.items.len() <= limit {
                state.above_high_water = false;
            }
        }
        Some(op)
    }

    /// Number of pending edits.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Edits pushed over the queue's lifetime.
    pub fn total_pushed(&self) -> u64 {
        self.lock().total_pushed
    }

    pub fn high_water(&self) -> Option<usize> {
        self.high_water
    }
}

impl Default for EditQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EditSink for EditQueue {
    fn enqueue_for_application(&self, op: EditOperation) {
        self.push(op);
    }
}
