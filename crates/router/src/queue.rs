//! Work deferred to the next scheduler tick.
//!
//! Tasks hold handles, never references. Whatever they point at may be gone
//! by the time they run, so the executor re-validates before acting.

use crate::substrate::ItemHandle;
use overflow_core::{PlayerId, SimTick};
use std::collections::VecDeque;

/// Move an engine-owned item into a backpack once the engine has settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeferredMove {
    /// Player whose backpack receives the item.
    pub player: PlayerId,
    /// Item to move.
    pub item: ItemHandle,
    /// Quantity captured when the task was posted, used for the notification.
    pub amount: u32,
}

/// FIFO of deferred moves keyed by the tick they become due.
#[derive(Debug)]
pub struct TaskQueue {
    now: SimTick,
    pending: VecDeque<(SimTick, DeferredMove)>,
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskQueue {
    /// Create an empty queue at tick zero.
    pub fn new() -> Self {
        Self {
            now: SimTick::ZERO,
            pending: VecDeque::new(),
        }
    }

    /// Current tick.
    pub fn now(&self) -> SimTick {
        self.now
    }

    /// Number of tasks waiting.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Check if nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Schedule `task` for the next tick.
    pub fn post(&mut self, task: DeferredMove) {
        self.pending.push_back((self.now.advance(1), task));
    }

    /// Advance one tick and return every task now due, in posting order.
    pub fn advance(&mut self) -> Vec<DeferredMove> {
        self.now = self.now.advance(1);
        let mut due = Vec::new();
        while let Some((tick, _)) = self.pending.front() {
            if *tick > self.now {
                break;
            }
            if let Some((_, task)) = self.pending.pop_front() {
                due.push(task);
            }
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(item: u64) -> DeferredMove {
        DeferredMove {
            player: PlayerId(1),
            item: ItemHandle(item),
            amount: 1,
        }
    }

    #[test]
    fn tasks_run_on_the_next_tick_in_order() {
        let mut queue = TaskQueue::new();
        queue.post(task(1));
        queue.post(task(2));

        let due = queue.advance();
        assert_eq!(due, vec![task(1), task(2)]);
        assert!(queue.is_empty());
        assert_eq!(queue.now(), SimTick(1));
    }

    #[test]
    fn tasks_posted_later_wait_for_their_tick() {
        let mut queue = TaskQueue::new();
        queue.post(task(1));
        assert_eq!(queue.advance().len(), 1);

        queue.post(task(2));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.advance(), vec![task(2)]);
    }
}
