use super::handle::Task;
use std::{
    collections::VecDeque,
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
};


struct QueueState {
    tasks: VecDeque<Task>,
    active: bool,
}

/// FIFO of pending tasks plus the pool's lifecycle flag.
///
/// Both live behind one mutex, so an enqueue can never slip in after the
/// pool has been closed. The queue is unbounded.
pub struct TaskQueue {
    state: Mutex<QueueState>,
    available: Condvar,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                tasks: VecDeque::new(),
                active: true,
            }),
            available: Condvar::new(),
        }
    }

    // Tasks run outside the lock and catch their own panics, so poisoning
    // can only come from a panic inside this module.
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a task and wakes one idle worker. Hands the task back if the
    /// queue is closed.
    pub fn push(&self, task: Task) -> Result<(), Task> {
        {
            let mut state = self.lock();
            if !state.active {
                return Err(task);
            }
            state.tasks.push_back(task);
        }
        self.available.notify_one();
        Ok(())
    }

    /// Blocks until a task is available or the queue is closed.
    ///
    /// Returns `None` as soon as the queue is closed, even if tasks remain.
    pub fn pop_blocking(&self) -> Option<Task> {
        let mut state = self
            .available
            .wait_while(self.lock(), |state| state.active && state.tasks.is_empty())
            .unwrap_or_else(PoisonError::into_inner);

        if !state.active {
            return None;
        }
        state.tasks.pop_front()
    }

    /// Marks the queue inactive and wakes every waiter. Returns `false` if it
    /// was already closed.
    pub fn close(&self) -> bool {
        {
            let mut state = self.lock();
            if !state.active {
                return false;
            }
            state.active = false;
        }
        self.available.notify_all();
        true
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.lock().active
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lock().tasks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}
