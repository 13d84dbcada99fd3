use super::{
    errors::SpawnError,
    result::SpawnResult,
};
use std::{
    future::Future,
    mem,
    pin::Pin,
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    task::{Context, Poll},
    time::Duration,
};
use futures::task::AtomicWaker;


/// Type-erased unit of work as it sits in the pool queue.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

enum SlotState<T> {
    Pending,
    Ready(SpawnResult<T>),
    Taken,
}

impl<T> SlotState<T> {
    #[inline]
    fn is_pending(&self) -> bool {
        matches!(self, SlotState::Pending)
    }

    /// Moves a published result out, leaving `Taken` behind.
    fn take(&mut self) -> Option<SpawnResult<T>> {
        match mem::replace(self, SlotState::Taken) {
            SlotState::Ready(result) => Some(result),
            SlotState::Taken => Some(Err(SpawnError::ChannelClosed)),
            SlotState::Pending => {
                *self = SlotState::Pending;
                None
            }
        }
    }
}

struct Slot<T> {
    state: Mutex<SlotState<T>>,
    ready: Condvar,
    waker: AtomicWaker,
}

impl<T> Slot<T> {
    fn lock(&self) -> MutexGuard<'_, SlotState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, result: SpawnResult<T>) {
        {
            let mut state = self.lock();
            if state.is_pending() {
                *state = SlotState::Ready(result);
            }
        }
        self.ready.notify_all();
        self.waker.wake();
    }

    fn wait(&self) -> MutexGuard<'_, SlotState<T>> {
        self.ready
            .wait_while(self.lock(), |state| state.is_pending())
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_timeout(&self, timeout: Duration) -> MutexGuard<'_, SlotState<T>> {
        let (guard, _) = self
            .ready
            .wait_timeout_while(self.lock(), timeout, |state| state.is_pending())
            .unwrap_or_else(PoisonError::into_inner);
        guard
    }
}

/// Creates a connected producer/consumer pair for one task result.
pub fn channel<T>() -> (ResultSender<T>, JoinHandle<T>) {
    let slot = Arc::new(Slot {
        state: Mutex::new(SlotState::Pending),
        ready: Condvar::new(),
        waker: AtomicWaker::new(),
    });
    (
        ResultSender { slot: Some(slot.clone()) },
        JoinHandle { slot },
    )
}


/// Write-once producer side. Lives inside the queued task.
///
/// Dropping it without sending resolves the handle to
/// [`SpawnError::Abandoned`].
pub struct ResultSender<T> {
    slot: Option<Arc<Slot<T>>>,
}

impl<T> ResultSender<T> {
    pub fn send(mut self, result: SpawnResult<T>) {
        if let Some(slot) = self.slot.take() {
            slot.publish(result);
        }
    }
}

impl<T> Drop for ResultSender<T> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            slot.publish(Err(SpawnError::Abandoned));
        }
    }
}


/// Handle to the eventual result of a submitted task.
///
/// Blocking accessors (`join`, `get`, `wait`) park the calling thread until a
/// worker publishes. The handle also implements [`Future`], so it can be
/// awaited from async code without blocking the executor.
///
/// A task still queued when the pool is shut down is never run, and its
/// handle stays pending for as long as the pool is alive. Use
/// [`JoinHandle::join_timeout`] or [`JoinHandle::wait_timeout`] where that
/// matters.
pub struct JoinHandle<T> {
    slot: Arc<Slot<T>>,
}

impl<T> JoinHandle<T> {
    #[inline]
    pub fn is_finished(&self) -> bool {
        !self.slot.lock().is_pending()
    }

    /// Blocks until the result is published.
    pub fn wait(&self) {
        drop(self.slot.wait());
    }

    /// Returns `true` if the result was published within `timeout`.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        !self.slot.wait_timeout(timeout).is_pending()
    }

    pub fn join(self) -> SpawnResult<T> {
        let mut state = self.slot.wait();
        state.take().unwrap_or(Err(SpawnError::ChannelClosed))
    }

    pub fn join_timeout(self, timeout: Duration) -> SpawnResult<T> {
        let mut state = self.slot.wait_timeout(timeout);
        state.take().unwrap_or(Err(SpawnError::Timeout))
    }
}

impl<T: Clone> JoinHandle<T> {
    /// Blocks until the result is published and returns a copy of it.
    /// Can be called any number of times.
    pub fn get(&self) -> SpawnResult<T> {
        match &*self.slot.wait() {
            SlotState::Ready(result) => result.clone(),
            _ => Err(SpawnError::ChannelClosed),
        }
    }
}

impl<T> Future for JoinHandle<T> {
    type Output = SpawnResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        this.slot.waker.register(cx.waker());
        match this.slot.lock().take() {
            Some(result) => Poll::Ready(result),
            None => Poll::Pending,
        }
    }
}

impl<T> std::fmt::Debug for JoinHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JoinHandle")
            .field("finished", &self.is_finished())
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn send_then_join() {
        let (tx, rx) = channel::<u32>();
        tx.send(Ok(7));
        assert!(rx.is_finished());
        assert_eq!(rx.join(), Ok(7));
    }

    #[test]
    fn get_is_repeatable() {
        let (tx, rx) = channel::<String>();
        thread::spawn(move || tx.send(Ok("done".to_string())));
        assert_eq!(rx.get(), Ok("done".to_string()));
        assert_eq!(rx.get(), Ok("done".to_string()));
    }

    #[test]
    fn dropped_sender_is_abandoned() {
        let (tx, rx) = channel::<()>();
        drop(tx);
        assert_eq!(rx.join(), Err(SpawnError::Abandoned));
    }

    #[test]
    fn pending_times_out() {
        let (_tx, rx) = channel::<()>();
        assert!(!rx.wait_timeout(Duration::from_millis(10)));
        assert_eq!(rx.join_timeout(Duration::from_millis(10)), Err(SpawnError::Timeout));
    }
}
