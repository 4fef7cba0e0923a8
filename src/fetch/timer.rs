//! Cancellable one-shot timers.

use std::collections::HashMap;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Identifies a started timer so it can be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// Work run when a timer fires.
pub type TimerTask = Box<dyn FnOnce() + Send + 'static>;

/// Starts and cancels one-shot timers.
///
/// A cancelled timer's task must never run. Cancelling an unknown or
/// already-fired handle is a no-op.
pub trait Timer {
    fn start(&mut self, delay: Duration, task: TimerTask) -> TimerHandle;

    fn cancel(&mut self, handle: TimerHandle);
}

/// [`Timer`] backed by tokio sleep tasks.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Default)]
pub struct TokioTimer {
    next_id: u64,
    tasks: HashMap<TimerHandle, JoinHandle<()>>,
}

impl TokioTimer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of timers started and neither fired nor cancelled.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tasks.values().filter(|task| !task.is_finished()).count()
    }
}

impl Timer for TokioTimer {
    fn start(&mut self, delay: Duration, task: TimerTask) -> TimerHandle {
        self.tasks.retain(|_, task| !task.is_finished());

        let handle = TimerHandle(self.next_id);
        self.next_id += 1;

        let join = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
        self.tasks.insert(handle, join);
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(join) = self.tasks.remove(&handle) {
            join.abort();
        }
    }
}

impl Drop for TokioTimer {
    fn drop(&mut self) {
        for (_, join) in self.tasks.drain() {
            join.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting(counter: &Arc<AtomicUsize>) -> TimerTask {
        let counter = Arc::clone(counter);
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut timer = TokioTimer::new();
        timer.start(Duration::from_millis(450), counting(&fired));

        tokio::time::sleep(Duration::from_millis(449)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(timer.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut timer = TokioTimer::new();
        let handle = timer.start(Duration::from_millis(100), counting(&fired));
        timer.cancel(handle);
        timer.cancel(handle);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
