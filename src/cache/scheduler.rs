//! Timer facility used by the cache store to expire entries.
//!
//! [`TokioScheduler`] runs expiry callbacks on the tokio runtime.
//! [`ManualScheduler`] only fires callbacks when its clock is advanced, which
//! makes expiry deterministic in tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};

use tracing::warn;

use super::lock::mutex_lock;

const SOURCE: &str = "cache::scheduler";

/// Deferred work handed to a [`Scheduler`].
pub type TimerTask = Box<dyn FnOnce() + Send + 'static>;

/// Schedules callbacks after a delay and exposes the clock they are measured against.
pub trait Scheduler: Send + Sync {
    /// Current instant on this scheduler's clock.
    fn now(&self) -> Instant;

    /// Run `task` once `delay` has elapsed.
    ///
    /// Implementations must never run `task` before returning: callers may hold
    /// locks that the task itself acquires.
    fn after(&self, delay: Duration, task: TimerTask) -> TimerHandle;
}

/// Cancellation token for a scheduled task.
///
/// Dropping the handle leaves the task scheduled; call [`TimerHandle::cancel`]
/// to prevent it from running.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl TimerHandle {
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A handle with nothing to cancel.
    pub fn detached() -> Self {
        Self { cancel: None }
    }

    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle")
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}

/// Scheduler backed by `tokio::time`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    fn after(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let join = runtime.spawn(async move {
                    tokio::time::sleep(delay).await;
                    task();
                });
                let abort = join.abort_handle();
                TimerHandle::new(move || abort.abort())
            }
            Err(_) => {
                // Without a runtime the entry is still hidden once its deadline passes;
                // it is only reclaimed on the next delete or flush.
                warn!(
                    target_module = SOURCE,
                    delay_ms = delay.as_millis() as u64,
                    "No tokio runtime available; expiry timer not scheduled"
                );
                TimerHandle::detached()
            }
        }
    }
}

/// Scheduler whose clock only moves when [`ManualScheduler::advance`] is called.
#[derive(Clone)]
pub struct ManualScheduler {
    state: Arc<Mutex<ManualState>>,
}

struct ManualState {
    origin: Instant,
    elapsed: Duration,
    next_id: u64,
    pending: BTreeMap<(Duration, u64), TimerTask>,
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ManualState {
                origin: Instant::now(),
                elapsed: Duration::ZERO,
                next_id: 0,
                pending: BTreeMap::new(),
            })),
        }
    }

    /// Move the clock forward, running every task whose deadline is reached in
    /// deadline order. Tasks scheduled by those callbacks also run if they fall
    /// within the window.
    pub fn advance(&self, by: Duration) {
        let target = mutex_lock(&self.state, SOURCE, "advance.target").elapsed + by;

        loop {
            let due = {
                let mut state = mutex_lock(&self.state, SOURCE, "advance.pop");
                let next = state
                    .pending
                    .first_key_value()
                    .map(|(key, _)| *key)
                    .filter(|(deadline, _)| *deadline <= target);
                match next {
                    Some(key) => {
                        state.elapsed = state.elapsed.max(key.0);
                        state.pending.remove(&key)
                    }
                    None => {
                        state.elapsed = target;
                        None
                    }
                }
            };

            match due {
                Some(task) => task(),
                None => break,
            }
        }
    }

    /// Number of tasks still waiting to fire.
    pub fn pending_timers(&self) -> usize {
        mutex_lock(&self.state, SOURCE, "pending_timers").pending.len()
    }

    /// Time elapsed since the scheduler was created.
    pub fn elapsed(&self) -> Duration {
        mutex_lock(&self.state, SOURCE, "elapsed").elapsed
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> Instant {
        let state = mutex_lock(&self.state, SOURCE, "now");
        state.origin + state.elapsed
    }

    fn after(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let key = {
            let mut state = mutex_lock(&self.state, SOURCE, "after");
            state.next_id += 1;
            let key = (state.elapsed + delay, state.next_id);
            state.pending.insert(key, task);
            key
        };

        let state: Weak<Mutex<ManualState>> = Arc::downgrade(&self.state);
        TimerHandle::new(move || {
            if let Some(state) = state.upgrade() {
                mutex_lock(&state, SOURCE, "cancel").pending.remove(&key);
            }
        })
    }
}
