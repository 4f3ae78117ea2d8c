//! The sequencer engine: queue draining, retry timing, advancement.
//!
//! [`Sequencer`] owns an ordered queue of work items and at most one
//! outstanding re-check timer. `start` drains the queue head-first: a
//! ready head fires in the caller's stack; a not-yet-ready head is
//! re-polled at the configured interval on a background timer task. All
//! operations are fluent and non-fatal so call chains keep working after
//! a rejected input.

use crate::config::{AdvanceMode, SequencerConfig};
use crate::error::SequencerError;
use crate::sequencer::queue::{Condition, WorkItem};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Mutable engine state behind the lock.
struct Shared {
    /// Pending work items; the front is the head being polled.
    queue: VecDeque<WorkItem>,
    /// The single outstanding re-check timer, if any. Aborted before a
    /// replacement is ever scheduled.
    timer: Option<JoinHandle<()>>,
    /// Bumped by `start` and `stop`. A poll loop or timer carrying a
    /// stale generation halts instead of touching the queue.
    generation: u64,
    /// Source of [`WorkItem`] identities.
    next_item_id: u64,
    config: SequencerConfig,
}

/// A cooperative, poll-based task sequencer.
///
/// Register work items, each paired with a readiness condition, then call
/// [`start`](Self::start): callbacks fire strictly in registration order,
/// one item at a time, each after its condition first returns `true`. Only
/// the head item's condition is ever polled.
///
/// Timer-driven re-checks need a Tokio runtime; a drain whose conditions
/// are all already satisfied completes inline and needs none.
///
/// Cloning returns another handle to the same queue and timer.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use tarry::Sequencer;
///
/// let fired = Arc::new(AtomicU32::new(0));
/// let (first, second) = (Arc::clone(&fired), Arc::clone(&fired));
///
/// let seq = Sequencer::new();
/// seq.register(move || first.fetch_add(1, Ordering::SeqCst))
///     .register(move || second.fetch_add(1, Ordering::SeqCst))
///     .start();
///
/// assert_eq!(fired.load(Ordering::SeqCst), 2);
/// assert!(seq.is_empty());
/// ```
pub struct Sequencer {
    shared: Arc<Mutex<Shared>>,
}

impl Sequencer {
    /// Create an empty sequencer with default configuration.
    pub fn new() -> Self {
        Self::with_config(SequencerConfig::default())
    }

    /// Create an empty sequencer with the given configuration.
    pub fn with_config(config: SequencerConfig) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                queue: VecDeque::new(),
                timer: None,
                generation: 0,
                next_item_id: 0,
                config,
            })),
        }
    }

    /// Enqueue `callback` with an always-ready condition.
    ///
    /// The callback fires as soon as the item reaches the head of a
    /// draining queue; return values of any type are discarded.
    /// Registering never starts the queue; that takes an explicit
    /// [`start`](Self::start).
    pub fn register<F, R>(&self, callback: F) -> &Self
    where
        F: FnOnce() -> R + Send + 'static,
    {
        self.register_condition(callback, Condition::Ready)
    }

    /// Enqueue `callback` behind a readiness predicate.
    ///
    /// The predicate is re-evaluated every check interval once the item
    /// reaches the head, until it returns `true`.
    pub fn register_when<F, R, P>(&self, callback: F, predicate: P) -> &Self
    where
        F: FnOnce() -> R + Send + 'static,
        P: Fn() -> bool + Send + Sync + 'static,
    {
        self.register_condition(callback, Condition::when(predicate))
    }

    /// Enqueue `callback` behind a boolean flag.
    ///
    /// `true` behaves exactly like [`register`](Self::register); `false`
    /// is rejected while validation is enabled, and otherwise enqueues an
    /// item that never becomes ready.
    pub fn register_if<F, R>(&self, callback: F, ready: bool) -> &Self
    where
        F: FnOnce() -> R + Send + 'static,
    {
        self.register_condition(callback, Condition::from_flag(ready))
    }

    /// Enqueue `callback` behind an explicit [`Condition`].
    ///
    /// A rejected registration leaves the queue unchanged, reports
    /// through the suppressible diagnostics channel, and still returns
    /// `&Self` so the chain continues.
    pub fn register_condition<F, R>(&self, callback: F, condition: Condition) -> &Self
    where
        F: FnOnce() -> R + Send + 'static,
    {
        if let Err(e) = self.try_register_condition(callback, condition) {
            self.log_rejection(&e);
        }
        self
    }

    /// Strict [`register_condition`](Self::register_condition): surfaces
    /// the rejection instead of logging it.
    ///
    /// # Errors
    ///
    /// Returns [`SequencerError::InvalidArgument`] when validation is
    /// enabled and `condition` is [`Condition::Never`] (a boolean
    /// `false`).
    pub fn try_register_condition<F, R>(
        &self,
        callback: F,
        condition: Condition,
    ) -> crate::Result<&Self>
    where
        F: FnOnce() -> R + Send + 'static,
    {
        let mut state = self.lock();
        if state.config.validate_registrations && matches!(condition, Condition::Never) {
            return Err(SequencerError::InvalidArgument(
                "a boolean condition must be true".into(),
            ));
        }
        let id = state.next_item_id;
        state.next_item_id += 1;
        state.queue.push_back(WorkItem {
            id,
            callback: Box::new(move || {
                let _ = callback();
            }),
            condition,
        });
        Ok(self)
    }

    /// Begin or resume draining the queue.
    ///
    /// Cancels any outstanding re-check timer (only one poll loop is ever
    /// live), then evaluates the head item in the caller's stack. Ready
    /// items fire immediately; a not-yet-ready head is re-polled every
    /// check interval on a timer task.
    ///
    /// An empty queue is reported as [`SequencerError::EmptyQueue`]
    /// through the diagnostics channel and leaves all state untouched.
    pub fn start(&self) -> &Self {
        if let Err(e) = self.try_start() {
            self.log_rejection(&e);
        }
        self
    }

    /// Strict [`start`](Self::start): surfaces the empty-queue case.
    ///
    /// # Errors
    ///
    /// Returns [`SequencerError::EmptyQueue`] when nothing is registered.
    pub fn try_start(&self) -> crate::Result<&Self> {
        let generation = {
            let mut state = self.lock();
            if state.queue.is_empty() {
                return Err(SequencerError::EmptyQueue);
            }
            state.generation += 1;
            if let Some(timer) = state.timer.take() {
                timer.abort();
            }
            state.generation
        };
        advance(&self.shared, generation);
        Ok(self)
    }

    /// Pause draining, optionally discarding every queued item.
    ///
    /// Cancels the outstanding timer unconditionally; the head item's
    /// condition is not re-evaluated until [`start`](Self::start) is
    /// called again. A callback or condition already executing cannot be
    /// interrupted, but its loop halts before touching the queue again.
    /// Idempotent when nothing is running.
    pub fn stop(&self, clear_queue: bool) -> &Self {
        let mut state = self.lock();
        state.generation += 1;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        if clear_queue {
            let dropped = state.queue.len();
            state.queue.clear();
            if dropped > 0 {
                debug!("stop cleared {dropped} queued items");
            }
        }
        self
    }

    /// Current minimum delay between re-checks of a not-yet-ready
    /// condition.
    pub fn check_interval(&self) -> Duration {
        self.lock().config.check_interval()
    }

    /// Set the minimum delay between re-checks.
    ///
    /// The interval is read each time a retry is scheduled, so a change
    /// takes effect from the next scheduled check.
    pub fn set_check_interval(&self, interval: Duration) -> &Self {
        let ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self.lock().config.check_interval_ms = ms;
        self
    }

    /// Current advancement mode.
    pub fn advance_mode(&self) -> AdvanceMode {
        self.lock().config.advance
    }

    /// Set how the engine approaches the next item after a fire.
    pub fn set_advance_mode(&self, mode: AdvanceMode) -> &Self {
        self.lock().config.advance = mode;
        self
    }

    /// Enable or disable registration-time validation.
    ///
    /// With validation disabled, a boolean `false` condition is admitted
    /// and simply never becomes ready, blocking the queue until cleared.
    pub fn set_validate_registrations(&self, validate: bool) -> &Self {
        self.lock().config.validate_registrations = validate;
        self
    }

    /// Enable or disable rejected-input diagnostics.
    pub fn set_display_errors(&self, display: bool) -> &Self {
        self.lock().config.log_errors = display;
        self
    }

    /// Number of queued items, the in-flight head included.
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    /// Returns `true` when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.lock().queue.is_empty()
    }

    /// Returns `true` while a deferred re-check is scheduled.
    pub fn is_polling(&self) -> bool {
        self.lock().timer.is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        lock_shared(&self.shared)
    }

    fn log_rejection(&self, error: &SequencerError) {
        if self.lock().config.log_errors {
            warn!("{error}");
        }
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Sequencer {
    /// Returns another handle to the same queue and timer.
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl fmt::Debug for Sequencer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("Sequencer")
            .field("queued", &state.queue.len())
            .field("polling", &state.timer.is_some())
            .finish_non_exhaustive()
    }
}

fn lock_shared(shared: &Arc<Mutex<Shared>>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One pass of the advancement loop.
///
/// Runs until the head is not ready (a re-check is then scheduled), the
/// queue drains, or `generation` goes stale because `start` or `stop`
/// intervened. Conditions and callbacks run with the lock released, so
/// user code may re-enter the sequencer; panics from either are not
/// caught and unwind into whatever context invoked the poll.
fn advance(shared: &Arc<Mutex<Shared>>, generation: u64) {
    loop {
        let (head_id, condition) = {
            let mut state = lock_shared(shared);
            if state.generation != generation {
                return;
            }
            match state.queue.front() {
                Some(head) => (head.id, head.condition.clone()),
                None => {
                    state.timer = None;
                    return;
                }
            }
        };

        if !condition.is_met() {
            schedule_recheck(shared, generation);
            return;
        }

        // Re-resolve the head before firing: the condition ran unlocked,
        // so a stop or a re-entrant drain may have removed or replaced it.
        let item = {
            let mut state = lock_shared(shared);
            if state.generation != generation {
                return;
            }
            if !state.queue.front().is_some_and(|head| head.id == head_id) {
                return;
            }
            match state.queue.pop_front() {
                Some(item) => item,
                None => return,
            }
        };

        debug!("firing work item {}", item.id);
        (item.callback)();

        let defer_next = {
            let mut state = lock_shared(shared);
            if state.generation != generation {
                return;
            }
            if state.queue.is_empty() {
                state.timer = None;
                debug!("queue drained");
                return;
            }
            state.config.advance == AdvanceMode::Deferred
        };

        if defer_next {
            schedule_recheck(shared, generation);
            return;
        }
    }
}

/// Replace the outstanding timer with a fresh re-check.
///
/// The timer task re-resolves the current head at fire time rather than
/// capturing the item, so items removed by `stop(true)` are never
/// replayed. It holds only a weak reference to the engine state: once
/// every sequencer handle is dropped, the pending re-check dies with it.
fn schedule_recheck(shared: &Arc<Mutex<Shared>>, generation: u64) {
    let mut state = lock_shared(shared);
    if state.generation != generation {
        return;
    }
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        // No runtime means nothing can drive re-checks; leave the queue
        // intact for a later `start` from a runtime context.
        if state.config.log_errors {
            warn!("no tokio runtime available to schedule a re-check; polling halted");
        }
        return;
    };
    let delay = state.config.check_interval();
    if let Some(timer) = state.timer.take() {
        timer.abort();
    }
    let weak = Arc::downgrade(shared);
    state.timer = Some(runtime.spawn(async move {
        tokio::time::sleep(delay).await;
        if let Some(shared) = weak.upgrade() {
            advance(&shared, generation);
        }
    }));
    debug!("re-check scheduled in {delay:?}");
}
