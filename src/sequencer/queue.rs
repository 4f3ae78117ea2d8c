//! Work items and readiness conditions.
//!
//! A [`WorkItem`] pairs a fire-once callback with a [`Condition`]. Items
//! are immutable once enqueued and owned exclusively by the sequencer's
//! queue.

use std::fmt;
use std::sync::Arc;

/// A queued callback. Fires at most once; the return value is discarded.
pub(crate) type Callback = Box<dyn FnOnce() + Send + 'static>;

/// Readiness condition for a work item.
///
/// Conditions are evaluated by the engine with no internal lock held, so a
/// predicate may freely call back into the owning
/// [`Sequencer`](crate::Sequencer).
#[derive(Clone)]
pub enum Condition {
    /// Always ready. The item fires as soon as it reaches the head of a
    /// draining queue. This is the shared default for [`register`]; no
    /// predicate is allocated for it.
    ///
    /// [`register`]: crate::Sequencer::register
    Ready,
    /// Never ready. Admitted only when registration validation is
    /// disabled; the item blocks the queue until cleared.
    Never,
    /// Ready once the predicate returns `true`.
    When(Arc<dyn Fn() -> bool + Send + Sync + 'static>),
}

impl Condition {
    /// Wrap a predicate.
    pub fn when<P>(predicate: P) -> Self
    where
        P: Fn() -> bool + Send + Sync + 'static,
    {
        Self::When(Arc::new(predicate))
    }

    /// The condition a boolean stands for: `true` is [`Condition::Ready`],
    /// `false` is [`Condition::Never`].
    pub fn from_flag(ready: bool) -> Self {
        if ready {
            Self::Ready
        } else {
            Self::Never
        }
    }

    /// Evaluate the condition.
    pub(crate) fn is_met(&self) -> bool {
        match self {
            Self::Ready => true,
            Self::Never => false,
            Self::When(predicate) => predicate(),
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => f.write_str("Condition::Ready"),
            Self::Never => f.write_str("Condition::Never"),
            Self::When(_) => f.write_str("Condition::When(..)"),
        }
    }
}

/// A callback/condition pair held in the queue.
pub(crate) struct WorkItem {
    /// Per-sequencer monotonic identity. Used to detect a changed head
    /// between evaluating a condition and firing the callback.
    pub(crate) id: u64,
    pub(crate) callback: Callback,
    pub(crate) condition: Condition,
}

impl fmt::Debug for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkItem")
            .field("id", &self.id)
            .field("condition", &self.condition)
            .finish_non_exhaustive()
    }
}
