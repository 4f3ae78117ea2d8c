//! # tarry
//!
//! Cooperative, poll-based task sequencing.
//!
//! Callers register work items (a callback paired with a readiness
//! condition) and the sequencer fires them strictly in registration
//! order, one at a time. A ready head fires immediately; a not-yet-ready
//! head is re-polled at a bounded interval until its condition passes or
//! the queue is stopped.
//!
//! ## Design
//!
//! - Single FIFO queue; only the head item's condition is ever polled
//! - At most one outstanding re-check timer per sequencer
//! - Synchronous advancement by default: a burst of already-satisfied
//!   conditions drains in one call stack with no polling delay
//! - Deferred advancement available for a guaranteed yield between items
//! - Rejected inputs are logged, never thrown: every operation returns
//!   `&Self` so fluent chains keep working
//! - Timer-driven re-checks run on a Tokio runtime; purely synchronous
//!   drains need none
//!
//! ## Example
//!
//! ```no_run
//! # async fn example() {
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicI64, Ordering};
//! use tarry::Sequencer;
//!
//! let progress = Arc::new(AtomicI64::new(-1));
//! let gate = Arc::clone(&progress);
//!
//! let seq = Sequencer::new();
//! seq.register(|| println!("first"))
//!     .register_when(
//!         || println!("second"),
//!         move || gate.load(Ordering::SeqCst) > 0,
//!     )
//!     .start();
//!
//! // "first" has already fired; "second" fires within one check
//! // interval of the gate opening.
//! progress.store(5, Ordering::SeqCst);
//! # }
//! ```

pub mod config;
pub mod error;
pub mod sequencer;

pub use config::{AdvanceMode, SequencerConfig};
pub use error::{Result, SequencerError};
pub use sequencer::{Condition, Sequencer};
