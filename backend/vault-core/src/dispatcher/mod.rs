//! Task Dispatcher: the control-thread side of the decrypt bridge.
//!
//! This module implements the bridge state management using an actor pattern.
//! It tracks:
//! - The Execution Worker lifecycle (lazy start, readiness, crash, restart)
//! - The pending-task table keyed by correlation id
//!
//! # Architecture
//!
//! All mutable state lives inside one actor task:
//! - Callers hold a cloneable [`DecryptBridge`] handle and send commands over
//!   an mpsc channel
//! - The actor processes commands and worker events sequentially
//! - Results come back through per-task oneshot completion channels
//!
//! # Why Actor Pattern?
//!
//! - **Race-free:** the pending table and worker handle have exactly one
//!   owner; mutations are serialized by design
//! - **Non-blocking:** submits are accepted while a decrypt is running; the
//!   control thread never waits on the blocking native call
//! - **Simple:** no lock ordering to reason about

pub(crate) mod actor;
mod bridge;
mod worker_state;

pub use bridge::DecryptBridge;

/// Per-task progress callback invoked with `(current, total)` for every
/// progress message that survives the worker-side throttle.
pub type ProgressSink = Box<dyn Fn(u64, u64) + Send + 'static>;
