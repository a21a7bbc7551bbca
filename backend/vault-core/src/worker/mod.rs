//! Execution Worker: the dedicated OS thread owning the native bindings.
//!
//! The worker drains its request queue strictly in arrival order and runs one
//! blocking decrypt at a time; there is no intra-worker parallelism. Outcomes
//! cross back to the dispatcher as [`ProtocolMessage`] events.
//!
//! [`ProtocolMessage`]: crate::protocol::ProtocolMessage

mod run;
pub(crate) mod throttle;

pub(crate) use run::{decode_error_message, run_worker, WorkerContext};

/// Name given to the worker OS thread.
pub(crate) const WORKER_THREAD_NAME: &str = "vault-decrypt-worker";
