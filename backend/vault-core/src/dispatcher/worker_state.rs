//! Execution Worker lifecycle as seen by the dispatcher.

use crate::protocol::ProtocolMessage;

use std::sync::mpsc::Sender as StdSender;
use std::thread::JoinHandle;

use tokio::sync::mpsc::UnboundedReceiver;

/// Worker lifecycle: `Uninitialized -> Ready -> Crashed`, with lazy restart
/// `Crashed -> Ready` on the next submit.
///
/// The transient `Starting` phase of the lifecycle lives inside
/// `BridgeActor::start_worker`, which does not return until the worker either
/// signaled readiness or failed; it is never observable between commands.
pub(crate) enum WorkerState {
    /// No worker started yet (or the last start attempt failed).
    Uninitialized,

    /// Worker signaled readiness and is serving requests.
    Ready(WorkerLink),

    /// Worker thread terminated abnormally; the next submit restarts it.
    Crashed,
}

impl WorkerState {
    pub(crate) fn is_ready(&self) -> bool {
        matches!(self, WorkerState::Ready(_))
    }
}

/// Channels and thread handle of a live worker.
///
/// Dropping the link closes the request queue, which lets the worker thread
/// finish its current task and exit cleanly.
pub(crate) struct WorkerLink {
    pub(crate) request_tx: StdSender<ProtocolMessage>,
    pub(crate) event_rx: UnboundedReceiver<ProtocolMessage>,
    pub(crate) join_handle: JoinHandle<()>,
}
