//! The bridge actor: exclusive owner of the pending table and worker handle.

use crate::config::BridgeConfig;
use crate::dispatcher::worker_state::{WorkerLink, WorkerState};
use crate::dispatcher::ProgressSink;
use crate::error::DispatchError;
use crate::native::BackendFactory;
use crate::protocol::{ProtocolMessage, TaskId};
use crate::worker::{self, WorkerContext, WORKER_THREAD_NAME};

use common::{ErrorLocation, RedactedHexKey};

use std::any::Any;
use std::collections::HashMap;
use std::panic::Location;
use std::path::PathBuf;
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::thread;

use log::{debug, error, info, warn};
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;

/// Capacity of the handle-to-actor command channel.
pub(crate) const COMMAND_CHANNEL_CAPACITY: usize = 100;

/// Commands sent from [`DecryptBridge`](crate::dispatcher::DecryptBridge)
/// handles to the actor.
pub(crate) enum BridgeCommand {
    /// Submit a decrypt task; the reply channel is the task's completion slot.
    Submit {
        input_path: PathBuf,
        output_path: PathBuf,
        hex_key: RedactedHexKey,
        progress: Option<ProgressSink>,
        reply: oneshot::Sender<Result<(), DispatchError>>,
    },

    /// Query whether the worker is currently `Ready`.
    IsAvailable {
        reply: oneshot::Sender<bool>,
    },
}

pub(crate) struct PendingTask {
    pub(crate) progress: Option<ProgressSink>,
    pub(crate) complete: oneshot::Sender<Result<(), DispatchError>>,
}

enum Next {
    Command(Option<BridgeCommand>),
    WorkerEvent(Option<ProtocolMessage>),
}

/// Owns all mutable bridge state and processes commands sequentially.
pub(crate) struct BridgeActor {
    config: BridgeConfig,
    factory: BackendFactory,
    worker: WorkerState,
    pub(crate) pending: HashMap<TaskId, PendingTask>,
    command_rx: mpsc::Receiver<BridgeCommand>,
}

impl BridgeActor {
    pub(crate) fn new(
        config: BridgeConfig,
        factory: BackendFactory,
        command_rx: mpsc::Receiver<BridgeCommand>,
    ) -> Self {
        Self {
            config,
            factory,
            worker: WorkerState::Uninitialized,
            pending: HashMap::new(),
            command_rx,
        }
    }

    /// Actor main loop: runs until every bridge handle is dropped.
    ///
    /// Dropping the actor closes the worker's request queue, which lets the
    /// worker thread drain and exit cleanly.
    pub(crate) async fn run(mut self) {
        info!("Decrypt bridge actor started");

        loop {
            let next = if let WorkerState::Ready(link) = &mut self.worker {
                tokio::select! {
                    command = self.command_rx.recv() => Next::Command(command),
                    event = link.event_rx.recv() => Next::WorkerEvent(event),
                }
            } else {
                Next::Command(self.command_rx.recv().await)
            };

            match next {
                Next::Command(Some(command)) => self.handle_command(command).await,
                Next::Command(None) => break,
                Next::WorkerEvent(Some(message)) => self.handle_message(message),
                Next::WorkerEvent(None) => self.handle_worker_exit(),
            }
        }

        debug!("All bridge handles dropped, decrypt bridge actor stopping");
    }

    async fn handle_command(&mut self, command: BridgeCommand) {
        match command {
            BridgeCommand::Submit {
                input_path,
                output_path,
                hex_key,
                progress,
                reply,
            } => {
                self.handle_submit(input_path, output_path, hex_key, progress, reply)
                    .await;
            }
            BridgeCommand::IsAvailable { reply } => {
                let _ = reply.send(self.worker.is_ready());
            }
        }
    }

    async fn handle_submit(
        &mut self,
        input_path: PathBuf,
        output_path: PathBuf,
        hex_key: RedactedHexKey,
        progress: Option<ProgressSink>,
        reply: oneshot::Sender<Result<(), DispatchError>>,
    ) {
        if !self.worker.is_ready() {
            // Lazy initialization: first submit, or restart after a crash.
            if let Err(e) = self.start_worker().await {
                // Initialization failure resolves this submit immediately;
                // the pending table is untouched.
                let _ = reply.send(Err(e));
                return;
            }
        }

        let id = self.allocate_task_id();
        let request = ProtocolMessage::Decrypt {
            id,
            input_path,
            output_path,
            hex_key,
        };

        let dispatched = match &self.worker {
            WorkerState::Ready(link) => link.request_tx.send(request).is_ok(),
            _ => false,
        };

        if !dispatched {
            warn!("Task {id}: worker went away before the request was queued");
            self.handle_worker_exit();
            let _ = reply.send(Err(DispatchError::WorkerCrashed {
                message: "worker exited before accepting the request".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }));
            return;
        }

        self.pending.insert(
            id,
            PendingTask {
                progress,
                complete: reply,
            },
        );
        debug!("Task {id}: dispatched ({} pending)", self.pending.len());
    }

    /// Generate a correlation id absent from the pending table.
    fn allocate_task_id(&self) -> TaskId {
        loop {
            let id = TaskId::new();
            if !self.pending.contains_key(&id) {
                return id;
            }
        }
    }

    /// Spawn the worker thread and wait for its readiness signal.
    ///
    /// The worker is in its `Starting` phase for the duration of this call;
    /// on any failure the state falls back to `Uninitialized` so the next
    /// submit retries from scratch.
    async fn start_worker(&mut self) -> Result<(), DispatchError> {
        info!(
            "Starting decrypt worker (library: {})",
            self.config.library_path.display()
        );

        let (request_tx, request_rx) = std_mpsc::channel();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();

        let context = WorkerContext {
            factory: Arc::clone(&self.factory),
            progress_interval: self.config.progress_interval(),
        };

        let join_handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || worker::run_worker(context, request_rx, event_tx))
            .map_err(|e| DispatchError::Initialization {
                message: format!("failed to spawn worker thread: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let ready_timeout = self.config.ready_timeout();
        let first_event = timeout(ready_timeout, event_rx.recv()).await;

        match first_event {
            Ok(Some(ProtocolMessage::Ready)) => {
                info!("Decrypt worker ready");
                self.worker = WorkerState::Ready(WorkerLink {
                    request_tx,
                    event_rx,
                    join_handle,
                });
                Ok(())
            }
            Ok(Some(ProtocolMessage::Error { id: None, error })) => {
                warn!("Decrypt worker failed to initialize: {error}");
                self.worker = WorkerState::Uninitialized;
                Err(DispatchError::Initialization {
                    message: error,
                    location: ErrorLocation::from(Location::caller()),
                })
            }
            Ok(Some(other)) => {
                warn!("Unexpected message before readiness, giving up: {other:?}");
                self.worker = WorkerState::Uninitialized;
                Err(DispatchError::Initialization {
                    message: format!("unexpected message before readiness: {other:?}"),
                    location: ErrorLocation::from(Location::caller()),
                })
            }
            Ok(None) => {
                self.worker = WorkerState::Uninitialized;
                Err(DispatchError::Initialization {
                    message: "worker exited before signaling readiness".to_string(),
                    location: ErrorLocation::from(Location::caller()),
                })
            }
            Err(_elapsed) => {
                // Dropping request_tx here lets the late worker exit on its
                // own once it comes up.
                self.worker = WorkerState::Uninitialized;
                Err(DispatchError::Initialization {
                    message: format!(
                        "worker did not signal readiness within {ready_timeout:?}"
                    ),
                    location: ErrorLocation::from(Location::caller()),
                })
            }
        }
    }

    pub(crate) fn handle_message(&mut self, message: ProtocolMessage) {
        match message {
            ProtocolMessage::Ready => {
                debug!("Duplicate readiness signal ignored");
            }
            ProtocolMessage::Progress { id, current, total } => match self.pending.get(&id) {
                Some(task) => {
                    if let Some(sink) = &task.progress {
                        sink(current, total);
                    }
                }
                None => debug!("Progress for unknown task {id}, dropping"),
            },
            ProtocolMessage::Success { id } => {
                self.resolve(id, Ok(()));
            }
            ProtocolMessage::Error {
                id: Some(id),
                error,
            } => {
                self.resolve(
                    id,
                    Err(DispatchError::NativeDecrypt {
                        message: error,
                        location: ErrorLocation::from(Location::caller()),
                    }),
                );
            }
            ProtocolMessage::Error { id: None, error } => {
                warn!("Worker reported an error outside any task: {error}");
            }
            ProtocolMessage::Decrypt { id, .. } => {
                warn!("Unexpected decrypt request from worker for task {id}, dropping");
            }
        }
    }

    /// Remove and fulfill a pending task; unknown ids are dropped (logged for
    /// diagnostics only).
    fn resolve(&mut self, id: TaskId, result: Result<(), DispatchError>) {
        match self.pending.remove(&id) {
            Some(task) => {
                debug!("Task {id}: resolved ({} still pending)", self.pending.len());
                let _ = task.complete.send(result);
            }
            None => debug!("Result for unknown task {id}, dropping"),
        }
    }

    /// The worker's event channel closed while it was supposed to be alive.
    ///
    /// Tasks pending at crash time are failed immediately with
    /// `WorkerCrashed` rather than left unresolved; the next submit triggers
    /// a fresh worker start.
    fn handle_worker_exit(&mut self) {
        let previous = std::mem::replace(&mut self.worker, WorkerState::Crashed);
        if let WorkerState::Ready(link) = previous {
            // Join only once the thread is confirmed gone: this runs on a
            // runtime thread, so a blocking wait on a still-unwinding worker
            // is not acceptable.
            if link.join_handle.is_finished() {
                match link.join_handle.join() {
                    Ok(()) => error!("Decrypt worker exited unexpectedly"),
                    Err(panic) => error!("Decrypt worker crashed: {}", panic_message(&panic)),
                }
            } else {
                error!("Decrypt worker closed its event channel while still running");
            }
        }

        if !self.pending.is_empty() {
            error!(
                "Failing {} task(s) pending at worker crash",
                self.pending.len()
            );
        }
        for (id, task) in self.pending.drain() {
            let _ = task.complete.send(Err(DispatchError::WorkerCrashed {
                message: format!("worker crashed while task {id} was outstanding"),
                location: ErrorLocation::from(Location::caller()),
            }));
        }
    }
}

fn panic_message(panic: &Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
