use crate::native::{BackendFactory, DecryptBackend, ERROR_MESSAGE_BUFFER_LEN, NATIVE_SUCCESS_STATUS};
use crate::protocol::{ProtocolMessage, TaskId};
use crate::worker::throttle::ProgressThrottle;

use std::fs;
use std::path::Path;
use std::sync::mpsc::Receiver as StdReceiver;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::mpsc::UnboundedSender;

/// Everything the worker thread needs, moved into it at spawn time.
pub(crate) struct WorkerContext {
    pub(crate) factory: BackendFactory,
    pub(crate) progress_interval: Duration,
}

/// Worker thread main loop.
///
/// Loads the backend, signals readiness, then serves decrypt requests
/// strictly in arrival order until the request queue closes (the dispatcher
/// dropped its sender). A failure to load posts a pre-task `Error` and exits;
/// a failure inside one task is converted to that task's `Error` message and
/// never terminates the worker.
pub(crate) fn run_worker(
    context: WorkerContext,
    requests: StdReceiver<ProtocolMessage>,
    events: UnboundedSender<ProtocolMessage>,
) {
    let backend = match (context.factory)() {
        Ok(backend) => backend,
        Err(e) => {
            warn!("Worker failed to load native bindings: {e}");
            let _ = events.send(ProtocolMessage::Error {
                id: None,
                error: e.to_string(),
            });
            return;
        }
    };

    if events.send(ProtocolMessage::Ready).is_err() {
        // Dispatcher already gone; nothing to serve.
        return;
    }
    info!("Decrypt worker ready");

    while let Ok(message) = requests.recv() {
        match message {
            ProtocolMessage::Decrypt {
                id,
                input_path,
                output_path,
                hex_key,
            } => {
                debug!(
                    "Task {id}: decrypting {} -> {}",
                    input_path.display(),
                    output_path.display()
                );

                let outcome = execute_decrypt(
                    backend.as_ref(),
                    id,
                    &input_path,
                    &output_path,
                    hex_key.as_str(),
                    context.progress_interval,
                    &events,
                );

                match outcome {
                    Ok(()) => {
                        debug!("Task {id}: decrypt succeeded");
                        let _ = events.send(ProtocolMessage::Success { id });
                    }
                    Err(error) => {
                        warn!("Task {id}: decrypt failed: {error}");
                        let _ = events.send(ProtocolMessage::Error {
                            id: Some(id),
                            error,
                        });
                    }
                }
            }
            other => {
                warn!("Worker received unexpected message, dropping: {other:?}");
            }
        }
    }

    debug!("Request queue closed, decrypt worker exiting");
}

/// Run one decrypt task end to end.
///
/// Any error here resolves this task only; the `Err` string becomes the
/// task's `Error` message verbatim.
fn execute_decrypt(
    backend: &dyn DecryptBackend,
    id: TaskId,
    input_path: &Path,
    output_path: &Path,
    hex_key: &str,
    progress_interval: Duration,
    events: &UnboundedSender<ProtocolMessage>,
) -> Result<(), String> {
    // The output directory chain is created; the input path is used as given.
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            format!(
                "failed to create output directory {}: {e}",
                parent.display()
            )
        })?;
    }

    let mut throttle = ProgressThrottle::new(progress_interval);
    let mut on_progress = |current: u64, total: u64| {
        if throttle.should_emit(current, total) {
            let _ = events.send(ProtocolMessage::Progress { id, current, total });
        }
    };

    let status = backend
        .decrypt_with_progress(input_path, output_path, hex_key, &mut on_progress)
        .map_err(|e| e.to_string())?;

    if status == NATIVE_SUCCESS_STATUS {
        return Ok(());
    }

    let message = backend
        .last_error_message(ERROR_MESSAGE_BUFFER_LEN)
        .map(decode_error_message)
        .unwrap_or_default();

    if message.is_empty() {
        Err(format!("ErrorCode: {status}"))
    } else {
        Err(message)
    }
}

/// Decode a raw last-error buffer: lossy UTF-8 with the trailing NUL padding
/// stripped.
pub(crate) fn decode_error_message(raw: Vec<u8>) -> String {
    String::from_utf8_lossy(&raw)
        .trim_end_matches('\0')
        .to_string()
}
