//! Public handle to the decrypt bridge.

use crate::config::BridgeConfig;
use crate::dispatcher::actor::{BridgeActor, BridgeCommand, COMMAND_CHANNEL_CAPACITY};
use crate::dispatcher::ProgressSink;
use crate::error::DispatchError;
use crate::native::{self, BackendFactory};

use common::{ErrorLocation, RedactedHexKey};

use std::panic::Location;
use std::path::PathBuf;
use std::sync::Arc;

use log::info;
use tokio::sync::{mpsc, oneshot, Mutex};

/// Handle to the decrypt bridge.
///
/// Constructed and owned by the embedding application (for example at
/// startup) and passed around by clone; all clones share one actor, one
/// pending-task table and at most one live worker. There is no ambient
/// global state.
///
/// # Lifecycle
///
/// The actor is spawned lazily on first use within an async context. The
/// worker thread is started lazily by the first [`decrypt`](Self::decrypt)
/// call and restarted on the next call after a crash. Dropping the last
/// handle stops the actor, which closes the worker's request queue and lets
/// the worker thread exit after its current task.
#[derive(Clone)]
pub struct DecryptBridge {
    /// Channel to send commands to the actor
    command_tx: Arc<Mutex<Option<mpsc::Sender<BridgeCommand>>>>,

    /// Track if the actor has been spawned
    actor_init: Arc<Mutex<bool>>,

    config: BridgeConfig,
    factory: BackendFactory,
}

impl DecryptBridge {
    /// Create a bridge backed by the real vendor library at
    /// `config.library_path`.
    ///
    /// Nothing is loaded yet; the library is opened inside the worker thread
    /// on the first submit.
    pub fn new(config: BridgeConfig) -> Self {
        let factory = native::native_backend_factory(config.library_path.clone());
        Self::with_backend_factory(config, factory)
    }

    /// Create a bridge with a custom backend factory.
    ///
    /// This is the seam for tests and for alternative vendor integrations;
    /// the factory runs inside the worker thread on every (re)start.
    pub fn with_backend_factory(config: BridgeConfig, factory: BackendFactory) -> Self {
        Self {
            command_tx: Arc::new(Mutex::new(None)),
            actor_init: Arc::new(Mutex::new(false)),
            config,
            factory,
        }
    }

    /// True only while the worker has reached `Ready` and has not crashed.
    pub async fn is_available(&self) -> bool {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .send_command(BridgeCommand::IsAvailable { reply: reply_tx })
            .await
            .is_err()
        {
            return false;
        }
        reply_rx.await.unwrap_or(false)
    }

    /// Submit a decrypt task and await its resolution.
    ///
    /// Returns when the worker posts the task's terminal message. The control
    /// thread is never blocked: other submits are accepted while the native
    /// call runs, queued FIFO, and executed strictly in order by the single
    /// worker.
    ///
    /// `on_progress` is invoked with `(current, total)` for every progress
    /// message that survives the worker-side throttle, in non-decreasing
    /// `current` order, strictly before this future resolves.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::Initialization`] - worker or native library could
    ///   not be brought up; the pending table is untouched and the next call
    ///   retries
    /// - [`DispatchError::NativeDecrypt`] - the native call failed; carries
    ///   the library's message
    /// - [`DispatchError::WorkerCrashed`] - the worker died while this task
    ///   was outstanding
    pub async fn decrypt(
        &self,
        input_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        key: RedactedHexKey,
        on_progress: Option<ProgressSink>,
    ) -> Result<(), DispatchError> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.send_command(BridgeCommand::Submit {
            input_path: input_path.into(),
            output_path: output_path.into(),
            hex_key: key,
            progress: on_progress,
            reply: reply_tx,
        })
        .await?;

        match reply_rx.await {
            Ok(result) => result,
            Err(_) => Err(DispatchError::ChannelClosed {
                message: "completion channel closed before the task resolved".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    /// Send a command to the actor, spawning it on first call.
    async fn send_command(&self, command: BridgeCommand) -> Result<(), DispatchError> {
        self.ensure_actor().await;

        let tx_guard = self.command_tx.lock().await;
        let tx = tx_guard.as_ref().ok_or_else(|| DispatchError::ChannelClosed {
            message: "bridge actor not initialized".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

        tx.send(command)
            .await
            .map_err(|_| DispatchError::ChannelClosed {
                message: "bridge actor died".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    /// Ensure the actor is spawned (called lazily from async context).
    async fn ensure_actor(&self) {
        let mut init_guard = self.actor_init.lock().await;
        if !*init_guard {
            let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
            let actor = BridgeActor::new(self.config.clone(), Arc::clone(&self.factory), rx);

            // Store tx BEFORE spawning to avoid a race with send_command
            let mut tx_guard = self.command_tx.lock().await;
            *tx_guard = Some(tx);
            drop(tx_guard); // Release before spawn

            tokio::spawn(actor.run());
            *init_guard = true;
            info!("Decrypt bridge actor spawned");
        }
    }
}
