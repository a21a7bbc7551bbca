//! Cross-thread protocol between the Task Dispatcher and the Execution Worker.
//!
//! Every message is an immutable value payload; no shared mutable memory
//! crosses the thread boundary. The dispatcher sends [`ProtocolMessage::Decrypt`]
//! requests down a FIFO work queue; the worker answers with `Ready`,
//! `Progress`, `Success` and `Error` events on its own FIFO event channel.
//!
//! # Wire tags
//!
//! The variants correspond to the tagged payloads of the external protocol:
//! `{type:"ready"}`, `{type:"decrypt", id, inputPath, outputPath, hexKey}`,
//! `{type:"progress", id, current, total}`, `{type:"success", id}` and
//! `{type:"error", id, error}`.

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::path::PathBuf;

use common::RedactedHexKey;
use uuid::Uuid;

/// Correlation id linking a decrypt request to its progress and terminal
/// messages.
///
/// Ids are generated by the dispatcher and are unique among all
/// currently-pending tasks; an id is never reused while still present in the
/// pending table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TaskId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        write!(formatter, "{}", self.0)
    }
}

/// Tagged union exchanged across the worker thread boundary.
///
/// Both channel directions carry this type: the dispatcher only ever sends
/// `Decrypt`, the worker only ever sends the other variants. Unexpected
/// variants are logged and dropped, never acted on.
#[derive(Debug, Clone)]
pub enum ProtocolMessage {
    /// Worker loaded the native bindings and is accepting requests.
    Ready,

    /// Decrypt `input_path` into `output_path` using `hex_key`.
    Decrypt {
        id: TaskId,
        input_path: PathBuf,
        output_path: PathBuf,
        hex_key: RedactedHexKey,
    },

    /// Throttled progress notification for a running task.
    ///
    /// `current` is non-decreasing within one task and `total` is constant;
    /// all progress messages for a task precede its terminal message.
    Progress { id: TaskId, current: u64, total: u64 },

    /// Native call returned the success status code.
    Success { id: TaskId },

    /// Task failed, or - when `id` is `None` - the worker failed before it
    /// could accept any task (native library not loadable).
    Error { id: Option<TaskId>, error: String },
}
