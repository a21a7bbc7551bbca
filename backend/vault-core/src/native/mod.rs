//! Native Function Bindings over the vendor decryption library.
//!
//! The vendor ships `vault_crypto` as a platform dynamic library exporting
//! exactly two functions:
//!
//! - `vault_decrypt_database(input, output, key, callback) -> status`:
//!   blocking; invokes `callback(current, total)` zero or more times with
//!   non-decreasing `current`, constant `total`, and `current == total` on
//!   successful completion. Status 0 means success.
//! - `vault_last_error_message(buffer, len) -> written`: fills a
//!   caller-provided, NUL-padded buffer with a human-readable message; valid
//!   only immediately after a non-zero status.
//!
//! The C callback carries no user-data pointer, so per-call closures are
//! routed through a fixed `extern "C"` trampoline and a thread-local slot
//! guarded by [`trampoline::CallbackGuard`]; a registration never outlives
//! its call.
//!
//! [`DecryptBackend`] is the seam between the Execution Worker and these
//! bindings: the worker only ever talks to the trait, which lets tests and
//! alternative vendors substitute the implementation.

mod bindings;
pub(crate) mod trampoline;

pub use bindings::NativeBindings;

use crate::error::NativeError;

use std::path::Path;
use std::sync::Arc;

/// Byte length of the buffer handed to `vault_last_error_message`.
pub const ERROR_MESSAGE_BUFFER_LEN: usize = 1024;

/// Status code returned by `vault_decrypt_database` on success.
pub const NATIVE_SUCCESS_STATUS: i32 = 0;

/// Typed access to the vendor decrypt entry points.
///
/// Implementations are owned exclusively by the Execution Worker thread and
/// are never shared across threads; only the construction (the factory) must
/// be `Send`.
pub trait DecryptBackend: Send {
    /// Blocking decrypt call. Returns the native status code (0 = success).
    ///
    /// `on_progress` is invoked synchronously on the calling thread for the
    /// duration of this call only.
    fn decrypt_with_progress(
        &self,
        input_path: &Path,
        output_path: &Path,
        hex_key: &str,
        on_progress: &mut dyn FnMut(u64, u64),
    ) -> Result<i32, NativeError>;

    /// Fetch the raw last-error buffer (NUL padding included).
    ///
    /// Only meaningful immediately after [`decrypt_with_progress`] returned a
    /// non-zero status. The caller decodes and trims the padding.
    ///
    /// [`decrypt_with_progress`]: DecryptBackend::decrypt_with_progress
    fn last_error_message(&self, buffer_len: usize) -> Result<Vec<u8>, NativeError>;
}

/// Constructor for the worker's backend, run inside the worker thread on
/// every (re)start so a crashed worker gets a fresh library handle.
pub type BackendFactory =
    Arc<dyn Fn() -> Result<Box<dyn DecryptBackend>, NativeError> + Send + Sync>;

/// Factory loading the real vendor library from `library_path`.
pub fn native_backend_factory(library_path: impl Into<std::path::PathBuf>) -> BackendFactory {
    let library_path = library_path.into();
    Arc::new(move || {
        NativeBindings::load(&library_path).map(|b| Box::new(b) as Box<dyn DecryptBackend>)
    })
}
