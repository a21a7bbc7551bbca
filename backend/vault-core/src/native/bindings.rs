//! `libloading`-backed implementation of [`DecryptBackend`].

use crate::error::NativeError;
use crate::native::trampoline::{self, CallbackGuard};
use crate::native::DecryptBackend;

use common::ErrorLocation;

use std::ffi::CString;
use std::os::raw::{c_char, c_int};
use std::panic::Location;
use std::path::Path;

use libloading::{Library, Symbol};
use log::{debug, info};

pub(crate) const DECRYPT_SYMBOL_NAME: &str = "vault_decrypt_database";
pub(crate) const LAST_ERROR_SYMBOL_NAME: &str = "vault_last_error_message";

const DECRYPT_SYMBOL: &[u8] = b"vault_decrypt_database\0";
const LAST_ERROR_SYMBOL: &[u8] = b"vault_last_error_message\0";

type ProgressCallbackFn = extern "C" fn(c_int, c_int);

type DecryptDatabaseFn = unsafe extern "C" fn(
    input_path: *const c_char,
    output_path: *const c_char,
    hex_key: *const c_char,
    callback: Option<ProgressCallbackFn>,
) -> c_int;

type LastErrorMessageFn = unsafe extern "C" fn(buffer: *mut c_char, len: c_int) -> c_int;

/// Handle to the loaded vendor library.
///
/// Symbols are resolved per call (cheap table lookups) but verified once at
/// load so a missing export fails initialization instead of the first task.
pub struct NativeBindings {
    library: Library,
}

impl NativeBindings {
    /// Load the vendor library from `library_path` and verify its exports.
    pub fn load(library_path: &Path) -> Result<Self, NativeError> {
        debug!("Loading native library from {}", library_path.display());

        // SAFETY: loading a dynamic library runs its initializers; the vendor
        // library is trusted to the same degree as the rest of the process.
        let library = unsafe { Library::new(library_path) }.map_err(|e| {
            NativeError::LibraryLoad {
                path: library_path.to_path_buf(),
                message: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            }
        })?;

        unsafe {
            library
                .get::<DecryptDatabaseFn>(DECRYPT_SYMBOL)
                .map_err(|e| NativeError::MissingSymbol {
                    symbol: DECRYPT_SYMBOL_NAME,
                    message: e.to_string(),
                    location: ErrorLocation::from(Location::caller()),
                })?;
            library
                .get::<LastErrorMessageFn>(LAST_ERROR_SYMBOL)
                .map_err(|e| NativeError::MissingSymbol {
                    symbol: LAST_ERROR_SYMBOL_NAME,
                    message: e.to_string(),
                    location: ErrorLocation::from(Location::caller()),
                })?;
        }

        info!("Native library loaded from {}", library_path.display());
        Ok(Self { library })
    }
}

impl DecryptBackend for NativeBindings {
    fn decrypt_with_progress(
        &self,
        input_path: &Path,
        output_path: &Path,
        hex_key: &str,
        on_progress: &mut dyn FnMut(u64, u64),
    ) -> Result<i32, NativeError> {
        let input_c = path_to_cstring(input_path)?;
        let output_c = path_to_cstring(output_path)?;
        let key_c = CString::new(hex_key).map_err(|_| NativeError::InvalidArgument {
            message: "hex key contains an interior NUL byte".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

        // SAFETY: symbol signature verified against the vendor contract; the
        // CStrings outlive the call.
        let decrypt: Symbol<'_, DecryptDatabaseFn> = unsafe {
            self.library
                .get(DECRYPT_SYMBOL)
                .map_err(|e| NativeError::MissingSymbol {
                    symbol: DECRYPT_SYMBOL_NAME,
                    message: e.to_string(),
                    location: ErrorLocation::from(Location::caller()),
                })?
        };

        // Registration is released when the guard drops, on every exit path.
        let _guard = CallbackGuard::register(on_progress);
        let status = unsafe {
            decrypt(
                input_c.as_ptr(),
                output_c.as_ptr(),
                key_c.as_ptr(),
                Some(trampoline::progress_trampoline),
            )
        };

        Ok(status)
    }

    fn last_error_message(&self, buffer_len: usize) -> Result<Vec<u8>, NativeError> {
        let mut buffer = vec![0u8; buffer_len];

        // SAFETY: the buffer is owned, writable and exactly `buffer_len`
        // bytes; the vendor contract is to NUL-pad the unused tail.
        let written = unsafe {
            let last_error: Symbol<'_, LastErrorMessageFn> =
                self.library
                    .get(LAST_ERROR_SYMBOL)
                    .map_err(|e| NativeError::MissingSymbol {
                        symbol: LAST_ERROR_SYMBOL_NAME,
                        message: e.to_string(),
                        location: ErrorLocation::from(Location::caller()),
                    })?;
            last_error(buffer.as_mut_ptr() as *mut c_char, buffer.len() as c_int)
        };

        if written < 0 {
            return Err(NativeError::ErrorLookup {
                message: format!("{LAST_ERROR_SYMBOL_NAME} returned {written}"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        buffer.truncate((written as usize).min(buffer_len));
        Ok(buffer)
    }
}

fn path_to_cstring(path: &Path) -> Result<CString, NativeError> {
    let as_str = path.to_str().ok_or_else(|| NativeError::PathEncoding {
        path: path.to_path_buf(),
        location: ErrorLocation::from(Location::caller()),
    })?;

    CString::new(as_str).map_err(|_| NativeError::PathEncoding {
        path: path.to_path_buf(),
        location: ErrorLocation::from(Location::caller()),
    })
}
