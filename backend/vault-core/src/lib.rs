pub mod config;
pub mod dispatcher;
pub mod error;
pub mod logger;
pub mod native;
pub mod protocol;

mod worker;
#[cfg(test)]
mod tests;

pub use config::BridgeConfig;
pub use dispatcher::DecryptBridge;
pub use native::{BackendFactory, DecryptBackend};

/// Base name of the vendor decryption library, without platform decoration.
pub const NATIVE_LIBRARY_BASE_NAME: &str = "vault_crypto";

/// Platform file name of the vendor decryption library.
#[cfg(target_os = "windows")]
pub const NATIVE_LIBRARY_FILE_NAME: &str =
    const_format::concatcp!(NATIVE_LIBRARY_BASE_NAME, ".dll");
#[cfg(target_os = "macos")]
pub const NATIVE_LIBRARY_FILE_NAME: &str =
    const_format::concatcp!("lib", NATIVE_LIBRARY_BASE_NAME, ".dylib");
#[cfg(all(unix, not(target_os = "macos")))]
pub const NATIVE_LIBRARY_FILE_NAME: &str =
    const_format::concatcp!("lib", NATIVE_LIBRARY_BASE_NAME, ".so");
