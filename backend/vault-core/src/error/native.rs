use common::ErrorLocation;

use std::path::PathBuf;

use thiserror::Error as ThisError;

/// Errors from loading or calling the vendor decryption library.
#[derive(Debug, ThisError)]
pub enum NativeError {
    #[error("Library Load Error: {path}: {message} {location}")]
    LibraryLoad {
        path: PathBuf,
        message: String,
        location: ErrorLocation,
    },

    #[error("Missing Symbol: {symbol}: {message} {location}")]
    MissingSymbol {
        symbol: &'static str,
        message: String,
        location: ErrorLocation,
    },

    #[error("Path Encoding Error: {path} {location}")]
    PathEncoding {
        path: PathBuf,
        location: ErrorLocation,
    },

    #[error("Invalid Argument: {message} {location}")]
    InvalidArgument {
        message: String,
        location: ErrorLocation,
    },

    #[error("Error Lookup Failed: {message} {location}")]
    ErrorLookup {
        message: String,
        location: ErrorLocation,
    },
}
