pub mod config;
pub mod dispatch;
pub mod logger;
pub mod native;

pub use config::ConfigError;
pub use dispatch::DispatchError;
pub use logger::LoggerError;
pub use native::NativeError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Dispatch(#[from] dispatch::DispatchError),

    #[error(transparent)]
    Native(#[from] native::NativeError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Logger(#[from] logger::LoggerError),
}
