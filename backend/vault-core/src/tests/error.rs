// Unit tests for the crate-level error aggregate.

use crate::error::{ConfigError, CoreError, DispatchError, LoggerError, NativeError};

use common::ErrorLocation;

use std::panic::Location;

/// **VALUE**: Verifies that every domain error converts into [`CoreError`]
/// via `From` and that the aggregate is transparent: the rendered message is
/// the inner error's, with no extra wrapping.
///
/// **WHY THIS MATTERS**: `CoreError` is the single error type embedders
/// match on when they don't care which subsystem failed. If a `#[from]` arm
/// is dropped, `?` stops compiling at that seam; if transparency is lost,
/// every message grows a redundant prefix and log parsing breaks.
///
/// **BUG THIS CATCHES**: Would catch removing a `#[from]` attribute or
/// swapping `#[error(transparent)]` for a formatted variant message.
#[test]
fn given_domain_errors_when_aggregated_then_variant_and_message_preserved() {
    // GIVEN: One error per domain
    let dispatch = DispatchError::WorkerCrashed {
        message: "worker crashed mid-task".to_string(),
        location: ErrorLocation::from(Location::caller()),
    };
    let native = NativeError::InvalidArgument {
        message: "hex key contains an interior NUL byte".to_string(),
        location: ErrorLocation::from(Location::caller()),
    };
    let config = ConfigError::Validation {
        reason: "library_path cannot be empty".to_string(),
        location: ErrorLocation::from(Location::caller()),
    };
    let logger = LoggerError::Init {
        message: "failed to create log file".to_string(),
        location: ErrorLocation::from(Location::caller()),
    };

    // WHEN/THEN: Each converts into its aggregate variant and renders
    // exactly as the inner error does
    let expected = dispatch.to_string();
    let aggregated = CoreError::from(dispatch);
    assert!(matches!(aggregated, CoreError::Dispatch(_)));
    assert_eq!(aggregated.to_string(), expected);

    let expected = native.to_string();
    let aggregated = CoreError::from(native);
    assert!(matches!(aggregated, CoreError::Native(_)));
    assert_eq!(aggregated.to_string(), expected);

    let expected = config.to_string();
    let aggregated = CoreError::from(config);
    assert!(matches!(aggregated, CoreError::Config(_)));
    assert_eq!(aggregated.to_string(), expected);

    let expected = logger.to_string();
    let aggregated = CoreError::from(logger);
    assert!(matches!(aggregated, CoreError::Logger(_)));
    assert_eq!(aggregated.to_string(), expected);
}
