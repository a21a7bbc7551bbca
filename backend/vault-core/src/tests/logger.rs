// Unit tests for logger initialization.
//
// The logger installs a process-global dispatcher, so a test binary gets
// exactly one meaningful initialization attempt. One test exercises the
// failure path and the repeat-call guard in sequence.

use crate::logger;

use serial_test::serial;
use std::path::Path;

/// **VALUE**: Verifies that a failed first initialization reports an error
/// and that every later call is an idempotent no-op returning Ok.
///
/// **WHY THIS MATTERS**: Embedders call `initialize` from multiple startup
/// paths. The first failure must be visible (no silent loss of all logging),
/// and repeat calls must never panic or double-install the dispatcher.
///
/// **BUG THIS CATCHES**: Would catch an initializer that swallows file-open
/// failures, or one that forgets the already-called guard and errors on the
/// second call.
#[test]
#[serial]
fn given_unwritable_log_dir_when_initialized_then_error_and_later_calls_noop() {
    // GIVEN: A log directory that does not exist (fern cannot create the file)
    let missing_dir = Path::new("/nonexistent/chatvault/logs");

    // WHEN: Initializing against it
    let first = logger::initialize(missing_dir);

    // THEN: The failure surfaces
    assert!(first.is_err(), "first initialization should fail");

    // WHEN: Initializing again, even with a different directory
    let second = logger::initialize(Path::new("."));

    // THEN: The guard makes it a no-op success
    assert!(second.is_ok(), "repeat initialization should be a no-op");
}
