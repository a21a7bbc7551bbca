use crate::bridge_tests::helpers::{
    failing_factory, scripted_factory, test_config, test_key, BackendProbe,
};

use vault_core::error::DispatchError;
use vault_core::{BridgeConfig, DecryptBridge};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tempfile::TempDir;

/// **VALUE**: Verifies that a fresh bridge reports unavailable before any
/// task has started a worker.
///
/// **WHY THIS MATTERS**: Embedders gate UI affordances on availability. A
/// bridge that claims readiness before the library ever loaded invites
/// submits that fail with confusing initialization errors.
///
/// **BUG THIS CATCHES**: Would catch an availability check keyed off "actor
/// exists" instead of "worker reached Ready".
#[tokio::test]
async fn given_fresh_bridge_when_queried_then_unavailable() {
    // GIVEN: A bridge that has never run a task
    let probe = BackendProbe::new();
    let bridge = DecryptBridge::with_backend_factory(test_config(), scripted_factory(&probe));

    // WHEN/THEN: Availability is false and no backend was constructed
    assert!(!bridge.is_available().await);
    assert_eq!(probe.factory_calls(), 0, "availability must not start a worker");
}

/// **VALUE**: Verifies that pointing the real loader at a nonexistent
/// library path resolves the submit with an `Initialization` error.
///
/// **WHY THIS MATTERS**: A missing or misplaced vendor library is the most
/// likely deployment failure. It must surface as a typed, retryable error on
/// the submitting call, not as a hang or a crash of the host process.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - Library load failures escape the worker as panics
/// - The pre-task error message never reaches the dispatcher
/// - The submit future is left pending forever on failed startup
#[tokio::test]
async fn given_missing_library_when_decrypted_then_initialization_error() {
    // GIVEN: A bridge over the real loader with a path that cannot exist
    let bridge = DecryptBridge::new(BridgeConfig::new("/nonexistent/libvault_crypto.so"));
    let output_dir = TempDir::new().expect("temp dir");

    // WHEN: Decrypting
    let result = bridge
        .decrypt(
            "/tmp/in.db",
            output_dir.path().join("out.sqlite"),
            test_key(),
            None,
        )
        .await;

    // THEN: The submit resolves with an initialization error, and the
    // bridge still reports unavailable
    assert!(
        matches!(result, Err(DispatchError::Initialization { .. })),
        "expected Initialization, got {result:?}"
    );
    assert!(!bridge.is_available().await);
}

/// **VALUE**: Verifies that initialization failure is fatal to the current
/// submit only: every later submit retries from scratch.
///
/// **WHY THIS MATTERS**: The vendor library can become loadable after the
/// first failure (installation finishing, volume mounting). A bridge that
/// latches the failure would need a process restart to recover.
///
/// **BUG THIS CATCHES**: Would catch caching the failed state and rejecting
/// later submits without rerunning the factory.
#[tokio::test]
async fn given_failed_initialization_when_resubmitted_then_retried() {
    // GIVEN: A bridge whose backend factory always fails
    let calls = Arc::new(AtomicUsize::new(0));
    let bridge = DecryptBridge::with_backend_factory(
        test_config(),
        failing_factory("vendor library not installed", Arc::clone(&calls)),
    );
    let output_dir = TempDir::new().expect("temp dir");

    // WHEN: Submitting twice
    let first = bridge
        .decrypt(
            "/tmp/in.db",
            output_dir.path().join("a.sqlite"),
            test_key(),
            None,
        )
        .await;
    let second = bridge
        .decrypt(
            "/tmp/in.db",
            output_dir.path().join("b.sqlite"),
            test_key(),
            None,
        )
        .await;

    // THEN: Both fail with Initialization and the factory ran once per submit
    assert!(matches!(first, Err(DispatchError::Initialization { .. })));
    assert!(matches!(second, Err(DispatchError::Initialization { .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 2, "each submit must retry");
}

/// **VALUE**: Verifies crash containment and recovery: a worker panic fails
/// the outstanding task with `WorkerCrashed`, flips availability off, and
/// the next submit transparently starts a fresh worker.
///
/// **WHY THIS MATTERS**: The vendor library runs untrusted-quality native
/// code; a crash on one corrupted database must cost exactly that task. If
/// the crash latches, every later decrypt in the session fails; if it goes
/// unnoticed, the caller's future hangs forever.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - A worker panic unwinds into the host instead of being contained
/// - Tasks pending at crash time are left unresolved
/// - The crashed state is never replaced by a fresh worker on resubmit
#[tokio::test]
async fn given_worker_crash_when_resubmitted_then_fresh_worker_recovers() {
    // GIVEN: A bridge over a scripted backend
    let probe = BackendProbe::new();
    let bridge = DecryptBridge::with_backend_factory(test_config(), scripted_factory(&probe));
    let output_dir = TempDir::new().expect("temp dir");

    // WHEN: A task crashes the worker thread
    let crashed = bridge
        .decrypt(
            "/tmp/crash-main.db",
            output_dir.path().join("a.sqlite"),
            test_key(),
            None,
        )
        .await;

    // THEN: That task resolves with WorkerCrashed and the bridge is down
    assert!(
        matches!(crashed, Err(DispatchError::WorkerCrashed { .. })),
        "expected WorkerCrashed, got {crashed:?}"
    );
    assert!(!bridge.is_available().await);
    assert_eq!(probe.factory_calls(), 1);

    // WHEN: The next task is submitted
    let recovered = bridge
        .decrypt(
            "/tmp/ok-main.db",
            output_dir.path().join("b.sqlite"),
            test_key(),
            None,
        )
        .await;

    // THEN: A fresh worker (new factory call) serves it successfully
    assert!(recovered.is_ok(), "recovery decrypt should succeed: {recovered:?}");
    assert_eq!(probe.factory_calls(), 2, "recovery must build a fresh backend");
    assert!(bridge.is_available().await);
}

/// **VALUE**: Verifies that availability turns on once a worker has served
/// a task and stays on between tasks.
///
/// **WHY THIS MATTERS**: Availability is the signal embedders poll to light
/// up decrypt UI. It must reflect the worker's actual lifecycle state, not
/// whether a task happens to be running right now.
///
/// **BUG THIS CATCHES**: Would catch availability tied to in-flight tasks
/// instead of the Ready worker state.
#[tokio::test]
async fn given_completed_task_when_queried_then_available() {
    // GIVEN: A bridge that has completed one task
    let probe = BackendProbe::new();
    let bridge = DecryptBridge::with_backend_factory(test_config(), scripted_factory(&probe));
    let output_dir = TempDir::new().expect("temp dir");
    bridge
        .decrypt(
            "/tmp/ok-main.db",
            output_dir.path().join("db.sqlite"),
            test_key(),
            None,
        )
        .await
        .expect("decrypt should succeed");

    // WHEN/THEN: The idle worker reports available
    assert!(bridge.is_available().await);
}
