use crate::bridge_tests::helpers::{
    recording_sink, scripted_factory, test_config, test_key, BackendProbe,
    SCRIPTED_ERROR_MESSAGE, SCRIPTED_TOTAL_STEPS,
};

use vault_core::error::DispatchError;
use vault_core::DecryptBridge;

use tempfile::TempDir;

/// **VALUE**: Verifies the happy path end to end: submit, worker start,
/// native success, future resolves Ok, output directory created.
///
/// **WHY THIS MATTERS**: This is the one flow every user hits: decrypt a
/// database into a fresh output location. If lazy worker startup, request
/// dispatch or terminal-message correlation is broken, nothing else in the
/// bridge matters.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - The worker never signals readiness or the actor never starts it
/// - Success messages don't resolve the matching pending task
/// - The output directory chain is not created before the native call
#[tokio::test]
async fn given_valid_task_when_decrypted_then_resolves_ok() {
    // GIVEN: A bridge over a scripted backend and a fresh output location
    let probe = BackendProbe::new();
    let bridge = DecryptBridge::with_backend_factory(test_config(), scripted_factory(&probe));
    let output_dir = TempDir::new().expect("temp dir");
    let output_path = output_dir.path().join("decrypted/db.sqlite");

    // WHEN: Decrypting
    let result = bridge
        .decrypt("/tmp/ok-main.db", &output_path, test_key(), None)
        .await;

    // THEN: The task resolves Ok and the output directory exists
    assert!(result.is_ok(), "decrypt should succeed: {result:?}");
    assert!(
        output_dir.path().join("decrypted").is_dir(),
        "output directory chain should be created"
    );
    assert_eq!(
        probe.trace(),
        vec!["start:ok-main.db", "end:ok-main.db"],
        "exactly one backend execution"
    );
}

/// **VALUE**: Verifies that a non-zero native status surfaces as a
/// `NativeDecrypt` error carrying the vendor's decoded message.
///
/// **WHY THIS MATTERS**: "Wrong key" is the most common user-facing failure.
/// The user sees exactly this message; NUL padding from the fixed native
/// buffer or a lost status code would make it garbage.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - The worker treats a non-zero status as success
/// - The last-error buffer is not fetched or not trimmed
/// - The error resolves the wrong pending task or the wrong variant
#[tokio::test]
async fn given_failing_task_when_decrypted_then_native_error_with_message() {
    // GIVEN: A bridge whose backend reports a native failure
    let probe = BackendProbe::new();
    let bridge = DecryptBridge::with_backend_factory(test_config(), scripted_factory(&probe));
    let output_dir = TempDir::new().expect("temp dir");

    // WHEN: Decrypting an input scripted to fail
    let result = bridge
        .decrypt(
            "/tmp/fail-main.db",
            output_dir.path().join("db.sqlite"),
            test_key(),
            None,
        )
        .await;

    // THEN: The error carries the vendor message, free of NUL padding
    match result {
        Err(DispatchError::NativeDecrypt { message, .. }) => {
            assert_eq!(message, SCRIPTED_ERROR_MESSAGE);
        }
        other => panic!("Expected NativeDecrypt, got {other:?}"),
    }
}

/// **VALUE**: Verifies the progress contract: with the throttle disabled,
/// every step arrives, starting at step 1, ending at `current == total`,
/// non-decreasing, and all before the future resolves.
///
/// **WHY THIS MATTERS**: Progress is the only feedback during a long
/// decrypt. A missing first or terminal step leaves the UI stuck at 0% or
/// ending mid-bar; progress after resolution would fire callbacks into torn-
/// down UI state.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - Progress messages are routed to the wrong task or dropped
/// - The worker emits the terminal message before draining progress
/// - Ordering across the two channels is not preserved
#[tokio::test]
async fn given_progress_sink_when_decrypted_then_full_ordered_stream() {
    // GIVEN: A bridge with the throttle disabled and a recording sink
    let probe = BackendProbe::new();
    let bridge = DecryptBridge::with_backend_factory(test_config(), scripted_factory(&probe));
    let output_dir = TempDir::new().expect("temp dir");
    let (sink, observed) = recording_sink();

    // WHEN: Decrypting with the sink attached
    bridge
        .decrypt(
            "/tmp/ok-main.db",
            output_dir.path().join("db.sqlite"),
            test_key(),
            Some(sink),
        )
        .await
        .expect("decrypt should succeed");

    // THEN: Every step was observed, in order, before the future resolved
    let observed = observed.lock().expect("progress lock").clone();
    let expected: Vec<(u64, u64)> = (1..=SCRIPTED_TOTAL_STEPS)
        .map(|step| (step, SCRIPTED_TOTAL_STEPS))
        .collect();
    assert_eq!(observed, expected);
}

/// **VALUE**: Verifies that concurrent submits execute strictly one at a
/// time, in submission order, on the single worker.
///
/// **WHY THIS MATTERS**: The vendor library is not reentrant; overlapping
/// native calls corrupt its internal state. FIFO ordering is also what makes
/// the bridge's behavior predictable under load.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - A second worker thread is spawned for a queued task
/// - The request queue reorders submissions
/// - A task starts before the previous one finished
#[tokio::test]
async fn given_concurrent_submits_when_executed_then_serial_fifo_order() {
    // GIVEN: A bridge over a scripted backend
    let probe = BackendProbe::new();
    let bridge = DecryptBridge::with_backend_factory(test_config(), scripted_factory(&probe));
    let output_dir = TempDir::new().expect("temp dir");

    // WHEN: Two tasks are submitted concurrently
    let (first, second) = tokio::join!(
        bridge.decrypt(
            "/tmp/ok-first.db",
            output_dir.path().join("first.sqlite"),
            test_key(),
            None,
        ),
        bridge.decrypt(
            "/tmp/ok-second.db",
            output_dir.path().join("second.sqlite"),
            test_key(),
            None,
        ),
    );

    // THEN: Both succeed and the executions never interleave
    assert!(first.is_ok(), "first decrypt should succeed: {first:?}");
    assert!(second.is_ok(), "second decrypt should succeed: {second:?}");
    assert_eq!(
        probe.trace(),
        vec![
            "start:ok-first.db",
            "end:ok-first.db",
            "start:ok-second.db",
            "end:ok-second.db",
        ],
        "tasks must run one at a time, in submission order"
    );
}

/// **VALUE**: Verifies that concurrent tasks resolve independently: one
/// failure and one success never contaminate each other.
///
/// **WHY THIS MATTERS**: The pending table correlates results by task id.
/// A correlation bug would hand one caller another caller's outcome - a
/// successful decrypt reported as "bad key" or vice versa.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - Terminal messages resolve the wrong pending entry
/// - Progress from one task reaches another task's sink
/// - A failed task takes down its queued successor
#[tokio::test]
async fn given_mixed_outcomes_when_concurrent_then_no_cross_contamination() {
    // GIVEN: A bridge and a progress sink attached only to the failing task
    let probe = BackendProbe::new();
    let bridge = DecryptBridge::with_backend_factory(test_config(), scripted_factory(&probe));
    let output_dir = TempDir::new().expect("temp dir");
    let (fail_sink, fail_observed) = recording_sink();

    // WHEN: A failing and a succeeding task run back to back
    let (fail_result, ok_result) = tokio::join!(
        bridge.decrypt(
            "/tmp/fail-first.db",
            output_dir.path().join("first.sqlite"),
            test_key(),
            Some(fail_sink),
        ),
        bridge.decrypt(
            "/tmp/ok-second.db",
            output_dir.path().join("second.sqlite"),
            test_key(),
            None,
        ),
    );

    // THEN: Each task gets its own outcome
    assert!(
        matches!(fail_result, Err(DispatchError::NativeDecrypt { .. })),
        "failing task must resolve with the native error: {fail_result:?}"
    );
    assert!(
        ok_result.is_ok(),
        "queued task must be unaffected by its predecessor's failure: {ok_result:?}"
    );

    // THEN: The succeeding task's progress never reached the other sink
    assert!(
        fail_observed.lock().expect("progress lock").is_empty(),
        "failing task reports no progress; anything here leaked across tasks"
    );
}
