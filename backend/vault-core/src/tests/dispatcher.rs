// Unit tests for the actor's handling of worker messages that reference no
// pending task (stray terminal and progress events).

use crate::config::BridgeConfig;
use crate::dispatcher::actor::{BridgeActor, PendingTask};
use crate::dispatcher::ProgressSink;
use crate::error::NativeError;
use crate::native::BackendFactory;
use crate::protocol::{ProtocolMessage, TaskId};

use common::ErrorLocation;

use std::panic::Location;
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};

/// Factory for actors that never start a worker in these tests.
fn unused_factory() -> BackendFactory {
    Arc::new(|| {
        Err(NativeError::InvalidArgument {
            message: "backend must not be constructed in this test".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
    })
}

fn test_actor() -> BridgeActor {
    let (_command_tx, command_rx) = mpsc::channel(1);
    BridgeActor::new(BridgeConfig::default(), unused_factory(), command_rx)
}

/// **VALUE**: Verifies that terminal messages carrying an unknown correlation
/// id are dropped without panicking and without disturbing pending tasks.
///
/// **WHY THIS MATTERS**: A stray `Success`/`Error` can arrive after its task
/// was already resolved (for example a late event raced against a crash
/// drain). The actor owns every caller's completion slot; mishandling an
/// unknown id by panicking would take the whole bridge down, and resolving
/// the wrong entry would hand one caller another caller's outcome.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - The lookup-miss path unwraps or indexes instead of matching on `remove`
/// - An unknown terminal message resolves or evicts an unrelated task
/// - The known task becomes unresolvable after a stray message was seen
#[test]
fn given_unknown_id_when_terminal_message_arrives_then_pending_untouched() {
    // GIVEN: An actor with one pending task
    let mut actor = test_actor();
    let known = TaskId::new();
    let (complete_tx, mut complete_rx) = oneshot::channel();
    actor.pending.insert(
        known,
        PendingTask {
            progress: None,
            complete: complete_tx,
        },
    );

    // WHEN: Terminal messages arrive for an id that was never dispatched
    let unknown = TaskId::new();
    actor.handle_message(ProtocolMessage::Success { id: unknown });
    actor.handle_message(ProtocolMessage::Error {
        id: Some(unknown),
        error: "stray failure".to_string(),
    });

    // THEN: The pending task is untouched and unresolved
    assert_eq!(actor.pending.len(), 1, "stray messages must not evict tasks");
    assert!(
        matches!(complete_rx.try_recv(), Err(TryRecvError::Empty)),
        "stray messages must not resolve unrelated tasks"
    );

    // THEN: The known task still resolves normally afterwards
    actor.handle_message(ProtocolMessage::Success { id: known });
    assert!(matches!(complete_rx.try_recv(), Ok(Ok(()))));
    assert!(actor.pending.is_empty());
}

/// **VALUE**: Verifies that progress for an unknown correlation id is dropped
/// and never reaches another task's progress sink.
///
/// **WHY THIS MATTERS**: Progress messages trail their task's resolution on
/// the event channel, so a late one with a dead id is a normal occurrence.
/// Routing it to whatever task happens to be pending would show one decrypt's
/// progress bar jumping to another decrypt's position.
///
/// **BUG THIS CATCHES**: Would catch a progress path that falls back to "any
/// pending task" on lookup miss instead of dropping the message.
#[test]
fn given_unknown_id_when_progress_arrives_then_no_sink_invoked() {
    // GIVEN: An actor with one pending task that records its progress
    let mut actor = test_actor();
    let known = TaskId::new();
    let observed = Arc::new(Mutex::new(Vec::new()));
    let sink_observed = Arc::clone(&observed);
    let sink: ProgressSink = Box::new(move |current, total| {
        sink_observed
            .lock()
            .expect("progress lock")
            .push((current, total));
    });
    let (complete_tx, _complete_rx) = oneshot::channel();
    actor.pending.insert(
        known,
        PendingTask {
            progress: Some(sink),
            complete: complete_tx,
        },
    );

    // WHEN: Progress arrives for an id that was never dispatched
    actor.handle_message(ProtocolMessage::Progress {
        id: TaskId::new(),
        current: 3,
        total: 10,
    });

    // THEN: The pending task's sink saw nothing
    assert!(
        observed.lock().expect("progress lock").is_empty(),
        "stray progress must not reach another task's sink"
    );

    // THEN: Correctly addressed progress still gets through
    actor.handle_message(ProtocolMessage::Progress {
        id: known,
        current: 3,
        total: 10,
    });
    assert_eq!(*observed.lock().expect("progress lock"), vec![(3, 10)]);
}
