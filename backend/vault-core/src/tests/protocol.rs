// Unit tests for the cross-thread protocol types.

use crate::protocol::{ProtocolMessage, TaskId};

use common::RedactedHexKey;

use std::path::PathBuf;

/// **VALUE**: Verifies that two generated task ids are distinct.
///
/// **WHY THIS MATTERS**: The id is the only correlation between a request
/// and its progress/terminal messages. A colliding generator would resolve
/// one caller's future with another caller's result.
///
/// **BUG THIS CATCHES**: Would catch a counter reset or a constant-seed
/// generator producing repeated ids.
#[test]
fn given_two_generated_ids_when_compared_then_distinct() {
    let first = TaskId::new();
    let second = TaskId::new();
    assert_ne!(first, second);
}

/// **VALUE**: Verifies that a task id displays as its UUID, usable in logs
/// and error messages.
///
/// **WHY THIS MATTERS**: Operators trace a stuck task across dispatcher and
/// worker logs by its id. An opaque `Debug`-only type would make that
/// correlation painful.
///
/// **BUG THIS CATCHES**: Would catch a `Display` implementation printing the
/// wrapper struct instead of the inner UUID.
#[test]
fn given_task_id_when_displayed_then_renders_as_uuid() {
    let id = TaskId::new();
    let rendered = id.to_string();

    // Hyphenated UUID form: 36 characters, 4 hyphens
    assert_eq!(rendered.len(), 36);
    assert_eq!(rendered.matches('-').count(), 4);
}

/// **VALUE**: Verifies that debug-formatting a `Decrypt` message never
/// exposes the database key.
///
/// **WHY THIS MATTERS**: Protocol messages are logged on the unexpected-
/// variant path and in debug traces. The hex key decrypts the user's entire
/// message history; one stray `{:?}` must not leak it.
///
/// **BUG THIS CATCHES**: Would catch replacing `RedactedHexKey` with a plain
/// `String` field in the message type.
#[test]
fn given_decrypt_message_when_debug_formatted_then_key_redacted() {
    let key_material = "a1b2c3d4e5f6";
    let message = ProtocolMessage::Decrypt {
        id: TaskId::new(),
        input_path: PathBuf::from("/tmp/in.db"),
        output_path: PathBuf::from("/tmp/out.db"),
        hex_key: RedactedHexKey::new(key_material.to_string()),
    };

    let rendered = format!("{message:?}");
    assert!(!rendered.contains(key_material), "key leaked: {rendered}");
    assert!(rendered.contains("REDACTED"));
}
