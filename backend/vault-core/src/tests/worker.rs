// Unit tests for the worker-side decoding of the vendor's last-error buffer.

use crate::worker::decode_error_message;

/// **VALUE**: Verifies that trailing NUL padding from the fixed-size native
/// buffer is stripped from the decoded message.
///
/// **WHY THIS MATTERS**: `vault_last_error_message` always fills the full
/// buffer, padding short messages with NUL bytes. Those bytes must never
/// reach callers - a message like `"bad key\0\0\0..."` breaks string
/// comparison, logging and display everywhere downstream.
///
/// **BUG THIS CATCHES**: Would catch decoding the raw buffer as-is, or
/// trimming whitespace instead of NULs.
#[test]
fn given_nul_padded_buffer_when_decoded_then_padding_stripped() {
    // GIVEN: A short message inside a larger zeroed buffer
    let mut raw = b"bad key".to_vec();
    raw.resize(64, 0);

    // WHEN: The buffer is decoded
    let message = decode_error_message(raw);

    // THEN: Only the message survives
    assert_eq!(message, "bad key");
}

/// **VALUE**: Verifies that an all-NUL buffer decodes to the empty string.
///
/// **WHY THIS MATTERS**: Some vendor failures leave the error buffer
/// untouched. The worker uses emptiness to decide whether to fall back to the
/// `ErrorCode: {status}` message, so the empty case must be exact.
///
/// **BUG THIS CATCHES**: Would catch a decoder that returns 64 NUL characters
/// and makes the fallback path unreachable.
#[test]
fn given_empty_buffer_when_decoded_then_empty_string() {
    assert_eq!(decode_error_message(vec![0u8; 64]), "");
}

/// **VALUE**: Verifies that invalid UTF-8 in the native buffer is replaced,
/// not rejected.
///
/// **WHY THIS MATTERS**: The vendor library gives no encoding guarantee. A
/// strict UTF-8 decode would turn a decryption error into a secondary decode
/// error and hide the original message from the user.
///
/// **BUG THIS CATCHES**: Would catch switching to `String::from_utf8` with an
/// `unwrap` or error propagation.
#[test]
fn given_invalid_utf8_when_decoded_then_lossy_replacement() {
    // GIVEN: A buffer with an invalid UTF-8 byte in the middle
    let raw = vec![b'k', b'e', b'y', 0xFF, b'!', 0, 0, 0];

    // WHEN: The buffer is decoded
    let message = decode_error_message(raw);

    // THEN: The invalid byte becomes U+FFFD, the rest survives
    assert_eq!(message, "key\u{FFFD}!");
}

/// **VALUE**: Verifies that interior NULs are preserved and only trailing
/// padding is removed.
///
/// **WHY THIS MATTERS**: Trimming from the left or splitting at the first NUL
/// would truncate multi-part vendor messages.
///
/// **BUG THIS CATCHES**: Would catch a `split('\0').next()` style decoder.
#[test]
fn given_interior_nul_when_decoded_then_preserved() {
    let raw = b"part one\0part two\0\0\0".to_vec();
    assert_eq!(decode_error_message(raw), "part one\0part two");
}
