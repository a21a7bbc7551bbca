//! Integration tests driving the decrypt bridge end to end through its
//! public API, with a scripted backend standing in for the vendor library.

mod bridge_tests {
    pub mod helpers;

    mod decrypt;
    mod lifecycle;
}
