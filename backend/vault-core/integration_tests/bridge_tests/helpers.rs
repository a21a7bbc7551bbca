//! Test helpers for bridge integration tests.
//!
//! This module provides utilities for testing the decrypt bridge:
//! - A scripted [`DecryptBackend`] whose behavior is keyed off the input
//!   file name (`ok-*` succeeds, `fail-*` returns a non-zero status,
//!   `crash-*` panics the worker thread)
//! - Backend factories wired to a probe that records execution traces and
//!   factory invocations
//! - Config and progress-sink helpers

use vault_core::dispatcher::ProgressSink;
use vault_core::error::NativeError;
use vault_core::{BackendFactory, BridgeConfig, DecryptBackend};

use common::{ErrorLocation, RedactedHexKey};

use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Error text the scripted backend leaves in its last-error buffer.
pub const SCRIPTED_ERROR_MESSAGE: &str = "bad key";

/// Non-zero status the scripted backend returns for `fail-*` inputs.
pub const SCRIPTED_FAILURE_STATUS: i32 = 3;

/// Progress steps the scripted backend reports for `ok-*` inputs.
pub const SCRIPTED_TOTAL_STEPS: u64 = 5;

/// Shared observation point for everything the scripted backend does.
#[derive(Clone, Default)]
pub struct BackendProbe {
    trace: Arc<Mutex<Vec<String>>>,
    factory_calls: Arc<AtomicUsize>,
}

impl BackendProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the `start:`/`end:` execution trace.
    pub fn trace(&self) -> Vec<String> {
        self.trace.lock().expect("trace lock").clone()
    }

    /// How many times the backend factory has run (one per worker start).
    pub fn factory_calls(&self) -> usize {
        self.factory_calls.load(Ordering::SeqCst)
    }

    fn record(&self, entry: String) {
        self.trace.lock().expect("trace lock").push(entry);
    }
}

/// Backend whose behavior is scripted by the input file name.
struct ScriptedBackend {
    probe: BackendProbe,
}

impl ScriptedBackend {
    fn input_name(input_path: &Path) -> String {
        input_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("")
            .to_string()
    }
}

impl DecryptBackend for ScriptedBackend {
    fn decrypt_with_progress(
        &self,
        input_path: &Path,
        _output_path: &Path,
        _hex_key: &str,
        on_progress: &mut dyn FnMut(u64, u64),
    ) -> Result<i32, NativeError> {
        let name = Self::input_name(input_path);
        self.probe.record(format!("start:{name}"));

        if name.starts_with("crash") {
            panic!("scripted backend crash for {name}");
        }

        if name.starts_with("fail") {
            self.probe.record(format!("end:{name}"));
            return Ok(SCRIPTED_FAILURE_STATUS);
        }

        for step in 1..=SCRIPTED_TOTAL_STEPS {
            on_progress(step, SCRIPTED_TOTAL_STEPS);
        }
        // Long enough for a second submit to land while this one runs
        std::thread::sleep(Duration::from_millis(20));

        self.probe.record(format!("end:{name}"));
        Ok(0)
    }

    fn last_error_message(&self, buffer_len: usize) -> Result<Vec<u8>, NativeError> {
        // NUL-padded fixed buffer, exactly like the vendor call fills it
        let mut raw = SCRIPTED_ERROR_MESSAGE.as_bytes().to_vec();
        raw.resize(buffer_len, 0);
        Ok(raw)
    }
}

/// Factory producing scripted backends wired to `probe`.
pub fn scripted_factory(probe: &BackendProbe) -> BackendFactory {
    let probe = probe.clone();
    Arc::new(move || {
        probe.factory_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedBackend {
            probe: probe.clone(),
        }) as Box<dyn DecryptBackend>)
    })
}

/// Factory that always fails, simulating an unloadable vendor library.
pub fn failing_factory(message: &str, calls: Arc<AtomicUsize>) -> BackendFactory {
    let message = message.to_string();
    Arc::new(move || {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(NativeError::LibraryLoad {
            path: PathBuf::from("scripted-backend"),
            message: message.clone(),
            location: ErrorLocation::from(Location::caller()),
        })
    })
}

/// Bridge config for tests: throttle disabled so every progress step is
/// observable, short readiness timeout so failures surface fast.
pub fn test_config() -> BridgeConfig {
    let mut config = BridgeConfig::new("scripted-backend");
    config.ready_timeout_ms = 2_000;
    config.progress_interval_ms = 0;
    config
}

/// A well-formed (but meaningless) database key.
pub fn test_key() -> RedactedHexKey {
    RedactedHexKey::new("00ff".repeat(16))
}

/// Progress sink recording every `(current, total)` it receives.
pub fn recording_sink() -> (ProgressSink, Arc<Mutex<Vec<(u64, u64)>>>) {
    let observed = Arc::new(Mutex::new(Vec::new()));
    let sink_observed = Arc::clone(&observed);
    let sink: ProgressSink = Box::new(move |current, total| {
        sink_observed
            .lock()
            .expect("progress lock")
            .push((current, total));
    });
    (sink, observed)
}
