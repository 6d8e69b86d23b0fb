//! Structured lifecycle events for bridge runs.
//!
//! Stands in for the hosting platform's grouped log sections with a
//! tracing span guard, and emits the key lifecycle events at `info!` with
//! stable `event` field names. Detail lines go through `debug!` and are
//! hidden unless verbose logging is enabled.

use std::path::Path;

use tracing::{info, warn};

/// RAII guard that enters a named phase span (`publish`, `collect`, ...)
/// for the duration of a pipeline stage.
pub struct PhaseSpan {
    _span: tracing::span::EnteredSpan,
}

impl PhaseSpan {
    /// Create and enter a span tagged with the phase name.
    pub fn enter(phase: &str) -> Self {
        let span = tracing::info_span!("bridge.phase", phase = %phase);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: bundle assembled on disk.
pub fn emit_bundle_written(path: &Path, output_count: usize, file_count: usize) {
    info!(
        event = "bridge.bundle_written",
        path = %path.display(),
        outputs = output_count,
        files = file_count,
    );
}

/// Emit event: bundle parsed and structurally validated.
pub fn emit_bundle_loaded(repository: &str, run_id: &str, event_name: &str) {
    info!(
        event = "bridge.bundle_loaded",
        repository = %repository,
        run_id = %run_id,
        event_name = %event_name,
    );
}

/// Emit event: every supplied identity binding held.
pub fn emit_expectations_ok(repository: &str, run_id: &str) {
    info!(event = "bridge.expectations_ok", repository = %repository, run_id = %run_id);
}

/// Emit event: an identity binding failed (the caller still aborts with
/// the error itself).
pub fn emit_expectation_failed(reason: &dyn std::fmt::Display) {
    warn!(event = "bridge.expectation_failed", reason = %reason);
}

/// Emit event: outputs re-published through the sink.
pub fn emit_outputs_emitted(count: usize, extracted: usize) {
    info!(
        event = "bridge.outputs_emitted",
        count = count,
        extracted = extracted,
    );
}

/// Emit event: attached file tree restore finished.
pub fn emit_files_restored(dest: &Path, restored: bool) {
    info!(event = "bridge.files_restored", dest = %dest.display(), restored = restored);
}
