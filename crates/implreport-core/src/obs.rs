//! Structured observability hooks for the report pipeline.
//!
//! This module provides:
//! - A run-scoped tracing span via the `RunSpan` RAII guard
//! - Emission functions for the phase boundaries: load, combo resolution,
//!   report written
//!
//! Events are emitted at `info!` level; filter with `RUST_LOG`.

use tracing::info;

/// RAII guard that enters a run-scoped tracing span for the duration of a
/// report run.
///
/// # Example
///
/// ```ignore
/// let _span = RunSpan::enter("css-writing-modes-3");
/// // every event below carries suite = "css-writing-modes-3"
/// ```
pub struct RunSpan {
    _span: tracing::span::EnteredSpan,
}

impl RunSpan {
    /// Create and enter a span tagged with the suite name.
    pub fn enter(suite: &str) -> Self {
        let span = tracing::info_span!("implreport.run", suite = %suite);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: one input channel finished loading.
///
/// ```ignore
/// emit_load_finished("submissions", 120, 3);
/// // logs: event=load.finished channel=submissions applied=120 skipped=3
/// ```
pub fn emit_load_finished(channel: &str, applied: usize, skipped: usize) {
    info!(
        event = "load.finished",
        channel = %channel,
        applied = applied,
        skipped = skipped,
    );
}

/// Emit event: combo resolution completed.
pub fn emit_combo_resolved(links: usize, parents: usize, propagated: usize) {
    info!(
        event = "combo.resolved",
        links = links,
        parents = parents,
        propagated = propagated,
    );
}

/// Emit event: report rendered with its headline totals.
pub fn emit_report_written(total: usize, coverage: usize, passed: usize, failed: usize) {
    info!(
        event = "report.written",
        total = total,
        coverage = coverage,
        passed = passed,
        failed = failed,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_span_create() {
        let _span = RunSpan::enter("test-suite");
        emit_load_finished("template", 1, 0);
    }
}
