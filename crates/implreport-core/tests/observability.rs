//! Structured lifecycle events emitted during a report run.

use implreport_core::obs::{emit_combo_resolved, emit_load_finished, emit_report_written, RunSpan};
use implreport_core::{ReportConfig, ReportPipeline};
use tracing_test::traced_test;

#[traced_test]
#[test]
fn load_finished_event_carries_channel_and_counts() {
    emit_load_finished("submissions", 120, 3);

    assert!(logs_contain("load.finished"));
    assert!(logs_contain("channel=submissions"));
    assert!(logs_contain("applied=120"));
}

#[traced_test]
#[test]
fn combo_and_report_events_are_emitted() {
    emit_combo_resolved(4, 2, 3);
    emit_report_written(10, 8, 6, 2);

    assert!(logs_contain("combo.resolved"));
    assert!(logs_contain("report.written"));
    assert!(logs_contain("coverage=8"));
}

#[traced_test]
#[test]
fn run_span_tags_pipeline_events() {
    let _span = RunSpan::enter("css-writing-modes-3");
    let mut pipeline = ReportPipeline::new(ReportConfig::default());
    pipeline.load_template("t-001.html\tr1\t?\n");
    pipeline.resolve().expect("resolve");

    assert!(logs_contain("implreport.run"));
    assert!(logs_contain("channel=template"));
    assert!(logs_contain("combo.resolved"));
}

#[traced_test]
#[test]
fn malformed_lines_are_warned_about() {
    let mut pipeline = ReportPipeline::new(ReportConfig::default());
    let stats = pipeline
        .load_submissions("t-001,pass\n")
        .expect("submissions");

    assert_eq!(stats.skipped, 1);
    assert!(logs_contain("submission row too short"));
}
