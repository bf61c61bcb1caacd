//! implreport core library
//!
//! Merges a browser engine's imported regression-suite results, maintainer
//! expectation overrides, suite-level known issues and community submissions
//! into one canonical result per test and engine, then renders the W3C
//! implementation report (TSV) and a JSON snapshot.

pub mod combo;
pub mod config;
pub mod domain;
pub mod loaders;
pub mod obs;
pub mod pipeline;
pub mod registry;
pub mod reporter;
pub mod telemetry;

pub use combo::{resolve_combos, ComboStats};
pub use config::{ReportConfig, HOME_ENGINE_ENV};
pub use domain::{
    EngineAlias, ImportResult, Precedence, Reliability, ReportError, Result, ResultRecord,
    SubmissionFields, SubmissionResult, Test, TestId, Verdict,
};
pub use loaders::LoadStats;
pub use pipeline::{ReportPipeline, ResolvedReport};
pub use registry::{ResolvedRegistry, TestRegistry};
pub use reporter::{
    build_snapshot, write_snapshot_json, EngineEntry, Report, ReportRow, ReportTotals,
    SnapshotEntry, TSV_HEADER,
};
pub use telemetry::init_tracing;

/// Crate version, reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
