//! Domain models for implreport.
//!
//! Canonical definitions for the core entities:
//! - `TestId`: opaque test key derived from a file name
//! - `Verdict`: outcome of a test on an engine
//! - `ResultRecord`: one observation (import or submission) with precedence
//! - `Test`: per-test winners, pending import and combo linkage

pub mod error;
pub mod record;
pub mod test_entity;
pub mod test_id;
pub mod verdict;

pub use error::{ReportError, Result};
pub use record::{
    EngineAlias, ImportResult, Precedence, Reliability, ResultRecord, SubmissionFields,
    SubmissionResult,
};
pub use test_entity::Test;
pub use test_id::TestId;
pub use verdict::Verdict;
