//! Input loaders.
//!
//! Each channel is split in two steps:
//! - `parse_*` turns raw text into records, warning about and skipping any
//!   line it cannot understand;
//! - `apply_*` drives the registry mutation API with those records, dropping
//!   (with a warning) records that reference unknown tests or would violate a
//!   precondition.
//!
//! Only conditions that indicate a broken run (duplicate test files, I/O
//! failures) are returned as errors.

pub mod comment_block;
pub mod discovery;
pub mod expectations;
pub mod import_expectations;
pub mod submissions;
pub mod template;

pub use discovery::{apply_discovered, discover_test_files, DiscoveredFile};
pub use expectations::{apply_test_expectations, parse_test_expectations, ExpectationAction, TestExpectation};
pub use import_expectations::{apply_import_expectations, parse_import_expectations, ImportExpectation};
pub use submissions::{apply_submissions, parse_submissions, Submission};
pub use template::{apply_template, parse_template, TemplateEntry};

/// Records parsed from one input, plus the number of lines skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed<T> {
    pub records: Vec<T>,
    pub skipped: usize,
}

impl<T> Default for Parsed<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: 0,
        }
    }
}

/// Outcome counters of loading one input channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Records that reached the registry.
    pub applied: usize,
    /// Lines or records dropped with a warning.
    pub skipped: usize,
}

impl LoadStats {
    pub(crate) fn with_parse_skips(mut self, skipped: usize) -> Self {
        self.skipped += skipped;
        self
    }
}
