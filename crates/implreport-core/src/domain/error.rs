//! Domain-level error taxonomy for implreport.
//!
//! Every variant here is fatal for a report run. Recoverable input problems
//! (malformed lines, references to unknown tests) are logged and skipped by
//! the loaders and never surface as a `ReportError`.

use super::test_id::TestId;

/// implreport domain errors.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("duplicate test id registered: {id} ({first} and {second})")]
    DuplicateTest {
        id: TestId,
        first: String,
        second: String,
    },

    #[error("test {id} already has an imported result")]
    AlreadyImported { id: TestId },

    #[error("test {id} has no imported result")]
    NotImported { id: TestId },

    #[error("test {id} already tracks issue {existing}")]
    IssueAlreadyAttached { id: TestId, existing: String },

    #[error("submission for engine {engine} reached the recency tie-break without a date")]
    MissingSubmissionDate { engine: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for implreport domain operations.
pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_test_error_names_both_files() {
        let err = ReportError::DuplicateTest {
            id: TestId::new("block-flow-001").expect("valid id"),
            first: "a/block-flow-001.html".to_string(),
            second: "b/block-flow-001.xht".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("block-flow-001"));
        assert!(msg.contains("a/block-flow-001.html"));
        assert!(msg.contains("b/block-flow-001.xht"));
    }

    #[test]
    fn test_issue_already_attached_error() {
        let err = ReportError::IssueAlreadyAttached {
            id: TestId::new("t-001").expect("valid id"),
            existing: "https://github.com/w3c/csswg-test/issues/1".to_string(),
        };
        assert!(err.to_string().contains("issues/1"));
    }

    #[test]
    fn test_missing_date_error() {
        let err = ReportError::MissingSubmissionDate {
            engine: "gecko".to_string(),
        };
        assert!(err.to_string().contains("gecko"));
        assert!(err.to_string().contains("without a date"));
    }
}
