//! Test verdicts as reported by imports, expectations and submitters.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of a single test on a single engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail,
    Skip,
    Invalid,
    NoSupport,
    Uncertain,
    /// Free text from a submitter that matches none of the known verdicts.
    Other(String),
}

impl Verdict {
    /// Parse a verdict case-insensitively. Unknown text is kept verbatim.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "pass" | "passed" => Verdict::Pass,
            "fail" | "failed" | "failure" => Verdict::Fail,
            "skip" | "skipped" => Verdict::Skip,
            "invalid" => Verdict::Invalid,
            "no_support" | "not_supported" | "na" => Verdict::NoSupport,
            "uncertain" | "?" => Verdict::Uncertain,
            _ => Verdict::Other(trimmed.to_string()),
        }
    }

    /// Canonical stored spelling.
    pub fn as_str(&self) -> &str {
        match self {
            Verdict::Pass => "pass",
            Verdict::Fail => "fail",
            Verdict::Skip => "skip",
            Verdict::Invalid => "invalid",
            Verdict::NoSupport => "no_support",
            Verdict::Uncertain => "uncertain",
            Verdict::Other(text) => text.as_str(),
        }
    }

    /// Spelling used in published artifacts; `no_support` is published as `fail`.
    pub fn display_str(&self) -> &str {
        match self {
            Verdict::NoSupport => "fail",
            other => other.as_str(),
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }

    /// `fail` or `no_support`.
    pub fn is_failure(&self) -> bool {
        matches!(self, Verdict::Fail | Verdict::NoSupport)
    }

    /// Rank used when two equal-precedence records disagree: a passing side
    /// never suppresses a non-passing one, and failures outrank everything.
    pub(crate) fn tie_rank(&self) -> u8 {
        if self.is_failure() {
            2
        } else if self.is_pass() {
            0
        } else {
            1
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_verdicts_case_insensitively() {
        assert_eq!(Verdict::parse("PASS"), Verdict::Pass);
        assert_eq!(Verdict::parse(" fail "), Verdict::Fail);
        assert_eq!(Verdict::parse("Invalid"), Verdict::Invalid);
        assert_eq!(Verdict::parse("na"), Verdict::NoSupport);
        assert_eq!(Verdict::parse("uncertain"), Verdict::Uncertain);
    }

    #[test]
    fn test_parse_keeps_unknown_text() {
        assert_eq!(
            Verdict::parse("crashed hard"),
            Verdict::Other("crashed hard".to_string())
        );
    }

    #[test]
    fn test_no_support_is_published_as_fail() {
        assert_eq!(Verdict::NoSupport.as_str(), "no_support");
        assert_eq!(Verdict::NoSupport.display_str(), "fail");
        assert!(Verdict::NoSupport.is_failure());
    }

    #[test]
    fn test_tie_rank_orders_fail_over_other_over_pass() {
        assert!(Verdict::Fail.tie_rank() > Verdict::Invalid.tie_rank());
        assert!(Verdict::Invalid.tie_rank() > Verdict::Pass.tie_rank());
        assert_eq!(Verdict::Fail.tie_rank(), Verdict::NoSupport.tie_rank());
    }
}
