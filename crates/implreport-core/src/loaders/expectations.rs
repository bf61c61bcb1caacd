//! Maintainer test expectations (Blink `TestExpectations` format).
//!
//! Lines look like
//! `crbug.com/123 [ Linux Win ] imported/csswg-test/css-writing-modes-3/t-001.html [ Failure ]`.
//! The bug and the bracketed conditions are optional.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use super::comment_block::CommentBlock;
use super::{LoadStats, Parsed};
use crate::domain::error::Result;
use crate::domain::test_id::TestId;
use crate::domain::verdict::Verdict;
use crate::registry::TestRegistry;

static EXPECTATION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?P<bug>[^\[\s]\S*)\s+)?(?:\[(?P<conditions>[^\]]*)\]\s+)?(?P<path>\S+)\s+\[(?P<results>[^\]]+)\]$",
    )
    .expect("expectation pattern is valid")
});

/// Comment recorded for results marked flaky with a `Pass` token.
const FLAKY_COMMENT: &str = "Flaky";

/// Result tokens that mark the imported result as failing.
const FAILURE_TOKENS: [&str; 4] = ["Failure", "ImageOnlyFailure", "Timeout", "Crash"];

/// What an expectation line does to the imported result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectationAction {
    /// Replace verdict and comment, union conditions.
    Override {
        verdict: Verdict,
        comment: Option<String>,
    },
    /// The test is not run: drop the imported result.
    Skip,
}

/// One parsed expectation line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestExpectation {
    pub path: String,
    pub id: TestId,
    pub conditions: Vec<String>,
    pub action: ExpectationAction,
}

/// Parse expectation text, keeping only paths under `suite_prefix`.
pub fn parse_test_expectations(text: &str, suite_prefix: &str) -> Parsed<TestExpectation> {
    let mut parsed = Parsed::default();
    let mut block = CommentBlock::default();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if block.observe(line) {
            continue;
        }
        let line = strip_trailing_comment(line);

        let Some(caps) = EXPECTATION_LINE.captures(line) else {
            warn!(line = index + 1, content = %line, "unrecognized expectation line, skipped");
            parsed.skipped += 1;
            continue;
        };

        let path = &caps["path"];
        if !path.starts_with(suite_prefix) {
            continue;
        }
        let Some(id) = TestId::from_path(path) else {
            warn!(line = index + 1, path, "expectation path names no test, skipped");
            parsed.skipped += 1;
            continue;
        };

        let conditions: Vec<String> = caps
            .name("conditions")
            .map(|m| m.as_str().split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        let results: Vec<&str> = caps["results"].split_whitespace().collect();

        let Some(action) = classify(&results, &block) else {
            warn!(line = index + 1, content = %line, "unknown expectation results, skipped");
            parsed.skipped += 1;
            continue;
        };

        debug!(test = %id, ?conditions, ?action, "expectation found");
        parsed.records.push(TestExpectation {
            path: path.to_string(),
            id,
            conditions,
            action,
        });
    }
    parsed
}

fn strip_trailing_comment(line: &str) -> &str {
    match line.find(" #") {
        Some(pos) => line[..pos].trim_end(),
        None => line,
    }
}

fn classify(results: &[&str], block: &CommentBlock) -> Option<ExpectationAction> {
    if results.contains(&"Skip") {
        return Some(ExpectationAction::Skip);
    }
    if results.contains(&"Pass") {
        return Some(ExpectationAction::Override {
            verdict: Verdict::Pass,
            comment: Some(FLAKY_COMMENT.to_string()),
        });
    }
    if block.contains("pass but") {
        return Some(ExpectationAction::Override {
            verdict: Verdict::Pass,
            comment: block.text(),
        });
    }
    if results.iter().any(|token| FAILURE_TOKENS.contains(token)) {
        return Some(ExpectationAction::Override {
            verdict: Verdict::Fail,
            comment: None,
        });
    }
    None
}

/// Overlay expectations onto imported results.
///
/// Expectations for unknown tests, or for tests with no imported result
/// left (for instance after an earlier `Skip`), are dropped with a warning.
pub fn apply_test_expectations(
    registry: &mut TestRegistry,
    expectations: Vec<TestExpectation>,
) -> Result<LoadStats> {
    let mut stats = LoadStats::default();
    for expectation in expectations {
        let Some(test) = registry.get_mut(&expectation.id) else {
            warn!(path = %expectation.path, "expectation for unknown test, dropped");
            stats.skipped += 1;
            continue;
        };
        if !test.has_imported() {
            warn!(test = %expectation.id, "expectation for test without imported result, dropped");
            stats.skipped += 1;
            continue;
        }

        match expectation.action {
            ExpectationAction::Skip => test.clear_imported()?,
            ExpectationAction::Override { verdict, comment } => {
                test.add_test_expectation(&expectation.conditions, verdict, comment)?
            }
        }
        stats.applied += 1;
    }
    Ok(stats)
}
