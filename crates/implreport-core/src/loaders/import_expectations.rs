//! Suite-level import expectations.
//!
//! Entries are paths of tests the home engine declined to import. The reason
//! lives in the comment block above them, and only the comment block decides
//! the recorded verdict:
//!
//! ```text
//! # These tests have known issues: https://github.com/w3c/csswg-test/issues/1012
//! imported/csswg-test/css-writing-modes-3/t-010.html [ Skip ]
//! ```

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use super::comment_block::CommentBlock;
use super::{LoadStats, Parsed};
use crate::domain::error::Result;
use crate::domain::test_id::TestId;
use crate::domain::verdict::Verdict;
use crate::registry::TestRegistry;

static ISSUE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https://github\.com/[\w.-]+/[\w.-]+/issues/\d+").expect("issue pattern is valid")
});

static COMBO_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bcombo\b").expect("combo pattern is valid"));

/// One declared import exception.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportExpectation {
    pub path: String,
    pub id: TestId,
    pub verdict: Verdict,
    pub comment: Option<String>,
    pub issue_url: Option<String>,
}

/// What a comment block says about the entries under it.
enum BlockReason {
    Issue(String),
    KnownIssues,
    NoSupport,
    Combo,
    Unrelated,
}

fn reason_of(block: &CommentBlock) -> BlockReason {
    let Some(text) = block.text() else {
        return BlockReason::Unrelated;
    };
    if let Some(found) = ISSUE_URL.find(&text) {
        return BlockReason::Issue(found.as_str().to_string());
    }
    if block.contains("have known issues") {
        return BlockReason::KnownIssues;
    }
    if block.contains("do not support") || block.contains("do not plan to support") {
        return BlockReason::NoSupport;
    }
    // Combo parents are reported through their children.
    if COMBO_MARKER.is_match(&text) {
        return BlockReason::Combo;
    }
    BlockReason::Unrelated
}

/// Parse import-expectation text, keeping only paths under `suite_prefix`.
pub fn parse_import_expectations(text: &str, suite_prefix: &str) -> Parsed<ImportExpectation> {
    let mut parsed = Parsed::default();
    let mut block = CommentBlock::default();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if block.observe(line) {
            continue;
        }
        let Some(path) = line.split_whitespace().next() else {
            continue;
        };
        if !path.starts_with(suite_prefix) {
            continue;
        }
        let Some(id) = TestId::from_path(path) else {
            warn!(line = index + 1, path, "import expectation names no test, skipped");
            parsed.skipped += 1;
            continue;
        };

        let (verdict, issue_url) = match reason_of(&block) {
            BlockReason::Issue(url) => (Verdict::Invalid, Some(url)),
            BlockReason::KnownIssues => (Verdict::Invalid, None),
            BlockReason::NoSupport => (Verdict::NoSupport, None),
            BlockReason::Combo => {
                debug!(test = %id, "combo entry, suppressed");
                continue;
            }
            BlockReason::Unrelated => {
                debug!(test = %id, "import expectation without a known reason, ignored");
                continue;
            }
        };

        debug!(test = %id, verdict = %verdict, "import expectation found");
        parsed.records.push(ImportExpectation {
            path: path.to_string(),
            id,
            verdict,
            comment: block.text(),
            issue_url,
        });
    }
    parsed
}

/// Record import expectations as home-engine imported results.
///
/// Unknown tests and tests that already carry an imported result are
/// skipped with a warning, as is a second tracking issue.
pub fn apply_import_expectations(
    registry: &mut TestRegistry,
    expectations: Vec<ImportExpectation>,
) -> Result<LoadStats> {
    let home = registry.home_engine().to_string();
    let mut stats = LoadStats::default();

    for expectation in expectations {
        let Some(test) = registry.get_mut(&expectation.id) else {
            warn!(path = %expectation.path, "import expectation for unknown test, dropped");
            stats.skipped += 1;
            continue;
        };
        if test.has_imported() {
            warn!(test = %expectation.id, "test already has an imported result, import expectation dropped");
            stats.skipped += 1;
            continue;
        }

        test.add_import_expectation(&home, expectation.verdict, expectation.comment)?;
        if let Some(url) = expectation.issue_url {
            match test.issue_url() {
                None => test.add_issue(url)?,
                Some(existing) => {
                    warn!(test = %expectation.id, existing, new = %url, "issue already attached, kept the first");
                }
            }
        }
        stats.applied += 1;
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "imported/csswg-test/css-writing-modes-3/";

    const SAMPLE: &str = "\
# Import everything else.
imported/csswg-test/css-writing-modes-3/t-000.html [ Pass ]

# These tests have known issues: https://github.com/w3c/csswg-test/issues/1012
imported/csswg-test/css-writing-modes-3/t-010.html [ Skip ]

# These tests have known issues.
imported/csswg-test/css-writing-modes-3/t-011.html [ Skip ]

# We do not plan to support this feature.
imported/csswg-test/css-writing-modes-3/t-012.html [ Skip ]

# Combo tests are reported by their sub-tests.
imported/csswg-test/css-writing-modes-3/t-013.html [ Skip ]

# We do not support text-orientation: sideways.
imported/csswg-test/css-backgrounds-3/other.html [ Skip ]
";

    #[test]
    fn test_reasons_map_to_verdicts() {
        let parsed = parse_import_expectations(SAMPLE, PREFIX);
        let summary: Vec<(&str, Verdict, bool)> = parsed
            .records
            .iter()
            .map(|e| (e.id.as_str(), e.verdict.clone(), e.issue_url.is_some()))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("t-010", Verdict::Invalid, true),
                ("t-011", Verdict::Invalid, false),
                ("t-012", Verdict::NoSupport, false),
            ]
        );
        assert_eq!(
            parsed.records[0].issue_url.as_deref(),
            Some("https://github.com/w3c/csswg-test/issues/1012")
        );
        assert_eq!(
            parsed.records[2].comment.as_deref(),
            Some("We do not plan to support this feature.")
        );
    }

    #[test]
    fn test_apply_creates_home_imports_and_issue() {
        let mut registry = TestRegistry::new("blink");
        for raw in ["t-010", "t-011"] {
            registry.get_or_create(&TestId::new(raw).expect("id"));
        }
        registry
            .get_or_create(&TestId::new("t-011").expect("id"))
            .set_imported("blink", Verdict::Pass)
            .expect("import");

        let parsed = parse_import_expectations(SAMPLE, PREFIX);
        let stats = apply_import_expectations(&mut registry, parsed.records).expect("apply");

        // t-010 applied; t-011 already imported; t-012 unknown.
        assert_eq!(stats.applied, 1);
        assert_eq!(stats.skipped, 2);

        let t10 = registry.get(&TestId::new("t-010").expect("id")).expect("t-010");
        let imported = t10.imported().expect("imported");
        assert_eq!(imported.engine(), "blink");
        assert_eq!(imported.effective_verdict(), Verdict::Invalid);
        assert_eq!(
            t10.issue_url(),
            Some("https://github.com/w3c/csswg-test/issues/1012")
        );

        let t11 = registry.get(&TestId::new("t-011").expect("id")).expect("t-011");
        assert_eq!(t11.imported().expect("imported").effective_verdict(), Verdict::Pass);
    }

    #[test]
    fn test_existing_issue_is_kept() {
        let mut registry = TestRegistry::new("blink");
        let id = TestId::new("t-010").expect("id");
        registry
            .get_or_create(&id)
            .add_issue("https://github.com/w3c/csswg-test/issues/1")
            .expect("issue");

        let parsed = parse_import_expectations(SAMPLE, PREFIX);
        let records = parsed.records.into_iter().filter(|e| e.id == id).collect();
        let stats = apply_import_expectations(&mut registry, records).expect("apply");

        assert_eq!(stats.applied, 1);
        assert_eq!(
            registry.get(&id).expect("t-010").issue_url(),
            Some("https://github.com/w3c/csswg-test/issues/1")
        );
    }

    #[test]
    fn test_do_not_support_block_maps_to_no_support() {
        let parsed = parse_import_expectations(
            "# We do not support text-orientation: sideways.\n\
             imported/csswg-test/css-writing-modes-3/text-orientation-sideways-001.html [ Skip ]\n",
            PREFIX,
        );

        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].verdict, Verdict::NoSupport);
        assert!(parsed.records[0].issue_url.is_none());
    }

    #[test]
    fn test_issue_url_wins_over_words_containing_combo() {
        let parsed = parse_import_expectations(
            "# These combobox tests have known issues: https://github.com/w3c/csswg-test/issues/7\n\
             imported/csswg-test/css-writing-modes-3/t-020.html [ Skip ]\n",
            PREFIX,
        );

        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].verdict, Verdict::Invalid);
        assert_eq!(
            parsed.records[0].issue_url.as_deref(),
            Some("https://github.com/w3c/csswg-test/issues/7")
        );
    }

    #[test]
    fn test_issue_url_is_kept_in_a_combo_block() {
        let parsed = parse_import_expectations(
            "# Combo parent, see https://github.com/w3c/csswg-test/issues/8\n\
             imported/csswg-test/css-writing-modes-3/t-021.html [ Skip ]\n",
            PREFIX,
        );

        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].verdict, Verdict::Invalid);
    }

    #[test]
    fn test_combo_marker_is_a_whole_word() {
        let parsed = parse_import_expectations(
            "# Combo tests are reported by their sub-tests.\n\
             imported/csswg-test/css-writing-modes-3/t-022.html [ Skip ]\n\
             \n\
             # Combobox sizing tests have known issues.\n\
             imported/csswg-test/css-writing-modes-3/t-023.html [ Skip ]\n",
            PREFIX,
        );

        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].id.as_str(), "t-023");
        assert_eq!(parsed.records[0].verdict, Verdict::Invalid);
    }
}
