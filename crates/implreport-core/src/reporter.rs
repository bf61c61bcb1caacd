//! Implementation report artifacts.
//!
//! Provides two outputs for the standards body:
//! - the TSV report — one row per template display name, home engine only,
//!   followed by two summary comment lines
//! - the JSON snapshot — every reliable engine result per template test

use std::collections::BTreeMap;
use std::io::Write;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::error::Result;
use crate::domain::test_entity::Test;
use crate::registry::ResolvedRegistry;

/// Header line of the TSV report.
pub const TSV_HEADER: &str = "testname\trevision\tresult\tcomment";

// ── TSV report ────────────────────────────────────────────────────────────

/// Running totals over reported tests.
///
/// `total` counts every test with a home-engine result. Coverage, pass and
/// fail only count authoritative results; community results are shown for
/// traceability but never counted as coverage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportTotals {
    pub total: usize,
    pub coverage: usize,
    pub passed: usize,
    pub failed: usize,
    pub imported: usize,
    pub imported_passed: usize,
    pub imported_failed: usize,
}

impl ReportTotals {
    fn count(&mut self, test_result: &RowResult) {
        self.total += 1;
        if !test_result.authoritative {
            return;
        }
        self.imported += 1;
        if test_result.passed {
            self.coverage += 1;
            self.passed += 1;
            self.imported_passed += 1;
        } else if test_result.failed {
            self.coverage += 1;
            self.failed += 1;
            self.imported_failed += 1;
        }
    }

    /// The two trailing `#` summary lines.
    pub fn summary_lines(&self) -> [String; 2] {
        [
            format!(
                "# Total = {}, Coverage = {} ({} of total), Pass = {} ({}), Fail = {} ({})",
                self.total,
                self.coverage,
                percent(self.coverage, self.total),
                self.passed,
                percent(self.passed, self.coverage),
                self.failed,
                percent(self.failed, self.coverage),
            ),
            format!(
                "# Imported = {}, Pass = {} ({}), Fail = {} ({})",
                self.imported,
                self.imported_passed,
                percent(self.imported_passed, self.imported),
                self.imported_failed,
                percent(self.imported_failed, self.imported),
            ),
        ]
    }
}

/// Integer-truncated percentage, `n/a` for an empty denominator.
fn percent(part: usize, whole: usize) -> String {
    if whole == 0 {
        return "n/a".to_string();
    }
    format!("{}%", part * 100 / whole)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RowResult {
    verdict: String,
    comment: Option<String>,
    authoritative: bool,
    passed: bool,
    failed: bool,
}

/// One line of the TSV report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub testname: String,
    pub revision: String,
    /// `None` renders as `?`: no home-engine evidence.
    pub result: Option<String>,
    pub comment: Option<String>,
    /// Prefixed with `# ` in the output.
    pub commented_out: bool,
}

impl ReportRow {
    pub fn render(&self) -> String {
        let prefix = if self.commented_out { "# " } else { "" };
        let result = self.result.as_deref().unwrap_or("?");
        let mut line = format!("{prefix}{}\t{}\t{result}", self.testname, self.revision);
        if let Some(comment) = &self.comment {
            line.push_str("\t# ");
            line.push_str(comment);
        }
        line
    }
}

/// The rendered-ready implementation report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub rows: Vec<ReportRow>,
    pub totals: ReportTotals,
}

impl Report {
    /// Build the report from a resolved registry, in test id order.
    ///
    /// Tests missing from the template are warned about and left out.
    pub fn build(registry: &ResolvedRegistry) -> Self {
        let home = registry.home_engine();
        let mut rows = Vec::new();
        let mut totals = ReportTotals::default();

        for test in registry.iter() {
            let Some(revision) = test.revision() else {
                warn!(test = %test.id(), "not found in template, skipped");
                continue;
            };

            let row_result = home_result(test, home);
            if let Some(result) = &row_result {
                totals.count(result);
            }

            for testname in display_names(test) {
                rows.push(match &row_result {
                    None => ReportRow {
                        testname,
                        revision: revision.to_string(),
                        result: None,
                        comment: None,
                        commented_out: true,
                    },
                    Some(result) => ReportRow {
                        testname,
                        revision: revision.to_string(),
                        result: Some(result.verdict.clone()),
                        comment: result.comment.clone(),
                        commented_out: !result.authoritative,
                    },
                });
            }
        }

        Self { rows, totals }
    }

    /// Render header, rows and summary as TSV text.
    pub fn render_tsv(&self) -> String {
        let mut out = String::new();
        out.push_str(TSV_HEADER);
        out.push('\n');
        for row in &self.rows {
            out.push_str(&row.render());
            out.push('\n');
        }
        for line in self.totals.summary_lines() {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }

    /// Write the TSV report to `sink`.
    pub fn write_tsv<W: Write>(&self, sink: &mut W) -> Result<()> {
        sink.write_all(self.render_tsv().as_bytes())?;
        sink.flush()?;
        Ok(())
    }
}

fn home_result(test: &Test, home: &str) -> Option<RowResult> {
    let record = test.result(home)?;
    let verdict = record.verdict();
    Some(RowResult {
        verdict: verdict.display_str().to_string(),
        comment: record.comment(),
        authoritative: record.is_authoritative(),
        passed: verdict.is_pass(),
        failed: verdict.is_failure(),
    })
}

fn display_names(test: &Test) -> Vec<String> {
    if test.testnames().is_empty() {
        vec![test.id().to_string()]
    } else {
        test.testnames().to_vec()
    }
}

// ── JSON snapshot ─────────────────────────────────────────────────────────

/// Keys of a snapshot entry that engine names must not take.
pub const RESERVED_SNAPSHOT_KEYS: [&str; 2] = ["id", "issue"];

/// Whether `engine` would collide with a fixed key of a snapshot entry.
pub fn is_reserved_engine_name(engine: &str) -> bool {
    RESERVED_SNAPSHOT_KEYS.contains(&engine)
}

/// Published result for one engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineEntry {
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// One test in the JSON snapshot: `{id, issue?, <engine>: {result, source?}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
    #[serde(flatten)]
    pub engines: BTreeMap<String, EngineEntry>,
}

/// Canonical per-engine results of every template test, sorted by id.
///
/// Anonymous results are left out; tests with neither a reliable result
/// nor an issue are omitted.
pub fn build_snapshot(registry: &ResolvedRegistry) -> Vec<SnapshotEntry> {
    registry
        .iter()
        .filter(|test| test.in_template())
        .filter_map(|test| {
            let engines: BTreeMap<String, EngineEntry> = test
                .results()
                .iter()
                .filter(|(_, record)| record.reliability().tier() > 0)
                .map(|(engine, record)| {
                    (
                        engine.clone(),
                        EngineEntry {
                            result: record.verdict().display_str().to_string(),
                            source: record.source().map(str::to_string),
                        },
                    )
                })
                .collect();
            if engines.is_empty() && test.issue_url().is_none() {
                return None;
            }
            Some(SnapshotEntry {
                id: test.id().to_string(),
                issue: test.issue_url().map(str::to_string),
                engines,
            })
        })
        .collect()
}

/// Write the JSON snapshot to `sink` in pretty format.
pub fn write_snapshot_json<W: Write>(entries: &[SnapshotEntry], sink: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *sink, entries)?;
    sink.write_all(b"\n")?;
    sink.flush()?;
    Ok(())
}
