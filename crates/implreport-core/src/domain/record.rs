//! Result records and the precedence contract that picks a winner per engine.
//!
//! Two kinds of observation exist:
//! - [`ImportResult`]: the home engine's own regression-suite outcome, possibly
//!   overridden by maintainer expectations. Always authoritative.
//! - [`SubmissionResult`]: a community-submitted outcome for any engine.
//!
//! Precedence is defined once on [`Precedence`] and never inspects which kind
//! of record it is comparing.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::error::{ReportError, Result};
use super::verdict::Verdict;

/// Number of distinct condition labels at which an import counts as failing
/// regardless of its stored verdict.
pub const FAIL_CONDITION_THRESHOLD: usize = 3;

/// Comment used for conditional passes that carry no comment of their own.
const DEFAULT_CONDITION_COMMENT: &str = "fail";

/// Comment shown for results from unrecognised submitters.
pub const ANONYMOUS_COMMENT: &str = "Anonymous";

/// Coarse trust ranking of a result source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Reliability {
    Anonymous,
    Trusted,
    Imported,
}

impl Reliability {
    pub fn tier(self) -> u8 {
        match self {
            Reliability::Anonymous => 0,
            Reliability::Trusted => 1,
            Reliability::Imported => 2,
        }
    }
}

// ---------------------------------------------------------------------------
// Precedence
// ---------------------------------------------------------------------------

/// The fields that decide which of two same-engine records wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precedence {
    pub authoritative: bool,
    pub tier: u8,
    pub date: Option<NaiveDateTime>,
}

impl Precedence {
    /// Compare `self` (incoming) against `stored`.
    ///
    /// `Greater` means `self` should replace `stored`. `Equal` keeps the
    /// first-seen record. Two authoritative records compare `Equal`.
    ///
    /// Fails with [`ReportError::MissingSubmissionDate`] when the recency
    /// tie-break is reached and either side has no date.
    pub fn compare(&self, stored: &Precedence, engine: &str) -> Result<Ordering> {
        match (self.authoritative, stored.authoritative) {
            (true, true) => return Ok(Ordering::Equal),
            (true, false) => return Ok(Ordering::Greater),
            (false, true) => return Ok(Ordering::Less),
            (false, false) => {}
        }

        match self.tier.cmp(&stored.tier) {
            Ordering::Equal => {}
            decided => return Ok(decided),
        }

        match (self.date, stored.date) {
            (Some(incoming), Some(existing)) => Ok(incoming.cmp(&existing)),
            _ => Err(ReportError::MissingSubmissionDate {
                engine: engine.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// ImportResult
// ---------------------------------------------------------------------------

/// The home engine's imported result for one test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportResult {
    engine: String,
    verdict: Verdict,
    conditions: BTreeSet<String>,
    comment: Option<String>,
}

impl ImportResult {
    pub fn new(engine: impl Into<String>, verdict: Verdict) -> Self {
        Self {
            engine: engine.into(),
            verdict,
            conditions: BTreeSet::new(),
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment;
        self
    }

    /// Replace the stored verdict. The effective verdict is still derived
    /// from the condition labels.
    pub fn set_verdict(&mut self, verdict: Verdict) {
        self.verdict = verdict;
    }

    pub fn set_comment(&mut self, comment: Option<String>) {
        self.comment = comment;
    }

    /// Union `labels` into the condition set. The set only ever grows.
    pub fn add_conditions<I, S>(&mut self, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conditions.extend(labels.into_iter().map(Into::into));
    }

    pub fn engine(&self) -> &str {
        &self.engine
    }

    pub fn raw_verdict(&self) -> &Verdict {
        &self.verdict
    }

    pub fn raw_comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn conditions(&self) -> &BTreeSet<String> {
        &self.conditions
    }

    /// Verdict after applying condition labels:
    /// three or more labels fail, one or two pass, none keeps the stored verdict.
    pub fn effective_verdict(&self) -> Verdict {
        match self.conditions.len() {
            0 => self.verdict.clone(),
            n if n >= FAIL_CONDITION_THRESHOLD => Verdict::Fail,
            _ => Verdict::Pass,
        }
    }

    /// Comment matching [`effective_verdict`](Self::effective_verdict).
    ///
    /// A conditional pass explains itself as `"Linux, Win: <comment>"`.
    pub fn effective_comment(&self) -> Option<String> {
        let count = self.conditions.len();
        if count == 0 || count >= FAIL_CONDITION_THRESHOLD {
            return self.comment.clone();
        }
        let labels: Vec<&str> = self.conditions.iter().map(String::as_str).collect();
        Some(format!(
            "{}: {}",
            labels.join(", "),
            self.comment.as_deref().unwrap_or(DEFAULT_CONDITION_COMMENT)
        ))
    }
}

// ---------------------------------------------------------------------------
// SubmissionResult
// ---------------------------------------------------------------------------

/// Engine identity folding applied to submissions.
///
/// Results reported under `legacy` by a browser whose user agent carries
/// `user_agent_marker` belong to `merged`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineAlias {
    pub legacy: String,
    pub merged: String,
    pub user_agent_marker: String,
}

impl Default for EngineAlias {
    fn default() -> Self {
        Self {
            legacy: "webkit".to_string(),
            merged: "blink".to_string(),
            user_agent_marker: "Chrome/".to_string(),
        }
    }
}

impl EngineAlias {
    /// Lower-case `engine` and fold it into the merged identity if needed.
    pub fn normalize(&self, engine: &str, user_agent: &str) -> String {
        let engine = engine.trim().to_ascii_lowercase();
        if engine == self.legacy.to_ascii_lowercase() && user_agent.contains(&self.user_agent_marker)
        {
            return self.merged.to_ascii_lowercase();
        }
        engine
    }
}

/// Fields of one submission row, before engine normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionFields {
    pub engine: String,
    pub user_agent: String,
    pub verdict: String,
    pub format: Option<String>,
    pub date: Option<NaiveDateTime>,
    pub source: String,
    pub reliability: Reliability,
}

/// A community-submitted result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResult {
    engine: String,
    verdict: Verdict,
    format: Option<String>,
    date: Option<NaiveDateTime>,
    source: String,
    reliability: Reliability,
}

impl SubmissionResult {
    /// Build a submission, normalizing the engine name exactly once.
    ///
    /// `Reliability::Imported` is reserved for imports and is clamped to
    /// `Trusted`.
    pub fn new(fields: SubmissionFields, alias: &EngineAlias) -> Self {
        let reliability = fields.reliability.min(Reliability::Trusted);
        Self {
            engine: alias.normalize(&fields.engine, &fields.user_agent),
            verdict: Verdict::parse(&fields.verdict),
            format: fields.format,
            date: fields.date,
            source: fields.source,
            reliability,
        }
    }

    pub fn engine(&self) -> &str {
        &self.engine
    }

    pub fn verdict(&self) -> &Verdict {
        &self.verdict
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub fn date(&self) -> Option<NaiveDateTime> {
        self.date
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn reliability(&self) -> Reliability {
        self.reliability
    }
}

// ---------------------------------------------------------------------------
// ResultRecord
// ---------------------------------------------------------------------------

/// One observation of a test on an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultRecord {
    Import(ImportResult),
    Submission(SubmissionResult),
}

impl ResultRecord {
    pub fn engine(&self) -> &str {
        match self {
            ResultRecord::Import(r) => r.engine(),
            ResultRecord::Submission(r) => r.engine(),
        }
    }

    pub fn reliability(&self) -> Reliability {
        match self {
            ResultRecord::Import(_) => Reliability::Imported,
            ResultRecord::Submission(r) => r.reliability(),
        }
    }

    pub fn is_authoritative(&self) -> bool {
        matches!(self, ResultRecord::Import(_))
    }

    pub fn precedence(&self) -> Precedence {
        Precedence {
            authoritative: self.is_authoritative(),
            tier: self.reliability().tier(),
            date: match self {
                ResultRecord::Import(_) => None,
                ResultRecord::Submission(r) => r.date(),
            },
        }
    }

    /// Whether `self` should replace `stored` on the same engine.
    pub fn outranks(&self, stored: &ResultRecord) -> Result<bool> {
        let ordering = self
            .precedence()
            .compare(&stored.precedence(), self.engine())?;
        Ok(ordering == Ordering::Greater)
    }

    /// Verdict as published (after condition-label derivation for imports).
    pub fn verdict(&self) -> Verdict {
        match self {
            ResultRecord::Import(r) => r.effective_verdict(),
            ResultRecord::Submission(r) => r.verdict().clone(),
        }
    }

    /// Row comment: the condition narrative for imports, `Anonymous` or the
    /// submitter's source for submissions.
    pub fn comment(&self) -> Option<String> {
        match self {
            ResultRecord::Import(r) => r.effective_comment(),
            ResultRecord::Submission(r) if r.reliability() == Reliability::Anonymous => {
                Some(ANONYMOUS_COMMENT.to_string())
            }
            ResultRecord::Submission(r) if r.source().is_empty() => None,
            ResultRecord::Submission(r) => Some(r.source().to_string()),
        }
    }

    /// Where the result came from, for the JSON snapshot. Imports have none.
    pub fn source(&self) -> Option<&str> {
        match self {
            ResultRecord::Import(_) => None,
            ResultRecord::Submission(r) if r.source().is_empty() => None,
            ResultRecord::Submission(r) => Some(r.source()),
        }
    }

    /// Copy of this record carrying `verdict` as its stored verdict.
    pub fn with_verdict(&self, verdict: Verdict) -> ResultRecord {
        match self {
            ResultRecord::Import(r) => {
                let mut r = r.clone();
                r.set_verdict(verdict);
                ResultRecord::Import(r)
            }
            ResultRecord::Submission(r) => {
                let mut r = r.clone();
                r.verdict = verdict;
                ResultRecord::Submission(r)
            }
        }
    }
}

impl From<ImportResult> for ResultRecord {
    fn from(r: ImportResult) -> Self {
        ResultRecord::Import(r)
    }
}

impl From<SubmissionResult> for ResultRecord {
    fn from(r: SubmissionResult) -> Self {
        ResultRecord::Submission(r)
    }
}
