//! Per-test state: the pending import, the winning record per engine and
//! combo linkage.
//!
//! Mutation methods enforce the loading-time preconditions. Violations are
//! loader bugs and surface as fatal [`ReportError`]s.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use super::error::{ReportError, Result};
use super::record::{ImportResult, ResultRecord};
use super::test_id::TestId;
use super::verdict::Verdict;

/// One test of the suite.
#[derive(Debug, Clone, PartialEq)]
pub struct Test {
    id: TestId,
    testnames: Vec<String>,
    revision: Option<String>,
    source_path: Option<PathBuf>,
    imported: Option<ImportResult>,
    results_by_engine: BTreeMap<String, ResultRecord>,
    superseded_home: Option<ResultRecord>,
    combo_parent: Option<TestId>,
    combo_children: BTreeSet<TestId>,
    issue_url: Option<String>,
}

impl Test {
    pub fn new(id: TestId) -> Self {
        Self {
            id,
            testnames: Vec::new(),
            revision: None,
            source_path: None,
            imported: None,
            results_by_engine: BTreeMap::new(),
            superseded_home: None,
            combo_parent: None,
            combo_children: BTreeSet::new(),
            issue_url: None,
        }
    }

    // ── accessors ─────────────────────────────────────────────────────────

    pub fn id(&self) -> &TestId {
        &self.id
    }

    /// Display names in template order. The first one is canonical.
    pub fn testnames(&self) -> &[String] {
        &self.testnames
    }

    /// Template revision. `Some` exactly when the test is in the template.
    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }

    pub fn in_template(&self) -> bool {
        self.revision.is_some()
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn imported(&self) -> Option<&ImportResult> {
        self.imported.as_ref()
    }

    pub fn has_imported(&self) -> bool {
        self.imported.is_some()
    }

    pub fn results(&self) -> &BTreeMap<String, ResultRecord> {
        &self.results_by_engine
    }

    pub fn result(&self, engine: &str) -> Option<&ResultRecord> {
        self.results_by_engine.get(engine)
    }

    /// Submission-based home-engine record displaced by the import overlay.
    pub fn superseded_home(&self) -> Option<&ResultRecord> {
        self.superseded_home.as_ref()
    }

    pub fn combo_parent(&self) -> Option<&TestId> {
        self.combo_parent.as_ref()
    }

    pub fn combo_children(&self) -> &BTreeSet<TestId> {
        &self.combo_children
    }

    pub fn issue_url(&self) -> Option<&str> {
        self.issue_url.as_deref()
    }

    // ── loading-phase mutation ────────────────────────────────────────────

    /// Create the imported result. Fails if one already exists.
    pub fn set_imported(&mut self, engine: &str, verdict: Verdict) -> Result<()> {
        if self.imported.is_some() {
            return Err(ReportError::AlreadyImported {
                id: self.id.clone(),
            });
        }
        self.imported = Some(ImportResult::new(engine, verdict));
        Ok(())
    }

    /// Drop the imported result (an explicit `Skip`). Fails if there is none.
    pub fn clear_imported(&mut self) -> Result<()> {
        match self.imported.take() {
            Some(_) => Ok(()),
            None => Err(ReportError::NotImported {
                id: self.id.clone(),
            }),
        }
    }

    /// Overlay a maintainer expectation onto the imported result.
    ///
    /// Replaces the stored verdict and comment, and unions `conditions` into
    /// the label set.
    pub fn add_test_expectation(
        &mut self,
        conditions: &[String],
        verdict: Verdict,
        comment: Option<String>,
    ) -> Result<()> {
        let imported = self
            .imported
            .as_mut()
            .ok_or_else(|| ReportError::NotImported {
                id: self.id.clone(),
            })?;
        imported.set_verdict(verdict);
        imported.set_comment(comment);
        imported.add_conditions(conditions.iter().cloned());
        Ok(())
    }

    /// Create an imported result from a suite-level declaration. The test
    /// file need not have been discovered. Fails if an import already exists.
    pub fn add_import_expectation(
        &mut self,
        engine: &str,
        verdict: Verdict,
        comment: Option<String>,
    ) -> Result<()> {
        if self.imported.is_some() {
            return Err(ReportError::AlreadyImported {
                id: self.id.clone(),
            });
        }
        self.imported = Some(ImportResult::new(engine, verdict).with_comment(comment));
        Ok(())
    }

    /// Keep `record` if it outranks what is stored for its engine.
    ///
    /// Returns whether the stored winner changed.
    pub fn add_result(&mut self, record: ResultRecord) -> Result<bool> {
        if let Some(stored) = self.results_by_engine.get(record.engine()) {
            if !record.outranks(stored)? {
                return Ok(false);
            }
        }
        self.results_by_engine
            .insert(record.engine().to_string(), record);
        Ok(true)
    }

    /// Attach a tracking issue. Fails if one is already attached.
    pub fn add_issue(&mut self, url: impl Into<String>) -> Result<()> {
        if let Some(existing) = &self.issue_url {
            return Err(ReportError::IssueAlreadyAttached {
                id: self.id.clone(),
                existing: existing.clone(),
            });
        }
        self.issue_url = Some(url.into());
        Ok(())
    }

    pub(crate) fn set_source_path(&mut self, path: PathBuf) {
        self.source_path = Some(path);
    }

    /// Record a template line. The first revision seen is kept.
    pub(crate) fn add_template_entry(&mut self, display_name: String, revision: String) {
        if !self.testnames.contains(&display_name) {
            self.testnames.push(display_name);
        }
        if self.revision.is_none() {
            self.revision = Some(revision);
        }
    }

    // ── combo phase ───────────────────────────────────────────────────────

    pub(crate) fn set_combo_parent(&mut self, parent: TestId) {
        self.combo_parent = Some(parent);
    }

    pub(crate) fn add_combo_child(&mut self, child: TestId) {
        self.combo_children.insert(child);
    }

    /// Install the imported result as the home-engine winner, keeping any
    /// displaced submission for audit.
    pub(crate) fn merge_imported(&mut self) {
        let Some(imported) = self.imported.clone() else {
            return;
        };
        let engine = imported.engine().to_string();
        if let Some(previous) = self
            .results_by_engine
            .insert(engine, ResultRecord::Import(imported))
        {
            if !previous.is_authoritative() {
                self.superseded_home = Some(previous);
            }
        }
    }

    pub(crate) fn set_resolved(&mut self, engine: &str, record: ResultRecord) {
        self.results_by_engine.insert(engine.to_string(), record);
    }
}
