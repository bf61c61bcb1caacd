//! One report run: load every input channel, resolve once, aggregate.
//!
//! Channels may be loaded in any order, but the combinations that matter
//! are fixed by the data: test expectations only overlay imports created by
//! discovery, so callers normally go template, discovery, import
//! expectations, test expectations, then submissions.

use std::path::Path;

use crate::combo::{resolve_combos, ComboStats};
use crate::config::ReportConfig;
use crate::domain::error::Result;
use crate::loaders::{self, LoadStats};
use crate::obs;
use crate::registry::{ResolvedRegistry, TestRegistry};
use crate::reporter::{build_snapshot, Report, SnapshotEntry};

/// The loading phase of a report run.
#[derive(Debug)]
pub struct ReportPipeline {
    config: ReportConfig,
    registry: TestRegistry,
}

impl ReportPipeline {
    pub fn new(config: ReportConfig) -> Self {
        let registry = TestRegistry::new(config.home_engine.clone());
        Self { config, registry }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn registry(&self) -> &TestRegistry {
        &self.registry
    }

    pub fn load_template(&mut self, text: &str) -> LoadStats {
        let parsed = loaders::parse_template(text);
        let stats =
            loaders::apply_template(&mut self.registry, parsed.records).with_parse_skips(parsed.skipped);
        obs::emit_load_finished("template", stats.applied, stats.skipped);
        stats
    }

    pub fn discover(&mut self, root: &Path) -> Result<LoadStats> {
        let files = loaders::discover_test_files(root, &self.config.skip_dirs)?;
        let stats = loaders::apply_discovered(&mut self.registry, files)?;
        obs::emit_load_finished("discovery", stats.applied, stats.skipped);
        Ok(stats)
    }

    pub fn load_import_expectations(&mut self, text: &str) -> Result<LoadStats> {
        let parsed = loaders::parse_import_expectations(text, &self.config.suite_prefix);
        let stats = loaders::apply_import_expectations(&mut self.registry, parsed.records)?
            .with_parse_skips(parsed.skipped);
        obs::emit_load_finished("import_expectations", stats.applied, stats.skipped);
        Ok(stats)
    }

    pub fn load_test_expectations(&mut self, text: &str) -> Result<LoadStats> {
        let parsed = loaders::parse_test_expectations(text, &self.config.suite_prefix);
        let stats = loaders::apply_test_expectations(&mut self.registry, parsed.records)?
            .with_parse_skips(parsed.skipped);
        obs::emit_load_finished("test_expectations", stats.applied, stats.skipped);
        Ok(stats)
    }

    pub fn load_submissions(&mut self, text: &str) -> Result<LoadStats> {
        let parsed = loaders::parse_submissions(text, &self.config);
        let stats = loaders::apply_submissions(&mut self.registry, parsed.records)?
            .with_parse_skips(parsed.skipped);
        obs::emit_load_finished("submissions", stats.applied, stats.skipped);
        Ok(stats)
    }

    /// End the loading phase and run combo resolution.
    pub fn resolve(self) -> Result<ResolvedReport> {
        let (registry, combo) = resolve_combos(self.registry)?;
        Ok(ResolvedReport { registry, combo })
    }
}

/// The read-only phase of a report run.
#[derive(Debug)]
pub struct ResolvedReport {
    registry: ResolvedRegistry,
    combo: ComboStats,
}

impl ResolvedReport {
    pub fn registry(&self) -> &ResolvedRegistry {
        &self.registry
    }

    pub fn combo_stats(&self) -> ComboStats {
        self.combo
    }

    pub fn report(&self) -> Report {
        Report::build(&self.registry)
    }

    pub fn snapshot(&self) -> Vec<SnapshotEntry> {
        build_snapshot(&self.registry)
    }
}
