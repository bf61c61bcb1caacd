//! The id-indexed test registry, scoped to one report run.
//!
//! [`TestRegistry`] is the mutable store the loaders write into. Running the
//! combo resolver consumes it and yields a [`ResolvedRegistry`], which only
//! offers read access. This keeps the load → resolve → report phases in
//! order at compile time.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::domain::error::{ReportError, Result};
use crate::domain::test_entity::Test;
use crate::domain::test_id::TestId;

/// Mutable registry used during the loading phase.
#[derive(Debug, Clone)]
pub struct TestRegistry {
    home_engine: String,
    tests: BTreeMap<TestId, Test>,
}

impl TestRegistry {
    /// Create an empty registry whose imports belong to `home_engine`.
    pub fn new(home_engine: impl Into<String>) -> Self {
        Self {
            home_engine: home_engine.into(),
            tests: BTreeMap::new(),
        }
    }

    pub fn home_engine(&self) -> &str {
        &self.home_engine
    }

    /// Fetch a test, creating it on first reference.
    pub fn get_or_create(&mut self, id: &TestId) -> &mut Test {
        self.tests
            .entry(id.clone())
            .or_insert_with(|| Test::new(id.clone()))
    }

    pub fn get(&self, id: &TestId) -> Option<&Test> {
        self.tests.get(id)
    }

    pub fn get_mut(&mut self, id: &TestId) -> Option<&mut Test> {
        self.tests.get_mut(id)
    }

    pub fn contains(&self, id: &TestId) -> bool {
        self.tests.contains_key(id)
    }

    /// Register a discovered test file. Two files mapping to the same id is
    /// fatal.
    pub fn register_discovered(&mut self, id: &TestId, path: PathBuf) -> Result<&mut Test> {
        let test = self.get_or_create(id);
        if let Some(first) = test.source_path() {
            return Err(ReportError::DuplicateTest {
                id: id.clone(),
                first: first.display().to_string(),
                second: path.display().to_string(),
            });
        }
        test.set_source_path(path);
        Ok(test)
    }

    /// Record one template line for `id`.
    pub fn add_template_entry(
        &mut self,
        id: &TestId,
        display_name: impl Into<String>,
        revision: impl Into<String>,
    ) -> &mut Test {
        let test = self.get_or_create(id);
        test.add_template_entry(display_name.into(), revision.into());
        test
    }

    /// Tests in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Test> {
        self.tests.values()
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    pub(crate) fn ids(&self) -> Vec<TestId> {
        self.tests.keys().cloned().collect()
    }

    pub(crate) fn into_parts(self) -> (String, BTreeMap<TestId, Test>) {
        (self.home_engine, self.tests)
    }
}

/// Read-only registry produced by the combo resolver.
#[derive(Debug, Clone)]
pub struct ResolvedRegistry {
    home_engine: String,
    tests: BTreeMap<TestId, Test>,
}

impl ResolvedRegistry {
    pub(crate) fn new(home_engine: String, tests: BTreeMap<TestId, Test>) -> Self {
        Self { home_engine, tests }
    }

    pub fn home_engine(&self) -> &str {
        &self.home_engine
    }

    pub fn get(&self, id: &TestId) -> Option<&Test> {
        self.tests.get(id)
    }

    /// Tests in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Test> {
        self.tests.values()
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }
}
