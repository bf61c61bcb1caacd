//! Test identifiers and combo affix inference.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Trailing affix of a combo sub-test: `-` then 1–3 digits then one letter.
static AFFIX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-\d{1,3}[a-z]$").expect("affix pattern is valid"));

/// Opaque test key: a file basename without its extension.
///
/// Never contains a path separator or a dot, and is never empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestId(String);

impl TestId {
    /// Wrap an already-normalized id. Returns `None` if `raw` is empty or
    /// contains a separator or a dot.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() || raw.contains(['/', '\\', '.']) {
            return None;
        }
        Some(Self(raw))
    }

    /// Derive an id from a path or file name: last component, cut at the
    /// first dot.
    ///
    /// `imported/csswg-test/css-writing-modes-3/t-001.html` → `t-001`.
    /// Directory paths and hidden files yield `None`.
    pub fn from_path(path: &str) -> Option<Self> {
        let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
        let stem = name.split('.').next().unwrap_or(name);
        Self::new(stem)
    }

    /// The id this test would combine into if it is an affix variant:
    /// `t-003a` → `t-003`.
    pub fn affix_parent(&self) -> Option<TestId> {
        if !AFFIX_PATTERN.is_match(&self.0) {
            return None;
        }
        let mut parent = self.0.clone();
        parent.pop();
        Some(TestId(parent))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TestId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
