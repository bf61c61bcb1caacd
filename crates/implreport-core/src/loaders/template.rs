//! Publication template: `displayName\trevision\tplaceholder` per line.
//!
//! The template defines which tests are reportable and their revision.

use tracing::{debug, warn};

use super::{LoadStats, Parsed};
use crate::domain::test_id::TestId;
use crate::registry::TestRegistry;

/// One template line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateEntry {
    pub id: TestId,
    pub display_name: String,
    pub revision: String,
}

/// Parse template text. Header and `#` lines are ignored.
pub fn parse_template(text: &str) -> Parsed<TemplateEntry> {
    let mut parsed = Parsed::default();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() || line.starts_with('#') || line.starts_with("testname\t") {
            continue;
        }

        let mut fields = line.split('\t');
        let display_name = fields.next().unwrap_or_default().trim();
        let Some(revision) = fields.next() else {
            warn!(line = index + 1, content = %line, "template line has no revision, skipped");
            parsed.skipped += 1;
            continue;
        };
        let Some(id) = TestId::from_path(display_name) else {
            warn!(line = index + 1, content = %line, "template line has no test name, skipped");
            parsed.skipped += 1;
            continue;
        };

        debug!(test = %id, display_name, "template entry");
        parsed.records.push(TemplateEntry {
            id,
            display_name: display_name.to_string(),
            revision: revision.trim().to_string(),
        });
    }
    parsed
}

/// Register every template entry, creating tests as needed.
pub fn apply_template(registry: &mut TestRegistry, entries: Vec<TemplateEntry>) -> LoadStats {
    let mut stats = LoadStats::default();
    for entry in entries {
        registry.add_template_entry(&entry.id, entry.display_name, entry.revision);
        stats.applied += 1;
    }
    stats
}
