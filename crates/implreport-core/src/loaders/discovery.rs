//! Test-file discovery under the imported suite root.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::LoadStats;
use crate::domain::error::Result;
use crate::domain::test_id::TestId;
use crate::domain::verdict::Verdict;
use crate::registry::TestRegistry;

/// A test file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub dir: PathBuf,
    pub file_name: String,
}

impl DiscoveredFile {
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

fn is_reference_output(name: &str) -> bool {
    Path::new(name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| stem.ends_with("-expected"))
}

/// Walk `root` recursively and list test files in a stable order: depth
/// first, with the entries of each directory sorted by name.
///
/// Hidden entries, directories named in `skip_dirs` and `-expected`
/// reference files are left out.
pub fn discover_test_files(root: &Path, skip_dirs: &[String]) -> Result<Vec<DiscoveredFile>> {
    let mut found = Vec::new();
    walk(root, skip_dirs, &mut found)?;
    Ok(found)
}

fn walk(dir: &Path, skip_dirs: &[String], found: &mut Vec<DiscoveredFile>) -> Result<()> {
    let mut entries = fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_hidden(&name) {
            continue;
        }
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            if skip_dirs.iter().any(|skip| skip == &name) {
                debug!(dir = %entry.path().display(), "skipping directory");
                continue;
            }
            walk(&entry.path(), skip_dirs, found)?;
        } else if file_type.is_file() && !is_reference_output(&name) {
            found.push(DiscoveredFile {
                dir: dir.to_path_buf(),
                file_name: name,
            });
        }
    }
    Ok(())
}

/// Register each file and record the home engine's pass.
///
/// Two files mapping to one test id is a broken suite and aborts the run.
pub fn apply_discovered(registry: &mut TestRegistry, files: Vec<DiscoveredFile>) -> Result<LoadStats> {
    let home = registry.home_engine().to_string();
    let mut stats = LoadStats::default();

    for file in files {
        let Some(id) = TestId::from_path(&file.file_name) else {
            debug!(file = %file.file_name, "file name yields no test id");
            stats.skipped += 1;
            continue;
        };
        let test = registry.register_discovered(&id, file.path())?;
        test.set_imported(&home, Verdict::Pass)?;
        stats.applied += 1;
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ReportError;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(path, "<!DOCTYPE html>").expect("write");
    }

    #[test]
    fn test_walk_skips_support_hidden_and_references() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        touch(&root.join("t-002.html"));
        touch(&root.join("t-001.html"));
        touch(&root.join("t-001-expected.html"));
        touch(&root.join(".hidden.html"));
        touch(&root.join("support/helper.html"));
        touch(&root.join("sub/t-003.xht"));

        let files = discover_test_files(root, &["support".to_string()]).expect("walk");
        let names: Vec<&str> = files.iter().map(|f| f.file_name.as_str()).collect();

        // Depth-first, each directory in name order: `sub` sorts first.
        assert_eq!(names, vec!["t-003.xht", "t-001.html", "t-002.html"]);
        assert_eq!(files[0].dir, root.join("sub"));
        assert_eq!(files[1].dir, root.to_path_buf());
    }

    #[test]
    fn test_apply_registers_home_pass() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(&dir.path().join("t-001.html"));

        let files = discover_test_files(dir.path(), &[]).expect("walk");
        let mut registry = TestRegistry::new("blink");
        let stats = apply_discovered(&mut registry, files).expect("apply");

        assert_eq!(stats.applied, 1);
        let test = registry.get(&TestId::new("t-001").expect("id")).expect("t-001");
        assert_eq!(test.source_path(), Some(dir.path().join("t-001.html").as_path()));
        assert_eq!(
            test.imported().expect("imported").effective_verdict(),
            Verdict::Pass
        );
    }

    #[test]
    fn test_same_id_in_two_directories_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(&dir.path().join("a/t-001.html"));
        touch(&dir.path().join("b/t-001.xht"));

        let files = discover_test_files(dir.path(), &[]).expect("walk");
        let mut registry = TestRegistry::new("blink");
        let err = apply_discovered(&mut registry, files).expect_err("duplicate");

        assert!(matches!(err, ReportError::DuplicateTest { .. }));
    }

    #[test]
    fn test_missing_root_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = discover_test_files(&dir.path().join("absent"), &[]).expect_err("missing");
        assert!(matches!(err, ReportError::Io(_)));
    }
}
