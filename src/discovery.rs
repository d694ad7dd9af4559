//! Candidate discovery: scanning the test root for runnable executables

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::{HarnessConfig, SearchDepth};
use crate::HarnessError;

/// A discovered file that may be a test executable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCandidate {
    /// Absolute path used to launch the candidate
    pub path: PathBuf,
    /// Root-relative name used in console and transcript output
    pub name: String,
    /// Whether the execute bit is set for the current user
    pub executable: bool,
}

impl TestCandidate {
    /// Name of this candidate relative to the test root
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Candidate discovery engine
#[derive(Debug, Default)]
pub struct CandidateDiscovery;

impl CandidateDiscovery {
    pub fn new() -> Self {
        Self
    }

    /// Scan the root for qualifying candidates, in deterministic order.
    ///
    /// A candidate qualifies if its filename starts with the configured
    /// prefix, it is a regular file, and it is executable. Matches that are
    /// not regular executable files are silently skipped. A missing or
    /// unreadable root is fatal.
    pub fn discover(
        &self,
        root: &Path,
        config: &HarnessConfig,
    ) -> Result<Vec<TestCandidate>, HarnessError> {
        // Readability of the root itself is the only fatal condition.
        fs::read_dir(root).map_err(|_| HarnessError::DirectoryNotFound(root.to_path_buf()))?;

        let root = fs::canonicalize(root)
            .map_err(|_| HarnessError::DirectoryNotFound(root.to_path_buf()))?;

        let (min_depth, max_depth) = match config.depth {
            SearchDepth::RootOnly => (1, 1),
            SearchDepth::NestedOnly => (2, 2),
            SearchDepth::RootAndNested => (1, 2),
        };

        let mut candidates: Vec<TestCandidate> = WalkDir::new(&root)
            .min_depth(min_depth)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .map(|name| name.starts_with(&config.prefix))
                    .unwrap_or(false)
            })
            .map(|entry| {
                let path = entry.path().to_path_buf();
                let name = path
                    .strip_prefix(&root)
                    .unwrap_or(&path)
                    .to_string_lossy()
                    .into_owned();
                let executable = entry
                    .metadata()
                    .map(|meta| is_executable(&meta))
                    .unwrap_or(false);
                TestCandidate { path, name, executable }
            })
            .filter(|candidate| candidate.executable)
            .collect();

        // Root-level candidates sort before nested ones, matching the
        // historical two-pass glob order.
        candidates.sort_by(|a, b| {
            let depth_a = a.path.components().count();
            let depth_b = b.path.components().count();
            depth_a.cmp(&depth_b).then_with(|| a.path.cmp(&b.path))
        });

        Ok(candidates)
    }
}

#[cfg(unix)]
fn is_executable(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &fs::Metadata) -> bool {
    true
}
