//! Configuration and settings for the test harness

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::HarnessError;

/// How deep below the root directory candidates are searched for.
///
/// The historical harness scripts disagreed on this (one scanned only
/// subdirectories, the other scanned the root as well), so the depth is an
/// explicit option rather than a hard-coded glob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum SearchDepth {
    /// Only files directly under the root
    RootOnly,
    /// Only files exactly one directory level below the root
    NestedOnly,
    /// Files under the root and one level below it
    RootAndNested,
}

/// Configuration for the test harness
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "runtests")]
#[command(about = "Run every unit test executable under a directory", version)]
pub struct HarnessConfig {
    /// Directory to search for unit tests (defaults to the directory
    /// containing the harness executable)
    #[arg(value_name = "ROOT")]
    pub root: Option<PathBuf>,

    /// Filename prefix identifying test executables
    #[arg(long, default_value = "t")]
    pub prefix: String,

    /// Search depth below the root directory
    #[arg(long, value_enum, default_value_t = SearchDepth::RootAndNested)]
    pub depth: SearchDepth,

    /// Transcript file name, created in the root directory unless absolute
    #[arg(long, default_value = "testresults.txt")]
    pub output: PathBuf,

    /// Per-test wall-clock bound in seconds (unset = wait forever)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Write the aggregate report as JSON to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Suppress the per-test narrative and show a progress bar instead
    #[arg(short, long)]
    pub quiet: bool,

    /// Print a per-candidate verdict listing after the summary
    #[arg(short, long)]
    pub verbose: bool,
}

impl HarnessConfig {
    /// Create a configuration with defaults for the given root
    pub fn new(root: PathBuf) -> Self {
        Self {
            root: Some(root),
            prefix: "t".to_string(),
            depth: SearchDepth::RootAndNested,
            output: PathBuf::from("testresults.txt"),
            timeout: None,
            report: None,
            quiet: false,
            verbose: false,
        }
    }

    /// Resolve the test root: the configured directory, or the directory
    /// containing the harness executable itself
    pub fn resolved_root(&self) -> Result<PathBuf, HarnessError> {
        match &self.root {
            Some(path) => Ok(path.clone()),
            None => {
                let exe = std::env::current_exe()?;
                exe.parent().map(Path::to_path_buf).ok_or_else(|| {
                    HarnessError::Config(
                        "cannot determine the directory containing the harness".to_string(),
                    )
                })
            }
        }
    }

    /// Location of the transcript file for the given resolved root
    pub fn results_path(&self, root: &Path) -> PathBuf {
        if self.output.is_absolute() {
            self.output.clone()
        } else {
            root.join(&self.output)
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.prefix.is_empty() {
            return Err(HarnessError::Config(
                "candidate prefix must not be empty".to_string(),
            ));
        }

        if self.timeout == Some(0) {
            return Err(HarnessError::Config(
                "timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
