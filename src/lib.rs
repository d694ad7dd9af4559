//! # runtests
//!
//! A harness for running directories of standalone unit-test executables.
//! Candidates are discovered by filename prefix, executed one at a time as
//! child processes, and judged by scanning their captured output for a
//! small set of marker lines (`  PASSED:`, `  FAILED:`, `Segmentation
//! fault`). Results are narrated live on the console and written in full
//! to a transcript file.
//!
//! ## Architecture
//!
//! The harness is organized as one module per pipeline stage:
//! - `discovery`: candidate scan of the test root
//! - `execution`: subprocess launch, capture, and per-run results
//! - `classify`: marker table and output classification
//! - `reporting`: aggregate totals, console narration, transcript file
//! - `harness`: pipeline orchestration
//! - `config`: configuration and CLI surface

pub mod classify;
pub mod config;
pub mod discovery;
pub mod execution;
pub mod harness;
pub mod reporting;

// Re-exports for easier access
pub use classify::{MarkerEvent, MarkerKind, MarkerTable, ScanCounts, ScanReport};
pub use config::{HarnessConfig, SearchDepth};
pub use discovery::{CandidateDiscovery, TestCandidate};
pub use execution::{CandidateRunner, RunResult, Verdict};
pub use harness::{HarnessBuilder, TestHarness, TestRunner};
pub use reporting::AggregateReport;

/// Current version of the harness
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Harness errors
#[derive(thiserror::Error, Debug)]
pub enum HarnessError {
    #[error("test directory not found or not readable: {}", .0.display())]
    DirectoryNotFound(std::path::PathBuf),

    #[error("candidate discovery failed: {0}")]
    Discovery(String),

    #[error("test execution failed: {0}")]
    Execution(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid marker pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("report serialization error: {0}")]
    Report(#[from] serde_json::Error),

    #[error("template error: {0}")]
    Template(#[from] indicatif::style::TemplateError),
}
