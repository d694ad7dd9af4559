//! Pipeline orchestration: discovery, execution, classification, reporting

use std::path::PathBuf;
use std::time::Instant;

use crate::config::{HarnessConfig, SearchDepth};
use crate::discovery::CandidateDiscovery;
use crate::execution::{CandidateRunner, Verdict};
use crate::reporting::{AggregateReport, ConsoleReporter, TranscriptWriter};
use crate::HarnessError;

/// The test harness: wires the pipeline stages together and runs every
/// discovered candidate to completion, one at a time.
///
/// Execution is strictly sequential. Candidates may share fixtures and the
/// working directory, so they are not safe to run concurrently.
pub struct TestHarness {
    config: HarnessConfig,
}

impl TestHarness {
    /// Create a harness with a validated configuration
    pub fn new(config: HarnessConfig) -> Result<Self, HarnessError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the harness configuration
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Run the whole suite and produce the aggregate report.
    ///
    /// Only a missing or unreadable root is fatal; it aborts before the
    /// transcript file is created. Every per-candidate failure is isolated
    /// and announced on the console as it happens.
    pub async fn run(&self) -> Result<AggregateReport, HarnessError> {
        let start = Instant::now();
        let root = self.config.resolved_root()?;

        let mut console = ConsoleReporter::new(self.config.quiet);
        console.looking_in(&root);

        let candidates = CandidateDiscovery::new().discover(&root, &self.config)?;
        console.start_progress(candidates.len())?;

        let results_path = self.config.results_path(&root);
        let mut transcript = TranscriptWriter::create(&results_path)?;
        let runner = CandidateRunner::new(&self.config, root.clone())?;
        let mut report = AggregateReport::new(candidates.len(), results_path);

        for candidate in &candidates {
            transcript.begin_run(candidate.name())?;

            let result = runner.run(candidate).await;

            match result.verdict {
                Verdict::ExecutionError => {
                    let error = result.error_message.as_deref().unwrap_or("unknown error");
                    console.launch_failure(candidate.name(), error);
                }
                _ => {
                    transcript.end_run(&result.transcript)?;
                    for event in &result.scan.events {
                        console.marker_event(candidate.name(), event);
                    }
                    console.verdict(candidate.name(), result.verdict);
                }
            }

            report.record(&result);
            console.run_finished();
        }

        transcript.finish()?;
        console.finish();
        report.finalize(start.elapsed());

        Ok(report)
    }
}

/// Test runner trait for synchronous callers
pub trait TestRunner {
    /// Run the suite and return the aggregate report
    fn run_tests(&self) -> Result<AggregateReport, HarnessError>;

    /// Get the harness configuration
    fn config(&self) -> &HarnessConfig;
}

impl TestRunner for TestHarness {
    fn run_tests(&self) -> Result<AggregateReport, HarnessError> {
        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| HarnessError::Execution(format!("failed to create async runtime: {e}")))?;

        rt.block_on(self.run())
    }

    fn config(&self) -> &HarnessConfig {
        &self.config
    }
}

/// Builder pattern for creating harnesses in-process
pub struct HarnessBuilder {
    config: HarnessConfig,
}

impl HarnessBuilder {
    /// Start building a harness rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { config: HarnessConfig::new(root.into()) }
    }

    /// Set the candidate filename prefix
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.prefix = prefix.into();
        self
    }

    /// Set the search depth
    pub fn depth(mut self, depth: SearchDepth) -> Self {
        self.config.depth = depth;
        self
    }

    /// Set the transcript file name
    pub fn output(mut self, output: impl Into<PathBuf>) -> Self {
        self.config.output = output.into();
        self
    }

    /// Bound each test run to the given number of seconds
    pub fn timeout(mut self, timeout_secs: u64) -> Self {
        self.config.timeout = Some(timeout_secs);
        self
    }

    /// Suppress the per-test narrative
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.config.quiet = quiet;
        self
    }

    /// Enable the per-candidate verdict listing
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    /// Build the harness
    pub fn build(self) -> Result<TestHarness, HarnessError> {
        TestHarness::new(self.config)
    }
}
