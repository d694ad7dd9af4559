//! Subprocess execution of test candidates

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;

use crate::classify::{MarkerTable, ScanReport};
use crate::config::HarnessConfig;
use crate::discovery::TestCandidate;
use crate::HarnessError;

/// Final classification of one candidate's run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// At least one PASSED marker and no failures
    Passed,
    /// At least one FAILED or segfault marker
    Failed,
    /// The candidate ran but emitted no recognized marker
    NoTests,
    /// The candidate could not be launched
    ExecutionError,
    /// The candidate exceeded the configured wall-clock bound
    Timeout,
}

impl Verdict {
    /// Derive a verdict from marker counts. Failure dominates; a run with
    /// no markers at all is reported distinctly from a passing one.
    pub fn from_scan(scan: &ScanReport) -> Self {
        if scan.counts.failed > 0 {
            Verdict::Failed
        } else if scan.counts.passed > 0 {
            Verdict::Passed
        } else {
            Verdict::NoTests
        }
    }

    pub fn passed(&self) -> bool {
        matches!(self, Verdict::Passed)
    }
}

/// Result of running a single candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Candidate that was executed
    pub candidate: TestCandidate,
    /// Full captured output (stdout followed by stderr), verbatim
    pub transcript: String,
    /// Marker scan of the transcript
    pub scan: ScanReport,
    /// Derived verdict
    pub verdict: Verdict,
    /// Wall-clock duration of the run
    pub duration: Duration,
    /// Launch-error message, if the candidate never ran
    pub error_message: Option<String>,
}

impl RunResult {
    /// A run that completed and was scanned for markers
    pub fn completed(
        candidate: TestCandidate,
        transcript: String,
        scan: ScanReport,
        duration: Duration,
    ) -> Self {
        let verdict = Verdict::from_scan(&scan);
        Self { candidate, transcript, scan, verdict, duration, error_message: None }
    }

    /// A candidate that could not be launched
    pub fn launch_error(candidate: TestCandidate, error_message: String) -> Self {
        Self {
            candidate,
            transcript: String::new(),
            scan: ScanReport::default(),
            verdict: Verdict::ExecutionError,
            duration: Duration::ZERO,
            error_message: Some(error_message),
        }
    }

    /// A run that exceeded the configured wall-clock bound
    pub fn timed_out(candidate: TestCandidate, duration: Duration) -> Self {
        Self {
            candidate,
            transcript: String::new(),
            scan: ScanReport::default(),
            verdict: Verdict::Timeout,
            duration,
            error_message: Some("test run timed out".to_string()),
        }
    }

    /// Whether any line of the run was a segmentation-fault marker
    pub fn segfaulted(&self) -> bool {
        self.scan.counts.segfaults > 0
    }
}

/// Runs one candidate at a time as a child process.
///
/// Candidates are launched with no arguments and with the working directory
/// set to the test root, not the candidate's own directory: tests locate
/// their fixtures relative to a known root.
pub struct CandidateRunner {
    markers: MarkerTable,
    working_dir: PathBuf,
    timeout: Option<Duration>,
}

impl CandidateRunner {
    /// Create a runner for the given resolved test root
    pub fn new(config: &HarnessConfig, working_dir: PathBuf) -> Result<Self, HarnessError> {
        Ok(Self {
            markers: MarkerTable::new()?,
            working_dir,
            timeout: config.timeout.map(Duration::from_secs),
        })
    }

    /// Execute one candidate to completion and classify its output.
    ///
    /// Launch failures are recovered locally: the suite must never abort
    /// because one candidate could not start, so every outcome is a
    /// `RunResult` rather than an error.
    pub async fn run(&self, candidate: &TestCandidate) -> RunResult {
        let start = Instant::now();

        let mut command = Command::new(&candidate.path);
        command
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = match command.spawn() {
            Ok(child) => child,
            Err(e) => return RunResult::launch_error(candidate.clone(), e.to_string()),
        };

        let waited = match self.timeout {
            Some(bound) => match timeout(bound, child.wait_with_output()).await {
                Ok(result) => result,
                // Dropping the timed-out future kills the child.
                Err(_) => return RunResult::timed_out(candidate.clone(), start.elapsed()),
            },
            None => child.wait_with_output().await,
        };

        let output = match waited {
            Ok(output) => output,
            Err(e) => return RunResult::launch_error(candidate.clone(), e.to_string()),
        };

        let duration = start.elapsed();

        // Both streams are captured in full; the transcript is stdout
        // followed by stderr.
        let mut transcript = String::from_utf8_lossy(&output.stdout).into_owned();
        transcript.push_str(&String::from_utf8_lossy(&output.stderr));

        let scan = self.markers.scan(&transcript);
        RunResult::completed(candidate.clone(), transcript, scan, duration)
    }
}
