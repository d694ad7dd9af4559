//! Aggregation, console narration, and the transcript file

use console::style;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::classify::{MarkerEvent, MarkerKind};
use crate::execution::{RunResult, Verdict};
use crate::HarnessError;

/// Width of the separator lines bracketing each transcript block
pub const SEPARATOR_WIDTH: usize = 80;

fn separator() -> String {
    "=".repeat(SEPARATOR_WIDTH)
}

/// Aggregate verdicts and totals for one harness invocation.
///
/// The historical harness kept these as process-wide counters; here they are
/// an explicit value returned from the pipeline so the harness can be
/// invoked repeatedly in-process without leakage between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateReport {
    /// Per-candidate verdicts, in discovery order
    pub verdicts: Vec<(String, Verdict)>,
    /// Number of candidates discovered
    pub discovered: usize,
    /// Number of candidates actually launched (including execution errors
    /// and timeouts)
    pub total_executed: usize,
    /// Number of candidates whose verdict was Passed
    pub total_passed: usize,
    /// Wall-clock duration of the whole invocation
    pub duration: Duration,
    /// When the invocation started
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Location of the transcript file
    pub results_path: PathBuf,
}

impl AggregateReport {
    pub fn new(discovered: usize, results_path: PathBuf) -> Self {
        Self {
            verdicts: Vec::new(),
            discovered,
            total_executed: 0,
            total_passed: 0,
            duration: Duration::ZERO,
            timestamp: chrono::Utc::now(),
            results_path,
        }
    }

    /// Fold one run into the totals. Every launched candidate counts as
    /// executed; only a Passed verdict counts as passed.
    pub fn record(&mut self, result: &RunResult) {
        self.total_executed += 1;
        if result.verdict.passed() {
            self.total_passed += 1;
        }
        self.verdicts.push((result.candidate.name.clone(), result.verdict));

        debug_assert!(self.total_passed <= self.total_executed);
        debug_assert!(self.total_executed <= self.discovered);
    }

    /// Record the total invocation duration once all candidates finished
    pub fn finalize(&mut self, duration: Duration) {
        self.duration = duration;
    }

    /// Whether every executed candidate passed
    pub fn all_passed(&self) -> bool {
        self.total_passed == self.total_executed
    }

    /// Whether this invocation should exit zero: every candidate passed and
    /// at least one actually ran (nothing passes trivially)
    pub fn success(&self) -> bool {
        self.total_executed > 0 && self.all_passed()
    }

    /// The final summary line
    pub fn summary_line(&self) -> String {
        format!("{}/{} unit tests passed.", self.total_passed, self.total_executed)
    }

    /// Print the final summary plus a failure banner when anything fell short
    pub fn print_summary(&self) {
        println!("{}", self.summary_line());

        if self.total_executed == 0 {
            println!("{}", style("No unit tests were found to run.").bold().red());
            return;
        }

        if !self.all_passed() {
            println!("{}", style("SOMETHING FAILED. Way to screw up my code!").bold().red());
            println!("see details in {}", self.results_path.display());
        }
    }

    /// Print a per-candidate verdict listing
    pub fn print_detailed(&self) {
        println!();
        println!(
            "{}",
            style(format!("Run at: {}", self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"))).dim()
        );
        println!("{}", style(format!("Duration: {:.2?}", self.duration)).dim());

        for (name, verdict) in &self.verdicts {
            let mark = match verdict {
                Verdict::Passed => style("ok").green(),
                Verdict::Failed => style("FAILED").red(),
                Verdict::NoTests => style("no tests").yellow(),
                Verdict::ExecutionError => style("exec error").red(),
                Verdict::Timeout => style("timed out").red(),
            };
            println!("  {:<40} {}", name, mark);
        }
    }

    /// Export the report as JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save the JSON report to a file
    pub fn save_to_file(&self, path: &Path) -> Result<(), HarnessError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Writer for the transcript file.
///
/// Opened once per invocation (truncating any previous transcript), written
/// incrementally as runs finish, and flushed on `finish`. Dropping the
/// writer closes the file on every exit path.
pub struct TranscriptWriter {
    out: BufWriter<File>,
    path: PathBuf,
}

impl TranscriptWriter {
    /// Create (or overwrite) the transcript file and write the preamble
    pub fn create(path: &Path) -> Result<Self, HarnessError> {
        let file = File::create(path)?;
        let mut writer = Self { out: BufWriter::new(file), path: path.to_path_buf() };
        writeln!(writer.out, "{}", separator())?;
        Ok(writer)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the header announcing one run
    pub fn begin_run(&mut self, name: &str) -> Result<(), HarnessError> {
        writeln!(self.out, "  Running test <{}>", name)?;
        writeln!(self.out, "{}", separator())?;
        Ok(())
    }

    /// Write one run's captured output verbatim, closed by a separator
    pub fn end_run(&mut self, transcript: &str) -> Result<(), HarnessError> {
        self.out.write_all(transcript.as_bytes())?;
        if !transcript.is_empty() && !transcript.ends_with('\n') {
            writeln!(self.out)?;
        }
        writeln!(self.out, "{}", separator())?;
        Ok(())
    }

    /// Flush everything to disk
    pub fn finish(&mut self) -> Result<(), HarnessError> {
        self.out.flush()?;
        Ok(())
    }
}

/// Live console narration of the suite as it runs.
///
/// In quiet mode the per-test narrative is replaced by a progress bar; the
/// final summary is printed either way.
pub struct ConsoleReporter {
    quiet: bool,
    progress: Option<indicatif::ProgressBar>,
}

impl ConsoleReporter {
    pub fn new(quiet: bool) -> Self {
        Self { quiet, progress: None }
    }

    /// Attach a progress bar once the candidate count is known
    pub fn start_progress(&mut self, total: usize) -> Result<(), HarnessError> {
        if !self.quiet {
            return Ok(());
        }

        let bar = indicatif::ProgressBar::new(total as u64);
        bar.set_style(indicatif::ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
        )?);
        self.progress = Some(bar);
        Ok(())
    }

    pub fn looking_in(&self, root: &Path) {
        if !self.quiet {
            println!("Looking for unit tests in <{}>", root.display());
        }
    }

    /// Announce a candidate that could not be launched. This is reported as
    /// a failure immediately, independent of any marker scan.
    pub fn launch_failure(&self, name: &str, error: &str) {
        if self.quiet {
            return;
        }
        println!("   problem executing test {}: {}", name, error);
        println!("{}", style(format!("Unit test <{}> FAILED", name)).red());
    }

    /// Echo one recognized marker line as the original harness did: crash
    /// and failure notes for the human watching live output, tree-drawing
    /// lines verbatim.
    pub fn marker_event(&self, name: &str, event: &MarkerEvent) {
        if self.quiet {
            return;
        }
        match event.kind {
            MarkerKind::Segfault => {
                println!("{}", style(format!("  /---- Unit test {} segfaulted!", name)).red());
            }
            MarkerKind::Failed => {
                println!("{}", style(format!("  /---- Unit test {} failed", name)).red());
            }
            MarkerKind::Tree => println!("{}", event.line),
            MarkerKind::Passed => {}
        }
    }

    /// Print the verdict banner for one finished run
    pub fn verdict(&self, name: &str, verdict: Verdict) {
        if self.quiet {
            return;
        }
        match verdict {
            Verdict::Passed => {
                println!("{}", style(format!("Unit test <{}> PASSED", name)).green());
            }
            Verdict::Failed => {
                println!("{}", style(format!("Unit test <{}> FAILED", name)).red());
            }
            Verdict::NoTests => {
                println!("{}", style(format!("Unit test <{}> had no tests!", name)).yellow());
            }
            Verdict::Timeout => {
                println!("{}", style(format!("Unit test <{}> timed out!", name)).red());
            }
            // Announced through launch_failure instead
            Verdict::ExecutionError => {}
        }
    }

    /// Advance the progress bar after each run
    pub fn run_finished(&self) {
        if let Some(bar) = &self.progress {
            bar.inc(1);
        }
    }

    /// Finish progress reporting before the summary prints
    pub fn finish(&self) {
        if let Some(bar) = &self.progress {
            bar.finish_and_clear();
        }
    }
}
