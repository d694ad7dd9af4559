//! Output classification: scanning captured output for marker lines

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::HarnessError;

/// Kind of a recognized marker line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerKind {
    /// A `  PASSED: ...` line
    Passed,
    /// A `  FAILED: ...` line
    Failed,
    /// A `Segmentation fault...` line (counted as a failure, tagged as a crash)
    Segfault,
    /// A decorative tree-drawing line, echoed to the console but not counted
    Tree,
}

/// Per-run marker counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanCounts {
    pub passed: usize,
    pub failed: usize,
    pub segfaults: usize,
}

/// One recognized marker line, in output order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerEvent {
    pub kind: MarkerKind,
    /// The matching line with trailing whitespace trimmed
    pub line: String,
}

/// Result of scanning one run's captured output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub counts: ScanCounts,
    pub events: Vec<MarkerEvent>,
}

/// Ordered table of marker patterns.
///
/// Classification is a pattern-matching concern, so the patterns live in a
/// small ordered table rather than in the scan loop; the first matching
/// entry wins for each line.
pub struct MarkerTable {
    entries: Vec<(Regex, MarkerKind)>,
}

impl MarkerTable {
    /// Build the table of recognized marker patterns
    pub fn new() -> Result<Self, HarnessError> {
        let entries = vec![
            (Regex::new(r"^  PASSED:")?, MarkerKind::Passed),
            (Regex::new(r"^  FAILED:")?, MarkerKind::Failed),
            (Regex::new(r"^Segmentation fault")?, MarkerKind::Segfault),
            (Regex::new(r"^  (\|  |\+--)")?, MarkerKind::Tree),
        ];

        Ok(Self { entries })
    }

    /// Classify a single output line
    pub fn classify_line(&self, line: &str) -> Option<MarkerKind> {
        self.entries
            .iter()
            .find(|(pattern, _)| pattern.is_match(line))
            .map(|(_, kind)| *kind)
    }

    /// Scan a full captured transcript line by line
    pub fn scan(&self, transcript: &str) -> ScanReport {
        let mut counts = ScanCounts::default();
        let mut events = Vec::new();

        for line in transcript.lines() {
            let Some(kind) = self.classify_line(line) else {
                continue;
            };

            match kind {
                MarkerKind::Passed => counts.passed += 1,
                MarkerKind::Failed => counts.failed += 1,
                MarkerKind::Segfault => {
                    counts.failed += 1;
                    counts.segfaults += 1;
                }
                MarkerKind::Tree => {}
            }

            events.push(MarkerEvent { kind, line: line.trim_end().to_string() });
        }

        ScanReport { counts, events }
    }
}
