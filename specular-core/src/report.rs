//! Difference records and the report produced by a comparison run.

use serde::{Deserialize, Serialize};

/// Kind of recorded difference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiffKind {
    /// Two simple values disagree.
    Value,
    /// Runtime types differ.
    Type,
    /// Exactly one side is absent.
    Missing,
    /// Sequences have different lengths.
    Count,
}

impl DiffKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiffKind::Value => "value",
            DiffKind::Type => "type",
            DiffKind::Missing => "missing",
            DiffKind::Count => "count",
        }
    }
}

/// A single recorded mismatch between two compared values.
///
/// Immutable once recorded; owned by the [`DiffReport`] of the run that
/// produced it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Difference {
    /// Dotted/bracketed address of the value within the root object graph.
    pub value_path: String,

    /// Kind of mismatch.
    pub kind: DiffKind,

    /// Rendered value on the actual side, if present.
    pub actual: Option<String>,

    /// Rendered value on the expected side, if present.
    pub expected: Option<String>,

    /// Optional human-readable explanation.
    pub reason: Option<String>,
}

impl Difference {
    /// Two simple values disagreed.
    pub fn value(path: impl Into<String>, actual: String, expected: String) -> Self {
        Self {
            value_path: path.into(),
            kind: DiffKind::Value,
            actual: Some(actual),
            expected: Some(expected),
            reason: None,
        }
    }

    /// Runtime types differed.
    pub fn type_mismatch(path: impl Into<String>, actual_type: &str, expected_type: &str) -> Self {
        Self {
            value_path: path.into(),
            kind: DiffKind::Type,
            actual: Some(actual_type.to_string()),
            expected: Some(expected_type.to_string()),
            reason: None,
        }
    }

    /// Exactly one side was absent.
    pub fn missing(
        path: impl Into<String>,
        actual: Option<String>,
        expected: Option<String>,
    ) -> Self {
        Self {
            value_path: path.into(),
            kind: DiffKind::Missing,
            actual,
            expected,
            reason: None,
        }
    }

    /// Sequences had different lengths.
    pub fn element_count(path: impl Into<String>, actual_len: usize, expected_len: usize) -> Self {
        Self {
            value_path: path.into(),
            kind: DiffKind::Count,
            actual: Some(actual_len.to_string()),
            expected: Some(expected_len.to_string()),
            reason: None,
        }
    }

    /// Attach an explanation.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// A member skipped during comparison or copying, with the reason.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SkippedMember {
    /// Address of the skipped member.
    pub value_path: String,
    /// Why the member was skipped.
    pub reason: String,
}

/// Summary statistics for a comparison run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DiffSummary {
    pub value_mismatches: u32,
    pub type_mismatches: u32,
    pub missing_values: u32,
    pub count_mismatches: u32,
    pub skipped_members: u32,
}

impl DiffSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the counter for a recorded difference kind.
    pub fn record(&mut self, kind: DiffKind) {
        match kind {
            DiffKind::Value => self.value_mismatches += 1,
            DiffKind::Type => self.type_mismatches += 1,
            DiffKind::Missing => self.missing_values += 1,
            DiffKind::Count => self.count_mismatches += 1,
        }
    }

    /// Generate a human-readable summary string.
    pub fn text(&self) -> String {
        let mut parts = Vec::new();

        if self.value_mismatches > 0 {
            parts.push(format!("{} value", self.value_mismatches));
        }
        if self.type_mismatches > 0 {
            parts.push(format!("{} type", self.type_mismatches));
        }
        if self.missing_values > 0 {
            parts.push(format!("{} missing", self.missing_values));
        }
        if self.count_mismatches > 0 {
            parts.push(format!("{} count", self.count_mismatches));
        }
        if self.skipped_members > 0 {
            parts.push(format!("{} skipped", self.skipped_members));
        }

        if parts.is_empty() {
            "No differences".to_string()
        } else {
            format!("differences: {}", parts.join(", "))
        }
    }
}

/// Ordered audit trail of a single comparison run.
///
/// Differences are appended in traversal order and never mutated afterwards.
/// Create a fresh report per top-level comparison, or [`clear`](Self::clear)
/// one between runs.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DiffReport {
    /// All differences, in the order they were found.
    pub differences: Vec<Difference>,

    /// Members skipped because an accessor faulted.
    pub skipped: Vec<SkippedMember>,

    /// Summary statistics.
    pub summary: DiffSummary,
}

impl DiffReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a difference and update the summary.
    pub fn record(&mut self, difference: Difference) {
        self.summary.record(difference.kind);
        self.differences.push(difference);
    }

    /// Note a member that was skipped because its accessor faulted.
    pub fn note_skipped(&mut self, value_path: impl Into<String>, reason: impl Into<String>) {
        self.summary.skipped_members += 1;
        self.skipped.push(SkippedMember {
            value_path: value_path.into(),
            reason: reason.into(),
        });
    }

    /// Whether the compared values matched. Skipped members do not count as
    /// differences.
    pub fn is_match(&self) -> bool {
        self.differences.is_empty()
    }

    /// Number of recorded differences.
    pub fn len(&self) -> usize {
        self.differences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.differences.is_empty()
    }

    /// Paths of all recorded differences, in order.
    pub fn paths(&self) -> Vec<&str> {
        self.differences
            .iter()
            .map(|d| d.value_path.as_str())
            .collect()
    }

    /// Differences of one kind.
    pub fn filter_kind(&self, kind: DiffKind) -> Vec<&Difference> {
        self.differences.iter().filter(|d| d.kind == kind).collect()
    }

    /// Reset the report for reuse between runs.
    pub fn clear(&mut self) {
        self.differences.clear();
        self.skipped.clear();
        self.summary = DiffSummary::default();
    }
}

/// Compose a member path segment: `parent.member`.
pub fn member_path(parent: &str, member: &str) -> String {
    if parent.is_empty() {
        member.to_string()
    } else {
        format!("{}.{}", parent, member)
    }
}

/// Compose an element path segment: `parent[index]` — no dot before a
/// bracket.
pub fn element_path(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}
