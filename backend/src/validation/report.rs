//! Validation report structures.
//!
//! The serialized shape is a published contract:
//!
//! ```json
//! {
//!   "timestamp": "2024-05-01T09:30:00.123456",
//!   "total_records": 9870,
//!   "checks": { "<name>": { "passed": true, "details": ... } },
//!   "overall_status": "PASSED"
//! }
//! ```

use chrono::NaiveDateTime;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Name of a registered validation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckName {
    Completeness,
    Uniqueness,
    Consistency,
    Accuracy,
}

impl CheckName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completeness => "completeness",
            Self::Uniqueness => "uniqueness",
            Self::Consistency => "consistency",
            Self::Accuracy => "accuracy",
        }
    }
}

impl fmt::Display for CheckName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Missing-value tally for one critical field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingStat {
    pub count: usize,
    pub percentage: f64,
}

/// Duplicate-identifier tally.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateStat {
    pub duplicate_count: usize,
    pub duplicate_percentage: f64,
}

/// Diagnostic payload of a check; its shape varies by check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CheckDetails {
    Message(String),
    MissingCounts(BTreeMap<String, MissingStat>),
    Duplicates(DuplicateStat),
    Issues(Vec<String>),
}

impl CheckDetails {
    pub fn message(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }
}

impl fmt::Display for CheckDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckDetails::Message(msg) => f.write_str(msg),
            CheckDetails::MissingCounts(counts) => {
                let parts: Vec<String> = counts
                    .iter()
                    .map(|(field, stat)| format!("{}: {} ({}%)", field, stat.count, stat.percentage))
                    .collect();
                f.write_str(&parts.join(", "))
            }
            CheckDetails::Duplicates(stat) => write!(
                f,
                "{} duplicates ({}%)",
                stat.duplicate_count, stat.duplicate_percentage
            ),
            CheckDetails::Issues(issues) => f.write_str(&issues.join("; ")),
        }
    }
}

/// Result of one check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckOutcome {
    pub passed: bool,
    pub details: CheckDetails,
}

impl CheckOutcome {
    pub fn new(passed: bool, details: CheckDetails) -> Self {
        Self { passed, details }
    }
}

/// Check results in registry order, serialized as a name → outcome map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckResults(Vec<(CheckName, CheckOutcome)>);

impl CheckResults {
    pub(crate) fn push(&mut self, name: CheckName, outcome: CheckOutcome) {
        self.0.push((name, outcome));
    }

    pub fn get(&self, name: CheckName) -> Option<&CheckOutcome> {
        self.0.iter().find(|(n, _)| *n == name).map(|(_, o)| o)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CheckName, &CheckOutcome)> {
        self.0.iter().map(|(n, o)| (*n, o))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn all_passed(&self) -> bool {
        self.0.iter().all(|(_, o)| o.passed)
    }

    /// Failed checks only.
    pub fn failures(&self) -> impl Iterator<Item = (CheckName, &CheckOutcome)> {
        self.iter().filter(|(_, o)| !o.passed)
    }
}

impl Serialize for CheckResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_pairs(&self.0, serializer)
    }
}

/// `PASSED` iff every check passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OverallStatus {
    Passed,
    Failed,
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Passed => "PASSED",
            Self::Failed => "FAILED",
        })
    }
}

/// Report produced once per validation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub timestamp: NaiveDateTime,
    pub total_records: usize,
    pub checks: CheckResults,
    pub overall_status: OverallStatus,
}

impl ValidationReport {
    pub(crate) fn new(timestamp: NaiveDateTime, total_records: usize, checks: CheckResults) -> Self {
        let overall_status = if checks.all_passed() {
            OverallStatus::Passed
        } else {
            OverallStatus::Failed
        };
        Self {
            timestamp,
            total_records,
            checks,
            overall_status,
        }
    }

    pub fn passed(&self) -> bool {
        self.overall_status == OverallStatus::Passed
    }
}

/// Serialize ordered `(key, value)` pairs as a map.
pub(crate) fn serialize_pairs<S, K, V>(pairs: &[(K, V)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    K: Serialize,
    V: Serialize,
{
    let mut map = serializer.serialize_map(Some(pairs.len()))?;
    for (key, value) in pairs {
        map.serialize_entry(key, value)?;
    }
    map.end()
}

/// Round to two decimals.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `part / whole` as a percentage rounded to two decimals.
pub(crate) fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round2(part as f64 / whole as f64 * 100.0)
    }
}
