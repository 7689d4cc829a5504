//! Per-column data quality profile.
//!
//! Observability only: nothing here feeds the pass/fail gate.

use serde::{Serialize, Serializer};
use std::collections::HashSet;

use super::report::{percentage, round2, serialize_pairs};
use crate::models::{CleanTransaction, Column, ColumnType};

/// Statistics for one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnProfile {
    pub dtype: ColumnType,
    pub missing_count: usize,
    pub missing_percentage: f64,
    pub unique_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Rounded to two decimals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
}

/// Quality profile of a cleaned record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    pub record_count: usize,
    pub column_count: usize,
    /// Estimated in-memory size of the records
    pub memory_usage_mb: f64,
    /// Column name → profile, in catalogue order
    #[serde(serialize_with = "serialize_columns")]
    pub column_info: Vec<(String, ColumnProfile)>,
}

impl QualityReport {
    pub fn column(&self, column: Column) -> Option<&ColumnProfile> {
        self.column_info
            .iter()
            .find(|(name, _)| name == column.name())
            .map(|(_, profile)| profile)
    }
}

fn serialize_columns<S: Serializer>(
    columns: &[(String, ColumnProfile)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serialize_pairs(columns, serializer)
}

/// Profile every catalogue column of `records`.
pub fn generate_quality_report(records: &[CleanTransaction]) -> QualityReport {
    let column_info = Column::ALL
        .iter()
        .map(|&column| (column.name().to_string(), profile_column(records, column)))
        .collect();

    QualityReport {
        record_count: records.len(),
        column_count: Column::ALL.len(),
        memory_usage_mb: round2(estimate_memory_bytes(records) as f64 / (1024.0 * 1024.0)),
        column_info,
    }
}

fn profile_column(records: &[CleanTransaction], column: Column) -> ColumnProfile {
    let mut missing_count = 0;
    let mut distinct = HashSet::new();
    let mut numbers = Vec::new();

    for value in records.iter().map(|r| r.get(column)) {
        match value {
            Some(v) => {
                if let Some(n) = v.as_f64() {
                    numbers.push(n);
                }
                distinct.insert(v);
            }
            None => missing_count += 1,
        }
    }

    let dtype = column.dtype();
    let (min, max, mean) = if dtype.is_numeric() && !numbers.is_empty() {
        let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
        let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
        (Some(min), Some(max), Some(round2(mean)))
    } else {
        (None, None, None)
    };

    ColumnProfile {
        dtype,
        missing_count,
        missing_percentage: percentage(missing_count, records.len()),
        unique_count: distinct.len(),
        min,
        max,
        mean,
    }
}

/// Struct size plus owned text, per record.
fn estimate_memory_bytes(records: &[CleanTransaction]) -> usize {
    let text = |s: &Option<String>| s.as_ref().map_or(0, String::len);
    records
        .iter()
        .map(|r| {
            std::mem::size_of::<CleanTransaction>()
                + r.transaction_id.len()
                + r.customer_id.len()
                + r.product_id.len()
                + r.day_of_week.len()
                + text(&r.product_category)
                + text(&r.region)
                + text(&r.payment_method)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::tests::record;

    #[test]
    fn test_numeric_column_profile() {
        let records = vec![
            record("TXN-1", 1, 10.0, 0.0, 10.0),
            record("TXN-2", 3, 20.0, 0.0, 60.0),
            record("TXN-3", 2, 20.0, 0.0, 40.0),
        ];

        let report = generate_quality_report(&records);
        let quantity = report.column(Column::Quantity).unwrap();

        assert_eq!(report.record_count, 3);
        assert_eq!(report.column_count, 25);
        assert_eq!(quantity.dtype, ColumnType::Integer);
        assert_eq!(quantity.min, Some(1.0));
        assert_eq!(quantity.max, Some(3.0));
        assert_eq!(quantity.mean, Some(2.0));

        let price = report.column(Column::UnitPrice).unwrap();
        assert_eq!(price.unique_count, 2);
    }

    #[test]
    fn test_missing_categories_are_counted() {
        let mut a = record("TXN-1", 1, 10.0, 0.0, 10.0);
        a.region = None;
        let b = record("TXN-2", 1, 10.0, 0.0, 10.0);

        let report = generate_quality_report(&[a, b]);
        let region = report.column(Column::Region).unwrap();

        assert_eq!(region.missing_count, 1);
        assert_eq!(region.missing_percentage, 50.0);
        assert_eq!(region.min, None);
    }

    #[test]
    fn test_report_serializes_columns_in_catalogue_order() {
        let report = generate_quality_report(&[record("TXN-1", 1, 10.0, 0.0, 10.0)]);
        let text = serde_json::to_string(&report).unwrap();

        assert!(text.find("\"transaction_id\"").unwrap() < text.find("\"price_tier\"").unwrap());
        assert!(text.contains("\"memory_usage_mb\""));
        assert!(!text.contains("\"mean\":null"));
    }

    #[test]
    fn test_empty_record_set() {
        let report = generate_quality_report(&[]);
        assert_eq!(report.record_count, 0);
        assert_eq!(report.memory_usage_mb, 0.0);
        assert_eq!(report.column(Column::Quantity).unwrap().missing_percentage, 0.0);
    }
}
