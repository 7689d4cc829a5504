//! Numeric reducers and the summary statistics table.

use serde::Serialize;

use crate::models::{CleanTransaction, Column};

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    quantile_sorted(&sorted, 0.5)
}

/// Quantile with linear interpolation between closest ranks.
/// `sorted` must be ascending.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    match sorted.len() {
        0 => None,
        1 => Some(sorted[0]),
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
        }
    }
}

/// Sample standard deviation (n - 1 denominator).
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// One row of the summary statistics table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub p25: Option<f64>,
    #[serde(rename = "50%")]
    pub p50: Option<f64>,
    #[serde(rename = "75%")]
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

/// count/mean/std/min/quartiles/max for every numeric column.
pub fn describe(records: &[CleanTransaction]) -> Vec<ColumnSummary> {
    Column::ALL
        .iter()
        .filter(|c| c.dtype().is_numeric())
        .map(|&column| {
            let mut values: Vec<f64> = records
                .iter()
                .filter_map(|r| r.get(column).and_then(|v| v.as_f64()))
                .collect();
            values.sort_by(f64::total_cmp);

            ColumnSummary {
                column: column.name().to_string(),
                count: values.len(),
                mean: mean(&values),
                std: std_dev(&values),
                min: values.first().copied(),
                p25: quantile_sorted(&values, 0.25),
                p50: quantile_sorted(&values, 0.5),
                p75: quantile_sorted(&values, 0.75),
                max: values.last().copied(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::tests::record;

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_quantiles_interpolate() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_sorted(&sorted, 0.25), Some(1.75));
        assert_eq!(quantile_sorted(&sorted, 0.75), Some(3.25));
        assert_eq!(quantile_sorted(&sorted, 1.0), Some(4.0));
    }

    #[test]
    fn test_sample_std() {
        let std = std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((std - 2.138).abs() < 0.001);
        assert_eq!(std_dev(&[1.0]), None);
    }

    #[test]
    fn test_describe_covers_numeric_columns() {
        let records = vec![
            record("TXN-1", 1, 10.0, 0.0, 10.0),
            record("TXN-2", 3, 10.0, 0.0, 30.0),
        ];

        let summary = describe(&records);
        let quantity = summary.iter().find(|s| s.column == "quantity").unwrap();

        assert_eq!(quantity.count, 2);
        assert_eq!(quantity.mean, Some(2.0));
        assert_eq!(quantity.p50, Some(2.0));
        assert!(summary.iter().all(|s| s.column != "region"));
        assert!(summary.iter().any(|s| s.column == "net_revenue"));
    }
}
