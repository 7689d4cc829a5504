//! Output Store - persist processed records, views and reports
//!
//! Every file lands in one output directory and is named
//! `<name>_<YYYYmmdd_HHMMSS>.<ext>` unless an explicit filename is given.

use chrono::Local;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::aggregate::{describe, Aggregations, PivotTable};
use crate::api::logs::{log_info, log_success};
use crate::error::{OutputError, OutputResult};
use crate::models::CleanTransaction;
use crate::validation::{validate_report_shape, QualityReport, ValidationReport};

/// Directory where outputs are written (relative to current dir)
pub const DEFAULT_OUTPUT_DIR: &str = "data/processed";

/// Writes pipeline artifacts into one directory
#[derive(Debug, Clone)]
pub struct OutputStore {
    output_dir: PathBuf,
}

impl OutputStore {
    /// Create a store in the default directory
    pub fn new() -> OutputResult<Self> {
        Self::with_dir(DEFAULT_OUTPUT_DIR)
    }

    /// Create a store in a custom directory, creating it if needed
    pub fn with_dir(dir: impl AsRef<Path>) -> OutputResult<Self> {
        let output_dir = PathBuf::from(dir.as_ref());
        fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    pub fn dir(&self) -> &Path {
        &self.output_dir
    }

    /// Save cleaned records as CSV
    pub fn save_processed_data(
        &self,
        records: &[CleanTransaction],
        filename: Option<&str>,
    ) -> OutputResult<PathBuf> {
        let path = self.path_for(filename, "processed_data", "csv");
        log_info(format!("Saving processed data to {}", path.display()));
        write_csv(&path, records)?;
        log_success(format!("Saved {} records", records.len()));
        Ok(path)
    }

    /// Save every view to its own CSV, all sharing one timestamp
    pub fn save_aggregations(&self, aggregations: &Aggregations) -> OutputResult<Vec<PathBuf>> {
        let stamp = timestamp();
        let file = |name: &str| self.output_dir.join(format!("{}_{}.csv", name, stamp));

        let saved = vec![
            write_view(file("daily_summary"), &aggregations.daily_summary)?,
            write_view(file("product_summary"), &aggregations.product_summary)?,
            write_view(file("customer_summary"), &aggregations.customer_summary)?,
            write_view(file("regional_summary"), &aggregations.regional_summary)?,
            write_view(file("hourly_patterns"), &aggregations.hourly_patterns)?,
        ];
        Ok(saved)
    }

    /// Save the validation report as pretty JSON after checking its shape
    pub fn save_validation_report(
        &self,
        report: &ValidationReport,
        filename: Option<&str>,
    ) -> OutputResult<PathBuf> {
        validate_report_shape(report).map_err(OutputError::ReportShape)?;

        let path = self.path_for(filename, "validation_report", "json");
        log_info(format!("Saving validation report to {}", path.display()));
        write_json(&path, report)?;
        Ok(path)
    }

    pub fn save_quality_report(
        &self,
        report: &QualityReport,
        filename: Option<&str>,
    ) -> OutputResult<PathBuf> {
        let path = self.path_for(filename, "quality_report", "json");
        write_json(&path, report)?;
        log_success(format!("Quality report saved to {}", path.display()));
        Ok(path)
    }

    /// Export count/mean/std/quartiles for every numeric column
    pub fn export_summary_statistics(
        &self,
        records: &[CleanTransaction],
        filename: Option<&str>,
    ) -> OutputResult<PathBuf> {
        let path = self.path_for(filename, "summary_stats", "csv");
        log_info("Generating summary statistics");
        write_csv(&path, &describe(records))?;
        log_success(format!("Summary statistics saved to {}", path.display()));
        Ok(path)
    }

    /// Save a pivot table: one row per row label, one column per column label
    pub fn save_pivot(&self, table: &PivotTable, filename: Option<&str>) -> OutputResult<PathBuf> {
        let name = format!("pivot_{}_by_{}", table.row_key, table.col_key);
        let path = self.path_for(filename, &name, "csv");

        let mut writer = csv::Writer::from_path(&path)?;
        let mut header = vec![table.row_key.to_string()];
        header.extend(table.columns.iter().map(|c| c.to_string()));
        writer.write_record(&header)?;
        for (label, cells) in &table.rows {
            let mut record = vec![label.to_string()];
            record.extend(cells.iter().map(|v| v.to_string()));
            writer.write_record(&record)?;
        }
        writer.flush()?;

        log_success(format!("Saved {}x{} pivot to {}", table.rows.len(), table.columns.len(), path.display()));
        Ok(path)
    }

    fn path_for(&self, filename: Option<&str>, name: &str, ext: &str) -> PathBuf {
        match filename {
            Some(f) => self.output_dir.join(f),
            None => self.output_dir.join(format!("{}_{}.{}", name, timestamp(), ext)),
        }
    }
}

/// `YYYYmmdd_HHMMSS` in local time
pub fn timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

fn write_view<T: Serialize>(path: PathBuf, rows: &[T]) -> OutputResult<PathBuf> {
    write_csv(&path, rows)?;
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    log_success(format!("Saved {} records to {}", rows.len(), name));
    Ok(path)
}

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> OutputResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> OutputResult<()> {
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{aggregate, pivot, Reducer};
    use crate::models::Column;
    use crate::validation::tests::record;
    use crate::validation::{generate_quality_report, Validator};
    use tempfile::tempdir;

    #[test]
    fn test_creates_directory() {
        let tmp = tempdir().unwrap();
        let nested = tmp.path().join("a/b/out");

        let store = OutputStore::with_dir(&nested).unwrap();

        assert!(nested.is_dir());
        assert_eq!(store.dir(), nested.as_path());
    }

    #[test]
    fn test_processed_csv_has_header_and_rows() {
        let tmp = tempdir().unwrap();
        let store = OutputStore::with_dir(tmp.path()).unwrap();
        let records = vec![
            record("TXN-1", 2, 10.0, 10.0, 18.0),
            record("TXN-2", 1, 5.0, 0.0, 5.0),
        ];

        let path = store.save_processed_data(&records, None).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("processed_data_") && name.ends_with(".csv"));
        assert!(lines.next().unwrap().starts_with("transaction_id,timestamp,customer_id"));
        assert!(lines.next().unwrap().starts_with("TXN-1,2024-05-01T10:00:00,CUST-0001"));
        assert_eq!(lines.count(), 1);
    }

    #[test]
    fn test_explicit_filename() {
        let tmp = tempdir().unwrap();
        let store = OutputStore::with_dir(tmp.path()).unwrap();

        let path = store
            .save_processed_data(&[record("TXN-1", 1, 1.0, 0.0, 1.0)], Some("clean.csv"))
            .unwrap();

        assert_eq!(path, tmp.path().join("clean.csv"));
    }

    #[test]
    fn test_saves_every_view() {
        let tmp = tempdir().unwrap();
        let store = OutputStore::with_dir(tmp.path()).unwrap();
        let aggregations = aggregate(&[record("TXN-1", 1, 10.0, 0.0, 10.0)]);

        let saved = store.save_aggregations(&aggregations).unwrap();

        assert_eq!(saved.len(), 5);
        assert!(saved.iter().all(|p| p.exists()));
        let daily = fs::read_to_string(&saved[0]).unwrap();
        assert!(daily.starts_with("date,transaction_count,total_revenue"));
    }

    #[test]
    fn test_reports_are_json() {
        let tmp = tempdir().unwrap();
        let store = OutputStore::with_dir(tmp.path()).unwrap();
        let records = vec![record("TXN-1", 1, 10.0, 0.0, 10.0)];
        let (_, report) = Validator::new().validate(&records);

        let path = store.save_validation_report(&report, None).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value["overall_status"], "PASSED");
        assert_eq!(value["total_records"], 1);

        let quality = store
            .save_quality_report(&generate_quality_report(&records), Some("quality.json"))
            .unwrap();
        assert!(fs::read_to_string(quality).unwrap().contains("\"column_info\""));
    }

    #[test]
    fn test_summary_statistics_and_pivot() {
        let tmp = tempdir().unwrap();
        let store = OutputStore::with_dir(tmp.path()).unwrap();
        let records = vec![record("TXN-1", 1, 10.0, 0.0, 10.0)];

        let stats = store.export_summary_statistics(&records, None).unwrap();
        let content = fs::read_to_string(stats).unwrap();
        assert!(content.starts_with("column,count,mean,std,min,25%,50%,75%,max"));

        let table = pivot(
            &records,
            Column::Region,
            Column::PaymentMethod,
            Column::TotalAmount,
            Reducer::Sum,
        )
        .unwrap();
        let path = store.save_pivot(&table, None).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "region,Cash\nNorth,10\n");
    }
}
