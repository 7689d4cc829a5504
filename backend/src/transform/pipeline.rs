//! End-to-end pipeline: ingest, clean, validate, aggregate, persist.
//!
//! ```text
//! CSV → parse → transform → dedupe → validate ─┬─ PASSED → quality → aggregate → output
//!                                              └─ FAILED → save report, stop
//! ```
//!
//! A failed validation gate is not an error: the run still returns a
//! [`PipelineRun`] whose status is `FAILED`. Only input and output
//! problems are [`PipelineError`]s.
//!
//! # Example
//!
//! ```rust,ignore
//! use salesflow::pipeline::{run_pipeline, PipelineOptions};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let run = run_pipeline(&PipelineOptions::from_env())?;
//!     println!("{}: {} clean records", run.status, run.transform.output_rows);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use uuid::Uuid;

use super::cleaning::{remove_duplicates, TransformSummary, Transformer};
use crate::aggregate::{aggregate, Aggregations};
use crate::api::logs::{log_error, log_info, log_info_indent, log_success, log_warning};
use crate::error::{PipelineError, PipelineResult};
use crate::models::{CleanTransaction, Column, RawTransaction};
use crate::output::{OutputStore, DEFAULT_OUTPUT_DIR};
use crate::parser::{parse_bytes_auto, parse_csv_file_auto, ParseResult};
use crate::validation::{
    generate_quality_report, OverallStatus, QualityReport, ValidationReport, ValidationThresholds,
    Validator,
};

/// Input file used when nothing else is configured
pub const DEFAULT_INPUT_PATH: &str = "data/raw/transactions.csv";

/// Filename of the processed records export
pub const PROCESSED_FILENAME: &str = "processed_transactions.csv";

/// Options for a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// CSV to read (only used by [`run_pipeline`])
    pub input_path: Option<PathBuf>,

    /// Directory receiving every output file
    pub output_dir: PathBuf,

    /// Columns identifying a duplicate; empty means whole-row equality
    pub dedupe_keys: Vec<Column>,

    /// Write files; disable to run in memory only
    pub write_outputs: bool,

    /// Limits for the consistency and accuracy checks
    pub thresholds: ValidationThresholds,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            input_path: Some(PathBuf::from(DEFAULT_INPUT_PATH)),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            dedupe_keys: vec![Column::TransactionId],
            write_outputs: true,
            thresholds: ValidationThresholds::default(),
        }
    }
}

impl PipelineOptions {
    /// Defaults overridden by `SALESFLOW_INPUT` and `SALESFLOW_OUTPUT_DIR`
    /// (from the environment or a `.env` file).
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| dotenvy::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(input) = lookup("SALESFLOW_INPUT").filter(|v| !v.trim().is_empty()) {
            self.input_path = Some(PathBuf::from(input));
        }
        if let Some(dir) = lookup("SALESFLOW_OUTPUT_DIR").filter(|v| !v.trim().is_empty()) {
            self.output_dir = PathBuf::from(dir);
        }
        self
    }
}

/// CSV file information
#[derive(Debug, Clone, Serialize)]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
}

impl From<&ParseResult> for CsvInfo {
    fn from(parsed: &ParseResult) -> Self {
        Self {
            encoding: parsed.encoding.clone(),
            delimiter: parsed.delimiter,
            headers: parsed.headers.clone(),
            row_count: parsed.records.len(),
        }
    }
}

/// Outcome of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
    pub run_id: Uuid,

    /// Validation gate result
    pub status: OverallStatus,

    /// Present when the run started from CSV
    pub csv_info: Option<CsvInfo>,

    pub transform: TransformSummary,

    pub duplicates_removed: usize,

    pub report: ValidationReport,

    /// Only computed when validation passed
    pub quality: Option<QualityReport>,

    /// Only computed when validation passed
    pub aggregations: Option<Aggregations>,

    /// Files written during the run
    pub outputs: Vec<PathBuf>,

    pub duration_secs: f64,

    /// Clean, deduplicated records
    #[serde(skip)]
    pub records: Vec<CleanTransaction>,
}

impl PipelineRun {
    pub fn passed(&self) -> bool {
        self.status == OverallStatus::Passed
    }
}

/// Run the pipeline on `options.input_path`.
pub fn run_pipeline(options: &PipelineOptions) -> PipelineResult<PipelineRun> {
    let path = options.input_path.as_deref().ok_or(PipelineError::NoInput)?;

    log_banner("SALESFLOW PIPELINE STARTED");
    log_stage(1, "Data Ingestion");
    log_info(format!("Loading data from {}", path.display()));
    let parsed = parse_csv_file_auto(path)?;
    run_parsed(parsed, options)
}

/// Run the pipeline on raw CSV bytes (e.g. an upload).
pub fn run_bytes(bytes: &[u8], options: &PipelineOptions) -> PipelineResult<PipelineRun> {
    log_banner("SALESFLOW PIPELINE STARTED");
    log_stage(1, "Data Ingestion");
    let parsed = parse_bytes_auto(bytes)?;
    run_parsed(parsed, options)
}

/// Run the pipeline on rows that are already loaded.
pub fn run_records(
    records: &[RawTransaction],
    options: &PipelineOptions,
) -> PipelineResult<PipelineRun> {
    run_stages(records, None, options)
}

fn run_parsed(parsed: ParseResult, options: &PipelineOptions) -> PipelineResult<PipelineRun> {
    let info = CsvInfo::from(&parsed);
    log_success(format!("Detected encoding: {}", info.encoding));
    log_success(format!("Detected separator: '{}'", format_delimiter(info.delimiter)));
    log_success(format!("Loaded {} raw records", info.row_count));
    log_info(format!("Columns: {}", info.headers.join(", ")));

    run_stages(&parsed.records, Some(info), options)
}

fn run_stages(
    raw: &[RawTransaction],
    csv_info: Option<CsvInfo>,
    options: &PipelineOptions,
) -> PipelineResult<PipelineRun> {
    if raw.is_empty() {
        return Err(PipelineError::EmptyInput);
    }
    let started = Instant::now();
    let run_id = Uuid::new_v4();
    log_info(format!("Run id: {}", run_id));

    // Stage 2
    log_stage(2, "Data Transformation");
    let transformed = Transformer::new().transform(raw);
    print_transform_summary(&transformed.summary);

    let records = remove_duplicates(&transformed.records, &options.dedupe_keys);
    let duplicates_removed = transformed.records.len() - records.len();
    if duplicates_removed > 0 {
        log_warning(format!("Removed {} duplicate records", duplicates_removed));
    }
    log_success(format!("Transformation complete: {} clean records", records.len()));

    // Stage 3
    log_stage(3, "Data Validation");
    let validator = Validator::with_thresholds(options.thresholds.clone());
    let (passed, report) = validator.validate(&records);

    let store = if options.write_outputs {
        Some(OutputStore::with_dir(&options.output_dir)?)
    } else {
        None
    };
    let mut outputs = Vec::new();

    let mut run = PipelineRun {
        run_id,
        status: report.overall_status,
        csv_info,
        transform: transformed.summary,
        duplicates_removed,
        report,
        quality: None,
        aggregations: None,
        outputs: Vec::new(),
        duration_secs: 0.0,
        records,
    };

    if !passed {
        log_error("DATA VALIDATION FAILED");
        for (name, outcome) in run.report.checks.failures() {
            log_error(format!("{}: {}", name, outcome.details));
        }
        if let Some(store) = &store {
            outputs.push(store.save_validation_report(&run.report, None)?);
        }
        run.outputs = outputs;
        run.duration_secs = started.elapsed().as_secs_f64();
        log_banner("PIPELINE FAILED");
        return Ok(run);
    }
    log_success("All validation checks PASSED");

    let quality = generate_quality_report(&run.records);
    log_info("Data quality metrics:");
    log_info_indent(format!("Memory usage: {} MB", quality.memory_usage_mb), 1);
    log_info_indent(format!("Columns: {}", quality.column_count), 1);

    // Stage 4
    log_stage(4, "Data Aggregation");
    let aggregations = aggregate(&run.records);
    for (name, rows) in aggregations.views() {
        log_info_indent(format!("{}: {} records", name, rows), 1);
    }

    // Stage 5
    if let Some(store) = &store {
        log_stage(5, "Data Output");
        outputs.push(store.save_processed_data(&run.records, Some(PROCESSED_FILENAME))?);
        outputs.extend(store.save_aggregations(&aggregations)?);
        outputs.push(store.save_validation_report(&run.report, None)?);
        outputs.push(store.export_summary_statistics(&run.records, None)?);
        outputs.push(store.save_quality_report(&quality, None)?);
    }

    run.quality = Some(quality);
    run.aggregations = Some(aggregations);
    run.outputs = outputs;
    run.duration_secs = started.elapsed().as_secs_f64();

    print_run_summary(&run);
    Ok(run)
}

fn print_transform_summary(summary: &TransformSummary) {
    if summary.dropped_missing > 0 {
        log_warning(format!(
            "Dropped {} rows with missing critical values",
            summary.dropped_missing
        ));
    }
    if summary.dropped_invalid > 0 {
        log_warning(format!(
            "Dropped {} rows with invalid values",
            summary.dropped_invalid
        ));
    }
    log_success(format!(
        "Kept {} of {} rows",
        summary.output_rows, summary.input_rows
    ));
}

fn print_run_summary(run: &PipelineRun) {
    log_banner("PIPELINE SUMMARY");
    log_success(format!("Status: {}", run.status));
    log_info(format!("Execution time: {:.2} seconds", run.duration_secs));
    log_info(format!("Raw records: {}", run.transform.input_rows));
    log_info(format!("Transformed records: {}", run.records.len()));
    if !run.outputs.is_empty() {
        log_info("Outputs generated:");
        for path in &run.outputs {
            log_info_indent(file_name(path), 1);
        }
    }
}

fn log_banner(title: &str) {
    log_info("=".repeat(60));
    log_info(title);
    log_info("=".repeat(60));
}

fn log_stage(n: u8, title: &str) {
    log_info(format!("STAGE {}/5: {}", n, title));
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Format delimiter for display
fn format_delimiter(d: char) -> &'static str {
    match d {
        ',' => ",",
        ';' => ";",
        '\t' => "TAB",
        '|' => "|",
        _ => "?",
    }
}
