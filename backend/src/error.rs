//! Error types for the Salesflow pipeline.
//!
//! Errors are grouped by the stage that raises them:
//!
//! - [`IngestError`] - CSV reading and schema errors (fatal to a run)
//! - [`CheckError`] - internal failure of one validation check
//! - [`AggregationError`] - malformed pivot requests
//! - [`OutputError`] - persistence failures
//! - [`PipelineError`] - top-level orchestration errors
//! - [`ServerError`] - HTTP API errors
//!
//! Per-row data-quality problems are never errors: the transformer drops
//! or clamps those rows and reports counts instead.

use thiserror::Error;

// =============================================================================
// Ingestion Errors
// =============================================================================

/// Errors while reading raw transaction files.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Malformed CSV content.
    #[error("Invalid CSV format: {0}")]
    ParseError(#[from] csv::Error),

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// Header present but no data rows.
    #[error("Loaded data is empty")]
    EmptyDataset,

    /// Required columns absent from the header.
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

// =============================================================================
// Validation Check Errors
// =============================================================================

/// Internal failure of a single validation check.
///
/// Caught by the validator and recorded as a failed check; never
/// propagated past [`crate::validation::Validator::validate`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CheckError {
    /// A computed value was not finite.
    #[error("non-finite value in {0}")]
    NonFinite(String),
}

// =============================================================================
// Aggregation Errors
// =============================================================================

/// Errors from ad hoc pivot construction.
///
/// The five fixed views never fail; they degrade to empty output instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AggregationError {
    /// Column name not in the record catalogue.
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// Reducer name not recognised.
    #[error("Unknown reducer: {0}")]
    UnknownReducer(String),

    /// Reducer cannot be applied to the value column's type.
    #[error("Reducer '{reducer}' cannot aggregate {dtype} column '{column}'")]
    IncompatibleReducer {
        reducer: String,
        column: String,
        dtype: String,
    },
}

// =============================================================================
// Output Errors
// =============================================================================

/// Errors while persisting results.
#[derive(Debug, Error)]
pub enum OutputError {
    /// IO error.
    #[error("Output IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV writer error.
    #[error("CSV write error: {0}")]
    CsvError(#[from] csv::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The validation report does not match its published shape.
    #[error("Report does not match schema: {}", .0.join("; "))]
    ReportShape(Vec<String>),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level orchestration errors.
///
/// Returned by [`crate::pipeline::run_pipeline`]. A failed validation gate
/// is not an error: it is reported through the run result.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Ingestion error.
    #[error("Ingestion error: {0}")]
    Ingest(#[from] IngestError),

    /// Output error.
    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    /// Pivot error.
    #[error("Aggregation error: {0}")]
    Aggregation(#[from] AggregationError),

    /// No records to transform.
    #[error("No records to transform")]
    EmptyInput,

    /// No input configured.
    #[error("No input file configured (pass a path or set SALESFLOW_INPUT)")]
    NoInput,
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for ingestion.
pub type IngestResult<T> = Result<T, IngestError>;

/// Result type for one validation check.
pub type CheckResult<T> = Result<T, CheckError>;

/// Result type for pivot operations.
pub type AggregationResult<T> = Result<T, AggregationError>;

/// Result type for output operations.
pub type OutputResult<T> = Result<T, OutputError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // IngestError -> PipelineError
        let ingest_err = IngestError::EmptyFile;
        let pipeline_err: PipelineError = ingest_err.into();
        assert!(pipeline_err.to_string().contains("empty"));

        // AggregationError -> PipelineError
        let agg_err = AggregationError::UnknownColumn("colour".into());
        let pipeline_err: PipelineError = agg_err.into();
        assert!(pipeline_err.to_string().contains("colour"));
    }

    #[test]
    fn test_missing_columns_format() {
        let err = IngestError::MissingColumns(vec!["timestamp".into(), "total_amount".into()]);
        assert_eq!(
            err.to_string(),
            "Missing required columns: timestamp, total_amount"
        );
    }

    #[test]
    fn test_incompatible_reducer_format() {
        let err = AggregationError::IncompatibleReducer {
            reducer: "sum".into(),
            column: "region".into(),
            dtype: "category".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("sum"));
        assert!(msg.contains("region"));
    }
}
