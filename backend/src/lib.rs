//! # Salesflow - batch ETL for sales transaction exports
//!
//! Salesflow ingests a transaction CSV, cleans and enriches every row, gates
//! the result through four data-quality checks and, when the gate passes,
//! writes the cleaned dataset plus five summary views.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌───────────┐   ┌───────────┐   ┌───────────┐   ┌───────────┐
//! │  CSV File │──▶│  Parser   │──▶│ Transform │──▶│ Validate  │──▶│ Aggregate │
//! │ (ISO/UTF8)│   │ (auto-enc)│   │ (+ dedupe)│   │  (gate)   │   │ (+ write) │
//! └───────────┘   └───────────┘   └───────────┘   └───────────┘   └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use salesflow::{run_pipeline, PipelineOptions};
//!
//! let run = run_pipeline(&PipelineOptions::from_env())?;
//! println!("{} ({} outputs)", run.status, run.outputs.len());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Raw and clean transaction records, columns, tiers
//! - [`parser`] - CSV parsing with auto-detection
//! - [`transform`] - Cleaning, tiers and the pipeline runner
//! - [`validation`] - Quality gate, report schema and column profiling
//! - [`aggregate`] - Summary views, pivots and descriptive statistics
//! - [`output`] - Timestamped CSV/JSON artifacts
//! - [`api`] - Log channel and HTTP API server

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Validation
pub mod validation;

// Aggregation
pub mod aggregate;

// Persistence
pub mod output;

// HTTP API
pub mod api;

pub use transform::pipeline;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    AggregationError, CheckError, IngestError, OutputError, PipelineError, ServerError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    CleanTransaction, Column, ColumnType, CustomerSegment, DiscountTier, FieldValue, PriceTier,
    RawTransaction,
};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes_auto, parse_csv_file_auto,
    parse_str, ParseResult,
};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::{
    remove_duplicates, transform as clean_records, TransformResult, TransformSummary, Transformer,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{
    generate_quality_report, validate, validate_report_shape, CheckName, CheckOutcome,
    OverallStatus, QualityReport, ValidationReport, ValidationThresholds, Validator,
};

// =============================================================================
// Re-exports - Aggregation
// =============================================================================

pub use aggregate::{aggregate, describe, pivot, pivot_named, Aggregations, PivotTable, Reducer};

// =============================================================================
// Re-exports - Output
// =============================================================================

pub use output::OutputStore;

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    run_bytes, run_pipeline, run_records, CsvInfo, PipelineOptions, PipelineRun,
};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::logs::init_file_log;
pub use api::server::start_server;
pub use api::types::{error_response, CsvMetadata, PipelineResponse, ResponseMetadata};
