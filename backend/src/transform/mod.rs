//! Transformation module.
//!
//! This module turns raw rows into analysis-ready records:
//! - Cleaning: typed parsing, normalization, derived fields, dedupe
//! - Tiers: discount, price and customer-value ladders
//! - Pipeline: the five-stage batch run

pub mod cleaning;
pub mod pipeline;
pub mod tiers;

pub use cleaning::{remove_duplicates, transform, TransformResult, TransformSummary, Transformer};
pub use pipeline::{
    run_bytes, run_pipeline, run_records, CsvInfo, PipelineOptions, PipelineRun,
    DEFAULT_INPUT_PATH, PROCESSED_FILENAME,
};
pub use tiers::{customer_segment, discount_tier, price_tier};
