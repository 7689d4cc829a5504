//! REST API types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::aggregate::Aggregations;
use crate::error::{PipelineError, ServerError};
use crate::transform::cleaning::TransformSummary;
use crate::transform::pipeline::PipelineRun;
use crate::validation::{QualityReport, ValidationReport};

/// Response sent after a pipeline run over an uploaded CSV.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResponse {
    /// Run identifier
    pub job_id: String,

    /// "passed" or "failed"
    pub status: String,

    pub metadata: ResponseMetadata,

    /// Validation report, in its published shape
    pub report: ValidationReport,

    pub quality: Option<QualityReport>,

    pub aggregations: Option<Aggregations>,
}

/// Metadata about the run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub csv_info: Option<CsvMetadata>,
    pub transform: TransformSummary,
    pub duplicates_removed: usize,
    pub duration_secs: f64,
    /// Names of the files written
    pub outputs: Vec<String>,
}

/// CSV file metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvMetadata {
    pub encoding: String,
    pub delimiter: String,
    pub row_count: usize,
    pub columns: Vec<String>,
}

impl From<PipelineRun> for PipelineResponse {
    fn from(run: PipelineRun) -> Self {
        let status = if run.passed() { "passed" } else { "failed" };
        let outputs = run
            .outputs
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();

        PipelineResponse {
            job_id: run.run_id.to_string(),
            status: status.to_string(),
            metadata: ResponseMetadata {
                csv_info: run.csv_info.map(|info| CsvMetadata {
                    encoding: info.encoding,
                    delimiter: info.delimiter.to_string(),
                    row_count: info.row_count,
                    columns: info.headers,
                }),
                transform: run.transform,
                duplicates_removed: run.duplicates_removed,
                duration_secs: run.duration_secs,
                outputs,
            },
            report: run.report,
            quality: run.quality,
            aggregations: run.aggregations,
        }
    }
}

/// Create an error response body
pub fn error_response(error: &str) -> Value {
    json!({
        "status": "error",
        "error": error,
    })
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(PipelineError::Ingest(_) | PipelineError::EmptyInput) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ServerError::Pipeline(_) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(error_response(&self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IngestError;
    use crate::transform::pipeline::{run_bytes, PipelineOptions};

    #[test]
    fn test_response_from_run() {
        let csv = "transaction_id,timestamp,quantity,unit_price,total_amount\nTXN-1,2024-01-01 10:00:00,2,10,20";
        let options = PipelineOptions {
            write_outputs: false,
            ..Default::default()
        };
        let run = run_bytes(csv.as_bytes(), &options).unwrap();
        let run_id = run.run_id.to_string();

        let response = PipelineResponse::from(run);
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(response.job_id, run_id);
        assert_eq!(value["status"], "passed");
        assert_eq!(value["metadata"]["csvInfo"]["rowCount"], 1);
        assert_eq!(value["report"]["overall_status"], "PASSED");
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            ServerError::BadRequest("No file provided".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::Pipeline(IngestError::EmptyFile.into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServerError::Internal("join error".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
