//! Data quality validation for cleaned transactions.
//!
//! Four independent checks run against the record set and produce a
//! [`ValidationReport`]. A check that fails, or errors internally, never
//! stops the others; the overall status is `PASSED` only when every check
//! passed.
//!
//! # Checks
//!
//! | Name | Passes when |
//! |------|-------------|
//! | `completeness` | no critical field is missing |
//! | `uniqueness` | no transaction id repeats |
//! | `consistency` | totals match price arithmetic, nothing is future-dated or negative |
//! | `accuracy` | quantities, prices and discounts fall in plausible ranges |
//!
//! # Report Contract
//!
//! The serialized report is checked against the embedded JSON Schema
//! (`schemas/validation-report.json`, draft 7) before it is persisted.
//!
//! # Example
//!
//! ```rust,ignore
//! use salesflow::validation::Validator;
//!
//! let (passed, report) = Validator::new().validate(&records);
//! if !passed {
//!     for (name, outcome) in report.checks.failures() {
//!         println!("{}: {}", name, outcome.details);
//!     }
//! }
//! ```

pub mod checks;
pub mod quality;
pub mod report;

pub use checks::{CheckContext, CheckFn, VALIDATION_RULES};
pub use quality::{generate_quality_report, ColumnProfile, QualityReport};
pub use report::{
    CheckDetails, CheckName, CheckOutcome, CheckResults, DuplicateStat, MissingStat,
    OverallStatus, ValidationReport,
};

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::CleanTransaction;

/// Tunable limits used by the consistency and accuracy checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationThresholds {
    /// Absolute tolerance between stated and recomputed totals
    pub total_tolerance: f64,
    /// Quantities above this are suspicious
    pub max_quantity: i64,
    /// Unit prices above this are suspicious
    pub max_unit_price: f64,
}

impl Default for ValidationThresholds {
    fn default() -> Self {
        Self {
            total_tolerance: 0.01,
            max_quantity: 1000,
            max_unit_price: 10_000.0,
        }
    }
}

/// Runs the check registry over a record set.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    pub thresholds: ValidationThresholds,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: ValidationThresholds) -> Self {
        Self { thresholds }
    }

    /// Validate against the local clock.
    pub fn validate(&self, records: &[CleanTransaction]) -> (bool, ValidationReport) {
        self.validate_at(records, Local::now().naive_local())
    }

    /// Validate with an explicit reference time for the future-date check.
    pub fn validate_at(
        &self,
        records: &[CleanTransaction],
        now: NaiveDateTime,
    ) -> (bool, ValidationReport) {
        let ctx = CheckContext {
            now,
            thresholds: &self.thresholds,
        };

        let mut results = CheckResults::default();
        for (name, check) in VALIDATION_RULES.iter() {
            let outcome = check(records, &ctx).unwrap_or_else(|e| {
                CheckOutcome::new(false, CheckDetails::message(format!("Error: {}", e)))
            });
            results.push(*name, outcome);
        }

        let report = ValidationReport::new(now, records.len(), results);
        (report.passed(), report)
    }
}

/// Validate with default thresholds against the local clock.
pub fn validate(records: &[CleanTransaction]) -> (bool, ValidationReport) {
    Validator::new().validate(records)
}

// =============================================================================
// Report Schema
// =============================================================================

/// Validate a JSON value against a draft 7 JSON Schema.
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(Vec<String>)` with every violation otherwise
///
/// # Example
/// ```ignore
/// use serde_json::json;
/// use salesflow::validation::check_against_schema;
///
/// let schema = json!({
///     "type": "object",
///     "required": ["total_records"],
///     "properties": {
///         "total_records": { "type": "integer" }
///     }
/// });
///
/// assert!(check_against_schema(&schema, &json!({ "total_records": 3 })).is_ok());
/// assert!(check_against_schema(&schema, &json!({ "total": 3 })).is_err());
/// ```
pub fn check_against_schema(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator =
        jsonschema::draft7::new(schema).map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator.iter_errors(data).map(|e| e.to_string()).collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Quick true/false variant of [`check_against_schema`].
pub fn conforms(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}

fn report_schema() -> Value {
    serde_json::from_str(include_str!("../../schemas/validation-report.json"))
        .expect("Invalid embedded schema")
}

/// Check a serialized report against the published report shape.
pub fn validate_report_value(data: &Value) -> Result<(), Vec<String>> {
    check_against_schema(&report_schema(), data)
}

/// Serialize `report` and check it against the published report shape.
pub fn validate_report_shape(report: &ValidationReport) -> Result<(), Vec<String>> {
    let value = serde_json::to_value(report).map_err(|e| vec![e.to_string()])?;
    validate_report_value(&value)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::transform::tiers::{discount_tier, price_tier};
    use chrono::{Datelike, NaiveDate, Timelike};
    use serde_json::json;

    /// A clean record dated 2024-05-01 10:00 with the given amounts.
    pub(crate) fn record(
        id: &str,
        quantity: i64,
        unit_price: f64,
        discount: f64,
        total: f64,
    ) -> CleanTransaction {
        let timestamp = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let gross = quantity as f64 * unit_price;
        let discount_amount = gross * discount / 100.0;
        CleanTransaction {
            transaction_id: id.to_string(),
            timestamp,
            customer_id: "CUST-0001".into(),
            product_id: "PROD-001".into(),
            product_category: Some("Electronics".into()),
            quantity,
            unit_price,
            discount_applied: discount,
            region: Some("North".into()),
            payment_method: Some("Cash".into()),
            total_amount: total,
            date: timestamp.date(),
            year: timestamp.year(),
            month: timestamp.month(),
            day: timestamp.day(),
            hour: timestamp.hour(),
            day_of_week: "Wednesday".into(),
            week_of_year: timestamp.iso_week().week(),
            is_weekend: false,
            gross_revenue: gross,
            discount_amount,
            net_revenue: gross - discount_amount,
            has_discount: discount > 0.0,
            discount_tier: discount_tier(discount),
            price_tier: price_tier(unit_price),
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_clean_records_pass() {
        let records = vec![
            record("TXN-1", 2, 10.0, 10.0, 18.0),
            record("TXN-2", 1, 99.99, 0.0, 99.99),
        ];

        let (passed, report) = Validator::new().validate_at(&records, now());

        assert!(passed);
        assert_eq!(report.overall_status, OverallStatus::Passed);
        assert_eq!(report.total_records, 2);
        assert_eq!(report.checks.len(), 4);
        assert_eq!(
            report.checks.get(CheckName::Consistency).unwrap().details,
            CheckDetails::message("All consistency checks passed")
        );
    }

    #[test]
    fn test_duplicate_ids_fail_only_uniqueness() {
        let records = vec![
            record("TXN-1", 1, 10.0, 0.0, 10.0),
            record("TXN-1", 1, 10.0, 0.0, 10.0),
        ];

        let (passed, report) = Validator::new().validate_at(&records, now());

        assert!(!passed);
        let uniqueness = report.checks.get(CheckName::Uniqueness).unwrap();
        assert!(!uniqueness.passed);
        assert_eq!(
            uniqueness.details,
            CheckDetails::Duplicates(DuplicateStat {
                duplicate_count: 1,
                duplicate_percentage: 50.0
            })
        );
        assert_eq!(report.checks.failures().count(), 1);
    }

    #[test]
    fn test_empty_input_passes() {
        let (passed, report) = Validator::new().validate_at(&[], now());

        assert!(passed);
        assert_eq!(report.total_records, 0);
        assert_eq!(report.overall_status, OverallStatus::Passed);
        assert_eq!(report.checks.failures().count(), 0);
    }

    #[test]
    fn test_check_error_is_recorded_not_raised() {
        let records = vec![record("TXN-1", 2, f64::MAX, 0.0, 10.0)];

        let (passed, report) = Validator::new().validate_at(&records, now());

        assert!(!passed);
        assert_eq!(
            report.checks.get(CheckName::Consistency).unwrap().details,
            CheckDetails::message("Error: non-finite value in expected total of TXN-1")
        );
        // The remaining checks still ran.
        assert!(report.checks.get(CheckName::Completeness).unwrap().passed);
        assert!(!report.checks.get(CheckName::Accuracy).unwrap().passed);
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = ValidationThresholds {
            max_quantity: 5,
            ..Default::default()
        };
        let records = vec![record("TXN-1", 6, 1.0, 0.0, 6.0)];

        let (passed, report) = Validator::with_thresholds(thresholds).validate_at(&records, now());

        assert!(!passed);
        assert!(!report.checks.get(CheckName::Accuracy).unwrap().passed);
    }

    #[test]
    fn test_reports_conform_to_schema() {
        let passing = Validator::new()
            .validate_at(&[record("TXN-1", 1, 10.0, 0.0, 10.0)], now())
            .1;
        assert!(validate_report_shape(&passing).is_ok());

        let mut blank = record("TXN-2", 1, 10.0, 0.0, 10.0);
        blank.transaction_id = String::new();
        let failing = Validator::new()
            .validate_at(&[record("TXN-1", 1, 10.0, 0.0, 99.0), blank.clone(), blank], now())
            .1;
        assert!(validate_report_shape(&failing).is_ok());

        let empty = Validator::new().validate_at(&[], now()).1;
        assert!(validate_report_shape(&empty).is_ok());
    }

    #[test]
    fn test_schema_rejects_bad_status() {
        let value = json!({
            "timestamp": "2024-05-01T09:30:00",
            "total_records": 1,
            "checks": {},
            "overall_status": "MAYBE"
        });
        assert!(validate_report_value(&value).is_err());
        assert!(!conforms(&report_schema(), &value));
    }

    #[test]
    fn test_check_against_inline_schema() {
        let schema = json!({
            "type": "object",
            "required": ["total_records"],
            "properties": { "total_records": { "type": "integer" } }
        });

        assert!(check_against_schema(&schema, &json!({ "total_records": 3 })).is_ok());
        let errors = check_against_schema(&schema, &json!({ "total": 3 })).unwrap_err();
        assert_eq!(errors.len(), 1);
    }
}
