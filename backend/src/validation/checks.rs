//! The validation rule registry.
//!
//! Each check is a plain function over the record set. The registry is a
//! fixed table iterated in declaration order; a check that errors is
//! recorded as failed and the remaining checks still run.

use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashSet};

use super::report::{percentage, CheckDetails, CheckName, CheckOutcome, DuplicateStat, MissingStat};
use super::ValidationThresholds;
use crate::error::{CheckError, CheckResult};
use crate::models::CleanTransaction;

/// Inputs shared by every check in one validation run.
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    /// Reference time for the future-date check
    pub now: NaiveDateTime,
    pub thresholds: &'a ValidationThresholds,
}

/// Signature of a registered check.
pub type CheckFn = fn(&[CleanTransaction], &CheckContext<'_>) -> CheckResult<CheckOutcome>;

/// All checks, in the order they run and are reported.
pub const VALIDATION_RULES: [(CheckName, CheckFn); 4] = [
    (CheckName::Completeness, check_completeness as CheckFn),
    (CheckName::Uniqueness, check_uniqueness as CheckFn),
    (CheckName::Consistency, check_consistency as CheckFn),
    (CheckName::Accuracy, check_accuracy as CheckFn),
];

/// Look up a check by name.
pub fn rule(name: CheckName) -> Option<CheckFn> {
    VALIDATION_RULES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, f)| *f)
}

/// Missing critical fields.
pub fn check_completeness(
    records: &[CleanTransaction],
    _ctx: &CheckContext<'_>,
) -> CheckResult<CheckOutcome> {
    let total = records.len();
    let missing_id = records
        .iter()
        .filter(|r| r.transaction_id.trim().is_empty())
        .count();
    // Typed timestamps cannot be null.
    let missing_timestamp = 0;
    let missing_total = records.iter().filter(|r| !r.total_amount.is_finite()).count();

    if missing_id + missing_timestamp + missing_total == 0 {
        return Ok(CheckOutcome::new(
            true,
            CheckDetails::message("No missing values in critical columns"),
        ));
    }

    let counts: BTreeMap<String, MissingStat> = [
        ("transaction_id", missing_id),
        ("timestamp", missing_timestamp),
        ("total_amount", missing_total),
    ]
    .into_iter()
    .map(|(field, count)| {
        (
            field.to_string(),
            MissingStat {
                count,
                percentage: percentage(count, total),
            },
        )
    })
    .collect();

    Ok(CheckOutcome::new(false, CheckDetails::MissingCounts(counts)))
}

/// Repeated transaction identifiers. Every occurrence after the first
/// counts as one duplicate.
pub fn check_uniqueness(
    records: &[CleanTransaction],
    _ctx: &CheckContext<'_>,
) -> CheckResult<CheckOutcome> {
    let mut seen = HashSet::with_capacity(records.len());
    let duplicate_count = records
        .iter()
        .filter(|r| !seen.insert(r.transaction_id.as_str()))
        .count();

    Ok(CheckOutcome::new(
        duplicate_count == 0,
        CheckDetails::Duplicates(DuplicateStat {
            duplicate_count,
            duplicate_percentage: percentage(duplicate_count, records.len()),
        }),
    ))
}

/// Totals that disagree with price arithmetic, future timestamps and
/// negative amounts.
pub fn check_consistency(
    records: &[CleanTransaction],
    ctx: &CheckContext<'_>,
) -> CheckResult<CheckOutcome> {
    let mut issues = Vec::new();
    let tolerance = ctx.thresholds.total_tolerance;

    let mut mismatches = 0;
    for r in records {
        let expected = r.quantity as f64 * r.unit_price * (1.0 - r.discount_applied / 100.0);
        if !expected.is_finite() {
            return Err(CheckError::NonFinite(format!(
                "expected total of {}",
                r.transaction_id
            )));
        }
        if (r.total_amount - expected).abs() > tolerance {
            mismatches += 1;
        }
    }
    if mismatches > 0 {
        issues.push(format!("{} records with total amount mismatches", mismatches));
    }

    let future = records.iter().filter(|r| r.timestamp > ctx.now).count();
    if future > 0 {
        issues.push(format!("{} records with future timestamps", future));
    }

    let negatives = [
        ("quantity", records.iter().filter(|r| r.quantity < 0).count()),
        ("unit_price", records.iter().filter(|r| r.unit_price < 0.0).count()),
        ("total_amount", records.iter().filter(|r| r.total_amount < 0.0).count()),
    ];
    for (column, count) in negatives {
        if count > 0 {
            issues.push(format!("{} negative values in {}", count, column));
        }
    }

    Ok(outcome_from_issues(issues, "All consistency checks passed"))
}

/// Values outside plausible ranges.
pub fn check_accuracy(
    records: &[CleanTransaction],
    ctx: &CheckContext<'_>,
) -> CheckResult<CheckOutcome> {
    let limits = ctx.thresholds;
    let mut issues = Vec::new();

    let high_qty = records
        .iter()
        .filter(|r| r.quantity > limits.max_quantity)
        .count();
    if high_qty > 0 {
        issues.push(format!(
            "{} records with unusually high quantities (>{})",
            high_qty, limits.max_quantity
        ));
    }

    let high_price = records
        .iter()
        .filter(|r| r.unit_price > limits.max_unit_price)
        .count();
    if high_price > 0 {
        issues.push(format!(
            "{} records with very high prices (>${})",
            high_price, limits.max_unit_price
        ));
    }

    let invalid_discount = records
        .iter()
        .filter(|r| !(0.0..=100.0).contains(&r.discount_applied))
        .count();
    if invalid_discount > 0 {
        issues.push(format!(
            "{} records with invalid discount percentages",
            invalid_discount
        ));
    }

    Ok(outcome_from_issues(issues, "All accuracy checks passed"))
}

fn outcome_from_issues(issues: Vec<String>, ok_message: &str) -> CheckOutcome {
    if issues.is_empty() {
        CheckOutcome::new(true, CheckDetails::message(ok_message))
    } else {
        CheckOutcome::new(false, CheckDetails::Issues(issues))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::tests::record;

    fn ctx(thresholds: &ValidationThresholds) -> CheckContext<'_> {
        CheckContext {
            now: chrono::NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            thresholds,
        }
    }

    #[test]
    fn test_registry_order() {
        let names: Vec<CheckName> = VALIDATION_RULES.iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec![
                CheckName::Completeness,
                CheckName::Uniqueness,
                CheckName::Consistency,
                CheckName::Accuracy
            ]
        );
    }

    #[test]
    fn test_completeness_reports_blank_ids() {
        let thresholds = ValidationThresholds::default();
        let mut blank = record("TXN-2", 1, 10.0, 0.0, 10.0);
        blank.transaction_id = " ".into();
        let records = vec![record("TXN-1", 1, 10.0, 0.0, 10.0), blank];

        let outcome = check_completeness(&records, &ctx(&thresholds)).unwrap();

        assert!(!outcome.passed);
        match outcome.details {
            CheckDetails::MissingCounts(counts) => {
                assert_eq!(counts["transaction_id"].count, 1);
                assert_eq!(counts["transaction_id"].percentage, 50.0);
                assert_eq!(counts["timestamp"].count, 0);
            }
            other => panic!("unexpected details: {other:?}"),
        }
    }

    #[test]
    fn test_empty_input_has_nothing_missing_or_repeated() {
        let thresholds = ValidationThresholds::default();

        let completeness = check_completeness(&[], &ctx(&thresholds)).unwrap();
        let uniqueness = check_uniqueness(&[], &ctx(&thresholds)).unwrap();

        assert!(completeness.passed);
        assert!(uniqueness.passed);
        assert_eq!(
            uniqueness.details,
            CheckDetails::Duplicates(DuplicateStat {
                duplicate_count: 0,
                duplicate_percentage: 0.0
            })
        );
    }

    #[test]
    fn test_consistency_errors_on_overflowing_total() {
        let thresholds = ValidationThresholds::default();
        let records = vec![record("TXN-1", 2, f64::MAX, 0.0, 10.0)];

        assert_eq!(
            check_consistency(&records, &ctx(&thresholds)),
            Err(CheckError::NonFinite("expected total of TXN-1".into()))
        );
    }

    #[test]
    fn test_uniqueness_counts_repeats() {
        let thresholds = ValidationThresholds::default();
        let records = vec![
            record("TXN-1", 1, 10.0, 0.0, 10.0),
            record("TXN-1", 2, 10.0, 0.0, 20.0),
            record("TXN-1", 3, 10.0, 0.0, 30.0),
            record("TXN-2", 1, 10.0, 0.0, 10.0),
        ];

        let outcome = check_uniqueness(&records, &ctx(&thresholds)).unwrap();

        assert!(!outcome.passed);
        assert_eq!(
            outcome.details,
            CheckDetails::Duplicates(DuplicateStat {
                duplicate_count: 2,
                duplicate_percentage: 50.0
            })
        );
    }

    #[test]
    fn test_consistency_tolerance_is_absolute() {
        let thresholds = ValidationThresholds::default();
        let records = vec![
            record("TXN-1", 2, 10.0, 10.0, 18.00),
            record("TXN-2", 2, 10.0, 10.0, 18.01),
            record("TXN-3", 1000, 10.0, 0.0, 10000.02),
        ];

        let outcome = check_consistency(&records, &ctx(&thresholds)).unwrap();

        assert!(!outcome.passed);
        assert_eq!(
            outcome.details,
            CheckDetails::Issues(vec!["1 records with total amount mismatches".into()])
        );
    }

    #[test]
    fn test_consistency_flags_future_and_negative() {
        let thresholds = ValidationThresholds::default();
        let mut future = record("TXN-1", 1, 10.0, 0.0, 10.0);
        future.timestamp = chrono::NaiveDate::from_ymd_opt(2030, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let negative = record("TXN-2", -1, 10.0, 0.0, -10.0);

        let outcome = check_consistency(&[future, negative], &ctx(&thresholds)).unwrap();

        assert_eq!(
            outcome.details,
            CheckDetails::Issues(vec![
                "1 records with future timestamps".into(),
                "1 negative values in quantity".into(),
                "1 negative values in total_amount".into(),
            ])
        );
    }

    #[test]
    fn test_accuracy_ranges() {
        let thresholds = ValidationThresholds::default();
        let mut bad_discount = record("TXN-3", 1, 10.0, 0.0, 10.0);
        bad_discount.discount_applied = 120.0;
        let records = vec![
            record("TXN-1", 1001, 1.0, 0.0, 1001.0),
            record("TXN-2", 1, 10000.5, 0.0, 10000.5),
            bad_discount,
        ];

        let outcome = check_accuracy(&records, &ctx(&thresholds)).unwrap();

        match outcome.details {
            CheckDetails::Issues(issues) => {
                assert_eq!(issues.len(), 3);
                assert!(issues[0].starts_with("1 records with unusually high quantities"));
                assert!(issues[1].starts_with("1 records with very high prices"));
                assert_eq!(issues[2], "1 records with invalid discount percentages");
            }
            other => panic!("unexpected details: {other:?}"),
        }
    }

    #[test]
    fn test_rule_lookup() {
        let thresholds = ValidationThresholds::default();
        let check = rule(CheckName::Accuracy).unwrap();
        let outcome = check(&[record("TXN-1", 1, 10.0, 0.0, 10.0)], &ctx(&thresholds)).unwrap();
        assert_eq!(outcome.details, CheckDetails::message("All accuracy checks passed"));
    }
}
