//! Record cleaning and enrichment.
//!
//! [`Transformer::transform`] runs five ordered stages over raw rows:
//!
//! ```text
//! missing values → type normalization → invalid values → derived columns → text
//! ```
//!
//! Each stage consumes the previous stage's rows and builds new ones; the
//! caller's input is never mutated. Bad rows are dropped or clamped and
//! counted in [`TransformSummary`], never reported as errors.

use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveDate, NaiveDateTime, Timelike, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;

use super::tiers::{discount_tier, price_tier};
use crate::models::{
    CleanTransaction, Column, FieldValue, RawTransaction, UNKNOWN_CUSTOMER, UNKNOWN_PRODUCT,
};

/// Cell contents treated as missing, besides blank text.
const NA_TOKENS: [&str; 17] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "nan", "null",
];

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{L}+").expect("valid word pattern"));

/// Row counts for one transform run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransformSummary {
    /// Rows received
    pub input_rows: usize,
    /// Rows dropped for a missing id, timestamp or total
    pub dropped_missing: usize,
    /// Rows dropped for unparseable or non-positive values
    pub dropped_invalid: usize,
    /// Rows returned
    pub output_rows: usize,
}

/// Result of a transform run
#[derive(Debug, Clone, Default)]
pub struct TransformResult {
    /// Cleaned records, in input order
    pub records: Vec<CleanTransaction>,
    /// Row accounting
    pub summary: TransformSummary,
}

/// Row after type normalization. Unparseable values are `None`.
#[derive(Debug, Clone)]
struct TypedRow {
    transaction_id: String,
    timestamp: Option<NaiveDateTime>,
    customer_id: String,
    product_id: String,
    product_category: Option<String>,
    quantity: Option<i64>,
    unit_price: Option<f64>,
    discount_applied: Option<f64>,
    region: Option<String>,
    payment_method: Option<String>,
    total_amount: Option<f64>,
}

/// Row that passed invalid-value removal.
#[derive(Debug, Clone)]
struct CheckedRow {
    transaction_id: String,
    timestamp: NaiveDateTime,
    customer_id: String,
    product_id: String,
    product_category: Option<String>,
    quantity: i64,
    unit_price: f64,
    discount_applied: f64,
    region: Option<String>,
    payment_method: Option<String>,
    total_amount: f64,
}

/// Cleans raw rows into analysis-ready records.
#[derive(Debug, Clone, Copy, Default)]
pub struct Transformer;

impl Transformer {
    pub fn new() -> Self {
        Self
    }

    /// Run all five stages in order.
    pub fn transform(&self, records: &[RawTransaction]) -> TransformResult {
        let input_rows = records.len();

        let present = handle_missing_values(records);
        let dropped_missing = input_rows - present.len();

        let typed: Vec<TypedRow> = present.iter().map(fix_types).collect();

        let checked = clean_invalid_values(typed);
        let dropped_invalid = present.len() - checked.len();

        let records: Vec<CleanTransaction> = checked
            .into_iter()
            .map(add_derived_columns)
            .map(standardize_text)
            .collect();

        let summary = TransformSummary {
            input_rows,
            dropped_missing,
            dropped_invalid,
            output_rows: records.len(),
        };

        TransformResult { records, summary }
    }
}

/// Clean raw rows. Shorthand for [`Transformer::transform`] without the summary.
pub fn transform(records: &[RawTransaction]) -> Vec<CleanTransaction> {
    Transformer::new().transform(records).records
}

/// Keep the first record for each key tuple, preserving input order.
///
/// With no key columns, records are compared on every column.
pub fn remove_duplicates(records: &[CleanTransaction], keys: &[Column]) -> Vec<CleanTransaction> {
    let keys: &[Column] = if keys.is_empty() { &Column::ALL } else { keys };
    let mut seen: HashSet<Vec<Option<FieldValue>>> = HashSet::with_capacity(records.len());

    records
        .iter()
        .filter(|record| {
            let key: Vec<Option<FieldValue>> = keys.iter().map(|c| record.get(*c)).collect();
            seen.insert(key)
        })
        .cloned()
        .collect()
}

// =============================================================================
// Stage 1: Missing values
// =============================================================================

fn is_missing(value: &Option<String>) -> bool {
    match value {
        None => true,
        Some(v) => {
            let v = v.trim();
            v.is_empty() || NA_TOKENS.contains(&v)
        }
    }
}

/// Blank or NA-token cells become `None`.
fn present(value: &Option<String>) -> Option<String> {
    if is_missing(value) {
        None
    } else {
        value.as_ref().map(|v| v.trim().to_string())
    }
}

fn handle_missing_values(records: &[RawTransaction]) -> Vec<RawTransaction> {
    records
        .iter()
        .filter(|r| {
            !is_missing(&r.transaction_id) && !is_missing(&r.timestamp) && !is_missing(&r.total_amount)
        })
        .map(|r| {
            let mut row = r.clone();
            if is_missing(&row.customer_id) {
                row.customer_id = Some(UNKNOWN_CUSTOMER.to_string());
            }
            if is_missing(&row.product_id) {
                row.product_id = Some(UNKNOWN_PRODUCT.to_string());
            }
            row
        })
        .collect()
}

// =============================================================================
// Stage 2: Types
// =============================================================================

/// Parse a timestamp in any of the accepted layouts.
///
/// Offset-aware values are converted to local wall time, the same clock
/// the future-date check reads. Returns `None` when no layout matches.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(to_local(dt));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(to_local(dt));
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn to_local(dt: DateTime<FixedOffset>) -> NaiveDateTime {
    dt.with_timezone(&Local).naive_local()
}

/// Parse a finite decimal.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a whole-number quantity. `"3.0"` is accepted, `"2.5"` is not.
pub fn parse_quantity(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(q) = raw.parse::<i64>() {
        return Some(q);
    }
    parse_decimal(raw)
        .filter(|v| v.fract() == 0.0 && v.abs() < i64::MAX as f64)
        .map(|v| v as i64)
}

fn fix_types(row: &RawTransaction) -> TypedRow {
    let text = |v: &Option<String>| present(v);
    TypedRow {
        transaction_id: text(&row.transaction_id).unwrap_or_default(),
        timestamp: text(&row.timestamp).and_then(|v| parse_timestamp(&v)),
        customer_id: text(&row.customer_id).unwrap_or_else(|| UNKNOWN_CUSTOMER.to_string()),
        product_id: text(&row.product_id).unwrap_or_else(|| UNKNOWN_PRODUCT.to_string()),
        product_category: text(&row.product_category),
        quantity: text(&row.quantity).and_then(|v| parse_quantity(&v)),
        unit_price: text(&row.unit_price).and_then(|v| parse_decimal(&v)),
        discount_applied: text(&row.discount_applied).and_then(|v| parse_decimal(&v)),
        region: text(&row.region),
        payment_method: text(&row.payment_method),
        total_amount: text(&row.total_amount).and_then(|v| parse_decimal(&v)),
    }
}

// =============================================================================
// Stage 3: Invalid values
// =============================================================================

fn clean_invalid_values(rows: Vec<TypedRow>) -> Vec<CheckedRow> {
    rows.into_iter()
        .filter_map(|row| {
            let timestamp = row.timestamp?;
            let quantity = row.quantity.filter(|q| *q > 0)?;
            let unit_price = row.unit_price.filter(|p| *p > 0.0)?;
            let total_amount = row.total_amount.filter(|t| *t > 0.0)?;
            let discount_applied = row.discount_applied.unwrap_or(0.0).clamp(0.0, 100.0);

            Some(CheckedRow {
                transaction_id: row.transaction_id,
                timestamp,
                customer_id: row.customer_id,
                product_id: row.product_id,
                product_category: row.product_category,
                quantity,
                unit_price,
                discount_applied,
                region: row.region,
                payment_method: row.payment_method,
                total_amount,
            })
        })
        .collect()
}

// =============================================================================
// Stage 4: Derived columns
// =============================================================================

fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn add_derived_columns(row: CheckedRow) -> CleanTransaction {
    let ts = row.timestamp;
    let weekday = ts.weekday();

    let gross_revenue = row.quantity as f64 * row.unit_price;
    let discount_amount = gross_revenue * (row.discount_applied / 100.0);
    let net_revenue = gross_revenue - discount_amount;

    CleanTransaction {
        date: ts.date(),
        year: ts.year(),
        month: ts.month(),
        day: ts.day(),
        hour: ts.hour(),
        day_of_week: day_name(weekday).to_string(),
        week_of_year: ts.iso_week().week(),
        is_weekend: matches!(weekday, Weekday::Sat | Weekday::Sun),
        gross_revenue,
        discount_amount,
        net_revenue,
        has_discount: row.discount_applied > 0.0,
        discount_tier: discount_tier(row.discount_applied),
        price_tier: price_tier(row.unit_price),
        transaction_id: row.transaction_id,
        timestamp: ts,
        customer_id: row.customer_id,
        product_id: row.product_id,
        product_category: row.product_category,
        quantity: row.quantity,
        unit_price: row.unit_price,
        discount_applied: row.discount_applied,
        region: row.region,
        payment_method: row.payment_method,
        total_amount: row.total_amount,
    }
}

// =============================================================================
// Stage 5: Text
// =============================================================================

/// Trim and title-case: the first letter of every alphabetic run is
/// uppercased, the rest lowercased (`"credit card"` → `"Credit Card"`).
pub fn title_case(value: &str) -> String {
    WORD.replace_all(value.trim(), |caps: &regex::Captures| {
        let word = &caps[0];
        let mut chars = word.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
            None => String::new(),
        }
    })
    .into_owned()
}

fn standardize_text(mut record: CleanTransaction) -> CleanTransaction {
    record.product_category = record.product_category.as_deref().map(title_case);
    record.region = record.region.as_deref().map(title_case);
    record.payment_method = record.payment_method.as_deref().map(title_case);
    record.day_of_week = title_case(&record.day_of_week);
    record
}
