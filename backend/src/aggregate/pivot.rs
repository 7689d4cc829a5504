//! Ad hoc pivot tables.
//!
//! Unlike the fixed views, a malformed pivot request is an error.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use super::stats;
use crate::error::{AggregationError, AggregationResult};
use crate::models::{CleanTransaction, Column, FieldValue};

/// Reduction applied to the values that land in one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Reducer {
    Sum,
    Mean,
    Median,
    Min,
    Max,
    Count,
    Nunique,
}

impl Reducer {
    pub fn as_str(self) -> &'static str {
        match self {
            Reducer::Sum => "sum",
            Reducer::Mean => "mean",
            Reducer::Median => "median",
            Reducer::Min => "min",
            Reducer::Max => "max",
            Reducer::Count => "count",
            Reducer::Nunique => "nunique",
        }
    }

    /// Whether the reducer needs a numeric value column.
    pub fn needs_numeric(self) -> bool {
        !matches!(self, Reducer::Count | Reducer::Nunique)
    }

    fn reduce(self, values: &[FieldValue]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let numbers: Vec<f64> = values.iter().filter_map(FieldValue::as_f64).collect();
        match self {
            Reducer::Sum => numbers.iter().sum(),
            Reducer::Mean => stats::mean(&numbers).unwrap_or(0.0),
            Reducer::Median => stats::median(&numbers).unwrap_or(0.0),
            Reducer::Min => numbers.iter().copied().fold(f64::INFINITY, f64::min),
            Reducer::Max => numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Reducer::Count => values.len() as f64,
            Reducer::Nunique => values.iter().collect::<HashSet<_>>().len() as f64,
        }
    }
}

impl fmt::Display for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Reducer {
    type Err = AggregationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sum" => Ok(Reducer::Sum),
            "mean" | "avg" => Ok(Reducer::Mean),
            "median" => Ok(Reducer::Median),
            "min" => Ok(Reducer::Min),
            "max" => Ok(Reducer::Max),
            "count" => Ok(Reducer::Count),
            "nunique" => Ok(Reducer::Nunique),
            _ => Err(AggregationError::UnknownReducer(s.to_string())),
        }
    }
}

/// A dense row × column matrix; absent cells hold 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotTable {
    pub row_key: Column,
    pub col_key: Column,
    pub value_field: Column,
    pub reducer: Reducer,
    /// Column labels, ascending
    pub columns: Vec<FieldValue>,
    /// Row label with one cell per column label, rows ascending
    pub rows: Vec<(FieldValue, Vec<f64>)>,
}

impl PivotTable {
    pub fn get(&self, row: &FieldValue, col: &FieldValue) -> Option<f64> {
        let c = self.columns.iter().position(|v| v == col)?;
        self.rows
            .iter()
            .find(|(label, _)| label == row)
            .map(|(_, cells)| cells[c])
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Build a pivot of `value_field` reduced by `reducer`, rows keyed by
/// `row_key` and columns by `col_key`.
pub fn pivot(
    records: &[CleanTransaction],
    row_key: Column,
    col_key: Column,
    value_field: Column,
    reducer: Reducer,
) -> AggregationResult<PivotTable> {
    let dtype = value_field.dtype();
    if reducer.needs_numeric() && !dtype.is_numeric() {
        return Err(AggregationError::IncompatibleReducer {
            reducer: reducer.to_string(),
            column: value_field.to_string(),
            dtype: dtype.to_string(),
        });
    }

    let mut cells: BTreeMap<FieldValue, BTreeMap<FieldValue, Vec<FieldValue>>> = BTreeMap::new();
    let mut columns = BTreeSet::new();

    for record in records {
        let (Some(row), Some(col)) = (record.get(row_key), record.get(col_key)) else {
            continue;
        };
        columns.insert(col.clone());
        let cell = cells.entry(row).or_default().entry(col).or_default();
        if let Some(value) = record.get(value_field) {
            cell.push(value);
        }
    }

    let columns: Vec<FieldValue> = columns.into_iter().collect();
    let rows = cells
        .into_iter()
        .map(|(row, by_col)| {
            let values = columns
                .iter()
                .map(|c| by_col.get(c).map_or(0.0, |v| reducer.reduce(v)))
                .collect();
            (row, values)
        })
        .collect();

    Ok(PivotTable {
        row_key,
        col_key,
        value_field,
        reducer,
        columns,
        rows,
    })
}

/// [`pivot`] with column and reducer names, as given on the command line.
pub fn pivot_named(
    records: &[CleanTransaction],
    row_key: &str,
    col_key: &str,
    value_field: &str,
    reducer: &str,
) -> AggregationResult<PivotTable> {
    let column = |name: &str| {
        name.parse::<Column>()
            .map_err(AggregationError::UnknownColumn)
    };
    pivot(
        records,
        column(row_key)?,
        column(col_key)?,
        column(value_field)?,
        reducer.parse()?,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::tests::record;

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }

    fn sample() -> Vec<CleanTransaction> {
        let mut south_card = record("TXN-2", 1, 30.0, 0.0, 30.0);
        south_card.region = Some("South".into());
        south_card.payment_method = Some("Card".into());
        vec![
            record("TXN-1", 2, 10.0, 10.0, 18.0),
            south_card,
            record("TXN-3", 1, 12.0, 0.0, 12.0),
        ]
    }

    #[test]
    fn test_sum_with_zero_fill() {
        let table = pivot(
            &sample(),
            Column::Region,
            Column::PaymentMethod,
            Column::TotalAmount,
            Reducer::Sum,
        )
        .unwrap();

        assert_eq!(table.columns, vec![text("Card"), text("Cash")]);
        assert_eq!(table.get(&text("North"), &text("Cash")), Some(30.0));
        assert_eq!(table.get(&text("North"), &text("Card")), Some(0.0));
        assert_eq!(table.get(&text("South"), &text("Card")), Some(30.0));
    }

    #[test]
    fn test_count_on_text_column() {
        let table = pivot_named(&sample(), "region", "payment_method", "transaction_id", "count")
            .unwrap();
        assert_eq!(table.get(&text("North"), &text("Cash")), Some(2.0));
    }

    #[test]
    fn test_mean_and_nunique() {
        let mean = pivot(
            &sample(),
            Column::Region,
            Column::PaymentMethod,
            Column::TotalAmount,
            Reducer::Mean,
        )
        .unwrap();
        assert_eq!(mean.get(&text("North"), &text("Cash")), Some(15.0));

        let distinct = pivot(
            &sample(),
            Column::Region,
            Column::PaymentMethod,
            Column::CustomerId,
            Reducer::Nunique,
        )
        .unwrap();
        assert_eq!(distinct.get(&text("North"), &text("Cash")), Some(1.0));
    }

    #[test]
    fn test_numeric_reducer_on_text_is_an_error() {
        let err = pivot(
            &sample(),
            Column::Region,
            Column::PaymentMethod,
            Column::CustomerId,
            Reducer::Sum,
        )
        .unwrap_err();

        assert!(matches!(err, AggregationError::IncompatibleReducer { .. }));
    }

    #[test]
    fn test_unknown_names() {
        assert_eq!(
            pivot_named(&sample(), "colour", "region", "quantity", "sum").unwrap_err(),
            AggregationError::UnknownColumn("colour".into())
        );
        assert_eq!(
            pivot_named(&sample(), "region", "hour", "quantity", "mode").unwrap_err(),
            AggregationError::UnknownReducer("mode".into())
        );
    }

    #[test]
    fn test_null_keys_are_skipped() {
        let mut records = sample();
        records[0].region = None;

        let table = pivot(
            &records,
            Column::Region,
            Column::PaymentMethod,
            Column::Quantity,
            Reducer::Sum,
        )
        .unwrap();

        assert_eq!(table.get(&text("North"), &text("Cash")), Some(1.0));
    }
}
