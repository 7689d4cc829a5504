//! Grouped summary views over cleaned transactions.
//!
//! [`aggregate`] builds five independent views, each a group-by-and-reduce
//! over the full record set:
//!
//! | View | Key | Sorted by |
//! |------|-----|-----------|
//! | `daily_summary` | date | date |
//! | `product_summary` | product id, category | revenue, descending |
//! | `customer_summary` | customer id (known customers only) | spend, descending |
//! | `regional_summary` | region | revenue, descending |
//! | `hourly_patterns` | hour | hour |
//!
//! Descending sorts break ties by key, ascending. A view whose grouping
//! column is absent from every record comes back empty and a warning is
//! logged; the fixed views never fail. [`pivot`] is the exception: a bad
//! pivot request is an [`AggregationError`](crate::error::AggregationError).

pub mod grouper;
pub mod pivot;
pub mod stats;

pub use grouper::{group_by, GroupStats};
pub use pivot::{pivot, pivot_named, PivotTable, Reducer};
pub use stats::{describe, ColumnSummary};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::cmp::Ordering;

use crate::api::logs::{log_info, log_warning};
use crate::models::{CleanTransaction, Column, CustomerSegment, UNKNOWN_CUSTOMER};
use crate::transform::tiers::customer_segment;
use grouper::share;

// =============================================================================
// View Rows
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub transaction_count: usize,
    pub total_revenue: f64,
    pub avg_transaction: f64,
    pub median_transaction: f64,
    pub total_quantity: i64,
    pub total_discounts: f64,
    pub unique_customers: usize,
    pub avg_items_per_transaction: f64,
    /// Discounts as a percentage of revenue
    pub discount_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSummary {
    pub product_id: String,
    pub category: String,
    pub transaction_count: usize,
    pub total_quantity_sold: i64,
    pub total_revenue: f64,
    pub avg_unit_price: f64,
    pub avg_discount: f64,
    pub unique_customers: usize,
    pub revenue_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerSummary {
    pub customer_id: String,
    pub transaction_count: usize,
    pub total_spent: f64,
    pub avg_transaction_value: f64,
    pub total_items_purchased: i64,
    pub first_purchase: NaiveDateTime,
    pub last_purchase: NaiveDateTime,
    pub days_active: i64,
    pub customer_segment: Option<CustomerSegment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalSummary {
    pub region: String,
    pub transaction_count: usize,
    pub total_revenue: f64,
    pub avg_transaction_value: f64,
    pub total_quantity: i64,
    pub unique_customers: usize,
    pub avg_discount: f64,
    pub revenue_per_customer: f64,
    pub transactions_per_customer: f64,
    pub revenue_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyPattern {
    pub hour: u32,
    pub transaction_count: usize,
    pub total_revenue: f64,
    pub avg_transaction_value: f64,
    pub total_quantity: i64,
    pub transaction_share: f64,
}

/// The five summary views of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Aggregations {
    pub daily_summary: Vec<DailySummary>,
    pub product_summary: Vec<ProductSummary>,
    pub customer_summary: Vec<CustomerSummary>,
    pub regional_summary: Vec<RegionalSummary>,
    pub hourly_patterns: Vec<HourlyPattern>,
}

impl Aggregations {
    /// `(view name, row count)` for every view, in build order.
    pub fn views(&self) -> Vec<(&'static str, usize)> {
        vec![
            ("daily_summary", self.daily_summary.len()),
            ("product_summary", self.product_summary.len()),
            ("customer_summary", self.customer_summary.len()),
            ("regional_summary", self.regional_summary.len()),
            ("hourly_patterns", self.hourly_patterns.len()),
        ]
    }
}

// =============================================================================
// Views
// =============================================================================

/// Build all five views.
pub fn aggregate(records: &[CleanTransaction]) -> Aggregations {
    let aggregations = Aggregations {
        daily_summary: daily_summary(records),
        product_summary: product_summary(records),
        customer_summary: customer_summary(records),
        regional_summary: regional_summary(records),
        hourly_patterns: hourly_patterns(records),
    };
    log_info(format!("Created {} aggregation views", aggregations.views().len()));
    aggregations
}

pub fn daily_summary(records: &[CleanTransaction]) -> Vec<DailySummary> {
    if !column_present(records, Column::Date) {
        return Vec::new();
    }

    group_by(records, |r| Some(r.date))
        .into_iter()
        .map(|(date, g)| DailySummary {
            date,
            transaction_count: g.count,
            total_revenue: g.revenue,
            avg_transaction: g.avg_amount(),
            median_transaction: g.median_amount(),
            total_quantity: g.quantity,
            total_discounts: g.discounts,
            unique_customers: g.unique_customers(),
            avg_items_per_transaction: g.quantity as f64 / g.count as f64,
            discount_rate: share(g.discounts, g.revenue),
        })
        .collect()
}

pub fn product_summary(records: &[CleanTransaction]) -> Vec<ProductSummary> {
    if !column_present(records, Column::ProductId) || !column_present(records, Column::ProductCategory) {
        return Vec::new();
    }

    let groups = group_by(records, |r| {
        Some((r.product_id.as_str(), r.product_category.as_deref()?))
    });
    let total: f64 = groups.values().map(|g| g.revenue).sum();

    let mut rows: Vec<ProductSummary> = groups
        .into_iter()
        .map(|((product_id, category), g)| ProductSummary {
            product_id: product_id.to_string(),
            category: category.to_string(),
            transaction_count: g.count,
            total_quantity_sold: g.quantity,
            total_revenue: g.revenue,
            avg_unit_price: g.avg_unit_price(),
            avg_discount: g.avg_discount(),
            unique_customers: g.unique_customers(),
            revenue_share: share(g.revenue, total),
        })
        .collect();

    // Stable sort keeps the ascending key order among equal revenues.
    rows.sort_by(|a, b| by_revenue_desc(a.total_revenue, b.total_revenue));
    rows
}

pub fn customer_summary(records: &[CleanTransaction]) -> Vec<CustomerSummary> {
    if !column_present(records, Column::CustomerId) {
        return Vec::new();
    }

    let groups = group_by(records, |r| {
        (r.customer_id != UNKNOWN_CUSTOMER).then_some(r.customer_id.as_str())
    });

    let mut rows: Vec<CustomerSummary> = groups
        .into_iter()
        .filter_map(|(customer_id, g)| {
            let (first, last) = g.span()?;
            Some(CustomerSummary {
                customer_id: customer_id.to_string(),
                transaction_count: g.count,
                total_spent: g.revenue,
                avg_transaction_value: g.avg_amount(),
                total_items_purchased: g.quantity,
                first_purchase: first,
                last_purchase: last,
                days_active: (last - first).num_days(),
                customer_segment: customer_segment(g.revenue),
            })
        })
        .collect();

    rows.sort_by(|a, b| by_revenue_desc(a.total_spent, b.total_spent));
    rows
}

pub fn regional_summary(records: &[CleanTransaction]) -> Vec<RegionalSummary> {
    if !column_present(records, Column::Region) {
        return Vec::new();
    }

    let groups = group_by(records, |r| r.region.as_deref());
    let total: f64 = groups.values().map(|g| g.revenue).sum();

    let mut rows: Vec<RegionalSummary> = groups
        .into_iter()
        .map(|(region, g)| {
            let customers = g.unique_customers() as f64;
            RegionalSummary {
                region: region.to_string(),
                transaction_count: g.count,
                total_revenue: g.revenue,
                avg_transaction_value: g.avg_amount(),
                total_quantity: g.quantity,
                unique_customers: g.unique_customers(),
                avg_discount: g.avg_discount(),
                revenue_per_customer: g.revenue / customers,
                transactions_per_customer: g.count as f64 / customers,
                revenue_share: share(g.revenue, total),
            }
        })
        .collect();

    rows.sort_by(|a, b| by_revenue_desc(a.total_revenue, b.total_revenue));
    rows
}

pub fn hourly_patterns(records: &[CleanTransaction]) -> Vec<HourlyPattern> {
    if !column_present(records, Column::Hour) {
        return Vec::new();
    }

    let groups = group_by(records, |r| Some(r.hour));
    let total = groups.values().map(|g| g.count).sum::<usize>() as f64;

    groups
        .into_iter()
        .map(|(hour, g)| HourlyPattern {
            hour,
            transaction_count: g.count,
            total_revenue: g.revenue,
            avg_transaction_value: g.avg_amount(),
            total_quantity: g.quantity,
            transaction_share: share(g.count as f64, total),
        })
        .collect()
}

/// False when there is nothing to group on; logs a warning if the records
/// exist but none carries `column`.
fn column_present(records: &[CleanTransaction], column: Column) -> bool {
    if let Some(warning) = missing_column_warning(records, column) {
        log_warning(warning);
        return false;
    }
    !records.is_empty()
}

fn missing_column_warning(records: &[CleanTransaction], column: Column) -> Option<String> {
    let absent = !records.is_empty() && records.iter().all(|r| r.get(column).is_none());
    absent.then(|| format!("{} column not found", column))
}

fn by_revenue_desc(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::tests::record;

    fn with(
        id: &str,
        customer: &str,
        product: &str,
        region: Option<&str>,
        total: f64,
    ) -> CleanTransaction {
        let mut r = record(id, 1, total, 0.0, total);
        r.customer_id = customer.into();
        r.product_id = product.into();
        r.region = region.map(String::from);
        r
    }

    fn sample() -> Vec<CleanTransaction> {
        vec![
            with("TXN-1", "CUST-0001", "PROD-001", Some("North"), 500.0),
            with("TXN-2", "CUST-0001", "PROD-002", Some("South"), 1000.0),
            with("TXN-3", "CUST-0002", "PROD-001", Some("North"), 12000.0),
            with("TXN-4", UNKNOWN_CUSTOMER, "PROD-003", Some("East"), 20.0),
            with("TXN-5", "CUST-0003", "PROD-002", None, 30.0),
        ]
    }

    #[test]
    fn test_revenue_share_sums_to_100() {
        let products = product_summary(&sample());
        let total: f64 = products.iter().map(|p| p.revenue_share).sum();

        assert!((total - 100.0).abs() < 1e-9);
        assert_eq!(products[0].product_id, "PROD-001");
        assert_eq!(products[0].total_revenue, 12500.0);
    }

    #[test]
    fn test_customer_segments_and_sentinel_exclusion() {
        let customers = customer_summary(&sample());

        assert!(customers.iter().all(|c| c.customer_id != UNKNOWN_CUSTOMER));
        assert_eq!(customers[0].customer_id, "CUST-0002");
        assert_eq!(customers[0].customer_segment, Some(CustomerSegment::Platinum));
        assert_eq!(customers[1].customer_id, "CUST-0001");
        assert_eq!(customers[1].total_spent, 1500.0);
        assert_eq!(customers[1].customer_segment, Some(CustomerSegment::Silver));
        assert_eq!(customers[1].days_active, 0);
    }

    #[test]
    fn test_regional_view_skips_null_regions() {
        let regions = regional_summary(&sample());
        let names: Vec<&str> = regions.iter().map(|r| r.region.as_str()).collect();

        assert_eq!(names, vec!["North", "South", "East"]);
        assert_eq!(regions[0].unique_customers, 2);
        assert_eq!(regions[0].revenue_per_customer, 6250.0);
        assert_eq!(regions[0].transactions_per_customer, 1.0);
    }

    #[test]
    fn test_revenue_ties_break_by_key() {
        let records = vec![
            with("TXN-1", "CUST-0002", "PROD-002", Some("West"), 50.0),
            with("TXN-2", "CUST-0001", "PROD-001", Some("East"), 50.0),
        ];

        let regions = regional_summary(&records);
        assert_eq!(regions[0].region, "East");

        let customers = customer_summary(&records);
        assert_eq!(customers[0].customer_id, "CUST-0001");
    }

    #[test]
    fn test_absent_region_column_gives_empty_view() {
        let records: Vec<CleanTransaction> = sample()
            .into_iter()
            .map(|mut r| {
                r.region = None;
                r
            })
            .collect();

        assert!(regional_summary(&records).is_empty());
        assert_eq!(daily_summary(&records).len(), 1);
        assert_eq!(
            missing_column_warning(&records, Column::Region).as_deref(),
            Some("region column not found")
        );
    }

    #[test]
    fn test_empty_input_warns_about_nothing() {
        let columns = [
            Column::Date,
            Column::ProductId,
            Column::CustomerId,
            Column::Region,
            Column::Hour,
        ];
        for column in columns {
            assert_eq!(missing_column_warning(&[], column), None);
        }
        assert!(daily_summary(&[]).is_empty());
        assert!(customer_summary(&[]).is_empty());
    }

    #[test]
    fn test_huge_quantities_do_not_overflow() {
        let big = i64::MAX / 2 + 1;
        let records = vec![
            record("TXN-1", big, 1.0, 0.0, 1.0),
            record("TXN-2", big, 1.0, 0.0, 1.0),
        ];

        let daily = daily_summary(&records);

        assert_eq!(daily[0].total_quantity, i64::MAX);
        assert_eq!(customer_summary(&records)[0].total_items_purchased, i64::MAX);
    }

    #[test]
    fn test_daily_metrics() {
        let records = vec![
            record("TXN-1", 2, 10.0, 10.0, 18.0),
            record("TXN-2", 4, 10.0, 0.0, 40.0),
        ];

        let daily = daily_summary(&records);

        assert_eq!(daily.len(), 1);
        let day = &daily[0];
        assert_eq!(day.transaction_count, 2);
        assert_eq!(day.total_revenue, 58.0);
        assert_eq!(day.median_transaction, 29.0);
        assert_eq!(day.avg_items_per_transaction, 3.0);
        assert!((day.discount_rate - 2.0 / 58.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_hourly_shares() {
        let mut late = record("TXN-3", 1, 10.0, 0.0, 10.0);
        late.hour = 18;
        let records = vec![
            record("TXN-1", 1, 10.0, 0.0, 10.0),
            record("TXN-2", 1, 10.0, 0.0, 10.0),
            late,
            record("TXN-4", 1, 10.0, 0.0, 10.0),
        ];

        let hourly = hourly_patterns(&records);

        assert_eq!(hourly.len(), 2);
        assert_eq!(hourly[0].hour, 10);
        assert_eq!(hourly[0].transaction_share, 75.0);
        assert_eq!(hourly[1].transaction_share, 25.0);
    }

    #[test]
    fn test_aggregate_lists_views() {
        let aggregations = aggregate(&sample());
        let names: Vec<&str> = aggregations.views().iter().map(|(n, _)| *n).collect();

        assert_eq!(
            names,
            vec![
                "daily_summary",
                "product_summary",
                "customer_summary",
                "regional_summary",
                "hourly_patterns"
            ]
        );
        assert!(aggregate(&[]).views().iter().all(|(_, n)| *n == 0));
    }
}
