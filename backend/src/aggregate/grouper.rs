//! Group cleaned transactions by key and accumulate per-group metrics.
//!
//! ```text
//! records                         groups (BTreeMap, ascending key)
//! ┌──────────────────────────┐    ┌──────────────────────────────┐
//! │ North, 18.00, CUST-0001  │    │ North: count 2, revenue 43.0 │
//! │ South, 10.00, CUST-0002  │ →  │        customers {0001,0003} │
//! │ North, 25.00, CUST-0003  │    ├──────────────────────────────┤
//! └──────────────────────────┘    │ South: count 1, revenue 10.0 │
//!                                 └──────────────────────────────┘
//! ```
//!
//! Records whose key is `None` are left out of every group.

use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashSet};

use super::stats;
use crate::models::CleanTransaction;

/// Group `records` by `key`, skipping records with a null key.
pub fn group_by<'a, K, F>(records: &'a [CleanTransaction], key: F) -> BTreeMap<K, GroupStats<'a>>
where
    K: Ord,
    F: Fn(&'a CleanTransaction) -> Option<K>,
{
    let mut groups: BTreeMap<K, GroupStats<'a>> = BTreeMap::new();

    for record in records {
        if let Some(k) = key(record) {
            groups.entry(k).or_default().add(record);
        }
    }

    groups
}

/// Running totals for one group.
#[derive(Debug, Clone, Default)]
pub struct GroupStats<'a> {
    pub count: usize,
    pub revenue: f64,
    /// Saturates at `i64::MAX`
    pub quantity: i64,
    pub discounts: f64,
    unit_price_sum: f64,
    discount_pct_sum: f64,
    amounts: Vec<f64>,
    customers: HashSet<&'a str>,
    first_seen: Option<NaiveDateTime>,
    last_seen: Option<NaiveDateTime>,
}

impl<'a> GroupStats<'a> {
    fn add(&mut self, record: &'a CleanTransaction) {
        self.count += 1;
        self.revenue += record.total_amount;
        self.quantity = self.quantity.saturating_add(record.quantity);
        self.discounts += record.discount_amount;
        self.unit_price_sum += record.unit_price;
        self.discount_pct_sum += record.discount_applied;
        self.amounts.push(record.total_amount);
        self.customers.insert(record.customer_id.as_str());

        let ts = record.timestamp;
        self.first_seen = Some(self.first_seen.map_or(ts, |t| t.min(ts)));
        self.last_seen = Some(self.last_seen.map_or(ts, |t| t.max(ts)));
    }

    /// Mean `total_amount`.
    pub fn avg_amount(&self) -> f64 {
        self.revenue / self.count as f64
    }

    pub fn median_amount(&self) -> f64 {
        stats::median(&self.amounts).unwrap_or(0.0)
    }

    pub fn avg_unit_price(&self) -> f64 {
        self.unit_price_sum / self.count as f64
    }

    /// Mean discount percentage.
    pub fn avg_discount(&self) -> f64 {
        self.discount_pct_sum / self.count as f64
    }

    pub fn unique_customers(&self) -> usize {
        self.customers.len()
    }

    /// Earliest and latest timestamps in the group.
    pub fn span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        Some((self.first_seen?, self.last_seen?))
    }
}

/// `part / whole * 100`, or 0 when `whole` is 0.
pub fn share(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}
