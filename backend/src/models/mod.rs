//! Domain models for the Salesflow pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`RawTransaction`] - One CSV row, every field still optional text
//! - [`CleanTransaction`] - Typed, cleaned record with derived columns
//! - [`DiscountTier`], [`PriceTier`], [`CustomerSegment`] - Categorical tiers
//! - [`Column`] - Closed catalogue of the clean record's columns
//! - [`FieldValue`] - A single typed cell, usable as a grouping key

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Placeholder for a missing customer identifier.
pub const UNKNOWN_CUSTOMER: &str = "CUST-0000";

/// Placeholder for a missing product identifier.
pub const UNKNOWN_PRODUCT: &str = "PROD-000";

/// Fields whose absence invalidates a record outright.
pub const CRITICAL_FIELDS: [&str; 3] = ["transaction_id", "timestamp", "total_amount"];

// =============================================================================
// Raw Input
// =============================================================================

/// A transaction row as read from the source file.
///
/// Columns missing from the header deserialize to `None`, unknown
/// columns are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawTransaction {
    pub transaction_id: Option<String>,
    pub timestamp: Option<String>,
    pub customer_id: Option<String>,
    pub product_id: Option<String>,
    pub product_category: Option<String>,
    pub quantity: Option<String>,
    pub unit_price: Option<String>,
    pub discount_applied: Option<String>,
    pub region: Option<String>,
    pub payment_method: Option<String>,
    pub total_amount: Option<String>,
}

// =============================================================================
// Tiers
// =============================================================================

/// Discount band derived from `discount_applied`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiscountTier {
    #[serde(rename = "None")]
    NoDiscount,
    Low,
    Medium,
    High,
}

/// Price band derived from `unit_price`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PriceTier {
    Budget,
    Standard,
    Premium,
    Luxury,
}

/// Customer value segment derived from total spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CustomerSegment {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl fmt::Display for DiscountTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoDiscount => "None",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        })
    }
}

impl fmt::Display for PriceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Budget => "Budget",
            Self::Standard => "Standard",
            Self::Premium => "Premium",
            Self::Luxury => "Luxury",
        })
    }
}

impl fmt::Display for CustomerSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bronze => "Bronze",
            Self::Silver => "Silver",
            Self::Gold => "Gold",
            Self::Platinum => "Platinum",
        })
    }
}

// =============================================================================
// Clean Record
// =============================================================================

/// A cleaned, typed transaction with calendar, revenue and tier columns.
///
/// Field order is the column order of the processed CSV export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanTransaction {
    pub transaction_id: String,
    pub timestamp: NaiveDateTime,
    pub customer_id: String,
    pub product_id: String,
    pub product_category: Option<String>,
    pub quantity: i64,
    pub unit_price: f64,
    pub discount_applied: f64,
    pub region: Option<String>,
    pub payment_method: Option<String>,
    pub total_amount: f64,
    pub date: NaiveDate,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub day_of_week: String,
    pub week_of_year: u32,
    pub is_weekend: bool,
    pub gross_revenue: f64,
    pub discount_amount: f64,
    pub net_revenue: f64,
    pub has_discount: bool,
    pub discount_tier: Option<DiscountTier>,
    pub price_tier: Option<PriceTier>,
}

impl CleanTransaction {
    /// Read one column as a typed cell. `None` means a null cell.
    pub fn get(&self, column: Column) -> Option<FieldValue> {
        use FieldValue::*;
        Some(match column {
            Column::TransactionId => Text(self.transaction_id.clone()),
            Column::Timestamp => DateTime(self.timestamp),
            Column::CustomerId => Text(self.customer_id.clone()),
            Column::ProductId => Text(self.product_id.clone()),
            Column::ProductCategory => Text(self.product_category.clone()?),
            Column::Quantity => Integer(self.quantity),
            Column::UnitPrice => Decimal(self.unit_price),
            Column::DiscountApplied => Decimal(self.discount_applied),
            Column::Region => Text(self.region.clone()?),
            Column::PaymentMethod => Text(self.payment_method.clone()?),
            Column::TotalAmount => Decimal(self.total_amount),
            Column::Date => Date(self.date),
            Column::Year => Integer(i64::from(self.year)),
            Column::Month => Integer(i64::from(self.month)),
            Column::Day => Integer(i64::from(self.day)),
            Column::Hour => Integer(i64::from(self.hour)),
            Column::DayOfWeek => Text(self.day_of_week.clone()),
            Column::WeekOfYear => Integer(i64::from(self.week_of_year)),
            Column::IsWeekend => Flag(self.is_weekend),
            Column::GrossRevenue => Decimal(self.gross_revenue),
            Column::DiscountAmount => Decimal(self.discount_amount),
            Column::NetRevenue => Decimal(self.net_revenue),
            Column::HasDiscount => Flag(self.has_discount),
            Column::DiscountTier => Text(self.discount_tier?.to_string()),
            Column::PriceTier => Text(self.price_tier?.to_string()),
        })
    }
}

// =============================================================================
// Column Catalogue
// =============================================================================

/// Storage type of a column, as reported by the quality report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Text,
    Integer,
    Decimal,
    Flag,
    Date,
    DateTime,
    Category,
}

impl ColumnType {
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Decimal)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Flag => "flag",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Category => "category",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every column of [`CleanTransaction`], in export order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    TransactionId,
    Timestamp,
    CustomerId,
    ProductId,
    ProductCategory,
    Quantity,
    UnitPrice,
    DiscountApplied,
    Region,
    PaymentMethod,
    TotalAmount,
    Date,
    Year,
    Month,
    Day,
    Hour,
    DayOfWeek,
    WeekOfYear,
    IsWeekend,
    GrossRevenue,
    DiscountAmount,
    NetRevenue,
    HasDiscount,
    DiscountTier,
    PriceTier,
}

impl Column {
    pub const ALL: [Column; 25] = [
        Column::TransactionId,
        Column::Timestamp,
        Column::CustomerId,
        Column::ProductId,
        Column::ProductCategory,
        Column::Quantity,
        Column::UnitPrice,
        Column::DiscountApplied,
        Column::Region,
        Column::PaymentMethod,
        Column::TotalAmount,
        Column::Date,
        Column::Year,
        Column::Month,
        Column::Day,
        Column::Hour,
        Column::DayOfWeek,
        Column::WeekOfYear,
        Column::IsWeekend,
        Column::GrossRevenue,
        Column::DiscountAmount,
        Column::NetRevenue,
        Column::HasDiscount,
        Column::DiscountTier,
        Column::PriceTier,
    ];

    /// Snake-case column name, as used in CSV headers.
    pub fn name(self) -> &'static str {
        match self {
            Column::TransactionId => "transaction_id",
            Column::Timestamp => "timestamp",
            Column::CustomerId => "customer_id",
            Column::ProductId => "product_id",
            Column::ProductCategory => "product_category",
            Column::Quantity => "quantity",
            Column::UnitPrice => "unit_price",
            Column::DiscountApplied => "discount_applied",
            Column::Region => "region",
            Column::PaymentMethod => "payment_method",
            Column::TotalAmount => "total_amount",
            Column::Date => "date",
            Column::Year => "year",
            Column::Month => "month",
            Column::Day => "day",
            Column::Hour => "hour",
            Column::DayOfWeek => "day_of_week",
            Column::WeekOfYear => "week_of_year",
            Column::IsWeekend => "is_weekend",
            Column::GrossRevenue => "gross_revenue",
            Column::DiscountAmount => "discount_amount",
            Column::NetRevenue => "net_revenue",
            Column::HasDiscount => "has_discount",
            Column::DiscountTier => "discount_tier",
            Column::PriceTier => "price_tier",
        }
    }

    pub fn dtype(self) -> ColumnType {
        match self {
            Column::TransactionId
            | Column::CustomerId
            | Column::ProductId
            | Column::DayOfWeek => ColumnType::Text,
            Column::ProductCategory
            | Column::Region
            | Column::PaymentMethod
            | Column::DiscountTier
            | Column::PriceTier => ColumnType::Category,
            Column::Quantity
            | Column::Year
            | Column::Month
            | Column::Day
            | Column::Hour
            | Column::WeekOfYear => ColumnType::Integer,
            Column::UnitPrice
            | Column::DiscountApplied
            | Column::TotalAmount
            | Column::GrossRevenue
            | Column::DiscountAmount
            | Column::NetRevenue => ColumnType::Decimal,
            Column::IsWeekend | Column::HasDiscount => ColumnType::Flag,
            Column::Date => ColumnType::Date,
            Column::Timestamp => ColumnType::DateTime,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Column {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Column {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse()
            .map_err(|bad| serde::de::Error::custom(format!("unknown column: {}", bad)))
    }
}

impl FromStr for Column {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Column::ALL
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| s.to_string())
    }
}

// =============================================================================
// Field Values
// =============================================================================

/// A single typed cell.
///
/// Equality, hashing and ordering are total (floats compare with
/// `f64::total_cmp`), so values can key groups and dedup sets.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Flag(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl FieldValue {
    /// Numeric view of the cell, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            FieldValue::Flag(_) => 0,
            FieldValue::Integer(_) => 1,
            FieldValue::Decimal(_) => 2,
            FieldValue::Date(_) => 3,
            FieldValue::DateTime(_) => 4,
            FieldValue::Text(_) => 5,
        }
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FieldValue {}

impl PartialOrd for FieldValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FieldValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use FieldValue::*;
        match (self, other) {
            (Text(a), Text(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Decimal(a), Decimal(b)) => a.total_cmp(b),
            (Flag(a), Flag(b)) => a.cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            (DateTime(a), DateTime(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for FieldValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            FieldValue::Text(s) => s.hash(state),
            FieldValue::Integer(i) => i.hash(state),
            FieldValue::Decimal(d) => d.to_bits().hash(state),
            FieldValue::Flag(b) => b.hash(state),
            FieldValue::Date(d) => d.hash(state),
            FieldValue::DateTime(dt) => dt.hash(state),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Decimal(d) => write!(f, "{}", d),
            FieldValue::Flag(b) => write!(f, "{}", b),
            FieldValue::Date(d) => write!(f, "{}", d),
            FieldValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}
