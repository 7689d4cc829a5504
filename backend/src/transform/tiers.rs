//! Categorical binning.
//!
//! Every tier is an ordered ladder of `(upper_bound, label)` steps above a
//! lower edge. A value lands on the first step whose bound is `>=` the
//! value, so each band is closed on the right. The lower edge itself
//! belongs to the first band; values below it, above the last bound, or
//! NaN get no tier.

use crate::models::{CustomerSegment, DiscountTier, PriceTier};

/// An ordered list of upper bounds with their labels.
#[derive(Debug, Clone, Copy)]
pub struct Ladder<L: 'static> {
    pub lower: f64,
    pub steps: &'static [(f64, L)],
}

impl<L: Copy + 'static> Ladder<L> {
    /// Label of the first step whose bound is `>= value`.
    pub fn classify(&self, value: f64) -> Option<L> {
        if value.is_nan() || value < self.lower {
            return None;
        }
        self.steps
            .iter()
            .find(|(bound, _)| value <= *bound)
            .map(|(_, label)| *label)
    }
}

/// Discount percentage bands. Exactly 0 is its own band; the 20% edge
/// folds into `High`.
pub const DISCOUNT_TIERS: Ladder<DiscountTier> = Ladder {
    lower: 0.0,
    steps: &[
        (0.0, DiscountTier::NoDiscount),
        (5.0, DiscountTier::Low),
        (10.0, DiscountTier::Medium),
        (20.0, DiscountTier::High),
        (100.0, DiscountTier::High),
    ],
};

/// Unit price bands. Prices above 1000 are unbanded.
pub const PRICE_TIERS: Ladder<PriceTier> = Ladder {
    lower: 0.0,
    steps: &[
        (50.0, PriceTier::Budget),
        (100.0, PriceTier::Standard),
        (200.0, PriceTier::Premium),
        (1000.0, PriceTier::Luxury),
    ],
};

/// Lifetime spend bands.
pub const CUSTOMER_SEGMENTS: Ladder<CustomerSegment> = Ladder {
    lower: 0.0,
    steps: &[
        (1000.0, CustomerSegment::Bronze),
        (5000.0, CustomerSegment::Silver),
        (10000.0, CustomerSegment::Gold),
        (f64::INFINITY, CustomerSegment::Platinum),
    ],
};

pub fn discount_tier(discount_pct: f64) -> Option<DiscountTier> {
    DISCOUNT_TIERS.classify(discount_pct)
}

pub fn price_tier(unit_price: f64) -> Option<PriceTier> {
    PRICE_TIERS.classify(unit_price)
}

pub fn customer_segment(total_spent: f64) -> Option<CustomerSegment> {
    CUSTOMER_SEGMENTS.classify(total_spent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discount_boundaries() {
        assert_eq!(discount_tier(0.0), Some(DiscountTier::NoDiscount));
        assert_eq!(discount_tier(0.5), Some(DiscountTier::Low));
        assert_eq!(discount_tier(5.0), Some(DiscountTier::Low));
        assert_eq!(discount_tier(5.01), Some(DiscountTier::Medium));
        assert_eq!(discount_tier(10.0), Some(DiscountTier::Medium));
        assert_eq!(discount_tier(15.0), Some(DiscountTier::High));
        assert_eq!(discount_tier(100.0), Some(DiscountTier::High));
        assert_eq!(discount_tier(-1.0), None);
        assert_eq!(discount_tier(f64::NAN), None);
    }

    #[test]
    fn test_price_boundaries() {
        assert_eq!(price_tier(0.01), Some(PriceTier::Budget));
        assert_eq!(price_tier(50.0), Some(PriceTier::Budget));
        assert_eq!(price_tier(50.5), Some(PriceTier::Standard));
        assert_eq!(price_tier(200.0), Some(PriceTier::Premium));
        assert_eq!(price_tier(999.99), Some(PriceTier::Luxury));
        assert_eq!(price_tier(1000.01), None);
    }

    #[test]
    fn test_customer_segments() {
        assert_eq!(customer_segment(250.0), Some(CustomerSegment::Bronze));
        assert_eq!(customer_segment(1000.0), Some(CustomerSegment::Bronze));
        assert_eq!(customer_segment(1500.0), Some(CustomerSegment::Silver));
        assert_eq!(customer_segment(7500.0), Some(CustomerSegment::Gold));
        assert_eq!(customer_segment(12000.0), Some(CustomerSegment::Platinum));
    }
}
