//! Aggregate cost totals.

use crate::types::Subscription;
use std::collections::BTreeMap;

/// Bucket name for records without a category.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Monthly- and yearly-equivalent cost of the active subscriptions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Totals {
    /// Sum of monthly-equivalent prices (yearly prices divided by 12).
    pub monthly: f64,
    /// Sum of yearly-equivalent prices (monthly prices times 12).
    pub yearly: f64,
    /// All records, active or not.
    pub count: usize,
    pub active_count: usize,
    /// Monthly-equivalent cost per category, active records only.
    pub by_category: BTreeMap<String, f64>,
}

impl Totals {
    pub fn compute(subscriptions: &[Subscription]) -> Self {
        let mut totals = Totals {
            count: subscriptions.len(),
            ..Default::default()
        };

        for sub in subscriptions.iter().filter(|s| s.is_active) {
            totals.active_count += 1;
            totals.monthly += sub.monthly_price();
            totals.yearly += sub.yearly_price();

            let category = sub
                .category
                .as_deref()
                .filter(|c| !c.is_empty())
                .unwrap_or(UNCATEGORIZED);
            *totals.by_category.entry(category.to_string()).or_insert(0.0) += sub.monthly_price();
        }

        totals
    }

    /// Monthly total rounded to a whole currency unit.
    pub fn monthly_rounded(&self) -> i64 {
        self.monthly.round() as i64
    }

    /// Yearly total rounded to a whole currency unit.
    pub fn yearly_rounded(&self) -> i64 {
        self.yearly.round() as i64
    }
}
