//! Core types for the subscription store.

use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque identifier for a subscription.
///
/// Assigned by the store on `add` (a random v4 UUID); imported records keep
/// whatever id the CSV carried.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(pub String);

impl SubscriptionId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        SubscriptionId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionId({})", self.0)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubscriptionId {
    fn from(s: &str) -> Self {
        SubscriptionId(s.to_string())
    }
}

impl From<String> for SubscriptionId {
    fn from(s: String) -> Self {
        SubscriptionId(s)
    }
}

/// How often a subscription is charged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    Monthly,
    Yearly,
}

impl BillingCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Monthly => "monthly",
            BillingCycle::Yearly => "yearly",
        }
    }
}

impl fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact, case-sensitive match on `monthly` / `yearly`.
impl FromStr for BillingCycle {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "monthly" => Ok(BillingCycle::Monthly),
            "yearly" => Ok(BillingCycle::Yearly),
            other => Err(StoreError::InvalidBillingCycle(other.to_string())),
        }
    }
}

/// Next renewal date in canonical `YYYY-MM-DD` form.
///
/// Only the textual shape is checked (four digits, dash, two digits, dash,
/// two digits); calendar validity is not.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BillingDate(String);

impl BillingDate {
    pub fn parse(s: &str) -> Result<Self> {
        if is_iso_date_shape(s) {
            Ok(BillingDate(s.to_string()))
        } else {
            Err(StoreError::InvalidDate(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Matches `^\d{4}-\d{2}-\d{2}$` (ASCII digits only).
pub(crate) fn is_iso_date_shape(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

impl TryFrom<String> for BillingDate {
    type Error = StoreError;

    fn try_from(s: String) -> Result<Self> {
        if is_iso_date_shape(&s) {
            Ok(BillingDate(s))
        } else {
            Err(StoreError::InvalidDate(s))
        }
    }
}

impl From<BillingDate> for String {
    fn from(d: BillingDate) -> Self {
        d.0
    }
}

impl FromStr for BillingDate {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        BillingDate::parse(s)
    }
}

impl fmt::Debug for BillingDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BillingDate({})", self.0)
    }
}

impl fmt::Display for BillingDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn default_active() -> bool {
    true
}

/// A single tracked recurring charge, as persisted.
///
/// Field names are camelCase on the wire. A record persisted without
/// `isActive` loads as active; one without `order` sorts after every record
/// that has one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: SubscriptionId,
    pub name: String,
    pub price: f64,
    pub billing_cycle: BillingCycle,
    pub next_billing_date: BillingDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl Subscription {
    /// Build a stored record from user input plus the store-assigned fields.
    pub fn from_new(id: SubscriptionId, input: NewSubscription, order: i64) -> Self {
        Self {
            id,
            name: input.name,
            price: input.price,
            billing_cycle: input.billing_cycle,
            next_billing_date: input.next_billing_date,
            category: input.category,
            color: input.color,
            order: Some(order),
            is_active: true,
        }
    }

    /// Price normalized to one month.
    pub fn monthly_price(&self) -> f64 {
        match self.billing_cycle {
            BillingCycle::Monthly => self.price,
            BillingCycle::Yearly => self.price / 12.0,
        }
    }

    /// Price normalized to one year.
    pub fn yearly_price(&self) -> f64 {
        match self.billing_cycle {
            BillingCycle::Monthly => self.price * 12.0,
            BillingCycle::Yearly => self.price,
        }
    }

    /// Sort key: present orders ascending, then absent orders.
    pub(crate) fn sort_key(&self) -> (bool, i64) {
        (self.order.is_none(), self.order.unwrap_or(0))
    }

    /// Check the name and price invariants.
    pub fn validate(&self) -> Result<()> {
        validate_fields(&self.name, self.price)
    }
}

/// Input for `add`: every field except the store-assigned id, order, and
/// active flag.
#[derive(Clone, Debug, PartialEq)]
pub struct NewSubscription {
    pub name: String,
    pub price: f64,
    pub billing_cycle: BillingCycle,
    pub next_billing_date: BillingDate,
    pub category: Option<String>,
    pub color: Option<String>,
}

impl NewSubscription {
    pub fn new(
        name: impl Into<String>,
        price: f64,
        billing_cycle: BillingCycle,
        next_billing_date: BillingDate,
    ) -> Self {
        Self {
            name: name.into(),
            price,
            billing_cycle,
            next_billing_date,
            category: None,
            color: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_fields(&self.name, self.price)
    }
}

fn validate_fields(name: &str, price: f64) -> Result<()> {
    if name.trim().is_empty() {
        return Err(StoreError::EmptyName);
    }
    if !price.is_finite() || price < 0.0 {
        return Err(StoreError::InvalidPrice(price.to_string()));
    }
    Ok(())
}

/// Sort a collection into display order. Stable for equal keys.
pub fn sort_for_display(subscriptions: &mut [Subscription]) {
    subscriptions.sort_by_key(Subscription::sort_key);
}
