//! Read-only template catalog for quick-add presets.
//!
//! Templates come from a header-tagged CSV (`name,price,cycle,category,icon`),
//! either fetched from a published spreadsheet or read from the bundled
//! copy that `subplanner-sync` refreshes. Nothing here touches the store.

mod catalog;
pub mod sync;

pub use catalog::{FileSource, HttpSource, StaticSource, TemplateCatalog, TemplateSource};
pub use sync::{fetch_and_write, parse_spreadsheet_url, sync_templates, validate_template_csv, SpreadsheetRef, SyncReport};

use crate::codec::fields::{parse_leading_float, split_line};
use crate::codec::HeaderMap;
use crate::types::{BillingCycle, BillingDate, NewSubscription};
use tracing::debug;

/// A known service with its usual price.
#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    pub name: String,
    /// `0` denotes a free tier.
    pub price: f64,
    pub cycle: BillingCycle,
    pub category: String,
    pub icon: String,
}

impl Template {
    /// Pre-fill a new subscription from this template.
    pub fn to_new_subscription(&self, next_billing_date: BillingDate) -> NewSubscription {
        let mut input = NewSubscription::new(self.name.clone(), self.price, self.cycle, next_billing_date);
        if !self.category.is_empty() {
            input.category = Some(self.category.clone());
        }
        input
    }
}

/// Parse template CSV. Rows without a name, or with an unusable price or
/// cycle, are skipped.
pub fn parse_templates(text: &str) -> Vec<Template> {
    let mut lines = text.trim().split('\n');
    let header = match lines.next() {
        Some(line) if !line.trim().is_empty() => HeaderMap::parse(line),
        _ => return Vec::new(),
    };

    let mut templates = Vec::new();
    for (i, raw) in lines.enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let values = split_line(line);

        let name = header.value(&values, "name");
        let price = parse_leading_float(header.value(&values, "price"));
        let cycle = header.value(&values, "cycle").parse::<BillingCycle>();

        match (name.is_empty(), price, cycle) {
            (false, Some(price), Ok(cycle)) if price.is_finite() && price >= 0.0 => {
                templates.push(Template {
                    name: name.to_string(),
                    price,
                    cycle,
                    category: header.value(&values, "category").to_string(),
                    icon: header.value(&values, "icon").to_string(),
                });
            }
            _ => debug!(line = i + 2, "skipping unusable template row"),
        }
    }

    templates
}
