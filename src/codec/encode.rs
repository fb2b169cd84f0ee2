//! Collection → CSV text.

use super::fields::{escape_field, format_number};
use super::HEADER;
use crate::types::Subscription;

/// Encode subscriptions in iteration order. Rows are `\n`-separated with
/// no trailing newline; absent category/color become empty fields.
/// `order` and `isActive` are not written.
pub fn encode(subscriptions: &[Subscription]) -> String {
    let mut lines = Vec::with_capacity(subscriptions.len() + 1);
    lines.push(HEADER.join(","));

    for sub in subscriptions {
        let row = [
            escape_field(sub.id.as_str()),
            escape_field(&sub.name),
            format_number(sub.price),
            sub.billing_cycle.as_str().to_string(),
            sub.next_billing_date.as_str().to_string(),
            escape_field(sub.category.as_deref().unwrap_or("")),
            escape_field(sub.color.as_deref().unwrap_or("")),
        ];
        lines.push(row.join(","));
    }

    lines.join("\n")
}
