//! CSV text → collection, tolerating bad rows.

use super::fields::{parse_leading_float, split_line};
use crate::types::{BillingCycle, BillingDate, Subscription, SubscriptionId};
use std::collections::HashMap;
use thiserror::Error;

/// Why a row was rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RowErrorKind {
    #[error("missing required field")]
    MissingField,

    #[error("invalid price ({0})")]
    InvalidPrice(String),

    #[error("billingCycle must be 'monthly' or 'yearly' ({0})")]
    InvalidBillingCycle(String),

    #[error("invalid date, expected YYYY-MM-DD ({0})")]
    InvalidDate(String),
}

/// A decode failure: either the whole input or a single row.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("CSV is empty or has only a header row")]
    NoRows,

    /// `line` is 1-based, counting the header as line 1.
    #[error("line {line}: {kind}")]
    Row { line: usize, kind: RowErrorKind },
}

impl DecodeError {
    /// Line number for row errors.
    pub fn line(&self) -> Option<usize> {
        match self {
            DecodeError::NoRows => None,
            DecodeError::Row { line, .. } => Some(*line),
        }
    }
}

/// Successfully decoded records plus every error, in input order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecodeOutcome {
    pub subscriptions: Vec<Subscription>,
    pub errors: Vec<DecodeError>,
}

impl DecodeOutcome {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Column positions keyed by lower-cased, trimmed header name.
/// A repeated header name maps to its last position.
#[derive(Clone, Debug)]
pub struct HeaderMap {
    positions: HashMap<String, usize>,
}

impl HeaderMap {
    pub fn parse(header_line: &str) -> Self {
        let positions = split_line(header_line)
            .into_iter()
            .enumerate()
            .map(|(i, name)| (name.trim().to_lowercase(), i))
            .collect();
        Self { positions }
    }

    /// Trimmed value of `column` in `values`, or empty if the column is
    /// unknown or the row is short.
    pub fn value<'a>(&self, values: &'a [String], column: &str) -> &'a str {
        self.positions
            .get(column)
            .and_then(|&i| values.get(i))
            .map(|v| v.trim())
            .unwrap_or("")
    }
}

/// Decode CSV text. Bad rows are skipped and reported; decoding never
/// stops early.
pub fn decode(text: &str) -> DecodeOutcome {
    let lines: Vec<&str> = text.trim().split('\n').collect();
    let mut outcome = DecodeOutcome::default();

    if lines.len() < 2 {
        outcome.errors.push(DecodeError::NoRows);
        return outcome;
    }

    let header = HeaderMap::parse(lines[0]);

    for (i, raw) in lines.iter().enumerate().skip(1) {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        match decode_row(&header, i + 1, line) {
            Ok(sub) => outcome.subscriptions.push(sub),
            Err(e) => outcome.errors.push(e),
        }
    }

    outcome
}

/// Decode one data line. `line_no` is only used for error reporting.
pub fn decode_row(header: &HeaderMap, line_no: usize, line: &str) -> Result<Subscription, DecodeError> {
    let row_error = |kind| DecodeError::Row { line: line_no, kind };
    let values = split_line(line);

    let id = header.value(&values, "id");
    let name = header.value(&values, "name");
    let price_text = header.value(&values, "price");
    let cycle_text = header.value(&values, "billingcycle");
    let date_text = header.value(&values, "nextbillingdate");
    let category = header.value(&values, "category");
    let color = header.value(&values, "color");

    if id.is_empty()
        || name.is_empty()
        || price_text.is_empty()
        || cycle_text.is_empty()
        || date_text.is_empty()
    {
        return Err(row_error(RowErrorKind::MissingField));
    }

    let price = match parse_leading_float(price_text) {
        // `+ 0.0` turns -0 into 0.
        Some(p) if p.is_finite() && p >= 0.0 => p + 0.0,
        _ => return Err(row_error(RowErrorKind::InvalidPrice(price_text.to_string()))),
    };

    let billing_cycle: BillingCycle = cycle_text
        .parse()
        .map_err(|_| row_error(RowErrorKind::InvalidBillingCycle(cycle_text.to_string())))?;

    let next_billing_date = BillingDate::parse(date_text)
        .map_err(|_| row_error(RowErrorKind::InvalidDate(date_text.to_string())))?;

    Ok(Subscription {
        id: SubscriptionId::from(id),
        name: name.to_string(),
        price,
        billing_cycle,
        next_billing_date,
        category: non_empty(category),
        color: non_empty(color),
        order: None,
        is_active: true,
    })
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
