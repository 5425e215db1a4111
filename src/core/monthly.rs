//! Monthly revenue rollup.
//!
//! Purchases are bucketed by the UTC calendar month of `purchased_at`. Only the
//! most recent observed months are kept: gaps between months are not filled,
//! so twelve points may span more than a year.

use crate::core::money;
use crate::entities::purchase;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// One point of the revenue chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyPoint {
    /// Display label, e.g. `"Jan 2024"`
    pub month: String,
    pub revenue: Decimal,
    pub sales: u64,
}

/// Calendar month key, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    /// Month of a UTC timestamp.
    #[must_use]
    pub fn of(timestamp: &DateTime<Utc>) -> Self {
        Self {
            year: timestamp.year(),
            month: timestamp.month(),
        }
    }

    /// `YYYY-MM` form of the key.
    #[must_use]
    pub fn key(self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    /// Short display label such as `"Feb 2024"`.
    #[must_use]
    pub fn label(self) -> String {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map_or_else(|| self.key(), |date| date.format("%b %Y").to_string())
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct MonthTotals {
    revenue_cents: i128,
    sales: u64,
}

/// Accumulates purchases into per-month totals.
#[derive(Debug, Default)]
pub struct MonthlyRollup {
    months: BTreeMap<MonthKey, MonthTotals>,
}

impl MonthlyRollup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, purchase: &purchase::Model) {
        let totals = self
            .months
            .entry(MonthKey::of(&purchase.purchased_at))
            .or_default();
        totals.revenue_cents += i128::from(purchase.amount_cents);
        totals.sales += 1;
    }

    /// Returns the latest `max_months` observed months in ascending order.
    #[must_use]
    pub fn finish(self, max_months: usize) -> Vec<MonthlyPoint> {
        let skip = self.months.len().saturating_sub(max_months);
        self.months
            .into_iter()
            .skip(skip)
            .map(|(key, totals)| MonthlyPoint {
                month: key.label(),
                revenue: money::from_cents_total(totals.revenue_cents),
                sales: totals.sales,
            })
            .collect()
    }
}
