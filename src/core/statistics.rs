//! Revenue statistics aggregation.
//!
//! Pure computation over a snapshot of completed purchases. Nothing here
//! touches the database: callers load the purchases (see
//! [`crate::core::report`]) and hand them over. Sums are kept in `i128` cents
//! and converted to [`Decimal`] only when the report is assembled.
//!
//! Top sellers are keyed by `(item_type, item_title)`. Two different items
//! with the same type and title share a bucket.

use crate::core::monthly::{MonthlyPoint, MonthlyRollup};
use crate::core::money;
use crate::entities::{ItemType, course, purchase};
use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Purchases folded between two checks of the cancellation flag.
const CANCEL_CHECK_INTERVAL: usize = 1024;

/// Window sizes applied when a report is assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StatisticsLimits {
    /// Most recent observed months kept in the chart
    pub months: usize,
    /// Length of the top-seller ranking
    pub top_items: usize,
    /// Length of the recent purchase feed
    pub recent_purchases: usize,
}

impl Default for StatisticsLimits {
    fn default() -> Self {
        Self {
            months: 12,
            top_items: 5,
            recent_purchases: 10,
        }
    }
}

/// Entry of the top-seller ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopItem {
    pub title: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub sales: u64,
    pub revenue: Decimal,
}

/// Projection of a purchase for the recent activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentPurchase {
    pub id: String,
    pub student_name: String,
    pub item_title: String,
    pub item_type: ItemType,
    pub amount: Decimal,
    pub purchased_at: DateTime<Utc>,
}

impl From<&purchase::Model> for RecentPurchase {
    fn from(purchase: &purchase::Model) -> Self {
        Self {
            id: purchase.id.clone(),
            student_name: purchase.student_name.clone(),
            item_title: purchase.item_title.clone(),
            item_type: purchase.item_type,
            amount: money::from_cents(purchase.amount_cents),
            purchased_at: purchase.purchased_at,
        }
    }
}

/// Instructor-wide statistics report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsReport {
    pub total_revenue: Decimal,
    pub total_sales: u64,
    pub chart_data: Vec<MonthlyPoint>,
    pub top_items: Vec<TopItem>,
    pub recent_purchases: Vec<RecentPurchase>,
}

/// Sales of one chapter within a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterStat {
    pub chapter_id: String,
    pub title: String,
    pub sales: u64,
    pub revenue: Decimal,
}

/// Totals for a single course plus its per-chapter breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseStatistics {
    pub id: String,
    pub title: String,
    pub total_revenue: Decimal,
    pub total_sales: u64,
    pub chapter_stats: Vec<ChapterStat>,
}

/// Per-course statistics report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseStatisticsReport {
    pub course: CourseStatistics,
}

#[derive(Debug)]
struct Bucket {
    title: String,
    item_type: ItemType,
    sales: u64,
    revenue_cents: i128,
}

/// Running state of an instructor report. Buckets keep discovery order so the
/// stable sort in [`Accumulator::finish`] breaks revenue ties by first sighting.
#[derive(Debug, Default)]
struct Accumulator<'a> {
    total_cents: i128,
    total_sales: u64,
    monthly: MonthlyRollup,
    buckets: Vec<Bucket>,
    bucket_index: HashMap<(ItemType, &'a str), usize>,
    seen: Vec<&'a purchase::Model>,
}

impl<'a> Accumulator<'a> {
    fn add(&mut self, purchase: &'a purchase::Model) {
        let amount = i128::from(purchase.amount_cents);
        self.total_cents += amount;
        self.total_sales += 1;
        self.monthly.add(purchase);

        let key = (purchase.item_type, purchase.item_title.as_str());
        let index = *self.bucket_index.entry(key).or_insert_with(|| {
            self.buckets.push(Bucket {
                title: purchase.item_title.clone(),
                item_type: purchase.item_type,
                sales: 0,
                revenue_cents: 0,
            });
            self.buckets.len() - 1
        });
        let bucket = &mut self.buckets[index];
        bucket.sales += 1;
        bucket.revenue_cents += amount;

        self.seen.push(purchase);
    }

    fn finish(self, limits: &StatisticsLimits) -> StatisticsReport {
        let mut buckets = self.buckets;
        buckets.sort_by(|a, b| b.revenue_cents.cmp(&a.revenue_cents));
        let top_items = buckets
            .into_iter()
            .take(limits.top_items)
            .map(|bucket| TopItem {
                title: bucket.title,
                item_type: bucket.item_type,
                sales: bucket.sales,
                revenue: money::from_cents_total(bucket.revenue_cents),
            })
            .collect();

        let mut seen = self.seen;
        seen.sort_by(|a, b| b.purchased_at.cmp(&a.purchased_at));
        let recent_purchases = seen
            .into_iter()
            .take(limits.recent_purchases)
            .map(RecentPurchase::from)
            .collect();

        StatisticsReport {
            total_revenue: money::from_cents_total(self.total_cents),
            total_sales: self.total_sales,
            chart_data: self.monthly.finish(limits.months),
            top_items,
            recent_purchases,
        }
    }
}

/// Computes an instructor statistics report from completed purchases.
///
/// Empty input yields a zeroed report with empty lists.
#[must_use]
pub fn aggregate(purchases: &[purchase::Model], limits: &StatisticsLimits) -> StatisticsReport {
    let mut acc = Accumulator::default();
    for purchase in purchases {
        acc.add(purchase);
    }
    acc.finish(limits)
}

/// Same as [`aggregate`], but gives up with [`Error::Cancelled`] once `cancel`
/// is set. A cancelled run returns no partial report.
pub fn aggregate_cancellable(
    purchases: &[purchase::Model],
    limits: &StatisticsLimits,
    cancel: &AtomicBool,
) -> Result<StatisticsReport> {
    let mut acc = Accumulator::default();
    for chunk in purchases.chunks(CANCEL_CHECK_INTERVAL) {
        if cancel.load(Ordering::Relaxed) {
            return Err(Error::Cancelled);
        }
        for purchase in chunk {
            acc.add(purchase);
        }
    }

    if cancel.load(Ordering::Relaxed) {
        return Err(Error::Cancelled);
    }
    Ok(acc.finish(limits))
}

/// Computes course totals and the per-chapter breakdown.
///
/// Course-level purchases count towards the totals but are left out of
/// `chapter_stats`. Chapters appear in the order their first purchase is seen.
#[must_use]
pub fn aggregate_course(
    course: &course::Model,
    purchases: &[purchase::Model],
) -> CourseStatisticsReport {
    let mut total_cents = 0_i128;
    let mut total_sales = 0_u64;
    let mut chapters: Vec<(String, String, u64, i128)> = Vec::new();
    let mut chapter_index: HashMap<&str, usize> = HashMap::new();

    for purchase in purchases {
        let amount = i128::from(purchase.amount_cents);
        total_cents += amount;
        total_sales += 1;

        let chapter_id = match (purchase.item_type, purchase.chapter_id.as_deref()) {
            (ItemType::Chapter, Some(id)) => id,
            _ => continue,
        };

        let index = *chapter_index.entry(chapter_id).or_insert_with(|| {
            chapters.push((
                chapter_id.to_string(),
                purchase.item_title.clone(),
                0,
                0,
            ));
            chapters.len() - 1
        });
        let entry = &mut chapters[index];
        entry.2 += 1;
        entry.3 += amount;
    }

    CourseStatisticsReport {
        course: CourseStatistics {
            id: course.id.clone(),
            title: course.title.clone(),
            total_revenue: money::from_cents_total(total_cents),
            total_sales,
            chapter_stats: chapters
                .into_iter()
                .map(|(chapter_id, title, sales, revenue_cents)| ChapterStat {
                    chapter_id,
                    title,
                    sales,
                    revenue: money::from_cents_total(revenue_cents),
                })
                .collect(),
        },
    }
}
