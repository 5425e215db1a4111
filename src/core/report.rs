//! Report generation business logic.
//!
//! Loads a snapshot of completed purchases from the ledger and hands it to the
//! aggregation in [`crate::core::statistics`]. Reads only: the ledger is never
//! mutated. Formatting helpers turn reports into plain text for logs and the
//! operator binary.

use crate::{
    core::{
        course::get_owned_course,
        money::format_currency,
        purchase::{PurchaseFilter, find_purchases},
        statistics::{
            CourseStatisticsReport, StatisticsLimits, StatisticsReport, aggregate_cancellable,
            aggregate_course,
        },
    },
    errors::Result,
};
use sea_orm::DatabaseConnection;
use std::fmt::Write;
use std::sync::atomic::AtomicBool;
use tracing::info;

/// Computes the statistics report for everything `instructor_id` sells.
///
/// An instructor without completed purchases gets a zeroed report.
pub async fn compute_instructor_statistics(
    db: &DatabaseConnection,
    instructor_id: &str,
    limits: &StatisticsLimits,
) -> Result<StatisticsReport> {
    let never = AtomicBool::new(false);
    compute_instructor_statistics_cancellable(db, instructor_id, limits, &never).await
}

/// Same as [`compute_instructor_statistics`], abortable through `cancel`.
///
/// # Errors
/// [`crate::errors::Error::Cancelled`] if `cancel` is set before the report is complete.
pub async fn compute_instructor_statistics_cancellable(
    db: &DatabaseConnection,
    instructor_id: &str,
    limits: &StatisticsLimits,
    cancel: &AtomicBool,
) -> Result<StatisticsReport> {
    let purchases =
        find_purchases(db, &PurchaseFilter::completed_for_instructor(instructor_id)).await?;
    let report = aggregate_cancellable(&purchases, limits, cancel)?;

    info!(
        instructor_id,
        total_sales = report.total_sales,
        months = report.chart_data.len(),
        "Computed instructor statistics"
    );
    Ok(report)
}

/// Computes totals and the chapter breakdown for one course.
///
/// # Errors
/// - [`crate::errors::Error::NotFound`] if the course does not exist
/// - [`crate::errors::Error::Forbidden`] if `instructor_id` does not own it
pub async fn compute_course_statistics(
    db: &DatabaseConnection,
    course_id: &str,
    instructor_id: &str,
) -> Result<CourseStatisticsReport> {
    let course = get_owned_course(db, course_id, instructor_id).await?;
    let purchases = find_purchases(db, &PurchaseFilter::completed_for_course(course_id)).await?;
    let report = aggregate_course(&course, &purchases);

    info!(
        course_id,
        total_sales = report.course.total_sales,
        chapters = report.course.chapter_stats.len(),
        "Computed course statistics"
    );
    Ok(report)
}

/// Formats an instructor report into a human-readable summary.
pub fn format_statistics_summary(report: &StatisticsReport, currency: &str) -> Result<String> {
    let mut summary = format!(
        "Revenue: {} | Sales: {}\n",
        format_currency(report.total_revenue, currency),
        report.total_sales
    );

    if !report.chart_data.is_empty() {
        summary.push_str("\nMonthly:\n");
        for point in &report.chart_data {
            writeln!(
                summary,
                "  {} | {} | {} sales",
                point.month,
                format_currency(point.revenue, currency),
                point.sales
            )?;
        }
    }

    if !report.top_items.is_empty() {
        summary.push_str("\nTop sellers:\n");
        for (rank, item) in report.top_items.iter().enumerate() {
            writeln!(
                summary,
                "  {}. {} ({}) | {} | {} sales",
                rank + 1,
                item.title,
                item.item_type,
                format_currency(item.revenue, currency),
                item.sales
            )?;
        }
    }

    if !report.recent_purchases.is_empty() {
        summary.push_str("\nRecent purchases:\n");
        for purchase in &report.recent_purchases {
            writeln!(
                summary,
                "  {} | {} | {} ({}) | {}",
                purchase.purchased_at.format("%Y-%m-%d %H:%M"),
                purchase.student_name,
                purchase.item_title,
                purchase.item_type,
                format_currency(purchase.amount, currency)
            )?;
        }
    }

    Ok(summary)
}

/// Formats a course report into a human-readable summary.
pub fn format_course_statistics_summary(
    report: &CourseStatisticsReport,
    currency: &str,
) -> Result<String> {
    let course = &report.course;
    let mut summary = format!(
        "{} | Revenue: {} | Sales: {}\n",
        course.title,
        format_currency(course.total_revenue, currency),
        course.total_sales
    );

    for chapter in &course.chapter_stats {
        writeln!(
            summary,
            "  {} | {} | {} sales",
            chapter.title,
            format_currency(chapter.revenue, currency),
            chapter.sales
        )?;
    }

    Ok(summary)
}
