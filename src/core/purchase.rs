//! Purchase ledger - Recording purchases and scanning the ledger.
//!
//! The ledger is append-only: purchases are inserted and read back, never
//! updated or deleted. Recording a purchase resolves the target course or
//! chapter first and copies its title and owning instructor onto the row.

use crate::{
    core::{course::get_course, money},
    entities::{Chapter, ItemType, PaymentStatus, Purchase, chapter, course, purchase},
    errors::{Error, Result},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

/// Identity of the student making a purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub id: String,
    /// Full name, or username when no full name is known
    pub name: String,
    pub email: String,
}

/// Values stamped on every purchase written by [`record_purchase`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PurchaseDefaults {
    /// ISO 4217 currency code
    pub currency: String,
    /// Payment provider name
    pub payment_method: String,
}

impl Default for PurchaseDefaults {
    fn default() -> Self {
        Self {
            currency: "EUR".to_string(),
            payment_method: "paypal".to_string(),
        }
    }
}

/// Optional filters for a ledger scan. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurchaseFilter {
    pub instructor_id: Option<String>,
    pub course_id: Option<String>,
    pub payment_status: Option<PaymentStatus>,
}

impl PurchaseFilter {
    /// Completed purchases of everything an instructor sells.
    #[must_use]
    pub fn completed_for_instructor(instructor_id: &str) -> Self {
        Self {
            instructor_id: Some(instructor_id.to_string()),
            payment_status: Some(PaymentStatus::Completed),
            ..Self::default()
        }
    }

    /// Completed purchases of a course and its chapters.
    #[must_use]
    pub fn completed_for_course(course_id: &str) -> Self {
        Self {
            course_id: Some(course_id.to_string()),
            payment_status: Some(PaymentStatus::Completed),
            ..Self::default()
        }
    }
}

/// Concrete item a purchase refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseTarget {
    /// The purchased course, or the parent course of the purchased chapter
    pub course: course::Model,
    /// The purchased chapter, `None` for course purchases
    pub chapter: Option<chapter::Model>,
    pub item_title: String,
    pub instructor_id: String,
    pub instructor_name: String,
}

/// Scans the ledger, newest purchases first.
pub async fn find_purchases<C>(db: &C, filter: &PurchaseFilter) -> Result<Vec<purchase::Model>>
where
    C: ConnectionTrait,
{
    let mut query = Purchase::find();
    if let Some(instructor_id) = &filter.instructor_id {
        query = query.filter(purchase::Column::InstructorId.eq(instructor_id.as_str()));
    }
    if let Some(course_id) = &filter.course_id {
        query = query.filter(purchase::Column::CourseId.eq(course_id.as_str()));
    }
    if let Some(status) = filter.payment_status {
        query = query.filter(purchase::Column::PaymentStatus.eq(status));
    }

    query
        .order_by_desc(purchase::Column::PurchasedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Appends a purchase to the ledger.
pub async fn insert_purchase<C>(db: &C, purchase: purchase::ActiveModel) -> Result<purchase::Model>
where
    C: ConnectionTrait,
{
    purchase.insert(db).await.map_err(Into::into)
}

/// Resolves `(item_type, item_id)` to the purchased course or chapter.
///
/// Chapters are mapped to their course through the stored `course_id`.
///
/// # Errors
/// [`Error::NotFound`] if the course or chapter does not exist.
pub async fn resolve_purchase_target<C>(
    db: &C,
    item_type: ItemType,
    item_id: &str,
) -> Result<PurchaseTarget>
where
    C: ConnectionTrait,
{
    match item_type {
        ItemType::Course => {
            let course = get_course(db, item_id)
                .await?
                .ok_or_else(|| Error::NotFound {
                    entity: "Course",
                    id: item_id.to_string(),
                })?;
            Ok(PurchaseTarget {
                item_title: course.title.clone(),
                instructor_id: course.instructor_id.clone(),
                instructor_name: course.instructor_name.clone(),
                course,
                chapter: None,
            })
        }
        ItemType::Chapter => {
            let chapter = Chapter::find_by_id(item_id.to_string())
                .one(db)
                .await?
                .ok_or_else(|| Error::NotFound {
                    entity: "Chapter",
                    id: item_id.to_string(),
                })?;
            let course = get_course(db, &chapter.course_id)
                .await?
                .ok_or_else(|| Error::NotFound {
                    entity: "Course",
                    id: chapter.course_id.clone(),
                })?;
            Ok(PurchaseTarget {
                item_title: chapter.title.clone(),
                instructor_id: course.instructor_id.clone(),
                instructor_name: course.instructor_name.clone(),
                course,
                chapter: Some(chapter),
            })
        }
    }
}

/// Records a completed purchase of a course or chapter by `student`.
///
/// # Errors
/// - [`Error::InvalidAmount`] / [`Error::Validation`] for a negative or sub-cent amount
/// - [`Error::NotFound`] if the item does not resolve
pub async fn record_purchase(
    db: &DatabaseConnection,
    defaults: &PurchaseDefaults,
    student: &Student,
    item_type: ItemType,
    item_id: &str,
    amount: Decimal,
) -> Result<purchase::Model> {
    let amount_cents = money::to_cents(amount)?;
    let target = resolve_purchase_target(db, item_type, item_id).await?;

    let purchase = purchase::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        student_id: Set(student.id.clone()),
        student_name: Set(student.name.clone()),
        student_email: Set(student.email.clone()),
        course_id: Set(Some(target.course.id.clone())),
        chapter_id: Set(target.chapter.as_ref().map(|c| c.id.clone())),
        item_type: Set(item_type),
        item_title: Set(target.item_title),
        instructor_id: Set(target.instructor_id),
        instructor_name: Set(target.instructor_name),
        amount_cents: Set(amount_cents),
        currency: Set(defaults.currency.clone()),
        payment_status: Set(PaymentStatus::Completed),
        payment_method: Set(defaults.payment_method.clone()),
        transaction_id: Set(Some(format!("txn_{}", Uuid::new_v4()))),
        purchased_at: Set(Utc::now()),
    };

    let result = insert_purchase(db, purchase).await?;
    info!(
        purchase_id = %result.id,
        item_type = %item_type,
        item_id,
        amount_cents,
        "Purchase recorded"
    );
    Ok(result)
}
