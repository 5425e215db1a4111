//! Content tree business logic - Appending sections and chapters to a course.
//!
//! Sections and chapters get `order_index` = number of existing siblings. The
//! ownership check, the sibling count and the insert run in one database
//! transaction that starts by writing to the course row, so appends to one
//! course queue behind each other. The unique `(parent, order_index)` indexes turn a lost race
//! into [`Error::Conflict`]. A conflicting append is retried after re-reading
//! the sibling count, up to [`MAX_APPEND_ATTEMPTS`] times.

use crate::{
    core::{
        course::{get_owned_course, touch_course},
        money,
    },
    entities::{Chapter, ChapterType, Section, chapter, section},
    errors::{Error, Result},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{DbErr, Set, SqlErr, TransactionTrait, prelude::*};
use tracing::{info, warn};
use uuid::Uuid;

/// Attempts made before an order-index conflict is reported to the caller.
pub const MAX_APPEND_ATTEMPTS: usize = 3;

/// Fields of a section to append.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewSection {
    pub title: String,
    pub description: Option<String>,
}

/// Fields of a chapter to append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChapter {
    pub title: String,
    pub description: String,
    pub video_url: Option<String>,
    pub chapter_type: ChapterType,
    /// Required and positive for paid chapters; ignored for free ones
    pub price: Option<Decimal>,
}

fn conflict_or_db(err: DbErr, what: &str) -> Error {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => Error::Conflict {
            message: format!("{what}: {detail}"),
        },
        _ => Error::Database(err),
    }
}

/// Number of sections currently attached to a course.
pub async fn count_sections<C>(db: &C, course_id: &str) -> Result<u64>
where
    C: ConnectionTrait,
{
    Section::find()
        .filter(section::Column::CourseId.eq(course_id))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Number of chapters currently attached to a section.
pub async fn count_chapters<C>(db: &C, section_id: &str) -> Result<u64>
where
    C: ConnectionTrait,
{
    Chapter::find()
        .filter(chapter::Column::SectionId.eq(section_id))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Inserts a section row. A taken `order_index` becomes [`Error::Conflict`].
pub async fn insert_section<C>(db: &C, section: section::ActiveModel) -> Result<section::Model>
where
    C: ConnectionTrait,
{
    section
        .insert(db)
        .await
        .map_err(|e| conflict_or_db(e, "Section order index already taken"))
}

/// Inserts a chapter row. A taken `order_index` becomes [`Error::Conflict`].
pub async fn insert_chapter<C>(db: &C, chapter: chapter::ActiveModel) -> Result<chapter::Model>
where
    C: ConnectionTrait,
{
    chapter
        .insert(db)
        .await
        .map_err(|e| conflict_or_db(e, "Chapter order index already taken"))
}

/// Appends a section to a course owned by `instructor_id`.
///
/// # Errors
/// - [`Error::Validation`] if the title is blank
/// - [`Error::NotFound`] / [`Error::Forbidden`] if the course is missing or not owned
/// - [`Error::Conflict`] if the order index stayed contended after every retry
pub async fn create_section(
    db: &DatabaseConnection,
    course_id: &str,
    instructor_id: &str,
    fields: NewSection,
) -> Result<section::Model> {
    if fields.title.trim().is_empty() {
        return Err(Error::validation("Section title is required"));
    }

    let mut last_conflict = None;
    for attempt in 1..=MAX_APPEND_ATTEMPTS {
        let txn = db.begin().await?;
        touch_course(&txn, course_id).await?;
        get_owned_course(&txn, course_id, instructor_id).await?;

        let order_index = i32::try_from(count_sections(&txn, course_id).await?)?;
        let section = section::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            course_id: Set(course_id.to_string()),
            title: Set(fields.title.trim().to_string()),
            description: Set(fields.description.clone()),
            order_index: Set(order_index),
            created_at: Set(Utc::now()),
        };

        match insert_section(&txn, section).await {
            Ok(created) => {
                txn.commit().await?;
                info!(course_id, section_id = %created.id, order_index, "Section created");
                return Ok(created);
            }
            Err(err @ Error::Conflict { .. }) => {
                warn!(course_id, attempt, "Section order index conflict, retrying");
                txn.rollback().await?;
                last_conflict = Some(err);
            }
            Err(err) => return Err(err),
        }
    }

    Err(last_conflict.unwrap_or_else(|| Error::Conflict {
        message: format!("Could not append a section to course {course_id}"),
    }))
}

/// Resolves the stored price of a chapter from its type.
///
/// Paid chapters need a positive price; free chapters never store one.
fn chapter_price_cents(chapter_type: ChapterType, price: Option<Decimal>) -> Result<Option<i64>> {
    match chapter_type {
        ChapterType::Free => Ok(None),
        ChapterType::Paid => {
            let price = price
                .ok_or_else(|| Error::validation("Price is required for paid chapters"))?;
            if price <= Decimal::ZERO {
                return Err(Error::validation(format!(
                    "Paid chapter price must be positive, got {price}"
                )));
            }
            money::to_cents(price).map(Some)
        }
    }
}

/// Appends a chapter to a section of a course owned by `instructor_id`.
///
/// # Errors
/// - [`Error::Validation`] for a blank title or description, or an invalid paid price
/// - [`Error::NotFound`] / [`Error::Forbidden`] if the course is missing or not owned
/// - [`Error::NotFound`] if the section does not exist in that course
/// - [`Error::Conflict`] if the order index stayed contended after every retry
pub async fn create_chapter(
    db: &DatabaseConnection,
    course_id: &str,
    section_id: &str,
    instructor_id: &str,
    fields: NewChapter,
) -> Result<chapter::Model> {
    if fields.title.trim().is_empty() {
        return Err(Error::validation("Chapter title is required"));
    }
    if fields.description.trim().is_empty() {
        return Err(Error::validation("Chapter description is required"));
    }
    let price_cents = chapter_price_cents(fields.chapter_type, fields.price)?;

    let mut last_conflict = None;
    for attempt in 1..=MAX_APPEND_ATTEMPTS {
        let txn = db.begin().await?;
        touch_course(&txn, course_id).await?;
        get_owned_course(&txn, course_id, instructor_id).await?;

        Section::find_by_id(section_id.to_string())
            .filter(section::Column::CourseId.eq(course_id))
            .one(&txn)
            .await?
            .ok_or_else(|| Error::NotFound {
                entity: "Section",
                id: section_id.to_string(),
            })?;

        let order_index = i32::try_from(count_chapters(&txn, section_id).await?)?;
        let chapter = chapter::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            section_id: Set(section_id.to_string()),
            course_id: Set(course_id.to_string()),
            title: Set(fields.title.trim().to_string()),
            description: Set(fields.description.clone()),
            video_url: Set(fields.video_url.clone()),
            chapter_type: Set(fields.chapter_type),
            price_cents: Set(price_cents),
            order_index: Set(order_index),
            created_at: Set(Utc::now()),
        };

        match insert_chapter(&txn, chapter).await {
            Ok(created) => {
                txn.commit().await?;
                info!(
                    course_id,
                    section_id,
                    chapter_id = %created.id,
                    order_index,
                    "Chapter created"
                );
                return Ok(created);
            }
            Err(err @ Error::Conflict { .. }) => {
                warn!(section_id, attempt, "Chapter order index conflict, retrying");
                txn.rollback().await?;
                last_conflict = Some(err);
            }
            Err(err) => return Err(err),
        }
    }

    Err(last_conflict.unwrap_or_else(|| Error::Conflict {
        message: format!("Could not append a chapter to section {section_id}"),
    }))
}
