//! Shared test utilities for the course marketplace.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

#![allow(clippy::unwrap_used)]

use crate::{
    core::{
        content::{self, NewChapter, NewSection},
        course::{self, Instructor, NewCourse},
        purchase::{Student, insert_purchase},
    },
    entities::{self, ChapterType, ItemType, PaymentStatus},
    errors::Result,
};
use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{DatabaseConnection, Set};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a file-backed `SQLite` database in the temp directory, for tests that
/// need several pooled connections. Pair with [`remove_test_db`].
pub async fn setup_file_test_db() -> Result<(DatabaseConnection, PathBuf)> {
    let path = std::env::temp_dir().join(format!("course_market_{}.sqlite", Uuid::new_v4()));
    let url = format!("sqlite://{}?mode=rwc", path.display());
    let db = crate::config::database::connect(&url).await?;
    crate::config::database::create_tables(&db).await?;
    Ok((db, path))
}

/// Deletes a database created by [`setup_file_test_db`] with its WAL files.
pub fn remove_test_db(path: &Path) {
    for suffix in ["", "-wal", "-shm"] {
        let mut file = path.as_os_str().to_owned();
        file.push(suffix);
        let _ = std::fs::remove_file(file);
    }
}

/// Midnight UTC on the given day.
pub fn utc(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// Instructor named `"Instructor <id>"`.
pub fn test_instructor(id: &str) -> Instructor {
    Instructor {
        id: id.to_string(),
        name: format!("Instructor {id}"),
    }
}

/// Student named `"Student <id>"` with a matching email.
pub fn test_student(id: &str) -> Student {
    Student {
        id: id.to_string(),
        name: format!("Student {id}"),
        email: format!("{id}@example.com"),
    }
}

/// In-memory course model for pure aggregation tests.
pub fn test_course_model(id: &str, title: &str) -> entities::course::Model {
    entities::course::Model {
        id: id.to_string(),
        title: title.to_string(),
        description: "Test course".to_string(),
        instructor_id: "inst-1".to_string(),
        instructor_name: "Instructor inst-1".to_string(),
        thumbnail: None,
        price_cents: None,
        is_published: false,
        created_at: utc(2024, 1, 1),
        updated_at: utc(2024, 1, 1),
    }
}

/// In-memory completed purchase owned by `inst-1`.
///
/// # Defaults
/// * `course_id`: `"course-1"`, `chapter_id`: None
/// * student: `"stu-1"`
pub fn purchase_of(
    id: &str,
    item_type: ItemType,
    title: &str,
    amount_cents: i64,
    purchased_at: DateTime<Utc>,
) -> entities::purchase::Model {
    entities::purchase::Model {
        id: id.to_string(),
        student_id: "stu-1".to_string(),
        student_name: "Student stu-1".to_string(),
        student_email: "stu-1@example.com".to_string(),
        course_id: Some("course-1".to_string()),
        chapter_id: None,
        item_type,
        item_title: title.to_string(),
        instructor_id: "inst-1".to_string(),
        instructor_name: "Instructor inst-1".to_string(),
        amount_cents,
        currency: "EUR".to_string(),
        payment_status: PaymentStatus::Completed,
        payment_method: "paypal".to_string(),
        transaction_id: None,
        purchased_at,
    }
}

/// In-memory course purchase titled `"Course"` on the given day.
pub fn purchase_at(
    id: &str,
    amount_cents: i64,
    year: i32,
    month: u32,
    day: u32,
) -> entities::purchase::Model {
    purchase_of(id, ItemType::Course, "Course", amount_cents, utc(year, month, day))
}

/// Creates a course owned by `instructor_id` with sensible defaults.
pub async fn create_test_course(
    db: &DatabaseConnection,
    instructor_id: &str,
    title: &str,
) -> Result<entities::course::Model> {
    course::create_course(
        db,
        &test_instructor(instructor_id),
        NewCourse {
            title: title.to_string(),
            description: format!("About {title}"),
            thumbnail: None,
            price: None,
        },
    )
    .await
}

/// Appends a section as `instructor_id`.
pub async fn create_test_section(
    db: &DatabaseConnection,
    course_id: &str,
    instructor_id: &str,
    title: &str,
) -> Result<entities::section::Model> {
    content::create_section(
        db,
        course_id,
        instructor_id,
        NewSection {
            title: title.to_string(),
            description: None,
        },
    )
    .await
}

/// Appends a free chapter as `instructor_id`.
pub async fn create_test_chapter(
    db: &DatabaseConnection,
    course_id: &str,
    section_id: &str,
    instructor_id: &str,
    title: &str,
) -> Result<entities::chapter::Model> {
    content::create_chapter(
        db,
        course_id,
        section_id,
        instructor_id,
        NewChapter {
            title: title.to_string(),
            description: format!("About {title}"),
            video_url: None,
            chapter_type: ChapterType::Free,
            price: None,
        },
    )
    .await
}

/// Sets up a database with a course owned by `inst-1` and one section.
/// Returns (db, course, section) for content and purchase tests.
pub async fn setup_with_section() -> Result<(
    DatabaseConnection,
    entities::course::Model,
    entities::section::Model,
)> {
    let db = setup_test_db().await?;
    let course = create_test_course(&db, "inst-1", "Rust").await?;
    let section = create_test_section(&db, &course.id, "inst-1", "Basics").await?;
    Ok((db, course, section))
}

/// Writes a course purchase with an explicit timestamp and status straight to the ledger.
pub async fn insert_test_purchase(
    db: &DatabaseConnection,
    course: &entities::course::Model,
    amount_cents: i64,
    purchased_at: DateTime<Utc>,
    payment_status: PaymentStatus,
) -> Result<entities::purchase::Model> {
    let mut model = purchase_of(
        &uuid::Uuid::new_v4().to_string(),
        ItemType::Course,
        &course.title,
        amount_cents,
        purchased_at,
    );
    model.course_id = Some(course.id.clone());
    model.instructor_id = course.instructor_id.clone();
    model.instructor_name = course.instructor_name.clone();
    model.payment_status = payment_status;

    insert_purchase(db, into_active(model)).await
}

/// Writes a completed chapter purchase straight to the ledger.
pub async fn insert_test_chapter_purchase(
    db: &DatabaseConnection,
    course: &entities::course::Model,
    chapter: &entities::chapter::Model,
    amount_cents: i64,
    purchased_at: DateTime<Utc>,
) -> Result<entities::purchase::Model> {
    let mut model = purchase_of(
        &uuid::Uuid::new_v4().to_string(),
        ItemType::Chapter,
        &chapter.title,
        amount_cents,
        purchased_at,
    );
    model.course_id = Some(course.id.clone());
    model.chapter_id = Some(chapter.id.clone());
    model.instructor_id = course.instructor_id.clone();
    model.instructor_name = course.instructor_name.clone();

    insert_purchase(db, into_active(model)).await
}

fn into_active(model: entities::purchase::Model) -> entities::purchase::ActiveModel {
    entities::purchase::ActiveModel {
        id: Set(model.id),
        student_id: Set(model.student_id),
        student_name: Set(model.student_name),
        student_email: Set(model.student_email),
        course_id: Set(model.course_id),
        chapter_id: Set(model.chapter_id),
        item_type: Set(model.item_type),
        item_title: Set(model.item_title),
        instructor_id: Set(model.instructor_id),
        instructor_name: Set(model.instructor_name),
        amount_cents: Set(model.amount_cents),
        currency: Set(model.currency),
        payment_status: Set(model.payment_status),
        payment_method: Set(model.payment_method),
        transaction_id: Set(model.transaction_id),
        purchased_at: Set(model.purchased_at),
    }
}
