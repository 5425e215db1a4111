//! Course business logic - Authoring, publication and read access for courses.
//!
//! Every mutating operation takes the caller's instructor id explicitly and
//! checks ownership inside the same database transaction as the write.

use crate::{
    core::money,
    entities::{Chapter, Course, Section, chapter, course, section},
    errors::{Error, Result},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{debug, info};
use uuid::Uuid;

/// Identity of the instructor creating a course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instructor {
    pub id: String,
    /// Full name, or username when no full name is known
    pub name: String,
}

/// Editable course fields, used for both creation and update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCourse {
    pub title: String,
    pub description: String,
    pub thumbnail: Option<String>,
    pub price: Option<Decimal>,
}

/// Who is looking at a course outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Viewer {
    /// Instructors only see their own courses
    Instructor(String),
    /// Students may view any course
    Student(String),
}

/// A section with its chapters in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionOutline {
    pub section: section::Model,
    pub chapters: Vec<chapter::Model>,
}

/// A course with its full content tree in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseOutline {
    pub course: course::Model,
    pub sections: Vec<SectionOutline>,
}

/// Fetches a course by id.
pub async fn get_course<C>(db: &C, course_id: &str) -> Result<Option<course::Model>>
where
    C: ConnectionTrait,
{
    Course::find_by_id(course_id.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Fetches a course and checks that `instructor_id` owns it.
///
/// # Errors
/// - [`Error::NotFound`] if the course does not exist
/// - [`Error::Forbidden`] if it belongs to another instructor
pub async fn get_owned_course<C>(
    db: &C,
    course_id: &str,
    instructor_id: &str,
) -> Result<course::Model>
where
    C: ConnectionTrait,
{
    let course = get_course(db, course_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            entity: "Course",
            id: course_id.to_string(),
        })?;

    if course.instructor_id != instructor_id {
        return Err(Error::Forbidden {
            entity: "Course",
            id: course_id.to_string(),
        });
    }

    Ok(course)
}

/// Marks a course as published and bumps `updated_at`.
pub async fn set_published<C>(db: &C, course_id: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    Course::update_many()
        .col_expr(course::Column::IsPublished, Expr::value(true))
        .col_expr(course::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(course::Column::Id.eq(course_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Bumps `updated_at` of a course.
///
/// Content appends call this first so their transaction holds the write lock
/// before sibling rows are counted.
pub async fn touch_course<C>(db: &C, course_id: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    Course::update_many()
        .col_expr(course::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(course::Column::Id.eq(course_id))
        .exec(db)
        .await?;
    Ok(())
}

fn validate_course_fields(fields: &NewCourse) -> Result<Option<i64>> {
    if fields.title.trim().is_empty() {
        return Err(Error::validation("Title is required"));
    }
    if fields.description.trim().is_empty() {
        return Err(Error::validation("Description is required"));
    }
    fields.price.map(money::to_cents).transpose()
}

/// Creates a new, unpublished course owned by `instructor`.
pub async fn create_course(
    db: &DatabaseConnection,
    instructor: &Instructor,
    fields: NewCourse,
) -> Result<course::Model> {
    let price_cents = validate_course_fields(&fields)?;

    let now = Utc::now();
    let course = course::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        title: Set(fields.title.trim().to_string()),
        description: Set(fields.description),
        instructor_id: Set(instructor.id.clone()),
        instructor_name: Set(instructor.name.clone()),
        thumbnail: Set(fields.thumbnail),
        price_cents: Set(price_cents),
        is_published: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let result = course.insert(db).await?;
    info!(course_id = %result.id, instructor_id = %instructor.id, "Course created");
    Ok(result)
}

/// Replaces the editable fields of a course owned by `instructor_id`.
pub async fn update_course(
    db: &DatabaseConnection,
    course_id: &str,
    instructor_id: &str,
    fields: NewCourse,
) -> Result<course::Model> {
    let price_cents = validate_course_fields(&fields)?;

    let txn = db.begin().await?;
    let course = get_owned_course(&txn, course_id, instructor_id).await?;

    let mut active_model: course::ActiveModel = course.into();
    active_model.title = Set(fields.title.trim().to_string());
    active_model.description = Set(fields.description);
    active_model.thumbnail = Set(fields.thumbnail);
    active_model.price_cents = Set(price_cents);
    active_model.updated_at = Set(Utc::now());
    let updated = active_model.update(&txn).await?;

    txn.commit().await?;
    info!(course_id, "Course updated");
    Ok(updated)
}

/// Publishes a course owned by `instructor_id`.
///
/// Publishing is one-way and idempotent: an already-published course is left
/// untouched and the call still succeeds. Empty courses may be published.
pub async fn publish_course(
    db: &DatabaseConnection,
    course_id: &str,
    instructor_id: &str,
) -> Result<()> {
    let txn = db.begin().await?;
    let course = get_owned_course(&txn, course_id, instructor_id).await?;

    if course.is_published {
        debug!(course_id, "Course already published");
        return Ok(());
    }

    set_published(&txn, course_id).await?;
    txn.commit().await?;

    info!(course_id, "Course published");
    Ok(())
}

/// All courses owned by an instructor, newest first.
pub async fn list_instructor_courses(
    db: &DatabaseConnection,
    instructor_id: &str,
) -> Result<Vec<course::Model>> {
    Course::find()
        .filter(course::Column::InstructorId.eq(instructor_id))
        .order_by_desc(course::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// All published courses, newest first.
pub async fn list_published_courses(db: &DatabaseConnection) -> Result<Vec<course::Model>> {
    Course::find()
        .filter(course::Column::IsPublished.eq(true))
        .order_by_desc(course::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Loads a course with its sections and chapters ordered by `order_index`.
///
/// # Errors
/// - [`Error::NotFound`] if the course does not exist
/// - [`Error::Forbidden`] if an instructor asks for someone else's course
pub async fn get_course_outline(
    db: &DatabaseConnection,
    course_id: &str,
    viewer: &Viewer,
) -> Result<CourseOutline> {
    let course = get_course(db, course_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            entity: "Course",
            id: course_id.to_string(),
        })?;

    if let Viewer::Instructor(instructor_id) = viewer {
        if &course.instructor_id != instructor_id {
            return Err(Error::Forbidden {
                entity: "Course",
                id: course_id.to_string(),
            });
        }
    }

    let sections = Section::find()
        .filter(section::Column::CourseId.eq(course_id))
        .order_by_asc(section::Column::OrderIndex)
        .all(db)
        .await?;

    let mut chapters = Chapter::find()
        .filter(chapter::Column::CourseId.eq(course_id))
        .order_by_asc(chapter::Column::OrderIndex)
        .all(db)
        .await?;

    let sections = sections
        .into_iter()
        .map(|section| {
            let (mine, rest): (Vec<_>, Vec<_>) = chapters
                .drain(..)
                .partition(|chapter| chapter.section_id == section.id);
            chapters = rest;
            SectionOutline {
                section,
                chapters: mine,
            }
        })
        .collect();

    Ok(CourseOutline { course, sections })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::errors::ErrorKind;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_course_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let instructor = test_instructor("inst-1");

        let result = create_course(
            &db,
            &instructor,
            NewCourse {
                title: "   ".to_string(),
                description: "desc".to_string(),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_course(
            &db,
            &instructor,
            NewCourse {
                title: "Rust".to_string(),
                description: String::new(),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_course(
            &db,
            &instructor,
            NewCourse {
                title: "Rust".to_string(),
                description: "desc".to_string(),
                price: Some(Decimal::new(-1, 0)),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result, Err(Error::InvalidAmount { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_course_integration() -> Result<()> {
        let db = setup_test_db().await?;
        let instructor = test_instructor("inst-1");

        let course = create_course(
            &db,
            &instructor,
            NewCourse {
                title: "  Rust for Beginners ".to_string(),
                description: "Learn Rust".to_string(),
                thumbnail: Some("thumb.png".to_string()),
                price: Some(Decimal::new(4999, 2)),
            },
        )
        .await?;

        assert_eq!(course.title, "Rust for Beginners");
        assert_eq!(course.instructor_id, "inst-1");
        assert_eq!(course.instructor_name, "Instructor inst-1");
        assert_eq!(course.price_cents, Some(4999));
        assert!(!course.is_published);

        let stored = get_course(&db, &course.id).await?.unwrap();
        assert_eq!(stored, course);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_course_owner_only() -> Result<()> {
        let db = setup_test_db().await?;
        let course = create_test_course(&db, "inst-1", "Original").await?;

        let fields = NewCourse {
            title: "Renamed".to_string(),
            description: "New description".to_string(),
            thumbnail: None,
            price: Some(Decimal::new(10, 0)),
        };

        let err = update_course(&db, &course.id, "inst-2", fields.clone())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let updated = update_course(&db, &course.id, "inst-1", fields).await?;
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.price_cents, Some(1000));
        assert!(updated.updated_at >= course.updated_at);

        Ok(())
    }

    #[tokio::test]
    async fn test_publish_course_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let course = create_test_course(&db, "inst-1", "Rust").await?;

        publish_course(&db, &course.id, "inst-1").await?;
        let first = get_course(&db, &course.id).await?.unwrap();
        assert!(first.is_published);

        publish_course(&db, &course.id, "inst-1").await?;
        let second = get_course(&db, &course.id).await?.unwrap();
        assert_eq!(first, second);

        Ok(())
    }

    #[tokio::test]
    async fn test_publish_course_errors() -> Result<()> {
        let db = setup_test_db().await?;
        let course = create_test_course(&db, "inst-1", "Rust").await?;

        let err = publish_course(&db, "missing", "inst-1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = publish_course(&db, &course.id, "inst-2").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let stored = get_course(&db, &course.id).await?.unwrap();
        assert!(!stored.is_published);

        Ok(())
    }

    #[tokio::test]
    async fn test_list_courses() -> Result<()> {
        let db = setup_test_db().await?;
        let a = create_test_course(&db, "inst-1", "A").await?;
        let _b = create_test_course(&db, "inst-1", "B").await?;
        let _c = create_test_course(&db, "inst-2", "C").await?;

        publish_course(&db, &a.id, "inst-1").await?;

        let mine = list_instructor_courses(&db, "inst-1").await?;
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|c| c.instructor_id == "inst-1"));

        let published = list_published_courses(&db).await?;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].id, a.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_course_outline_orders_tree() -> Result<()> {
        let db = setup_test_db().await?;
        let course = create_test_course(&db, "inst-1", "Rust").await?;
        let first = create_test_section(&db, &course.id, "inst-1", "Basics").await?;
        let second = create_test_section(&db, &course.id, "inst-1", "Advanced").await?;
        create_test_chapter(&db, &course.id, &second.id, "inst-1", "Macros").await?;
        create_test_chapter(&db, &course.id, &first.id, "inst-1", "Hello").await?;
        create_test_chapter(&db, &course.id, &first.id, "inst-1", "Variables").await?;

        let outline =
            get_course_outline(&db, &course.id, &Viewer::Student("stu-1".to_string())).await?;

        assert_eq!(outline.course.id, course.id);
        assert_eq!(outline.sections.len(), 2);
        assert_eq!(outline.sections[0].section.title, "Basics");
        let titles: Vec<_> = outline.sections[0]
            .chapters
            .iter()
            .map(|c| c.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Hello", "Variables"]);
        assert_eq!(outline.sections[1].chapters.len(), 1);
        assert_eq!(outline.sections[1].chapters[0].title, "Macros");

        Ok(())
    }

    #[tokio::test]
    async fn test_get_course_outline_instructor_visibility() -> Result<()> {
        let db = setup_test_db().await?;
        let course = create_test_course(&db, "inst-1", "Rust").await?;

        let own = get_course_outline(&db, &course.id, &Viewer::Instructor("inst-1".to_string()))
            .await?;
        assert!(own.sections.is_empty());

        let err = get_course_outline(&db, &course.id, &Viewer::Instructor("inst-2".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let err = get_course_outline(&db, "missing", &Viewer::Student("stu-1".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        Ok(())
    }
}
