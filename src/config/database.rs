//! Database configuration module for the course marketplace.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`.
//! The composite ordering indexes, which `SeaORM` cannot express on the entity itself,
//! are added afterwards with explicit index statements.

use crate::entities::{
    Chapter, ChapterColumn, Course, Purchase, PurchaseColumn, Section, SectionColumn,
};
use crate::errors::Result;
use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbBackend, Schema};
use tracing::debug;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/course_market.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    connect(&get_database_url()).await
}

/// Connects to `database_url`. `SQLite` files are switched to WAL journaling.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database at {}", database_url);
    let db = Database::connect(database_url).await?;

    // Writers wait on the lock instead of failing on a stale read snapshot
    if db.get_database_backend() == DbBackend::Sqlite {
        db.execute_unprepared("PRAGMA journal_mode=WAL").await?;
    }

    Ok(db)
}

/// Unique `(course_id, order_index)` for sections and `(section_id, order_index)`
/// for chapters, plus lookup indexes for the ledger scans.
fn index_statements() -> Vec<IndexCreateStatement> {
    vec![
        Index::create()
            .name("idx_sections_course_order")
            .table(Section)
            .col(SectionColumn::CourseId)
            .col(SectionColumn::OrderIndex)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_chapters_section_order")
            .table(Chapter)
            .col(ChapterColumn::SectionId)
            .col(ChapterColumn::OrderIndex)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_chapters_course")
            .table(Chapter)
            .col(ChapterColumn::CourseId)
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_purchases_instructor_status")
            .table(Purchase)
            .col(PurchaseColumn::InstructorId)
            .col(PurchaseColumn::PaymentStatus)
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_purchases_course_status")
            .table(Purchase)
            .col(PurchaseColumn::CourseId)
            .col(PurchaseColumn::PaymentStatus)
            .if_not_exists()
            .to_owned(),
    ]
}

/// Creates all necessary tables and indexes using `SeaORM`'s schema generation.
///
/// Safe to call on an existing database: every statement is `IF NOT EXISTS`.
pub async fn create_tables<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    for mut table in [
        schema.create_table_from_entity(Course),
        schema.create_table_from_entity(Section),
        schema.create_table_from_entity(Chapter),
        schema.create_table_from_entity(Purchase),
    ] {
        table.if_not_exists();
        db.execute(builder.build(&table)).await?;
    }

    for index in index_statements() {
        db.execute(builder.build(&index)).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ChapterModel, CourseModel, PurchaseModel, SectionModel};
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<CourseModel> = Course::find().limit(1).all(&db).await?;
        let _: Vec<SectionModel> = Section::find().limit(1).all(&db).await?;
        let _: Vec<ChapterModel> = Chapter::find().limit(1).all(&db).await?;
        let _: Vec<PurchaseModel> = Purchase::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;

        let _: Vec<CourseModel> = Course::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[test]
    fn test_get_database_url_has_sqlite_default() {
        // Either the environment provides a URL or we fall back to SQLite
        let url = get_database_url();
        assert!(!url.is_empty());
    }
}
