//! Course entity - Root of the content tree.
//!
//! A course is owned by one instructor and holds an ordered list of sections.
//! Courses start unpublished; publication is a one-way flag.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Course database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    /// UUID of the course
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    /// Owning instructor
    pub instructor_id: String,
    /// Display name of the owning instructor, copied at creation time
    pub instructor_name: String,
    pub thumbnail: Option<String>,
    /// List price in cents, `None` when the course is not sold as a whole
    pub price_cents: Option<i64>,
    pub is_published: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Course and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One course has many sections
    #[sea_orm(has_many = "super::section::Entity")]
    Sections,
    /// One course has many chapters (denormalized through `chapters.course_id`)
    #[sea_orm(has_many = "super::chapter::Entity")]
    Chapters,
    /// One course has many purchases
    #[sea_orm(has_many = "super::purchase::Entity")]
    Purchases,
}

impl Related<super::section::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sections.def()
    }
}

impl Related<super::chapter::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Chapters.def()
    }
}

impl Related<super::purchase::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Purchases.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
