//! Chapter entity - Leaf of the content tree.
//!
//! Chapters keep a denormalized `course_id` equal to their section's course.
//! That column doubles as the chapter → course index used when resolving
//! chapter purchases.

use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};

/// Whether a chapter is free or sold individually.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
#[serde(rename_all = "lowercase")]
pub enum ChapterType {
    #[sea_orm(string_value = "free")]
    Free,
    #[sea_orm(string_value = "paid")]
    Paid,
}

/// Chapter database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "chapters")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Parent section
    pub section_id: String,
    /// Grandparent course, always equal to the section's `course_id`
    pub course_id: String,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub video_url: Option<String>,
    pub chapter_type: ChapterType,
    /// Price in cents; set and positive only for paid chapters
    pub price_cents: Option<i64>,
    /// Position among the section's chapters
    pub order_index: i32,
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Chapter and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each chapter belongs to one section
    #[sea_orm(
        belongs_to = "super::section::Entity",
        from = "Column::SectionId",
        to = "super::section::Column::Id"
    )]
    Section,
    /// Each chapter belongs to one course
    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id"
    )]
    Course,
}

impl Related<super::section::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Section.def()
    }
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
