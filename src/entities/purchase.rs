//! Purchase entity - One row of the append-only ledger.
//!
//! A purchase references either a whole course or a single chapter. For
//! chapter purchases `course_id` holds the chapter's parent course so that
//! per-course statistics include them. Names and titles are copied at purchase
//! time and never follow later edits.

use crate::errors::Error;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Kind of item a purchase refers to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    #[sea_orm(string_value = "course")]
    Course,
    #[sea_orm(string_value = "chapter")]
    Chapter,
}

impl ItemType {
    /// Lowercase wire name of the item type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Course => "course",
            Self::Chapter => "chapter",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "course" => Ok(Self::Course),
            "chapter" => Ok(Self::Chapter),
            other => Err(Error::validation(format!("Invalid item type: {other}"))),
        }
    }
}

/// Settlement state of a purchase. Only `Completed` purchases count as revenue.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "failed")]
    Failed,
    #[sea_orm(string_value = "refunded")]
    Refunded,
}

/// Purchase database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchases")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub student_id: String,
    pub student_name: String,
    pub student_email: String,
    /// Purchased course, or the parent course of a purchased chapter
    pub course_id: Option<String>,
    /// Purchased chapter, `None` for course purchases
    pub chapter_id: Option<String>,
    pub item_type: ItemType,
    pub item_title: String,
    pub instructor_id: String,
    pub instructor_name: String,
    /// Amount paid in cents, never negative
    pub amount_cents: i64,
    /// ISO 4217 code, e.g. `"EUR"`
    pub currency: String,
    pub payment_status: PaymentStatus,
    pub payment_method: String,
    pub transaction_id: Option<String>,
    pub purchased_at: DateTimeUtc,
}

/// Defines relationships between Purchase and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Purchased course (or parent course of the purchased chapter)
    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id"
    )]
    Course,
    /// Purchased chapter
    #[sea_orm(
        belongs_to = "super::chapter::Entity",
        from = "Column::ChapterId",
        to = "super::chapter::Column::Id"
    )]
    Chapter,
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl Related<super::chapter::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Chapter.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
