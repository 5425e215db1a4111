//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the content tree (courses, sections, chapters)
//! and the purchase ledger. Each entity has a Model struct for data and an
//! Entity struct for operations.

pub mod chapter;
pub mod course;
pub mod purchase;
pub mod section;

// Re-export specific types to avoid conflicts
pub use chapter::{
    ChapterType, Column as ChapterColumn, Entity as Chapter, Model as ChapterModel,
};
pub use course::{Column as CourseColumn, Entity as Course, Model as CourseModel};
pub use purchase::{
    Column as PurchaseColumn, Entity as Purchase, ItemType, Model as PurchaseModel,
    PaymentStatus,
};
pub use section::{Column as SectionColumn, Entity as Section, Model as SectionModel};
