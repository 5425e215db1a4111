//! Core business logic - framework-agnostic content tree, ledger and statistics operations.

/// Course authoring, publication and outlines
pub mod course;
/// Section and chapter appends with ordering and ownership rules
pub mod content;
/// Exact currency amounts stored as cents
pub mod money;
/// Monthly revenue rollup
pub mod monthly;
/// Purchase ledger and purchase target resolution
pub mod purchase;
/// Statistics operations over the ledger and text summaries
pub mod report;
/// Pure revenue aggregation
pub mod statistics;
