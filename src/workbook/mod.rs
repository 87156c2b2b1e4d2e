//! Workbook operations for the sample-tracking workflow
//!
//! - Build: project → templated workbook on disk (+ backup copy)
//! - Mutate: merge-aware field writes with per-entry outcomes
//! - Rename: sheet renames under uniqueness invariants
//! - Template: variant resolution and populated-extent extraction

pub mod builder;
pub mod mutator;
pub mod renamer;
pub mod template;

pub use builder::WorkbookBuilder;
pub use mutator::{
    apply, project_summary, read_ranges, sheet_exists, AutofitOutcome, BatchReport,
    ProjectSummary, WriteOutcome,
};
pub use renamer::rename;
pub use template::{TemplateExtent, TemplateSource, FALLBACK_EXTENT};
