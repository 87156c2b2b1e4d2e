//! Labbook - workbook engine for laboratory sample tracking
//!
//! This library builds structured `.xlsx` workbooks for a sample-tracking
//! workflow (one summary sheet plus one template-derived sheet per
//! sample) and applies later mutations to them: merge-aware field writes
//! and sheet renames.
//!
//! # Features
//!
//! - Template resolution per (project type, sample type) combination
//! - Workbook builds with dated project folders and backup copies
//! - Field write batches with per-entry outcomes and column fitting
//! - Sheet renames under name-uniqueness invariants
//! - An explicit document session, pooled with a maximum size of one
//!
//! # Example
//!
//! ```no_run
//! use labbook::config::Settings;
//! use labbook::excel::SessionPool;
//! use labbook::project::{Project, ProjectType, SampleType};
//! use labbook::workbook::WorkbookBuilder;
//!
//! let mut project = Project::new(
//!     "AcidTest",
//!     2,
//!     SampleType::Solid,
//!     ProjectType::Characterisation,
//! );
//!
//! let builder = WorkbookBuilder::new(Settings::from_env());
//! let mut pool = SessionPool::new();
//! let mut session = pool.acquire();
//!
//! let path = builder.build(&mut session, &project)?;
//! project.workbook_path = Some(path);
//! # Ok::<(), labbook::error::LabbookError>(())
//! ```

pub mod addressing;
pub mod cli;
pub mod config;
pub mod error;
pub mod excel;
pub mod project;
pub mod workbook;

// Re-export commonly used types
pub use error::{LabbookError, LabbookResult};
pub use project::{Project, ProjectType, SampleType};
