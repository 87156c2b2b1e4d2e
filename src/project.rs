//! Project record shared between the front-end boundary and the workbook engine

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Kind of sample material a project tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleType {
    Solid,
    Effluent,
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleType::Solid => write!(f, "Solid"),
            SampleType::Effluent => write!(f, "Effluent"),
        }
    }
}

impl FromStr for SampleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "solid" => Ok(SampleType::Solid),
            "effluent" => Ok(SampleType::Effluent),
            other => Err(format!("Unknown sample type: {}", other)),
        }
    }
}

/// Kind of analysis a project runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectType {
    Characterisation,
    Bmp,
}

impl ProjectType {
    /// Tag used in workbook file names.
    pub fn file_tag(&self) -> &'static str {
        match self {
            ProjectType::Characterisation => "characterisation",
            ProjectType::Bmp => "BMP",
        }
    }

    /// Label used in build failure messages.
    pub fn failure_label(&self) -> &'static str {
        match self {
            ProjectType::Characterisation => "characterisation",
            ProjectType::Bmp => "BMP",
        }
    }

    /// Fixed name of the summary sheet for this project type.
    pub fn summary_sheet_name(&self) -> &'static str {
        match self {
            ProjectType::Characterisation => "Char_Summary",
            ProjectType::Bmp => "BMP_Summary",
        }
    }

    /// Title written into the summary sheet's first cell.
    pub fn summary_title(&self) -> &'static str {
        match self {
            ProjectType::Characterisation => "CHARACTERISATION PROJECT SUMMARY",
            ProjectType::Bmp => "BMP PROJECT SUMMARY",
        }
    }

    /// Value of the summary sheet's "Project Type" row.
    pub fn summary_label(&self) -> &'static str {
        match self {
            ProjectType::Characterisation => "Characterisation",
            ProjectType::Bmp => "BMP Analysis",
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectType::Characterisation => write!(f, "Characterisation"),
            ProjectType::Bmp => write!(f, "BMP"),
        }
    }
}

impl FromStr for ProjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "characterisation" | "char" => Ok(ProjectType::Characterisation),
            "bmp" => Ok(ProjectType::Bmp),
            other => Err(format!("Unknown project type: {}", other)),
        }
    }
}

/// A sample-tracking project. Owned by the session that created it; the
/// builder assigns `workbook_path`, rename operations substitute entries
/// of `sample_sheet_names` in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub sample_count: usize,
    pub sample_type: SampleType,
    pub project_type: ProjectType,
    pub sample_sheet_names: Vec<String>,
    pub workbook_path: Option<PathBuf>,
}

impl Project {
    /// Create a project with default sample sheet names `Sample_1..Sample_N`.
    pub fn new(
        name: impl Into<String>,
        sample_count: usize,
        sample_type: SampleType,
        project_type: ProjectType,
    ) -> Self {
        let sample_sheet_names = (1..=sample_count).map(|i| format!("Sample_{}", i)).collect();
        Self {
            name: name.into(),
            sample_count,
            sample_type,
            project_type,
            sample_sheet_names,
            workbook_path: None,
        }
    }

    /// Substitute a sample sheet name at its current ordinal position.
    /// Returns false when `old_name` is not one of the project's sheets.
    pub fn rename_sample(&mut self, old_name: &str, new_name: &str) -> bool {
        match self.sample_sheet_names.iter().position(|n| n == old_name) {
            Some(index) => {
                self.sample_sheet_names[index] = new_name.to_string();
                true
            }
            None => false,
        }
    }
}
