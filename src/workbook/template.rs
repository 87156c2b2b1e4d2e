//! Read-only access to master template workbooks

use crate::addressing::Span;
use crate::config::Settings;
use crate::error::{LabbookError, LabbookResult};
use crate::excel::document::{Cell, Sheet};
use crate::excel::session::Session;
use crate::project::{ProjectType, SampleType};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Rectangle used when a template's populated extent cannot be
/// determined: columns A–Z, rows 1–100.
pub const FALLBACK_EXTENT: Span = Span {
    first_row: 0,
    first_col: 0,
    last_row: 99,
    last_col: 25,
};

/// The populated region of a template's first sheet, anchored at A1.
/// When `complete` is false the fixed fallback rectangle was used and
/// template content outside it was not captured.
#[derive(Debug, Clone)]
pub struct TemplateExtent {
    cells: Vec<(u32, u16, Cell)>,
    merges: Vec<Span>,
    pub complete: bool,
}

impl TemplateExtent {
    /// Copy the extent into a sheet, starting at its top-left cell.
    pub fn apply_to(&self, sheet: &mut Sheet) {
        for (row, col, cell) in &self.cells {
            sheet.set_cell(*row, *col, cell.value.clone(), cell.style);
        }
        for span in &self.merges {
            sheet.merge(*span);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Resolves and reads the master template for a (project type, sample
/// type) pair.
#[derive(Debug, Clone)]
pub struct TemplateSource {
    settings: Settings,
}

impl TemplateSource {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// The configured template path for a known combination.
    pub fn resolve(&self, project_type: ProjectType, sample_type: SampleType) -> &Path {
        match (project_type, sample_type) {
            (ProjectType::Characterisation, SampleType::Solid) => &self.settings.template_char_solid,
            (ProjectType::Characterisation, SampleType::Effluent) => {
                &self.settings.template_char_effluent
            }
            (ProjectType::Bmp, SampleType::Solid) => &self.settings.template_bmp_solid,
            (ProjectType::Bmp, SampleType::Effluent) => &self.settings.template_bmp_effluent,
        }
    }

    /// Resolve from free-form labels, as they arrive at the process
    /// boundary. Any combination outside the known set falls back to the
    /// Characterisation/Solid template.
    pub fn resolve_labels(&self, project_type: &str, sample_type: &str) -> &Path {
        let project_type =
            ProjectType::from_str(project_type).unwrap_or(ProjectType::Characterisation);
        let sample_type = SampleType::from_str(sample_type).unwrap_or(SampleType::Solid);
        self.resolve(project_type, sample_type)
    }

    /// Resolve and verify the template exists on disk before anyone tries
    /// to open it, so the error can name the missing path.
    pub fn resolve_checked(
        &self,
        project_type: ProjectType,
        sample_type: SampleType,
    ) -> LabbookResult<PathBuf> {
        let path = self.resolve(project_type, sample_type);
        if !path.exists() {
            return Err(LabbookError::TemplateNotFound(path.to_path_buf()));
        }
        Ok(path.to_path_buf())
    }

    /// Extract the populated extent of the template's first sheet: the
    /// minimal rectangle from A1 covering all non-empty cells, plus the
    /// merge spans inside it. Falls back to A1:Z100, best-effort, when
    /// the extent cannot be determined.
    pub fn load_extent(
        &self,
        session: &mut Session,
        project_type: ProjectType,
        sample_type: SampleType,
    ) -> LabbookResult<TemplateExtent> {
        let path = self.resolve_checked(project_type, sample_type)?;
        let document = session.open(&path)?;

        let sheet = document.sheet_at(0).ok_or_else(|| {
            LabbookError::Read(format!("Template {} has no sheets", path.display()))
        })?;

        let (rect, complete) = match sheet.used_extent() {
            Some(rect) => (rect, true),
            None => {
                tracing::warn!(
                    template = %path.display(),
                    "template extent undetermined, using fallback rectangle A1:Z100"
                );
                (FALLBACK_EXTENT, false)
            }
        };

        let cells = sheet
            .cells()
            .filter(|(&(row, col), _)| rect.contains(row, col))
            .map(|(&(row, col), cell)| (row, col, cell.clone()))
            .collect();
        let merges = sheet
            .merges()
            .iter()
            .filter(|span| rect.contains(span.first_row, span.first_col))
            .copied()
            .collect();

        Ok(TemplateExtent {
            cells,
            merges,
            complete,
        })
    }
}
