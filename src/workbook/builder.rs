//! Workbook builder: one summary sheet plus one templated sheet per sample

use crate::config::Settings;
use crate::error::{LabbookError, LabbookResult};
use crate::excel::document::{CellStyle, CellValue, Document, Sheet, DEFAULT_SHEET_NAME};
use crate::excel::session::Session;
use crate::project::{Project, ProjectType};
use crate::workbook::template::TemplateSource;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Summary block layout: title row, then label/value rows 3–8 (one-based).
const SUMMARY_TITLE_FONT_SIZE: f64 = 16.0;
const SUMMARY_FIRST_DATA_ROW: u32 = 2;
const BMP_HEADER_FONT_SIZE: f64 = 14.0;

/// Builds new sample-tracking workbooks from a project and a template.
#[derive(Debug, Clone)]
pub struct WorkbookBuilder {
    settings: Settings,
    templates: TemplateSource,
}

impl WorkbookBuilder {
    pub fn new(settings: Settings) -> Self {
        let templates = TemplateSource::new(settings.clone());
        Self {
            settings,
            templates,
        }
    }

    /// Create the workbook for a project: a dated project folder, a
    /// timestamped file with a summary sheet at position 0 and one
    /// template-derived sheet per sample, plus a backup copy. Returns the
    /// workbook path.
    ///
    /// A missing template fails fast with `TemplateNotFound`; any other
    /// failure surfaces as a single wrapped `Build` error. Partially
    /// created folders are not cleaned up.
    pub fn build(&self, session: &mut Session, project: &Project) -> LabbookResult<PathBuf> {
        // Precondition, surfaced with its own kind before anything is
        // created on disk.
        self.templates
            .resolve_checked(project.project_type, project.sample_type)?;

        self.build_inner(session, project).map_err(|e| {
            LabbookError::Build(format!(
                "Failed to create {} workbook: {}",
                project.project_type.failure_label(),
                e
            ))
        })
    }

    /// Whether the dated project folder already holds a workbook for this
    /// project/type/sample-type combination. Replaces the external
    /// "already created" flag the caller would otherwise have to carry.
    pub fn already_built(&self, project: &Project) -> bool {
        let now = Local::now();
        let folder = self.project_folder(project, now);
        let prefix = self.file_prefix(project);

        let entries = match std::fs::read_dir(&folder) {
            Ok(entries) => entries,
            Err(_) => return false,
        };
        entries.filter_map(|entry| entry.ok()).any(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.starts_with(&prefix) && name.ends_with(".xlsx")
        })
    }

    fn build_inner(&self, session: &mut Session, project: &Project) -> LabbookResult<PathBuf> {
        if project.sample_sheet_names.len() < project.sample_count {
            return Err(LabbookError::Build(format!(
                "{} sample sheet names for {} samples",
                project.sample_sheet_names.len(),
                project.sample_count
            )));
        }

        let now = Local::now();
        let folder = self.project_folder(project, now);
        std::fs::create_dir_all(&folder)?;
        let path = self.unique_workbook_path(&folder, project, now);

        let extent =
            self.templates
                .load_extent(session, project.project_type, project.sample_type)?;

        let mut document = Document::new();
        insert_summary_sheet(&mut document, project, now)?;

        for (i, sheet_name) in project
            .sample_sheet_names
            .iter()
            .take(project.sample_count)
            .enumerate()
        {
            if i == 0 {
                document.rename_sheet(DEFAULT_SHEET_NAME, sheet_name)?;
            } else {
                document.add_sheet(sheet_name)?;
            }
            if let Some(sheet) = document.sheet_mut(sheet_name) {
                extent.apply_to(sheet);
                if project.project_type == ProjectType::Bmp {
                    format_bmp_sheet(sheet);
                }
            }
        }

        session.save_document(&path, document)?;
        self.create_backup(&path);

        Ok(path)
    }

    fn project_folder(&self, project: &Project, now: DateTime<Local>) -> PathBuf {
        let folder_name = format!("{}_{}", project.name, now.format("%Y%m%d"));
        self.settings.base_dir.join(folder_name)
    }

    fn file_prefix(&self, project: &Project) -> String {
        format!(
            "{}_{}_{}_",
            project.name,
            project.project_type.file_tag(),
            project.sample_type
        )
    }

    /// Timestamped file name; two builds in the same second get a short
    /// random suffix instead of colliding.
    fn unique_workbook_path(
        &self,
        folder: &Path,
        project: &Project,
        now: DateTime<Local>,
    ) -> PathBuf {
        let stem = format!("{}{}", self.file_prefix(project), now.format("%Y%m%d_%H%M%S"));
        let path = folder.join(format!("{}.xlsx", stem));
        if !path.exists() {
            return path;
        }
        let suffix = Uuid::new_v4().simple().to_string();
        folder.join(format!("{}_{}.xlsx", stem, &suffix[..8]))
    }

    /// Copy the persisted workbook into a `backups/` sibling folder. A
    /// backup failure is logged, never escalated.
    fn create_backup(&self, path: &Path) {
        let result = (|| -> std::io::Result<()> {
            let parent = path.parent().unwrap_or_else(|| Path::new("."));
            let backup_dir = parent.join("backups");
            std::fs::create_dir_all(&backup_dir)?;

            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            std::fs::copy(path, backup_dir.join(format!("backup_{}", file_name)))?;
            Ok(())
        })();

        if let Err(e) = result {
            tracing::warn!(workbook = %path.display(), "Could not create backup: {}", e);
        }
    }
}

/// Insert the summary sheet at position 0 and populate its fixed layout:
/// a bold title and six bold-label/value rows.
fn insert_summary_sheet(
    document: &mut Document,
    project: &Project,
    now: DateTime<Local>,
) -> LabbookResult<()> {
    let name = project.project_type.summary_sheet_name();
    let sheet = document.insert_sheet_at(0, name)?;

    sheet.set_cell(
        0,
        0,
        CellValue::Text(project.project_type.summary_title().to_string()),
        CellStyle::bold_sized(SUMMARY_TITLE_FONT_SIZE),
    );

    let rows = [
        ("Project Name:", CellValue::Text(project.name.clone())),
        (
            "Project Type:",
            CellValue::Text(project.project_type.summary_label().to_string()),
        ),
        (
            "Sample Type:",
            CellValue::Text(project.sample_type.to_string()),
        ),
        (
            "Total Samples:",
            CellValue::Number(project.sample_count as f64),
        ),
        (
            "Created Date:",
            CellValue::Text(now.format("%Y-%m-%d %H:%M:%S").to_string()),
        ),
        ("Status:", CellValue::Text("In Progress".to_string())),
    ];
    for (offset, (label, value)) in rows.into_iter().enumerate() {
        let row = SUMMARY_FIRST_DATA_ROW + offset as u32;
        sheet.set_cell(row, 0, CellValue::Text(label.to_string()), CellStyle::bold());
        sheet.set_value(row, 1, value);
    }

    // Best-effort width fit for the label and value columns.
    for col in 0..2 {
        if let Some(width) = sheet.fitted_width(col) {
            sheet.set_column_width(col, width);
        }
    }

    Ok(())
}

/// BMP sheets get an identifying header when the template left the
/// top-left cell empty, and width fitting for the first five columns.
fn format_bmp_sheet(sheet: &mut Sheet) {
    if sheet.value(0, 0).is_none() {
        let header = format!("BMP Analysis - {}", sheet.name());
        sheet.set_cell(
            0,
            0,
            CellValue::Text(header),
            CellStyle::bold_sized(BMP_HEADER_FONT_SIZE),
        );
    }

    for col in 0..5 {
        if let Some(width) = sheet.fitted_width(col) {
            sheet.set_column_width(col, width);
        }
    }
}
