//! Merge-aware field writes against an existing workbook

use crate::addressing::RangeRef;
use crate::error::{LabbookError, LabbookResult};
use crate::excel::document::{CellStyle, CellValue, Sheet, DEFAULT_COLUMN_WIDTH};
use crate::excel::session::Session;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Result of one batch entry. Failures carry the cause; they never abort
/// the rest of the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteOutcome {
    pub range: String,
    pub error: Option<String>,
}

impl WriteOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of the column-fit pass that follows a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AutofitOutcome {
    /// Every column in the used extent was fitted.
    Full,
    /// Some columns in the used extent had nothing to fit against.
    Partial { fitted: u16, total: u16 },
    /// The extent could not be determined; columns A–Z got the default
    /// width instead.
    Failed,
}

/// Structured result of `apply`: one outcome per entry, in batch order,
/// plus the column-fit outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<WriteOutcome>,
    pub autofit: AutofitOutcome,
}

impl BatchReport {
    pub fn fully_applied(&self) -> bool {
        self.outcomes.iter().all(WriteOutcome::is_ok)
    }
}

/// Apply a field write batch to one sheet and persist the workbook.
///
/// Entries are independent: a span entry is cleared, unmerged if needed,
/// written into its top-left cell, re-merged and centered; a single-cell
/// entry is cleared and written. One entry's failure is recorded in the
/// report (and logged) while the remaining entries still run. Failure to
/// open or save the workbook aborts the whole operation and leaves the
/// on-disk file unchanged.
pub fn apply(
    session: &mut Session,
    path: &Path,
    sheet_name: &str,
    batch: &[(String, String)],
) -> LabbookResult<BatchReport> {
    let document = session.open(path)?;
    let sheet = document
        .sheet_mut(sheet_name)
        .ok_or_else(|| LabbookError::SheetNotFound(sheet_name.to_string()))?;

    let mut outcomes = Vec::with_capacity(batch.len());
    for (range, value) in batch {
        let result = write_entry(sheet, range, value);
        if let Err(e) = &result {
            tracing::warn!(range = %range, sheet = %sheet_name, "Could not save data: {}", e);
        }
        outcomes.push(WriteOutcome {
            range: range.clone(),
            error: result.err().map(|e| e.to_string()),
        });
    }

    let autofit = fit_data_columns(sheet);
    if autofit == AutofitOutcome::Failed {
        tracing::warn!(sheet = %sheet_name, "Could not fit data columns, applied default widths");
    }

    session.save(path)?;

    Ok(BatchReport { outcomes, autofit })
}

fn write_entry(sheet: &mut Sheet, range: &str, value: &str) -> LabbookResult<()> {
    match RangeRef::parse(range)? {
        RangeRef::Single(cell) => {
            sheet.clear_cell(cell.row, cell.col);
            sheet.set_value(cell.row, cell.col, CellValue::Text(value.to_string()));
        }
        RangeRef::Span(span) => {
            sheet.clear_range(span);
            sheet.ensure_unmerged(span);
            let top_left = span.top_left();
            sheet.set_cell(
                top_left.row,
                top_left.col,
                CellValue::Text(value.to_string()),
                CellStyle::centered(),
            );
            sheet.merge(span);
        }
    }
    Ok(())
}

/// Fit every data-bearing column after a batch. One pass with an explicit
/// policy: fit all columns of the used extent; report partially when some
/// of those columns hold nothing measurable; fall back to default widths
/// for A–Z when the extent itself cannot be determined.
fn fit_data_columns(sheet: &mut Sheet) -> AutofitOutcome {
    match sheet.used_extent() {
        Some(extent) => {
            let total = extent.last_col + 1;
            let mut fitted = 0;
            for col in 0..total {
                if let Some(width) = sheet.fitted_width(col) {
                    sheet.set_column_width(col, width);
                    fitted += 1;
                }
            }
            if fitted == total {
                AutofitOutcome::Full
            } else {
                AutofitOutcome::Partial { fitted, total }
            }
        }
        None => {
            for col in 0..26 {
                sheet.set_column_width(col, DEFAULT_COLUMN_WIDTH);
            }
            AutofitOutcome::Failed
        }
    }
}

/// Read values back from a sheet. Each requested range maps to its value
/// (the top-left cell's value for spans) or None when the reference is
/// malformed or the cell is empty.
pub fn read_ranges(
    session: &mut Session,
    path: &Path,
    sheet_name: &str,
    ranges: &[String],
) -> LabbookResult<BTreeMap<String, Option<String>>> {
    let document = session.open(path)?;
    let sheet = document
        .sheet(sheet_name)
        .ok_or_else(|| LabbookError::SheetNotFound(sheet_name.to_string()))?;

    let mut values = BTreeMap::new();
    for range in ranges {
        let value = match RangeRef::parse(range) {
            Ok(parsed) => {
                let cell = parsed.top_left();
                sheet.value(cell.row, cell.col).map(|v| v.to_string())
            }
            Err(e) => {
                tracing::warn!(range = %range, "Could not read range: {}", e);
                None
            }
        };
        values.insert(range.clone(), value);
    }
    Ok(values)
}

/// Whether a sheet exists in the workbook. Open failures count as absent,
/// matching the query's advisory role.
pub fn sheet_exists(session: &mut Session, path: &Path, sheet_name: &str) -> bool {
    match session.open(path) {
        Ok(document) => document.has_sheet(sheet_name),
        Err(_) => false,
    }
}

/// Project metadata read back from a workbook's summary sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectSummary {
    pub project_name: Option<String>,
    pub project_type: Option<String>,
    pub sample_type: Option<String>,
    pub total_samples: Option<f64>,
    pub created_date: Option<String>,
    pub status: Option<String>,
}

/// Read the summary block from the first sheet whose name contains
/// "summary" (case-insensitive).
pub fn project_summary(session: &mut Session, path: &Path) -> LabbookResult<ProjectSummary> {
    let document = session.open(path)?;
    let sheet = document
        .sheets()
        .iter()
        .find(|s| s.name().to_lowercase().contains("summary"))
        .ok_or_else(|| LabbookError::SheetNotFound("summary".to_string()))?;

    let text = |row: u32| sheet.value(row, 1).map(|v| v.to_string());
    let number = |row: u32| match sheet.value(row, 1) {
        Some(CellValue::Number(n)) => Some(*n),
        _ => None,
    };

    Ok(ProjectSummary {
        project_name: text(2),
        project_type: text(3),
        sample_type: text(4),
        total_samples: number(5),
        created_date: text(6),
        status: text(7),
    })
}
