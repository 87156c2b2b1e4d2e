//! Document → .xlsx via rust_xlsxwriter, persisted atomically

use crate::error::{LabbookError, LabbookResult};
use crate::excel::document::{CellStyle, CellValue, Document};
use rust_xlsxwriter::{Format, FormatAlign, Workbook};
use std::path::Path;

/// Serialize the document and persist it. The file is written to a
/// temporary sibling first and renamed into place, so a failed save
/// leaves any previous bytes at `path` untouched.
pub fn write_document(document: &Document, path: &Path) -> LabbookResult<()> {
    let mut workbook = Workbook::new();

    for sheet in document.sheets() {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet.name()).map_err(|e| {
            LabbookError::Persistence(format!("Invalid sheet name '{}': {}", sheet.name(), e))
        })?;

        for (&col, &width) in sheet.column_widths() {
            worksheet.set_column_width(col, width).map_err(|e| {
                LabbookError::Persistence(format!("Failed to set column width: {}", e))
            })?;
        }

        // Merge first, then write values; the top-left cell of each span
        // carries the span's value.
        let merge_format = Format::new();
        for span in sheet.merges() {
            worksheet
                .merge_range(
                    span.first_row,
                    span.first_col,
                    span.last_row,
                    span.last_col,
                    "",
                    &merge_format,
                )
                .map_err(|e| {
                    LabbookError::Persistence(format!("Failed to merge {}: {}", span, e))
                })?;
        }

        for (&(row, col), cell) in sheet.cells() {
            let format = build_format(&cell.style);
            let written = match &cell.value {
                CellValue::Text(s) => worksheet.write_string_with_format(row, col, s, &format),
                CellValue::Number(n) => worksheet.write_number_with_format(row, col, *n, &format),
                CellValue::Bool(b) => worksheet.write_boolean_with_format(row, col, *b, &format),
            };
            written.map_err(|e| {
                LabbookError::Persistence(format!(
                    "Failed to write cell ({}, {}) on '{}': {}",
                    row,
                    col,
                    sheet.name(),
                    e
                ))
            })?;
        }
    }

    let buffer = workbook
        .save_to_buffer()
        .map_err(|e| LabbookError::Persistence(format!("Failed to serialize workbook: {}", e)))?;

    persist_atomically(&buffer, path)
}

fn build_format(style: &CellStyle) -> Format {
    let mut format = Format::new();
    if style.bold {
        format = format.set_bold();
    }
    if let Some(size) = style.font_size {
        format = format.set_font_size(size);
    }
    if style.centered {
        format = format.set_align(FormatAlign::Center);
    }
    format
}

fn persist_atomically(buffer: &[u8], path: &Path) -> LabbookResult<()> {
    let tmp_path = path.with_extension("xlsx.tmp");
    std::fs::write(&tmp_path, buffer).map_err(|e| {
        LabbookError::Persistence(format!("Failed to write {}: {}", tmp_path.display(), e))
    })?;

    if let Err(first) = std::fs::rename(&tmp_path, path) {
        // Windows refuses to rename over an existing file; clear the
        // target and retry once before giving up.
        let _ = std::fs::remove_file(path);
        if let Err(second) = std::fs::rename(&tmp_path, path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(LabbookError::Persistence(format!(
                "Failed to replace {}: {}; {}",
                path.display(),
                first,
                second
            )));
        }
    }

    Ok(())
}
