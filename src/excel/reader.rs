//! .xlsx → Document via calamine (cell values and merge spans)

use crate::addressing::Span;
use crate::error::{LabbookError, LabbookResult};
use crate::excel::document::{CellValue, Document, Sheet};
use calamine::{open_workbook, Data, Reader, Xlsx};
use std::path::Path;
use std::time::SystemTime;

/// Read a workbook file into the in-memory model. Values and merge spans
/// are preserved; styling stored in the file is not round-tripped.
pub fn read_document(path: &Path) -> LabbookResult<Document> {
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e| {
        LabbookError::Read(format!("Failed to open workbook {}: {}", path.display(), e))
    })?;

    workbook.load_merged_regions().map_err(|e| {
        LabbookError::Read(format!(
            "Failed to load merged regions from {}: {}",
            path.display(),
            e
        ))
    })?;
    let merges: Vec<(String, Span)> = workbook
        .merged_regions()
        .iter()
        .map(|(sheet, _, dimensions)| {
            (
                sheet.clone(),
                Span::new(
                    dimensions.start.0,
                    dimensions.start.1 as u16,
                    dimensions.end.0,
                    dimensions.end.1 as u16,
                ),
            )
        })
        .collect();

    let sheet_names = workbook.sheet_names().to_vec();
    let mut document = Document::empty();

    for sheet_name in sheet_names {
        let mut sheet = Sheet::new(&sheet_name);

        if let Ok(range) = workbook.worksheet_range(&sheet_name) {
            let start = range.start().unwrap_or((0, 0));
            let (height, width) = range.get_size();
            for row in 0..height {
                for col in 0..width {
                    if let Some(value) = range.get((row, col)).and_then(convert_cell) {
                        let abs_row = start.0 + row as u32;
                        let abs_col = (start.1 + col as u32) as u16;
                        sheet.set_value(abs_row, abs_col, value);
                    }
                }
            }
        }

        for (merge_sheet, span) in &merges {
            if *merge_sheet == sheet_name {
                sheet.merge(*span);
            }
        }

        document.push_sheet(sheet);
    }

    Ok(document)
}

fn convert_cell(data: &Data) -> Option<CellValue> {
    match data {
        Data::Empty => None,
        Data::String(s) => Some(CellValue::Text(s.clone())),
        Data::Float(f) => Some(CellValue::Number(*f)),
        Data::Int(i) => Some(CellValue::Number(*i as f64)),
        Data::Bool(b) => Some(CellValue::Bool(*b)),
        Data::DateTime(dt) => Some(CellValue::Number(dt.as_f64())),
        other => Some(CellValue::Text(other.to_string())),
    }
}

/// Last-modified time of a file, used for cache staleness checks.
/// None when the file is missing or the platform withholds mtimes.
pub fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}
