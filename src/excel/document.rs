//! In-memory workbook model: ordered sheets of sparse cells, merge
//! spans, and explicit column widths

use crate::addressing::Span;
use crate::error::{LabbookError, LabbookResult};
use std::collections::BTreeMap;
use std::fmt;

/// Sheet names must fit Excel's hard limit.
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Characters Excel rejects in sheet names.
pub const FORBIDDEN_SHEET_NAME_CHARS: [char; 7] = ['\\', '/', '*', '?', ':', '[', ']'];

/// Name given to the implicitly-created first sheet of a fresh document.
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// Column width applied when content gives nothing to fit against.
pub const DEFAULT_COLUMN_WIDTH: f64 = 8.43;

/// Upper bound on fitted column widths so one long value cannot blow a
/// column out.
pub const MAX_FITTED_COLUMN_WIDTH: f64 = 50.0;

/// Check a sheet name against Excel's constraints: non-empty, at most 31
/// characters, none of `\ / * ? : [ ]`.
pub fn validate_sheet_name(name: &str) -> LabbookResult<()> {
    if name.is_empty() {
        return Err(LabbookError::InvalidSheetName(
            "sheet name is empty".to_string(),
        ));
    }
    if name.chars().count() > MAX_SHEET_NAME_LEN {
        return Err(LabbookError::InvalidSheetName(format!(
            "'{}' is longer than {} characters",
            name, MAX_SHEET_NAME_LEN
        )));
    }
    if let Some(bad) = name.chars().find(|c| FORBIDDEN_SHEET_NAME_CHARS.contains(c)) {
        return Err(LabbookError::InvalidSheetName(format!(
            "'{}' contains forbidden character '{}'",
            name, bad
        )));
    }
    Ok(())
}

/// A cell's stored value. Empty cells are simply absent from the grid.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
        }
    }
}

/// Minimal formatting the engine tracks: bold, font size, centering.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CellStyle {
    pub bold: bool,
    pub font_size: Option<f64>,
    pub centered: bool,
}

impl CellStyle {
    pub fn bold() -> Self {
        Self {
            bold: true,
            ..Self::default()
        }
    }

    pub fn bold_sized(size: f64) -> Self {
        Self {
            bold: true,
            font_size: Some(size),
            ..Self::default()
        }
    }

    pub fn centered() -> Self {
        Self {
            centered: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub style: CellStyle,
}

/// A named page of cells within a document.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    name: String,
    cells: BTreeMap<(u32, u16), Cell>,
    merges: Vec<Span>,
    col_widths: BTreeMap<u16, f64>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
            merges: Vec::new(),
            col_widths: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_value(&mut self, row: u32, col: u16, value: CellValue) {
        self.set_cell(row, col, value, CellStyle::default());
    }

    pub fn set_cell(&mut self, row: u32, col: u16, value: CellValue, style: CellStyle) {
        self.cells.insert((row, col), Cell { value, style });
    }

    pub fn value(&self, row: u32, col: u16) -> Option<&CellValue> {
        self.cells.get(&(row, col)).map(|cell| &cell.value)
    }

    pub fn cell(&self, row: u32, col: u16) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    pub fn cells(&self) -> impl Iterator<Item = (&(u32, u16), &Cell)> {
        self.cells.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn clear_cell(&mut self, row: u32, col: u16) {
        self.cells.remove(&(row, col));
    }

    /// Remove every value inside the span.
    pub fn clear_range(&mut self, span: Span) {
        self.cells
            .retain(|&(row, col), _| !span.contains(row, col));
    }

    /// Merge the span. Already-merged spans are left as-is.
    pub fn merge(&mut self, span: Span) {
        if !self.merges.contains(&span) {
            self.merges.push(span);
        }
    }

    /// Remove the span from the merge set. A no-op when the span is not
    /// merged, so callers never need to probe first.
    pub fn ensure_unmerged(&mut self, span: Span) {
        self.merges.retain(|existing| *existing != span);
    }

    pub fn is_merged(&self, span: Span) -> bool {
        self.merges.contains(&span)
    }

    pub fn merges(&self) -> &[Span] {
        &self.merges
    }

    pub fn set_column_width(&mut self, col: u16, width: f64) {
        self.col_widths.insert(col, width);
    }

    pub fn column_widths(&self) -> impl Iterator<Item = (&u16, &f64)> {
        self.col_widths.iter()
    }

    /// The minimal rectangle anchored at A1 covering all non-empty cells,
    /// or None for an empty sheet.
    pub fn used_extent(&self) -> Option<Span> {
        let mut last_row = None;
        let mut last_col = None;
        for &(row, col) in self.cells.keys() {
            last_row = Some(last_row.map_or(row, |r: u32| r.max(row)));
            last_col = Some(last_col.map_or(col, |c: u16| c.max(col)));
        }
        match (last_row, last_col) {
            (Some(row), Some(col)) => Some(Span::new(0, 0, row, col)),
            _ => None,
        }
    }

    /// Width that fits the longest value in the column, or None when the
    /// column holds nothing to measure.
    pub fn fitted_width(&self, col: u16) -> Option<f64> {
        let longest = self
            .cells
            .iter()
            .filter(|(&(_, c), _)| c == col)
            .map(|(_, cell)| cell.value.to_string().chars().count())
            .max()?;
        let width = (longest as f64 + 2.0).max(DEFAULT_COLUMN_WIDTH);
        Some(width.min(MAX_FITTED_COLUMN_WIDTH))
    }
}

/// An ordered collection of sheets, the in-memory form of one `.xlsx`
/// file. A fresh document contains a single implicit sheet, matching the
/// engine behavior the builder relies on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    sheets: Vec<Sheet>,
}

impl Document {
    /// A new document with the implicit first sheet.
    pub fn new() -> Self {
        Self {
            sheets: vec![Sheet::new(DEFAULT_SHEET_NAME)],
        }
    }

    /// A document with no sheets at all; the reader fills it in.
    pub fn empty() -> Self {
        Self { sheets: Vec::new() }
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name().to_string()).collect()
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn has_sheet(&self, name: &str) -> bool {
        self.sheets.iter().any(|s| s.name() == name)
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name() == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name() == name)
    }

    pub fn sheet_at(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    /// Append a sheet at the end. Fails on an invalid or duplicate name.
    pub fn add_sheet(&mut self, name: &str) -> LabbookResult<&mut Sheet> {
        self.insert_sheet_at(self.sheets.len(), name)
    }

    /// Insert a sheet at an ordinal position, shifting later sheets.
    pub fn insert_sheet_at(&mut self, index: usize, name: &str) -> LabbookResult<&mut Sheet> {
        validate_sheet_name(name)?;
        if self.has_sheet(name) {
            return Err(LabbookError::DuplicateSheetName(name.to_string()));
        }
        let index = index.min(self.sheets.len());
        self.sheets.insert(index, Sheet::new(name));
        Ok(&mut self.sheets[index])
    }

    /// Used by the reader, which trusts names as stored in the file.
    pub(crate) fn push_sheet(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    /// Rename a sheet. Preconditions checked in order: the old name must
    /// exist, then the new name must not.
    pub fn rename_sheet(&mut self, old_name: &str, new_name: &str) -> LabbookResult<()> {
        let index = self
            .sheets
            .iter()
            .position(|s| s.name() == old_name)
            .ok_or_else(|| LabbookError::SheetNotFound(old_name.to_string()))?;
        if self.has_sheet(new_name) {
            return Err(LabbookError::DuplicateSheetName(new_name.to_string()));
        }
        self.sheets[index].set_name(new_name);
        Ok(())
    }
}
