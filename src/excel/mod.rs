//! Spreadsheet document engine
//!
//! An in-memory workbook model with .xlsx I/O on either side:
//! - Read: .xlsx → `Document` (calamine)
//! - Write: `Document` → .xlsx (rust_xlsxwriter), persisted atomically
//! - Lifecycle: `Session` caches open documents; `SessionPool` holds at
//!   most one session and hands it out as a scoped guard

pub mod document;
pub mod reader;
pub mod session;
pub mod writer;

pub use document::{
    validate_sheet_name, Cell, CellStyle, CellValue, Document, Sheet, DEFAULT_SHEET_NAME,
    FORBIDDEN_SHEET_NAME_CHARS, MAX_SHEET_NAME_LEN,
};
pub use reader::read_document;
pub use session::{Session, SessionGuard, SessionPool};
pub use writer::write_document;
