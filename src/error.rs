use std::path::PathBuf;
use thiserror::Error;

pub type LabbookResult<T> = Result<T, LabbookError>;

#[derive(Error, Debug)]
pub enum LabbookError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template file not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    #[error("Invalid cell range reference: {0}")]
    InvalidRange(String),

    #[error("Invalid sheet name: {0}")]
    InvalidSheetName(String),

    #[error("Sheet '{0}' does not exist")]
    SheetNotFound(String),

    #[error("Sheet '{0}' already exists")]
    DuplicateSheetName(String),

    #[error("{0}")]
    Build(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Read error: {0}")]
    Read(String),
}
