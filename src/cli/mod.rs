//! CLI command handlers

pub mod commands;

pub use commands::{create, read, rename, save, summary};
