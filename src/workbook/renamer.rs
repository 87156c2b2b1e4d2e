//! Sheet renames with uniqueness and existence preconditions

use crate::error::LabbookResult;
use crate::excel::session::Session;
use std::path::Path;

/// Rename one sheet and persist the workbook.
///
/// Preconditions, checked in order before anything is modified: the old
/// name must exist (`SheetNotFound`), the new name must not
/// (`DuplicateSheetName`). Length and character validation of the new
/// name is the caller's responsibility.
pub fn rename(
    session: &mut Session,
    path: &Path,
    old_name: &str,
    new_name: &str,
) -> LabbookResult<()> {
    let document = session.open(path)?;
    document.rename_sheet(old_name, new_name)?;
    session.save(path)
}
