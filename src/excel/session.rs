//! Document handle lifecycle: an explicit session with a cache of open
//! documents, pooled with a maximum size of one

use crate::error::{LabbookError, LabbookResult};
use crate::excel::document::Document;
use crate::excel::reader::{modified_time, read_document};
use crate::excel::writer::write_document;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Debug)]
struct CachedDocument {
    document: Document,
    /// Source mtime at read/save time; a mismatch marks the entry stale.
    modified: Option<SystemTime>,
}

/// One engine session. Documents opened through it stay cached until the
/// session is torn down, so repeated operations against the same workbook
/// do not re-read the file. A cache entry whose backing file changed on
/// disk is re-read transparently.
#[derive(Debug, Default)]
pub struct Session {
    documents: HashMap<PathBuf, CachedDocument>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a workbook, reusing the cached document when the file is
    /// unchanged since it was last read or saved.
    pub fn open(&mut self, path: &Path) -> LabbookResult<&mut Document> {
        let key = cache_key(path);
        let on_disk = modified_time(path);

        let cached = match self.documents.entry(key) {
            Entry::Occupied(entry) => {
                let slot = entry.into_mut();
                if slot.modified != on_disk {
                    tracing::debug!(path = %path.display(), "reloading stale document");
                    slot.document = read_document(path)?;
                    slot.modified = on_disk;
                }
                slot
            }
            Entry::Vacant(entry) => {
                tracing::debug!(path = %path.display(), "opening document");
                entry.insert(CachedDocument {
                    document: read_document(path)?,
                    modified: on_disk,
                })
            }
        };

        Ok(&mut cached.document)
    }

    /// Persist the cached document for `path`. Fails when nothing is open
    /// for that path.
    pub fn save(&mut self, path: &Path) -> LabbookResult<()> {
        let key = cache_key(path);
        let cached = self.documents.get_mut(&key).ok_or_else(|| {
            LabbookError::Persistence(format!("No open document for {}", path.display()))
        })?;
        write_document(&cached.document, path)?;
        cached.modified = modified_time(path);
        Ok(())
    }

    /// Persist a newly-built document and adopt it into the cache.
    pub fn save_document(&mut self, path: &Path, document: Document) -> LabbookResult<()> {
        write_document(&document, path)?;
        self.documents.insert(
            cache_key(path),
            CachedDocument {
                document,
                modified: modified_time(path),
            },
        );
        Ok(())
    }

    /// Drop one cached document. Unsaved changes are discarded.
    pub fn close(&mut self, path: &Path) {
        self.documents.remove(&cache_key(path));
    }

    /// Drop every cached document. Never fails; teardown is best-effort.
    pub fn close_all(&mut self) {
        self.documents.clear();
    }

    pub fn open_count(&self) -> usize {
        self.documents.len()
    }
}

fn cache_key(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// An explicit pool holding at most one session. `acquire` hands the
/// session out as a guard that returns it on drop, on every exit path.
#[derive(Debug, Default)]
pub struct SessionPool {
    slot: Option<Session>,
}

impl SessionPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the pooled session, creating it lazily on first use.
    pub fn acquire(&mut self) -> SessionGuard<'_> {
        let session = self.slot.take().unwrap_or_default();
        SessionGuard {
            pool: self,
            session,
        }
    }

    /// Tear the pooled session down, closing all of its documents.
    pub fn shutdown(&mut self) {
        if let Some(mut session) = self.slot.take() {
            session.close_all();
        }
    }
}

/// Scoped handle to the pooled session.
pub struct SessionGuard<'a> {
    pool: &'a mut SessionPool,
    session: Session,
}

impl Deref for SessionGuard<'_> {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.session
    }
}

impl DerefMut for SessionGuard<'_> {
    fn deref_mut(&mut self) -> &mut Session {
        &mut self.session
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.pool.slot = Some(std::mem::take(&mut self.session));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::excel::document::CellValue;
    use tempfile::TempDir;

    #[test]
    fn test_open_caches_documents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cached.xlsx");

        let mut session = Session::new();
        session.save_document(&path, Document::new()).unwrap();
        assert_eq!(session.open_count(), 1);

        session.open(&path).unwrap();
        session.open(&path).unwrap();
        assert_eq!(session.open_count(), 1);
    }

    #[test]
    fn test_stale_cache_entry_is_reloaded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stale.xlsx");

        let mut session = Session::new();
        session.save_document(&path, Document::new()).unwrap();
        session.open(&path).unwrap();

        // Replace the file behind the session's back.
        let mut replacement = Document::new();
        replacement.add_sheet("FromDisk").unwrap();
        write_document(&replacement, &path).unwrap();
        filetime_bump(&path);

        let document = session.open(&path).unwrap();
        assert!(document.has_sheet("FromDisk"));
    }

    #[test]
    fn test_in_memory_changes_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sticky.xlsx");

        let mut session = Session::new();
        session.save_document(&path, Document::new()).unwrap();

        {
            let document = session.open(&path).unwrap();
            let sheet = document.sheet_mut("Sheet1").unwrap();
            sheet.set_value(0, 0, CellValue::Text("pending".to_string()));
        }

        // Unsaved mutation is still there because the file is unchanged.
        let document = session.open(&path).unwrap();
        assert_eq!(
            document.sheet("Sheet1").unwrap().value(0, 0),
            Some(&CellValue::Text("pending".to_string()))
        );
    }

    #[test]
    fn test_save_requires_open_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("unopened.xlsx");

        let mut session = Session::new();
        assert!(matches!(
            session.save(&path),
            Err(LabbookError::Persistence(_))
        ));
    }

    #[test]
    fn test_close_all_empties_the_cache() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("teardown.xlsx");

        let mut session = Session::new();
        session.save_document(&path, Document::new()).unwrap();
        session.close_all();
        assert_eq!(session.open_count(), 0);
    }

    #[test]
    fn test_pool_reuses_one_session() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pooled.xlsx");

        let mut pool = SessionPool::new();
        {
            let mut session = pool.acquire();
            session.save_document(&path, Document::new()).unwrap();
            assert_eq!(session.open_count(), 1);
        }
        {
            // Same session comes back with its cache intact.
            let session = pool.acquire();
            assert_eq!(session.open_count(), 1);
        }
        pool.shutdown();
        let session = pool.acquire();
        assert_eq!(session.open_count(), 0);
    }

    // Ensure a strictly newer mtime even on coarse-grained filesystems.
    fn filetime_bump(path: &Path) {
        use std::time::Duration;
        let future = SystemTime::now() + Duration::from_secs(5);
        let file = std::fs::File::options().append(true).open(path).unwrap();
        file.set_modified(future).unwrap();
    }
}
