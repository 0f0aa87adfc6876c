//! JSON file catalog source.
//!
//! # Responsibility
//! - Read a catalog file fully into memory and parse it as one JSON array
//!   of entries.
//!
//! # Invariants
//! - No incremental parsing and no caching: every `load_entries` call
//!   re-reads the file.

use log::debug;
use std::path::{Path, PathBuf};
use std::time::Instant;

use super::{CatalogEntry, CatalogError, CatalogResult, CatalogSource};

/// Catalog source backed by a JSON file on disk.
///
/// The expected file shape is a top-level array of entry objects:
///
/// ```json
/// [
///   {
///     "project_id": "P1",
///     "doc_type": "SPEC",
///     "doc_id": "1",
///     "doc_title": "Root",
///     "linked_docs": [{"project_id": "P1", "doc_type": "SPEC", "doc_id": "2"}]
///   }
/// ]
/// ```
#[derive(Debug, Clone)]
pub struct JsonFileCatalog {
    path: PathBuf,
}

impl JsonFileCatalog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CatalogSource for JsonFileCatalog {
    fn load_entries(&self) -> CatalogResult<Vec<CatalogEntry>> {
        let started_at = Instant::now();
        let raw = std::fs::read_to_string(&self.path).map_err(|source| CatalogError::Io {
            path: self.path.clone(),
            source,
        })?;

        let entries: Vec<CatalogEntry> =
            serde_json::from_str(&raw).map_err(|err| CatalogError::Malformed {
                path: self.path.clone(),
                message: err.to_string(),
            })?;

        debug!(
            "event=catalog_load module=catalog status=ok entries={} duration_ms={}",
            entries.len(),
            started_at.elapsed().as_millis()
        );
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::{CatalogError, CatalogSource, JsonFileCatalog};
    use std::io::Write;

    #[test]
    fn load_entries_parses_entry_array() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"project_id":"P1","doc_type":"SPEC","doc_id":"1","doc_title":"Root",
                  "linked_docs":[{{"project_id":"P1","doc_type":"SPEC","doc_id":"2"}}]}},
                {{"project_id":"P1","doc_type":"SPEC","doc_id":"2"}}
            ]"#
        )
        .unwrap();

        let catalog = JsonFileCatalog::new(file.path());
        let entries = catalog.load_entries().unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].doc_title, "Root");
        assert_eq!(entries[0].linked_docs.len(), 1);
        assert_eq!(entries[0].linked_docs[0].identity().key(), "P1/SPEC/2");
        assert!(entries[1].doc_title.is_empty());
        assert!(entries[1].linked_docs.is_empty());
    }

    #[test]
    fn load_entries_reports_missing_file_as_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = JsonFileCatalog::new(dir.path().join("absent.json"));

        let err = catalog.load_entries().unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }

    #[test]
    fn load_entries_reports_invalid_json_as_malformed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();

        let catalog = JsonFileCatalog::new(file.path());
        let err = catalog.load_entries().unwrap_err();
        assert!(matches!(err, CatalogError::Malformed { .. }));
    }
}
