//! TOML mapping file reader/writer.
//!
//! The mapping file format (order is significant):
//!
//! ```toml
//! [[mapping]]
//! prefix = "/content/mercer/us"
//! target = "https://www.mercer.com/us"
//!
//! [[mapping]]
//! prefix = "/content/mercer/ca"
//! target = "https://www.mercer.ca"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::MappingSource;
use crate::errors::MappingError;
use crate::models::MappingEntry;

/// Wrapper around the TOML mapping file structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MappingFileData {
    #[serde(default)]
    pub mapping: Vec<MappingEntry>,
}

/// A mapping list stored on disk; re-read on every [`MappingSource::load`].
#[derive(Debug, Clone)]
pub struct MappingFile {
    path: PathBuf,
}

impl MappingFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the mapping file from disk.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Vec<MappingEntry>, MappingError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading purge mapping file");

        if !path.exists() {
            return Err(MappingError::MappingFileError {
                path: path.display().to_string(),
                detail: "file not found".into(),
            });
        }

        let contents = std::fs::read_to_string(path)?;
        let data: MappingFileData =
            toml::from_str(&contents).map_err(|e| MappingError::ParseError(e.to_string()))?;

        debug!(count = data.mapping.len(), "loaded purge mappings");
        Ok(data.mapping)
    }

    /// Save the mapping list back to disk in TOML format.
    pub fn save<P: AsRef<Path>>(path: P, entries: &[MappingEntry]) -> Result<(), MappingError> {
        let path = path.as_ref();
        info!(path = %path.display(), "saving purge mapping file");

        let data = MappingFileData {
            mapping: entries.to_vec(),
        };
        let toml_str =
            toml::to_string_pretty(&data).map_err(|e| MappingError::ParseError(e.to_string()))?;
        std::fs::write(path, toml_str)?;

        debug!(count = entries.len(), "saved purge mappings");
        Ok(())
    }
}

impl MappingSource for MappingFile {
    fn load(&self) -> Result<Vec<MappingEntry>, MappingError> {
        Self::read(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_mapping_file_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mappings.toml");

        let content = r#"
[[mapping]]
prefix = "/content/mercer/us"
target = "https://www.mercer.com/us"

[[mapping]]
prefix = "/content/mercer/ca"
target = "https://www.mercer.ca"
"#;
        std::fs::write(&path, content).unwrap();

        let entries = MappingFile::new(&path).load().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].prefix, "/content/mercer/us");
        assert_eq!(entries[1].target, "https://www.mercer.ca");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mappings.toml");

        let entries = vec![MappingEntry::new("/content/mercer/uk", "https://uk.mercer.com")];
        MappingFile::save(&path, &entries).unwrap();

        let reloaded = MappingFile::read(&path).unwrap();
        assert_eq!(reloaded, entries);
    }

    #[test]
    fn test_load_nonexistent() {
        let result = MappingFile::read("/nonexistent/mappings.toml");
        assert!(matches!(result, Err(MappingError::MappingFileError { .. })));
    }

    #[test]
    fn test_load_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.toml");
        std::fs::write(&path, "").unwrap();

        assert!(MappingFile::read(&path).unwrap().is_empty());
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[[mapping]]\nprefix = 3\n").unwrap();

        assert!(matches!(
            MappingFile::read(&path),
            Err(MappingError::ParseError(_))
        ));
    }
}
