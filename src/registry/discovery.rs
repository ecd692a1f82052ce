//! Conventional directory enumeration.
//!
//! # Responsibilities
//! - List the loadable files of a conventional directory
//! - Derive a registry name from a file name
//!
//! # Design Decisions
//! - Hidden files (leading `.`) are skipped
//! - A missing directory is "no entries", every other IO error propagates
//! - Entries are sorted by file name so load order is deterministic

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::BootstrapError;

/// List non-hidden regular files in `dir`, optionally filtered by suffix.
pub fn scan_dir(dir: &Path, suffix: Option<&str>) -> Result<Vec<PathBuf>, BootstrapError> {
    let scan_error = |source| BootstrapError::Scan {
        path: dir.to_path_buf(),
        source,
    };

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(dir = %dir.display(), "Directory missing, nothing to load");
            return Ok(Vec::new());
        }
        Err(e) => return Err(scan_error(e)),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(scan_error)?;
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };

        if file_name.starts_with('.') {
            continue;
        }
        if suffix.is_some_and(|suffix| !file_name.ends_with(suffix)) {
            continue;
        }
        if !entry.file_type().map_err(scan_error)?.is_file() {
            continue;
        }

        files.push(entry.path());
    }

    files.sort();
    Ok(files)
}

/// Registry name for a file: its name up to the first `.`.
pub fn module_name(path: &Path) -> Option<&str> {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.split('.').next())
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_dir_is_empty() {
        let dir = std::env::temp_dir().join(format!("mentat-missing-{}", uuid::Uuid::new_v4()));
        assert!(scan_dir(&dir, None).unwrap().is_empty());
    }

    #[test]
    fn test_skips_hidden_and_filters_suffix() {
        let dir = std::env::temp_dir().join(format!("mentat-scan-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(dir.join("nested.toml")).unwrap();
        fs::write(dir.join("b.handler.toml"), "").unwrap();
        fs::write(dir.join("a.handler.toml"), "").unwrap();
        fs::write(dir.join(".hidden.toml"), "").unwrap();
        fs::write(dir.join("notes.md"), "").unwrap();

        let files = scan_dir(&dir, Some(".toml")).unwrap();
        let names: Vec<_> = files.iter().filter_map(|p| module_name(p)).collect();
        assert_eq!(names, vec!["a", "b"]);

        let all = scan_dir(&dir, None).unwrap();
        assert_eq!(all.len(), 3);

        fs::remove_dir_all(dir).unwrap_or_default();
    }

    #[test]
    fn test_module_name() {
        assert_eq!(module_name(Path::new("/x/BasicHTTP.handler.toml")), Some("BasicHTTP"));
        assert_eq!(module_name(Path::new("plain")), Some("plain"));
        assert_eq!(module_name(Path::new(".hidden")), None);
    }
}
