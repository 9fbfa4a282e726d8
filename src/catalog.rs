//! Listing the tables a folder offers.

use std::fs;
use std::path::{Path, PathBuf};

use bytesize::ByteSize;
use serde::Serialize;
use thiserror::Error;

use crate::source::SourceFormat;

/// Errors from directory listing.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The path does not exist.
    #[error("Folder not found: {0}")]
    DirectoryNotFound(PathBuf),

    /// The path exists but is not a directory.
    #[error("Not a folder: {0}")]
    NotADirectory(PathBuf),

    /// The directory holds no XLS, XLSX or DBF files.
    #[error("No XLS, XLSX or DBF files in {0}")]
    NoSupportedFiles(PathBuf),

    /// The directory could not be read.
    #[error("Failed to read folder {path}: {source}")]
    Io {
        /// Directory being listed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// A supported table found in a directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    /// Full path
    pub path: PathBuf,
    /// File name as shown in menus
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Detected format
    pub format: SourceFormat,
}

impl SourceFile {
    /// Human-readable size, e.g. `"1.5 KiB"`.
    #[must_use]
    pub fn size_display(&self) -> String {
        ByteSize::b(self.size).to_string()
    }
}

/// List the supported tables directly inside `dir`, sorted by name
/// ignoring case. Subdirectories are not searched.
///
/// # Errors
///
/// Returns `CatalogError` if `dir` is missing, not a directory, unreadable,
/// or contains no supported file.
pub fn list_supported_files(dir: &Path) -> Result<Vec<SourceFile>, CatalogError> {
    if !dir.exists() {
        return Err(CatalogError::DirectoryNotFound(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(CatalogError::NotADirectory(dir.to_path_buf()));
    }

    let io_err = |source| CatalogError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        let Some(format) = SourceFormat::from_path(&path) else {
            continue;
        };
        let metadata = match entry.metadata() {
            Ok(m) if m.is_file() => m,
            Ok(_) => continue,
            Err(e) => {
                log::debug!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };
        files.push(SourceFile {
            name: entry.file_name().to_string_lossy().into_owned(),
            path,
            size: metadata.len(),
            format,
        });
    }

    if files.is_empty() {
        return Err(CatalogError::NoSupportedFiles(dir.to_path_buf()));
    }

    files.sort_by_cached_key(|f| (f.name.to_lowercase(), f.name.clone()));
    log::debug!("Found {} tables in {}", files.len(), dir.display());
    Ok(files)
}
