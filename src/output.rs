//! Rendered files and writing them to disk
//!
//! Files are staged as temporary files in the target directory and only
//! moved into place once every one of them was written, so a failure while
//! staging leaves the directory untouched.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

/// Errors that can occur while writing generated files
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("cannot create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot move {path} into place: {source}")]
    Persist {
        path: PathBuf,
        source: tempfile::PersistError,
    },
}

/// One rendered file
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedFile {
    pub name: String,
    pub contents: String,
}

/// All files rendered for one request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedFiles {
    files: Vec<GeneratedFile>,
}

impl GeneratedFiles {
    pub fn new(files: Vec<GeneratedFile>) -> Self {
        Self { files }
    }

    /// Get a file by name
    pub fn get(&self, name: &str) -> Option<&GeneratedFile> {
        self.files.iter().find(|f| f.name == name)
    }

    /// Contents of a file by name
    pub fn contents(&self, name: &str) -> Option<&str> {
        self.get(name).map(|f| f.contents.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeneratedFile> {
        self.files.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Write every file into `dir`, creating it if needed
    ///
    /// Returns the final paths in file order.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>, WriteError> {
        std::fs::create_dir_all(dir).map_err(|source| WriteError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;

        // Stage everything first; dropped temp files are deleted
        let mut staged = Vec::with_capacity(self.files.len());
        for file in &self.files {
            let path = dir.join(&file.name);
            let mut tmp = NamedTempFile::new_in(dir).map_err(|source| WriteError::Write {
                path: path.clone(),
                source,
            })?;
            tmp.write_all(file.contents.as_bytes())
                .and_then(|_| tmp.flush())
                .map_err(|source| WriteError::Write {
                    path: path.clone(),
                    source,
                })?;
            tracing::debug!(path = %path.display(), bytes = file.contents.len(), "staged");
            staged.push((tmp, path));
        }

        let mut written = Vec::with_capacity(staged.len());
        for (tmp, path) in staged {
            tmp.persist(&path).map_err(|source| WriteError::Persist {
                path: path.clone(),
                source,
            })?;
            tracing::info!(path = %path.display(), "wrote");
            written.push(path);
        }
        Ok(written)
    }
}

impl IntoIterator for GeneratedFiles {
    type Item = GeneratedFile;
    type IntoIter = std::vec::IntoIter<GeneratedFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_iter()
    }
}
