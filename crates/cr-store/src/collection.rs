//! Whole-file JSON collections.
//!
//! A [`JsonCollection`] is a single file holding a JSON array. Reads parse
//! the entire array; writes serialize into a sibling temp file and rename it
//! over the target, so readers see either the old or the new array. The file
//! (and its parent directory) is created with the seed contents on first
//! access.

use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use cr_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A flat JSON array persisted in one file.
#[derive(Debug, Clone)]
pub struct JsonCollection<T> {
    path: PathBuf,
    seed: Vec<T>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonCollection<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Open a collection that starts out empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::with_seed(path, Vec::new())
    }

    /// Open a collection whose file is initialised with `seed` when missing.
    pub fn with_seed(path: impl Into<PathBuf>, seed: Vec<T>) -> Self {
        Self {
            path: path.into(),
            seed,
            _marker: PhantomData,
        }
    }

    fn ensure_file(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        self.write_all(&self.seed)?;
        tracing::debug!("Initialised record file {}", self.path.display());
        Ok(())
    }

    /// Read every element of the collection.
    ///
    /// I/O failures surface as [`Error::Io`]; content that is not a JSON
    /// array of `T` surfaces as [`Error::Store`].
    pub fn read_all(&self) -> Result<Vec<T>> {
        self.ensure_file()?;
        let contents = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&contents).map_err(|e| {
            Error::store(format!(
                "unreadable record file {}: {e}",
                self.path.display()
            ))
        })
    }

    /// Replace the whole collection on disk.
    pub fn write_all(&self, items: &[T]) -> Result<()> {
        let json = serde_json::to_vec_pretty(items)
            .map_err(|e| Error::store(format!("failed to serialize records: {e}")))?;

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Read, mutate and rewrite the collection.
    ///
    /// The closure's error aborts the write. Nothing serialises concurrent
    /// callers, so two overlapping updates can lose one of them.
    pub fn update<R>(&self, f: impl FnOnce(&mut Vec<T>) -> Result<R>) -> Result<R> {
        let mut items = self.read_all()?;
        let out = f(&mut items)?;
        self.write_all(&items)?;
        Ok(out)
    }
}
