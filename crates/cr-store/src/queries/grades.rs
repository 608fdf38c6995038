//! Grade list operations.

use std::path::Path;

use cr_core::{Error, Result};

use crate::collection::JsonCollection;

/// File name of the grade list inside the data directory.
pub const GRADES_FILE: &str = "grades.json";

/// The editable list of grades videos may be tagged with.
#[derive(Debug, Clone)]
pub struct GradeStore {
    collection: JsonCollection<String>,
    defaults: Vec<String>,
}

fn sanitize(grades: &[String]) -> Vec<String> {
    grades
        .iter()
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty())
        .collect()
}

impl GradeStore {
    /// Open the grade list, seeding the file with `defaults` when missing.
    pub fn open(data_dir: &Path, defaults: Vec<String>) -> Self {
        Self {
            collection: JsonCollection::with_seed(data_dir.join(GRADES_FILE), defaults.clone()),
            defaults,
        }
    }

    pub fn defaults(&self) -> &[String] {
        &self.defaults
    }

    /// Read the current grades.
    ///
    /// An empty or unparsable file yields the defaults; I/O failures are
    /// returned to the caller.
    pub fn read(&self) -> Result<Vec<String>> {
        match self.collection.read_all() {
            Ok(grades) => {
                let grades = sanitize(&grades);
                if grades.is_empty() {
                    Ok(self.defaults.clone())
                } else {
                    Ok(grades)
                }
            }
            Err(Error::Store { source }) => {
                tracing::warn!("Grade list unreadable, using defaults: {source}");
                Ok(self.defaults.clone())
            }
            Err(e) => Err(e),
        }
    }

    /// Replace the grade list. Blank entries are dropped; an empty result is
    /// rejected.
    pub fn write(&self, grades: &[String]) -> Result<Vec<String>> {
        let sanitized = sanitize(grades);
        if sanitized.is_empty() {
            return Err(Error::Validation("grade list must not be empty".into()));
        }
        self.collection.write_all(&sanitized)?;
        Ok(sanitized)
    }
}
