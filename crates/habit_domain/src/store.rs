use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::habit::Habit;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{} does not contain a list of habits", path.display())]
    Format { path: PathBuf },
}

/// JSON document holding the whole habit collection.
#[derive(Debug, Clone)]
pub struct HabitStore {
    path: PathBuf,
}

impl HabitStore {
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty collection.
    pub fn load(&self) -> Result<Vec<Habit>, StoreError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no habit document yet");
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path).map_err(|source| self.io(source))?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        let value: serde_json::Value =
            serde_json::from_str(&raw).map_err(|source| self.json(source))?;
        if !value.is_array() {
            return Err(StoreError::Format {
                path: self.path.clone(),
            });
        }
        let habits: Vec<Habit> = serde_json::from_value(value).map_err(|source| self.json(source))?;
        debug!(path = %self.path.display(), count = habits.len(), "loaded habits");
        Ok(habits)
    }

    /// Replaces the document through a temporary sibling and an atomic rename.
    pub fn save(&self, habits: &[Habit]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| self.io(source))?;
            }
        }

        let mut sorted: Vec<&Habit> = habits.iter().collect();
        sorted.sort_by_key(|habit| habit.id);
        let mut payload = serde_json::to_string_pretty(&sorted).map_err(|source| self.json(source))?;
        payload.push('\n');

        let temp = self.temp_path();
        let write = || -> std::io::Result<()> {
            let mut file = File::create(&temp)?;
            file.write_all(payload.as_bytes())?;
            file.sync_all()?;
            fs::rename(&temp, &self.path)
        };
        if let Err(source) = write() {
            let _ = fs::remove_file(&temp);
            return Err(self.io(source));
        }
        debug!(path = %self.path.display(), count = habits.len(), "saved habits");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn json(&self, source: serde_json::Error) -> StoreError {
        StoreError::Json {
            path: self.path.clone(),
            source,
        }
    }
}
