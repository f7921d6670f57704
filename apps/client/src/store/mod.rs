//! Result Session Store — persists the latest parse and produces the canonical JSON export.
//!
//! Storage is a recovery aid, not the system of record: the interactive flow works from
//! the in-memory result and never reads the record back.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use tracing::{debug, error, info};

use crate::errors::AppError;
use crate::models::{ExtractionResult, PersistedRecord, Schema};

/// The one key the last result is stored under.
pub const LAST_RESULT_KEY: &str = "resumeParser_lastResult";

/// Minimal durable key-value storage.
pub trait KeyValueStore: Send + Sync {
    fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;
}

/// One file per key inside a directory. Writes go through a temp file and a rename,
/// so a reader never sees a half-written record.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        std::fs::create_dir_all(&self.dir)?;
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.persist(self.path_for(key)).map_err(|e| e.error)?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

pub struct ResultStore {
    storage: Box<dyn KeyValueStore>,
}

impl ResultStore {
    pub fn new(storage: impl KeyValueStore + 'static) -> Self {
        Self {
            storage: Box::new(storage),
        }
    }

    /// Hook for a successful parse: overwrites the stored record.
    /// Fire-and-forget; a storage failure is logged and reported as `false`.
    pub fn on_new_result(&self, session_id: &str, data: &ExtractionResult, schema: &Schema) -> bool {
        let record = PersistedRecord {
            saved_at: Utc::now(),
            schema_label: schema.label.clone(),
            session_id: session_id.to_string(),
            data: data.clone(),
        };

        let outcome = serde_json::to_string(&record)
            .map_err(AppError::from)
            .and_then(|json| self.storage.set(LAST_RESULT_KEY, &json));

        match outcome {
            Ok(()) => {
                debug!("Saved last result for session {session_id}");
                true
            }
            Err(e) => {
                error!("Could not persist last result: {e}");
                false
            }
        }
    }

    pub fn last(&self) -> Result<Option<PersistedRecord>, AppError> {
        match self.storage.get(LAST_RESULT_KEY)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}

/// Canonical export bytes: UTF-8, 2-space indented. Used for both copy and download.
pub fn export_json(value: &ExtractionResult) -> Result<Vec<u8>, AppError> {
    Ok(serde_json::to_vec_pretty(value)?)
}

pub fn export_file_name(schema_id: &str, at: DateTime<Utc>) -> String {
    format!("resume_{}_{}.json", schema_id, at.timestamp_millis())
}

/// Writes the export into `dir` and returns the file path.
pub fn download(dir: &Path, schema_id: &str, value: &ExtractionResult) -> Result<PathBuf, AppError> {
    let bytes = export_json(value)?;
    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(schema_id, Utc::now()));
    std::fs::write(&path, bytes)?;
    info!("Exported result to {}", path.display());
    Ok(path)
}
