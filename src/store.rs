use crate::errors::{AppError, AppResult};
use crate::models::ServiceRequest;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of reading the persisted record set, keeping "nothing saved yet"
/// apart from "saved but unreadable".
#[derive(Debug)]
pub enum LoadOutcome {
    Missing,
    Loaded(Vec<ServiceRequest>),
    Failed(AppError),
}

impl LoadOutcome {
    pub fn into_records(self) -> Vec<ServiceRequest> {
        match self {
            Self::Loaded(records) => records,
            Self::Missing | Self::Failed(_) => Vec::new(),
        }
    }
}

/// Whole-document JSON store: every read parses the full file, every write
/// replaces it. No locking; the last writer wins.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn try_load(&self) -> LoadOutcome {
        if !self.path.exists() {
            return LoadOutcome::Missing;
        }
        match read_records(&self.path) {
            Ok(records) => LoadOutcome::Loaded(records),
            Err(error) => LoadOutcome::Failed(error),
        }
    }

    /// Empty when the document is missing or unreadable; failures are logged.
    pub fn load(&self) -> Vec<ServiceRequest> {
        match self.try_load() {
            LoadOutcome::Failed(error) => {
                tracing::error!(path = %self.path.display(), error = %error, "failed to load requests");
                Vec::new()
            }
            outcome => outcome.into_records(),
        }
    }

    pub fn try_save(&self, records: &[ServiceRequest]) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|error| AppError::Io(error.to_string()))?;
        }
        let bytes = serde_json::to_vec_pretty(records)?;
        fs::write(&self.path, bytes).map_err(|error| AppError::Io(error.to_string()))
    }

    /// Overwrites the document; failures are logged and otherwise dropped.
    pub fn save(&self, records: &[ServiceRequest]) {
        if let Err(error) = self.try_save(records) {
            tracing::error!(
                path = %self.path.display(),
                count = records.len(),
                error = %error,
                "failed to save requests"
            );
        }
    }
}

fn read_records(path: &Path) -> AppResult<Vec<ServiceRequest>> {
    let bytes = fs::read(path).map_err(|error| AppError::Io(error.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|error| AppError::Io(format!("corrupt request file: {}", error)))
}
