// Model system stores - where a session writes its document on save

use crate::command::EditError;
use crate::project::serialization::{deserialize_from_ron, serialize_to_ron};
use crate::project::types::{DocumentVersion, ModelSystemDocument};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("File system error: {0}")]
    FileSystem(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unsupported document version {0}")]
    UnsupportedVersion(DocumentVersion),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PersistenceError> for EditError {
    fn from(error: PersistenceError) -> Self {
        EditError::Persistence(error.to_string())
    }
}

/// Destination for saved model systems
pub trait ModelSystemStore: Send {
    fn save(&mut self, document: &ModelSystemDocument) -> Result<(), PersistenceError>;
}

/// Stores a document as a single RON file
#[derive(Debug, Clone)]
pub struct RonFileStore {
    path: PathBuf,
}

impl RonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn load(&self) -> Result<ModelSystemDocument, PersistenceError> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            PersistenceError::FileSystem(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))
        })?;
        deserialize_from_ron(&text)
    }
}

impl ModelSystemStore for RonFileStore {
    fn save(&mut self, document: &ModelSystemDocument) -> Result<(), PersistenceError> {
        let mut document = document.clone();
        document.metadata.modified = Some(chrono::Utc::now().to_rfc3339());
        let text = serialize_to_ron(&document)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        // Write next to the target first so a failed write keeps the old file
        let staging = self.path.with_extension("ron.tmp");
        std::fs::write(&staging, text).map_err(|e| {
            PersistenceError::FileSystem(format!("Failed to write {}: {}", staging.display(), e))
        })?;
        std::fs::rename(&staging, &self.path)?;

        tracing::info!("Saved model system '{}' to {}", document.name, self.path.display());
        Ok(())
    }
}
