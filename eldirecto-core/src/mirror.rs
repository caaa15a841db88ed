//! The durable mirror: a local, advisory copy of the whole content cache.
//!
//! The mirror is one JSON file with a fixed name. It is read once at cold
//! start and overwritten after every successful load or write. It has no
//! authority; the gateway does.
//!
//! It keeps the confirmed copy apart from the working copy, so edits the
//! gateway never acknowledged stay unsaved after a restart.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::ContentSnapshot;

const MIRROR_FILE: &str = "content-cache.json";

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("mirror I/O failed at {0}: {1}")]
    Io(PathBuf, #[source] io::Error),

    #[error("mirror at {0} is not a valid snapshot: {1}")]
    Corrupt(PathBuf, #[source] serde_json::Error),
}

/// What the mirror holds: the gateway-acknowledged content and the edits
/// made on top of it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MirroredCache {
    pub confirmed: ContentSnapshot,
    pub working: ContentSnapshot,
}

/// File-backed mirror of a [`MirroredCache`].
#[derive(Debug, Clone)]
pub struct DurableMirror {
    data_dir: PathBuf,
}

impl DurableMirror {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path(&self) -> PathBuf {
        self.data_dir.join(MIRROR_FILE)
    }

    pub fn exists(&self) -> bool {
        self.path().exists()
    }

    /// Reads the last-known cache. `Ok(None)` when nothing was saved yet.
    pub fn load(&self) -> Result<Option<MirroredCache>, MirrorError> {
        let path = self.path();
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(MirrorError::Io(path, e)),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| MirrorError::Corrupt(path, e))
    }

    /// Overwrites the mirror with `cache`.
    ///
    /// Writes to a temporary file first so a crash never leaves a truncated
    /// mirror behind.
    pub fn save(&self, cache: &MirroredCache) -> Result<(), MirrorError> {
        fs::create_dir_all(&self.data_dir).map_err(|e| MirrorError::Io(self.data_dir.clone(), e))?;

        let path = self.path();
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec(cache).map_err(|e| MirrorError::Corrupt(path.clone(), e))?;
        fs::write(&tmp, bytes).map_err(|e| MirrorError::Io(tmp.clone(), e))?;
        fs::rename(&tmp, &path).map_err(|e| MirrorError::Io(path, e))
    }
}
