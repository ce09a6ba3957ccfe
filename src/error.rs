// Every failure the sequencer can hit. None of these ever escape the component
// that produced them: the controller turns them into a log line or a notice.

use std::path::PathBuf;

use crate::audio_api::UnitId;

/// Failure talking to a listing source (directory listing or file fetch).
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("listing is not valid JSON: {0}")]
    Listing(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The root listing could not be read at all.
    #[error("sound catalog unavailable: {0}")]
    Unavailable(#[source] SourceError),

    /// A single folder failed to list; the rest of the catalog is still usable.
    #[error("failed to list folder '{folder}': {source}")]
    FolderList {
        folder: String,
        source: SourceError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to fetch '{name}': {source}")]
    Fetch {
        name: String,
        source: SourceError,
    },

    #[error("failed to decode audio '{name}': {source}")]
    AudioDecode {
        name: String,
        source: anyhow::Error,
    },
}

impl LoadError {
    pub fn sound_name(&self) -> &str {
        match self {
            LoadError::Fetch { name, .. } | LoadError::AudioDecode { name, .. } => name,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to write snapshot to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read snapshot from {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("snapshot is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Reported back from the audio thread when a command can't be carried out.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum PlaybackError {
    #[error("no playable unit {0:?}")]
    UnknownUnit(UnitId),

    #[error("unit {0:?} has nothing to play")]
    NotLoaded(UnitId),
}
