// Where sounds come from. The catalog only relies on the shape of a two-level
// listing (folders at the root, audio files inside each folder), so anything
// that can produce `ListingEntry`s and hand back bytes will do.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SourceError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
}

/// One row of a directory listing. Field names follow the common
/// `{name, type, size, download_url, url}` contents-API shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ListingEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub download_url: Option<String>, // files: where to fetch the bytes
    #[serde(default)]
    pub url: Option<String>, // folders: where to list the contents
}

pub trait ListingSource: Send {
    /// Human readable location, for logs.
    fn describe(&self) -> String;

    fn list_root(&self) -> Result<Vec<ListingEntry>, SourceError>;

    fn list_folder(&self, folder: &ListingEntry) -> Result<Vec<ListingEntry>, SourceError>;

    fn fetch(&self, url: &str) -> Result<Vec<u8>, SourceError>;
}

/// A sound library laid out on disk as `<root>/<folder>/<file>`.
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ListingSource for DirSource {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    fn list_root(&self) -> Result<Vec<ListingEntry>, SourceError> {
        list_dir(&self.root)
    }

    fn list_folder(&self, folder: &ListingEntry) -> Result<Vec<ListingEntry>, SourceError> {
        let path = match &folder.url {
            Some(url) => PathBuf::from(url),
            None => self.root.join(&folder.name),
        };
        list_dir(&path)
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        let path = Path::new(url);
        if !path.is_file() {
            return Err(SourceError::NotFound(url.to_string()));
        }
        Ok(std::fs::read(path)?)
    }
}

fn list_dir(dir: &Path) -> Result<Vec<ListingEntry>, SourceError> {
    let mut entries = Vec::new();
    for item in std::fs::read_dir(dir)? {
        let item = item?;
        let meta = item.metadata()?;
        let name = item.file_name().to_string_lossy().into_owned();
        let location = item.path().display().to_string();
        let entry = if meta.is_dir() {
            ListingEntry { name, kind: EntryKind::Dir, size: 0, download_url: None, url: Some(location) }
        } else {
            ListingEntry { name, kind: EntryKind::File, size: meta.len(), download_url: Some(location), url: None }
        };
        entries.push(entry);
    }
    // read_dir order is platform dependent
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}
