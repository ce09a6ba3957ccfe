// The sound catalog: every playable file the listing source knows about,
// keyed by "<folder>/<filename>".

use std::collections::BTreeMap;

use crate::error::CatalogError;

mod http;
mod source;

pub use http::HttpSource;
pub use source::{DirSource, EntryKind, ListingEntry, ListingSource};

const AUDIO_EXTENSIONS: [&str; 2] = ["wav", "mp3"];

#[derive(Clone, Debug, PartialEq)]
pub struct SoundDescriptor {
    pub key: String, // "<folder>/<filename>"
    pub name: String, // filename
    pub folder: String,
    pub url: String, // what the listing source fetches
    pub size: u64, // bytes
}

impl SoundDescriptor {
    /// Filename without its audio extension, as shown on a channel strip.
    pub fn display_name(&self) -> String {
        match self.extension() {
            Some(ext) if AUDIO_EXTENSIONS.contains(&ext.as_str()) => {
                self.name[..self.name.len() - ext.len() - 1].to_string()
            }
            _ => self.name.clone(),
        }
    }

    pub fn extension(&self) -> Option<String> {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
    }

    pub fn size_label(&self) -> String {
        format_file_size(self.size)
    }
}

/// "0 B", "512 B", "1.5 KB", "3 MB" ... one decimal, trailing ".0" dropped.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut scaled = bytes as f64;
    let mut exp = 0;
    while scaled >= 1024.0 && exp < UNITS.len() - 1 {
        scaled /= 1024.0;
        exp += 1;
    }
    let value = (scaled * 10.0).round() / 10.0;
    if value.fract() == 0.0 {
        format!("{} {}", value as u64, UNITS[exp])
    } else {
        format!("{:.1} {}", value, UNITS[exp])
    }
}

pub fn is_audio_file(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    AUDIO_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(&format!(".{ext}")))
}

#[derive(Clone, Debug, Default)]
pub struct Catalog {
    sounds: BTreeMap<String, SoundDescriptor>,
}

impl Catalog {
    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&SoundDescriptor> {
        self.sounds.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SoundDescriptor> {
        self.sounds.values()
    }

    /// Case-insensitive substring match on the filename. Empty term matches everything.
    pub fn search(&self, term: &str) -> Vec<&SoundDescriptor> {
        let term = term.trim().to_lowercase();
        self.iter()
            .filter(|s| term.is_empty() || s.name.to_lowercase().contains(&term))
            .collect()
    }

    fn insert(&mut self, sound: SoundDescriptor) {
        self.sounds.insert(sound.key.clone(), sound);
    }
}

/// Walk the two-level listing and collect every audio file.
///
/// A root listing failure means there is no catalog at all. A folder that
/// fails to list is logged and skipped; the rest still make it in.
pub fn list_sounds(source: &dyn ListingSource) -> Result<Catalog, CatalogError> {
    log::info!(target: "catalog", "scanning {}", source.describe());
    let root = source.list_root().map_err(CatalogError::Unavailable)?;

    let mut catalog = Catalog::default();
    for folder in root.iter().filter(|e| e.kind == EntryKind::Dir) {
        let files = match source.list_folder(folder) {
            Ok(files) => files,
            Err(e) => {
                let err = CatalogError::FolderList { folder: folder.name.clone(), source: e };
                log::warn!(target: "catalog", "{err}");
                continue;
            }
        };

        for file in files {
            if file.kind != EntryKind::File || !is_audio_file(&file.name) {
                continue;
            }
            let Some(url) = file.download_url else {
                log::debug!(target: "catalog", "{}/{} has no download location", folder.name, file.name);
                continue;
            };
            catalog.insert(SoundDescriptor {
                key: format!("{}/{}", folder.name, file.name),
                name: file.name,
                folder: folder.name.clone(),
                url,
                size: file.size,
            });
        }
    }

    log::info!(target: "catalog", "{} sounds found", catalog.len());
    Ok(catalog)
}
