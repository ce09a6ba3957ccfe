// Saves the project as one JSON document and reads back the settings that
// are restored on startup (tempo and metronome).
//
// Channels and patterns are written out in full but are not read back yet:
// a restored session starts with an empty rack.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::shared::NUM_STEPS;

use super::channels::ChannelStore;
use super::project::{ChannelKind, ChannelSource, MetronomeState, Pattern, PatternBank};
use super::transport::{clamp_bpm, Transport};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub kind: ChannelKind,
    pub muted: bool,
    pub volume: f32,
    pub steps: [bool; NUM_STEPS],
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: u32,
    pub timestamp: u64, // unix millis
    pub bpm: u32,
    pub current_pattern: usize,
    pub channels: Vec<ChannelRecord>,
    pub patterns: Vec<Pattern>,
    pub metronome: MetronomeState,
}

impl Snapshot {
    pub fn capture(
        transport: &Transport,
        channels: &ChannelStore,
        patterns: &PatternBank,
        metronome: &MetronomeState,
    ) -> Self {
        let channels = channels
            .iter()
            .map(|c| {
                let (path, source_url) = match &c.source {
                    ChannelSource::Sample { path, source_url } => {
                        (Some(path.clone()), Some(source_url.clone()))
                    }
                    ChannelSource::Synth { .. } => (None, None),
                };
                ChannelRecord {
                    name: c.name.clone(),
                    path,
                    source_url,
                    kind: c.kind(),
                    muted: c.muted,
                    volume: c.volume,
                    steps: c.steps,
                }
            })
            .collect();

        Self {
            version: SNAPSHOT_VERSION,
            timestamp: unix_millis(),
            bpm: transport.bpm(),
            current_pattern: patterns.current(),
            channels,
            patterns: patterns.patterns().to_vec(),
            metronome: *metronome,
        }
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// The part of a snapshot that restore looks at. Anything else in the file,
// including fields from other versions, is ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StoredSettings {
    bpm: Option<u32>,
    metronome: Option<MetronomeState>,
}

/// Whatever a previous session left behind. `None` means use the default.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RestoredState {
    pub bpm: Option<u32>,
    pub metronome: Option<MetronomeState>,
}

impl From<StoredSettings> for RestoredState {
    fn from(stored: StoredSettings) -> Self {
        Self {
            // 0 is what an unset tempo looks like, not a real one
            bpm: stored.bpm.filter(|&b| b > 0).map(clamp_bpm),
            metronome: stored.metronome.map(|m| MetronomeState {
                enabled: m.enabled,
                volume: m.volume.clamp(0.0, 1.0),
            }),
        }
    }
}

/// One file on disk, overwritten on every save.
#[derive(Clone, Debug)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, snapshot: &Snapshot) -> Result<(), StorageError> {
        let write_err = |source| StorageError::Write { path: self.path.clone(), source };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(snapshot)?;
        std::fs::write(&self.path, json).map_err(write_err)
    }

    /// `Ok(None)` when nothing has been saved yet.
    pub fn read(&self) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read { path: self.path.clone(), source }),
        }
    }
}

/// Snapshot writer plus the autosave timer. Storage trouble is logged here
/// and never reaches the caller as an error.
pub struct Persister {
    store: SnapshotStore,
    autosave_every: Duration,
    since_autosave: Duration,
}

impl Persister {
    pub fn new(store: SnapshotStore, autosave_every: Duration) -> Self {
        Self {
            store,
            autosave_every,
            since_autosave: Duration::ZERO,
        }
    }

    #[cfg(test)]
    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Write the current state. Returns whether the write landed.
    pub fn snapshot(
        &self,
        transport: &Transport,
        channels: &ChannelStore,
        patterns: &PatternBank,
        metronome: &MetronomeState,
    ) -> bool {
        let snapshot = Snapshot::capture(transport, channels, patterns, metronome);
        match self.store.write(&snapshot) {
            Ok(()) => {
                log::trace!(target: "storage", "snapshot written to {}", self.store.path().display());
                true
            }
            Err(e) => {
                log::warn!(target: "storage", "{e}");
                false
            }
        }
    }

    pub fn restore(&self) -> RestoredState {
        match self.read_settings() {
            Ok(Some(stored)) => stored.into(),
            Ok(None) => {
                log::debug!(target: "storage", "no snapshot at {}", self.store.path().display());
                RestoredState::default()
            }
            Err(e) => {
                log::warn!(target: "storage", "{e}; starting from defaults");
                RestoredState::default()
            }
        }
    }

    fn read_settings(&self) -> Result<Option<StoredSettings>, StorageError> {
        let Some(data) = self.store.read()? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&data)?))
    }

    /// Feed wall time; true once per autosave period.
    pub fn autosave_due(&mut self, elapsed: Duration) -> bool {
        if self.autosave_every.is_zero() {
            return false;
        }
        self.since_autosave += elapsed;
        if self.since_autosave >= self.autosave_every {
            self.since_autosave = Duration::ZERO;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::next_unit_id;
    use crate::catalog::SoundDescriptor;

    fn persister_in(dir: &Path) -> Persister {
        let store = SnapshotStore::new(dir.join("lapseq").join("project.json"));
        Persister::new(store, Duration::from_secs(30))
    }

    fn kick() -> SoundDescriptor {
        SoundDescriptor {
            key: "KICK/kick1.wav".to_string(),
            name: "kick1.wav".to_string(),
            folder: "KICK".to_string(),
            url: "/sounds/KICK/kick1.wav".to_string(),
            size: 1234,
        }
    }

    #[test]
    fn tempo_and_metronome_survive_a_restart() {
        let dir = tempfile::tempdir().unwrap();
        let persister = persister_in(dir.path());
        let metronome = MetronomeState { enabled: true, volume: 0.3 };

        assert!(persister.snapshot(
            &Transport::new(96),
            &ChannelStore::default(),
            &PatternBank::default(),
            &metronome,
        ));

        let restored = persister_in(dir.path()).restore();
        assert_eq!(restored.bpm, Some(96));
        assert_eq!(restored.metronome, Some(metronome));
    }

    #[test]
    fn channels_are_saved_but_not_restored() {
        let dir = tempfile::tempdir().unwrap();
        let persister = persister_in(dir.path());
        let mut channels = ChannelStore::default();
        let id = channels.add_sample_channel(&kick(), next_unit_id());
        channels.toggle_step(id, 4);
        channels.add_synth_channel(next_unit_id());

        persister.snapshot(
            &Transport::default(),
            &channels,
            &PatternBank::default(),
            &MetronomeState::default(),
        );

        let json = persister.store().read().unwrap().unwrap();
        let saved: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(saved.version, SNAPSHOT_VERSION);
        assert_eq!(saved.channels.len(), 2);
        assert_eq!(saved.channels[0].path.as_deref(), Some("KICK/kick1.wav"));
        assert!(saved.channels[0].steps[4]);
        assert_eq!(saved.channels[1].kind, ChannelKind::Synth);
        assert_eq!(saved.patterns.len(), 4);

        // restore hands back settings only; there is nowhere to put channels
        let restored = persister.restore();
        assert_eq!(
            restored,
            RestoredState {
                bpm: Some(saved.bpm),
                metronome: Some(MetronomeState::default()),
            }
        );
    }

    #[test]
    fn snapshot_uses_camel_case_keys() {
        let dir = tempfile::tempdir().unwrap();
        let persister = persister_in(dir.path());
        let mut channels = ChannelStore::default();
        channels.add_sample_channel(&kick(), next_unit_id());
        persister.snapshot(
            &Transport::default(),
            &channels,
            &PatternBank::default(),
            &MetronomeState::default(),
        );

        let json = persister.store().read().unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.get("currentPattern").is_some());
        assert!(value.get("timestamp").is_some());
        assert_eq!(value["channels"][0]["sourceUrl"], "/sounds/KICK/kick1.wav");
        assert_eq!(value["channels"][0]["kind"], "sample");
    }

    #[test]
    fn nothing_saved_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(persister_in(dir.path()).restore(), RestoredState::default());
    }

    #[test]
    fn corrupt_snapshot_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let persister = persister_in(dir.path());
        std::fs::create_dir_all(dir.path().join("lapseq")).unwrap();
        std::fs::write(persister.store().path(), "{ not json").unwrap();
        assert_eq!(persister.restore(), RestoredState::default());
    }

    #[test]
    fn missing_fields_default_silently() {
        let dir = tempfile::tempdir().unwrap();
        let persister = persister_in(dir.path());
        std::fs::create_dir_all(dir.path().join("lapseq")).unwrap();
        std::fs::write(persister.store().path(), r#"{"version": 7, "bpm": 100, "metronome": {"enabled": true}}"#)
            .unwrap();

        let restored = persister.restore();
        assert_eq!(restored.bpm, Some(100));
        assert_eq!(restored.metronome, Some(MetronomeState { enabled: true, volume: 0.5 }));
    }

    #[test]
    fn out_of_range_values_are_tamed() {
        let dir = tempfile::tempdir().unwrap();
        let persister = persister_in(dir.path());
        std::fs::create_dir_all(dir.path().join("lapseq")).unwrap();

        std::fs::write(persister.store().path(), r#"{"bpm": 0, "metronome": {"enabled": false, "volume": 3.0}}"#)
            .unwrap();
        let restored = persister.restore();
        assert_eq!(restored.bpm, None);
        assert_eq!(restored.metronome.unwrap().volume, 1.0);

        std::fs::write(persister.store().path(), r#"{"bpm": 999}"#).unwrap();
        assert_eq!(persister.restore().bpm, Some(200));
    }

    #[test]
    fn failed_write_is_contained() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, b"").unwrap();
        let persister = Persister::new(
            SnapshotStore::new(blocker.join("project.json")),
            Duration::from_secs(30),
        );

        let ok = persister.snapshot(
            &Transport::default(),
            &ChannelStore::default(),
            &PatternBank::default(),
            &MetronomeState::default(),
        );
        assert!(!ok);
        assert_eq!(persister.restore(), RestoredState::default());
    }

    #[test]
    fn autosave_fires_every_period() {
        let dir = tempfile::tempdir().unwrap();
        let mut persister = persister_in(dir.path());
        assert!(!persister.autosave_due(Duration::from_secs(29)));
        assert!(persister.autosave_due(Duration::from_secs(1)));
        assert!(!persister.autosave_due(Duration::from_secs(10)));
        assert!(persister.autosave_due(Duration::from_secs(20)));
    }
}
