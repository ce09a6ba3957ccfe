use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::shared::DEFAULT_BPM;
use crate::pipeline::transport::clamp_bpm;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    catalog: CatalogConfig,
    #[serde(default)]
    storage: StorageConfig,
    #[serde(default)]
    transport: TransportConfig,
    #[serde(default)]
    ui: UiConfig,
}

#[derive(Deserialize, Default)]
struct CatalogConfig {
    root: Option<PathBuf>,
    url: Option<String>,
}

#[derive(Deserialize, Default)]
struct StorageConfig {
    path: Option<PathBuf>,
    autosave_interval_secs: Option<u64>,
}

#[derive(Deserialize, Default)]
struct TransportConfig {
    bpm: Option<u32>,
}

#[derive(Deserialize, Default)]
struct UiConfig {
    frame_ms: Option<u64>,
}

/// Where the sound library lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogLocation {
    Local(PathBuf),
    Remote(String),
}

pub struct Config {
    file: ConfigFile,
}

impl Config {
    /// Embedded defaults, overlaid by the user's file if there is one.
    pub fn load() -> Self {
        let user = user_config_path().filter(|p| p.exists()).and_then(|path| {
            match std::fs::read_to_string(&path) {
                Ok(contents) => Some((path, contents)),
                Err(e) => {
                    log::warn!(target: "config", "could not read config {}: {}", path.display(), e);
                    None
                }
            }
        });
        match user {
            Some((path, contents)) => {
                log::info!(target: "config", "using {}", path.display());
                Self::from_sources(DEFAULT_CONFIG, Some(&contents))
            }
            None => Self::from_sources(DEFAULT_CONFIG, None),
        }
    }

    fn from_sources(defaults: &str, user: Option<&str>) -> Self {
        let mut base: ConfigFile = toml::from_str(defaults).unwrap_or_else(|e| {
            log::error!(target: "config", "embedded config is malformed: {e}");
            ConfigFile::default()
        });
        if let Some(contents) = user {
            match toml::from_str::<ConfigFile>(contents) {
                Ok(user) => merge(&mut base, user),
                Err(e) => log::warn!(target: "config", "ignoring malformed user config: {e}"),
            }
        }
        Self { file: base }
    }

    /// Sound library location. A CLI argument wins over the file: an
    /// http(s) URL is a remote listing, anything else a local folder. In
    /// the file, `url` wins over `root`.
    pub fn catalog_location(&self, cli_override: Option<String>) -> CatalogLocation {
        if let Some(arg) = cli_override {
            return if is_url(&arg) {
                CatalogLocation::Remote(arg)
            } else {
                CatalogLocation::Local(PathBuf::from(arg))
            };
        }
        if let Some(url) = self.file.catalog.url.clone().filter(|u| !u.is_empty()) {
            return CatalogLocation::Remote(url);
        }
        CatalogLocation::Local(self.file.catalog.root.clone().unwrap_or_else(|| PathBuf::from("sounds")))
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.file.storage.path.clone().unwrap_or_else(|| data_dir().join("project.json"))
    }

    /// Zero turns autosave off.
    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.file.storage.autosave_interval_secs.unwrap_or(30))
    }

    pub fn bpm(&self) -> u32 {
        clamp_bpm(self.file.transport.bpm.unwrap_or(DEFAULT_BPM))
    }

    pub fn frame_period(&self) -> Duration {
        Duration::from_millis(self.file.ui.frame_ms.unwrap_or(16).clamp(1, 1000))
    }
}

/// Log file, next to the default snapshot. Read before any config is loaded.
pub fn log_path() -> PathBuf {
    data_dir().join("lapseq.log")
}

fn data_dir() -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join("lapseq")
}

fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lapseq").join("config.toml"))
}

fn merge(base: &mut ConfigFile, user: ConfigFile) {
    if user.catalog.root.is_some() {
        base.catalog.root = user.catalog.root;
    }
    if user.catalog.url.is_some() {
        base.catalog.url = user.catalog.url;
    }
    if user.storage.path.is_some() {
        base.storage.path = user.storage.path;
    }
    if user.storage.autosave_interval_secs.is_some() {
        base.storage.autosave_interval_secs = user.storage.autosave_interval_secs;
    }
    if user.transport.bpm.is_some() {
        base.transport.bpm = user.transport.bpm;
    }
    if user.ui.frame_ms.is_some() {
        base.ui.frame_ms = user.ui.frame_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults() {
        let config = Config::from_sources(DEFAULT_CONFIG, None);
        assert_eq!(config.bpm(), 128);
        assert_eq!(config.autosave_interval(), Duration::from_secs(30));
        assert_eq!(config.frame_period(), Duration::from_millis(16));
        assert_eq!(config.catalog_location(None), CatalogLocation::Local(PathBuf::from("sounds")));
        assert!(config.snapshot_path().ends_with("lapseq/project.json"));
    }

    #[test]
    fn user_file_overrides_only_what_it_sets() {
        let user = r#"
            [transport]
            bpm = 90

            [storage]
            path = "/tmp/beat.json"
        "#;
        let config = Config::from_sources(DEFAULT_CONFIG, Some(user));
        assert_eq!(config.bpm(), 90);
        assert_eq!(config.snapshot_path(), PathBuf::from("/tmp/beat.json"));
        assert_eq!(config.autosave_interval(), Duration::from_secs(30));
    }

    #[test]
    fn malformed_user_file_is_ignored() {
        let config = Config::from_sources(DEFAULT_CONFIG, Some("[transport\nbpm = "));
        assert_eq!(config.bpm(), 128);
    }

    #[test]
    fn logs_stay_off_the_terminal() {
        let path = log_path();
        assert!(path.ends_with("lapseq/lapseq.log"));
        let config = Config::from_sources(DEFAULT_CONFIG, None);
        assert_eq!(path.parent(), config.snapshot_path().parent());
    }

    #[test]
    fn cli_location_wins() {
        let config = Config::from_sources(DEFAULT_CONFIG, Some("[catalog]\nurl = \"https://example.invalid/a\""));
        assert_eq!(
            config.catalog_location(Some("/library".into())),
            CatalogLocation::Local(PathBuf::from("/library"))
        );
        assert_eq!(
            config.catalog_location(Some("http://localhost:8000/sounds".into())),
            CatalogLocation::Remote("http://localhost:8000/sounds".into())
        );
    }

    #[test]
    fn catalog_url_beats_root() {
        let user = r#"
            [catalog]
            url = "https://api.github.com/repos/someone/drums/contents/sounds"
        "#;
        let config = Config::from_sources(DEFAULT_CONFIG, Some(user));
        assert_eq!(
            config.catalog_location(None),
            CatalogLocation::Remote("https://api.github.com/repos/someone/drums/contents/sounds".into())
        );

        let blank = Config::from_sources(DEFAULT_CONFIG, Some("[catalog]\nurl = \"\""));
        assert_eq!(blank.catalog_location(None), CatalogLocation::Local(PathBuf::from("sounds")));
    }

    #[test]
    fn silly_tempo_is_clamped() {
        let config = Config::from_sources(DEFAULT_CONFIG, Some("[transport]\nbpm = 1000"));
        assert_eq!(config.bpm(), 200);
    }
}
