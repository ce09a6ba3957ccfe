// The contract between the controller (middle.rs) and the terminal front end.
//
//   - The TUI resolves raw keys into semantic `InputEvent`s and hands them to
//     `Middle::handle_input`. It never touches sequencer state directly.
//   - The controller pushes `UiEvent`s (step highlight, notices, "something
//     changed") that the TUI drains once per frame.
//   - Each frame the TUI also asks for a `DisplayState` and just draws it.

use serde::{Deserialize, Serialize};

pub const NUM_STEPS: usize = 16;
pub const COPY_SEGMENT_LEN: usize = 4;

pub const BPM_MIN: u32 = 60;
pub const BPM_MAX: u32 = 200;
pub const DEFAULT_BPM: u32 = 128;

pub const SAMPLE_CHANNEL_VOLUME: f32 = 0.8;
pub const SYNTH_CHANNEL_VOLUME: f32 = 0.7;

// mixer fader range, in dB
pub const TRACK_LEVEL_MIN_DB: f32 = -60.0;
pub const TRACK_LEVEL_MAX_DB: f32 = 6.0;

/// Stable channel identity. Handed out once and never reused, so a deletion
/// doesn't invalidate references to the channels that remain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub u64);

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    // transport
    TogglePlay,
    SetBpm(u32),

    // step grid
    ToggleStep { channel: ChannelId, step: u8 },
    ModifierDown, // while held, ToggleStep copies a 4-step segment instead
    ModifierUp,

    // channel strip
    ToggleMute(ChannelId),
    SetVolume(ChannelId, f32), // linear, clamped to 0.0 - 1.0
    SetTrackLevel(ChannelId, f32), // mixer fader, dB
    SelectChannel { channel: ChannelId, additive: bool },
    DeleteChannel(ChannelId),
    DeleteSelection,
    ClearRack,

    // instruments
    AddSample(String), // catalog key, "<folder>/<file>"
    AddSynth,

    // patterns
    AddPattern,
    SwitchPattern(usize),

    // metronome
    ToggleMetronome,
    SetMetronomeVolume(f32),

    // project
    Save,
    Load,
    RefreshCatalog,
    SetSearch(String),

    Quit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self { level, message: message.into() }
    }
}

/// Pushed by the controller, drained by the presentation layer.
#[derive(Clone, Debug, PartialEq)]
pub enum UiEvent {
    StepChanged(u8), // the cursor moved to this step
    StepCleared, // transport stopped; drop the highlight
    ChannelsChanged,
    CatalogChanged,
    Saved,
    Notice(Notice),
}

#[derive(Clone, Debug)]
pub struct ChannelRow {
    pub id: ChannelId,
    pub name: String,
    pub detail: String, // catalog path, or the synth description
    pub steps: [bool; NUM_STEPS],
    pub muted: bool,
    pub volume: f32,
    pub selected: bool,
}

#[derive(Clone, Debug)]
pub struct SoundRow {
    pub key: String,
    pub name: String,
    pub folder: String,
    pub size_label: String,
}

#[derive(Clone, Debug, Default)]
pub struct DisplayState {
    pub playing: bool,
    pub bpm: u32,
    pub current_step: u8,
    pub channels: Vec<ChannelRow>,
    pub patterns: Vec<String>,
    pub current_pattern: usize,
    pub metronome_enabled: bool,
    pub metronome_volume: f32,
    pub sounds: Vec<SoundRow>, // catalog entries matching the search
    pub sound_count: usize, // whole catalog
    pub search: String,
    pub modifier_held: bool,
}
