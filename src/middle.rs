// The controller. It owns every piece of sequencer state and is the only
// thing that mutates it. The main loop feeds it three things:
//   - semantic input from the TUI (`handle_input`)
//   - wall-clock time (`tick`)
//   - finished background jobs (`on_job_done`)
// and forwards what comes back: audio commands to the engine, jobs to the
// loader. UI updates go out through the event queue, drained once per frame.

use crate::audio::{generate_click, next_unit_id};
use crate::audio_api::{gain_to_db, note_to_freq, AudioCommand, UnitId};
use crate::catalog::Catalog;
use crate::error::PlaybackError;
use crate::loader::{Job, JobResult, LoadedSound};
use crate::pipeline::channels::ChannelStore;
use crate::pipeline::persistence::{Persister, RestoredState};
use crate::pipeline::project::{ChannelSource, MetronomeState, PatternBank};
use crate::pipeline::selection::Selection;
use crate::pipeline::transport::{ClockSource, Transport};
use crate::shared::{
    ChannelId, ChannelRow, DisplayState, InputEvent, Notice, NoticeLevel, SoundRow, UiEvent,
    NUM_STEPS, TRACK_LEVEL_MAX_DB, TRACK_LEVEL_MIN_DB,
};

pub const METRONOME_GAIN_DB: f32 = -12.0;
const DEFAULT_SYNTH_NOTE: u8 = 60; // C4

/// Synth steps sound for an eighth note.
fn synth_note_secs(bpm: u32) -> f32 {
    60.0 / bpm as f32 / 2.0
}

/// Everything a snapshot is taken from.
#[derive(Debug, Default)]
pub struct AppState {
    pub transport: Transport,
    pub channels: ChannelStore,
    pub patterns: PatternBank,
    pub metronome: MetronomeState,
    pub selection: Selection,
}

pub struct Middle {
    state: AppState,
    catalog: Catalog,
    search: String,
    modifier_held: bool,
    persister: Persister,
    sample_rate: u32,
    click_unit: UnitId,
    events: Vec<UiEvent>,
    jobs: Vec<Job>,
}

impl Middle {
    pub fn new(bpm: u32, sample_rate: u32, persister: Persister) -> Self {
        Self {
            state: AppState {
                transport: Transport::new(bpm),
                ..AppState::default()
            },
            catalog: Catalog::default(),
            search: String::new(),
            modifier_held: false,
            persister,
            sample_rate,
            click_unit: next_unit_id(),
            events: Vec::new(),
            jobs: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    #[cfg(test)]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Restore the last session's settings, set up the metronome click and
    /// ask for the catalog.
    pub fn startup(&mut self) -> Vec<AudioCommand> {
        let restored = self.persister.restore();
        self.apply_restored(restored);
        self.jobs.push(Job::ListCatalog);
        vec![AudioCommand::RegisterSample {
            unit: self.click_unit,
            buffer: generate_click(self.sample_rate),
            gain_db: METRONOME_GAIN_DB,
        }]
    }

    pub fn handle_input(&mut self, event: InputEvent) -> Vec<AudioCommand> {
        let mut cmds = Vec::new();
        match event {
            InputEvent::TogglePlay => {
                if self.state.transport.is_playing() {
                    self.state.transport.stop();
                    self.events.push(UiEvent::StepCleared);
                } else {
                    self.state.transport.start();
                }
                self.save_snapshot();
            }
            InputEvent::SetBpm(bpm) => self.set_bpm(bpm),

            InputEvent::ToggleStep { channel, step } => self.toggle_step(channel, step as usize),
            InputEvent::ModifierDown => self.modifier_held = true,
            InputEvent::ModifierUp => self.modifier_held = false,

            InputEvent::ToggleMute(id) => {
                let Some(muted) = self.state.channels.get(id).map(|c| !c.muted) else {
                    return cmds;
                };
                if let Some(unit) = self.state.channels.set_mute(id, muted) {
                    cmds.push(AudioCommand::SetMute { unit, muted });
                    self.channels_changed();
                }
            }
            InputEvent::SetVolume(id, volume) => self.set_volume(id, volume, &mut cmds),
            InputEvent::SetTrackLevel(id, db) => {
                if let Some(channel) = self.state.channels.get(id) {
                    let gain_db = db.clamp(TRACK_LEVEL_MIN_DB, TRACK_LEVEL_MAX_DB);
                    cmds.push(AudioCommand::SetGain { unit: channel.unit, gain_db });
                    self.save_snapshot();
                }
            }
            InputEvent::SelectChannel { channel, additive } => {
                if self.state.channels.contains(channel) {
                    self.state.selection.select(channel, additive);
                    self.events.push(UiEvent::ChannelsChanged);
                }
            }
            InputEvent::DeleteChannel(id) => {
                if self.delete_channel(id, &mut cmds) {
                    self.notify(NoticeLevel::Info, "Channel deleted");
                    self.channels_changed();
                }
            }
            InputEvent::DeleteSelection => {
                if self.state.selection.is_empty() {
                    return cmds;
                }
                let ids = self.state.selection.ids();
                let deleted = ids.into_iter().filter(|&id| self.delete_channel(id, &mut cmds)).count();
                self.state.selection.clear();
                match deleted {
                    0 => {}
                    1 => self.notify(NoticeLevel::Info, "Channel deleted"),
                    n => self.notify(NoticeLevel::Info, format!("{n} channels deleted")),
                }
                if deleted > 0 {
                    self.channels_changed();
                }
            }
            InputEvent::ClearRack => {
                if self.state.channels.is_empty() {
                    return cmds;
                }
                for channel in self.state.channels.clear() {
                    cmds.push(AudioCommand::Release { unit: channel.unit });
                }
                self.state.selection.clear();
                self.notify(NoticeLevel::Info, "All channels cleared");
                self.channels_changed();
            }

            InputEvent::AddSample(key) => match self.catalog.get(&key) {
                Some(sound) => {
                    log::debug!(target: "loader", "queueing {key}");
                    self.jobs.push(Job::LoadSound(sound.clone()));
                }
                None => self.notify(NoticeLevel::Warning, format!("Unknown sound: {key}")),
            },
            InputEvent::AddSynth => {
                let unit = next_unit_id();
                let id = self.state.channels.add_synth_channel(unit);
                if let Some(channel) = self.state.channels.get(id) {
                    cmds.push(AudioCommand::RegisterSynth { unit, gain_db: gain_to_db(channel.volume) });
                    let message = format!("Added {}", channel.name);
                    self.notify(NoticeLevel::Success, message);
                }
                self.channels_changed();
            }

            InputEvent::AddPattern => {
                let message = format!("Added {}", self.state.patterns.add().name);
                self.notify(NoticeLevel::Success, message);
                self.save_snapshot();
            }
            InputEvent::SwitchPattern(index) => {
                // only the active marker moves; channel steps stay as they are
                if let Some(pattern) = self.state.patterns.switch(index) {
                    let message = format!("Switched to {}", pattern.name);
                    self.notify(NoticeLevel::Info, message);
                    self.save_snapshot();
                }
            }

            InputEvent::ToggleMetronome => {
                self.state.metronome.enabled = !self.state.metronome.enabled;
                cmds.push(self.metronome_gain());
                let message = format!("Metronome {}", if self.state.metronome.enabled { "ON" } else { "OFF" });
                self.notify(NoticeLevel::Info, message);
                self.save_snapshot();
            }
            InputEvent::SetMetronomeVolume(volume) => self.set_metronome_volume(volume, &mut cmds),

            InputEvent::Save => {
                if self.save_snapshot() {
                    self.events.push(UiEvent::Saved);
                    self.notify(NoticeLevel::Success, "Project saved");
                } else {
                    self.notify(NoticeLevel::Error, "Could not save project");
                }
            }
            InputEvent::Load => {
                let restored = self.persister.restore();
                self.apply_restored(restored);
                self.notify(NoticeLevel::Info, "Project loaded");
            }
            InputEvent::RefreshCatalog => {
                self.jobs.push(Job::ListCatalog);
                self.notify(NoticeLevel::Info, "Scanning for sounds");
            }
            InputEvent::SetSearch(term) => {
                self.search = term;
                self.events.push(UiEvent::CatalogChanged);
            }

            InputEvent::Quit => {
                self.save_snapshot();
            }
        }
        cmds
    }

    /// Run every tick that came due since the last call, then autosave if
    /// the period has elapsed.
    pub fn tick(&mut self, clock: &mut dyn ClockSource) -> Vec<AudioCommand> {
        let elapsed = clock.elapsed();
        let mut cmds = Vec::new();

        for _ in 0..self.state.transport.due_ticks(elapsed) {
            self.play_current_step(&mut cmds);
            let step = self.state.transport.advance();
            self.events.push(UiEvent::StepChanged(step as u8));
        }

        if self.persister.autosave_due(elapsed) {
            log::debug!(target: "storage", "autosave");
            if self.save_snapshot() {
                self.events.push(UiEvent::Saved);
            }
        }
        cmds
    }

    fn play_current_step(&self, cmds: &mut Vec<AudioCommand>) {
        let step = self.state.transport.current_step();
        if self.state.metronome.enabled {
            cmds.push(AudioCommand::Retrigger { unit: self.click_unit });
        }

        for channel in self.state.channels.iter().filter(|c| c.fires_on(step)) {
            let cmd = match &channel.source {
                ChannelSource::Sample { .. } => AudioCommand::Retrigger { unit: channel.unit },
                ChannelSource::Synth { notes, .. } => AudioCommand::PlayNote {
                    unit: channel.unit,
                    freq: note_to_freq(notes[step].unwrap_or(DEFAULT_SYNTH_NOTE)),
                    duration_secs: synth_note_secs(self.state.transport.bpm()),
                },
            };
            cmds.push(cmd);
        }
    }

    pub fn on_job_done(&mut self, result: JobResult) -> Vec<AudioCommand> {
        let mut cmds = Vec::new();
        match result {
            JobResult::Catalog(Ok(catalog)) => {
                if catalog.is_empty() {
                    self.notify(NoticeLevel::Warning, "No sound folders found");
                }
                self.catalog = catalog;
                self.events.push(UiEvent::CatalogChanged);
            }
            JobResult::Catalog(Err(e)) => {
                log::error!(target: "catalog", "{e}");
                self.catalog = Catalog::default();
                self.events.push(UiEvent::CatalogChanged);
                self.notify(NoticeLevel::Error, "Cannot load sound catalog");
            }
            JobResult::Sound(Ok(loaded)) => self.add_loaded_sound(loaded, &mut cmds),
            JobResult::Sound(Err(e)) => {
                log::error!(target: "loader", "{e}");
                let message = format!("Error loading: {}", e.sound_name());
                self.notify(NoticeLevel::Error, message);
            }
        }
        cmds
    }

    fn add_loaded_sound(&mut self, loaded: LoadedSound, cmds: &mut Vec<AudioCommand>) {
        let LoadedSound { sound, unit, buffer } = loaded;
        let id = self.state.channels.add_sample_channel(&sound, unit);
        let volume = self.state.channels.get(id).map_or(0.0, |c| c.volume);
        cmds.push(AudioCommand::RegisterSample { unit, buffer, gain_db: gain_to_db(volume) });
        self.notify(NoticeLevel::Success, format!("Added: {}", sound.name));
        self.channels_changed();
    }

    /// Trigger failures come back from the audio thread after the fact.
    /// The tick that caused them has already moved on.
    pub fn on_playback_error(&self, err: PlaybackError) {
        log::warn!(target: "audio", "{err}");
    }

    pub fn take_jobs(&mut self) -> Vec<Job> {
        std::mem::take(&mut self.jobs)
    }

    pub fn drain_events(&mut self) -> Vec<UiEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn display_state(&self) -> DisplayState {
        let channels = self
            .state
            .channels
            .iter()
            .map(|c| ChannelRow {
                id: c.id,
                name: c.name.clone(),
                detail: c.detail(),
                steps: c.steps,
                muted: c.muted,
                volume: c.volume,
                selected: self.state.selection.contains(c.id),
            })
            .collect();

        let sounds = self
            .catalog
            .search(&self.search)
            .into_iter()
            .map(|s| SoundRow {
                key: s.key.clone(),
                name: s.name.clone(),
                folder: s.folder.clone(),
                size_label: s.size_label(),
            })
            .collect();

        DisplayState {
            playing: self.state.transport.is_playing(),
            bpm: self.state.transport.bpm(),
            current_step: self.state.transport.current_step() as u8,
            channels,
            patterns: self.state.patterns.patterns().iter().map(|p| p.name.clone()).collect(),
            current_pattern: self.state.patterns.current(),
            metronome_enabled: self.state.metronome.enabled,
            metronome_volume: self.state.metronome.volume,
            sounds,
            sound_count: self.catalog.len(),
            search: self.search.clone(),
            modifier_held: self.modifier_held,
        }
    }

    fn set_bpm(&mut self, bpm: u32) {
        if self.state.transport.set_bpm(bpm) {
            self.events.push(UiEvent::StepCleared);
        }
        self.save_snapshot();
    }

    fn toggle_step(&mut self, channel: ChannelId, step: usize) {
        if step >= NUM_STEPS {
            return;
        }
        if self.modifier_held {
            if self.state.channels.copy_pattern_segment(channel, step) {
                self.notify(NoticeLevel::Info, "Pattern copied");
                self.channels_changed();
            }
        } else if self.state.channels.toggle_step(channel, step).is_some() {
            self.channels_changed();
        }
    }

    fn set_volume(&mut self, id: ChannelId, volume: f32, cmds: &mut Vec<AudioCommand>) {
        if let Some(unit) = self.state.channels.set_volume(id, volume) {
            let volume = self.state.channels.get(id).map_or(0.0, |c| c.volume);
            cmds.push(AudioCommand::SetGain { unit, gain_db: gain_to_db(volume) });
            self.channels_changed();
        }
    }

    fn set_metronome_volume(&mut self, volume: f32, cmds: &mut Vec<AudioCommand>) {
        self.state.metronome.volume = volume.clamp(0.0, 1.0);
        cmds.push(self.metronome_gain());
        self.save_snapshot();
    }

    fn metronome_gain(&self) -> AudioCommand {
        AudioCommand::SetGain {
            unit: self.click_unit,
            gain_db: gain_to_db(self.state.metronome.volume),
        }
    }

    // Release the unit and forget the channel. Nothing is snapshotted here
    // so batch deletes write once.
    fn delete_channel(&mut self, id: ChannelId, cmds: &mut Vec<AudioCommand>) -> bool {
        let Some(channel) = self.state.channels.delete(id) else {
            return false;
        };
        cmds.push(AudioCommand::Release { unit: channel.unit });
        self.state.selection.remove(id);
        true
    }

    fn apply_restored(&mut self, restored: RestoredState) {
        if let Some(bpm) = restored.bpm {
            if self.state.transport.set_bpm(bpm) {
                self.events.push(UiEvent::StepCleared);
            }
        }
        if let Some(metronome) = restored.metronome {
            self.state.metronome = metronome;
        }
        log::info!(
            target: "storage",
            "restored bpm {} metronome {}",
            self.state.transport.bpm(),
            if self.state.metronome.enabled { "on" } else { "off" }
        );
    }

    fn channels_changed(&mut self) {
        self.state.selection.retain(|id| self.state.channels.contains(id));
        self.events.push(UiEvent::ChannelsChanged);
        self.save_snapshot();
    }

    fn save_snapshot(&self) -> bool {
        self.persister.snapshot(
            &self.state.transport,
            &self.state.channels,
            &self.state.patterns,
            &self.state.metronome,
        )
    }

    fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.events.push(UiEvent::Notice(Notice::new(level, message)));
    }
}
