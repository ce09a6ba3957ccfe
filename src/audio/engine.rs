use std::collections::HashMap;

use crate::audio_api::{db_to_gain, AudioCommand};
use crate::error::PlaybackError;

use super::frame::StereoFrame;
use super::sample_buffer::SampleBuffer;
use super::synth::SynthVoice;
use super::unit_id::UnitId;
use super::voice::SampleVoice;

enum Source {
    Sample { buffer: SampleBuffer, voice: SampleVoice },
    Synth(SynthVoice),
}

// A playable unit: one sound source with its own gain stage, routed into the master sink.
struct Unit {
    source: Source,
    gain: f32, // linear
    muted: bool,
}

#[cfg(test)]
impl Unit {
    fn is_sounding(&self) -> bool {
        match &self.source {
            Source::Sample { voice, .. } => voice.is_active(),
            Source::Synth(voice) => voice.is_active(),
        }
    }
}

pub struct Engine {
    sample_rate: u32,
    units: HashMap<UnitId, Unit>,
}

impl Engine {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            units: HashMap::new(),
        }
    }

    pub fn handle_cmd(&mut self, cmd: AudioCommand) -> Result<(), PlaybackError> {
        match cmd {
            AudioCommand::RegisterSample { unit, buffer, gain_db } => {
                let source = Source::Sample { buffer, voice: SampleVoice::default() };
                self.units.insert(unit, Unit { source, gain: db_to_gain(gain_db), muted: false });
            }
            AudioCommand::RegisterSynth { unit, gain_db } => {
                let source = Source::Synth(SynthVoice::new(self.sample_rate));
                self.units.insert(unit, Unit { source, gain: db_to_gain(gain_db), muted: false });
            }
            AudioCommand::Retrigger { unit } => match &mut self.unit_mut(unit)?.source {
                Source::Sample { buffer, voice } if !buffer.is_empty() => voice.retrigger(),
                _ => return Err(PlaybackError::NotLoaded(unit)),
            },
            AudioCommand::PlayNote { unit, freq, duration_secs } => match &mut self.unit_mut(unit)?.source {
                Source::Synth(voice) => voice.note_on(freq, duration_secs),
                Source::Sample { .. } => return Err(PlaybackError::NotLoaded(unit)),
            },
            AudioCommand::SetGain { unit, gain_db } => {
                self.unit_mut(unit)?.gain = db_to_gain(gain_db);
            }
            AudioCommand::SetMute { unit, muted } => {
                self.unit_mut(unit)?.muted = muted;
            }
            AudioCommand::Release { unit } => {
                self.units.remove(&unit).ok_or(PlaybackError::UnknownUnit(unit))?;
            }
        }
        Ok(())
    }

    fn unit_mut(&mut self, unit: UnitId) -> Result<&mut Unit, PlaybackError> {
        self.units.get_mut(&unit).ok_or(PlaybackError::UnknownUnit(unit))
    }

    pub fn render_block(&mut self, out: &mut [StereoFrame]) {
        out.fill(StereoFrame::zero());
        for unit in self.units.values_mut() {
            // muted units keep running silently so unmuting mid-hit picks up where it would be
            let gain = if unit.muted { 0.0 } else { unit.gain };
            match &mut unit.source {
                Source::Sample { buffer, voice } => voice.render_into(buffer, gain, out),
                Source::Synth(voice) => voice.render_into(gain, out),
            }
        }
        // master sink
        for frame in out.iter_mut() {
            *frame = frame.clipped();
        }
    }

    #[cfg(test)]
    pub fn sounding_units(&self) -> usize {
        self.units.values().filter(|u| u.is_sounding()).count()
    }
}
