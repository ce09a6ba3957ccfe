// The records the controller juggles: channels, patterns, metronome.
//
// Terminology, since it is easy to mix up:
//   "channel": one instrument row on the rack, sample or synth, with its own 16 steps.
//   "step": one sixteenth-note slot; active steps fire on their tick.
//   "pattern": a named arrangement slot. Switching only moves the active marker
//   for now; channel steps are shared by every pattern.

use serde::{Deserialize, Serialize};

use crate::audio_api::UnitId;
use crate::shared::{ChannelId, NUM_STEPS};

pub const SYNTH_TYPE: &str = "3xosc";
const DEFAULT_PATTERNS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Sample,
    Synth,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ChannelSource {
    Sample {
        path: String, // catalog key
        source_url: String,
    },
    Synth {
        synth_type: String,
        notes: [Option<u8>; NUM_STEPS], // per-step note, empty means the default note
    },
}

#[derive(Clone, Debug)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
    pub source: ChannelSource,
    pub unit: UnitId, // the audio unit this channel drives
    pub muted: bool,
    pub volume: f32, // linear, 0.0 - 1.0
    pub steps: [bool; NUM_STEPS],
}

impl Channel {
    pub fn kind(&self) -> ChannelKind {
        match self.source {
            ChannelSource::Sample { .. } => ChannelKind::Sample,
            ChannelSource::Synth { .. } => ChannelKind::Synth,
        }
    }

    pub fn detail(&self) -> String {
        match &self.source {
            ChannelSource::Sample { path, .. } => path.clone(),
            ChannelSource::Synth { .. } => "3xOSC Synthesizer".to_string(),
        }
    }

    /// Should this channel sound on `step`?
    pub fn fires_on(&self, step: usize) -> bool {
        !self.muted && self.steps.get(step).copied().unwrap_or(false)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub id: usize,
    pub name: String,
    #[serde(default)]
    pub channels: Vec<ChannelId>, // never populated yet
}

impl Pattern {
    fn numbered(id: usize) -> Self {
        Self {
            id,
            name: format!("Pattern {}", id + 1),
            channels: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PatternBank {
    patterns: Vec<Pattern>,
    current: usize,
}

impl Default for PatternBank {
    fn default() -> Self {
        Self {
            patterns: (0..DEFAULT_PATTERNS).map(Pattern::numbered).collect(),
            current: 0,
        }
    }
}

impl PatternBank {
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn add(&mut self) -> &Pattern {
        let id = self.patterns.len();
        self.patterns.push(Pattern::numbered(id));
        &self.patterns[id]
    }

    /// Mark `index` active. Channel data is not swapped.
    pub fn switch(&mut self, index: usize) -> Option<&Pattern> {
        let pattern = self.patterns.get(index)?;
        self.current = index;
        Some(pattern)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetronomeState {
    pub enabled: bool,
    pub volume: f32, // linear, 0.0 - 1.0
}

impl Default for MetronomeState {
    fn default() -> Self {
        Self {
            enabled: false,
            volume: 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_four_patterns() {
        let bank = PatternBank::default();
        let names: Vec<_> = bank.patterns().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Pattern 1", "Pattern 2", "Pattern 3", "Pattern 4"]);
        assert_eq!(bank.current(), 0);
    }

    #[test]
    fn added_patterns_are_numbered_on() {
        let mut bank = PatternBank::default();
        let added = bank.add();
        assert_eq!(added.id, 4);
        assert_eq!(added.name, "Pattern 5");
    }

    #[test]
    fn switch_ignores_unknown_patterns() {
        let mut bank = PatternBank::default();
        assert_eq!(bank.switch(2).map(|p| p.id), Some(2));
        assert!(bank.switch(9).is_none());
        assert_eq!(bank.current(), 2);
    }
}
