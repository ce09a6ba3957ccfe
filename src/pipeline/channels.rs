use crate::audio_api::UnitId;
use crate::catalog::SoundDescriptor;
use crate::shared::{ChannelId, COPY_SEGMENT_LEN, NUM_STEPS, SAMPLE_CHANNEL_VOLUME, SYNTH_CHANNEL_VOLUME};

use super::project::{Channel, ChannelSource, SYNTH_TYPE};

/// The rack: channels in display/playback order.
///
/// Ids are handed out once, in creation order, and never reused. A channel's
/// position is derived from where it sits in the rack, so deleting one shifts
/// the positions of everything after it while their ids stay put.
///
/// The store only holds state. Releasing audio units and snapshotting are the
/// controller's job, done in the same call as the mutation.
#[derive(Debug, Default)]
pub struct ChannelStore {
    channels: Vec<Channel>,
    next_id: u64,
}

impl ChannelStore {
    fn allocate_id(&mut self) -> ChannelId {
        let id = ChannelId(self.next_id);
        self.next_id += 1;
        id
    }

    fn push(&mut self, name: String, source: ChannelSource, unit: UnitId, volume: f32) -> ChannelId {
        let id = self.allocate_id();
        self.channels.push(Channel {
            id,
            name,
            source,
            unit,
            muted: false,
            volume,
            steps: [false; NUM_STEPS],
        });
        id
    }

    /// Add a channel for a sound that has already been fetched and decoded.
    pub fn add_sample_channel(&mut self, sound: &SoundDescriptor, unit: UnitId) -> ChannelId {
        let source = ChannelSource::Sample {
            path: sound.key.clone(),
            source_url: sound.url.clone(),
        };
        self.push(sound.display_name(), source, unit, SAMPLE_CHANNEL_VOLUME)
    }

    pub fn add_synth_channel(&mut self, unit: UnitId) -> ChannelId {
        let name = format!("3xOSC {}", self.len() + 1);
        let source = ChannelSource::Synth {
            synth_type: SYNTH_TYPE.to_string(),
            notes: [None; NUM_STEPS],
        };
        self.push(name, source, unit, SYNTH_CHANNEL_VOLUME)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    pub fn get(&self, id: ChannelId) -> Option<&Channel> {
        self.channels.iter().find(|c| c.id == id)
    }

    fn get_mut(&mut self, id: ChannelId) -> Option<&mut Channel> {
        self.channels.iter_mut().find(|c| c.id == id)
    }

    pub fn contains(&self, id: ChannelId) -> bool {
        self.get(id).is_some()
    }

    /// Where the channel currently sits on the rack.
    pub fn position(&self, id: ChannelId) -> Option<usize> {
        self.channels.iter().position(|c| c.id == id)
    }

    #[cfg(test)]
    pub fn id_at(&self, position: usize) -> Option<ChannelId> {
        self.channels.get(position).map(|c| c.id)
    }

    /// Flip one step. Returns the new value, or `None` if the channel is gone.
    pub fn toggle_step(&mut self, id: ChannelId, step: usize) -> Option<bool> {
        let slot = self.get_mut(id)?.steps.get_mut(step)?;
        *slot = !*slot;
        Some(*slot)
    }

    /// Copy steps `[start, start+4)` onto `[start+4, start+8)`. Targets past
    /// the last step are dropped, so starts above 11 copy partially or not at all.
    pub fn copy_pattern_segment(&mut self, id: ChannelId, start: usize) -> bool {
        let Some(channel) = self.get_mut(id) else {
            return false;
        };
        let end = (start + COPY_SEGMENT_LEN).min(NUM_STEPS);
        let segment: Vec<bool> = channel.steps.get(start..end).unwrap_or(&[]).to_vec();
        for (i, &value) in segment.iter().enumerate() {
            let target = start + COPY_SEGMENT_LEN + i;
            if target < NUM_STEPS {
                channel.steps[target] = value;
            }
        }
        true
    }

    /// Returns the unit to update, or `None` if the channel is gone.
    pub fn set_mute(&mut self, id: ChannelId, muted: bool) -> Option<UnitId> {
        let channel = self.get_mut(id)?;
        channel.muted = muted;
        Some(channel.unit)
    }

    pub fn set_volume(&mut self, id: ChannelId, volume: f32) -> Option<UnitId> {
        let channel = self.get_mut(id)?;
        channel.volume = volume.clamp(0.0, 1.0);
        Some(channel.unit)
    }

    pub fn delete(&mut self, id: ChannelId) -> Option<Channel> {
        let position = self.position(id)?;
        Some(self.channels.remove(position))
    }

    pub fn clear(&mut self) -> Vec<Channel> {
        std::mem::take(&mut self.channels)
    }
}
