pub use crate::audio::{SampleBuffer, UnitId};

/// Quietest level a unit is ever driven to; anything below is treated as silence.
pub const MIN_DB: f32 = -100.0;

#[derive(Clone, Debug)]
pub enum AudioCommand {
    // The engine can't fetch or decode (that would stall the callback), so the
    // loader decodes first and the buffer is handed over already prepared.
    RegisterSample { unit: UnitId, buffer: SampleBuffer, gain_db: f32 },

    // A tone generator unit; plays notes on demand.
    RegisterSynth { unit: UnitId, gain_db: f32 },

    // Stop whatever the unit is playing and start it again from the top.
    Retrigger { unit: UnitId },

    PlayNote { unit: UnitId, freq: f32, duration_secs: f32 },

    SetGain { unit: UnitId, gain_db: f32 },
    SetMute { unit: UnitId, muted: bool },

    // Drop the unit and free its buffer.
    Release { unit: UnitId },
}

/// Linear gain to decibels, floored at `MIN_DB`.
pub fn gain_to_db(gain: f32) -> f32 {
    if gain <= 0.0 {
        return MIN_DB;
    }
    (20.0 * gain.log10()).max(MIN_DB)
}

pub fn db_to_gain(db: f32) -> f32 {
    if db <= MIN_DB {
        return 0.0;
    }
    10f32.powf(db / 20.0)
}

/// Equal-tempered frequency of a MIDI note number.
pub fn note_to_freq(note: u8) -> f32 {
    440.0 * 2f32.powf((note as f32 - 69.0) / 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unity_gain_is_zero_db() {
        assert_eq!(gain_to_db(1.0), 0.0);
        assert!((gain_to_db(0.5) - (-6.0206)).abs() < 1e-3);
    }

    #[test]
    fn silence_is_floored() {
        assert_eq!(gain_to_db(0.0), MIN_DB);
        assert_eq!(db_to_gain(MIN_DB), 0.0);
    }

    #[test]
    fn db_roundtrips_through_gain() {
        for g in [0.1f32, 0.7, 0.8, 1.0] {
            assert!((db_to_gain(gain_to_db(g)) - g).abs() < 1e-5);
        }
    }

    #[test]
    fn middle_c() {
        assert!((note_to_freq(60) - 261.63).abs() < 0.01);
    }
}
