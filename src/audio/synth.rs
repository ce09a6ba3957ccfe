// Tone generator behind synth channels: one sawtooth oscillator through an
// ADSR envelope. Monophonic per unit, a new note restarts the envelope.

use super::frame::StereoFrame;

const ATTACK_SECS: f32 = 0.01;
const DECAY_SECS: f32 = 0.1;
const SUSTAIN_LEVEL: f32 = 0.5;
const RELEASE_SECS: f32 = 0.5;

const OUTPUT_LEVEL: f32 = 0.25; // headroom so a few channels can stack

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

#[derive(Clone, Debug)]
pub struct SynthVoice {
    sample_rate: f32,
    phase: f32, // 0..1
    phase_inc: f32,
    level: f32,
    stage: Stage,
    hold_left: u32, // samples until the note is released
    release_step: f32,
}

impl SynthVoice {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate as f32,
            phase: 0.0,
            phase_inc: 0.0,
            level: 0.0,
            stage: Stage::Idle,
            hold_left: 0,
            release_step: 0.0,
        }
    }

    pub fn note_on(&mut self, freq: f32, duration_secs: f32) {
        self.phase = 0.0;
        self.phase_inc = freq / self.sample_rate;
        self.level = 0.0;
        self.stage = Stage::Attack;
        self.hold_left = (duration_secs.max(0.0) * self.sample_rate) as u32;
    }

    pub fn is_active(&self) -> bool {
        self.stage != Stage::Idle
    }

    fn envelope(&mut self) -> f32 {
        if self.hold_left > 0 {
            self.hold_left -= 1;
        } else if !matches!(self.stage, Stage::Idle | Stage::Release) {
            self.stage = Stage::Release;
            self.release_step = self.level / (RELEASE_SECS * self.sample_rate);
        }

        match self.stage {
            Stage::Idle => {}
            Stage::Attack => {
                self.level += 1.0 / (ATTACK_SECS * self.sample_rate);
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = Stage::Decay;
                }
            }
            Stage::Decay => {
                self.level -= (1.0 - SUSTAIN_LEVEL) / (DECAY_SECS * self.sample_rate);
                if self.level <= SUSTAIN_LEVEL {
                    self.level = SUSTAIN_LEVEL;
                    self.stage = Stage::Sustain;
                }
            }
            Stage::Sustain => {}
            Stage::Release => {
                self.level -= self.release_step;
                if self.level <= 0.0 || self.release_step <= 0.0 {
                    self.level = 0.0;
                    self.stage = Stage::Idle;
                }
            }
        }
        self.level
    }

    pub fn next_sample(&mut self) -> f32 {
        if self.stage == Stage::Idle {
            return 0.0;
        }
        let env = self.envelope();
        let saw = 2.0 * self.phase - 1.0;
        self.phase += self.phase_inc;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        saw * env * OUTPUT_LEVEL
    }

    pub fn render_into(&mut self, gain: f32, out: &mut [StereoFrame]) {
        for frame in out.iter_mut() {
            if !self.is_active() {
                break;
            }
            let s = self.next_sample();
            frame.mix(StereoFrame::mono(s), gain);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 1000;

    #[test]
    fn idle_until_note_on() {
        let mut v = SynthVoice::new(SR);
        assert!(!v.is_active());
        assert_eq!(v.next_sample(), 0.0);
    }

    #[test]
    fn note_releases_and_goes_idle() {
        let mut v = SynthVoice::new(SR);
        v.note_on(100.0, 0.2);
        for _ in 0..200 {
            v.next_sample();
        }
        assert!(v.is_active(), "still releasing right after the hold");
        for _ in 0..(RELEASE_SECS * SR as f32) as usize + 5 {
            v.next_sample();
        }
        assert!(!v.is_active());
    }

    #[test]
    fn output_stays_within_headroom() {
        let mut v = SynthVoice::new(SR);
        v.note_on(50.0, 0.5);
        let peak = (0..1500).map(|_| v.next_sample().abs()).fold(0.0f32, f32::max);
        assert!(peak > 0.0);
        assert!(peak <= OUTPUT_LEVEL + 1e-6);
    }

    #[test]
    fn new_note_restarts_envelope() {
        let mut v = SynthVoice::new(SR);
        v.note_on(100.0, 0.1);
        for _ in 0..50 {
            v.next_sample();
        }
        v.note_on(100.0, 0.1);
        assert_eq!(v.level, 0.0);
        assert_eq!(v.stage, Stage::Attack);
    }
}
