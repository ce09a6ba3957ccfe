use super::frame::StereoFrame;
use super::sample_buffer::SampleBuffer;

/// Playback cursor for a one-shot sample. One voice per unit: retriggering
/// rewinds it instead of starting a second, overlapping hit.
#[derive(Clone, Debug, Default)]
pub struct SampleVoice {
    pos: usize,
    active: bool,
}

impl SampleVoice {
    pub fn retrigger(&mut self) {
        self.pos = 0;
        self.active = true;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn render_into(&mut self, buffer: &SampleBuffer, gain: f32, out: &mut [StereoFrame]) {
        if !self.active {
            return;
        }
        let remaining = buffer.data.get(self.pos..).unwrap_or(&[]);
        let n = remaining.len().min(out.len());
        for (frame, &sample) in out.iter_mut().zip(&remaining[..n]) {
            frame.mix(sample, gain);
        }
        self.pos += n;
        if self.pos >= buffer.len() {
            self.active = false; // ran off the end; one-shots finish on their own
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> SampleBuffer {
        SampleBuffer::from_frames((0..n).map(|i| StereoFrame::mono(i as f32)).collect())
    }

    #[test]
    fn plays_through_and_goes_idle() {
        let buf = ramp(6);
        let mut voice = SampleVoice::default();
        voice.retrigger();

        let mut out = [StereoFrame::zero(); 4];
        voice.render_into(&buf, 1.0, &mut out);
        assert_eq!(out[3].left, 3.0);
        assert!(voice.is_active());

        let mut out = [StereoFrame::zero(); 4];
        voice.render_into(&buf, 1.0, &mut out);
        assert_eq!(out[1].left, 5.0);
        assert_eq!(out[2].left, 0.0);
        assert!(!voice.is_active());
    }

    #[test]
    fn retrigger_rewinds() {
        let buf = ramp(8);
        let mut voice = SampleVoice::default();
        voice.retrigger();
        let mut out = [StereoFrame::zero(); 3];
        voice.render_into(&buf, 1.0, &mut out);

        voice.retrigger();
        let mut out = [StereoFrame::zero(); 1];
        voice.render_into(&buf, 0.5, &mut out);
        assert_eq!(out[0].left, 0.0);
        let mut out = [StereoFrame::zero(); 1];
        voice.render_into(&buf, 0.5, &mut out);
        assert_eq!(out[0].left, 0.5);
    }
}
