use super::frame::StereoFrame;
use super::sample_buffer::SampleBuffer;

const CLICK_SECS: f32 = 0.1;
const DECAY_SECS: f32 = 0.01;

/// Metronome click: a tenth of a second of noise under a fast exponential decay.
pub fn generate_click(sample_rate: u32) -> SampleBuffer {
    let len = (sample_rate as f32 * CLICK_SECS) as usize;
    let tau = sample_rate as f32 * DECAY_SECS;
    let data = (0..len)
        .map(|i| {
            let noise = fastrand::f32() * 2.0 - 1.0;
            StereoFrame::mono(noise * (-(i as f32) / tau).exp())
        })
        .collect();
    SampleBuffer::from_frames(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lasts_a_tenth_of_a_second() {
        assert_eq!(generate_click(44100).len(), 4410);
    }

    #[test]
    fn decays_to_near_silence() {
        let click = generate_click(44100);
        assert!(click.data.iter().all(|f| f.left.abs() <= 1.0));
        let tail = &click.data[4000..];
        assert!(tail.iter().all(|f| f.left.abs() < 1e-3));
    }
}
