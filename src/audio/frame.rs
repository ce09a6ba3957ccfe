// One stereo frame; the engine renders and mixes slices of these.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StereoFrame {
    pub left: f32,
    pub right: f32,
}

impl StereoFrame {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn mono(x: f32) -> Self {
        Self { left: x, right: x }
    }

    #[inline]
    pub fn mix(&mut self, other: StereoFrame, gain: f32) {
        self.left += other.left * gain;
        self.right += other.right * gain;
    }

    // master sink hard limit
    pub fn clipped(self) -> Self {
        Self {
            left: self.left.clamp(-1.0, 1.0),
            right: self.right.clamp(-1.0, 1.0),
        }
    }
}
