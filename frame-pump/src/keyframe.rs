/// Decides which submissions carry [`EncodeFlags::FORCE_KEYFRAME`].
///
/// Forced keyframes are a lower bound: the encoder may still place extra
/// keyframes of its own (scene cuts, its own maximum distance), so the
/// output stream can contain more keyframes than this schedule asks for.
///
/// [`EncodeFlags::FORCE_KEYFRAME`]: crate::EncodeFlags::FORCE_KEYFRAME
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyframeScheduler {
    interval: u32,
}

impl KeyframeScheduler {
    /// An interval of `0` leaves keyframe placement entirely to the encoder.
    pub const fn new(interval: u32) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn should_force_keyframe(&self, frame: u64) -> bool {
        should_force_keyframe(frame, self.interval)
    }
}

pub fn should_force_keyframe(frame: u64, interval: u32) -> bool {
    interval > 0 && frame % interval as u64 == 0
}
