use crate::{check_dimensions, Error, ImageFormat, RawFrame, Result};

/// Presentation index carried by the end-of-stream submission.
pub const END_OF_STREAM_INDEX: i64 = -1;

bitflags::bitflags! {
    /// Per-submission encoder flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EncodeFlags: u32 {
        /// Ask the encoder to make this frame a keyframe.
        const FORCE_KEYFRAME = 1 << 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rational {
    pub num: u32,
    pub den: u32,
}

impl Rational {
    pub const fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }
}

/// Settings handed to [`EncoderAdapter::configure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeParameters {
    width: u32,
    height: u32,
    time_base: Rational,
    format: ImageFormat,
    bitrate_kbps: u32,
    error_resilient: bool,
    lag_in_frames: u32,
}

impl EncodeParameters {
    /// Width and height must be positive and even, the time base must have
    /// non-zero terms.
    pub fn new(width: u32, height: u32, time_base: Rational) -> Result<Self> {
        check_dimensions(width, height)?;
        if time_base.num == 0 || time_base.den == 0 {
            return Err(Error::configuration(format!(
                "Invalid time base: {}/{}",
                time_base.num, time_base.den
            )));
        }

        Ok(Self {
            width,
            height,
            time_base,
            format: ImageFormat::I420,
            bitrate_kbps: 200,
            error_resilient: false,
            lag_in_frames: 0,
        })
    }

    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_bitrate_kbps(mut self, bitrate_kbps: u32) -> Self {
        self.bitrate_kbps = bitrate_kbps;
        self
    }

    pub fn with_error_resilient(mut self, error_resilient: bool) -> Self {
        self.error_resilient = error_resilient;
        self
    }

    /// Upper bound on frames the encoder may hold back before emitting
    /// output. Encoders without lookahead ignore it.
    pub fn with_lag_in_frames(mut self, lag_in_frames: u32) -> Self {
        self.lag_in_frames = lag_in_frames;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn bitrate_kbps(&self) -> u32 {
        self.bitrate_kbps
    }

    pub fn error_resilient(&self) -> bool {
        self.error_resilient
    }

    pub fn lag_in_frames(&self) -> u32 {
        self.lag_in_frames
    }
}

/// What is handed to the encoder on each call.
#[derive(Debug, Clone, Copy)]
pub enum Submission<'a> {
    Frame(&'a RawFrame),
    /// No more frames will follow; release anything held back.
    EndOfStream,
}

/// One piece of compressed output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedUnit {
    pub data: Vec<u8>,
    /// Presentation index of the frame this unit belongs to.
    pub pts: i64,
    pub is_keyframe: bool,
}

/// The boundary to an encoder implementation.
///
/// The driver calls [`submit`](EncoderAdapter::submit) and then drains
/// every unit it produced before submitting again. An adapter owns its
/// encoder handle exclusively.
pub trait EncoderAdapter {
    fn name(&self) -> &str;

    fn configure(&mut self, params: &EncodeParameters) -> Result<()>;

    /// Frames must match the configured dimensions and format. The frame is
    /// only borrowed for the duration of the call.
    fn submit(&mut self, submission: Submission<'_>, index: i64, flags: EncodeFlags) -> Result<()>;

    /// Takes the next unit produced by earlier submissions, if any.
    fn next_unit(&mut self) -> Option<CompressedUnit>;

    /// Releases encoder resources. Calling it again afterwards does nothing.
    fn shutdown(&mut self) -> Result<()>;

    /// Iterates over the output that is ready now. The sequence is finite
    /// and may be empty.
    fn drain(&mut self) -> Drain<'_, Self>
    where
        Self: Sized,
    {
        Drain { adapter: self }
    }
}

impl<A: EncoderAdapter + ?Sized> EncoderAdapter for Box<A> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn configure(&mut self, params: &EncodeParameters) -> Result<()> {
        (**self).configure(params)
    }

    fn submit(&mut self, submission: Submission<'_>, index: i64, flags: EncodeFlags) -> Result<()> {
        (**self).submit(submission, index, flags)
    }

    fn next_unit(&mut self) -> Option<CompressedUnit> {
        (**self).next_unit()
    }

    fn shutdown(&mut self) -> Result<()> {
        (**self).shutdown()
    }
}

pub struct Drain<'a, A: EncoderAdapter> {
    adapter: &'a mut A,
}

impl<A: EncoderAdapter> Iterator for Drain<'_, A> {
    type Item = CompressedUnit;

    fn next(&mut self) -> Option<Self::Item> {
        self.adapter.next_unit()
    }
}
