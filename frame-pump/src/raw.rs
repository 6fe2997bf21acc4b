//! The `raw` codec: stores every frame uncompressed.
//!
//! Each unit is the frame's visible samples packed plane by plane, so every
//! unit is a keyframe. Up to `lag_in_frames` frames are held back before
//! output starts, which makes it a convenient stand-in for encoders with
//! lookahead.

use std::collections::VecDeque;

use crate::{
    CompressedUnit, EncodeFlags, EncodeParameters, EncoderAdapter, Error, Result, Submission,
};

#[derive(Debug, Default)]
pub struct RawEncoder {
    params: Option<EncodeParameters>,
    held: VecDeque<CompressedUnit>,
    ready: VecDeque<CompressedUnit>,
}

impl RawEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames submitted but not yet released as output.
    pub fn delayed_frames(&self) -> usize {
        self.held.len()
    }
}

impl EncoderAdapter for RawEncoder {
    fn name(&self) -> &str {
        "raw"
    }

    fn configure(&mut self, params: &EncodeParameters) -> Result<()> {
        self.params = Some(params.clone());
        self.held.clear();
        self.ready.clear();
        Ok(())
    }

    fn submit(&mut self, submission: Submission<'_>, index: i64, flags: EncodeFlags) -> Result<()> {
        let params = self
            .params
            .as_ref()
            .ok_or_else(|| Error::codec("Failed to encode frame", "encoder is not configured"))?;

        match submission {
            Submission::Frame(frame) => {
                if frame.width() != params.width()
                    || frame.height() != params.height()
                    || frame.format() != params.format()
                {
                    return Err(Error::codec("Failed to encode frame", "frame does not match configuration")
                        .with_detail(format!(
                            "got {}x{} {:?}, configured {}x{} {:?}",
                            frame.width(),
                            frame.height(),
                            frame.format(),
                            params.width(),
                            params.height(),
                            params.format()
                        )));
                }

                tracing::trace!(index, ?flags, "raw: frame");
                self.held.push_back(CompressedUnit {
                    data: frame.to_packed(),
                    pts: index,
                    is_keyframe: true,
                });

                while self.held.len() > params.lag_in_frames() as usize {
                    if let Some(unit) = self.held.pop_front() {
                        self.ready.push_back(unit);
                    }
                }
            }
            // One held frame per end-of-stream call.
            Submission::EndOfStream => {
                if let Some(unit) = self.held.pop_front() {
                    self.ready.push_back(unit);
                }
            }
        }

        Ok(())
    }

    fn next_unit(&mut self) -> Option<CompressedUnit> {
        self.ready.pop_front()
    }

    fn shutdown(&mut self) -> Result<()> {
        self.params = None;
        self.held.clear();
        self.ready.clear();
        Ok(())
    }
}
