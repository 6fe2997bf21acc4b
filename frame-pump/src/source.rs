use std::io::{ErrorKind, Read};

use crate::{RawFrame, Result, PLANE_COUNT};

/// Produces raw frames one at a time.
pub trait FrameSource {
    /// Returns the next frame, or `None` once the input is exhausted. End of
    /// input is not an error.
    fn next_frame(&mut self) -> Result<Option<&RawFrame>>;
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn next_frame(&mut self) -> Result<Option<&RawFrame>> {
        (**self).next_frame()
    }
}

/// Reads back-to-back planar frames from a byte stream, one row at a time,
/// into a single reused frame buffer.
pub struct RawFileSource<R> {
    reader: R,
    frame: RawFrame,
    frames_read: u64,
}

impl<R: Read> RawFileSource<R> {
    /// `frame` fixes the format, dimensions and strides of every frame read.
    pub fn new(reader: R, frame: RawFrame) -> Self {
        Self {
            reader,
            frame,
            frames_read: 0,
        }
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Returns `false` if the stream ended before the frame was complete.
    fn fill_frame(&mut self) -> Result<bool> {
        for plane in 0..PLANE_COUNT {
            let mut plane = self.frame.plane_mut(plane);

            for y in 0..plane.height() {
                match self.reader.read_exact(plane.row_mut(y)) {
                    Ok(()) => {}
                    Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(false),
                    Err(e) => return Err(e.into()),
                }
            }
        }

        Ok(true)
    }
}

impl<R: Read> FrameSource for RawFileSource<R> {
    fn next_frame(&mut self) -> Result<Option<&RawFrame>> {
        if !self.fill_frame()? {
            tracing::debug!(frames = self.frames_read, "end of raw input");
            return Ok(None);
        }

        self.frames_read += 1;
        Ok(Some(&self.frame))
    }
}
