//! The encode loop.
//!
//! An [`EncodeDriver`] owns one configured encoder and runs it through two
//! phases: the encode phase submits frames from a [`FrameSource`] until the
//! input runs out or the frame cap is reached, and the flush phase submits
//! end-of-stream markers until the encoder has nothing left. After every
//! submission the driver drains all ready output into the [`PacketSink`]
//! before submitting again, so units reach the sink in production order.
//!
//! ```ignore
//! let mut driver = EncodeDriver::new(codec.open(), &params, DriverConfig::new(30))?;
//! let frames = driver.run_encode_loop(&mut source, &mut sink)?;
//! driver.run_flush_loop(&mut sink)?;
//! let summary = driver.finish()?;
//! ```
//!
//! Dropping a driver at any point releases the encoder, discarding whatever
//! it still holds.

use std::num::NonZeroU64;

use crate::{
    CompressedUnit, EncodeFlags, EncodeParameters, EncoderAdapter, Error, FrameSource,
    KeyframeScheduler, PacketSink, Result, Submission, END_OF_STREAM_INDEX,
};

/// Loop settings that are not encoder parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverConfig {
    pub keyframe_interval: u32,
    /// Hard cap on submitted frames. `None` reads until the input ends.
    pub max_frames: Option<NonZeroU64>,
}

impl DriverConfig {
    pub fn new(keyframe_interval: u32) -> Self {
        Self {
            keyframe_interval,
            max_frames: None,
        }
    }

    /// Zero or negative means unbounded.
    pub fn with_max_frames(mut self, max_frames: i64) -> Self {
        self.max_frames = u64::try_from(max_frames).ok().and_then(NonZeroU64::new);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// The encoder accepted its parameters; nothing has been submitted.
    Configured,
    Encoding,
    Flushing,
    /// Flushed to completion, or stopped by a fatal error.
    Closed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub frames_submitted: u64,
    pub units: u64,
    pub keyframes: u64,
    pub bytes: u64,
}

impl SessionSummary {
    fn record(&mut self, unit: &CompressedUnit) {
        self.units += 1;
        self.bytes += unit.data.len() as u64;
        if unit.is_keyframe {
            self.keyframes += 1;
        }
    }
}

pub struct EncodeDriver<A: EncoderAdapter> {
    adapter: A,
    scheduler: KeyframeScheduler,
    max_frames: Option<NonZeroU64>,
    state: SessionState,
    failed: bool,
    released: bool,
    frame_count: u64,
    summary: SessionSummary,
}

impl<A: EncoderAdapter> EncodeDriver<A> {
    /// Configures `adapter`. If the encoder rejects the parameters it is
    /// shut down before the error is returned.
    pub fn new(mut adapter: A, params: &EncodeParameters, config: DriverConfig) -> Result<Self> {
        tracing::info!("Using {}", adapter.name());

        if let Err(e) = adapter.configure(params) {
            if let Err(shutdown_error) = adapter.shutdown() {
                tracing::warn!(%shutdown_error, "Failed to release encoder");
            }
            return Err(e);
        }

        tracing::debug!(
            width = params.width(),
            height = params.height(),
            keyframe_interval = config.keyframe_interval,
            max_frames = config.max_frames.map(NonZeroU64::get),
            "encoder configured"
        );

        Ok(Self {
            adapter,
            scheduler: KeyframeScheduler::new(config.keyframe_interval),
            max_frames: config.max_frames,
            state: SessionState::Configured,
            failed: false,
            released: false,
            frame_count: 0,
            summary: SessionSummary::default(),
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the session was stopped by an error.
    pub fn has_failed(&self) -> bool {
        self.failed
    }

    /// Frames submitted so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Runs the encode phase and returns the number of frames submitted.
    ///
    /// Stops when `source` is exhausted or the frame cap is reached, whichever
    /// comes first; with a cap no frame beyond it is read. Any error closes
    /// the session and releases the encoder.
    ///
    /// # Panics
    ///
    /// Panics unless the session is [`SessionState::Configured`].
    pub fn run_encode_loop<S, K>(&mut self, source: &mut S, sink: &mut K) -> Result<u64>
    where
        S: FrameSource + ?Sized,
        K: PacketSink + ?Sized,
    {
        assert_eq!(
            self.state,
            SessionState::Configured,
            "encode phase can only start once, from a configured session"
        );
        self.state = SessionState::Encoding;

        loop {
            if let Some(max_frames) = self.max_frames {
                if self.frame_count >= max_frames.get() {
                    tracing::debug!(max_frames = max_frames.get(), "frame limit reached");
                    break;
                }
            }

            let frame = match source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => return Err(self.fail(e)),
            };

            let mut flags = EncodeFlags::empty();
            if self.scheduler.should_force_keyframe(self.frame_count) {
                flags |= EncodeFlags::FORCE_KEYFRAME;
            }

            let index = self.frame_count as i64;
            tracing::trace!(index, ?flags, "submit");
            if let Err(e) = self.adapter.submit(Submission::Frame(frame), index, flags) {
                return Err(self.fail(e));
            }
            self.frame_count += 1;
            self.summary.frames_submitted = self.frame_count;

            if let Err(e) = forward_units(&mut self.adapter, sink, &mut self.summary) {
                return Err(self.fail(e));
            }
        }

        Ok(self.frame_count)
    }

    /// Runs the flush phase and returns the number of units it produced.
    ///
    /// Submits end-of-stream markers until a drain comes back empty. Once the
    /// session is closed this returns `Ok(0)` without touching the encoder.
    /// Called on a session that never entered the encode phase, it behaves as
    /// if the encode phase ran on an empty input.
    ///
    /// # Panics
    ///
    /// Panics if the session was stopped by an error.
    pub fn run_flush_loop<K>(&mut self, sink: &mut K) -> Result<u64>
    where
        K: PacketSink + ?Sized,
    {
        assert!(!self.failed, "cannot flush a failed session");

        match self.state {
            SessionState::Closed => {
                tracing::debug!("already flushed");
                return Ok(0);
            }
            SessionState::Configured => {
                tracing::debug!("flushing without an encode phase");
                self.state = SessionState::Encoding;
            }
            SessionState::Encoding | SessionState::Flushing => {}
        }
        self.state = SessionState::Flushing;

        let mut flushed = 0;
        loop {
            tracing::trace!("submit end of stream");
            if let Err(e) =
                self.adapter
                    .submit(Submission::EndOfStream, END_OF_STREAM_INDEX, EncodeFlags::empty())
            {
                return Err(self.fail(e));
            }

            match forward_units(&mut self.adapter, sink, &mut self.summary) {
                Ok(0) => break,
                Ok(count) => flushed += count,
                Err(e) => return Err(self.fail(e)),
            }
        }

        tracing::debug!(flushed, "encoder flushed");
        self.state = SessionState::Closed;
        Ok(flushed)
    }

    /// Releases the encoder and returns the session totals.
    ///
    /// An encoder that fails to shut down yields a codec error.
    ///
    /// # Panics
    ///
    /// Panics unless the session is [`SessionState::Closed`]. Output still
    /// held by the encoder is only released by
    /// [`run_flush_loop`](Self::run_flush_loop).
    pub fn finish(mut self) -> Result<SessionSummary> {
        assert_eq!(
            self.state,
            SessionState::Closed,
            "session must be flushed before it is finished"
        );

        if !self.released {
            self.released = true;
            self.adapter.shutdown().map_err(|e| match e {
                Error::Codec { .. } => e,
                other => Error::codec("Failed to destroy codec", other.to_string()),
            })?;
        }

        tracing::debug!(
            frames = self.summary.frames_submitted,
            units = self.summary.units,
            keyframes = self.summary.keyframes,
            bytes = self.summary.bytes,
            "session finished"
        );

        Ok(std::mem::take(&mut self.summary))
    }

    /// Runs both phases and releases the encoder.
    pub fn run<S, K>(mut self, source: &mut S, sink: &mut K) -> Result<SessionSummary>
    where
        S: FrameSource + ?Sized,
        K: PacketSink + ?Sized,
    {
        self.run_encode_loop(source, sink)?;
        self.run_flush_loop(sink)?;
        self.finish()
    }

    fn fail(&mut self, error: Error) -> Error {
        tracing::error!(%error, frame = self.frame_count, state = ?self.state, "encode session failed");
        self.failed = true;
        self.state = SessionState::Closed;
        self.release();
        error
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(shutdown_error) = self.adapter.shutdown() {
            tracing::warn!(%shutdown_error, "Failed to release encoder");
        }
    }
}

impl<A: EncoderAdapter> Drop for EncodeDriver<A> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Moves everything the encoder has ready into `sink`, in order.
fn forward_units<A, K>(adapter: &mut A, sink: &mut K, summary: &mut SessionSummary) -> Result<u64>
where
    A: EncoderAdapter,
    K: PacketSink + ?Sized,
{
    let mut count = 0;
    for unit in adapter.drain() {
        tracing::debug!(
            pts = unit.pts,
            keyframe = unit.is_keyframe,
            size = unit.data.len(),
            "unit"
        );
        sink.write_unit(&unit)?;
        summary.record(&unit);
        count += 1;
    }
    Ok(count)
}
