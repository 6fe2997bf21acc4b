#![allow(clippy::new_without_default)]

//! Drives a block-based video encoder over a stream of raw planar frames.
//!
//! Frames come from a [`FrameSource`], go through an [`EncoderAdapter`] and
//! the compressed output lands in a [`PacketSink`]. [`EncodeDriver`] runs
//! the loop and the final flush.

pub mod error;
pub use error::{Error, Result};

pub mod frame;
pub use frame::{check_dimensions, ImageFormat, Plane, PlaneMut, RawFrame, PLANE_COUNT};

pub mod adapter;
pub use adapter::{
    CompressedUnit, Drain, EncodeFlags, EncodeParameters, EncoderAdapter, Rational, Submission,
    END_OF_STREAM_INDEX,
};

pub mod keyframe;
pub use keyframe::KeyframeScheduler;

pub mod source;
pub use source::{FrameSource, RawFileSource};

pub mod sink;
pub use sink::{ElementaryStreamWriter, IvfHeader, IvfWriter, PacketSink};

pub mod codec;
pub use codec::Codec;

pub mod raw;

#[cfg(feature = "openh264")]
pub mod h264;

pub mod driver;
pub use driver::{DriverConfig, EncodeDriver, SessionState, SessionSummary};

pub mod settings;
pub use settings::{Container, EncodeSettings};
