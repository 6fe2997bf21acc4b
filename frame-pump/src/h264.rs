//! The `h264` codec, backed by OpenH264 built from source.

use std::collections::VecDeque;

use openh264::encoder::{BitRate, Encoder, EncoderConfig, FrameRate, FrameType, RateControlMode};
use openh264::formats::YUVSlices;
use openh264::OpenH264API;

use crate::{
    CompressedUnit, EncodeFlags, EncodeParameters, EncoderAdapter, Error, ImageFormat, Result,
    Submission,
};

pub struct OpenH264Encoder {
    encoder: Option<Encoder>,
    width: u32,
    height: u32,
    ready: VecDeque<CompressedUnit>,
}

impl OpenH264Encoder {
    pub fn new() -> Self {
        Self {
            encoder: None,
            width: 0,
            height: 0,
            ready: VecDeque::new(),
        }
    }
}

impl EncoderAdapter for OpenH264Encoder {
    fn name(&self) -> &str {
        "OpenH264"
    }

    fn configure(&mut self, params: &EncodeParameters) -> Result<()> {
        if params.format() != ImageFormat::I420 {
            return Err(Error::configuration(format!(
                "h264 only accepts 8-bit I420 input, got {:?}",
                params.format()
            )));
        }

        let time_base = params.time_base();
        let fps = time_base.den as f32 / time_base.num as f32;

        if params.error_resilient() {
            tracing::warn!("h264: error resilience is not supported, ignoring");
        }

        let config = EncoderConfig::new()
            .bitrate(BitRate::from_bps(params.bitrate_kbps().saturating_mul(1000)))
            .max_frame_rate(FrameRate::from_hz(fps))
            .rate_control_mode(RateControlMode::Bitrate);

        let api = OpenH264API::from_source();
        let encoder = Encoder::with_api_config(api, config)
            .map_err(|e| Error::codec("Failed to initialize encoder", e.to_string()))?;

        tracing::info!(
            width = params.width(),
            height = params.height(),
            fps,
            bitrate_kbps = params.bitrate_kbps(),
            "h264 encoder created"
        );

        self.encoder = Some(encoder);
        self.width = params.width();
        self.height = params.height();
        self.ready.clear();
        Ok(())
    }

    fn submit(&mut self, submission: Submission<'_>, index: i64, flags: EncodeFlags) -> Result<()> {
        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| Error::codec("Failed to encode frame", "encoder is not configured"))?;

        // No lookahead: every frame's output is produced by its own call.
        let frame = match submission {
            Submission::Frame(frame) => frame,
            Submission::EndOfStream => return Ok(()),
        };

        if frame.width() != self.width || frame.height() != self.height {
            return Err(Error::codec(
                "Failed to encode frame",
                format!(
                    "frame size {}x{} does not match {}x{}",
                    frame.width(),
                    frame.height(),
                    self.width,
                    self.height
                ),
            ));
        }

        if flags.contains(EncodeFlags::FORCE_KEYFRAME) {
            encoder.force_intra_frame();
        }

        let [y, u, v] = frame.planes();
        let yuv = YUVSlices::new(
            (y.data(), u.data(), v.data()),
            (self.width as usize, self.height as usize),
            (y.stride(), u.stride(), v.stride()),
        );

        let bitstream = encoder
            .encode(&yuv)
            .map_err(|e| Error::codec("Failed to encode frame", e.to_string()))?;

        let is_keyframe = matches!(bitstream.frame_type(), FrameType::IDR | FrameType::I);
        let data = bitstream.to_vec();

        // Skipped frames produce no output.
        if !data.is_empty() {
            self.ready.push_back(CompressedUnit {
                data,
                pts: index,
                is_keyframe,
            });
        }

        Ok(())
    }

    fn next_unit(&mut self) -> Option<CompressedUnit> {
        self.ready.pop_front()
    }

    fn shutdown(&mut self) -> Result<()> {
        self.encoder = None;
        self.ready.clear();
        Ok(())
    }
}
