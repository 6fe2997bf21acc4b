//! Session configuration, loadable from JSON.
//!
//! Missing fields take the defaults below; unknown fields are rejected.

use std::{path::Path, str::FromStr};

use serde::Deserialize;

use crate::{
    check_dimensions, Codec, DriverConfig, EncodeParameters, Error, ImageFormat, Rational, Result,
};

/// Output framing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    /// IVF: file header plus length-prefixed records.
    #[default]
    Ivf,
    /// Payloads written back to back.
    Raw,
}

impl FromStr for Container {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ivf" => Ok(Container::Ivf),
            "raw" => Ok(Container::Raw),
            other => Err(format!("unknown container `{}`, expected `ivf` or `raw`", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodeSettings {
    pub codec: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub bitrate_kbps: u32,
    /// `0` leaves keyframe placement to the encoder.
    pub keyframe_interval: u32,
    pub error_resilient: bool,
    /// `0` or negative encodes the whole input.
    pub max_frames: i64,
    /// Bits per sample container: `8` or `16`.
    pub bit_depth: u32,
    pub lag_in_frames: u32,
    pub container: Container,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            codec: "raw".to_string(),
            width: 416,
            height: 240,
            fps: 30,
            bitrate_kbps: 200,
            keyframe_interval: 0,
            error_resilient: false,
            max_frames: 0,
            bit_depth: 8,
            lag_in_frames: 0,
            container: Container::Ivf,
        }
    }
}

impl EncodeSettings {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::configuration(format!("Invalid settings: {}", e)))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| {
            Error::configuration(format!("Invalid settings file {}: {}", path.display(), e))
        })
    }

    /// Checks everything that can be checked before any file is opened.
    pub fn validate(&self) -> Result<()> {
        check_dimensions(self.width, self.height)?;
        if self.width > u16::MAX as u32 || self.height > u16::MAX as u32 {
            return Err(Error::configuration(format!(
                "Invalid frame size: {}x{}",
                self.width, self.height
            )));
        }
        if self.fps == 0 {
            return Err(Error::configuration("Invalid frame rate: 0"));
        }
        self.image_format()?;
        self.codec()?;
        Ok(())
    }

    pub fn codec(&self) -> Result<Codec> {
        Codec::require(&self.codec)
    }

    pub fn image_format(&self) -> Result<ImageFormat> {
        ImageFormat::from_bit_depth(self.bit_depth).ok_or_else(|| {
            Error::configuration(format!("Unsupported bit depth: {}", self.bit_depth))
        })
    }

    pub fn time_base(&self) -> Rational {
        Rational::new(1, self.fps)
    }

    pub fn encode_parameters(&self) -> Result<EncodeParameters> {
        Ok(
            EncodeParameters::new(self.width, self.height, self.time_base())?
                .with_format(self.image_format()?)
                .with_bitrate_kbps(self.bitrate_kbps)
                .with_error_resilient(self.error_resilient)
                .with_lag_in_frames(self.lag_in_frames),
        )
    }

    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig::new(self.keyframe_interval).with_max_frames(self.max_frames)
    }
}
