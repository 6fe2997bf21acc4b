use crate::{EncoderAdapter, Error, ImageFormat, Result};

/// An encoder that can be selected by name.
#[derive(Clone, Copy)]
pub struct Codec {
    name: &'static str,
    long_name: &'static str,
    /// `None` when the tag depends on the input format.
    fourcc: Option<[u8; 4]>,
    open: fn() -> Box<dyn EncoderAdapter>,
}

fn open_raw() -> Box<dyn EncoderAdapter> {
    Box::new(crate::raw::RawEncoder::new())
}

#[cfg(feature = "openh264")]
fn open_h264() -> Box<dyn EncoderAdapter> {
    Box::new(crate::h264::OpenH264Encoder::new())
}

const RAW: Codec = Codec {
    name: "raw",
    long_name: "uncompressed planar video",
    fourcc: None,
    open: open_raw,
};

#[cfg(feature = "openh264")]
const H264: Codec = Codec {
    name: "h264",
    long_name: "H.264 / AVC (OpenH264)",
    fourcc: Some(*b"H264"),
    open: open_h264,
};

#[cfg(not(feature = "openh264"))]
static CODECS: &[Codec] = &[RAW];
#[cfg(feature = "openh264")]
static CODECS: &[Codec] = &[RAW, H264];

impl Codec {
    pub fn find_by_name(name: &str) -> Option<Self> {
        CODECS.iter().find(|codec| codec.name == name).copied()
    }

    /// Like [`Codec::find_by_name`], but an unknown name is a configuration
    /// error.
    pub fn require(name: &str) -> Result<Self> {
        Self::find_by_name(name)
            .ok_or_else(|| Error::configuration(format!("Unsupported codec: {}", name)))
    }

    /// Every codec compiled into this build.
    pub fn all() -> impl Iterator<Item = Codec> {
        CODECS.iter().copied()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn long_name(&self) -> &'static str {
        self.long_name
    }

    /// Identifier written into container headers for streams made from
    /// `format` input.
    pub fn fourcc(&self, format: ImageFormat) -> [u8; 4] {
        self.fourcc.unwrap_or_else(|| format.fourcc())
    }

    /// Creates a fresh, unconfigured encoder.
    pub fn open(&self) -> Box<dyn EncoderAdapter> {
        (self.open)()
    }
}

impl std::fmt::Debug for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec")
            .field("name", &self.name)
            .field("long_name", &self.long_name)
            .field("fourcc", &self.fourcc.map(|f| String::from_utf8_lossy(&f).into_owned()))
            .finish()
    }
}
