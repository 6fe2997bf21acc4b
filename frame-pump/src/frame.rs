use crate::{Error, Result};

/// Number of planes in every supported format.
pub const PLANE_COUNT: usize = 3;

/// Planar 4:2:0 layouts accepted by the encoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// 8 bits per sample, `Y` followed by `U` and `V` at half resolution.
    I420,
    /// Same layout as [`ImageFormat::I420`], but each sample occupies
    /// two bytes (little-endian).
    I42016,
}

impl ImageFormat {
    pub fn from_bit_depth(bits: u32) -> Option<Self> {
        match bits {
            8 => Some(ImageFormat::I420),
            16 => Some(ImageFormat::I42016),
            _ => None,
        }
    }

    /// Container tag for uncompressed frames of this format. The 16-bit tag
    /// is the one FFmpeg writes for little-endian `yuv420p16`.
    pub fn fourcc(&self) -> [u8; 4] {
        match self {
            ImageFormat::I420 => *b"I420",
            ImageFormat::I42016 => [b'Y', b'3', 11, 16],
        }
    }

    pub fn is_high_bit_depth(&self) -> bool {
        matches!(self, ImageFormat::I42016)
    }

    pub fn bytes_per_sample(&self) -> usize {
        if self.is_high_bit_depth() {
            2
        } else {
            1
        }
    }

    /// Width of `plane` in samples.
    pub fn plane_width(&self, plane: usize, width: u32) -> usize {
        if plane == 0 {
            width as usize
        } else {
            (width as usize + 1) >> 1
        }
    }

    /// Height of `plane` in rows.
    pub fn plane_height(&self, plane: usize, height: u32) -> usize {
        if plane == 0 {
            height as usize
        } else {
            (height as usize + 1) >> 1
        }
    }

    /// Width of one row of `plane` in bytes.
    pub fn row_bytes(&self, plane: usize, width: u32) -> usize {
        self.plane_width(plane, width) * self.bytes_per_sample()
    }

    /// Size of one frame with no row padding.
    pub fn frame_size(&self, width: u32, height: u32) -> usize {
        (0..PLANE_COUNT)
            .map(|plane| self.row_bytes(plane, width) * self.plane_height(plane, height))
            .sum()
    }
}

/// Rejects dimensions that cannot be subsampled.
pub fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
        return Err(Error::configuration(format!(
            "Invalid frame size: {}x{}",
            width, height
        )));
    }
    Ok(())
}

pub struct Plane<'data> {
    data: &'data [u8],
    stride: usize,
    row_bytes: usize,
    rows: usize,
}

impl<'data> Plane<'data> {
    pub fn data(&self) -> &'data [u8] {
        self.data
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn row_bytes(&self) -> usize {
        self.row_bytes
    }

    pub fn height(&self) -> usize {
        self.rows
    }

    /// Visible bytes of each row, skipping the stride padding.
    pub fn rows(&self) -> impl Iterator<Item = &'data [u8]> {
        let row_bytes = self.row_bytes;
        self.data
            .chunks(self.stride)
            .take(self.rows)
            .map(move |row| &row[..row_bytes])
    }
}

pub struct PlaneMut<'data> {
    data: &'data mut [u8],
    stride: usize,
    row_bytes: usize,
    rows: usize,
}

impl<'data> PlaneMut<'data> {
    pub fn data(&mut self) -> &mut [u8] {
        self.data
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn row_bytes(&self) -> usize {
        self.row_bytes
    }

    pub fn height(&self) -> usize {
        self.rows
    }

    /// Visible part of row `y`.
    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let start = y * self.stride;
        &mut self.data[start..start + self.row_bytes]
    }
}

/// One planar picture. Dimensions and layout are fixed at allocation.
#[derive(Debug, Clone)]
pub struct RawFrame {
    format: ImageFormat,
    width: u32,
    height: u32,
    strides: [usize; PLANE_COUNT],
    planes: [Vec<u8>; PLANE_COUNT],
}

impl RawFrame {
    /// Allocates a zeroed frame. Each plane's stride is its row width in
    /// bytes rounded up to a multiple of `stride_align`, which must be a
    /// power of two.
    pub fn new(format: ImageFormat, width: u32, height: u32, stride_align: usize) -> Result<Self> {
        check_dimensions(width, height)?;
        if !stride_align.is_power_of_two() {
            return Err(Error::configuration(format!(
                "Invalid stride alignment: {}",
                stride_align
            )));
        }

        let mut strides = [0; PLANE_COUNT];
        for (plane, stride) in strides.iter_mut().enumerate() {
            let row_bytes = format.row_bytes(plane, width);
            *stride = (row_bytes + stride_align - 1) & !(stride_align - 1);
        }

        let planes =
            [0, 1, 2].map(|plane| vec![0u8; strides[plane] * format.plane_height(plane, height)]);

        Ok(Self {
            format,
            width,
            height,
            strides,
            planes,
        })
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn strides(&self) -> [usize; PLANE_COUNT] {
        self.strides
    }

    /// # Panics
    ///
    /// Panics if `index >= PLANE_COUNT`.
    pub fn plane(&self, index: usize) -> Plane<'_> {
        Plane {
            data: &self.planes[index],
            stride: self.strides[index],
            row_bytes: self.format.row_bytes(index, self.width),
            rows: self.format.plane_height(index, self.height),
        }
    }

    /// # Panics
    ///
    /// Panics if `index >= PLANE_COUNT`.
    pub fn plane_mut(&mut self, index: usize) -> PlaneMut<'_> {
        PlaneMut {
            data: &mut self.planes[index],
            stride: self.strides[index],
            row_bytes: self.format.row_bytes(index, self.width),
            rows: self.format.plane_height(index, self.height),
        }
    }

    pub fn planes(&self) -> [Plane<'_>; PLANE_COUNT] {
        [self.plane(0), self.plane(1), self.plane(2)]
    }

    /// Copies the visible samples of every plane into one contiguous
    /// buffer, dropping the stride padding.
    pub fn to_packed(&self) -> Vec<u8> {
        let mut packed = Vec::with_capacity(self.format.frame_size(self.width, self.height));
        for plane in self.planes() {
            for row in plane.rows() {
                packed.extend_from_slice(row);
            }
        }
        packed
    }
}
