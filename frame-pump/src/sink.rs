use std::io::{Seek, SeekFrom, Write};

use crate::{CompressedUnit, Rational, Result};

/// Receives compressed units in the order the encoder produced them.
pub trait PacketSink {
    fn write_unit(&mut self, unit: &CompressedUnit) -> Result<()>;

    /// Completes the output once the session is over.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: PacketSink + ?Sized> PacketSink for &mut S {
    fn write_unit(&mut self, unit: &CompressedUnit) -> Result<()> {
        (**self).write_unit(unit)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

impl<S: PacketSink + ?Sized> PacketSink for Box<S> {
    fn write_unit(&mut self, unit: &CompressedUnit) -> Result<()> {
        (**self).write_unit(unit)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

impl PacketSink for Vec<CompressedUnit> {
    fn write_unit(&mut self, unit: &CompressedUnit) -> Result<()> {
        self.push(unit.clone());
        Ok(())
    }
}

/// Writes payloads back to back with no framing, producing a bare
/// elementary stream.
pub struct ElementaryStreamWriter<W> {
    writer: W,
}

impl<W: Write> ElementaryStreamWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> PacketSink for ElementaryStreamWriter<W> {
    fn write_unit(&mut self, unit: &CompressedUnit) -> Result<()> {
        self.writer.write_all(&unit.data)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

pub const IVF_SIGNATURE: &[u8; 4] = b"DKIF";
pub const IVF_FILE_HEADER_SIZE: usize = 32;
pub const IVF_FRAME_HEADER_SIZE: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IvfHeader {
    pub fourcc: [u8; 4],
    pub width: u16,
    pub height: u16,
    pub time_base: Rational,
    pub frame_count: u32,
}

impl IvfHeader {
    pub fn to_bytes(&self) -> [u8; IVF_FILE_HEADER_SIZE] {
        let mut header = [0u8; IVF_FILE_HEADER_SIZE];
        header[0..4].copy_from_slice(IVF_SIGNATURE);
        header[4..6].copy_from_slice(&0u16.to_le_bytes());
        header[6..8].copy_from_slice(&(IVF_FILE_HEADER_SIZE as u16).to_le_bytes());
        header[8..12].copy_from_slice(&self.fourcc);
        header[12..14].copy_from_slice(&self.width.to_le_bytes());
        header[14..16].copy_from_slice(&self.height.to_le_bytes());
        header[16..20].copy_from_slice(&self.time_base.den.to_le_bytes());
        header[20..24].copy_from_slice(&self.time_base.num.to_le_bytes());
        header[24..28].copy_from_slice(&self.frame_count.to_le_bytes());
        header
    }
}

/// IVF container: a 32-byte file header followed by one record per unit,
/// each a 4-byte payload length and 8-byte pts (both little-endian) ahead of
/// the payload.
pub struct IvfWriter<W: Write + Seek> {
    writer: W,
    header: IvfHeader,
    frames_written: u32,
}

impl<W: Write + Seek> IvfWriter<W> {
    /// Writes the file header immediately. The frame count in it is
    /// rewritten by [`PacketSink::finish`].
    pub fn new(mut writer: W, header: IvfHeader) -> Result<Self> {
        writer.write_all(&header.to_bytes())?;
        Ok(Self {
            writer,
            header,
            frames_written: 0,
        })
    }

    pub fn frames_written(&self) -> u32 {
        self.frames_written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Seek> PacketSink for IvfWriter<W> {
    fn write_unit(&mut self, unit: &CompressedUnit) -> Result<()> {
        let mut record = [0u8; IVF_FRAME_HEADER_SIZE];
        record[0..4].copy_from_slice(&(unit.data.len() as u32).to_le_bytes());
        record[4..12].copy_from_slice(&unit.pts.to_le_bytes());

        self.writer.write_all(&record)?;
        self.writer.write_all(&unit.data)?;
        self.frames_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.header.frame_count = self.frames_written;

        let end = self.writer.stream_position()?;
        self.writer.seek(SeekFrom::Start(0))?;
        self.writer.write_all(&self.header.to_bytes())?;
        self.writer.seek(SeekFrom::Start(end))?;
        self.writer.flush()?;
        Ok(())
    }
}
