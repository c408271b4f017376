// encode.rs
//
// Copyright (c) 2025  Douglas Lau
//
use crate::block::*;
use std::io::{self, Write};

/// Byte writer for container framing
pub(crate) struct ByteWriter<W: Write> {
    /// Writer for output data
    writer: W,
    /// Count of bytes written
    count: usize,
}

impl<W: Write> ByteWriter<W> {
    pub fn new(writer: W) -> Self {
        ByteWriter { writer, count: 0 }
    }

    /// Get the number of bytes written
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn write_u8(&mut self, value: u8) -> io::Result<()> {
        self.write_bytes(&[value])
    }

    /// Write a `u16` in little-endian order
    pub fn write_u16_le(&mut self, value: u16) -> io::Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Write an ASCII string
    pub fn write_str(&mut self, value: &str) -> io::Result<()> {
        debug_assert!(value.is_ascii());
        self.write_bytes(value.as_bytes())
    }

    pub fn write_bytes(&mut self, buf: &[u8]) -> io::Result<()> {
        self.writer.write_all(buf)?;
        self.count += buf.len();
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Write GIF89a header
    pub fn write_header(&mut self) -> io::Result<()> {
        self.write_str("GIF")?;
        self.write_str("89a")
    }

    /// Write GIF trailer
    pub fn write_trailer(&mut self) -> io::Result<()> {
        self.write_bytes(BlockCode::Trailer_.signature())
    }
}

impl LoopingExt {
    pub(crate) fn format<W: Write>(
        &self,
        w: &mut ByteWriter<W>,
    ) -> io::Result<()> {
        w.write_bytes(BlockCode::Application_.signature())?;
        w.write_u8(Self::APP_ID.len() as u8)?; // block size
        w.write_bytes(Self::APP_ID)?;
        w.write_u8(3)?; // sub-block size
        w.write_u8(Self::SUB_BLOCK_ID)?;
        w.write_u16_le(self.loop_count())?;
        w.write_u8(0) // block terminator
    }
}

impl<'a> FrameParts<'a> {
    /// Copy the logical screen descriptor
    pub(crate) fn format_screen_desc<W: Write>(
        &self,
        w: &mut ByteWriter<W>,
    ) -> io::Result<()> {
        w.write_bytes(self.screen_desc())
    }

    /// Copy the graphic control extension, replacing the delay time
    pub(crate) fn format_graphic_control<W: Write>(
        &self,
        w: &mut ByteWriter<W>,
        delay_time_cs: u16,
    ) -> io::Result<()> {
        let gc = self.graphic_control();
        // introducer, label, block size, flags
        w.write_bytes(&gc[..DELAY_OFFSET])?;
        w.write_u16_le(delay_time_cs)?;
        // transparent color index, block terminator
        w.write_bytes(&gc[DELAY_OFFSET + 2..])
    }

    /// Copy image descriptor, local color table and image data
    pub(crate) fn format_image<W: Write>(
        &self,
        w: &mut ByteWriter<W>,
    ) -> io::Result<()> {
        w.write_bytes(self.image_desc())?;
        w.write_bytes(self.color_table())?;
        w.write_bytes(self.image_data())
    }
}
