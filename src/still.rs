// still.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! Single-frame GIF encoding
use crate::block::BlockCode;
use crate::error::{Error, Result};
use pix::gray::{Gray, Gray8};
use pix::rgb::Rgb;
use pix::{Palette, Raster};
use std::convert::TryFrom;
use std::io::{self, Write};

/// Single-frame GIF encoder
///
/// Produces the block layout expected by
/// [Assembler](struct.Assembler.html): header, logical screen descriptor
/// without a global color table, graphic control extension, image
/// descriptor, local color table, image data and trailer.
#[derive(Clone, Copy, Debug, Default)]
pub struct StillEncoder {
    /// Delay time in centiseconds
    delay_time_cs: u16,
    /// Transparent color index
    transparent_color: Option<u8>,
}

/// Get the size field of a color table with `len` entries
fn len_bits(len: usize) -> u8 {
    let mut bits = 0;
    while (2 << bits) < len && bits < 7 {
        bits += 1;
    }
    bits
}

impl StillEncoder {
    /// Graphic control flag for transparent color
    const TRANSPARENT_COLOR: u8 = 0b0000_0001;

    /// Image descriptor flag for local color table
    const COLOR_TABLE_PRESENT: u8 = 0b1000_0000;

    /// Create a new still encoder
    pub fn new() -> Self {
        StillEncoder::default()
    }

    /// Adjust the delay time.
    pub fn with_delay_time_cs(mut self, delay_time_cs: u16) -> Self {
        self.delay_time_cs = delay_time_cs;
        self
    }

    /// Adjust the transparent color.
    pub fn with_transparent_color(mut self, clr: Option<u8>) -> Self {
        self.transparent_color = clr;
        self
    }

    /// Encode an indexed raster as a single-frame GIF.
    pub fn encode_indexed(
        &self,
        raster: &Raster<Gray8>,
        palette: &Palette,
    ) -> Result<Vec<u8>> {
        let entries = palette.len();
        if entries < 1 || entries > 256 {
            return Err(Error::InvalidPalette(entries));
        }
        let width = u16::try_from(raster.width())?;
        let height = u16::try_from(raster.height())?;
        let bits = len_bits(entries);
        let data: Vec<u8> = raster
            .pixels()
            .iter()
            .map(|p| u8::from(Gray::value(*p)))
            .collect();
        let table_len = 2 << bits;
        if let Some(idx) = data.iter().find(|i| usize::from(**i) >= table_len)
        {
            return Err(Error::InvalidColorIndex(*idx));
        }
        let mut buf = Vec::with_capacity(64 + table_len * 3 + data.len());
        buf.write_all(b"GIF89a")?;
        // logical screen descriptor
        buf.write_all(&width.to_le_bytes())?;
        buf.write_all(&height.to_le_bytes())?;
        buf.write_all(&[(bits << 4) & 0b0111_0000, 0, 0])?;
        self.format_graphic_control(&mut buf)?;
        // image descriptor
        buf.write_all(BlockCode::ImageDesc_.signature())?;
        buf.write_all(&[0, 0, 0, 0])?;
        buf.write_all(&width.to_le_bytes())?;
        buf.write_all(&height.to_le_bytes())?;
        buf.write_all(&[Self::COLOR_TABLE_PRESENT | bits])?;
        format_color_table(&mut buf, palette, table_len)?;
        format_image_data(&mut buf, (bits + 1).max(2), &data)?;
        buf.write_all(BlockCode::Trailer_.signature())?;
        debug!("still: {}x{}, {} bytes", width, height, buf.len());
        Ok(buf)
    }

    /// Write graphic control extension
    fn format_graphic_control<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(BlockCode::GraphicControl_.signature())?;
        let mut buf = Vec::with_capacity(6);
        buf.push(4); // block size
        let (flags, idx) = match self.transparent_color {
            Some(idx) => (Self::TRANSPARENT_COLOR, idx),
            None => (0, 0),
        };
        buf.push(flags);
        buf.extend_from_slice(&self.delay_time_cs.to_le_bytes());
        buf.push(idx);
        buf.push(0); // block terminator
        w.write_all(&buf)
    }
}

/// Write color table, padded with black to `table_len` entries
fn format_color_table<W: Write>(
    w: &mut W,
    palette: &Palette,
    table_len: usize,
) -> io::Result<()> {
    for i in 0..table_len {
        match palette.entry(i) {
            Some(clr) => w.write_all(&[
                u8::from(Rgb::red(clr)),
                u8::from(Rgb::green(clr)),
                u8::from(Rgb::blue(clr)),
            ])?,
            None => w.write_all(&[0, 0, 0])?,
        }
    }
    Ok(())
}

/// Write LZW compressed image data in sub-blocks
fn format_image_data<W: Write>(
    w: &mut W,
    min_code_size: u8,
    data: &[u8],
) -> io::Result<()> {
    w.write_all(&[min_code_size])?;
    let mut bw = SubBlockWriter::new(w);
    {
        let mut enc = lzw::Encoder::new(
            lzw::LsbWriter::new(&mut bw),
            min_code_size,
        )?;
        enc.encode_bytes(data)?;
    }
    bw.flush()?;
    w.write_all(&[0]) // block terminator
}

/// Writer which splits data into sub-blocks of up to 255 bytes
struct SubBlockWriter<'a, W: Write> {
    writer: &'a mut W,
    buf: Vec<u8>,
}

impl<'a, W: Write> SubBlockWriter<'a, W> {
    fn new(writer: &'a mut W) -> Self {
        let buf = Vec::with_capacity(0xFF);
        SubBlockWriter { writer, buf }
    }
}

impl<'a, W: Write> Write for SubBlockWriter<'a, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let remaining = 0xFF - self.buf.len();
        let consumed = remaining.min(buf.len());
        self.buf.extend_from_slice(&buf[..consumed]);
        if self.buf.len() == 0xFF {
            self.writer.write_all(&[0xFF])?;
            self.writer.write_all(&self.buf)?;
            self.buf.clear();
        }
        Ok(consumed)
    }

    fn flush(&mut self) -> io::Result<()> {
        let len = self.buf.len();
        if len > 0 {
            self.writer.write_all(&[len as u8])?;
            self.writer.write_all(&self.buf)?;
            self.buf.clear();
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::block::FrameParts;
    use pix::rgb::SRgb8;
    use std::error::Error;

    fn palette(len: usize) -> Palette {
        let mut p = Palette::new(len);
        for i in 0..len {
            let v = i as u8;
            p.set_entry(SRgb8::new(v, v, 255 - v));
        }
        p
    }

    #[test]
    fn table_bits() {
        assert_eq!(len_bits(1), 0);
        assert_eq!(len_bits(2), 0);
        assert_eq!(len_bits(3), 1);
        assert_eq!(len_bits(8), 2);
        assert_eq!(len_bits(9), 3);
        assert_eq!(len_bits(129), 7);
        assert_eq!(len_bits(256), 7);
    }

    #[test]
    fn sub_blocks() -> io::Result<()> {
        let mut out = vec![];
        {
            let mut bw = SubBlockWriter::new(&mut out);
            bw.write_all(&[7; 300])?;
            bw.flush()?;
        }
        assert_eq!(out.len(), 302);
        assert_eq!(out[0], 0xFF);
        assert_eq!(out[256], 45);
        Ok(())
    }

    #[test]
    fn layout() -> std::result::Result<(), Box<dyn Error>> {
        let mut raster = Raster::with_clear(50, 40);
        *raster.pixel_mut(3, 4) = Gray8::new(5);
        let pal = palette(6);
        let enc = StillEncoder::new()
            .with_delay_time_cs(20)
            .with_transparent_color(Some(0));
        let gif = enc.encode_indexed(&raster, &pal)?;
        let parts = FrameParts::from_buf(&gif)?;
        assert_eq!(parts.screen_width(), 50);
        assert_eq!(parts.screen_height(), 40);
        assert_eq!(parts.width(), 50);
        assert_eq!(parts.height(), 40);
        assert_eq!(parts.delay_time_cs(), 20);
        assert_eq!(parts.graphic_control()[3], 0x01);
        assert_eq!(parts.color_table_len(), 8);
        assert_eq!(&parts.color_table()[..6], &[0, 0, 255, 1, 1, 254]);
        assert_eq!(&parts.color_table()[18..], &[0; 6]);
        // min code size for 8 entries
        assert_eq!(parts.image_data()[0], 3);
        assert_eq!(parts.image_data().last(), Some(&0));
        Ok(())
    }

    #[test]
    fn invalid_palette() {
        let raster = Raster::with_clear(2, 2);
        let r = StillEncoder::new().encode_indexed(&raster, &Palette::new(4));
        assert!(matches!(r, Err(crate::Error::InvalidPalette(0))));
    }

    #[test]
    fn invalid_color_index() {
        let mut raster = Raster::with_clear(2, 2);
        *raster.pixel_mut(1, 1) = Gray8::new(4);
        let r = StillEncoder::new().encode_indexed(&raster, &palette(4));
        assert!(matches!(r, Err(crate::Error::InvalidColorIndex(4))));
    }

    #[test]
    fn too_wide() {
        let raster = Raster::with_clear(70_000, 1);
        let r = StillEncoder::new().encode_indexed(&raster, &palette(2));
        assert!(matches!(r, Err(crate::Error::TryFromInt(_))));
    }
}
