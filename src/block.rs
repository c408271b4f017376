// block.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! Fixed-offset layout of single-frame GIF input buffers.
//!
//! A single-frame encoder which writes no global color table and no optional
//! extensions always produces the same block order, so each block of the
//! container framing can be located by a fixed offset:
//!
//! | Block                     | Offset | Size               |
//! |---------------------------|--------|--------------------|
//! | Header                    | 0      | 6                  |
//! | Logical Screen Descriptor | 6      | 7                  |
//! | Graphic Control Extension | 13     | 8                  |
//! | Image Descriptor          | 21     | 10                 |
//! | Local Color Table         | 31     | 3 × 2^(size + 1)   |
//! | Image Data                | varies | to trailer         |
//! | Trailer                   | len-1  | 1                  |
use crate::error::{Error, FrameDefect, Result};
use std::convert::TryFrom;
use std::time::Duration;

/// Bytes per color table entry
const CHANNELS: usize = 3;

/// Offset of logical screen descriptor
pub const SCREEN_DESC_OFFSET: usize = 6;

/// Offset of graphic control extension
pub const GRAPHIC_CONTROL_OFFSET: usize = 13;

/// Offset of delay time within graphic control extension
pub const DELAY_OFFSET: usize = 4;

/// Offset of image descriptor
pub const IMAGE_DESC_OFFSET: usize = 21;

/// Offset of local color table
pub const COLOR_TABLE_OFFSET: usize = 31;

/// Block codes written to (or expected in) a GIF stream
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum BlockCode {
    Header_,
    LogicalScreenDesc_,
    GraphicControl_,
    Application_,
    ImageDesc_,
    Trailer_,
}

impl BlockCode {
    /// Get the signature bytes at the start of a block
    pub fn signature(self) -> &'static [u8] {
        use self::BlockCode::*;
        match self {
            Header_ => b"GIF",
            GraphicControl_ => b"!\xF9", // (0x21 0xF9) Extension / label
            Application_ => b"!\xFF",    // (0x21 0xFF) Extension / label
            ImageDesc_ => b",",          // (0x2C) Image separator
            Trailer_ => b";",            // (0x3B) GIF trailer
            LogicalScreenDesc_ => &[],
        }
    }

    /// Get the fixed size of a block (including signature)
    pub fn size(self) -> usize {
        use self::BlockCode::*;
        match self {
            Header_ => 6,
            LogicalScreenDesc_ => 7,
            GraphicControl_ => 8,
            Application_ => 19,
            ImageDesc_ => 10,
            Trailer_ => 1,
        }
    }
}

/// Policy for delays which do not fit in the 16-bit centisecond field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DelayPolicy {
    /// Fail with `Error::DelayOutOfRange`
    Reject,
    /// Saturate at 65535 centiseconds
    Clamp,
}

impl Default for DelayPolicy {
    fn default() -> Self {
        DelayPolicy::Reject
    }
}

impl DelayPolicy {
    /// Convert a delay to centiseconds, rounding to nearest.
    ///
    /// Ties round half up at microsecond precision, so 105 ms becomes 11 cs
    /// and 115 ms becomes 12 cs.  This differs from banker's rounding
    /// (half to even), which would give 10 cs for 105 ms.
    pub fn delay_time_cs(self, delay: Duration) -> Result<u16> {
        let cs = (delay.as_micros() + 5_000) / 10_000;
        match u16::try_from(cs) {
            Ok(cs) => Ok(cs),
            Err(_) => match self {
                DelayPolicy::Reject => Err(Error::DelayOutOfRange(delay)),
                DelayPolicy::Clamp => {
                    warn!("delay {:?} clamped to {} cs", delay, u16::MAX);
                    Ok(u16::MAX)
                }
            },
        }
    }
}

/// Netscape looping application extension
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopingExt {
    /// Number of times to loop animation (zero means loop forever)
    loop_count: u16,
}

impl LoopingExt {
    /// Application identifier and authentication code
    pub const APP_ID: &'static [u8; 11] = b"NETSCAPE2.0";

    /// Sub-block ID for loop count
    pub const SUB_BLOCK_ID: u8 = 1;

    pub fn with_loop_count(loop_count: u16) -> Self {
        LoopingExt { loop_count }
    }

    pub fn loop_count(&self) -> u16 {
        self.loop_count
    }
}

/// Size of a color table, from the 3-bit size field of a packed byte
fn color_table_size(flags: u8) -> usize {
    CHANNELS * (2 << (flags & 0b0000_0111))
}

/// Read a little-endian `u16`
fn read_u16(buf: &[u8], offset: usize) -> u16 {
    (buf[offset + 1] as u16) << 8 | buf[offset] as u16
}

/// Blocks of a single-frame GIF, borrowed from the input buffer
///
/// ## Example
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # let gif = &[
/// #   0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00,
/// #   0x02, 0x00, 0x00, 0x00, 0x00, 0x21, 0xF9, 0x04,
/// #   0x00, 0x0A, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00,
/// #   0x00, 0x00, 0x02, 0x00, 0x02, 0x00, 0x80, 0x00,
/// #   0x00, 0x00, 0xFF, 0xFF, 0xFF, 0x02, 0x02, 0x44,
/// #   0x54, 0x00, 0x3B,
/// # ][..];
/// let parts = gifweave::FrameParts::from_buf(gif)?;
/// assert_eq!(parts.width(), 2);
/// assert_eq!(parts.delay_time_cs(), 10);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Copy, Debug)]
pub struct FrameParts<'a> {
    screen_desc: &'a [u8],
    graphic_control: &'a [u8],
    image_desc: &'a [u8],
    color_table: &'a [u8],
    image_data: &'a [u8],
}

impl<'a> FrameParts<'a> {
    /// Split a single-frame GIF buffer into its blocks.
    ///
    /// Checks lengths and block signatures only; image data is not decoded.
    pub fn from_buf(buf: &'a [u8]) -> std::result::Result<Self, FrameDefect> {
        use self::BlockCode::*;
        let len = buf.len();
        if len < COLOR_TABLE_OFFSET {
            return Err(FrameDefect::TooShort(len));
        }
        check_signature(buf, 0, Header_)?;
        check_signature(buf, GRAPHIC_CONTROL_OFFSET, GraphicControl_)?;
        check_signature(buf, IMAGE_DESC_OFFSET, ImageDesc_)?;
        let image_desc =
            &buf[IMAGE_DESC_OFFSET..IMAGE_DESC_OFFSET + ImageDesc_.size()];
        let sz = color_table_size(image_desc[9]);
        let data_start = COLOR_TABLE_OFFSET + sz;
        if data_start > len {
            return Err(FrameDefect::ColorTableOverrun(sz));
        }
        // min code size + block terminator + trailer
        if data_start + 3 > len {
            return Err(FrameDefect::MissingImageData);
        }
        let data_end = len - Trailer_.size();
        if &buf[data_end..] != Trailer_.signature() {
            return Err(FrameDefect::MissingTrailer);
        }
        let end = SCREEN_DESC_OFFSET + LogicalScreenDesc_.size();
        let screen_desc = &buf[SCREEN_DESC_OFFSET..end];
        let end = GRAPHIC_CONTROL_OFFSET + GraphicControl_.size();
        let graphic_control = &buf[GRAPHIC_CONTROL_OFFSET..end];
        let color_table = &buf[COLOR_TABLE_OFFSET..data_start];
        let image_data = &buf[data_start..data_end];
        debug!(
            "frame parts: color table {} bytes, image data {} bytes",
            sz,
            image_data.len()
        );
        Ok(FrameParts {
            screen_desc,
            graphic_control,
            image_desc,
            color_table,
            image_data,
        })
    }

    /// Get the logical screen descriptor (7 bytes)
    pub fn screen_desc(&self) -> &'a [u8] {
        self.screen_desc
    }

    /// Get the graphic control extension (8 bytes)
    pub fn graphic_control(&self) -> &'a [u8] {
        self.graphic_control
    }

    /// Get the image descriptor (10 bytes)
    pub fn image_desc(&self) -> &'a [u8] {
        self.image_desc
    }

    /// Get the local color table
    pub fn color_table(&self) -> &'a [u8] {
        self.color_table
    }

    /// Get the LZW image data, including min code size and terminator
    pub fn image_data(&self) -> &'a [u8] {
        self.image_data
    }

    pub fn screen_width(&self) -> u16 {
        read_u16(self.screen_desc, 0)
    }

    pub fn screen_height(&self) -> u16 {
        read_u16(self.screen_desc, 2)
    }

    /// Get the delay time in centiseconds
    pub fn delay_time_cs(&self) -> u16 {
        read_u16(self.graphic_control, DELAY_OFFSET)
    }

    pub fn left(&self) -> u16 {
        read_u16(self.image_desc, 1)
    }

    pub fn top(&self) -> u16 {
        read_u16(self.image_desc, 3)
    }

    pub fn width(&self) -> u16 {
        read_u16(self.image_desc, 5)
    }

    pub fn height(&self) -> u16 {
        read_u16(self.image_desc, 7)
    }

    /// Get the number of entries in the local color table
    pub fn color_table_len(&self) -> usize {
        self.color_table.len() / CHANNELS
    }
}

/// Check the signature of a block at a fixed offset
fn check_signature(
    buf: &[u8],
    offset: usize,
    bc: BlockCode,
) -> std::result::Result<(), FrameDefect> {
    let sig = bc.signature();
    if &buf[offset..offset + sig.len()] == sig {
        Ok(())
    } else {
        Err(FrameDefect::BadSignature(offset))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// 2x2 frame with a 2 entry color table
    #[rustfmt::skip]
    const FRAME: &[u8] = &[
        0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00,
        0x02, 0x00, 0x00, 0x00, 0x00, 0x21, 0xF9, 0x04,
        0x00, 0x0A, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00,
        0x00, 0x00, 0x02, 0x00, 0x02, 0x00, 0x80, 0x00,
        0x00, 0x00, 0xFF, 0xFF, 0xFF, 0x02, 0x02, 0x44,
        0x54, 0x00, 0x3B,
    ];

    #[test]
    fn parts() {
        let p = FrameParts::from_buf(FRAME).unwrap();
        assert_eq!(p.screen_width(), 2);
        assert_eq!(p.screen_height(), 2);
        assert_eq!(p.delay_time_cs(), 10);
        assert_eq!((p.left(), p.top()), (0, 0));
        assert_eq!((p.width(), p.height()), (2, 2));
        assert_eq!(p.color_table_len(), 2);
        assert_eq!(p.color_table(), &FRAME[31..37]);
        assert_eq!(p.image_data(), &[0x02, 0x02, 0x44, 0x54, 0x00]);
    }

    #[test]
    fn color_table_sizes() {
        assert_eq!(color_table_size(0b000), 6);
        assert_eq!(color_table_size(0b010), 24);
        assert_eq!(color_table_size(0b1000_0111), 768);
    }

    #[test]
    fn too_short() {
        let r = FrameParts::from_buf(&FRAME[..10]);
        assert_eq!(r.unwrap_err(), FrameDefect::TooShort(10));
    }

    #[test]
    fn bad_signatures() {
        let mut f = FRAME.to_vec();
        f[0] = b'X';
        let r = FrameParts::from_buf(&f);
        assert_eq!(r.unwrap_err(), FrameDefect::BadSignature(0));
        let mut f = FRAME.to_vec();
        f[14] = 0xFE;
        let r = FrameParts::from_buf(&f);
        assert_eq!(r.unwrap_err(), FrameDefect::BadSignature(13));
        let mut f = FRAME.to_vec();
        f[21] = 0;
        let r = FrameParts::from_buf(&f);
        assert_eq!(r.unwrap_err(), FrameDefect::BadSignature(21));
    }

    #[test]
    fn overrun() {
        let mut f = FRAME.to_vec();
        f[30] = 0x87; // 256 entries
        let r = FrameParts::from_buf(&f);
        assert_eq!(r.unwrap_err(), FrameDefect::ColorTableOverrun(768));
    }

    #[test]
    fn missing_image_data() {
        let mut f = FRAME[..37].to_vec();
        f.push(0x3B);
        let r = FrameParts::from_buf(&f);
        assert_eq!(r.unwrap_err(), FrameDefect::MissingImageData);
    }

    #[test]
    fn missing_trailer() {
        let r = FrameParts::from_buf(&FRAME[..FRAME.len() - 1]);
        assert_eq!(r.unwrap_err(), FrameDefect::MissingTrailer);
    }

    #[test]
    fn delay_rounding() {
        let p = DelayPolicy::Reject;
        assert_eq!(p.delay_time_cs(Duration::from_millis(500)).unwrap(), 50);
        assert_eq!(p.delay_time_cs(Duration::from_millis(100)).unwrap(), 10);
        assert_eq!(p.delay_time_cs(Duration::from_millis(104)).unwrap(), 10);
        assert_eq!(p.delay_time_cs(Duration::from_millis(105)).unwrap(), 11);
        assert_eq!(p.delay_time_cs(Duration::from_millis(0)).unwrap(), 0);
    }

    #[test]
    fn delay_ties_round_up() {
        let p = DelayPolicy::Reject;
        // half to even would give 12 here
        assert_eq!(p.delay_time_cs(Duration::from_millis(125)).unwrap(), 13);
        assert_eq!(p.delay_time_cs(Duration::from_millis(115)).unwrap(), 12);
        assert_eq!(p.delay_time_cs(Duration::from_millis(5)).unwrap(), 1);
        let under = Duration::from_micros(104_999);
        assert_eq!(p.delay_time_cs(under).unwrap(), 10);
    }

    #[test]
    fn delay_range() {
        let max = Duration::from_millis(655_350);
        let over = Duration::from_secs(700);
        let p = DelayPolicy::Reject;
        assert_eq!(p.delay_time_cs(max).unwrap(), u16::MAX);
        match p.delay_time_cs(over) {
            Err(Error::DelayOutOfRange(d)) => assert_eq!(d, over),
            r => panic!("unexpected {:?}", r),
        }
        let p = DelayPolicy::Clamp;
        assert_eq!(p.delay_time_cs(over).unwrap(), u16::MAX);
    }

    #[test]
    fn looping_ext() {
        assert_eq!(LoopingExt::default().loop_count(), 0);
        assert_eq!(LoopingExt::with_loop_count(5).loop_count(), 5);
        assert_eq!(LoopingExt::APP_ID.len(), 11);
    }
}
