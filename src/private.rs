// private.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! Private module for top-level items
use crate::block::{DelayPolicy, FrameParts, LoopingExt};
use crate::encode::ByteWriter;
use crate::error::{Error, Result};
use std::io::Write;
use std::time::Duration;

/// Assembler state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// No frames written yet
    AwaitingFirstFrame,
    /// Preamble and at least one frame written
    StreamingFrames,
    /// Trailer written (or close attempted)
    Closed,
    /// Output sink failed; stream is incomplete
    Aborted,
}

/// Animated GIF assembler
///
/// Stitches single-frame GIF images into one looping animation.  Each frame
/// must have the block layout documented in the [block] module; its
/// compressed image data is copied verbatim.
///
/// The trailer is written by [close].  If the assembler is dropped after
/// writing frames without being closed, the trailer is written then.
///
/// ## Example
/// ```
/// use gifweave::{Assembler, StillEncoder};
/// use pix::{gray::Gray8, rgb::SRgb8, Palette, Raster};
/// use std::error::Error;
/// use std::time::Duration;
///
/// fn animate(out: &mut Vec<u8>) -> Result<(), Box<dyn Error>> {
///     let mut palette = Palette::new(2);
///     palette.set_entry(SRgb8::new(0, 0, 0));
///     palette.set_entry(SRgb8::new(0xFF, 0xFF, 0));
///     let still = StillEncoder::new();
///     let mut asm = Assembler::new(out, 0);
///     for i in 0..4 {
///         let mut raster = Raster::<Gray8>::with_clear(4, 4);
///         *raster.pixel_mut(i, i) = Gray8::new(1);
///         let frame = still.encode_indexed(&raster, &palette)?;
///         asm.add_frame(&frame, Duration::from_millis(250))?;
///     }
///     asm.close()?;
///     Ok(())
/// }
/// # let mut out = vec![];
/// # animate(&mut out).unwrap();
/// # assert_eq!(out.last(), Some(&0x3B));
/// ```
///
/// [block]: block/index.html
/// [close]: struct.Assembler.html#method.close
pub struct Assembler<W: Write> {
    /// Writer for output data
    writer: ByteWriter<W>,
    /// Looping extension for preamble
    looping_ext: LoopingExt,
    /// Policy for out of range delays
    delay_policy: DelayPolicy,
    /// Current state
    state: State,
    /// Count of frames written
    frames: usize,
    /// Count of `add_frame` calls on an open assembler
    calls: usize,
}

impl<W: Write> Assembler<W> {
    /// Create a new animated GIF assembler.
    ///
    /// * `writer` Output sink (buffering is up to the caller).
    /// * `loop_count` Number of times to loop; 0 loops forever.
    pub fn new(writer: W, loop_count: u16) -> Self {
        Assembler {
            writer: ByteWriter::new(writer),
            looping_ext: LoopingExt::with_loop_count(loop_count),
            delay_policy: DelayPolicy::default(),
            state: State::AwaitingFirstFrame,
            frames: 0,
            calls: 0,
        }
    }

    /// Set the policy for delays longer than 655.35 seconds.
    pub fn with_delay_policy(mut self, delay_policy: DelayPolicy) -> Self {
        self.delay_policy = delay_policy;
        self
    }

    /// Get the loop count
    pub fn loop_count(&self) -> u16 {
        self.looping_ext.loop_count()
    }

    /// Get the number of frames written
    pub fn frame_count(&self) -> usize {
        self.frames
    }

    /// Get the number of bytes written
    pub fn byte_count(&self) -> usize {
        self.writer.count()
    }

    /// Add a frame to the animation.
    ///
    /// * `frame` Complete single-frame GIF.
    /// * `delay` Time to display the frame.
    ///
    /// Nothing is written unless the frame layout and delay are valid.
    /// A `MalformedFrame` error carries the position of this call, counting
    /// rejected frames too.
    pub fn add_frame(&mut self, frame: &[u8], delay: Duration) -> Result<()> {
        match self.state {
            State::Closed | State::Aborted => return Err(Error::Closed),
            _ => (),
        }
        let call = self.calls;
        self.calls += 1;
        let parts = FrameParts::from_buf(frame)
            .map_err(|defect| Error::MalformedFrame { frame: call, defect })?;
        let delay_time_cs = self.delay_policy.delay_time_cs(delay)?;
        let res = self.format_frame(&parts, delay_time_cs);
        if res.is_err() {
            self.state = State::Aborted;
        }
        res
    }

    /// Write all blocks for one frame
    fn format_frame(
        &mut self,
        parts: &FrameParts,
        delay_time_cs: u16,
    ) -> Result<()> {
        let w = &mut self.writer;
        if self.state == State::AwaitingFirstFrame {
            debug!(
                "preamble: {}x{}, loop count {}",
                parts.screen_width(),
                parts.screen_height(),
                self.looping_ext.loop_count()
            );
            w.write_header()?;
            parts.format_screen_desc(w)?;
            self.looping_ext.format(w)?;
            self.state = State::StreamingFrames;
        }
        debug!(
            "frame {}: {}x{} at {},{}, delay {} cs",
            self.frames,
            parts.width(),
            parts.height(),
            parts.left(),
            parts.top(),
            delay_time_cs
        );
        parts.format_graphic_control(w, delay_time_cs)?;
        parts.format_image(w)?;
        self.frames += 1;
        Ok(())
    }

    /// Close the animation, writing the trailer and flushing the sink.
    ///
    /// Returns `Error::Closed` if already closed, or `Error::NoFrames` if no
    /// frames were added (nothing is written in that case).
    pub fn close(&mut self) -> Result<()> {
        match self.state {
            State::AwaitingFirstFrame => {
                self.state = State::Closed;
                Err(Error::NoFrames)
            }
            State::StreamingFrames => self.finish(),
            State::Closed | State::Aborted => Err(Error::Closed),
        }
    }

    /// Write trailer and flush
    fn finish(&mut self) -> Result<()> {
        self.state = State::Closed;
        self.writer.write_trailer()?;
        self.writer.flush()?;
        info!(
            "animation closed: {} frames, {} bytes",
            self.frames,
            self.writer.count()
        );
        Ok(())
    }
}

impl<W: Write> Drop for Assembler<W> {
    fn drop(&mut self) {
        if self.state == State::StreamingFrames {
            warn!("assembler dropped without close");
            if let Err(e) = self.finish() {
                warn!("trailer not written: {}", e);
            }
        }
    }
}
