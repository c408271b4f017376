// error.rs
//
// Copyright (c) 2025  Douglas Lau
//
use std::fmt;
use std::io;
use std::num::TryFromIntError;
use std::time::Duration;

/// Defect found in a single-frame input buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameDefect {
    /// Buffer ends before the image descriptor is complete.
    TooShort(usize),
    /// Block signature not where the fixed layout expects it.
    BadSignature(usize),
    /// Local color table extends past the end of the buffer.
    ColorTableOverrun(usize),
    /// No room for LZW minimum code size and block terminator.
    MissingImageData,
    /// Last byte is not the GIF trailer.
    MissingTrailer,
}

/// Errors encountered while assembling or encoding
#[derive(Debug)]
pub enum Error {
    /// A wrapped I/O error from the output sink.
    Io(io::Error),
    /// Integer out of bounds.
    TryFromInt(TryFromIntError),
    /// Frame input buffer does not have the expected single-frame layout.
    MalformedFrame {
        /// Position of the failing `add_frame` call (0-based), counting
        /// earlier rejected frames
        frame: usize,
        /// What is wrong with it
        defect: FrameDefect,
    },
    /// Frame delay does not fit in 16 bits of centiseconds.
    DelayOutOfRange(Duration),
    /// Assembler already closed, or aborted by a failed write.
    Closed,
    /// Assembler closed without any frames.
    NoFrames,
    /// Palette must have between 1 and 256 entries.
    InvalidPalette(usize),
    /// Raster contains a color index outside the color table.
    InvalidColorIndex(u8),
}

/// Gifweave result type
pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for FrameDefect {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FrameDefect::TooShort(len) => {
                write!(fmt, "too short ({} bytes)", len)
            }
            FrameDefect::BadSignature(offset) => {
                write!(fmt, "bad block signature at offset {}", offset)
            }
            FrameDefect::ColorTableOverrun(sz) => {
                write!(fmt, "local color table ({} bytes) overruns buffer", sz)
            }
            FrameDefect::MissingImageData => write!(fmt, "missing image data"),
            FrameDefect::MissingTrailer => write!(fmt, "missing trailer"),
        }
    }
}

impl std::error::Error for FrameDefect {}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(fmt),
            Error::TryFromInt(err) => err.fmt(fmt),
            Error::MalformedFrame { frame, defect } => {
                write!(fmt, "malformed frame {}: {}", frame, defect)
            }
            Error::DelayOutOfRange(delay) => {
                write!(fmt, "delay out of range: {:?}", delay)
            }
            _ => fmt::Debug::fmt(self, fmt),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            Error::TryFromInt(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<TryFromIntError> for Error {
    fn from(err: TryFromIntError) -> Self {
        Error::TryFromInt(err)
    }
}
