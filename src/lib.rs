// lib.rs      gifweave crate.
//
// Copyright (c) 2025  Douglas Lau
//
//! Assemble single-frame GIF images into a looping animated GIF.
//!
//! Each input frame is a complete single-frame GIF with a fixed block layout
//! (see [block]).  Container framing is rewritten; compressed image data is
//! copied verbatim.
//!
//! [block]: block/index.html
#![forbid(unsafe_code)]

#[macro_use]
extern crate log;

pub mod block;
mod encode;
mod error;
mod private;
mod still;

pub use crate::block::{DelayPolicy, FrameParts};
pub use crate::error::{Error, FrameDefect, Result};
pub use crate::private::Assembler;
pub use crate::still::StillEncoder;
