#![deny(clippy::all)]

//! Safe ownership layer over FFmpeg's C API
//!
//! This crate wraps the raw FFmpeg handles that are hardest to hold correctly:
//! codec contexts (open/closed state machine, extradata ownership), custom
//! AVIO contexts (callback trampolines that native code calls back into), and
//! hardware device / frame-pool contexts. Each wrapper enforces
//! configuration-before-open, single ownership, and idempotent teardown.
//!
//! Demuxing, muxing, and the packet/frame containers themselves are out of
//! scope; they consume these wrappers through the `as_raw()` escape hatches.

// FFmpeg C bindings (hand-written, no bindgen)
pub mod ffi;

// Safe RAII wrappers
pub mod codec;

// Shared owned/borrowed native-pointer primitive
mod handle;

pub use codec::{
    CodecContext, CodecError, CodecResult, HwDeviceContext, HwFrameConstraints, HwFramePool,
    IoContext, IoStream, PictureFormat,
};
pub use ffi::{AVCodecID, AVHWDeviceType, AVMediaType, AVPixelFormat, AVRational};
