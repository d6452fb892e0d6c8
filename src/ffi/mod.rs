//! Hand-written FFmpeg C bindings (no bindgen)
//!
//! All version-sensitive FFmpeg structs are opaque - field access goes through
//! the thin C accessor shim compiled from `accessors.c`.

pub mod accessors;
pub mod avcodec;
pub mod avformat;
pub mod avutil;
pub mod error;
pub mod hwaccel;
pub mod types;

pub use error::{
    check_error, check_error_except_eagain, check_error_except_eagain_eof, FFmpegError,
    FFmpegResult,
};
pub use types::*;
