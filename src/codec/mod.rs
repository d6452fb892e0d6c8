//! Safe RAII wrappers around FFmpeg's resource handles
//!
//! Each wrapper owns exactly one native pointer, rejects configuration once
//! active, and tears down idempotently. Disposal never fails; everything else
//! reports through `CodecResult`.

pub mod context;
pub mod hwdevice;
pub mod hwframes;
pub mod io_context;

pub use context::CodecContext;
pub use hwdevice::{HwDeviceContext, HwFrameConstraints};
pub use hwframes::HwFramePool;
pub use io_context::{IoContext, IoStream};

use crate::ffi::{AVCodecID, AVHWDeviceType, AVPixelFormat};

/// Wrapper error taxonomy.
///
/// `InvalidState`, `Disposed`, `InvalidConfig` and `UnsupportedDevice` are
/// contract violations (caller bugs, not retryable). `Native` and `OpenFailed`
/// carry the native diagnostic and leave retry policy to the caller. Expected
/// cold paths (device absent, pool init refused) are `Option`s, not errors.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("FFmpeg error: {0}")]
    Native(#[from] crate::ffi::FFmpegError),

    #[error("could not open codec: {0}")]
    OpenFailed(crate::ffi::FFmpegError),

    #[error("decoder not found for codec {0:?}")]
    DecoderNotFound(AVCodecID),

    #[error("encoder not found for codec {0:?}")]
    EncoderNotFound(AVCodecID),

    #[error("codec not found: {0}")]
    CodecNotFound(String),

    #[error("failed to allocate {0}")]
    AllocationFailed(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    #[error("{0} has been disposed")]
    Disposed(&'static str),

    #[error("unsupported hardware device type: {0:?}")]
    UnsupportedDevice(AVHWDeviceType),
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Pixel format plus dimensions, as passed around when provisioning frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PictureFormat {
    pub width: i32,
    pub height: i32,
    pub pixel_format: AVPixelFormat,
}

impl PictureFormat {
    pub const fn new(width: i32, height: i32, pixel_format: AVPixelFormat) -> Self {
        Self {
            width,
            height,
            pixel_format,
        }
    }

    pub fn is_planar(&self) -> bool {
        self.pixel_format.num_planes() >= 2
    }

    /// Fit into `new_width` x `new_height`, optionally preserving aspect ratio
    /// and rounding dimensions up to a multiple of `align`.
    pub fn scaled(
        &self,
        mut new_width: i32,
        mut new_height: i32,
        keep_aspect_ratio: bool,
        align: i32,
    ) -> Self {
        if keep_aspect_ratio && self.width > 0 && self.height > 0 {
            let scale = f64::min(
                new_width as f64 / self.width as f64,
                new_height as f64 / self.height as f64,
            );
            new_width = (self.width as f64 * scale).round() as i32;
            new_height = (self.height as f64 * scale).round() as i32;
        }

        if align > 1 {
            // Signed div_ceil is unstable (int_roundings); this is equivalent
            // for align > 1, which the branch guarantees.
            new_width = (new_width + align - 1).div_euclid(align) * align;
            new_height = (new_height + align - 1).div_euclid(align) * align;
        }

        Self::new(new_width, new_height, self.pixel_format)
    }
}

impl std::fmt::Display for PictureFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{} {:?}",
            self.width, self.height, self.pixel_format
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_keeps_aspect_ratio() {
        let fmt = PictureFormat::new(1920, 1080, AVPixelFormat::Yuv420p);
        let scaled = fmt.scaled(1280, 1280, true, 1);
        assert_eq!(scaled.width, 1280);
        assert_eq!(scaled.height, 720);
        assert_eq!(scaled.pixel_format, AVPixelFormat::Yuv420p);
    }

    #[test]
    fn scaled_aligns_upward() {
        let fmt = PictureFormat::new(1918, 1078, AVPixelFormat::Nv12);
        let scaled = fmt.scaled(959, 539, false, 16);
        assert_eq!(scaled.width % 16, 0);
        assert_eq!(scaled.height % 16, 0);
    }
}
