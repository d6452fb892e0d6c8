//! Core FFmpeg type definitions
//!
//! All FFmpeg structs are opaque (zero-sized) to avoid version-specific layout
//! dependencies. Field access is done via the thin C accessor shim in
//! `accessors.c`.

use std::marker::PhantomData;
use std::os::raw::c_int;

// ============================================================================
// Rational Number
// ============================================================================

/// Rational number for time bases and frame rates
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AVRational {
    /// Numerator
    pub num: c_int,
    /// Denominator
    pub den: c_int,
}

impl AVRational {
    pub const fn new(num: c_int, den: c_int) -> Self {
        Self { num, den }
    }

    pub fn as_f64(&self) -> f64 {
        if self.den == 0 {
            0.0
        } else {
            self.num as f64 / self.den as f64
        }
    }

}

// ============================================================================
// Media Kind
// ============================================================================

/// The media kinds a codec context can carry.
///
/// Closed set: contexts declaring any other native `AVMediaType` (unknown,
/// attachment) are rejected at construction time rather than carried around
/// as a raw integer.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AVMediaType {
    Video = 0,
    Audio = 1,
    Data = 2,
    Subtitle = 3,
}

impl AVMediaType {
    pub fn from_raw(raw: c_int) -> Option<Self> {
        match raw {
            0 => Some(Self::Video),
            1 => Some(Self::Audio),
            2 => Some(Self::Data),
            3 => Some(Self::Subtitle),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> c_int {
        *self as c_int
    }
}

// ============================================================================
// Codec IDs
// ============================================================================

/// Codec IDs this wrapper knows by name
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AVCodecID {
    None = 0,
    Mpeg4 = 12,
    H264 = 27,
    Vp8 = 139,
    Vp9 = 167,
    Hevc = 173, // H.265
    Av1 = 226,
    Mp3 = 86017,
    Aac = 86018,
    Flac = 86028,
    Opus = 86076,
}

impl AVCodecID {
    /// Get the raw FFmpeg codec ID value
    pub fn as_raw(&self) -> c_int {
        *self as c_int
    }
}

// ============================================================================
// Pixel Formats
// ============================================================================

/// Video pixel formats (the subset these wrappers configure directly)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AVPixelFormat {
    None = -1,
    // Planar YUV formats
    Yuv420p = 0,
    Yuv422p = 4,
    Yuv444p = 5,
    Yuva420p = 33,
    // Semi-planar formats
    Nv12 = 23,
    Nv21 = 24,
    // RGB formats
    Rgb24 = 2,
    Bgr24 = 3,
    Argb = 25,
    Rgba = 26,
    Abgr = 27,
    Bgra = 28,
    // 10-bit formats
    Yuv420p10le = 64,
    // Hardware surface formats
    Vaapi = 53,
    Cuda = 119,
    Videotoolbox = 162,
}

impl AVPixelFormat {
    pub fn from_raw(raw: c_int) -> Self {
        match raw {
            0 => Self::Yuv420p,
            2 => Self::Rgb24,
            3 => Self::Bgr24,
            4 => Self::Yuv422p,
            5 => Self::Yuv444p,
            23 => Self::Nv12,
            24 => Self::Nv21,
            25 => Self::Argb,
            26 => Self::Rgba,
            27 => Self::Abgr,
            28 => Self::Bgra,
            33 => Self::Yuva420p,
            53 => Self::Vaapi,
            64 => Self::Yuv420p10le,
            119 => Self::Cuda,
            162 => Self::Videotoolbox,
            _ => Self::None,
        }
    }

    /// Get the raw FFmpeg pixel format value
    pub fn as_raw(&self) -> c_int {
        *self as c_int
    }

    /// Number of planes for this pixel format
    pub fn num_planes(&self) -> usize {
        match self {
            Self::Yuv420p | Self::Yuv422p | Self::Yuv444p => 3,
            Self::Yuva420p => 4,
            Self::Nv12 | Self::Nv21 => 2,
            Self::Rgb24 | Self::Bgr24 | Self::Rgba | Self::Bgra | Self::Argb | Self::Abgr => 1,
            _ => 0,
        }
    }

    /// Whether this is a hardware surface format
    pub fn is_hardware(&self) -> bool {
        matches!(self, Self::Videotoolbox | Self::Cuda | Self::Vaapi)
    }
}

// ============================================================================
// Hardware Device Types
// ============================================================================

/// Hardware acceleration device types
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AVHWDeviceType {
    None = 0,
    Vdpau = 1,
    Cuda = 2,
    Vaapi = 3,
    Dxva2 = 4,
    Qsv = 5,
    Videotoolbox = 6,
    D3d11va = 7,
    Drm = 8,
    Opencl = 9,
    Mediacodec = 10,
    Vulkan = 11,
    D3d12va = 12,
}

impl AVHWDeviceType {
    pub fn from_raw(raw: c_int) -> Option<Self> {
        match raw {
            1 => Some(Self::Vdpau),
            2 => Some(Self::Cuda),
            3 => Some(Self::Vaapi),
            4 => Some(Self::Dxva2),
            5 => Some(Self::Qsv),
            6 => Some(Self::Videotoolbox),
            7 => Some(Self::D3d11va),
            8 => Some(Self::Drm),
            9 => Some(Self::Opencl),
            10 => Some(Self::Mediacodec),
            11 => Some(Self::Vulkan),
            12 => Some(Self::D3d12va),
            _ => None,
        }
    }

    /// Get the raw FFmpeg hardware device type value
    pub fn as_raw(&self) -> c_int {
        *self as c_int
    }
}

// ============================================================================
// Opaque FFmpeg Types
// ============================================================================

/// Opaque AVCodec structure (codec implementation descriptor)
#[repr(C)]
pub struct AVCodec {
    _opaque: [u8; 0],
    _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVCodecContext structure (encoder/decoder instance)
#[repr(C)]
pub struct AVCodecContext {
    _opaque: [u8; 0],
    _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVBufferRef structure (reference-counted buffer)
#[repr(C)]
pub struct AVBufferRef {
    _opaque: [u8; 0],
    _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVDictionary structure (key-value options)
#[repr(C)]
pub struct AVDictionary {
    _opaque: [u8; 0],
    _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

// ============================================================================
// Constants
// ============================================================================

/// Required over-allocation for buffers handed to the decoder as extradata or
/// packet data. The native bitstream readers may read up to this many bytes
/// past the logical end; the padding must exist and be zeroed.
pub const AV_INPUT_BUFFER_PADDING_SIZE: usize = 64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_kind_is_a_closed_set() {
        assert_eq!(AVMediaType::from_raw(0), Some(AVMediaType::Video));
        assert_eq!(AVMediaType::from_raw(1), Some(AVMediaType::Audio));
        assert_eq!(AVMediaType::from_raw(3), Some(AVMediaType::Subtitle));
        // AVMEDIA_TYPE_UNKNOWN and AVMEDIA_TYPE_ATTACHMENT are rejected
        assert_eq!(AVMediaType::from_raw(-1), None);
        assert_eq!(AVMediaType::from_raw(4), None);
    }

    #[test]
    fn pixel_format_raw_round_trip() {
        for fmt in [
            AVPixelFormat::Yuv420p,
            AVPixelFormat::Nv12,
            AVPixelFormat::Rgba,
            AVPixelFormat::Vaapi,
        ] {
            assert_eq!(AVPixelFormat::from_raw(fmt.as_raw()), fmt);
        }
        assert_eq!(AVPixelFormat::from_raw(9999), AVPixelFormat::None);
    }

    #[test]
    fn hw_device_type_from_raw() {
        assert_eq!(AVHWDeviceType::from_raw(2), Some(AVHWDeviceType::Cuda));
        assert_eq!(AVHWDeviceType::from_raw(0), None);
        assert_eq!(AVHWDeviceType::from_raw(999), None);
    }
}
