//! FFmpeg status-code translation
//!
//! Negative native statuses become structured `FFmpegError`s, except for the
//! sentinel codes (EAGAIN "try again", AVERROR_EOF "end of stream") which are
//! normal control-flow signals and must be filtered out before the error
//! taxonomy applies.

use std::ffi::CStr;
use std::fmt;
use std::os::raw::c_int;

// ============================================================================
// FFmpeg Error Codes
// ============================================================================

/// End of file / stream reached. Sentinel, not a failure.
pub const AVERROR_EOF: c_int = fferrtag(b'E', b'O', b'F', b' ');

/// Invalid data found while processing input
pub const AVERROR_INVALIDDATA: c_int = fferrtag(b'I', b'N', b'D', b'A');

/// Generic error in an external library
pub const AVERROR_EXTERNAL: c_int = fferrtag(b'E', b'X', b'T', b' ');

/// Unknown error
pub const AVERROR_UNKNOWN: c_int = fferrtag(b'U', b'N', b'K', b'N');

// POSIX error codes (negated). FFmpeg negates errno values, so the numeric
// value of EAGAIN is platform specific.

/// Resource temporarily unavailable (try again). Sentinel, not a failure.
/// Linux: EAGAIN = 11, macOS: EAGAIN = 35
#[cfg(target_os = "macos")]
pub const AVERROR_EAGAIN: c_int = -35;

#[cfg(not(target_os = "macos"))]
pub const AVERROR_EAGAIN: c_int = -11;

/// Out of memory
pub const AVERROR_ENOMEM: c_int = -12;

/// Invalid argument
pub const AVERROR_EINVAL: c_int = -22;

/// I/O error (used by the AVIO trampolines when a stream callback fails)
pub const AVERROR_EIO: c_int = -5;

/// Operation not supported (used for unanswerable AVSEEK_SIZE queries)
pub const AVERROR_ENOSYS: c_int = -38;

// ============================================================================
// Error Tag Helper
// ============================================================================

/// Create FFmpeg error tag from 4 bytes
const fn fferrtag(a: u8, b: u8, c: u8, d: u8) -> c_int {
    -((a as c_int) | ((b as c_int) << 8) | ((c as c_int) << 16) | ((d as c_int) << 24))
}

// ============================================================================
// FFmpeg Error Type
// ============================================================================

/// FFmpeg error with code and native diagnostic message
#[derive(Clone)]
pub struct FFmpegError {
    /// Error code (negative)
    pub code: c_int,
    /// Human-readable message from av_strerror
    pub message: String,
}

impl FFmpegError {
    /// Create error from FFmpeg error code, fetching the native diagnostic
    pub fn from_code(code: c_int) -> Self {
        let mut buf = [0 as std::os::raw::c_char; 256];
        unsafe {
            super::avutil::av_strerror(code, buf.as_mut_ptr(), buf.len());
            let message = CStr::from_ptr(buf.as_ptr()).to_string_lossy().into_owned();
            Self { code, message }
        }
    }

    /// Create error with custom message
    pub fn new(code: c_int, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Check if this is EAGAIN (resource temporarily unavailable)
    #[inline]
    pub fn is_eagain(&self) -> bool {
        self.code == AVERROR_EAGAIN
    }

    /// Check if this is the end-of-stream sentinel
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.code == AVERROR_EOF
    }

    /// Check if this code is one of the non-error sentinels
    #[inline]
    pub fn is_sentinel(&self) -> bool {
        self.is_eagain() || self.is_eof()
    }
}

impl fmt::Debug for FFmpegError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FFmpegError")
            .field("code", &self.code)
            .field("message", &self.message)
            .finish()
    }
}

impl fmt::Display for FFmpegError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FFmpeg error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for FFmpegError {}

/// Result type for FFmpeg operations
pub type FFmpegResult<T> = Result<T, FFmpegError>;

// ============================================================================
// Error Checking
// ============================================================================

/// Check FFmpeg return code and convert to Result
///
/// Returns Ok with the value if >= 0, Err with FFmpegError if < 0
#[inline]
pub fn check_error(ret: c_int) -> FFmpegResult<c_int> {
    if ret < 0 {
        Err(FFmpegError::from_code(ret))
    } else {
        Ok(ret)
    }
}

/// Check FFmpeg return code, treating EAGAIN as a non-error
///
/// Returns Ok(Some(value)) if >= 0, Ok(None) if EAGAIN, Err otherwise
#[inline]
pub fn check_error_except_eagain(ret: c_int) -> FFmpegResult<Option<c_int>> {
    if ret >= 0 {
        Ok(Some(ret))
    } else if ret == AVERROR_EAGAIN {
        Ok(None)
    } else {
        Err(FFmpegError::from_code(ret))
    }
}

/// Check FFmpeg return code, treating both sentinels as non-errors
///
/// Returns Ok(Some(value)) if >= 0, Ok(None) if EAGAIN/EOF, Err otherwise
#[inline]
pub fn check_error_except_eagain_eof(ret: c_int) -> FFmpegResult<Option<c_int>> {
    if ret >= 0 {
        Ok(Some(ret))
    } else if ret == AVERROR_EAGAIN || ret == AVERROR_EOF {
        Ok(None)
    } else {
        Err(FFmpegError::from_code(ret))
    }
}

/// Get error message for an FFmpeg error code
pub fn get_error_message(code: c_int) -> String {
    let mut buf = [0 as std::os::raw::c_char; 256];
    unsafe {
        super::avutil::av_strerror(code, buf.as_mut_ptr(), buf.len());
        CStr::from_ptr(buf.as_ptr()).to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_negative() {
        assert!(AVERROR_EOF < 0);
        assert!(AVERROR_EAGAIN < 0);
        assert!(AVERROR_EINVAL < 0);
        assert!(AVERROR_ENOSYS < 0);
    }

    #[test]
    fn check_error_rejects_all_negatives() {
        assert!(check_error(0).is_ok());
        assert!(check_error(100).is_ok());
        assert!(check_error(-1).is_err());
        assert!(check_error(AVERROR_EAGAIN).is_err());
    }

    #[test]
    fn sentinels_are_not_errors() {
        assert_eq!(check_error_except_eagain(AVERROR_EAGAIN).unwrap(), None);
        assert!(check_error_except_eagain(AVERROR_EOF).is_err());

        assert_eq!(check_error_except_eagain_eof(0).unwrap(), Some(0));
        assert_eq!(
            check_error_except_eagain_eof(AVERROR_EAGAIN).unwrap(),
            None
        );
        assert_eq!(check_error_except_eagain_eof(AVERROR_EOF).unwrap(), None);
        assert!(check_error_except_eagain_eof(AVERROR_EINVAL).is_err());
    }

    #[test]
    fn sentinel_classification() {
        assert!(FFmpegError::new(AVERROR_EOF, "eof").is_sentinel());
        assert!(FFmpegError::new(AVERROR_EAGAIN, "again").is_sentinel());
        assert!(!FFmpegError::new(AVERROR_EINVAL, "inval").is_sentinel());
    }
}
