//! libavformat AVIO declarations
//!
//! Custom I/O contexts and the callback trampoline signatures the native I/O
//! layer expects. The signatures must match the native function-pointer ABI
//! exactly (argument order, integer widths, sentinel conventions).

use std::marker::PhantomData;
use std::os::raw::{c_int, c_void};

/// Opaque AVIOContext structure (byte-stream I/O context)
#[repr(C)]
pub struct AVIOContext {
    _opaque: [u8; 0],
    _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Read callback for custom I/O
///
/// Fills `buf` with up to `buf_size` bytes. Returns the number of bytes read,
/// or AVERROR_EOF at end of stream - never 0.
pub type ReadPacketFn =
    unsafe extern "C" fn(opaque: *mut c_void, buf: *mut u8, buf_size: c_int) -> c_int;

/// Write callback for custom I/O
///
/// Consumes `buf_size` bytes from `buf`. Returns the number of bytes written,
/// or a negative AVERROR on failure.
pub type WritePacketFn =
    unsafe extern "C" fn(opaque: *mut c_void, buf: *const u8, buf_size: c_int) -> c_int;

/// Seek callback for custom I/O
///
/// `whence` is SEEK_SET/SEEK_CUR/SEEK_END, possibly OR'd with AVSEEK_FORCE,
/// or the AVSEEK_SIZE sentinel asking for the total stream size.
pub type SeekFn = unsafe extern "C" fn(opaque: *mut c_void, offset: i64, whence: c_int) -> i64;

unsafe extern "C" {
    /// Allocate and initialize an AVIOContext for buffered I/O
    ///
    /// `buffer` must come from av_malloc and friends; libavformat may free and
    /// replace it, so the current buffer must be read back from the context at
    /// teardown time. Disabled capabilities pass None so the native layer
    /// knows not to attempt them.
    pub fn avio_alloc_context(
        buffer: *mut u8,
        buffer_size: c_int,
        write_flag: c_int,
        opaque: *mut c_void,
        read_packet: Option<ReadPacketFn>,
        write_packet: Option<WritePacketFn>,
        seek: Option<SeekFn>,
    ) -> *mut AVIOContext;

    /// Free the AVIOContext struct itself (not the I/O buffer)
    pub fn avio_context_free(s: *mut *mut AVIOContext);

    /// Force flushing of buffered data
    pub fn avio_flush(s: *mut AVIOContext);
}

// ============================================================================
// Seek Whence Values
// ============================================================================

pub mod seek_whence {
    use std::os::raw::c_int;

    /// Seek from beginning
    pub const SEEK_SET: c_int = 0;
    /// Seek from current position
    pub const SEEK_CUR: c_int = 1;
    /// Seek from end
    pub const SEEK_END: c_int = 2;
    /// Sentinel: return the total stream size instead of seeking
    pub const AVSEEK_SIZE: c_int = 0x10000;
    /// Flag: seek even if it is expensive
    pub const AVSEEK_FORCE: c_int = 0x20000;
}
