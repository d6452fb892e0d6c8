//! libavutil function declarations
//!
//! Memory allocation, buffer references, and the diagnostic string helper.

use super::types::*;
use std::os::raw::{c_char, c_int, c_void};

unsafe extern "C" {
    // ========================================================================
    // Memory Allocation
    // ========================================================================

    /// Allocate a memory block with alignment suitable for all memory accesses
    pub fn av_malloc(size: usize) -> *mut c_void;

    /// Allocate a zero-initialized memory block
    pub fn av_mallocz(size: usize) -> *mut c_void;

    /// Free a memory block which has been allocated with av_malloc
    pub fn av_free(ptr: *mut c_void);

    /// Free a memory block and set the pointer to NULL
    pub fn av_freep(ptr: *mut c_void);

    // ========================================================================
    // Buffer Reference Management
    // ========================================================================

    /// Create a new reference to an AVBuffer
    pub fn av_buffer_ref(buf: *const AVBufferRef) -> *mut AVBufferRef;

    /// Free a given reference and automatically free the buffer if no more refs
    pub fn av_buffer_unref(buf: *mut *mut AVBufferRef);

    // ========================================================================
    // Error Handling
    // ========================================================================

    /// Put a description of the AVERROR code errnum in errbuf
    pub fn av_strerror(errnum: c_int, errbuf: *mut c_char, errbuf_size: usize) -> c_int;
}
