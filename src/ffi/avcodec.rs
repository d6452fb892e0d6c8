//! libavcodec function declarations
//!
//! Codec discovery and context lifecycle. Encoding/decoding data flow lives
//! outside this crate; only the context state machine is declared here.

use super::types::*;
use std::os::raw::{c_char, c_int};

unsafe extern "C" {
    // ========================================================================
    // Codec Discovery
    // ========================================================================

    /// Find an encoder by codec ID
    pub fn avcodec_find_encoder(id: c_int) -> *const AVCodec;

    /// Find an encoder by name (e.g., "libx264", "h264_videotoolbox")
    pub fn avcodec_find_encoder_by_name(name: *const c_char) -> *const AVCodec;

    /// Find a decoder by codec ID
    pub fn avcodec_find_decoder(id: c_int) -> *const AVCodec;

    /// Find a decoder by name
    pub fn avcodec_find_decoder_by_name(name: *const c_char) -> *const AVCodec;

    // ========================================================================
    // Codec Context Lifecycle
    // ========================================================================

    /// Allocate an AVCodecContext and set its fields to default values
    pub fn avcodec_alloc_context3(codec: *const AVCodec) -> *mut AVCodecContext;

    /// Free the codec context and everything associated with it
    pub fn avcodec_free_context(avctx: *mut *mut AVCodecContext);

    /// Initialize the AVCodecContext to use the given AVCodec
    ///
    /// The codec argument may be NULL when the context was allocated for a
    /// specific codec already.
    pub fn avcodec_open2(
        avctx: *mut AVCodecContext,
        codec: *const AVCodec,
        options: *mut *mut AVDictionary,
    ) -> c_int;

    /// Whether the context has been opened with avcodec_open2
    pub fn avcodec_is_open(avctx: *mut AVCodecContext) -> c_int;

    /// Reset the internal codec state / flush internal buffers.
    /// Must be called after a discontinuous seek before feeding more data.
    pub fn avcodec_flush_buffers(avctx: *mut AVCodecContext);
}

// ============================================================================
// Codec Capability Flags
// ============================================================================

/// Codec requires flushing with NULL input at the end to give complete output
pub const AV_CODEC_CAP_DELAY: c_int = 1 << 5;

/// Codec supports frame-level multithreading
pub const AV_CODEC_CAP_FRAME_THREADS: c_int = 1 << 12;

/// Codec supports slice-based (or partition-based) multithreading
pub const AV_CODEC_CAP_SLICE_THREADS: c_int = 1 << 13;

// ============================================================================
// Thread Type Flags
// ============================================================================

/// Decode more than one frame at once
pub const FF_THREAD_FRAME: c_int = 1;

/// Decode more than one part of a single frame at once
pub const FF_THREAD_SLICE: c_int = 2;
