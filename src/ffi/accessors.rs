//! Rust declarations for the C accessor shim
//!
//! FFmpeg struct layouts shift between versions, so field access goes through
//! these thin C functions compiled against the headers of the linked build.

use super::avformat::AVIOContext;
use super::types::*;
use std::os::raw::{c_char, c_int};

unsafe extern "C" {
    // ========================================================================
    // AVCodecContext
    // ========================================================================

    /// Declared media kind of the bound codec (falls back to the context's own
    /// codec_type field when no codec is bound yet)
    pub fn ffctx_get_media_type(ctx: *const AVCodecContext) -> c_int;

    pub fn ffctx_get_codec_name(ctx: *const AVCodecContext) -> *const c_char;
    pub fn ffctx_get_codec_long_name(ctx: *const AVCodecContext) -> *const c_char;
    pub fn ffctx_get_codec_capabilities(ctx: *const AVCodecContext) -> c_int;

    pub fn ffctx_set_thread_count(ctx: *mut AVCodecContext, thread_count: c_int);
    pub fn ffctx_get_thread_count(ctx: *const AVCodecContext) -> c_int;
    pub fn ffctx_set_thread_type(ctx: *mut AVCodecContext, thread_type: c_int);
    pub fn ffctx_get_thread_type(ctx: *const AVCodecContext) -> c_int;

    pub fn ffctx_set_time_base(ctx: *mut AVCodecContext, num: c_int, den: c_int);
    pub fn ffctx_get_time_base(ctx: *const AVCodecContext, num: *mut c_int, den: *mut c_int);
    pub fn ffctx_set_framerate(ctx: *mut AVCodecContext, num: c_int, den: c_int);
    pub fn ffctx_get_framerate(ctx: *const AVCodecContext, num: *mut c_int, den: *mut c_int);

    pub fn ffctx_get_extradata(ctx: *const AVCodecContext) -> *const u8;
    pub fn ffctx_get_extradata_size(ctx: *const AVCodecContext) -> c_int;

    /// Point the context at a caller-allocated extradata buffer. The buffer
    /// must come from av_mallocz with AV_INPUT_BUFFER_PADDING_SIZE slack.
    pub fn ffctx_install_extradata(ctx: *mut AVCodecContext, data: *mut u8, size: c_int);

    /// av_freep the current extradata buffer and zero the size
    pub fn ffctx_free_extradata(ctx: *mut AVCodecContext);

    // ========================================================================
    // AVIOContext
    // ========================================================================

    /// Current I/O buffer - libavformat may have replaced the one passed at
    /// construction, so teardown must read it back
    pub fn ffio_get_buffer(ctx: *const AVIOContext) -> *mut u8;

    pub fn ffio_get_seekable(ctx: *const AVIOContext) -> c_int;
    pub fn ffio_get_write_flag(ctx: *const AVIOContext) -> c_int;

    /// Whether a read callback was registered (a stream without the read
    /// capability passes null, and the native layer never attempts reads)
    pub fn ffio_has_read_fn(ctx: *const AVIOContext) -> c_int;

    // ========================================================================
    // Hardware Device / Frames Context
    // ========================================================================

    /// Device type recorded inside the AVHWDeviceContext behind the ref
    pub fn ffhwdev_get_type(ref_: *const AVBufferRef) -> c_int;

    pub fn ffhwframes_set_format(ref_: *mut AVBufferRef, format: c_int);
    pub fn ffhwframes_set_sw_format(ref_: *mut AVBufferRef, sw_format: c_int);
    pub fn ffhwframes_set_width(ref_: *mut AVBufferRef, width: c_int);
    pub fn ffhwframes_set_height(ref_: *mut AVBufferRef, height: c_int);
    pub fn ffhwframes_set_initial_pool_size(ref_: *mut AVBufferRef, initial_pool_size: c_int);

    pub fn ffhwframes_get_format(ref_: *const AVBufferRef) -> c_int;
    pub fn ffhwframes_get_sw_format(ref_: *const AVBufferRef) -> c_int;
    pub fn ffhwframes_get_width(ref_: *const AVBufferRef) -> c_int;
    pub fn ffhwframes_get_height(ref_: *const AVBufferRef) -> c_int;
    pub fn ffhwframes_get_initial_pool_size(ref_: *const AVBufferRef) -> c_int;

    /// Fixed device-type to surface-format table, evaluated against the
    /// linked FFmpeg's own enum constants. Returns AV_PIX_FMT_NONE (-1) for a
    /// device type with no entry.
    pub fn ffhw_surface_format(device_type: c_int) -> c_int;
}
