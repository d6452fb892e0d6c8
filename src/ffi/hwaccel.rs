//! Hardware acceleration declarations
//!
//! Device context creation, frame-pool contexts, and the frame constraints
//! descriptor. Unlike the codec and AVIO structs, AVHWFramesConstraints has a
//! public install-time-stable layout, so it is declared directly.

use super::types::*;
use std::os::raw::{c_char, c_int, c_void};

unsafe extern "C" {
    // ========================================================================
    // Hardware Device Context
    // ========================================================================

    /// Open a device of the specified type and create an AVHWDeviceContext for it
    ///
    /// Returns 0 on success, a negative AVERROR if the device is unavailable.
    pub fn av_hwdevice_ctx_create(
        device_ctx: *mut *mut AVBufferRef,
        type_: c_int,
        device: *const c_char,
        opts: *mut AVDictionary,
        flags: c_int,
    ) -> c_int;

    /// Iterate over supported device types (pass AV_HWDEVICE_TYPE_NONE to start)
    pub fn av_hwdevice_iterate_types(prev: c_int) -> c_int;

    /// Get the string name of a hardware device type
    pub fn av_hwdevice_get_type_name(type_: c_int) -> *const c_char;

    /// Query the frame constraints for a device (caller frees the descriptor)
    pub fn av_hwdevice_get_hwframe_constraints(
        device_ctx: *mut AVBufferRef,
        hwconfig: *const c_void,
    ) -> *mut AVHWFramesConstraints;

    /// Free an AVHWFramesConstraints structure
    pub fn av_hwframe_constraints_free(constraints: *mut *mut AVHWFramesConstraints);

    // ========================================================================
    // Hardware Frames Context
    // ========================================================================

    /// Allocate a hardware frames context tied to the given device
    pub fn av_hwframe_ctx_alloc(device_ctx: *mut AVBufferRef) -> *mut AVBufferRef;

    /// Finalize the frames context before use (after configuring its fields)
    pub fn av_hwframe_ctx_init(ref_: *mut AVBufferRef) -> c_int;
}

/// Constraints on allocatable hardware frames.
///
/// Layout mirrors `libavutil/hwcontext.h`. The format lists are terminated by
/// AV_PIX_FMT_NONE (-1); `valid_hw_formats` may be NULL meaning "any".
#[repr(C)]
pub struct AVHWFramesConstraints {
    pub valid_hw_formats: *mut c_int,
    pub valid_sw_formats: *mut c_int,
    pub min_width: c_int,
    pub min_height: c_int,
    pub max_width: c_int,
    pub max_height: c_int,
}
