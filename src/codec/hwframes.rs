//! Hardware frame pool wrapper
//!
//! A pool is created through [`super::HwDeviceContext::create_frame_pool`]
//! and holds its own buffer reference; the frames context keeps the device
//! alive on the native side, so closing the device wrapper first is safe.

use std::ptr::NonNull;

use crate::ffi::accessors::*;
use crate::ffi::avutil::{av_buffer_ref, av_buffer_unref};
use crate::ffi::{AVBufferRef, AVPixelFormat};
use crate::handle::NativeHandle;

use super::{CodecError, CodecResult, PictureFormat};

/// Safe wrapper around an initialized `AVHWFramesContext` reference.
pub struct HwFramePool {
    handle: NativeHandle<AVBufferRef>,
}

impl HwFramePool {
    /// Take ownership of an initialized frames reference. `None` if null.
    pub(crate) fn from_owned(raw: *mut AVBufferRef) -> Option<Self> {
        NativeHandle::from_raw(raw, true).map(|handle| Self { handle })
    }

    fn ptr(&self) -> CodecResult<NonNull<AVBufferRef>> {
        self.handle
            .get()
            .ok_or(CodecError::Disposed("HwFramePool"))
    }

    /// Raw reference pointer, for handing to native calls outside this
    /// wrapper. The reference stays owned by the pool.
    pub fn as_raw(&self) -> CodecResult<*mut AVBufferRef> {
        Ok(self.ptr()?.as_ptr())
    }

    /// A fresh native reference to the frames context, for attaching to a
    /// codec context that wants its own.
    pub fn new_ref(&self) -> CodecResult<*mut AVBufferRef> {
        let ptr = self.ptr()?;
        let fresh = unsafe { av_buffer_ref(ptr.as_ptr()) };
        if fresh.is_null() {
            return Err(CodecError::AllocationFailed("frames context reference"));
        }
        Ok(fresh)
    }

    /// Raw surface format of the pooled frames, as configured at provisioning
    /// time from the device-type table.
    pub fn surface_format(&self) -> CodecResult<i32> {
        let ptr = self.ptr()?;
        Ok(unsafe { ffhwframes_get_format(ptr.as_ptr()) })
    }

    /// Software format and dimensions the pool was provisioned with.
    pub fn picture_format(&self) -> CodecResult<PictureFormat> {
        let ptr = self.ptr()?;
        unsafe {
            Ok(PictureFormat::new(
                ffhwframes_get_width(ptr.as_ptr()),
                ffhwframes_get_height(ptr.as_ptr()),
                AVPixelFormat::from_raw(ffhwframes_get_sw_format(ptr.as_ptr())),
            ))
        }
    }

    pub fn initial_size(&self) -> CodecResult<i32> {
        let ptr = self.ptr()?;
        Ok(unsafe { ffhwframes_get_initial_pool_size(ptr.as_ptr()) })
    }

    /// Release the pool reference. Idempotent.
    pub fn close(&mut self) {
        if let Some(owned) = self.handle.release() {
            let mut raw = owned.as_ptr();
            unsafe { av_buffer_unref(&mut raw) };
        }
    }
}

impl Drop for HwFramePool {
    fn drop(&mut self) {
        self.close();
    }
}
