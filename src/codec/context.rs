//! Codec context lifecycle wrapper
//!
//! `CodecContext` owns (or borrows) one `AVCodecContext` and enforces the
//! configure-then-open ordering the native API demands but does not check:
//! every mutating setter fails once the context is open, and openness itself
//! is always queried from the native side rather than cached.

use std::ffi::{CStr, CString};
use std::os::raw::c_int;
use std::ptr::{self, NonNull};

use crate::ffi::accessors::*;
use crate::ffi::avcodec::*;
use crate::ffi::avutil::av_mallocz;
use crate::ffi::{
    check_error_except_eagain_eof, AVCodecContext, AVCodecID, AVMediaType, AVRational,
    AV_INPUT_BUFFER_PADDING_SIZE,
};
use crate::handle::NativeHandle;

use super::{CodecError, CodecResult};

/// Safe wrapper around an `AVCodecContext`.
///
/// Dropping the wrapper tears the context down; `close` does the same thing
/// eagerly and is idempotent. A context obtained through `from_raw` with
/// `take_ownership = false` is only detached at teardown, never freed.
pub struct CodecContext {
    handle: NativeHandle<AVCodecContext>,
    media_kind: AVMediaType,
    // Extradata installed through set_extra_data is our allocation, not the
    // context's, so teardown must reclaim it even on a borrowed context.
    user_extra_data: bool,
}

impl CodecContext {
    /// Allocate a context for the decoder registered under `codec_id`.
    pub fn new_decoder(codec_id: AVCodecID) -> CodecResult<Self> {
        let codec = unsafe { avcodec_find_decoder(codec_id.as_raw()) };
        if codec.is_null() {
            return Err(CodecError::DecoderNotFound(codec_id));
        }
        Self::alloc(codec)
    }

    /// Allocate a context for a decoder looked up by name.
    pub fn new_decoder_by_name(name: &str) -> CodecResult<Self> {
        let c_name = CString::new(name)
            .map_err(|_| CodecError::CodecNotFound(name.to_owned()))?;
        let codec = unsafe { avcodec_find_decoder_by_name(c_name.as_ptr()) };
        if codec.is_null() {
            return Err(CodecError::CodecNotFound(name.to_owned()));
        }
        Self::alloc(codec)
    }

    /// Allocate a context for the encoder registered under `codec_id`.
    pub fn new_encoder(codec_id: AVCodecID) -> CodecResult<Self> {
        let codec = unsafe { avcodec_find_encoder(codec_id.as_raw()) };
        if codec.is_null() {
            return Err(CodecError::EncoderNotFound(codec_id));
        }
        Self::alloc(codec)
    }

    /// Allocate a context for an encoder looked up by name.
    pub fn new_encoder_by_name(name: &str) -> CodecResult<Self> {
        let c_name = CString::new(name)
            .map_err(|_| CodecError::CodecNotFound(name.to_owned()))?;
        let codec = unsafe { avcodec_find_encoder_by_name(c_name.as_ptr()) };
        if codec.is_null() {
            return Err(CodecError::CodecNotFound(name.to_owned()));
        }
        Self::alloc(codec)
    }

    fn alloc(codec: *const crate::ffi::AVCodec) -> CodecResult<Self> {
        let ctx = unsafe { avcodec_alloc_context3(codec) };
        let handle = NativeHandle::from_raw(ctx, true)
            .ok_or(CodecError::AllocationFailed("AVCodecContext"))?;
        let raw_kind = unsafe { ffctx_get_media_type(ctx) };
        let media_kind = AVMediaType::from_raw(raw_kind).ok_or_else(|| {
            let mut ctx = ctx;
            unsafe { avcodec_free_context(&mut ctx) };
            CodecError::InvalidConfig(format!("unsupported media type {raw_kind}"))
        })?;
        Ok(Self {
            handle,
            media_kind,
            user_extra_data: false,
        })
    }

    /// Wrap an externally created context, verifying it carries the expected
    /// media kind.
    ///
    /// With `take_ownership = true` the wrapper frees the context at teardown
    /// (including when the kind check fails); otherwise the caller keeps
    /// responsibility for it.
    ///
    /// # Safety
    ///
    /// `ptr` must point to a live `AVCodecContext`, and with
    /// `take_ownership = true` nothing else may free it.
    pub unsafe fn from_raw(
        ptr: *mut AVCodecContext,
        expected_kind: AVMediaType,
        take_ownership: bool,
    ) -> CodecResult<Self> {
        let mut handle = NativeHandle::from_raw(ptr, take_ownership)
            .ok_or(CodecError::InvalidConfig("null codec context".into()))?;
        let raw_kind = unsafe { ffctx_get_media_type(ptr) };
        if AVMediaType::from_raw(raw_kind) != Some(expected_kind) {
            if let Some(owned) = handle.release() {
                let mut raw = owned.as_ptr();
                unsafe { avcodec_free_context(&mut raw) };
            }
            return Err(CodecError::InvalidConfig(format!(
                "expected a {expected_kind:?} context, got media type {raw_kind}"
            )));
        }
        Ok(Self {
            handle,
            media_kind: expected_kind,
            user_extra_data: false,
        })
    }

    fn ptr(&self) -> CodecResult<NonNull<AVCodecContext>> {
        self.handle
            .get()
            .ok_or(CodecError::Disposed("CodecContext"))
    }

    /// Pointer guard for configuration setters: disposed and open contexts
    /// both reject mutation.
    fn config_ptr(&self) -> CodecResult<NonNull<AVCodecContext>> {
        let ptr = self.ptr()?;
        if unsafe { avcodec_is_open(ptr.as_ptr()) } != 0 {
            return Err(CodecError::InvalidState(
                "context is already open, configuration is frozen",
            ));
        }
        Ok(ptr)
    }

    /// Raw context pointer, for handing to native calls outside this wrapper.
    pub fn as_raw(&self) -> CodecResult<*mut AVCodecContext> {
        Ok(self.ptr()?.as_ptr())
    }

    pub fn media_kind(&self) -> AVMediaType {
        self.media_kind
    }

    /// Whether the context has been opened, as reported by the native side.
    pub fn is_open(&self) -> bool {
        match self.handle.get() {
            Some(ptr) => unsafe { avcodec_is_open(ptr.as_ptr()) != 0 },
            None => false,
        }
    }

    /// Bind the context to its codec. Idempotent: opening an open context is
    /// a no-op.
    pub fn open(&mut self) -> CodecResult<()> {
        let ptr = self.ptr()?;
        if unsafe { avcodec_is_open(ptr.as_ptr()) } != 0 {
            return Ok(());
        }
        let ret = unsafe { avcodec_open2(ptr.as_ptr(), ptr::null(), ptr::null_mut()) };
        check_error_except_eagain_eof(ret).map_err(CodecError::OpenFailed)?;
        tracing::debug!(
            codec = self.codec_name().as_deref().unwrap_or("?"),
            "codec context opened"
        );
        Ok(())
    }

    /// Drop all buffered state after a discontinuity (e.g. a seek).
    pub fn flush(&mut self) -> CodecResult<()> {
        let ptr = self.ptr()?;
        if unsafe { avcodec_is_open(ptr.as_ptr()) } == 0 {
            return Err(CodecError::InvalidState(
                "cannot flush a context that is not open",
            ));
        }
        unsafe { avcodec_flush_buffers(ptr.as_ptr()) };
        Ok(())
    }

    /// Negotiate the threading configuration against the codec's declared
    /// capabilities.
    ///
    /// `count` of 0 asks the native side to auto-detect. Slice threading is
    /// used only when the codec supports it and `prefer_slices` asks for it;
    /// otherwise frame threading when supported; otherwise the request
    /// degrades to a single thread.
    pub fn set_thread_count(&mut self, count: i32, prefer_slices: bool) -> CodecResult<()> {
        let ptr = self.config_ptr()?;
        unsafe {
            let caps = ffctx_get_codec_capabilities(ptr.as_ptr());
            let slice = caps & AV_CODEC_CAP_SLICE_THREADS != 0;
            let frame = caps & AV_CODEC_CAP_FRAME_THREADS != 0;

            if count != 1 && ((slice && prefer_slices) || frame) {
                ffctx_set_thread_count(ptr.as_ptr(), count.max(0));
                let thread_type = if slice && prefer_slices {
                    FF_THREAD_SLICE
                } else {
                    FF_THREAD_FRAME
                };
                ffctx_set_thread_type(ptr.as_ptr(), thread_type);
            } else {
                ffctx_set_thread_count(ptr.as_ptr(), 1);
                ffctx_set_thread_type(ptr.as_ptr(), 0);
            }
        }
        Ok(())
    }

    pub fn thread_count(&self) -> CodecResult<i32> {
        let ptr = self.ptr()?;
        Ok(unsafe { ffctx_get_thread_count(ptr.as_ptr()) })
    }

    /// Copy of the current extradata, `None` when the context has none.
    pub fn extra_data(&self) -> CodecResult<Option<Vec<u8>>> {
        let ptr = self.ptr()?;
        unsafe {
            let data = ffctx_get_extradata(ptr.as_ptr());
            let size = ffctx_get_extradata_size(ptr.as_ptr());
            if data.is_null() || size <= 0 {
                return Ok(None);
            }
            Ok(Some(
                std::slice::from_raw_parts(data, size as usize).to_vec(),
            ))
        }
    }

    /// Install out-of-band codec configuration (e.g. an avcC or OpusHead
    /// blob), replacing whatever the context currently holds.
    ///
    /// The buffer is copied into a zero-initialized native allocation with
    /// `AV_INPUT_BUFFER_PADDING_SIZE` bytes of slack past the logical end, as
    /// the native bitstream readers require. `None` and an empty slice both
    /// clear the extradata.
    pub fn set_extra_data(&mut self, data: Option<&[u8]>) -> CodecResult<()> {
        let ptr = self.config_ptr()?;
        unsafe {
            ffctx_free_extradata(ptr.as_ptr());
            self.user_extra_data = false;

            if let Some(data) = data.filter(|d| !d.is_empty()) {
                let buf = av_mallocz(data.len() + AV_INPUT_BUFFER_PADDING_SIZE) as *mut u8;
                if buf.is_null() {
                    return Err(CodecError::AllocationFailed("extradata buffer"));
                }
                ptr::copy_nonoverlapping(data.as_ptr(), buf, data.len());
                ffctx_install_extradata(ptr.as_ptr(), buf, data.len() as c_int);
                self.user_extra_data = true;
            }
        }
        Ok(())
    }

    pub fn time_base(&self) -> CodecResult<AVRational> {
        let ptr = self.ptr()?;
        let (mut num, mut den) = (0, 0);
        unsafe { ffctx_get_time_base(ptr.as_ptr(), &mut num, &mut den) };
        Ok(AVRational::new(num, den))
    }

    pub fn set_time_base(&mut self, time_base: AVRational) -> CodecResult<()> {
        let ptr = self.config_ptr()?;
        unsafe { ffctx_set_time_base(ptr.as_ptr(), time_base.num, time_base.den) };
        Ok(())
    }

    pub fn frame_rate(&self) -> CodecResult<AVRational> {
        let ptr = self.ptr()?;
        let (mut num, mut den) = (0, 0);
        unsafe { ffctx_get_framerate(ptr.as_ptr(), &mut num, &mut den) };
        Ok(AVRational::new(num, den))
    }

    pub fn set_frame_rate(&mut self, frame_rate: AVRational) -> CodecResult<()> {
        let ptr = self.config_ptr()?;
        unsafe { ffctx_set_framerate(ptr.as_ptr(), frame_rate.num, frame_rate.den) };
        Ok(())
    }

    /// Short name of the bound codec ("h264", "aac"), `None` when disposed or
    /// no codec is bound.
    pub fn codec_name(&self) -> Option<String> {
        let ptr = self.handle.get()?;
        unsafe {
            let name = ffctx_get_codec_name(ptr.as_ptr());
            if name.is_null() {
                return None;
            }
            Some(CStr::from_ptr(name).to_string_lossy().into_owned())
        }
    }

    /// Descriptive name of the bound codec.
    pub fn codec_long_name(&self) -> Option<String> {
        let ptr = self.handle.get()?;
        unsafe {
            let name = ffctx_get_codec_long_name(ptr.as_ptr());
            if name.is_null() {
                return None;
            }
            Some(CStr::from_ptr(name).to_string_lossy().into_owned())
        }
    }

    /// Whether the codec buffers output and must be drained with null input.
    pub fn is_delayed(&self) -> CodecResult<bool> {
        let ptr = self.ptr()?;
        let caps = unsafe { ffctx_get_codec_capabilities(ptr.as_ptr()) };
        Ok(caps & AV_CODEC_CAP_DELAY != 0)
    }

    /// Tear the context down. Safe to call any number of times.
    pub fn close(&mut self) {
        let Some(ptr) = self.handle.get() else {
            return;
        };

        // Extradata we installed is reclaimed first. For an owned context
        // avcodec_free_context would do it too, but a borrowed context must
        // not be left pointing at a buffer the caller never allocated.
        if self.user_extra_data {
            unsafe { ffctx_free_extradata(ptr.as_ptr()) };
            self.user_extra_data = false;
        }

        if let Some(owned) = self.handle.release() {
            let mut raw = owned.as_ptr();
            unsafe { avcodec_free_context(&mut raw) };
        }
    }
}

impl Drop for CodecContext {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::AVCodecID;

    #[test]
    fn decoder_lifecycle() {
        let mut ctx = CodecContext::new_decoder(AVCodecID::H264).unwrap();
        assert_eq!(ctx.media_kind(), AVMediaType::Video);
        assert_eq!(ctx.codec_name().as_deref(), Some("h264"));
        assert!(!ctx.is_open());

        ctx.open().unwrap();
        assert!(ctx.is_open());
        // Opening again is a no-op.
        ctx.open().unwrap();

        ctx.flush().unwrap();

        ctx.close();
        ctx.close();
        assert!(!ctx.is_open());
        assert!(matches!(ctx.thread_count(), Err(CodecError::Disposed(_))));
    }

    #[test]
    fn flush_requires_open_context() {
        let mut ctx = CodecContext::new_decoder(AVCodecID::H264).unwrap();
        assert!(matches!(ctx.flush(), Err(CodecError::InvalidState(_))));
    }

    #[test]
    fn configuration_freezes_after_open() {
        let mut ctx = CodecContext::new_decoder(AVCodecID::H264).unwrap();
        ctx.set_time_base(AVRational::new(1, 90_000)).unwrap();
        assert_eq!(ctx.time_base().unwrap(), AVRational::new(1, 90_000));

        ctx.open().unwrap();
        assert!(matches!(
            ctx.set_time_base(AVRational::new(1, 1000)),
            Err(CodecError::InvalidState(_))
        ));
        assert!(matches!(
            ctx.set_extra_data(Some(&[1, 2, 3])),
            Err(CodecError::InvalidState(_))
        ));
        // Reads stay available.
        assert_eq!(ctx.time_base().unwrap(), AVRational::new(1, 90_000));
    }

    #[test]
    fn thread_negotiation_honors_capabilities() {
        // h264 supports both slice and frame threading.
        let mut ctx = CodecContext::new_decoder(AVCodecID::H264).unwrap();
        ctx.set_thread_count(4, true).unwrap();
        assert_eq!(ctx.thread_count().unwrap(), 4);
        let raw = ctx.as_raw().unwrap();
        assert_eq!(unsafe { ffctx_get_thread_type(raw) }, FF_THREAD_SLICE);

        ctx.set_thread_count(4, false).unwrap();
        assert_eq!(unsafe { ffctx_get_thread_type(raw) }, FF_THREAD_FRAME);

        // A single-thread request never enables threading.
        ctx.set_thread_count(1, true).unwrap();
        assert_eq!(ctx.thread_count().unwrap(), 1);
        assert_eq!(unsafe { ffctx_get_thread_type(raw) }, 0);
    }

    #[test]
    fn slice_only_codec_degrades_without_slice_preference() {
        // The dvvideo decoder parallelizes slices but has no frame threading.
        let mut ctx = CodecContext::new_decoder_by_name("dvvideo").unwrap();
        let raw = ctx.as_raw().unwrap();
        let caps = unsafe { ffctx_get_codec_capabilities(raw) };
        if caps & AV_CODEC_CAP_SLICE_THREADS == 0 || caps & AV_CODEC_CAP_FRAME_THREADS != 0 {
            // Capability set changed in the linked build; the h264 assertions
            // in thread_negotiation_honors_capabilities still cover the rest.
            return;
        }

        // Slices were not asked for and frame threading is unavailable, so
        // the request must collapse to a single thread.
        ctx.set_thread_count(4, false).unwrap();
        assert_eq!(ctx.thread_count().unwrap(), 1);
        assert_eq!(unsafe { ffctx_get_thread_type(raw) }, 0);

        ctx.set_thread_count(4, true).unwrap();
        assert_eq!(ctx.thread_count().unwrap(), 4);
        assert_eq!(unsafe { ffctx_get_thread_type(raw) }, FF_THREAD_SLICE);
    }

    #[test]
    fn extradata_copies_with_zeroed_padding() {
        let mut ctx = CodecContext::new_decoder(AVCodecID::H264).unwrap();
        assert_eq!(ctx.extra_data().unwrap(), None);

        let blob = [0x01u8, 0x64, 0x00, 0x1f, 0xff];
        ctx.set_extra_data(Some(&blob)).unwrap();
        assert_eq!(ctx.extra_data().unwrap().as_deref(), Some(&blob[..]));

        // The padding region past the logical end must exist and be zeroed.
        unsafe {
            let raw = ctx.as_raw().unwrap();
            let data = ffctx_get_extradata(raw);
            let size = ffctx_get_extradata_size(raw) as usize;
            assert_eq!(size, blob.len());
            let padding = std::slice::from_raw_parts(
                data.add(size),
                AV_INPUT_BUFFER_PADDING_SIZE,
            );
            assert!(padding.iter().all(|&b| b == 0));
        }

        // Replacing and clearing both release the previous buffer.
        ctx.set_extra_data(Some(&[9, 8, 7])).unwrap();
        assert_eq!(ctx.extra_data().unwrap().as_deref(), Some(&[9u8, 8, 7][..]));
        ctx.set_extra_data(None).unwrap();
        assert_eq!(ctx.extra_data().unwrap(), None);

        // An empty slice clears rather than installing a zero-length buffer.
        ctx.set_extra_data(Some(&[7])).unwrap();
        ctx.set_extra_data(Some(&[])).unwrap();
        assert_eq!(ctx.extra_data().unwrap(), None);
        unsafe {
            assert!(ffctx_get_extradata(ctx.as_raw().unwrap()).is_null());
        }
    }

    #[test]
    fn from_raw_rejects_kind_mismatch() {
        let aac = unsafe { avcodec_find_decoder(AVCodecID::Aac.as_raw()) };
        assert!(!aac.is_null());
        let raw = unsafe { avcodec_alloc_context3(aac) };
        assert!(!raw.is_null());

        // Ownership transfers even on failure, so the mismatched context does
        // not leak.
        let result = unsafe { CodecContext::from_raw(raw, AVMediaType::Video, true) };
        assert!(matches!(result, Err(CodecError::InvalidConfig(_))));
    }

    #[test]
    fn borrowed_context_is_not_freed() {
        let raw = {
            let codec = unsafe { avcodec_find_decoder(AVCodecID::H264.as_raw()) };
            unsafe { avcodec_alloc_context3(codec) }
        };

        {
            let ctx = unsafe {
                CodecContext::from_raw(raw, AVMediaType::Video, false).unwrap()
            };
            assert_eq!(ctx.codec_name().as_deref(), Some("h264"));
        }

        // The wrapper detached without freeing; the context is still ours.
        let mut raw = raw;
        assert_eq!(unsafe { avcodec_is_open(raw) }, 0);
        unsafe { avcodec_free_context(&mut raw) };
    }

    #[test]
    fn encoder_lookup_by_name() {
        // The mpeg4 encoder ships in every FFmpeg build.
        let ctx = CodecContext::new_encoder_by_name("mpeg4").unwrap();
        assert_eq!(ctx.codec_name().as_deref(), Some("mpeg4"));
        assert_eq!(ctx.media_kind(), AVMediaType::Video);

        assert!(matches!(
            CodecContext::new_decoder_by_name("no-such-codec"),
            Err(CodecError::CodecNotFound(_))
        ));
    }
}
