//! Hardware acceleration device contexts
//!
//! Device creation is a probing operation: most machines lack most device
//! types, so an unavailable device is an `Option::None`, not an error. Actual
//! contract violations (asking for a surface format of a device type with no
//! table entry) stay in the error taxonomy.

use std::ffi::CStr;
use std::os::raw::c_int;
use std::ptr::{self, NonNull};

use crate::ffi::accessors::{ffhw_surface_format, ffhwdev_get_type};
use crate::ffi::avutil::av_buffer_unref;
use crate::ffi::hwaccel::*;
use crate::ffi::{AVBufferRef, AVHWDeviceType, AVPixelFormat};
use crate::handle::NativeHandle;

use super::{CodecError, CodecResult, HwFramePool, PictureFormat};

/// Limits on frames allocatable from a device, copied out of the native
/// descriptor so no native memory outlives the query.
#[derive(Debug, Clone)]
pub struct HwFrameConstraints {
    pub min_width: i32,
    pub min_height: i32,
    pub max_width: i32,
    pub max_height: i32,
    /// Allowed surface formats, `None` meaning unrestricted. Raw pixel format
    /// values, since a driver may report formats this wrapper has no name for.
    pub valid_hw_formats: Option<Vec<i32>>,
    /// Allowed software frame formats, `None` meaning unrestricted.
    pub valid_sw_formats: Option<Vec<i32>>,
}

impl HwFrameConstraints {
    pub fn supports_sw_format(&self, format: AVPixelFormat) -> bool {
        match &self.valid_sw_formats {
            Some(formats) => formats.contains(&format.as_raw()),
            None => true,
        }
    }

    pub fn fits(&self, width: i32, height: i32) -> bool {
        width >= self.min_width
            && height >= self.min_height
            && width <= self.max_width
            && height <= self.max_height
    }
}

/// Safe wrapper around an `AVHWDeviceContext` reference.
pub struct HwDeviceContext {
    handle: NativeHandle<AVBufferRef>,
    device_type: AVHWDeviceType,
}

impl HwDeviceContext {
    /// Probe for a device of the given type.
    ///
    /// Returns `None` when the device cannot be opened on this machine - a
    /// missing GPU or driver is an expected outcome, not a failure.
    pub fn create(device_type: AVHWDeviceType) -> Option<Self> {
        let mut raw: *mut AVBufferRef = ptr::null_mut();
        let ret = unsafe {
            av_hwdevice_ctx_create(
                &mut raw,
                device_type.as_raw(),
                ptr::null(),
                ptr::null_mut(),
                0,
            )
        };
        if ret < 0 {
            tracing::debug!(
                ?device_type,
                code = ret,
                "hardware device unavailable"
            );
            return None;
        }
        let handle = NativeHandle::from_raw(raw, true)?;
        tracing::debug!(?device_type, "hardware device created");
        Some(Self {
            handle,
            device_type,
        })
    }

    /// Wrap an externally created device reference.
    ///
    /// # Safety
    ///
    /// `raw` must point to a live `AVBufferRef` holding an
    /// `AVHWDeviceContext`; with `take_ownership = true` this wrapper becomes
    /// responsible for the reference.
    pub unsafe fn from_raw(raw: *mut AVBufferRef, take_ownership: bool) -> CodecResult<Self> {
        let mut handle = NativeHandle::from_raw(raw, take_ownership)
            .ok_or(CodecError::InvalidConfig("null device reference".into()))?;
        let raw_type = unsafe { ffhwdev_get_type(raw) };
        match AVHWDeviceType::from_raw(raw_type) {
            Some(device_type) if device_type != AVHWDeviceType::None => Ok(Self {
                handle,
                device_type,
            }),
            _ => {
                if let Some(owned) = handle.release() {
                    let mut ptr = owned.as_ptr();
                    unsafe { av_buffer_unref(&mut ptr) };
                }
                Err(CodecError::InvalidConfig(format!(
                    "unrecognized hardware device type {raw_type}"
                )))
            }
        }
    }

    /// Device types the linked native build knows about. Types newer than
    /// this wrapper are skipped.
    pub fn available_types() -> Vec<AVHWDeviceType> {
        let mut types = Vec::new();
        let mut current = AVHWDeviceType::None.as_raw();
        loop {
            current = unsafe { av_hwdevice_iterate_types(current) };
            if current == AVHWDeviceType::None.as_raw() {
                break;
            }
            if let Some(device_type) = AVHWDeviceType::from_raw(current) {
                types.push(device_type);
            }
        }
        types
    }

    /// Surface (hardware pixel) format frames on this kind of device use.
    ///
    /// Returned as a raw native pixel format value: most surface formats have
    /// no named `AVPixelFormat` counterpart, and funneling them through the
    /// enum would collapse them to `None`.
    pub fn default_surface_format(device_type: AVHWDeviceType) -> CodecResult<i32> {
        let raw = unsafe { ffhw_surface_format(device_type.as_raw()) };
        if raw == AVPixelFormat::None.as_raw() {
            return Err(CodecError::UnsupportedDevice(device_type));
        }
        Ok(raw)
    }

    fn ptr(&self) -> CodecResult<NonNull<AVBufferRef>> {
        self.handle
            .get()
            .ok_or(CodecError::Disposed("HwDeviceContext"))
    }

    /// Raw reference pointer, for handing to native calls outside this
    /// wrapper. The reference stays owned by this context.
    pub fn as_raw(&self) -> CodecResult<*mut AVBufferRef> {
        Ok(self.ptr()?.as_ptr())
    }

    pub fn device_type(&self) -> AVHWDeviceType {
        self.device_type
    }

    /// Native name of the device type ("cuda", "vaapi").
    pub fn type_name(&self) -> Option<String> {
        unsafe {
            let name = av_hwdevice_get_type_name(self.device_type.as_raw());
            if name.is_null() {
                return None;
            }
            Some(CStr::from_ptr(name).to_string_lossy().into_owned())
        }
    }

    /// Query the frame allocation limits of this device.
    ///
    /// Returns `Ok(None)` when the driver does not publish constraints. The
    /// native descriptor is copied and freed before returning.
    pub fn max_frame_constraints(&self) -> CodecResult<Option<HwFrameConstraints>> {
        let ptr = self.ptr()?;
        unsafe {
            let mut raw = av_hwdevice_get_hwframe_constraints(ptr.as_ptr(), std::ptr::null());
            if raw.is_null() {
                return Ok(None);
            }
            let constraints = HwFrameConstraints {
                min_width: (*raw).min_width,
                min_height: (*raw).min_height,
                max_width: (*raw).max_width,
                max_height: (*raw).max_height,
                valid_hw_formats: collect_format_list((*raw).valid_hw_formats),
                valid_sw_formats: collect_format_list((*raw).valid_sw_formats),
            };
            av_hwframe_constraints_free(&mut raw);
            Ok(Some(constraints))
        }
    }

    /// Provision a pool of `initial_size` hardware frames of the given
    /// software format and dimensions.
    ///
    /// Returns `Ok(None)` when the driver refuses the configuration (an
    /// unsupported dimension or format combination is an expected outcome on
    /// real hardware). Allocation failure and a device type without a surface
    /// format entry are errors.
    pub fn create_frame_pool(
        &self,
        format: PictureFormat,
        initial_size: i32,
    ) -> CodecResult<Option<HwFramePool>> {
        let ptr = self.ptr()?;
        let surface_format = Self::default_surface_format(self.device_type)?;

        unsafe {
            let mut frames = av_hwframe_ctx_alloc(ptr.as_ptr());
            if frames.is_null() {
                return Err(CodecError::AllocationFailed("AVHWFramesContext"));
            }

            use crate::ffi::accessors::*;
            ffhwframes_set_format(frames, surface_format);
            ffhwframes_set_sw_format(frames, format.pixel_format.as_raw());
            ffhwframes_set_width(frames, format.width);
            ffhwframes_set_height(frames, format.height);
            ffhwframes_set_initial_pool_size(frames, initial_size);

            let ret = av_hwframe_ctx_init(frames);
            if ret < 0 {
                tracing::debug!(
                    device_type = ?self.device_type,
                    %format,
                    code = ret,
                    "frame pool rejected by driver"
                );
                av_buffer_unref(&mut frames);
                return Ok(None);
            }

            // Init succeeded, so frames is non-null and owned by the pool.
            Ok(HwFramePool::from_owned(frames))
        }
    }

    /// Release the device reference. Idempotent; pools created from this
    /// device hold their own reference chain and must be closed separately.
    pub fn close(&mut self) {
        if let Some(owned) = self.handle.release() {
            let mut raw = owned.as_ptr();
            unsafe { av_buffer_unref(&mut raw) };
        }
    }
}

impl Drop for HwDeviceContext {
    fn drop(&mut self) {
        self.close();
    }
}

/// Copy a sentinel-terminated native format list. Null means "unrestricted".
unsafe fn collect_format_list(list: *const c_int) -> Option<Vec<i32>> {
    if list.is_null() {
        return None;
    }
    let mut formats = Vec::new();
    let mut cursor = list;
    unsafe {
        while *cursor != AVPixelFormat::None.as_raw() {
            formats.push(*cursor);
            cursor = cursor.add(1);
        }
    }
    Some(formats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_format_table_is_closed() {
        // Formats the Rust enum happens to name can be cross-checked exactly.
        assert_eq!(
            HwDeviceContext::default_surface_format(AVHWDeviceType::Cuda).unwrap(),
            AVPixelFormat::Cuda.as_raw()
        );
        assert_eq!(
            HwDeviceContext::default_surface_format(AVHWDeviceType::Vaapi).unwrap(),
            AVPixelFormat::Vaapi.as_raw()
        );

        // Every table entry resolves to a real format, including the surface
        // formats the enum has no name for.
        for device_type in [
            AVHWDeviceType::Vdpau,
            AVHWDeviceType::Cuda,
            AVHWDeviceType::Vaapi,
            AVHWDeviceType::Dxva2,
            AVHWDeviceType::Qsv,
            AVHWDeviceType::Videotoolbox,
            AVHWDeviceType::D3d11va,
            AVHWDeviceType::Drm,
            AVHWDeviceType::Opencl,
            AVHWDeviceType::Mediacodec,
            AVHWDeviceType::Vulkan,
        ] {
            assert_ne!(
                HwDeviceContext::default_surface_format(device_type).unwrap(),
                AVPixelFormat::None.as_raw(),
                "no surface format for {device_type:?}"
            );
        }

        // No table entry for this type: a range error, not a silent default.
        assert!(matches!(
            HwDeviceContext::default_surface_format(AVHWDeviceType::D3d12va),
            Err(CodecError::UnsupportedDevice(AVHWDeviceType::D3d12va))
        ));
    }

    #[test]
    fn unavailable_device_probes_to_none() {
        // A device type that cannot exist on this platform.
        #[cfg(target_os = "macos")]
        let absent = AVHWDeviceType::Vaapi;
        #[cfg(not(target_os = "macos"))]
        let absent = AVHWDeviceType::Videotoolbox;

        assert!(HwDeviceContext::create(absent).is_none());
    }

    #[test]
    fn available_types_enumerates_known_types() {
        for device_type in HwDeviceContext::available_types() {
            assert_ne!(device_type, AVHWDeviceType::None);
        }
    }

    #[test]
    fn constraints_query_on_any_present_device() {
        // Hardware-dependent: exercises whichever device the machine has,
        // passes trivially on machines with none.
        for device_type in HwDeviceContext::available_types() {
            let Some(mut device) = HwDeviceContext::create(device_type) else {
                continue;
            };
            assert_eq!(device.device_type(), device_type);
            assert!(device.type_name().is_some());

            if let Some(constraints) = device.max_frame_constraints().unwrap() {
                assert!(constraints.max_width >= constraints.min_width);
                assert!(constraints.max_height >= constraints.min_height);
            }

            device.close();
            device.close();
            assert!(matches!(
                device.max_frame_constraints(),
                Err(CodecError::Disposed(_))
            ));
            return;
        }
    }

    #[test]
    fn rejected_pool_configuration_is_none_not_error() {
        // Zero-sized frames fail av_hwframe_ctx_init on every driver; the
        // failure must come back as the cold-path None, not an error.
        for device_type in HwDeviceContext::available_types() {
            if HwDeviceContext::default_surface_format(device_type).is_err() {
                continue;
            }
            let Some(device) = HwDeviceContext::create(device_type) else {
                continue;
            };
            let result = device
                .create_frame_pool(PictureFormat::new(0, 0, AVPixelFormat::Nv12), 0)
                .unwrap();
            assert!(result.is_none());
            return;
        }
    }

    #[test]
    fn constraint_helpers() {
        let constraints = HwFrameConstraints {
            min_width: 16,
            min_height: 16,
            max_width: 4096,
            max_height: 4096,
            valid_hw_formats: None,
            valid_sw_formats: Some(vec![
                AVPixelFormat::Nv12.as_raw(),
                AVPixelFormat::Yuv420p.as_raw(),
            ]),
        };
        assert!(constraints.fits(1920, 1080));
        assert!(!constraints.fits(8, 8));
        assert!(!constraints.fits(8192, 64));
        assert!(constraints.supports_sw_format(AVPixelFormat::Nv12));
        assert!(!constraints.supports_sw_format(AVPixelFormat::Rgba));
    }
}
