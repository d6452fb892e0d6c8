//! Custom byte-stream bridging for the native I/O layer
//!
//! `IoContext` wires a Rust [`IoStream`] into an `AVIOContext` through three
//! `extern "C"` trampolines. The wrapper keeps the boxed stream alive for as
//! long as the native side may invoke the callbacks, and only reclaims it
//! after the context itself has been freed.

use std::io::{self, SeekFrom};
use std::os::raw::{c_int, c_void};
use std::panic::{self, AssertUnwindSafe};
use std::ptr::NonNull;

use crate::ffi::accessors::{
    ffio_get_buffer, ffio_get_seekable, ffio_get_write_flag, ffio_has_read_fn,
};
use crate::ffi::avformat::{
    avio_alloc_context, avio_context_free, avio_flush, seek_whence, AVIOContext, ReadPacketFn,
    SeekFn, WritePacketFn,
};
use crate::ffi::avutil::{av_free, av_malloc};
use crate::ffi::error::{AVERROR_EINVAL, AVERROR_EIO, AVERROR_ENOSYS, AVERROR_EOF};
use crate::handle::NativeHandle;

use super::{CodecError, CodecResult};

/// A byte stream the native I/O layer can pull from or push to.
///
/// Capabilities are declared up front so the context can be built with the
/// corresponding callbacks absent: the native layer checks for a null
/// callback and never attempts the operation, which is stronger than a
/// callback that always errors. A write-only stream declares
/// `is_readable() == false` and its `read` is never registered.
pub trait IoStream: Send {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    fn write(&mut self, _buf: &[u8]) -> io::Result<()> {
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }

    fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }

    /// Total stream size, if knowable without disturbing the position.
    fn stream_len(&self) -> Option<u64> {
        None
    }

    fn is_readable(&self) -> bool {
        true
    }

    fn is_writable(&self) -> bool {
        false
    }

    fn is_seekable(&self) -> bool {
        false
    }
}

/// Safe wrapper around a custom `AVIOContext`.
pub struct IoContext {
    handle: NativeHandle<AVIOContext>,
    stream: *mut Box<dyn IoStream>,
}

// The stream is Send and nothing hands out aliases to it; the raw pointers
// only pin the allocation.
unsafe impl Send for IoContext {}

impl IoContext {
    /// Build an I/O context over `stream` with an internal transfer buffer of
    /// `buffer_size` bytes.
    pub fn new(stream: Box<dyn IoStream>, buffer_size: usize) -> CodecResult<Self> {
        let readable = stream.is_readable();
        let writable = stream.is_writable();
        let seekable = stream.is_seekable();

        let buffer = unsafe { av_malloc(buffer_size) as *mut u8 };
        if buffer.is_null() {
            return Err(CodecError::AllocationFailed("I/O buffer"));
        }

        // Double-boxed so the opaque pointer is thin. The allocation must
        // outlive the native context; teardown reclaims it.
        let opaque = Box::into_raw(Box::new(stream));

        let ctx = unsafe {
            avio_alloc_context(
                buffer,
                buffer_size as c_int,
                writable as c_int,
                opaque as *mut c_void,
                readable.then_some(read_bridge as ReadPacketFn),
                writable.then_some(write_bridge as WritePacketFn),
                seekable.then_some(seek_bridge as SeekFn),
            )
        };

        match NativeHandle::from_raw(ctx, true) {
            Some(handle) => Ok(Self {
                handle,
                stream: opaque,
            }),
            None => {
                unsafe {
                    av_free(buffer as *mut c_void);
                    drop(Box::from_raw(opaque));
                }
                Err(CodecError::AllocationFailed("AVIOContext"))
            }
        }
    }

    fn ptr(&self) -> CodecResult<NonNull<AVIOContext>> {
        self.handle.get().ok_or(CodecError::Disposed("IoContext"))
    }

    /// Raw context pointer, for handing to native calls outside this wrapper.
    pub fn as_raw(&self) -> CodecResult<*mut AVIOContext> {
        Ok(self.ptr()?.as_ptr())
    }

    /// Whether a read callback was registered for this context.
    pub fn is_readable(&self) -> CodecResult<bool> {
        let ptr = self.ptr()?;
        Ok(unsafe { ffio_has_read_fn(ptr.as_ptr()) } != 0)
    }

    /// Whether the native side considers this context seekable.
    pub fn is_seekable(&self) -> CodecResult<bool> {
        let ptr = self.ptr()?;
        Ok(unsafe { ffio_get_seekable(ptr.as_ptr()) } != 0)
    }

    /// Whether the context was opened for writing.
    pub fn is_writable(&self) -> CodecResult<bool> {
        let ptr = self.ptr()?;
        Ok(unsafe { ffio_get_write_flag(ptr.as_ptr()) } != 0)
    }

    /// Push any buffered bytes out through the write callback.
    pub fn flush(&mut self) -> CodecResult<()> {
        let ptr = self.ptr()?;
        unsafe { avio_flush(ptr.as_ptr()) };
        Ok(())
    }

    /// Free the context, its transfer buffer, and the stream. Idempotent.
    ///
    /// The buffer is re-read from the context because the native layer may
    /// have replaced the one supplied at construction.
    pub fn close(&mut self) {
        let Some(ptr) = self.handle.release() else {
            return;
        };
        unsafe {
            av_free(ffio_get_buffer(ptr.as_ptr()) as *mut c_void);
            let mut raw = ptr.as_ptr();
            avio_context_free(&mut raw);
            // No callback can fire past this point; the stream goes last.
            drop(Box::from_raw(self.stream));
        }
    }
}

impl Drop for IoContext {
    fn drop(&mut self) {
        self.close();
    }
}

/// Run a callback body, turning a panic into an I/O error code instead of
/// unwinding across the FFI boundary.
fn guard<T, F: FnOnce() -> T>(on_panic: T, body: F) -> T {
    panic::catch_unwind(AssertUnwindSafe(body)).unwrap_or(on_panic)
}

unsafe extern "C" fn read_bridge(opaque: *mut c_void, buf: *mut u8, buf_size: c_int) -> c_int {
    guard(AVERROR_EIO, || {
        if buf_size <= 0 {
            return AVERROR_EINVAL;
        }
        let stream = unsafe { &mut **(opaque as *mut Box<dyn IoStream>) };
        let out = unsafe { std::slice::from_raw_parts_mut(buf, buf_size as usize) };
        match stream.read(out) {
            // The native contract forbids returning 0: end of stream is the
            // explicit sentinel.
            Ok(0) => AVERROR_EOF,
            Ok(n) => n as c_int,
            Err(_) => AVERROR_EIO,
        }
    })
}

unsafe extern "C" fn write_bridge(opaque: *mut c_void, buf: *const u8, buf_size: c_int) -> c_int {
    guard(AVERROR_EIO, || {
        if buf_size < 0 {
            return AVERROR_EINVAL;
        }
        let stream = unsafe { &mut **(opaque as *mut Box<dyn IoStream>) };
        let data = unsafe { std::slice::from_raw_parts(buf, buf_size as usize) };
        match stream.write(data) {
            Ok(()) => buf_size,
            Err(_) => AVERROR_EIO,
        }
    })
}

unsafe extern "C" fn seek_bridge(opaque: *mut c_void, offset: i64, whence: c_int) -> i64 {
    guard(AVERROR_EIO as i64, || {
        let stream = unsafe { &mut **(opaque as *mut Box<dyn IoStream>) };

        // AVSEEK_FORCE is advisory; a byte stream has no cheap/expensive
        // distinction, so the flag is simply masked off.
        let whence = whence & !seek_whence::AVSEEK_FORCE;

        if whence == seek_whence::AVSEEK_SIZE {
            return match stream.stream_len() {
                Some(len) => len as i64,
                None => AVERROR_ENOSYS as i64,
            };
        }

        let pos = match whence {
            seek_whence::SEEK_SET => {
                if offset < 0 {
                    return AVERROR_EINVAL as i64;
                }
                SeekFrom::Start(offset as u64)
            }
            seek_whence::SEEK_CUR => SeekFrom::Current(offset),
            seek_whence::SEEK_END => SeekFrom::End(offset),
            _ => return AVERROR_EINVAL as i64,
        };

        match stream.seek(pos) {
            Ok(new_pos) => new_pos as i64,
            Err(_) => AVERROR_EIO as i64,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct MemReader {
        data: Vec<u8>,
        pos: usize,
        seekable: bool,
    }

    impl MemReader {
        fn new(data: &[u8], seekable: bool) -> Self {
            Self {
                data: data.to_vec(),
                pos: 0,
                seekable,
            }
        }
    }

    impl IoStream for MemReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = buf.len().min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }

        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            if !self.seekable {
                return Err(io::Error::from(io::ErrorKind::Unsupported));
            }
            let len = self.data.len() as i64;
            let target = match pos {
                SeekFrom::Start(p) => p as i64,
                SeekFrom::Current(d) => self.pos as i64 + d,
                SeekFrom::End(d) => len + d,
            };
            if target < 0 {
                return Err(io::Error::from(io::ErrorKind::InvalidInput));
            }
            self.pos = (target.min(len)) as usize;
            Ok(self.pos as u64)
        }

        fn stream_len(&self) -> Option<u64> {
            self.seekable.then_some(self.data.len() as u64)
        }

        fn is_seekable(&self) -> bool {
            self.seekable
        }
    }

    struct MemWriter {
        // Shared so tests can observe writes after the stream moves behind
        // the opaque pointer.
        written: Arc<std::sync::Mutex<Vec<u8>>>,
    }

    impl IoStream for MemWriter {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::Unsupported))
        }

        fn write(&mut self, buf: &[u8]) -> io::Result<()> {
            self.written.lock().unwrap().extend_from_slice(buf);
            Ok(())
        }

        fn is_readable(&self) -> bool {
            false
        }

        fn is_writable(&self) -> bool {
            true
        }
    }

    struct FailingStream;

    impl IoStream for FailingStream {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }
    }

    struct DropProbe(Arc<AtomicUsize>);

    impl IoStream for DropProbe {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Ok(0)
        }
    }

    impl Drop for DropProbe {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn leak_stream(stream: impl IoStream + 'static) -> *mut Box<dyn IoStream> {
        Box::into_raw(Box::new(Box::new(stream) as Box<dyn IoStream>))
    }

    unsafe fn reclaim_stream(opaque: *mut Box<dyn IoStream>) {
        unsafe { drop(Box::from_raw(opaque)) };
    }

    #[test]
    fn context_reports_declared_capabilities() {
        let reader = IoContext::new(Box::new(MemReader::new(b"abc", true)), 4096).unwrap();
        assert!(reader.is_readable().unwrap());
        assert!(reader.is_seekable().unwrap());
        assert!(!reader.is_writable().unwrap());

        // Write-only: the read callback is withheld at registration, so the
        // native layer sees null and never attempts a read.
        let writer = IoContext::new(
            Box::new(MemWriter {
                written: Arc::default(),
            }),
            4096,
        )
        .unwrap();
        assert!(!writer.is_readable().unwrap());
        assert!(!writer.is_seekable().unwrap());
        assert!(writer.is_writable().unwrap());
    }

    #[test]
    fn close_is_idempotent_and_drops_stream_once() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut ctx = IoContext::new(Box::new(DropProbe(drops.clone())), 1024).unwrap();

        ctx.close();
        assert_eq!(drops.load(Ordering::SeqCst), 1);
        assert!(matches!(ctx.is_seekable(), Err(CodecError::Disposed(_))));

        ctx.close();
        drop(ctx);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn read_bridge_translates_results() {
        let opaque = leak_stream(MemReader::new(b"hello", false));
        let mut buf = [0u8; 8];

        unsafe {
            let n = read_bridge(opaque as *mut c_void, buf.as_mut_ptr(), buf.len() as c_int);
            assert_eq!(n, 5);
            assert_eq!(&buf[..5], b"hello");

            // Exhausted stream yields the end-of-stream sentinel, never 0.
            let n = read_bridge(opaque as *mut c_void, buf.as_mut_ptr(), buf.len() as c_int);
            assert_eq!(n, AVERROR_EOF);

            reclaim_stream(opaque);
        }
    }

    #[test]
    fn read_bridge_maps_stream_errors_to_eio() {
        let opaque = leak_stream(FailingStream);
        let mut buf = [0u8; 8];
        unsafe {
            let n = read_bridge(opaque as *mut c_void, buf.as_mut_ptr(), buf.len() as c_int);
            assert_eq!(n, AVERROR_EIO);
            reclaim_stream(opaque);
        }
    }

    #[test]
    fn write_bridge_consumes_full_buffer() {
        let written = Arc::new(std::sync::Mutex::new(Vec::new()));
        let opaque = leak_stream(MemWriter {
            written: written.clone(),
        });
        let data = b"payload";
        unsafe {
            let n = write_bridge(opaque as *mut c_void, data.as_ptr(), data.len() as c_int);
            assert_eq!(n, data.len() as c_int);
            reclaim_stream(opaque);
        }
        assert_eq!(written.lock().unwrap().as_slice(), data);
    }

    #[test]
    fn seek_bridge_handles_size_query_and_whence() {
        let opaque = leak_stream(MemReader::new(b"0123456789", true));
        unsafe {
            // Size sentinel answers without moving the position.
            let size = seek_bridge(opaque as *mut c_void, 0, seek_whence::AVSEEK_SIZE);
            assert_eq!(size, 10);

            let pos = seek_bridge(opaque as *mut c_void, 4, seek_whence::SEEK_SET);
            assert_eq!(pos, 4);

            let pos = seek_bridge(opaque as *mut c_void, 2, seek_whence::SEEK_CUR);
            assert_eq!(pos, 6);

            let pos = seek_bridge(opaque as *mut c_void, -1, seek_whence::SEEK_END);
            assert_eq!(pos, 9);

            // AVSEEK_FORCE is a flag, not a mode.
            let pos = seek_bridge(
                opaque as *mut c_void,
                1,
                seek_whence::SEEK_SET | seek_whence::AVSEEK_FORCE,
            );
            assert_eq!(pos, 1);

            let err = seek_bridge(opaque as *mut c_void, 0, 7);
            assert_eq!(err, AVERROR_EINVAL as i64);

            reclaim_stream(opaque);
        }
    }

    #[test]
    fn seek_bridge_without_length_reports_enosys() {
        let opaque = leak_stream(MemReader::new(b"abc", false));
        unsafe {
            let size = seek_bridge(opaque as *mut c_void, 0, seek_whence::AVSEEK_SIZE);
            assert_eq!(size, AVERROR_ENOSYS as i64);

            let pos = seek_bridge(opaque as *mut c_void, 1, seek_whence::SEEK_SET);
            assert_eq!(pos, AVERROR_EIO as i64);

            reclaim_stream(opaque);
        }
    }
}
