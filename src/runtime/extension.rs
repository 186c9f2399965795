//! Allocator and file-read bridge for the skeletal-animation runtime.
//!
//! The runtime obtains all of its parse buffers through four hooks: allocate,
//! reallocate, free and a whole-file reader. [`install`] redirects those hooks
//! to the host engine exactly once during startup; any parsing that happens
//! before an explicit install latches the host defaults instead. Installation
//! is process-wide state and is not re-entrant: it must happen on the startup
//! thread before the first atlas or skeleton parse.

use std::alloc::{self, Layout};
use std::fs::File;
use std::io::Read;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::slice;
use std::sync::OnceLock;

/// Allocate `size` bytes. A zero-byte request returns a null pointer.
pub type AllocFn = fn(usize) -> *mut u8;
/// Resize an allocation from [`AllocFn`]. A zero-byte request frees and returns null.
pub type ReallocFn = unsafe fn(*mut u8, usize) -> *mut u8;
/// Release an allocation from [`AllocFn`]. Freeing null is a no-op.
pub type FreeFn = unsafe fn(*mut u8);
/// Read a whole file into a buffer obtained from the installed allocator.
pub type ReadFileFn = fn(&Path) -> Result<RawBuffer, FileError>;

/// The four hooks the runtime calls into the host engine with.
#[derive(Clone, Copy)]
pub struct SpineExtension {
    pub alloc: AllocFn,
    pub realloc: ReallocFn,
    pub free: FreeFn,
    pub read_file: ReadFileFn,
}

/// Failure modes of the file-read hook.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FileError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to allocate a {0} byte read buffer")]
    Allocation(usize),
    #[error("read failed: {0}")]
    Io(String),
}

/// Returned by [`install`] when hooks are already latched.
#[derive(Debug, thiserror::Error)]
#[error("spine extension hooks are already installed")]
pub struct AlreadyInstalled;

static EXTENSION: OnceLock<SpineExtension> = OnceLock::new();

/// Install custom hooks. Succeeds at most once per process; fails if hooks
/// were installed before or any parse already latched the host defaults.
pub fn install(extension: SpineExtension) -> Result<(), AlreadyInstalled> {
    EXTENSION.set(extension).map_err(|_| {
        log::warn!("spine extension hooks are already installed, ignoring redundant install");
        AlreadyInstalled
    })
}

/// Install the host-engine defaults unless hooks are present already.
///
/// Called by the resource type registration; calling it again is harmless.
pub fn install_default() {
    if EXTENSION.set(HOST_EXTENSION).is_err() {
        log::debug!("spine extension hooks already installed");
    }
}

fn get() -> &'static SpineExtension {
    EXTENSION.get_or_init(|| HOST_EXTENSION)
}

/// Allocate through the installed hook. Zero bytes yields a null pointer.
pub fn allocate(size: usize) -> *mut u8 {
    (get().alloc)(size)
}

/// Reallocate through the installed hook.
///
/// # Safety
///
/// `ptr` must be null or a live allocation from [`allocate`].
pub unsafe fn reallocate(ptr: *mut u8, size: usize) -> *mut u8 {
    unsafe { (get().realloc)(ptr, size) }
}

/// Free through the installed hook. Freeing null is a no-op.
///
/// # Safety
///
/// `ptr` must be null or a live allocation from [`allocate`].
pub unsafe fn deallocate(ptr: *mut u8) {
    unsafe { (get().free)(ptr) }
}

/// Read a whole file through the installed hook.
pub fn read_file(path: &Path) -> Result<RawBuffer, FileError> {
    (get().read_file)(path)
}

/// A byte buffer owned by the runtime allocator.
///
/// Frees itself through the installed free hook, so a buffer never leaks on
/// an early-exit parse path. Dereferences to `[u8]`.
pub struct RawBuffer {
    ptr: *mut u8,
    len: usize,
}

impl RawBuffer {
    /// Take ownership of `len` bytes produced by the installed allocator.
    /// A null `ptr` with `len == 0` is the canonical empty buffer.
    pub fn from_raw(ptr: *mut u8, len: usize) -> Self {
        Self { ptr, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Deref for RawBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        if self.ptr.is_null() {
            &[]
        } else {
            unsafe { slice::from_raw_parts(self.ptr, self.len) }
        }
    }
}

impl Drop for RawBuffer {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            unsafe { deallocate(self.ptr) };
        }
    }
}

impl std::fmt::Debug for RawBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RawBuffer({} bytes)", self.len)
    }
}

/// Host defaults: `std::alloc` with a size header plus synchronous `std::fs` reads.
pub const HOST_EXTENSION: SpineExtension = SpineExtension {
    alloc: host_alloc,
    realloc: host_realloc,
    free: host_free,
    read_file: host_read_file,
};

// The runtime frees without passing the allocation size back, so the size is
// stashed in a 16-byte header in front of the payload. 16 also keeps the
// payload aligned for any runtime structure.
const HEADER: usize = 16;

fn host_alloc(size: usize) -> *mut u8 {
    if size == 0 {
        return std::ptr::null_mut();
    }
    let Ok(layout) = Layout::from_size_align(size + HEADER, HEADER) else {
        return std::ptr::null_mut();
    };
    unsafe {
        let base = alloc::alloc(layout);
        if base.is_null() {
            return std::ptr::null_mut();
        }
        (base as *mut usize).write(size);
        base.add(HEADER)
    }
}

unsafe fn host_free(ptr: *mut u8) {
    if ptr.is_null() {
        return;
    }
    unsafe {
        let base = ptr.sub(HEADER);
        let size = (base as *const usize).read();
        let layout = Layout::from_size_align_unchecked(size + HEADER, HEADER);
        alloc::dealloc(base, layout);
    }
}

unsafe fn host_realloc(ptr: *mut u8, size: usize) -> *mut u8 {
    if size == 0 {
        unsafe { host_free(ptr) };
        return std::ptr::null_mut();
    }
    if ptr.is_null() {
        return host_alloc(size);
    }
    let grown = host_alloc(size);
    if grown.is_null() {
        return std::ptr::null_mut();
    }
    unsafe {
        let old_size = (ptr.sub(HEADER) as *const usize).read();
        std::ptr::copy_nonoverlapping(ptr, grown, old_size.min(size));
        host_free(ptr);
    }
    grown
}

fn host_read_file(path: &Path) -> Result<RawBuffer, FileError> {
    let mut file = File::open(path).map_err(|_| FileError::NotFound(path.to_path_buf()))?;
    let len = file
        .metadata()
        .map_err(|err| FileError::Io(err.to_string()))?
        .len() as usize;
    if len == 0 {
        return Ok(RawBuffer::from_raw(std::ptr::null_mut(), 0));
    }
    let ptr = allocate(len);
    if ptr.is_null() {
        return Err(FileError::Allocation(len));
    }
    // The buffer now owns the allocation and releases it if the read fails.
    let buffer = RawBuffer::from_raw(ptr, len);
    let target = unsafe { slice::from_raw_parts_mut(ptr, len) };
    file.read_exact(target)
        .map_err(|err| FileError::Io(err.to_string()))?;
    Ok(buffer)
}
