use std::ffi::CString;
use std::mem;
use std::ptr;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::transport::TransportError;

/// Marker written after the embedded lock is initialized, so an opener never
/// touches a half-constructed mutex.
const SEGMENT_MAGIC: u32 = 0x4241_4E4B; // "BANK"

/// Header placed at offset 0 of the shared memory object. The mailbox buffer
/// follows immediately after.
#[repr(C)]
pub(crate) struct SegmentHeader {
    magic: AtomicU32,
    lock: libc::pthread_mutex_t
}

/// A named POSIX shared memory object, mapped into this process.
///
/// The server creates the segment (unlinking any stale object from a crashed
/// previous run) and initializes the process-shared robust mutex in the
/// header; clients open the existing object. The creator unlinks the name on
/// drop, both sides unmap their view.
pub(crate) struct SharedSegment {
    name: CString,
    base: *mut u8,
    len: usize,
    capacity: usize,
    owner: bool
}

// The mapping is valid for the lifetime of the struct and all access to the
// buffer goes through the embedded cross-process lock.
unsafe impl Send for SharedSegment {}
unsafe impl Sync for SharedSegment {}

impl SharedSegment {
    pub(crate) fn create(name: &str, capacity: usize) -> Result<Self, TransportError> {
        let c_name = to_posix_name(name)?;

        // A crashed server can leave the object behind; start fresh so the
        // mutex below is always initialized exactly once.
        // SAFETY: c_name is a valid NUL-terminated string.
        unsafe { libc::shm_unlink(c_name.as_ptr()) };

        let fd = unsafe {
            libc::shm_open(
                c_name.as_ptr(),
                libc::O_CREAT | libc::O_EXCL | libc::O_RDWR,
                0o600 as libc::mode_t
            )
        };
        if fd < 0 {
            return Err(TransportError::os("shm_open"));
        }

        let len = total_len(capacity);
        if unsafe { libc::ftruncate(fd, len as libc::off_t) } != 0 {
            let err = TransportError::os("ftruncate");
            unsafe { libc::close(fd) };
            return Err(err);
        }

        let base = map(fd, len)?;
        let segment = Self {
            name: c_name,
            base,
            len,
            capacity,
            owner: true
        };

        segment.init_lock()?;

        Ok(segment)
    }

    pub(crate) fn open(name: &str, capacity: usize) -> Result<Self, TransportError> {
        let c_name = to_posix_name(name)?;

        let fd = unsafe { libc::shm_open(c_name.as_ptr(), libc::O_RDWR, 0) };
        if fd < 0 {
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::ENOENT) {
                return Err(TransportError::receiver_offline(name));
            }
            return Err(TransportError::Os {
                operation: "shm_open",
                source: err
            });
        }

        let len = total_len(capacity);
        let base = map(fd, len)?;
        let segment = Self {
            name: c_name,
            base,
            len,
            capacity,
            owner: false
        };

        if segment.header().magic.load(Ordering::Acquire) != SEGMENT_MAGIC {
            // Exists but the creator has not finished setting it up.
            return Err(TransportError::receiver_offline(name));
        }

        Ok(segment)
    }

    fn init_lock(&self) -> Result<(), TransportError> {
        // SAFETY: the mapping is fresh, exclusively ours (O_EXCL) and large
        // enough for the header; nobody else can observe the mutex until the
        // magic marker is published below.
        unsafe {
            let mut attr: libc::pthread_mutexattr_t = mem::zeroed();

            let rc = libc::pthread_mutexattr_init(&mut attr);
            if rc != 0 {
                return Err(TransportError::os_code("pthread_mutexattr_init", rc));
            }

            libc::pthread_mutexattr_setpshared(&mut attr, libc::PTHREAD_PROCESS_SHARED);
            // Robustness lets the next acquirer recover a lock whose holder
            // died mid-critical-section instead of hanging forever.
            libc::pthread_mutexattr_setrobust(&mut attr, libc::PTHREAD_MUTEX_ROBUST);

            let rc = libc::pthread_mutex_init(self.lock_ptr(), &attr);
            libc::pthread_mutexattr_destroy(&mut attr);
            if rc != 0 {
                return Err(TransportError::os_code("pthread_mutex_init", rc));
            }
        }

        self.header().magic.store(SEGMENT_MAGIC, Ordering::Release);

        Ok(())
    }

    fn header(&self) -> &SegmentHeader {
        // SAFETY: base points at a mapping of at least total_len bytes and
        // the header sits at offset 0 with C layout.
        unsafe { &*(self.base as *const SegmentHeader) }
    }

    pub(crate) fn lock_ptr(&self) -> *mut libc::pthread_mutex_t {
        // SAFETY: same layout argument as header().
        unsafe { &raw mut (*(self.base as *mut SegmentHeader)).lock }
    }

    pub(crate) fn buffer_ptr(&self) -> *mut u8 {
        // SAFETY: the buffer follows the header inside the mapping.
        unsafe { self.base.add(mem::size_of::<SegmentHeader>()) }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Drop for SharedSegment {
    fn drop(&mut self) {
        // SAFETY: base/len describe the mapping made in create/open; the
        // name outlives the call.
        unsafe {
            libc::munmap(self.base as *mut libc::c_void, self.len);
            if self.owner {
                libc::shm_unlink(self.name.as_ptr());
            }
        }
    }
}

fn total_len(capacity: usize) -> usize {
    mem::size_of::<SegmentHeader>() + capacity
}

fn to_posix_name(name: &str) -> Result<CString, TransportError> {
    CString::new(name).map_err(|_| TransportError::Os {
        operation: "shm name",
        source: std::io::Error::from(std::io::ErrorKind::InvalidInput)
    })
}

/// Maps `len` bytes of `fd` shared read-write, closing the descriptor in all
/// cases (the mapping keeps the object alive).
fn map(fd: i32, len: usize) -> Result<*mut u8, TransportError> {
    let base = unsafe {
        libc::mmap(
            ptr::null_mut(),
            len,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_SHARED,
            fd,
            0
        )
    };
    unsafe { libc::close(fd) };

    if base == libc::MAP_FAILED {
        return Err(TransportError::os("mmap"));
    }

    Ok(base as *mut u8)
}
