// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// POSIX shared memory: shm_open / ftruncate / mmap / shm_unlink.
// The descriptor is only needed until the mapping exists; it is held in an
// OwnedFd so every early return closes it.

use std::ffi::CString;
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::ptr;

use crate::error::{Error, Result};
use crate::shm_name;

/// S_IRUSR|S_IWUSR|S_IRGRP|S_IWGRP|S_IROTH|S_IWOTH
const PERMS: libc::mode_t = 0o666;

/// How [`PlatformShm::acquire`] treats the named object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShmMode {
    /// Remove any stale object, create a fresh one of exactly `size` bytes.
    /// The handle owns the name and unlinks it on drop.
    Create,
    /// Map an existing object as-is; `size` is the minimum accepted size.
    /// The handle never unlinks.
    Open,
}

pub struct PlatformShm {
    mem: *mut u8,
    size: usize,
    name: String,
    owner: bool,
    ident: (u64, u64),
}

// Safety: the mapping is process-shared memory; all access goes through raw
// pointers and the crate's single-writer rules.
unsafe impl Send for PlatformShm {}
unsafe impl Sync for PlatformShm {}

impl PlatformShm {
    pub fn acquire(name: &str, size: usize, mode: ShmMode) -> Result<Self> {
        let posix_name = shm_name::make_shm_name(name)?;
        let c_name = CString::new(posix_name.as_bytes()).map_err(|_| Error::InvalidName {
            name: name.to_string(),
            reason: "contains NUL",
        })?;

        match mode {
            ShmMode::Create => Self::create(posix_name, &c_name, size),
            ShmMode::Open => Self::open(posix_name, &c_name, size),
        }
    }

    fn create(posix_name: String, c_name: &CString, size: usize) -> Result<Self> {
        // Clean start: never inherit the contents of a crashed run.
        unsafe { libc::shm_unlink(c_name.as_ptr()) };

        let raw = unsafe {
            libc::shm_open(
                c_name.as_ptr(),
                libc::O_RDWR | libc::O_CREAT | libc::O_EXCL,
                PERMS as libc::c_uint,
            )
        };
        if raw == -1 {
            return Err(Error::os("shm_open"));
        }
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };

        let mapped = (|| -> Result<(*mut u8, (u64, u64))> {
            // The creation mode is filtered by the umask; force world rw so an
            // unprivileged peer running as another user can still map it.
            if unsafe { libc::fchmod(fd.as_raw_fd(), PERMS) } != 0 {
                tracing::warn!(
                    name = %posix_name,
                    error = %io::Error::last_os_error(),
                    "fchmod failed, permissions follow the umask"
                );
            }
            if unsafe { libc::ftruncate(fd.as_raw_fd(), size as libc::off_t) } != 0 {
                return Err(Error::os("ftruncate"));
            }
            let ident = identity(&stat(&fd)?);
            let mem = map(&fd, size)?;
            Ok((mem, ident))
        })();

        match mapped {
            Ok((mem, ident)) => Ok(Self {
                mem,
                size,
                name: posix_name,
                owner: true,
                ident,
            }),
            Err(e) => {
                // The object already exists in the namespace; do not leave a
                // half-initialised one behind.
                unsafe { libc::shm_unlink(c_name.as_ptr()) };
                Err(e)
            }
        }
    }

    fn open(posix_name: String, c_name: &CString, min_size: usize) -> Result<Self> {
        let raw = unsafe { libc::shm_open(c_name.as_ptr(), libc::O_RDWR, PERMS as libc::c_uint) };
        if raw == -1 {
            let source = io::Error::last_os_error();
            if source.kind() == io::ErrorKind::NotFound {
                return Err(Error::NotFound { name: posix_name });
            }
            return Err(Error::Os {
                op: "shm_open",
                source,
            });
        }
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };

        let st = stat(&fd)?;
        let size = usize::try_from(st.st_size).unwrap_or(0);
        if size < min_size {
            return Err(Error::TooSmall {
                size,
                required: min_size,
            });
        }
        let mem = map(&fd, size)?;

        Ok(Self {
            mem,
            size,
            name: posix_name,
            owner: false,
            ident: identity(&st),
        })
    }

    pub fn as_mut_ptr(&self) -> *mut u8 {
        self.mem
    }

    /// Mapped size in bytes (the object size at map time).
    pub fn size(&self) -> usize {
        self.size
    }

    /// POSIX name (with leading '/').
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this handle created the object. It unlinks the name on drop
    /// only while the name still refers to that object.
    pub fn is_owner(&self) -> bool {
        self.owner
    }

    /// Whether the name still resolves to the object this handle mapped.
    ///
    /// Goes false when the object has been unlinked, or unlinked and
    /// recreated by a restarted producer.
    pub fn is_current(&self) -> bool {
        let Ok(c_name) = CString::new(self.name.as_bytes()) else {
            return false;
        };
        let raw =
            unsafe { libc::shm_open(c_name.as_ptr(), libc::O_RDONLY, PERMS as libc::c_uint) };
        if raw == -1 {
            return false;
        }
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };
        matches!(stat(&fd), Ok(st) if identity(&st) == self.ident)
    }

    /// Remove a named object without an open handle. Missing objects are ignored.
    pub fn unlink_by_name(name: &str) {
        let Ok(posix_name) = shm_name::make_shm_name(name) else {
            return;
        };
        if let Ok(c_name) = CString::new(posix_name.as_bytes()) {
            unsafe { libc::shm_unlink(c_name.as_ptr()) };
        }
    }
}

impl Drop for PlatformShm {
    fn drop(&mut self) {
        if self.mem.is_null() {
            return;
        }
        unsafe { libc::munmap(self.mem.cast::<libc::c_void>(), self.size) };
        self.mem = ptr::null_mut();
        // A restarted creator may already own the name; only remove our own
        // object.
        if self.owner && self.is_current() {
            if let Ok(c_name) = CString::new(self.name.as_bytes()) {
                unsafe { libc::shm_unlink(c_name.as_ptr()) };
            }
        }
    }
}

fn stat(fd: &OwnedFd) -> Result<libc::stat> {
    let mut st: libc::stat = unsafe { std::mem::zeroed() };
    if unsafe { libc::fstat(fd.as_raw_fd(), &mut st) } != 0 {
        return Err(Error::os("fstat"));
    }
    Ok(st)
}

fn identity(st: &libc::stat) -> (u64, u64) {
    (st.st_dev as u64, st.st_ino as u64)
}

fn map(fd: &OwnedFd, size: usize) -> Result<*mut u8> {
    let mem = unsafe {
        libc::mmap(
            ptr::null_mut(),
            size,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_SHARED,
            fd.as_raw_fd(),
            0,
        )
    };
    if mem == libc::MAP_FAILED {
        return Err(Error::os("mmap"));
    }
    Ok(mem.cast::<u8>())
}
