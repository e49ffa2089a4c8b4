// Readable memory spans the harness compares against each other.
//
// The device side is normally a read-only window onto physical memory,
// the reference side is the image loaded from disk. Both are accessed
// through `MemoryRegion` so the comparison loop never knows which is which.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::ptr;

pub trait MemoryRegion {
    /// Length of the region in bytes.
    fn len(&self) -> usize;

    /// Address of the first byte as seen on the bus.
    fn base_address(&self) -> u64;

    fn read_u8(&self, offset: usize) -> u8;

    /// Reads the 16-bit word at byte `offset`, in 68000 bus order (big endian).
    ///
    /// # Panics
    /// Panics if `offset` is odd or out of range.
    fn read_u16(&self, offset: usize) -> u16;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A region backed by an owned byte buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferRegion {
    data: Vec<u8>,
    base: u64,
}

impl BufferRegion {
    pub fn new(data: Vec<u8>, base: u64) -> Self {
        Self { data, base }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl MemoryRegion for BufferRegion {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn base_address(&self) -> u64 {
        self.base
    }

    fn read_u8(&self, offset: usize) -> u8 {
        self.data[offset]
    }

    fn read_u16(&self, offset: usize) -> u16 {
        assert!(offset % 2 == 0, "misaligned word read at offset {:#x}", offset);
        u16::from_be_bytes([self.data[offset], self.data[offset + 1]])
    }
}

#[derive(Debug)]
pub enum RegionError {
    /// The process may not read physical memory.
    Privilege,
    PageSize,
    Open { path: PathBuf, source: io::Error },
    Map { base: u64, len: usize, source: io::Error },
}

impl fmt::Display for RegionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionError::Privilege => {
                write!(f, "reading the ROM window needs root privileges (try running with sudo)")
            }
            RegionError::PageSize => write!(f, "could not determine the system page size"),
            RegionError::Open { path, source } => {
                write!(f, "failed to open {}: {}", path.display(), source)
            }
            RegionError::Map { base, len, source } => {
                write!(f, "failed to map {} bytes at {:#x}: {}", len, base, source)
            }
        }
    }
}

impl std::error::Error for RegionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegionError::Open { source, .. } | RegionError::Map { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Fails unless the process runs with an effective uid of root, which
/// `/dev/mem` requires on every distribution we care about.
pub fn ensure_privileged() -> Result<(), RegionError> {
    if unsafe { libc::geteuid() } != 0 {
        return Err(RegionError::Privilege);
    }
    Ok(())
}

/// A read-only mapping of physical memory.
/// The mapping is released when this object is dropped. Nothing is ever written through it.
#[derive(Debug)]
pub struct MappedRegion {
    map_ptr: *mut libc::c_void,
    map_len: usize,
    data: *const u8,
    len: usize,
    base: u64,
}

impl MappedRegion {
    /// Maps `len` bytes starting at physical address `base` from `device`
    /// (normally `/dev/mem`).
    ///
    /// The mapping offset is rounded down to a page boundary, the returned
    /// region still starts exactly at `base`.
    pub fn map(device: &Path, base: u64, len: usize) -> Result<Self, RegionError> {
        let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        if page_size <= 0 {
            return Err(RegionError::PageSize);
        }
        let page_size = page_size as u64;

        let aligned_base = base & !(page_size - 1);
        let lead = (base - aligned_base) as usize;
        let map_len = lead + len;

        // O_SYNC keeps the kernel from handing out a cached view of the bus.
        let file: File = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_SYNC)
            .open(device)
            .map_err(|source| RegionError::Open {
                path: device.to_path_buf(),
                source,
            })?;

        let map_ptr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                map_len,
                libc::PROT_READ,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                aligned_base as libc::off_t,
            )
        };
        if map_ptr == libc::MAP_FAILED {
            return Err(RegionError::Map {
                base,
                len,
                source: io::Error::last_os_error(),
            });
        }

        // The mapping stays valid after the descriptor is closed.
        drop(file);

        Ok(Self {
            map_ptr,
            map_len,
            data: unsafe { (map_ptr as *const u8).add(lead) },
            len,
            base,
        })
    }
}

impl MemoryRegion for MappedRegion {
    fn len(&self) -> usize {
        self.len
    }

    fn base_address(&self) -> u64 {
        self.base
    }

    fn read_u8(&self, offset: usize) -> u8 {
        assert!(offset < self.len, "read past end of mapped region: {:#x}", offset);
        unsafe { ptr::read_volatile(self.data.add(offset)) }
    }

    fn read_u16(&self, offset: usize) -> u16 {
        assert!(offset % 2 == 0, "misaligned word read at offset {:#x}", offset);
        assert!(offset + 1 < self.len, "read past end of mapped region: {:#x}", offset);
        // `base` is word aligned and so is the page-aligned mapping, so this
        // is a real 16-bit bus cycle.
        let raw = unsafe { ptr::read_volatile(self.data.add(offset) as *const u16) };
        u16::from_be(raw)
    }
}

impl Drop for MappedRegion {
    fn drop(&mut self) {
        unsafe {
            // Nothing useful can be done about a failing munmap here.
            let _ = libc::munmap(self.map_ptr, self.map_len);
        }
    }
}
