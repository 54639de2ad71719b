//! # Memory-Mapped Region
//!
//! `MappedRegion` is a thin RAII handle over one OS memory mapping covering
//! `[offset, offset + len)` of a file. It is an internal building block used
//! by [`LogFile`](super::LogFile); users should not create `MappedRegion`
//! instances directly.
//!
//! ## Safety Model
//!
//! A mapping becomes invalid when the owning `LogFile` remaps (during file
//! growth). Instead of runtime guards, chronolog leans on the borrow checker:
//!
//! ```text
//! as_slice(&self) -> &[u8]              // Immutable borrow of self
//! as_mut_slice(&mut self) -> &mut [u8]  // Mutable borrow of self
//! unmap(&mut self)                      // Mutable borrow (exclusive)
//! ```
//!
//! Since remapping requires `&mut`, the compiler ensures no byte views exist
//! when the region is unmapped or replaced.
//!
//! ## Descriptor Lifetime
//!
//! The mapping must stay valid even if external code closes the original
//! descriptor. `memmap2` provides exactly this: on POSIX a mapping outlives
//! its descriptor by definition, and on Windows the crate duplicates the
//! file handle so the section is not torn down under the mapping.
//!
//! ## Flushing
//!
//! `flush_async` schedules dirty pages for write-back (`msync(MS_ASYNC)` /
//! `FlushViewOfFile`) and returns immediately; `flush` blocks until the
//! pages reach the device. Neither is called implicitly: durability is the
//! caller's decision.

use std::fs::File;

use eyre::{ensure, Result, WrapErr};
use memmap2::{MmapOptions, MmapRaw};

/// RAII handle over one platform memory mapping.
///
/// The region is unmapped when dropped; [`unmap`](Self::unmap) releases it
/// earlier and is idempotent.
#[derive(Debug)]
pub struct MappedRegion {
    raw: Option<MmapRaw>,
    offset: u64,
    read_only: bool,
}

impl MappedRegion {
    /// Maps `[offset, offset + len)` of `file`.
    ///
    /// Zero-length mappings are rejected: `mmap` with length 0 fails on
    /// POSIX, and an empty window is never useful to a log file.
    pub fn new(file: &File, len: usize, offset: u64, read_only: bool) -> Result<Self> {
        ensure!(len > 0, "cannot map a zero-length region");

        let mut options = MmapOptions::new();
        options.offset(offset).len(len);

        let raw = if read_only {
            options.map_raw_read_only(file).wrap_err_with(|| {
                format!("failed to map {} bytes read-only at offset {}", len, offset)
            })?
        } else {
            options
                .map_raw(file)
                .wrap_err_with(|| format!("failed to map {} bytes at offset {}", len, offset))?
        };

        Ok(Self {
            raw: Some(raw),
            offset,
            read_only,
        })
    }

    pub fn len(&self) -> usize {
        self.raw.as_ref().map_or(0, |raw| raw.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Schedules dirty pages for asynchronous write-back.
    pub fn flush_async(&self) -> Result<()> {
        if let Some(raw) = &self.raw {
            raw.flush_async()
                .wrap_err("failed to schedule mapping write-back")?;
        }
        Ok(())
    }

    /// Synchronously flushes dirty pages to the device.
    pub fn flush(&self) -> Result<()> {
        if let Some(raw) = &self.raw {
            raw.flush().wrap_err("failed to flush mapping to disk")?;
        }
        Ok(())
    }

    /// Releases the mapping. Safe to call more than once.
    pub fn unmap(&mut self) {
        self.raw = None;
    }

    pub fn as_slice(&self) -> &[u8] {
        match &self.raw {
            // SAFETY: the pointer and length come from a live mapping owned
            // by self, and the returned slice borrows self, so the borrow
            // checker prevents it from outliving an unmap or remap.
            Some(raw) => unsafe {
                std::slice::from_raw_parts(raw.as_ptr() as *const u8, raw.len())
            },
            None => &[],
        }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        debug_assert!(!self.read_only, "mutable access to a read-only mapping");
        match &self.raw {
            // SAFETY: as for as_slice, plus the mapping was created writable
            // (callers gate on the read-only flag, checked above in debug).
            Some(raw) => unsafe { std::slice::from_raw_parts_mut(raw.as_mut_ptr(), raw.len()) },
            None => &mut [],
        }
    }
}
