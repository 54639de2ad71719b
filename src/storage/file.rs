//! # Log File
//!
//! `LogFile` owns one backing file of a log (the time file or the data
//! file), its descriptor, its logical write position, and the memory mapping
//! covering the portion the log currently reads and writes.
//!
//! ## Growth Policy
//!
//! Appends never issue write syscalls; they store through the mapping. When
//! a write would land outside the mapped window, [`LogFile::ensure_mapped`]
//! grows the file and remaps:
//!
//! 1. Round the required size up to the next multiple of `map_grow_size`.
//! 2. Extend the file to that size (`ftruncate` / `SetEndOfFile`).
//! 3. Double `map_grow_size`, clamped at `max_grow_size`.
//! 4. Remap a single window covering the whole file.
//!
//! Doubling amortizes remap cost: a steady append load triggers
//! exponentially fewer remaps as the file grows, until the cap turns growth
//! linear in `max_grow_size` steps.
//!
//! ## Close Semantics
//!
//! Growth leaves the file longer than the data actually written. `close`
//! unmaps, truncates the file back to exactly `write_pos` bytes (when the
//! file was written to), and drops the descriptor, so a closed log file
//! holds no trailing zeros.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use eyre::{bail, ensure, Result, WrapErr};
use tracing::{debug, warn};

use super::MappedRegion;

/// How a log file is created or opened, mirroring the usual platform
/// creation dispositions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Create the file, replacing any existing content.
    CreateAlways,
    /// Create the file; fail if it already exists.
    CreateNew,
    /// Open the file, creating it when absent.
    OpenAlways,
    /// Open an existing file; fail if absent.
    OpenExisting,
    /// Open an existing file and discard its content.
    OpenExistingTruncate,
}

/// One backing file with its mapping and growth state.
#[derive(Debug)]
pub struct LogFile {
    file: Option<File>,
    path: PathBuf,
    read_only: bool,
    /// Next byte position to be written; also the file's logical length.
    pub(crate) write_pos: u64,
    file_size: u64,
    /// Current growth quantum in bytes. Doubles on each growth up to
    /// `max_grow_size`.
    pub(crate) map_grow_size: u64,
    pub(crate) max_grow_size: u64,
    map: Option<MappedRegion>,
}

impl LogFile {
    /// Opens `path` according to `disposition` and records the current file
    /// size.
    ///
    /// Read-only opens ignore the creation and truncation aspects of the
    /// disposition: the file is opened as-is with read access only.
    pub fn open(path: impl AsRef<Path>, disposition: Disposition, read_only: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let mut options = OpenOptions::new();
        options.read(true);
        if !read_only {
            options.write(true);
            match disposition {
                Disposition::CreateAlways => {
                    options.create(true).truncate(true);
                }
                Disposition::CreateNew => {
                    options.create_new(true);
                }
                Disposition::OpenAlways => {
                    options.create(true);
                }
                Disposition::OpenExisting => {}
                Disposition::OpenExistingTruncate => {
                    options.truncate(true);
                }
            }
        }

        let file = options
            .open(&path)
            .wrap_err_with(|| format!("failed to open log file '{}'", path.display()))?;

        let file_size = file
            .metadata()
            .wrap_err_with(|| format!("failed to stat log file '{}'", path.display()))?
            .len();

        Ok(Self {
            file: Some(file),
            path,
            read_only,
            write_pos: 0,
            file_size,
            map_grow_size: 0,
            max_grow_size: 0,
            map: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn is_mapped(&self) -> bool {
        self.map.is_some()
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn write_pos(&self) -> u64 {
        self.write_pos
    }

    pub(crate) fn file(&self) -> Result<&File> {
        match &self.file {
            Some(file) => Ok(file),
            None => bail!("log file '{}' is closed", self.path.display()),
        }
    }

    /// Ensures the mapping covers `[pos, pos + len)` and returns the offset
    /// of `pos` within the mapped window.
    ///
    /// For writable files this applies the growth policy and remaps the
    /// whole file. For read-only files the window is resized to the current
    /// file size, and a range beyond the file is an error.
    pub fn ensure_mapped(&mut self, pos: u64, len: u64) -> Result<usize> {
        let end = pos
            .checked_add(len)
            .ok_or_else(|| eyre::eyre!("mapped range overflows: {} + {}", pos, len))?;

        if let Some(map) = &self.map {
            if end <= map.len() as u64 {
                return Ok(pos as usize);
            }
        }

        if !self.read_only {
            let grow = self.map_grow_size.max(1);
            let wanted = ((end + grow - 1) / grow) * grow;
            if wanted > self.file_size {
                self.file_size = wanted;
            }

            if self.map_grow_size < self.max_grow_size {
                self.map_grow_size = (self.map_grow_size * 2).min(self.max_grow_size);
            }

            let file = self.file()?;
            file.set_len(self.file_size).wrap_err_with(|| {
                format!(
                    "failed to extend '{}' to {} bytes",
                    self.path.display(),
                    self.file_size
                )
            })?;
            debug!(
                "grew '{}' to {} bytes (next grow quantum {})",
                self.path.display(),
                self.file_size,
                self.map_grow_size
            );
        } else if end > self.file_size {
            bail!(
                "range [{}, {}) is beyond the end of read-only file '{}' ({} bytes)",
                pos,
                end,
                self.path.display(),
                self.file_size
            );
        }

        if let Some(map) = &mut self.map {
            map.unmap();
        }
        let file = self.file()?;
        let map = MappedRegion::new(file, self.file_size as usize, 0, self.read_only)
            .wrap_err_with(|| format!("failed to remap '{}'", self.path.display()))?;
        self.map = Some(map);

        Ok(pos as usize)
    }

    /// View of `[pos, pos + len)` within the current window, or an empty
    /// slice when the range is not covered. Never remaps: the writable
    /// paths keep the window covering the whole file, so every committed
    /// byte is in-window by construction.
    pub fn slice(&self, pos: u64, len: u64) -> &[u8] {
        match (&self.map, pos.checked_add(len)) {
            (Some(map), Some(end)) if end <= map.len() as u64 => {
                &map.as_slice()[pos as usize..end as usize]
            }
            _ => &[],
        }
    }

    /// Mutable counterpart of [`slice`](Self::slice).
    pub fn slice_mut(&mut self, pos: u64, len: u64) -> &mut [u8] {
        match (&mut self.map, pos.checked_add(len)) {
            (Some(map), Some(end)) if end <= map.len() as u64 => {
                &mut map.as_mut_slice()[pos as usize..end as usize]
            }
            _ => &mut [],
        }
    }

    /// Ensures the mapping covers the destination and copies `bytes` in.
    pub fn write(&mut self, pos: u64, bytes: &[u8]) -> Result<()> {
        ensure!(
            !self.read_only,
            "cannot write to read-only log file '{}'",
            self.path.display()
        );
        let off = self.ensure_mapped(pos, bytes.len() as u64)?;
        let Some(map) = &mut self.map else {
            bail!("log file '{}' has no mapping after remap", self.path.display());
        };
        map.as_mut_slice()[off..off + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Schedules write-back of the mapping's dirty pages. On Windows the
    /// file buffers are flushed as well, since a view flush alone does not
    /// cover file metadata there. Read-only files have no dirty pages and
    /// are skipped.
    pub fn flush(&self) -> Result<()> {
        if self.read_only {
            return Ok(());
        }
        if let Some(map) = &self.map {
            map.flush_async()?;
            #[cfg(windows)]
            self.file()?
                .sync_data()
                .wrap_err_with(|| format!("failed to flush '{}'", self.path.display()))?;
        }
        Ok(())
    }

    /// Unmaps, truncates the file down to `write_pos` when it was written,
    /// and drops the descriptor. Safe to call more than once.
    pub fn close(&mut self) -> Result<()> {
        if let Some(map) = &mut self.map {
            if !self.read_only {
                if let Err(e) = map.flush_async() {
                    warn!("failed to flush '{}' during close: {e:#}", self.path.display());
                }
            }
            map.unmap();
        }
        self.map = None;

        if let Some(file) = self.file.take() {
            if self.write_pos > 0 && !self.read_only {
                file.set_len(self.write_pos).wrap_err_with(|| {
                    format!(
                        "failed to truncate '{}' to {} bytes during close",
                        self.path.display(),
                        self.write_pos
                    )
                })?;
                self.file_size = self.write_pos;
                debug!(
                    "truncated '{}' to {} bytes",
                    self.path.display(),
                    self.write_pos
                );
            }
        }
        Ok(())
    }
}
