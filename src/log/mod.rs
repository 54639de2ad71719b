//! # Append-Only Timestamp Log
//!
//! A [`Log`] persists a monotonically-timestamped sequence of records and
//! supports random-access reads by ordinal as well as binary search by
//! timestamp. It binds two [`LogFile`]s: the *time file* (4 KiB JSON header
//! plus fixed-stride records) and, for variable-size payloads, a sidecar
//! *data file* named `<path>.data`.
//!
//! ## Record Storage
//!
//! Every time-file record starts with a 64-bit little-endian timestamp. The
//! epoch and resolution are the caller's choice; timestamps must increase
//! monotonically for [`Log::find`] to work, and the log can enforce that
//! with [`LogConfig::check_monotonic`].
//!
//! Fixed-size logs store the payload inline after the timestamp. Variable-
//! size logs store an (offset, length) pointer into the data file, where
//! payloads are laid out back to back, each followed by the configured gap
//! string.
//!
//! ## Append Lifecycle
//!
//! [`Log::append_start`] validates the append, writes the timestamp (and,
//! for variable-size logs, the data pointer), and returns an [`AppendSlot`]
//! that derefs to the writable payload bytes. Dropping the slot commits the
//! record: the write positions advance and the record becomes visible to
//! reads. [`Log::append_raw`] wraps the three steps for byte-slice payloads.
//!
//! The slot borrows the log mutably, so it is impossible to read, append
//! again, or remap while a slot is live; growth can never invalidate an
//! outstanding payload view.
//!
//! ## Durability
//!
//! Nothing is durable before [`Log::flush`] (or close, which flushes).
//! `LogConfig::periodic_flush` amortizes flush cost across every N appends.
//! A flush taken while an `AppendSlot` is outstanding persists a header
//! whose `dataWritePos` predates the in-flight record; readers of a
//! crash-recovered file must treat data-file bytes past `dataWritePos` as
//! absent.

mod config;

pub use config::{LogConfig, RecordFormat};

use std::io::Read;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use eyre::{ensure, Result, WrapErr};
use tracing::{debug, warn};
use zerocopy::{FromBytes, IntoBytes};

use crate::storage::{
    read_u64_le, write_u64_le, Disposition, LargePointerRecord, LogFile, LogHeader,
    SmallPointerRecord, WrongProtocolType, HEADER_SIZE, LARGE_POINTER_RECORD_SIZE,
    SMALL_POINTER_RECORD_SIZE, TIMESTAMP_SIZE,
};

/// An open append-only timestamp log.
///
/// A `Log` is single-writer and not internally synchronized; share it across
/// threads only behind external synchronization. Dropping the log writes the
/// header, flushes, truncates both files to their logical length, and closes
/// them; [`Log::close`] does the same with error reporting.
#[derive(Debug)]
pub struct Log {
    data_type: String,
    data_layout: String,
    record_size: u64,
    fixed_size: bool,
    gap_data: String,
    last_timestamp: u64,
    check_monotonic: bool,
    periodic_flush: u32,
    periodic_flush_count: u32,
    time: LogFile,
    data: Option<LogFile>,
}

fn data_file_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".data");
    PathBuf::from(os)
}

impl Log {
    /// Opens a log at `path`.
    ///
    /// When the disposition lands on an existing file (`OpenExisting`, or
    /// `OpenAlways` on a non-empty file), the header is parsed and the
    /// format arguments are only consulted for the `check_*` verifications
    /// in `config`. Otherwise a fresh log is initialized from the
    /// arguments.
    ///
    /// Read-only opens require `Disposition::OpenExisting`.
    pub fn open(
        path: impl AsRef<Path>,
        data_type: &str,
        data_layout: &str,
        format: RecordFormat,
        disposition: Disposition,
        config: &LogConfig,
    ) -> Result<Self> {
        let path = path.as_ref();
        if config.read_only {
            ensure!(
                disposition == Disposition::OpenExisting,
                "read-only logs must be opened with OpenExisting"
            );
        }

        let mut time = LogFile::open(path, disposition, config.read_only)?;

        let have_header = disposition == Disposition::OpenExisting
            || (disposition == Disposition::OpenAlways && time.file_size() > 0);

        let (mut log, data_write_pos) = if have_header {
            let header = {
                let file = time.file()?;
                let mut buf = Vec::with_capacity(HEADER_SIZE);
                file.take(HEADER_SIZE as u64)
                    .read_to_end(&mut buf)
                    .wrap_err_with(|| {
                        format!("failed to read log header from '{}'", path.display())
                    })?;
                LogHeader::from_bytes(&buf)?
            };
            Self::validate_header(&header)?;
            Self::check_header(&header, data_type, data_layout, format, config)?;

            time.write_pos = header.time_write_pos;
            let data_write_pos = header.data_write_pos;
            let log = Log {
                data_type: header.data_type,
                data_layout: header.data_layout,
                record_size: header.record_size,
                fixed_size: header.fixed_size,
                gap_data: header.gap_data,
                last_timestamp: 0,
                check_monotonic: config.check_monotonic,
                periodic_flush: config.periodic_flush,
                periodic_flush_count: 0,
                time,
                data: None,
            };
            (log, data_write_pos)
        } else {
            let (fixed_size, record_size) = match format {
                RecordFormat::Fixed { record_size } => {
                    ensure!(
                        record_size as usize >= TIMESTAMP_SIZE,
                        "fixed record size {} is smaller than the {}-byte timestamp",
                        record_size,
                        TIMESTAMP_SIZE
                    );
                    (true, u64::from(record_size))
                }
                RecordFormat::Variable => {
                    let record_size = if config.large_data {
                        LARGE_POINTER_RECORD_SIZE
                    } else {
                        SMALL_POINTER_RECORD_SIZE
                    };
                    (false, record_size as u64)
                }
            };
            time.write_pos = HEADER_SIZE as u64;
            let log = Log {
                data_type: data_type.to_string(),
                data_layout: data_layout.to_string(),
                record_size,
                fixed_size,
                gap_data: config.gap_data.clone(),
                last_timestamp: 0,
                check_monotonic: config.check_monotonic,
                periodic_flush: config.periodic_flush,
                periodic_flush_count: 0,
                time,
                data: None,
            };
            (log, 0)
        };

        log.time.map_grow_size = config.initial_size.max(1) * log.record_size;
        log.time.max_grow_size = config.max_grow_size.max(1) * log.record_size;

        if config.read_only {
            log.time.ensure_mapped(0, log.time.file_size())?;
        } else if log.time.write_pos > HEADER_SIZE as u64 {
            // Map through the end of the record area plus one spare record
            // so the first append does not immediately regrow.
            let last_pos = log.time.write_pos - log.record_size;
            log.time.ensure_mapped(last_pos, log.record_size * 2)?;
        } else {
            let pos = log.time.write_pos;
            log.time.ensure_mapped(pos, log.record_size)?;
        }

        if log.time.write_pos > HEADER_SIZE as u64 {
            let last_pos = log.time.write_pos - log.record_size;
            let raw = log.time.slice(last_pos, log.record_size);
            if raw.len() < TIMESTAMP_SIZE {
                return Err(WrongProtocolType.into());
            }
            log.last_timestamp = read_u64_le(raw);
        }

        if !log.fixed_size {
            let mut data = LogFile::open(data_file_path(path), disposition, config.read_only)?;
            data.write_pos = data_write_pos;
            data.map_grow_size = config.initial_data_size.max(1);
            data.max_grow_size = config.max_data_grow_size.max(1);
            if config.read_only {
                if data.file_size() > 0 {
                    let len = data.file_size();
                    data.ensure_mapped(0, len)?;
                }
            } else {
                // Pre-map a little past the write position for the first
                // appends.
                let pos = data.write_pos;
                data.ensure_mapped(pos, 1024)?;
            }
            log.data = Some(data);
        }

        debug!(
            "opened log '{}' ({} records of {} bytes, {})",
            path.display(),
            log.size(),
            log.record_size,
            if log.fixed_size { "fixed" } else { "variable" }
        );
        Ok(log)
    }

    /// Opens an existing log, taking every format field from its header.
    ///
    /// The header verifications (`check_type`, `check_layout`, `check_size`)
    /// are forced off since there is nothing to verify against.
    pub fn open_existing(path: impl AsRef<Path>, config: &LogConfig) -> Result<Self> {
        let mut config = config.clone();
        config.check_type = false;
        config.check_layout = false;
        config.check_size = false;
        Self::open(
            path,
            "",
            "",
            RecordFormat::Variable,
            Disposition::OpenExisting,
            &config,
        )
    }

    fn validate_header(header: &LogHeader) -> Result<()> {
        let record_size_ok = if header.fixed_size {
            header.record_size >= TIMESTAMP_SIZE as u64
        } else {
            header.record_size == SMALL_POINTER_RECORD_SIZE as u64
                || header.record_size == LARGE_POINTER_RECORD_SIZE as u64
        };
        if !record_size_ok {
            return Err(WrongProtocolType.into());
        }
        if header.time_write_pos < HEADER_SIZE as u64
            || (header.time_write_pos - HEADER_SIZE as u64) % header.record_size != 0
        {
            return Err(WrongProtocolType.into());
        }
        Ok(())
    }

    fn check_header(
        header: &LogHeader,
        data_type: &str,
        data_layout: &str,
        format: RecordFormat,
        config: &LogConfig,
    ) -> Result<()> {
        let format_matches = match format {
            RecordFormat::Fixed { record_size } => {
                header.fixed_size && header.record_size == u64::from(record_size)
            }
            RecordFormat::Variable => !header.fixed_size,
        };
        if (config.check_type && header.data_type != data_type)
            || (config.check_layout && header.data_layout != data_layout)
            || (config.check_size && !format_matches)
        {
            return Err(WrongProtocolType.into());
        }
        Ok(())
    }

    pub fn data_type(&self) -> &str {
        &self.data_type
    }

    pub fn data_layout(&self) -> &str {
        &self.data_layout
    }

    /// Total record stride in the time file, timestamp included.
    pub fn record_size(&self) -> u64 {
        self.record_size
    }

    pub fn is_fixed_size(&self) -> bool {
        self.fixed_size
    }

    pub fn is_read_only(&self) -> bool {
        self.time.is_read_only()
    }

    pub fn gap_data(&self) -> &str {
        &self.gap_data
    }

    /// Timestamp of the most recently appended record, or 0 when empty.
    pub fn last_timestamp(&self) -> u64 {
        self.last_timestamp
    }

    /// Path of the sidecar data file, for variable-size logs.
    pub fn data_path(&self) -> Option<&Path> {
        self.data.as_ref().map(|data| data.path())
    }

    /// Number of committed records.
    pub fn size(&self) -> usize {
        (self.time.write_pos.saturating_sub(HEADER_SIZE as u64) / self.record_size) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Starts an append and returns the writable payload slot, or `None`
    /// when the log is read-only, the timestamp fails the monotonic check,
    /// or growing a backing file fails.
    ///
    /// For variable-size logs `size` is the payload length in bytes; for
    /// fixed-size logs the slot always spans `record_size - 8` bytes and
    /// `size` is ignored. Dropping the slot commits the record.
    pub fn append_start(&mut self, timestamp: u64, size: u64) -> Option<AppendSlot<'_>> {
        if self.check_monotonic && timestamp <= self.last_timestamp {
            return None;
        }
        if self.time.is_read_only() {
            return None;
        }

        let record_size = self.record_size;
        let time_pos = self.time.write_pos;
        if let Err(e) = self.time.ensure_mapped(time_pos, record_size) {
            warn!("append failed: {e:#}");
            return None;
        }

        if self.fixed_size {
            let slot = self.time.slice_mut(time_pos, record_size);
            if slot.len() < record_size as usize {
                return None;
            }
            write_u64_le(slot, timestamp);
            self.last_timestamp = timestamp;
            return Some(AppendSlot {
                payload_pos: time_pos + TIMESTAMP_SIZE as u64,
                payload_len: record_size - TIMESTAMP_SIZE as u64,
                finished: false,
                log: self,
            });
        }

        let data_pos = self.data.as_ref()?.write_pos;
        {
            let slot = self.time.slice_mut(time_pos, record_size);
            if slot.len() < record_size as usize {
                return None;
            }
            if record_size == LARGE_POINTER_RECORD_SIZE as u64 {
                slot.copy_from_slice(LargePointerRecord::new(timestamp, data_pos, size).as_bytes());
            } else {
                slot.copy_from_slice(SmallPointerRecord::new(timestamp, data_pos, size).as_bytes());
            }
        }

        let data = self.data.as_mut()?;
        if let Err(e) = data.ensure_mapped(data_pos, size) {
            warn!("append failed: {e:#}");
            return None;
        }
        self.last_timestamp = timestamp;
        Some(AppendSlot {
            payload_pos: data_pos,
            payload_len: size,
            finished: false,
            log: self,
        })
    }

    /// Appends one record with the given payload bytes.
    pub fn append_raw(&mut self, timestamp: u64, bytes: &[u8]) -> bool {
        let Some(mut slot) = self.append_start(timestamp, bytes.len() as u64) else {
            return false;
        };
        let n = bytes.len().min(slot.len());
        slot[..n].copy_from_slice(&bytes[..n]);
        slot.commit();
        true
    }

    /// Commits the in-flight append: advances the data write position past
    /// the payload and gap bytes, advances the time write position by one
    /// record, and runs the periodic flush when due.
    fn append_finish(&mut self, size: u64) {
        if !self.fixed_size {
            if let Some(data) = &mut self.data {
                data.write_pos += size;
                if !self.gap_data.is_empty() {
                    let pos = data.write_pos;
                    if let Err(e) = data.write(pos, self.gap_data.as_bytes()) {
                        warn!("failed to write gap bytes: {e:#}");
                    }
                    data.write_pos += self.gap_data.len() as u64;
                }
            }
        }
        self.time.write_pos += self.record_size;

        if self.periodic_flush != 0 {
            self.periodic_flush_count += 1;
            if self.periodic_flush_count >= self.periodic_flush {
                self.periodic_flush_count = 0;
                if let Err(e) = self.flush() {
                    warn!("periodic flush failed: {e:#}");
                }
            }
        }
    }

    /// Reads record `n`, returning its timestamp and payload bytes.
    ///
    /// Returns `(0, &[])` when `n` is out of range or the record points at
    /// bytes the data file does not hold.
    pub fn read_raw(&self, n: usize) -> (u64, &[u8]) {
        if n >= self.size() {
            return (0, &[]);
        }
        let pos = HEADER_SIZE as u64 + n as u64 * self.record_size;
        let raw = self.time.slice(pos, self.record_size);
        if raw.len() < self.record_size as usize {
            return (0, &[]);
        }
        let timestamp = read_u64_le(raw);

        if self.fixed_size {
            return (timestamp, &raw[TIMESTAMP_SIZE..]);
        }

        let Some(data) = &self.data else {
            return (0, &[]);
        };
        let (offset, len) = if self.record_size == LARGE_POINTER_RECORD_SIZE as u64 {
            match LargePointerRecord::ref_from_bytes(raw) {
                Ok(record) => (record.data_offset(), record.data_len()),
                Err(_) => return (0, &[]),
            }
        } else {
            match SmallPointerRecord::ref_from_bytes(raw) {
                Ok(record) => (record.data_offset(), record.data_len()),
                Err(_) => return (0, &[]),
            }
        };
        let payload = data.slice(offset, len);
        if payload.len() < len as usize {
            return (0, &[]);
        }
        (timestamp, payload)
    }

    /// Lower-bound binary search: the smallest ordinal whose timestamp is
    /// `>= timestamp`, or [`size`](Self::size) when every record is older.
    ///
    /// Correct only when timestamps increase monotonically.
    pub fn find(&self, timestamp: u64) -> usize {
        self.find_in(timestamp, 0, self.size())
    }

    /// [`find`](Self::find) restricted to the ordinal range `[first, last)`.
    pub fn find_in(&self, timestamp: u64, first: usize, last: usize) -> usize {
        let mut first = first;
        let mut count = self.size().min(last).saturating_sub(first);
        while count > 0 {
            let step = count / 2;
            let it = first + step;
            if self.read_raw(it).0 < timestamp {
                first = it + 1;
                count -= step + 1;
            } else {
                count = step;
            }
        }
        first
    }

    /// Rewrites the header and schedules write-back of both mappings.
    ///
    /// If called while an [`AppendSlot`] is outstanding the persisted
    /// `dataWritePos` predates the in-flight record; see the module
    /// documentation on durability.
    pub fn flush(&mut self) -> Result<()> {
        self.write_header()?;
        self.time.flush()?;
        if let Some(data) = &self.data {
            data.flush()?;
        }
        Ok(())
    }

    fn write_header(&mut self) -> Result<()> {
        if self.time.is_read_only() || !self.time.is_mapped() {
            return Ok(());
        }
        let header = LogHeader {
            data_type: self.data_type.clone(),
            data_layout: self.data_layout.clone(),
            record_size: self.record_size,
            fixed_size: self.fixed_size,
            gap_data: self.gap_data.clone(),
            time_write_pos: self.time.write_pos,
            data_write_pos: self.data.as_ref().map_or(0, |data| data.write_pos),
        };
        let buf = header.to_padded_bytes()?;
        self.time.write(0, &buf)
    }

    /// Writes the header, flushes, truncates both files to their logical
    /// length, and closes them. Dropping the log does the same best-effort.
    pub fn close(mut self) -> Result<()> {
        self.do_close()
    }

    fn do_close(&mut self) -> Result<()> {
        self.write_header()?;
        self.time.close()?;
        if let Some(data) = &mut self.data {
            data.close()?;
        }
        Ok(())
    }
}

impl Drop for Log {
    fn drop(&mut self) {
        if let Err(e) = self.do_close() {
            warn!(
                "failed to close log '{}': {e:#}",
                self.time.path().display()
            );
        }
    }
}

/// Writable view of one in-flight record's payload.
///
/// Derefs to the payload bytes. Dropping the slot (or calling
/// [`commit`](Self::commit)) finalizes the append; the record is not
/// visible to reads before that.
#[derive(Debug)]
pub struct AppendSlot<'a> {
    log: &'a mut Log,
    payload_pos: u64,
    payload_len: u64,
    finished: bool,
}

impl AppendSlot<'_> {
    /// Finalizes the append. Equivalent to dropping the slot; spelled out
    /// so call sites can make the commit point explicit.
    pub fn commit(self) {}
}

impl Deref for AppendSlot<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        let file = if self.log.fixed_size {
            &self.log.time
        } else {
            match &self.log.data {
                Some(data) => data,
                None => return &[],
            }
        };
        file.slice(self.payload_pos, self.payload_len)
    }
}

impl DerefMut for AppendSlot<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        let file = if self.log.fixed_size {
            &mut self.log.time
        } else {
            match &mut self.log.data {
                Some(data) => data,
                None => return &mut [],
            }
        };
        file.slice_mut(self.payload_pos, self.payload_len)
    }
}

impl Drop for AppendSlot<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.finished = true;
            let len = self.payload_len;
            self.log.append_finish(len);
        }
    }
}
