//! # Open-Time Configuration
//!
//! `LogConfig` carries everything about *how* a log is opened; *what* the
//! log stores (type tag, layout tag, record format) travels as arguments to
//! [`Log::open`](super::Log::open). All fields are plain data with
//! documented defaults; construct with struct-update syntax:
//!
//! ```ignore
//! let config = LogConfig {
//!     check_monotonic: true,
//!     gap_data: "\n".to_string(),
//!     ..LogConfig::default()
//! };
//! ```

/// Record format requested when opening a log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    /// Fixed-size records of `record_size` bytes total, timestamp included.
    /// The payload is stored inline; no data file is created.
    Fixed { record_size: u32 },
    /// Variable-size payloads in a sidecar data file. The record stride is
    /// 16 or 24 bytes depending on [`LogConfig::large_data`].
    Variable,
}

/// Options controlling how a log is opened and how it behaves afterwards.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Open read-only; every append fails.
    pub read_only: bool,
    /// On existing files, require the header's `dataType` to match the open
    /// argument.
    pub check_type: bool,
    /// On existing files, require the header's `dataLayout` to match.
    pub check_layout: bool,
    /// On existing files, require the header's record format to match.
    pub check_size: bool,
    /// Refuse appends whose timestamp does not strictly exceed the previous
    /// one.
    pub check_monotonic: bool,
    /// For freshly created variable-size logs, use 24-byte records (64-bit
    /// data pointers) instead of 16-byte records.
    pub large_data: bool,
    /// Flush after every N appends; 0 disables periodic flushing.
    pub periodic_flush: u32,
    /// Initial time-file growth quantum, in records.
    pub initial_size: u64,
    /// Cap on the time-file growth quantum, in records.
    pub max_grow_size: u64,
    /// Initial data-file growth quantum, in bytes.
    pub initial_data_size: u64,
    /// Cap on the data-file growth quantum, in bytes.
    pub max_data_grow_size: u64,
    /// String written after each variable-size payload in the data file.
    pub gap_data: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            read_only: false,
            check_type: false,
            check_layout: false,
            check_size: false,
            check_monotonic: false,
            large_data: false,
            periodic_flush: 0,
            initial_size: 256,
            max_grow_size: 8192,
            initial_data_size: 4096,
            max_data_grow_size: 1024 * 1024,
            gap_data: String::new(),
        }
    }
}
