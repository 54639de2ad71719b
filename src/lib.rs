//! # chronolog - Append-Only Memory-Mapped Timestamp Log
//!
//! chronolog persists a monotonically-timestamped sequence of records for
//! high-rate telemetry capture on resource-constrained devices. Records are
//! appended through a memory mapping (no per-record syscalls), read back at
//! random by ordinal, and located by binary search on the timestamp.
//!
//! ## Quick Start
//!
//! ```ignore
//! use chronolog::{Disposition, Log, LogConfig, RecordFormat};
//!
//! let config = LogConfig {
//!     check_monotonic: true,
//!     ..LogConfig::default()
//! };
//! let mut log = Log::open(
//!     "imu.log",
//!     "com.example.imu",
//!     "3x f64 little-endian",
//!     RecordFormat::Fixed { record_size: 32 },
//!     Disposition::CreateAlways,
//!     &config,
//! )?;
//!
//! log.append_raw(stamp, &sample);
//! let (ts, bytes) = log.read_raw(0);
//! let first_after = log.find(stamp - 1_000_000);
//! ```
//!
//! ## File Layout
//!
//! A log is one or two files:
//!
//! ```text
//! <path>         time file
//! +---------------------------+
//! | 4 KiB JSON header         |  dataType, recordSize, write positions, ...
//! +---------------------------+
//! | record 0 (recordSize B)   |  u64 timestamp, then payload or pointer
//! | record 1                  |
//! | ...                       |
//! +---------------------------+
//!
//! <path>.data    data file (variable-size logs only)
//! +---------------------------+
//! | payload 0 | gap | payload 1 | gap | ...
//! +---------------------------+
//! ```
//!
//! Fixed-size logs inline the payload in each record; variable-size logs
//! point into the data file with 32- or 64-bit (offset, length) pairs. All
//! on-disk integers are little-endian.
//!
//! ## Module Overview
//!
//! - [`storage`]: memory mapping, file growth policy, header, record layouts
//! - [`log`]: the [`Log`] engine: append, read, find, flush
//! - [`values`]: typed encode/decode views over a `Log`
//!
//! ## Concurrency
//!
//! A `Log` is single-writer, single-thread; it performs no internal locking.
//! Independent logs on different files can run in parallel freely.

pub mod log;
pub mod storage;
pub mod values;

pub use log::{AppendSlot, Log, LogConfig, RecordFormat};
pub use storage::{Disposition, LogHeader, WrongProtocolType, HEADER_SIZE, TIMESTAMP_SIZE};
pub use values::{BoolArrayLog, F64ArrayLog, F64Log, StringArrayLog};
