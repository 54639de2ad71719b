//! # Storage Layer
//!
//! Foundation of chronolog: memory-mapped file access for the two backing
//! files of a log.
//!
//! ## File Layout
//!
//! A log is one or two files:
//!
//! ```text
//! <path>        time file:  4 KiB JSON header, then fixed-stride records
//! <path>.data   data file:  variable payloads, only for variable-size logs
//! ```
//!
//! The time file's record area starts at byte 4096. Record `k` lives at
//! `4096 + k * record_size`; its first eight bytes are the little-endian
//! timestamp, and the rest is either the inline payload (fixed-size logs)
//! or an (offset, length) pointer into the data file (variable-size logs,
//! see [`records`]).
//!
//! ## Module Organization
//!
//! - [`mmap`]: `MappedRegion`, the RAII mapping handle
//! - [`file`]: `LogFile`, one backing file with growth policy and mapping
//! - [`header`]: the 4 KiB JSON header model
//! - [`records`]: on-disk record slot layouts
//!
//! ## Safety Model
//!
//! Mapped byte views borrow the owning `LogFile`; anything that can remap
//! takes `&mut self`. Holding a record slice across a growth boundary is a
//! compile error, not a runtime hazard.

mod file;
mod header;
mod mmap;
mod records;

pub use file::{Disposition, LogFile};
pub use header::{LogHeader, WrongProtocolType, HEADER_SIZE};
pub use mmap::MappedRegion;
pub use records::{
    read_u64_le, write_u64_le, LargePointerRecord, SmallPointerRecord,
    LARGE_POINTER_RECORD_SIZE, SMALL_POINTER_RECORD_SIZE, TIMESTAMP_SIZE,
};
