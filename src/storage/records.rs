//! # Record Slot Layouts
//!
//! Every time-file record starts with a 64-bit little-endian timestamp.
//! Fixed-size logs store the payload inline after the timestamp;
//! variable-size logs store a pointer into the data file instead, in one of
//! two strides:
//!
//! ```text
//! 16-byte slot: | timestamp u64 | data offset u32 | data length u32 |
//! 24-byte slot: | timestamp u64 | data offset u64 | data length u64 |
//! ```
//!
//! The zerocopy structs below pin those layouts at compile time and read and
//! write directly against the mapped record bytes.

use zerocopy::little_endian::{U32, U64};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Size of the leading timestamp in every record.
pub const TIMESTAMP_SIZE: usize = 8;

/// Record stride selecting 32-bit data pointers.
pub const SMALL_POINTER_RECORD_SIZE: usize = TIMESTAMP_SIZE + 4 * 2;

/// Record stride selecting 64-bit data pointers.
pub const LARGE_POINTER_RECORD_SIZE: usize = TIMESTAMP_SIZE + 8 * 2;

/// Reads the first eight bytes of `bytes` as a little-endian u64.
#[inline]
pub fn read_u64_le(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(buf)
}

/// Writes `value` into the first eight bytes of `bytes`, little-endian.
#[inline]
pub fn write_u64_le(bytes: &mut [u8], value: u64) {
    bytes[..8].copy_from_slice(&value.to_le_bytes());
}

/// Variable-size record slot with 32-bit data pointers.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct SmallPointerRecord {
    timestamp: U64,
    data_offset: U32,
    data_len: U32,
}

const _: () = assert!(std::mem::size_of::<SmallPointerRecord>() == SMALL_POINTER_RECORD_SIZE);

impl SmallPointerRecord {
    pub fn new(timestamp: u64, data_offset: u64, data_len: u64) -> Self {
        Self {
            timestamp: U64::new(timestamp),
            data_offset: U32::new(data_offset as u32),
            data_len: U32::new(data_len as u32),
        }
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp.get()
    }

    pub fn data_offset(&self) -> u64 {
        u64::from(self.data_offset.get())
    }

    pub fn data_len(&self) -> u64 {
        u64::from(self.data_len.get())
    }
}

/// Variable-size record slot with 64-bit data pointers.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct LargePointerRecord {
    timestamp: U64,
    data_offset: U64,
    data_len: U64,
}

const _: () = assert!(std::mem::size_of::<LargePointerRecord>() == LARGE_POINTER_RECORD_SIZE);

impl LargePointerRecord {
    pub fn new(timestamp: u64, data_offset: u64, data_len: u64) -> Self {
        Self {
            timestamp: U64::new(timestamp),
            data_offset: U64::new(data_offset),
            data_len: U64::new(data_len),
        }
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp.get()
    }

    pub fn data_offset(&self) -> u64 {
        self.data_offset.get()
    }

    pub fn data_len(&self) -> u64 {
        self.data_len.get()
    }
}
