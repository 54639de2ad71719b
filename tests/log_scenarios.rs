//! # End-to-End Log Scenarios
//!
//! Exercises the on-disk format and append/read/find behavior of the core
//! engine through whole open/append/close cycles:
//!
//! 1. Fixed-size records hold their payload inline and the time file is
//!    truncated to exactly header + records on close
//! 2. Variable-size records interleave payloads with gap bytes in the data
//!    file and store (offset, length) pointers in the time file
//! 3. Monotonic checking rejects stale timestamps without consuming a slot
//! 4. Binary search returns lower bounds over the timestamp sequence

use chronolog::{Disposition, Log, LogConfig, RecordFormat, HEADER_SIZE};

use tempfile::tempdir;

mod fixed_size_logs {
    use super::*;

    #[test]
    fn doubles_roundtrip_and_truncate_on_close() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doubles.log");

        let mut log = Log::open(
            &path,
            "double",
            "IEEE-754 binary64, little-endian",
            RecordFormat::Fixed { record_size: 16 },
            Disposition::CreateAlways,
            &LogConfig::default(),
        )
        .unwrap();

        assert!(log.append_raw(100, &3.14f64.to_bits().to_le_bytes()));
        assert!(log.append_raw(200, &2.71f64.to_bits().to_le_bytes()));

        let (ts, bytes) = log.read_raw(0);
        assert_eq!(ts, 100);
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        assert_eq!(f64::from_le_bytes(buf), 3.14);

        log.close().unwrap();

        // header plus exactly two 16-byte records, and no sidecar file
        assert_eq!(
            std::fs::metadata(&path).unwrap().len(),
            HEADER_SIZE as u64 + 32
        );
        assert!(!dir.path().join("doubles.log.data").exists());
    }

    #[test]
    fn empty_log_closes_to_a_bare_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.log");

        let log = Log::open(
            &path,
            "double",
            "",
            RecordFormat::Fixed { record_size: 16 },
            Disposition::CreateAlways,
            &LogConfig::default(),
        )
        .unwrap();
        log.close().unwrap();

        assert_eq!(std::fs::metadata(&path).unwrap().len(), HEADER_SIZE as u64);
    }
}

mod variable_size_logs {
    use super::*;

    #[test]
    fn payloads_and_gap_bytes_land_in_the_data_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("var.log");
        let config = LogConfig {
            gap_data: "##".to_string(),
            ..LogConfig::default()
        };

        let mut log = Log::open(
            &path,
            "test.blobs",
            "raw bytes",
            RecordFormat::Variable,
            Disposition::CreateAlways,
            &config,
        )
        .unwrap();
        assert_eq!(log.record_size(), 16);

        assert!(log.append_raw(1, b"a"));
        assert!(log.append_raw(2, b"bcd"));
        log.close().unwrap();

        let data = std::fs::read(dir.path().join("var.log.data")).unwrap();
        assert_eq!(data, b"a##bcd##");

        let time = std::fs::read(&path).unwrap();
        assert_eq!(time.len(), HEADER_SIZE + 32);

        // record 1: timestamp 2, offset 3 (past "a##"), length 3
        let record = &time[HEADER_SIZE + 16..HEADER_SIZE + 32];
        assert_eq!(u64::from_le_bytes(record[0..8].try_into().unwrap()), 2);
        assert_eq!(u32::from_le_bytes(record[8..12].try_into().unwrap()), 3);
        assert_eq!(u32::from_le_bytes(record[12..16].try_into().unwrap()), 3);
    }

    #[test]
    fn large_data_records_use_64_bit_pointers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("large.log");
        let config = LogConfig {
            large_data: true,
            ..LogConfig::default()
        };

        let mut log = Log::open(
            &path,
            "test.blobs",
            "raw bytes",
            RecordFormat::Variable,
            Disposition::CreateAlways,
            &config,
        )
        .unwrap();
        assert_eq!(log.record_size(), 24);

        assert!(log.append_raw(9, b"payload"));
        log.close().unwrap();

        let time = std::fs::read(&path).unwrap();
        let record = &time[HEADER_SIZE..HEADER_SIZE + 24];
        assert_eq!(u64::from_le_bytes(record[0..8].try_into().unwrap()), 9);
        assert_eq!(u64::from_le_bytes(record[8..16].try_into().unwrap()), 0);
        assert_eq!(u64::from_le_bytes(record[16..24].try_into().unwrap()), 7);
    }

    #[test]
    fn empty_payloads_are_valid_records() {
        let dir = tempdir().unwrap();
        let config = LogConfig {
            gap_data: "|".to_string(),
            ..LogConfig::default()
        };
        let mut log = Log::open(
            dir.path().join("empty-payloads.log"),
            "test.blobs",
            "raw bytes",
            RecordFormat::Variable,
            Disposition::CreateAlways,
            &config,
        )
        .unwrap();

        assert!(log.append_raw(1, b""));
        assert!(log.append_raw(2, b"x"));

        assert_eq!(log.read_raw(0), (1, &b""[..]));
        assert_eq!(log.read_raw(1), (2, &b"x"[..]));
        assert_eq!(log.size(), 2);
    }
}

mod monotonic_checking {
    use super::*;

    #[test]
    fn stale_timestamps_are_rejected_and_leave_no_trace() {
        let dir = tempdir().unwrap();
        let config = LogConfig {
            check_monotonic: true,
            ..LogConfig::default()
        };
        let mut log = Log::open(
            dir.path().join("mono.log"),
            "test.fixed",
            "raw bytes",
            RecordFormat::Fixed { record_size: 16 },
            Disposition::CreateAlways,
            &config,
        )
        .unwrap();

        assert!(log.append_raw(5, &[1; 8]));
        assert!(!log.append_raw(5, &[2; 8]));

        assert_eq!(log.size(), 1);
        assert_eq!(log.last_timestamp(), 5);
        assert_eq!(log.read_raw(0), (5, &[1u8; 8][..]));
    }

    #[test]
    fn unchecked_logs_accept_any_order() {
        let dir = tempdir().unwrap();
        let mut log = Log::open(
            dir.path().join("wild.log"),
            "test.fixed",
            "raw bytes",
            RecordFormat::Fixed { record_size: 16 },
            Disposition::CreateAlways,
            &LogConfig::default(),
        )
        .unwrap();

        assert!(log.append_raw(5, &[0; 8]));
        assert!(log.append_raw(5, &[0; 8]));
        assert!(log.append_raw(3, &[0; 8]));
        assert_eq!(log.size(), 3);
    }
}

mod timestamp_search {
    use super::*;

    #[test]
    fn find_returns_the_lower_bound() {
        let dir = tempdir().unwrap();
        let mut log = Log::open(
            dir.path().join("search.log"),
            "test.fixed",
            "raw bytes",
            RecordFormat::Fixed { record_size: 16 },
            Disposition::CreateAlways,
            &LogConfig::default(),
        )
        .unwrap();

        for ts in [10u64, 20, 30, 40, 50] {
            assert!(log.append_raw(ts, &ts.to_le_bytes()));
        }

        assert_eq!(log.find(25), 2);
        assert_eq!(log.find(30), 2);
        assert_eq!(log.find(10), 0);
        assert_eq!(log.find(1), 0);
        assert_eq!(log.find(100), 5);
    }

    #[test]
    fn find_agrees_with_a_linear_scan() {
        let dir = tempdir().unwrap();
        let mut log = Log::open(
            dir.path().join("scan.log"),
            "test.fixed",
            "raw bytes",
            RecordFormat::Fixed { record_size: 16 },
            Disposition::CreateAlways,
            &LogConfig::default(),
        )
        .unwrap();

        let stamps: Vec<u64> = (0..200).map(|i| 3 * i + 7).collect();
        for &ts in &stamps {
            assert!(log.append_raw(ts, &ts.to_le_bytes()));
        }

        for probe in 0..650 {
            let expected = stamps.iter().position(|&ts| ts >= probe).unwrap_or(stamps.len());
            assert_eq!(log.find(probe), expected, "probe {probe}");
        }
    }
}
