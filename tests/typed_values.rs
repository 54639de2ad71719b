//! # Typed View Round-Trips
//!
//! The typed views are pure encode/decode layers over the core engine, so
//! these tests focus on value fidelity across append/get and across a
//! close/reopen cycle.

use chronolog::{BoolArrayLog, Disposition, F64ArrayLog, F64Log, LogConfig, StringArrayLog};

use tempfile::tempdir;

#[test]
fn f64_log_roundtrips_values() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("doubles");
    let mut log = F64Log::open(&path, Disposition::CreateAlways, &LogConfig::default()).unwrap();

    assert!(log.append(100, 3.14));
    assert!(log.append(200, -0.0));
    assert!(log.append(300, f64::MAX));

    assert_eq!(log.get(0), (100, 3.14));
    assert_eq!(log.get(1).0, 200);
    assert!(log.get(1).1.is_sign_negative());
    assert_eq!(log.get(2), (300, f64::MAX));
    assert_eq!(log.get(3), (0, 0.0));
}

#[test]
fn f64_log_reopens_read_only() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("doubles");
    {
        let mut log =
            F64Log::open(&path, Disposition::CreateAlways, &LogConfig::default()).unwrap();
        assert!(log.append(1, 0.5));
        assert!(log.append(2, 1.5));
        log.into_inner().close().unwrap();
    }

    let config = LogConfig {
        read_only: true,
        check_type: true,
        ..LogConfig::default()
    };
    let log = F64Log::open(&path, Disposition::OpenExisting, &config).unwrap();

    assert_eq!(log.log().size(), 2);
    assert_eq!(log.get(1), (2, 1.5));
}

#[test]
fn bool_array_log_roundtrips_mixed_lengths() {
    let dir = tempdir().unwrap();
    let mut log = BoolArrayLog::open(
        dir.path().join("bools"),
        Disposition::CreateAlways,
        &LogConfig::default(),
    )
    .unwrap();

    assert!(log.append(1, &[true, false, true]));
    assert!(log.append(2, &[]));
    assert!(log.append(3, &[false; 9]));

    assert_eq!(log.get(0), (1, vec![true, false, true]));
    assert_eq!(log.get(1), (2, vec![]));
    assert_eq!(log.get(2), (3, vec![false; 9]));
}

#[test]
fn f64_array_log_roundtrips() {
    let dir = tempdir().unwrap();
    let mut log = F64ArrayLog::open(
        dir.path().join("arrays"),
        Disposition::CreateAlways,
        &LogConfig::default(),
    )
    .unwrap();

    assert!(log.append(10, &[1.0, 2.5, -3.25]));
    assert!(log.append(20, &[]));

    assert_eq!(log.get(0), (10, vec![1.0, 2.5, -3.25]));
    assert_eq!(log.get(1), (20, vec![]));
}

#[test]
fn string_array_log_roundtrips_across_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("strings");
    {
        let mut log =
            StringArrayLog::open(&path, Disposition::CreateAlways, &LogConfig::default()).unwrap();
        assert!(log.append(1, &["hello", "", "world"]));
        assert!(log.append(2, &["mixed: \u{00e9}\u{00e8}"]));
        log.into_inner().close().unwrap();
    }

    let config = LogConfig {
        read_only: true,
        ..LogConfig::default()
    };
    let log = StringArrayLog::open(&path, Disposition::OpenExisting, &config).unwrap();

    assert_eq!(
        log.get(0),
        (1, vec!["hello".to_string(), String::new(), "world".to_string()])
    );
    assert_eq!(log.get(1), (2, vec!["mixed: \u{00e9}\u{00e8}".to_string()]));
}

#[test]
fn typed_views_share_the_core_find() {
    let dir = tempdir().unwrap();
    let mut log = F64Log::open(
        dir.path().join("doubles"),
        Disposition::CreateAlways,
        &LogConfig::default(),
    )
    .unwrap();

    for ts in [10u64, 20, 30] {
        assert!(log.append(ts, ts as f64));
    }

    assert_eq!(log.log().find(15), 1);
    assert_eq!(log.log().find(30), 2);
}
