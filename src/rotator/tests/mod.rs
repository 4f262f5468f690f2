//! Unit tests for the rotator facade and its writer thread.
//!
//! Submodules cover lifecycle transitions, queue overflow and the rotation
//! algorithm run by the worker.


use std::io::{self, Write};

use rstest::rstest;
use tempfile::TempDir;

use self::test_support::{dir, read, rotator_in};

#[rstest]
fn write_returns_record_length(dir: TempDir) {
    let rotator = rotator_in(&dir, "1 kib", 2);
    assert_eq!(rotator.write(b"hello").expect("queued"), 5);
    assert_eq!(rotator.queued(), 1);
}

#[rstest]
fn empty_write_is_a_noop(dir: TempDir) {
    let rotator = rotator_in(&dir, "1 kib", 2);
    assert_eq!(rotator.write(b"").expect("empty write"), 0);
    assert_eq!(rotator.queued(), 0);
}

#[rstest]
fn write_copies_the_callers_buffer(dir: TempDir) {
    let rotator = rotator_in(&dir, "1 kib", 2);
    let mut buf = b"original".to_vec();
    rotator.write(&buf).expect("queued");
    buf.copy_from_slice(b"mutated!");

    rotator.start().expect("start");
    rotator.stop().expect("stop");
    assert_eq!(read(&dir.path().join("logfile")), "original");
}

#[rstest]
fn flush_is_acknowledged_while_running(dir: TempDir) {
    let rotator = rotator_in(&dir, "1 kib", 2);
    rotator.start().expect("start");
    rotator.write(b"line\n").expect("queued");
    assert!(rotator.flush());
    assert_eq!(read(&dir.path().join("logfile")), "line\n");
    rotator.close().expect("close");
}

#[rstest]
fn flush_reports_false_while_stopped(dir: TempDir) {
    let rotator = rotator_in(&dir, "1 kib", 2);
    assert!(!rotator.flush());
    assert_eq!(rotator.queued(), 0);
}

#[rstest]
fn io_write_impls_feed_the_queue(dir: TempDir) {
    let mut rotator = rotator_in(&dir, "1 kib", 2);
    writeln!(&rotator, "borrowed {}", 1).expect("write via &Rotator");
    writeln!(rotator, "owned {}", 2).expect("write via Rotator");
    Write::flush(&mut rotator).expect("flush while stopped");

    rotator.start().expect("start");
    Write::flush(&mut &rotator).expect("flush while running");
    assert_eq!(
        read(&dir.path().join("logfile")),
        "borrowed 1\nowned 2\n"
    );
}

#[rstest]
fn io_write_maps_closed_to_broken_pipe(dir: TempDir) {
    let rotator = rotator_in(&dir, "1 kib", 2);
    rotator.close().expect("close");
    let err = Write::write(&mut &rotator, b"late").expect_err("closed rotator");
    assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
}

#[rstest]
fn drop_writes_queued_records(dir: TempDir) {
    let rotator = rotator_in(&dir, "1 kib", 2);
    rotator.start().expect("start");
    rotator.write(b"kept on drop\n").expect("queued");
    drop(rotator);
    assert_eq!(read(&dir.path().join("logfile")), "kept on drop\n");
}
