//! Property-based tests for rotation.
//!
//! Random record streams are written through a rotator whose ring is large
//! enough never to wrap, so every byte must be found again by reading the
//! rotated files in index order followed by the active file.

use logrotate::{QueueConfig, OverflowPolicy, Rotator, RotatorConfig, slot_path};
use proptest::prelude::*;

#[path = "../support/mod.rs"]
mod support;
use support::read_or_empty;

const SLOTS: usize = 256;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn rotated_files_preserve_every_byte(
        ref records in proptest::collection::vec("[a-z0-9 ]{1,24}\n", 1..60),
        limit in 8u64..128,
    ) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let prefix = dir.path().join("logfile");
        let config = RotatorConfig::new(limit, SLOTS, &prefix).expect("valid config");
        let queue = QueueConfig {
            overflow_policy: OverflowPolicy::Block,
            ..QueueConfig::default()
        };
        let rotator = Rotator::with_config(config, queue).expect("build rotator");
        rotator.start().expect("start");
        for record in records {
            rotator.write(record.as_bytes()).expect("record queued");
        }
        rotator.stop().expect("stop");

        let rotations = rotator.active_file().rotation_index;
        let mut output = String::new();
        for index in 0..rotations {
            let rotated = read_or_empty(&slot_path(&prefix, index));
            prop_assert!(rotated.len() as u64 > limit);
            output.push_str(&rotated);
        }
        let active = read_or_empty(&prefix);
        prop_assert!(active.len() as u64 <= limit);
        output.push_str(&active);

        prop_assert_eq!(output, records.concat());
    }
}
