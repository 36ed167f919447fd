//! Unit tests for data-ready pacing and dataset playback

use crate::common::{create_router, send, two_row_dataset, ODR};
use imu_simulator::{CommandRouter, Dataset, ManualClock, Sample};
use std::time::Duration;

const MS: Duration = Duration::from_millis(1);

/// Latched data registers as `[X1, X0, Y1, Y0, Z1, Z0]`
fn data_registers(router: &mut CommandRouter<ManualClock>) -> Vec<String> {
    (0x0B..=0x10)
        .map(|register| send(router, &format!("READ_BYTE 0x{register:02x}")))
        .collect()
}

#[test]
fn test_not_ready_while_disabled() {
    let (mut router, clock) = create_router(two_row_dataset());

    clock.advance(ODR * 10);
    assert_eq!(send(&mut router, "READ_BYTE 0x39"), "0x00");
    assert_eq!(
        data_registers(&mut router),
        ["0xaa", "0xbb", "0xcc", "0xdd", "0xee", "0xff"]
    );
}

#[test]
fn test_drdy_gating() {
    let (mut router, clock) = create_router(two_row_dataset());
    assert_eq!(send(&mut router, "WRITE_BYTE 0x1f 0x03"), "SUCCESS");

    assert_eq!(send(&mut router, "READ_BYTE 0x39"), "0x00");

    // Due exactly now is not yet in the past
    clock.advance(ODR);
    assert_eq!(send(&mut router, "READ_BYTE 0x39"), "0x00");

    clock.advance(MS);
    assert_eq!(send(&mut router, "READ_BYTE 0x39"), "0x01");
    assert_eq!(send(&mut router, "READ_BYTE 0x39"), "0x00");

    clock.advance(ODR - MS);
    assert_eq!(send(&mut router, "READ_BYTE 0x39"), "0x00");
    clock.advance(MS);
    assert_eq!(send(&mut router, "READ_BYTE 0x39"), "0x01");
}

#[test]
fn test_no_drift_over_many_intervals() {
    const INTERVALS: u32 = 1000;

    let (mut router, clock) = create_router(two_row_dataset());
    send(&mut router, "WRITE_BYTE 0x1f 0x03");

    clock.advance(MS);
    for _ in 0..INTERVALS {
        clock.advance(ODR);
        assert_eq!(send(&mut router, "READ_BYTE 0x39"), "0x01");
        assert_eq!(send(&mut router, "READ_BYTE 0x39"), "0x00");
    }
}

#[test]
fn test_late_poller_catches_up() {
    let (mut router, clock) = create_router(two_row_dataset());
    send(&mut router, "WRITE_BYTE 0x1f 0x03");

    // Polled late: the schedule advances from the due time, not from the poll
    clock.advance(ODR + ODR / 2);
    assert_eq!(send(&mut router, "READ_BYTE 0x39"), "0x01");
    clock.advance(ODR / 2 + MS);
    assert_eq!(send(&mut router, "READ_BYTE 0x39"), "0x01");
    assert_eq!(send(&mut router, "READ_BYTE 0x39"), "0x00");

    // Several intervals missed at once: one ready flag per poll
    clock.advance(ODR * 3);
    for _ in 0..3 {
        assert_eq!(send(&mut router, "READ_BYTE 0x39"), "0x01");
    }
    assert_eq!(send(&mut router, "READ_BYTE 0x39"), "0x00");
}

#[test]
fn test_dataset_cycling() {
    let (mut router, clock) = create_router(two_row_dataset());
    send(&mut router, "WRITE_BYTE 0x1f 0x03");

    let row_1 = ["0x40", "0x00", "0xc0", "0x00", "0x20", "0x00"];
    let row_2 = ["0x10", "0x00", "0x00", "0x00", "0xe0", "0x00"];

    clock.advance(MS);
    for read in 1..=6 {
        clock.advance(ODR);
        assert_eq!(send(&mut router, "READ_BYTE 0x39"), "0x01");
        let expected = if read % 2 == 1 { row_1 } else { row_2 };
        assert_eq!(data_registers(&mut router), expected, "read {read}");
    }
}

#[test]
fn test_disable_freezes_data() {
    let (mut router, clock) = create_router(two_row_dataset());
    send(&mut router, "WRITE_BYTE 0x1f 0x03");

    clock.advance(ODR + MS);
    assert_eq!(send(&mut router, "READ_BYTE 0x39"), "0x01");
    let latched = data_registers(&mut router);

    assert_eq!(send(&mut router, "WRITE_BYTE 0x1f 0x00"), "SUCCESS");
    clock.advance(ODR * 5);
    assert_eq!(send(&mut router, "READ_BYTE 0x39"), "0x00");
    assert_eq!(data_registers(&mut router), latched);
}

#[test]
fn test_reenable_restarts_schedule() {
    let (mut router, clock) = create_router(two_row_dataset());
    send(&mut router, "WRITE_BYTE 0x1f 0x03");
    send(&mut router, "WRITE_BYTE 0x1f 0x00");

    clock.advance(ODR * 5);
    send(&mut router, "WRITE_BYTE 0x1f 0x03");
    assert_eq!(send(&mut router, "READ_BYTE 0x39"), "0x00");

    clock.advance(ODR + MS);
    assert_eq!(send(&mut router, "READ_BYTE 0x39"), "0x01");
    assert_eq!(send(&mut router, "READ_BYTE 0x39"), "0x00");
}

#[test]
fn test_encoding_law() {
    let values = [0.0, 1.0, -1.0, 0.123_45, -0.000_01, 1.999_9, -2.0, 3.5];
    let samples = values.iter().map(|&v| Sample::new(v, -v, v / 2.0)).collect();
    let (mut router, clock) = create_router(Dataset::new(samples).unwrap());
    send(&mut router, "WRITE_BYTE 0x1f 0x03");
    clock.advance(MS);

    for &value in &values {
        clock.advance(ODR);
        assert_eq!(send(&mut router, "READ_BYTE 0x39"), "0x01");

        let registers = data_registers(&mut router);
        for (axis, v) in [value, -value, value / 2.0].into_iter().enumerate() {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let raw = ((v * 16384.0).round() as i64).rem_euclid(65536) as u16;
            let [high, low] = raw.to_be_bytes();
            assert_eq!(registers[2 * axis], format!("0x{high:02x}"), "value {v}");
            assert_eq!(registers[2 * axis + 1], format!("0x{low:02x}"), "value {v}");
        }
    }
}
