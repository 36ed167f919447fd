//! Integration tests: register driver against the in-process simulator

use crate::common::{create_mock_driver, test_utils::assert_float_eq, Exchange, ODR};
use imu_simulator::{AccelData, AccelFullScale, AccelMode, ClientError, Error, FatalError};
use std::time::Duration;

#[test]
fn test_complete_acquisition_workflow() {
    let (mut driver, channel, clock) = create_mock_driver();

    assert_eq!(driver.accel_mode().unwrap(), AccelMode::Off);
    let config = driver.accel_config().unwrap();
    assert_eq!(config.full_scale, AccelFullScale::G16);
    assert_eq!(config.odr, 6);

    driver.enable_accelerometer().unwrap();
    assert_eq!(driver.accel_mode().unwrap(), AccelMode::LowNoise);
    assert!(channel.with_router(|router| router.registers().acquisition().is_enabled()));

    assert!(!driver.data_ready().unwrap());
    clock.advance(ODR + Duration::from_millis(1));
    assert!(driver.data_ready().unwrap());
    assert!(!driver.data_ready().unwrap());

    assert_eq!(
        driver.read_accel().unwrap(),
        AccelData {
            x: 16384,
            y: -16384,
            z: 8192
        }
    );

    clock.advance(ODR);
    assert!(driver.data_ready().unwrap());
    let accel = driver.read_accel_g().unwrap();
    assert_float_eq(accel.x, 0.25, 1e-6);
    assert_float_eq(accel.y, 0.0, 1e-6);
    assert_float_eq(accel.z, -0.5, 1e-6);
}

#[test]
fn test_read_before_first_sample() {
    let (mut driver, _channel, _clock) = create_mock_driver();

    // 0xAABB, 0xCCDD, 0xEEFF
    assert_eq!(
        driver.read_accel().unwrap(),
        AccelData {
            x: -21829,
            y: -13091,
            z: -4353
        }
    );
}

#[test]
fn test_burst_read_bus_traffic() {
    let (mut driver, channel, _clock) = create_mock_driver();

    channel.clear_exchanges();
    driver.read_accel().unwrap();

    assert_eq!(
        channel.requests(),
        [
            "START 0x7f WRITE",
            "0x0b",
            "START 0x7f READ",
            "ACK",
            "ACK",
            "ACK",
            "ACK",
            "ACK",
            "NACK STOP"
        ]
    );
}

#[test]
fn test_mode_change_bus_traffic() {
    let (mut driver, channel, _clock) = create_mock_driver();

    channel.clear_exchanges();
    driver.enable_accelerometer().unwrap();

    // Read-modify-write of PWR_MGMT0
    let exchanges = channel.exchanges();
    let pairs: Vec<(&str, &str)> = exchanges
        .iter()
        .map(|Exchange { request, reply }| (request.as_str(), reply.as_str()))
        .collect();
    assert_eq!(
        pairs,
        [
            ("START 0x7f WRITE", "ACK"),
            ("0x1f", "ACK"),
            ("START 0x7f READ", "ACK 0x00"),
            ("NACK STOP", "END"),
            ("START 0x7f WRITE", "ACK"),
            ("0x1f", "ACK"),
            ("0x03", "ACK"),
            ("STOP", "END"),
        ]
    );
}

#[test]
fn test_disable_keeps_last_sample() {
    let (mut driver, _channel, clock) = create_mock_driver();

    driver.enable_accelerometer().unwrap();
    clock.advance(ODR + Duration::from_millis(1));
    assert!(driver.data_ready().unwrap());
    let latched = driver.read_accel().unwrap();

    driver.disable_accelerometer().unwrap();
    assert_eq!(driver.accel_mode().unwrap(), AccelMode::Off);
    clock.advance(ODR * 4);
    assert!(!driver.data_ready().unwrap());
    assert_eq!(driver.read_accel().unwrap(), latched);
}

#[test]
fn test_unsupported_mode_is_fatal() {
    let (mut driver, channel, _clock) = create_mock_driver();

    let result = driver.set_accel_mode(AccelMode::LowPower);
    assert!(matches!(
        result,
        Err(Error::Bus(ClientError::Fatal(FatalError::UnsupportedAccelMode(0x02))))
    ));
    assert!(!channel.with_router(|router| router.registers().acquisition().is_enabled()));
}

#[test]
fn test_channel_failure_recovery() {
    let (mut driver, channel, _clock) = create_mock_driver();

    channel.fail_next_request();
    assert!(matches!(
        driver.read_accel(),
        Err(Error::Bus(ClientError::Io(_)))
    ));

    // The failed request never reached the simulator; the next transaction starts clean
    assert!(driver.read_accel().is_ok());
}

#[test]
fn test_invalid_full_scale_reported() {
    let (mut driver, channel, _clock) = create_mock_driver();

    channel.with_router(|router| router.registers_mut().write(0x21, 0xA6).unwrap());
    assert!(matches!(driver.accel_config(), Err(Error::InvalidConfig(5))));
}
