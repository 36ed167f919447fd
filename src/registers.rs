//! Register definitions of the simulated IMU
//!
//! The simulated part exposes a small subset of an ICM-42xxx-style register
//! map: six accelerometer data registers, the power management and
//! accelerometer configuration registers, and the data-ready status register.
//!
//! Two views of the same map live here:
//! - plain address constants used by the simulator's register file
//! - a `device-driver` register device ([`Imu`]) used by [`crate::ImuDriver`]
//!   to access the part from the bus master side.

/// Accelerometer X-axis data, bits 15:8
pub const ACCEL_DATA_X1: u8 = 0x0B;
/// Accelerometer X-axis data, bits 7:0
pub const ACCEL_DATA_X0: u8 = 0x0C;
/// Accelerometer Y-axis data, bits 15:8
pub const ACCEL_DATA_Y1: u8 = 0x0D;
/// Accelerometer Y-axis data, bits 7:0
pub const ACCEL_DATA_Y0: u8 = 0x0E;
/// Accelerometer Z-axis data, bits 15:8
pub const ACCEL_DATA_Z1: u8 = 0x0F;
/// Accelerometer Z-axis data, bits 7:0
pub const ACCEL_DATA_Z0: u8 = 0x10;
/// Power management
pub const PWR_MGMT0: u8 = 0x1F;
/// Accelerometer configuration
pub const ACCEL_CONFIG0: u8 = 0x21;
/// Data-ready interrupt status
pub const INT_STATUS_DRDY: u8 = 0x39;

/// `ACCEL_MODE` field of `PWR_MGMT0` (bits 1:0)
pub const ACCEL_MODE_MASK: u8 = 0x03;

/// Reset value of `PWR_MGMT0` (accelerometer off)
pub const PWR_MGMT0_DEFAULT: u8 = 0x00;
/// Reset value of `ACCEL_CONFIG0`
pub const ACCEL_CONFIG0_DEFAULT: u8 = 0x06;

/// Human readable register name, used in log messages
#[must_use]
pub const fn name(address: u8) -> Option<&'static str> {
    match address {
        ACCEL_DATA_X1 => Some("ACCEL_DATA_X1"),
        ACCEL_DATA_X0 => Some("ACCEL_DATA_X0"),
        ACCEL_DATA_Y1 => Some("ACCEL_DATA_Y1"),
        ACCEL_DATA_Y0 => Some("ACCEL_DATA_Y0"),
        ACCEL_DATA_Z1 => Some("ACCEL_DATA_Z1"),
        ACCEL_DATA_Z0 => Some("ACCEL_DATA_Z0"),
        PWR_MGMT0 => Some("PWR_MGMT0"),
        ACCEL_CONFIG0 => Some("ACCEL_CONFIG0"),
        INT_STATUS_DRDY => Some("INT_STATUS_DRDY"),
        _ => None,
    }
}

device_driver::create_device!(
    device_name: Imu,
    dsl: {
        config {
            type RegisterAddressType = u8;
            type DefaultByteOrder = BE;
        }

        /// PWR_MGMT0 - Power Management (0x1F)
        register PwrMgmt0 {
            const ADDRESS = 0x1F;
            const SIZE_BITS = 8;

            /// Accelerometer mode (0=off, 1=off, 2=low power, 3=low noise)
            accel_mode: uint = 0..2,
            /// Gyroscope mode (0=off, 1=standby, 3=low noise)
            gyro_mode: uint = 2..4,
            /// Keep the RC oscillator powered in idle
            idle: bool = 4,
            /// Temperature sensor disable
            temp_dis: bool = 5,
            reserved_7_6: uint = 6..8,
        },

        /// ACCEL_CONFIG0 - Accelerometer Configuration (0x21)
        register AccelConfig0 {
            const ADDRESS = 0x21;
            const SIZE_BITS = 8;

            /// Accelerometer output data rate selection
            accel_odr: uint = 0..4,
            reserved_4: uint = 4..5,
            /// Accelerometer full-scale selection
            accel_fs_sel: uint = 5..8,
        },

        /// INT_STATUS_DRDY - Data Ready Status (0x39)
        register IntStatusDrdy {
            const ADDRESS = 0x39;
            const SIZE_BITS = 8;

            /// New sample available (cleared by the read)
            data_rdy: bool = 0,
            reserved_7_1: uint = 1..8,
        },
    }
);
