//! High-level driver API for the simulated IMU
//!
//! This is the bus master's view of the part: the same register accesses
//! the firmware under test performs, expressed through the `device-driver`
//! register map in [`crate::registers`]. It runs on any `embedded-hal` I2C
//! bus; against the simulator that bus is [`crate::SimulatedI2c`].

use device_driver::RegisterInterface;

use crate::acquisition::ACCEL_SENSITIVITY;
use crate::registers::{Imu as RegisterDevice, ACCEL_DATA_X1};
use crate::Error;

/// Accelerometer operating mode (`ACCEL_MODE` field of `PWR_MGMT0`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccelMode {
    /// Accelerometer off
    Off = 0,
    /// Low-power mode
    LowPower = 2,
    /// Low-noise mode
    LowNoise = 3,
}

impl AccelMode {
    /// Decode the 2-bit `ACCEL_MODE` field (`0b01` also means off)
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            2 => Self::LowPower,
            3 => Self::LowNoise,
            _ => Self::Off,
        }
    }
}

/// Accelerometer full-scale range (`ACCEL_FS_SEL` field of `ACCEL_CONFIG0`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccelFullScale {
    /// ±16g range
    G16 = 0,
    /// ±8g range
    G8 = 1,
    /// ±4g range
    G4 = 2,
    /// ±2g range
    G2 = 3,
}

impl AccelFullScale {
    /// Decode `ACCEL_FS_SEL`; reserved encodings yield `None`
    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::G16),
            1 => Some(Self::G8),
            2 => Some(Self::G4),
            3 => Some(Self::G2),
            _ => None,
        }
    }

    /// Get the maximum value in g
    #[must_use]
    pub const fn max_value(self) -> u8 {
        match self {
            Self::G16 => 16,
            Self::G8 => 8,
            Self::G4 => 4,
            Self::G2 => 2,
        }
    }
}

/// Accelerometer configuration as read from `ACCEL_CONFIG0`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccelConfig {
    /// Full-scale range
    pub full_scale: AccelFullScale,
    /// Raw output data rate selection
    pub odr: u8,
}

/// Accelerometer data (raw 16-bit values)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccelData {
    /// X-axis acceleration (raw)
    pub x: i16,
    /// Y-axis acceleration (raw)
    pub y: i16,
    /// Z-axis acceleration (raw)
    pub z: i16,
}

/// Accelerometer data in physical units (g-force)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccelDataG {
    /// X-axis acceleration in g
    pub x: f32,
    /// Y-axis acceleration in g
    pub y: f32,
    /// Z-axis acceleration in g
    pub z: f32,
}

impl AccelDataG {
    /// Create from raw sensor values and a sensitivity in LSB/g
    #[must_use]
    pub fn from_raw(raw: AccelData, sensitivity: f32) -> Self {
        Self {
            x: f32::from(raw.x) / sensitivity,
            y: f32::from(raw.y) / sensitivity,
            z: f32::from(raw.z) / sensitivity,
        }
    }
}

/// Main driver for the IMU
pub struct ImuDriver<I> {
    device: RegisterDevice<I>,
}

impl<I> ImuDriver<I>
where
    I: RegisterInterface<AddressType = u8>,
{
    /// Create a new driver instance
    ///
    /// No bus traffic happens until the first call.
    pub fn new(interface: I) -> Self {
        Self {
            device: RegisterDevice::new(interface),
        }
    }

    /// Set the accelerometer mode, leaving the other `PWR_MGMT0` fields as they are
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_accel_mode(&mut self, mode: AccelMode) -> Result<(), Error<I::Error>> {
        self.device.pwr_mgmt_0().modify(|w| {
            w.set_accel_mode(mode as u8);
        })?;
        Ok(())
    }

    /// Read back the accelerometer mode
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn accel_mode(&mut self) -> Result<AccelMode, Error<I::Error>> {
        let pwr_mgmt = self.device.pwr_mgmt_0().read()?;
        Ok(AccelMode::from_bits(pwr_mgmt.accel_mode()))
    }

    /// Put the accelerometer in low-noise mode
    ///
    /// The first sample is available one output data rate interval later.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn enable_accelerometer(&mut self) -> Result<(), Error<I::Error>> {
        self.set_accel_mode(AccelMode::LowNoise)
    }

    /// Turn the accelerometer off; the data registers keep their last value
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn disable_accelerometer(&mut self) -> Result<(), Error<I::Error>> {
        self.set_accel_mode(AccelMode::Off)
    }

    /// Read the accelerometer configuration
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails or
    /// [`Error::InvalidConfig`] if the full-scale field holds a reserved value.
    pub fn accel_config(&mut self) -> Result<AccelConfig, Error<I::Error>> {
        let config = self.device.accel_config_0().read()?;
        let full_scale = AccelFullScale::from_bits(config.accel_fs_sel())
            .ok_or(Error::InvalidConfig(config.accel_fs_sel()))?;
        log::debug!(
            "Accelerometer range ±{}g, ODR selection {}",
            full_scale.max_value(),
            config.accel_odr()
        );
        Ok(AccelConfig {
            full_scale,
            odr: config.accel_odr(),
        })
    }

    /// Poll the data-ready flag
    ///
    /// The flag is cleared by this read, so each new sample is reported once.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn data_ready(&mut self) -> Result<bool, Error<I::Error>> {
        Ok(self.device.int_status_drdy().read()?.data_rdy())
    }

    /// Read accelerometer data
    ///
    /// Returns raw 16-bit values for X, Y, Z axes.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn read_accel(&mut self) -> Result<AccelData, Error<I::Error>> {
        // One burst over ACCEL_DATA_X1..=ACCEL_DATA_Z0 so the axes belong to the same sample
        let mut buffer = [0u8; 6];
        self.device
            .interface
            .read_register(ACCEL_DATA_X1, 48, &mut buffer)?;

        let x = i16::from_be_bytes([buffer[0], buffer[1]]);
        let y = i16::from_be_bytes([buffer[2], buffer[3]]);
        let z = i16::from_be_bytes([buffer[4], buffer[5]]);

        Ok(AccelData { x, y, z })
    }

    /// Read accelerometer data in g-force units
    ///
    /// The simulated part encodes every sample at 16384 LSB/g.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    #[allow(clippy::cast_possible_truncation)]
    pub fn read_accel_g(&mut self) -> Result<AccelDataG, Error<I::Error>> {
        let raw = self.read_accel()?;
        Ok(AccelDataG::from_raw(raw, ACCEL_SENSITIVITY as f32))
    }
}
