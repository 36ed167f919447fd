//! Register file of the simulated IMU
//!
//! Every address belongs to exactly one [`RegisterKind`]. The assignment is
//! fixed; only register values change at runtime.
//!
//! | Kind | Read | Write |
//! |---|---|---|
//! | Config | stored value | store (`PWR_MGMT0` also switches acquisition) |
//! | Status | data-ready check, **advances acquisition** | ignored |
//! | Data | latched sample byte | ignored |
//! | Unmapped | [`UNMAPPED_REGISTER_VALUE`] | ignored |

use crate::acquisition::DataAcquisition;
use crate::clock::Clock;
use crate::error::FatalError;
use crate::registers::{
    ACCEL_CONFIG0, ACCEL_CONFIG0_DEFAULT, ACCEL_DATA_X1, ACCEL_DATA_Z0, ACCEL_MODE_MASK,
    INT_STATUS_DRDY, PWR_MGMT0, PWR_MGMT0_DEFAULT,
};
use crate::UNMAPPED_REGISTER_VALUE;

/// `ACCEL_MODE` value that turns the accelerometer off
pub const ACCEL_MODE_OFF: u8 = 0b00;
/// `ACCEL_MODE` value for low-noise mode
pub const ACCEL_MODE_LOW_NOISE: u8 = 0b11;

/// Category of a register address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterKind {
    /// Read-write storage; index into the configuration bank
    Config(usize),
    /// Read-only, computed on read
    Status,
    /// Read-only sample byte; index into the latched data (0 = X high)
    Data(usize),
    /// Not implemented by the part
    Unmapped,
}

impl RegisterKind {
    /// Category of `address`
    #[must_use]
    pub const fn of(address: u8) -> Self {
        match address {
            PWR_MGMT0 => Self::Config(0),
            ACCEL_CONFIG0 => Self::Config(1),
            INT_STATUS_DRDY => Self::Status,
            ACCEL_DATA_X1..=ACCEL_DATA_Z0 => Self::Data((address - ACCEL_DATA_X1) as usize),
            _ => Self::Unmapped,
        }
    }
}

/// Register storage plus the acquisition engine behind the data registers
#[derive(Debug)]
pub struct RegisterFile<C> {
    config: [u8; 2],
    acquisition: DataAcquisition<C>,
}

impl<C: Clock> RegisterFile<C> {
    /// Create a register file with reset values
    pub fn new(acquisition: DataAcquisition<C>) -> Self {
        Self {
            config: [PWR_MGMT0_DEFAULT, ACCEL_CONFIG0_DEFAULT],
            acquisition,
        }
    }

    /// Read one register
    ///
    /// Reading `INT_STATUS_DRDY` is **not** side-effect free: it runs the
    /// acquisition readiness check, which latches a new sample into the data
    /// registers when one is due. It returns `1` for the read that latched a
    /// sample and `0` otherwise.
    pub fn read(&mut self, address: u8) -> u8 {
        match RegisterKind::of(address) {
            RegisterKind::Config(index) => self.config[index],
            RegisterKind::Status => u8::from(self.acquisition.is_new_data_ready()),
            RegisterKind::Data(index) => self.acquisition.data_register(index),
            RegisterKind::Unmapped => UNMAPPED_REGISTER_VALUE,
        }
    }

    /// Write one register
    ///
    /// # Errors
    ///
    /// Returns [`FatalError::UnsupportedAccelMode`] when `PWR_MGMT0` is written
    /// with an `ACCEL_MODE` other than off or low-noise. The value is not
    /// stored in that case.
    pub fn write(&mut self, address: u8, value: u8) -> Result<(), FatalError> {
        let RegisterKind::Config(index) = RegisterKind::of(address) else {
            log::debug!("Ignoring write of 0x{value:02x} to read-only register 0x{address:02x}");
            return Ok(());
        };

        if address == PWR_MGMT0 {
            self.apply_power_management(value)?;
        }

        self.config[index] = value;
        log::info!(
            "{} set to 0x{value:02x}",
            crate::registers::name(address).unwrap_or("register")
        );
        Ok(())
    }

    fn apply_power_management(&mut self, value: u8) -> Result<(), FatalError> {
        match value & ACCEL_MODE_MASK {
            ACCEL_MODE_LOW_NOISE => self.acquisition.enable(),
            ACCEL_MODE_OFF => self.acquisition.disable(),
            mode => return Err(FatalError::UnsupportedAccelMode(mode)),
        }
        Ok(())
    }

    /// Acquisition engine feeding the data and status registers
    #[must_use]
    pub fn acquisition(&self) -> &DataAcquisition<C> {
        &self.acquisition
    }
}
