//! Bus interface for the register driver
//!
//! This module provides the `device-driver` register interface on top of any
//! `embedded-hal` I2C bus, including [`crate::SimulatedI2c`].

use device_driver::RegisterInterface;
use embedded_hal::i2c::Operation;

use crate::DEFAULT_DEVICE_ADDRESS;

/// I2C interface for the IMU
#[derive(Debug)]
pub struct I2cInterface<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> I2cInterface<I2C> {
    /// Create a new I2C interface with the default address (0x7F)
    ///
    /// # Example
    /// ```ignore
    /// let interface = I2cInterface::new(i2c);
    /// let mut imu = ImuDriver::new(interface);
    /// ```
    pub const fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, DEFAULT_DEVICE_ADDRESS)
    }

    /// Create a new I2C interface with a custom device address
    pub const fn with_address(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Device address used for every transaction
    #[must_use]
    pub const fn address(&self) -> u8 {
        self.address
    }

    /// Consume the interface and return the I2C peripheral
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C, E> RegisterInterface for I2cInterface<I2C>
where
    I2C: embedded_hal::i2c::I2c<Error = E>,
{
    type Error = E;
    type AddressType = u8;

    fn read_register(
        &mut self,
        address: Self::AddressType,
        size_bits: u32,
        read_data: &mut [u8],
    ) -> Result<(), Self::Error> {
        let _ = size_bits; // Size is implicit in read_data.len() for I2C
        self.i2c.write_read(self.address, &[address], read_data)
    }

    fn write_register(
        &mut self,
        address: Self::AddressType,
        size_bits: u32,
        write_data: &[u8],
    ) -> Result<(), Self::Error> {
        let _ = size_bits;
        // Adjacent writes share one START, so the pointer and data form a single transfer
        self.i2c.transaction(
            self.address,
            &mut [Operation::Write(&[address]), Operation::Write(write_data)],
        )
    }
}
