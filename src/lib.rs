#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod acquisition;
pub mod bus;
pub mod client;
pub mod clock;
pub mod config;
pub mod dataset;
pub mod device;
pub mod error;
pub mod interface;
pub mod register_file;
pub mod registers;
pub mod router;
pub mod transport;

// Re-export main types
pub use acquisition::DataAcquisition;
pub use bus::{BusCommand, BusProtocol, BusReply, BusState, Direction};
pub use client::{RequestChannel, SimulatedI2c, TcpChannel};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SimulatorConfig;
pub use dataset::{Dataset, Sample};
pub use device::{AccelConfig, AccelData, AccelDataG, AccelFullScale, AccelMode, ImuDriver};
pub use error::{
    ClientError, CommandError, ConfigError, DatasetError, FatalError, ServeError, SimulatorError,
};
pub use interface::I2cInterface;
pub use register_file::{RegisterFile, RegisterKind};
pub use router::CommandRouter;
pub use transport::{serve, TcpTransport, Transport};

/// I2C address the simulated IMU answers to unless configured otherwise
pub const DEFAULT_DEVICE_ADDRESS: u8 = 0x7F;

/// Value returned when reading an address the part does not implement
pub const UNMAPPED_REGISTER_VALUE: u8 = 0xAB;

/// Driver errors
#[derive(Debug)]
pub enum Error<E> {
    /// Communication error with the device
    Bus(E),
    /// Invalid configuration parameter (contains the raw field value read back)
    InvalidConfig(u8),
}

impl<E> From<E> for Error<E> {
    fn from(error: E) -> Self {
        Self::Bus(error)
    }
}
