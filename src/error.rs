//! Error types of the simulator
//!
//! Errors fall in two classes:
//! - [`CommandError`]: the request was malformed or not valid in the current
//!   bus state. The offending transaction is discarded and an `ERROR:` reply
//!   is sent; the simulator keeps serving.
//! - [`FatalError`]: the firmware under test configured the device in a way
//!   the simulated part does not support. This is a defect in the firmware and
//!   is surfaced to the host instead of being absorbed.

use std::path::PathBuf;

use crate::bus::BusState;

/// Recoverable error caused by a single request
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// The message contained no tokens
    #[error("Empty Command")]
    Empty,
    /// The message was not valid UTF-8 text
    #[error("Message Is Not Valid Text")]
    InvalidEncoding,
    /// The first token does not name any known command
    #[error("Unknown Command")]
    UnknownCommand,
    /// The command was given the wrong number of arguments
    #[error("Invalid number of elements in the message (expected: {expected}, received: {received})")]
    WrongTokenCount {
        /// Number of arguments the command takes
        expected: usize,
        /// Number of arguments received
        received: usize,
    },
    /// A token that should be a hexadecimal byte is not one
    #[error("Invalid hexadecimal byte: {token}")]
    InvalidHex {
        /// The offending token
        token: String,
    },
    /// Direction of a START condition is neither `READ` nor `WRITE`
    #[error("Invalid transfer direction: {token}")]
    InvalidDirection {
        /// The offending token
        token: String,
    },
    /// The addressed device is not this simulator
    #[error("No device at address 0x{received:02x} (expected: 0x{expected:02x})")]
    AddressMismatch {
        /// Address this device answers to
        expected: u8,
        /// Address sent by the bus master
        received: u8,
    },
    /// The command is well formed but not accepted in the current bus state
    #[error("Unexpected {command} in state {state:?}")]
    UnexpectedCommand {
        /// Short name of the received command
        command: &'static str,
        /// Bus state the command was received in
        state: BusState,
    },
}

/// Unrecoverable configuration error raised by a register write
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FatalError {
    /// `PWR_MGMT0` was written with an `ACCEL_MODE` the simulator does not model
    #[error("Unsupported value of ACCEL_MODE (PWR_MGMT0 register) received: 0x{0:02x}")]
    UnsupportedAccelMode(u8),
}

/// Any error produced while executing a command against the device model
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimulatorError {
    /// Recoverable command error
    #[error(transparent)]
    Command(#[from] CommandError),
    /// Fatal configuration error
    #[error(transparent)]
    Fatal(#[from] FatalError),
}

/// Errors while loading the motion dataset
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// The dataset file could not be read
    #[error("failed to read dataset {path}: {source}")]
    Io {
        /// Location of the dataset
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
    /// The dataset has no header row
    #[error("dataset is missing its header row")]
    MissingHeader,
    /// The dataset has a header but no samples
    #[error("dataset contains no samples")]
    Empty,
    /// A data row could not be parsed
    #[error("invalid dataset row at line {line}: {reason}")]
    InvalidRow {
        /// 1-based line number in the file
        line: usize,
        /// What is wrong with the row
        reason: String,
    },
}

/// Errors in the process configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The device address is not a hexadecimal byte
    #[error("invalid device address {value:?}: {source}")]
    InvalidDeviceAddress {
        /// Raw value
        value: String,
        /// Parse failure
        source: CommandError,
    },
    /// The output data rate is not a positive number of seconds
    #[error("invalid output data rate {0:?}: expected a positive number of seconds")]
    InvalidOutputDataRate(String),
}

/// Errors that stop the server loop
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    /// The transport failed
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
    /// The firmware under test triggered a fatal configuration error
    #[error("fatal configuration error: {0}")]
    Fatal(#[from] FatalError),
}

/// Errors seen by a bus master talking to the simulator
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The channel to the simulator failed
    #[error("channel error: {0}")]
    Io(#[from] std::io::Error),
    /// The simulator answered with an `ERROR:` reply
    #[error("simulator rejected the request: {0}")]
    Rejected(String),
    /// The reply does not match the request
    #[error("unexpected reply: {0:?}")]
    UnexpectedReply(String),
    /// The simulator raised a fatal configuration error (in-process channel only)
    #[error("fatal configuration error: {0}")]
    Fatal(#[from] FatalError),
}

impl embedded_hal::i2c::Error for ClientError {
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

        match self {
            Self::Rejected(_) => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown),
            Self::Io(_) => ErrorKind::Bus,
            Self::UnexpectedReply(_) | Self::Fatal(_) => ErrorKind::Other,
        }
    }
}
