//! Bit-level I2C bus protocol
//!
//! The bus master drives a transaction one token group at a time, mirroring
//! the conditions it would put on a real bus:
//!
//! ```text
//! master                      simulator
//! START 0x7f WRITE     ->     ACK              address + write direction
//! 0x0b                 ->     ACK              register pointer
//! START 0x7f READ      ->     ACK 0x40         repeated start, first byte
//! ACK                  ->     ACK 0x00         next byte (pointer auto-increments)
//! NACK STOP            ->     END              end of transfer
//! ```
//!
//! A register write keeps sending bytes after the pointer and ends with a
//! plain `STOP`:
//!
//! ```text
//! START 0x7f WRITE     ->     ACK
//! 0x1f                 ->     ACK
//! 0x03                 ->     ACK              PWR_MGMT0 = 0x03
//! STOP                 ->     END
//! ```
//!
//! Any input that does not fit the current state aborts the transaction: the
//! session returns to [`BusState::Idle`] and the input is reported as a
//! [`CommandError`].

use core::fmt;

use crate::clock::Clock;
use crate::error::{CommandError, SimulatorError};
use crate::register_file::RegisterFile;

/// Transfer direction of a START condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Master writes to the device
    Write,
    /// Master reads from the device
    Read,
}

/// State of the bus session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusState {
    /// No transaction in flight
    Idle,
    /// Device addressed for writing, waiting for the register pointer
    RegisterSelect,
    /// Register pointer set; data bytes or a repeated START may follow
    WriteActive {
        /// Register the next byte goes to or comes from
        register: u8,
    },
    /// Streaming register contents to the master
    ReadActive {
        /// Register returned by the next `ACK`
        register: u8,
    },
}

impl BusState {
    /// Register the session currently points to, if one was selected
    #[must_use]
    pub const fn selected_register(&self) -> Option<u8> {
        match self {
            Self::WriteActive { register } | Self::ReadActive { register } => Some(*register),
            Self::Idle | Self::RegisterSelect => None,
        }
    }

    /// Direction of the transfer in progress
    #[must_use]
    pub const fn direction(&self) -> Option<Direction> {
        match self {
            Self::Idle => None,
            Self::RegisterSelect | Self::WriteActive { .. } => Some(Direction::Write),
            Self::ReadActive { .. } => Some(Direction::Read),
        }
    }
}

/// One bus-level command sent by the master
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusCommand {
    /// `START <address> READ|WRITE`
    Start {
        /// 7-bit device address
        address: u8,
        /// Transfer direction
        direction: Direction,
    },
    /// A bare hexadecimal byte (register pointer or data)
    Byte(u8),
    /// `ACK`: master acknowledges the last byte and wants the next one
    Ack,
    /// `NACK STOP`: master ends a read
    NackStop,
    /// `STOP`: master ends a write
    Stop,
}

impl BusCommand {
    /// Parse a whitespace-split message
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] if the tokens do not form a bus command.
    pub fn parse(tokens: &[&str]) -> Result<Self, CommandError> {
        match tokens {
            [] => Err(CommandError::Empty),
            ["START", rest @ ..] => {
                let [address, direction] = rest else {
                    return Err(CommandError::WrongTokenCount {
                        expected: 2,
                        received: rest.len(),
                    });
                };
                let direction = match *direction {
                    "WRITE" => Direction::Write,
                    "READ" => Direction::Read,
                    other => {
                        return Err(CommandError::InvalidDirection {
                            token: other.to_owned(),
                        })
                    }
                };
                Ok(Self::Start {
                    address: parse_hex_byte(address)?,
                    direction,
                })
            }
            ["ACK"] => Ok(Self::Ack),
            ["NACK", "STOP"] => Ok(Self::NackStop),
            ["STOP"] => Ok(Self::Stop),
            [token] => parse_hex_byte(token)
                .map(Self::Byte)
                .map_err(|_| CommandError::UnknownCommand),
            _ => Err(CommandError::UnknownCommand),
        }
    }

    const fn name(&self) -> &'static str {
        match self {
            Self::Start {
                direction: Direction::Write,
                ..
            } => "START WRITE",
            Self::Start {
                direction: Direction::Read,
                ..
            } => "START READ",
            Self::Byte(_) => "byte",
            Self::Ack => "ACK",
            Self::NackStop => "NACK STOP",
            Self::Stop => "STOP",
        }
    }
}

/// Reply token sent back to the master
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusReply {
    /// Device acknowledged
    Ack,
    /// Device acknowledged and drove a data byte
    AckWithData(u8),
    /// Transaction finished
    End,
}

impl fmt::Display for BusReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ack => f.write_str("ACK"),
            Self::AckWithData(byte) => write!(f, "ACK 0x{byte:02x}"),
            Self::End => f.write_str("END"),
        }
    }
}

/// Parse a hexadecimal byte with an optional `0x` prefix
///
/// # Errors
///
/// Returns [`CommandError::InvalidHex`] if `token` is not a byte in hex.
pub fn parse_hex_byte(token: &str) -> Result<u8, CommandError> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    let invalid = || CommandError::InvalidHex {
        token: token.to_owned(),
    };
    // from_str_radix would also take a sign
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    u8::from_str_radix(digits, 16).map_err(|_| invalid())
}

/// I2C bus protocol engine for one device
#[derive(Debug)]
pub struct BusProtocol {
    device_address: u8,
    state: BusState,
}

impl BusProtocol {
    /// Create an idle bus for a device answering to `device_address`
    #[must_use]
    pub const fn new(device_address: u8) -> Self {
        Self {
            device_address,
            state: BusState::Idle,
        }
    }

    /// Current session state
    #[must_use]
    pub const fn state(&self) -> BusState {
        self.state
    }

    /// Address this device answers to
    #[must_use]
    pub const fn device_address(&self) -> u8 {
        self.device_address
    }

    /// Abort any transaction in flight
    pub fn reset(&mut self) {
        self.state = BusState::Idle;
    }

    /// Parse and execute one message against `registers`
    ///
    /// # Errors
    ///
    /// See [`BusProtocol::execute`]. A message that does not parse also
    /// resets the session.
    pub fn handle<C: Clock>(
        &mut self,
        tokens: &[&str],
        registers: &mut RegisterFile<C>,
    ) -> Result<BusReply, SimulatorError> {
        match BusCommand::parse(tokens) {
            Ok(command) => self.execute(command, registers),
            Err(err) => {
                self.reset();
                Err(err.into())
            }
        }
    }

    /// Execute one bus command against `registers`
    ///
    /// Register reads go through [`RegisterFile::read`], so streaming over
    /// `INT_STATUS_DRDY` has the same side effect as any other status read.
    ///
    /// # Errors
    ///
    /// - [`SimulatorError::Command`] if the command is not valid in the
    ///   current state or addresses another device
    /// - [`SimulatorError::Fatal`] if a written byte is an unsupported
    ///   configuration
    ///
    /// The session is back in [`BusState::Idle`] after any error.
    pub fn execute<C: Clock>(
        &mut self,
        command: BusCommand,
        registers: &mut RegisterFile<C>,
    ) -> Result<BusReply, SimulatorError> {
        let result = self.transition(command, registers);
        match &result {
            Ok((_, next)) => self.state = *next,
            Err(_) => self.reset(),
        }
        result.map(|(reply, _)| reply)
    }

    fn transition<C: Clock>(
        &self,
        command: BusCommand,
        registers: &mut RegisterFile<C>,
    ) -> Result<(BusReply, BusState), SimulatorError> {
        let transition = match (self.state, command) {
            (
                BusState::Idle,
                BusCommand::Start {
                    address,
                    direction: Direction::Write,
                },
            ) => {
                self.check_address(address)?;
                (BusReply::Ack, BusState::RegisterSelect)
            }
            (BusState::RegisterSelect, BusCommand::Byte(register)) => {
                (BusReply::Ack, BusState::WriteActive { register })
            }
            (BusState::RegisterSelect | BusState::WriteActive { .. }, BusCommand::Stop)
            | (BusState::ReadActive { .. }, BusCommand::NackStop) => {
                (BusReply::End, BusState::Idle)
            }
            (BusState::WriteActive { register }, BusCommand::Byte(value)) => {
                registers.write(register, value)?;
                (
                    BusReply::Ack,
                    BusState::WriteActive {
                        register: register.wrapping_add(1),
                    },
                )
            }
            (
                BusState::WriteActive { register },
                BusCommand::Start {
                    direction: Direction::Read,
                    ..
                },
            )
            | (BusState::ReadActive { register }, BusCommand::Ack) => {
                if let BusCommand::Start { address, .. } = command {
                    self.check_address(address)?;
                }
                let value = registers.read(register);
                (
                    BusReply::AckWithData(value),
                    BusState::ReadActive {
                        register: register.wrapping_add(1),
                    },
                )
            }
            (state, command) => {
                return Err(CommandError::UnexpectedCommand {
                    command: command.name(),
                    state,
                }
                .into())
            }
        };
        Ok(transition)
    }

    fn check_address(&self, address: u8) -> Result<(), CommandError> {
        if address == self.device_address {
            Ok(())
        } else {
            Err(CommandError::AddressMismatch {
                expected: self.device_address,
                received: address,
            })
        }
    }
}
