//! Message decoding and dispatch
//!
//! The router is the context object of the simulator: it owns the register
//! file (and through it the acquisition engine) and the bus session, and it
//! is the only component that sees raw transport messages.
//!
//! Two command surfaces share the same device model:
//! - the bit-level bus protocol (see [`crate::bus`])
//! - a register-access surface: `READ_BYTE <reg>` → `0x<hh>` and
//!   `WRITE_BYTE <reg> <byte>` → `SUCCESS`
//!
//! Register-access commands do not touch an in-flight bus session.

use crate::acquisition::DataAcquisition;
use crate::bus::{parse_hex_byte, BusProtocol};
use crate::clock::Clock;
use crate::config::SimulatorConfig;
use crate::dataset::Dataset;
use crate::error::{CommandError, FatalError, SimulatorError};
use crate::register_file::RegisterFile;

const READ_BYTE: &str = "READ_BYTE";
const WRITE_BYTE: &str = "WRITE_BYTE";
const SUCCESS: &str = "SUCCESS";

/// Prefix of every error reply
pub const ERROR_PREFIX: &str = "ERROR";

/// Reply to a request that failed for an unknown reason
pub const UNKNOWN_PROBLEM_REPLY: &str = "ERROR: Unknown Problem Occurred";

/// Format an error reply
#[must_use]
pub fn error_reply(description: impl core::fmt::Display) -> String {
    format!("{ERROR_PREFIX}: {description}")
}

/// Entry point for transport messages
#[derive(Debug)]
pub struct CommandRouter<C> {
    registers: RegisterFile<C>,
    bus: BusProtocol,
}

impl<C: Clock> CommandRouter<C> {
    /// Create a router for a device answering to `device_address`
    pub fn new(registers: RegisterFile<C>, device_address: u8) -> Self {
        Self {
            registers,
            bus: BusProtocol::new(device_address),
        }
    }

    /// Assemble a simulator in its reset state from `config`
    pub fn from_config(config: &SimulatorConfig, dataset: Dataset, clock: C) -> Self {
        let acquisition = DataAcquisition::new(dataset, config.output_data_rate, clock);
        Self::new(RegisterFile::new(acquisition), config.device_address)
    }

    /// Process one request and produce its reply
    ///
    /// Command errors are turned into `ERROR: <description>` replies and the
    /// bus session is reset.
    ///
    /// # Errors
    ///
    /// Returns the [`FatalError`] raised by a register write with an
    /// unsupported configuration. The caller is expected to stop serving.
    pub fn process(&mut self, message: &[u8]) -> Result<String, FatalError> {
        log::debug!("Received message: {:?}", String::from_utf8_lossy(message));

        let reply = match self.dispatch(message) {
            Ok(reply) => reply,
            Err(SimulatorError::Command(err)) => {
                log::warn!("Rejected message {:?}: {err}", String::from_utf8_lossy(message));
                error_reply(err)
            }
            Err(SimulatorError::Fatal(err)) => {
                log::error!("{err}");
                return Err(err);
            }
        };

        log::debug!("Replied: {reply}");
        Ok(reply)
    }

    fn dispatch(&mut self, message: &[u8]) -> Result<String, SimulatorError> {
        let Ok(text) = core::str::from_utf8(message) else {
            self.bus.reset();
            return Err(CommandError::InvalidEncoding.into());
        };
        let tokens: Vec<&str> = text
            .split(|c: char| c.is_whitespace() || c == '\0')
            .filter(|token| !token.is_empty())
            .collect();

        match tokens.as_slice() {
            [READ_BYTE, args @ ..] => {
                let [register] = expect_args::<1>(args)?;
                let value = self.registers.read(parse_hex_byte(register)?);
                Ok(format!("0x{value:02x}"))
            }
            [WRITE_BYTE, args @ ..] => {
                let [register, value] = expect_args::<2>(args)?;
                let register = parse_hex_byte(register)?;
                let value = parse_hex_byte(value)?;
                self.registers.write(register, value)?;
                Ok(SUCCESS.to_owned())
            }
            tokens => self
                .bus
                .handle(tokens, &mut self.registers)
                .map(|reply| reply.to_string()),
        }
    }

    /// Abort any bus transaction in flight
    pub fn reset_session(&mut self) {
        self.bus.reset();
    }

    /// Bus protocol engine
    #[must_use]
    pub fn bus(&self) -> &BusProtocol {
        &self.bus
    }

    /// Register file
    #[must_use]
    pub fn registers(&self) -> &RegisterFile<C> {
        &self.registers
    }

    /// Mutable register file, for direct register access
    pub fn registers_mut(&mut self) -> &mut RegisterFile<C> {
        &mut self.registers
    }
}

fn expect_args<'a, const N: usize>(args: &[&'a str]) -> Result<[&'a str; N], CommandError> {
    <[&str; N]>::try_from(args).map_err(|_| CommandError::WrongTokenCount {
        expected: N,
        received: args.len(),
    })
}
