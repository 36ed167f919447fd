//! Bus master side of the simulator
//!
//! [`SimulatedI2c`] implements the `embedded-hal` I2C trait on top of the
//! simulator's bit-level protocol, so register drivers written against
//! `embedded-hal` (such as [`crate::ImuDriver`]) run unchanged against the
//! simulated part. Requests travel over a [`RequestChannel`]: a TCP
//! connection to a running simulator, or a [`CommandRouter`] in the same
//! process.

use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};

use embedded_hal::i2c::{ErrorType, I2c, Operation};

use crate::bus::{parse_hex_byte, Direction};
use crate::clock::Clock;
use crate::error::ClientError;
use crate::router::{CommandRouter, ERROR_PREFIX};

/// One request, one reply
pub trait RequestChannel {
    /// Send `message` and wait for the reply text
    ///
    /// # Errors
    ///
    /// Returns an error if the channel fails.
    fn request(&mut self, message: &str) -> Result<String, ClientError>;
}

impl<T: RequestChannel + ?Sized> RequestChannel for &mut T {
    fn request(&mut self, message: &str) -> Result<String, ClientError> {
        (**self).request(message)
    }
}

impl<C: Clock> RequestChannel for CommandRouter<C> {
    fn request(&mut self, message: &str) -> Result<String, ClientError> {
        Ok(self.process(message.as_bytes())?)
    }
}

/// TCP connection to a running simulator
#[derive(Debug)]
pub struct TcpChannel {
    stream: BufReader<TcpStream>,
}

impl TcpChannel {
    /// Connect to the simulator at `address`
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn connect(address: impl ToSocketAddrs) -> io::Result<Self> {
        let stream = TcpStream::connect(address)?;
        stream.set_nodelay(true)?;
        Ok(Self {
            stream: BufReader::new(stream),
        })
    }
}

impl RequestChannel for TcpChannel {
    fn request(&mut self, message: &str) -> Result<String, ClientError> {
        let stream = self.stream.get_mut();
        stream.write_all(message.as_bytes())?;
        stream.write_all(b"\n")?;
        stream.flush()?;

        let mut reply = String::new();
        if self.stream.read_line(&mut reply)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "simulator closed the connection",
            )
            .into());
        }
        Ok(reply.trim_end().to_owned())
    }
}

/// `embedded-hal` I2C bus backed by the simulator
///
/// Each [`I2c::transaction`] is replayed as bus conditions:
/// - the first operation of a direction sends `START <address> WRITE|READ`
/// - written bytes are sent one by one (the first one selects the register)
/// - every read byte after the first is requested with `ACK`
/// - the transaction ends with `NACK STOP` after a read or `STOP` after a write
///
/// The simulated part only supports reads that follow a register pointer
/// write, so a read-only transaction is rejected by the device.
#[derive(Debug)]
pub struct SimulatedI2c<Ch> {
    channel: Ch,
}

impl<Ch: RequestChannel> SimulatedI2c<Ch> {
    /// Create a bus on top of `channel`
    pub const fn new(channel: Ch) -> Self {
        Self { channel }
    }

    /// Consume the bus and return the channel
    pub fn into_inner(self) -> Ch {
        self.channel
    }

    /// Read one register through `READ_BYTE`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    pub fn read_byte(&mut self, register: u8) -> Result<u8, ClientError> {
        let reply = self.exchange(&format!("READ_BYTE 0x{register:02x}"))?;
        parse_hex_byte(&reply).map_err(|_| ClientError::UnexpectedReply(reply))
    }

    /// Write one register through `WRITE_BYTE`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    pub fn write_byte(&mut self, register: u8, value: u8) -> Result<(), ClientError> {
        let reply = self.exchange(&format!("WRITE_BYTE 0x{register:02x} 0x{value:02x}"))?;
        if reply == "SUCCESS" {
            Ok(())
        } else {
            Err(ClientError::UnexpectedReply(reply))
        }
    }

    fn exchange(&mut self, message: &str) -> Result<String, ClientError> {
        log::trace!("-> {message}");
        let reply = self.channel.request(message)?;
        log::trace!("<- {reply}");
        if reply.starts_with(ERROR_PREFIX) {
            return Err(ClientError::Rejected(reply));
        }
        Ok(reply)
    }

    fn expect_ack(&mut self, message: &str) -> Result<(), ClientError> {
        let reply = self.exchange(message)?;
        if reply == "ACK" {
            Ok(())
        } else {
            Err(ClientError::UnexpectedReply(reply))
        }
    }

    fn expect_data(&mut self, message: &str) -> Result<u8, ClientError> {
        let reply = self.exchange(message)?;
        let byte = reply
            .strip_prefix("ACK ")
            .and_then(|byte| parse_hex_byte(byte).ok());
        byte.ok_or(ClientError::UnexpectedReply(reply))
    }

    fn expect_end(&mut self, message: &str) -> Result<(), ClientError> {
        let reply = self.exchange(message)?;
        if reply == "END" {
            Ok(())
        } else {
            Err(ClientError::UnexpectedReply(reply))
        }
    }
}

impl<Ch> ErrorType for SimulatedI2c<Ch> {
    type Error = ClientError;
}

impl<Ch: RequestChannel> I2c for SimulatedI2c<Ch> {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut direction = None;

        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => {
                    if direction == Some(Direction::Read) {
                        // The part has no repeated START into a write.
                        self.expect_end("NACK STOP")?;
                        direction = None;
                    }
                    if direction.is_none() {
                        self.expect_ack(&format!("START 0x{address:02x} WRITE"))?;
                        direction = Some(Direction::Write);
                    }
                    for byte in bytes.iter() {
                        self.expect_ack(&format!("0x{byte:02x}"))?;
                    }
                }
                Operation::Read(buffer) => {
                    for slot in buffer.iter_mut() {
                        *slot = if direction == Some(Direction::Read) {
                            self.expect_data("ACK")?
                        } else {
                            direction = Some(Direction::Read);
                            self.expect_data(&format!("START 0x{address:02x} READ"))?
                        };
                    }
                }
            }
        }

        match direction {
            Some(Direction::Read) => self.expect_end("NACK STOP"),
            Some(Direction::Write) => self.expect_end("STOP"),
            None => Ok(()),
        }
    }
}
