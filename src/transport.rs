//! Request/reply transport and the server loop
//!
//! The simulator serves one request at a time: receive a message, process it,
//! send the reply. [`TcpTransport`] frames messages on a TCP stream; a request
//! ends at the first `\n` or NUL byte and every reply is terminated with `\n`.
//! Connections are served one after another.

use std::io::{self, BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::panic::{self, AssertUnwindSafe};

use crate::clock::Clock;
use crate::error::ServeError;
use crate::router::{error_reply, CommandRouter, UNKNOWN_PROBLEM_REPLY};

/// Blocking request/reply channel
pub trait Transport {
    /// Wait for the next request
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails irrecoverably.
    fn receive(&mut self) -> io::Result<Vec<u8>>;

    /// Send the reply to the last request
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails irrecoverably.
    fn send(&mut self, reply: &[u8]) -> io::Result<()>;

    /// Whether the last received request is the first one of a new client
    fn is_new_client(&self) -> bool {
        false
    }
}

/// TCP endpoint serving one client connection at a time
#[derive(Debug)]
pub struct TcpTransport {
    listener: TcpListener,
    connection: Option<BufReader<TcpStream>>,
    new_client: bool,
}

impl TcpTransport {
    /// Bind the endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub fn bind(address: impl ToSocketAddrs) -> io::Result<Self> {
        let listener = TcpListener::bind(address)?;
        log::info!("Listening on {}", listener.local_addr()?);
        Ok(Self {
            listener,
            connection: None,
            new_client: false,
        })
    }

    /// Address the endpoint is bound to
    ///
    /// # Errors
    ///
    /// Returns an error if the socket address cannot be queried.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    fn accept(&self) -> io::Result<BufReader<TcpStream>> {
        let (stream, peer) = self.listener.accept()?;
        log::info!("Client connected from {peer}");
        Ok(BufReader::new(stream))
    }
}

/// Accept failures caused by a single client rather than the listener
fn is_transient_accept_error(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
            | io::ErrorKind::TimedOut
    )
}

impl Transport for TcpTransport {
    fn receive(&mut self) -> io::Result<Vec<u8>> {
        let mut new_client = false;
        loop {
            if self.connection.is_none() {
                match self.accept() {
                    Ok(connection) => self.connection = Some(connection),
                    Err(err) if is_transient_accept_error(err.kind()) => {
                        log::warn!("Failed to accept client connection: {err}");
                        continue;
                    }
                    Err(err) => return Err(err),
                }
                new_client = true;
            }
            let Some(connection) = self.connection.as_mut() else {
                continue;
            };
            match read_message(connection) {
                Ok(Some(message)) => {
                    self.new_client = new_client;
                    return Ok(message);
                }
                Ok(None) => log::info!("Client disconnected"),
                Err(err) => log::warn!("Dropping client connection: {err}"),
            }
            self.connection = None;
        }
    }

    fn send(&mut self, reply: &[u8]) -> io::Result<()> {
        let Some(connection) = self.connection.as_mut() else {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "no client"));
        };
        if let Err(err) = write_reply(connection.get_mut(), reply) {
            log::warn!("Failed to send reply, dropping client connection: {err}");
            self.connection = None;
        }
        Ok(())
    }

    fn is_new_client(&self) -> bool {
        self.new_client
    }
}

fn write_reply(stream: &mut TcpStream, reply: &[u8]) -> io::Result<()> {
    stream.write_all(reply)?;
    stream.write_all(b"\n")?;
    stream.flush()
}

/// Read one `\n`- or NUL-terminated message
///
/// Returns `Ok(None)` when the peer closed the stream before sending any byte
/// of a new message. Empty messages between terminators are skipped, so a
/// client sending `"...\0\n"` produces one message.
///
/// # Errors
///
/// Returns an error if reading from the stream fails.
pub fn read_message<R: BufRead>(reader: &mut R) -> io::Result<Option<Vec<u8>>> {
    let mut message = Vec::new();
    loop {
        let available = reader.fill_buf()?;
        if available.is_empty() {
            return Ok((!message.is_empty()).then_some(message));
        }

        if let Some(end) = available.iter().position(|&b| b == b'\n' || b == b'\0') {
            message.extend_from_slice(&available[..end]);
            reader.consume(end + 1);
            if message.is_empty() {
                continue;
            }
            return Ok(Some(message));
        }

        let consumed = available.len();
        message.extend_from_slice(available);
        reader.consume(consumed);
    }
}

/// Serve requests until the transport fails or a fatal error occurs
///
/// A new client always starts on an idle bus. A panic while processing a
/// message is caught and logged, the bus session is reset and the client gets
/// [`UNKNOWN_PROBLEM_REPLY`]. A fatal configuration error is answered with an
/// `ERROR: Fatal: ...` reply and then returned.
///
/// # Errors
///
/// Returns [`ServeError::Transport`] if the transport fails and
/// [`ServeError::Fatal`] if the firmware under test triggered a fatal
/// configuration error.
pub fn serve<T, C>(transport: &mut T, router: &mut CommandRouter<C>) -> Result<(), ServeError>
where
    T: Transport,
    C: Clock,
{
    loop {
        let message = transport.receive()?;
        if transport.is_new_client() {
            router.reset_session();
        }

        let reply = match panic::catch_unwind(AssertUnwindSafe(|| router.process(&message))) {
            Ok(Ok(reply)) => reply,
            Ok(Err(fatal)) => {
                transport.send(error_reply(format_args!("Fatal: {fatal}")).as_bytes())?;
                return Err(fatal.into());
            }
            Err(_) => {
                log::error!(
                    "Internal fault while processing {:?}",
                    String::from_utf8_lossy(&message)
                );
                router.reset_session();
                UNKNOWN_PROBLEM_REPLY.to_owned()
            }
        };

        transport.send(reply.as_bytes())?;
    }
}
