use std::io::{BufRead, ErrorKind, Write};
use std::net::{Ipv4Addr, Shutdown, SocketAddrV4, TcpStream};

use socket2::{Domain, Protocol, Socket, Type};

use crate::errors::{Error, Result};
use crate::utils::{read_address, receive_once, render_message, send_all};
use crate::{ClientConfig, SessionState, ADDRESS_CAPACITY, GREETING, PROMPT};

/// Turns user text into the IPv4 endpoint to dial.
///
/// Only dotted-quad IPv4 is accepted, and nothing longer than fits in
/// [`ADDRESS_CAPACITY`] including its terminator.
pub fn parse_endpoint(text: &str, port: u16) -> Result<SocketAddrV4> {
    if text.len() >= ADDRESS_CAPACITY {
        return Err(Error::InvalidAddress(text.to_string()));
    }

    let ip: Ipv4Addr = text
        .parse()
        .map_err(|_| Error::InvalidAddress(text.to_string()))?;

    Ok(SocketAddrV4::new(ip, port))
}

pub struct Client {
    pub destination_addr: SocketAddrV4,
    stream: TcpStream,
    status: SessionState,
}

impl Client {
    /// Creates the socket, resolves the endpoint and connects.
    ///
    /// The socket is dropped (and closed) on any failure after creation.
    pub fn connect(addr: &str, config: &ClientConfig) -> Result<Self> {
        let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP)).map_err(|e| {
            log::debug!("socket(): {e}");
            Error::SocketCreation(e)
        })?;

        let destination_addr = parse_endpoint(addr, config.port)?;

        log::info!("Connecting to {destination_addr}");

        let connected = match config.connect_timeout {
            Some(timeout) => socket.connect_timeout(&destination_addr.into(), timeout),
            None => socket.connect(&destination_addr.into()),
        };
        connected.map_err(|e| {
            log::debug!("connect({destination_addr}): {e}");
            Error::ConnectionFailed(e)
        })?;

        socket.set_read_timeout(config.read_timeout)?;
        socket.set_write_timeout(config.write_timeout)?;

        Ok(Client {
            destination_addr,
            stream: socket.into(),
            status: SessionState::Connected,
        })
    }

    pub fn status(&self) -> SessionState {
        self.status
    }

    /// Sends the greeting, reads one reply and closes the connection.
    ///
    /// Progress lines go to `out`. Returns the raw reply bytes.
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<Vec<u8>> {
        let mut response = Vec::new();

        loop {
            log::info!("Status: {:?}", self.status);

            match self.status {
                SessionState::Connected => {
                    send_all(&mut self.stream, GREETING)?;
                    writeln!(out, "Hello message sent")?;
                    self.status = SessionState::GreetingSent;
                }
                SessionState::GreetingSent => {
                    response = receive_once(&mut self.stream)?;
                    writeln!(out, "Message received: {}", render_message(&response))?;
                    out.flush()?;
                    self.status = SessionState::ResponseReceived;
                }
                SessionState::ResponseReceived => self.close(),
                SessionState::Closed => return Ok(response),
            }
        }
    }

    /// Shuts both directions down and marks the session closed.
    ///
    /// The reply has already been printed by now, so a failed shutdown is
    /// only logged. The descriptor itself is released when the client drops.
    pub fn close(&mut self) {
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            if e.kind() == ErrorKind::NotConnected {
                log::warn!("Peer {} already disconnected", self.destination_addr);
            } else {
                log::warn!("Shutdown of {} failed: {e}", self.destination_addr);
            }
        }
        self.status = SessionState::Closed;
    }
}

/// Prompts for the server address on `out`, reads it from `input` and runs
/// one full session against it.
pub fn run_session<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    config: &ClientConfig,
) -> Result<Vec<u8>> {
    write!(out, "{PROMPT}")?;
    out.flush()?;

    let addr = read_address(input)?;

    let mut client = Client::connect(&addr, config)?;
    client.run(out)
}
