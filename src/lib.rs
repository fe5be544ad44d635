use std::time::Duration;

pub mod client;
mod errors;
mod utils;

pub use client::{parse_endpoint, run_session, Client};
pub use errors::{Error, Result};
pub use utils::{read_address, receive_once, render_message, send_all, StreamHandler};

/// Port every session connects to unless overridden in [`ClientConfig`].
pub const SERVER_PORT: u16 = 8080;

/// Capacity of the single response read.
pub const RECV_BUFFER_SIZE: usize = 1024;

/// Room for a dotted-quad address plus its terminator.
pub const ADDRESS_CAPACITY: usize = 16;

pub const GREETING: &[u8] = b"Hello from client";

pub const PROMPT: &str = "Enter server IP address: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    pub port: u16,
    pub connect_timeout: Option<Duration>,
    pub read_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            port: SERVER_PORT,
            connect_timeout: None,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = non_zero(timeout);
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = non_zero(timeout);
        self
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = non_zero(timeout);
        self
    }
}

// std rejects zero-length socket timeouts
fn non_zero(timeout: Duration) -> Option<Duration> {
    (!timeout.is_zero()).then_some(timeout)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connected,
    GreetingSent,
    ResponseReceived,
    Closed,
}
