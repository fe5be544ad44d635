use derive_more::{Display, From};

pub type Result<T> = anyhow::Result<T, Error>;

#[derive(Debug, From, Display)]
pub enum Error {
    #[display(fmt = "Socket creation error")]
    SocketCreation(std::io::Error),

    #[display(fmt = "Invalid address/ Address not supported")]
    InvalidAddress(String),

    #[display(fmt = "Connection Failed")]
    ConnectionFailed(std::io::Error),

    #[display(fmt = "Send failed")]
    Send(std::io::Error),

    #[display(fmt = "Partial send: {} of {} bytes", sent, expected)]
    PartialSend { sent: usize, expected: usize },

    #[display(fmt = "Receive failed")]
    Receive(std::io::Error),

    #[from]
    #[display(fmt = "I/O error")]
    IO(std::io::Error),
}

impl Error {
    /// Process status reported for any fatal session error.
    pub fn exit_code(&self) -> i32 {
        -1
    }
}

impl std::error::Error for Error {}
