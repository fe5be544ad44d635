use std::{
    io::{BufRead, ErrorKind, Read, Write},
    net::{SocketAddr, TcpStream},
};

use crate::{
    errors::{Error, Result},
    RECV_BUFFER_SIZE,
};

pub trait StreamHandler {
    fn read_stream(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;
    fn write_stream(&mut self, buf: &[u8]) -> std::io::Result<usize>;
    fn peer_addr(&self) -> std::io::Result<SocketAddr>;
}

impl StreamHandler for TcpStream {
    fn read_stream(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.read(buf)
    }
    fn write_stream(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.write(buf)
    }
    fn peer_addr(&self) -> std::io::Result<SocketAddr> {
        TcpStream::peer_addr(self)
    }
}

fn describe_peer<T: StreamHandler>(stream: &T) -> String {
    stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "<unknown peer>".to_string())
}

/// Writes the whole payload, resuming after short writes.
///
/// A write that returns zero means the peer stopped accepting data and is
/// reported as [`Error::PartialSend`] with the progress made so far.
pub fn send_all<T: StreamHandler>(stream: &mut T, payload: &[u8]) -> Result<usize> {
    let mut sent = 0;

    while sent < payload.len() {
        match stream.write_stream(&payload[sent..]) {
            Ok(0) => {
                return Err(Error::PartialSend {
                    sent,
                    expected: payload.len(),
                })
            }
            Ok(n) => {
                sent += n;
                if sent < payload.len() {
                    log::debug!("Short write: {sent}/{} bytes", payload.len());
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                log::debug!("Write failed after {sent} bytes: {e}");
                return Err(Error::Send(e));
            }
        }
    }

    log::debug!("Written {sent} bytes to addr: {}", describe_peer(stream));

    Ok(sent)
}

/// Performs a single read into a zeroed buffer and returns what arrived.
///
/// Zero bytes is a valid answer (peer closed without replying).
pub fn receive_once<T: StreamHandler>(stream: &mut T) -> Result<Vec<u8>> {
    let mut buf = vec![0; RECV_BUFFER_SIZE];

    let bytes_read = loop {
        match stream.read_stream(&mut buf) {
            Ok(n) => break n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                log::debug!("Read failed: {e}");
                return Err(Error::Receive(e));
            }
        }
    };

    log::debug!("Read {bytes_read} bytes from addr: {}", describe_peer(stream));

    buf.truncate(bytes_read);

    Ok(buf)
}

/// Reads the first whitespace-delimited token, skipping blank lines.
///
/// Returns an empty string on end of input. Nothing is validated here: bytes
/// that are not UTF-8 are carried through lossily and rejected later when the
/// address is parsed.
pub fn read_address<R: BufRead>(input: &mut R) -> Result<String> {
    let mut line = Vec::new();

    loop {
        line.clear();
        if input.read_until(b'\n', &mut line)? == 0 {
            return Ok(String::new());
        }
        if let Some(token) = line
            .split(|b| b.is_ascii_whitespace())
            .find(|token| !token.is_empty())
        {
            return Ok(String::from_utf8_lossy(token).into_owned());
        }
    }
}

/// Renders a response as text, stopping at the first NUL and never reading
/// past the bytes actually received.
pub fn render_message(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    /// In-memory stream that accepts at most `chunk` bytes per write.
    struct ChunkedStream {
        written: Vec<u8>,
        chunk: usize,
        capacity: usize,
        interrupts: usize,
        incoming: Cursor<Vec<u8>>,
    }

    impl ChunkedStream {
        fn new(chunk: usize) -> Self {
            ChunkedStream {
                written: Vec::new(),
                chunk,
                capacity: usize::MAX,
                interrupts: 0,
                incoming: Cursor::new(Vec::new()),
            }
        }
    }

    impl StreamHandler for ChunkedStream {
        fn read_stream(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.interrupts > 0 {
                self.interrupts -= 1;
                return Err(io::ErrorKind::Interrupted.into());
            }
            self.incoming.read(buf)
        }
        fn write_stream(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.interrupts > 0 {
                self.interrupts -= 1;
                return Err(io::ErrorKind::Interrupted.into());
            }
            let room = self.capacity.saturating_sub(self.written.len());
            let n = buf.len().min(self.chunk).min(room);
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }
        fn peer_addr(&self) -> io::Result<SocketAddr> {
            Err(io::ErrorKind::NotConnected.into())
        }
    }

    #[test]
    fn send_all_resumes_after_short_writes() {
        let mut stream = ChunkedStream::new(4);
        stream.interrupts = 1;

        let sent = send_all(&mut stream, b"Hello from client").unwrap();

        assert_eq!(sent, 17);
        assert_eq!(stream.written, b"Hello from client");
    }

    #[test]
    fn send_all_reports_partial_transfer() {
        let mut stream = ChunkedStream::new(4);
        stream.capacity = 6;

        match send_all(&mut stream, b"Hello from client") {
            Err(Error::PartialSend { sent, expected }) => {
                assert_eq!(sent, 6);
                assert_eq!(expected, 17);
            }
            other => panic!("expected partial send, got {other:?}"),
        }
    }

    #[test]
    fn receive_once_reads_a_single_chunk() {
        let mut stream = ChunkedStream::new(4);
        stream.interrupts = 2;
        stream.incoming = Cursor::new(vec![b'x'; RECV_BUFFER_SIZE + 10]);

        let received = receive_once(&mut stream).unwrap();

        assert_eq!(received.len(), RECV_BUFFER_SIZE);
    }

    #[test]
    fn receive_once_accepts_empty_reply() {
        let mut stream = ChunkedStream::new(4);
        assert!(receive_once(&mut stream).unwrap().is_empty());
    }

    #[test]
    fn read_address_takes_first_token() {
        let mut input = Cursor::new("\n   \n  10.0.0.7 trailing words\n");
        assert_eq!(read_address(&mut input).unwrap(), "10.0.0.7");
    }

    #[test]
    fn read_address_passes_non_utf8_through() {
        let mut input = Cursor::new(vec![b'\t', 0xff, b'1', b' ', b'x', b'\n']);
        assert_eq!(read_address(&mut input).unwrap(), "\u{fffd}1");
    }

    #[test]
    fn read_address_on_eof_is_empty() {
        let mut input = Cursor::new("");
        assert_eq!(read_address(&mut input).unwrap(), "");
    }

    #[test]
    fn render_message_stops_at_nul() {
        assert_eq!(render_message(b"pong\0garbage"), "pong");
        assert_eq!(render_message(b""), "");
    }

    #[test]
    fn render_message_is_bounded_without_terminator() {
        let full = vec![b'a'; RECV_BUFFER_SIZE];
        assert_eq!(render_message(&full).len(), RECV_BUFFER_SIZE);
        assert_eq!(render_message(&[0xff, b'o', b'k']), "\u{fffd}ok");
    }
}
