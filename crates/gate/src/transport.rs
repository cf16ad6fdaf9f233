//! Transport capability between the message gate and the remote client.
//!
//! This module defines the [`Transport`] trait representing the channel over
//! which raw message bytes are exchanged with a debugger client, and provides
//! [`FramedTransport`], an implementation of this trait for arbitrary
//! read/write streams using the debug-adapter wire framing: a
//! `Content-Length` header, a blank separator line, then the message body.

use std::{
    io::{BufRead, BufReader, BufWriter, Write},
    net::TcpStream,
};

/// The capability the gates use to exchange raw message bytes.
///
/// The gates never open or destroy the channel; the strongest action they may
/// take is to command it to close. Closing is one-way: once closed, `input`
/// reports no data and `output` refuses the write.
pub trait Transport {
    /// Deliver the next raw message buffer, or `None` when the stream has
    /// ended or can no longer be read.
    fn input(&mut self) -> Option<Vec<u8>>;

    /// Write one serialized message. Returns whether the write succeeded.
    fn output(&mut self, buf: &[u8]) -> bool;

    /// Command the channel to close. Idempotent.
    fn close(&mut self);

    /// Whether the channel has been commanded to close.
    ///
    /// The gate collapses every failure into an absent result, so a caller
    /// that needs to tell protocol corruption apart from ordinary stream end
    /// inspects the transport state instead.
    fn is_closed(&self) -> bool;
}

/// A [`Transport`] over arbitrary read/write streams using `Content-Length`
/// framing.
pub struct FramedTransport<R, W>
where
    R: BufRead,
    W: Write,
{
    input: R,
    output: BufWriter<W>,
    closed: bool,
}

impl<R, W> FramedTransport<R, W>
where
    R: BufRead,
    W: Write,
{
    /// Construct a transport from the given input reader and output writer.
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output: BufWriter::new(output),
            closed: false,
        }
    }
}

impl FramedTransport<BufReader<TcpStream>, TcpStream> {
    /// Wrap both directions of a TCP stream.
    ///
    /// # Errors
    ///
    /// Returns a [`std::io::Error`] if the stream handle cannot be cloned for
    /// the read side.
    pub fn from_tcp(stream: TcpStream) -> std::io::Result<Self> {
        let reader = BufReader::new(stream.try_clone()?);
        Ok(Self::new(reader, stream))
    }
}

impl<R, W> Transport for FramedTransport<R, W>
where
    R: BufRead,
    W: Write,
{
    fn input(&mut self) -> Option<Vec<u8>> {
        if self.closed {
            return None;
        }
        let mut hdr = String::new();
        loop {
            // Read the header.
            hdr.clear();
            match self.input.read_line(&mut hdr) {
                Ok(0) => {
                    log::info!("EOF from client: no more messages.");
                    return None;
                }
                Ok(_) => (),
                Err(e) => {
                    log::error!("Read error while waiting for a header: {e}");
                    return None;
                }
            };

            // The header is of the form:
            //
            // Content-Length: <len>
            let spl: Vec<&str> = hdr.trim_end().split(':').collect();
            if spl.len() != 2 {
                log::error!("Unexpected header format: got {hdr}");
                continue;
            }

            let len: usize = match spl[0] {
                "Content-Length" => match spl[1].trim().parse() {
                    Ok(val) => val,
                    Err(_) => {
                        log::error!("Error parsing header length: got {hdr}");
                        continue;
                    }
                },
                _ => {
                    log::error!("Expected 'Content-Length' header; got {hdr}");
                    continue;
                }
            };

            // Read the separator.
            match self.input.read_line(&mut hdr) {
                Ok(0) => {
                    log::info!("EOF from client: no more messages.");
                    return None;
                }
                Ok(_) => (),
                Err(e) => {
                    log::error!("Read error while waiting for the separator: {e}");
                    return None;
                }
            }

            // Read the message body.
            let mut buf = vec![0; len];
            match self.input.read_exact(&mut buf) {
                Ok(()) => return Some(buf),
                Err(e) => {
                    log::error!("Read error in a message body: {e}");
                    return None;
                }
            };
        }
    }

    fn output(&mut self, buf: &[u8]) -> bool {
        if self.closed {
            return false;
        }
        let len = buf.len();
        let header = format!("Content-Length: {len}\r\n\r\n");
        let result = self
            .output
            .write_all(header.as_bytes())
            .and_then(|()| self.output.write_all(buf))
            .and_then(|()| self.output.flush());
        match result {
            Ok(()) => true,
            Err(e) => {
                log::error!("Write error: {e}");
                false
            }
        }
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
