//! `std::io::Read` byte source.
//!
//! Feeds the control loop from anything readable: a host serial port,
//! a TCP bridge, a captured byte log.  I/O errors are split into link
//! loss (ends the session) and transient failures (loop carries on).

use std::io::{ErrorKind, Read};

use log::{debug, warn};

use crate::app::ports::ByteSource;
use crate::error::SourceError;

/// [`ByteSource`] over any `std::io::Read`.
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: Read> ReaderSource<R> {
    /// Wrap `reader`.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Give the reader back.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

/// Classify an I/O error kind.
pub fn classify(kind: ErrorKind) -> SourceError {
    match kind {
        ErrorKind::UnexpectedEof
        | ErrorKind::BrokenPipe
        | ErrorKind::NotConnected
        | ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted => SourceError::LinkLost,
        _ => SourceError::Transient,
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn read_byte(&mut self) -> Result<u8, SourceError> {
        let mut buf = [0u8; 1];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => {
                    debug!("reader: end of stream");
                    return Err(SourceError::LinkLost);
                }
                Ok(_) => return Ok(buf[0]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    let err = classify(e.kind());
                    warn!("reader: {} ({})", e, err);
                    return Err(err);
                }
            }
        }
    }
}
