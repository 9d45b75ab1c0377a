//! Per-call key acquisition for the command line

use crate::error::{CodecError, ErrorKind, Result};
use std::io::{self, IsTerminal, Read, Write};
use zeroize::Zeroizing;

/// Trait for reading a key override from various sources
pub trait KeyReader {
    /// Read a key as arbitrary bytes (not necessarily UTF-8)
    ///
    /// Returns the key wrapped in `Zeroizing` so it is wiped from memory when
    /// dropped.
    fn read_key(&mut self) -> Result<Zeroizing<Vec<u8>>>;
}

/// Returns a fixed key (for testing)
pub struct ConstantKeyReader {
    key: Zeroizing<Vec<u8>>,
}

impl ConstantKeyReader {
    pub fn new(key: Vec<u8>) -> Self {
        Self {
            key: Zeroizing::new(key),
        }
    }
}

impl KeyReader for ConstantKeyReader {
    fn read_key(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        Ok(Zeroizing::new((*self.key).clone()))
    }
}

/// Reads a key from any io::Read source, such as a key file
///
/// One trailing newline (`\n` or `\r\n`) is dropped, since key files are
/// usually written by editors or `echo`.
pub struct ReaderKeyReader {
    reader: Box<dyn Read>,
}

impl ReaderKeyReader {
    pub fn new(reader: Box<dyn Read>) -> Self {
        Self { reader }
    }
}

impl KeyReader for ReaderKeyReader {
    fn read_key(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        let mut data = Zeroizing::new(Vec::new());
        self.reader
            .read_to_end(&mut data)
            .map_err(|e| {
                CodecError::with_source(ErrorKind::KeyUnavailable, "error reading key", e)
            })?;
        if data.ends_with(b"\n") {
            data.pop();
            if data.ends_with(b"\r") {
                data.pop();
            }
        }
        Ok(data)
    }
}

/// Reads a key from the terminal with no echo
#[derive(Default)]
pub struct TerminalKeyReader;

impl TerminalKeyReader {
    pub fn new() -> Self {
        Self
    }
}

impl KeyReader for TerminalKeyReader {
    /// Read key from terminal.
    ///
    /// Terminal input is limited to UTF-8 due to rpassword. Use a key file
    /// for other byte sequences.
    fn read_key(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        if !io::stdin().is_terminal() {
            return Err(CodecError::new(
                ErrorKind::KeyUnavailable,
                "cannot read key from terminal - stdin is not a terminal",
            ));
        }

        let mut stderr = io::stderr();
        stderr
            .write_all(b"Key (sodiumbox): ")
            .and_then(|()| stderr.flush())
            .map_err(|e| CodecError::with_source(ErrorKind::Io, "failed to write prompt", e))?;

        // rpassword returns a plain String; move it straight into a zeroizing buffer
        let key = rpassword::read_password().map_err(|e| {
            CodecError::with_source(ErrorKind::KeyUnavailable, "failure reading key", e)
        })?;

        Ok(Zeroizing::new(key.into_bytes()))
    }
}
