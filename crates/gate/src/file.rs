//! Scoped binary file access.
//!
//! [`ScopedFile`] owns its handle for the duration of one operation. The
//! handle is closed exactly once when the value is dropped, however control
//! leaves the scope; there is no partial-open state to clean up after a
//! failed acquire.

use std::{
    fs::{File, OpenOptions},
    io::{self, Read, Write},
    path::Path,
};

/// The access mode requested from [`ScopedFile::acquire`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Read,
    Write,
}

/// A binary file held open for the duration of one operation.
pub struct ScopedFile {
    file: File,
}

impl ScopedFile {
    /// Open a binary file in the requested mode.
    ///
    /// # Errors
    ///
    /// Returns a [`std::io::Error`] if the file cannot be opened; no resource
    /// is held in that case.
    pub fn acquire(path: &Path, mode: Mode) -> io::Result<ScopedFile> {
        let file = match mode {
            Mode::Read => OpenOptions::new().read(true).open(path)?,
            Mode::Write => OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)?,
        };
        Ok(ScopedFile { file })
    }

    /// Consume the entire remaining content of the file into one buffer.
    ///
    /// # Errors
    ///
    /// Returns a [`std::io::Error`] if reading fails.
    pub fn read_all(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.file.read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Write the entire given buffer to the file.
    ///
    /// # Errors
    ///
    /// Returns a [`std::io::Error`] if the write cannot be completed.
    pub fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.file.write_all(buf)
    }
}
