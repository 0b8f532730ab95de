//! I/O backends for archive storage.

#[cfg(unix)]
mod mapped;
mod stream;

#[cfg(unix)]
pub use mapped::MappedBackend;
pub use stream::StreamBackend;

use crate::error::Error;

/// Access capability requested by an open call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    /// Write access; creates the file when it does not exist.
    Write,
}

/// Byte-transfer capability set the cursor drives.
///
/// Backends keep their own current position (a stream's file offset, the
/// mapped variant's index); the cursor mirrors it and is the single source
/// of truth for record arithmetic. Short transfers are errors: `read` and
/// `write` move exactly `buf.len()` bytes or fail.
pub trait Backend {
    fn read(&mut self, buf: &mut [u8]) -> Result<(), Error>;

    fn write(&mut self, buf: &[u8]) -> Result<(), Error>;

    fn seek(&mut self, pos: u64) -> Result<(), Error>;

    /// Releases the underlying resource. Consumes the backend so a closed
    /// handle cannot be used again.
    fn close(self) -> Result<(), Error>
    where
        Self: Sized;
}
