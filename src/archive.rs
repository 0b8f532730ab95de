//! Public archive handle: one backend bound to one cursor.

use std::io::{Read, Seek, Write};
use std::path::Path;

#[cfg(unix)]
use crate::backend::MappedBackend;
use crate::backend::{Backend, OpenMode, StreamBackend};
use crate::codec::RECORD_SIZE;
use crate::cursor::Cursor;
use crate::error::Error;
use crate::header::TarHeader;

/// Handle over one archive.
///
/// The backend variant is chosen by the opening call: [`Archive::open`] for
/// buffered stream access, [`Archive::open_mapped`] for memory-mapped
/// zero-copy access, [`Archive::from_stream`] for any in-memory or custom
/// stream. At most one handle should drive a given file at a time.
#[derive(Debug)]
pub struct Archive<B> {
    cursor: Cursor<B>,
}

/// Archive over a file stream.
pub type StreamArchive = Archive<StreamBackend<std::fs::File>>;

/// Archive over a memory-mapped file.
#[cfg(unix)]
pub type MappedArchive = Archive<MappedBackend>;

impl StreamArchive {
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<StreamArchive, Error> {
        let backend = StreamBackend::open(path.as_ref(), mode)?;
        tracing::debug!(path = %path.as_ref().display(), ?mode, "opened stream archive");
        Ok(Archive {
            cursor: Cursor::new(backend),
        })
    }
}

impl<S: Read + Write + Seek> Archive<StreamBackend<S>> {
    /// Wraps an already-open stream, e.g. an `io::Cursor` over a buffer.
    pub fn from_stream(stream: S) -> Archive<StreamBackend<S>> {
        Archive {
            cursor: Cursor::new(StreamBackend::new(stream)),
        }
    }

    /// Unwraps the underlying stream without the close bookkeeping.
    pub fn into_stream(self) -> S {
        self.cursor.into_backend().into_inner()
    }
}

#[cfg(unix)]
impl MappedArchive {
    /// Opens `path` through the memory-mapped backend.
    ///
    /// The first header is read to validate the archive; a null record is
    /// tolerated since a freshly created archive simply has no entries yet.
    /// Any sizing, mapping or validation failure fails the open — no handle
    /// with an absent mapping is ever returned.
    pub fn open_mapped<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<MappedArchive, Error> {
        let backend = MappedBackend::open(path.as_ref(), mode)?;
        let mut archive = Archive {
            cursor: Cursor::new(backend),
        };

        match archive.cursor.read_header() {
            Ok(_) | Err(Error::NullRecord) => {}
            Err(e) => return Err(e),
        }
        archive.cursor.rewind()?;

        tracing::debug!(path = %path.as_ref().display(), ?mode, "opened mapped archive");
        Ok(archive)
    }

    /// Borrows the payload of the entry at the current position straight
    /// out of the mapped region, without copying.
    pub fn payload(&mut self) -> Result<&[u8], Error> {
        let header = self.cursor.read_header()?;
        let start = self.cursor.position() + RECORD_SIZE as u64;
        self.cursor.backend().slice_at(start, header.size)
    }

    /// Finds `name` and borrows its payload without copying.
    pub fn entry_data(&mut self, name: &str) -> Result<&[u8], Error> {
        self.cursor.find(name)?;
        self.payload()
    }
}

impl<B: Backend> Archive<B> {
    /// Releases the backend's underlying resource.
    pub fn close(self) -> Result<(), Error> {
        self.cursor.into_backend().close()
    }

    pub fn seek(&mut self, pos: u64) -> Result<(), Error> {
        self.cursor.seek(pos)
    }

    pub fn rewind(&mut self) -> Result<(), Error> {
        self.cursor.rewind()
    }

    /// Reads the header at the current position without advancing past it.
    pub fn read_header(&mut self) -> Result<TarHeader, Error> {
        self.cursor.read_header()
    }

    /// Advances to the next record boundary.
    pub fn next(&mut self) -> Result<(), Error> {
        self.cursor.next()
    }

    /// Looks an entry up by exact name, scanning from the start.
    pub fn find(&mut self, name: &str) -> Result<TarHeader, Error> {
        self.cursor.find(name)
    }

    /// Reads payload bytes of the current entry; see the caller contract on
    /// the cursor's streaming model: consecutive reads must total exactly
    /// the header's declared size.
    pub fn read_data(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        self.cursor.read_data(buf)
    }

    pub fn write_header(&mut self, header: &TarHeader) -> Result<(), Error> {
        self.cursor.write_header(header)
    }

    /// Writes payload bytes for the entry whose header was just written;
    /// the final write pads the payload block to the 512-byte boundary.
    pub fn write_data(&mut self, buf: &[u8]) -> Result<(), Error> {
        self.cursor.write_data(buf)
    }

    pub fn write_file_header(&mut self, name: &str, size: u64) -> Result<(), Error> {
        self.cursor.write_file_header(name, size)
    }

    pub fn write_dir_header(&mut self, name: &str) -> Result<(), Error> {
        self.cursor.write_dir_header(name)
    }

    /// Writes the two-record archive terminator.
    pub fn finalize(&mut self) -> Result<(), Error> {
        self.cursor.finalize()
    }

    /// Iterates the archive's headers from the start, in write order.
    pub fn entries(&mut self) -> Result<Entries<'_, B>, Error> {
        self.rewind()?;
        Ok(Entries {
            archive: self,
            done: false,
        })
    }
}

/// Forward iterator over archive headers, ending at the terminator.
pub struct Entries<'a, B> {
    archive: &'a mut Archive<B>,
    done: bool,
}

impl<B: Backend> Iterator for Entries<'_, B> {
    type Item = Result<TarHeader, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let header = match self.archive.read_header() {
            Ok(header) => header,
            Err(Error::NullRecord) => {
                self.done = true;
                return None;
            }
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };

        if let Err(e) = self.archive.next() {
            self.done = true;
            return Some(Err(e));
        }
        Some(Ok(header))
    }
}
