use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::backend::{Backend, OpenMode};
use crate::error::Error;

/// Backend over any seekable byte stream.
///
/// Files are the common case; tests and embedded callers drive it with
/// `std::io::Cursor` over an in-memory buffer.
#[derive(Debug)]
pub struct StreamBackend<S> {
    stream: S,
}

impl StreamBackend<std::fs::File> {
    /// Opens `path` in binary mode with the requested capability. Write
    /// access truncates, matching the append-only archive write model.
    pub fn open(path: &Path, mode: OpenMode) -> Result<Self, Error> {
        let file = match mode {
            OpenMode::Read => OpenOptions::new().read(true).open(path),
            OpenMode::Write => OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path),
        }
        .map_err(|e| Error::Open(e, path.to_path_buf()))?;

        Ok(StreamBackend { stream: file })
    }
}

impl<S> StreamBackend<S> {
    pub fn new(stream: S) -> Self {
        StreamBackend { stream }
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S: Read + Write + Seek> Backend for StreamBackend<S> {
    fn read(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        self.stream.read_exact(buf).map_err(Error::Read)
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), Error> {
        self.stream.write_all(buf).map_err(Error::Write)
    }

    fn seek(&mut self, pos: u64) -> Result<(), Error> {
        self.stream
            .seek(SeekFrom::Start(pos))
            .map(drop)
            .map_err(Error::Seek)
    }

    fn close(mut self) -> Result<(), Error> {
        self.stream.flush().map_err(Error::Write)
    }
}
