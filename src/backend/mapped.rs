use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use memmap2::{Mmap, MmapMut};

use crate::backend::{Backend, OpenMode};
use crate::error::Error;

/// Memory-mapped backend. The whole file is mapped up front; reads and
/// writes are memory copies at the current position and `seek` is bounds
/// validation only, no I/O.
///
/// Opening fails fast: a file that cannot be sized or mapped never yields a
/// backend, so every live instance has a valid mapping.
#[derive(Debug)]
pub struct MappedBackend {
    file: File,
    map: Mapping,
    pos: u64,
}

#[derive(Debug)]
enum Mapping {
    Read(Mmap),
    Write(MmapMut),
}

impl Mapping {
    fn len(&self) -> u64 {
        match self {
            Mapping::Read(map) => map.len() as u64,
            Mapping::Write(map) => map.len() as u64,
        }
    }

    fn as_slice(&self) -> &[u8] {
        match self {
            Mapping::Read(map) => map,
            Mapping::Write(map) => map,
        }
    }
}

fn page_size() -> u64 {
    let n = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if n <= 0 { 4096 } else { n as u64 }
}

impl MappedBackend {
    pub fn open(path: &Path, mode: OpenMode) -> Result<Self, Error> {
        let open_err = |e: io::Error| Error::Open(e, path.to_path_buf());

        let backend = match mode {
            OpenMode::Read => {
                let file = OpenOptions::new().read(true).open(path).map_err(open_err)?;
                let map = unsafe { Mmap::map(&file) }.map_err(open_err)?;
                MappedBackend {
                    file,
                    map: Mapping::Read(map),
                    pos: 0,
                }
            }
            OpenMode::Write => {
                let file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .open(path)
                    .map_err(open_err)?;

                // Mapping a zero-length region is invalid; size a fresh
                // archive file to one page before mapping it.
                let len = file.metadata().map_err(open_err)?.len();
                if len == 0 {
                    file.set_len(page_size()).map_err(open_err)?;
                }

                let map = unsafe { MmapMut::map_mut(&file) }.map_err(open_err)?;
                MappedBackend {
                    file,
                    map: Mapping::Write(map),
                    pos: 0,
                }
            }
        };

        tracing::debug!(
            path = %path.display(),
            ?mode,
            len = backend.map.len(),
            "mapped archive file"
        );
        Ok(backend)
    }

    /// Borrows `len` bytes of the mapped region starting at `pos`, without
    /// copying. The borrow keeps the mapping alive for as long as the
    /// caller holds the slice.
    pub(crate) fn slice_at(&self, pos: u64, len: u64) -> Result<&[u8], Error> {
        let end = pos.checked_add(len).filter(|e| *e <= self.map.len());
        match end {
            Some(end) => Ok(&self.map.as_slice()[pos as usize..end as usize]),
            None => Err(Error::Read(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "requested range lies outside the mapped region",
            ))),
        }
    }

    /// Grows the file (page-rounded) and remaps so a write landing past the
    /// current region does not fault.
    fn grow(&mut self, required: u64) -> Result<(), Error> {
        if !matches!(self.map, Mapping::Write(_)) {
            return Err(Error::Write(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "archive not opened for writing",
            )));
        }

        let page = page_size();
        let new_len = required.div_ceil(page) * page;
        tracing::debug!(old_len = self.map.len(), new_len, "growing mapped archive");

        self.file.set_len(new_len).map_err(Error::Write)?;
        let map = unsafe { MmapMut::map_mut(&self.file) }.map_err(Error::Write)?;
        self.map = Mapping::Write(map);
        Ok(())
    }
}

impl Backend for MappedBackend {
    fn read(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        let end = self.pos + buf.len() as u64;
        if end > self.map.len() {
            return Err(Error::Read(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "read past the end of the mapped region",
            )));
        }

        buf.copy_from_slice(&self.map.as_slice()[self.pos as usize..end as usize]);
        self.pos = end;
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), Error> {
        let end = self.pos + buf.len() as u64;
        if end > self.map.len() {
            self.grow(end)?;
        }

        match &mut self.map {
            Mapping::Write(map) => {
                map[self.pos as usize..end as usize].copy_from_slice(buf);
                self.pos = end;
                Ok(())
            }
            Mapping::Read(_) => Err(Error::Write(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "archive not opened for writing",
            ))),
        }
    }

    fn seek(&mut self, pos: u64) -> Result<(), Error> {
        if pos > self.map.len() {
            return Err(Error::Seek(io::Error::new(
                io::ErrorKind::InvalidInput,
                "position lies outside the mapped region",
            )));
        }
        self.pos = pos;
        Ok(())
    }

    fn close(self) -> Result<(), Error> {
        if let Mapping::Write(map) = &self.map {
            map.flush().map_err(Error::Write)?;
        }

        // Unmap before the descriptor goes away.
        let MappedBackend { file, map, .. } = self;
        drop(map);
        drop(file);
        Ok(())
    }
}
