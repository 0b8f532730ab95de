//! Archive cursor: position tracking and the streaming state machine.

use crate::backend::Backend;
use crate::codec::{self, RECORD_SIZE};
use crate::error::Error;
use crate::header::TarHeader;

fn round_up(n: u64, incr: u64) -> u64 {
    n + (incr - n % incr) % incr
}

/// Drives header and data transfer on top of a backend.
///
/// `pos` is the authoritative byte position for record arithmetic;
/// `last_header` is the offset of the most recently read or expected header;
/// `remaining` is non-zero exactly while a data stream for one entry is in
/// progress.
#[derive(Debug)]
pub(crate) struct Cursor<B> {
    backend: B,
    pos: u64,
    last_header: u64,
    remaining: u64,
}

impl<B: Backend> Cursor<B> {
    pub(crate) fn new(backend: B) -> Self {
        Cursor {
            backend,
            pos: 0,
            last_header: 0,
            remaining: 0,
        }
    }

    pub(crate) fn backend(&self) -> &B {
        &self.backend
    }

    pub(crate) fn into_backend(self) -> B {
        self.backend
    }

    pub(crate) fn position(&self) -> u64 {
        self.pos
    }

    /// Repositions the backend. The tracked position follows the request
    /// even when the backend refuses it; the caller decides what the error
    /// means.
    pub(crate) fn seek(&mut self, pos: u64) -> Result<(), Error> {
        let res = self.backend.seek(pos);
        self.pos = pos;
        res
    }

    pub(crate) fn rewind(&mut self) -> Result<(), Error> {
        self.remaining = 0;
        self.last_header = 0;
        self.seek(0)
    }

    fn read_raw(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        let res = self.backend.read(buf);
        self.pos += buf.len() as u64;
        res
    }

    fn write_raw(&mut self, buf: &[u8]) -> Result<(), Error> {
        let res = self.backend.write(buf);
        self.pos += buf.len() as u64;
        res
    }

    /// Reads and decodes the header at the current position without
    /// consuming it: the cursor seeks straight back so header inspection
    /// never advances past the record.
    pub(crate) fn read_header(&mut self) -> Result<TarHeader, Error> {
        self.last_header = self.pos;

        let mut raw = [0u8; RECORD_SIZE];
        self.read_raw(&mut raw)?;
        self.seek(self.last_header)?;

        codec::decode(&raw)
    }

    /// Skips over the record at the current position and its padded
    /// payload, landing on the next record boundary (or the terminator).
    pub(crate) fn next(&mut self) -> Result<(), Error> {
        let header = self.read_header()?;
        let skip = round_up(header.size, RECORD_SIZE as u64) + RECORD_SIZE as u64;
        self.seek(self.pos + skip)
    }

    /// Linear scan for an exact name match from the start of the archive.
    /// Reaching the terminator without a match is reported as `NotFound`.
    pub(crate) fn find(&mut self, name: &str) -> Result<TarHeader, Error> {
        self.rewind()?;

        loop {
            let header = match self.read_header() {
                Ok(header) => header,
                Err(Error::NullRecord) => return Err(Error::NotFound),
                Err(e) => return Err(e),
            };

            if header.name() == name {
                tracing::debug!(name, pos = self.pos, "found archive entry");
                return Ok(header);
            }
            self.next()?;
        }
    }

    /// Streams payload bytes out of the current entry.
    ///
    /// The first call arms the stream: it reads the header for the payload
    /// size and seeks past the header record. When the stream drains to
    /// zero the cursor seeks back to the header so header-level operations
    /// compose again. Callers must consume exactly the declared size across
    /// their calls.
    pub(crate) fn read_data(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        if self.remaining == 0 {
            let header = self.read_header()?;
            self.seek(self.pos + RECORD_SIZE as u64)?;
            self.remaining = header.size;
        }

        if buf.len() as u64 > self.remaining {
            return Err(Error::Failure("read size exceeds the entry's remaining data"));
        }

        self.read_raw(buf)?;
        self.remaining -= buf.len() as u64;

        if self.remaining == 0 {
            return self.seek(self.last_header);
        }
        Ok(())
    }

    /// Writes a header record and arms the data stream with its declared
    /// size.
    pub(crate) fn write_header(&mut self, header: &TarHeader) -> Result<(), Error> {
        let raw = codec::encode(header);
        self.remaining = header.size;
        self.write_raw(&raw)
    }

    /// Streams payload bytes into the current entry. Writing the last byte
    /// pads the payload block with NULs up to the 512-byte boundary.
    pub(crate) fn write_data(&mut self, buf: &[u8]) -> Result<(), Error> {
        if buf.len() as u64 > self.remaining {
            return Err(Error::Failure("write size exceeds the declared entry size"));
        }

        self.write_raw(buf)?;
        self.remaining -= buf.len() as u64;

        if self.remaining == 0 {
            let padding = round_up(self.pos, RECORD_SIZE as u64) - self.pos;
            return self.write_zeroes(padding as usize);
        }
        Ok(())
    }

    pub(crate) fn write_file_header(&mut self, name: &str, size: u64) -> Result<(), Error> {
        self.write_header(&TarHeader::file(name, size)?)
    }

    pub(crate) fn write_dir_header(&mut self, name: &str) -> Result<(), Error> {
        self.write_header(&TarHeader::directory(name)?)
    }

    /// Writes the archive terminator: two all-NUL records. Must be the last
    /// write before close.
    pub(crate) fn finalize(&mut self) -> Result<(), Error> {
        tracing::debug!(pos = self.pos, "finalizing archive");
        self.write_zeroes(RECORD_SIZE * 2)
    }

    fn write_zeroes(&mut self, n: usize) -> Result<(), Error> {
        const ZEROES: [u8; RECORD_SIZE] = [0; RECORD_SIZE];

        let mut left = n;
        while left > 0 {
            let chunk = left.min(RECORD_SIZE);
            self.write_raw(&ZEROES[..chunk])?;
            left -= chunk;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::round_up;

    #[test]
    fn round_up_to_record_boundary() {
        assert_eq!(round_up(0, 512), 0);
        assert_eq!(round_up(1, 512), 512);
        assert_eq!(round_up(511, 512), 512);
        assert_eq!(round_up(512, 512), 512);
        assert_eq!(round_up(513, 512), 1024);
    }
}
