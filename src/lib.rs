//! Minimal access library for POSIX ustar-profile tar archives.
//!
//! Archives are sequences of fixed 512-byte records: a header record with
//! octal-text fields and a checksum, followed by the entry's payload padded
//! to the record boundary, terminated by two all-NUL records. Use
//! [`Archive::open`] for buffered stream access, [`Archive::open_mapped`]
//! for memory-mapped zero-copy access, or [`Archive::from_stream`] to drive
//! any `Read + Write + Seek` stream. Both backends share the same record
//! engine.
//!
//! Not supported: compression, sparse files, GNU/PAX long-name extensions
//! and multi-volume archives.

mod archive;
mod backend;
pub mod codec;
mod cursor;
mod error;
mod header;

#[cfg(unix)]
pub use archive::MappedArchive;
pub use archive::{Archive, Entries, StreamArchive};
#[cfg(unix)]
pub use backend::MappedBackend;
pub use backend::{Backend, OpenMode, StreamBackend};
pub use error::Error;
pub use header::{EntryType, TarHeader};
