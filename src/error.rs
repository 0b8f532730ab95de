use std::path::PathBuf;

/// Errors produced by archive operations.
///
/// Backend and codec errors propagate unchanged to the caller; there are no
/// retries and no recovery. The single translation point is [`find`], which
/// reports a null record reached during a name scan as [`Error::NotFound`].
///
/// [`find`]: crate::Archive::find
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Could not open archive. Path: '{}'", .1.display())]
    Open(#[source] std::io::Error, PathBuf),

    #[error("Could not read from archive backend.")]
    Read(#[source] std::io::Error),

    #[error("Could not write to archive backend.")]
    Write(#[source] std::io::Error),

    #[error("Could not seek archive backend.")]
    Seek(#[source] std::io::Error),

    #[error("Record checksum mismatch (stored {stored:#o}, computed {computed:#o}).")]
    BadChecksum { stored: u32, computed: u32 },

    /// The record's checksum field starts with a NUL byte. Two consecutive
    /// null records terminate an archive.
    #[error("Null record.")]
    NullRecord,

    #[error("Entry not found in archive.")]
    NotFound,

    /// A header field held something other than the octal text or terminated
    /// string the format requires.
    #[error("Invalid data in header field '{0}'.")]
    InvalidField(&'static str),

    /// Entry names and link names must fit the 100-byte field with a
    /// terminator, so at most 99 bytes.
    #[error("Entry name of {0} bytes exceeds the 99-byte field limit.")]
    NameTooLong(usize),

    #[error("Archive failure: {0}.")]
    Failure(&'static str),
}
