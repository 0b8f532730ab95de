//! Sans-IO codec for the fixed 512-byte archive record.
//!
//! These functions work on byte arrays without any I/O traits; the cursor
//! layers them over a backend. The raw layout is the classic tar record:
//! name(100) mode(8) owner(8) group(8) size(12) mtime(12) checksum(8)
//! type(1) linkname(100), zero-padded to 512 bytes. The numeric subfields
//! hold NUL/space-terminated octal text.

use std::ops::Range;

use crate::error::Error;
use crate::header::{EntryType, TarHeader};

/// Size of one raw record, the fundamental unit of the format.
pub const RECORD_SIZE: usize = 512;

/// Width of the name and linkname fields, terminator included.
pub(crate) const NAME_LEN: usize = 100;

const NAME: Range<usize> = 0..100;
const MODE: Range<usize> = 100..108;
const OWNER: Range<usize> = 108..116;
const SIZE: Range<usize> = 124..136;
const MTIME: Range<usize> = 136..148;
const CHECKSUM: Range<usize> = 148..156;
const TYPE: usize = 156;
const LINKNAME: Range<usize> = 157..257;

/// Record checksum: 256 plus the sum of every record byte outside the
/// checksum subfield. The 256 offset stands in for the checksum field read
/// as eight spaces, the historical tar convention.
fn checksum(raw: &[u8; RECORD_SIZE]) -> u32 {
    let head = raw[..CHECKSUM.start].iter();
    let tail = raw[CHECKSUM.end..].iter();
    head.chain(tail).fold(256u32, |acc, b| acc + u32::from(*b))
}

/// Parse an octal text subfield: leading spaces skipped, digits up to the
/// first NUL or space. A field with no digits at all is invalid.
fn parse_octal(field: &[u8], name: &'static str) -> Result<u64, Error> {
    let mut value = 0u64;
    let mut seen_digit = false;

    for &byte in field.iter().skip_while(|b| **b == b' ') {
        match byte {
            b'0'..=b'7' => {
                value = value * 8 + u64::from(byte - b'0');
                seen_digit = true;
            }
            b'\0' | b' ' => break,
            _ => return Err(Error::InvalidField(name)),
        }
    }

    if !seen_digit {
        return Err(Error::InvalidField(name));
    }
    Ok(value)
}

/// Parse a NUL-terminated text subfield. The terminator is required: a name
/// filling the whole field would have exceeded the 99-byte limit.
fn parse_text<'a>(field: &'a [u8], name: &'static str) -> Result<&'a str, Error> {
    let end = field
        .iter()
        .position(|b| *b == 0)
        .ok_or(Error::InvalidField(name))?;
    std::str::from_utf8(&field[..end]).map_err(|_| Error::InvalidField(name))
}

/// Write octal digits into a subfield, leaving at least one terminator byte.
/// A value too wide for the field is clamped to the largest encodable one.
fn write_octal(field: &mut [u8], value: u64) {
    let digits = format!("{:o}", value);
    let capacity = field.len() - 1;
    if digits.len() > capacity {
        field[..capacity].fill(b'7');
    } else {
        field[..digits.len()].copy_from_slice(digits.as_bytes());
    }
}

/// Decode one raw record into a header.
///
/// A record whose checksum subfield starts with NUL is reported as
/// [`Error::NullRecord`]; a checksum mismatch as [`Error::BadChecksum`].
/// Field parse failures identify the offending field.
pub fn decode(raw: &[u8; RECORD_SIZE]) -> Result<TarHeader, Error> {
    if raw[CHECKSUM.start] == 0 {
        return Err(Error::NullRecord);
    }

    let computed = checksum(raw);
    let stored = parse_octal(&raw[CHECKSUM], "checksum")? as u32;
    if computed != stored {
        return Err(Error::BadChecksum { stored, computed });
    }

    let entry_type = EntryType::from_tag(raw[TYPE]).ok_or(Error::InvalidField("type"))?;
    let mut header = TarHeader::new(parse_text(&raw[NAME], "name")?, entry_type)?;
    header.mode = parse_octal(&raw[MODE], "mode")? as u32;
    header.owner = parse_octal(&raw[OWNER], "owner")? as u32;
    header.size = parse_octal(&raw[SIZE], "size")?;
    header.mtime = parse_octal(&raw[MTIME], "mtime")?;
    header.set_link_name(parse_text(&raw[LINKNAME], "linkname")?)?;

    Ok(header)
}

/// Encode a header into one raw record.
///
/// The checksum subfield is written as six zero-padded octal digits, a NUL
/// and a space, the historical layout. Encoding is infallible: names were
/// validated when the header was built, and oversized numeric values are
/// clamped by [`write_octal`].
pub fn encode(header: &TarHeader) -> [u8; RECORD_SIZE] {
    let mut raw = [0u8; RECORD_SIZE];

    raw[..header.name().len()].copy_from_slice(header.name().as_bytes());
    write_octal(&mut raw[MODE], u64::from(header.mode));
    write_octal(&mut raw[OWNER], u64::from(header.owner));
    write_octal(&mut raw[SIZE], header.size);
    write_octal(&mut raw[MTIME], header.mtime);
    raw[TYPE] = header.entry_type.tag();
    raw[LINKNAME.start..LINKNAME.start + header.link_name().len()]
        .copy_from_slice(header.link_name().as_bytes());

    let sum = checksum(&raw);
    let digits = format!("{:06o}", sum);
    raw[CHECKSUM.start..CHECKSUM.start + 6].copy_from_slice(digits.as_bytes());
    raw[CHECKSUM.start + 7] = b' ';

    raw
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> TarHeader {
        let mut header = TarHeader::file("docs/readme.txt", 1234).unwrap();
        header.owner = 1000;
        header.mtime = 1_700_000_000;
        header
    }

    #[test]
    fn round_trip() {
        let header = sample_header();
        let raw = encode(&header);
        let decoded = decode(&raw).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn round_trip_link() {
        let mut header = TarHeader::new("alias", EntryType::Symlink).unwrap();
        header.set_link_name("docs/readme.txt").unwrap();
        header.mode = 0o777;
        let decoded = decode(&encode(&header)).unwrap();
        assert_eq!(decoded.link_name(), "docs/readme.txt");
        assert_eq!(decoded.entry_type, EntryType::Symlink);
    }

    #[test]
    fn checksum_layout() {
        let raw = encode(&sample_header());
        // Six octal digits, NUL, space.
        assert!(raw[148..154].iter().all(|b| (b'0'..=b'7').contains(b)));
        assert_eq!(raw[154], 0);
        assert_eq!(raw[155], b' ');
    }

    #[test]
    fn checksum_sensitivity() {
        let raw = encode(&sample_header());
        let positions = (0..CHECKSUM.start).chain(CHECKSUM.end..RECORD_SIZE);
        for pos in positions {
            let mut corrupted = raw;
            corrupted[pos] ^= 0x55;
            assert!(
                matches!(decode(&corrupted), Err(Error::BadChecksum { .. })),
                "flip at byte {} was not caught",
                pos
            );
        }
    }

    #[test]
    fn sentinel_record() {
        let raw = [0u8; RECORD_SIZE];
        assert!(matches!(decode(&raw), Err(Error::NullRecord)));

        // The sentinel test is only the first checksum byte; the rest of the
        // record does not matter.
        let mut garbage = [0xAAu8; RECORD_SIZE];
        garbage[CHECKSUM.start] = 0;
        assert!(matches!(decode(&garbage), Err(Error::NullRecord)));
    }

    #[test]
    fn octal_leading_spaces() {
        assert_eq!(parse_octal(b"  644\0", "mode").unwrap(), 0o644);
        assert_eq!(parse_octal(b"0\0\0\0", "mode").unwrap(), 0);
        assert_eq!(parse_octal(b"777 ", "mode").unwrap(), 0o777);
    }

    #[test]
    fn octal_rejects_non_digits() {
        assert!(matches!(
            parse_octal(b"12x4\0\0", "size"),
            Err(Error::InvalidField("size"))
        ));
        assert!(matches!(
            parse_octal(b"\0\0\0\0", "mtime"),
            Err(Error::InvalidField("mtime"))
        ));
    }

    #[test]
    fn octal_clamps_oversized_values() {
        let mut field = [0u8; 8];
        write_octal(&mut field, u64::MAX);
        assert_eq!(&field, b"7777777\0");
    }

    #[test]
    fn unterminated_name_rejected() {
        let mut raw = encode(&sample_header());
        raw[NAME].fill(b'a');
        // Recompute so the failure is the field, not the checksum.
        let sum = checksum(&raw);
        let digits = format!("{:06o}", sum);
        raw[CHECKSUM.start..CHECKSUM.start + 6].copy_from_slice(digits.as_bytes());
        assert!(matches!(decode(&raw), Err(Error::InvalidField("name"))));
    }

    #[test]
    fn unknown_type_tag_rejected() {
        let mut raw = encode(&sample_header());
        raw[TYPE] = b'9';
        let sum = checksum(&raw);
        let digits = format!("{:06o}", sum);
        raw[CHECKSUM.start..CHECKSUM.start + 6].copy_from_slice(digits.as_bytes());
        assert!(matches!(decode(&raw), Err(Error::InvalidField("type"))));
    }
}
