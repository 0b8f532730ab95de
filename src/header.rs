use crate::codec::NAME_LEN;
use crate::error::Error;

/// Entry type, stored as a one-byte tag in the raw record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryType {
    #[default]
    Regular,
    HardLink,
    Symlink,
    CharDevice,
    BlockDevice,
    Directory,
    Fifo,
}

impl EntryType {
    pub(crate) const fn tag(self) -> u8 {
        use EntryType::*;

        match self {
            Regular => b'0',
            HardLink => b'1',
            Symlink => b'2',
            CharDevice => b'3',
            BlockDevice => b'4',
            Directory => b'5',
            Fifo => b'6',
        }
    }

    /// A NUL tag decodes as a regular file, the pre-ustar convention.
    pub(crate) const fn from_tag(tag: u8) -> Option<EntryType> {
        use EntryType::*;

        match tag {
            0 | b'0' => Some(Regular),
            b'1' => Some(HardLink),
            b'2' => Some(Symlink),
            b'3' => Some(CharDevice),
            b'4' => Some(BlockDevice),
            b'5' => Some(Directory),
            b'6' => Some(Fifo),
            _ => None,
        }
    }
}

/// Semantic view of one archive record header.
///
/// The name and link name are validated at construction to fit their
/// 100-byte fields with a terminator; the numeric fields are plain values
/// and are rendered as octal text only at encode time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TarHeader {
    pub mode: u32,
    pub owner: u32,
    /// Payload size in bytes.
    pub size: u64,
    /// Modification time, POSIX epoch seconds.
    pub mtime: u64,
    pub entry_type: EntryType,
    name: String,
    link_name: String,
}

impl TarHeader {
    pub fn new(name: &str, entry_type: EntryType) -> Result<TarHeader, Error> {
        if name.len() >= NAME_LEN {
            return Err(Error::NameTooLong(name.len()));
        }
        Ok(TarHeader {
            mode: 0,
            owner: 0,
            size: 0,
            mtime: 0,
            entry_type,
            name: name.to_string(),
            link_name: String::new(),
        })
    }

    /// A regular-file header with the historical default mode bits.
    pub fn file(name: &str, size: u64) -> Result<TarHeader, Error> {
        let mut header = TarHeader::new(name, EntryType::Regular)?;
        header.mode = 0o664;
        header.size = size;
        Ok(header)
    }

    /// A directory header with the historical default mode bits.
    pub fn directory(name: &str) -> Result<TarHeader, Error> {
        let mut header = TarHeader::new(name, EntryType::Directory)?;
        header.mode = 0o775;
        Ok(header)
    }

    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline(always)]
    pub fn link_name(&self) -> &str {
        &self.link_name
    }

    pub fn set_link_name(&mut self, link_name: &str) -> Result<(), Error> {
        if link_name.len() >= NAME_LEN {
            return Err(Error::NameTooLong(link_name.len()));
        }
        self.link_name = link_name.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_modes() {
        let file = TarHeader::file("a.txt", 42).unwrap();
        assert_eq!(file.mode, 0o664);
        assert_eq!(file.size, 42);
        assert_eq!(file.entry_type, EntryType::Regular);

        let dir = TarHeader::directory("d").unwrap();
        assert_eq!(dir.mode, 0o775);
        assert_eq!(dir.size, 0);
        assert_eq!(dir.entry_type, EntryType::Directory);
    }

    #[test]
    fn name_length_limit() {
        let long = "x".repeat(100);
        assert!(matches!(
            TarHeader::file(&long, 0),
            Err(Error::NameTooLong(100))
        ));

        // 99 bytes still fits alongside the terminator.
        let just_fits = "x".repeat(99);
        assert!(TarHeader::file(&just_fits, 0).is_ok());

        let mut header = TarHeader::new("link", EntryType::Symlink).unwrap();
        assert!(matches!(
            header.set_link_name(&long),
            Err(Error::NameTooLong(100))
        ));
        header.set_link_name("target").unwrap();
        assert_eq!(header.link_name(), "target");
    }

    #[test]
    fn type_tags() {
        assert_eq!(EntryType::Regular.tag(), b'0');
        assert_eq!(EntryType::Fifo.tag(), b'6');
        assert_eq!(EntryType::from_tag(0), Some(EntryType::Regular));
        assert_eq!(EntryType::from_tag(b'5'), Some(EntryType::Directory));
        assert_eq!(EntryType::from_tag(b'7'), None);
    }
}
