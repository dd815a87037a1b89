use byyte::be::{get_u16, get_u32};

use crate::error::{ErrorKind, require};

pub const PALMDOC_HEADER_LEN: usize = 16;

/// Compression schemes this crate can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Records are stored as-is.
    Stored,
    PalmDoc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PalmDOCHeader {
    pub compression: u16,
    pub text_length: u32,
    pub record_count: u16,
    pub record_size: u16,
    pub encryption_type: u16,
}

impl PalmDOCHeader {
    /// Decodes the first 16 bytes of record 0.
    pub fn parse(data: &[u8]) -> Result<Self, ErrorKind> {
        require(data, PALMDOC_HEADER_LEN)?;

        Ok(PalmDOCHeader {
            compression: get_u16(data, 0)?,
            text_length: get_u32(data, 4)?,
            record_count: get_u16(data, 8)?,
            record_size: get_u16(data, 10)?,
            encryption_type: get_u16(data, 12)?,
        })
    }

    pub fn compression(&self) -> Option<Compression> {
        match self.compression {
            1 => Some(Compression::Stored),
            2 => Some(Compression::PalmDoc),
            _ => None,
        }
    }

    /// Fails unless the text is unencrypted and uses a supported compression.
    pub fn check_supported(&self) -> Result<Compression, ErrorKind> {
        match self.compression() {
            Some(compression) if self.encryption_type == 0 => Ok(compression),
            _ => Err(ErrorKind::UnsupportedEncoding {
                compression: self.compression,
                encryption: self.encryption_type,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(compression: u16, encryption: u16) -> [u8; 16] {
        let mut data = [0u8; 16];
        data[0..2].copy_from_slice(&compression.to_be_bytes());
        data[2..4].copy_from_slice(&[0xde, 0xad]);
        data[4..8].copy_from_slice(&10_000u32.to_be_bytes());
        data[8..10].copy_from_slice(&3u16.to_be_bytes());
        data[10..12].copy_from_slice(&4096u16.to_be_bytes());
        data[12..14].copy_from_slice(&encryption.to_be_bytes());
        data[14..16].copy_from_slice(&[0xbe, 0xef]);
        data
    }

    #[test]
    fn parses_fields() {
        let header = PalmDOCHeader::parse(&header(2, 0)).unwrap();
        assert_eq!(
            header,
            PalmDOCHeader {
                compression: 2,
                text_length: 10_000,
                record_count: 3,
                record_size: 4096,
                encryption_type: 0,
            }
        );
        assert_eq!(header.check_supported().unwrap(), Compression::PalmDoc);
    }

    #[test]
    fn stored_records() {
        let header = PalmDOCHeader::parse(&header(1, 0)).unwrap();
        assert_eq!(header.compression(), Some(Compression::Stored));
    }

    #[test]
    fn rejects_huffman_and_encryption() {
        for (compression, encryption) in [(17480, 0), (0, 0), (2, 2), (1, 1)] {
            let header = PalmDOCHeader::parse(&header(compression, encryption)).unwrap();
            assert!(matches!(
                header.check_supported(),
                Err(ErrorKind::UnsupportedEncoding { compression: c, encryption: e })
                    if c == compression && e == encryption
            ));
        }
    }

    #[test]
    fn short_record() {
        assert!(matches!(
            PalmDOCHeader::parse(&[0u8; 15]),
            Err(ErrorKind::TruncatedInput {
                needed: 16,
                available: 15
            })
        ));
    }
}
