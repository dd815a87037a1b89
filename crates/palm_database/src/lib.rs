pub mod timestamp;

use std::fmt;
use std::ops::Range;

use byyte::be::{get_array, get_bytes, get_cstr, get_u8, get_u16, get_u24, get_u32};
use chrono::{DateTime, Utc};
use log::debug;

use crate::timestamp::get_time;

/// Fixed part of the database header.
pub const HEADER_LEN: usize = 78;
/// One entry of the record info table.
pub const RECORD_INFO_LEN: usize = 8;
/// Unused bytes between the record info table and the first record.
pub const GAP_LEN: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PDBError {
    #[error("truncated input: needed {needed} bytes, {available} available")]
    TruncatedInput { needed: usize, available: usize },
    #[error("record {index} spans {start}..{end} in a {len} byte file")]
    OutOfRange {
        index: usize,
        start: usize,
        end: usize,
        len: usize,
    },
    #[error("record {index} does not exist ({count} records)")]
    MissingRecord { index: usize, count: usize },
    #[error(transparent)]
    Field(#[from] byyte::Error),
}

fn require(data: &[u8], needed: usize) -> Result<(), PDBError> {
    if data.len() < needed {
        return Err(PDBError::TruncatedInput {
            needed,
            available: data.len(),
        });
    }
    Ok(())
}

/// A four byte identifier kept exactly as stored, NULs included.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Tag(pub [u8; 4]);

impl Tag {
    pub fn read(buf: &[u8], offset: usize) -> byyte::Result<Self> {
        Ok(Tag(get_array(buf, offset)?))
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    pub fn as_u32(&self) -> u32 {
        u32::from_be_bytes(self.0)
    }
}

impl PartialEq<[u8; 4]> for Tag {
    fn eq(&self, other: &[u8; 4]) -> bool {
        &self.0 == other
    }
}

impl PartialEq<&[u8; 4]> for Tag {
    fn eq(&self, other: &&[u8; 4]) -> bool {
        &self.0 == *other
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({:?})", String::from_utf8_lossy(&self.0))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PDBHeader {
    pub name: String,
    pub attributes: u16,
    pub version: u16,
    pub creation_time: DateTime<Utc>,
    pub modification_time: DateTime<Utc>,
    pub last_backup_date: DateTime<Utc>,
    pub modification_number: u32,
    pub app_info_id: u32,
    pub sort_info_id: u32,
    pub type_: Tag,
    pub creator: Tag,
    pub unique_id_seed: u32,
    pub next_record_list_id: u32,
    pub number_of_records: u16,
}

impl PDBHeader {
    /// Decodes the fixed 78 byte header at the start of `data`.
    pub fn parse(data: &[u8]) -> Result<Self, PDBError> {
        require(data, HEADER_LEN)?;

        Ok(PDBHeader {
            name: get_cstr(data, 0, 32)?,
            attributes: get_u16(data, 32)?,
            version: get_u16(data, 34)?,
            creation_time: get_time(data, 36)?,
            modification_time: get_time(data, 40)?,
            last_backup_date: get_time(data, 44)?,
            modification_number: get_u32(data, 48)?,
            app_info_id: get_u32(data, 52)?,
            sort_info_id: get_u32(data, 56)?,
            type_: Tag::read(data, 60)?,
            creator: Tag::read(data, 64)?,
            unique_id_seed: get_u32(data, 68)?,
            next_record_list_id: get_u32(data, 72)?,
            number_of_records: get_u16(data, 76)?,
        })
    }

    /// `BOOKMOBI` is the type/creator pair written by Mobipocket tools.
    pub fn is_mobi(&self) -> bool {
        self.type_ == b"BOOK" && self.creator == b"MOBI"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PDBRecord {
    pub data_offset: u32,
    pub attributes: u8,
    /// 24-bit unique id.
    pub unique_id: u32,
}

impl PDBRecord {
    pub fn parse(data: &[u8]) -> Result<Self, PDBError> {
        require(data, RECORD_INFO_LEN)?;

        Ok(PDBRecord {
            data_offset: get_u32(data, 0)?,
            attributes: get_u8(data, 4)?,
            unique_id: get_u24(data, 5)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PDB {
    pub header: PDBHeader,
    pub records: Vec<PDBRecord>,
    pub gap: [u8; GAP_LEN],
}

impl PDB {
    /// Decodes the database header, the record info table and the gap that
    /// follows it. `data` is the whole file; only the prefix is consumed.
    pub fn parse(data: &[u8]) -> Result<Self, PDBError> {
        let header = PDBHeader::parse(data)?;
        let count = header.number_of_records as usize;
        require(data, Self::header_len_for(count))?;

        let records = (0..count)
            .map(|i| -> Result<PDBRecord, PDBError> {
                let offset = HEADER_LEN + i * RECORD_INFO_LEN;
                PDBRecord::parse(get_bytes(data, offset, RECORD_INFO_LEN)?)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let gap = get_array(data, HEADER_LEN + count * RECORD_INFO_LEN)?;

        debug!(
            "Read PDB header {:?} ({}{}), {} records",
            header.name, header.type_, header.creator, count
        );

        Ok(PDB {
            header,
            records,
            gap,
        })
    }

    fn header_len_for(count: usize) -> usize {
        HEADER_LEN + count * RECORD_INFO_LEN + GAP_LEN
    }

    /// Bytes occupied by the header, record info table and gap.
    pub fn header_len(&self) -> usize {
        Self::header_len_for(self.records.len())
    }

    /// Byte range of record `index` in a file of `file_len` bytes. A record
    /// ends where the next one starts; the last one runs to end of file.
    pub fn record_span(&self, index: usize, file_len: usize) -> Result<Range<usize>, PDBError> {
        let record = self.records.get(index).ok_or(PDBError::MissingRecord {
            index,
            count: self.records.len(),
        })?;
        let start = record.data_offset as usize;
        let end = match self.records.get(index + 1) {
            Some(next) => next.data_offset as usize,
            None => file_len,
        };

        if start > end || end > file_len {
            return Err(PDBError::OutOfRange {
                index,
                start,
                end,
                len: file_len,
            });
        }

        Ok(start..end)
    }

    pub fn record_spans(&self, file_len: usize) -> Result<Vec<Range<usize>>, PDBError> {
        (0..self.records.len())
            .map(|i| self.record_span(i, file_len))
            .collect()
    }

    /// Slices record `index` out of the whole-file buffer `data`.
    pub fn record<'a>(&self, data: &'a [u8], index: usize) -> Result<&'a [u8], PDBError> {
        let span = self.record_span(index, data.len())?;
        Ok(&data[span])
    }
}
