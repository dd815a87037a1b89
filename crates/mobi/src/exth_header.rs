use byyte::be::{get_bytes, get_u32};
use encoding_rs::Encoding;
use log::{debug, trace};
use palm_database::Tag;

use crate::error::{ErrorKind, require};

pub const EXTH_PREFIX_LEN: usize = 12;
const RECORD_HEADER_LEN: usize = 8;

pub const AUTHOR: u32 = 100;
pub const PUBLISHER: u32 = 101;
pub const DESCRIPTION: u32 = 103;
pub const ISBN: u32 = 104;
pub const SUBJECT: u32 = 105;
pub const PUBLISHING_DATE: u32 = 106;
pub const ASIN: u32 = 113;
pub const COVER_OFFSET: u32 = 201;
pub const THUMBNAIL_OFFSET: u32 = 202;
pub const UPDATED_TITLE: u32 = 503;
pub const LANGUAGE: u32 = 524;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EXTHRecord {
    pub record_type: u32,
    /// Declared length, including the 8 byte record header.
    pub length: u32,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EXTHHeader {
    pub identifier: Tag,
    pub header_length: u32,
    pub record_count: u32,
    pub records: Vec<EXTHRecord>,
}

impl EXTHHeader {
    /// Decodes the EXTH block at the start of `data`, which runs on to the
    /// end of record 0.
    pub fn parse(data: &[u8]) -> Result<Self, ErrorKind> {
        require(data, EXTH_PREFIX_LEN)?;
        let identifier = Tag::read(data, 0)?;
        if identifier != b"EXTH" {
            return Err(ErrorKind::MalformedRecord(format!(
                "expected EXTH header, found {identifier:?}"
            )));
        }

        let header_length = get_u32(data, 4)?;
        let record_count = get_u32(data, 8)?;
        let len = header_length as usize;
        if len < EXTH_PREFIX_LEN {
            return Err(ErrorKind::MalformedRecord(format!(
                "EXTH header length {len} is shorter than its own prefix"
            )));
        }
        require(data, padded_len(len))?;
        let buf = &data[..len];

        let mut records = Vec::new();
        let mut cursor = EXTH_PREFIX_LEN;
        for i in 0..record_count {
            let malformed = |reason: String| {
                ErrorKind::MalformedRecord(format!("EXTH record {i} at offset {cursor}: {reason}"))
            };
            if cursor + RECORD_HEADER_LEN > len {
                return Err(malformed(format!(
                    "record header runs past the {len} byte EXTH header"
                )));
            }

            let record_type = get_u32(buf, cursor)?;
            let length = get_u32(buf, cursor + 4)?;
            let size = length as usize;
            if size < RECORD_HEADER_LEN {
                return Err(malformed(format!("declared length {size} is too short")));
            }
            if size > len - cursor {
                return Err(malformed(format!(
                    "declared length {size} runs past the {len} byte EXTH header"
                )));
            }

            let payload = get_bytes(buf, cursor + RECORD_HEADER_LEN, size - RECORD_HEADER_LEN)?;
            trace!("EXTH record {record_type}: {} bytes", payload.len());
            records.push(EXTHRecord {
                record_type,
                length,
                data: payload.to_vec(),
            });
            cursor += size;
        }

        debug!("Read EXTH header: {len} bytes, {record_count} records");

        Ok(EXTHHeader {
            identifier,
            header_length,
            record_count,
            records,
        })
    }

    /// Bytes the header occupies in record 0, including padding.
    pub fn padded_length(&self) -> usize {
        padded_len(self.header_length as usize)
    }

    pub fn get(&self, record_type: u32) -> impl Iterator<Item = &EXTHRecord> {
        self.records
            .iter()
            .filter(move |record| record.record_type == record_type)
    }

    /// First record of `record_type`, decoded as text.
    pub fn string(&self, record_type: u32, encoding: &'static Encoding) -> Option<String> {
        let record = self.get(record_type).next()?;
        let (text, _, _) = encoding.decode(&record.data);
        Some(text.into_owned())
    }

    /// First record of `record_type` whose payload is a 4 byte integer.
    pub fn u32(&self, record_type: u32) -> Option<u32> {
        self.get(record_type)
            .find(|record| record.data.len() == 4)
            .and_then(|record| get_u32(&record.data, 0).ok())
    }
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(4) * 4
}
