use byyte::be::{get_bytes, get_u16, get_u32};
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use log::{debug, trace};
use palm_database::Tag;

use crate::error::{ErrorKind, require};

pub const NULL_INDEX: u32 = 0xFFFFFFFF;

/// Shortest header carrying every unconditional field.
pub const MIN_HEADER_LEN: usize = 228;

pub const EXTH_FLAG: u32 = 0x40;

pub const ENCODING_UTF8: u32 = 65001;
pub const ENCODING_CP1252: u32 = 1252;

/// Undocumented byte ranges, relative to the start of the MOBI header.
/// Ranges past [`MIN_HEADER_LEN`] only exist in longer headers.
pub const RESERVED_RANGES: &[(usize, usize)] = &[
    (116, 148),
    (148, 152),
    (168, 176),
    (180, 184),
    (188, 192),
    (196, 200),
    (200, 208),
    (208, 212),
    (220, 224),
    (232, 236),
    (236, 240),
    (240, 244),
    (244, 248),
    (248, 252),
    (252, 256),
];

/// Bytes kept verbatim from an undocumented part of the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedRange {
    pub offset: usize,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MOBIHeader {
    pub identifier: Tag,
    pub header_length: u32,
    pub mobi_type: u32,
    pub text_encoding: u32,
    pub unique_id: u32,
    pub file_version: u32,
    pub orthographic_index: u32,
    pub inflection_index: u32,
    pub index_names: Tag,
    pub index_keys: Tag,
    pub extra_index: [Tag; 6],
    pub first_non_book_index: u32,
    pub full_name_offset: u32,
    pub full_name_length: u32,
    pub locale: u32,
    pub input_language: Tag,
    pub output_language: Tag,
    pub min_version: u32,
    pub first_image_index: u32,
    pub huffman_record_offset: u32,
    pub huffman_record_count: u32,
    pub huffman_table_offset: u32,
    pub huffman_table_length: u32,
    pub exth_flags: u32,
    pub drm_offset: u32,
    pub drm_count: u32,
    pub drm_size: u32,
    pub drm_flags: u32,
    pub first_content_record_number: u16,
    pub last_content_record_number: u16,
    pub fcis_record_number: u32,
    pub flis_record_number: u32,
    pub first_compilation_data_section_count: u32,
    pub number_of_compilation_data_sections: u32,
    pub extra_record_data_flags: u32,
    /// Only present when the header is at least 232 bytes long.
    pub indx_record_offset: Option<u32>,
    pub reserved: Vec<ReservedRange>,
}

impl MOBIHeader {
    /// Decodes the MOBI header from `data`, the part of record 0 that
    /// follows the PalmDOC header. Reads exactly `header_length` bytes.
    pub fn parse(data: &[u8]) -> Result<Self, ErrorKind> {
        require(data, 8)?;
        let identifier = Tag::read(data, 0)?;
        if identifier != b"MOBI" {
            return Err(ErrorKind::MalformedRecord(format!(
                "expected MOBI header, found {identifier:?}"
            )));
        }

        let header_length = get_u32(data, 4)?;
        let len = header_length as usize;
        if len < MIN_HEADER_LEN {
            return Err(ErrorKind::MalformedRecord(format!(
                "MOBI header length {len} is shorter than {MIN_HEADER_LEN}"
            )));
        }
        require(data, len)?;
        let buf = &data[..len];

        let present = |end: usize| len >= end;

        let reserved = RESERVED_RANGES
            .iter()
            .filter(|&&(_, end)| present(end))
            .map(|&(start, end)| -> byyte::Result<ReservedRange> {
                Ok(ReservedRange {
                    offset: start,
                    bytes: get_bytes(buf, start, end - start)?.to_vec(),
                })
            })
            .collect::<byyte::Result<Vec<_>>>()?;

        let indx_record_offset = if present(232) {
            Some(get_u32(buf, 228)?)
        } else {
            None
        };

        let header = MOBIHeader {
            identifier,
            header_length,
            mobi_type: get_u32(buf, 8)?,
            text_encoding: get_u32(buf, 12)?,
            unique_id: get_u32(buf, 16)?,
            file_version: get_u32(buf, 20)?,
            orthographic_index: get_u32(buf, 24)?,
            inflection_index: get_u32(buf, 28)?,
            index_names: Tag::read(buf, 32)?,
            index_keys: Tag::read(buf, 36)?,
            extra_index: [
                Tag::read(buf, 40)?,
                Tag::read(buf, 44)?,
                Tag::read(buf, 48)?,
                Tag::read(buf, 52)?,
                Tag::read(buf, 56)?,
                Tag::read(buf, 60)?,
            ],
            first_non_book_index: get_u32(buf, 64)?,
            full_name_offset: get_u32(buf, 68)?,
            full_name_length: get_u32(buf, 72)?,
            locale: get_u32(buf, 76)?,
            input_language: Tag::read(buf, 80)?,
            output_language: Tag::read(buf, 84)?,
            min_version: get_u32(buf, 88)?,
            first_image_index: get_u32(buf, 92)?,
            huffman_record_offset: get_u32(buf, 96)?,
            huffman_record_count: get_u32(buf, 100)?,
            huffman_table_offset: get_u32(buf, 104)?,
            huffman_table_length: get_u32(buf, 108)?,
            exth_flags: get_u32(buf, 112)?,
            drm_offset: get_u32(buf, 152)?,
            drm_count: get_u32(buf, 156)?,
            drm_size: get_u32(buf, 160)?,
            drm_flags: get_u32(buf, 164)?,
            first_content_record_number: get_u16(buf, 176)?,
            last_content_record_number: get_u16(buf, 178)?,
            fcis_record_number: get_u32(buf, 184)?,
            flis_record_number: get_u32(buf, 192)?,
            first_compilation_data_section_count: get_u32(buf, 212)?,
            number_of_compilation_data_sections: get_u32(buf, 216)?,
            extra_record_data_flags: get_u32(buf, 224)?,
            indx_record_offset,
            reserved,
        };

        debug!(
            "Read MOBI header: {} bytes, version {}, encoding {}, content records {}..{}",
            header.header_length,
            header.file_version,
            header.text_encoding,
            header.first_content_record_number,
            header.first_image_index
        );
        trace!("MOBI header: {:#?}", header);

        Ok(header)
    }

    pub fn has_exth(&self) -> bool {
        self.exth_flags & EXTH_FLAG != 0
    }

    /// Whether a field ending at `end` is inside the declared header length.
    pub fn contains(&self, end: usize) -> bool {
        self.header_length as usize >= end
    }

    pub fn reserved_at(&self, offset: usize) -> Option<&[u8]> {
        self.reserved
            .iter()
            .find(|range| range.offset == offset)
            .map(|range| range.bytes.as_slice())
    }

    /// Text encoding of the book; unknown code pages fall back to CP1252.
    pub fn encoding(&self) -> &'static Encoding {
        match self.text_encoding {
            ENCODING_UTF8 => UTF_8,
            _ => WINDOWS_1252,
        }
    }

    /// Reads the book's full name out of `record0`, the whole first record.
    pub fn full_name(&self, record0: &[u8]) -> Result<String, ErrorKind> {
        let name = get_bytes(
            record0,
            self.full_name_offset as usize,
            self.full_name_length as usize,
        )?;
        let (name, _, _) = self.encoding().decode(name);
        Ok(name.trim_end_matches('\0').to_string())
    }
}
