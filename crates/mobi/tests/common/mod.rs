//! In-memory MOBI fixtures.

#![allow(dead_code)]

pub const RECORD0_PREFIX: usize = 16;

/// Encodes `text` as PalmDOC literal runs.
pub fn literal_runs(text: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    for chunk in text.chunks(8) {
        out.push(chunk.len() as u8);
        out.extend_from_slice(chunk);
    }
    out
}

/// A two byte PalmDOC back-reference token.
pub fn back_ref(distance: u16, length: u16) -> [u8; 2] {
    (0x8000 | (distance << 3) | (length - 3)).to_be_bytes()
}

pub struct BookBuilder {
    pub name: String,
    pub full_name: String,
    pub compression: u16,
    pub encryption: u16,
    pub header_length: usize,
    pub text_encoding: u32,
    pub extra_record_data_flags: u32,
    pub exth: Option<Vec<(u32, Vec<u8>)>>,
    pub text_records: Vec<Vec<u8>>,
    pub other_records: Vec<Vec<u8>>,
    pub first_image_index: Option<u32>,
}

impl BookBuilder {
    pub fn new() -> Self {
        BookBuilder {
            name: "Test_Book".to_owned(),
            full_name: "A Test Book".to_owned(),
            compression: 1,
            encryption: 0,
            header_length: 232,
            text_encoding: 65001,
            extra_record_data_flags: 0,
            exth: None,
            text_records: Vec::new(),
            other_records: Vec::new(),
            first_image_index: None,
        }
    }

    pub fn compression(mut self, compression: u16) -> Self {
        self.compression = compression;
        self
    }

    pub fn encryption(mut self, encryption: u16) -> Self {
        self.encryption = encryption;
        self
    }

    pub fn header_length(mut self, header_length: usize) -> Self {
        self.header_length = header_length;
        self
    }

    pub fn text_encoding(mut self, text_encoding: u32) -> Self {
        self.text_encoding = text_encoding;
        self
    }

    pub fn extra_record_data_flags(mut self, flags: u32) -> Self {
        self.extra_record_data_flags = flags;
        self
    }

    pub fn exth_record(mut self, record_type: u32, data: &[u8]) -> Self {
        self.exth
            .get_or_insert_with(Vec::new)
            .push((record_type, data.to_vec()));
        self
    }

    pub fn text_record(mut self, data: &[u8]) -> Self {
        self.text_records.push(data.to_vec());
        self
    }

    pub fn other_record(mut self, data: &[u8]) -> Self {
        self.other_records.push(data.to_vec());
        self
    }

    pub fn first_image_index(mut self, index: u32) -> Self {
        self.first_image_index = Some(index);
        self
    }

    pub fn exth_bytes(&self) -> Option<Vec<u8>> {
        let records = self.exth.as_ref()?;
        let mut body = Vec::new();
        for (record_type, data) in records {
            body.extend_from_slice(&record_type.to_be_bytes());
            body.extend_from_slice(&(data.len() as u32 + 8).to_be_bytes());
            body.extend_from_slice(data);
        }
        let len = body.len() + 12;
        let mut out = b"EXTH".to_vec();
        out.extend_from_slice(&(len as u32).to_be_bytes());
        out.extend_from_slice(&(records.len() as u32).to_be_bytes());
        out.extend_from_slice(&body);
        out.resize(len.div_ceil(4) * 4, 0);
        Some(out)
    }

    pub fn record0(&self) -> Vec<u8> {
        let text_len: usize = self.text_records.iter().map(Vec::len).sum();
        let mut out = Vec::new();
        out.extend_from_slice(&self.compression.to_be_bytes());
        out.extend_from_slice(&[0, 0]);
        out.extend_from_slice(&(text_len as u32).to_be_bytes());
        out.extend_from_slice(&(self.text_records.len() as u16).to_be_bytes());
        out.extend_from_slice(&4096u16.to_be_bytes());
        out.extend_from_slice(&self.encryption.to_be_bytes());
        out.extend_from_slice(&[0, 0]);

        let exth = self.exth_bytes();
        let full_name_offset =
            RECORD0_PREFIX + self.header_length + exth.as_ref().map_or(0, Vec::len);
        let first_image = self
            .first_image_index
            .unwrap_or(1 + self.text_records.len() as u32);

        let mut header = vec![0u8; self.header_length];
        let mut put = |offset: usize, value: u32| {
            if offset + 4 <= header.len() {
                header[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
            }
        };
        put(4, self.header_length as u32);
        put(8, 2);
        put(12, self.text_encoding);
        put(16, 0x1234_5678);
        put(20, 6);
        put(24, 0xFFFF_FFFF);
        put(28, 0xFFFF_FFFF);
        put(64, first_image);
        put(68, full_name_offset as u32);
        put(72, self.full_name.len() as u32);
        put(76, 9);
        put(88, 6);
        put(92, first_image);
        put(112, if exth.is_some() { 0x50 } else { 0 });
        put(152, 0xFFFF_FFFF);
        put(176, (1u32 << 16) | self.text_records.len() as u32);
        put(224, self.extra_record_data_flags);
        put(228, 0xFFFF_FFFF);
        header[0..4].copy_from_slice(b"MOBI");
        out.extend_from_slice(&header);

        if let Some(exth) = exth {
            out.extend_from_slice(&exth);
        }
        out.extend_from_slice(self.full_name.as_bytes());
        out.extend_from_slice(&[0, 0]);
        out
    }

    pub fn build(&self) -> Vec<u8> {
        let mut records = vec![self.record0()];
        records.extend(self.text_records.iter().cloned());
        records.extend(self.other_records.iter().cloned());

        let mut out = vec![0u8; 78];
        out[..self.name.len()].copy_from_slice(self.name.as_bytes());
        out[36..40].copy_from_slice(&3_786_912_000u32.to_be_bytes());
        out[60..64].copy_from_slice(b"BOOK");
        out[64..68].copy_from_slice(b"MOBI");
        out[76..78].copy_from_slice(&(records.len() as u16).to_be_bytes());

        let mut offset = 78 + records.len() * 8 + 2;
        for (i, record) in records.iter().enumerate() {
            out.extend_from_slice(&(offset as u32).to_be_bytes());
            out.push(0);
            out.extend_from_slice(&(2 * i as u32).to_be_bytes()[1..]);
            offset += record.len();
        }
        out.extend_from_slice(&[0, 0]);
        for record in &records {
            out.extend_from_slice(record);
        }
        out
    }
}
