use std::io::Read;
use std::ops::Range;

use log::{debug, trace, warn};
use palm_database::PDB;

use crate::compression::palmdoc_decompress;
use crate::error::{Error, ErrorKind, Result, Stage, StageExt};
use crate::exth_header::{self, EXTHHeader};
pub use crate::mobi_header::MOBIHeader;
use crate::mobi_header::NULL_INDEX;
pub use crate::palmdoc_header::{Compression, PalmDOCHeader};
use crate::palmdoc_header::PALMDOC_HEADER_LEN;
use crate::trailing::trailing_size;

/// One record of the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRecord {
    pub index: usize,
    /// Byte range of the record in the file.
    pub span: Range<usize>,
    /// `span` without trailing entries. Equal to `span` outside the content range.
    pub body: Range<usize>,
    /// Expanded text of a PalmDOC compressed content record.
    pub decompressed: Option<Vec<u8>>,
}

/// A decoded MOBI book. Owns the file it was decoded from; uncompressed
/// records are served straight out of that buffer.
#[derive(Debug, Clone)]
pub struct MOBIFile {
    pub pdb: PDB,
    pub palmdoc_header: PalmDOCHeader,
    pub header: MOBIHeader,
    pub exth: Option<EXTHHeader>,
    pub records: Vec<DataRecord>,
    content: Range<usize>,
    data: Vec<u8>,
}

impl MOBIFile {
    /// Reads `reader` to the end and decodes the result.
    pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data).stage(Stage::Read)?;
        Self::from_bytes(data)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let pdb = PDB::parse(&data).stage(Stage::Database)?;
        if !pdb.header.is_mobi() {
            warn!(
                "Unexpected database type {}{}, decoding as MOBI anyway",
                pdb.header.type_, pdb.header.creator
            );
        }

        let spans = pdb.record_spans(data.len()).stage(Stage::Records)?;
        let record0 = spans
            .first()
            .map(|span| &data[span.clone()])
            .ok_or_else(|| {
                Error::new(
                    Stage::Records,
                    ErrorKind::MalformedRecord("database has no records".to_owned()),
                )
            })?;

        let palmdoc_header = PalmDOCHeader::parse(record0).stage(Stage::PalmDoc)?;
        let header = MOBIHeader::parse(&record0[PALMDOC_HEADER_LEN..]).stage(Stage::MobiHeader)?;

        let exth = if header.has_exth() {
            let start = PALMDOC_HEADER_LEN + header.header_length as usize;
            Some(EXTHHeader::parse(&record0[start..]).stage(Stage::Exth)?)
        } else {
            None
        };

        let compression = palmdoc_header.check_supported().stage(Stage::Encoding)?;
        let content = content_range(&header, spans.len());
        debug!(
            "Decoding {} records, content {:?}, {:?}",
            spans.len(),
            content,
            compression
        );

        let records = spans
            .into_iter()
            .enumerate()
            .map(|(index, span)| -> Result<DataRecord> {
                if !content.contains(&index) {
                    return Ok(DataRecord {
                        index,
                        body: span.clone(),
                        span,
                        decompressed: None,
                    });
                }

                let stage = Stage::Content { record: index };
                let raw = &data[span.clone()];
                let trailing = trailing_size(raw, header.extra_record_data_flags).stage(stage)?;
                let body = span.start..span.end - trailing;
                let decompressed = match compression {
                    Compression::Stored => None,
                    Compression::PalmDoc => {
                        let text = palmdoc_decompress(&data[body.clone()]).stage(stage)?;
                        trace!("Record {index}: {} -> {} bytes", body.len(), text.len());
                        Some(text)
                    }
                };

                Ok(DataRecord {
                    index,
                    span,
                    body,
                    decompressed,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(MOBIFile {
            pdb,
            palmdoc_header,
            header,
            exth,
            records,
            content,
            data,
        })
    }

    /// Indices of the records holding the book text.
    pub fn content_range(&self) -> Range<usize> {
        self.content.clone()
    }

    /// Decoded bytes of record `index`: expanded text for content records,
    /// the stored bytes for everything else.
    pub fn record(&self, index: usize) -> Option<&[u8]> {
        let record = self.records.get(index)?;
        Some(match &record.decompressed {
            Some(text) => text.as_slice(),
            None => &self.data[record.body.clone()],
        })
    }

    /// Record `index` exactly as stored in the file.
    pub fn raw_record(&self, index: usize) -> Option<&[u8]> {
        let record = self.records.get(index)?;
        Some(&self.data[record.span.clone()])
    }

    /// All content records concatenated in order, undecoded.
    pub fn text_bytes(&self) -> Vec<u8> {
        self.content_range()
            .filter_map(|index| self.record(index))
            .flatten()
            .copied()
            .collect()
    }

    /// The book body, decoded with the header's text encoding.
    pub fn text(&self) -> String {
        let bytes = self.text_bytes();
        let (text, _, had_errors) = self.header.encoding().decode(&bytes);
        if had_errors {
            warn!("Book text contains malformed {} sequences", self.header.encoding().name());
        }
        text.into_owned()
    }

    /// Updated title from EXTH if there is one, otherwise the full name.
    pub fn title(&self) -> Result<String> {
        if let Some(title) = self
            .exth
            .as_ref()
            .and_then(|exth| exth.string(exth_header::UPDATED_TITLE, self.header.encoding()))
        {
            return Ok(title);
        }
        let record0 = self.raw_record(0).unwrap_or_default();
        self.header.full_name(record0).stage(Stage::MobiHeader)
    }

    pub fn author(&self) -> Option<String> {
        self.exth
            .as_ref()?
            .string(exth_header::AUTHOR, self.header.encoding())
    }

    /// The whole input file.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

fn content_range(header: &MOBIHeader, count: usize) -> Range<usize> {
    let first_image = header.first_image_index as usize;
    if first_image > count && header.first_image_index != NULL_INDEX {
        warn!("First image index {first_image} is past the last record ({count})");
    }
    let end = first_image.min(count);
    let start = (header.first_content_record_number as usize).min(end);
    start..end
}
