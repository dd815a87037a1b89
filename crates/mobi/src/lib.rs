//! Decoder for MOBI books stored in Palm Database files.
//!
//! [`MOBIFile::from_bytes`] runs the whole pipeline: database header, record
//! table, PalmDOC header, MOBI header, optional EXTH header, then PalmDOC
//! decompression of the content records.

pub mod compression;
pub mod error;
pub mod exth_header;
pub mod mobi;
pub mod mobi_header;
pub mod palmdoc_header;
pub mod trailing;

pub use crate::error::{Error, ErrorKind, Result, Stage};
pub use crate::exth_header::{EXTHHeader, EXTHRecord};
pub use crate::mobi::{DataRecord, MOBIFile};
pub use crate::mobi_header::MOBIHeader;
pub use crate::palmdoc_header::{Compression, PalmDOCHeader};
pub use palm_database::{PDB, PDBHeader, PDBRecord, Tag};
