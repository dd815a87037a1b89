use std::fmt;

use palm_database::PDBError;

use crate::compression::DecompressError;

pub type Result<T> = std::result::Result<T, Error>;

/// The decoder that was running when a file was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Read,
    Database,
    PalmDoc,
    MobiHeader,
    Exth,
    Records,
    Encoding,
    Content { record: usize },
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Read => f.write_str("input"),
            Stage::Database => f.write_str("palm database header"),
            Stage::PalmDoc => f.write_str("PalmDOC header"),
            Stage::MobiHeader => f.write_str("MOBI header"),
            Stage::Exth => f.write_str("EXTH header"),
            Stage::Records => f.write_str("record table"),
            Stage::Encoding => f.write_str("compression settings"),
            Stage::Content { record } => write!(f, "content record {record}"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    #[error("truncated input: needed {needed} bytes, {available} available")]
    TruncatedInput { needed: usize, available: usize },
    #[error("range {start}..{end} is outside a {len} byte buffer")]
    OutOfRange { start: usize, end: usize, len: usize },
    #[error("malformed record: {0}")]
    MalformedRecord(String),
    #[error("compression type {compression} with encryption type {encryption} is not supported")]
    UnsupportedEncoding { compression: u16, encryption: u16 },
    #[error("no support for integers wider than 8 bytes (got {0})")]
    UnsupportedWidth(usize),
    #[error(transparent)]
    Decompress(#[from] DecompressError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<byyte::Error> for ErrorKind {
    fn from(err: byyte::Error) -> Self {
        match err {
            byyte::Error::OutOfRange { offset, width, len } => ErrorKind::OutOfRange {
                start: offset,
                end: offset.saturating_add(width),
                len,
            },
            byyte::Error::UnsupportedWidth(width) => ErrorKind::UnsupportedWidth(width),
        }
    }
}

impl From<PDBError> for ErrorKind {
    fn from(err: PDBError) -> Self {
        match err {
            PDBError::TruncatedInput { needed, available } => {
                ErrorKind::TruncatedInput { needed, available }
            }
            PDBError::OutOfRange {
                start, end, len, ..
            } => ErrorKind::OutOfRange { start, end, len },
            PDBError::MissingRecord { index, count } => ErrorKind::MalformedRecord(format!(
                "record {index} requested from a {count} record table"
            )),
            PDBError::Field(err) => err.into(),
        }
    }
}

/// A decode failure: what went wrong and in which decoder.
#[derive(Debug, thiserror::Error)]
#[error("failed to read {stage}: {kind}")]
pub struct Error {
    pub stage: Stage,
    #[source]
    pub kind: ErrorKind,
}

impl Error {
    pub fn new(stage: Stage, kind: impl Into<ErrorKind>) -> Self {
        Error {
            stage,
            kind: kind.into(),
        }
    }
}

/// Attaches the failing stage to any error convertible into [`ErrorKind`].
pub(crate) trait StageExt<T> {
    fn stage(self, stage: Stage) -> Result<T>;
}

impl<T, E: Into<ErrorKind>> StageExt<T> for std::result::Result<T, E> {
    fn stage(self, stage: Stage) -> Result<T> {
        self.map_err(|err| Error::new(stage, err))
    }
}

pub(crate) fn require(data: &[u8], needed: usize) -> std::result::Result<(), ErrorKind> {
    if data.len() < needed {
        return Err(ErrorKind::TruncatedInput {
            needed,
            available: data.len(),
        });
    }
    Ok(())
}
