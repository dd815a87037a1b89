pub mod be;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("{width} byte field at offset {offset} is outside a {len} byte buffer")]
    OutOfRange {
        offset: usize,
        width: usize,
        len: usize,
    },
    #[error("no support for integers wider than 8 bytes (got {0})")]
    UnsupportedWidth(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
