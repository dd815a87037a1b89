//! Trailing entries appended to text records.
//!
//! Bit 0 of the MOBI header's extra record data flags marks a multibyte
//! overlap entry; every higher set bit marks one more entry whose size is a
//! 7-bit varint stored backwards at the end of the record. The entries sit
//! after the compressed text and must be cut off before decompressing.

use crate::error::ErrorKind;

fn entry_size(data: &[u8], end: usize) -> usize {
    let mut size = 0usize;
    let mut shift = 0;
    let mut pos = end;

    while pos > 0 {
        pos -= 1;
        let b = data[pos];
        size |= ((b & 0x7f) as usize) << shift;
        shift += 7;
        if b & 0x80 != 0 || shift >= 28 {
            break;
        }
    }

    size
}

/// Number of trailing bytes described by `flags` at the end of `data`.
pub fn trailing_size(data: &[u8], flags: u32) -> Result<usize, ErrorKind> {
    let overrun = |size: usize| {
        ErrorKind::MalformedRecord(format!(
            "trailing entries of {size} bytes exceed the {} byte record",
            data.len()
        ))
    };

    let mut size = 0usize;
    let mut bits = (flags & 0xffff) >> 1;
    while bits != 0 {
        if bits & 1 == 1 {
            size += entry_size(data, data.len() - size);
            if size > data.len() {
                return Err(overrun(size));
            }
        }
        bits >>= 1;
    }

    if flags & 1 == 1 {
        let last = *data
            .len()
            .checked_sub(size + 1)
            .and_then(|pos| data.get(pos))
            .ok_or_else(|| overrun(size + 1))?;
        size += (last & 0x3) as usize + 1;
        if size > data.len() {
            return Err(overrun(size));
        }
    }

    Ok(size)
}

/// Returns `data` without its trailing entries.
pub fn strip_trailing_entries(data: &[u8], flags: u32) -> Result<&[u8], ErrorKind> {
    let size = trailing_size(data, flags)?;
    Ok(&data[..data.len() - size])
}
