//! Big-endian field readers over in-memory buffers.
//!
//! Every accessor takes the buffer and an absolute offset, so callers never
//! share a cursor. A field that does not fit inside the buffer is an
//! [`Error::OutOfRange`], never a panic.

use crate::{Error, Result};

/// Returns `buf[offset..offset + len]`, checked.
pub fn get_bytes(buf: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    let out_of_range = || Error::OutOfRange {
        offset,
        width: len,
        len: buf.len(),
    };
    let end = offset.checked_add(len).ok_or_else(out_of_range)?;
    buf.get(offset..end).ok_or_else(out_of_range)
}

pub fn get_array<const N: usize>(buf: &[u8], offset: usize) -> Result<[u8; N]> {
    let mut out = [0u8; N];
    out.copy_from_slice(get_bytes(buf, offset, N)?);
    Ok(out)
}

/// Reads a `width` byte big-endian unsigned integer, zero-extended to 64 bits.
pub fn get_uint(buf: &[u8], offset: usize, width: usize) -> Result<u64> {
    if width > 8 {
        return Err(Error::UnsupportedWidth(width));
    }
    let bytes = get_bytes(buf, offset, width)?;
    Ok(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64))
}

pub fn get_u8(buf: &[u8], offset: usize) -> Result<u8> {
    Ok(get_uint(buf, offset, 1)? as u8)
}

pub fn get_u16(buf: &[u8], offset: usize) -> Result<u16> {
    Ok(get_uint(buf, offset, 2)? as u16)
}

pub fn get_u24(buf: &[u8], offset: usize) -> Result<u32> {
    Ok(get_uint(buf, offset, 3)? as u32)
}

pub fn get_u32(buf: &[u8], offset: usize) -> Result<u32> {
    Ok(get_uint(buf, offset, 4)? as u32)
}

/// Reads a fixed-length string field, dropping trailing NUL padding.
///
/// Invalid UTF-8 is replaced rather than rejected; Palm names are frequently
/// written in a legacy code page.
pub fn get_cstr(buf: &[u8], offset: usize, len: usize) -> Result<String> {
    let bytes = get_bytes(buf, offset, len)?;
    let string = String::from_utf8_lossy(bytes);
    Ok(string.trim_end_matches('\0').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian_widths() {
        let buf = [0x12, 0x34, 0x56, 0x78, 0x9a];
        assert_eq!(get_uint(&buf, 0, 1).unwrap(), 0x12);
        assert_eq!(get_u16(&buf, 1).unwrap(), 0x3456);
        assert_eq!(get_u24(&buf, 2).unwrap(), 0x56789a);
        assert_eq!(get_u32(&buf, 0).unwrap(), 0x12345678);
        assert_eq!(get_uint(&buf, 0, 5).unwrap(), 0x123456789a);
    }

    #[test]
    fn zero_width_reads_zero() {
        assert_eq!(get_uint(&[], 0, 0).unwrap(), 0);
    }

    #[test]
    fn eight_byte_field_fills_u64() {
        let buf = [0xffu8; 8];
        assert_eq!(get_uint(&buf, 0, 8).unwrap(), u64::MAX);
    }

    #[test]
    fn rejects_wide_integers() {
        let buf = [0u8; 16];
        assert_eq!(get_uint(&buf, 0, 9), Err(Error::UnsupportedWidth(9)));
    }

    #[test]
    fn rejects_fields_past_the_end() {
        let buf = [0u8; 4];
        assert_eq!(
            get_u32(&buf, 1),
            Err(Error::OutOfRange {
                offset: 1,
                width: 4,
                len: 4
            })
        );
        assert!(get_bytes(&buf, usize::MAX, 2).is_err());
        assert!(get_bytes(&buf, 4, 0).unwrap().is_empty());
    }

    #[test]
    fn cstr_trims_trailing_nuls_only() {
        let buf = b"\0ab\0\0\0";
        assert_eq!(get_cstr(buf, 0, 6).unwrap(), "\0ab");
        assert_eq!(get_cstr(buf, 1, 5).unwrap(), "ab");
    }

    #[test]
    fn array_copies_verbatim() {
        let buf = b"BOOKMOBI";
        assert_eq!(get_array::<4>(buf, 4).unwrap(), *b"MOBI");
    }
}
