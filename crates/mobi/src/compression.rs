#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecompressError {
    #[error("literal run of {needed} bytes at input offset {at} overruns the {len} byte record")]
    LiteralRun { at: usize, needed: usize, len: usize },
    #[error("back-reference token at input offset {at} is missing its second byte")]
    TruncatedToken { at: usize },
    #[error("back-reference distance {distance} reaches before the start of {available} decoded bytes")]
    BackReference { distance: usize, available: usize },
}

/// Expands a PalmDOC (LZ77 style) compressed record.
pub fn palmdoc_decompress(data: &[u8]) -> Result<Vec<u8>, DecompressError> {
    let mut out: Vec<u8> = Vec::with_capacity(data.len() * 2);
    let mut i = 0usize;

    while i < data.len() {
        let frame = data[i];
        i += 1;

        match frame {
            // literal run, must fit in the record
            0x01..=0x08 => {
                let n = frame as usize;
                let run = data.get(i..i + n).ok_or(DecompressError::LiteralRun {
                    at: i - 1,
                    needed: n,
                    len: data.len(),
                })?;
                out.extend_from_slice(run);
                i += n;
            }

            0x00 | 0x09..=0x7f => out.push(frame),

            // space pair
            0xc0..=0xff => {
                out.push(b' ');
                out.push(frame ^ 0x80);
            }

            // distance must land inside the output decoded so far
            0x80..=0xbf => {
                let second = *data
                    .get(i)
                    .ok_or(DecompressError::TruncatedToken { at: i - 1 })?;
                i += 1;

                let concat = ((frame as u16) << 8) | second as u16;
                let distance = ((concat & 0x3fff) >> 3) as usize;
                let length = ((concat & 0x07) + 3) as usize;

                if distance == 0 || distance > out.len() {
                    return Err(DecompressError::BackReference {
                        distance,
                        available: out.len(),
                    });
                }

                // source may overlap the bytes being appended
                let mut src = out.len() - distance;
                for _ in 0..length {
                    let b = out[src];
                    out.push(b);
                    src += 1;
                }
            }
        }
    }

    Ok(out)
}
