/// Node-count header.
///
/// The count is stored in one byte when it is at most 127. Larger counts
/// use a length byte `0x80 | L` followed by `L` big-endian bytes with
/// leading zero bytes stripped.
use crate::{PtError, PtResult};

/// Largest count that fits the single-byte form.
pub const MAX_INLINE_COUNT: u64 = 0x7F;

/// Widest length the reader accepts for the continuation form.
const MAX_COUNT_BYTES: usize = std::mem::size_of::<u64>();

/// Parse the node count at the start of `payload`.
///
/// Returns `(count, header_len)`; bit-unpacking starts at
/// `payload[header_len..]`. An empty payload declares zero nodes.
pub fn read_node_count(payload: &[u8]) -> PtResult<(u64, usize)> {
    let Some(&first) = payload.first() else {
        return Ok((0, 0));
    };
    if u64::from(first) <= MAX_INLINE_COUNT {
        return Ok((u64::from(first), 1));
    }

    let length = (first & 0x7F) as usize;
    if length > MAX_COUNT_BYTES {
        return Err(PtError::HeaderOverflow(length));
    }
    let available = payload.len() - 1;
    if available < length {
        return Err(PtError::TruncatedHeader {
            expected: length,
            found: available,
        });
    }
    let count = payload[1..=length]
        .iter()
        .fold(0u64, |count, &b| (count << 8) | u64::from(b));
    Ok((count, 1 + length))
}

/// Encode `count` the way the producer writes it.
pub fn encode_node_count(count: u64) -> Vec<u8> {
    if count <= MAX_INLINE_COUNT {
        return vec![count as u8];
    }
    let be = count.to_be_bytes();
    let start = be.iter().position(|&b| b != 0).unwrap_or(be.len() - 1);
    let significant = &be[start..];
    let mut out = Vec::with_capacity(1 + significant.len());
    out.push(0x80 | significant.len() as u8);
    out.extend_from_slice(significant);
    out
}
