/// Blob splitting: dictionary inflation and payload location.
///
/// A blob starts with a zlib stream holding the path segment names, each
/// terminated by a NUL byte. The node-count header and bitstream follow
/// the zlib stream as raw bytes. The producer never records where the
/// zlib stream ends, so the reader finds the split by re-deflating the
/// recovered dictionary text and using the resulting length as the offset
/// into the original blob.
use std::io::Write;
use std::sync::Arc;

use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};

use crate::{PtError, PtResult};

/// Compression level the producer deflates the dictionary with.
pub const PRODUCER_LEVEL: u32 = 9;

/// How the offset of the payload region is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitStrategy {
    /// Re-deflate the dictionary text at `level` and use its length.
    Recompress { level: u32 },
    /// Use the number of blob bytes the inflater consumed.
    ConsumedInput,
}

impl Default for SplitStrategy {
    fn default() -> Self {
        SplitStrategy::Recompress {
            level: PRODUCER_LEVEL,
        }
    }
}

/// A blob split into its dictionary and payload regions.
#[derive(Debug, Clone)]
pub struct SplitBlob<'a> {
    /// Segment names, in rank order.
    pub names: Vec<Arc<str>>,
    /// Offset of the payload region in the original blob.
    pub offset: usize,
    /// The node-count header followed by the bitstream.
    pub payload: &'a [u8],
}

/// Split `blob` into dictionary names and payload bytes.
pub fn split(blob: &[u8], strategy: SplitStrategy) -> PtResult<SplitBlob<'_>> {
    if blob.is_empty() {
        return Ok(SplitBlob {
            names: Vec::new(),
            offset: 0,
            payload: blob,
        });
    }

    let (text, consumed) = inflate(blob)?;
    let offset = match strategy {
        SplitStrategy::Recompress { level } => deflated_len(&text, level)?,
        SplitStrategy::ConsumedInput => consumed,
    };
    if offset > blob.len() {
        return Err(PtError::PayloadOffset {
            offset,
            len: blob.len(),
        });
    }
    if offset != consumed {
        tracing::debug!(
            offset,
            consumed,
            "recompressed dictionary length differs from inflated input length"
        );
    }

    let names = parse_names(&text);
    tracing::debug!(
        names = names.len(),
        text_len = text.len(),
        offset,
        "split dictionary"
    );
    Ok(SplitBlob {
        names,
        offset,
        payload: &blob[offset..],
    })
}

/// Inflate the leading zlib stream of `blob`.
///
/// Returns the inflated bytes and the number of input bytes the stream
/// occupied. Bytes after the stream end are left untouched.
pub fn inflate(blob: &[u8]) -> PtResult<(Vec<u8>, usize)> {
    let mut inflater = Decompress::new(true);
    let mut out = Vec::with_capacity(blob.len().saturating_mul(4).max(64));
    loop {
        if out.len() == out.capacity() {
            out.reserve(out.capacity());
        }
        let in_before = inflater.total_in();
        let out_before = inflater.total_out();
        let input = &blob[in_before as usize..];
        let status = inflater
            .decompress_vec(input, &mut out, FlushDecompress::None)
            .map_err(|e| PtError::Inflate(e.to_string()))?;
        match status {
            Status::StreamEnd => break,
            Status::Ok | Status::BufError => {
                let progressed =
                    inflater.total_in() != in_before || inflater.total_out() != out_before;
                if !progressed && out.len() < out.capacity() {
                    return Err(PtError::TruncatedDictionary);
                }
            }
        }
    }
    Ok((out, inflater.total_in() as usize))
}

/// Length of `text` once zlib-deflated at `level`.
///
/// flate2 is built on zlib, the producer's deflater, so the length matches
/// the dictionary region of producer blobs byte for byte.
pub fn deflated_len(text: &[u8], level: u32) -> PtResult<usize> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level));
    encoder
        .write_all(text)
        .and_then(|_| encoder.finish())
        .map(|deflated| deflated.len())
        .map_err(|e| PtError::Recompress(e.to_string()))
}

/// Split dictionary text on NUL terminators.
///
/// Bytes after the last terminator do not form a name.
pub fn parse_names(text: &[u8]) -> Vec<Arc<str>> {
    let mut names = Vec::new();
    let mut rest = text;
    while let Some(end) = rest.iter().position(|&b| b == 0) {
        names.push(Arc::from(String::from_utf8_lossy(&rest[..end])));
        rest = &rest[end + 1..];
    }
    names
}
