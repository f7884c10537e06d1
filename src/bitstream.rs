/// MSB-first bit reading and writing.
///
/// Each byte expands into 8 bits, most significant first, and the bits of
/// consecutive bytes are concatenated in byte order. The reader consumes
/// strictly left to right; there is no peeking or rewinding.
use crate::huffman::Codeword;

/// A forward-only bit cursor over a byte slice.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Index of the next bit to read.
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        BitReader { data, bit_pos: 0 }
    }

    /// Read one bit, or `None` once every byte has been consumed.
    #[inline]
    pub fn next_bit(&mut self) -> Option<bool> {
        let byte = *self.data.get(self.bit_pos / 8)?;
        let bit_offset = 7 - (self.bit_pos % 8);
        self.bit_pos += 1;
        Some((byte >> bit_offset) & 1 == 1)
    }

    /// Number of bits consumed so far.
    pub fn position(&self) -> usize {
        self.bit_pos
    }

    /// Total number of bits in the underlying slice.
    pub fn total_bits(&self) -> usize {
        self.data.len() * 8
    }

    /// Number of bits not yet consumed.
    pub fn remaining(&self) -> usize {
        self.total_bits() - self.bit_pos
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }
}

impl Iterator for BitReader<'_> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        self.next_bit()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining(), Some(self.remaining()))
    }
}

/// Packs bits MSB-first into bytes; the final partial byte is padded with
/// zero bits. Used to build verification payloads.
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    bit_len: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_bit(&mut self, bit: bool) {
        if self.bit_len % 8 == 0 {
            self.bytes.push(0);
        }
        if bit {
            let last = self.bytes.len() - 1;
            self.bytes[last] |= 1 << (7 - (self.bit_len % 8));
        }
        self.bit_len += 1;
    }

    pub fn push_code(&mut self, code: Codeword) {
        for bit in code.iter() {
            self.push_bit(bit);
        }
    }

    /// Number of bits written, excluding padding.
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}
