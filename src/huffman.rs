/// Weighted Huffman code tables: tree construction, encoding, and decoding.
///
/// The builder reproduces the producer's construction exactly: at each
/// step the two lowest-weight trees are found by a linear scan (first
/// encountered wins ties), the first becomes the left child, the second
/// the right child, and the merged tree is appended at the end of the
/// working list. Any other tie-break yields different codeword lengths
/// on inputs with repeated weights. The scan is replaced by a min-heap
/// with the same pick order.
use std::fmt;

use crate::pqueue::MinHeap;
use crate::{PtError, PtResult};

/// Longest codeword a table can hold.
pub const MAX_CODE_BITS: u32 = u64::BITS;

/// A codeword: the low `len` bits of `bits`, first bit most significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Codeword {
    bits: u64,
    len: u32,
}

impl Codeword {
    /// The empty codeword (the code of a single-symbol table).
    pub const EMPTY: Codeword = Codeword { bits: 0, len: 0 };

    /// Build a codeword from a bit sequence, first bit first.
    ///
    /// Returns `None` if the sequence is longer than [`MAX_CODE_BITS`].
    pub fn from_bits<I: IntoIterator<Item = bool>>(bits: I) -> Option<Self> {
        bits.into_iter()
            .try_fold(Self::EMPTY, |code, bit| code.pushed(bit))
    }

    /// This codeword extended by one bit, or `None` if it is full.
    pub fn pushed(self, bit: bool) -> Option<Self> {
        if self.len >= MAX_CODE_BITS {
            return None;
        }
        Some(Codeword {
            bits: (self.bits << 1) | bit as u64,
            len: self.len + 1,
        })
    }

    /// Raw bit value, right-aligned.
    pub fn bits(&self) -> u64 {
        self.bits
    }

    /// Number of bits in the codeword.
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The `i`-th bit counting from the start of the codeword.
    pub fn bit(&self, i: u32) -> bool {
        debug_assert!(i < self.len);
        (self.bits >> (self.len - 1 - i)) & 1 == 1
    }

    /// Iterate over the bits, first bit first.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |i| self.bit(i))
    }

    /// True if `self` is a (non-strict) prefix of `other`.
    pub fn is_prefix_of(&self, other: &Codeword) -> bool {
        if self.len > other.len {
            return false;
        }
        if self.len == 0 {
            return true;
        }
        other.bits >> (other.len - self.len) == self.bits
    }
}

impl fmt::Display for Codeword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.iter() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// A node in the code tree.
#[derive(Debug, Clone)]
struct HuffmanNode<T> {
    /// Weight of this node (or subtree).
    weight: u64,
    /// The symbol carried by a leaf; `None` for internal nodes.
    symbol: Option<T>,
    /// Left child index ('0' branch).
    left: Option<usize>,
    /// Right child index ('1' branch).
    right: Option<usize>,
}

impl<T> HuffmanNode<T> {
    fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// A Huffman code table over arbitrary symbols.
///
/// Leaves occupy the first `leaf_count` slots of `nodes`, in input order;
/// internal nodes are appended after them as they are merged.
#[derive(Debug, Clone)]
pub struct HuffmanTree<T> {
    nodes: Vec<HuffmanNode<T>>,
    root: usize,
    /// Codeword of each leaf, indexed like the input symbols.
    codes: Vec<Codeword>,
}

impl<T> HuffmanTree<T> {
    /// Build a code table from `(symbol, weight)` pairs.
    pub fn from_weighted<I>(symbols: I) -> PtResult<Self>
    where
        I: IntoIterator<Item = (T, u64)>,
    {
        let mut nodes: Vec<HuffmanNode<T>> = symbols
            .into_iter()
            .map(|(symbol, weight)| HuffmanNode {
                weight,
                symbol: Some(symbol),
                left: None,
                right: None,
            })
            .collect();
        if nodes.is_empty() {
            return Err(PtError::EmptySymbolSet);
        }
        let leaf_count = nodes.len();

        // Keyed by (weight, creation index). Leaves come first in input
        // order and merged nodes are created in merge order, so this pops
        // exactly what a first-encountered linear scan would pick.
        let mut heap = MinHeap::with_capacity(leaf_count);
        for (idx, node) in nodes.iter().enumerate() {
            heap.push((node.weight, idx), idx);
        }
        while heap.len() > 1 {
            let (Some(((left_weight, _), left)), Some(((right_weight, _), right))) =
                (heap.pop(), heap.pop())
            else {
                break;
            };
            let merged = nodes.len();
            let weight = left_weight.saturating_add(right_weight);
            nodes.push(HuffmanNode {
                weight,
                symbol: None,
                left: Some(left),
                right: Some(right),
            });
            heap.push((weight, merged), merged);
        }
        let root = heap.pop().map_or(0, |(_, idx)| idx);

        let mut codes = vec![Codeword::EMPTY; leaf_count];
        Self::generate_codes(&nodes, root, Codeword::EMPTY, &mut codes)?;

        Ok(HuffmanTree { nodes, root, codes })
    }

    /// Build a code table with rank weights: the k-th symbol (0-indexed)
    /// gets weight `first_rank + k`.
    pub fn ranked<I>(symbols: I, first_rank: u64) -> PtResult<Self>
    where
        I: IntoIterator<Item = T>,
    {
        Self::from_weighted(symbols.into_iter().zip(first_rank..))
    }

    /// Recursively assign codewords to every leaf below `idx`.
    fn generate_codes(
        nodes: &[HuffmanNode<T>],
        idx: usize,
        prefix: Codeword,
        codes: &mut [Codeword],
    ) -> PtResult<()> {
        match (nodes[idx].left, nodes[idx].right) {
            (Some(left), Some(right)) => {
                let too_long = PtError::CodeTooLong(MAX_CODE_BITS);
                let left_code = prefix.pushed(false).ok_or_else(|| too_long.clone())?;
                let right_code = prefix.pushed(true).ok_or(too_long)?;
                Self::generate_codes(nodes, left, left_code, codes)?;
                Self::generate_codes(nodes, right, right_code, codes)
            }
            _ => {
                codes[idx] = prefix;
                Ok(())
            }
        }
    }

    /// Number of symbols in the table.
    pub fn leaf_count(&self) -> usize {
        self.codes.len()
    }

    /// Codeword of the `index`-th input symbol.
    pub fn code_at(&self, index: usize) -> Option<Codeword> {
        self.codes.get(index).copied()
    }

    /// Symbol and weight of the `index`-th input symbol.
    pub fn symbol_at(&self, index: usize) -> Option<(&T, u64)> {
        let node = self.nodes.get(index).filter(|_| index < self.codes.len())?;
        node.symbol.as_ref().map(|s| (s, node.weight))
    }

    /// Length of the longest codeword.
    pub fn max_code_len(&self) -> u32 {
        self.codes.iter().map(Codeword::len).max().unwrap_or(0)
    }

    /// Iterate over `(symbol, codeword)` in input order.
    pub fn codewords(&self) -> impl Iterator<Item = (&T, Codeword)> + '_ {
        self.nodes
            .iter()
            .zip(self.codes.iter())
            .filter_map(|(node, &code)| node.symbol.as_ref().map(|s| (s, code)))
    }

    /// Look up a complete codeword.
    ///
    /// Returns the symbol only if `prefix` lands exactly on a leaf; an
    /// internal node (a proper prefix of some codeword) yields `None`.
    pub fn decode(&self, prefix: &Codeword) -> Option<&T> {
        let mut idx = self.root;
        for bit in prefix.iter() {
            idx = if bit {
                self.nodes[idx].right?
            } else {
                self.nodes[idx].left?
            };
        }
        self.nodes[idx].symbol.as_ref()
    }

    /// Start an incremental decode at the root.
    pub fn cursor(&self) -> PrefixDecoder<'_, T> {
        PrefixDecoder {
            tree: self,
            node: self.root,
            consumed: 0,
        }
    }
}

impl<T: PartialEq> HuffmanTree<T> {
    /// Codeword of `symbol`, if the table contains it.
    pub fn encode(&self, symbol: &T) -> Option<Codeword> {
        self.nodes[..self.codes.len()]
            .iter()
            .position(|node| node.symbol.as_ref() == Some(symbol))
            .map(|idx| self.codes[idx])
    }
}

impl<T: fmt::Debug> HuffmanTree<T> {
    /// Log every codeword at trace level.
    pub fn trace_codes(&self, label: &str) {
        if !tracing::enabled!(tracing::Level::TRACE) {
            return;
        }
        for (idx, (symbol, code)) in self.codewords().enumerate() {
            tracing::trace!(
                table = label,
                weight = self.nodes[idx].weight,
                code = %code,
                "{:?}",
                symbol
            );
        }
    }
}

/// Incremental decoder equivalent to the prefix-growing lookup loop:
/// each pushed bit extends the prefix by one, and the first leaf reached
/// is the match.
#[derive(Debug, Clone)]
pub struct PrefixDecoder<'t, T> {
    tree: &'t HuffmanTree<T>,
    node: usize,
    consumed: u32,
}

impl<'t, T> PrefixDecoder<'t, T> {
    /// The symbol matched by the prefix so far, if it is a full codeword.
    pub fn matched(&self) -> Option<&'t T> {
        let node = &self.tree.nodes[self.node];
        if node.is_leaf() {
            node.symbol.as_ref()
        } else {
            None
        }
    }

    /// Extend the prefix by one bit and return the match, if any.
    ///
    /// Pushing onto a completed match has no effect.
    pub fn push(&mut self, bit: bool) -> Option<&'t T> {
        let node = &self.tree.nodes[self.node];
        let next = if bit { node.right } else { node.left };
        if let Some(next) = next {
            self.node = next;
            self.consumed += 1;
        }
        self.matched()
    }

    /// Number of bits pushed so far.
    pub fn consumed(&self) -> u32 {
        self.consumed
    }
}
