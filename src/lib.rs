//! Decoder for Huffman-packed content path trees.
//!
//! A blob holds a zlib-compressed dictionary of NUL-terminated path
//! segment names, followed by a node-count header and a bitstream that
//! lists, node by node, the labeled edges of a path tree. Names and edge
//! targets are coded with two rank-weighted Huffman tables that must match
//! the producer's tables bit for bit.
//!
//! ```no_run
//! let blob = std::fs::read("content.bin")?;
//! let tree = pathtree::decode(&blob)?;
//! assert!(tree.contains_all(["/content/dist/rhel/$releasever/$basearch/os"]));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod bitstream;
pub mod decoder;
pub mod dictionary;
pub mod huffman;
pub mod pqueue;
pub mod query;
pub mod reconstruct;
pub mod tree;
pub mod varint;

#[cfg(test)]
mod validation;

pub use decoder::{contains_all, decode, decode_detailed, decode_with_options, DecodeOptions, Decoded};
pub use dictionary::SplitStrategy;
pub use tree::{Edge, NodeId, PathNode, PathTree, DEFAULT_PATH_LIMIT};

/// Error types for path tree decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum PtError {
    /// The node-count header ends inside its continuation bytes.
    #[error("node count header truncated: expected {expected} length bytes, found {found}")]
    TruncatedHeader { expected: usize, found: usize },
    /// The node-count header declares more length bytes than fit a u64.
    #[error("node count header declares {0} length bytes")]
    HeaderOverflow(usize),
    /// The declared node count exceeds the configured limit.
    #[error("declared node count {declared} exceeds limit {limit}")]
    TooManyNodes { declared: u64, limit: usize },
    /// The zlib dictionary region is corrupt.
    #[error("dictionary inflate failed: {0}")]
    Inflate(String),
    /// The zlib dictionary region ends before its stream end marker.
    #[error("dictionary stream truncated")]
    TruncatedDictionary,
    /// Re-deflating the dictionary text failed.
    #[error("dictionary recompress failed: {0}")]
    Recompress(String),
    /// The computed payload offset lies beyond the blob.
    #[error("payload offset {offset} beyond blob of {len} bytes")]
    PayloadOffset { offset: usize, len: usize },
    /// A Huffman table was requested for no symbols at all.
    #[error("cannot build a code table from an empty symbol set")]
    EmptySymbolSet,
    /// A codeword would not fit the 64-bit codeword representation.
    #[error("codeword longer than {0} bits")]
    CodeTooLong(u32),
    /// The decoded edges form a cycle through the given node.
    #[error("decoded tree has a cycle through node {node}")]
    Cycle { node: usize },
    /// Listing would produce more paths than allowed.
    #[error("tree holds {count} paths, more than the limit of {limit}")]
    TooManyPaths { count: u64, limit: usize },
}

pub type PtResult<T> = Result<T, PtError>;
