/// One-call decoding of a compressed path tree blob.
///
/// **Blob layout:**
/// - zlib stream of NUL-terminated segment names (the dictionary)
/// - node count: one byte, or `0x80 | L` followed by `L` big-endian bytes
/// - bitstream: per node, (name, link) codeword pairs then the sentinel
use crate::bitstream::BitReader;
use crate::dictionary::{self, SplitStrategy};
use crate::reconstruct::{CodeTables, ReconstructStats, Reconstructor};
use crate::tree::PathTree;
use crate::varint;
use crate::{PtError, PtResult};

/// Default cap on the declared node count.
pub const DEFAULT_MAX_NODES: usize = 1 << 20;

/// Options controlling decoding.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// How the payload region is located after the dictionary.
    pub split: SplitStrategy,
    /// Reject blobs declaring more nodes than this.
    pub max_nodes: usize,
    /// Fail with [`PtError::Cycle`] if decoded edges form a cycle.
    pub reject_cycles: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            split: SplitStrategy::default(),
            max_nodes: DEFAULT_MAX_NODES,
            reject_cycles: false,
        }
    }
}

/// A decoded tree with details of how it was read.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub tree: PathTree,
    /// Number of dictionary names.
    pub names: usize,
    /// Declared node count.
    pub node_count: usize,
    /// Offset of the node-count header in the blob.
    pub payload_offset: usize,
    pub stats: ReconstructStats,
}

/// Decode a blob with default options.
pub fn decode(blob: &[u8]) -> PtResult<PathTree> {
    decode_with_options(blob, &DecodeOptions::default())
}

/// Decode a blob.
pub fn decode_with_options(blob: &[u8], options: &DecodeOptions) -> PtResult<PathTree> {
    decode_detailed(blob, options).map(|decoded| decoded.tree)
}

/// Decode a blob and report what was read.
pub fn decode_detailed(blob: &[u8], options: &DecodeOptions) -> PtResult<Decoded> {
    let split = dictionary::split(blob, options.split)?;
    let (declared, header_len) = varint::read_node_count(split.payload)?;
    let node_count = usize::try_from(declared)
        .ok()
        .filter(|&n| n <= options.max_nodes)
        .ok_or(PtError::TooManyNodes {
            declared,
            limit: options.max_nodes,
        })?;

    let tables = CodeTables::new(split.names.len(), node_count)?;
    let bits = BitReader::new(&split.payload[header_len..]);
    tracing::debug!(
        names = split.names.len(),
        node_count,
        payload_bits = bits.total_bits(),
        "reconstructing path tree"
    );
    let (tree, stats) = Reconstructor::new(&tables, &split.names).run(bits, node_count);
    tracing::debug!(
        edges = stats.edges,
        nodes_completed = stats.nodes_completed,
        bits_consumed = stats.bits_consumed,
        exhausted = stats.exhausted,
        "path tree decoded"
    );
    if tracing::enabled!(tracing::Level::TRACE) {
        tracing::trace!("decoded tree:\n{}", tree);
    }

    if options.reject_cycles {
        if let Some(node) = tree.find_cycle() {
            return Err(PtError::Cycle { node });
        }
    }

    Ok(Decoded {
        tree,
        names: split.names.len(),
        node_count,
        payload_offset: split.offset,
        stats,
    })
}

/// Decode `blob` and check that every path is present.
pub fn contains_all<I, S>(blob: &[u8], paths: I) -> PtResult<bool>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Ok(decode(blob)?.contains_all(paths))
}
