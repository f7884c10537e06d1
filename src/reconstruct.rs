/// Path tree reconstruction from the payload bitstream.
///
/// Nodes are decoded in placeholder order. For each node the stream holds
/// zero or more (name codeword, link codeword) pairs followed by the
/// sentinel's name codeword:
///
/// ```text
/// node 0: name link name link ... END
/// node 1: END
/// node 2: name link END
/// ...
/// ```
///
/// Running out of bits ends the decode wherever it happens; the edges
/// completed so far are kept.
use std::sync::Arc;

use crate::bitstream::BitReader;
use crate::huffman::HuffmanTree;
use crate::tree::{Edge, NodeId, PathTree};
use crate::PtResult;

/// A symbol of the name table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameSymbol {
    /// Index into the dictionary.
    Entry(usize),
    /// End of the current node's edge list.
    End,
}

/// The name table and the node-link table for one blob.
#[derive(Debug, Clone)]
pub struct CodeTables {
    pub names: HuffmanTree<NameSymbol>,
    /// `None` when there are fewer than two placeholders: the root is never
    /// a link target, so no other target exists.
    pub links: Option<HuffmanTree<NodeId>>,
}

impl CodeTables {
    /// Build both tables with rank weights: dictionary entry k (1-indexed)
    /// weighs k and the sentinel weighs `dictionary_len + 1`; placeholder
    /// k weighs k, with placeholder 0 left out.
    pub fn new(dictionary_len: usize, node_count: usize) -> PtResult<Self> {
        let names = HuffmanTree::ranked(
            (0..dictionary_len)
                .map(NameSymbol::Entry)
                .chain(std::iter::once(NameSymbol::End)),
            1,
        )?;
        let links = if node_count > 1 {
            Some(HuffmanTree::ranked(1..node_count, 1)?)
        } else {
            None
        };
        names.trace_codes("names");
        if let Some(links) = &links {
            links.trace_codes("links");
        }
        Ok(CodeTables { names, links })
    }
}

/// Counters describing one reconstruction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconstructStats {
    /// Bits read from the stream.
    pub bits_consumed: usize,
    /// Edges appended to the tree.
    pub edges: usize,
    /// Nodes whose edge list ended with the sentinel.
    pub nodes_completed: usize,
    /// True if the stream ran out before every node saw its sentinel.
    pub exhausted: bool,
}

/// How decoding of one node ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeOutcome {
    /// The sentinel was read.
    Complete,
    /// The stream ran out first.
    Exhausted,
}

/// The mutable part of a reconstruction: bit cursor, the node being
/// decoded, and the edges accumulated for it.
#[derive(Debug, Clone)]
pub struct ReconstructState<'a> {
    pub bits: BitReader<'a>,
    pub node: NodeId,
    pub pending: Vec<Edge>,
    pub stats: ReconstructStats,
}

impl<'a> ReconstructState<'a> {
    pub fn new(bits: BitReader<'a>) -> Self {
        ReconstructState {
            bits,
            node: 0,
            pending: Vec::new(),
            stats: ReconstructStats::default(),
        }
    }
}

/// Drives the two code tables over a bitstream.
#[derive(Debug, Clone, Copy)]
pub struct Reconstructor<'t> {
    tables: &'t CodeTables,
    names: &'t [Arc<str>],
}

impl<'t> Reconstructor<'t> {
    pub fn new(tables: &'t CodeTables, names: &'t [Arc<str>]) -> Self {
        Reconstructor { tables, names }
    }

    /// Decode `node_count` placeholders from `bits`. Placeholder 0 of the
    /// returned tree is the root.
    pub fn run(&self, bits: BitReader<'_>, node_count: usize) -> (PathTree, ReconstructStats) {
        let mut tree = PathTree::with_placeholders(node_count);
        let mut state = ReconstructState::new(bits);

        for node in 0..node_count {
            state.node = node;
            let outcome = self.decode_node(&mut state);
            tree.extend_edges(node, state.pending.drain(..));
            if outcome == NodeOutcome::Exhausted {
                state.stats.exhausted = true;
                tracing::debug!(
                    node,
                    node_count,
                    bits = state.bits.position(),
                    "bitstream exhausted before last node"
                );
                break;
            }
        }
        state.stats.bits_consumed = state.bits.position();
        (tree, state.stats)
    }

    /// Decode the edge list of `state.node` into `state.pending`.
    pub fn decode_node(&self, state: &mut ReconstructState<'_>) -> NodeOutcome {
        loop {
            let name = match self.next_name(&mut state.bits) {
                None => return NodeOutcome::Exhausted,
                Some(NameSymbol::End) => {
                    state.stats.nodes_completed += 1;
                    return NodeOutcome::Complete;
                }
                Some(NameSymbol::Entry(idx)) => idx,
            };
            let Some(target) = self.next_link(&mut state.bits) else {
                return NodeOutcome::Exhausted;
            };
            let edge = Edge {
                name: Arc::clone(&self.names[name]),
                target,
            };
            tracing::trace!(node = state.node, name = %edge.name, target, "edge");
            state.pending.push(edge);
            state.stats.edges += 1;
        }
    }

    /// Read one name-table symbol.
    pub fn next_name(&self, bits: &mut BitReader<'_>) -> Option<NameSymbol> {
        decode_symbol(&self.tables.names, bits).copied()
    }

    /// Read one node-link symbol.
    pub fn next_link(&self, bits: &mut BitReader<'_>) -> Option<NodeId> {
        decode_symbol(self.tables.links.as_ref()?, bits).copied()
    }
}

/// Grow a prefix one bit at a time until it matches a codeword. A
/// single-symbol table matches the empty prefix and reads nothing.
fn decode_symbol<'t, T>(table: &'t HuffmanTree<T>, bits: &mut BitReader<'_>) -> Option<&'t T> {
    let mut cursor = table.cursor();
    loop {
        if let Some(symbol) = cursor.matched() {
            return Some(symbol);
        }
        cursor.push(bits.next_bit()?);
    }
}
