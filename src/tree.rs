/// The decoded path tree.
///
/// Nodes live in an arena indexed by placeholder number; node 0 is the
/// root. Edges carry a segment name and the index of their target node.
/// Well-formed input yields a tree (targets may be shared, e.g. a common
/// leaf), but nothing in the wire format rules out back-edges, so every
/// traversal here is bounded.
use std::fmt;
use std::sync::Arc;

use crate::{PtError, PtResult};

/// Index of a node in a [`PathTree`].
pub type NodeId = usize;

/// The root's index.
pub const ROOT: NodeId = 0;

/// Most paths [`PathTree::paths`] will list.
pub const DEFAULT_PATH_LIMIT: usize = 1 << 20;

/// A labeled edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub name: Arc<str>,
    pub target: NodeId,
}

/// A vertex of the path tree with its outgoing edges in decode order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathNode {
    edges: Vec<Edge>,
}

impl PathNode {
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// True if the node has no children.
    pub fn is_terminal(&self) -> bool {
        self.edges.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTree {
    nodes: Vec<PathNode>,
}

impl PathTree {
    /// A tree of `count` childless placeholders. The root always exists,
    /// even when `count` is zero.
    pub fn with_placeholders(count: usize) -> Self {
        PathTree {
            nodes: vec![PathNode::default(); count.max(1)],
        }
    }

    /// A lone childless root.
    pub fn empty() -> Self {
        Self::with_placeholders(1)
    }

    pub fn root(&self) -> &PathNode {
        &self.nodes[ROOT]
    }

    pub fn node(&self, id: NodeId) -> Option<&PathNode> {
        self.nodes.get(id)
    }

    /// Number of placeholders, reachable or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the root has no children.
    pub fn is_empty(&self) -> bool {
        self.root().is_terminal()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.edges.len()).sum()
    }

    /// Append `edges` to the edge list of `node`.
    pub(crate) fn extend_edges(&mut self, node: NodeId, edges: impl IntoIterator<Item = Edge>) {
        self.nodes[node].edges.extend(edges);
    }

    /// Number of root-to-terminal paths, saturating at `u64::MAX`.
    ///
    /// Fails with [`PtError::Cycle`] if a cycle is reachable from the root.
    pub fn path_count(&self) -> PtResult<u64> {
        if let Some(node) = self.find_cycle() {
            return Err(PtError::Cycle { node });
        }
        if self.is_empty() {
            return Ok(0);
        }
        // Post-order over the reachable DAG; each node is counted once.
        let mut counts: Vec<Option<u64>> = vec![None; self.nodes.len()];
        let mut stack: Vec<(NodeId, usize)> = vec![(ROOT, 0)];
        while let Some(top) = stack.last_mut() {
            let (node, next) = *top;
            let edges = &self.nodes[node].edges;
            match edges.get(next) {
                Some(edge) => {
                    top.1 += 1;
                    if counts[edge.target].is_none() {
                        stack.push((edge.target, 0));
                    }
                }
                None => {
                    let count = if edges.is_empty() {
                        1
                    } else {
                        edges
                            .iter()
                            .map(|e| counts[e.target].unwrap_or(0))
                            .fold(0u64, u64::saturating_add)
                    };
                    counts[node] = Some(count);
                    stack.pop();
                }
            }
        }
        Ok(counts[ROOT].unwrap_or(0))
    }

    /// Every root-to-terminal path, in edge order, as `/a/b/c` strings.
    ///
    /// Refuses cyclic trees and trees with more than
    /// [`DEFAULT_PATH_LIMIT`] paths.
    pub fn paths(&self) -> PtResult<Vec<String>> {
        self.paths_limited(DEFAULT_PATH_LIMIT)
    }

    /// Like [`PathTree::paths`], failing with [`PtError::TooManyPaths`]
    /// when more than `limit` paths exist.
    pub fn paths_limited(&self, limit: usize) -> PtResult<Vec<String>> {
        let count = self.path_count()?;
        if count > u64::try_from(limit).unwrap_or(u64::MAX) {
            tracing::warn!(count, limit, "refusing to list paths");
            return Err(PtError::TooManyPaths { count, limit });
        }

        let mut paths = Vec::with_capacity(count as usize);
        if count == 0 {
            return Ok(paths);
        }
        // (node, next edge index, length of `prefix` when node was entered)
        let mut stack: Vec<(NodeId, usize, usize)> = vec![(ROOT, 0, 0)];
        let mut prefix = String::new();

        while let Some(top) = stack.last_mut() {
            let (node, next, len) = *top;
            let edges = &self.nodes[node].edges;
            if next == 0 && edges.is_empty() {
                paths.push(prefix.clone());
            }
            let Some(edge) = edges.get(next) else {
                stack.pop();
                prefix.truncate(len);
                continue;
            };
            top.1 += 1;
            let entered_at = prefix.len();
            prefix.push('/');
            prefix.push_str(&edge.name);
            stack.push((edge.target, 0, entered_at));
        }
        Ok(paths)
    }

    /// A node on a cycle reachable from the root, if any.
    pub fn find_cycle(&self) -> Option<NodeId> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            Active,
            Done,
        }
        let mut marks = vec![Mark::Unvisited; self.nodes.len()];
        let mut stack: Vec<(NodeId, usize)> = vec![(ROOT, 0)];
        marks[ROOT] = Mark::Active;

        while let Some(top) = stack.last_mut() {
            let (node, next) = *top;
            match self.nodes[node].edges.get(next) {
                None => {
                    marks[node] = Mark::Done;
                    stack.pop();
                }
                Some(edge) => {
                    top.1 += 1;
                    match marks[edge.target] {
                        Mark::Active => return Some(edge.target),
                        Mark::Done => {}
                        Mark::Unvisited => {
                            marks[edge.target] = Mark::Active;
                            stack.push((edge.target, 0));
                        }
                    }
                }
            }
        }
        None
    }

    /// Indented structure listing, one line per reachable node.
    pub fn dump(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PathTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack: Vec<(NodeId, usize)> = vec![(ROOT, 0)];
        while let Some((node, depth)) = stack.pop() {
            write!(f, "{:indent$}Node [{node}]", "", indent = depth * 2)?;
            if visited[node] {
                writeln!(f, " ...")?;
                continue;
            }
            visited[node] = true;
            for edge in &self.nodes[node].edges {
                write!(f, " v [{} {{{}}}]", edge.name, edge.target)?;
            }
            writeln!(f)?;
            for edge in self.nodes[node].edges.iter().rev() {
                stack.push((edge.target, depth + 1));
            }
        }
        Ok(())
    }
}
