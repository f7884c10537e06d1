/// Path membership queries.
///
/// A query path is split on `/`; the empty segment produced by a leading
/// separator is dropped. Starting at the root, each segment must match the
/// trimmed name of an outgoing edge, and the node reached by the last
/// segment must be terminal (have no children).
use crate::tree::{NodeId, PathTree, ROOT};

/// Split a query path into the segments that must be matched.
pub fn segments(path: &str) -> Vec<&str> {
    let mut parts = path.split('/');
    let first = parts.next().filter(|s| !s.is_empty());
    first.into_iter().chain(parts).collect()
}

impl PathTree {
    /// True if `path` names a root-to-terminal path of the tree.
    pub fn contains(&self, path: &str) -> bool {
        self.matches_from(ROOT, &segments(path))
    }

    /// True if every path is contained; stops at the first miss.
    pub fn contains_all<I, S>(&self, paths: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.first_missing(paths).is_none()
    }

    /// The first path that is not contained, if any.
    pub fn first_missing<I, S>(&self, paths: I) -> Option<S>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        paths.into_iter().find(|path| {
            let path: &str = path.as_ref();
            let found = self.contains(path);
            if !found {
                tracing::debug!(path, "path not in tree");
            }
            !found
        })
    }

    // Several edges of one node may share a name (a terminal `a` next to
    // an `a` subtree), so every matching edge is tried.
    fn matches_from(&self, node: NodeId, segments: &[&str]) -> bool {
        let Some(node) = self.node(node) else {
            return false;
        };
        let Some((segment, rest)) = segments.split_first() else {
            return node.is_terminal();
        };
        node.edges()
            .iter()
            .filter(|edge| edge.name.trim() == *segment)
            .any(|edge| self.matches_from(edge.target, rest))
    }
}
