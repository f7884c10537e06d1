/// End-to-end validation of blob decoding.
///
/// These tests verify:
/// 1. **Reference fixtures** - small hand-specified trees decode as expected
/// 2. **Realistic content sets** - hundreds of content URLs, continuation headers
/// 3. **Truncation** - bitstreams cut at byte boundaries and mid-codeword
/// 4. **Malformed input** - header, dictionary and node-limit failures
/// 5. **Options** - split strategies and the cycle guard
/// 6. **Producer blobs** - captured output of the content producer
#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};
    use std::io::Write;

    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    use crate::bitstream::BitWriter;
    use crate::decoder::{decode, decode_detailed, decode_with_options, DecodeOptions};
    use crate::dictionary::{SplitStrategy, PRODUCER_LEVEL};
    use crate::reconstruct::{CodeTables, NameSymbol};
    use crate::tree::NodeId;
    use crate::varint;
    use crate::PtError;

    // ---------------------------------------------------------------
    // Helper: fixture writer
    // ---------------------------------------------------------------

    fn deflate(text: &[u8], level: u32) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level));
        encoder.write_all(text).unwrap();
        encoder.finish().unwrap()
    }

    /// Pack a dictionary, node count and per-node edge lists into a blob.
    fn build_blob_at(
        names: &[&str],
        node_count: usize,
        edges: &[Vec<(&str, NodeId)>],
        level: u32,
    ) -> Vec<u8> {
        let text: Vec<u8> = names
            .iter()
            .flat_map(|n| n.bytes().chain(std::iter::once(0)))
            .collect();
        let mut blob = deflate(&text, level);
        blob.extend(varint::encode_node_count(node_count as u64));

        let tables = CodeTables::new(names.len(), node_count).unwrap();
        let mut bits = BitWriter::new();
        for node in 0..node_count {
            for &(name, target) in edges.get(node).map(Vec::as_slice).unwrap_or(&[]) {
                let idx = names.iter().position(|n| *n == name).unwrap();
                bits.push_code(tables.names.encode(&NameSymbol::Entry(idx)).unwrap());
                bits.push_code(tables.links.as_ref().unwrap().encode(&target).unwrap());
            }
            bits.push_code(tables.names.encode(&NameSymbol::End).unwrap());
        }
        blob.extend(bits.finish());
        blob
    }

    fn build_blob(names: &[&str], node_count: usize, edges: &[Vec<(&str, NodeId)>]) -> Vec<u8> {
        build_blob_at(names, node_count, edges, PRODUCER_LEVEL)
    }

    /// Build a blob for a set of content paths the way the producer lays
    /// them out: one node per distinct prefix, every final segment pointing
    /// at a shared end node, names ordered by use count.
    fn blob_from_paths(paths: &[String]) -> Vec<u8> {
        let mut children: Vec<Vec<(String, NodeId)>> = vec![Vec::new()];
        let mut index: BTreeMap<(NodeId, String), NodeId> = BTreeMap::new();
        let mut leaf_edges: Vec<(NodeId, String)> = Vec::new();
        for path in paths {
            let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
            let mut node = 0;
            for (i, segment) in segments.iter().enumerate() {
                if i + 1 == segments.len() {
                    leaf_edges.push((node, segment.to_string()));
                    break;
                }
                let key = (node, segment.to_string());
                node = match index.get(&key) {
                    Some(&next) => next,
                    None => {
                        let next = children.len();
                        children.push(Vec::new());
                        children[node].push((segment.to_string(), next));
                        index.insert(key, next);
                        next
                    }
                };
            }
        }
        let end = children.len();
        children.push(Vec::new());
        for (node, name) in leaf_edges {
            children[node].push((name, end));
        }

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for (name, _) in children.iter().flatten() {
            *counts.entry(name.as_str()).or_default() += 1;
        }
        let mut names: Vec<&str> = counts.keys().copied().collect();
        names.sort_by_key(|n| counts[n]);

        let edges: Vec<Vec<(&str, NodeId)>> = children
            .iter()
            .map(|list| list.iter().map(|(n, t)| (n.as_str(), *t)).collect())
            .collect();
        build_blob(&names, children.len(), &edges)
    }

    fn content_urls(count: usize) -> Vec<String> {
        let mut urls: Vec<String> = (0..count)
            .map(|i| format!("/content/dist/rhel/$releasever-{i}/$basearch-{i}/debug-{i}"))
            .collect();
        urls.push("/content/dist/rhel/$releasever/$basearch/os".to_string());
        urls.push("/content/beta/rhel/$releasever/$basearch/source/SRPMS".to_string());
        urls
    }

    // ---------------------------------------------------------------
    // 1. Reference fixtures
    // ---------------------------------------------------------------

    #[test]
    fn test_two_node_reference() {
        let blob = build_blob(&["a", "b"], 2, &[vec![("a", 1)]]);
        let tree = decode(&blob).unwrap();
        assert!(tree.contains("/a"));
        assert!(!tree.contains("/a/b"));
        assert!(!tree.contains("/b"));
        assert_eq!(tree.paths().unwrap(), ["/a"]);
    }

    #[test]
    fn test_empty_dictionary_single_node() {
        let blob = build_blob(&[], 1, &[]);
        let tree = decode(&blob).unwrap();
        assert!(tree.is_empty());
        assert!(!tree.contains("/a"));
        assert!(!tree.contains("/content/dist"));
    }

    #[test]
    fn test_empty_blob() {
        let tree = decode(&[]).unwrap();
        assert!(tree.is_empty());
        assert!(!tree.contains("/anything"));
    }

    #[test]
    fn test_zero_declared_nodes() {
        let blob = build_blob(&["a"], 0, &[]);
        let decoded = decode_detailed(&blob, &DecodeOptions::default()).unwrap();
        assert_eq!(decoded.node_count, 0);
        assert!(decoded.tree.is_empty());
        assert!(!decoded.tree.contains("/a"));
    }

    #[test]
    fn test_shared_end_node() {
        let names = ["os", "debug", "rhel", "content"];
        let edges = vec![
            vec![("content", 1)],
            vec![("rhel", 2)],
            vec![("os", 3), ("debug", 3)],
        ];
        let blob = build_blob(&names, 4, &edges);
        let tree = decode(&blob).unwrap();
        assert!(tree.contains_all(["/content/rhel/os", "/content/rhel/debug"]));
        assert!(!tree.contains("/content/rhel"));
        assert_eq!(tree.edge_count(), 4);
    }

    // ---------------------------------------------------------------
    // 2. Realistic content sets
    // ---------------------------------------------------------------

    #[test]
    fn test_many_content_urls() {
        let urls = content_urls(100);
        let blob = blob_from_paths(&urls);
        let decoded = decode_detailed(&blob, &DecodeOptions::default()).unwrap();
        assert!(decoded.node_count > 127, "expected continuation header");
        assert!(!decoded.stats.exhausted);
        assert_eq!(decoded.stats.nodes_completed, decoded.node_count);

        let tree = decoded.tree;
        assert!(tree.contains_all(&urls));
        let listed: BTreeSet<String> = tree.paths().unwrap().into_iter().collect();
        let expected: BTreeSet<String> = urls.iter().cloned().collect();
        assert_eq!(listed, expected);

        assert!(!tree.contains("/content/dist/rhel/$releasever-0/$basearch-1/debug-0"));
        assert!(!tree.contains("/content/dist/rhel/$releasever-100/$basearch-100/debug-100"));
        assert!(!tree.contains("/content/dist/rhel"));
    }

    #[test]
    fn test_contains_all_entry_point() {
        let urls = content_urls(5);
        let blob = blob_from_paths(&urls);
        assert!(crate::contains_all(&blob, &urls).unwrap());
        assert!(!crate::contains_all(&blob, ["/content/dist/rhel/missing"]).unwrap());
    }

    #[test]
    fn test_single_path() {
        let urls = vec!["/only".to_string()];
        let tree = decode(&blob_from_paths(&urls)).unwrap();
        assert!(tree.contains("/only"));
        assert!(!tree.contains("/"));
    }

    #[test]
    fn test_parallel_decodes() {
        let blobs: Vec<Vec<u8>> = (1..5).map(|n| blob_from_paths(&content_urls(n * 10))).collect();
        std::thread::scope(|scope| {
            let handles: Vec<_> = blobs
                .iter()
                .map(|blob| scope.spawn(move || decode(blob).unwrap()))
                .collect();
            for (n, handle) in (1..5).zip(handles) {
                let tree = handle.join().unwrap();
                assert!(tree.contains_all(content_urls(n * 10)));
            }
        });
    }

    // ---------------------------------------------------------------
    // 3. Truncation
    // ---------------------------------------------------------------

    /// Blob, and the length of its zlib + header prefix.
    fn truncation_fixture() -> (Vec<u8>, usize) {
        let urls = content_urls(20);
        let blob = blob_from_paths(&urls);
        let decoded = decode_detailed(&blob, &DecodeOptions::default()).unwrap();
        let header_len = varint::encode_node_count(decoded.node_count as u64).len();
        (blob, decoded.payload_offset + header_len)
    }

    #[test]
    fn test_truncated_bitstream_keeps_decoded_edges() {
        let (blob, prefix_len) = truncation_fixture();
        let cut = prefix_len + (blob.len() - prefix_len) / 2;
        let decoded = decode_detailed(&blob[..cut], &DecodeOptions::default()).unwrap();
        assert!(decoded.stats.exhausted);
        assert_eq!(decoded.stats.bits_consumed, (cut - prefix_len) * 8);
        assert!(decoded.stats.nodes_completed < decoded.node_count);
        // The root is decoded first and survives.
        assert!(!decoded.tree.root().is_terminal());
        assert!(!decoded.tree.contains_all(content_urls(20)));
    }

    #[test]
    fn test_header_only_payload() {
        let (blob, prefix_len) = truncation_fixture();
        let decoded = decode_detailed(&blob[..prefix_len], &DecodeOptions::default()).unwrap();
        assert!(decoded.stats.exhausted);
        assert_eq!(decoded.stats.bits_consumed, 0);
        assert!(decoded.tree.is_empty());
    }

    #[test]
    fn test_every_truncation_point_decodes() {
        let (blob, prefix_len) = truncation_fixture();
        let mut previous_edges = 0;
        for cut in prefix_len..=blob.len() {
            let decoded = decode_detailed(&blob[..cut], &DecodeOptions::default()).unwrap();
            assert!(decoded.stats.edges >= previous_edges);
            previous_edges = decoded.stats.edges;
        }
        assert!(decode(&blob).unwrap().contains_all(content_urls(20)));
    }

    #[test]
    fn test_truncated_mid_codeword() {
        // names: a=0, END=1; links: node3=0, node1=10, node2=11.
        let mut blob = deflate(b"a\0", PRODUCER_LEVEL);
        blob.push(4);
        // a->1, a->2, then "a" and the first bit of a link.
        blob.push(0b0100_1101);
        let decoded = decode_detailed(&blob, &DecodeOptions::default()).unwrap();
        let targets: Vec<NodeId> = decoded.tree.root().edges().iter().map(|e| e.target).collect();
        assert_eq!(targets, [1, 2]);
        assert!(decoded.stats.exhausted);
        assert!(decoded.tree.contains("/a"));
    }

    // ---------------------------------------------------------------
    // 4. Malformed input
    // ---------------------------------------------------------------

    #[test]
    fn test_truncated_header_is_fatal() {
        let mut blob = deflate(b"a\0b\0", PRODUCER_LEVEL);
        blob.extend([0x82, 0x01]);
        assert_eq!(
            decode(&blob).unwrap_err(),
            PtError::TruncatedHeader {
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_node_limit() {
        let mut blob = deflate(b"a\0", PRODUCER_LEVEL);
        blob.extend([0x83, 0x20, 0x00, 0x00]);
        assert_eq!(
            decode(&blob).unwrap_err(),
            PtError::TooManyNodes {
                declared: 1 << 21,
                limit: 1 << 20
            }
        );

        let blob = blob_from_paths(&content_urls(3));
        let options = DecodeOptions {
            max_nodes: 4,
            ..DecodeOptions::default()
        };
        assert!(matches!(
            decode_with_options(&blob, &options),
            Err(PtError::TooManyNodes { limit: 4, .. })
        ));
    }

    #[test]
    fn test_garbage_dictionary() {
        let err = decode(&[0x78, 0xDA, 0xFF, 0x00, 0x01]).unwrap_err();
        assert!(matches!(
            err,
            PtError::Inflate(_) | PtError::TruncatedDictionary
        ));
    }

    // ---------------------------------------------------------------
    // 5. Options
    // ---------------------------------------------------------------

    #[test]
    fn test_split_strategies_agree_on_matching_level() {
        let urls = content_urls(8);
        let blob = blob_from_paths(&urls);
        let consumed = DecodeOptions {
            split: SplitStrategy::ConsumedInput,
            ..DecodeOptions::default()
        };
        let a = decode(&blob).unwrap();
        let b = decode_with_options(&blob, &consumed).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_recompress_level_follows_producer() {
        let names = ["rhel", "dist", "content"];
        let edges = vec![vec![("content", 1)], vec![("dist", 2)], vec![("rhel", 3)]];
        let blob = build_blob_at(&names, 4, &edges, 1);

        let at_level_one = DecodeOptions {
            split: SplitStrategy::Recompress { level: 1 },
            ..DecodeOptions::default()
        };
        let consumed = DecodeOptions {
            split: SplitStrategy::ConsumedInput,
            ..DecodeOptions::default()
        };
        for options in [at_level_one, consumed] {
            let tree = decode_with_options(&blob, &options).unwrap();
            assert!(tree.contains("/content/dist/rhel"));
        }
    }

    #[test]
    fn test_cycle_guard() {
        let edges = vec![vec![("a", 1)], vec![("b", 1)]];
        let blob = build_blob(&["a", "b"], 3, &edges);

        let tree = decode(&blob).unwrap();
        assert_eq!(tree.find_cycle(), Some(1));
        assert!(!tree.contains("/a"));
        assert!(!tree.contains("/a/b/b/b"));

        let guarded = DecodeOptions {
            reject_cycles: true,
            ..DecodeOptions::default()
        };
        assert_eq!(
            decode_with_options(&blob, &guarded).unwrap_err(),
            PtError::Cycle { node: 1 }
        );
    }

    // ---------------------------------------------------------------
    // 6. Producer blobs
    // ---------------------------------------------------------------

    /// `/only`, as written by the content producer: 13 zlib bytes, a
    /// count of 3 (root, end node, padding placeholder), one bitstream byte.
    const PRODUCER_SINGLE: &[u8] = include_bytes!("../samples/content_only.bin");

    /// 400 content paths over 440 distinct segment names, from the producer.
    const PRODUCER_CATALOG: &[u8] = include_bytes!("../samples/content_catalog.bin");
    const PRODUCER_CATALOG_PATHS: &str = include_str!("../samples/content_catalog.txt");

    #[test]
    fn test_producer_single_path() {
        assert_eq!(PRODUCER_SINGLE.len(), 15);
        let decoded = decode_detailed(PRODUCER_SINGLE, &DecodeOptions::default()).unwrap();
        assert_eq!(decoded.payload_offset, 13);
        assert_eq!(decoded.node_count, 3);
        assert_eq!(decoded.names, 1);
        assert!(!decoded.stats.exhausted);
        assert_eq!(decoded.tree.paths().unwrap(), ["/only"]);
        assert!(decoded.tree.contains("/only"));
        assert!(!decoded.tree.contains("/only/more"));
    }

    #[test]
    fn test_producer_catalog_recompressed_split() {
        let (text, consumed) = crate::dictionary::inflate(PRODUCER_CATALOG).unwrap();
        assert_eq!(
            crate::dictionary::deflated_len(&text, PRODUCER_LEVEL).unwrap(),
            consumed,
            "re-deflated dictionary must match the producer's zlib output"
        );

        let decoded = decode_detailed(PRODUCER_CATALOG, &DecodeOptions::default()).unwrap();
        assert_eq!(decoded.payload_offset, consumed);
        assert_eq!(decoded.names, 440);
        assert_eq!(decoded.node_count, 466);
        assert!(!decoded.stats.exhausted);

        let expected: Vec<&str> = PRODUCER_CATALOG_PATHS.lines().collect();
        assert_eq!(expected.len(), 400);
        assert!(decoded.tree.contains_all(&expected));

        let mut listed = decoded.tree.paths().unwrap();
        listed.sort();
        let mut sorted = expected.clone();
        sorted.sort();
        assert_eq!(listed, sorted);
    }

    #[test]
    fn test_producer_catalog_split_strategies_agree() {
        let consumed = DecodeOptions {
            split: SplitStrategy::ConsumedInput,
            ..DecodeOptions::default()
        };
        assert_eq!(
            decode(PRODUCER_CATALOG).unwrap(),
            decode_with_options(PRODUCER_CATALOG, &consumed).unwrap()
        );
    }
}
