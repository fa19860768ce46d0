//! Rebuild a run's call tree from its entry and return events.
//!
//! Call ids are handed out in entry order, so walking the fused calls by
//! ascending call id replays the stack discipline of the traced threads:
//!
//! ```text
//! call 0  main   depth 0     stack: [main]
//! call 1  parse  depth 1     stack: [main, parse]
//! call 2  lex    depth 2     stack: [main, parse, lex]
//! call 3  eval   depth 1     pop lex, parse -> parent main
//! ```

use super::run_tree::{Node, NodeId, RunTree};
use crate::parser::{EntryEvent, TraceEvent};
use crate::utils::config::ROOT_CALL_ID;
use crate::utils::error::TraceError;
use log::{debug, warn};
use std::collections::BTreeMap;

/// Entry and return fragments collected for one call id
#[derive(Debug, Default)]
struct CallFragments {
    entry: Option<EntryEvent>,
    total_time: Option<u64>,
}

/// Build the call tree for one run
///
/// **Public** - main entry point for tree reconstruction
///
/// # Arguments
/// * `run_id` - Run the events belong to
/// * `events` - Every event of that run, in arrival order
///
/// # Returns
/// A tree with one node per distinct call id, rooted at call id 0
///
/// # Errors
/// * `TraceError::EmptyRun` - no events at all
/// * `TraceError::MalformedTree` - foreign run id, duplicate entry, return
///   without entry, missing root, or a depth that breaks the stack discipline
/// * `TraceError::MissingReturn` - a call was entered but never returned
pub fn build_run_tree(run_id: u64, events: &[TraceEvent]) -> Result<RunTree, TraceError> {
    if events.is_empty() {
        return Err(TraceError::EmptyRun(run_id));
    }

    let calls = fuse_fragments(run_id, events)?;
    debug!("Run {}: fused {} calls from {} events", run_id, calls.len(), events.len());

    let mut calls = calls.into_iter();
    let root = match calls.next() {
        Some((ROOT_CALL_ID, node)) => node,
        Some((call_id, _)) => {
            return Err(TraceError::malformed_tree(
                run_id,
                call_id,
                "run has no root call (call id 0)",
            ))
        }
        None => return Err(TraceError::EmptyRun(run_id)),
    };

    let mut tree = RunTree::new(run_id, root);
    let mut open: Vec<NodeId> = vec![tree.root()];

    for (call_id, node) in calls {
        while let Some(&top) = open.last() {
            if tree.node(top).depth < node.depth {
                break;
            }
            open.pop();
        }

        let parent = *open.last().ok_or_else(|| {
            TraceError::malformed_tree(
                run_id,
                call_id,
                format!("no open call shallower than depth {}", node.depth),
            )
        })?;

        let parent_depth = tree.node(parent).depth;
        if node.depth != parent_depth + 1 {
            return Err(TraceError::malformed_tree(
                run_id,
                call_id,
                format!(
                    "depth {} does not follow parent depth {}",
                    node.depth, parent_depth
                ),
            ));
        }

        let id = tree.attach(parent, node);
        open.push(id);
    }

    Ok(tree)
}

/// Group fragments by call id and fuse each group into a node
///
/// **Private** - internal helper for build_run_tree
///
/// Entry attributes come from the entry fragment; the timing comes from
/// the last return fragment seen for the call.
fn fuse_fragments(run_id: u64, events: &[TraceEvent]) -> Result<BTreeMap<u64, Node>, TraceError> {
    let mut fragments: BTreeMap<u64, CallFragments> = BTreeMap::new();

    for event in events {
        let call_id = event.call_id();
        if event.run_id() != run_id {
            return Err(TraceError::malformed_tree(
                run_id,
                call_id,
                format!("event belongs to run {}", event.run_id()),
            ));
        }

        let slot = fragments.entry(call_id).or_default();
        match event {
            TraceEvent::Entry(entry) => {
                if slot.entry.is_some() {
                    return Err(TraceError::malformed_tree(
                        run_id,
                        call_id,
                        "duplicate entry event",
                    ));
                }
                slot.entry = Some(entry.clone());
            }
            TraceEvent::Return(ret) => {
                if slot.total_time.is_some() {
                    warn!(
                        "Run {}, call {}: multiple return events, keeping the last",
                        run_id, call_id
                    );
                }
                slot.total_time = Some(ret.total_time);
            }
        }
    }

    let mut nodes = BTreeMap::new();
    for (call_id, slot) in fragments {
        let entry = slot.entry.ok_or_else(|| {
            TraceError::malformed_tree(run_id, call_id, "return event without entry")
        })?;
        let total_time = slot
            .total_time
            .ok_or(TraceError::MissingReturn { run_id, call_id })?;

        nodes.insert(
            call_id,
            Node::new(
                entry.function_name,
                call_id,
                entry.thread_id,
                entry.depth,
                entry.start_time,
                total_time,
            ),
        );
    }

    check_return_names(run_id, events, &nodes);
    Ok(nodes)
}

/// Warn about returns whose function name differs from the entry's
///
/// **Private** - internal helper for fuse_fragments
fn check_return_names(run_id: u64, events: &[TraceEvent], nodes: &BTreeMap<u64, Node>) {
    for event in events {
        if let TraceEvent::Return(ret) = event {
            if let Some(node) = nodes.get(&ret.call_id) {
                if node.name != ret.function_name {
                    warn!(
                        "Run {}, call {}: return from {} does not match entry into {}",
                        run_id, ret.call_id, ret.function_name, node.name
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_trace_text;
    use pretty_assertions::assert_eq;

    fn build(text: &str) -> Result<RunTree, TraceError> {
        let events = parse_trace_text(text).unwrap();
        let run_id = events[0].run_id();
        build_run_tree(run_id, &events)
    }

    #[test]
    fn test_two_node_tree() {
        let tree = build(
            "foo 1 0 9 0 0\n\
             bar 1 1 9 1 1\n\
             bar 1 1 2\n\
             foo 1 0 5\n",
        )
        .unwrap();

        assert_eq!(tree.node_count(), 2);
        let root = tree.node(tree.root());
        assert_eq!(root.name, "foo");
        assert_eq!(root.call_id, 0);

        let children: Vec<&str> = tree.children(tree.root()).map(|n| n.name.as_str()).collect();
        assert_eq!(children, vec!["bar"]);

        let stats = tree.stats().unwrap();
        assert_eq!(stats[0].contrib_time, 3);
        assert_eq!(stats[1].contrib_time, 2);
    }

    #[test]
    fn test_unordered_events() {
        // Returns interleaved ahead of entries; call ids define order
        let tree = build(
            "c 0 2 1 1 30\n\
             c 0 2 5\n\
             a 0 0 50\n\
             b 0 1 1 1 10\n\
             b 0 1 10\n\
             a 0 0 1 0 0\n",
        )
        .unwrap();

        assert_eq!(tree.preorder_map(|n| n.name.clone()), vec!["a", "b", "c"]);
        let root_children: Vec<u64> = tree.children(tree.root()).map(|n| n.call_id).collect();
        assert_eq!(root_children, vec![1, 2]);
    }

    #[test]
    fn test_pops_to_shallower_ancestor() {
        let tree = build(
            "main 0 0 1 0 0\n\
             parse 0 1 1 1 1\n\
             lex 0 2 1 2 2\n\
             lex 0 2 1\n\
             parse 0 1 3\n\
             eval 0 3 1 1 5\n\
             eval 0 3 2\n\
             main 0 0 9\n",
        )
        .unwrap();

        let parents = tree.preorder_map(|n| n.call_id);
        assert_eq!(parents, vec![0, 1, 2, 3]);

        let eval = tree.node(tree.node(tree.root()).children()[1]);
        assert_eq!(eval.name, "eval");
        assert_eq!(eval.depth, 1);
    }

    #[test]
    fn test_depth_equals_parent_plus_one() {
        let tree = build(
            "main 0 0 1 0 0\n\
             a 0 1 1 1 1\n\
             b 0 2 1 2 2\n\
             c 0 3 1 1 3\n\
             b 0 2 1\na 0 1 1\nc 0 3 1\nmain 0 0 5\n",
        )
        .unwrap();

        let root = tree.root();
        for id in std::iter::once(root).chain(tree.node(root).children().iter().copied()) {
            for child in tree.children(id) {
                assert_eq!(child.depth, tree.node(id).depth + 1);
            }
        }
    }

    #[test]
    fn test_last_return_wins() {
        let tree = build("foo 0 0 1 0 0\nfoo 0 0 5\nfoo 0 0 8\n").unwrap();
        assert_eq!(tree.node(tree.root()).total_time, 8);
    }

    #[test]
    fn test_missing_return() {
        let err = build("foo 0 0 1 0 0\nbar 0 1 1 1 1\nfoo 0 0 5\n").unwrap_err();
        assert_eq!(err, TraceError::MissingReturn { run_id: 0, call_id: 1 });
    }

    #[test]
    fn test_missing_root() {
        let err = build("bar 3 1 1 1 1\nbar 3 1 1\n").unwrap_err();
        assert!(matches!(
            err,
            TraceError::MalformedTree { run_id: 3, call_id: 1, .. }
        ));
    }

    #[test]
    fn test_stack_underflow() {
        // A second depth-0 call has no open ancestor
        let err = build("foo 0 0 1 0 0\nfoo 0 0 5\nbar 0 1 1 0 1\nbar 0 1 1\n").unwrap_err();
        assert!(matches!(err, TraceError::MalformedTree { call_id: 1, .. }));
    }

    #[test]
    fn test_depth_gap_rejected() {
        let err = build("foo 0 0 1 0 0\nfoo 0 0 5\nbar 0 1 1 2 1\nbar 0 1 1\n").unwrap_err();
        assert!(matches!(err, TraceError::MalformedTree { call_id: 1, .. }));
    }

    #[test]
    fn test_duplicate_entry() {
        let err = build("foo 0 0 1 0 0\nfoo 0 0 1 0 3\nfoo 0 0 5\n").unwrap_err();
        assert!(matches!(err, TraceError::MalformedTree { call_id: 0, .. }));
    }

    #[test]
    fn test_return_without_entry() {
        let err = build("foo 0 0 1 0 0\nfoo 0 0 5\nbar 0 4 2\n").unwrap_err();
        assert!(matches!(err, TraceError::MalformedTree { call_id: 4, .. }));
    }

    #[test]
    fn test_foreign_run_rejected() {
        let events = parse_trace_text("foo 0 0 1 0 0\nfoo 1 0 5\n").unwrap();
        let err = build_run_tree(0, &events).unwrap_err();
        assert!(matches!(err, TraceError::MalformedTree { run_id: 0, .. }));
    }

    #[test]
    fn test_empty_run() {
        assert_eq!(build_run_tree(4, &[]).unwrap_err(), TraceError::EmptyRun(4));
    }
}
