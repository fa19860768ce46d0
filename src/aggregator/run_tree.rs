//! Reconstructed call tree for one run.
//!
//! Nodes live in an arena owned by the [`RunTree`]; parent and child links
//! are [`NodeId`] handles into it. Children are appended only while the
//! tree is built, in call order, which keeps the graph a proper rooted tree.

use super::stats::FuncStats;
use crate::utils::error::TraceError;
use std::collections::HashMap;
use std::fmt;

/// Handle to a node inside its [`RunTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// One call, fused from its entry and return events
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    pub call_id: u64,
    pub thread_id: u64,
    pub depth: u32,
    pub start_time: u64,
    pub total_time: u64,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub(crate) fn new(
        name: String,
        call_id: u64,
        thread_id: u64,
        depth: u32,
        start_time: u64,
        total_time: u64,
    ) -> Self {
        Self {
            name,
            call_id,
            thread_id,
            depth,
            start_time,
            total_time,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Call tree of a single run, rooted at call id 0
#[derive(Debug, Clone)]
pub struct RunTree {
    run_id: u64,
    nodes: Vec<Node>,
}

impl RunTree {
    /// Start a tree from its root node
    pub(crate) fn new(run_id: u64, root: Node) -> Self {
        Self {
            run_id,
            nodes: vec![root],
        }
    }

    /// Append `node` as the last child of `parent`
    ///
    /// **Crate** - only the tree builder grows trees, which keeps every
    /// child exactly one level below its parent
    pub(crate) fn attach(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn parent(&self, id: NodeId) -> Option<&Node> {
        self.node(id).parent.map(|p| self.node(p))
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &Node> + '_ {
        self.node(id).children.iter().map(move |&c| self.node(c))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Apply `f` to every node, parents before children
    pub fn preorder_map<T>(&self, mut f: impl FnMut(&Node) -> T) -> Vec<T> {
        let mut result = Vec::with_capacity(self.nodes.len());
        let mut pending = vec![self.root()];

        while let Some(id) = pending.pop() {
            let node = self.node(id);
            result.push(f(node));
            // Reversed so the first child is visited next
            pending.extend(node.children.iter().rev().copied());
        }

        result
    }

    /// Apply `f` to every node, children before parents
    pub fn postorder_map<T>(&self, mut f: impl FnMut(&Node) -> T) -> Vec<T> {
        let mut result = Vec::with_capacity(self.nodes.len());
        // (node, children already expanded)
        let mut pending = vec![(self.root(), false)];

        while let Some((id, expanded)) = pending.pop() {
            let node = self.node(id);
            if expanded {
                result.push(f(node));
            } else {
                pending.push((id, true));
                pending.extend(node.children.iter().rev().map(|&c| (c, false)));
            }
        }

        result
    }

    /// Single-call statistics for one node
    fn node_stats(&self, node: &Node) -> Result<FuncStats, TraceError> {
        let children: Vec<&Node> = node.children.iter().map(|&c| self.node(c)).collect();

        FuncStats::for_call(
            &node.name,
            node.total_time,
            children.iter().map(|c| c.total_time),
            node.depth,
            node.parent.map(|p| self.node(p).name.as_str()),
            children.iter().map(|c| c.name.as_str()),
        )
        .map_err(|_| {
            TraceError::malformed_tree(
                self.run_id,
                node.call_id,
                "call times overflow a signed 64-bit value",
            )
        })
    }

    /// Per-function statistics for this run
    ///
    /// **Public** - feeds the cross-run aggregator
    ///
    /// # Returns
    /// One merged record per function name, in first-visit (pre-order) order
    ///
    /// # Errors
    /// * `TraceError::MalformedTree` - a call's times overflow
    /// * `TraceError::TimeOverflow` - summing one function's calls overflows
    pub fn stats(&self) -> Result<Vec<FuncStats>, TraceError> {
        let mut order: Vec<String> = Vec::new();
        let mut grouped: HashMap<String, FuncStats> = HashMap::new();

        for stats in self.preorder_map(|node| self.node_stats(node)) {
            let stats = stats?;
            match grouped.get_mut(&stats.name) {
                Some(existing) => existing.absorb(stats)?,
                None => {
                    order.push(stats.name.clone());
                    grouped.insert(stats.name.clone(), stats);
                }
            }
        }

        Ok(order
            .into_iter()
            .filter_map(|name| grouped.remove(&name))
            .collect())
    }
}

impl fmt::Display for RunTree {
    /// One line per call, indented by depth: `|______> name`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines = self.preorder_map(|node| {
            format!("|{}> {}", "___".repeat(node.depth as usize), node.name)
        });
        for line in lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn node(name: &str, call_id: u64, depth: u32, total_time: u64) -> Node {
        Node::new(name.to_string(), call_id, 1, depth, call_id * 10, total_time)
    }

    // main(0) -> [parse(1) -> [lex(2)], eval(3), parse(4)]
    fn sample_tree() -> RunTree {
        let mut tree = RunTree::new(7, node("main", 0, 0, 100));
        let root = tree.root();
        let parse = tree.attach(root, node("parse", 1, 1, 40));
        tree.attach(parse, node("lex", 2, 2, 15));
        tree.attach(root, node("eval", 3, 1, 30));
        tree.attach(root, node("parse", 4, 1, 10));
        tree
    }

    #[test]
    fn test_preorder_map() {
        let tree = sample_tree();
        let ids = tree.preorder_map(|n| n.call_id);
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_postorder_map() {
        let tree = sample_tree();
        let ids = tree.postorder_map(|n| n.call_id);
        assert_eq!(ids, vec![2, 1, 3, 4, 0]);
    }

    #[test]
    fn test_maps_are_repeatable() {
        let tree = sample_tree();
        assert_eq!(tree.preorder_map(|n| n.call_id), tree.preorder_map(|n| n.call_id));
    }

    #[test]
    fn test_parent_links() {
        let tree = sample_tree();
        let root = tree.root();
        assert!(tree.parent(root).is_none());

        let first_child = tree.node(root).children()[0];
        assert_eq!(tree.parent(first_child).map(|p| p.call_id), Some(0));
        assert_eq!(tree.children(root).count(), 3);
        assert_eq!(tree.node_count(), 5);
    }

    #[test]
    fn test_stats_groups_by_name() {
        let tree = sample_tree();
        let stats = tree.stats().unwrap();

        let names: Vec<&str> = stats.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["main", "parse", "lex", "eval"]);

        let main = &stats[0];
        assert_eq!(main.contrib_time, 100 - 40 - 30 - 10);
        assert_eq!(main.callees.len(), 2);
        assert!(main.callers.is_empty());

        let parse = &stats[1];
        assert_eq!(parse.call_count, 2);
        assert_eq!(parse.total_time, 50);
        assert_eq!(parse.contrib_time, (40 - 15) + 10);
        assert_eq!(parse.depths, vec![1, 1]);
        assert_eq!(parse.callers.iter().collect::<Vec<_>>(), vec!["main"]);
        assert_eq!(parse.callees.iter().collect::<Vec<_>>(), vec!["lex"]);
    }

    #[test]
    fn test_stats_reports_overflowing_call() {
        let mut tree = RunTree::new(3, node("main", 0, 0, 10));
        let root = tree.root();
        tree.attach(root, node("a", 1, 1, i64::MAX as u64));
        tree.attach(root, node("b", 2, 1, 1));

        let err = tree.stats().unwrap_err();
        assert!(matches!(
            err,
            TraceError::MalformedTree {
                run_id: 3,
                call_id: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_display_indents_by_depth() {
        let tree = sample_tree();
        assert_eq!(
            tree.to_string(),
            "|> main\n|___> parse\n|______> lex\n|___> eval\n|___> parse\n"
        );
    }
}
