//! Child-id registry
//!
//! Explicit parent→child adjacency backed by petgraph, plus a monotonic
//! per-parent counter for id allocation. Node ids keep the human-readable
//! `parent-n` surface (`root`, `root-1`, `root-2-1`, …) so exported
//! graphs stay recognizable, but identity is no longer derived by
//! re-scanning every id on each fork — the id pattern is only parsed once,
//! when re-seeding from a loaded graph.

use std::collections::HashMap;

use regex::Regex;
use rustworkx_core::petgraph::graph::{DiGraph, NodeIndex};
use rustworkx_core::petgraph::Direction;

pub struct ChildRegistry {
    graph: DiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
    counters: HashMap<String, u32>,
    suffix_re: Regex,
}

impl Default for ChildRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ChildRegistry {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
            counters: HashMap::new(),
            // greedy head so only the final "-<n>" counts as the suffix
            suffix_re: Regex::new(r"^(.+)-(\d+)$").expect("static pattern"),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    fn ensure(&mut self, id: &str) -> NodeIndex {
        if let Some(&ix) = self.index.get(id) {
            return ix;
        }
        let ix = self.graph.add_node(id.to_string());
        self.index.insert(id.to_string(), ix);
        ix
    }

    fn link(&mut self, parent: &str, child: &str) {
        let p = self.ensure(parent);
        let c = self.ensure(child);
        if !self.graph.contains_edge(p, c) {
            self.graph.add_edge(p, c, ());
        }
    }

    /// Allocate the next child id under `parent` and record the adjacency.
    /// Existing children `parent-1 .. parent-k` yield `parent-(k+1)`.
    pub fn allocate(&mut self, parent: &str) -> String {
        self.ensure(parent);
        let counter = self.counters.entry(parent.to_string()).or_insert(0);
        *counter += 1;
        let child = format!("{parent}-{counter}");
        self.link(parent, &child);
        child
    }

    /// Most recently allocated child of `parent` that still exists.
    pub fn last_child(&self, parent: &str) -> Option<String> {
        let mut n = self.counters.get(parent).copied()?;
        while n > 0 {
            let candidate = format!("{parent}-{n}");
            if self.contains(&candidate) {
                return Some(candidate);
            }
            n -= 1;
        }
        None
    }

    /// Direct children of `id`, in insertion order.
    pub fn children(&self, id: &str) -> Vec<String> {
        let Some(&ix) = self.index.get(id) else {
            return Vec::new();
        };
        let mut out: Vec<String> = self
            .graph
            .neighbors_directed(ix, Direction::Outgoing)
            .map(|c| self.graph[c].clone())
            .collect();
        // petgraph yields neighbors newest-first
        out.reverse();
        out
    }

    pub fn parent(&self, id: &str) -> Option<String> {
        let &ix = self.index.get(id)?;
        self.graph
            .neighbors_directed(ix, Direction::Incoming)
            .next()
            .map(|p| self.graph[p].clone())
    }

    /// Rebuild adjacency and counters from a loaded graph's node ids.
    /// This is the one place the `parent-n` pattern is parsed.
    pub fn seed<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        self.graph.clear();
        self.index.clear();
        self.counters.clear();
        for id in ids {
            self.ensure(id);
            if let Some(caps) = self.suffix_re.captures(id) {
                let parent = caps.get(1).expect("suffix groups").as_str().to_string();
                let n: u32 = caps
                    .get(2)
                    .expect("suffix groups")
                    .as_str()
                    .parse()
                    .unwrap_or(0);
                let counter = self.counters.entry(parent.clone()).or_insert(0);
                *counter = (*counter).max(n);
                self.link(&parent, id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_counts_existing_children() {
        let mut reg = ChildRegistry::new();
        reg.seed(["root", "root-1", "root-2"]);
        assert_eq!(reg.allocate("root"), "root-3");
        assert_eq!(reg.allocate("root-2"), "root-2-1");
    }

    #[test]
    fn fresh_parent_starts_at_one() {
        let mut reg = ChildRegistry::new();
        reg.seed(["root"]);
        assert_eq!(reg.allocate("root"), "root-1");
        assert_eq!(reg.allocate("root"), "root-2");
    }

    #[test]
    fn last_child_tracks_allocation() {
        let mut reg = ChildRegistry::new();
        reg.seed(["root"]);
        assert_eq!(reg.last_child("root"), None);
        reg.allocate("root");
        reg.allocate("root");
        assert_eq!(reg.last_child("root"), Some("root-2".into()));
    }

    #[test]
    fn seed_handles_nested_suffixes() {
        let mut reg = ChildRegistry::new();
        reg.seed(["root", "root-2", "root-2-7"]);
        assert_eq!(reg.allocate("root-2"), "root-2-8");
        assert_eq!(reg.parent("root-2-7"), Some("root-2".into()));
        // "root-2" itself was also linked under "root"
        assert_eq!(reg.allocate("root"), "root-3");
    }

    #[test]
    fn children_lists_direct_descendants_in_order() {
        let mut reg = ChildRegistry::new();
        reg.seed(["root"]);
        let a = reg.allocate("root");
        let b = reg.allocate("root");
        reg.allocate(&a);
        assert_eq!(reg.children("root"), vec![a.clone(), b]);
        assert_eq!(reg.children(&a).len(), 1);
    }
}
