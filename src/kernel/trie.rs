//! Syscall trie: prefix tree over parameter paths.
//!
//! Each edge is one parameter token, matched literally (no wildcards, no
//! partial-token matching). Nodes are created lazily by [`SyscallTrie::add_route`]
//! and never deleted; routes live for the lifetime of the kernel.
//!
//! The trie itself is not synchronized. The kernel keeps it behind a
//! reader/writer lock: lookups share the read side, `add_route` takes the
//! write side, so a reader sees a node's module list either before or after
//! a mutation, never halfway.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::modules::Module;

/// Identity comparison for modules (data pointer only).
pub(crate) fn same_module(a: &Arc<dyn Module>, b: &Arc<dyn Module>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

// ---------------------------------------------------------------------------
// SyscallNode
// ---------------------------------------------------------------------------

/// One node of the syscall trie.
#[derive(Default)]
pub struct SyscallNode {
    /// Modules known to handle this path, in registration order.
    modules: Vec<Arc<dyn Module>>,
    /// Child nodes keyed by the exact string form of the next token.
    children: HashMap<String, SyscallNode>,
}

impl SyscallNode {
    /// Modules registered at this node, in registration order.
    pub fn modules(&self) -> &[Arc<dyn Module>] {
        &self.modules
    }

    /// Child reached by `token`, if any.
    pub fn child(&self, token: &str) -> Option<&SyscallNode> {
        self.children.get(token)
    }

    /// Whether `module` (by identity) is registered here.
    pub fn contains(&self, module: &Arc<dyn Module>) -> bool {
        self.modules.iter().any(|m| same_module(m, module))
    }
}

impl std::fmt::Debug for SyscallNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyscallNode")
            .field(
                "modules",
                &self.modules.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .field("children", &self.children.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

/// A populated trie path, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    /// Token path from the root (empty for the root itself).
    pub path: Vec<String>,
    /// Names of the modules registered at the path, in order.
    pub modules: Vec<String>,
}

// ---------------------------------------------------------------------------
// SyscallTrie
// ---------------------------------------------------------------------------

/// Prefix tree mapping parameter paths to candidate modules.
#[derive(Debug)]
pub struct SyscallTrie {
    root: SyscallNode,
    node_count: usize,
}

impl SyscallTrie {
    /// Create a trie holding only an empty root.
    pub fn new() -> Self {
        Self {
            root: SyscallNode::default(),
            node_count: 1,
        }
    }

    /// The root node (empty path).
    pub fn root(&self) -> &SyscallNode {
        &self.root
    }

    /// Greedy longest literal-prefix match.
    ///
    /// Follows the edge for each token in order and stops at the first
    /// token with no matching child. Never misses: the worst case is the
    /// root. Does not allocate.
    pub fn best_match<S: AsRef<str>>(&self, path: &[S]) -> &SyscallNode {
        let mut current = &self.root;
        for token in path {
            match current.children.get(token.as_ref()) {
                Some(next) => current = next,
                None => break,
            }
        }
        current
    }

    /// Like [`best_match`](Self::best_match), but returns the deepest node
    /// on the matched path that has at least one module.
    ///
    /// Intermediate nodes created by route learning carry no modules; this
    /// keeps them from shadowing a populated ancestor such as a root
    /// catch-all. Falls back to the root. Does not allocate.
    pub fn resolve<S: AsRef<str>>(&self, path: &[S]) -> &SyscallNode {
        let mut current = &self.root;
        let mut populated = &self.root;
        for token in path {
            match current.children.get(token.as_ref()) {
                Some(next) => {
                    current = next;
                    if !current.modules.is_empty() {
                        populated = current;
                    }
                }
                None => break,
            }
        }
        populated
    }

    /// Register `module` at `path`, creating nodes as needed.
    ///
    /// A module already present at the path (by identity) is not added
    /// twice. Returns `true` if the module was newly added.
    pub fn add_route<S: AsRef<str>>(&mut self, path: &[S], module: Arc<dyn Module>) -> bool {
        let mut created = 0;
        let mut current = &mut self.root;
        for token in path {
            current = current
                .children
                .entry(token.as_ref().to_string())
                .or_insert_with(|| {
                    created += 1;
                    SyscallNode::default()
                });
        }
        self.node_count += created;

        if current.contains(&module) {
            return false;
        }
        current.modules.push(module);
        true
    }

    /// Total number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// All populated paths, sorted by path.
    pub fn routes(&self) -> Vec<Route> {
        let mut routes = Vec::new();
        let mut path = Vec::new();
        collect_routes(&self.root, &mut path, &mut routes);
        routes.sort_by(|a, b| a.path.cmp(&b.path));
        routes
    }
}

impl Default for SyscallTrie {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_routes(node: &SyscallNode, path: &mut Vec<String>, out: &mut Vec<Route>) {
    if !node.modules.is_empty() {
        out.push(Route {
            path: path.clone(),
            modules: node.modules.iter().map(|m| m.name().to_string()).collect(),
        });
    }
    for (token, child) in &node.children {
        path.push(token.clone());
        collect_routes(child, path, out);
        path.pop();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::{Acceptance, ModuleError, Parm};
    use async_trait::async_trait;

    struct Stub(&'static str);

    #[async_trait]
    impl Module for Stub {
        fn name(&self) -> &str {
            self.0
        }

        async fn accept(&self, _parms: &[Parm]) -> Result<Acceptance, ModuleError> {
            Ok(Acceptance::accept(serde_json::Value::Null))
        }

        async fn handle(&self, _parms: &[Parm], _payload: Option<&[u8]>) -> Result<Vec<u8>, ModuleError> {
            Ok(self.0.as_bytes().to_vec())
        }
    }

    fn stub(name: &'static str) -> Arc<dyn Module> {
        Arc::new(Stub(name))
    }

    fn names(node: &SyscallNode) -> Vec<&str> {
        node.modules().iter().map(|m| m.name()).collect()
    }

    #[test]
    fn test_empty_trie_matches_root() {
        let trie = SyscallTrie::new();
        let node = trie.best_match(&["anything", "at", "all"]);
        assert!(std::ptr::eq(node, trie.root()));
        assert_eq!(trie.node_count(), 1);
    }

    #[test]
    fn test_add_route_then_best_match() {
        let mut trie = SyscallTrie::new();
        let m = stub("m");
        assert!(trie.add_route(&["a", "b", "c"], m.clone()));

        let node = trie.best_match(&["a", "b", "c"]);
        assert!(node.contains(&m));
        assert_eq!(trie.node_count(), 4);
    }

    #[test]
    fn test_prefixes_match_ancestors() {
        let mut trie = SyscallTrie::new();
        trie.add_route(&["a", "b", "c"], stub("m"));

        let c = trie.best_match(&["a", "b", "c"]);
        let b = trie.best_match(&["a", "b"]);
        let a = trie.best_match(&["a"]);
        let root = trie.best_match::<&str>(&[]);

        assert!(std::ptr::eq(b.child("c").unwrap(), c));
        assert!(std::ptr::eq(a.child("b").unwrap(), b));
        assert!(std::ptr::eq(root.child("a").unwrap(), a));
        assert!(std::ptr::eq(root, trie.root()));
    }

    #[test]
    fn test_best_match_stops_at_first_unknown_token() {
        let mut trie = SyscallTrie::new();
        trie.add_route(&["a", "b"], stub("m"));

        let node = trie.best_match(&["a", "x", "b"]);
        assert!(std::ptr::eq(node, trie.best_match(&["a"])));
        // longer than any stored path
        let node = trie.best_match(&["a", "b", "c", "d"]);
        assert_eq!(names(node), vec!["m"]);
    }

    #[test]
    fn test_tokens_match_literally() {
        let mut trie = SyscallTrie::new();
        trie.add_route(&["hello"], stub("m"));
        assert!(trie.best_match(&["hell"]).modules().is_empty());
        assert!(trie.best_match(&["hello!"]).modules().is_empty());
        assert!(trie.best_match(&["HELLO"]).modules().is_empty());
    }

    #[test]
    fn test_add_route_is_append_if_absent() {
        let mut trie = SyscallTrie::new();
        let a = stub("a");
        let b = stub("b");
        assert!(trie.add_route(&["p"], a.clone()));
        assert!(trie.add_route(&["p"], b.clone()));
        assert!(!trie.add_route(&["p"], a.clone()));
        assert!(!trie.add_route(&["p"], b));

        assert_eq!(names(trie.best_match(&["p"])), vec!["a", "b"]);
        assert_eq!(trie.node_count(), 2);
    }

    #[test]
    fn test_same_name_distinct_instances_are_distinct() {
        let mut trie = SyscallTrie::new();
        assert!(trie.add_route(&["p"], stub("twin")));
        assert!(trie.add_route(&["p"], stub("twin")));
        assert_eq!(trie.best_match(&["p"]).modules().len(), 2);
    }

    #[test]
    fn test_resolve_skips_empty_intermediate_nodes() {
        let mut trie = SyscallTrie::new();
        let root_mod = stub("root");
        trie.add_route::<&str>(&[], root_mod.clone());
        trie.add_route(&["a", "b", "c"], stub("deep"));

        // best_match lands on the empty "a b" node; resolve falls back to root
        assert!(trie.best_match(&["a", "b", "d"]).modules().is_empty());
        assert_eq!(names(trie.resolve(&["a", "b", "d"])), vec!["root"]);
        assert_eq!(names(trie.resolve(&["a", "b", "c", "z"])), vec!["deep"]);
    }

    #[test]
    fn test_routes_listing() {
        let mut trie = SyscallTrie::new();
        trie.add_route::<&str>(&[], stub("catch-all"));
        trie.add_route(&["b"], stub("two"));
        trie.add_route(&["a", "x"], stub("one"));

        let routes = trie.routes();
        assert_eq!(
            routes,
            vec![
                Route { path: vec![], modules: vec!["catch-all".into()] },
                Route { path: vec!["a".into(), "x".into()], modules: vec!["one".into()] },
                Route { path: vec!["b".into()], modules: vec!["two".into()] },
            ]
        );
    }
}
