//! Per-method routing tree
//!
//! Holds the root of one radix tree. Registration converts a chunk list
//! into a parent-to-child node chain and merges it into the root; lookup
//! walks the tree collecting parameter captures.

use super::node::{
    prioritize_chain, update_chain_weights, DynamicNode, Endpoint, Node, StaticNode,
};
use super::params::Params;
use super::parser::Chunk;
use super::RouteHandler;

#[derive(Debug, Default)]
pub(crate) struct Tree {
    root: Option<Box<Node>>,
}

impl Tree {
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Insert a parsed pattern. The chunk list comes from the parser, so it
    /// is non-empty and starts with a static chunk.
    pub fn insert(&mut self, chunks: &[Chunk], handler: RouteHandler) {
        let Some(node) = build_chain(chunks, handler) else {
            return;
        };
        self.root = Some(match self.root.take() {
            Some(root) => root.merge(node),
            None => node,
        });
    }

    /// Look up a path. Returns the handler and the captured parameters; the
    /// bag is only built once a terminal node has been found.
    pub fn find(&self, path: &[u8]) -> Option<(&RouteHandler, Params)> {
        let root = self.root.as_deref()?;
        let mut captures = Vec::new();
        let hit = root.find(path, &mut captures)?;
        let terminal = hit.endpoint()?;

        let mut params = Params::with_capacity(terminal.param_count);
        for (name, value) in captures {
            params.add(name, String::from_utf8_lossy(value));
        }
        Some((&terminal.handler, params))
    }

    pub fn matches(&self, path: &[u8]) -> bool {
        self.find(path).is_some()
    }

    /// Recompute weights and reorder every sibling chain so heavier (more
    /// specific) subtrees are tried first. One-shot; run after all inserts.
    pub fn prioritize(&mut self) {
        if let Some(mut root) = self.root.take() {
            update_chain_weights(&mut root);
            self.root = prioritize_chain(Some(root));
        }
    }

    #[cfg(test)]
    pub(crate) fn root(&self) -> Option<&Node> {
        self.root.as_deref()
    }
}

/// Build a root chain from chunks: one node per chunk, linked parent to
/// child, with the endpoint on the last node.
fn build_chain(chunks: &[Chunk], handler: RouteHandler) -> Option<Box<Node>> {
    let param_count = chunks.iter().filter(|c| c.is_dynamic()).count();
    let mut endpoint = Some(Endpoint {
        handler,
        param_count,
    });

    let mut next: Option<Box<Node>> = None;
    for (i, chunk) in chunks.iter().enumerate().rev() {
        let in_dynamic = chunks[..i].iter().any(Chunk::is_dynamic);
        let node = match chunk {
            Chunk::Static(text) => {
                let mut n = StaticNode::new(text.as_str());
                n.in_dynamic = in_dynamic;
                n.endpoint = endpoint.take();
                n.child = next.take();
                Box::new(Node::Static(n))
            }
            Chunk::Dynamic { name, pattern } => {
                let mut n = DynamicNode::new(name.clone(), pattern.clone());
                n.in_dynamic = in_dynamic;
                n.endpoint = endpoint.take();
                if let Some(child) = next.take() {
                    // The stop byte is the first byte of the following
                    // static prefix.
                    if let Some(byte) = child.first_byte() {
                        n.children.insert(byte, child);
                    }
                }
                Box::new(Node::Dynamic(n))
            }
        };
        next = Some(node);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Response;
    use crate::routing::parser::parse_pattern;
    use crate::routing::{handler, RouteHandler};

    fn tagged(tag: &'static str) -> RouteHandler {
        handler(move |_req| async move { Ok(Response::text(tag)) })
    }

    fn call(h: &RouteHandler) -> String {
        let resp = tokio_test::block_on(h(hyper::Request::new(hyper::Body::empty()))).unwrap();
        String::from_utf8(resp.body).unwrap()
    }

    fn insert(tree: &mut Tree, pattern: &str, tag: &'static str) {
        tree.insert(&parse_pattern(pattern).unwrap(), tagged(tag));
    }

    fn lookup(tree: &Tree, path: &str) -> Option<(String, Params)> {
        tree.find(path.as_bytes())
            .map(|(h, params)| (call(h), params))
    }

    #[test]
    fn test_root_route() {
        let mut tree = Tree::new();
        insert(&mut tree, "/", "root");

        let (tag, params) = lookup(&tree, "/").unwrap();
        assert_eq!(tag, "root");
        assert!(params.is_empty());
    }

    #[test]
    fn test_static_routes() {
        let mut tree = Tree::new();
        insert(&mut tree, "/users", "users");
        insert(&mut tree, "/users/profile", "profile");
        insert(&mut tree, "/posts", "posts");

        assert_eq!(lookup(&tree, "/users").unwrap().0, "users");
        assert_eq!(lookup(&tree, "/users/profile").unwrap().0, "profile");
        assert_eq!(lookup(&tree, "/posts").unwrap().0, "posts");
        assert!(lookup(&tree, "/nope").is_none());
        assert!(lookup(&tree, "/user").is_none());
        assert!(lookup(&tree, "/users/prof").is_none());
    }

    #[test]
    fn test_static_prefix_split_keeps_both_routes() {
        let mut tree = Tree::new();
        insert(&mut tree, "/path1", "one");
        insert(&mut tree, "/path2", "two");

        assert_eq!(lookup(&tree, "/path1").unwrap().0, "one");
        assert_eq!(lookup(&tree, "/path2").unwrap().0, "two");
        // The shared split node itself is not an endpoint
        assert!(lookup(&tree, "/path").is_none());
    }

    #[test]
    fn test_static_and_parameter_below_same_prefix() {
        let mut tree = Tree::new();
        insert(&mut tree, "/path1", "plain");
        insert(&mut tree, "/path1/{id}", "with_id");

        let (tag, params) = lookup(&tree, "/path1/42").unwrap();
        assert_eq!(tag, "with_id");
        assert_eq!(params.get("id").unwrap(), "42");

        let (tag, params) = lookup(&tree, "/path1").unwrap();
        assert_eq!(tag, "plain");
        assert!(params.is_empty());
    }

    #[test]
    fn test_regex_constrained_siblings() {
        let mut tree = Tree::new();
        insert(&mut tree, "/path1/{id:[0-9]+}", "digits");
        insert(&mut tree, "/path1/{name:[a-z]+}", "letters");

        let (tag, params) = lookup(&tree, "/path1/42").unwrap();
        assert_eq!(tag, "digits");
        assert_eq!(params.get("id").unwrap(), "42");

        let (tag, params) = lookup(&tree, "/path1/abc").unwrap();
        assert_eq!(tag, "letters");
        assert_eq!(params.get("name").unwrap(), "abc");

        assert!(lookup(&tree, "/path1/42abc").is_none());
    }

    #[test]
    fn test_regex_with_quantifier_braces() {
        let mut tree = Tree::new();
        insert(&mut tree, "/{date:[0-9]{4}-[0-9]{2}-[0-9]{2}}", "date");

        let (tag, params) = lookup(&tree, "/2019-11-20").unwrap();
        assert_eq!(tag, "date");
        assert_eq!(params.get("date").unwrap(), "2019-11-20");

        assert!(lookup(&tree, "/2019-11").is_none());
    }

    #[test]
    fn test_catch_all_spans_slashes() {
        let mut tree = Tree::new();
        insert(&mut tree, "/path1/{file:.*}", "file");

        let (tag, params) = lookup(&tree, "/path1/a/b/c.txt").unwrap();
        assert_eq!(tag, "file");
        assert_eq!(params.get("file").unwrap(), "a/b/c.txt");
    }

    #[test]
    fn test_plain_parameter_does_not_span_slash() {
        let mut tree = Tree::new();
        insert(&mut tree, "/users/{id}", "user");

        assert!(lookup(&tree, "/users/1/posts").is_none());

        let (_, params) = lookup(&tree, "/users/1").unwrap();
        assert_eq!(params.get("id").unwrap(), "1");
    }

    #[test]
    fn test_multiple_parameters_in_order() {
        let mut tree = Tree::new();
        insert(&mut tree, "/users/{id}/posts/{post_id}", "post");

        let (tag, params) = lookup(&tree, "/users/7/posts/99").unwrap();
        assert_eq!(tag, "post");
        assert_eq!(params.get("id").unwrap(), "7");
        assert_eq!(params.get("post_id").unwrap(), "99");
        assert_eq!(params.get_index(0).unwrap(), "7");
        assert_eq!(params.get_index(1).unwrap(), "99");
    }

    #[test]
    fn test_parameter_with_static_suffix() {
        let mut tree = Tree::new();
        insert(&mut tree, "/files/{name}.txt", "txt");

        let (tag, params) = lookup(&tree, "/files/report.txt").unwrap();
        assert_eq!(tag, "txt");
        assert_eq!(params.get("name").unwrap(), "report");

        assert!(lookup(&tree, "/files/report.pdf").is_none());
    }

    #[test]
    fn test_backtracking_restores_captures() {
        // The `{a}` branch dead-ends, so lookup must back out of it and the
        // failed capture must not leak into the final bag.
        let mut tree = Tree::new();
        insert(&mut tree, "/x/{a}/end", "a_end");
        insert(&mut tree, "/x/{b:[0-9]+}/other", "b_other");

        let (tag, params) = lookup(&tree, "/x/12/other").unwrap();
        assert_eq!(tag, "b_other");
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("b").unwrap(), "12");
        assert!(params.get("a").is_err());
    }

    #[test]
    fn test_last_write_wins_on_duplicate_pattern() {
        let mut tree = Tree::new();
        insert(&mut tree, "/dup", "first");
        insert(&mut tree, "/dup", "second");

        assert_eq!(lookup(&tree, "/dup").unwrap().0, "second");
    }

    #[test]
    fn test_dynamic_then_static_insertion_order() {
        // Without prioritization, siblings are tried in insertion order:
        // the unconstrained parameter shadows the later static route.
        let mut tree = Tree::new();
        insert(&mut tree, "/{id}", "param");
        insert(&mut tree, "/users", "static");

        assert_eq!(lookup(&tree, "/users").unwrap().0, "param");

        // Prioritization reorders by subtree weight; equal weights keep
        // insertion order, so the parameter still wins here.
        let mut tree = Tree::new();
        insert(&mut tree, "/{id}", "param");
        insert(&mut tree, "/users", "static");
        insert(&mut tree, "/users/a", "a");
        insert(&mut tree, "/users/b", "b");
        tree.prioritize();

        assert_eq!(lookup(&tree, "/users").unwrap().0, "static");
    }

    #[test]
    fn test_prioritize_orders_siblings_by_descending_weight() {
        let mut tree = Tree::new();
        insert(&mut tree, "/a", "a");
        insert(&mut tree, "/b", "b");
        insert(&mut tree, "/b/1", "b1");
        insert(&mut tree, "/b/2", "b2");
        insert(&mut tree, "/c", "c");
        insert(&mut tree, "/c/1", "c1");
        tree.prioritize();

        fn assert_descending(node: &Node) {
            let mut weight = node.weight();
            let mut cur = node.sibling();
            while let Some(sibling) = cur {
                assert!(sibling.weight() <= weight);
                weight = sibling.weight();
                cur = sibling.sibling();
            }
            match node {
                Node::Static(n) => {
                    if let Some(child) = n.child.as_deref() {
                        assert_descending(child);
                    }
                }
                Node::Dynamic(n) => {
                    for child in n.children.values() {
                        assert_descending(child);
                    }
                }
            }
        }

        let root = tree.root().expect("tree has a root");
        assert_descending(root);

        // Routing still works after reordering
        assert_eq!(lookup(&tree, "/a").unwrap().0, "a");
        assert_eq!(lookup(&tree, "/b/2").unwrap().0, "b2");
        assert_eq!(lookup(&tree, "/c/1").unwrap().0, "c1");
    }

    #[test]
    fn test_find_is_deterministic() {
        let mut tree = Tree::new();
        insert(&mut tree, "/users/{id:[0-9]+}", "digits");
        insert(&mut tree, "/users/{slug}", "slug");
        tree.prioritize();

        let first = lookup(&tree, "/users/42").unwrap();
        for _ in 0..10 {
            let again = lookup(&tree, "/users/42").unwrap();
            assert_eq!(again.0, first.0);
            assert_eq!(again.1, first.1);
        }
    }

    #[test]
    fn test_nodes_below_parameter_report_has_parameters() {
        let mut tree = Tree::new();
        insert(&mut tree, "/users/{id}/posts", "posts");

        let mut captures = Vec::new();
        let root = tree.root().expect("tree has a root");
        let hit = root.find(b"/users/7/posts", &mut captures).unwrap();
        assert!(hit.has_parameters());

        let mut captures = Vec::new();
        let mut tree = Tree::new();
        insert(&mut tree, "/about", "about");
        let root = tree.root().expect("tree has a root");
        let hit = root.find(b"/about", &mut captures).unwrap();
        assert!(!hit.has_parameters());
    }
}
