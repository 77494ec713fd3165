//! Tree nodes for the radix router
//!
//! Two node kinds share one traversal contract. Static nodes hold a
//! prefix-compressed run of literal bytes and a single child chain. Dynamic
//! nodes capture a named parameter and key their static children by the
//! first byte of the child's prefix (the stop byte), which decides where a
//! capture ends.
//!
//! Nodes at the same position form an intrusive sibling chain. Lookup walks
//! the chain in order, backtracking to the next sibling whenever a subtree
//! fails to produce a terminal match.

use std::collections::HashMap;
use std::fmt;

use super::parser::ParamPattern;
use super::RouteHandler;

/// Captures collected during traversal: parameter names borrowed from the
/// tree, values borrowed from the request path.
pub(crate) type Captures<'n, 'p> = Vec<(&'n str, &'p [u8])>;

/// Terminal payload of a node: the handler plus the number of dynamic
/// chunks in its pattern, used to size the parameter bag.
#[derive(Clone)]
pub(crate) struct Endpoint {
    pub handler: RouteHandler,
    pub param_count: usize,
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("param_count", &self.param_count)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub(crate) enum Node {
    Static(StaticNode),
    Dynamic(DynamicNode),
}

#[derive(Debug)]
pub(crate) struct StaticNode {
    /// Literal bytes this node consumes. Never empty.
    pub prefix: Vec<u8>,
    pub endpoint: Option<Endpoint>,
    /// Head of this node's child sibling chain.
    pub child: Option<Box<Node>>,
    pub sibling: Option<Box<Node>>,
    pub weight: u32,
    /// True when any ancestor is a dynamic node; cached at insertion so no
    /// parent back-reference is needed.
    pub in_dynamic: bool,
}

impl StaticNode {
    pub(crate) fn new(prefix: impl Into<Vec<u8>>) -> Self {
        Self {
            prefix: prefix.into(),
            endpoint: None,
            child: None,
            sibling: None,
            weight: 0,
            in_dynamic: false,
        }
    }
}

#[derive(Debug)]
pub(crate) struct DynamicNode {
    pub name: String,
    pub pattern: Option<ParamPattern>,
    pub endpoint: Option<Endpoint>,
    /// Static children keyed by the first byte of their prefix.
    pub children: HashMap<u8, Box<Node>>,
    pub sibling: Option<Box<Node>>,
    pub weight: u32,
    pub in_dynamic: bool,
}

impl DynamicNode {
    pub(crate) fn new(name: impl Into<String>, pattern: Option<ParamPattern>) -> Self {
        Self {
            name: name.into(),
            pattern,
            endpoint: None,
            children: HashMap::new(),
            sibling: None,
            weight: 0,
            in_dynamic: false,
        }
    }

    /// Only the wildcard sentinel `.*` may span `/`.
    fn is_catch_all(&self) -> bool {
        self.pattern
            .as_ref()
            .map_or(false, ParamPattern::is_catch_all)
    }

    fn matches(&self, value: &[u8]) -> bool {
        self.pattern.as_ref().map_or(true, |p| p.is_match(value))
    }
}

impl Node {
    pub(crate) fn endpoint(&self) -> Option<&Endpoint> {
        match self {
            Node::Static(n) => n.endpoint.as_ref(),
            Node::Dynamic(n) => n.endpoint.as_ref(),
        }
    }

    pub(crate) fn weight(&self) -> u32 {
        match self {
            Node::Static(n) => n.weight,
            Node::Dynamic(n) => n.weight,
        }
    }

    pub(crate) fn sibling(&self) -> Option<&Node> {
        match self {
            Node::Static(n) => n.sibling.as_deref(),
            Node::Dynamic(n) => n.sibling.as_deref(),
        }
    }

    pub(crate) fn take_sibling(&mut self) -> Option<Box<Node>> {
        match self {
            Node::Static(n) => n.sibling.take(),
            Node::Dynamic(n) => n.sibling.take(),
        }
    }

    fn set_sibling(&mut self, sibling: Option<Box<Node>>) {
        match self {
            Node::Static(n) => n.sibling = sibling,
            Node::Dynamic(n) => n.sibling = sibling,
        }
    }

    fn sibling_node_mut(&mut self) -> Option<&mut Node> {
        match self {
            Node::Static(n) => n.sibling.as_deref_mut(),
            Node::Dynamic(n) => n.sibling.as_deref_mut(),
        }
    }

    /// First byte this node can consume; `None` for dynamic nodes, which
    /// have no fixed discriminator.
    pub(crate) fn first_byte(&self) -> Option<u8> {
        match self {
            Node::Static(n) => n.prefix.first().copied(),
            Node::Dynamic(_) => None,
        }
    }

    /// True when the route through this node captures parameters, i.e. some
    /// ancestor is a dynamic node.
    pub(crate) fn has_parameters(&self) -> bool {
        match self {
            Node::Static(n) => n.in_dynamic,
            Node::Dynamic(n) => n.in_dynamic,
        }
    }

    /// Locate the terminal node for `path`, collecting parameter captures
    /// along the way. On a miss, `captures` is left exactly as it was.
    pub(crate) fn find<'n, 'p>(
        &'n self,
        path: &'p [u8],
        captures: &mut Captures<'n, 'p>,
    ) -> Option<&'n Node> {
        match self {
            Node::Static(n) => {
                let k = common_prefix_len(&n.prefix, path);

                if k == 0 {
                    return n.sibling.as_deref().and_then(|s| s.find(path, captures));
                }

                if k == n.prefix.len() && k == path.len() {
                    // Exact consumption. Longer patterns continue in the
                    // child chain, never in a sibling, so a missing endpoint
                    // here is a definitive miss for this chain position.
                    return n.endpoint.as_ref().map(|_| self);
                }

                if k == n.prefix.len() {
                    let depth = captures.len();
                    if let Some(child) = n.child.as_deref() {
                        if let Some(hit) = child.find(&path[k..], captures) {
                            return Some(hit);
                        }
                    }
                    captures.truncate(depth);
                    return n.sibling.as_deref().and_then(|s| s.find(path, captures));
                }

                // Partial prefix overlap: this subtree cannot match.
                n.sibling.as_deref().and_then(|s| s.find(path, captures))
            }

            Node::Dynamic(n) => {
                for (i, &byte) in path.iter().enumerate() {
                    if let Some(child) = n.children.get(&byte) {
                        let value = &path[..i];
                        if n.matches(value) {
                            captures.push((n.name.as_str(), value));
                            if let Some(hit) = child.find(&path[i..], captures) {
                                return Some(hit);
                            }
                            captures.pop();
                        }
                    }

                    if byte == b'/' && !n.is_catch_all() {
                        // A non-catch-all parameter may not span a segment
                        // boundary.
                        return n.sibling.as_deref().and_then(|s| s.find(path, captures));
                    }
                }

                if n.endpoint.is_some() && n.matches(path) {
                    captures.push((n.name.as_str(), path));
                    return Some(self);
                }

                n.sibling.as_deref().and_then(|s| s.find(path, captures))
            }
        }
    }

    /// Integrate `other` into the chain headed by `self`, returning the new
    /// chain head. Equivalent nodes merge in place; everything else joins
    /// the sibling chain.
    pub(crate) fn merge(self: Box<Self>, other: Box<Node>) -> Box<Node> {
        match (*self, *other) {
            (Node::Static(a), Node::Static(b)) => merge_static(a, b),
            (Node::Dynamic(a), Node::Dynamic(b)) => merge_dynamic(a, b),
            (Node::Static(mut a), other @ Node::Dynamic(_)) => {
                a.sibling = Some(attach(a.sibling.take(), Box::new(other)));
                Box::new(Node::Static(a))
            }
            (Node::Dynamic(mut a), other @ Node::Static(_)) => {
                a.sibling = Some(attach(a.sibling.take(), Box::new(other)));
                Box::new(Node::Dynamic(a))
            }
        }
    }

    fn update_weights(&mut self) -> u32 {
        match self {
            Node::Static(n) => {
                let mut weight = u32::from(n.endpoint.is_some());
                if let Some(child) = n.child.as_deref_mut() {
                    weight += update_chain_weights(child);
                }
                n.weight = weight;
                weight
            }
            Node::Dynamic(n) => {
                let mut weight = u32::from(n.endpoint.is_some());
                for child in n.children.values_mut() {
                    weight += update_chain_weights(child);
                }
                n.weight = weight;
                weight
            }
        }
    }

    fn prioritize_children(&mut self) {
        match self {
            Node::Static(n) => {
                if let Some(child) = n.child.take() {
                    n.child = prioritize_chain(Some(child));
                }
            }
            Node::Dynamic(n) => {
                let keys: Vec<u8> = n.children.keys().copied().collect();
                for key in keys {
                    if let Some(child) = n.children.remove(&key) {
                        if let Some(sorted) = prioritize_chain(Some(child)) {
                            n.children.insert(key, sorted);
                        }
                    }
                }
            }
        }
    }
}

/// Merge `node` into an optional chain head.
pub(crate) fn attach(head: Option<Box<Node>>, node: Box<Node>) -> Box<Node> {
    match head {
        Some(existing) => existing.merge(node),
        None => node,
    }
}

fn merge_static(mut a: StaticNode, mut b: StaticNode) -> Box<Node> {
    let k = common_prefix_len(&a.prefix, &b.prefix);

    if k == 0 {
        a.sibling = Some(attach(a.sibling.take(), Box::new(Node::Static(b))));
        return Box::new(Node::Static(a));
    }

    if k == a.prefix.len() && k == b.prefix.len() {
        // Same node: the later registration's handler wins, children are
        // absorbed one by one.
        if b.endpoint.is_some() {
            a.endpoint = b.endpoint;
        }
        let mut next = b.child;
        while let Some(mut child) = next {
            next = child.take_sibling();
            a.child = Some(attach(a.child.take(), child));
        }
        return Box::new(Node::Static(a));
    }

    if k == a.prefix.len() {
        // b extends a: trim and push down.
        b.prefix.drain(..k);
        a.child = Some(attach(a.child.take(), Box::new(Node::Static(b))));
        return Box::new(Node::Static(a));
    }

    if k == b.prefix.len() {
        // a extends b: b takes a's place in the chain, a moves below it.
        b.sibling = a.sibling.take();
        a.prefix.drain(..k);
        b.child = Some(attach(b.child.take(), Box::new(Node::Static(a))));
        return Box::new(Node::Static(b));
    }

    // Proper partial overlap: introduce a split node owning the shared
    // prefix, with both trimmed nodes as children.
    let mut split = StaticNode::new(a.prefix[..k].to_vec());
    split.sibling = a.sibling.take();
    split.in_dynamic = a.in_dynamic;
    a.prefix.drain(..k);
    b.prefix.drain(..k);
    split.child = Some(Box::new(Node::Static(a)));
    split.child = Some(attach(split.child.take(), Box::new(Node::Static(b))));
    Box::new(Node::Static(split))
}

fn merge_dynamic(mut a: DynamicNode, b: DynamicNode) -> Box<Node> {
    // Two dynamic nodes are the same slot only when both the name and the
    // regex source agree.
    if a.name == b.name && a.pattern == b.pattern {
        if b.endpoint.is_some() {
            a.endpoint = b.endpoint;
        }
        for (byte, child) in b.children {
            let merged = match a.children.remove(&byte) {
                Some(existing) => existing.merge(child),
                None => child,
            };
            a.children.insert(byte, merged);
        }
        Box::new(Node::Dynamic(a))
    } else {
        a.sibling = Some(attach(a.sibling.take(), Box::new(Node::Dynamic(b))));
        Box::new(Node::Dynamic(a))
    }
}

/// Recompute subtree weights for a whole sibling chain, returning the chain
/// total. A node's weight counts the handlers in its entire subtree.
pub(crate) fn update_chain_weights(head: &mut Node) -> u32 {
    let mut total = 0;
    let mut cur = Some(head);
    while let Some(node) = cur {
        total += node.update_weights();
        cur = node.sibling_node_mut();
    }
    total
}

/// Reorder a sibling chain by descending weight, recursing into children
/// first. Detaches every node and relinks into a fresh chain; the sort is
/// stable, so equal weights keep insertion order.
pub(crate) fn prioritize_chain(head: Option<Box<Node>>) -> Option<Box<Node>> {
    let mut nodes: Vec<Box<Node>> = Vec::new();
    let mut cur = head;
    while let Some(mut node) = cur {
        cur = node.take_sibling();
        node.prioritize_children();
        nodes.push(node);
    }

    nodes.sort_by(|a, b| b.weight().cmp(&a.weight()));

    let mut chain: Option<Box<Node>> = None;
    for mut node in nodes.into_iter().rev() {
        node.set_sibling(chain.take());
        chain = Some(node);
    }
    chain
}

fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}
