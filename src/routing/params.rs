//! Parameter bag produced by a successful route match
//!
//! Captures are stored in traversal order. Name lookup scans in reverse so
//! the most recent insertion wins when two captures share a name.

use crate::error::{Error, Result};

/// Ordered `(name, value)` capture store for matched URL parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    items: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Create a bag pre-sized for a known number of captures.
    ///
    /// The capacity is only an allocation hint; it never affects lookups.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.items.push((name.into(), value.into()));
    }

    /// Look up a parameter by name; the latest insertion wins.
    pub fn get(&self, name: &str) -> Result<&str> {
        self.items
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .ok_or_else(|| Error::ParameterNotFound(name.to_string()))
    }

    /// Look up a parameter by insertion position.
    pub fn get_index(&self, index: usize) -> Result<&str> {
        self.items
            .get(index)
            .map(|(_, v)| v.as_str())
            .ok_or(Error::ParameterIndexOutOfRange(index))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.items.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

/// Retrieve the parameter bag the dispatcher attached to a request.
///
/// The bag is keyed by its own type in the request extensions, so only this
/// crate can have inserted it.
pub fn params<B>(req: &hyper::Request<B>) -> Option<&Params> {
    req.extensions().get::<Params>()
}
