//! routef - A radix-tree HTTP router with regex-constrained path parameters
//!
//! routef dispatches requests on method and path using a hybrid radix tree:
//! - static segments are prefix-compressed nodes,
//! - `{name}` parameters capture one path segment,
//! - `{name:regex}` parameters are constrained by an anchored regex,
//! - `{name:.*}` is the catch-all form and may span `/`.
//!
//! Routes are registered during a single-threaded build phase; after
//! [`Router::prioritize`] the tree is immutable and lookups are safe for
//! unlimited concurrent readers.

// Enforce error handling best practices
#![cfg_attr(
    not(test),
    warn(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
    )
)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used,))]

pub mod error;
pub mod http;
pub mod routing;

// Re-export main types for public API
pub use error::{Error, Result};
pub use http::{Response, Server};
pub use routing::{handler, params, HandlerFuture, Params, Route, RouteDef, RouteHandler, Router};

// Re-export commonly used external types
pub use hyper::{Body, Method, Request, StatusCode};
pub use serde::{Deserialize, Serialize};
pub use serde_json::{json, Value};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::routing::{handler, params, Params, Route, RouteHandler, Router};
    pub use crate::{Body, Error, Method, Request, Response, Result, Server, StatusCode};
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::json;
}
