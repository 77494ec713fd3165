//! Routing: pattern grammar, radix tree and dispatcher
//!
//! Registration flow: pattern string -> lexer -> parser -> chunks ->
//! per-method tree. Request flow: (method, path) -> tree lookup ->
//! (handler, parameter bag).

pub mod lexer;
pub mod params;
pub mod parser;
pub mod router;

pub(crate) mod node;
pub(crate) mod tree;

use crate::error::{Error, Result};
use crate::http::Response;
use hyper::{Body, Method, Request};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub use params::{params, Params};
pub use router::Router;

/// Boxed future returned by route handlers.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Response>> + Send>>;

/// Type-erased route handler.
///
/// Handlers are plain values; resolving a handler from a textual name is a
/// loader concern, not something the core knows about.
pub type RouteHandler = Arc<dyn Fn(Request<Body>) -> HandlerFuture + Send + Sync>;

/// Wrap an async function or closure in the boxed handler type.
pub fn handler<F, Fut>(f: F) -> RouteHandler
where
    F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    Arc::new(move |req| -> HandlerFuture { Box::pin(f(req)) })
}

/// A route registration: method, pattern, optional name, handler.
#[derive(Clone)]
pub struct Route {
    pub method: Method,
    pub pattern: String,
    pub name: Option<String>,
    pub handler: RouteHandler,
}

impl Route {
    pub fn new(method: Method, pattern: &str, handler: RouteHandler) -> Self {
        Self {
            method,
            pattern: pattern.to_string(),
            name: None,
            handler,
        }
    }

    pub fn get(pattern: &str, handler: RouteHandler) -> Self {
        Self::new(Method::GET, pattern, handler)
    }

    pub fn post(pattern: &str, handler: RouteHandler) -> Self {
        Self::new(Method::POST, pattern, handler)
    }

    pub fn put(pattern: &str, handler: RouteHandler) -> Self {
        Self::new(Method::PUT, pattern, handler)
    }

    pub fn patch(pattern: &str, handler: RouteHandler) -> Self {
        Self::new(Method::PATCH, pattern, handler)
    }

    pub fn delete(pattern: &str, handler: RouteHandler) -> Self {
        Self::new(Method::DELETE, pattern, handler)
    }

    pub fn head(pattern: &str, handler: RouteHandler) -> Self {
        Self::new(Method::HEAD, pattern, handler)
    }

    pub fn options(pattern: &str, handler: RouteHandler) -> Self {
        Self::new(Method::OPTIONS, pattern, handler)
    }

    pub fn connect(pattern: &str, handler: RouteHandler) -> Self {
        Self::new(Method::CONNECT, pattern, handler)
    }

    pub fn trace(pattern: &str, handler: RouteHandler) -> Self {
        Self::new(Method::TRACE, pattern, handler)
    }

    /// Name the route so `Router::url` can generate URLs for it.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Build a route from a loader definition plus a resolved handler.
    pub fn from_def(def: &RouteDef, handler: RouteHandler) -> Result<Self> {
        let method = Method::from_bytes(def.method.to_uppercase().as_bytes())
            .map_err(|_| Error::validation(format!("unknown HTTP method `{}`", def.method)))?;

        Ok(Self {
            method,
            pattern: def.pattern.clone(),
            name: def.name.clone(),
            handler,
        })
    }
}

/// Serializable route definition record for external loaders.
///
/// The core consumes only the method and pattern; the handler referenced by
/// a definition is resolved by the loader and passed in as a value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteDef {
    pub method: String,
    pub pattern: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Utility macro for declaring routes
#[macro_export]
macro_rules! routes {
    ($($method:ident $path:literal => $handler:expr),* $(,)?) => {
        vec![
            $(
                $crate::routing::Route::new(
                    $crate::Method::$method,
                    $path,
                    $crate::routing::handler($handler),
                )
            ),*
        ]
    };
}
