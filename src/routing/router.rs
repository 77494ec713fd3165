//! Dispatcher: one routing tree per HTTP method
//!
//! Registration and `prioritize` make up the build phase and are not
//! thread-safe; everything on the serve path takes `&self` and is safe for
//! unlimited concurrent readers once building is done.

use std::collections::HashMap;

use hyper::{Body, Method, Request};
use percent_encoding::percent_decode_str;

use super::parser::{self, Chunk};
use super::tree::Tree;
use super::{Params, Route, RouteHandler};
use crate::error::{Error, Result};
use crate::http::Response;

fn all_methods() -> [Method; 9] {
    [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::HEAD,
        Method::OPTIONS,
        Method::CONNECT,
        Method::TRACE,
    ]
}

/// HTTP request router
pub struct Router {
    trees: HashMap<Method, Tree>,
    /// Registration order is kept so sub-routers can be re-registered when
    /// mounted under a prefix.
    routes: Vec<Route>,
    /// Parsed patterns of named routes, for URL generation.
    named: HashMap<String, Vec<Chunk>>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self {
            trees: HashMap::new(),
            routes: Vec::new(),
            named: HashMap::new(),
        }
    }

    /// Register a route. Fails on a malformed pattern, in which case the
    /// tree is left untouched.
    ///
    /// Registering the same `(method, pattern)` twice replaces the handler
    /// (last write wins) and logs a warning.
    pub fn add_route(&mut self, route: Route) -> Result<()> {
        let chunks = parser::parse_pattern(&route.pattern)?;

        if self
            .routes
            .iter()
            .any(|r| r.method == route.method && r.pattern == route.pattern)
        {
            log::warn!(
                "duplicate route {} {}: replacing handler",
                route.method,
                route.pattern
            );
        }

        if let Some(name) = &route.name {
            self.named.insert(name.clone(), chunks.clone());
        }

        self.trees
            .entry(route.method.clone())
            .or_default()
            .insert(&chunks, route.handler.clone());
        log::debug!("registered route {} {}", route.method, route.pattern);
        self.routes.push(route);

        Ok(())
    }

    /// Register a list of routes, e.g. from the `routes!` macro.
    pub fn add_routes(&mut self, routes: Vec<Route>) -> Result<()> {
        for route in routes {
            self.add_route(route)?;
        }
        Ok(())
    }

    pub fn route(&mut self, method: Method, pattern: &str, handler: RouteHandler) -> Result<()> {
        self.add_route(Route::new(method, pattern, handler))
    }

    pub fn get(&mut self, pattern: &str, handler: RouteHandler) -> Result<()> {
        self.route(Method::GET, pattern, handler)
    }

    pub fn post(&mut self, pattern: &str, handler: RouteHandler) -> Result<()> {
        self.route(Method::POST, pattern, handler)
    }

    pub fn put(&mut self, pattern: &str, handler: RouteHandler) -> Result<()> {
        self.route(Method::PUT, pattern, handler)
    }

    pub fn patch(&mut self, pattern: &str, handler: RouteHandler) -> Result<()> {
        self.route(Method::PATCH, pattern, handler)
    }

    pub fn delete(&mut self, pattern: &str, handler: RouteHandler) -> Result<()> {
        self.route(Method::DELETE, pattern, handler)
    }

    pub fn head(&mut self, pattern: &str, handler: RouteHandler) -> Result<()> {
        self.route(Method::HEAD, pattern, handler)
    }

    pub fn options(&mut self, pattern: &str, handler: RouteHandler) -> Result<()> {
        self.route(Method::OPTIONS, pattern, handler)
    }

    pub fn connect(&mut self, pattern: &str, handler: RouteHandler) -> Result<()> {
        self.route(Method::CONNECT, pattern, handler)
    }

    pub fn trace(&mut self, pattern: &str, handler: RouteHandler) -> Result<()> {
        self.route(Method::TRACE, pattern, handler)
    }

    /// Register the same handler on every HTTP method.
    pub fn any(&mut self, pattern: &str, handler: RouteHandler) -> Result<()> {
        for method in all_methods() {
            self.route(method, pattern, handler.clone())?;
        }
        Ok(())
    }

    /// Re-register every route of `sub` on this router with `prefix`
    /// prepended. Parameters in the prefix are captured for the sub-routes
    /// exactly like their own.
    pub fn mount(&mut self, prefix: &str, sub: Router) -> Result<()> {
        for route in sub.routes {
            let pattern = join_patterns(prefix, &route.pattern);
            self.add_route(Route { pattern, ..route })?;
        }
        Ok(())
    }

    /// Reorder all sibling chains by subtree weight so lookups try the most
    /// specific subtree first. This is the freeze point: call it once after
    /// all registrations, before serving concurrent traffic.
    pub fn prioritize(&mut self) {
        for tree in self.trees.values_mut() {
            tree.prioritize();
        }
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Look up a handler for `(method, path)`.
    pub fn find(&self, method: &Method, path: &str) -> Option<(&RouteHandler, Params)> {
        self.trees.get(method)?.find(path.as_bytes())
    }

    /// Methods that have a matching route for `path`, sorted by name. Used
    /// to build `Allow` headers for automatic OPTIONS responses.
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut methods: Vec<Method> = self
            .trees
            .iter()
            .filter(|(_, tree)| tree.matches(path.as_bytes()))
            .map(|(method, _)| method.clone())
            .collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods
    }

    /// Generate a URL for a named route by substituting parameters into its
    /// pattern. Values are validated against the parameter constraints.
    pub fn url(&self, name: &str, params: &Params) -> Result<String> {
        let chunks = self
            .named
            .get(name)
            .ok_or_else(|| Error::UnknownRoute(name.to_string()))?;

        let mut out = String::new();
        for chunk in chunks {
            match chunk {
                Chunk::Static(text) => out.push_str(text),
                Chunk::Dynamic { name, pattern } => {
                    let value = params.get(name)?;
                    if let Some(pattern) = pattern {
                        if !pattern.is_match(value.as_bytes()) {
                            return Err(Error::validation(format!(
                                "parameter `{}` value `{}` does not match `{}`",
                                name,
                                value,
                                pattern.source()
                            )));
                        }
                    }
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }

    /// Dispatch a request: look up the handler, attach the parameter bag to
    /// the request extensions and invoke it. A miss produces a 404.
    pub async fn dispatch(&self, mut req: Request<Body>) -> Response {
        let method = req.method().clone();
        let path = decode_path(req.uri().path());

        if let Some((handler, params)) = self.find(&method, &path) {
            let handler = handler.clone();
            req.extensions_mut().insert(params);
            return run_handler(&handler, req, &method, &path).await;
        }

        // No explicit OPTIONS route: answer from the other method trees.
        if method == Method::OPTIONS {
            let allowed = self.allowed_methods(&path);
            if !allowed.is_empty() {
                return Response::no_content().with_header("Allow", &allow_header(&allowed));
            }
        }

        // No explicit HEAD route: serve the GET handler and drop the body.
        if method == Method::HEAD {
            if let Some((handler, params)) = self.find(&Method::GET, &path) {
                let handler = handler.clone();
                req.extensions_mut().insert(params);
                return run_handler(&handler, req, &method, &path)
                    .await
                    .with_body(Vec::new());
            }
        }

        log::debug!("no route for {} {}", method, path);
        Response::not_found()
    }
}

async fn run_handler(
    handler: &RouteHandler,
    req: Request<Body>,
    method: &Method,
    path: &str,
) -> Response {
    match handler(req).await {
        Ok(response) => response,
        Err(e) => {
            log::error!("handler error for {} {}: {}", method, path, e);
            Response::from_error(&e)
        }
    }
}

fn decode_path(path: &str) -> String {
    percent_decode_str(path).decode_utf8_lossy().into_owned()
}

fn allow_header(methods: &[Method]) -> String {
    let mut parts: Vec<&str> = methods.iter().map(Method::as_str).collect();
    if !methods.contains(&Method::OPTIONS) {
        parts.push(Method::OPTIONS.as_str());
    }
    parts.join(", ")
}

fn join_patterns(prefix: &str, pattern: &str) -> String {
    let prefix = prefix.strip_suffix('/').unwrap_or(prefix);
    if pattern == "/" && !prefix.is_empty() {
        prefix.to_string()
    } else {
        format!("{}{}", prefix, pattern)
    }
}
