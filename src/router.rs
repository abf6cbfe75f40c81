//! Radix-tree request router with a middleware chain.
//!
//! Routes and middleware are collected at startup, then [`finalize`]d once
//! into per-method trees with every handler wrapped by the chain. Lookup is
//! O(path-length) via [`matchit`]; nothing allocates on the miss path.
//!
//! [`finalize`]: Router::finalize

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use matchit::Router as PathTree;

use crate::handler::{BoxedHandler, Handler};
use crate::middleware::Middleware;

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Each registration returns `self` so calls chain naturally.
pub struct Router {
    routes: Vec<(Method, String, BoxedHandler)>,
    layers: Vec<Middleware>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            layers: Vec::new(),
        }
    }

    /// Append a middleware layer. Layers wrap every route, whichever order
    /// routes and layers were registered in; the first layer added is the
    /// outermost at request time.
    pub fn layer(mut self, layer: Middleware) -> Self {
        self.layers.push(layer);
        self
    }

    /// Register a handler for `GET` requests on `path`.
    ///
    /// Path parameters use `{name}` syntax — `req.param("name")` retrieves
    /// them:
    ///
    /// ```rust,no_run
    /// # use squared::{Request, Response, Router};
    /// # async fn square(_: Request) -> Response { Response::text("") }
    /// Router::new().get("/square/{number}", square);
    /// ```
    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::GET, path, handler)
    }

    /// Register a handler for a method + path pair.
    ///
    /// # Panics
    ///
    /// Panics on a malformed or conflicting route pattern. Registration
    /// happens once, at startup, where a panic is the loudest diagnostic.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .push((method, path.to_owned(), handler.into_boxed_handler()));
        self
    }

    /// Builds the routing table, wrapping every handler in the middleware
    /// chain. Called once by the server before accepting traffic.
    pub(crate) fn finalize(self) -> RouteTable {
        let Self { routes, layers } = self;
        let mut trees: HashMap<Method, PathTree<BoxedHandler>> = HashMap::new();
        for (method, path, handler) in routes {
            let wrapped = layers
                .iter()
                .rev()
                .fold(handler, |handler, layer| layer(handler));
            trees
                .entry(method)
                .or_default()
                .insert(path.as_str(), wrapped)
                .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        }
        RouteTable { trees }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

/// Finalized routing table: one radix tree per HTTP method.
pub(crate) struct RouteTable {
    trees: HashMap<Method, PathTree<BoxedHandler>>,
}

impl RouteTable {
    pub(crate) fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.trees.get(method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched
            .params
            .iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }

    /// True when `path` is routable under some method other than `method`.
    /// Drives 405 over 404 on lookup misses.
    pub(crate) fn allows_other_method(&self, method: &Method, path: &str) -> bool {
        self.trees
            .iter()
            .any(|(m, tree)| m != method && tree.at(path).is_ok())
    }
}
