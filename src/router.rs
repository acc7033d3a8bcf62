//! [`Router`](crate::Router) maps a request method and path to a chain of
//! handlers, and can be nested under a path prefix of another router.
//!
//! Routes are kept per method, in registration order, and the first route
//! whose pattern matches wins. Leaf routes must match the whole remaining
//! path. Nested routers match a prefix and hand what is left of the path to
//! the router below them:
//!
//! ```rust
//! use nestrouter::{App, Next, Request, Response, Result, Router};
//! use serde_json::json;
//!
//! fn deeper(req: &mut Request, res: &mut Response, next: Next<'_>) -> Result {
//!     res.json(json!({ "test": "deeper" }));
//!     next.run(req, res)
//! }
//!
//! let deeper_router = Router::default().get("/", deeper);
//! let deep_router = Router::default().nest("/deeper", deeper_router.routes());
//! let router = Router::default().nest("/deep", deep_router.routes());
//!
//! let app = App::new().with(router.routes());
//! # let _ = app;
//! ```
//!
//! A request for `GET /deep/deeper` is matched by the root router against
//! `/deep`, by `deep_router` against `/deeper`, and by `deeper_router` against
//! `/`. Parameters captured at every level are merged into
//! [`Request::params`](crate::Request::params), deeper levels overwriting
//! shallower ones.
//!
//! Patterns are compiled when they are registered. An invalid pattern panics,
//! so a misconfigured router never starts serving.
use crate::error::Result;
use crate::handler::{Handler, Next};
use crate::path::{MatchOptions, Matcher, Mode};
use crate::request::Request;
use crate::response::Response;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use hyper::Method;
use tracing::{debug, trace};

/// The methods a nested router is registered under by default.
pub const NEST_METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::OPTIONS,
];

/// Whether a route ends routing or delegates to a nested router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Matches the whole remaining path and handles the request.
    Leaf,
    /// Matches a prefix and hands the remainder to a nested router.
    Nested,
}

struct Route {
    kind: Kind,
    matcher: Matcher,
    handler: Arc<dyn Handler>,
}

/// Router dispatches requests to different handlers via configurable routes.
pub struct Router {
    tables: HashMap<Method, Vec<Route>>,
    options: MatchOptions,
    nest_methods: Vec<Method>,
}

impl Router {
    /// Insert a handler into the router for a specific path at the specified method.
    /// ```rust
    /// use nestrouter::{handler_fn, Router};
    /// use hyper::Method;
    ///
    /// let router = Router::default()
    ///     .handle(Method::GET, "/teapot", handler_fn(|req, res, next| {
    ///         res.text("I am a teapot!");
    ///         next.run(req, res)
    ///     }));
    /// ```
    ///
    /// The handler may be a single handler or a [`Chain`](crate::Chain). If it
    /// is a router entry point, or a chain containing one, the route matches by
    /// prefix like a route registered with [`Router::nest`], but only for this
    /// method.
    pub fn handle(mut self, method: Method, pattern: &str, handler: impl Handler + 'static) -> Self {
        let kind = if handler.is_router() {
            Kind::Nested
        } else {
            Kind::Leaf
        };

        let matcher = self.compile(pattern, kind);
        self.insert(method, kind, matcher, Arc::new(handler));
        self
    }

    /// Nest a router under `pattern`, for every method in the nest method set.
    ///
    /// The nested router only sees what is left of the path after `pattern`,
    /// and does its own method matching.
    /// ```rust
    /// use nestrouter::{handler_fn, Router};
    ///
    /// let users = Router::default()
    ///     .get("/:id", handler_fn(|req, res, next| next.run(req, res)));
    ///
    /// let router = Router::default().nest("/users", users.routes());
    /// # let _ = router;
    /// ```
    pub fn nest(mut self, pattern: &str, handler: impl Handler + 'static) -> Self {
        let matcher = self.compile(pattern, Kind::Nested);
        let handler: Arc<dyn Handler> = Arc::new(handler);

        for method in self.nest_methods.clone() {
            self.insert(method, Kind::Nested, matcher.clone(), handler.clone());
        }

        self
    }

    /// Register a handler for `GET` requests
    pub fn get(self, pattern: &str, handler: impl Handler + 'static) -> Self {
        self.handle(Method::GET, pattern, handler)
    }

    /// Register a handler for `HEAD` requests
    pub fn head(self, pattern: &str, handler: impl Handler + 'static) -> Self {
        self.handle(Method::HEAD, pattern, handler)
    }

    /// Register a handler for `OPTIONS` requests
    pub fn options(self, pattern: &str, handler: impl Handler + 'static) -> Self {
        self.handle(Method::OPTIONS, pattern, handler)
    }

    /// Register a handler for `POST` requests
    pub fn post(self, pattern: &str, handler: impl Handler + 'static) -> Self {
        self.handle(Method::POST, pattern, handler)
    }

    /// Register a handler for `PUT` requests
    pub fn put(self, pattern: &str, handler: impl Handler + 'static) -> Self {
        self.handle(Method::PUT, pattern, handler)
    }

    /// Register a handler for `PATCH` requests
    pub fn patch(self, pattern: &str, handler: impl Handler + 'static) -> Self {
        self.handle(Method::PATCH, pattern, handler)
    }

    /// Register a handler for `DELETE` requests
    pub fn delete(self, pattern: &str, handler: impl Handler + 'static) -> Self {
        self.handle(Method::DELETE, pattern, handler)
    }

    /// Match literal text in patterns registered after this call without
    /// regard to case. Matching is case-sensitive by default.
    pub fn case_insensitive(mut self) -> Self {
        self.options.sensitive = false;
        self
    }

    /// Stop tolerating a trailing slash that a pattern registered after this
    /// call does not spell out. For example `/about` will no longer match
    /// `/about/`.
    pub fn strict(mut self) -> Self {
        self.options.strict = true;
        self
    }

    /// Replace the set of methods that [`Router::nest`] registers under.
    pub fn nest_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.nest_methods = methods.into_iter().collect();
        self
    }

    /// Returns the registered patterns for a method, in matching order.
    /// ```rust
    /// use nestrouter::{handler_fn, Kind, Router};
    /// use hyper::Method;
    ///
    /// let ok = || handler_fn(|req, res, next| next.run(req, res));
    /// let router = Router::default()
    ///     .get("/user/:id", ok())
    ///     .nest("/admin", Router::default().routes())
    ///     .get("/", ok());
    ///
    /// assert_eq!(
    ///     router.patterns(&Method::GET),
    ///     vec![("/user/:id", Kind::Leaf), ("/admin", Kind::Nested), ("/", Kind::Leaf)]
    /// );
    /// assert_eq!(router.patterns(&Method::POST), vec![("/admin", Kind::Nested)]);
    /// ```
    pub fn patterns(&self, method: &Method) -> Vec<(&str, Kind)> {
        self.tables
            .get(method)
            .map(|routes| {
                routes
                    .iter()
                    .map(|route| (route.matcher.pattern(), route.kind))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Freezes the router into the handler that dispatches to its routes.
    ///
    /// The returned [`Routes`] can be added to an [`App`](crate::App), or
    /// nested into another router.
    pub fn routes(self) -> Routes {
        Routes(Arc::new(self))
    }

    fn compile(&self, pattern: &str, kind: Kind) -> Matcher {
        let mode = match kind {
            Kind::Leaf => Mode::Exact,
            Kind::Nested => Mode::Prefix,
        };

        match Matcher::compile(pattern, mode, self.options) {
            Ok(matcher) => matcher,
            Err(err) => panic!("invalid route pattern '{}': {}", pattern, err),
        }
    }

    fn insert(&mut self, method: Method, kind: Kind, matcher: Matcher, handler: Arc<dyn Handler>) {
        debug!(%method, pattern = matcher.pattern(), ?kind, "registering route");

        let route = Route {
            kind,
            matcher,
            handler,
        };

        let routes = self.tables.entry(method).or_insert_with(Vec::new);
        match routes
            .iter()
            .position(|existing| existing.matcher.pattern() == route.matcher.pattern())
        {
            // re-registering a pattern keeps its position
            Some(i) => routes[i] = route,
            None => routes.push(route),
        }
    }

    fn dispatch(&self, req: &mut Request, res: &mut Response, next: Next<'_>) -> Result {
        let routes = self.tables.get(req.method()).map(Vec::as_slice).unwrap_or_default();

        let found = {
            let path = req.path();
            let local = match path.strip_prefix(req.consumed_path()) {
                Some("") => "/",
                Some(rest) => rest,
                None => path,
            };

            trace!(
                connection = %req.connection(),
                method = %req.method(),
                path = local,
                consumed = req.consumed_path(),
                "matching routes"
            );

            routes.iter().find_map(|route| {
                route
                    .matcher
                    .matches(local)
                    .map(|matched| (route, matched.consumed.to_owned(), matched.params))
            })
        };

        let (route, consumed, params) = match found {
            Some(found) => found,
            None => {
                debug!(
                    connection = %req.connection(),
                    method = %req.method(),
                    path = req.path(),
                    "no route matched"
                );
                req.resolution.clear();
                return next.run(req, res);
            }
        };

        debug!(
            connection = %req.connection(),
            method = %req.method(),
            pattern = route.matcher.pattern(),
            kind = ?route.kind,
            "route matched"
        );

        req.params_mut().merge(params);

        match route.kind {
            Kind::Nested => {
                if consumed != "/" {
                    req.resolution.descend(&consumed);
                }
            }
            Kind::Leaf => {
                req.set_handled(true);
                req.resolution.clear();
            }
        }

        route.handler.handle(req, res, next)
    }
}

/// The default router configuration
impl Default for Router {
    fn default() -> Self {
        Self {
            tables: HashMap::new(),
            options: MatchOptions::default(),
            nest_methods: NEST_METHODS.to_vec(),
        }
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (method, routes) in &self.tables {
            let patterns: Vec<_> = routes.iter().map(|route| route.matcher.pattern()).collect();
            map.entry(method, &patterns);
        }
        map.finish()
    }
}

/// The dispatching handler of a frozen [`Router`].
///
/// It reports itself as a router entry point, so a router that registers it
/// under a pattern matches that pattern by prefix.
#[derive(Clone, Debug)]
pub struct Routes(Arc<Router>);

impl Handler for Routes {
    fn handle(&self, req: &mut Request, res: &mut Response, next: Next<'_>) -> Result {
        self.0.dispatch(req, res, next)
    }

    fn is_router(&self) -> bool {
        true
    }
}
