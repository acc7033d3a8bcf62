use crate::params::Params;

use std::fmt;

use hyper::{Body, HeaderMap, Method, Uri};

/// Identifies the transport connection a request arrived on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How much of the request path the routers above the current one have
/// consumed. Lives and dies with its request.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Resolution {
    consumed: String,
}

impl Resolution {
    pub(crate) fn consumed(&self) -> &str {
        &self.consumed
    }

    pub(crate) fn descend(&mut self, consumed: &str) {
        self.consumed.push_str(consumed);
    }

    pub(crate) fn clear(&mut self) {
        self.consumed.clear();
    }
}

/// An incoming request, as seen by handlers.
///
/// Wraps a `hyper::Request` together with the routing state: the parameters
/// captured so far, whether a leaf route handled it, and the part of the path
/// already consumed by nested routers.
#[derive(Debug)]
pub struct Request {
    inner: hyper::Request<Body>,
    params: Params,
    handled: bool,
    connection: ConnectionId,
    pub(crate) resolution: Resolution,
}

impl Request {
    pub fn new(inner: hyper::Request<Body>) -> Self {
        Self {
            inner,
            params: Params::default(),
            handled: false,
            connection: ConnectionId::default(),
            resolution: Resolution::default(),
        }
    }

    /// Sets the connection the request arrived on.
    pub fn with_connection(mut self, connection: ConnectionId) -> Self {
        self.connection = connection;
        self
    }

    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    /// The request path, without the query string.
    pub fn path(&self) -> &str {
        self.inner.uri().path()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    /// Returns `true` once a leaf route has matched this request.
    pub fn is_handled(&self) -> bool {
        self.handled
    }

    pub fn set_handled(&mut self, handled: bool) {
        self.handled = handled;
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    /// The leading part of the path consumed by the nested routers currently
    /// resolving this request. Empty outside of routing.
    pub fn consumed_path(&self) -> &str {
        self.resolution.consumed()
    }

    pub fn inner(&self) -> &hyper::Request<Body> {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut hyper::Request<Body> {
        &mut self.inner
    }

    pub fn into_inner(self) -> hyper::Request<Body> {
        self.inner
    }
}

impl From<hyper::Request<Body>> for Request {
    fn from(inner: hyper::Request<Body>) -> Self {
        Self::new(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_excludes_query() {
        let req = Request::new(
            hyper::Request::builder()
                .uri("/user/1?fields=name")
                .body(Body::empty())
                .unwrap(),
        );
        assert_eq!(req.path(), "/user/1");
        assert_eq!(req.consumed_path(), "");
        assert!(!req.is_handled());
    }

    #[test]
    fn resolution_accumulates() {
        let mut resolution = Resolution::default();
        resolution.descend("/deep");
        resolution.descend("/deeper");
        assert_eq!(resolution.consumed(), "/deep/deeper");
        resolution.clear();
        assert_eq!(resolution.consumed(), "");
    }
}
