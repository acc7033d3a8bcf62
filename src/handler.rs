use crate::error::Result;
use crate::request::Request;
use crate::response::Response;

use std::fmt;
use std::sync::Arc;

/// Represents a middleware or route handler.
///
/// A handler either finishes the request or passes it on by running `next`,
/// exactly once. `next` is consumed when it runs, so it cannot be run twice.
/// Returning an error skips the rest of the middleware and hands the error to
/// the [`App`](crate::App).
///
/// This trait is implemented for functions and closures with the matching
/// signature:
/// ```rust
/// use nestrouter::{Handler, Next, Request, Response, Result};
///
/// fn hello(req: &mut Request, res: &mut Response, next: Next<'_>) -> Result {
///     res.text("Hello, World!");
///     next.run(req, res)
/// }
///
/// let handler: Box<dyn Handler> = Box::new(hello);
/// # let _ = handler;
/// ```
pub trait Handler: Send + Sync {
    fn handle(&self, req: &mut Request, res: &mut Response, next: Next<'_>) -> Result;

    /// Returns `true` for router entry points. A route registered with a
    /// router entry point, or with a chain containing one, matches by prefix.
    fn is_router(&self) -> bool {
        false
    }
}

impl<F> Handler for F
where
    F: Fn(&mut Request, &mut Response, Next<'_>) -> Result + Send + Sync,
{
    fn handle(&self, req: &mut Request, res: &mut Response, next: Next<'_>) -> Result {
        self(req, res, next)
    }
}

/// Helps the compiler infer the signature of a closure handler.
/// ```rust
/// use nestrouter::{handler_fn, Router};
///
/// let router = Router::default().get(
///     "/",
///     handler_fn(|req, res, next| {
///         res.json(serde_json::json!({ "test": "get" }));
///         next.run(req, res)
///     }),
/// );
/// # let _ = router;
/// ```
pub fn handler_fn<F>(f: F) -> F
where
    F: Fn(&mut Request, &mut Response, Next<'_>) -> Result + Send + Sync + 'static,
{
    f
}

/// A set of handlers run one after the other, in the order they were added.
///
/// When the last handler runs its `next`, the chain continues with the
/// continuation it was itself given.
#[derive(Clone, Default)]
pub struct Chain {
    stack: Vec<Arc<dyn Handler>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler to the chain.
    pub fn with(mut self, handler: impl Handler + 'static) -> Self {
        self.stack.push(Arc::new(handler));
        self
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

impl Handler for Chain {
    fn handle(&self, req: &mut Request, res: &mut Response, next: Next<'_>) -> Result {
        Next::new(&self.stack, next).run(req, res)
    }

    fn is_router(&self) -> bool {
        self.stack.iter().any(|handler| handler.is_router())
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("len", &self.stack.len())
            .field("is_router", &self.is_router())
            .finish()
    }
}

/// The continuation of a handler: the rest of its chain, followed by the
/// continuations of the chains that contain it.
pub struct Next<'a> {
    stack: &'a [Arc<dyn Handler>],
    then: Option<Box<Next<'a>>>,
}

impl<'a> Next<'a> {
    /// A continuation that does nothing.
    pub fn end() -> Self {
        Self {
            stack: &[],
            then: None,
        }
    }

    pub(crate) fn new(stack: &'a [Arc<dyn Handler>], then: Next<'a>) -> Self {
        Self {
            stack,
            then: Some(Box::new(then)),
        }
    }

    pub(crate) fn top(stack: &'a [Arc<dyn Handler>]) -> Self {
        Self { stack, then: None }
    }

    /// Runs the next handler.
    pub fn run(mut self, req: &mut Request, res: &mut Response) -> Result {
        let stack = self.stack;
        if let Some((handler, rest)) = stack.split_first() {
            self.stack = rest;
            return handler.handle(req, res, self);
        }

        match self.then {
            Some(then) => then.run(req, res),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.stack.len())
            .field("then", &self.then)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::Body;
    use serde_json::Value;

    fn request() -> Request {
        Request::new(hyper::Request::builder().uri("/").body(Body::empty()).unwrap())
    }

    #[test]
    fn chain_is_not_a_router_by_default() {
        let chain = Chain::new().with(handler_fn(|req, res, next| next.run(req, res)));
        assert!(!chain.is_router());
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn run_order() {
        fn one(req: &mut Request, res: &mut Response, next: Next<'_>) -> Result {
            res.json_mut().insert("one".into(), 1.into());
            next.run(req, res)
        }

        fn two(req: &mut Request, res: &mut Response, next: Next<'_>) -> Result {
            assert_eq!(res.json_mut().get("one"), Some(&Value::from(1)));
            res.json_mut().insert("two".into(), 2.into());
            next.run(req, res)
        }

        let inner = Chain::new().with(one).with(two);
        let outer = Chain::new().with(inner).with(handler_fn(|_, res, _| {
            res.json_mut().insert("after".into(), true.into());
            Ok(())
        }));

        let mut req = request();
        let mut res = Response::default();
        outer.handle(&mut req, &mut res, Next::end()).unwrap();

        assert_eq!(
            res.body(),
            &crate::response::Body::Json(serde_json::json!({ "one": 1, "two": 2, "after": true }))
        );
    }

    #[test]
    fn errors_short_circuit() {
        let chain = Chain::new()
            .with(handler_fn(|_, _, _| {
                Err(crate::Error::status(hyper::StatusCode::PAYMENT_REQUIRED, "nope"))
            }))
            .with(handler_fn(|_, _, _| panic!("must not run")));

        let mut req = request();
        let mut res = Response::default();
        let err = chain.handle(&mut req, &mut res, Next::end()).unwrap_err();
        assert_eq!(err.status_code(), hyper::StatusCode::PAYMENT_REQUIRED);
    }
}
