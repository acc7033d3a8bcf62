use crate::error::Error;
use crate::handler::{Handler, Next};
use crate::request::{ConnectionId, Request};
use crate::response::Response;

use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::future;
use hyper::service::Service;
use hyper::{Body, StatusCode};
use serde_json::json;
use tracing::{debug, debug_span, warn};

type Fallback = dyn Fn(&Request, &mut Response, Option<Error>) + Send + Sync;

/// Runs the top-level middleware of a server, in the order it was added, and
/// turns the outcome into a response.
///
/// After the middleware has run, a final stage reports errors and requests
/// that no route handled:
/// ```rust
/// use nestrouter::{handler_fn, App, Error, Router};
/// use hyper::{Body, Request, StatusCode};
///
/// let router = Router::default().get("/error", handler_fn(|_, _, _| {
///     Err(Error::status(StatusCode::PAYMENT_REQUIRED, "this is an error"))
/// }));
/// let app = App::new().with(router.routes());
///
/// let res = app.serve(Request::get("/error").body(Body::empty()).unwrap(), Default::default());
/// assert_eq!(res.status(), StatusCode::PAYMENT_REQUIRED);
///
/// let res = app.serve(Request::get("/missing").body(Body::empty()).unwrap(), Default::default());
/// assert_eq!(res.status(), StatusCode::NOT_FOUND);
/// ```
pub struct App {
    stack: Vec<Arc<dyn Handler>>,
    fallback: Box<Fallback>,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add middleware to the application.
    pub fn with(mut self, handler: impl Handler + 'static) -> Self {
        self.stack.push(Arc::new(handler));
        self
    }

    /// Replace the final stage, which is called after the middleware with the
    /// error it returned, if any.
    pub fn fallback(
        mut self,
        fallback: impl Fn(&Request, &mut Response, Option<Error>) + Send + Sync + 'static,
    ) -> Self {
        self.fallback = Box::new(fallback);
        self
    }

    /// Run a request through the middleware and the final stage.
    pub fn dispatch(&self, req: &mut Request) -> Response {
        let span = debug_span!(
            "request",
            connection = %req.connection(),
            method = %req.method(),
            path = req.path()
        );
        let _enter = span.enter();

        let mut res = Response::default();
        let result = Next::top(&self.stack).run(req, &mut res);

        match &result {
            Ok(()) => debug!(handled = req.is_handled(), "dispatched"),
            Err(err) => warn!(status = %err.status_code(), error = %err, "handler failed"),
        }

        (self.fallback)(req, &mut res, result.err());
        res
    }

    /// Run a `hyper` request that arrived on `connection`.
    pub fn serve(&self, req: hyper::Request<Body>, connection: ConnectionId) -> hyper::Response<Body> {
        let mut req = Request::new(req).with_connection(connection);
        self.dispatch(&mut req).into_hyper()
    }

    /// Converts the `App` into a `Service` which you can serve directly with `Hyper`.
    /// ```rust,no_run
    /// # use nestrouter::App;
    /// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
    /// // Our app...
    /// let app = App::new();
    ///
    /// // Convert it into a service...
    /// let service = app.into_service();
    ///
    /// // Serve with hyper
    /// hyper::Server::bind(&([127, 0, 0, 1], 3030).into())
    ///     .serve(service)
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn into_service(self) -> MakeAppService {
        MakeAppService {
            app: Arc::new(self),
            connections: 0,
        }
    }
}

/// Responds with the error's status and message, or with `404 Not Found` when
/// no route handled the request.
fn finish(req: &Request, res: &mut Response, err: Option<Error>) {
    match err {
        Some(err) => {
            res.set_status(err.status_code());
            res.json(json!({ "message": err.to_string() }));
        }
        None if !req.is_handled() => {
            res.set_status(StatusCode::NOT_FOUND);
            res.text("Not Found");
        }
        None => {}
    }
}

impl Default for App {
    fn default() -> Self {
        Self {
            stack: Vec::new(),
            fallback: Box::new(finish),
        }
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("middleware", &self.stack.len())
            .finish()
    }
}

#[doc(hidden)]
pub struct MakeAppService {
    app: Arc<App>,
    connections: u64,
}

impl<T> Service<T> for MakeAppService {
    type Response = AppService;
    type Error = hyper::Error;
    type Future = future::Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _: T) -> Self::Future {
        self.connections += 1;
        future::ok(AppService {
            app: self.app.clone(),
            connection: ConnectionId(self.connections),
        })
    }
}

#[doc(hidden)]
#[derive(Clone)]
pub struct AppService {
    app: Arc<App>,
    connection: ConnectionId,
}

impl AppService {
    pub fn connection(&self) -> ConnectionId {
        self.connection
    }
}

impl Service<hyper::Request<Body>> for AppService {
    type Response = hyper::Response<Body>;
    type Error = hyper::Error;
    type Future = future::Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: hyper::Request<Body>) -> Self::Future {
        future::ok(self.app.serve(req, self.connection))
    }
}
