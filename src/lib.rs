//! # NestRouter
//!
//! NestRouter is a middleware request router for [`hyper`] in which routers
//! can be nested under path prefixes of other routers.
//!
//! Requests flow through a stack of handlers. Every handler receives the
//! request, the response built so far, and a [`Next`] continuation it runs to
//! pass the request on. A [`Router`] is one such handler: it picks the first
//! route registered for the request method whose pattern matches the path, and
//! runs that route's handlers.
//!
//! ## Usage
//!
//! Here is a simple example:
//!
//! ```rust,no_run
//! use nestrouter::{App, Next, Request, Response, Result, Router};
//! use serde_json::json;
//!
//! fn index(req: &mut Request, res: &mut Response, next: Next<'_>) -> Result {
//!     res.text("Hello, World!");
//!     next.run(req, res)
//! }
//!
//! fn hello(req: &mut Request, res: &mut Response, next: Next<'_>) -> Result {
//!     let user = req.params().get("user").unwrap_or_default().to_owned();
//!     res.json(json!({ "hello": user }));
//!     next.run(req, res)
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let router = Router::default()
//!         .get("/", index)
//!         .get("/hello/:user", hello);
//!
//!     let app = App::new().with(router.routes());
//!
//!     hyper::Server::bind(&([127, 0, 0, 1], 3000).into())
//!         .serve(app.into_service())
//!         .await
//!         .unwrap();
//! }
//! ```
//!
//! ### Named parameters
//!
//! `:user` is a *named parameter*. The values are accessible via
//! [`Request::params`].
//!
//! Named parameters only match a single path segment:
//!
//! ```ignore
//! Pattern: /user/:user
//!
//!  /user/gordon              match
//!  /user/gordon/             match
//!  /user/gordon/profile      no match
//!  /user/                    no match
//! ```
//!
//! A parameter can be restricted with a pattern, `/user/:id(\\d+)`, or made
//! optional, `/user/:id?`, and literal text can be grouped with braces,
//! `/file{.:ext}?`.
//!
//! ### Catch-All parameters
//!
//! Catch-all parameters have the form `*name` and match the rest of the path,
//! including slashes. They must always be at the **end** of the pattern:
//!
//! ```ignore
//! Pattern: /src/*filepath
//!
//!  /src/somefile.go          match
//!  /src/subdir/somefile.go   match
//! ```
//!
//! ## Nested routers
//!
//! A router registered with [`Router::nest`] matches its pattern as a prefix,
//! and sees only what is left of the path. Parameters captured on the way down
//! are merged:
//!
//! ```rust
//! use nestrouter::{handler_fn, App, Router};
//! use hyper::{Body, Request};
//!
//! let users = Router::default().get("/:id", handler_fn(|req, res, next| {
//!     let id = req.params().get("id").unwrap_or_default().to_owned();
//!     res.text(id);
//!     next.run(req, res)
//! }));
//!
//! let app = App::new().with(Router::default().nest("/user", users.routes()).routes());
//!
//! let res = app.serve(Request::get("/user/42").body(Body::empty()).unwrap(), Default::default());
//! assert_eq!(res.status(), 200);
//! ```
//!
//! ## Not Found and errors
//!
//! After the middleware of an [`App`] has run, a final stage responds with
//! `404 Not Found` if no route handled the request. A handler that returns an
//! [`Error`] skips the remaining middleware, and the final stage responds with
//! the error's status and `{"message": ...}`. Use [`App::fallback`] to replace
//! that stage.

#![forbid(unsafe_code)]

mod app;
mod error;
mod handler;
mod params;
mod request;
mod response;

pub mod path;

#[doc(hidden)]
pub mod router;

#[doc(inline)]
pub use app::{App, AppService, MakeAppService};

pub use error::{Error, PatternError, Result};

#[doc(inline)]
pub use handler::{handler_fn, Chain, Handler, Next};

pub use params::{Param, Params};

pub use path::MatchOptions;

pub use request::{ConnectionId, Request};

pub use response::{Body, Response};

#[doc(inline)]
pub use router::{Kind, Router, Routes, NEST_METHODS};
