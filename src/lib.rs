//! `trellis` is a small HTTP router: one segment trie per HTTP method, decorator middleware and pooled request
//! contexts, served through [hyper](https://hyper.rs/).
//!
//! Core features:
//!
//! - Static, parameter (`:name`) and wildcard (`*`) path segments, matched in that order of priority
//!
//! - Middleware that wraps handlers like an onion: global, per group and per route
//!
//! - Route groups sharing a path prefix and middleware
//!
//! - Request contexts reused through a bounded pool
//!
//! - Registration errors reported at startup, never at request time
//!
//! ## Basic Example
//!
//! ```no_run
//! use http::StatusCode;
//! use hyper::service::Service;
//! use hyper_util::rt::{TokioExecutor, TokioIo};
//! use hyper_util::server::conn::auto::Builder;
//! // Import the registration trait.
//! use trellis::prelude::*;
//! use trellis::{Context, Router, RouterService};
//! use std::net::SocketAddr;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! // A handler for "/" page.
//! fn home_handler(ctx: &mut Context) {
//!     ctx.string(StatusCode::OK, "Home page");
//! }
//!
//! // A handler for "/users/:userId" page.
//! fn user_handler(ctx: &mut Context) {
//!     let user_id = ctx.param("userId").unwrap_or_default().to_owned();
//!     ctx.string(StatusCode::OK, format!("Hello {}", user_id));
//! }
//!
//! fn router() -> Result<Router, trellis::RegistrationError> {
//!     // The default builder logs every request, answers 404/405 with a text page and
//!     // recovers from panics in handlers.
//!     let mut builder = Router::with_defaults();
//!     builder.get("/", home_handler)?.get("/users/:userId", user_handler)?;
//!     Ok(builder.build())
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let router_service = Arc::new(RouterService::new(router()?));
//!
//!     // The address on which the server will be listening.
//!     let addr = SocketAddr::from(([127, 0, 0, 1], 3001));
//!     let listener = TcpListener::bind(addr).await?;
//!
//!     loop {
//!         let (stream, _) = listener.accept().await?;
//!         let router_service = router_service.clone();
//!
//!         tokio::spawn(async move {
//!             // Get the request service for this connection
//!             let request_service = router_service.call(&stream).await.unwrap();
//!
//!             let io = TokioIo::new(stream);
//!             let builder = Builder::new(TokioExecutor::new());
//!             if let Err(err) = builder.serve_connection(io, request_service).await {
//!                 tracing::warn!(error = %err, "error serving connection");
//!             }
//!         });
//!     }
//! }
//! ```
//!
//! ## Routing
//!
//! ### Route Handlers
//!
//! A handler is a function or a closure taking the request [`Context`]. It reads the request from the context and
//! leaves the response there: a status, headers and a body. Nothing is sent before every middleware returned.
//!
//! ```
//! use http::StatusCode;
//! use trellis::prelude::*;
//! use trellis::{Context, Router};
//!
//! fn home_handler(ctx: &mut Context) {
//!     ctx.string(StatusCode::OK, "home");
//! }
//!
//! # fn run() -> Result<(), trellis::RegistrationError> {
//! let mut builder = Router::builder();
//! builder
//!     .get("/", home_handler)?
//!     .get("/about", |ctx: &mut Context| ctx.string(StatusCode::OK, "about"))?;
//! # Ok(())
//! # }
//! # run().unwrap();
//! ```
//!
//! ### Route Paths
//!
//! Paths start with `/` and are split into segments on `/`. A segment is matched literally, unless it is a
//! parameter `:name`, which matches any one segment, or a wildcard `*`, which matches everything that is left.
//! A wildcard must be the last segment, and one position can't hold both a parameter and a wildcard.
//!
//! At each position a literal segment wins over a parameter, which wins over a wildcard. The lookup never goes
//! back up the tree to try another branch.
//!
//! ```
//! use bytes::Bytes;
//! use http::{Request, StatusCode};
//! use trellis::prelude::*;
//! use trellis::{Context, ResponseRecorder, Router};
//!
//! # fn run() -> Result<(), trellis::RegistrationError> {
//! let mut builder = Router::builder();
//! builder
//!     .get("/users/me", |ctx: &mut Context| ctx.string(StatusCode::OK, "me"))?
//!     .get("/users/:id", |ctx: &mut Context| ctx.string(StatusCode::OK, "someone"))?
//!     .get("/assets/*", |ctx: &mut Context| ctx.string(StatusCode::OK, "asset"))?;
//! let router = builder.build();
//!
//! let call = |uri: &str| {
//!     let mut resp = ResponseRecorder::new();
//!     router.serve_http(Request::get(uri).body(Bytes::new()).unwrap(), &mut resp);
//!     resp.text()
//! };
//! assert_eq!(call("/users/me"), "me");
//! assert_eq!(call("/users/42"), "someone");
//! assert_eq!(call("/assets/css/site.css"), "asset");
//! # Ok(())
//! # }
//! # run().unwrap();
//! ```
//!
//! Registering the same method and path twice, a path with an empty segment (`/a//b`), a trailing slash or a
//! misplaced wildcard fails with a [`RegistrationError`].
//!
//! #### Handle 404 Pages
//!
//! A request without a route gets `404 Not Found`, and a request whose method isn't one of the nine standard
//! methods gets `405 Method Not Allowed`, both with an empty body. The [`ErrorPages`](middleware::ErrorPages)
//! middleware fills in a body for them.
//!
//! ### Route Parameters
//!
//! ```
//! use http::StatusCode;
//! use trellis::prelude::*;
//! use trellis::{Context, Router};
//!
//! # fn run() -> Result<(), trellis::RegistrationError> {
//! let mut builder = Router::builder();
//! builder.get("/users/:userName/books/:bookName", |ctx: &mut Context| {
//!     let user_name = ctx.param("userName").unwrap_or_default();
//!     let book_name = ctx.param("bookName").unwrap_or_default();
//!     let body = format!("Username: {}, Book Name: {}", user_name, book_name);
//!     ctx.string(StatusCode::OK, body);
//! })?;
//! # Ok(())
//! # }
//! # run().unwrap();
//! ```
//!
//! ### Route Groups
//!
//! A [`RouteGroup`] registers routes under a common path prefix with common middleware. Groups nest; a
//! sub-group copies the middleware of its parent at creation time.
//!
//! ```
//! use http::StatusCode;
//! use trellis::prelude::*;
//! use trellis::{middleware, Context, Router};
//!
//! # fn run() -> Result<(), trellis::RegistrationError> {
//! let mut builder = Router::builder();
//! let mut api = builder.group("/api", vec![middleware::logger()]);
//! api.get("/users", |ctx: &mut Context| ctx.string(StatusCode::OK, "[]"))?;
//!
//! let mut v2 = api.group("/v2", vec![]);
//! v2.get("/users", |ctx: &mut Context| ctx.string(StatusCode::OK, "{}"))?;
//!
//! let router = builder.build();
//! assert_eq!(router.routes()[1].1, "/api/v2/users");
//! # Ok(())
//! # }
//! # run().unwrap();
//! ```
//!
//! ## Middleware
//!
//! A [`Middleware`] turns the next handler of the chain into a new handler. It can do work before calling
//! `next`, after it, or call nothing at all and answer by itself.
//!
//! Global middleware, added with [`RouterBuilder::use_middleware`], wraps every request, including the ones
//! that end up with `404` or `405`. Group and route middleware wrap only the handler of their routes. Within a
//! list the first middleware is the outermost, so given global `[a, b]` and route `[c]` the order is
//! `a, b, c, handler` on the way in and the reverse on the way out.
//!
//! ```
//! use http::StatusCode;
//! use trellis::{handler_fn, Context, Middleware, Router};
//!
//! let powered_by = Middleware::new(|next| {
//!     handler_fn(move |ctx: &mut Context| {
//!         next(ctx);
//!         ctx.header(http::header::SERVER, "trellis");
//!     })
//! });
//!
//! let mut builder = Router::builder();
//! builder.use_middleware(powered_by);
//! ```
//!
//! ### The built-in Middleware
//!
//! - [`middleware::logger`]: access log through `tracing`, see [`AccessLog`](middleware::AccessLog)
//! - [`middleware::error_pages`]: text pages for `404` and `405`, see [`ErrorPages`](middleware::ErrorPages)
//! - [`middleware::recovery`]: turns a panic into a JSON `500`, see [`Recovery`](middleware::Recovery)
//!
//! [`Router::with_defaults`] installs all three.
//!
//! ### Request context
//!
//! Middleware passes values down the chain with [`Context::set_value`] and [`Context::value`]. The values
//! are dropped when the request is done.
//!
//! ## Error Handling
//!
//! Mistakes in the route table are [`RegistrationError`]s, returned by the registering call. Request-time
//! outcomes like `404` are plain statuses. A panic in a handler unwinds through the middleware; the
//! [`Recovery`](middleware::Recovery) middleware catches it and answers `500`. Without it the hyper service
//! catches the panic and closes the connection, unless [`Config::catch_unwind`](Config) is turned off.

pub use self::config::Config;
pub use self::context::Context;
pub use self::error::{Error, RegistrationError, RouteError};
pub use self::middleware::{handler_fn, Handler, Middleware};
pub use self::response::{ResponseRecorder, ResponseWriter};
pub use self::route::Route;
pub use self::router::{RouteGroup, Router, RouterBuilder, Routes};
pub use self::service::{RemoteAddr, RequestService, RequestServiceBuilder, RouterService};
pub use self::tree::{Param, Params, RouteMatch, Tree};

pub mod binding;
mod config;
mod constants;
mod context;
mod error;
mod helpers;
pub mod middleware;
pub mod prelude;
pub mod render;
mod response;
mod route;
mod router;
mod service;
mod tree;

/// A Result type often returned from methods that can have `trellis` errors.
pub type Result<T> = std::result::Result<T, Error>;
