use crate::config::Config;
use crate::context::{Context, ContextPool};
use crate::helpers;
use crate::middleware::{self, handler_fn, Handler, Middleware};
use crate::response::ResponseWriter;
use crate::route::Route;
use crate::tree::Trees;
use bytes::Bytes;
use http::{Method, Request, StatusCode};
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

pub use self::builder::RouterBuilder;
pub use self::group::{RouteGroup, Routes};

mod builder;
mod group;

/// Dispatches requests to the routes registered on a [`RouterBuilder`].
///
/// A router is immutable: it is created by [`RouterBuilder::build`] and only ever used through `&self`, so one
/// instance can serve any number of threads behind an [`Arc`].
///
/// Each request borrows a pooled [`Context`], runs the global middleware, looks up the route in the tree of the
/// request method, runs the route's middleware and handler, and finally writes the pending response to the
/// [`ResponseWriter`] once.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use http::{Request, StatusCode};
/// use trellis::prelude::*;
/// use trellis::{Context, ResponseRecorder, Router};
///
/// # fn main() -> Result<(), trellis::RegistrationError> {
/// let mut builder = Router::builder();
/// builder.get("/user/:name", |ctx: &mut Context| {
///     let greeting = format!("hello {}", ctx.param("name").unwrap_or_default());
///     ctx.string(StatusCode::OK, greeting);
/// })?;
/// let router = builder.build();
///
/// let mut resp = ResponseRecorder::new();
/// router.serve_http(Request::get("/user/ray").body(Bytes::new()).unwrap(), &mut resp);
/// assert_eq!(resp.text(), "hello ray");
///
/// let mut resp = ResponseRecorder::new();
/// router.serve_http(Request::get("/user/ray/10").body(Bytes::new()).unwrap(), &mut resp);
/// assert_eq!(resp.status(), StatusCode::NOT_FOUND);
/// # Ok(())
/// # }
/// ```
pub struct Router {
    trees: Arc<Trees>,
    pool: ContextPool,
    // The global middleware wrapped around route resolution.
    chain: Handler,
    config: Config,
}

impl Router {
    /// Return a [RouterBuilder](./struct.RouterBuilder.html) instance to build a `Router`.
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Same as [`builder`](Router::builder), with the access log, the `404`/`405` pages and panic recovery
    /// installed. See [`RouterBuilder::with_defaults`].
    pub fn with_defaults() -> RouterBuilder {
        RouterBuilder::with_defaults()
    }

    pub(crate) fn new(trees: Trees, middlewares: &[Middleware], config: Config) -> Router {
        let trees = Arc::new(trees);
        let dispatch_trees = Arc::clone(&trees);
        let dispatch = handler_fn(move |ctx: &mut Context| handle_request(&dispatch_trees, ctx));

        Router {
            chain: middleware::compose(middlewares, dispatch),
            pool: ContextPool::new(config.pool_capacity),
            trees,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Lists every registered route as `(method, path)`, sorted by path and then by method.
    pub fn routes(&self) -> Vec<(Method, &str)> {
        self.trees
            .routes()
            .into_iter()
            .map(|(method, route)| (method, route.full_path()))
            .collect()
    }

    /// Handles one request and writes the response to `writer`.
    ///
    /// A request with a method outside the nine standard ones is answered `405 Method Not Allowed`, a path
    /// that doesn't percent-decode to UTF-8 `400 Bad Request`, and a path without a route `404 Not Found`.
    /// The global middleware sees all of these and may change them.
    ///
    /// The response is written exactly once, after every middleware returned, and also while a panic unwinds
    /// out of the chain. The panic then continues past this call.
    pub fn serve_http(&self, request: Request<Bytes>, writer: &mut dyn ResponseWriter) {
        let mut ctx = self.pool.acquire();
        ctx.attach(request);

        let flush = Flush {
            ctx: &mut ctx,
            writer,
        };
        (self.chain)(&mut *flush.ctx);
    }
}

impl Debug for Router {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes())
            .field("config", &self.config)
            .finish()
    }
}

enum Resolved<'t> {
    Found(&'t Route),
    NotFound,
    BadPath,
}

fn resolve<'t>(trees: &'t Trees, method: &Method, ctx: &mut Context) -> Resolved<'t> {
    let Some(tree) = trees.get(method) else {
        return Resolved::NotFound;
    };

    let (request, params) = ctx.dispatch_parts();
    let path = match helpers::percent_decode_request_path(request.uri().path()) {
        Ok(path) => path,
        Err(_) => return Resolved::BadPath,
    };

    match tree.find_route_into(&path, params) {
        Some(route) => Resolved::Found(route),
        None => Resolved::NotFound,
    }
}

fn handle_request(trees: &Trees, ctx: &mut Context) {
    let method = ctx.method().clone();
    if !helpers::is_supported_method(&method) {
        tracing::debug!(method = %method, path = ctx.path(), "method not allowed");
        ctx.status(StatusCode::METHOD_NOT_ALLOWED);
        return;
    }

    match resolve(trees, &method, ctx) {
        Resolved::Found(route) => {
            tracing::debug!(method = %method, path = ctx.path(), route = route.full_path(), "route matched");
            ctx.bind_route(route);
            (route.chain)(ctx);
        }
        Resolved::NotFound => {
            tracing::debug!(method = %method, path = ctx.path(), "no route matched");
            ctx.status(StatusCode::NOT_FOUND);
        }
        Resolved::BadPath => {
            tracing::debug!(method = %method, path = ctx.path(), "request path is not valid UTF-8 once decoded");
            ctx.status(StatusCode::BAD_REQUEST);
        }
    }
}

/// Writes the pending response when dropped, so it happens after the chain returned or while it unwinds.
struct Flush<'a, 'w> {
    ctx: &'a mut Context,
    writer: &'a mut (dyn ResponseWriter + 'w),
}

impl Drop for Flush<'_, '_> {
    fn drop(&mut self) {
        let headers = self.writer.headers_mut();
        for (name, value) in self.ctx.headers() {
            headers.append(name.clone(), value.clone());
        }

        self.writer.write_header(self.ctx.status_code());
        if self.ctx.body().is_empty() {
            return;
        }
        if let Err(err) = self.writer.write(self.ctx.body()) {
            tracing::error!(
                error = %err,
                method = %self.ctx.method(),
                path = self.ctx.path(),
                "couldn't write the response"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::ResponseRecorder;
    use crate::router::Routes;
    use http::HeaderMap;
    use std::io;

    fn get(uri: &str) -> Request<Bytes> {
        Request::get(uri).body(Bytes::new()).unwrap()
    }

    #[test]
    fn should_answer_bad_request_for_undecodable_path() {
        let mut builder = Router::builder();
        builder.get("/files/:name", |_: &mut Context| {}).unwrap();
        let router = builder.build();

        let mut resp = ResponseRecorder::new();
        router.serve_http(get("/files/%FF"), &mut resp);
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn should_match_decoded_path() {
        let mut builder = Router::builder();
        builder
            .get("/files/:name", |ctx: &mut Context| {
                let name = ctx.param("name").unwrap_or_default().to_owned();
                ctx.string(StatusCode::OK, name)
            })
            .unwrap();
        let router = builder.build();

        let mut resp = ResponseRecorder::new();
        router.serve_http(get("/files/a%20b"), &mut resp);
        assert_eq!(resp.text(), "a b");
    }

    #[test]
    fn should_flush_pending_headers() {
        let mut builder = Router::builder();
        builder
            .get("/", |ctx: &mut Context| {
                ctx.header(http::header::CACHE_CONTROL, "no-store");
                ctx.string(StatusCode::OK, "home");
            })
            .unwrap();
        let router = builder.build();

        let mut resp = ResponseRecorder::new();
        router.serve_http(get("/"), &mut resp);
        assert_eq!(resp.headers()[http::header::CACHE_CONTROL], "no-store");
        assert_eq!(resp.headers()[http::header::CONTENT_TYPE], "text/plain; charset=utf-8");
    }

    struct BrokenPipe {
        headers: HeaderMap,
        status: Option<StatusCode>,
    }

    impl ResponseWriter for BrokenPipe {
        fn headers_mut(&mut self) -> &mut HeaderMap {
            &mut self.headers
        }

        fn write_header(&mut self, status: StatusCode) {
            self.status = Some(status);
        }

        fn write(&mut self, _: &[u8]) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "client went away"))
        }
    }

    #[test]
    fn should_survive_write_failures() {
        let mut builder = Router::builder();
        builder.get("/", |ctx: &mut Context| ctx.string(StatusCode::OK, "home")).unwrap();
        let router = builder.build();

        let mut sink = BrokenPipe {
            headers: HeaderMap::new(),
            status: None,
        };
        router.serve_http(get("/"), &mut sink);
        assert_eq!(sink.status, Some(StatusCode::OK));
    }

    #[test]
    fn should_flush_and_release_when_unrecovered_panic_escapes() {
        let mut builder = Router::builder();
        builder
            .get("/", |ctx: &mut Context| {
                ctx.status(StatusCode::ACCEPTED);
                panic!("no recovery installed");
            })
            .unwrap();
        let router = builder.build();

        let mut resp = ResponseRecorder::new();
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            router.serve_http(get("/"), &mut resp);
        }));

        assert!(outcome.is_err());
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        assert_eq!(router.pool.idle(), 1);
    }

    #[test]
    fn should_reuse_pooled_contexts_across_requests() {
        let mut builder = Router::builder();
        builder
            .get("/set", |ctx: &mut Context| {
                ctx.set_value("seen", true);
                ctx.status(StatusCode::CREATED);
            })
            .unwrap();
        builder
            .get("/check", |ctx: &mut Context| {
                let seen = ctx.value::<bool>("seen").is_some();
                ctx.string(StatusCode::OK, if seen { "leaked" } else { "clean" });
            })
            .unwrap();
        let router = builder.build();

        let mut resp = ResponseRecorder::new();
        router.serve_http(get("/set"), &mut resp);
        assert_eq!(resp.status(), StatusCode::CREATED);

        let mut resp = ResponseRecorder::new();
        router.serve_http(get("/check"), &mut resp);
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.text(), "clean");
        assert_eq!(router.pool.idle(), 1);
    }
}
