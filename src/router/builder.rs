use super::group::{RouteGroup, Routes};
use super::Router;
use crate::config::Config;
use crate::error::RegistrationError;
use crate::helpers;
use crate::middleware::{self, Handler, Middleware};
use crate::tree::Trees;
use http::Method;

/// Builder for the [Router](./struct.Router.html) type.
///
/// The builder is the root route group: its base path is `/` and routes registered on it carry no group
/// middleware. Middleware added with [`use_middleware`](RouterBuilder::use_middleware) is global instead and
/// wraps every request, matched or not.
///
/// Registration errors are returned by the registering call. Once every route is in,
/// [`build`](RouterBuilder::build) freezes the route table into an immutable [`Router`].
///
/// # Examples
///
/// ```
/// use http::StatusCode;
/// use trellis::prelude::*;
/// use trellis::{middleware, Context, Router};
///
/// # fn main() -> Result<(), trellis::RegistrationError> {
/// let mut builder = Router::builder();
/// builder.use_middleware(middleware::logger());
///
/// builder
///     .get("/", |ctx: &mut Context| ctx.string(StatusCode::OK, "home"))?
///     .post("/users", |ctx: &mut Context| ctx.status(StatusCode::CREATED))?;
///
/// let mut api = builder.group("/api/v1", vec![]);
/// api.get("/users/:id", |ctx: &mut Context| {
///     let id = ctx.param("id").unwrap_or_default().to_owned();
///     ctx.string(StatusCode::OK, id)
/// })?;
///
/// let router = builder.build();
/// assert_eq!(router.routes().len(), 3);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct RouterBuilder {
    trees: Trees,
    middlewares: Vec<Middleware>,
    config: Config,
}

impl RouterBuilder {
    /// Creates a new `RouterBuilder` instance with default options.
    pub fn new() -> RouterBuilder {
        RouterBuilder::default()
    }

    /// Creates a builder with the access log, the default error pages and panic recovery installed as global
    /// middleware, in that order.
    pub fn with_defaults() -> RouterBuilder {
        let mut builder = RouterBuilder::new();
        builder.use_middlewares([middleware::logger(), middleware::error_pages(), middleware::recovery()]);
        builder
    }

    /// Replaces the runtime settings.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Adds a global middleware. It wraps route resolution, so it also runs for `404`, `405` and `400` answers.
    pub fn use_middleware(&mut self, middleware: Middleware) -> &mut Self {
        self.middlewares.push(middleware);
        self
    }

    pub fn use_middlewares<I>(&mut self, middlewares: I) -> &mut Self
    where
        I: IntoIterator<Item = Middleware>,
    {
        self.middlewares.extend(middlewares);
        self
    }

    pub(crate) fn register(
        &mut self,
        method: Method,
        path: &str,
        middlewares: Vec<Middleware>,
        handler: Handler,
    ) -> Result<(), RegistrationError> {
        tracing::trace!(method = %method, path, "registering route");
        self.trees.add_route(method, path, middlewares, handler)
    }

    /// Freezes the routes into a [`Router`], composing the global middleware once.
    pub fn build(self) -> Router {
        let router = Router::new(self.trees, &self.middlewares, self.config);

        let routes = router.routes();
        tracing::info!(
            routes = routes.len(),
            middlewares = self.middlewares.len(),
            "router built"
        );
        for (method, path) in &routes {
            tracing::debug!(method = %method, path = *path, "route");
        }

        router
    }
}

impl Routes for RouterBuilder {
    fn add_route(&mut self, method: Method, path: &str, handler: Handler) -> Result<&mut Self, RegistrationError> {
        let path = helpers::join_paths("/", path);
        self.register(method, &path, Vec::new(), handler)?;
        Ok(self)
    }

    fn group(&mut self, prefix: &str, middlewares: Vec<Middleware>) -> RouteGroup<'_> {
        RouteGroup::new(self, helpers::join_paths("/", prefix), middlewares)
    }
}
