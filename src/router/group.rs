use super::RouterBuilder;
use crate::constants::SUPPORTED_METHODS;
use crate::context::Context;
use crate::error::RegistrationError;
use crate::helpers;
use crate::middleware::{handler_fn, Handler, Middleware};
use http::Method;
use std::sync::Arc;

/// Route registration, shared by [`RouterBuilder`] and [`RouteGroup`].
///
/// Paths are relative to the registrar's base path. They may contain literal segments, `:name` parameter
/// segments and a final `*` wildcard segment. Every method returns the registrar again so calls can be chained
/// with `?`.
pub trait Routes {
    /// Registers an already boxed handler. The other registration methods funnel into this one.
    fn add_route(&mut self, method: Method, path: &str, handler: Handler) -> Result<&mut Self, RegistrationError>;

    /// Creates a sub-group under `prefix`. The group's middleware is a copy of this registrar's middleware
    /// followed by `middlewares`.
    fn group(&mut self, prefix: &str, middlewares: Vec<Middleware>) -> RouteGroup<'_>;

    fn handle<H>(&mut self, method: Method, path: &str, handler: H) -> Result<&mut Self, RegistrationError>
    where
        H: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.add_route(method, path, handler_fn(handler))
    }

    fn get<H>(&mut self, path: &str, handler: H) -> Result<&mut Self, RegistrationError>
    where
        H: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.handle(Method::GET, path, handler)
    }

    fn post<H>(&mut self, path: &str, handler: H) -> Result<&mut Self, RegistrationError>
    where
        H: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.handle(Method::POST, path, handler)
    }

    fn put<H>(&mut self, path: &str, handler: H) -> Result<&mut Self, RegistrationError>
    where
        H: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.handle(Method::PUT, path, handler)
    }

    fn patch<H>(&mut self, path: &str, handler: H) -> Result<&mut Self, RegistrationError>
    where
        H: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.handle(Method::PATCH, path, handler)
    }

    fn delete<H>(&mut self, path: &str, handler: H) -> Result<&mut Self, RegistrationError>
    where
        H: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.handle(Method::DELETE, path, handler)
    }

    fn head<H>(&mut self, path: &str, handler: H) -> Result<&mut Self, RegistrationError>
    where
        H: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.handle(Method::HEAD, path, handler)
    }

    fn options<H>(&mut self, path: &str, handler: H) -> Result<&mut Self, RegistrationError>
    where
        H: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.handle(Method::OPTIONS, path, handler)
    }

    fn trace<H>(&mut self, path: &str, handler: H) -> Result<&mut Self, RegistrationError>
    where
        H: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.handle(Method::TRACE, path, handler)
    }

    fn connect<H>(&mut self, path: &str, handler: H) -> Result<&mut Self, RegistrationError>
    where
        H: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.handle(Method::CONNECT, path, handler)
    }

    /// Registers one handler under all nine standard methods.
    fn any<H>(&mut self, path: &str, handler: H) -> Result<&mut Self, RegistrationError>
    where
        H: Fn(&mut Context) + Send + Sync + 'static,
    {
        let handler = handler_fn(handler);
        for method in SUPPORTED_METHODS.iter() {
            self.add_route(method.clone(), path, Arc::clone(&handler))?;
        }
        Ok(self)
    }
}

/// A path prefix and a middleware list that routes registered through it share.
///
/// Groups exist only while routes are registered: a group borrows the [`RouterBuilder`] it registers into, and
/// nothing of it is left at request time besides the full paths and middleware of its routes.
///
/// # Examples
///
/// ```
/// use http::StatusCode;
/// use trellis::prelude::*;
/// use trellis::{handler_fn, Context, Middleware, Router};
///
/// # fn main() -> Result<(), trellis::RegistrationError> {
/// let auth = Middleware::new(|next| {
///     handler_fn(move |ctx: &mut Context| {
///         if ctx.request().headers().contains_key("authorization") {
///             next(ctx);
///         } else {
///             ctx.status(StatusCode::UNAUTHORIZED);
///         }
///     })
/// });
///
/// let mut builder = Router::builder();
/// let mut admin = builder.group("/admin", vec![auth]);
/// admin.get("/stats", |ctx: &mut Context| ctx.string(StatusCode::OK, "42"))?;
///
/// let router = builder.build();
/// assert_eq!(router.routes()[0].1, "/admin/stats");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RouteGroup<'r> {
    builder: &'r mut RouterBuilder,
    base_path: String,
    middlewares: Vec<Middleware>,
}

impl<'r> RouteGroup<'r> {
    pub(crate) fn new(builder: &'r mut RouterBuilder, base_path: String, middlewares: Vec<Middleware>) -> Self {
        RouteGroup {
            builder,
            base_path,
            middlewares,
        }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn middlewares(&self) -> &[Middleware] {
        &self.middlewares
    }

    /// Appends to this group's middleware. Only routes and sub-groups created afterwards get it.
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
}

impl Routes for RouteGroup<'_> {
    fn add_route(&mut self, method: Method, path: &str, handler: Handler) -> Result<&mut Self, RegistrationError> {
        let path = helpers::join_paths(&self.base_path, path);
        self.builder
            .register(method, &path, self.middlewares.clone(), handler)?;
        Ok(self)
    }

    fn group(&mut self, prefix: &str, middlewares: Vec<Middleware>) -> RouteGroup<'_> {
        let mut inherited = self.middlewares.clone();
        inherited.extend(middlewares);
        RouteGroup::new(self.builder, helpers::join_paths(&self.base_path, prefix), inherited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::ResponseRecorder;
    use crate::router::Router;
    use bytes::Bytes;
    use http::{Request, StatusCode};
    use parking_lot::Mutex;

    fn tag(name: &'static str, trace: &Arc<Mutex<Vec<&'static str>>>) -> Middleware {
        let trace = Arc::clone(trace);
        Middleware::new(move |next| {
            let trace = Arc::clone(&trace);
            handler_fn(move |ctx: &mut Context| {
                trace.lock().push(name);
                next(ctx);
            })
        })
    }

    fn call(router: &Router, uri: &str) -> ResponseRecorder {
        let mut resp = ResponseRecorder::new();
        router.serve_http(Request::get(uri).body(Bytes::new()).unwrap(), &mut resp);
        resp
    }

    #[test]
    fn should_join_group_paths() {
        let mut builder = Router::builder();
        {
            let mut api = builder.group("/api", vec![]);
            api.get("/users", |_: &mut Context| {}).unwrap();

            let mut v1 = api.group("v1/", vec![]);
            assert_eq!(v1.base_path(), "/api/v1/");
            v1.get("/detail", |_: &mut Context| {}).unwrap();
        }

        let router = builder.build();
        let paths: Vec<&str> = router.routes().into_iter().map(|(_, path)| path).collect();
        assert_eq!(paths, vec!["/api/users", "/api/v1/detail"]);
    }

    #[test]
    fn should_snapshot_middleware_into_sub_groups() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let mut builder = Router::builder();
        {
            let mut api = builder.group("/api", vec![tag("api", &trace)]);
            let mut users = api.group("/users", vec![tag("users", &trace)]);
            users.get("/:id", |_: &mut Context| {}).unwrap();

            // Added after `users` was created, so only later routes of `api` get it.
            api.use_middleware(tag("late", &trace));
            api.get("/health", |_: &mut Context| {}).unwrap();
        }
        let router = builder.build();

        call(&router, "/api/users/7");
        assert_eq!(*trace.lock(), vec!["api", "users"]);

        trace.lock().clear();
        call(&router, "/api/health");
        assert_eq!(*trace.lock(), vec!["api", "late"]);
    }

    #[test]
    fn should_keep_group_middleware_off_other_routes() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let mut builder = Router::builder();
        builder
            .group("/admin", vec![tag("admin", &trace)])
            .get("", |_: &mut Context| {})
            .unwrap();
        builder.get("/public", |_: &mut Context| {}).unwrap();
        let router = builder.build();

        call(&router, "/public");
        assert!(trace.lock().is_empty());

        let resp = call(&router, "/admin");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(*trace.lock(), vec!["admin"]);
    }

    #[test]
    fn should_keep_trailing_slash_of_relative_path() {
        let mut builder = Router::builder();
        let mut admin = builder.group("/admin", vec![]);

        assert_eq!(
            admin.get("/", |_: &mut Context| {}).err(),
            Some(RegistrationError::TrailingSlash { path: "/admin/".to_owned() })
        );
    }
}
