use crate::middleware::{self, Handler, Middleware};
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// A registered route, bound to the terminal node of its path in a method's tree.
///
/// A route is created by the tree on registration. The per-route middleware is composed around the
/// handler once, at that point, so dispatching a matched request never re-wraps anything.
pub struct Route {
    pub(crate) full_path: Arc<str>,
    pub(crate) middlewares: Vec<Middleware>,
    pub(crate) handler: Handler,
    // `handler` wrapped by `middlewares`, first-registered outermost.
    pub(crate) chain: Handler,
}

impl Route {
    pub(crate) fn new(full_path: &str, middlewares: Vec<Middleware>, handler: Handler) -> Route {
        let chain = middleware::compose(&middlewares, Arc::clone(&handler));
        Route {
            full_path: Arc::from(full_path),
            middlewares,
            handler,
            chain,
        }
    }

    /// The path this route was registered under, e.g. `/user/:name`.
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    /// The middleware bound to this route at registration, outermost first.
    pub fn middlewares(&self) -> &[Middleware] {
        &self.middlewares
    }

    /// The bare handler, without its middleware.
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// The handler wrapped by this route's middleware.
    pub fn chain(&self) -> &Handler {
        &self.chain
    }
}

impl Debug for Route {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ path: {:?}, middlewares: {} }}",
            self.full_path,
            self.middlewares.len()
        )
    }
}
