//! Per-method route trees.
//!
//! Every HTTP method owns one trie whose nodes are path segments. A segment is either literal text, a named
//! parameter (`:name`) which captures one request segment, or a trailing wildcard (`*`) which matches the rest
//! of the path. At each level a literal child is preferred over the parameter child, which is preferred over the
//! wildcard child. Lookup never backtracks.

use crate::error::RegistrationError;
use crate::helpers;
use crate::middleware::{Handler, Middleware};
use crate::route::Route;
use http::Method;
use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};

pub use self::params::{Param, Params};

pub(crate) use self::node::Node;

mod node;
mod params;

/// The route tree of a single HTTP method.
///
/// # Examples
///
/// ```
/// use trellis::{handler_fn, Context, Tree};
///
/// let mut tree = Tree::new();
/// tree.add_route("/user/:name", Vec::new(), handler_fn(|_: &mut Context| {})).unwrap();
///
/// let matched = tree.find_route("/user/ray").unwrap();
/// assert_eq!(matched.full_path, "/user/:name");
/// assert_eq!(matched.params.unwrap().get("name"), Some("ray"));
///
/// assert!(tree.find_route("/user/ray/10").is_none());
/// ```
#[derive(Debug)]
pub struct Tree {
    root: Node,
}

/// A successful lookup in a [`Tree`].
pub struct RouteMatch<'t> {
    /// The path the route was registered under.
    pub full_path: &'t str,
    /// The middleware bound to the route, outermost first.
    pub middlewares: &'t [Middleware],
    /// The bare handler.
    pub handler: &'t Handler,
    /// The captured parameters, `None` when the route has none.
    pub params: Option<Params>,
}

impl Debug for RouteMatch<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch")
            .field("full_path", &self.full_path)
            .field("middlewares", &self.middlewares.len())
            .field("params", &self.params)
            .finish()
    }
}

impl Tree {
    /// Creates a tree holding only the root node `/`.
    pub fn new() -> Tree {
        Tree { root: Node::root() }
    }

    /// Registers `handler` wrapped by `middlewares` at `path`.
    ///
    /// `path` must start with `/`, must not end with `/` unless it is the root, and must not contain empty
    /// segments. A `*` segment is only allowed in last position, and a wildcard and a parameter can't share a
    /// position.
    pub fn add_route(
        &mut self,
        path: &str,
        middlewares: Vec<Middleware>,
        handler: Handler,
    ) -> Result<(), RegistrationError> {
        self.root.add_route(path, middlewares, handler)
    }

    /// Looks up the route for a request path.
    pub fn find_route(&self, path: &str) -> Option<RouteMatch<'_>> {
        let mut params = Params::new();
        let route = self.root.find(path, &mut params)?;

        Some(RouteMatch {
            full_path: route.full_path(),
            middlewares: route.middlewares(),
            handler: route.handler(),
            params: if params.is_empty() { None } else { Some(params) },
        })
    }

    /// Looks up the route for `path`, appending captured parameters to `params`.
    ///
    /// On a miss `params` is left exactly as it was passed in.
    pub fn find_route_into(&self, path: &str, params: &mut Params) -> Option<&Route> {
        let len = params.len();
        let found = self.root.find(path, params);
        if found.is_none() {
            params.truncate(len);
        }
        found
    }

    pub(crate) fn routes(&self) -> Vec<&Route> {
        let mut routes = Vec::new();
        self.root.collect_routes(&mut routes);
        routes
    }
}

impl Default for Tree {
    fn default() -> Self {
        Tree::new()
    }
}

/// The route trees of every method that has at least one route.
#[derive(Debug, Default)]
pub(crate) struct Trees {
    trees: HashMap<Method, Tree>,
}

impl Trees {
    pub(crate) fn add_route(
        &mut self,
        method: Method,
        path: &str,
        middlewares: Vec<Middleware>,
        handler: Handler,
    ) -> Result<(), RegistrationError> {
        if !helpers::is_supported_method(&method) {
            return Err(RegistrationError::InvalidMethod { method });
        }
        self.trees.entry(method).or_default().add_route(path, middlewares, handler)
    }

    pub(crate) fn get(&self, method: &Method) -> Option<&Tree> {
        self.trees.get(method)
    }

    /// Every registered route with its method, sorted by path and then by method.
    pub(crate) fn routes(&self) -> Vec<(Method, &Route)> {
        let mut routes: Vec<(Method, &Route)> = self
            .trees
            .iter()
            .flat_map(|(method, tree)| tree.routes().into_iter().map(move |route| (method.clone(), route)))
            .collect();
        routes.sort_by(|a, b| {
            a.1.full_path()
                .cmp(b.1.full_path())
                .then_with(|| a.0.as_str().cmp(b.0.as_str()))
        });
        routes
    }
}
