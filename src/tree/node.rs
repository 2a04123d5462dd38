use crate::error::RegistrationError;
use crate::middleware::{Handler, Middleware};
use crate::route::Route;
use crate::tree::params::{Param, Params};
use std::collections::HashMap;
use std::sync::Arc;

const WILDCARD: &str = "*";

/// One path segment of a method's route tree.
///
/// Literal children are looked up by exact segment text. A node has at most one parameter child and at most
/// one wildcard child, never both.
#[derive(Default)]
pub(crate) struct Node {
    segment: String,
    // The parameter name for `:name` nodes, shared with every `Param` captured here.
    param_name: Option<Arc<str>>,
    children: HashMap<String, Node>,
    param_child: Option<Box<Node>>,
    wildcard_child: Option<Box<Node>>,
    route: Option<Route>,
}

enum Child<'n> {
    Static(&'n Node),
    Param(&'n Node),
    Wildcard(&'n Node),
}

impl Node {
    pub(crate) fn root() -> Node {
        Node {
            segment: "/".to_owned(),
            ..Node::default()
        }
    }

    fn with_segment(segment: &str) -> Node {
        Node {
            segment: segment.to_owned(),
            param_name: segment.strip_prefix(':').map(Arc::from),
            ..Node::default()
        }
    }

    pub(crate) fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub(crate) fn add_route(
        &mut self,
        path: &str,
        middlewares: Vec<Middleware>,
        handler: Handler,
    ) -> Result<(), RegistrationError> {
        validate_path(path)?;

        if path == "/" {
            if self.route.is_some() {
                return Err(RegistrationError::DuplicateRoute { path: path.to_owned() });
            }
            self.route = Some(Route::new(path, middlewares, handler));
            return Ok(());
        }

        let mut cur = self;
        for segment in path[1..].split('/') {
            cur = cur.insert(segment, path)?;
        }

        if cur.route.is_some() {
            return Err(RegistrationError::DuplicateRoute { path: path.to_owned() });
        }
        cur.route = Some(Route::new(path, middlewares, handler));
        Ok(())
    }

    fn insert(&mut self, segment: &str, path: &str) -> Result<&mut Node, RegistrationError> {
        if segment == WILDCARD {
            if self.param_child.is_some() {
                return Err(RegistrationError::WildcardParamConflict { path: path.to_owned() });
            }
            return Ok(&mut **self
                .wildcard_child
                .get_or_insert_with(|| Box::new(Node::with_segment(WILDCARD))));
        }

        if segment.starts_with(':') {
            if self.wildcard_child.is_some() {
                return Err(RegistrationError::WildcardParamConflict { path: path.to_owned() });
            }
            // An existing parameter child is reused whatever its name, so the first name registered wins.
            return Ok(&mut **self
                .param_child
                .get_or_insert_with(|| Box::new(Node::with_segment(segment))));
        }

        Ok(self
            .children
            .entry(segment.to_owned())
            .or_insert_with(|| Node::with_segment(segment)))
    }

    /// Resolves `path` below this node, appending captured parameters to `params`.
    ///
    /// On a miss `params` may hold a partial capture; the caller truncates it.
    pub(crate) fn find(&self, path: &str, params: &mut Params) -> Option<&Route> {
        if path == "/" {
            return self.route();
        }

        let mut cur = self;
        for segment in path.trim_matches('/').split('/') {
            if segment.is_empty() {
                return None;
            }

            cur = match cur.child(segment)? {
                Child::Static(node) => node,
                Child::Param(node) => {
                    if let Some(name) = &node.param_name {
                        params.push(Param::new(Arc::clone(name), segment));
                    }
                    node
                }
                // A wildcard swallows the rest of the path.
                Child::Wildcard(node) => return node.route(),
            };
        }

        cur.route()
    }

    // No backtracking: static > param > wildcard.
    fn child(&self, segment: &str) -> Option<Child<'_>> {
        if let Some(node) = self.children.get(segment) {
            return Some(Child::Static(node));
        }
        if let Some(node) = self.param_child.as_deref() {
            return Some(Child::Param(node));
        }
        self.wildcard_child.as_deref().map(Child::Wildcard)
    }

    pub(crate) fn collect_routes<'n>(&'n self, out: &mut Vec<&'n Route>) {
        if let Some(route) = &self.route {
            out.push(route);
        }
        for child in self.children.values() {
            child.collect_routes(out);
        }
        if let Some(child) = &self.param_child {
            child.collect_routes(out);
        }
        if let Some(child) = &self.wildcard_child {
            child.collect_routes(out);
        }
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("segment", &self.segment)
            .field("children", &self.children.len())
            .field("param", &self.param_child.as_ref().map(|n| n.segment.as_str()))
            .field("wildcard", &self.wildcard_child.is_some())
            .field("route", &self.route)
            .finish()
    }
}

fn validate_path(path: &str) -> Result<(), RegistrationError> {
    if path.is_empty() {
        return Err(RegistrationError::EmptyPath);
    }
    if !path.starts_with('/') {
        return Err(RegistrationError::MissingLeadingSlash { path: path.to_owned() });
    }
    if path == "/" {
        return Ok(());
    }
    if path.ends_with('/') {
        return Err(RegistrationError::TrailingSlash { path: path.to_owned() });
    }

    let mut segments = path[1..].split('/').peekable();
    while let Some(segment) = segments.next() {
        if segment.is_empty() {
            return Err(RegistrationError::EmptySegment { path: path.to_owned() });
        }
        if segment == ":" {
            return Err(RegistrationError::UnnamedParam { path: path.to_owned() });
        }
        if segment == WILDCARD && segments.peek().is_some() {
            return Err(RegistrationError::WildcardNotLast { path: path.to_owned() });
        }
    }
    Ok(())
}
