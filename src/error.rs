use http::Method;
use thiserror::Error;

/// The boxed error type used at the hyper service boundary.
pub type RouteError = Box<dyn std::error::Error + Send + Sync>;

/// A fault detected while registering a route.
///
/// These are programmer errors: every one of them is discoverable at startup, so applications are
/// expected to propagate them out of `main` with `?` rather than recover.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// The route path was empty.
    #[error("route path must not be empty")]
    EmptyPath,

    /// The route path did not start with `/`.
    #[error("route path must begin with '/': {path}")]
    MissingLeadingSlash { path: String },

    /// A route path other than `/` ended with `/`.
    #[error("route path must not end with '/': {path}")]
    TrailingSlash { path: String },

    /// The route path contained an empty segment, as in `/a//b`.
    #[error("route path contains an empty segment: {path}")]
    EmptySegment { path: String },

    /// A wildcard and a parameter were registered at the same position.
    #[error("conflict between wildcard and parameter routes: {path}")]
    WildcardParamConflict { path: String },

    /// A `*` segment was followed by further segments.
    #[error("wildcard '*' must be the last segment of a route: {path}")]
    WildcardNotLast { path: String },

    /// A `:` segment had no name.
    #[error("parameter segments must be named: {path}")]
    UnnamedParam { path: String },

    /// A handler was already bound to the path.
    #[error("duplicate route: {path}")]
    DuplicateRoute { path: String },

    /// The method is not one of the nine standard HTTP methods.
    #[error("invalid HTTP method: {method}")]
    InvalidMethod { method: Method },
}

/// The crate-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// A route could not be registered.
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// The request body could not be read.
    #[error("couldn't read the request body: {0}")]
    Body(#[source] RouteError),

    /// The request body could not be decoded into the target value.
    #[error("couldn't bind the request body: {0}")]
    Bind(String),

    /// A value could not be rendered into the response body.
    #[error("couldn't render the response: {0}")]
    Render(#[from] serde_json::Error),

    /// A handler or middleware panicked and no recovery middleware caught it.
    #[error("the request handler panicked: {0}")]
    Panicked(String),
}

impl Error {
    /// Creates a bind error from anything printable.
    pub fn bind<M: Into<String>>(msg: M) -> Error {
        Error::Bind(msg.into())
    }
}
