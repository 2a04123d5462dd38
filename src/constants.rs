use http::Method;

/// The fixed set of methods a route may be registered under and a request may be dispatched for.
pub(crate) const SUPPORTED_METHODS: [Method; 9] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::HEAD,
    Method::OPTIONS,
    Method::DELETE,
    Method::CONNECT,
    Method::TRACE,
];

pub(crate) const DEFAULT_POOL_CAPACITY: usize = 1024;

pub(crate) const DEFAULT_MAX_BODY_SIZE: usize = 4 * 1024 * 1024;

pub(crate) const NOT_FOUND_TEXT: &str = "404 not found";

pub(crate) const NOT_ALLOWED_TEXT: &str = "405 not allowed";

pub(crate) const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";

pub(crate) const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";
