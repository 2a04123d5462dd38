use crate::binding::{Binding, JsonBinding};
use crate::middleware::Handler;
use crate::render::{Json, Render, Text};
use crate::route::Route;
use crate::service::RemoteAddr;
use crate::tree::Params;
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method, Request, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::net::SocketAddr;
use std::sync::Arc;

pub(crate) use self::pool::ContextPool;

mod pool;

type Values = HashMap<String, Box<dyn Any + Send + Sync>>;

/// The state of one request as it travels through the middleware chain.
///
/// A context carries the request, the parameters captured by the matched route, and the pending response:
/// a status (`200 OK` until changed), headers and a body. Nothing reaches the client until every middleware
/// has returned, so an outer middleware always sees, and may still change, what inner layers produced.
///
/// Contexts are pooled and reused by later requests. Don't keep references to a context, or to anything
/// borrowed from it, beyond the handler call.
///
/// # Examples
///
/// ```
/// use http::StatusCode;
/// use trellis::prelude::*;
/// use trellis::{Context, Router};
///
/// fn user(ctx: &mut Context) {
///     let name = ctx.param("name").unwrap_or("stranger").to_owned();
///     let lang = ctx.query("lang").unwrap_or("en").to_owned();
///     ctx.string(StatusCode::OK, format!("hello {} ({})", name, lang));
/// }
///
/// let mut builder = Router::builder();
/// builder.get("/user/:name", user).unwrap();
/// ```
pub struct Context {
    request: Request<Bytes>,
    params: Params,
    route: Option<Arc<str>>,
    handler: Option<Handler>,
    status: StatusCode,
    headers: HeaderMap,
    // The Content-Type last set by a renderer. A later render may replace it while it is still pending.
    rendered_content_type: Option<&'static str>,
    body: Vec<u8>,
    values: Option<Values>,
    query: OnceCell<Vec<(String, String)>>,
}

impl Context {
    /// Creates a detached context, as the router would hand out for an empty `GET /`.
    ///
    /// Handy for exercising a handler or a middleware without a router.
    pub fn new() -> Context {
        Context {
            request: Request::default(),
            params: Params::new(),
            route: None,
            handler: None,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            rendered_content_type: None,
            body: Vec::new(),
            values: None,
            query: OnceCell::new(),
        }
    }

    /// Creates a detached context around `request`.
    pub fn with_request(request: Request<Bytes>) -> Context {
        let mut ctx = Context::new();
        ctx.request = request;
        ctx
    }

    pub(crate) fn attach(&mut self, request: Request<Bytes>) {
        self.request = request;
    }

    pub(crate) fn bind_route(&mut self, route: &Route) {
        self.route = Some(Arc::clone(&route.full_path));
        self.handler = Some(Arc::clone(&route.handler));
    }

    #[cfg(test)]
    pub(crate) fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    // Route lookup reads the path while it fills the parameter buffer.
    pub(crate) fn dispatch_parts(&mut self) -> (&Request<Bytes>, &mut Params) {
        (&self.request, &mut self.params)
    }

    pub(crate) fn reset(&mut self) {
        self.request = Request::default();
        self.params.clear();
        self.route = None;
        self.handler = None;
        self.status = StatusCode::OK;
        self.headers.clear();
        self.rendered_content_type = None;
        self.body.clear();
        self.values = None;
        self.query = OnceCell::new();
    }

    pub fn request(&self) -> &Request<Bytes> {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut Request<Bytes> {
        &mut self.request
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    /// The raw request path, before percent-decoding.
    pub fn path(&self) -> &str {
        self.request.uri().path()
    }

    /// The peer address, when the request came in through the hyper service.
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.request.extensions().get::<RemoteAddr>().map(|addr| addr.0)
    }

    /// The path the matched route was registered under, e.g. `/user/:name`. `None` until a route matched.
    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    /// The bare handler of the matched route.
    pub fn handler(&self) -> Option<&Handler> {
        self.handler.as_ref()
    }

    /// Returns the value captured for the route parameter `key`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key)
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    fn query_pairs(&self) -> &[(String, String)] {
        self.query.get_or_init(|| {
            self.request
                .uri()
                .query()
                .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
                .unwrap_or_default()
        })
    }

    /// Returns the first query string value for `key`. The query string is parsed once per request.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query_pairs()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns every query string value for `key`, in order.
    pub fn query_all(&self, key: &str) -> Vec<&str> {
        self.query_pairs()
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Sets the pending response status.
    pub fn status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Replaces the pending response body with `data`.
    pub fn write(&mut self, data: &[u8]) {
        self.body.clear();
        self.body.extend_from_slice(data);
    }

    pub fn write_with_status(&mut self, status: StatusCode, data: &[u8]) {
        self.status = status;
        self.write(data);
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Sets a pending response header, replacing earlier values. An empty `value` removes the header.
    pub fn header(&mut self, name: HeaderName, value: &str) {
        if value.is_empty() {
            self.headers.remove(&name);
            return;
        }

        match HeaderValue::from_str(value) {
            Ok(value) => {
                self.headers.insert(name, value);
            }
            Err(_) => tracing::warn!(header = %name, "dropping invalid response header value"),
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Stores a value for later middleware or the handler of this request.
    pub fn set_value<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.values
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), Box::new(value));
    }

    /// Returns the value stored under `key` if it has type `T`.
    pub fn value<T: Any + Send + Sync>(&self, key: &str) -> Option<&T> {
        self.values.as_ref()?.get(key)?.downcast_ref::<T>()
    }

    /// Removes the value stored under `key`, returning it if it has type `T`.
    pub fn remove_value<T: Any + Send + Sync>(&mut self, key: &str) -> Option<T> {
        let value = self.values.as_mut()?.remove(key)?;
        value.downcast::<T>().ok().map(|v| *v)
    }

    /// Renders `r` as the pending response with `status`, replacing any pending body.
    ///
    /// The renderer's content type is set unless another `Content-Type` header was set explicitly. One left
    /// by an earlier render is replaced. If rendering fails the response
    /// becomes a `500 Internal Server Error` carrying the error text.
    pub fn render<R: Render>(&mut self, status: StatusCode, r: R) {
        let replace = match self.headers.get(CONTENT_TYPE) {
            None => true,
            Some(pending) => self.rendered_content_type.is_some_and(|ct| pending == ct),
        };
        if replace {
            let ct = r.content_type();
            self.headers.insert(CONTENT_TYPE, HeaderValue::from_static(ct));
            self.rendered_content_type = Some(ct);
        }

        self.body.clear();
        match r.render(&mut self.body) {
            Ok(()) => self.status = status,
            Err(err) => {
                tracing::error!(error = %err, route = ?self.route, "couldn't render the response");
                self.write_with_status(StatusCode::INTERNAL_SERVER_ERROR, err.to_string().as_bytes());
            }
        }
    }

    /// Renders `text` as `text/plain`.
    pub fn string(&mut self, status: StatusCode, text: impl AsRef<str>) {
        self.render(status, Text(text));
    }

    /// Renders `value` as JSON.
    pub fn json<T: Serialize>(&mut self, status: StatusCode, value: &T) {
        self.render(status, Json(value));
    }

    /// Decodes the JSON request body.
    pub fn bind_json<T: DeserializeOwned>(&self) -> crate::Result<T> {
        JsonBinding.bind(&self.request)
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::new()
    }
}

impl Debug for Context {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("method", self.request.method())
            .field("uri", self.request.uri())
            .field("route", &self.route)
            .field("params", &self.params)
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn get(uri: &str) -> Context {
        Context::with_request(Request::get(uri).body(Bytes::new()).unwrap())
    }

    #[test]
    fn should_parse_query_lazily() {
        let ctx = get("/search?q=rust&tag=a&tag=b&empty=");

        assert_eq!(ctx.query("q"), Some("rust"));
        assert_eq!(ctx.query("tag"), Some("a"));
        assert_eq!(ctx.query_all("tag"), vec!["a", "b"]);
        assert_eq!(ctx.query("empty"), Some(""));
        assert_eq!(ctx.query("missing"), None);
        assert!(get("/search").query("q").is_none());
    }

    #[test]
    fn should_decode_query_values() {
        let ctx = get("/search?q=hello%20world&name=ray+k");
        assert_eq!(ctx.query("q"), Some("hello world"));
        assert_eq!(ctx.query("name"), Some("ray k"));
    }

    #[test]
    fn should_replace_body_on_write() {
        let mut ctx = Context::new();
        ctx.write(b"first");
        ctx.write_with_status(StatusCode::ACCEPTED, b"second");
        assert_eq!(ctx.body(), b"second");
        assert_eq!(ctx.status_code(), StatusCode::ACCEPTED);
    }

    #[test]
    fn should_remove_header_on_empty_value() {
        let mut ctx = Context::new();
        ctx.header(HeaderName::from_static("x-request-id"), "42");
        assert_eq!(ctx.headers()["x-request-id"], "42");

        ctx.header(HeaderName::from_static("x-request-id"), "");
        assert!(!ctx.headers().contains_key("x-request-id"));
    }

    #[test]
    fn should_store_typed_values() {
        let mut ctx = Context::new();
        assert!(ctx.value::<u32>("user").is_none());

        ctx.set_value("user", 7u32);
        assert_eq!(ctx.value::<u32>("user"), Some(&7));
        assert!(ctx.value::<String>("user").is_none());
        assert_eq!(ctx.remove_value::<u32>("user"), Some(7));
        assert!(ctx.value::<u32>("user").is_none());
    }

    #[test]
    fn should_render_string_and_json() {
        let mut ctx = Context::new();
        ctx.string(StatusCode::CREATED, "done");
        assert_eq!(ctx.status_code(), StatusCode::CREATED);
        assert_eq!(ctx.body(), b"done");
        assert_eq!(ctx.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");

        let mut ctx = Context::new();
        ctx.json(StatusCode::OK, &serde_json::json!({"name": "ray"}));
        assert_eq!(ctx.body(), br#"{"name":"ray"}"#);
        assert_eq!(ctx.headers()[CONTENT_TYPE], "application/json; charset=utf-8");
    }

    #[test]
    fn should_keep_explicit_content_type() {
        let mut ctx = Context::new();
        ctx.header(CONTENT_TYPE, "text/html");
        ctx.string(StatusCode::OK, "<p>hi</p>");
        assert_eq!(ctx.headers()[CONTENT_TYPE], "text/html");
    }

    #[test]
    fn should_replace_content_type_of_earlier_render() {
        let mut ctx = Context::new();
        ctx.json(StatusCode::NOT_FOUND, &serde_json::json!({"error": "no user"}));
        ctx.string(StatusCode::NOT_FOUND, "404 not found");
        assert_eq!(ctx.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");

        let mut ctx = Context::new();
        ctx.string(StatusCode::OK, "draft");
        ctx.header(CONTENT_TYPE, "text/markdown");
        ctx.string(StatusCode::OK, "# final");
        assert_eq!(ctx.headers()[CONTENT_TYPE], "text/markdown");
    }

    #[test]
    fn should_turn_render_errors_into_500() {
        struct Broken;

        impl Render for Broken {
            fn content_type(&self) -> &'static str {
                "application/octet-stream"
            }

            fn render(&self, buf: &mut Vec<u8>) -> crate::Result<()> {
                buf.extend_from_slice(b"partial");
                Err(crate::Error::bind("boom"))
            }
        }

        let mut ctx = Context::new();
        ctx.render(StatusCode::OK, Broken);
        assert_eq!(ctx.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ctx.body(), b"couldn't bind the request body: boom");
    }

    #[test]
    fn should_bind_json_body() {
        #[derive(Deserialize)]
        struct Login {
            user: String,
        }

        let req = Request::post("/login")
            .body(Bytes::from_static(br#"{"user":"ray"}"#))
            .unwrap();
        let login: Login = Context::with_request(req).bind_json().unwrap();
        assert_eq!(login.user, "ray");
    }

    #[test]
    fn should_reset_every_field() {
        let mut ctx = get("/a?x=1");
        ctx.params_mut().push(crate::tree::Param::new(Arc::from("name"), "ray"));
        ctx.status(StatusCode::NOT_FOUND);
        ctx.write(b"gone");
        ctx.header(CONTENT_TYPE, "text/plain");
        ctx.set_value("k", 1u8);
        assert_eq!(ctx.query("x"), Some("1"));

        ctx.reset();

        assert!(ctx.params().is_empty());
        assert_eq!(ctx.status_code(), StatusCode::OK);
        assert!(ctx.body().is_empty());
        assert!(ctx.headers().is_empty());
        assert!(ctx.value::<u8>("k").is_none());
        assert!(ctx.route().is_none());
        assert!(ctx.handler().is_none());
        assert_eq!(ctx.path(), "/");
        assert!(ctx.query("x").is_none());
    }
}
