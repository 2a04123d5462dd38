use bytes::Bytes;
use http::{HeaderMap, Response, StatusCode};
use http_body_util::Full;
use std::io;

/// The outbound side of one request, as seen by [`Router::serve_http`](crate::Router::serve_http).
///
/// The router calls it exactly once per request, after every middleware returned: headers are merged into
/// [`headers_mut`](ResponseWriter::headers_mut), then [`write_header`](ResponseWriter::write_header) and
/// [`write`](ResponseWriter::write) follow.
pub trait ResponseWriter {
    fn headers_mut(&mut self) -> &mut HeaderMap;

    fn write_header(&mut self, status: StatusCode);

    fn write(&mut self, buf: &[u8]) -> io::Result<()>;
}

/// An in-memory [`ResponseWriter`].
///
/// The hyper service records every response into one and converts it with
/// [`into_response`](ResponseRecorder::into_response). Tests can drive a router with it directly.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use http::{Request, StatusCode};
/// use trellis::prelude::*;
/// use trellis::{Context, ResponseRecorder, Router};
///
/// let mut builder = Router::builder();
/// builder.get("/", |ctx: &mut Context| ctx.string(StatusCode::OK, "home")).unwrap();
/// let router = builder.build();
///
/// let mut recorder = ResponseRecorder::new();
/// router.serve_http(Request::get("/").body(Bytes::new()).unwrap(), &mut recorder);
///
/// assert_eq!(recorder.status(), StatusCode::OK);
/// assert_eq!(recorder.body(), b"home");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResponseRecorder {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ResponseRecorder {
    pub fn new() -> ResponseRecorder {
        ResponseRecorder::default()
    }

    /// The recorded status, `200 OK` if none was written.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The body as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn into_response(self) -> Response<Full<Bytes>> {
        let status = self.status();
        let mut resp = Response::new(Full::new(Bytes::from(self.body)));
        *resp.status_mut() = status;
        *resp.headers_mut() = self.headers;
        resp
    }
}

impl ResponseWriter for ResponseRecorder {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_header(&mut self, status: StatusCode) {
        // Only the first status sticks.
        if self.status.is_none() {
            self.status = Some(status);
        }
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(buf);
        Ok(())
    }
}
