use super::RemoteAddr;
use crate::middleware::panic_message;
use crate::response::ResponseRecorder;
use crate::router::Router;
use crate::{Error, RouteError};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::{service::Service, Request, Response, StatusCode};
use std::future::Future;
use std::net::SocketAddr;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;

/// Serves the requests of one connection.
///
/// The request body is read into memory, up to [`Config::max_body_size`](crate::Config::max_body_size), and the
/// request is dispatched synchronously on the connection's task.
#[derive(Debug, Clone)]
pub struct RequestService {
    pub(crate) router: Arc<Router>,
    pub(crate) remote_addr: SocketAddr,
}

impl<B> Service<Request<B>> for RequestService
where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<RouteError>,
{
    type Response = Response<Full<Bytes>>;
    type Error = RouteError;
    #[allow(clippy::type_complexity)]
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<B>) -> Self::Future {
        let router = self.router.clone();
        let remote_addr = self.remote_addr;

        let fut = async move {
            let (mut parts, body) = req.into_parts();
            parts.extensions.insert(RemoteAddr(remote_addr));

            let body = match Limited::new(body, router.config().max_body_size).collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
                    tracing::warn!(
                        method = %parts.method,
                        path = parts.uri.path(),
                        limit = router.config().max_body_size,
                        "request body too large"
                    );
                    let mut resp = Response::new(Full::new(Bytes::new()));
                    *resp.status_mut() = StatusCode::PAYLOAD_TOO_LARGE;
                    return Ok(resp);
                }
                Err(err) => return Err(Error::Body(err).into()),
            };

            dispatch(&router, Request::from_parts(parts, body))
        };

        Box::pin(fut)
    }
}

fn dispatch(router: &Router, req: Request<Bytes>) -> Result<Response<Full<Bytes>>, RouteError> {
    let mut recorder = ResponseRecorder::new();

    if !router.config().catch_unwind {
        router.serve_http(req, &mut recorder);
        return Ok(recorder.into_response());
    }

    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    match panic::catch_unwind(AssertUnwindSafe(|| router.serve_http(req, &mut recorder))) {
        Ok(()) => Ok(recorder.into_response()),
        Err(payload) => {
            let msg = panic_message(payload.as_ref());
            tracing::error!(method = %method, path = %path, panic = %msg, "request handler panicked without recovery");
            Err(Error::Panicked(msg).into())
        }
    }
}

/// Creates a [`RequestService`] per connection around a shared [`Router`].
#[derive(Debug)]
pub struct RequestServiceBuilder {
    router: Arc<Router>,
}

impl RequestServiceBuilder {
    pub fn new(router: impl Into<Arc<Router>>) -> Self {
        Self { router: router.into() }
    }

    pub fn build(&self, remote_addr: SocketAddr) -> RequestService {
        RequestService {
            router: self.router.clone(),
            remote_addr,
        }
    }
}
