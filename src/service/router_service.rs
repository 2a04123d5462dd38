use crate::router::Router;
use crate::service::request_service::{RequestService, RequestServiceBuilder};
use hyper::service::Service;
use std::convert::Infallible;
use std::future::{ready, Ready};
use std::net::SocketAddr;
use tokio::net::TcpStream;

/// A [`Service`](https://docs.rs/hyper/1/hyper/service/trait.Service.html) that makes a [`RequestService`] for
/// each accepted connection.
///
/// # Examples
///
/// ```no_run
/// use http::StatusCode;
/// use hyper::service::Service;
/// use hyper_util::rt::{TokioExecutor, TokioIo};
/// use hyper_util::server::conn::auto::Builder;
/// use trellis::prelude::*;
/// use trellis::{Context, Router, RouterService};
/// use std::net::SocketAddr;
/// use std::sync::Arc;
/// use tokio::net::TcpListener;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
///     let mut builder = Router::with_defaults();
///     builder.get("/", |ctx: &mut Context| ctx.string(StatusCode::OK, "Home page"))?;
///
///     let service = Arc::new(RouterService::new(builder.build()));
///
///     let addr = SocketAddr::from(([127, 0, 0, 1], 3001));
///     let listener = TcpListener::bind(addr).await?;
///
///     loop {
///         let (stream, _) = listener.accept().await?;
///         let router_service = service.clone();
///
///         tokio::spawn(async move {
///             // Get the request service for this connection
///             let request_service = router_service.call(&stream).await.unwrap();
///
///             let io = TokioIo::new(stream);
///             let builder = Builder::new(TokioExecutor::new());
///             if let Err(err) = builder.serve_connection(io, request_service).await {
///                 tracing::warn!(error = %err, "error serving connection");
///             }
///         });
///     }
/// }
/// ```
#[derive(Debug)]
pub struct RouterService {
    builder: RequestServiceBuilder,
}

impl RouterService {
    /// Creates a new service around the provided router.
    pub fn new(router: Router) -> RouterService {
        RouterService {
            builder: RequestServiceBuilder::new(router),
        }
    }
}

impl Service<&TcpStream> for RouterService {
    type Response = RequestService;
    type Error = Infallible;
    type Future = Ready<Result<Self::Response, Self::Error>>;

    fn call(&self, conn: &TcpStream) -> Self::Future {
        let addr = conn
            .peer_addr()
            .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 0)));

        ready(Ok(self.builder.build(addr)))
    }
}
