#![allow(dead_code)]

use bytes::Bytes;
use http_body_util::Full;
use hyper::service::Service;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use hyper_util::rt::TokioIo;
use hyper_util::server::conn::auto::Builder;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot::{self, Sender};
use trellis::{Router, RouterService};

pub struct Serve {
    addr: SocketAddr,
    tx: Sender<()>,
}

impl Serve {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn new_request(&self, method: &str, route: &str) -> http::request::Builder {
        http::request::Request::builder()
            .method(method.to_ascii_uppercase().as_str())
            .uri(format!("http://{}{}", self.addr(), route))
    }

    pub fn shutdown(self) {
        let _ = self.tx.send(());
    }
}

pub async fn serve(router: Router) -> Serve {
    // Bind a TCP listener to an available port.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    // Build the router service, which must be Arc to clone into spawned tasks.
    let router_service = Arc::new(RouterService::new(router));
    let (tx, mut rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        loop {
            let stream = tokio::select! {
                accepted = listener.accept() => accepted.unwrap().0,
                _ = &mut rx => break,
            };
            let router_service = router_service.clone();
            tokio::spawn(async move {
                let request_service = router_service.call(&stream).await.unwrap();
                let io = TokioIo::new(stream);
                let builder = Builder::new(TokioExecutor::new());
                let _ = builder.serve_connection(io, request_service).await;
            });
        }
    });

    Serve { addr, tx }
}

pub fn client() -> Client<HttpConnector, Full<Bytes>> {
    Client::builder(TokioExecutor::new()).build_http()
}

pub async fn into_text<B>(body: B) -> String
where
    B: hyper::body::Body<Data = Bytes> + Send,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    use http_body_util::BodyExt;
    String::from_utf8_lossy(&body.collect().await.unwrap().to_bytes()).to_string()
}
