use http::StatusCode;
use hyper::service::Service;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
// Import the trellis registration trait.
use trellis::prelude::*;
use trellis::{handler_fn, Context, Middleware, RegistrationError, Router, RouterService};

#[derive(Serialize)]
struct User<'a> {
    name: &'a str,
}

// A handler for "/" page.
fn home_handler(ctx: &mut Context) {
    ctx.string(StatusCode::OK, "Home page");
}

// A handler for "/users/:name" page.
fn user_handler(ctx: &mut Context) {
    let name = ctx.param("name").unwrap_or_default().to_owned();
    ctx.json(StatusCode::OK, &User { name: &name });
}

// A handler for everything under "/static/".
fn static_handler(ctx: &mut Context) {
    let path = ctx.path().trim_start_matches("/static/").to_owned();
    ctx.string(StatusCode::OK, format!("static file: {}", path));
}

// A middleware which refuses requests without an api key.
fn require_api_key() -> Middleware {
    Middleware::new(|next| {
        handler_fn(move |ctx: &mut Context| {
            if ctx.request().headers().contains_key("x-api-key") {
                next(ctx);
            } else {
                ctx.string(StatusCode::UNAUTHORIZED, "missing api key");
            }
        })
    })
}

fn router() -> Result<Router, RegistrationError> {
    // Access log, 404/405 pages and panic recovery.
    let mut builder = Router::with_defaults();
    builder
        .get("/", home_handler)?
        .get("/users/:name", user_handler)?
        .get("/static/*", static_handler)?;

    let mut admin = builder.group("/admin", vec![require_api_key()]);
    admin
        .get("/stats", |ctx: &mut Context| ctx.string(StatusCode::OK, "all good"))?
        .get("/panic", |_: &mut Context| panic!("admin asked for it"))?;

    Ok(builder.build())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Create a Service from the router above to handle incoming requests.
    let service = Arc::new(RouterService::new(router()?));

    // The address on which the server will be listening.
    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");

    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                let service = Arc::clone(&service);

                tokio::task::spawn(async move {
                    let request_service = match service.call(&stream).await {
                        Ok(request_service) => request_service,
                        Err(err) => match err {},
                    };

                    let io = TokioIo::new(stream);
                    let builder = Builder::new(TokioExecutor::new());
                    if let Err(err) = builder.serve_connection(io, request_service).await {
                        tracing::warn!(error = %err, "error serving connection");
                    }
                });
            }
            Err(err) => {
                tracing::error!(error = %err, "error accepting connection");
            }
        }
    }
}
