//! Serving a [`Router`](crate::Router) with hyper.

use std::net::SocketAddr;

pub use self::request_service::{RequestService, RequestServiceBuilder};
pub use self::router_service::RouterService;

mod request_service;
mod router_service;

/// The peer address of the connection a request arrived on, stored in the request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteAddr(pub SocketAddr);
