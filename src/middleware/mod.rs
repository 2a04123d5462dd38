use crate::context::Context;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

pub use self::access_log::{logger, AccessLog, LogEntry, LogWriter, TracingLogWriter};
pub use self::error_pages::{error_pages, ErrorPages};
pub use self::recovery::{recovery, DefaultPanicRecovery, PanicRecovery, Recovery};

pub(crate) use self::recovery::panic_message;

mod access_log;
mod error_pages;
mod recovery;

/// A request handler. Handlers and middleware communicate only through the [`Context`].
pub type Handler = Arc<dyn Fn(&mut Context) + Send + Sync + 'static>;

type Decorator = Arc<dyn Fn(Handler) -> Handler + Send + Sync + 'static>;

/// Boxes a closure into a [`Handler`].
///
/// # Examples
///
/// ```
/// use http::StatusCode;
/// use trellis::{handler_fn, Context, Handler};
///
/// let hello: Handler = handler_fn(|ctx: &mut Context| ctx.string(StatusCode::OK, "hello"));
/// ```
pub fn handler_fn<H>(handler: H) -> Handler
where
    H: Fn(&mut Context) + Send + Sync + 'static,
{
    Arc::new(handler)
}

/// A middleware decorates one handler into another. Please refer to the [Middleware](./index.html#middleware) docs.
///
/// The decorator receives the next handler in the chain and returns the handler that runs in its place. It may
/// do work before and after calling `next`, or skip calling it to short-circuit the chain.
///
/// Within a sequence of middleware the first one declared is the outermost wrapper: it runs first on the way in
/// and last on the way out. Global middleware always wraps route and group middleware.
///
/// # Examples
///
/// ```
/// use trellis::{handler_fn, Context, Middleware, Router};
///
/// let timing = Middleware::new(|next| {
///     handler_fn(move |ctx: &mut Context| {
///         let start = std::time::Instant::now();
///         next(ctx);
///         tracing::debug!(elapsed = ?start.elapsed(), "request handled");
///     })
/// });
///
/// let mut builder = Router::builder();
/// builder.use_middleware(timing);
/// ```
#[derive(Clone)]
pub struct Middleware {
    decorator: Decorator,
}

impl Middleware {
    /// Creates a middleware from a decorator function.
    pub fn new<M>(decorator: M) -> Middleware
    where
        M: Fn(Handler) -> Handler + Send + Sync + 'static,
    {
        Middleware {
            decorator: Arc::new(decorator),
        }
    }

    /// Wraps `next` with this middleware.
    pub fn wrap(&self, next: Handler) -> Handler {
        (self.decorator)(next)
    }
}

impl Debug for Middleware {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Middleware {{ .. }}")
    }
}

/// Wraps `handler` with `middlewares` so that the first middleware is the outermost layer.
pub(crate) fn compose(middlewares: &[Middleware], handler: Handler) -> Handler {
    middlewares.iter().rev().fold(handler, |next, mw| mw.wrap(next))
}
