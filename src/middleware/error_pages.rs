use super::{handler_fn, Handler, Middleware};
use crate::constants::{NOT_ALLOWED_TEXT, NOT_FOUND_TEXT};
use crate::context::Context;
use http::StatusCode;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Replaces responses by status code.
///
/// Once the wrapped chain is done, the handler registered for the pending status, if any, runs on the same
/// context. That also happens while a panic unwinds through the middleware. This is how the router's bare `404` and `405` statuses get a body.
///
/// # Examples
///
/// ```
/// use http::StatusCode;
/// use trellis::middleware::ErrorPages;
/// use trellis::{Context, Router};
///
/// let pages = ErrorPages::new()
///     .register(StatusCode::NOT_FOUND, |ctx: &mut Context| {
///         ctx.string(StatusCode::NOT_FOUND, "nothing here")
///     })
///     .build();
///
/// let mut builder = Router::builder();
/// builder.use_middleware(pages);
/// ```
#[derive(Clone, Default)]
pub struct ErrorPages {
    handlers: HashMap<StatusCode, Handler>,
}

impl ErrorPages {
    pub fn new() -> ErrorPages {
        ErrorPages::default()
    }

    /// Registers the page for `status`, replacing an earlier one.
    pub fn register<H>(mut self, status: StatusCode, handler: H) -> Self
    where
        H: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.handlers.insert(status, handler_fn(handler));
        self
    }

    pub fn build(self) -> Middleware {
        let handlers = Arc::new(self.handlers);
        Middleware::new(move |next| {
            let handlers = Arc::clone(&handlers);
            handler_fn(move |ctx: &mut Context| {
                let pending = PendingPage {
                    handlers: &handlers,
                    ctx,
                };
                next(&mut *pending.ctx);
            })
        })
    }
}

/// Runs the page for the final status when dropped, also while a panic unwinds through the middleware.
struct PendingPage<'a> {
    handlers: &'a HashMap<StatusCode, Handler>,
    ctx: &'a mut Context,
}

impl Drop for PendingPage<'_> {
    fn drop(&mut self) {
        let handlers = self.handlers;
        let Some(page) = handlers.get(&self.ctx.status_code()) else {
            return;
        };

        if !std::thread::panicking() {
            page(self.ctx);
            return;
        }
        // A second panic here would abort the process.
        let ctx = &mut *self.ctx;
        if panic::catch_unwind(AssertUnwindSafe(|| page(ctx))).is_err() {
            tracing::warn!(status = %ctx.status_code(), "the error page panicked");
        }
    }
}

/// Plain text pages for `404 Not Found` and `405 Method Not Allowed`.
pub fn error_pages() -> Middleware {
    ErrorPages::new()
        .register(StatusCode::NOT_FOUND, |ctx: &mut Context| {
            ctx.string(StatusCode::NOT_FOUND, NOT_FOUND_TEXT)
        })
        .register(StatusCode::METHOD_NOT_ALLOWED, |ctx: &mut Context| {
            ctx.string(StatusCode::METHOD_NOT_ALLOWED, NOT_ALLOWED_TEXT)
        })
        .build()
}
