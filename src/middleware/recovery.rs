use super::{handler_fn, Middleware};
use crate::context::Context;
use http::StatusCode;
use serde_json::json;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Turns a panic caught by [`Recovery`] into a response.
pub trait PanicRecovery: Send + Sync + 'static {
    /// Called with the panic message once the chain below the middleware unwound.
    fn recover(&self, ctx: &mut Context, msg: &str);
}

/// Answers `500 Internal Server Error` with a JSON body describing the failure:
///
/// ```json
/// {"code": 500, "path": "/user/ray", "route": "/user/:name", "msg": "..."}
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPanicRecovery;

impl PanicRecovery for DefaultPanicRecovery {
    fn recover(&self, ctx: &mut Context, msg: &str) {
        let body = json!({
            "code": 500,
            "path": ctx.path(),
            "route": ctx.route().unwrap_or_default(),
            "msg": msg,
        });
        ctx.headers_mut().clear();
        ctx.json(StatusCode::INTERNAL_SERVER_ERROR, &body);
    }
}

/// Panic recovery middleware.
///
/// Runs the rest of the chain inside [`catch_unwind`](std::panic::catch_unwind). When it panics, the middleware
/// logs the message and hands the context to its [`PanicRecovery`], then returns normally so outer middleware
/// and the response flush still run.
///
/// Only unwinding panics can be caught; a crate built with `panic = "abort"` never gets here.
#[derive(Clone)]
pub struct Recovery {
    recovery: Arc<dyn PanicRecovery>,
}

impl Recovery {
    pub fn new<R: PanicRecovery>(recovery: R) -> Recovery {
        Recovery {
            recovery: Arc::new(recovery),
        }
    }

    pub fn build(self) -> Middleware {
        Middleware::new(move |next| {
            let recovery = Arc::clone(&self.recovery);
            handler_fn(move |ctx: &mut Context| {
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| next(ctx))) {
                    let msg = panic_message(payload.as_ref());
                    tracing::error!(
                        method = %ctx.method(),
                        path = %ctx.path(),
                        route = ctx.route().unwrap_or_default(),
                        panic = %msg,
                        "recovered from a panic in the request handler"
                    );
                    recovery.recover(ctx, &msg);
                }
            })
        })
    }
}

/// The default recovery, answering with [`DefaultPanicRecovery`].
pub fn recovery() -> Middleware {
    Recovery::new(DefaultPanicRecovery).build()
}

/// Extracts the message of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::compose;
    use bytes::Bytes;
    use http::header::{CACHE_CONTROL, CONTENT_TYPE, LOCATION};
    use http::Request;
    use serde_json::Value;

    #[test]
    fn should_render_default_json() {
        let handler = handler_fn(|ctx: &mut Context| {
            ctx.string(StatusCode::OK, "half written");
            panic!("something broke");
        });

        let mut ctx = Context::with_request(Request::get("/user/ray").body(Bytes::new()).unwrap());
        compose(&[recovery()], handler)(&mut ctx);

        assert_eq!(ctx.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ctx.headers()[CONTENT_TYPE], "application/json; charset=utf-8");

        let body: Value = serde_json::from_slice(ctx.body()).unwrap();
        assert_eq!(
            body,
            json!({"code": 500, "path": "/user/ray", "route": "", "msg": "something broke"})
        );
    }

    #[test]
    fn should_drop_headers_set_before_the_panic() {
        let handler = handler_fn(|ctx: &mut Context| {
            ctx.header(LOCATION, "/elsewhere");
            ctx.header(CACHE_CONTROL, "max-age=3600");
            panic!("redirect failed");
        });

        let mut ctx = Context::new();
        compose(&[recovery()], handler)(&mut ctx);

        assert_eq!(ctx.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!ctx.headers().contains_key(LOCATION));
        assert!(!ctx.headers().contains_key(CACHE_CONTROL));
        assert_eq!(ctx.headers()[CONTENT_TYPE], "application/json; charset=utf-8");
    }

    #[test]
    fn should_use_custom_recovery() {
        struct Teapot;

        impl PanicRecovery for Teapot {
            fn recover(&self, ctx: &mut Context, msg: &str) {
                ctx.string(StatusCode::IM_A_TEAPOT, format!("oops: {}", msg));
            }
        }

        let handler = handler_fn(|_: &mut Context| panic!("{} failed", "lookup"));
        let mut ctx = Context::new();
        compose(&[Recovery::new(Teapot).build()], handler)(&mut ctx);

        assert_eq!(ctx.status_code(), StatusCode::IM_A_TEAPOT);
        assert_eq!(ctx.body(), b"oops: lookup failed");
    }

    #[test]
    fn should_pass_through_without_panic() {
        let handler = handler_fn(|ctx: &mut Context| ctx.string(StatusCode::OK, "fine"));
        let mut ctx = Context::new();
        compose(&[recovery()], handler)(&mut ctx);
        assert_eq!(ctx.body(), b"fine");
    }

    #[test]
    fn should_extract_panic_messages() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&"owned".to_owned()), "owned");
        assert_eq!(panic_message(&42u8), "unknown panic");
    }
}
