use super::{handler_fn, Middleware};
use crate::context::Context;
use http::{Method, StatusCode};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One access log record, produced once the wrapped chain is done, even when it panicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub method: Method,
    pub path: String,
    pub status: StatusCode,
    pub latency: Duration,
}

/// Destination of access log records.
pub trait LogWriter: Send + Sync + 'static {
    fn write(&self, entry: &LogEntry) -> crate::Result<()>;
}

/// Emits each entry as a `tracing` event at `INFO` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogWriter;

impl LogWriter for TracingLogWriter {
    fn write(&self, entry: &LogEntry) -> crate::Result<()> {
        tracing::info!(
            method = %entry.method,
            path = %entry.path,
            status = entry.status.as_u16(),
            latency_us = entry.latency.as_micros() as u64,
            "request served"
        );
        Ok(())
    }
}

/// Access log middleware.
///
/// The entry is built once the rest of the chain returned, so it reports the final status. Place it first to
/// time everything else.
///
/// # Examples
///
/// ```
/// use trellis::middleware::{AccessLog, LogEntry, LogWriter};
/// use trellis::Router;
///
/// struct Stdout;
///
/// impl LogWriter for Stdout {
///     fn write(&self, e: &LogEntry) -> trellis::Result<()> {
///         println!("{} {} {} {:?}", e.method, e.path, e.status, e.latency);
///         Ok(())
///     }
/// }
///
/// let mut builder = Router::builder();
/// builder.use_middleware(AccessLog::new(Stdout).build());
/// ```
#[derive(Clone)]
pub struct AccessLog {
    writer: Arc<dyn LogWriter>,
}

impl AccessLog {
    pub fn new<W: LogWriter>(writer: W) -> AccessLog {
        AccessLog {
            writer: Arc::new(writer),
        }
    }

    pub fn build(self) -> Middleware {
        Middleware::new(move |next| {
            let writer = Arc::clone(&self.writer);
            handler_fn(move |ctx: &mut Context| {
                // Captured up front: the handler may replace the request.
                let pending = PendingEntry {
                    method: ctx.method().clone(),
                    path: ctx.path().to_owned(),
                    start: Instant::now(),
                    writer: &*writer,
                    ctx,
                };
                next(&mut *pending.ctx);
            })
        })
    }
}

/// Writes the entry when dropped, so a request that panics past this middleware is logged too.
struct PendingEntry<'a> {
    method: Method,
    path: String,
    start: Instant,
    writer: &'a dyn LogWriter,
    ctx: &'a mut Context,
}

impl Drop for PendingEntry<'_> {
    fn drop(&mut self) {
        let entry = LogEntry {
            method: self.method.clone(),
            path: std::mem::take(&mut self.path),
            status: self.ctx.status_code(),
            latency: self.start.elapsed(),
        };

        // A panicking writer must not abort an unwind already in progress.
        let written = if std::thread::panicking() {
            match panic::catch_unwind(AssertUnwindSafe(|| self.writer.write(&entry))) {
                Ok(written) => written,
                Err(_) => {
                    tracing::warn!("the access log writer panicked");
                    return;
                }
            }
        } else {
            self.writer.write(&entry)
        };
        if let Err(err) = written {
            tracing::warn!(error = %err, "couldn't write the access log entry");
        }
    }
}

/// The default access log, written through `tracing`.
pub fn logger() -> Middleware {
    AccessLog::new(TracingLogWriter).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::compose;
    use bytes::Bytes;
    use http::Request;
    use parking_lot::Mutex;

    #[derive(Clone, Default)]
    struct Collect(Arc<Mutex<Vec<LogEntry>>>);

    impl LogWriter for Collect {
        fn write(&self, entry: &LogEntry) -> crate::Result<()> {
            self.0.lock().push(entry.clone());
            Ok(())
        }
    }

    struct Failing;

    impl LogWriter for Failing {
        fn write(&self, _: &LogEntry) -> crate::Result<()> {
            Err(crate::Error::bind("disk full"))
        }
    }

    #[test]
    fn should_log_final_status() {
        let entries = Collect::default();
        let handler = handler_fn(|ctx: &mut Context| ctx.status(StatusCode::CREATED));
        let chain = compose(&[AccessLog::new(entries.clone()).build()], handler);

        let mut ctx = Context::with_request(Request::post("/users").body(Bytes::new()).unwrap());
        chain(&mut ctx);

        let entries = entries.0.lock();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].method, Method::POST);
        assert_eq!(entries[0].path, "/users");
        assert_eq!(entries[0].status, StatusCode::CREATED);
    }

    #[test]
    fn should_log_requests_that_panic_through() {
        let entries = Collect::default();
        let chain = compose(
            &[AccessLog::new(entries.clone()).build()],
            handler_fn(|ctx: &mut Context| {
                ctx.status(StatusCode::ACCEPTED);
                panic!("nobody recovers this");
            }),
        );

        let mut ctx = Context::with_request(Request::get("/boom").body(Bytes::new()).unwrap());
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| chain(&mut ctx)));
        assert!(outcome.is_err());

        let entries = entries.0.lock();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "/boom");
        assert_eq!(entries[0].status, StatusCode::ACCEPTED);
    }

    #[test]
    fn should_swallow_writer_errors() {
        let chain = compose(
            &[AccessLog::new(Failing).build()],
            handler_fn(|ctx: &mut Context| ctx.status(StatusCode::ACCEPTED)),
        );

        let mut ctx = Context::new();
        chain(&mut ctx);
        assert_eq!(ctx.status_code(), StatusCode::ACCEPTED);
    }
}
