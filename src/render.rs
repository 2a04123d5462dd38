//! Encoding values into response bodies.
//!
//! A renderer only produces bytes and a content type. [`Context::render`](crate::Context::render) stores them
//! as the pending response, which the router flushes after the whole chain ran.

use crate::constants::{CONTENT_TYPE_JSON, CONTENT_TYPE_TEXT};
use serde::Serialize;

pub trait Render {
    fn content_type(&self) -> &'static str;

    /// Appends the encoded value to `buf`.
    fn render(&self, buf: &mut Vec<u8>) -> crate::Result<()>;
}

/// Renders a value as JSON with `serde_json`.
#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

impl<T: Serialize> Render for Json<T> {
    fn content_type(&self) -> &'static str {
        CONTENT_TYPE_JSON
    }

    fn render(&self, buf: &mut Vec<u8>) -> crate::Result<()> {
        serde_json::to_writer(buf, &self.0)?;
        Ok(())
    }
}

/// Renders plain UTF-8 text.
#[derive(Debug, Clone)]
pub struct Text<S>(pub S);

impl<S: AsRef<str>> Render for Text<S> {
    fn content_type(&self) -> &'static str {
        CONTENT_TYPE_TEXT
    }

    fn render(&self, buf: &mut Vec<u8>) -> crate::Result<()> {
        buf.extend_from_slice(self.0.as_ref().as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn should_render_json() {
        let mut buf = Vec::new();
        Json(json!({"code": 200})).render(&mut buf).unwrap();
        assert_eq!(buf, br#"{"code":200}"#);
    }

    #[test]
    fn should_append_text() {
        let mut buf = b"hello ".to_vec();
        Text("world").render(&mut buf).unwrap();
        assert_eq!(buf, b"hello world");
        assert_eq!(Text("").content_type(), "text/plain; charset=utf-8");
    }
}
