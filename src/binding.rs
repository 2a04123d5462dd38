//! Decoding request bodies into typed values.

use crate::Error;
use bytes::Bytes;
use http::Request;
use serde::de::DeserializeOwned;

/// A request body decoder.
pub trait Binding {
    /// A short name for logs, e.g. `json`.
    fn name(&self) -> &'static str;

    fn bind<T: DeserializeOwned>(&self, req: &Request<Bytes>) -> crate::Result<T>;
}

/// Decodes a JSON request body with `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBinding;

impl Binding for JsonBinding {
    fn name(&self) -> &'static str {
        "json"
    }

    fn bind<T: DeserializeOwned>(&self, req: &Request<Bytes>) -> crate::Result<T> {
        let body = req.body();
        if body.is_empty() {
            return Err(Error::bind("the request body is empty"));
        }
        serde_json::from_slice(body).map_err(|e| Error::bind(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        name: String,
        age: u8,
    }

    fn request(body: &'static str) -> Request<Bytes> {
        Request::post("/user").body(Bytes::from_static(body.as_bytes())).unwrap()
    }

    #[test]
    fn should_bind_json_body() {
        let user: User = JsonBinding.bind(&request(r#"{"name":"ray","age":10}"#)).unwrap();
        assert_eq!(
            user,
            User {
                name: "ray".to_owned(),
                age: 10
            }
        );
    }

    #[test]
    fn should_reject_empty_and_malformed_bodies() {
        assert!(matches!(JsonBinding.bind::<User>(&request("")), Err(Error::Bind(_))));
        assert!(matches!(JsonBinding.bind::<User>(&request("{\"name\":")), Err(Error::Bind(_))));
    }
}
