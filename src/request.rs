//! Incoming HTTP request type.
//!
//! Three parts of a request are kept as JSON values so a schema can rewrite
//! them in place: `body`, `query`, and `params`. Everything else is read-only.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use http::Method;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::validation::Location;

/// An incoming HTTP request.
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) headers: HeaderMap,
    pub(crate) raw_body: Bytes,
    pub(crate) body: Value,
    pub(crate) query: Value,
    pub(crate) params: Value,
    /// Why a JSON body failed to parse. Reported by a body schema, if any.
    pub(crate) body_error: Option<String>,
}

impl Request {
    /// Assembles a request from its wire parts.
    ///
    /// The query string decodes into an object of strings; a key given more
    /// than once becomes an array in arrival order. A nonempty body with a
    /// JSON content type is parsed into [`body`](Request::body); any other
    /// body leaves it `null` and stays available through
    /// [`raw_body`](Request::raw_body). A JSON body that does not parse also
    /// leaves `body` as `null` and is reported only if a body schema runs.
    pub(crate) fn from_parts(
        method: Method,
        path: String,
        query: Option<&str>,
        headers: HeaderMap,
        raw_body: Bytes,
    ) -> Result<Self> {
        let query = decode_query(query.unwrap_or(""))?;
        let (body, body_error) = if is_json(&headers) && !raw_body.is_empty() {
            match serde_json::from_slice(&raw_body) {
                Ok(body) => (body, None),
                Err(e) => (Value::Null, Some(e.to_string())),
            }
        } else {
            (Value::Null, None)
        };

        Ok(Self {
            method,
            path,
            headers,
            raw_body,
            body,
            query,
            params: Value::Object(Map::new()),
            body_error,
        })
    }

    /// Builder for requests that never touched a socket: tests, internal
    /// dispatch, replay.
    pub fn builder() -> RequestBuilder {
        RequestBuilder {
            method: Method::GET,
            uri: "/".to_owned(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn raw_body(&self) -> &[u8] { &self.raw_body }

    /// The JSON body, or its canonical form once a body schema accepted it.
    pub fn body(&self) -> &Value { &self.body }

    /// The query object, or its canonical form once a query schema accepted it.
    pub fn query(&self) -> &Value { &self.query }

    /// The path parameters, or their canonical form once a params schema
    /// accepted them.
    pub fn params(&self) -> &Value { &self.params }

    /// The parse error of a JSON body that could not be read, if any.
    pub fn body_error(&self) -> Option<&str> { self.body_error.as_deref() }

    pub fn set_body(&mut self, value: Value) {
        self.body = value;
        self.body_error = None;
    }
    pub fn set_query(&mut self, value: Value) { self.query = value; }
    pub fn set_params(&mut self, value: Value) { self.params = value; }

    /// Case-insensitive header lookup. Non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter as a string.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns
    /// `Some("42")`. Once a params schema has coerced `id` to a number this
    /// returns `None`; use [`params_as`](Request::params_as) instead.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }

    /// Decodes the body into `T`.
    ///
    /// Behind a body schema this reads the schema's canonical output, so a
    /// `T` matching the schema always decodes.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T> {
        decode(Location::Body, &self.body)
    }

    pub fn query_as<T: DeserializeOwned>(&self) -> Result<T> {
        decode(Location::Query, &self.query)
    }

    pub fn params_as<T: DeserializeOwned>(&self) -> Result<T> {
        decode(Location::Params, &self.params)
    }
}

fn decode<T: DeserializeOwned>(location: Location, value: &Value) -> Result<T> {
    T::deserialize(value).map_err(|source| Error::Decode { location, source })
}

fn decode_query(raw: &str) -> Result<Value> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw)?;
    let mut map = Map::new();
    for (key, value) in pairs {
        match map.get_mut(&key) {
            Some(Value::Array(values)) => values.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
            None => {
                map.insert(key, Value::String(value));
            }
        }
    }
    Ok(Value::Object(map))
}

fn is_json(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || mime.ends_with("+json")
}

// ── RequestBuilder ────────────────────────────────────────────────────────────

/// Fluent builder for [`Request`]. Obtain via [`Request::builder()`].
///
/// ```rust
/// use tsu_typed::Request;
/// use http::Method;
/// use serde_json::json;
///
/// let req = Request::builder()
///     .method(Method::POST)
///     .uri("/users?notify=true")
///     .json(&json!({ "email": "a@b.com" }))
///     .build()
///     .unwrap();
///
/// assert_eq!(req.query()["notify"], "true");
/// assert_eq!(req.body()["email"], "a@b.com");
/// ```
pub struct RequestBuilder {
    method: Method,
    uri: String,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl RequestBuilder {
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Path plus optional query string, e.g. `/items?page=3`.
    pub fn uri(mut self, uri: &str) -> Self {
        self.uri = uri.to_owned();
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// JSON body; also sets `content-type: application/json`.
    pub fn json(mut self, value: &Value) -> Self {
        self.headers.push((CONTENT_TYPE.as_str().to_owned(), "application/json".to_owned()));
        self.body = Bytes::from(value.to_string());
        self
    }

    /// Raw body bytes. Set a content type yourself if one applies.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn build(self) -> Result<Request> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(http::Error::from)?;
            let value = HeaderValue::from_str(value).map_err(http::Error::from)?;
            headers.append(name, value);
        }

        let (path, query) = match self.uri.split_once('?') {
            Some((path, query)) => (path.to_owned(), Some(query)),
            None => (self.uri.clone(), None),
        };

        Request::from_parts(self.method, path, query, headers, self.body)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn repeated_query_keys_become_arrays() {
        let req = Request::builder().uri("/tags?t=a&t=b&t=c&x=1").build().unwrap();
        assert_eq!(req.query(), &json!({ "t": ["a", "b", "c"], "x": "1" }));
    }

    #[test]
    fn missing_query_is_an_empty_object() {
        let req = Request::builder().uri("/items").build().unwrap();
        assert_eq!(req.query(), &json!({}));
        assert_eq!(req.path(), "/items");
    }

    #[test]
    fn non_json_body_stays_raw() {
        let req = Request::builder()
            .header("content-type", "text/plain")
            .body("hello")
            .build()
            .unwrap();
        assert_eq!(req.body(), &Value::Null);
        assert_eq!(req.raw_body(), b"hello");
    }

    #[test]
    fn vendor_json_content_type_is_parsed() {
        let req = Request::builder()
            .header("content-type", "application/vnd.api+json; charset=utf-8")
            .body(r#"{"a":1}"#)
            .build()
            .unwrap();
        assert_eq!(req.body(), &json!({ "a": 1 }));
    }

    #[test]
    fn malformed_json_is_held_back() {
        let req = Request::builder()
            .header("content-type", "application/json")
            .body("{nope")
            .build()
            .unwrap();
        assert_eq!(req.body(), &Value::Null);
        assert!(req.body_error().is_some());
        assert_eq!(req.raw_body(), b"{nope");
    }

    #[test]
    fn typed_accessors_report_the_location() {
        #[derive(serde::Deserialize)]
        struct Page {
            #[allow(dead_code)]
            page: u32,
        }

        let req = Request::builder().uri("/items?page=two").build().unwrap();
        match req.query_as::<Page>() {
            Err(Error::Decode { location, .. }) => assert_eq!(location, Location::Query),
            _ => panic!("expected a decode error"),
        }
    }
}
