//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! You should not need to think about this module directly. Build a [`Response`]
//! in your handler and return it. That is the entire job description.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::StatusCode;
use http_body_util::Full;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::error::Error;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Common content-type values for use with [`ResponseBuilder::bytes`].
pub enum ContentType {
    Csv,          // text/csv
    EventStream,  // text/event-stream  (SSE)
    Html,         // text/html; charset=utf-8
    Json,         // application/json
    OctetStream,  // application/octet-stream  (binary / file download)
    Text,         // text/plain; charset=utf-8
    Xml,          // application/xml
}

impl ContentType {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Csv         => "text/csv",
            Self::EventStream => "text/event-stream",
            Self::Html        => "text/html; charset=utf-8",
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Text        => "text/plain; charset=utf-8",
            Self::Xml         => "application/xml",
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// # Shortcuts (200 OK, no custom headers needed)
///
/// ```rust
/// use tsu_typed::Response;
/// use http::StatusCode;
/// use serde_json::json;
///
/// Response::json(br#"{"id":1}"#.to_vec());
/// Response::json_value(&json!({ "id": 1 }));
/// Response::text("hello");
/// Response::status(StatusCode::NO_CONTENT);
/// ```
///
/// # Builder (custom status or headers)
///
/// ```rust
/// use tsu_typed::{ContentType, Response};
/// use http::StatusCode;
///
/// Response::builder()
///     .status(StatusCode::CREATED)
///     .header("location", "/users/42")
///     .json(br#"{"id":42}"#.to_vec());
///
/// Response::builder()
///     .bytes(ContentType::Xml, b"<ok/>".to_vec());
/// ```
#[derive(Debug)]
pub struct Response {
    pub(crate) body: Vec<u8>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) status: StatusCode,
}

impl Response {
    /// `200 OK` — `application/json`, bytes as given.
    pub fn json(body: Vec<u8>) -> Self {
        Self::bytes_raw("application/json", body)
    }

    /// `200 OK` — `application/json`, serialised with serde_json.
    ///
    /// A value that fails to serialise (a map with non-string keys, a
    /// failing `Serialize` impl) becomes `500 Internal Server Error`.
    pub fn json_value<T: Serialize + ?Sized>(value: &T) -> Self {
        Self::builder().json_value(value)
    }

    /// `200 OK` — `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::bytes_raw("text/plain; charset=utf-8", body.into().into_bytes())
    }

    /// Response with no body.
    pub fn status(code: StatusCode) -> Self {
        Self { body: Vec::new(), headers: Vec::new(), status: code }
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: Vec::new(), status: StatusCode::OK }
    }

    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }

    /// Case-insensitive header lookup; first match wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn bytes_raw(content_type: &str, body: Vec<u8>) -> Self {
        Self {
            body,
            headers: vec![("content-type".to_owned(), content_type.to_owned())],
            status: StatusCode::OK,
        }
    }

    /// Converts into the hyper response the server writes to the wire.
    /// Headers that are not valid HTTP are dropped with a warning.
    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(Bytes::from(self.body)));
        *res.status_mut() = self.status;

        let headers = res.headers_mut();
        for (name, value) in self.headers {
            match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(&value)) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => warn!(header = %name, "dropping invalid response header"),
            }
        }
        res
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `200 OK`.
/// Terminated by a typed body method — you always know what you're sending.
pub struct ResponseBuilder {
    headers: Vec<(String, String)>,
    status: StatusCode,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, body: Vec<u8>) -> Response {
        self.finish("application/json", body)
    }

    /// Terminate with a serde-serialised JSON body.
    pub fn json_value<T: Serialize + ?Sized>(self, value: &T) -> Response {
        match serde_json::to_vec(value) {
            Ok(body) => self.json(body),
            Err(e) => {
                error!("response serialisation failed: {e}");
                Response::status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    /// Terminate with a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(self, body: impl Into<String>) -> Response {
        self.finish("text/plain; charset=utf-8", body.into().into_bytes())
    }

    /// Terminate with a typed body. Use this for XML, HTML, binary, SSE, etc.
    pub fn bytes(self, content_type: ContentType, body: Vec<u8>) -> Response {
        self.finish(content_type.as_str(), body)
    }

    /// Terminate with no body (e.g. `204 No Content`, `301 Moved Permanently`).
    pub fn no_body(self) -> Response {
        Response { body: Vec::new(), headers: self.headers, status: self.status }
    }

    fn finish(self, content_type: &str, body: Vec<u8>) -> Response {
        let mut headers = vec![("content-type".to_owned(), content_type.to_owned())];
        headers.extend(self.headers);
        Response { body, headers, status: self.status }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Implement on your own types to return them directly from handlers.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

/// Return a [`StatusCode`] directly from a handler: `return StatusCode::NOT_FOUND`
impl IntoResponse for StatusCode {
    fn into_response(self) -> Response { Response::status(self) }
}

/// `200 OK` with a serde-serialised JSON body.
///
/// ```rust
/// use tsu_typed::{Json, Request};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct User { id: u64, name: String }
///
/// async fn get_user(_req: Request) -> Json<User> {
///     Json(User { id: 1, name: "alice".into() })
/// }
/// ```
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response { Response::json_value(&self.0) }
}

/// `(status, body)` pairs: `(StatusCode::CREATED, Json(user))`.
impl<R: IntoResponse> IntoResponse for (StatusCode, R) {
    fn into_response(self) -> Response {
        let mut res = self.1.into_response();
        res.status = self.0;
        res
    }
}

/// A request that could not be turned into something a route understands:
/// an undecodable query string or path parameter, or a truncated body.
pub(crate) fn bad_request(e: &Error) -> Response {
    debug!("rejecting malformed request: {e}");
    Response::builder()
        .status(StatusCode::BAD_REQUEST)
        .json_value(&serde_json::json!({ "error": e.to_string() }))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn json_value_sets_content_type() {
        let res = Response::json_value(&json!({ "ok": true }));
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.header("Content-Type"), Some("application/json"));
        assert_eq!(res.body(), br#"{"ok":true}"#);
    }

    #[test]
    fn status_tuple_overrides_status() {
        let res = (StatusCode::CREATED, Json(json!({ "id": 7 }))).into_response();
        assert_eq!(res.status_code(), StatusCode::CREATED);
        assert_eq!(res.body(), br#"{"id":7}"#);
    }

    #[test]
    fn bytes_carry_their_content_type() {
        let res = Response::builder()
            .header("content-disposition", "attachment; filename=\"items.csv\"")
            .bytes(ContentType::Csv, b"id,name\n1,pen\n".to_vec());
        assert_eq!(res.header("content-type"), Some("text/csv"));
        assert_eq!(res.body(), b"id,name\n1,pen\n");
        assert!(res.header("content-disposition").is_some());
    }

    #[test]
    fn bad_requests_carry_the_error_text() {
        let e = Error::InvalidParam { name: "id".to_owned(), value: "%zz".to_owned() };
        let res = bad_request(&e);
        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body, json!({ "error": "invalid path parameter `id`: `%zz`" }));
    }

    #[test]
    fn invalid_headers_are_dropped_on_the_wire() {
        let res = Response::builder()
            .header("bad header", "x")
            .header("x-good", "y")
            .no_body()
            .into_http();
        assert_eq!(res.headers().len(), 1);
        assert_eq!(res.headers()["x-good"], "y");
    }
}
