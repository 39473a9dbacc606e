//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. A route is an ordered
//! chain of [`Step`]s; the router finds the chain, writes the percent-decoded
//! path parameters into the request, and runs it.

use std::collections::HashMap;
use std::sync::Arc;

use http::{Method, StatusCode};
use matchit::Router as MatchitRouter;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::Error;
use crate::handler::{Handler, Next, Step};
use crate::request::Request;
use crate::response::{self, Response};

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Every registration method returns `self` so registrations chain naturally.
/// Use [`TypedRouter`](crate::TypedRouter) to register schema-validated
/// routes; it wraps this type.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<Arc<[Step]>>>,
    middleware: Vec<Step>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), middleware: Vec::new() }
    }

    /// Register a single handler for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax. `req.param("name")` retrieves them,
    /// percent-decoded:
    ///
    /// ```rust
    /// # use tsu_typed::{Request, Response, Router};
    /// # use http::Method;
    /// # async fn get_user(_: Request) -> Response { Response::text("") }
    /// # async fn delete_user(_: Request) -> Response { Response::text("") }
    /// Router::new()
    ///     .on(Method::DELETE, "/users/{id}", delete_user)
    ///     .on(Method::GET,    "/users/{id}", get_user);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `path` is malformed or conflicts with a path already
    /// registered for `method`.
    pub fn on(self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.add(method, path, vec![handler.into_step()])
    }

    /// Register an ordered chain of steps for a method + path pair.
    ///
    /// # Panics
    ///
    /// Same as [`on`](Router::on).
    pub fn route(self, method: Method, path: &str, steps: impl IntoIterator<Item = Step>) -> Self {
        self.add(method, path, steps.into_iter().collect())
    }

    pub fn get(self, path: &str, steps: impl IntoIterator<Item = Step>) -> Self {
        self.route(Method::GET, path, steps)
    }

    pub fn post(self, path: &str, steps: impl IntoIterator<Item = Step>) -> Self {
        self.route(Method::POST, path, steps)
    }

    pub fn put(self, path: &str, steps: impl IntoIterator<Item = Step>) -> Self {
        self.route(Method::PUT, path, steps)
    }

    pub fn patch(self, path: &str, steps: impl IntoIterator<Item = Step>) -> Self {
        self.route(Method::PATCH, path, steps)
    }

    pub fn delete(self, path: &str, steps: impl IntoIterator<Item = Step>) -> Self {
        self.route(Method::DELETE, path, steps)
    }

    /// Mounts a step ahead of every route registered *after* this call.
    ///
    /// Routes registered earlier keep the chain they were built with, so
    /// mount shared middleware first.
    pub fn middleware(mut self, step: Step) -> Self {
        self.middleware.push(step);
        self
    }

    /// Routes one request and produces one response.
    ///
    /// `404 Not Found` when no route matches the method and path,
    /// `400 Bad Request` when a matched path parameter cannot be decoded.
    pub async fn handle(&self, mut req: Request) -> Response {
        let Some((chain, params)) = self.lookup(&req.method, &req.path) else {
            return Response::status(StatusCode::NOT_FOUND);
        };
        match params {
            Ok(params) => req.params = Value::Object(params),
            Err(e) => return response::bad_request(&e),
        }
        Next::new(chain).run(req).await
    }

    fn add(mut self, method: Method, path: &str, steps: Vec<Step>) -> Self {
        let chain: Arc<[Step]> = self.middleware.iter().cloned().chain(steps).collect();
        if chain.is_empty() {
            warn!(%method, path, "route registered with no steps; it will answer 404");
        } else {
            debug!(%method, path, steps = chain.len(), "route registered");
        }

        self.routes
            .entry(method)
            .or_default()
            .insert(path, chain)
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub(crate) fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(Arc<[Step]>, Result<Map<String, Value>, Error>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let chain = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| decode_param(k, v).map(|v| (k.to_owned(), Value::String(v))))
            .collect::<Result<Map<String, Value>, Error>>();
        Some((chain, params))
    }
}

/// Percent-decodes one matched segment. `+` stays literal in paths.
fn decode_param(name: &str, raw: &str) -> Result<String, Error> {
    let invalid = || Error::InvalidParam { name: name.to_owned(), value: raw.to_owned() };

    let bytes = raw.as_bytes();
    let well_formed = bytes.iter().enumerate().all(|(i, &b)| {
        b != b'%'
            || bytes.get(i + 1..i + 3).is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit))
    });
    if !well_formed {
        return Err(invalid());
    }

    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| invalid())
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{handler, middleware};

    async fn echo_id(req: Request) -> String {
        req.param("id").unwrap_or("none").to_owned()
    }

    async fn tag(req: Request, next: Next) -> Response {
        let mut res = next.run(req).await;
        res.headers.push(("x-tag".to_owned(), "1".to_owned()));
        res
    }

    fn get(uri: &str) -> Request {
        Request::builder().uri(uri).build().unwrap()
    }

    #[tokio::test]
    async fn path_params_reach_the_handler() {
        let app = Router::new().on(Method::GET, "/users/{id}", echo_id);
        let res = app.handle(get("/users/42")).await;
        assert_eq!(res.body(), b"42");
    }

    #[tokio::test]
    async fn path_params_are_percent_decoded() {
        let app = Router::new().on(Method::GET, "/users/{id}", echo_id);
        let res = app.handle(get("/users/John%20Doe%2Bco")).await;
        assert_eq!(res.body(), b"John Doe+co");
    }

    #[tokio::test]
    async fn undecodable_path_params_are_bad_requests() {
        let app = Router::new().on(Method::GET, "/users/{id}", echo_id);

        for path in ["/users/100%", "/users/%zz", "/users/%FF"] {
            let res = app.handle(get(path)).await;
            assert_eq!(res.status_code(), StatusCode::BAD_REQUEST, "{path}");
            let body: Value = serde_json::from_slice(res.body()).unwrap();
            assert!(body["error"].as_str().unwrap().contains("`id`"), "{path}");
        }
    }

    #[tokio::test]
    async fn unmatched_method_or_path_is_not_found() {
        let app = Router::new().on(Method::GET, "/users/{id}", echo_id);

        let wrong_path = app.handle(get("/nope")).await;
        let wrong_method = app
            .handle(Request::builder().method(Method::POST).uri("/users/1").build().unwrap())
            .await;

        assert_eq!(wrong_path.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(wrong_method.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn middleware_applies_to_later_routes_only() {
        let app = Router::new()
            .get("/before", [handler(echo_id)])
            .middleware(middleware(tag))
            .get("/after", [handler(echo_id)]);

        assert_eq!(app.handle(get("/before")).await.header("x-tag"), None);
        assert_eq!(app.handle(get("/after")).await.header("x-tag"), Some("1"));
    }

    #[test]
    #[should_panic(expected = "invalid route")]
    fn conflicting_paths_panic() {
        let _ = Router::new()
            .on(Method::GET, "/a/{x}", echo_id)
            .on(Method::GET, "/a/{y}", echo_id);
    }
}
