//! # tsu-typed
//!
//! Schema-validated routes for the tsu HTTP framework.
//!
//! Describe what a route accepts (body, query string, path parameters)
//! and what it answers with per status code. tsu-typed puts one validation
//! step in front of your handler that checks every configured part of the
//! request, replaces it with the schema's canonical value, or answers
//! `400 Bad Request` with every problem it found:
//!
//! ```json
//! {
//!   "error": "Validation failed",
//!   "details": [ { "location": "query", "issues": [ { "message": "…" } ] } ]
//! }
//! ```
//!
//! Handlers then read typed values with [`Request::body_as`],
//! [`Request::query_as`], and [`Request::params_as`].
//!
//! Response schemas are declarations only. Nothing checks outgoing responses.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::num::NonZeroU32;
//!
//! use serde::{Deserialize, Serialize};
//! use tsu_typed::{
//!     define_route, handler, typed_route, Json, Request, RouteSchemas, Server, TypedRouter, Typed,
//! };
//!
//! #[derive(Deserialize, Serialize)]
//! struct ListItems {
//!     #[serde(default = "first_page")]
//!     page: NonZeroU32,
//! }
//!
//! fn first_page() -> NonZeroU32 { NonZeroU32::MIN }
//!
//! #[derive(Deserialize, Serialize)]
//! struct NewItem { name: String }
//!
//! #[tokio::main]
//! async fn main() {
//!     let create_item = define_route(RouteSchemas::new().body(Typed::<NewItem>::new()));
//!
//!     let app = TypedRouter::new()
//!         .get("/items", typed_route().query(Typed::<ListItems>::coerce()).handler(list_items))
//!         .post("/items", (create_item, handler(add_item)));
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! async fn list_items(req: Request) -> String {
//!     let query: ListItems = req.query_as().unwrap();
//!     format!("page {}", query.page)
//! }
//!
//! async fn add_item(req: Request) -> Json<NewItem> {
//!     Json(req.body_as().unwrap())
//! }
//! ```

mod builder;
mod config;
mod error;
mod handler;
mod request;
mod response;
mod route;
mod router;
mod schema;
mod server;
mod typed_router;

pub mod validation;

pub use builder::{TypedRoute, typed_route};
pub use config::{DEFAULT_ADDR, DEFAULT_SHUTDOWN_TIMEOUT, ServerConfig, ServerConfigBuilder};
pub use error::{Error, Result};
pub use handler::{Handler, Middleware, Next, Step, StepKind, handler, middleware};
pub use request::{Request, RequestBuilder};
pub use response::{ContentType, IntoResponse, Json, Response, ResponseBuilder};
pub use route::{RouteDefinition, RouteSchemas, define_route};
pub use router::Router;
pub use schema::{Issue, JsonSchema, Schema, Typed};
pub use server::Server;
pub use typed_router::{IntoRouteArgs, RouteArg, TypedRouter, create_typed_router, flatten};
pub use validation::{Location, ValidationError, ValidationFailure};
