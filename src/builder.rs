//! Fluent route builder.
//!
//! The step-by-step alternative to [`define_route`](crate::define_route).
//! Each call consumes the builder and hands it back, so a chain is linear by
//! construction: there is no intermediate value left over to fork from, and
//! nothing to reuse once [`handler`](TypedRoute::handler) has run.
//!
//! ```rust
//! use tsu_typed::{typed_route, Next, Request, Response, TypedRouter, Typed};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Deserialize, Serialize)]
//! struct Search { q: String }
//!
//! async fn audit(req: Request, next: Next) -> Response { next.run(req).await }
//! async fn search(req: Request) -> String { req.query()["q"].to_string() }
//!
//! let app = TypedRouter::new().get(
//!     "/search",
//!     typed_route()
//!         .query(Typed::<Search>::coerce())
//!         .middleware(audit)
//!         .handler(search),
//! );
//! ```

use crate::handler::{Handler, Middleware, Step};
use crate::route::RouteSchemas;
use crate::schema::Schema;
use crate::validation;

/// Accumulates schemas and middleware for one route.
#[derive(Debug, Default)]
pub struct TypedRoute {
    schemas: RouteSchemas,
    middleware: Vec<Step>,
}

/// Starts a [`TypedRoute`].
pub fn typed_route() -> TypedRoute {
    TypedRoute::default()
}

impl TypedRoute {
    pub fn body(mut self, schema: impl Schema) -> Self {
        self.schemas = self.schemas.body(schema);
        self
    }

    pub fn query(mut self, schema: impl Schema) -> Self {
        self.schemas = self.schemas.query(schema);
        self
    }

    pub fn params(mut self, schema: impl Schema) -> Self {
        self.schemas = self.schemas.params(schema);
        self
    }

    /// Declares a response shape. Repeating a status overwrites it.
    pub fn response(mut self, status: u16, schema: impl Schema) -> Self {
        self.schemas = self.schemas.response(status, schema);
        self
    }

    /// Appends a middleware to run after validation and before the handler.
    /// Middleware runs in the order added.
    pub fn middleware(self, m: impl Middleware) -> Self {
        self.step(m.into_step())
    }

    /// Appends a prebuilt step, e.g. one shared between routes.
    pub fn step(mut self, step: Step) -> Self {
        self.middleware.push(step);
        self
    }

    pub fn schemas(&self) -> &RouteSchemas { &self.schemas }

    /// Finishes the route: validation (when any request schema was set),
    /// then the middleware in order, then `h`.
    pub fn handler(self, h: impl Handler) -> Vec<Step> {
        let request = self.schemas.request();
        let mut steps = Vec::with_capacity(self.middleware.len() + 2);
        if !request.is_empty() {
            steps.push(validation::validate(request.clone()));
        }
        steps.extend(self.middleware);
        steps.push(h.into_step());
        steps
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::handler::{Next, StepKind};
    use crate::request::Request;
    use crate::response::Response;
    use crate::schema::Issue;

    fn any(v: &Value) -> Result<Value, Vec<Issue>> {
        Ok(v.clone())
    }

    async fn pass(req: Request, next: Next) -> Response { next.run(req).await }

    async fn done(_req: Request) -> &'static str { "done" }

    fn kinds(steps: &[Step]) -> Vec<StepKind> {
        steps.iter().map(Step::kind).collect()
    }

    #[test]
    fn response_only_chain_is_just_the_handler() {
        let steps = typed_route().response(200, any).handler(done);
        assert_eq!(kinds(&steps), vec![StepKind::Handler]);
    }

    #[test]
    fn validation_then_middleware_then_handler() {
        let steps = typed_route()
            .middleware(pass)
            .params(any)
            .middleware(pass)
            .body(any)
            .handler(done);

        assert_eq!(
            kinds(&steps),
            vec![
                StepKind::Validation,
                StepKind::Middleware,
                StepKind::Middleware,
                StepKind::Handler,
            ]
        );
    }

    #[test]
    fn responses_accumulate() {
        let route = typed_route().response(200, any).response(400, any).response(200, any);
        assert_eq!(route.schemas().response_statuses().collect::<Vec<_>>(), vec![200, 400]);
    }
}
