//! Route definitions: a schema set plus the steps it implies.
//!
//! ```rust
//! use tsu_typed::{define_route, RouteSchemas, Typed};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Deserialize, Serialize)]
//! struct NewUser { email: String }
//!
//! #[derive(Deserialize, Serialize)]
//! struct User { id: u64, email: String }
//!
//! let create_user = define_route(
//!     RouteSchemas::new()
//!         .body(Typed::<NewUser>::new())
//!         .response(201, Typed::<User>::new()),
//! );
//!
//! assert_eq!(create_user.steps().len(), 1);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::handler::Step;
use crate::schema::Schema;
use crate::validation::{self, RequestSchemas};

/// Everything known about a route's shape: request schemas by location and
/// response schemas by status code.
///
/// Response schemas document what a handler sends. They are kept for
/// tooling and tests and are never run against outgoing responses.
#[derive(Clone, Default)]
pub struct RouteSchemas {
    request: RequestSchemas,
    responses: BTreeMap<u16, Arc<dyn Schema>>,
}

impl RouteSchemas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(mut self, schema: impl Schema) -> Self {
        self.request.body = Some(Arc::new(schema));
        self
    }

    pub fn query(mut self, schema: impl Schema) -> Self {
        self.request.query = Some(Arc::new(schema));
        self
    }

    pub fn params(mut self, schema: impl Schema) -> Self {
        self.request.params = Some(Arc::new(schema));
        self
    }

    /// Declares the shape of a `status` response. A second declaration for
    /// the same status replaces the first.
    pub fn response(mut self, status: u16, schema: impl Schema) -> Self {
        self.responses.insert(status, Arc::new(schema));
        self
    }

    pub fn request(&self) -> &RequestSchemas { &self.request }

    pub fn response_schema(&self, status: u16) -> Option<&Arc<dyn Schema>> {
        self.responses.get(&status)
    }

    /// Declared response statuses, ascending.
    pub fn response_statuses(&self) -> impl Iterator<Item = u16> + '_ {
        self.responses.keys().copied()
    }
}

impl fmt::Debug for RouteSchemas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteSchemas")
            .field("request", &self.request)
            .field("responses", &self.responses.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A schema set bundled with the steps that enforce it.
///
/// Pass it to a [`TypedRouter`](crate::TypedRouter) method, alone or among
/// other steps; its steps are spliced in where it appears.
#[derive(Clone, Debug)]
pub struct RouteDefinition {
    schemas: RouteSchemas,
    steps: Vec<Step>,
}

impl RouteDefinition {
    pub fn schemas(&self) -> &RouteSchemas { &self.schemas }
    pub fn steps(&self) -> &[Step] { &self.steps }

    pub(crate) fn into_steps(self) -> Vec<Step> {
        self.steps
    }
}

/// Builds a [`RouteDefinition`].
///
/// With a body, query, or params schema the definition carries exactly one
/// validation step. With none (an empty set, or response schemas only)
/// it carries no steps at all.
pub fn define_route(schemas: RouteSchemas) -> RouteDefinition {
    let steps = if schemas.request.is_empty() {
        Vec::new()
    } else {
        vec![validation::validate(schemas.request.clone())]
    };
    RouteDefinition { schemas, steps }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::handler::StepKind;
    use crate::schema::Issue;

    fn any(v: &Value) -> Result<Value, Vec<Issue>> {
        Ok(v.clone())
    }

    #[test]
    fn request_schemas_yield_one_validation_step() {
        let def = define_route(RouteSchemas::new().body(any).query(any).params(any));
        let kinds: Vec<StepKind> = def.steps().iter().map(Step::kind).collect();
        assert_eq!(kinds, vec![StepKind::Validation]);
    }

    #[test]
    fn response_only_routes_have_no_steps() {
        let def = define_route(RouteSchemas::new().response(200, any).response(404, any));
        assert!(def.steps().is_empty());
        assert_eq!(def.schemas().response_statuses().collect::<Vec<_>>(), vec![200, 404]);
    }

    #[test]
    fn empty_definitions_have_no_steps() {
        assert!(define_route(RouteSchemas::new()).steps().is_empty());
    }

    #[test]
    fn later_response_declarations_win() {
        let first = |_: &Value| -> Result<Value, Vec<Issue>> { Ok(json!("first")) };
        let second = |_: &Value| -> Result<Value, Vec<Issue>> { Ok(json!("second")) };
        let schemas = RouteSchemas::new().response(200, first).response(200, second);

        let schema = schemas.response_schema(200).unwrap();
        assert_eq!(schema.validate(&Value::Null).unwrap(), json!("second"));
    }
}
