//! Request validation step.
//!
//! [`validate`] turns up to three schemas (body, query, params) into one
//! [`Step`]. Per request the step checks each configured location in that
//! fixed order, rewrites the location with the schema's canonical output on
//! success, and collects one [`ValidationError`] per failing location. Any
//! failure answers `400 Bad Request` and the rest of the chain never runs:
//!
//! ```json
//! {
//!   "error": "Validation failed",
//!   "details": [
//!     { "location": "body",  "issues": [ { "message": "…" } ] },
//!     { "location": "query", "issues": [ { "message": "…" } ] }
//!   ]
//! }
//! ```
//!
//! Locations without a schema are never read or written. A JSON body that
//! failed to parse is only reported here, as a `body` issue, when a body
//! schema is configured.

use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::handler::{BoxFuture, ErasedStep, Next, Step, StepKind};
use crate::request::Request;
use crate::response::Response;
use crate::schema::{Issue, Schema};

/// The `error` field of every validation rejection.
pub const VALIDATION_FAILED: &str = "Validation failed";

/// A validated part of the request.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Body,
    Query,
    Params,
}

impl Location {
    /// Check order. Also the order of `details` in a rejection.
    pub const ALL: [Location; 3] = [Location::Body, Location::Query, Location::Params];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Body   => "body",
            Self::Query  => "query",
            Self::Params => "params",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why one location was rejected. `issues` is never empty.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub location: Location,
    pub issues: Vec<Issue>,
}

/// The `400` body. Deserialize it on the client side to read `details`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub error: String,
    pub details: Vec<ValidationError>,
}

// ── RequestSchemas ────────────────────────────────────────────────────────────

/// The schemas a validation step checks, one optional slot per location.
#[derive(Clone, Default)]
pub struct RequestSchemas {
    pub body: Option<Arc<dyn Schema>>,
    pub query: Option<Arc<dyn Schema>>,
    pub params: Option<Arc<dyn Schema>>,
}

impl RequestSchemas {
    pub fn get(&self, location: Location) -> Option<&Arc<dyn Schema>> {
        match location {
            Location::Body   => self.body.as_ref(),
            Location::Query  => self.query.as_ref(),
            Location::Params => self.params.as_ref(),
        }
    }

    /// `true` when no location has a schema.
    pub fn is_empty(&self) -> bool {
        self.body.is_none() && self.query.is_none() && self.params.is_none()
    }
}

impl fmt::Debug for RequestSchemas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSchemas")
            .field("body", &self.body.is_some())
            .field("query", &self.query.is_some())
            .field("params", &self.params.is_some())
            .finish()
    }
}

// ── The step ──────────────────────────────────────────────────────────────────

/// Builds the validation step for `schemas`.
///
/// Route builders only call this when at least one schema is set; a step
/// with no schemas is valid and always hands off.
pub fn validate(schemas: RequestSchemas) -> Step {
    Step::new(StepKind::Validation, ValidationStep { schemas })
}

/// Runs every configured schema against `req`, rewriting the locations that
/// pass. Returns the failures in check order.
pub fn apply(schemas: &RequestSchemas, req: &mut Request) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for location in Location::ALL {
        let Some(schema) = schemas.get(location) else { continue };
        if location == Location::Body {
            if let Some(e) = &req.body_error {
                let issue = Issue::new(format!("malformed JSON: {e}")).with_code("json");
                errors.push(ValidationError { location, issues: vec![issue] });
                continue;
            }
        }
        let field = field_mut(req, location);

        match schema.validate(field) {
            Ok(canonical) => *field = canonical,
            Err(mut issues) => {
                if issues.is_empty() {
                    issues.push(Issue::new("value is invalid"));
                }
                errors.push(ValidationError { location, issues });
            }
        }
    }

    errors
}

/// The `400 Bad Request` response for `details`.
pub fn rejection(details: Vec<ValidationError>) -> Response {
    let failure = ValidationFailure { error: VALIDATION_FAILED.to_owned(), details };
    Response::builder()
        .status(StatusCode::BAD_REQUEST)
        .json_value(&failure)
}

fn field_mut(req: &mut Request, location: Location) -> &mut Value {
    match location {
        Location::Body   => &mut req.body,
        Location::Query  => &mut req.query,
        Location::Params => &mut req.params,
    }
}

struct ValidationStep {
    schemas: RequestSchemas,
}

impl ErasedStep for ValidationStep {
    fn call(&self, mut req: Request, next: Next) -> BoxFuture {
        let errors = apply(&self.schemas, &mut req);
        if errors.is_empty() {
            Box::pin(next.run(req))
        } else {
            let response = rejection(errors);
            Box::pin(async move { response })
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn number(v: &Value) -> Result<Value, Vec<Issue>> {
        v.as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Value::from)
            .ok_or_else(|| vec![Issue::new("expected a number")])
    }

    fn reject_silently(_: &Value) -> Result<Value, Vec<Issue>> {
        Err(Vec::new())
    }

    fn object_with_id(v: &Value) -> Result<Value, Vec<Issue>> {
        match v.get("id").map(number) {
            Some(Ok(id)) => Ok(json!({ "id": id })),
            Some(Err(issues)) => Err(issues.into_iter().map(|i| i.at("id")).collect()),
            None => Err(vec![Issue::new("missing id")]),
        }
    }

    fn request(uri: &str, body: Value) -> Request {
        Request::builder().uri(uri).json(&body).build().unwrap()
    }

    #[test]
    fn passing_locations_are_canonicalised() {
        let schemas = RequestSchemas {
            query: Some(Arc::new(object_with_id)),
            ..Default::default()
        };
        let mut req = request("/?id=5", json!({ "untouched": "yes" }));

        let errors = apply(&schemas, &mut req);

        assert!(errors.is_empty());
        assert_eq!(req.query(), &json!({ "id": 5 }));
        assert_eq!(req.body(), &json!({ "untouched": "yes" }));
    }

    #[test]
    fn failures_keep_the_raw_value_and_follow_location_order() {
        let schemas = RequestSchemas {
            body: Some(Arc::new(object_with_id)),
            query: Some(Arc::new(object_with_id)),
            params: Some(Arc::new(object_with_id)),
        };
        let mut req = request("/?id=x", json!({}));
        req.params = json!({ "id": "9" });

        let errors = apply(&schemas, &mut req);

        let locations: Vec<Location> = errors.iter().map(|e| e.location).collect();
        assert_eq!(locations, vec![Location::Body, Location::Query]);
        assert_eq!(req.query(), &json!({ "id": "x" }));
        assert_eq!(req.params(), &json!({ "id": 9 }));
    }

    #[test]
    fn empty_issue_lists_are_filled_in() {
        let schemas = RequestSchemas {
            body: Some(Arc::new(reject_silently)),
            ..Default::default()
        };
        let mut req = request("/", json!(null));

        let errors = apply(&schemas, &mut req);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].issues, vec![Issue::new("value is invalid")]);
    }

    #[test]
    fn rejection_has_the_wire_shape() {
        let res = rejection(vec![ValidationError {
            location: Location::Params,
            issues: vec![Issue::new("bad").with_code("x")],
        }]);

        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(res.header("content-type"), Some("application/json"));
        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(
            body,
            json!({
                "error": "Validation failed",
                "details": [
                    { "location": "params", "issues": [ { "message": "bad", "code": "x" } ] }
                ]
            })
        );
    }

    #[test]
    fn unparsable_json_fails_the_body_schema_without_running_it() {
        let schemas = RequestSchemas {
            body: Some(Arc::new(|v: &Value| -> Result<Value, Vec<Issue>> { Ok(v.clone()) })),
            query: Some(Arc::new(object_with_id)),
            ..Default::default()
        };
        let mut req = Request::builder()
            .uri("/?id=3")
            .header("content-type", "application/json")
            .body("{oops")
            .build()
            .unwrap();

        let errors = apply(&schemas, &mut req);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].location, Location::Body);
        assert_eq!(errors[0].issues[0].code.as_deref(), Some("json"));
        assert_eq!(req.query(), &json!({ "id": 3 }));
    }

    #[test]
    fn empty_schema_set_is_empty() {
        assert!(RequestSchemas::default().is_empty());
        let schemas = RequestSchemas { params: Some(Arc::new(number)), ..Default::default() };
        assert!(!schemas.is_empty());
    }
}
