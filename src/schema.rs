//! Schema adapters.
//!
//! A [`Schema`] is anything that can look at a JSON value and either hand
//! back its canonical form or explain, as a list of [`Issue`]s, why it is
//! unacceptable. That single capability is all the validation layer uses.
//!
//! Three adapters ship with the crate:
//!
//! | Adapter | Backed by | Output |
//! |---|---|---|
//! | [`JsonSchema`] | a JSON Schema document (`jsonschema`) | the input, unchanged |
//! | [`Typed<T>`] | a serde type | `T` re-serialised: defaults filled, strings coerced |
//! | `Fn(&Value) -> Result<Value, Vec<Issue>>` | your closure | whatever it returns |

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Parse-or-report: the one capability a schema offers.
pub trait Schema: Send + Sync + 'static {
    /// Returns the canonical value, or every problem found.
    ///
    /// An `Err` should carry at least one issue. The validation step
    /// substitutes a generic one if it does not.
    fn validate(&self, value: &Value) -> std::result::Result<Value, Vec<Issue>>;
}

impl<F> Schema for F
where
    F: Fn(&Value) -> std::result::Result<Value, Vec<Issue>> + Send + Sync + 'static,
{
    fn validate(&self, value: &Value) -> std::result::Result<Value, Vec<Issue>> {
        self(value)
    }
}

// ── Issue ─────────────────────────────────────────────────────────────────────

/// One reason a value was rejected.
///
/// Issues are produced by schemas and passed through to clients untouched.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub message: String,
    /// Where inside the value the problem is, when the schema knows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// A short machine-readable tag, when the schema provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Issue {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), path: None, code: None }
    }

    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{path}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

// ── JsonSchema ────────────────────────────────────────────────────────────────

/// A compiled JSON Schema document.
///
/// JSON Schema only accepts or rejects, so the canonical value is the input
/// itself. Reach for [`Typed`] when you need defaults or coercion.
///
/// ```rust
/// use tsu_typed::{JsonSchema, Schema};
/// use serde_json::json;
///
/// let schema = JsonSchema::new(&json!({
///     "type": "object",
///     "required": ["name"],
///     "properties": { "name": { "type": "string", "minLength": 1 } }
/// })).unwrap();
///
/// assert!(schema.validate(&json!({ "name": "alice" })).is_ok());
/// assert!(schema.validate(&json!({ "name": "" })).is_err());
/// ```
pub struct JsonSchema {
    validator: jsonschema::Validator,
}

impl JsonSchema {
    /// Compiles `schema`. The draft is detected from `$schema`, defaulting
    /// to the latest one `jsonschema` supports.
    pub fn new(schema: &Value) -> Result<Self> {
        let validator = jsonschema::validator_for(schema)
            .map_err(|e| Error::InvalidSchema(e.to_string()))?;
        Ok(Self { validator })
    }
}

impl Schema for JsonSchema {
    fn validate(&self, value: &Value) -> std::result::Result<Value, Vec<Issue>> {
        let issues: Vec<Issue> = self.validator
            .iter_errors(value)
            .map(|e| Issue::new(e.to_string()).with_code("schema"))
            .collect();

        if issues.is_empty() {
            Ok(value.clone())
        } else {
            Err(issues)
        }
    }
}

// ── Typed ─────────────────────────────────────────────────────────────────────

/// A schema defined by a serde type.
///
/// The value is decoded into `T`, checked by any [`refine`](Typed::refine)
/// rules, and encoded back. The round trip is what canonicalises: fields
/// marked `#[serde(default)]` appear, unknown fields vanish unless `T`
/// keeps them, and numbers come out as numbers.
///
/// Query strings and path parameters arrive as strings. [`Typed::coerce`]
/// decodes them the way an HTML form is decoded, so `"3"` satisfies a `u32`
/// field and `"true"` a `bool`. Coercion handles flat structs of scalars.
///
/// ```rust
/// use std::num::NonZeroU32;
/// use tsu_typed::{Schema, Typed};
/// use serde::{Deserialize, Serialize};
/// use serde_json::json;
///
/// #[derive(Deserialize, Serialize)]
/// struct Page {
///     #[serde(default = "first")]
///     page: NonZeroU32,
/// }
///
/// fn first() -> NonZeroU32 { NonZeroU32::MIN }
///
/// let schema = Typed::<Page>::coerce();
/// assert_eq!(schema.validate(&json!({})).unwrap(), json!({ "page": 1 }));
/// assert_eq!(schema.validate(&json!({ "page": "3" })).unwrap(), json!({ "page": 3 }));
/// assert!(schema.validate(&json!({ "page": "0" })).is_err());
/// ```
pub struct Typed<T> {
    mode: Mode,
    checks: Vec<Check<T>>,
    _marker: PhantomData<fn() -> T>,
}

type Check<T> = Box<dyn Fn(&T) -> std::result::Result<(), Issue> + Send + Sync>;

#[derive(Clone, Copy)]
enum Mode {
    Json,
    Form,
}

impl<T> Typed<T>
where
    T: DeserializeOwned + Serialize + 'static,
{
    /// Decodes JSON as-is: a string never satisfies a number field.
    pub fn new() -> Self {
        Self::with_mode(Mode::Json)
    }

    /// Decodes string-valued maps with form semantics.
    pub fn coerce() -> Self {
        Self::with_mode(Mode::Form)
    }

    fn with_mode(mode: Mode) -> Self {
        Self { mode, checks: Vec::new(), _marker: PhantomData }
    }

    /// Adds a rule the decoded value must satisfy.
    ///
    /// Every failing rule contributes its issue; rules run only once decoding
    /// has succeeded.
    pub fn refine<F>(mut self, check: F) -> Self
    where
        F: Fn(&T) -> std::result::Result<(), Issue> + Send + Sync + 'static,
    {
        self.checks.push(Box::new(check));
        self
    }
}

impl<T> Default for Typed<T>
where
    T: DeserializeOwned + Serialize + 'static,
{
    fn default() -> Self { Self::new() }
}

impl<T> Schema for Typed<T>
where
    T: DeserializeOwned + Serialize + 'static,
{
    fn validate(&self, value: &Value) -> std::result::Result<Value, Vec<Issue>> {
        let decoded: T = match self.mode {
            Mode::Json => T::deserialize(value)
                .map_err(|e| vec![Issue::new(e.to_string()).with_code("decode")])?,
            Mode::Form => decode_form(value)?,
        };

        let issues: Vec<Issue> = self.checks
            .iter()
            .filter_map(|check| check(&decoded).err())
            .collect();
        if !issues.is_empty() {
            return Err(issues);
        }

        serde_json::to_value(&decoded)
            .map_err(|e| vec![Issue::new(e.to_string()).with_code("encode")])
    }
}

fn decode_form<T: DeserializeOwned>(value: &Value) -> std::result::Result<T, Vec<Issue>> {
    let Value::Object(map) = value else {
        return Err(vec![Issue::new("expected an object").with_code("type")]);
    };

    let mut pairs: Vec<(&str, String)> = Vec::with_capacity(map.len());
    let mut issues = Vec::new();
    for (key, value) in map {
        let values = match value {
            Value::Null => continue,
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        for value in values {
            match scalar(value) {
                Some(s) => pairs.push((key.as_str(), s)),
                None => issues.push(
                    Issue::new("nested values cannot be coerced").at(key.as_str()).with_code("type"),
                ),
            }
        }
    }
    if !issues.is_empty() {
        return Err(issues);
    }

    let encoded = serde_urlencoded::to_string(&pairs)
        .map_err(|e| vec![Issue::new(e.to_string()).with_code("encode")])?;
    serde_urlencoded::from_str(&encoded)
        .map_err(|e| vec![Issue::new(e.to_string()).with_code("decode")])
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(Deserialize, Serialize)]
    struct Signup {
        email: String,
        #[serde(default)]
        newsletter: bool,
    }

    fn signup() -> Typed<Signup> {
        Typed::new().refine(|s: &Signup| {
            if s.email.contains('@') {
                Ok(())
            } else {
                Err(Issue::new("not an email").at("email").with_code("email"))
            }
        })
    }

    #[test]
    fn typed_fills_defaults() {
        let out = signup().validate(&json!({ "email": "a@b.com" })).unwrap();
        assert_eq!(out, json!({ "email": "a@b.com", "newsletter": false }));
    }

    #[test]
    fn typed_reports_refinements() {
        let issues = signup().validate(&json!({ "email": "nope" })).unwrap_err();
        assert_eq!(issues, vec![Issue::new("not an email").at("email").with_code("email")]);
    }

    #[test]
    fn typed_reports_decode_failures() {
        let issues = signup().validate(&json!({ "newsletter": true })).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code.as_deref(), Some("decode"));
        assert!(issues[0].message.contains("email"));
    }

    #[test]
    fn strict_mode_does_not_coerce() {
        #[derive(Deserialize, Serialize)]
        struct Page { page: u32 }

        assert!(Typed::<Page>::new().validate(&json!({ "page": "2" })).is_err());
        assert_eq!(Typed::<Page>::coerce().validate(&json!({ "page": "2" })).unwrap(), json!({ "page": 2 }));
    }

    #[test]
    fn coercion_rejects_nested_values() {
        #[derive(Deserialize, Serialize)]
        struct Filter { q: String }

        let issues = Typed::<Filter>::coerce().validate(&json!({ "q": { "a": 1 } })).unwrap_err();
        assert_eq!(issues[0].path.as_deref(), Some("q"));
    }

    #[test]
    fn canonical_output_is_a_fixed_point() {
        #[derive(Deserialize, Serialize)]
        struct Page {
            #[serde(default)]
            page: u32,
            #[serde(default)]
            desc: bool,
        }

        let schema = Typed::<Page>::coerce();
        let once = schema.validate(&json!({ "page": "7", "desc": "true" })).unwrap();
        let twice = schema.validate(&once).unwrap();
        assert_eq!(once, json!({ "page": 7, "desc": true }));
        assert_eq!(once, twice);
    }

    #[test]
    fn json_schema_returns_input_and_collects_every_error() {
        let schema = JsonSchema::new(&json!({
            "type": "object",
            "properties": {
                "a": { "type": "integer" },
                "b": { "type": "string" }
            }
        }))
        .unwrap();

        let good = json!({ "a": 1, "b": "x" });
        assert_eq!(schema.validate(&good).unwrap(), good);

        let issues = schema.validate(&json!({ "a": "1", "b": 2 })).unwrap_err();
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.code.as_deref() == Some("schema")));
    }

    #[test]
    fn json_schema_rejects_invalid_documents() {
        let result = JsonSchema::new(&json!({ "type": "not-a-type" }));
        assert!(matches!(result, Err(Error::InvalidSchema(_))));
    }

    #[test]
    fn closures_are_schemas() {
        let upper = |v: &Value| match v.as_str() {
            Some(s) => Ok(Value::String(s.to_uppercase())),
            None => Err(vec![Issue::new("expected a string")]),
        };
        assert_eq!(upper.validate(&json!("abc")).unwrap(), json!("ABC"));
        assert!(upper.validate(&json!(1)).is_err());
    }
}
