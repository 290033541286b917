//! Schema capability and a declarative object schema.
//!
//! The loader never inspects configuration content itself; it hands the
//! merged value to a [`Schema`] and propagates whatever the schema reports.
//! [`ObjectSchema`] walks the entire value and collects every offending
//! field before giving up, then deserializes into the caller's type.

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{FieldIssue, ValidationError};
use crate::merge::kind_name;

/// Validates a merged JSON value and converts it into a typed configuration.
pub trait Schema {
    /// The typed configuration produced on success.
    type Output;

    /// Validates `value`, reporting every offending field on mismatch.
    fn validate(&self, value: Value) -> Result<Self::Output, ValidationError>;
}

impl<S: Schema + ?Sized> Schema for &S {
    type Output = S::Output;

    fn validate(&self, value: Value) -> Result<Self::Output, ValidationError> {
        (**self).validate(value)
    }
}

// =============================================================================
// Function Schema
// =============================================================================

/// Adapts a closure into a [`Schema`].
///
/// This is the seam for plugging in other validation libraries.
pub struct FnSchema<F> {
    f: F,
}

/// Creates a [`Schema`] from a validation closure.
pub fn schema_fn<F, T>(f: F) -> FnSchema<F>
where
    F: Fn(Value) -> Result<T, ValidationError>,
{
    FnSchema { f }
}

impl<F, T> Schema for FnSchema<F>
where
    F: Fn(Value) -> Result<T, ValidationError>,
{
    type Output = T;

    fn validate(&self, value: Value) -> Result<T, ValidationError> {
        (self.f)(value)
    }
}

// =============================================================================
// Field Rules
// =============================================================================

/// Expected kind of a configuration field.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Any JSON value.
    Any,
    /// `true` or `false`.
    Bool,
    /// Any JSON number.
    Number,
    /// A number without fractional part.
    Integer,
    /// A JSON string.
    String,
    /// One of a fixed set of strings, such as an enum variant name.
    OneOf(&'static [&'static str]),
    /// An integer within the inclusive bounds.
    IntegerRange(i64, i64),
    /// An array whose elements all match the inner kind.
    Array(Box<FieldKind>),
    /// An object with arbitrary keys whose values all match the inner kind.
    Map(Box<FieldKind>),
    /// A nested object with its own rules.
    Object(ObjectRules),
}

impl FieldKind {
    /// Array of elements of `kind`.
    pub fn array_of(kind: FieldKind) -> Self {
        Self::Array(Box::new(kind))
    }

    /// Object of arbitrary keys with values of `kind`.
    pub fn map_of(kind: FieldKind) -> Self {
        Self::Map(Box::new(kind))
    }

    /// Integer accepted by a `u16` field, such as a port.
    pub fn port() -> Self {
        Self::IntegerRange(1, i64::from(u16::MAX))
    }

    fn check(&self, value: &Value, path: &str, issues: &mut Vec<FieldIssue>) {
        match (self, value) {
            (Self::Any, _)
            | (Self::Bool, Value::Bool(_))
            | (Self::Number, Value::Number(_))
            | (Self::String, Value::String(_)) => {}
            (Self::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => {}
            (Self::OneOf(allowed), Value::String(s)) if allowed.contains(&s.as_str()) => {}
            (Self::IntegerRange(min, max), Value::Number(n))
                if n.as_i64().is_some_and(|v| (*min..=*max).contains(&v)) => {}
            (Self::OneOf(_), Value::String(s)) => {
                issues.push(FieldIssue::new(path, self.to_string(), format!("{s:?}")));
            }
            (Self::IntegerRange(..), Value::Number(n)) => {
                issues.push(FieldIssue::new(path, self.to_string(), n.to_string()));
            }
            (Self::Array(element), Value::Array(items)) => {
                for (index, item) in items.iter().enumerate() {
                    element.check(item, &format!("{path}[{index}]"), issues);
                }
            }
            (Self::Map(element), Value::Object(map)) => {
                for (key, item) in map {
                    element.check(item, &join_path(path, key), issues);
                }
            }
            (Self::Object(rules), Value::Object(map)) => rules.check(map, path, issues),
            (expected, actual) => {
                issues.push(FieldIssue::new(path, expected.to_string(), kind_name(actual)));
            }
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any value"),
            Self::Bool => f.write_str("boolean"),
            Self::Number => f.write_str("number"),
            Self::Integer => f.write_str("integer"),
            Self::String => f.write_str("string"),
            Self::OneOf(allowed) => write!(f, "one of {}", allowed.join(", ")),
            Self::IntegerRange(min, max) => write!(f, "integer between {min} and {max}"),
            Self::Array(element) => write!(f, "array of {element}"),
            Self::Map(element) => write!(f, "object of {element}"),
            Self::Object(_) => f.write_str("object"),
        }
    }
}

#[derive(Debug, Clone)]
struct FieldRule {
    name: String,
    kind: FieldKind,
    required: bool,
}

/// Field rules for one JSON object.
#[derive(Debug, Clone, Default)]
pub struct ObjectRules {
    fields: Vec<FieldRule>,
    deny_unknown: bool,
}

impl ObjectRules {
    /// Creates an empty rule set that accepts any object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires `name` to be present with the given kind.
    pub fn required(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldRule {
            name: name.into(),
            kind,
            required: true,
        });
        self
    }

    /// Checks `name` against the given kind if it is present.
    pub fn optional(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldRule {
            name: name.into(),
            kind,
            required: false,
        });
        self
    }

    /// Rejects keys that have no rule.
    pub fn deny_unknown_fields(mut self) -> Self {
        self.deny_unknown = true;
        self
    }

    fn check(&self, map: &Map<String, Value>, path: &str, issues: &mut Vec<FieldIssue>) {
        for rule in &self.fields {
            let field_path = join_path(path, &rule.name);
            match map.get(&rule.name) {
                Some(value) => rule.kind.check(value, &field_path, issues),
                None if rule.required => {
                    issues.push(FieldIssue::new(field_path, rule.kind.to_string(), "missing"));
                }
                None => {}
            }
        }

        if self.deny_unknown {
            for key in map.keys() {
                if !self.fields.iter().any(|rule| &rule.name == key) {
                    issues.push(FieldIssue::new(join_path(path, key), "no field", "unknown field"));
                }
            }
        }
    }
}

fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

// =============================================================================
// Object Schema
// =============================================================================

/// Declarative schema for a configuration document rooted at an object.
///
/// # Example
///
/// ```rust
/// use startuphafen_config::{FieldKind, ObjectRules, ObjectSchema, Schema};
/// use serde_json::json;
///
/// let schema = ObjectSchema::<serde_json::Value>::new()
///     .required("port", FieldKind::Integer)
///     .optional("db", FieldKind::Object(ObjectRules::new().required("url", FieldKind::String)));
///
/// assert!(schema.validate(json!({"port": 8080})).is_ok());
/// assert!(schema.validate(json!({"port": "80", "db": {}})).is_err());
/// ```
pub struct ObjectSchema<T> {
    rules: ObjectRules,
    _output: PhantomData<fn() -> T>,
}

impl<T> Default for ObjectSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for ObjectSchema<T> {
    fn clone(&self) -> Self {
        Self::from_rules(self.rules.clone())
    }
}

impl<T> fmt::Debug for ObjectSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectSchema")
            .field("rules", &self.rules)
            .finish()
    }
}

impl<T> ObjectSchema<T> {
    /// Creates a schema that accepts any object.
    pub fn new() -> Self {
        Self::from_rules(ObjectRules::new())
    }

    /// Creates a schema from prepared root rules.
    pub fn from_rules(rules: ObjectRules) -> Self {
        Self {
            rules,
            _output: PhantomData,
        }
    }

    /// Requires a top-level field.
    pub fn required(self, name: impl Into<String>, kind: FieldKind) -> Self {
        Self::from_rules(self.rules.required(name, kind))
    }

    /// Checks a top-level field if present.
    pub fn optional(self, name: impl Into<String>, kind: FieldKind) -> Self {
        Self::from_rules(self.rules.optional(name, kind))
    }

    /// Rejects unknown top-level fields.
    pub fn deny_unknown_fields(self) -> Self {
        Self::from_rules(self.rules.deny_unknown_fields())
    }
}

impl<T: DeserializeOwned> Schema for ObjectSchema<T> {
    type Output = T;

    fn validate(&self, value: Value) -> Result<T, ValidationError> {
        let mut issues = Vec::new();
        match &value {
            Value::Object(map) => self.rules.check(map, "", &mut issues),
            other => issues.push(FieldIssue::new("", "object", kind_name(other))),
        }
        if !issues.is_empty() {
            return Err(ValidationError::new(issues));
        }

        // Rules passed; whatever serde still rejects is reported at its path.
        serde_path_to_error::deserialize(value).map_err(|e| {
            let path = match e.path().to_string() {
                root if root == "." => String::new(),
                path => path,
            };
            ValidationError::single(path, "valid configuration", e.into_inner().to_string())
        })
    }
}
