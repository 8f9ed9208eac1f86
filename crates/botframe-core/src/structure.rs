//! Schema-by-example structure validation.
//!
//! A reference value (typically a plugin's default configuration) is compiled
//! once into a [`Shape`]; candidate values are then checked against it:
//!
//! - mappings must have exactly the reference's key set, and every value recurses
//! - sequences must cover every reference index; extra trailing elements are unconstrained
//! - scalars must have the same runtime type (values are not compared)
//!
//! Integers, floats and booleans are all distinct scalar types.

use std::collections::BTreeMap;

use botframe_types::error::StructureValidationError;
use botframe_types::validation::ValidationPath;
use serde_json::Value;

/// Runtime type of a scalar leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Text,
    Integer,
    Float,
    Boolean,
    Null,
}

impl ScalarKind {
    /// Scalar kind of `value`, or `None` for mappings and sequences.
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::String(_) => Some(ScalarKind::Text),
            Value::Number(n) if n.is_f64() => Some(ScalarKind::Float),
            Value::Number(_) => Some(ScalarKind::Integer),
            Value::Bool(_) => Some(ScalarKind::Boolean),
            Value::Null => Some(ScalarKind::Null),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::Text => "text",
            ScalarKind::Integer => "integer",
            ScalarKind::Float => "float",
            ScalarKind::Boolean => "boolean",
            ScalarKind::Null => "null",
        }
    }
}

/// Expected shape of a value, derived from a reference value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    Mapping(BTreeMap<String, Shape>),
    Sequence(Vec<Shape>),
    Scalar(ScalarKind),
}

impl Shape {
    /// Compile the shape of `reference`.
    pub fn from_reference(reference: &Value) -> Self {
        match reference {
            Value::Object(map) => Shape::Mapping(
                map.iter()
                    .map(|(key, value)| (key.clone(), Shape::from_reference(value)))
                    .collect(),
            ),
            Value::Array(items) => Shape::Sequence(items.iter().map(Shape::from_reference).collect()),
            Value::String(_) => Shape::Scalar(ScalarKind::Text),
            Value::Number(n) if n.is_f64() => Shape::Scalar(ScalarKind::Float),
            Value::Number(_) => Shape::Scalar(ScalarKind::Integer),
            Value::Bool(_) => Shape::Scalar(ScalarKind::Boolean),
            Value::Null => Shape::Scalar(ScalarKind::Null),
        }
    }

    /// Short name of what this shape expects at its root.
    pub fn descriptor(&self) -> &'static str {
        match self {
            Shape::Mapping(_) => "mapping",
            Shape::Sequence(_) => "sequence",
            Shape::Scalar(kind) => kind.as_str(),
        }
    }

    /// Check `candidate` against this shape.
    ///
    /// Returns the first mismatch found, walking mapping keys in sorted order.
    pub fn validate(&self, candidate: &Value) -> Result<(), StructureValidationError> {
        let mut path = ValidationPath::root();
        self.check(candidate, &mut path)
    }

    fn check(&self, candidate: &Value, path: &mut ValidationPath) -> Result<(), StructureValidationError> {
        match (self, candidate) {
            (Shape::Mapping(fields), Value::Object(map)) => {
                if let Some(missing) = fields.keys().find(|key| !map.contains_key(*key)) {
                    return Err(mismatch(
                        path,
                        format!("mapping with key '{missing}'"),
                        format!("missing key '{missing}'"),
                    ));
                }
                if let Some(extra) = map.keys().find(|key| !fields.contains_key(*key)) {
                    return Err(mismatch(
                        path,
                        "mapping without extra keys",
                        format!("unexpected key '{extra}'"),
                    ));
                }
                for (key, shape) in fields {
                    path.push_key(key.as_str());
                    shape.check(&map[key.as_str()], path)?;
                    path.pop();
                }
                Ok(())
            }
            (Shape::Sequence(items), Value::Array(elements)) => {
                if elements.len() < items.len() {
                    return Err(mismatch(
                        path,
                        format!("sequence of at least {} elements", items.len()),
                        format!("sequence of {} elements", elements.len()),
                    ));
                }
                for (index, (shape, element)) in items.iter().zip(elements).enumerate() {
                    path.push_index(index);
                    shape.check(element, path)?;
                    path.pop();
                }
                Ok(())
            }
            (Shape::Scalar(kind), value) if ScalarKind::of(value) == Some(*kind) => Ok(()),
            (expected, found) => Err(mismatch(path, expected.descriptor(), describe(found))),
        }
    }
}

/// Validate `candidate` against the shape of `reference` in one call.
pub fn check_structure(reference: &Value, candidate: &Value) -> Result<(), StructureValidationError> {
    Shape::from_reference(reference).validate(candidate)
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Object(_) => "mapping",
        Value::Array(_) => "sequence",
        scalar => ScalarKind::of(scalar).map_or("unknown", |kind| kind.as_str()),
    }
}

fn mismatch(
    path: &ValidationPath,
    expected: impl Into<String>,
    found: impl Into<String>,
) -> StructureValidationError {
    StructureValidationError {
        path: path.clone(),
        expected: expected.into(),
        found: found.into(),
    }
}
