//! Query predicates over JSON documents
//!
//! A [`Filter`] is the opaque predicate handed to a
//! [`CollectionAccessor`](crate::core::CollectionAccessor). It is written in
//! the familiar document-store dialect and can be:
//! - parsed from JSON (`{"_id": "..."}`, `{"field": {"$in": [...]}}`, `{"$or": [...]}`)
//! - evaluated against a JSON document (in-memory storage)
//! - rendered back to JSON (document-store drivers)
//!
//! # Supported operators
//!
//! | JSON                                | Variant          |
//! |-------------------------------------|------------------|
//! | `{}`                                | `All`            |
//! | `{"f": v}` / `{"f": {"$eq": v}}`    | `Eq`             |
//! | `{"f": {"$ne": v}}`                 | `Ne`             |
//! | `{"f": {"$in": [v, ...]}}`          | `In`             |
//! | `{"f": {"$exists": bool}}`          | `Exists`         |
//! | `{"$or": [...]}`                    | `Or`             |
//! | `{"$and": [...]}` / several keys    | `And`            |

use crate::core::error::CascadeError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier field used by the document store
pub const ID_FIELD: &str = "_id";

/// Identifier alias used by JSON documents outside the store
pub const ID_ALIAS: &str = "id";

/// A query predicate over a single collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum Filter {
    /// Matches every document
    All,
    /// Field equals value (or an array field contains it)
    Eq { field: String, value: Value },
    /// Negation of `Eq`; a missing field matches
    Ne { field: String, value: Value },
    /// Field equals any of the values
    In { field: String, values: Vec<Value> },
    /// Field presence
    Exists { field: String, exists: bool },
    /// Any sub-filter matches
    Or(Vec<Filter>),
    /// Every sub-filter matches
    And(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Ne {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn in_values(field: impl Into<String>, values: Vec<Value>) -> Self {
        Filter::In {
            field: field.into(),
            values,
        }
    }

    /// `{ _id: id }`
    pub fn by_id(id: impl Into<Value>) -> Self {
        Filter::eq(ID_FIELD, id)
    }

    /// `{ _id: { $in: ids } }`
    pub fn by_ids(ids: Vec<Value>) -> Self {
        Filter::in_values(ID_FIELD, ids)
    }

    /// `{ $or: [ { f1: { $in: ids } }, { f2: { $in: ids } }, ... ] }`
    ///
    /// This is the shape used to find records referencing any of `ids`
    /// through any of the given reference fields.
    pub fn referencing<S: AsRef<str>>(fields: &[S], ids: &[Value]) -> Self {
        Filter::Or(
            fields
                .iter()
                .map(|field| Filter::in_values(field.as_ref(), ids.to_vec()))
                .collect(),
        )
    }

    /// Combine with another filter, flattening nested conjunctions
    pub fn and(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::All, f) | (f, Filter::All) => f,
            (Filter::And(mut left), Filter::And(right)) => {
                left.extend(right);
                Filter::And(left)
            }
            (Filter::And(mut left), f) => {
                left.push(f);
                Filter::And(left)
            }
            (f, Filter::And(mut right)) => {
                right.insert(0, f);
                Filter::And(right)
            }
            (a, b) => Filter::And(vec![a, b]),
        }
    }

    /// Parse a JSON predicate
    pub fn from_json(value: &Value) -> Result<Self, CascadeError> {
        let Value::Object(map) = value else {
            return Err(invalid(format!("expected an object, got {}", value)));
        };

        let mut clauses = Vec::with_capacity(map.len());
        for (key, value) in map {
            match key.as_str() {
                "$or" => clauses.push(Filter::Or(parse_list(key, value)?)),
                "$and" => clauses.push(Filter::And(parse_list(key, value)?)),
                op if op.starts_with('$') => {
                    return Err(invalid(format!("unsupported top-level operator '{}'", op)));
                }
                field => clauses.extend(parse_field(field, value)?),
            }
        }

        Ok(match clauses.len() {
            0 => Filter::All,
            1 => clauses.remove(0),
            _ => Filter::And(clauses),
        })
    }

    /// Render back to the JSON dialect accepted by [`Filter::from_json`]
    pub fn to_json(&self) -> Value {
        match self {
            Filter::All => Value::Object(Map::new()),
            Filter::Eq { field, value } => single(field, value.clone()),
            Filter::Ne { field, value } => single(field, single("$ne", value.clone())),
            Filter::In { field, values } => {
                single(field, single("$in", Value::Array(values.clone())))
            }
            Filter::Exists { field, exists } => {
                single(field, single("$exists", Value::Bool(*exists)))
            }
            Filter::Or(filters) => single(
                "$or",
                Value::Array(filters.iter().map(Filter::to_json).collect()),
            ),
            Filter::And(filters) => single(
                "$and",
                Value::Array(filters.iter().map(Filter::to_json).collect()),
            ),
        }
    }

    /// Evaluate against a JSON document
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq { field, value } => value_matches(lookup(doc, field), value),
            Filter::Ne { field, value } => !value_matches(lookup(doc, field), value),
            Filter::In { field, values } => {
                let found = lookup(doc, field);
                values.iter().any(|v| value_matches(found, v))
            }
            Filter::Exists { field, exists } => lookup(doc, field).is_some() == *exists,
            Filter::Or(filters) => filters.iter().any(|f| f.matches(doc)),
            Filter::And(filters) => filters.iter().all(|f| f.matches(doc)),
        }
    }
}

impl TryFrom<Value> for Filter {
    type Error = CascadeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Filter::from_json(&value)
    }
}

impl From<Filter> for Value {
    fn from(filter: Filter) -> Self {
        filter.to_json()
    }
}

impl Default for Filter {
    fn default() -> Self {
        Filter::All
    }
}

fn invalid(message: String) -> CascadeError {
    CascadeError::Filter { message }
}

fn single(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}

fn parse_list(op: &str, value: &Value) -> Result<Vec<Filter>, CascadeError> {
    match value {
        Value::Array(items) if !items.is_empty() => items.iter().map(Filter::from_json).collect(),
        _ => Err(invalid(format!("'{}' expects a non-empty array", op))),
    }
}

fn parse_field(field: &str, value: &Value) -> Result<Vec<Filter>, CascadeError> {
    let operators = match value {
        Value::Object(map) if !map.is_empty() && map.keys().all(|k| k.starts_with('$')) => map,
        _ => return Ok(vec![Filter::eq(field, value.clone())]),
    };

    operators
        .iter()
        .map(|(op, operand)| match op.as_str() {
            "$eq" => Ok(Filter::eq(field, operand.clone())),
            "$ne" => Ok(Filter::ne(field, operand.clone())),
            "$in" => match operand {
                Value::Array(values) => Ok(Filter::in_values(field, values.clone())),
                _ => Err(invalid(format!("'$in' on '{}' expects an array", field))),
            },
            "$exists" => match operand {
                Value::Bool(exists) => Ok(Filter::Exists {
                    field: field.to_string(),
                    exists: *exists,
                }),
                _ => Err(invalid(format!("'$exists' on '{}' expects a boolean", field))),
            },
            other => Err(invalid(format!(
                "unsupported operator '{}' on '{}'",
                other, field
            ))),
        })
        .collect()
}

/// Resolve a field, treating `_id` and `id` as the same identifier.
fn lookup<'a>(doc: &'a Value, field: &str) -> Option<&'a Value> {
    let found = doc.get(field);
    match field {
        ID_FIELD => found.or_else(|| doc.get(ID_ALIAS)),
        ID_ALIAS => found.or_else(|| doc.get(ID_FIELD)),
        _ => found,
    }
}

fn value_matches(found: Option<&Value>, expected: &Value) -> bool {
    match found {
        None => expected.is_null(),
        Some(Value::Array(items)) if !expected.is_array() => items.contains(expected),
        Some(actual) => actual == expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_object_is_all() {
        assert_eq!(Filter::from_json(&json!({})).unwrap(), Filter::All);
        assert!(Filter::All.matches(&json!({"anything": 1})));
    }

    #[test]
    fn test_parse_id_and_in() {
        let filter = Filter::from_json(&json!({"_id": {"$in": ["a", "b"]}})).unwrap();
        assert_eq!(filter, Filter::by_ids(vec![json!("a"), json!("b")]));

        assert!(filter.matches(&json!({"id": "a"})));
        assert!(filter.matches(&json!({"_id": "b"})));
        assert!(!filter.matches(&json!({"id": "c"})));
    }

    #[test]
    fn test_parse_or_of_reference_fields() {
        let json = json!({
            "$or": [
                {"addedBy": {"$in": ["u1"]}},
                {"updatedBy": {"$in": ["u1"]}}
            ]
        });
        let filter = Filter::from_json(&json).unwrap();
        assert_eq!(
            filter,
            Filter::referencing(&["addedBy", "updatedBy"], &[json!("u1")])
        );

        assert!(filter.matches(&json!({"addedBy": "u2", "updatedBy": "u1"})));
        assert!(!filter.matches(&json!({"addedBy": "u2"})));
    }

    #[test]
    fn test_several_keys_are_conjunction() {
        let filter = Filter::from_json(&json!({"space_id": "s1", "isDeleted": false})).unwrap();
        assert!(matches!(filter, Filter::And(ref v) if v.len() == 2));
        assert!(filter.matches(&json!({"space_id": "s1", "isDeleted": false})));
        assert!(!filter.matches(&json!({"space_id": "s1", "isDeleted": true})));
    }

    #[test]
    fn test_ne_matches_missing_field() {
        let filter = Filter::from_json(&json!({"isDeleted": {"$ne": true}})).unwrap();
        assert!(filter.matches(&json!({})));
        assert!(filter.matches(&json!({"isDeleted": false})));
        assert!(!filter.matches(&json!({"isDeleted": true})));
    }

    #[test]
    fn test_exists() {
        let filter = Filter::from_json(&json!({"user_id": {"$exists": false}})).unwrap();
        assert!(filter.matches(&json!({"name": "x"})));
        assert!(!filter.matches(&json!({"user_id": "u"})));
    }

    #[test]
    fn test_array_field_contains() {
        let filter = Filter::eq("tags", "rust");
        assert!(filter.matches(&json!({"tags": ["go", "rust"]})));
        assert!(!filter.matches(&json!({"tags": ["go"]})));
    }

    #[test]
    fn test_rejects_malformed_filters() {
        assert!(Filter::from_json(&json!([1, 2])).is_err());
        assert!(Filter::from_json(&json!({"$or": []})).is_err());
        assert!(Filter::from_json(&json!({"$where": "1"})).is_err());
        assert!(Filter::from_json(&json!({"f": {"$in": 3}})).is_err());
        assert!(Filter::from_json(&json!({"f": {"$regex": "x"}})).is_err());
    }

    #[test]
    fn test_to_json_is_parseable() {
        let filter = Filter::referencing(&["roleId"], &[json!("r1"), json!("r2")])
            .and(Filter::ne("isDeleted", true));
        let parsed = Filter::from_json(&filter.to_json()).unwrap();
        assert_eq!(parsed, filter);
    }

    #[test]
    fn test_and_flattens() {
        let filter = Filter::All.and(Filter::by_id("x"));
        assert_eq!(filter, Filter::by_id("x"));

        let filter = Filter::by_id("x")
            .and(Filter::eq("a", 1))
            .and(Filter::eq("b", 2));
        assert!(matches!(filter, Filter::And(ref v) if v.len() == 3));
    }

    #[test]
    fn test_serde_through_value() {
        let filter: Filter = serde_json::from_value(json!({"_id": "abc"})).unwrap();
        assert_eq!(filter, Filter::by_id("abc"));
        assert_eq!(serde_json::to_value(&filter).unwrap(), json!({"_id": "abc"}));

        let bad: Result<Filter, _> = serde_json::from_value(json!("nope"));
        assert!(bad.is_err());
    }
}
