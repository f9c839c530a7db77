//! Record lifecycle and update patches
//!
//! Documents carry their lifecycle in the `isDeleted` flag. Code never reads
//! or writes that flag directly: it goes through [`Lifecycle`], which produces
//! the patch that moves a record into a state and the filter that selects
//! records in a state.

use crate::core::filter::Filter;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Document field holding the lifecycle flag
pub const DELETED_FLAG: &str = "isDeleted";

/// Lifecycle state of a stored record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Active,
    SoftDeleted,
}

impl Lifecycle {
    /// Read the state of a JSON document. A missing flag means active.
    pub fn of(doc: &Value) -> Self {
        match doc.get(DELETED_FLAG) {
            Some(Value::Bool(true)) => Lifecycle::SoftDeleted,
            _ => Lifecycle::Active,
        }
    }

    /// Filter selecting records in this state
    pub fn filter(self) -> Filter {
        match self {
            Lifecycle::Active => Filter::ne(DELETED_FLAG, true),
            Lifecycle::SoftDeleted => Filter::eq(DELETED_FLAG, true),
        }
    }

    /// Patch moving a record into this state
    pub fn patch(self) -> Patch {
        Patch::new().set(DELETED_FLAG, self == Lifecycle::SoftDeleted)
    }
}

/// Field assignments applied by `update_many`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch(Map<String, Value>);

impl Patch {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Add or replace one assignment
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Apply the assignments to a document. Non-object documents are left untouched.
    pub fn apply_to(&self, doc: &mut Value) {
        if let Value::Object(map) = doc {
            for (field, value) in &self.0 {
                map.insert(field.clone(), value.clone());
            }
        }
    }

    /// `{ "$set": { ... } }`
    pub fn to_set_document(&self) -> Value {
        let mut set = Map::new();
        set.insert("$set".to_string(), Value::Object(self.0.clone()));
        Value::Object(set)
    }
}

impl From<Map<String, Value>> for Patch {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
