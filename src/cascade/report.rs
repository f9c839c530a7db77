//! Per-collection impact report

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Collection name → number of affected records
///
/// Always a single flat level: second-level cascades are reported next to
/// first-level ones. Entries keep the order in which they were recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CascadeResult(IndexMap<String, u64>);

impl CascadeResult {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// `{ collection: count }`
    pub fn single(collection: &str, count: u64) -> Self {
        let mut result = Self::new();
        result.record(collection, count);
        result
    }

    /// Add `count` under `collection`, summing with any earlier entry
    pub fn record(&mut self, collection: &str, count: u64) {
        *self.0.entry(collection.to_string()).or_insert(0) += count;
    }

    /// Append every entry of `other`, summing shared collections
    pub fn absorb(&mut self, other: CascadeResult) {
        for (collection, count) in other.0 {
            self.record(&collection, count);
        }
    }

    pub fn get(&self, collection: &str) -> Option<u64> {
        self.0.get(collection).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Collection names in report order
    pub fn collections(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    pub fn into_inner(self) -> IndexMap<String, u64> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_sums_and_keeps_order() {
        let mut result = CascadeResult::new();
        result.record("meeting", 1);
        result.record("user_x_meeting", 2);
        result.record("meeting", 3);

        assert_eq!(result.collections(), vec!["meeting", "user_x_meeting"]);
        assert_eq!(result.get("meeting"), Some(4));
        assert_eq!(result.total(), 6);
    }

    #[test]
    fn test_serializes_as_flat_object() {
        let mut result = CascadeResult::single("meeting", 1);
        result.absorb(CascadeResult::single("user_x_meeting", 2));

        assert_eq!(
            serde_json::to_string(&result).unwrap(),
            r#"{"meeting":1,"user_x_meeting":2}"#
        );
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"meeting": 1, "user_x_meeting": 2})
        );
    }
}
