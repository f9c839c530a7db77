//! Configuration loading and management
//!
//! The relationship table is declared once, either in code
//! ([`CascadeConfig::default_config`]) or in YAML:
//!
//! ```yaml
//! collections: [space, meeting, user_x_meeting]
//! edges:
//!   - parent: space
//!     child: meeting
//!     foreign_keys: [space_id]
//!     flatten: true
//!   - parent: meeting
//!     child: user_x_meeting
//!     foreign_keys: [meeting_id]
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A declared parent → child reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeConfig {
    /// Collection holding the referenced records
    pub parent: String,

    /// Collection holding the referencing records
    pub child: String,

    /// Child fields that may hold a parent identifier
    pub foreign_keys: Vec<String>,

    /// Also cascade through the child's own edges, reported in the same flat map
    #[serde(default)]
    pub flatten: bool,
}

impl EdgeConfig {
    pub fn new(parent: &str, child: &str, foreign_keys: &[&str]) -> Self {
        Self {
            parent: parent.to_string(),
            child: child.to_string(),
            foreign_keys: foreign_keys.iter().map(|f| f.to_string()).collect(),
            flatten: false,
        }
    }

    /// Mark the edge as flattened (child edges reported at the same level)
    pub fn flattened(mut self) -> Self {
        self.flatten = true;
        self
    }
}

/// Complete configuration for the cascade graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CascadeConfig {
    /// Every collection cascades may be requested for, leaves included
    #[serde(default)]
    pub collections: Vec<String>,

    /// Edges in declaration order
    #[serde(default)]
    pub edges: Vec<EdgeConfig>,
}

impl CascadeConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Merge several configurations
    ///
    /// Collections are de-duplicated in first-seen order. An edge with the
    /// same parent and child as an earlier one replaces it in place (last wins).
    pub fn merge(configs: Vec<CascadeConfig>) -> Self {
        let mut merged = CascadeConfig::default();

        for config in configs {
            for collection in config.collections {
                if !merged.collections.contains(&collection) {
                    merged.collections.push(collection);
                }
            }

            for edge in config.edges {
                match merged
                    .edges
                    .iter_mut()
                    .find(|e| e.parent == edge.parent && e.child == edge.child)
                {
                    Some(existing) => *existing = edge,
                    None => merged.edges.push(edge),
                }
            }
        }

        merged
    }

    /// Find an edge definition
    pub fn find_edge(&self, parent: &str, child: &str) -> Option<&EdgeConfig> {
        self.edges
            .iter()
            .find(|e| e.parent == parent && e.child == child)
    }

    /// The relationship table of the meetings backend
    ///
    /// Only `space → meeting` is flattened, so deleting a space also reaches
    /// the `user_x_meeting` records of its meetings.
    pub fn default_config() -> Self {
        const AUDIT: &[&str] = &["addedBy", "updatedBy"];
        const AUDIT_AND_USER: &[&str] = &["addedBy", "updatedBy", "user_id"];
        const OWNER_AND_AUDIT: &[&str] = &["userId", "addedBy", "updatedBy"];

        let collections = [
            "user_x_meeting",
            "experties",
            "tieups",
            "learn",
            "bulletin",
            "user_x_webinar",
            "meeting",
            "space",
            "company",
            "user",
            "userTokens",
            "role",
            "projectRoute",
            "routeRole",
            "userRole",
        ];

        Self {
            collections: collections.iter().map(|c| c.to_string()).collect(),
            edges: vec![
                EdgeConfig::new("meeting", "user_x_meeting", &["meeting_id"]),
                EdgeConfig::new("space", "meeting", &["space_id"]).flattened(),
                EdgeConfig::new("company", "user", &["user_company"]),
                EdgeConfig::new("user", "user_x_meeting", AUDIT_AND_USER),
                EdgeConfig::new("user", "experties", AUDIT_AND_USER),
                EdgeConfig::new("user", "tieups", AUDIT),
                EdgeConfig::new("user", "learn", AUDIT_AND_USER),
                EdgeConfig::new("user", "bulletin", AUDIT_AND_USER),
                EdgeConfig::new("user", "user_x_webinar", AUDIT_AND_USER),
                EdgeConfig::new("user", "meeting", &["user_id"]),
                EdgeConfig::new("user", "userTokens", OWNER_AND_AUDIT),
                EdgeConfig::new("user", "role", AUDIT),
                EdgeConfig::new("user", "projectRoute", AUDIT),
                EdgeConfig::new("user", "routeRole", AUDIT),
                EdgeConfig::new("user", "userRole", OWNER_AND_AUDIT),
                EdgeConfig::new("role", "routeRole", &["roleId"]),
                EdgeConfig::new("role", "userRole", &["roleId"]),
                EdgeConfig::new("projectRoute", "routeRole", &["routeId"]),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CascadeConfig::default_config();

        assert_eq!(config.collections.len(), 15);
        assert_eq!(config.edges.len(), 18);
        assert_eq!(
            config.edges.iter().filter(|e| e.parent == "user").count(),
            12
        );
        assert!(config.find_edge("space", "meeting").unwrap().flatten);
        assert!(!config.find_edge("company", "user").unwrap().flatten);
    }

    #[test]
    fn test_yaml_serialization() {
        let config = CascadeConfig::default_config();
        let yaml = serde_yaml::to_string(&config).unwrap();

        let parsed = CascadeConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_flatten_defaults_to_false() {
        let yaml = r#"
collections: [company, user]
edges:
  - parent: company
    child: user
    foreign_keys: [user_company]
"#;
        let config = CascadeConfig::from_yaml_str(yaml).unwrap();
        assert!(!config.edges[0].flatten);
    }
}
