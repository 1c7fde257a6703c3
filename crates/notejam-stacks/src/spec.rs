//! Provisioner-facing resource specifications and output references

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Flattened specification of one desired resource, as handed to the
/// provisioning engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSpec {
    /// Resource type (e.g. "container-repository", "database-instance")
    pub resource_type: String,

    /// Resource identifier, unique within its stack
    pub id: String,

    /// Resource-specific configuration
    pub config: serde_json::Value,
}

impl ResourceSpec {
    pub fn new<T: Serialize>(
        resource_type: impl Into<String>,
        id: impl Into<String>,
        config: &T,
    ) -> Result<Self> {
        Ok(Self {
            resource_type: resource_type.into(),
            id: id.into(),
            config: serde_json::to_value(config)?,
        })
    }

    /// Full resource key (type:id)
    pub fn key(&self) -> String {
        format!("{}:{}", self.resource_type, self.id)
    }
}

/// Reference to an output attribute of a resource declared elsewhere
/// in the graph.
///
/// The concrete value (an address, an identifier) only exists once the
/// provisioning engine has created the owning resource. Until then the
/// reference renders as a stable placeholder, which keeps synthesized
/// graphs deterministic across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRef {
    /// Stack that owns the referenced resource (scoped name)
    pub stack: String,

    /// Resource id within that stack
    pub resource: String,

    /// Output attribute of the resource
    pub attribute: String,
}

impl OutputRef {
    pub fn new(
        stack: impl Into<String>,
        resource: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        Self {
            stack: stack.into(),
            resource: resource.into(),
            attribute: attribute.into(),
        }
    }

    /// Stable textual form, substituted by the provisioning engine
    /// once the referenced resource exists.
    pub fn placeholder(&self) -> String {
        format!("${{{}/{}#{}}}", self.stack, self.resource, self.attribute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_spec_key() {
        let spec = ResourceSpec::new(
            "container-repository",
            "NoteJamRepo",
            &serde_json::json!({"repository_name": "note-jam"}),
        )
        .unwrap();
        assert_eq!(spec.key(), "container-repository:NoteJamRepo");
    }

    #[test]
    fn test_output_ref_placeholder_is_stable() {
        let reference = OutputRef::new("NoteJamDataLayer", "Db", "endpoint_address");
        assert_eq!(
            reference.placeholder(),
            "${NoteJamDataLayer/Db#endpoint_address}"
        );
        assert_eq!(reference, reference.clone());
    }
}
