//! Provisioning engine boundary
//!
//! The assembler only emits specifications; turning them into live
//! resources is the provisioning engine's job. Engines implement this
//! trait and are driven with the graph's dependency-ordered resource
//! list. Failures are opaque to the core and surface unchanged.

use crate::spec::ResourceSpec;
use serde::{Deserialize, Serialize};

/// External provisioning engine contract.
pub trait Provisioner {
    /// Engine name (e.g. "aws", "dry-run")
    fn name(&self) -> &str;

    /// Create or update one resource. Returns its stable identity and
    /// address once it exists.
    fn provision(&mut self, spec: &ResourceSpec) -> anyhow::Result<ProvisionedResource>;
}

/// Identity of a resource the engine has materialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionedResource {
    /// Provider-assigned identity
    pub id: String,

    /// Network address, when the resource has one
    pub address: Option<String>,
}
