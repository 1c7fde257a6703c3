//! Deployment environment identity and naming policy

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Global prefix for bucket-style names, which live in a shared
/// namespace and therefore always carry the environment identity.
const BUCKET_RESOURCE_PREFIX: &str = "sgy-notejam";

/// Target environment class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentType {
    Dev,
}

impl fmt::Display for EnvironmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvironmentType::Dev => write!(f, "dev"),
        }
    }
}

impl FromStr for EnvironmentType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dev" => Ok(EnvironmentType::Dev),
            other => Err(ConfigError::UnknownEnvironmentType(other.to_string())),
        }
    }
}

/// The three named values resolved from the invoking environment,
/// before validation.
#[derive(Debug, Clone, Default)]
pub struct DeployContext {
    pub environment_type: Option<String>,
    pub feature_id: Option<String>,
    pub profile: Option<String>,
}

/// Validated deployment identity.
///
/// Resolved once at process start and passed by reference to every
/// emitter; never mutated afterwards. All resource naming is routed
/// through [`Environment::scoped_name`] / [`Environment::bucket_name`]
/// so that concurrent feature environments cannot collide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    environment_type: EnvironmentType,
    feature_id: Option<String>,
    profile: Option<String>,
}

impl Environment {
    /// Validate a raw deploy context. The environment type is the only
    /// hard requirement; an empty feature id is treated as absent.
    pub fn resolve(context: &DeployContext) -> Result<Self> {
        let environment_type = context
            .environment_type
            .as_deref()
            .ok_or(ConfigError::MissingEnvironmentType)?
            .parse::<EnvironmentType>()?;

        let feature_id = context
            .feature_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        tracing::debug!(
            environment = %environment_type,
            feature = feature_id.as_deref().unwrap_or("-"),
            "resolved deploy context"
        );

        Ok(Self {
            environment_type,
            feature_id,
            profile: context.profile.clone(),
        })
    }

    pub fn environment_type(&self) -> EnvironmentType {
        self.environment_type
    }

    pub fn feature_id(&self) -> Option<&str> {
        self.feature_id.as_deref()
    }

    /// Credential profile to hand to the provisioning engine. Carried
    /// verbatim; credential resolution is not this crate's concern.
    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    /// True when this deployment is an ephemeral per-feature overlay.
    pub fn is_feature_environment(&self) -> bool {
        self.feature_id.is_some()
    }

    /// Name a resource for this environment: feature environments get
    /// a `<feature-id>-` prefix, everything else keeps the base name.
    pub fn scoped_name(&self, base: &str) -> String {
        match &self.feature_id {
            Some(feature_id) => format!("{feature_id}-{base}"),
            None => base.to_string(),
        }
    }

    /// Name a resource living in a globally shared namespace. Unlike
    /// [`Environment::scoped_name`] the environment type is always part
    /// of the name, feature environment or not.
    pub fn bucket_name(&self, base: &str) -> String {
        match &self.feature_id {
            Some(feature_id) => format!(
                "{BUCKET_RESOURCE_PREFIX}-{}-{feature_id}-{base}",
                self.environment_type
            ),
            None => format!("{BUCKET_RESOURCE_PREFIX}-{}-{base}", self.environment_type),
        }
    }
}
