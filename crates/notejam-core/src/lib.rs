//! NoteJam deployment context
//!
//! Resolves the identity of a deployment (environment type, optional
//! feature overlay, credential profile) and derives the resource-naming
//! policy that keeps concurrent environments isolated.

pub mod environment;
pub mod error;
pub mod settings;

pub use environment::{DeployContext, Environment, EnvironmentType};
pub use error::{ConfigError, Result};
pub use settings::{db_settings, target_settings, DbSettings, TargetSettings};
