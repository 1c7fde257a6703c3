//! NoteJam deployment stacks
//!
//! The five deployment units (Commons, Network, DataLayer, AppLayer,
//! Monitoring) as pure resource-spec emitters, plus the assembler that
//! constructs them in dependency order and the boundary trait for the
//! external provisioning engine.

pub mod app_layer;
pub mod assembler;
pub mod commons;
pub mod data_layer;
pub mod error;
pub mod monitoring;
pub mod network;
pub mod provision;
pub mod spec;

pub use app_layer::{AppLayerOutputs, AppLayerStack};
pub use assembler::{Assembler, DeploymentGraph, ASSEMBLY_ORDER};
pub use commons::{CommonsOutputs, CommonsStack, RepositoryHandle};
pub use data_layer::{DataLayerOutputs, DataLayerStack, DbEndpoint};
pub use error::{AssemblyError, Result};
pub use monitoring::{MonitoringOutputs, MonitoringStack, TopicHandle};
pub use network::{NetworkOutputs, NetworkStack, SubnetHandle};
pub use provision::{ProvisionedResource, Provisioner};
pub use spec::{OutputRef, ResourceSpec};
