//! Ordered construction of the five deployment units
//!
//! The assembler is a linear pipeline: each unit is handed exactly the
//! upstream outputs it declares, so a unit cannot be built before its
//! dependencies exist. Any failure aborts the whole assembly; no
//! partial graph is ever returned.

use crate::app_layer::AppLayerStack;
use crate::commons::CommonsStack;
use crate::data_layer::DataLayerStack;
use crate::error::{AssemblyError, Result};
use crate::monitoring::MonitoringStack;
use crate::network::NetworkStack;
use crate::spec::{OutputRef, ResourceSpec};
use notejam_core::{target_settings, Environment, TargetSettings};
use notejam_network::{DEFAULT_MAX_AZS, VPC_CIDR};
use serde::Serialize;

/// Unit base names in construction order.
pub const ASSEMBLY_ORDER: [&str; 5] = [
    crate::commons::STACK_BASE_NAME,
    crate::network::STACK_BASE_NAME,
    crate::data_layer::STACK_BASE_NAME,
    crate::app_layer::STACK_BASE_NAME,
    crate::monitoring::STACK_BASE_NAME,
];

pub struct Assembler<'a> {
    environment: &'a Environment,
    vpc_cidr: String,
    max_azs: usize,
}

impl<'a> Assembler<'a> {
    pub fn new(environment: &'a Environment) -> Self {
        Self {
            environment,
            vpc_cidr: VPC_CIDR.to_string(),
            max_azs: DEFAULT_MAX_AZS,
        }
    }

    pub fn with_vpc_cidr(mut self, vpc_cidr: impl Into<String>) -> Self {
        self.vpc_cidr = vpc_cidr.into();
        self
    }

    pub fn with_max_azs(mut self, max_azs: usize) -> Self {
        self.max_azs = max_azs;
        self
    }

    /// Construct the five units in dependency order and return the
    /// synthesized graph. Re-running with identical inputs produces a
    /// structurally identical graph.
    pub fn assemble(&self) -> Result<DeploymentGraph> {
        let environment = self.environment;
        tracing::info!(
            environment = %environment.environment_type(),
            profile = environment.profile().unwrap_or("-"),
            "assembling NoteJam deployment graph"
        );

        let target = target_settings(environment.environment_type());

        let commons = CommonsStack::emit(environment);
        let network = NetworkStack::emit(environment, &self.vpc_cidr, self.max_azs)?;
        let network_outputs = network.outputs();
        let data_layer = DataLayerStack::emit(environment, &network_outputs)?;
        let data_layer_outputs = data_layer.outputs();
        let app_layer = AppLayerStack::emit(
            environment,
            &network_outputs,
            &data_layer_outputs,
            &commons.outputs(),
        )?;
        let monitoring = MonitoringStack::emit(environment, &target, &data_layer_outputs);

        let graph = DeploymentGraph {
            environment: environment.clone(),
            target,
            commons,
            network,
            data_layer,
            app_layer,
            monitoring,
        };
        graph.validate()?;
        Ok(graph)
    }
}

/// The synthesized specification of the whole deployment, in
/// dependency order, as handed to the provisioning engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeploymentGraph {
    pub environment: Environment,
    pub target: TargetSettings,
    pub commons: CommonsStack,
    pub network: NetworkStack,
    pub data_layer: DataLayerStack,
    pub app_layer: AppLayerStack,
    pub monitoring: MonitoringStack,
}

impl DeploymentGraph {
    /// Scoped stack names in construction order.
    pub fn stack_names(&self) -> Vec<&str> {
        vec![
            self.commons.stack_name.as_str(),
            self.network.stack_name.as_str(),
            self.data_layer.stack_name.as_str(),
            self.app_layer.stack_name.as_str(),
            self.monitoring.stack_name.as_str(),
        ]
    }

    /// Every resource specification, flattened in dependency order.
    pub fn resources(&self) -> Result<Vec<ResourceSpec>> {
        let mut resources = self.commons.resources()?;
        resources.extend(self.network.resources()?);
        resources.extend(self.data_layer.resources()?);
        resources.extend(self.app_layer.resources()?);
        resources.extend(self.monitoring.resources()?);
        Ok(resources)
    }

    fn units(&self) -> Result<Vec<(&str, Vec<ResourceSpec>, Vec<OutputRef>)>> {
        Ok(vec![
            (
                self.commons.stack_name.as_str(),
                self.commons.resources()?,
                self.commons.consumed_refs(),
            ),
            (
                self.network.stack_name.as_str(),
                self.network.resources()?,
                self.network.consumed_refs(),
            ),
            (
                self.data_layer.stack_name.as_str(),
                self.data_layer.resources()?,
                self.data_layer.consumed_refs(),
            ),
            (
                self.app_layer.stack_name.as_str(),
                self.app_layer.resources()?,
                self.app_layer.consumed_refs(),
            ),
            (
                self.monitoring.stack_name.as_str(),
                self.monitoring.resources()?,
                self.monitoring.consumed_refs(),
            ),
        ])
    }

    /// Topological check over the explicit wiring: every output
    /// reference must point at a resource of the same or an earlier
    /// unit. The typed `emit` signatures already enforce this; the
    /// check keeps the ordering machine-verified on the finished graph.
    pub fn validate(&self) -> Result<()> {
        let units = self.units()?;
        for (index, (stack_name, _, consumed)) in units.iter().enumerate() {
            for reference in consumed {
                let producer = units
                    .iter()
                    .position(|(name, _, _)| *name == reference.stack)
                    .ok_or_else(|| AssemblyError::DependencyUnavailable {
                        stack: stack_name.to_string(),
                        upstream: reference.stack.clone(),
                        output: reference.placeholder(),
                    })?;
                let resource_exists = units[producer]
                    .1
                    .iter()
                    .any(|resource| resource.id == reference.resource);
                if producer > index || !resource_exists {
                    return Err(AssemblyError::DependencyUnavailable {
                        stack: stack_name.to_string(),
                        upstream: reference.stack.clone(),
                        output: reference.placeholder(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notejam_core::DeployContext;
    use notejam_network::NetworkError;

    fn environment(feature_id: Option<&str>) -> Environment {
        Environment::resolve(&DeployContext {
            environment_type: Some("dev".to_string()),
            feature_id: feature_id.map(str::to_string),
            profile: None,
        })
        .unwrap()
    }

    #[test]
    fn test_stacks_are_constructed_in_dependency_order() {
        let env = environment(None);
        let graph = Assembler::new(&env).assemble().unwrap();
        assert_eq!(
            graph.stack_names(),
            vec![
                "NoteJamCommons",
                "NoteJamNetwork",
                "NoteJamDataLayer",
                "NoteJamAppLayer",
                "NoteJamMonitoring"
            ]
        );
        assert_eq!(graph.stack_names().len(), ASSEMBLY_ORDER.len());
    }

    #[test]
    fn test_feature_environment_prefixes_every_stack() {
        let env = environment(Some("pr123"));
        let graph = Assembler::new(&env).assemble().unwrap();
        for name in graph.stack_names() {
            assert!(name.starts_with("pr123-"), "unscoped stack name: {name}");
        }
    }

    #[test]
    fn test_network_failure_aborts_assembly() {
        let env = environment(None);
        let err = Assembler::new(&env)
            .with_vpc_cidr("not-a-cidr")
            .assemble()
            .unwrap_err();
        assert!(matches!(
            err,
            AssemblyError::Network(NetworkError::InvalidCidr { .. })
        ));
    }

    #[test]
    fn test_capacity_failure_aborts_assembly() {
        let env = environment(None);
        let err = Assembler::new(&env)
            .with_vpc_cidr("10.0.0.0/23")
            .assemble()
            .unwrap_err();
        assert!(matches!(
            err,
            AssemblyError::Network(NetworkError::TierCapacity { .. })
        ));
    }

    #[test]
    fn test_assembly_is_idempotent() {
        let env = environment(Some("pr42"));
        let first = Assembler::new(&env).assemble().unwrap();
        let second = Assembler::new(&env).assemble().unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    #[test]
    fn test_graph_wiring_passes_topological_check() {
        let env = environment(None);
        let graph = Assembler::new(&env).assemble().unwrap();
        graph.validate().unwrap();
    }

    #[test]
    fn test_forward_reference_is_rejected() {
        let env = environment(None);
        let mut graph = Assembler::new(&env).assemble().unwrap();
        // point the database at a monitoring output: downstream of it
        graph.data_layer.db.subnets[0] =
            OutputRef::new("NoteJamMonitoring", "AlertTopic", "topic_arn");
        let err = graph.validate().unwrap_err();
        assert!(matches!(err, AssemblyError::DependencyUnavailable { .. }));
    }

    #[test]
    fn test_unknown_stack_reference_is_rejected() {
        let env = environment(None);
        let mut graph = Assembler::new(&env).assemble().unwrap();
        graph.monitoring.monitored_instance =
            OutputRef::new("SomeOtherStack", "Db", "instance_identifier");
        let err = graph.validate().unwrap_err();
        assert!(matches!(
            err,
            AssemblyError::DependencyUnavailable { ref upstream, .. } if upstream == "SomeOtherStack"
        ));
    }

    #[test]
    fn test_resources_are_flattened_in_order() {
        let env = environment(None);
        let graph = Assembler::new(&env).assemble().unwrap();
        let resources = graph.resources().unwrap();

        // 2 commons + 10 network + 2 data + 3 app + 2 monitoring
        assert_eq!(resources.len(), 19);
        let position = |key: &str| {
            resources
                .iter()
                .position(|r| r.key() == key)
                .unwrap_or_else(|| panic!("missing resource {key}"))
        };
        assert!(position("vpc:NoteJamVpc") < position("database-instance:Db"));
        assert!(position("database-instance:Db") < position("load-balanced-service:NoteJamService"));
        assert!(position("load-balanced-service:NoteJamService") < position("metric-alarm:DbCpuAlarm"));
    }
}
