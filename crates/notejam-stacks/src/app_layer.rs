//! App layer stack: container cluster, load-balanced service and edge
//! distribution

use crate::commons::CommonsOutputs;
use crate::data_layer::{DataLayerOutputs, DbEndpoint};
use crate::error::Result;
use crate::network::NetworkOutputs;
use crate::spec::{OutputRef, ResourceSpec};
use notejam_core::{db_settings, Environment};
use notejam_network::Tier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const STACK_BASE_NAME: &str = "NoteJamAppLayer";

const CLUSTER_ID: &str = "NoteJamCluster";
const SERVICE_ID: &str = "NoteJamService";
const DISTRIBUTION_ID: &str = "NoteJam";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterCapacitySpec {
    pub instance_type: String,
    pub min_capacity: u32,
    pub max_capacity: u32,
    pub subnet_group: String,
    pub subnets: Vec<OutputRef>,
    pub key_name: String,
    pub update_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSpec {
    pub cluster_name: String,
    pub capacity: ClusterCapacitySpec,
}

/// Image pulled from a Commons repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub repository_uri: OutputRef,
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub container_name: String,
    pub image: ImageRef,
    pub container_port: u16,
    pub environment: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckSpec {
    pub protocol: String,
    pub path: String,
    pub interval_secs: u64,
    pub timeout_secs: u64,
    pub healthy_threshold_count: u32,
    pub healthy_http_codes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancedServiceSpec {
    pub service_name: String,
    pub cluster: String,
    pub desired_count: u32,
    pub memory_limit_mib: u32,
    pub cpu: u32,
    pub container: ContainerSpec,
    /// Typed wiring behind the container's datasource URL.
    pub datasource: DbEndpoint,
    pub public_load_balancer: bool,
    pub protocol: String,
    pub stickiness_hours: u32,
    pub health_check: HealthCheckSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheBehaviorSpec {
    /// None marks the default behavior.
    pub path_pattern: Option<String>,
    pub compress: bool,
    pub allowed_methods: String,
    pub default_ttl_secs: u64,
    pub min_ttl_secs: u64,
    pub max_ttl_secs: u64,
    pub forward_query_string: bool,
    pub forward_cookies: bool,
    pub forward_headers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDistributionSpec {
    pub viewer_protocol_policy: String,
    pub origin_domain: OutputRef,
    pub origin_protocol_policy: String,
    pub behaviors: Vec<CacheBehaviorSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppLayerStack {
    pub stack_name: String,
    pub cluster: ClusterSpec,
    pub service: LoadBalancedServiceSpec,
    pub distribution: EdgeDistributionSpec,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppLayerOutputs {
    pub load_balancer_dns: OutputRef,
    pub distribution_domain: OutputRef,
}

impl AppLayerStack {
    pub fn emit(
        environment: &Environment,
        network: &NetworkOutputs,
        data_layer: &DataLayerOutputs,
        commons: &CommonsOutputs,
    ) -> Result<Self> {
        let stack_name = environment.scoped_name(STACK_BASE_NAME);
        let db = db_settings(environment.environment_type());

        let cluster = ClusterSpec {
            cluster_name: CLUSTER_ID.to_string(),
            capacity: ClusterCapacitySpec {
                instance_type: "t3.micro".to_string(),
                min_capacity: 2,
                max_capacity: 4,
                subnet_group: Tier::Private.group_name().to_string(),
                subnets: network
                    .private_subnets
                    .iter()
                    .map(|subnet| subnet.subnet_id.clone())
                    .collect(),
                key_name: "ECSNodes".to_string(),
                update_type: "rolling_update".to_string(),
            },
        };

        let mut container_env = BTreeMap::new();
        container_env.insert(
            "SPRING_DATASOURCE_URL".to_string(),
            format!(
                "jdbc:postgresql://{}:{}/{}",
                data_layer.endpoint.address.placeholder(),
                data_layer.endpoint.port,
                db.db_name
            ),
        );
        container_env.insert(
            "SPRING_DATASOURCE_USERNAME".to_string(),
            db.db_user_name.to_string(),
        );
        container_env.insert(
            "SPRING_DATASOURCE_PASSWORD".to_string(),
            db.db_password.to_string(),
        );

        let service = LoadBalancedServiceSpec {
            service_name: SERVICE_ID.to_string(),
            cluster: CLUSTER_ID.to_string(),
            desired_count: 2,
            memory_limit_mib: 460,
            cpu: 1024,
            container: ContainerSpec {
                container_name: "NoteJamApplicationContainer".to_string(),
                image: ImageRef {
                    repository_uri: commons.app_repo.uri.clone(),
                    tag: "latest".to_string(),
                },
                container_port: 8080,
                environment: container_env,
            },
            datasource: data_layer.endpoint.clone(),
            public_load_balancer: true,
            protocol: "http".to_string(),
            stickiness_hours: 24,
            health_check: HealthCheckSpec {
                protocol: "http".to_string(),
                path: "/signin".to_string(),
                interval_secs: 10,
                timeout_secs: 5,
                healthy_threshold_count: 2,
                healthy_http_codes: "200".to_string(),
            },
        };

        let distribution = EdgeDistributionSpec {
            viewer_protocol_policy: "redirect_to_https".to_string(),
            origin_domain: OutputRef::new(&stack_name, SERVICE_ID, "load_balancer_dns_name"),
            origin_protocol_policy: "http_only".to_string(),
            behaviors: vec![
                CacheBehaviorSpec {
                    path_pattern: Some("/css/*".to_string()),
                    compress: true,
                    allowed_methods: "get_head".to_string(),
                    default_ttl_secs: 86_400,
                    min_ttl_secs: 86_400,
                    max_ttl_secs: 86_400,
                    forward_query_string: false,
                    forward_cookies: false,
                    forward_headers: Vec::new(),
                },
                // default behavior: the app is fully dynamic, never cache
                CacheBehaviorSpec {
                    path_pattern: None,
                    compress: false,
                    allowed_methods: "all".to_string(),
                    default_ttl_secs: 0,
                    min_ttl_secs: 0,
                    max_ttl_secs: 0,
                    forward_query_string: true,
                    forward_cookies: true,
                    forward_headers: vec!["Host".to_string()],
                },
            ],
        };

        Ok(Self {
            stack_name,
            cluster,
            service,
            distribution,
        })
    }

    pub fn outputs(&self) -> AppLayerOutputs {
        AppLayerOutputs {
            load_balancer_dns: OutputRef::new(
                &self.stack_name,
                SERVICE_ID,
                "load_balancer_dns_name",
            ),
            distribution_domain: OutputRef::new(&self.stack_name, DISTRIBUTION_ID, "domain_name"),
        }
    }

    pub fn resources(&self) -> Result<Vec<ResourceSpec>> {
        Ok(vec![
            ResourceSpec::new("container-cluster", CLUSTER_ID, &self.cluster)?,
            ResourceSpec::new("load-balanced-service", SERVICE_ID, &self.service)?,
            ResourceSpec::new("edge-distribution", DISTRIBUTION_ID, &self.distribution)?,
        ])
    }

    pub fn consumed_refs(&self) -> Vec<OutputRef> {
        let mut refs = self.cluster.capacity.subnets.clone();
        refs.push(self.service.container.image.repository_uri.clone());
        refs.push(self.service.datasource.address.clone());
        refs.push(self.distribution.origin_domain.clone());
        refs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commons::CommonsStack;
    use crate::data_layer::DataLayerStack;
    use crate::network::NetworkStack;
    use notejam_core::DeployContext;
    use notejam_network::{DEFAULT_MAX_AZS, VPC_CIDR};

    fn environment() -> Environment {
        Environment::resolve(&DeployContext {
            environment_type: Some("dev".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    fn app_layer() -> AppLayerStack {
        let env = environment();
        let commons = CommonsStack::emit(&env);
        let network = NetworkStack::emit(&env, VPC_CIDR, DEFAULT_MAX_AZS).unwrap();
        let data_layer = DataLayerStack::emit(&env, &network.outputs()).unwrap();
        AppLayerStack::emit(
            &env,
            &network.outputs(),
            &data_layer.outputs(),
            &commons.outputs(),
        )
        .unwrap()
    }

    #[test]
    fn test_cluster_runs_on_private_tier() {
        let stack = app_layer();
        assert_eq!(stack.cluster.capacity.subnet_group, "Private");
        assert_eq!(stack.cluster.capacity.subnets.len(), 2);
        assert!(stack
            .cluster
            .capacity
            .subnets
            .iter()
            .all(|s| s.resource.starts_with("PrivateSubnet")));
    }

    #[test]
    fn test_datasource_url_references_db_endpoint() {
        let stack = app_layer();
        let url = &stack.service.container.environment["SPRING_DATASOURCE_URL"];
        assert_eq!(
            url,
            "jdbc:postgresql://${NoteJamDataLayer/Db#endpoint_address}:5432/notejam"
        );
        assert_eq!(
            stack.service.container.environment["SPRING_DATASOURCE_USERNAME"],
            "notejam"
        );
    }

    #[test]
    fn test_image_comes_from_commons() {
        let stack = app_layer();
        let image = &stack.service.container.image;
        assert_eq!(image.tag, "latest");
        assert_eq!(image.repository_uri.stack, "NoteJamCommons");
        assert_eq!(image.repository_uri.resource, "NoteJamRepo");
    }

    #[test]
    fn test_distribution_fronts_the_load_balancer() {
        let stack = app_layer();
        assert_eq!(stack.distribution.viewer_protocol_policy, "redirect_to_https");
        assert_eq!(stack.distribution.origin_protocol_policy, "http_only");
        assert_eq!(
            stack.distribution.origin_domain,
            stack.outputs().load_balancer_dns
        );

        // static assets cached for a day, everything else uncached
        assert_eq!(stack.distribution.behaviors.len(), 2);
        let css = &stack.distribution.behaviors[0];
        assert_eq!(css.path_pattern.as_deref(), Some("/css/*"));
        assert_eq!(css.default_ttl_secs, 86_400);
        let default = &stack.distribution.behaviors[1];
        assert_eq!(default.path_pattern, None);
        assert_eq!(default.max_ttl_secs, 0);
        assert!(default.forward_cookies);
        assert_eq!(default.forward_headers, vec!["Host".to_string()]);
    }

    #[test]
    fn test_health_check_targets_signin() {
        let stack = app_layer();
        let health = &stack.service.health_check;
        assert_eq!(health.path, "/signin");
        assert_eq!(health.interval_secs, 10);
        assert_eq!(health.timeout_secs, 5);
        assert_eq!(health.healthy_threshold_count, 2);
    }
}
