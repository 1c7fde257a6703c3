//! Data layer stack: the managed PostgreSQL instance

use crate::error::Result;
use crate::network::NetworkOutputs;
use crate::spec::{OutputRef, ResourceSpec};
use ipnet::Ipv4Net;
use notejam_core::{db_settings, Environment};
use notejam_network::PORT_POSTGRES;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const STACK_BASE_NAME: &str = "NoteJamDataLayer";

const DB_ID: &str = "Db";
const DB_SECURITY_GROUP_ID: &str = "DbSg";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroupRule {
    pub description: String,
    pub protocol: String,
    pub port: u16,
    pub source_cidr: Ipv4Net,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroupSpec {
    pub security_group_name: String,
    pub ingress: Vec<SecurityGroupRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterGroupSpec {
    pub family: String,
    pub parameters: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseInstanceSpec {
    pub instance_identifier: String,
    pub engine: String,
    pub engine_version: String,
    pub instance_class: String,
    pub storage_type: String,
    pub allocated_storage_gib: u32,
    pub storage_encrypted: bool,
    pub master_username: String,
    pub master_password: String,
    pub database_name: String,
    pub port: u16,
    pub backup_retention_days: u32,
    pub multi_az: bool,
    pub log_retention_days: u32,
    pub auto_minor_version_upgrade: bool,
    pub allow_major_version_upgrade: bool,
    /// Development posture: instances are disposable.
    pub deletion_protection: bool,
    pub delete_automated_backups: bool,
    /// Database-tier subnets the instance is placed on.
    pub subnets: Vec<OutputRef>,
    pub security_groups: Vec<String>,
    pub parameter_group: ParameterGroupSpec,
}

/// Connection endpoint of the database instance. The address is only
/// known after provisioning; the port is fixed by the specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbEndpoint {
    pub address: OutputRef,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataLayerStack {
    pub stack_name: String,
    pub security_group: SecurityGroupSpec,
    pub db: DatabaseInstanceSpec,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayerOutputs {
    pub endpoint: DbEndpoint,
    pub instance: OutputRef,
    pub instance_identifier: String,
}

impl DataLayerStack {
    pub fn emit(environment: &Environment, network: &NetworkOutputs) -> Result<Self> {
        let stack_name = environment.scoped_name(STACK_BASE_NAME);
        let db = db_settings(environment.environment_type());

        let security_group = SecurityGroupSpec {
            security_group_name: DB_SECURITY_GROUP_ID.to_string(),
            ingress: vec![SecurityGroupRule {
                description: "Allow From VPC".to_string(),
                protocol: "tcp".to_string(),
                port: PORT_POSTGRES,
                source_cidr: network.vpc_cidr,
            }],
        };

        let mut parameters = BTreeMap::new();
        parameters.insert(
            "shared_preload_libraries".to_string(),
            "auto_explain,pg_stat_statements,pg_hint_plan,pgaudit".to_string(),
        );

        let db = DatabaseInstanceSpec {
            instance_identifier: DB_ID.to_string(),
            engine: "postgres".to_string(),
            engine_version: "11.5".to_string(),
            instance_class: "db.t2.micro".to_string(),
            storage_type: "gp2".to_string(),
            allocated_storage_gib: 20,
            storage_encrypted: false,
            master_username: db.db_user_name.to_string(),
            master_password: db.db_password.to_string(),
            database_name: db.db_name.to_string(),
            port: PORT_POSTGRES,
            backup_retention_days: 7,
            multi_az: true,
            log_retention_days: 5,
            auto_minor_version_upgrade: true,
            allow_major_version_upgrade: false,
            deletion_protection: false,
            delete_automated_backups: true,
            subnets: network
                .database_subnets
                .iter()
                .map(|subnet| subnet.subnet_id.clone())
                .collect(),
            security_groups: vec![DB_SECURITY_GROUP_ID.to_string()],
            parameter_group: ParameterGroupSpec {
                family: "postgres11".to_string(),
                parameters,
            },
        };

        Ok(Self {
            stack_name,
            security_group,
            db,
        })
    }

    pub fn outputs(&self) -> DataLayerOutputs {
        DataLayerOutputs {
            endpoint: DbEndpoint {
                address: OutputRef::new(&self.stack_name, DB_ID, "endpoint_address"),
                port: self.db.port,
            },
            instance: OutputRef::new(&self.stack_name, DB_ID, "instance_identifier"),
            instance_identifier: self.db.instance_identifier.clone(),
        }
    }

    pub fn resources(&self) -> Result<Vec<ResourceSpec>> {
        Ok(vec![
            ResourceSpec::new("security-group", DB_SECURITY_GROUP_ID, &self.security_group)?,
            ResourceSpec::new("database-instance", DB_ID, &self.db)?,
        ])
    }

    pub fn consumed_refs(&self) -> Vec<OutputRef> {
        self.db.subnets.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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

    fn network_outputs() -> NetworkOutputs {
        NetworkStack::emit(&environment(), VPC_CIDR, DEFAULT_MAX_AZS)
            .unwrap()
            .outputs()
    }

    #[test]
    fn test_db_is_placed_on_database_tier() {
        let stack = DataLayerStack::emit(&environment(), &network_outputs()).unwrap();
        assert_eq!(stack.db.subnets.len(), 2);
        assert!(stack
            .db
            .subnets
            .iter()
            .all(|s| s.resource.starts_with("DatabaseSubnet")));
    }

    #[test]
    fn test_db_settings_are_wired() {
        let stack = DataLayerStack::emit(&environment(), &network_outputs()).unwrap();
        assert_eq!(stack.db.database_name, "notejam");
        assert_eq!(stack.db.master_username, "notejam");
        assert_eq!(stack.db.engine, "postgres");
        assert_eq!(stack.db.engine_version, "11.5");
        assert_eq!(stack.db.port, 5432);
        assert!(stack.db.multi_az);
    }

    #[test]
    fn test_security_group_only_allows_vpc() {
        let stack = DataLayerStack::emit(&environment(), &network_outputs()).unwrap();
        assert_eq!(stack.security_group.ingress.len(), 1);
        let rule = &stack.security_group.ingress[0];
        assert_eq!(rule.port, 5432);
        assert_eq!(rule.source_cidr, VPC_CIDR.parse::<Ipv4Net>().unwrap());
    }

    #[test]
    fn test_endpoint_handle() {
        let stack = DataLayerStack::emit(&environment(), &network_outputs()).unwrap();
        let outputs = stack.outputs();
        assert_eq!(outputs.endpoint.port, 5432);
        assert_eq!(
            outputs.endpoint.address.placeholder(),
            "${NoteJamDataLayer/Db#endpoint_address}"
        );
        assert_eq!(outputs.instance_identifier, "Db");
    }
}
