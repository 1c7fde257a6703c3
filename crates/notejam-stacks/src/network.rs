//! Network stack: VPC, subnet tiers and compiled traffic policies

use crate::error::Result;
use crate::spec::{OutputRef, ResourceSpec};
use ipnet::Ipv4Net;
use notejam_core::Environment;
use notejam_network::{NetworkTopology, SubnetSpec, Tier};
use serde::{Deserialize, Serialize};

pub const STACK_BASE_NAME: &str = "NoteJamNetwork";

const VPC_ID: &str = "NoteJamVpc";

/// Handle to one provisioned subnet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetHandle {
    pub tier: Tier,
    pub zone: usize,
    pub cidr: Ipv4Net,
    pub subnet_id: OutputRef,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkStack {
    pub stack_name: String,
    pub topology: NetworkTopology,
}

/// Upstream handles the network stack exposes to later units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkOutputs {
    pub vpc_cidr: Ipv4Net,
    pub public_subnets: Vec<SubnetHandle>,
    pub private_subnets: Vec<SubnetHandle>,
    pub database_subnets: Vec<SubnetHandle>,
}

impl NetworkStack {
    pub fn emit(environment: &Environment, vpc_cidr: &str, max_azs: usize) -> Result<Self> {
        Ok(Self {
            stack_name: environment.scoped_name(STACK_BASE_NAME),
            topology: NetworkTopology::compile(vpc_cidr, max_azs)?,
        })
    }

    fn subnet_id(subnet: &SubnetSpec) -> String {
        format!("{}Subnet{}", subnet.tier.group_name(), subnet.zone + 1)
    }

    fn subnet_handles(&self, tier: Tier) -> Vec<SubnetHandle> {
        self.topology
            .tier_subnets(tier)
            .into_iter()
            .map(|subnet| SubnetHandle {
                tier: subnet.tier,
                zone: subnet.zone,
                cidr: subnet.cidr,
                subnet_id: OutputRef::new(&self.stack_name, Self::subnet_id(subnet), "subnet_id"),
            })
            .collect()
    }

    pub fn outputs(&self) -> NetworkOutputs {
        NetworkOutputs {
            vpc_cidr: self.topology.vpc_cidr,
            public_subnets: self.subnet_handles(Tier::Public),
            private_subnets: self.subnet_handles(Tier::Private),
            database_subnets: self.subnet_handles(Tier::Database),
        }
    }

    pub fn resources(&self) -> Result<Vec<ResourceSpec>> {
        let mut resources = vec![ResourceSpec::new(
            "vpc",
            VPC_ID,
            &serde_json::json!({
                "cidr": self.topology.vpc_cidr,
                "max_azs": self.topology.max_azs,
                "nat_gateways": self.topology.nat_gateways,
                "nat_gateway_subnet_group": Tier::Public.group_name(),
            }),
        )?];

        for subnet in &self.topology.subnets {
            resources.push(ResourceSpec::new("subnet", Self::subnet_id(subnet), subnet)?);
        }

        for policy in &self.topology.policies {
            resources.push(ResourceSpec::new(
                "network-acl",
                format!("{}ACL", policy.tier.group_name()),
                policy,
            )?);
        }

        Ok(resources)
    }

    pub fn consumed_refs(&self) -> Vec<OutputRef> {
        Vec::new()
    }
}
