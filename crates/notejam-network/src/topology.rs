//! VPC partitioning into subnet tiers

use crate::error::{NetworkError, Result};
use crate::policy::TrafficPolicy;
use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Address block the whole topology lives in.
pub const VPC_CIDR: &str = "10.0.0.0/16";

/// Availability zones each tier spans by default.
pub const DEFAULT_MAX_AZS: usize = 2;

/// Prefix length of every tier subnet.
const SUBNET_PREFIX_LEN: u8 = 24;

/// NAT gateways homed in the public subnet group.
const NAT_GATEWAYS: usize = 1;

/// Subnet tier. Ordering here is the allocation order within the VPC
/// block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Public,
    Private,
    Database,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Public, Tier::Private, Tier::Database];

    /// Subnet group name, as referenced by downstream placement.
    pub fn group_name(&self) -> &'static str {
        match self {
            Tier::Public => "Public",
            Tier::Private => "Private",
            Tier::Database => "Database",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.group_name())
    }
}

/// One subnet: a tier slice in a single availability zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetSpec {
    pub tier: Tier,
    /// Zero-based availability zone index within the target region.
    pub zone: usize,
    pub cidr: Ipv4Net,
}

/// A compiled network topology: the VPC block, its per-tier per-zone
/// subnets, and one traffic policy per tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkTopology {
    pub vpc_cidr: Ipv4Net,
    pub max_azs: usize,
    pub nat_gateways: usize,
    pub subnets: Vec<SubnetSpec>,
    /// One policy per tier, in [`Tier::ALL`] order.
    pub policies: Vec<TrafficPolicy>,
}

impl NetworkTopology {
    /// Partition `cidr` into `/24` subnets, `max_azs` per tier, and
    /// compile each tier's traffic policy against the block.
    pub fn compile(cidr: &str, max_azs: usize) -> Result<Self> {
        let vpc_cidr: Ipv4Net = cidr.parse().map_err(|e: ipnet::AddrParseError| {
            NetworkError::InvalidCidr {
                cidr: cidr.to_string(),
                reason: e.to_string(),
            }
        })?;

        let needed = Tier::ALL.len() * max_azs;
        let blocks: Vec<Ipv4Net> = match vpc_cidr.subnets(SUBNET_PREFIX_LEN) {
            Ok(subnets) => subnets.take(needed).collect(),
            // block narrower than the subnet mask: nothing fits
            Err(_) => Vec::new(),
        };
        if blocks.len() < needed {
            return Err(NetworkError::TierCapacity {
                cidr: cidr.to_string(),
                zones: max_azs,
                needed,
                available: blocks.len(),
                prefix: SUBNET_PREFIX_LEN,
            });
        }

        let mut subnets = Vec::with_capacity(needed);
        for (tier_index, tier) in Tier::ALL.iter().enumerate() {
            for zone in 0..max_azs {
                subnets.push(SubnetSpec {
                    tier: *tier,
                    zone,
                    cidr: blocks[tier_index * max_azs + zone],
                });
            }
        }

        let policies = Tier::ALL
            .iter()
            .map(|tier| TrafficPolicy::compile(*tier, vpc_cidr))
            .collect();

        tracing::debug!(vpc = %vpc_cidr, subnets = subnets.len(), "compiled network topology");

        Ok(Self {
            vpc_cidr,
            max_azs,
            nat_gateways: NAT_GATEWAYS,
            subnets,
            policies,
        })
    }

    /// Subnets belonging to one tier, in zone order.
    pub fn tier_subnets(&self, tier: Tier) -> Vec<&SubnetSpec> {
        self.subnets.iter().filter(|s| s.tier == tier).collect()
    }

    /// The compiled policy for one tier.
    pub fn policy(&self, tier: Tier) -> Option<&TrafficPolicy> {
        self.policies.iter().find(|p| p.tier == tier)
    }
}
