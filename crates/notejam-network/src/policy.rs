//! Traffic policy compilation
//!
//! Each tier's policy is a static table of allow statements in a fixed
//! declaration order. Evaluation is first-match on ascending rule
//! numbers, so the declaration order is the tie-break: a VPC-scoped
//! statement must never sit behind a broader any-address statement for
//! the same traffic. Only allow entries are emitted; traffic matching
//! no entry falls through to the evaluator's implicit default deny.

use crate::topology::Tier;
use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Gap between consecutive generated rule numbers, leaving room for
/// hand-inserted rules in between.
const RULE_NUMBER_STRIDE: u16 = 100;

pub const PORT_SSH: u16 = 22;
pub const PORT_HTTP: u16 = 80;
pub const PORT_HTTPS: u16 = 443;
pub const PORT_POSTGRES: u16 = 5432;

/// Ephemeral return-traffic port range.
pub const EPHEMERAL_PORTS: PortRange = PortRange {
    from: 1024,
    to: 65535,
};

const ANY_IPV4: Ipv4Net = Ipv4Net::new_assert(Ipv4Addr::UNSPECIFIED, 0);

/// Traffic direction relative to the tier's subnets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Ingress,
    Egress,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Ingress, Direction::Egress];
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Ingress => write!(f, "ingress"),
            Direction::Egress => write!(f, "egress"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    Tcp,
    Icmp,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    Allow,
    Deny,
}

/// Inclusive TCP port range; a single port is `from == to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRange {
    pub from: u16,
    pub to: u16,
}

impl PortRange {
    pub const fn single(port: u16) -> Self {
        Self {
            from: port,
            to: port,
        }
    }
}

/// Address scope of a policy statement, resolved against the VPC block
/// when the policy is compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Any,
    Vpc,
}

/// One row of the static policy table, before numbering.
struct Statement {
    name: &'static str,
    direction: Direction,
    protocol: Protocol,
    ports: Option<PortRange>,
    scope: Scope,
}

impl Statement {
    const fn tcp(name: &'static str, direction: Direction, ports: PortRange, scope: Scope) -> Self {
        Self {
            name,
            direction,
            protocol: Protocol::Tcp,
            ports: Some(ports),
            scope,
        }
    }

    const fn icmp(name: &'static str, direction: Direction, scope: Scope) -> Self {
        Self {
            name,
            direction,
            protocol: Protocol::Icmp,
            ports: None,
            scope,
        }
    }
}

/// A compiled, numbered traffic-filter entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclEntry {
    pub rule_number: u16,
    pub name: String,
    pub direction: Direction,
    pub protocol: Protocol,
    pub port_range: Option<PortRange>,
    /// Source for ingress entries, destination for egress entries.
    pub cidr: Ipv4Net,
    pub action: RuleAction,
}

/// The ordered first-match rule list governing one tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficPolicy {
    pub tier: Tier,
    pub entries: Vec<AclEntry>,
}

impl TrafficPolicy {
    /// Compile the tier's policy table against a concrete VPC block.
    /// Rule numbers ascend by 100 per direction in declaration order.
    pub fn compile(tier: Tier, vpc_cidr: Ipv4Net) -> Self {
        let mut entries = Vec::new();
        let mut next_ingress = RULE_NUMBER_STRIDE;
        let mut next_egress = RULE_NUMBER_STRIDE;

        for statement in statements(tier) {
            let rule_number = match statement.direction {
                Direction::Ingress => {
                    let n = next_ingress;
                    next_ingress += RULE_NUMBER_STRIDE;
                    n
                }
                Direction::Egress => {
                    let n = next_egress;
                    next_egress += RULE_NUMBER_STRIDE;
                    n
                }
            };

            entries.push(AclEntry {
                rule_number,
                name: statement.name.to_string(),
                direction: statement.direction,
                protocol: statement.protocol,
                port_range: statement.ports,
                cidr: match statement.scope {
                    Scope::Any => ANY_IPV4,
                    Scope::Vpc => vpc_cidr,
                },
                action: RuleAction::Allow,
            });
        }

        tracing::debug!(tier = %tier, entries = entries.len(), "compiled traffic policy");
        Self { tier, entries }
    }

    /// Entries for one direction, in evaluation order.
    pub fn rules(&self, direction: Direction) -> impl Iterator<Item = &AclEntry> {
        self.entries.iter().filter(move |e| e.direction == direction)
    }
}

/// The static policy tables. Declaration order is load-bearing: it is
/// the evaluation order after numbering.
fn statements(tier: Tier) -> &'static [Statement] {
    match tier {
        Tier::Public => PUBLIC_STATEMENTS,
        Tier::Private => PRIVATE_STATEMENTS,
        Tier::Database => DATABASE_STATEMENTS,
    }
}

const PUBLIC_STATEMENTS: &[Statement] = &[
    // ingress
    Statement::icmp("ICMP", Direction::Ingress, Scope::Any),
    Statement::tcp("HTTP", Direction::Ingress, PortRange::single(PORT_HTTP), Scope::Any),
    Statement::tcp("HTTPS", Direction::Ingress, PortRange::single(PORT_HTTPS), Scope::Any),
    Statement::tcp("Ephemeral", Direction::Ingress, EPHEMERAL_PORTS, Scope::Any),
    // egress
    Statement::icmp("ICMP", Direction::Egress, Scope::Any),
    Statement::tcp("HTTP", Direction::Egress, PortRange::single(PORT_HTTP), Scope::Any),
    Statement::tcp("HTTPS", Direction::Egress, PortRange::single(PORT_HTTPS), Scope::Any),
    Statement::tcp("Ephemeral", Direction::Egress, EPHEMERAL_PORTS, Scope::Any),
    Statement::tcp(
        "Postgres",
        Direction::Egress,
        PortRange::single(PORT_POSTGRES),
        Scope::Vpc,
    ),
];

const PRIVATE_STATEMENTS: &[Statement] = &[
    // ingress
    Statement::tcp("SSH", Direction::Ingress, PortRange::single(PORT_SSH), Scope::Any),
    Statement::icmp("ICMP", Direction::Ingress, Scope::Vpc),
    Statement::tcp("HTTP", Direction::Ingress, PortRange::single(PORT_HTTP), Scope::Vpc),
    Statement::tcp("HTTPS", Direction::Ingress, PortRange::single(PORT_HTTPS), Scope::Vpc),
    Statement::tcp("Ephemeral", Direction::Ingress, EPHEMERAL_PORTS, Scope::Any),
    // egress
    // HTTP/HTTPS egress is any-destination while ingress is VPC-scoped:
    // outbound internet access goes through the NAT gateway.
    Statement::icmp("ICMP", Direction::Egress, Scope::Vpc),
    Statement::tcp("HTTP", Direction::Egress, PortRange::single(PORT_HTTP), Scope::Any),
    Statement::tcp("HTTPS", Direction::Egress, PortRange::single(PORT_HTTPS), Scope::Any),
    Statement::tcp("Ephemeral", Direction::Egress, EPHEMERAL_PORTS, Scope::Any),
    Statement::tcp(
        "Postgres",
        Direction::Egress,
        PortRange::single(PORT_POSTGRES),
        Scope::Vpc,
    ),
];

const DATABASE_STATEMENTS: &[Statement] = &[
    // ingress
    Statement::tcp(
        "Postgres",
        Direction::Ingress,
        PortRange::single(PORT_POSTGRES),
        Scope::Vpc,
    ),
    Statement::icmp("ICMP", Direction::Ingress, Scope::Vpc),
    Statement::tcp("Ephemeral", Direction::Ingress, EPHEMERAL_PORTS, Scope::Vpc),
    // egress
    Statement::icmp("ICMP", Direction::Egress, Scope::Vpc),
    Statement::tcp("Ephemeral", Direction::Egress, EPHEMERAL_PORTS, Scope::Vpc),
];
