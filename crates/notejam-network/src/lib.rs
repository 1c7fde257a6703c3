//! NoteJam network topology compiler
//!
//! Partitions a VPC address block into public / private / database
//! subnet tiers and compiles each tier's declarative policy table into
//! an ordered, first-match allow list of traffic-filter entries.

pub mod error;
pub mod policy;
pub mod topology;

pub use error::{NetworkError, Result};
pub use policy::{
    AclEntry, Direction, PortRange, Protocol, RuleAction, TrafficPolicy, EPHEMERAL_PORTS,
    PORT_HTTP, PORT_HTTPS, PORT_POSTGRES, PORT_SSH,
};
pub use topology::{NetworkTopology, SubnetSpec, Tier, DEFAULT_MAX_AZS, VPC_CIDR};
