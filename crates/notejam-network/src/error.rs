use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("invalid CIDR block '{cidr}': {reason}")]
    InvalidCidr { cidr: String, reason: String },

    #[error(
        "cannot carve {needed} /{prefix} subnets ({zones} zones x 3 tiers) out of '{cidr}': {available} available"
    )]
    TierCapacity {
        cidr: String,
        zones: usize,
        needed: usize,
        available: usize,
        prefix: u8,
    },
}

pub type Result<T> = std::result::Result<T, NetworkError>;
