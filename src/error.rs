//! Error types for pattern construction and synthesis.
//!
//! `ConfigError` covers everything caught while resolving caller overrides
//! into a concrete configuration — always raised before any graph mutation.
//! `SynthError` covers failures from the resource graph itself; patterns log
//! these with context and re-raise them unchanged.

use thiserror::Error;

/// Configuration validation failure. Fatal to construction; no partial
/// pattern object is left behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid CIDR format: {0}")]
    InvalidCidr(String),

    #[error("max_azs must be at least 1 (got {0})")]
    InvalidMaxAzs(i64),

    #[error("nat_gateways cannot be negative (got {0})")]
    InvalidNatGateways(i64),

    #[error("NAT gateways require internet access to be enabled")]
    NatRequiresInternet,

    #[error("invalid instance type: {0}")]
    InvalidInstanceType(String),

    #[error("invalid machine image: {0}")]
    InvalidMachineImage(String),

    #[error("invalid subnet type: {0}")]
    InvalidSubnetKind(String),

    #[error("invalid overrides document: {0}")]
    InvalidOverrides(String),
}

/// Resource graph failure during synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthError {
    #[error("construct id already exists in graph: {0}")]
    DuplicateId(String),
}

/// Umbrella error for pattern operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Synth(#[from] SynthError),
}
