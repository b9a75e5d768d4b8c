//! Nube — Rust-native cloud infrastructure patterns.
//!
//! Standardized network and compute constructs recorded into a declarative
//! resource graph. Patterns resolve caller overrides over environment
//! defaults, validate them up front, and delegate all creation to the
//! synchronous graph layer; materializing the graph is someone else's job.

pub mod core;
pub mod error;
pub mod patterns;
pub mod testing;

pub use error::{ConfigError, Error, SynthError};
pub use patterns::compute::{ComputeConfig, ComputeOptions, ComputePattern, InstanceOptions};
pub use patterns::network::{NetworkConfig, NetworkOptions, NetworkPattern};
pub use patterns::VpcPattern;
