//! Reusable infrastructure patterns — standardized network and compute
//! constructs over the core resource graph.

pub mod compute;
pub mod network;

use crate::core::graph::{RoleHandle, SecurityGroupHandle, VpcHandle};

/// Capability surface a network pattern exposes for composition.
///
/// Anything exposing these three read-only accessors can back a compute
/// pattern, independent of concrete type. Handles are never mutated and
/// never carry network configuration.
pub trait VpcPattern {
    /// The virtual network handle.
    fn vpc(&self) -> &VpcHandle;

    /// The IAM role compute instances assume.
    fn instance_role(&self) -> &RoleHandle;

    /// The security group compute instances attach to.
    fn instance_security_group(&self) -> &SecurityGroupHandle;
}
