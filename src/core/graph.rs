//! Declarative resource graph — nodes, attribute tokens, handles, outputs.
//!
//! Creation calls from the patterns record nodes here; nothing is
//! provisioned. Resource attributes that only exist after an apply step
//! (ids, addresses) are represented as reference tokens of the form
//! `${<construct path>.<Attr>}`, resolved later by whatever consumes the
//! synthesized template.

use super::tags::TagSet;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a recorded resource node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Vpc,
    SecurityGroup,
    Role,
    Instance,
    InterfaceEndpoint,
    GatewayEndpoint,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vpc => write!(f, "vpc"),
            Self::SecurityGroup => write!(f, "security_group"),
            Self::Role => write!(f, "role"),
            Self::Instance => write!(f, "instance"),
            Self::InterfaceEndpoint => write!(f, "interface_endpoint"),
            Self::GatewayEndpoint => write!(f, "gateway_endpoint"),
        }
    }
}

/// One node in the resource graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceNode {
    /// Resource kind
    #[serde(rename = "type")]
    pub kind: ResourceKind,

    /// Declarative properties, order-preserving
    pub properties: IndexMap<String, serde_json::Value>,

    /// Tags applied to the resource
    #[serde(default)]
    pub tags: TagSet,
}

impl ResourceNode {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            properties: IndexMap::new(),
            tags: TagSet::new(),
        }
    }

    pub fn with_property(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }
}

/// Build an attribute-reference token for a construct path.
pub fn attr_token(path: &str, attr: &str) -> String {
    format!("${{{}.{}}}", path, attr)
}

/// An exported stack output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    /// Value, usually an attribute token
    pub value: String,

    /// Human-readable description
    pub description: String,

    /// Cross-stack export name
    pub export_name: String,
}

// ============================================================================
// Handles
// ============================================================================
//
// Opaque references handed between patterns. Each carries its construct
// path plus the attribute tokens a consumer is allowed to reference.
// Handles never own configuration and are never mutated after creation.

/// Reference to a recorded virtual network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VpcHandle {
    path: String,
    cidr: super::cidr::Cidr,
}

impl VpcHandle {
    pub(crate) fn new(path: String, cidr: super::cidr::Cidr) -> Self {
        Self { path, cidr }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Token for the network identifier.
    pub fn vpc_id(&self) -> String {
        attr_token(&self.path, "VpcId")
    }

    /// Address block of the network.
    pub fn cidr(&self) -> &super::cidr::Cidr {
        &self.cidr
    }
}

/// Reference to a recorded security group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityGroupHandle {
    path: String,
}

impl SecurityGroupHandle {
    pub(crate) fn new(path: String) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Token for the security group identifier.
    pub fn security_group_id(&self) -> String {
        attr_token(&self.path, "SecurityGroupId")
    }
}

/// Reference to a recorded IAM role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleHandle {
    path: String,
}

impl RoleHandle {
    pub(crate) fn new(path: String) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Token for the role ARN.
    pub fn role_arn(&self) -> String {
        attr_token(&self.path, "RoleArn")
    }
}

/// Reference to a recorded compute instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceHandle {
    path: String,
}

impl InstanceHandle {
    pub(crate) fn new(path: String) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Token for the instance identifier.
    pub fn instance_id(&self) -> String {
        attr_token(&self.path, "InstanceId")
    }

    /// Token for the instance's private address.
    pub fn private_ip(&self) -> String {
        attr_token(&self.path, "PrivateIp")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_token_format() {
        assert_eq!(attr_token("Net/CustomVpc", "VpcId"), "${Net/CustomVpc.VpcId}");
    }

    #[test]
    fn test_node_with_property() {
        let node = ResourceNode::new(ResourceKind::Vpc)
            .with_property("cidr", "10.0.0.0/16")
            .with_property("max_azs", 3);
        assert_eq!(node.properties["cidr"], "10.0.0.0/16");
        assert_eq!(node.properties["max_azs"], 3);
    }

    #[test]
    fn test_vpc_handle_tokens() {
        let h = VpcHandle::new("Net/CustomVpc".to_string(), "10.0.0.0/16".parse().unwrap());
        assert_eq!(h.vpc_id(), "${Net/CustomVpc.VpcId}");
        assert_eq!(h.cidr().to_string(), "10.0.0.0/16");
    }

    #[test]
    fn test_instance_handle_tokens() {
        let h = InstanceHandle::new("Fleet/Web".to_string());
        assert_eq!(h.instance_id(), "${Fleet/Web.InstanceId}");
        assert_eq!(h.private_ip(), "${Fleet/Web.PrivateIp}");
    }

    #[test]
    fn test_resource_kind_display() {
        assert_eq!(ResourceKind::Vpc.to_string(), "vpc");
        assert_eq!(ResourceKind::InterfaceEndpoint.to_string(), "interface_endpoint");
    }
}
