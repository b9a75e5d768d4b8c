//! Network pattern — a virtual network with standardized defaults.
//!
//! Resolves caller overrides over built-in defaults into a `NetworkConfig`,
//! derives the subnet topology from the internet-access flag, and records
//! the network, its managed-service endpoints, an instance security group,
//! and an instance role into the deployment unit's resource graph.

use super::VpcPattern;
use crate::core::app::Stack;
use crate::core::cidr::Cidr;
use crate::core::graph::{
    Output, ResourceKind, ResourceNode, RoleHandle, SecurityGroupHandle, VpcHandle,
};
use crate::core::tags::{merge_tags, TagSet};
use crate::core::types::{SubnetKind, SubnetSpec};
use crate::error::{ConfigError, Error};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

const DEFAULT_CIDR: &str = "10.0.0.0/16";
const DEFAULT_MAX_AZS: i64 = 3;
const DEFAULT_NAT_GATEWAYS: i64 = 1;
const SUBNET_PREFIX_LENGTH: u8 = 24;

/// Interface endpoints created for Session Manager access, in creation
/// order: (construct name, service short name).
const SSM_INTERFACE_ENDPOINTS: &[(&str, &str)] = &[
    ("ssm", "ssm"),
    ("ssmmessages", "ssmmessages"),
    ("ec2messages", "ec2messages"),
    ("ec2", "ec2"),
    ("ssmincidents", "ssm-incidents"),
];

/// Caller-supplied overrides. Every field is optional; unrecognized keys
/// in a JSON overrides document are ignored, not rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkOptions {
    /// Address block, e.g. "10.0.0.0/16"
    #[serde(default, alias = "address_block")]
    pub cidr: Option<String>,

    /// Maximum number of availability zones
    #[serde(default)]
    pub max_azs: Option<i64>,

    /// Whether the network has internet access
    #[serde(default)]
    pub enable_internet: Option<bool>,

    /// Number of NAT gateways
    #[serde(default)]
    pub nat_gateways: Option<i64>,

    /// Whether to create Session Manager endpoints
    #[serde(default)]
    pub enable_ssm: Option<bool>,

    /// Whether to allow EC2 Instance Connect ingress
    #[serde(default)]
    pub enable_ec2_connect: Option<bool>,

    /// Pattern-level tags applied to every created resource
    #[serde(default)]
    pub tags: TagSet,
}

impl NetworkOptions {
    /// Deserialize overrides from a JSON document, ignoring unknown keys.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        serde_json::from_value(value).map_err(|e| ConfigError::InvalidOverrides(e.to_string()))
    }
}

/// Fully resolved network configuration. Computed once at construction,
/// immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub cidr: Cidr,
    pub max_azs: u32,
    pub enable_internet: bool,
    pub nat_gateways: u32,
    pub enable_ssm: bool,
    pub enable_ec2_connect: bool,
}

impl NetworkConfig {
    /// Resolve caller overrides over built-in defaults.
    ///
    /// Pure: identical overrides always yield an identical config.
    /// NAT gateways default to 1 with internet access and are forced to 0
    /// without it; an explicit non-zero NAT count with internet disabled
    /// is a configuration error rather than a silent override.
    pub fn resolve(options: &NetworkOptions) -> Result<Self, ConfigError> {
        let cidr: Cidr = options.cidr.as_deref().unwrap_or(DEFAULT_CIDR).parse()?;

        let max_azs = options.max_azs.unwrap_or(DEFAULT_MAX_AZS);
        if max_azs < 1 {
            return Err(ConfigError::InvalidMaxAzs(max_azs));
        }
        let max_azs = u32::try_from(max_azs).map_err(|_| ConfigError::InvalidMaxAzs(max_azs))?;

        let enable_internet = options.enable_internet.unwrap_or(true);

        let nat_gateways = match options.nat_gateways {
            Some(n) if n < 0 => return Err(ConfigError::InvalidNatGateways(n)),
            Some(n) if n > 0 && !enable_internet => {
                return Err(ConfigError::NatRequiresInternet)
            }
            Some(n) => n,
            None if enable_internet => DEFAULT_NAT_GATEWAYS,
            None => 0,
        };
        let nat_gateways =
            u32::try_from(nat_gateways).map_err(|_| ConfigError::InvalidNatGateways(nat_gateways))?;

        Ok(Self {
            cidr,
            max_azs,
            enable_internet,
            nat_gateways,
            enable_ssm: options.enable_ssm.unwrap_or(true),
            enable_ec2_connect: options.enable_ec2_connect.unwrap_or(true),
        })
    }

    /// Subnet topology derived from the internet-access flag.
    pub fn subnet_topology(&self) -> Vec<SubnetSpec> {
        if self.enable_internet {
            vec![
                SubnetSpec {
                    name: "Public".to_string(),
                    kind: SubnetKind::Public,
                    prefix_length: SUBNET_PREFIX_LENGTH,
                },
                SubnetSpec {
                    name: "Private".to_string(),
                    kind: SubnetKind::PrivateWithEgress,
                    prefix_length: SUBNET_PREFIX_LENGTH,
                },
            ]
        } else {
            vec![SubnetSpec {
                name: "Isolated".to_string(),
                kind: SubnetKind::PrivateIsolated,
                prefix_length: SUBNET_PREFIX_LENGTH,
            }]
        }
    }
}

/// A standardized virtual network with instance security group and role.
#[derive(Debug, Clone)]
pub struct NetworkPattern {
    id: String,
    environment: String,
    config: NetworkConfig,
    subnets: Vec<SubnetSpec>,
    vpc: VpcHandle,
    instance_security_group: SecurityGroupHandle,
    instance_role: RoleHandle,
    endpoint_security_group: Option<SecurityGroupHandle>,
}

impl NetworkPattern {
    /// Create the network pattern, recording every resource into `stack`.
    ///
    /// Fails with `ConfigError` before any graph mutation when the
    /// overrides are invalid; synthesis failures are logged and re-raised
    /// unchanged.
    pub fn new(stack: &mut Stack, id: &str, options: NetworkOptions) -> Result<Self, Error> {
        let environment = stack
            .try_get_context("environment")
            .unwrap_or("development")
            .to_string();
        let project = stack
            .try_get_context("project")
            .unwrap_or("default")
            .to_string();

        let config = NetworkConfig::resolve(&options)?;
        let subnets = config.subnet_topology();

        let vpc = Self::create_vpc(stack, id, &config, &subnets)?;

        let endpoint_security_group = if config.enable_ssm {
            Some(Self::create_ssm_endpoints(stack, id, &vpc)?)
        } else {
            None
        };

        let instance_security_group =
            Self::create_instance_security_group(stack, id, &config, &vpc)?;
        let instance_role = Self::create_instance_role(stack, id, &config)?;

        let pattern = Self {
            id: id.to_string(),
            environment,
            config,
            subnets,
            vpc,
            instance_security_group,
            instance_role,
            endpoint_security_group,
        };

        pattern.add_tags(stack, &options.tags, &project);
        pattern.create_outputs(stack)?;

        Ok(pattern)
    }

    fn create_vpc(
        stack: &mut Stack,
        id: &str,
        config: &NetworkConfig,
        subnets: &[SubnetSpec],
    ) -> Result<VpcHandle, Error> {
        let path = format!("{}/CustomVpc", id);
        info!(cidr = %config.cidr, max_azs = config.max_azs, "creating VPC");

        let node = ResourceNode::new(ResourceKind::Vpc)
            .with_property("cidr", config.cidr.to_string())
            .with_property("max_azs", config.max_azs)
            .with_property("nat_gateways", config.nat_gateways)
            .with_property("subnet_configuration", serde_json::json!(subnets));

        stack.add_resource(&path, node).map_err(|e| {
            error!(vpc = %path, error = %e, "failed to create VPC");
            e
        })?;

        info!(vpc = %path, "successfully created VPC");
        Ok(VpcHandle::new(path, config.cidr.clone()))
    }

    /// Endpoints required for Session Manager: a dedicated security group
    /// admitting HTTPS from the network's own address range, interface
    /// endpoints bound to it, and an object-storage gateway endpoint.
    fn create_ssm_endpoints(
        stack: &mut Stack,
        id: &str,
        vpc: &VpcHandle,
    ) -> Result<SecurityGroupHandle, Error> {
        let sg_path = format!("{}/EndpointSecurityGroup", id);
        let node = ResourceNode::new(ResourceKind::SecurityGroup)
            .with_property("vpc", vpc.vpc_id())
            .with_property("description", "Security group for VPC Endpoints")
            .with_property("allow_all_outbound", true)
            .with_property(
                "ingress",
                serde_json::json!([{
                    "peer": vpc.cidr().to_string(),
                    "protocol": "tcp",
                    "port": 443,
                    "description": "Allow HTTPS from VPC",
                }]),
            );
        stack.add_resource(&sg_path, node).map_err(|e| {
            error!(error = %e, "failed to create SSM endpoints");
            e
        })?;
        let sg = SecurityGroupHandle::new(sg_path);

        for (name, service) in SSM_INTERFACE_ENDPOINTS {
            let path = format!("{}/{}Endpoint", id, name);
            let node = ResourceNode::new(ResourceKind::InterfaceEndpoint)
                .with_property("vpc", vpc.vpc_id())
                .with_property(
                    "service",
                    format!("com.amazonaws.{}.{}", stack.region(), service),
                )
                .with_property(
                    "security_groups",
                    serde_json::json!([sg.security_group_id()]),
                )
                .with_property("private_dns_enabled", true);
            stack.add_resource(&path, node).map_err(|e| {
                error!(endpoint = %path, error = %e, "failed to create SSM endpoints");
                e
            })?;
        }

        let s3_path = format!("{}/s3Endpoint", id);
        let node = ResourceNode::new(ResourceKind::GatewayEndpoint)
            .with_property("vpc", vpc.vpc_id())
            .with_property("service", "s3");
        stack.add_resource(&s3_path, node).map_err(|e| {
            error!(endpoint = %s3_path, error = %e, "failed to create SSM endpoints");
            e
        })?;

        Ok(sg)
    }

    fn create_instance_security_group(
        stack: &mut Stack,
        id: &str,
        config: &NetworkConfig,
        vpc: &VpcHandle,
    ) -> Result<SecurityGroupHandle, Error> {
        let path = format!("{}/InstanceSecurityGroup", id);
        let mut node = ResourceNode::new(ResourceKind::SecurityGroup)
            .with_property("vpc", vpc.vpc_id())
            .with_property("description", "Security group for EC2 instances")
            .with_property("allow_all_outbound", true);

        if config.enable_ec2_connect {
            // Ingress from the regional EC2 Instance Connect service prefix.
            node = node.with_property(
                "ingress",
                serde_json::json!([{
                    "peer": format!("com.amazonaws.{}.ec2-instance-connect", stack.region()),
                    "protocol": "tcp",
                    "port": 22,
                    "description": "Allow SSH from EC2 Instance Connect",
                }]),
            );
        }

        stack.add_resource(&path, node)?;
        Ok(SecurityGroupHandle::new(path))
    }

    fn create_instance_role(
        stack: &mut Stack,
        id: &str,
        config: &NetworkConfig,
    ) -> Result<RoleHandle, Error> {
        let path = format!("{}/InstanceRole", id);
        let mut node = ResourceNode::new(ResourceKind::Role)
            .with_property("assumed_by", "ec2.amazonaws.com")
            .with_property(
                "managed_policies",
                serde_json::json!(["AmazonSSMManagedInstanceCore"]),
            );

        if config.enable_ec2_connect {
            node = node.with_property(
                "statements",
                serde_json::json!([{
                    "actions": ["ec2-instance-connect:SendSSHPublicKey"],
                    "resources": ["*"],
                }]),
            );
        }

        stack.add_resource(&path, node)?;
        Ok(RoleHandle::new(path))
    }

    fn add_tags(&self, stack: &mut Stack, additional: &TagSet, project: &str) {
        let defaults: TagSet = [
            ("Environment", self.environment.as_str()),
            ("ManagedBy", "nube"),
            ("Pattern", "NetworkPattern"),
            ("Project", project),
        ]
        .into_iter()
        .collect();

        let tags = merge_tags(&defaults, additional, &TagSet::new());

        let mut paths = vec![
            self.vpc.path().to_string(),
            self.instance_security_group.path().to_string(),
            self.instance_role.path().to_string(),
        ];
        if let Some(ref sg) = self.endpoint_security_group {
            paths.push(sg.path().to_string());
        }
        for path in paths {
            stack.apply_tags(&path, &tags);
        }
    }

    fn create_outputs(&self, stack: &mut Stack) -> Result<(), Error> {
        stack.add_output(
            &format!("{}/VpcId", self.id),
            Output {
                value: self.vpc.vpc_id(),
                description: "VPC ID".to_string(),
                export_name: format!("{}-vpc-id", self.id),
            },
        )?;
        stack.add_output(
            &format!("{}/InstanceSecurityGroupId", self.id),
            Output {
                value: self.instance_security_group.security_group_id(),
                description: "Instance Security Group ID".to_string(),
                export_name: format!("{}-instance-sg-id", self.id),
            },
        )?;
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The resolved, immutable configuration.
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// The derived subnet topology, in order.
    pub fn subnets(&self) -> &[SubnetSpec] {
        &self.subnets
    }
}

impl VpcPattern for NetworkPattern {
    fn vpc(&self) -> &VpcHandle {
        &self.vpc
    }

    fn instance_role(&self) -> &RoleHandle {
        &self.instance_role
    }

    fn instance_security_group(&self) -> &SecurityGroupHandle {
        &self.instance_security_group
    }
}
