//! Compute pattern — instances with standardized configuration.
//!
//! Defaults are resolved per deployment environment (development gets the
//! smallest class, production the next size up) and may be overridden at
//! pattern construction or per created instance. All creation delegates to
//! the network pattern's capability handles and the stack's resource graph.

use super::VpcPattern;
use crate::core::app::Stack;
use crate::core::graph::{
    InstanceHandle, Output, ResourceKind, ResourceNode, RoleHandle, SecurityGroupHandle,
    VpcHandle,
};
use crate::core::tags::{merge_tags, TagSet};
use crate::core::types::{
    InstanceClass, InstanceSize, InstanceType, MachineImage, SubnetKind, UserData,
};
use crate::error::{ConfigError, Error};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Caller-supplied overrides at pattern construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComputeOptions {
    /// Instance type, e.g. "t3.micro"
    #[serde(default)]
    pub instance_type: Option<String>,

    /// Machine image, e.g. "amazon-linux-2" or an AMI id
    #[serde(default)]
    pub machine_image: Option<String>,

    /// Subnet kind to launch into, e.g. "private_with_egress"
    #[serde(default)]
    pub subnet_type: Option<String>,

    /// Pattern-level tags applied to every created instance
    #[serde(default)]
    pub tags: TagSet,
}

impl ComputeOptions {
    /// Deserialize overrides from a JSON document, ignoring unknown keys.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        serde_json::from_value(value).map_err(|e| ConfigError::InvalidOverrides(e.to_string()))
    }
}

/// Per-call overrides for a single instance.
#[derive(Debug, Clone, Default)]
pub struct InstanceOptions {
    pub instance_type: Option<InstanceType>,
    pub machine_image: Option<MachineImage>,
    pub subnet_type: Option<SubnetKind>,
    pub user_data: Option<UserData>,
    pub tags: TagSet,
}

/// Fully resolved compute configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeConfig {
    pub instance_type: InstanceType,
    pub machine_image: MachineImage,
    pub subnet_type: SubnetKind,
}

impl ComputeConfig {
    /// Resolve overrides over the environment-keyed default table.
    ///
    /// Pure: identical overrides and environment always yield an identical
    /// config. Unrecognized environments fall back to development defaults.
    pub fn resolve(options: &ComputeOptions, environment: &str) -> Result<Self, ConfigError> {
        let default_type = match environment {
            "production" => InstanceType::of(InstanceClass::T3, InstanceSize::Small),
            _ => InstanceType::of(InstanceClass::T3, InstanceSize::Micro),
        };

        let instance_type = match options.instance_type.as_deref() {
            Some(s) => s.parse()?,
            None => default_type,
        };
        let machine_image = match options.machine_image.as_deref() {
            Some(s) => MachineImage::parse(s)?,
            None => MachineImage::AmazonLinux2,
        };
        let subnet_type = match options.subnet_type.as_deref() {
            Some(s) => s.parse()?,
            None => SubnetKind::PrivateWithEgress,
        };

        Ok(Self {
            instance_type,
            machine_image,
            subnet_type,
        })
    }
}

/// A pattern for creating compute instances against a network pattern's
/// capability handles.
#[derive(Debug, Clone)]
pub struct ComputePattern {
    id: String,
    environment: String,
    config: ComputeConfig,
    additional_tags: TagSet,
    vpc: VpcHandle,
    instance_security_group: SecurityGroupHandle,
    instance_role: RoleHandle,
}

impl ComputePattern {
    /// Create the pattern. Records nothing: instances are created by
    /// [`ComputePattern::create_instance`].
    pub fn new<V: VpcPattern>(
        stack: &Stack,
        id: &str,
        vpc_pattern: &V,
        options: ComputeOptions,
    ) -> Result<Self, Error> {
        let environment = stack
            .try_get_context("environment")
            .unwrap_or("development")
            .to_string();

        let config = ComputeConfig::resolve(&options, &environment)?;

        Ok(Self {
            id: id.to_string(),
            environment,
            config,
            additional_tags: options.tags,
            vpc: vpc_pattern.vpc().clone(),
            instance_security_group: vpc_pattern.instance_security_group().clone(),
            instance_role: vpc_pattern.instance_role().clone(),
        })
    }

    /// Create one instance in the network's chosen subnet kind, bound to
    /// its security group and role. Publishes the instance id and private
    /// address as exported outputs. Synthesis failures are logged and
    /// re-raised unchanged.
    pub fn create_instance(
        &self,
        stack: &mut Stack,
        instance_id: &str,
        options: InstanceOptions,
    ) -> Result<InstanceHandle, Error> {
        info!(instance = instance_id, "creating compute instance");

        let instance_type = options.instance_type.unwrap_or(self.config.instance_type);
        let machine_image = options
            .machine_image
            .unwrap_or_else(|| self.config.machine_image.clone());
        let subnet_type = options.subnet_type.unwrap_or(self.config.subnet_type);

        let path = format!("{}/{}", self.id, instance_id);
        let mut node = ResourceNode::new(ResourceKind::Instance)
            .with_property("vpc", self.vpc.vpc_id())
            .with_property("subnet_type", subnet_type.to_string())
            .with_property("instance_type", instance_type.to_string())
            .with_property("machine_image", machine_image.to_string())
            .with_property(
                "security_group",
                self.instance_security_group.security_group_id(),
            )
            .with_property("role", self.instance_role.role_arn());

        if let Some(user_data) = options.user_data.filter(|u| !u.is_empty()) {
            node = node.with_property("user_data", user_data.render());
        }

        stack.add_resource(&path, node).map_err(|e| {
            error!(instance = instance_id, error = %e, "failed to create compute instance");
            e
        })?;
        let instance = InstanceHandle::new(path);

        self.add_instance_tags(stack, &instance, &options.tags);
        self.create_instance_outputs(stack, &instance, instance_id)
            .map_err(|e| {
                error!(instance = instance_id, error = %e, "failed to create compute instance");
                e
            })?;

        info!(instance = %instance.instance_id(), "successfully created compute instance");
        Ok(instance)
    }

    /// Deterministic resource name from the deployment unit, the pattern
    /// id, and the resource's role.
    fn generate_resource_name(&self, stack: &Stack, resource_type: &str) -> String {
        format!("{}-{}-{}", stack.name(), self.id, resource_type)
    }

    fn add_instance_tags(&self, stack: &mut Stack, instance: &InstanceHandle, call_tags: &TagSet) {
        let project = stack
            .try_get_context("project")
            .unwrap_or("default")
            .to_string();
        let defaults: TagSet = [
            ("Name", self.generate_resource_name(stack, "instance")),
            ("Environment", self.environment.clone()),
            ("ManagedBy", "nube".to_string()),
            ("Pattern", "ComputePattern".to_string()),
            ("Project", project),
        ]
        .into_iter()
        .collect();

        let tags = merge_tags(&defaults, &self.additional_tags, call_tags);
        stack.apply_tags(instance.path(), &tags);
    }

    fn create_instance_outputs(
        &self,
        stack: &mut Stack,
        instance: &InstanceHandle,
        instance_id: &str,
    ) -> Result<(), Error> {
        stack.add_output(
            &format!("{}/{}InstanceId", self.id, instance_id),
            Output {
                value: instance.instance_id(),
                description: format!("Instance ID of {}", instance_id),
                export_name: format!("{}-{}-instance-id", self.id, instance_id),
            },
        )?;
        stack.add_output(
            &format!("{}/{}PrivateIp", self.id, instance_id),
            Output {
                value: instance.private_ip(),
                description: format!("Private IP of {}", instance_id),
                export_name: format!("{}-{}-private-ip", self.id, instance_id),
            },
        )?;
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The resolved, immutable configuration.
    pub fn config(&self) -> &ComputeConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::network::{NetworkOptions, NetworkPattern};
    use crate::testing::{test_app, test_app_with_context};

    fn network(stack: &mut Stack) -> NetworkPattern {
        NetworkPattern::new(stack, "Net", NetworkOptions::default()).unwrap()
    }

    #[test]
    fn test_resolve_development_defaults() {
        let config = ComputeConfig::resolve(&ComputeOptions::default(), "development").unwrap();
        assert_eq!(config.instance_type.to_string(), "t3.micro");
        assert_eq!(config.machine_image, MachineImage::AmazonLinux2);
        assert_eq!(config.subnet_type, SubnetKind::PrivateWithEgress);
    }

    #[test]
    fn test_resolve_production_defaults() {
        let config = ComputeConfig::resolve(&ComputeOptions::default(), "production").unwrap();
        assert_eq!(config.instance_type.to_string(), "t3.small");
    }

    #[test]
    fn test_resolve_unknown_environment_falls_back() {
        let config = ComputeConfig::resolve(&ComputeOptions::default(), "staging-17").unwrap();
        assert_eq!(config.instance_type.to_string(), "t3.micro");
    }

    #[test]
    fn test_resolve_override_beats_environment() {
        let options = ComputeOptions {
            instance_type: Some("m5.large".to_string()),
            ..Default::default()
        };
        let config = ComputeConfig::resolve(&options, "production").unwrap();
        assert_eq!(config.instance_type.to_string(), "m5.large");
    }

    #[test]
    fn test_resolve_invalid_instance_type() {
        let options = ComputeOptions {
            instance_type: Some("t3.enormous".to_string()),
            ..Default::default()
        };
        assert_eq!(
            ComputeConfig::resolve(&options, "development").unwrap_err(),
            ConfigError::InvalidInstanceType("t3.enormous".to_string())
        );
    }

    #[test]
    fn test_resolve_invalid_machine_image() {
        let options = ComputeOptions {
            machine_image: Some("windows-server".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            ComputeConfig::resolve(&options, "development").unwrap_err(),
            ConfigError::InvalidMachineImage(_)
        ));
    }

    #[test]
    fn test_resolve_idempotent() {
        let options = ComputeOptions {
            instance_type: Some("c5.xlarge".to_string()),
            machine_image: Some("ami-0abc12345678".to_string()),
            ..Default::default()
        };
        let a = ComputeConfig::resolve(&options, "production").unwrap();
        let b = ComputeConfig::resolve(&options, "production").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_environment_unset_defaults_to_development() {
        let (_app, mut stack) = test_app();
        let net = network(&mut stack);
        let pattern =
            ComputePattern::new(&stack, "Fleet", &net, ComputeOptions::default()).unwrap();
        assert_eq!(pattern.config().instance_type.to_string(), "t3.micro");
    }

    #[test]
    fn test_create_instance_records_node() {
        let (_app, mut stack) = test_app();
        let net = network(&mut stack);
        let pattern =
            ComputePattern::new(&stack, "Fleet", &net, ComputeOptions::default()).unwrap();

        let handle = pattern
            .create_instance(&mut stack, "Web", InstanceOptions::default())
            .unwrap();
        assert_eq!(handle.instance_id(), "${Fleet/Web.InstanceId}");

        let node = stack.resource("Fleet/Web").unwrap();
        assert_eq!(node.kind, ResourceKind::Instance);
        assert_eq!(node.properties["vpc"], "${Net/CustomVpc.VpcId}");
        assert_eq!(
            node.properties["security_group"],
            "${Net/InstanceSecurityGroup.SecurityGroupId}"
        );
        assert_eq!(node.properties["role"], "${Net/InstanceRole.RoleArn}");
        assert_eq!(node.properties["instance_type"], "t3.micro");
        assert_eq!(node.properties["subnet_type"], "private_with_egress");
    }

    #[test]
    fn test_create_instance_outputs() {
        let (_app, mut stack) = test_app();
        let net = network(&mut stack);
        let pattern =
            ComputePattern::new(&stack, "Fleet", &net, ComputeOptions::default()).unwrap();
        pattern
            .create_instance(&mut stack, "Web", InstanceOptions::default())
            .unwrap();

        let id_out = stack.output("Fleet/WebInstanceId").unwrap();
        assert_eq!(id_out.value, "${Fleet/Web.InstanceId}");
        assert_eq!(id_out.export_name, "Fleet-Web-instance-id");

        let ip_out = stack.output("Fleet/WebPrivateIp").unwrap();
        assert_eq!(ip_out.value, "${Fleet/Web.PrivateIp}");
        assert_eq!(ip_out.export_name, "Fleet-Web-private-ip");
    }

    #[test]
    fn test_instance_tag_merge_precedence() {
        let (_app, mut stack) = test_app();
        let net = network(&mut stack);
        let options = ComputeOptions {
            tags: [("Team", "platform"), ("Tier", "web")].into_iter().collect(),
            ..Default::default()
        };
        let pattern = ComputePattern::new(&stack, "Fleet", &net, options).unwrap();

        let call_tags: TagSet = [("Team", "app")].into_iter().collect();
        pattern
            .create_instance(
                &mut stack,
                "Web",
                InstanceOptions {
                    tags: call_tags,
                    ..Default::default()
                },
            )
            .unwrap();

        let node = stack.resource("Fleet/Web").unwrap();
        assert_eq!(node.tags.get("Team"), Some("app"));
        assert_eq!(node.tags.get("Tier"), Some("web"));
        assert_eq!(node.tags.get("Name"), Some("TestStack-Fleet-instance"));
        assert_eq!(node.tags.get("Pattern"), Some("ComputePattern"));
    }

    #[test]
    fn test_instance_user_data() {
        let (_app, mut stack) = test_app();
        let net = network(&mut stack);
        let pattern =
            ComputePattern::new(&stack, "Fleet", &net, ComputeOptions::default()).unwrap();

        let mut user_data = UserData::new();
        user_data.add_command("yum update -y");
        pattern
            .create_instance(
                &mut stack,
                "Web",
                InstanceOptions {
                    user_data: Some(user_data),
                    ..Default::default()
                },
            )
            .unwrap();

        let node = stack.resource("Fleet/Web").unwrap();
        let script = node.properties["user_data"].as_str().unwrap();
        assert!(script.starts_with("#!/bin/bash"));
        assert!(script.contains("yum update -y"));
    }

    #[test]
    fn test_duplicate_instance_id_reraised() {
        let (_app, mut stack) = test_app();
        let net = network(&mut stack);
        let pattern =
            ComputePattern::new(&stack, "Fleet", &net, ComputeOptions::default()).unwrap();

        pattern
            .create_instance(&mut stack, "Web", InstanceOptions::default())
            .unwrap();
        let err = pattern
            .create_instance(&mut stack, "Web", InstanceOptions::default())
            .unwrap_err();
        assert_eq!(
            err,
            Error::Synth(crate::error::SynthError::DuplicateId(
                "Fleet/Web".to_string()
            ))
        );
    }

    #[test]
    fn test_per_call_override_beats_pattern_config() {
        let (_app, mut stack) = test_app_with_context(&[("environment", "production")]);
        let net = network(&mut stack);
        let pattern =
            ComputePattern::new(&stack, "Fleet", &net, ComputeOptions::default()).unwrap();

        pattern
            .create_instance(
                &mut stack,
                "Crunch",
                InstanceOptions {
                    instance_type: Some(InstanceType::of(
                        InstanceClass::C5,
                        InstanceSize::Xlarge2,
                    )),
                    subnet_type: Some(SubnetKind::Public),
                    ..Default::default()
                },
            )
            .unwrap();

        let node = stack.resource("Fleet/Crunch").unwrap();
        assert_eq!(node.properties["instance_type"], "c5.2xlarge");
        assert_eq!(node.properties["subnet_type"], "public");
    }

    #[test]
    fn test_options_from_value_ignores_unknown_keys() {
        let options = ComputeOptions::from_value(serde_json::json!({
            "instance_type": "t3.small",
            "unknown_key": [1, 2, 3],
        }))
        .unwrap();
        assert_eq!(options.instance_type.as_deref(), Some("t3.small"));
    }
}
