//! Typed vocabulary for the resource model — instance types, machine
//! images, subnet kinds, and user data.
//!
//! All types derive Serialize/Deserialize so resolved configurations and
//! synthesized templates roundtrip through JSON.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Instance types
// ============================================================================

/// EC2-style instance class (the family half of `t3.micro`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceClass {
    T2,
    T3,
    T3a,
    M5,
    M6i,
    C5,
    C6i,
    R5,
}

impl fmt::Display for InstanceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::T2 => "t2",
            Self::T3 => "t3",
            Self::T3a => "t3a",
            Self::M5 => "m5",
            Self::M6i => "m6i",
            Self::C5 => "c5",
            Self::C6i => "c6i",
            Self::R5 => "r5",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for InstanceClass {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "t2" => Ok(Self::T2),
            "t3" => Ok(Self::T3),
            "t3a" => Ok(Self::T3a),
            "m5" => Ok(Self::M5),
            "m6i" => Ok(Self::M6i),
            "c5" => Ok(Self::C5),
            "c6i" => Ok(Self::C6i),
            "r5" => Ok(Self::R5),
            _ => Err(ConfigError::InvalidInstanceType(s.to_string())),
        }
    }
}

/// EC2-style instance size (the size half of `t3.micro`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceSize {
    Nano,
    Micro,
    Small,
    Medium,
    Large,
    Xlarge,
    Xlarge2,
}

impl fmt::Display for InstanceSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Nano => "nano",
            Self::Micro => "micro",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::Xlarge => "xlarge",
            Self::Xlarge2 => "2xlarge",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for InstanceSize {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nano" => Ok(Self::Nano),
            "micro" => Ok(Self::Micro),
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            "xlarge" => Ok(Self::Xlarge),
            "2xlarge" => Ok(Self::Xlarge2),
            _ => Err(ConfigError::InvalidInstanceType(s.to_string())),
        }
    }
}

/// A full instance type, e.g. `t3.micro`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InstanceType {
    pub class: InstanceClass,
    pub size: InstanceSize,
}

impl InstanceType {
    pub fn of(class: InstanceClass, size: InstanceSize) -> Self {
        Self { class, size }
    }
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class, self.size)
    }
}

impl FromStr for InstanceType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (class, size) = s
            .split_once('.')
            .ok_or_else(|| ConfigError::InvalidInstanceType(s.to_string()))?;
        Ok(Self {
            class: class
                .parse()
                .map_err(|_| ConfigError::InvalidInstanceType(s.to_string()))?,
            size: size
                .parse()
                .map_err(|_| ConfigError::InvalidInstanceType(s.to_string()))?,
        })
    }
}

impl TryFrom<String> for InstanceType {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<InstanceType> for String {
    fn from(t: InstanceType) -> Self {
        t.to_string()
    }
}

// ============================================================================
// Machine images
// ============================================================================

/// A machine image reference — a managed generation or a custom AMI id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MachineImage {
    AmazonLinux2,
    AmazonLinux2023,
    Custom(String),
}

impl MachineImage {
    /// Parse an image reference. Custom ids must look like `ami-<hex>`.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        static AMI_ID: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
        match s {
            "amazon-linux-2" => Ok(Self::AmazonLinux2),
            "amazon-linux-2023" => Ok(Self::AmazonLinux2023),
            other => {
                let ami = AMI_ID
                    .get_or_init(|| regex::Regex::new(r"^ami-[0-9a-f]{8,17}$").expect("valid ami regex"));
                if ami.is_match(other) {
                    Ok(Self::Custom(other.to_string()))
                } else {
                    Err(ConfigError::InvalidMachineImage(other.to_string()))
                }
            }
        }
    }
}

impl fmt::Display for MachineImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AmazonLinux2 => write!(f, "amazon-linux-2"),
            Self::AmazonLinux2023 => write!(f, "amazon-linux-2023"),
            Self::Custom(id) => write!(f, "{}", id),
        }
    }
}

impl TryFrom<String> for MachineImage {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<MachineImage> for String {
    fn from(m: MachineImage) -> Self {
        m.to_string()
    }
}

// ============================================================================
// Subnets
// ============================================================================

/// Subnet kind within a virtual network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubnetKind {
    Public,
    PrivateWithEgress,
    PrivateIsolated,
}

impl fmt::Display for SubnetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::PrivateWithEgress => write!(f, "private_with_egress"),
            Self::PrivateIsolated => write!(f, "private_isolated"),
        }
    }
}

impl FromStr for SubnetKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Self::Public),
            "private_with_egress" => Ok(Self::PrivateWithEgress),
            "private_isolated" => Ok(Self::PrivateIsolated),
            _ => Err(ConfigError::InvalidSubnetKind(s.to_string())),
        }
    }
}

/// One subnet group in a network's topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetSpec {
    /// Group name (e.g. "Public")
    pub name: String,

    /// Subnet kind
    pub kind: SubnetKind,

    /// Prefix length for each subnet in the group
    pub prefix_length: u8,
}

// ============================================================================
// User data
// ============================================================================

/// Boot-time initialization script, accumulated line by line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    commands: Vec<String>,
}

impl UserData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_command(&mut self, command: impl Into<String>) {
        self.commands.push(command.into());
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Render as a shell script.
    pub fn render(&self) -> String {
        let mut script = String::from("#!/bin/bash\n");
        for cmd in &self.commands {
            script.push_str(cmd);
            script.push('\n');
        }
        script
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_type_roundtrip() {
        let t: InstanceType = "t3.micro".parse().unwrap();
        assert_eq!(t.class, InstanceClass::T3);
        assert_eq!(t.size, InstanceSize::Micro);
        assert_eq!(t.to_string(), "t3.micro");
    }

    #[test]
    fn test_instance_type_of() {
        let t = InstanceType::of(InstanceClass::C5, InstanceSize::Xlarge2);
        assert_eq!(t.to_string(), "c5.2xlarge");
    }

    #[test]
    fn test_instance_type_invalid() {
        for s in ["t3", "t3.", ".micro", "t9.micro", "t3.tiny", ""] {
            let r: Result<InstanceType, _> = s.parse();
            assert!(r.is_err(), "expected parse failure for {:?}", s);
        }
    }

    #[test]
    fn test_machine_image_managed() {
        assert_eq!(
            MachineImage::parse("amazon-linux-2").unwrap(),
            MachineImage::AmazonLinux2
        );
        assert_eq!(
            MachineImage::parse("amazon-linux-2023").unwrap(),
            MachineImage::AmazonLinux2023
        );
    }

    #[test]
    fn test_machine_image_custom_ami() {
        let m = MachineImage::parse("ami-0abcdef123456789a").unwrap();
        assert_eq!(m, MachineImage::Custom("ami-0abcdef123456789a".to_string()));
    }

    #[test]
    fn test_machine_image_invalid() {
        for s in ["windows", "ami-", "ami-XYZ", "ubuntu-22.04"] {
            assert!(
                MachineImage::parse(s).is_err(),
                "expected parse failure for {:?}",
                s
            );
        }
    }

    #[test]
    fn test_subnet_kind_parse() {
        assert_eq!(
            "private_with_egress".parse::<SubnetKind>().unwrap(),
            SubnetKind::PrivateWithEgress
        );
        assert!("dmz".parse::<SubnetKind>().is_err());
    }

    #[test]
    fn test_user_data_render() {
        let mut ud = UserData::new();
        ud.add_command("yum install -y htop");
        ud.add_command("systemctl enable myapp");
        let script = ud.render();
        assert!(script.starts_with("#!/bin/bash\n"));
        assert!(script.contains("yum install -y htop\n"));
    }

    #[test]
    fn test_instance_type_serde() {
        let t: InstanceType = serde_json::from_str("\"m5.large\"").unwrap();
        assert_eq!(t.class, InstanceClass::M5);
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"m5.large\"");
    }
}
