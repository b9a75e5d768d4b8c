//! CIDR block parsing and validation.
//!
//! A `Cidr` is an address plus prefix length in `a.b.c.d/len` (or IPv6)
//! notation. Parsing is strict: both halves must be present, the prefix
//! must fit the address family, and the address must be the network
//! address of the block (no host bits set). The canonical form round-trips via Display.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// A validated CIDR block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cidr {
    addr: IpAddr,
    prefix_len: u8,
}

impl Cidr {
    /// Network address of the block.
    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    /// Prefix length in bits.
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }
}

impl FromStr for Cidr {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidCidr(s.to_string());

        let (addr_part, prefix_part) = s.split_once('/').ok_or_else(invalid)?;
        let addr: IpAddr = addr_part.parse().map_err(|_| invalid())?;
        let prefix_len: u8 = prefix_part.parse().map_err(|_| invalid())?;

        // Strict: the address must be the network address, no host bits.
        match addr {
            IpAddr::V4(v4) => {
                if prefix_len > 32 {
                    return Err(invalid());
                }
                let mask = if prefix_len == 0 {
                    0
                } else {
                    u32::MAX << (32 - u32::from(prefix_len))
                };
                if u32::from(v4) & !mask != 0 {
                    return Err(invalid());
                }
            }
            IpAddr::V6(v6) => {
                if prefix_len > 128 {
                    return Err(invalid());
                }
                let mask = if prefix_len == 0 {
                    0
                } else {
                    u128::MAX << (128 - u32::from(prefix_len))
                };
                if u128::from(v6) & !mask != 0 {
                    return Err(invalid());
                }
            }
        }

        Ok(Self { addr, prefix_len })
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix_len)
    }
}

impl TryFrom<String> for Cidr {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Cidr> for String {
    fn from(c: Cidr) -> Self {
        c.to_string()
    }
}
